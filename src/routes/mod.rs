//! Route Configuration
//!
//! Assembles the wire surface's endpoints into the Axum router.

pub mod router;

pub use router::create_router;
