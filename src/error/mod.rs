//! Error Module
//!
//! This module contains the server-wide error taxonomy and its conversion
//! into HTTP responses.

pub mod conversion;
pub mod types;

pub use types::ServerError;
