//! Query Execution Pipeline
//!
//! Per-request orchestration from raw payload to response envelope:
//!
//! - `request` - payload validation and the content-derived query id
//! - `engine` - the black-box execution seam and the bundled root-field
//!   dispatcher
//! - `pipeline` - transaction wrapping, scope finalization, envelope shaping
//! - `handler` - the plain HTTP endpoint

pub mod engine;
pub mod handler;
pub mod pipeline;
pub mod request;

pub use engine::{DispatchEngine, ExecutionEngine};
pub use request::GraphRequest;
