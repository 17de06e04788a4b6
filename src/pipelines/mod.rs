//! Pipelines.
//!
//! The ingestion controller lives here, and the module
//! provides a light [pipeline::Pipeline] trait to run it end to end.
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod upload;

pub use pipeline::Pipeline;
pub use upload::{Services, State, Summary, Upload};
