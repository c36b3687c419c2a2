//! Function runtime bootstrap for geospatial serverless workloads.
//!
//! The `bootstrap` binary resolves the configured handler once, then serves
//! invocations from the Runtime API one at a time until the stream ends or
//! the process is asked to stop.

pub mod bootstrap;

pub use bootstrap::{run, Bootstrap};
pub use geo_runtime_dispatcher::ServeSummary;
pub use geo_runtime_models::{RuntimeConfig, RuntimeError};
