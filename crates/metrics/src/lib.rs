pub mod prometheus;
pub mod tracing;

pub use crate::prometheus::*;
pub use crate::tracing::*;
