pub mod config;
pub mod error;
pub mod handler_id;
pub mod invocation;
pub mod runtime_api;

pub use config::*;
pub use error::*;
pub use handler_id::*;
pub use invocation::*;
