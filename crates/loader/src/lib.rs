pub mod handler;
pub mod loader;
pub mod registry;

pub use handler::*;
pub use loader::*;
pub use registry::*;
