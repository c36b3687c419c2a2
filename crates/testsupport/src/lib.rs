pub mod emulator;
pub mod helpers;
pub mod invoke_client;

pub use emulator::*;
pub use helpers::*;
pub use invoke_client::*;
