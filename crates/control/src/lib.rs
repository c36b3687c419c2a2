pub mod pending;
pub mod queues;
pub mod work_item;

pub use pending::*;
pub use queues::*;
pub use work_item::*;
