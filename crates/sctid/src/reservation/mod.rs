mod interface;
mod memory;
mod types;

pub use interface::*;
pub use memory::*;
pub use types::*;
