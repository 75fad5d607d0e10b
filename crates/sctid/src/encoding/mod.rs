mod identifier;
mod interface;
mod verhoeff;

pub use identifier::*;
pub use interface::*;
