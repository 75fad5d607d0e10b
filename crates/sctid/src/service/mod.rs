mod config;
mod identifier;

pub use config::*;
pub use identifier::*;
