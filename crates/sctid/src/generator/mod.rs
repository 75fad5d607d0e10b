mod counter;
mod cycling;
mod interface;
mod sequential;
#[cfg(test)]
mod tests;

pub use counter::*;
pub use cycling::*;
pub use interface::*;
pub use sequential::*;
