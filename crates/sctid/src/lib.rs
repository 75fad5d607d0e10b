#![doc = include_str!("../README.md")]

mod encoding;
mod error;
mod generator;
mod namespace;
mod range;
mod reservation;
mod service;
mod store;

pub use crate::encoding::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::namespace::*;
pub use crate::range::*;
pub use crate::reservation::*;
pub use crate::service::*;
pub use crate::store::*;
