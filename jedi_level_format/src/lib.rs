extern crate lazy_static;

mod data;
mod helpers;

pub use data::*;
pub use helpers::LevelError;
