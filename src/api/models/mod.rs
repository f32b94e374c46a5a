pub mod common;
pub mod attributes;
pub mod recipes;
pub mod system;

pub use attributes::*;
pub use recipes::*;
pub use system::*;
