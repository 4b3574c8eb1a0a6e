pub mod catalog;
pub mod extract;

pub use catalog::*;
pub use extract::*;
