pub mod catalog;
pub mod row;
pub mod selection;

pub use catalog::*;
pub use row::*;
pub use selection::*;
