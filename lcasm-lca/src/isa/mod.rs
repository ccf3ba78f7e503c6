pub mod catalog;
pub mod instruction;
