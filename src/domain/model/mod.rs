pub mod catalog;
pub mod holding;
pub mod isbn;
pub mod item;
pub mod preferences;
pub mod recommendation;
