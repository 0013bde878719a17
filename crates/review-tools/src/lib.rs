pub mod catalog;
pub mod file;
pub mod gh;
pub mod git;
pub mod subprocess;

pub use catalog::{resolve_tools, validate_categories, ResolvedTools, ToolHandle};
