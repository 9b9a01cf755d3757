pub mod args;
pub mod project;
