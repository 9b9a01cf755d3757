pub mod runner;
pub mod utils;
