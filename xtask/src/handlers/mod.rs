pub mod bench;
pub mod build;
pub mod libs;
pub mod show;
pub mod testing;
