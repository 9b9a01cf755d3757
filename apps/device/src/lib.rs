//! # Modbus RTU slave device
//!
//! Serves a [`RegisterBank`] through the `modbus-rtu-slave` engine. RTU frames
//! are carried over TCP; a frame ends when the stream stays silent for the
//! inter-frame delay derived from the configured baud rate.
//!
//! ## Example
//! ```no_run
//! use mbrs_device::{Device, config::load_config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cfg = load_config(None)?;
//!     Device::builder().config(cfg).build().await?.run().await
//! }
//! ```

pub mod config;
mod registers;
mod server;

pub use registers::{
    MAX_READ_BITS, MAX_READ_REGISTERS, MAX_WRITE_COILS, MAX_WRITE_REGISTERS, RegisterBank,
};
pub use server::{Device, DeviceBuilder};
