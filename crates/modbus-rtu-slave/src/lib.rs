//! # Modbus RTU Slave
//!
//! A transport-agnostic Modbus RTU slave (server) engine. The crate owns the
//! protocol: frame collection, CRC-16 validation, addressing and broadcast
//! rules, request decoding, exception responses, the built-in diagnostics
//! subfunctions and traffic statistics. The device supplies its data through
//! a [`Handler`]; the integration moves bytes between the engine and a UART,
//! a socket or a test harness.
//!
//! ## Supported functions
//!
//! | Code | Function                 |
//! |------|--------------------------|
//! | 0x01 | Read coil status         |
//! | 0x02 | Read input status        |
//! | 0x03 | Read holding registers   |
//! | 0x06 | Write single register    |
//! | 0x08 | Diagnostics              |
//! | 0x0F | Write multiple coils     |
//! | 0x10 | Write multiple registers |
//!
//! Any other code is answered with [`Exception::IllegalFunction`]. Broadcast
//! frames (address `0`) are executed only for "write multiple registers" and
//! never answered.
//!
//! ## Diagnostics
//!
//! Subfunction `0x0000` echoes the request. With the `statistics` feature,
//! subfunctions `base..base + 5` (default base `0xAA00`) return the
//! [`Statistics`] counters in [`Counter`] order. Everything else is forwarded
//! to [`Handler::diagnostic`].
//!
//! ## Cargo features
//!
//! * `crc-table` (default): table-driven CRC, faster at the cost of 512 bytes.
//! * `statistics` (default): traffic counters.
//!
//! ## Example
//!
//! ```rust
//! use modbus_rtu_slave::prelude::*;
//!
//! # fn main() -> Result<(), SlaveError> {
//! let mut slave = Slave::builder().address(1).build()?;
//!
//! // Diagnostics "return query data" is answered without a handler.
//! let mut request = vec![0x01, 0x08, 0x00, 0x00, 0x12, 0x34];
//! append_crc(&mut request);
//!
//! slave.input(&request)?;
//! assert_eq!(slave.process()?, Reply::Normal);
//! assert_eq!(slave.take_response(), request);
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod crc;
mod error;
mod handler;
pub mod pdu;
mod slave;
mod stats;
pub mod timing;

pub use builder::{DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE, SlaveBuilder};
pub use error::{Exception, HandlerError, SlaveError, SlaveErrorExt};
pub use handler::{Handler, NoHandler};
pub use pdu::{FunctionCode, Range};
pub use slave::{Reply, Slave};
pub use stats::{Counter, DEFAULT_STATS_BASE, Statistics};

pub mod prelude {
    pub use crate::crc::{append_crc, crc16};
    pub use crate::error::{Exception, HandlerError, SlaveError, SlaveErrorExt};
    pub use crate::handler::{Handler, NoHandler};
    pub use crate::pdu::{FunctionCode, Range};
    pub use crate::slave::{Reply, Slave};
    pub use crate::stats::{Counter, Statistics};
}
