use crate::crc::Crc16;
use crate::error::SlaveError;
use crate::handler::{Handler, NoHandler};
use crate::pdu::{BROADCAST_ADDRESS, MAX_SLAVE_ADDRESS};
use crate::slave::Slave;
use crate::stats::{DEFAULT_STATS_BASE, Statistics};

/// Smallest buffer that still holds every fixed-size frame.
pub const MIN_BUFFER_SIZE: usize = 16;
/// Largest RTU frame on the wire.
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// A builder for a configured [`Slave`].
///
/// The slave address is mandatory; buffers default to [`DEFAULT_BUFFER_SIZE`]
/// and statistics are exposed from diagnostics subfunction
/// [`DEFAULT_STATS_BASE`].
#[derive(Debug)]
#[must_use = "builders do nothing unless you call .build()"]
pub struct SlaveBuilder<H = NoHandler> {
    address: Option<u8>,
    handler: H,
    rx_capacity: usize,
    tx_capacity: usize,
    stats_base: u16,
}

impl Default for SlaveBuilder {
    fn default() -> Self {
        Self {
            address: None,
            handler: NoHandler,
            rx_capacity: DEFAULT_BUFFER_SIZE,
            tx_capacity: DEFAULT_BUFFER_SIZE,
            stats_base: DEFAULT_STATS_BASE,
        }
    }
}

impl SlaveBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H> SlaveBuilder<H> {
    /// Own slave address, `1..=247`.
    pub const fn address(mut self, address: u8) -> Self {
        self.address = Some(address);
        self
    }

    /// Installs the device callbacks, replacing any previous handler.
    pub fn handler<N: Handler>(self, handler: N) -> SlaveBuilder<N> {
        SlaveBuilder {
            address: self.address,
            handler,
            rx_capacity: self.rx_capacity,
            tx_capacity: self.tx_capacity,
            stats_base: self.stats_base,
        }
    }

    /// Receive buffer size in bytes; longer frames are discarded.
    pub const fn rx_capacity(mut self, capacity: usize) -> Self {
        self.rx_capacity = capacity;
        self
    }

    /// Transmit buffer size in bytes; limits the size of read answers.
    pub const fn tx_capacity(mut self, capacity: usize) -> Self {
        self.tx_capacity = capacity;
        self
    }

    /// First diagnostics subfunction answering with statistics counters.
    pub const fn stats_base(mut self, base: u16) -> Self {
        self.stats_base = base;
        self
    }
}

impl<H: Handler> SlaveBuilder<H> {
    /// Validates the settings and allocates the frame buffers.
    ///
    /// # Errors
    /// Returns [`SlaveError::InvalidConfiguration`] if the address is missing or
    /// outside `1..=247`, or a buffer is smaller than [`MIN_BUFFER_SIZE`].
    pub fn build(self) -> Result<Slave<H>, SlaveError> {
        let address = self.address.ok_or_else(|| SlaveError::InvalidConfiguration {
            message: "Slave address is required".into(),
            context: None,
        })?;

        if address == BROADCAST_ADDRESS || address > MAX_SLAVE_ADDRESS {
            return Err(SlaveError::InvalidConfiguration {
                message: format!("Slave address {address} outside 1..={MAX_SLAVE_ADDRESS}").into(),
                context: None,
            });
        }

        for (name, capacity) in [("rx", self.rx_capacity), ("tx", self.tx_capacity)] {
            if capacity < MIN_BUFFER_SIZE {
                return Err(SlaveError::InvalidConfiguration {
                    message: format!(
                        "{name} buffer of {capacity} bytes, must be at least {MIN_BUFFER_SIZE}"
                    )
                    .into(),
                    context: None,
                });
            }
        }

        Ok(Slave {
            address,
            handler: self.handler,
            rx: Vec::with_capacity(self.rx_capacity),
            rx_capacity: self.rx_capacity,
            rx_overflow: false,
            tx: Vec::with_capacity(self.tx_capacity),
            tx_capacity: self.tx_capacity,
            tx_cursor: 0,
            crc: Crc16::new(),
            stats: Statistics::default(),
            stats_base: self.stats_base,
        })
    }
}
