use crate::builder::SlaveBuilder;
use crate::crc::Crc16;
use crate::error::{Exception, HandlerError, SlaveError};
use crate::handler::Handler;
use crate::pdu::{
    ADDRESS, BROADCAST_ADDRESS, CRC_LEN, DIAG_RETURN_QUERY_DATA, EXCEPTION_FLAG, FUNCTION,
    FunctionCode, HEADER_LEN, MIN_FRAME_LEN, READ_ANSWER_HEADER_LEN, Range, Request,
};
use crate::stats::{Counter, Statistics};
use std::fmt;
use tracing::{debug, trace, warn};

/// Outcome of a processed frame addressed to this slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// A normal response is waiting in the transmit buffer.
    Normal,
    /// An exception response is waiting in the transmit buffer.
    Exception(Exception),
    /// Broadcast frame: executed, nothing to transmit.
    Silent,
}

/// A Modbus RTU slave state machine.
///
/// The slave is transport-agnostic. The integration feeds received bytes
/// through [`Slave::input_byte`], calls [`Slave::process`] once the line has
/// been silent for the inter-frame delay (see [`crate::timing`]), then drains
/// the answer with [`Slave::output_byte`] or [`Slave::take_response`].
///
/// ```rust
/// use modbus_rtu_slave::prelude::*;
///
/// struct Device;
///
/// impl Handler for Device {
///     fn read_holding_registers(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
///         Ok(vec![0x00, 0x2A].repeat(usize::from(range.count)))
///     }
/// }
///
/// # fn main() -> Result<(), SlaveError> {
/// let mut slave = Slave::builder().address(1).handler(Device).build()?;
///
/// slave.input(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A])?;
/// assert_eq!(slave.process()?, Reply::Normal);
///
/// let response = slave.take_response();
/// assert_eq!(&response[..5], &[0x01, 0x03, 0x02, 0x00, 0x2A]);
/// # Ok(())
/// # }
/// ```
pub struct Slave<H> {
    pub(crate) address: u8,
    pub(crate) handler: H,
    pub(crate) rx: Vec<u8>,
    pub(crate) rx_capacity: usize,
    pub(crate) rx_overflow: bool,
    pub(crate) tx: Vec<u8>,
    pub(crate) tx_capacity: usize,
    pub(crate) tx_cursor: usize,
    pub(crate) crc: Crc16,
    pub(crate) stats: Statistics,
    pub(crate) stats_base: u16,
}

impl<H> fmt::Debug for Slave<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slave")
            .field("address", &self.address)
            .field("rx_bytes", &self.rx.len())
            .field("tx_pending", &self.response().len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Slave<crate::handler::NoHandler> {
    /// Returns a new [`SlaveBuilder`].
    pub fn builder() -> SlaveBuilder {
        SlaveBuilder::new()
    }
}

impl<H> Slave<H> {
    #[must_use]
    pub const fn address(&self) -> u8 {
        self.address
    }

    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    pub const fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    #[must_use]
    pub const fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// First diagnostics subfunction answering with statistics counters.
    #[must_use]
    pub const fn stats_base(&self) -> u16 {
        self.stats_base
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Number of bytes collected for the frame in progress.
    #[must_use]
    pub const fn received(&self) -> usize {
        self.rx.len()
    }

    /// Stores one received byte and folds it into the running checksum.
    ///
    /// The first byte after [`Slave::process`] (or [`Slave::discard_frame`])
    /// starts a new frame.
    ///
    /// # Errors
    /// Returns [`SlaveError::RxBufferOverflow`] on the byte that exceeds the
    /// receive buffer. The frame is discarded and the remaining bytes of it are
    /// swallowed until the next [`Slave::process`].
    pub fn input_byte(&mut self, byte: u8) -> Result<(), SlaveError> {
        if self.rx_overflow {
            return Ok(());
        }

        if self.rx.len() == self.rx_capacity {
            self.rx.clear();
            self.rx_overflow = true;
            return Err(SlaveError::RxBufferOverflow { capacity: self.rx_capacity, context: None });
        }

        if self.rx.is_empty() {
            self.crc.reset();
        }

        self.rx.push(byte);
        self.crc.update(byte);
        Ok(())
    }

    /// Feeds a run of received bytes.
    ///
    /// # Errors
    /// See [`Slave::input_byte`].
    pub fn input(&mut self, bytes: &[u8]) -> Result<(), SlaveError> {
        bytes.iter().try_for_each(|&byte| self.input_byte(byte))
    }

    /// Drops the frame in progress, e.g. after a transport error.
    pub fn discard_frame(&mut self) {
        self.rx.clear();
        self.rx_overflow = false;
    }

    /// Next byte of the pending response.
    ///
    /// # Errors
    /// Returns [`SlaveError::MessageEnded`] once every byte has been sent.
    pub fn output_byte(&mut self) -> Result<u8, SlaveError> {
        let byte = self.tx.get(self.tx_cursor).copied().ok_or_else(|| {
            SlaveError::MessageEnded { message: "No pending response bytes".into(), context: None }
        })?;
        self.tx_cursor += 1;
        Ok(byte)
    }

    /// Response bytes not yet drained with [`Slave::output_byte`].
    #[must_use]
    pub fn response(&self) -> &[u8] {
        &self.tx[self.tx_cursor..]
    }

    /// Removes and returns the pending response.
    pub fn take_response(&mut self) -> Vec<u8> {
        let pending = self.response().to_vec();
        self.tx.clear();
        self.tx_cursor = 0;
        pending
    }
}

impl<H: Handler> Slave<H> {
    /// Processes the collected frame. Call once the inter-frame silence has elapsed.
    ///
    /// The receive buffer is always reset, whatever the outcome.
    ///
    /// # Results
    /// * [`Reply::Normal`] / [`Reply::Exception`]: a response with CRC is pending.
    /// * [`Reply::Silent`]: an accepted broadcast, nothing to transmit.
    ///
    /// # Errors
    /// The frame is dropped without any response on:
    /// * [`SlaveError::InvalidPacket`] if it is too short or overflowed the buffer.
    /// * [`SlaveError::Crc`] if the checksum does not match.
    /// * [`SlaveError::AddressMismatch`] if it addresses another slave.
    /// * [`SlaveError::BroadcastNotSupported`] for broadcasts other than
    ///   "write multiple registers".
    pub fn process(&mut self) -> Result<Reply, SlaveError> {
        self.tx.clear();
        self.tx_cursor = 0;

        if self.rx_overflow {
            self.rx_overflow = false;
            self.stats.bump(Counter::InvalidPacketsReceived);
            return Err(SlaveError::InvalidPacket {
                message: "Frame exceeded the receive buffer".into(),
                context: None,
            });
        }

        if self.rx.len() < MIN_FRAME_LEN {
            let len = self.rx.len();
            self.rx.clear();
            self.stats.bump(Counter::InvalidPacketsReceived);
            return Err(SlaveError::InvalidPacket {
                message: format!("Frame of {len} bytes, expected at least {MIN_FRAME_LEN}")
                    .into(),
                context: None,
            });
        }

        let frame = std::mem::take(&mut self.rx);
        let result = self.handle_frame(&frame);
        self.rx = frame;
        self.rx.clear();

        if let Err(err) = &result {
            debug!(slave = self.address, error = %err, "Frame dropped");
        }

        result
    }

    fn handle_frame(&mut self, frame: &[u8]) -> Result<Reply, SlaveError> {
        self.stats.bump(Counter::AnyReceived);

        if !self.crc.is_valid() {
            self.stats.bump(Counter::InvalidPacketsReceived);
            return Err(SlaveError::Crc {
                message: format!("Checksum residue {:#06x}", self.crc.value()).into(),
                context: None,
            });
        }

        let body = &frame[..frame.len() - CRC_LEN];
        let (target, function) = (body[ADDRESS], body[FUNCTION]);
        let broadcast = target == BROADCAST_ADDRESS;

        if target != self.address {
            if !broadcast {
                return Err(SlaveError::AddressMismatch { address: target, context: None });
            }
            if !FunctionCode::from_u8(function).is_some_and(FunctionCode::accepts_broadcast) {
                return Err(SlaveError::BroadcastNotSupported { function, context: None });
            }
        }

        self.stats.bump(Counter::MyPacketsReceived);

        self.tx.push(self.address);
        self.tx.push(function);

        let outcome = FunctionCode::from_u8(function)
            .ok_or(HandlerError::Exception(Exception::IllegalFunction))
            .and_then(|code| self.dispatch(code, body));

        let reply = match outcome {
            Ok(()) => Reply::Normal,
            Err(err) => {
                if err == HandlerError::NotImplemented {
                    self.stats.bump(Counter::InvalidPacketsReceived);
                }
                let exception = err.exception();
                self.fill_exception(exception);
                self.stats.bump(Counter::ErrorSent);
                Reply::Exception(exception)
            },
        };

        if broadcast {
            trace!(function, ?reply, "Broadcast executed");
            self.tx.clear();
            return Ok(Reply::Silent);
        }

        if reply == Reply::Normal {
            self.stats.bump(Counter::OkSent);
        }

        let crc = crate::crc::crc16(&self.tx);
        self.tx.extend_from_slice(&crc.to_le_bytes());

        trace!(slave = self.address, function, ?reply, len = self.tx.len(), "Response ready");
        Ok(reply)
    }

    fn dispatch(&mut self, code: FunctionCode, body: &[u8]) -> Result<(), HandlerError> {
        match Request::parse(code, body)? {
            Request::ReadCoils(range) => {
                let data = self.handler.read_coils(range)?;
                Ok(self.push_read_answer(&data)?)
            },
            Request::ReadDiscreteInputs(range) => {
                let data = self.handler.read_discrete_inputs(range)?;
                Ok(self.push_read_answer(&data)?)
            },
            Request::ReadHoldingRegisters(range) => {
                let data = self.handler.read_holding_registers(range)?;
                Ok(self.push_read_answer(&data)?)
            },
            Request::WriteSingleRegister { address, value } => {
                self.handler.write_single_register(address, value)?;
                self.push_words(address, value);
                Ok(())
            },
            Request::WriteMultipleCoils { range, data } => {
                self.handler.write_multiple_coils(range, data)?;
                self.push_range(range);
                Ok(())
            },
            Request::WriteMultipleRegisters { range, data } => {
                self.handler.write_multiple_registers(range, data)?;
                self.push_range(range);
                Ok(())
            },
            Request::Diagnostic { subfunction, data } => {
                let answer = self.diagnostic(subfunction, data)?;
                self.push_words(subfunction, answer);
                Ok(())
            },
        }
    }

    fn diagnostic(&mut self, subfunction: u16, data: u16) -> Result<u16, HandlerError> {
        if subfunction == DIAG_RETURN_QUERY_DATA {
            return Ok(data);
        }

        #[cfg(feature = "statistics")]
        if let Some(counter) =
            subfunction.checked_sub(self.stats_base).and_then(Counter::from_offset)
        {
            return Ok(self.stats.get(counter));
        }

        self.handler.diagnostic(subfunction, data)
    }

    fn push_read_answer(&mut self, data: &[u8]) -> Result<(), Exception> {
        if data.is_empty() {
            return Err(Exception::DeviceFailure);
        }

        let byte_count = u8::try_from(data.len()).map_err(|_| Exception::IllegalDataAddress)?;
        let needed = READ_ANSWER_HEADER_LEN + data.len() + CRC_LEN;
        if needed > self.tx_capacity {
            let err = SlaveError::TxBufferOverflow {
                needed,
                capacity: self.tx_capacity,
                context: None,
            };
            warn!(slave = self.address, error = %err, "Read answer rejected");
            return Err(Exception::IllegalDataAddress);
        }

        self.tx.push(byte_count);
        self.tx.extend_from_slice(data);
        Ok(())
    }

    fn push_range(&mut self, range: Range) {
        self.push_words(range.address, range.count);
    }

    fn push_words(&mut self, first: u16, second: u16) {
        self.tx.extend_from_slice(&first.to_be_bytes());
        self.tx.extend_from_slice(&second.to_be_bytes());
    }

    fn fill_exception(&mut self, exception: Exception) {
        self.tx.truncate(HEADER_LEN);
        self.tx[FUNCTION] |= EXCEPTION_FLAG;
        self.tx.push(exception.code());
    }
}
