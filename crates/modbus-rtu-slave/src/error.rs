//! # Slave Errors
//!
//! Two families of failures exist on a Modbus line:
//!
//! * [`Exception`] is answered to the master as an exception response
//!   (`function | 0x80`, followed by the exception code).
//! * [`HandlerError`] is what a [`Handler`](crate::Handler) returns: either
//!   an [`Exception`] or "not implemented", which is answered as
//!   [`Exception::IllegalFunction`] and counted as an invalid packet.
//! * [`SlaveError`] covers frames the slave drops without answering (noise,
//!   foreign addresses, checksum failures) plus local misuse of the engine.

use std::borrow::Cow;

/// Modbus exception codes returned to the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[repr(u8)]
pub enum Exception {
    /// The function code received in the query is not an allowable action.
    #[error("Illegal function")]
    IllegalFunction = 0x01,

    /// The combination of register address and transfer length is invalid.
    #[error("Illegal data address")]
    IllegalDataAddress = 0x02,

    /// A value contained in the query data field is not an allowable value.
    #[error("Illegal data value")]
    IllegalDataValue = 0x03,

    /// Unrecoverable error while the slave was performing the requested action.
    #[error("Slave device failure")]
    DeviceFailure = 0x04,

    /// Request accepted, processing takes long. Repeat later.
    #[error("Acknowledge")]
    Acknowledge = 0x05,

    #[error("Slave device busy")]
    Busy = 0x06,

    #[error("Negative acknowledge")]
    NegativeAcknowledge = 0x07,
}

impl Exception {
    /// Wire value of the exception.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Exception {
    type Error = SlaveError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::DeviceFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::Busy,
            0x07 => Self::NegativeAcknowledge,
            other => {
                return Err(SlaveError::InvalidPacket {
                    message: format!("Unknown exception code {other:#04x}").into(),
                    context: None,
                });
            },
        })
    }
}

/// Failure reported by a [`Handler`](crate::Handler) method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum HandlerError {
    /// The device does not implement the function at all.
    #[error("Function not implemented")]
    NotImplemented,

    #[error(transparent)]
    Exception(#[from] Exception),
}

impl HandlerError {
    /// Exception answered to the master.
    #[must_use]
    pub const fn exception(self) -> Exception {
        match self {
            Self::NotImplemented => Exception::IllegalFunction,
            Self::Exception(exception) => exception,
        }
    }
}

/// Failures that do not produce a response on the line.
#[derive(Debug, thiserror::Error)]
pub enum SlaveError {
    /// The frame addresses another slave.
    #[error("Address mismatch{}: frame addressed to {address}", format_context(.context))]
    AddressMismatch { address: u8, context: Option<Cow<'static, str>> },

    /// The frame checksum is wrong (line noise or a truncated frame).
    #[error("CRC error{}: {message}", format_context(.context))]
    Crc { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The frame is too short or otherwise unusable.
    #[error("Invalid packet{}: {message}", format_context(.context))]
    InvalidPacket { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Broadcast frames are only accepted for "write multiple registers".
    #[error("Broadcast not supported{}: function {function:#04x}", format_context(.context))]
    BroadcastNotSupported { function: u8, context: Option<Cow<'static, str>> },

    /// The pending response has been fully transmitted.
    #[error("Message ended{}: {message}", format_context(.context))]
    MessageEnded { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// More bytes arrived than the receive buffer holds; the frame is discarded.
    #[error("Receive buffer overflow{}: capacity {capacity} bytes", format_context(.context))]
    RxBufferOverflow { capacity: usize, context: Option<Cow<'static, str>> },

    /// A response did not fit the transmit buffer.
    #[error(
        "Transmit buffer overflow{}: {needed} bytes, capacity {capacity}",
        format_context(.context)
    )]
    TxBufferOverflow { needed: usize, capacity: usize, context: Option<Cow<'static, str>> },

    /// The slave or one of its parameters is misconfigured.
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl SlaveError {
    /// Critical errors point at the integration rather than at line traffic.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::RxBufferOverflow { .. }
                | Self::TxBufferOverflow { .. }
                | Self::InvalidConfiguration { .. }
        )
    }

    const fn context_mut(&mut self) -> &mut Option<Cow<'static, str>> {
        match self {
            Self::AddressMismatch { context, .. }
            | Self::Crc { context, .. }
            | Self::InvalidPacket { context, .. }
            | Self::BroadcastNotSupported { context, .. }
            | Self::MessageEnded { context, .. }
            | Self::RxBufferOverflow { context, .. }
            | Self::TxBufferOverflow { context, .. }
            | Self::InvalidConfiguration { context, .. } => context,
        }
    }
}

/// Attaches a human-readable context to a failed slave operation.
pub trait SlaveErrorExt<T> {
    /// # Errors
    /// Passes the underlying error through with `context` attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SlaveError>;
}

impl<T> SlaveErrorExt<T> for Result<T, SlaveError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            *e.context_mut() = Some(context.into());
            e
        })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
