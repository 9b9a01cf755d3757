//! # Application hooks
//!
//! The engine owns framing, addressing, checksums and diagnostics; everything
//! touching the device's data goes through a [`Handler`]. Every method has a
//! default returning [`HandlerError::NotImplemented`], answered as
//! [`Exception::IllegalFunction`](crate::Exception::IllegalFunction) and
//! counted as an invalid packet, so an implementation only overrides what
//! the device supports.

use crate::error::HandlerError;
use crate::pdu::Range;

/// Device-side callbacks invoked by [`Slave`](crate::Slave).
///
/// Read methods return the response data bytes exactly as they go on the
/// wire (packed bits for coils and inputs, big-endian words for registers).
/// An empty answer is reported to the master as
/// [`Exception::DeviceFailure`](crate::Exception::DeviceFailure).
pub trait Handler {
    /// Function `0x01`.
    ///
    /// # Errors
    /// Any [`HandlerError`] is answered to the master as an exception.
    fn read_coils(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        let _ = range;
        Err(HandlerError::NotImplemented)
    }

    /// Function `0x02`.
    ///
    /// # Errors
    /// Any [`HandlerError`] is answered to the master as an exception.
    fn read_discrete_inputs(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        let _ = range;
        Err(HandlerError::NotImplemented)
    }

    /// Function `0x03`.
    ///
    /// # Errors
    /// Any [`HandlerError`] is answered to the master as an exception.
    fn read_holding_registers(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        let _ = range;
        Err(HandlerError::NotImplemented)
    }

    /// Function `0x06`.
    ///
    /// # Errors
    /// Any [`HandlerError`] is answered to the master as an exception.
    fn write_single_register(&mut self, address: u16, value: u16) -> Result<(), HandlerError> {
        let _ = (address, value);
        Err(HandlerError::NotImplemented)
    }

    /// Function `0x0F`. `data` holds `range.count` bits, LSB first.
    ///
    /// # Errors
    /// Any [`HandlerError`] is answered to the master as an exception.
    fn write_multiple_coils(&mut self, range: Range, data: &[u8]) -> Result<(), HandlerError> {
        let _ = (range, data);
        Err(HandlerError::NotImplemented)
    }

    /// Function `0x10`. Also invoked for broadcast frames, whose result is never answered.
    ///
    /// # Errors
    /// Any [`HandlerError`] is answered to the master as an exception.
    fn write_multiple_registers(&mut self, range: Range, data: &[u8]) -> Result<(), HandlerError> {
        let _ = (range, data);
        Err(HandlerError::NotImplemented)
    }

    /// Function `0x08` for subfunctions the engine does not answer itself.
    ///
    /// # Errors
    /// Any [`HandlerError`] is answered to the master as an exception.
    fn diagnostic(&mut self, subfunction: u16, data: u16) -> Result<u16, HandlerError> {
        let _ = (subfunction, data);
        Err(HandlerError::NotImplemented)
    }
}

/// A handler that supports nothing beyond the built-in diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHandler;

impl Handler for NoHandler {}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn read_coils(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        (**self).read_coils(range)
    }

    fn read_discrete_inputs(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        (**self).read_discrete_inputs(range)
    }

    fn read_holding_registers(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        (**self).read_holding_registers(range)
    }

    fn write_single_register(&mut self, address: u16, value: u16) -> Result<(), HandlerError> {
        (**self).write_single_register(address, value)
    }

    fn write_multiple_coils(&mut self, range: Range, data: &[u8]) -> Result<(), HandlerError> {
        (**self).write_multiple_coils(range, data)
    }

    fn write_multiple_registers(&mut self, range: Range, data: &[u8]) -> Result<(), HandlerError> {
        (**self).write_multiple_registers(range, data)
    }

    fn diagnostic(&mut self, subfunction: u16, data: u16) -> Result<u16, HandlerError> {
        (**self).diagnostic(subfunction, data)
    }
}
