//! # Frame layout
//!
//! ```text
//! request   [ADDR(1)][FC(1)][REG(2)][COUNT(2)]                 [CRC(2)]
//! write N   [ADDR(1)][FC(1)][REG(2)][COUNT(2)][BYTES(1)][DATA..][CRC(2)]
//! read ok   [ADDR(1)][FC(1)][BYTES(1)][DATA..]                 [CRC(2)]
//! exception [ADDR(1)][FC|0x80(1)][CODE(1)]                     [CRC(2)]
//! ```
//!
//! 16-bit fields are big endian; the CRC is little endian.

use crate::error::Exception;

/// Address `0` reaches every slave on the line and is never answered.
pub const BROADCAST_ADDRESS: u8 = 0;
/// Highest assignable slave address.
pub const MAX_SLAVE_ADDRESS: u8 = 247;
/// Shorter frames are counted as invalid packets without further inspection.
pub const MIN_FRAME_LEN: usize = 7;
/// Set on the function code of an exception response.
pub const EXCEPTION_FLAG: u8 = 0x80;
pub const CRC_LEN: usize = 2;

pub(crate) const ADDRESS: usize = 0;
pub(crate) const FUNCTION: usize = 1;
pub(crate) const REGISTER_ADDRESS: usize = 2;
pub(crate) const NUMBER_OF_REGISTERS: usize = 4;
pub(crate) const BYTE_COUNT: usize = 6;
pub(crate) const WRITE_DATA: usize = 7;
pub(crate) const DIAG_SUBFUNCTION: usize = 2;
pub(crate) const DIAG_DATA: usize = 4;

/// `[ADDR][FC]`
pub(crate) const HEADER_LEN: usize = 2;
/// `[ADDR][FC][BYTES]`
pub(crate) const READ_ANSWER_HEADER_LEN: usize = 3;
/// Fixed-size requests: `[ADDR][FC][u16][u16]`
const FIXED_REQUEST_LEN: usize = 6;

/// Diagnostics subfunction `0x0000`: return query data.
pub const DIAG_RETURN_QUERY_DATA: u16 = 0x0000;

/// Function codes understood by the slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FunctionCode {
    ReadCoils = 0x01,
    ReadDiscreteInputs = 0x02,
    ReadHoldingRegisters = 0x03,
    WriteSingleRegister = 0x06,
    Diagnostics = 0x08,
    WriteMultipleCoils = 0x0F,
    WriteMultipleRegisters = 0x10,
}

impl FunctionCode {
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            0x01 => Self::ReadCoils,
            0x02 => Self::ReadDiscreteInputs,
            0x03 => Self::ReadHoldingRegisters,
            0x06 => Self::WriteSingleRegister,
            0x08 => Self::Diagnostics,
            0x0F => Self::WriteMultipleCoils,
            0x10 => Self::WriteMultipleRegisters,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Only "write multiple registers" is executed when broadcast.
    #[must_use]
    pub const fn accepts_broadcast(self) -> bool {
        matches!(self, Self::WriteMultipleRegisters)
    }
}

/// A block of coils or registers addressed by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub address: u16,
    pub count: u16,
}

impl Range {
    #[must_use]
    pub const fn new(address: u16, count: u16) -> Self {
        Self { address, count }
    }

    /// Exclusive end of the range, `None` if it runs past `0xFFFF`.
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        let end = usize::from(self.address) + usize::from(self.count);
        (end <= usize::from(u16::MAX) + 1).then_some(end)
    }
}

/// A decoded request, borrowing its payload from the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Request<'a> {
    ReadCoils(Range),
    ReadDiscreteInputs(Range),
    ReadHoldingRegisters(Range),
    WriteSingleRegister { address: u16, value: u16 },
    WriteMultipleCoils { range: Range, data: &'a [u8] },
    WriteMultipleRegisters { range: Range, data: &'a [u8] },
    Diagnostic { subfunction: u16, data: u16 },
}

impl<'a> Request<'a> {
    /// Decodes `body` (the frame without its CRC) for the given function.
    ///
    /// # Errors
    /// [`Exception::IllegalDataValue`] if the frame length disagrees with the function layout.
    pub(crate) fn parse(function: FunctionCode, body: &'a [u8]) -> Result<Self, Exception> {
        match function {
            FunctionCode::WriteMultipleCoils | FunctionCode::WriteMultipleRegisters => {
                let Some(&byte_count) = body.get(BYTE_COUNT) else {
                    return Err(Exception::IllegalDataValue);
                };
                if body.len() != WRITE_DATA + usize::from(byte_count) {
                    return Err(Exception::IllegalDataValue);
                }
                let range = Range::new(
                    read_u16(body, REGISTER_ADDRESS),
                    read_u16(body, NUMBER_OF_REGISTERS),
                );
                let data = &body[WRITE_DATA..];

                Ok(if function == FunctionCode::WriteMultipleCoils {
                    Self::WriteMultipleCoils { range, data }
                } else {
                    Self::WriteMultipleRegisters { range, data }
                })
            },
            _ => {
                if body.len() != FIXED_REQUEST_LEN {
                    return Err(Exception::IllegalDataValue);
                }
                let first = read_u16(body, REGISTER_ADDRESS);
                let second = read_u16(body, NUMBER_OF_REGISTERS);

                Ok(match function {
                    FunctionCode::ReadCoils => Self::ReadCoils(Range::new(first, second)),
                    FunctionCode::ReadDiscreteInputs => {
                        Self::ReadDiscreteInputs(Range::new(first, second))
                    },
                    FunctionCode::ReadHoldingRegisters => {
                        Self::ReadHoldingRegisters(Range::new(first, second))
                    },
                    FunctionCode::WriteSingleRegister => {
                        Self::WriteSingleRegister { address: first, value: second }
                    },
                    _ => Self::Diagnostic {
                        subfunction: read_u16(body, DIAG_SUBFUNCTION),
                        data: read_u16(body, DIAG_DATA),
                    },
                })
            },
        }
    }
}

/// Reads a big-endian `u16` at `offset`. Callers validate the length first.
#[inline]
pub(crate) fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_codes_roundtrip() {
        for code in [0x01, 0x02, 0x03, 0x06, 0x08, 0x0F, 0x10] {
            let function = FunctionCode::from_u8(code).unwrap();
            assert_eq!(function.code(), code);
        }
        assert_eq!(FunctionCode::from_u8(0x04), None);
        assert_eq!(FunctionCode::from_u8(0x2B), None);
    }

    #[test]
    fn test_parse_read_request() {
        let body = [0x01, 0x03, 0x12, 0x34, 0x00, 0x05];
        let request = Request::parse(FunctionCode::ReadHoldingRegisters, &body).unwrap();
        assert_eq!(request, Request::ReadHoldingRegisters(Range::new(0x1234, 5)));
    }

    #[test]
    fn test_parse_write_multiple_checks_byte_count() {
        let body = [0x01, 0x10, 0x12, 0x34, 0x00, 0x02, 0x04, 0x45, 0x67, 0x78, 0x9A];
        let request = Request::parse(FunctionCode::WriteMultipleRegisters, &body).unwrap();
        assert_eq!(
            request,
            Request::WriteMultipleRegisters {
                range: Range::new(0x1234, 2),
                data: &[0x45, 0x67, 0x78, 0x9A],
            }
        );

        let truncated = &body[..10];
        assert_eq!(
            Request::parse(FunctionCode::WriteMultipleRegisters, truncated),
            Err(Exception::IllegalDataValue)
        );
    }

    #[test]
    fn test_parse_rejects_oversized_fixed_request() {
        let body = [0x01, 0x08, 0x00, 0x00, 0x12, 0x34, 0x00];
        assert_eq!(
            Request::parse(FunctionCode::Diagnostics, &body),
            Err(Exception::IllegalDataValue)
        );
    }

    #[test]
    fn test_range_end() {
        assert_eq!(Range::new(0xFFFF, 1).end(), Some(0x1_0000));
        assert_eq!(Range::new(0xFFFF, 2).end(), None);
    }
}
