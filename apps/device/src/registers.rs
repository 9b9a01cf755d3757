//! Device data model served over Modbus.

use crate::config::RegisterConfig;
use modbus_rtu_slave::{Exception, Handler, HandlerError, Range};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

pub const MAX_READ_BITS: u16 = 2000;
pub const MAX_READ_REGISTERS: u16 = 125;
pub const MAX_WRITE_COILS: u16 = 1968;
pub const MAX_WRITE_REGISTERS: u16 = 123;

const DIAG_RESTART_COMMUNICATIONS: u16 = 0x0001;

#[derive(Debug, Default)]
struct Tables {
    coils: Vec<bool>,
    discrete_inputs: Vec<bool>,
    holding_registers: Vec<u16>,
}

/// Coils, discrete inputs and holding registers shared by every connection.
///
/// Cloning is cheap and every clone sees the same tables.
#[derive(Debug, Clone, Default)]
pub struct RegisterBank {
    tables: Arc<RwLock<Tables>>,
}

impl RegisterBank {
    #[must_use]
    pub fn new(config: &RegisterConfig) -> Self {
        let tables = Tables {
            coils: vec![false; config.coils],
            discrete_inputs: vec![false; config.discrete_inputs],
            holding_registers: vec![0; config.holding_registers],
        };
        Self { tables: Arc::new(RwLock::new(tables)) }
    }

    #[must_use]
    pub fn coil(&self, address: u16) -> Option<bool> {
        self.tables.read().coils.get(usize::from(address)).copied()
    }

    #[must_use]
    pub fn holding_register(&self, address: u16) -> Option<u16> {
        self.tables.read().holding_registers.get(usize::from(address)).copied()
    }

    /// Updates a holding register from the device side.
    ///
    /// # Errors
    /// Returns [`Exception::IllegalDataAddress`] outside the bank.
    pub fn set_holding_register(&self, address: u16, value: u16) -> Result<(), Exception> {
        let mut tables = self.tables.write();
        let slot = tables
            .holding_registers
            .get_mut(usize::from(address))
            .ok_or(Exception::IllegalDataAddress)?;
        *slot = value;
        Ok(())
    }

    /// Updates a discrete input from the device side.
    ///
    /// # Errors
    /// Returns [`Exception::IllegalDataAddress`] outside the bank.
    pub fn set_discrete_input(&self, address: u16, value: bool) -> Result<(), Exception> {
        let mut tables = self.tables.write();
        let slot = tables
            .discrete_inputs
            .get_mut(usize::from(address))
            .ok_or(Exception::IllegalDataAddress)?;
        *slot = value;
        Ok(())
    }
}

/// Checks quantity limits first, then the address window, as the protocol
/// orders the two exceptions.
fn window(range: Range, limit: u16, len: usize) -> Result<std::ops::Range<usize>, Exception> {
    if range.count == 0 || range.count > limit {
        return Err(Exception::IllegalDataValue);
    }
    let end = range.end().filter(|&end| end <= len).ok_or(Exception::IllegalDataAddress)?;
    Ok(usize::from(range.address)..end)
}

/// Packs bits LSB first, eight per byte, padding the last byte with zeros.
fn pack_bits(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk.iter().enumerate().fold(0u8, |byte, (i, &bit)| byte | (u8::from(bit) << i))
        })
        .collect()
}

fn read_bits(table: &[bool], range: Range) -> Result<Vec<u8>, Exception> {
    let window = window(range, MAX_READ_BITS, table.len())?;
    Ok(pack_bits(&table[window]))
}

impl Handler for RegisterBank {
    fn read_coils(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        Ok(read_bits(&self.tables.read().coils, range)?)
    }

    fn read_discrete_inputs(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        Ok(read_bits(&self.tables.read().discrete_inputs, range)?)
    }

    fn read_holding_registers(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        let tables = self.tables.read();
        let window = window(range, MAX_READ_REGISTERS, tables.holding_registers.len())?;
        Ok(tables.holding_registers[window].iter().flat_map(|value| value.to_be_bytes()).collect())
    }

    fn write_single_register(&mut self, address: u16, value: u16) -> Result<(), HandlerError> {
        self.set_holding_register(address, value)?;
        debug!(address, value, "Holding register written");
        Ok(())
    }

    fn write_multiple_coils(&mut self, range: Range, data: &[u8]) -> Result<(), HandlerError> {
        let mut tables = self.tables.write();
        let window = window(range, MAX_WRITE_COILS, tables.coils.len())?;
        if data.len() != usize::from(range.count).div_ceil(8) {
            return Err(Exception::IllegalDataValue.into());
        }

        for (i, coil) in tables.coils[window].iter_mut().enumerate() {
            *coil = data[i / 8] & (1 << (i % 8)) != 0;
        }
        debug!(address = range.address, count = range.count, "Coils written");
        Ok(())
    }

    fn write_multiple_registers(&mut self, range: Range, data: &[u8]) -> Result<(), HandlerError> {
        let mut tables = self.tables.write();
        let window = window(range, MAX_WRITE_REGISTERS, tables.holding_registers.len())?;
        if data.len() != usize::from(range.count) * 2 {
            return Err(Exception::IllegalDataValue.into());
        }

        for (slot, word) in tables.holding_registers[window].iter_mut().zip(data.chunks_exact(2)) {
            *slot = u16::from_be_bytes([word[0], word[1]]);
        }
        debug!(address = range.address, count = range.count, "Holding registers written");
        Ok(())
    }

    fn diagnostic(&mut self, subfunction: u16, data: u16) -> Result<u16, HandlerError> {
        match subfunction {
            DIAG_RESTART_COMMUNICATIONS => Ok(data),
            _ => Err(Exception::IllegalFunction.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected<T>(exception: Exception) -> Result<T, HandlerError> {
        Err(exception.into())
    }

    fn bank() -> RegisterBank {
        RegisterBank::new(&RegisterConfig {
            coils: 32,
            discrete_inputs: 16,
            holding_registers: 8,
        })
    }

    #[test]
    fn test_pack_bits_lsb_first() {
        let bits = [true, false, true, true, false, false, true, true, true, false];
        assert_eq!(pack_bits(&bits), vec![0xCD, 0x01]);
    }

    #[test]
    fn test_coils_write_then_read() {
        let mut bank = bank();
        bank.write_multiple_coils(Range::new(3, 10), &[0xCD, 0x01]).unwrap();

        assert_eq!(bank.coil(3), Some(true));
        assert_eq!(bank.coil(4), Some(false));
        assert_eq!(bank.coil(10), Some(true));
        assert_eq!(bank.coil(11), Some(true));
        assert_eq!(bank.coil(12), Some(false));
        assert_eq!(bank.read_coils(Range::new(3, 10)).unwrap(), vec![0xCD, 0x01]);
    }

    #[test]
    fn test_registers_roundtrip_big_endian() {
        let mut bank = bank();
        bank.write_multiple_registers(Range::new(1, 2), &[0x12, 0x34, 0xAB, 0xCD]).unwrap();

        assert_eq!(bank.holding_register(2), Some(0xABCD));
        assert_eq!(
            bank.read_holding_registers(Range::new(0, 3)).unwrap(),
            vec![0x00, 0x00, 0x12, 0x34, 0xAB, 0xCD]
        );
    }

    #[test]
    fn test_discrete_inputs_from_device_side() {
        let mut bank = bank();
        bank.set_discrete_input(9, true).unwrap();
        assert_eq!(bank.read_discrete_inputs(Range::new(8, 2)).unwrap(), vec![0x02]);
        assert_eq!(bank.set_discrete_input(16, true), Err(Exception::IllegalDataAddress));
    }

    #[test]
    fn test_limits_and_bounds() {
        let mut bank = bank();
        assert_eq!(bank.read_coils(Range::new(0, 0)), rejected(Exception::IllegalDataValue));
        assert_eq!(bank.read_coils(Range::new(0, 2001)), rejected(Exception::IllegalDataValue));
        assert_eq!(bank.read_coils(Range::new(30, 3)), rejected(Exception::IllegalDataAddress));
        assert_eq!(bank.read_holding_registers(Range::new(0, 126)), rejected(Exception::IllegalDataValue));
        assert_eq!(bank.read_holding_registers(Range::new(0xFFFF, 2)), rejected(Exception::IllegalDataAddress));
        assert_eq!(bank.write_single_register(8, 1), rejected(Exception::IllegalDataAddress));
        assert_eq!(
            bank.write_multiple_registers(Range::new(0, 2), &[0x00, 0x01]),
            rejected(Exception::IllegalDataValue)
        );
        assert_eq!(
            bank.write_multiple_coils(Range::new(0, 9), &[0xFF]),
            rejected(Exception::IllegalDataValue)
        );
    }

    #[test]
    fn test_clones_share_tables() {
        let bank = bank();
        let mut other = bank.clone();
        other.write_single_register(5, 0x0102).unwrap();
        assert_eq!(bank.holding_register(5), Some(0x0102));
    }

    #[test]
    fn test_restart_communications_echoes() {
        let mut bank = bank();
        assert_eq!(bank.diagnostic(DIAG_RESTART_COMMUNICATIONS, 0xFF00), Ok(0xFF00));
        assert_eq!(bank.diagnostic(0x0004, 0), rejected(Exception::IllegalFunction));
    }
}
