//! # CRC-16/MODBUS
//!
//! Reflected polynomial `0xA001`, initial value `0xFFFF`. The checksum travels
//! low byte first, so running the accumulator over a complete frame (payload
//! plus its two CRC bytes) always ends at zero.

const POLY: u16 = 0xA001;
const INIT: u16 = 0xFFFF;

#[cfg(feature = "crc-table")]
const TABLE: [u16; 256] = build_table();

#[cfg(feature = "crc-table")]
const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = update_bitwise(0, i as u8);
        i += 1;
    }
    table
}

const fn update_bitwise(crc: u16, byte: u8) -> u16 {
    let mut crc = crc ^ byte as u16;
    let mut bit = 0;
    while bit < 8 {
        crc = if crc & 1 == 0 { crc >> 1 } else { (crc >> 1) ^ POLY };
        bit += 1;
    }
    crc
}

#[cfg(feature = "crc-table")]
#[inline]
const fn update(crc: u16, byte: u8) -> u16 {
    (crc >> 8) ^ TABLE[((crc ^ byte as u16) & 0xFF) as usize]
}

#[cfg(not(feature = "crc-table"))]
#[inline]
const fn update(crc: u16, byte: u8) -> u16 {
    update_bitwise(crc, byte)
}

/// Running CRC-16/MODBUS accumulator.
///
/// ```rust
/// use modbus_rtu_slave::crc::Crc16;
///
/// let mut crc = Crc16::new();
/// for byte in [0x01, 0x03, 0x12, 0x34, 0x00, 0x05, 0xC1, 0x7F] {
///     crc.update(byte);
/// }
/// assert!(crc.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16(u16);

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc16 {
    #[must_use]
    pub const fn new() -> Self {
        Self(INIT)
    }

    pub const fn reset(&mut self) {
        self.0 = INIT;
    }

    #[inline]
    pub const fn update(&mut self, byte: u8) {
        self.0 = update(self.0, byte);
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.update(byte);
        }
    }

    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// `true` once the accumulator has consumed a frame together with its own checksum.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 == 0
    }
}

/// Computes the CRC-16/MODBUS checksum of `buf`.
#[must_use]
pub fn crc16(buf: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.extend(buf);
    crc.value()
}

/// Appends the checksum of `frame` in wire order (low byte first).
pub fn append_crc(frame: &mut Vec<u8>) {
    let crc = crc16(frame);
    frame.extend_from_slice(&crc.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(crc16(b"123456789"), 0x4B37);
    }

    #[test]
    fn test_empty_buffer_is_init() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn test_known_request_frame() {
        assert_eq!(crc16(&[0x01, 0x03, 0x12, 0x34, 0x00, 0x05]), 0x7FC1);
    }

    #[test]
    fn test_table_matches_bitwise() {
        let mut table = INIT;
        let mut bitwise = INIT;
        for byte in 0..=u8::MAX {
            table = update(table, byte);
            bitwise = update_bitwise(bitwise, byte);
        }
        assert_eq!(table, bitwise);
    }

    #[test]
    fn test_append_crc_validates() {
        let mut frame = vec![0x01, 0x08, 0x00, 0x00, 0x12, 0x34];
        append_crc(&mut frame);
        assert_eq!(&frame[6..], &[0xED, 0x7C]);
        assert_eq!(crc16(&frame), 0);
    }
}
