//! # RTU line timing
//!
//! An RTU frame ends after 3.5 character times of silence (t3.5); a gap of
//! more than 1.5 character times inside a frame (t1.5) breaks it. One
//! character is 11 bits on the wire (start, 8 data, parity or second stop,
//! stop). Above 19200 baud the protocol fixes the delays at 1750 µs and
//! 750 µs.

use crate::error::SlaveError;
use std::time::Duration;

pub const BITS_PER_CHAR: u64 = 11;
const FIXED_TIMING_BAUD: u32 = 19_200;
const FIXED_INTER_FRAME: Duration = Duration::from_micros(1_750);
const FIXED_INTER_CHAR: Duration = Duration::from_micros(750);
const MICROS_PER_SEC: u64 = 1_000_000;

fn checked_baud(baud: u32) -> Result<u64, SlaveError> {
    if baud == 0 {
        return Err(SlaveError::InvalidConfiguration {
            message: "Baud rate must be greater than zero".into(),
            context: None,
        });
    }
    Ok(u64::from(baud))
}

/// Time on the wire of a single character.
///
/// # Errors
/// Returns [`SlaveError::InvalidConfiguration`] if `baud` is zero.
pub fn char_time(baud: u32) -> Result<Duration, SlaveError> {
    let baud = checked_baud(baud)?;
    Ok(Duration::from_micros((BITS_PER_CHAR * MICROS_PER_SEC).div_ceil(baud)))
}

/// Silence marking the end of a frame (t3.5).
///
/// # Errors
/// Returns [`SlaveError::InvalidConfiguration`] if `baud` is zero.
pub fn inter_frame_delay(baud: u32) -> Result<Duration, SlaveError> {
    if baud > FIXED_TIMING_BAUD {
        return Ok(FIXED_INTER_FRAME);
    }
    let baud = checked_baud(baud)?;
    Ok(Duration::from_micros((7 * BITS_PER_CHAR * MICROS_PER_SEC).div_ceil(2 * baud)))
}

/// Longest tolerated gap between two characters of one frame (t1.5).
///
/// # Errors
/// Returns [`SlaveError::InvalidConfiguration`] if `baud` is zero.
pub fn inter_char_timeout(baud: u32) -> Result<Duration, SlaveError> {
    if baud > FIXED_TIMING_BAUD {
        return Ok(FIXED_INTER_CHAR);
    }
    let baud = checked_baud(baud)?;
    Ok(Duration::from_micros((3 * BITS_PER_CHAR * MICROS_PER_SEC).div_ceil(2 * baud)))
}
