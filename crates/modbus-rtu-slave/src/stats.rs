//! # Traffic statistics
//!
//! Five wrapping 16-bit counters, exposed to the master through diagnostics
//! subfunctions `base + offset` (see [`Counter`]). With the `statistics`
//! feature disabled the counters stay at zero and the subfunctions fall
//! through to the user handler.

/// Default first diagnostics subfunction used for statistics.
pub const DEFAULT_STATS_BASE: u16 = 0xAA00;

/// Counter selector; the discriminant is the offset from the statistics base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Counter {
    /// Frames that passed the length check.
    AnyReceived = 0,
    /// Frames addressed to this slave (including accepted broadcasts).
    MyPacketsReceived = 1,
    /// Normal responses sent.
    OkSent = 2,
    /// Exception responses sent.
    ErrorSent = 3,
    /// Short, corrupted or unsupported frames.
    InvalidPacketsReceived = 4,
}

impl Counter {
    pub const ALL: [Self; 5] = [
        Self::AnyReceived,
        Self::MyPacketsReceived,
        Self::OkSent,
        Self::ErrorSent,
        Self::InvalidPacketsReceived,
    ];

    #[must_use]
    pub const fn from_offset(offset: u16) -> Option<Self> {
        Some(match offset {
            0 => Self::AnyReceived,
            1 => Self::MyPacketsReceived,
            2 => Self::OkSent,
            3 => Self::ErrorSent,
            4 => Self::InvalidPacketsReceived,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn offset(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub any_received: u16,
    pub my_packets_received: u16,
    pub ok_sent: u16,
    pub error_sent: u16,
    pub invalid_packets_received: u16,
}

impl Statistics {
    #[must_use]
    pub const fn get(&self, counter: Counter) -> u16 {
        match counter {
            Counter::AnyReceived => self.any_received,
            Counter::MyPacketsReceived => self.my_packets_received,
            Counter::OkSent => self.ok_sent,
            Counter::ErrorSent => self.error_sent,
            Counter::InvalidPacketsReceived => self.invalid_packets_received,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub(crate) const fn bump(&mut self, counter: Counter) {
        #[cfg(feature = "statistics")]
        {
            let slot = match counter {
                Counter::AnyReceived => &mut self.any_received,
                Counter::MyPacketsReceived => &mut self.my_packets_received,
                Counter::OkSent => &mut self.ok_sent,
                Counter::ErrorSent => &mut self.error_sent,
                Counter::InvalidPacketsReceived => &mut self.invalid_packets_received,
            };
            *slot = slot.wrapping_add(1);
        }
        #[cfg(not(feature = "statistics"))]
        let _ = (self, counter);
    }
}

#[cfg(all(test, feature = "statistics"))]
mod tests {
    use super::*;

    #[test]
    fn test_bump_wraps() {
        let mut stats = Statistics { ok_sent: u16::MAX, ..Statistics::default() };
        stats.bump(Counter::OkSent);
        assert_eq!(stats.get(Counter::OkSent), 0);
    }

    #[test]
    fn test_offsets_match_selectors() {
        for counter in Counter::ALL {
            assert_eq!(Counter::from_offset(counter.offset()), Some(counter));
        }
        assert_eq!(Counter::from_offset(5), None);
    }
}
