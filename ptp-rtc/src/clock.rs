//! Definitions of the abstract clock type

use crate::datastructures::common::Timestamp;

/// Set in an adjust word to move the clock backwards.
pub const ADJUST_SUBTRACT: u32 = 0x8000_0000;

/// Largest nanosecond magnitude a single adjust write may carry.
pub const ADJUST_MAX_MAGNITUDE: u32 = 0x3fff_ffff;

/// Register interface of the hardware real-time clock
///
/// The engine only ever talks to the clock through these registers. The RTC
/// counts nanoseconds by adding the increment register to its nanosecond
/// counter on every cycle of the timestamping unit, rolling over into the
/// seconds register at 10^9.
///
/// Register accesses can not fail. An implementation that talks to real
/// hardware is expected to report bus errors out of band, which makes the
/// embedding application reset the [`PtpInstance`](crate::PtpInstance).
pub trait Rtc {
    fn read_seconds(&self) -> u32;

    fn read_nanoseconds(&self) -> u32;

    /// Overwrite the seconds counter, leaving the nanoseconds as they are.
    fn write_seconds(&mut self, seconds: u32);

    /// Apply a one-shot phase adjustment. The low 30 bits hold the
    /// magnitude in nanoseconds; [`ADJUST_SUBTRACT`] selects the direction.
    fn write_adjust(&mut self, value: u32);

    /// Set the number of nanoseconds added per timestamping unit cycle.
    fn write_increment(&mut self, increment: u32);

    /// Read the current time from both counters.
    fn now(&self) -> Timestamp {
        Timestamp {
            seconds: self.read_seconds(),
            nanos: self.read_nanoseconds(),
        }
    }
}

/// Splits a nanosecond correction into adjust register words of at most
/// [`ADJUST_MAX_MAGNITUDE`] each.
///
/// At least one word is always produced, so a zero correction still results
/// in one (empty) write.
#[derive(Debug, Clone)]
pub struct AdjustWords {
    remaining: u32,
    flags: u32,
    first: bool,
}

impl AdjustWords {
    pub fn new(magnitude: u32, subtract: bool) -> Self {
        AdjustWords {
            remaining: magnitude,
            flags: if subtract { ADJUST_SUBTRACT } else { 0 },
            first: true,
        }
    }
}

impl Iterator for AdjustWords {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.remaining == 0 && !self.first {
            return None;
        }
        self.first = false;

        let chunk = self.remaining.min(ADJUST_MAX_MAGNITUDE);
        self.remaining -= chunk;
        Some(chunk | self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_corrections_fit_one_word() {
        assert_eq!(AdjustWords::new(500, false).collect::<Vec<_>>(), vec![500]);
        assert_eq!(
            AdjustWords::new(500, true).collect::<Vec<_>>(),
            vec![500 | ADJUST_SUBTRACT]
        );
        assert_eq!(
            AdjustWords::new(ADJUST_MAX_MAGNITUDE, false).collect::<Vec<_>>(),
            vec![ADJUST_MAX_MAGNITUDE]
        );
    }

    #[test]
    fn zero_correction_still_writes() {
        assert_eq!(AdjustWords::new(0, false).collect::<Vec<_>>(), vec![0]);
        assert_eq!(
            AdjustWords::new(0, true).collect::<Vec<_>>(),
            vec![ADJUST_SUBTRACT]
        );
    }

    #[test]
    fn large_corrections_are_split() {
        assert_eq!(
            AdjustWords::new(999_999_999, true).collect::<Vec<_>>(),
            vec![999_999_999 | ADJUST_SUBTRACT]
        );

        assert_eq!(
            AdjustWords::new(ADJUST_MAX_MAGNITUDE + 1, false).collect::<Vec<_>>(),
            vec![ADJUST_MAX_MAGNITUDE, 1]
        );
        assert_eq!(
            AdjustWords::new(ADJUST_MAX_MAGNITUDE + 1, true).collect::<Vec<_>>(),
            vec![ADJUST_MAX_MAGNITUDE | ADJUST_SUBTRACT, 1 | ADJUST_SUBTRACT]
        );

        // no trailing empty word after an exact multiple
        assert_eq!(
            AdjustWords::new(2 * ADJUST_MAX_MAGNITUDE, false).collect::<Vec<_>>(),
            vec![ADJUST_MAX_MAGNITUDE, ADJUST_MAX_MAGNITUDE]
        );
        assert_eq!(
            AdjustWords::new(2 * ADJUST_MAX_MAGNITUDE, true).collect::<Vec<_>>(),
            vec![ADJUST_MAX_MAGNITUDE | ADJUST_SUBTRACT; 2]
        );
    }
}
