use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use ptp_rtc::{
    clock::{ADJUST_MAX_MAGNITUDE, ADJUST_SUBTRACT},
    Rtc, Timestamp,
};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Emulation of the RTC registers on top of the host's monotonic clock.
///
/// The clock value is kept as a number of nanoseconds at an anchor instant.
/// It advances with the monotonic clock, scaled by the ratio of the
/// increment register to the nominal increment.
#[derive(Debug)]
pub struct SoftwareRtc {
    anchor: Instant,
    anchor_nanos: i128,
    increment: u32,
    nominal_increment: u32,
}

impl SoftwareRtc {
    /// A clock starting at the current system time.
    pub fn new(nominal_increment: u32) -> Self {
        Self::with_offset(nominal_increment, 0)
    }

    /// A clock starting `offset_nanos` away from the current system time.
    pub fn with_offset(nominal_increment: u32, offset_nanos: i64) -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i128)
            .unwrap_or(0);
        let nominal_increment = nominal_increment.max(1);

        SoftwareRtc {
            anchor: Instant::now(),
            anchor_nanos: since_epoch + offset_nanos as i128,
            increment: nominal_increment,
            nominal_increment,
        }
    }

    fn nanos_at(&self, instant: Instant) -> i128 {
        let elapsed = instant.saturating_duration_since(self.anchor).as_nanos() as i128;
        self.anchor_nanos + elapsed * self.increment as i128 / self.nominal_increment as i128
    }

    fn nanos_now(&self) -> i128 {
        self.nanos_at(Instant::now())
    }

    pub fn increment(&self) -> u32 {
        self.increment
    }
}

impl Rtc for SoftwareRtc {
    fn read_seconds(&self) -> u32 {
        self.now().seconds
    }

    fn read_nanoseconds(&self) -> u32 {
        self.now().nanos
    }

    fn write_seconds(&mut self, seconds: u32) {
        let current = self.nanos_now().div_euclid(NANOS_PER_SECOND) as u32;
        // the register wraps, take the short way around
        let delta = seconds.wrapping_sub(current) as i32;
        self.anchor_nanos += delta as i128 * NANOS_PER_SECOND;
    }

    fn write_adjust(&mut self, value: u32) {
        let magnitude = (value & ADJUST_MAX_MAGNITUDE) as i128;
        if value & ADJUST_SUBTRACT != 0 {
            self.anchor_nanos -= magnitude;
        } else {
            self.anchor_nanos += magnitude;
        }
    }

    fn write_increment(&mut self, increment: u32) {
        let now = Instant::now();
        self.anchor_nanos = self.nanos_at(now);
        self.anchor = now;
        self.increment = increment;
    }

    fn now(&self) -> Timestamp {
        let nanos = self.nanos_now();
        Timestamp {
            seconds: nanos.div_euclid(NANOS_PER_SECOND) as u32,
            nanos: nanos.rem_euclid(NANOS_PER_SECOND) as u32,
        }
    }
}

/// A [`SoftwareRtc`] shared between the protocol driver and the network,
/// which timestamps frames with it.
#[derive(Debug, Clone)]
pub struct SharedRtc(Arc<Mutex<SoftwareRtc>>);

impl SharedRtc {
    pub fn new(rtc: SoftwareRtc) -> Self {
        SharedRtc(Arc::new(Mutex::new(rtc)))
    }

    fn lock(&self) -> MutexGuard<'_, SoftwareRtc> {
        // register state stays consistent even if a holder panicked
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Rtc for SharedRtc {
    fn read_seconds(&self) -> u32 {
        self.lock().read_seconds()
    }

    fn read_nanoseconds(&self) -> u32 {
        self.lock().read_nanoseconds()
    }

    fn write_seconds(&mut self, seconds: u32) {
        self.lock().write_seconds(seconds)
    }

    fn write_adjust(&mut self, value: u32) {
        self.lock().write_adjust(value)
    }

    fn write_increment(&mut self, increment: u32) {
        self.lock().write_increment(increment)
    }

    fn now(&self) -> Timestamp {
        self.lock().now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A clock that does not advance on its own
    fn frozen() -> SoftwareRtc {
        let mut rtc = SoftwareRtc::new(9);
        rtc.write_increment(0);
        rtc
    }

    #[test]
    fn starts_near_system_time() {
        let system = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        let rtc = SoftwareRtc::new(9);
        let difference = rtc.now().seconds as i64 - system.as_secs() as i64;
        assert!(difference.abs() <= 1);

        let rtc = SoftwareRtc::with_offset(9, 3_250_000_000);
        let difference = rtc.now().seconds as i64 - system.as_secs() as i64;
        assert!((3..=4).contains(&difference));
    }

    #[test]
    fn frozen_clock_stands_still() {
        let rtc = frozen();
        let first = rtc.now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert_eq!(rtc.now(), first);
        assert_eq!(rtc.increment(), 0);
    }

    #[test]
    fn write_seconds_keeps_nanoseconds() {
        let mut rtc = frozen();
        let before = rtc.now();

        rtc.write_seconds(before.seconds.wrapping_add(2));
        assert_eq!(rtc.read_seconds(), before.seconds.wrapping_add(2));
        assert_eq!(rtc.read_nanoseconds(), before.nanos);

        rtc.write_seconds(12);
        assert_eq!(rtc.read_seconds(), 12);
        assert_eq!(rtc.read_nanoseconds(), before.nanos);
    }

    #[test]
    fn adjust_moves_the_clock() {
        let mut rtc = frozen();
        let before = rtc.now().total_nanos();

        rtc.write_adjust(500);
        assert_eq!(rtc.now().total_nanos(), before + 500);

        rtc.write_adjust(1_500 | ADJUST_SUBTRACT);
        assert_eq!(rtc.now().total_nanos(), before - 1_000);
    }

    #[test]
    fn running_clock_advances() {
        let rtc = SoftwareRtc::new(9);
        let first = rtc.now().total_nanos();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = rtc.now().total_nanos();
        assert!(second - first >= 5_000_000);
    }

    #[test]
    fn shared_clock_is_one_clock() {
        let mut rtc = SharedRtc::new(frozen());
        let observer = rtc.clone();

        rtc.write_seconds(100);
        assert_eq!(observer.read_seconds(), 100);
    }
}
