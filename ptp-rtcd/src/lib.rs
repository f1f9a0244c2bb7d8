//! Daemon embedding the `ptp-rtc` engine: configuration, logging, a software
//! RTC, raw Ethernet and loopback networking, and state observation.

mod ctl;
pub mod daemon;

pub use ctl::main as ctl_main;
pub use daemon::main as daemon_main;
