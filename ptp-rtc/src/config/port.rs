use core::time::Duration;

use serde::Deserialize;

use crate::datastructures::common::MacAddress;

/// Timing and addressing of the single PTP port.
///
/// All intervals are counted in ticks of [`PortConfig::tick_interval_ms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PortConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Sync transmit interval while master
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u16,
    /// Announce transmit interval while master, and the initial announce
    /// receipt interval
    #[serde(default = "default_announce_interval")]
    pub announce_interval: u16,
    #[serde(default = "default_link_delay_interval")]
    pub link_delay_interval: u16,
    /// Number of receipt intervals without a message before a slave gives up
    /// on its master
    #[serde(default = "default_receipt_timeout_multiplier")]
    pub receipt_timeout_multiplier: u16,
    /// Consecutive peer delay cycles without a complete answer before the
    /// peer is considered not capable
    #[serde(default = "default_max_lost_responses")]
    pub max_lost_responses: u8,
    /// Link delays at or above this value are discarded
    #[serde(default = "default_link_delay_threshold_ns")]
    pub link_delay_threshold_ns: u32,
    /// Frequency of the timestamping unit driving the RTC
    #[serde(default = "default_tsu_clock_hz")]
    pub tsu_clock_hz: u32,
    #[serde(default = "default_destination_mac")]
    pub destination_mac: MacAddress,
    #[serde(default = "default_source_mac")]
    pub source_mac: MacAddress,
}

impl PortConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Nanoseconds per timestamping unit cycle, the value of the RTC
    /// increment register when running at the nominal rate.
    pub fn nominal_increment(&self) -> u32 {
        1_000_000_000 / self.tsu_clock_hz.max(1)
    }

    /// logMessageInterval advertised in Announce messages
    pub fn log_announce_interval(&self) -> i8 {
        self.log_interval(self.announce_interval)
    }

    /// logMessageInterval advertised in Sync and FollowUp messages
    pub fn log_sync_interval(&self) -> i8 {
        self.log_interval(self.sync_interval)
    }

    fn log_interval(&self, ticks: u16) -> i8 {
        let seconds = ticks.max(1) as f64 * self.tick_interval_ms.max(1) as f64 / 1000.0;
        seconds.log2().round().clamp(i8::MIN as f64, i8::MAX as f64) as i8
    }

    /// Converts a logMessageInterval from the wire into a number of ticks,
    /// never less than one.
    pub fn ticks_from_log_interval(&self, log_interval: i8) -> u16 {
        let period_ms = 1000.0 * 2f64.powi(log_interval as i32);
        let ticks = (period_ms / self.tick_interval_ms.max(1) as f64).round();
        ticks.clamp(1.0, u16::MAX as f64) as u16
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            sync_interval: default_sync_interval(),
            announce_interval: default_announce_interval(),
            link_delay_interval: default_link_delay_interval(),
            receipt_timeout_multiplier: default_receipt_timeout_multiplier(),
            max_lost_responses: default_max_lost_responses(),
            link_delay_threshold_ns: default_link_delay_threshold_ns(),
            tsu_clock_hz: default_tsu_clock_hz(),
            destination_mac: default_destination_mac(),
            source_mac: default_source_mac(),
        }
    }
}

const fn default_tick_interval_ms() -> u64 {
    500
}

const fn default_sync_interval() -> u16 {
    2
}

const fn default_announce_interval() -> u16 {
    10
}

const fn default_link_delay_interval() -> u16 {
    8
}

const fn default_receipt_timeout_multiplier() -> u16 {
    5
}

const fn default_max_lost_responses() -> u8 {
    3
}

const fn default_link_delay_threshold_ns() -> u32 {
    5000
}

const fn default_tsu_clock_hz() -> u32 {
    111_111_111
}

const fn default_destination_mac() -> MacAddress {
    MacAddress::PTP_PEER_MULTICAST
}

const fn default_source_mac() -> MacAddress {
    MacAddress([0x00, 0x0a, 0x35, 0x01, 0x02, 0x03])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PortConfig::default();
        assert_eq!(config.nominal_increment(), 9);
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        // 10 ticks of 500ms is 5s, closest power of two is 4s
        assert_eq!(config.log_announce_interval(), 2);
        // 2 ticks of 500ms
        assert_eq!(config.log_sync_interval(), 0);
    }

    #[test]
    fn ticks_from_log() {
        let config = PortConfig::default();
        assert_eq!(config.ticks_from_log_interval(0), 2);
        assert_eq!(config.ticks_from_log_interval(1), 4);
        assert_eq!(config.ticks_from_log_interval(2), 8);
        assert_eq!(config.ticks_from_log_interval(-1), 1);
        assert_eq!(config.ticks_from_log_interval(-7), 1);
        assert_eq!(config.ticks_from_log_interval(127), u16::MAX);

        let fast = PortConfig {
            tick_interval_ms: 10,
            ..Default::default()
        };
        assert_eq!(fast.ticks_from_log_interval(0), 100);
        assert_eq!(fast.ticks_from_log_interval(-3), 13);
    }

    #[test]
    fn parse_port_config() {
        let config: PortConfig = toml::from_str(
            r#"
            tick-interval-ms = 125
            sync-interval = 1
            link-delay-threshold-ns = 20000
            source-mac = "02:00:00:00:00:01"
            "#,
        )
        .unwrap();

        assert_eq!(config.tick_interval_ms, 125);
        assert_eq!(config.sync_interval, 1);
        assert_eq!(config.announce_interval, 10);
        assert_eq!(config.link_delay_threshold_ns, 20000);
        assert_eq!(config.source_mac, MacAddress([0x02, 0, 0, 0, 0, 1]));
        assert_eq!(config.destination_mac, MacAddress::PTP_PEER_MULTICAST);

        assert!(toml::from_str::<PortConfig>("log-announce-interval = 1").is_err());
    }
}
