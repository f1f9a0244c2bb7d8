use serde::Deserialize;

use crate::datastructures::common::{ClockIdentity, ClockQuality, MacAddress, PortIdentity};

/// What this clock announces about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InstanceConfig {
    /// Defaults to the EUI-64 of the port's source MAC address
    #[serde(default)]
    pub clock_identity: Option<ClockIdentity>,
    #[serde(default = "default_port_number")]
    pub port_number: u16,
    #[serde(default = "default_priority_1")]
    pub priority_1: u8,
    #[serde(default = "default_priority_2")]
    pub priority_2: u8,
    #[serde(default)]
    pub clock_quality: ClockQuality,
    #[serde(default = "default_time_source")]
    pub time_source: u8,
}

impl InstanceConfig {
    pub fn port_identity(&self, source_mac: MacAddress) -> PortIdentity {
        PortIdentity {
            clock_identity: self
                .clock_identity
                .unwrap_or_else(|| ClockIdentity::from_mac_address(source_mac)),
            port_number: self.port_number,
        }
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            clock_identity: None,
            port_number: default_port_number(),
            priority_1: default_priority_1(),
            priority_2: default_priority_2(),
            clock_quality: ClockQuality::default(),
            time_source: default_time_source(),
        }
    }
}

const fn default_port_number() -> u16 {
    1
}

const fn default_priority_1() -> u8 {
    254
}

const fn default_priority_2() -> u8 {
    248
}

/// Internal oscillator
const fn default_time_source() -> u8 {
    0x90
}
