use core::fmt::Display;

use serde::{Deserialize, Serialize};

use super::measurement::RtcCorrection;
use crate::{bmc::BmcData, datastructures::common::PortIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Slave,
}

impl Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Role::Master => f.write_str("master"),
            Role::Slave => f.write_str("slave"),
        }
    }
}

/// The last correction applied to the RTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OffsetSnapshot {
    pub sequence_id: u16,
    pub correction: RtcCorrection,
}

/// Point in time view of a port, for observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortSnapshot {
    pub identity: PortIdentity,
    pub role: Role,
    pub running: bool,
    pub peer_capable: bool,
    pub current_bmc: BmcData,
    pub link_delay_ns: u32,
    pub lost_responses: u8,
    pub last_offset: Option<OffsetSnapshot>,
}
