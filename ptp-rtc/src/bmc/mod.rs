//! Best master clock selection

mod dataset_comparison;

use serde::{Deserialize, Serialize};

use crate::datastructures::{
    common::{ClockIdentity, ClockQuality, PortIdentity},
    messages::Frame,
};

/// The best master known to this port, or a candidate to compare against it.
///
/// A port keeps exactly one live instance of this record. It starts out as a
/// copy of the local clock's own announce data and is only ever replaced
/// field by field through [`BmcData::update_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BmcData {
    pub source_port_identity: PortIdentity,
    pub grandmaster_identity: ClockIdentity,
    pub steps_removed: u16,
    pub clock_quality: ClockQuality,
    pub priority_1: u8,
    pub priority_2: u8,
    /// Whether this port currently acts as the master of the segment
    pub i_am_master: bool,
    /// Announce receipt interval, in ticks
    pub announce_interval_duration: u16,
}

impl BmcData {
    /// Extracts the dataset from an Announce frame. The role flag and the
    /// announce interval are left at their defaults.
    pub fn from_announce(frame: &Frame<'_>) -> Self {
        BmcData {
            source_port_identity: frame.source_port_identity(),
            grandmaster_identity: frame.grandmaster_identity(),
            steps_removed: frame.steps_removed(),
            clock_quality: frame.grandmaster_clock_quality(),
            priority_1: frame.grandmaster_priority_1(),
            priority_2: frame.grandmaster_priority_2(),
            i_am_master: false,
            announce_interval_duration: 0,
        }
    }

    /// Commits a winning dataset. Only the six dataset fields are copied: the
    /// role flag and the announce interval stay untouched.
    pub fn update_from(&mut self, winner: &BmcData) {
        self.source_port_identity = winner.source_port_identity;
        self.grandmaster_identity = winner.grandmaster_identity;
        self.steps_removed = winner.steps_removed;
        self.clock_quality = winner.clock_quality;
        self.priority_1 = winner.priority_1;
        self.priority_2 = winner.priority_2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastructures::{common::MacAddress, messages::*};

    #[test]
    fn update_copies_the_dataset_only() {
        let mut current = BmcData {
            i_am_master: true,
            announce_interval_duration: 10,
            ..Default::default()
        };
        let winner = BmcData {
            source_port_identity: PortIdentity {
                clock_identity: ClockIdentity([1; 8]),
                port_number: 2,
            },
            grandmaster_identity: ClockIdentity([2; 8]),
            steps_removed: 3,
            clock_quality: ClockQuality::from_packed(0x0621_0001),
            priority_1: 4,
            priority_2: 5,
            i_am_master: false,
            announce_interval_duration: 99,
        };

        current.update_from(&winner);

        assert_eq!(
            current,
            BmcData {
                i_am_master: true,
                announce_interval_duration: 10,
                ..winner
            }
        );
    }

    #[test]
    fn dataset_from_announce_template() {
        let source_mac = MacAddress([0x00, 0x0a, 0x35, 0x01, 0x02, 0x03]);
        let identity = PortIdentity {
            clock_identity: ClockIdentity::from_mac_address(source_mac),
            port_number: 1,
        };
        let frames = TxFrames::new(&FrameTemplate {
            destination_mac: MacAddress::PTP_PEER_MULTICAST,
            source_mac,
            source_port_identity: identity,
            priority_1: 128,
            priority_2: 200,
            clock_quality: ClockQuality::default(),
            time_source: 0x90,
            log_announce_interval: 1,
            log_sync_interval: 0,
        });

        let data = BmcData::from_announce(&frames.announce.view());
        assert_eq!(data.source_port_identity, identity);
        assert_eq!(data.grandmaster_identity, identity.clock_identity);
        assert_eq!(data.steps_removed, 0);
        assert_eq!(data.clock_quality, ClockQuality::default());
        assert_eq!(data.priority_1, 128);
        assert_eq!(data.priority_2, 200);
        assert!(!data.i_am_master);
    }
}
