//! Ptp network messages, as raw Ethernet frames

use num_enum::{IntoPrimitive, TryFromPrimitive};

mod frame;
mod templates;

pub use frame::*;
pub use templates::*;

pub const PTP_ETHERTYPE: u16 = 0x88f7;
pub const PTP_VERSION: u8 = 2;
pub const ETHERNET_HEADER_LEN: usize = 14;

/// The longest frame this engine sends or needs to look at.
pub const MAX_FRAME_LEN: usize = 90;

#[derive(Debug, Clone, Copy, TryFromPrimitive, IntoPrimitive, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Sync = 0x0,
    PDelayReq = 0x2,
    PDelayResp = 0x3,
    FollowUp = 0x8,
    PDelayRespFollowUp = 0xA,
    Announce = 0xB,
    Signaling = 0xC,
}

impl MessageType {
    /// Total length of a frame of this type, Ethernet header included. For
    /// Signaling this is the minimum length.
    pub const fn frame_length(self) -> usize {
        match self {
            MessageType::Sync => 58,
            MessageType::Announce | MessageType::FollowUp => 90,
            MessageType::PDelayReq
            | MessageType::PDelayResp
            | MessageType::PDelayRespFollowUp => 68,
            MessageType::Signaling => 58,
        }
    }

    /// The value of the `messageLength` header field, which excludes the
    /// Ethernet header.
    pub const fn message_length(self) -> u16 {
        (self.frame_length() - ETHERNET_HEADER_LEN) as u16
    }
}

/// Byte offsets of the fields used by this engine, counted from the start of
/// the Ethernet frame.
pub(crate) mod offsets {
    pub const DESTINATION_MAC: usize = 0;
    pub const SOURCE_MAC: usize = 6;
    pub const ETHERTYPE: usize = 12;
    pub const MESSAGE_TYPE: usize = 14;
    pub const VERSION: usize = 15;
    pub const MESSAGE_LENGTH: usize = 16;
    pub const FLAGS: usize = 20;
    pub const CORRECTION: usize = 22;
    pub const SOURCE_PORT_IDENTITY: usize = 34;
    pub const SEQUENCE_ID: usize = 44;
    pub const CONTROL: usize = 46;
    pub const LOG_MESSAGE_INTERVAL: usize = 47;
    pub const PRECISE_TIMESTAMP: usize = 48;
    pub const REQUESTING_PORT_IDENTITY: usize = 58;

    // Announce body
    pub const CURRENT_UTC_OFFSET: usize = 58;
    pub const PRIORITY_1: usize = 61;
    pub const CLOCK_QUALITY: usize = 62;
    pub const PRIORITY_2: usize = 66;
    pub const GRANDMASTER_IDENTITY: usize = 67;
    pub const STEPS_REMOVED: usize = 75;
    pub const TIME_SOURCE: usize = 77;
    pub const ANNOUNCE_TLV_TYPE: usize = 78;
    pub const ANNOUNCE_TLV_LENGTH: usize = 80;
    pub const PATH_SEQUENCE: usize = 82;

    // FollowUp information TLV
    pub const FOLLOW_UP_TLV_TYPE: usize = 58;
    pub const FOLLOW_UP_TLV_LENGTH: usize = 60;
    pub const FOLLOW_UP_ORGANIZATION_ID: usize = 62;
    pub const FOLLOW_UP_ORGANIZATION_SUBTYPE: usize = 65;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_lengths() {
        assert_eq!(MessageType::Sync.message_length(), 44);
        assert_eq!(MessageType::Announce.message_length(), 76);
        assert_eq!(MessageType::FollowUp.message_length(), 76);
        assert_eq!(MessageType::PDelayReq.message_length(), 54);
        assert_eq!(MessageType::PDelayResp.message_length(), 54);
        assert_eq!(MessageType::PDelayRespFollowUp.message_length(), 54);
    }

    #[test]
    fn message_type_conversion() {
        assert_eq!(MessageType::try_from(0xb).ok(), Some(MessageType::Announce));
        assert_eq!(u8::from(MessageType::PDelayRespFollowUp), 0xa);
        assert!(MessageType::try_from(0x1).is_err());
        assert!(MessageType::try_from(0xd).is_err());
    }
}
