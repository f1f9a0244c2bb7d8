use super::{offsets, Frame, MessageType, MAX_FRAME_LEN, PTP_ETHERTYPE, PTP_VERSION};
use crate::datastructures::{
    common::{ClockIdentity, ClockQuality, MacAddress, PortIdentity, Timestamp},
    WireFormat,
};

const FLAG_TWO_STEP: u16 = 0x0200;
const FLAG_PTP_TIMESCALE: u16 = 0x0008;

const CONTROL_OTHER: u8 = 0x05;
const LOG_INTERVAL_UNUSED: i8 = 0x7f;

const TLV_FOLLOW_UP_INFORMATION: u16 = 0x0003;
const TLV_PATH_TRACE: u16 = 0x0008;
const IEEE_802_1_ORGANIZATION_ID: [u8; 3] = [0x00, 0x80, 0xc2];
const FOLLOW_UP_ORGANIZATION_SUBTYPE: [u8; 3] = [0x00, 0x00, 0x01];

/// The static content shared by the transmit templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTemplate {
    pub destination_mac: MacAddress,
    pub source_mac: MacAddress,
    pub source_port_identity: PortIdentity,
    pub priority_1: u8,
    pub priority_2: u8,
    pub clock_quality: ClockQuality,
    pub time_source: u8,
    pub log_announce_interval: i8,
    pub log_sync_interval: i8,
}

/// A transmit buffer for one message type. The static fields are written once
/// on construction, the rest is patched right before each send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFrame {
    buf: [u8; MAX_FRAME_LEN],
    message_type: MessageType,
}

impl TxFrame {
    fn new(message_type: MessageType, template: &FrameTemplate) -> Self {
        let mut frame = TxFrame {
            buf: [0; MAX_FRAME_LEN],
            message_type,
        };

        frame.put(offsets::DESTINATION_MAC, &template.destination_mac.0);
        frame.put(offsets::SOURCE_MAC, &template.source_mac.0);
        frame.put_u16(offsets::ETHERTYPE, PTP_ETHERTYPE);
        frame.put(offsets::MESSAGE_TYPE, &[message_type.into(), PTP_VERSION]);
        frame.put_u16(offsets::MESSAGE_LENGTH, message_type.message_length());
        frame.write(offsets::SOURCE_PORT_IDENTITY, &template.source_port_identity);

        frame
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.message_type.frame_length()]
    }

    pub fn view(&self) -> Frame<'_> {
        Frame::trusted(self.as_bytes(), self.message_type)
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) {
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn put_u16(&mut self, offset: usize, value: u16) {
        self.put(offset, &value.to_be_bytes());
    }

    fn write<T: WireFormat>(&mut self, offset: usize, value: &T) {
        let written = value.serialize(&mut self.buf[offset..offset + value.wire_size()]);
        debug_assert!(written.is_ok());
    }

    pub fn sequence_id(&self) -> u16 {
        self.view().sequence_id()
    }

    pub fn set_sequence_id(&mut self, sequence_id: u16) {
        self.put_u16(offsets::SEQUENCE_ID, sequence_id);
    }

    /// Increments the sequence id in place, returning the new value.
    pub fn inc_sequence_id(&mut self) -> u16 {
        let sequence_id = self.sequence_id().wrapping_add(1);
        self.set_sequence_id(sequence_id);
        sequence_id
    }

    pub fn set_correction_field(&mut self, correction: u32) {
        self.put(offsets::CORRECTION, &correction.to_be_bytes());
    }

    pub fn set_precise_timestamp(&mut self, timestamp: Timestamp) {
        self.write(offsets::PRECISE_TIMESTAMP, &timestamp);
    }

    pub fn set_requesting_port_identity(&mut self, identity: PortIdentity) {
        self.write(offsets::REQUESTING_PORT_IDENTITY, &identity);
    }

    fn set_flags(&mut self, flags: u16) {
        self.put_u16(offsets::FLAGS, flags);
    }

    fn set_control(&mut self, control: u8, log_message_interval: i8) {
        self.put(offsets::CONTROL, &[control, log_message_interval as u8]);
    }
}

/// One [`TxFrame`] per message type this engine sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFrames {
    pub announce: TxFrame,
    pub sync: TxFrame,
    pub follow_up: TxFrame,
    pub pdelay_req: TxFrame,
    pub pdelay_resp: TxFrame,
    pub pdelay_resp_follow_up: TxFrame,
}

impl TxFrames {
    pub fn new(template: &FrameTemplate) -> Self {
        let own_identity: ClockIdentity = template.source_port_identity.clock_identity;

        let mut announce = TxFrame::new(MessageType::Announce, template);
        announce.set_flags(FLAG_PTP_TIMESCALE);
        announce.set_control(CONTROL_OTHER, template.log_announce_interval);
        announce.put(offsets::PRIORITY_1, &[template.priority_1]);
        announce.write(offsets::CLOCK_QUALITY, &template.clock_quality);
        announce.put(offsets::PRIORITY_2, &[template.priority_2]);
        announce.write(offsets::GRANDMASTER_IDENTITY, &own_identity);
        announce.put_u16(offsets::STEPS_REMOVED, 0);
        announce.put(offsets::TIME_SOURCE, &[template.time_source]);
        announce.put_u16(offsets::ANNOUNCE_TLV_TYPE, TLV_PATH_TRACE);
        announce.put_u16(offsets::ANNOUNCE_TLV_LENGTH, 8);
        announce.write(offsets::PATH_SEQUENCE, &own_identity);

        let mut sync = TxFrame::new(MessageType::Sync, template);
        sync.set_flags(FLAG_TWO_STEP);
        sync.set_control(0x00, template.log_sync_interval);

        let mut follow_up = TxFrame::new(MessageType::FollowUp, template);
        follow_up.set_control(CONTROL_OTHER, template.log_sync_interval);
        follow_up.put_u16(offsets::FOLLOW_UP_TLV_TYPE, TLV_FOLLOW_UP_INFORMATION);
        follow_up.put_u16(offsets::FOLLOW_UP_TLV_LENGTH, 28);
        follow_up.put(offsets::FOLLOW_UP_ORGANIZATION_ID, &IEEE_802_1_ORGANIZATION_ID);
        follow_up.put(
            offsets::FOLLOW_UP_ORGANIZATION_SUBTYPE,
            &FOLLOW_UP_ORGANIZATION_SUBTYPE,
        );

        let mut pdelay_req = TxFrame::new(MessageType::PDelayReq, template);
        pdelay_req.set_control(CONTROL_OTHER, LOG_INTERVAL_UNUSED);

        let mut pdelay_resp = TxFrame::new(MessageType::PDelayResp, template);
        pdelay_resp.set_control(CONTROL_OTHER, LOG_INTERVAL_UNUSED);

        let mut pdelay_resp_follow_up = TxFrame::new(MessageType::PDelayRespFollowUp, template);
        pdelay_resp_follow_up.set_control(CONTROL_OTHER, LOG_INTERVAL_UNUSED);

        TxFrames {
            announce,
            sync,
            follow_up,
            pdelay_req,
            pdelay_resp,
            pdelay_resp_follow_up,
        }
    }
}
