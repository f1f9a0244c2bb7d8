use super::{offsets, MessageType, PTP_ETHERTYPE, PTP_VERSION};
use crate::datastructures::{
    common::{ClockIdentity, ClockQuality, MacAddress, PortIdentity, Timestamp},
    read_array, WireFormat, WireFormatError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame of {actual} bytes is shorter than the required {required} bytes")]
    TooShort { required: usize, actual: usize },
    #[error("not a PTP frame (ethertype {0:#06x})")]
    NotPtp(u16),
    #[error("unsupported PTP version {0}")]
    UnsupportedVersion(u8),
    #[error("unknown message type: {0}")]
    MessageType(#[from] WireFormatError),
}

/// A received (or template) frame whose length has been checked against its
/// message type.
///
/// All accessors are infallible: [`Frame::new`] guarantees that every field
/// of the message type lies within the buffer.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    data: &'a [u8],
    message_type: MessageType,
}

impl<'a> Frame<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, FrameError> {
        let header_len = offsets::VERSION + 1;
        if data.len() < header_len {
            return Err(FrameError::TooShort {
                required: header_len,
                actual: data.len(),
            });
        }

        let ethertype = u16::from_be_bytes([data[offsets::ETHERTYPE], data[offsets::ETHERTYPE + 1]]);
        if ethertype != PTP_ETHERTYPE {
            return Err(FrameError::NotPtp(ethertype));
        }

        let version = data[offsets::VERSION] & 0x0f;
        if version != PTP_VERSION {
            return Err(FrameError::UnsupportedVersion(version));
        }

        let message_type = MessageType::try_from(data[offsets::MESSAGE_TYPE] & 0x0f)
            .map_err(WireFormatError::from)?;

        let required = message_type.frame_length();
        if data.len() < required {
            return Err(FrameError::TooShort {
                required,
                actual: data.len(),
            });
        }

        Ok(Frame { data, message_type })
    }

    /// Wraps a buffer this crate built itself.
    pub(crate) fn trusted(data: &'a [u8], message_type: MessageType) -> Self {
        debug_assert!(data.len() >= message_type.frame_length());
        Frame { data, message_type }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    fn field(&self, offset: usize, len: usize) -> &'a [u8] {
        self.data.get(offset..offset + len).unwrap_or(&[])
    }

    fn u8_at(&self, offset: usize) -> u8 {
        self.data.get(offset).copied().unwrap_or_default()
    }

    fn u16_at(&self, offset: usize) -> u16 {
        read_array(self.field(offset, 2))
            .map(u16::from_be_bytes)
            .unwrap_or_default()
    }

    fn u32_at(&self, offset: usize) -> u32 {
        read_array(self.field(offset, 4))
            .map(u32::from_be_bytes)
            .unwrap_or_default()
    }

    fn decode<T: WireFormat + Default>(&self, offset: usize, len: usize) -> T {
        T::deserialize(self.field(offset, len)).unwrap_or_default()
    }

    pub fn destination_mac(&self) -> MacAddress {
        MacAddress(read_array(self.field(offsets::DESTINATION_MAC, 6)).unwrap_or_default())
    }

    pub fn source_mac(&self) -> MacAddress {
        MacAddress(read_array(self.field(offsets::SOURCE_MAC, 6)).unwrap_or_default())
    }

    pub fn flags(&self) -> u16 {
        self.u16_at(offsets::FLAGS)
    }

    /// The correction field, taken as a plain nanosecond count.
    pub fn correction_field(&self) -> u32 {
        self.u32_at(offsets::CORRECTION)
    }

    pub fn source_port_identity(&self) -> PortIdentity {
        self.decode(offsets::SOURCE_PORT_IDENTITY, 10)
    }

    pub fn sequence_id(&self) -> u16 {
        self.u16_at(offsets::SEQUENCE_ID)
    }

    pub fn control(&self) -> u8 {
        self.u8_at(offsets::CONTROL)
    }

    pub fn log_message_interval(&self) -> i8 {
        self.u8_at(offsets::LOG_MESSAGE_INTERVAL) as i8
    }

    /// originTimestamp, preciseOriginTimestamp, requestReceiptTimestamp or
    /// responseOriginTimestamp, depending on the message type.
    pub fn precise_timestamp(&self) -> Timestamp {
        self.decode(offsets::PRECISE_TIMESTAMP, 10)
    }

    /// Only meaningful for PDelayResp and PDelayRespFollowUp.
    pub fn requesting_port_identity(&self) -> PortIdentity {
        self.decode(offsets::REQUESTING_PORT_IDENTITY, 10)
    }

    pub fn current_utc_offset(&self) -> i16 {
        self.u16_at(offsets::CURRENT_UTC_OFFSET) as i16
    }

    pub fn grandmaster_priority_1(&self) -> u8 {
        self.u8_at(offsets::PRIORITY_1)
    }

    pub fn grandmaster_clock_quality(&self) -> ClockQuality {
        ClockQuality::from_packed(self.u32_at(offsets::CLOCK_QUALITY))
    }

    pub fn grandmaster_priority_2(&self) -> u8 {
        self.u8_at(offsets::PRIORITY_2)
    }

    pub fn grandmaster_identity(&self) -> ClockIdentity {
        self.decode(offsets::GRANDMASTER_IDENTITY, 8)
    }

    pub fn steps_removed(&self) -> u16 {
        self.u16_at(offsets::STEPS_REMOVED)
    }

    pub fn time_source(&self) -> u8 {
        self.u8_at(offsets::TIME_SOURCE)
    }
}
