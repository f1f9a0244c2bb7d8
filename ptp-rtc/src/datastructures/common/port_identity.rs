use core::fmt::Display;

use serde::{Deserialize, Serialize};

use super::clock_identity::ClockIdentity;
use crate::datastructures::{read_array, write_bytes, WireFormat, WireFormatError};

/// A clock identity plus the number of one of its ports, identifying the
/// sender of every PTP message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortIdentity {
    pub clock_identity: ClockIdentity,
    pub port_number: u16,
}

impl PortIdentity {
    pub(crate) const WIRE_SIZE: usize = 10;
}

impl WireFormat for PortIdentity {
    fn wire_size(&self) -> usize {
        Self::WIRE_SIZE
    }

    fn serialize(&self, buffer: &mut [u8]) -> Result<(), WireFormatError> {
        let buffer = buffer
            .get_mut(..Self::WIRE_SIZE)
            .ok_or(WireFormatError::BufferTooShort)?;
        let (clock, port) = buffer.split_at_mut(8);
        WireFormat::serialize(&self.clock_identity, clock)?;
        write_bytes(port, &self.port_number.to_be_bytes())
    }

    fn deserialize(buffer: &[u8]) -> Result<Self, WireFormatError> {
        let buffer = buffer
            .get(..Self::WIRE_SIZE)
            .ok_or(WireFormatError::BufferTooShort)?;
        let (clock, port) = buffer.split_at(8);
        Ok(PortIdentity {
            clock_identity: <ClockIdentity as WireFormat>::deserialize(clock)?,
            port_number: u16::from_be_bytes(read_array(port)?),
        })
    }
}

impl Display for PortIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.clock_identity, self.port_number)
    }
}
