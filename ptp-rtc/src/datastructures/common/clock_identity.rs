use core::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{format_octets, parse_octets, MacAddress};
use crate::datastructures::{read_array, write_bytes, WireFormat, WireFormatError};

/// The identity of a PTP node.
///
/// Must have a unique value for each node on the segment. The usual choice is
/// the EUI-64 derived from the MAC address of the port, see
/// [`ClockIdentity::from_mac_address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct ClockIdentity(pub [u8; 8]);

impl ClockIdentity {
    /// Build an EUI-64 by inserting `FF:FE` in the middle of a 48-bit MAC.
    pub fn from_mac_address(mac: MacAddress) -> Self {
        let [a, b, c, d, e, f] = mac.0;
        ClockIdentity([a, b, c, 0xff, 0xfe, d, e, f])
    }
}

impl WireFormat for ClockIdentity {
    fn wire_size(&self) -> usize {
        8
    }

    fn serialize(&self, buffer: &mut [u8]) -> Result<(), WireFormatError> {
        write_bytes(buffer, &self.0)
    }

    fn deserialize(buffer: &[u8]) -> Result<Self, WireFormatError> {
        Ok(Self(read_array(buffer)?))
    }
}

impl Display for ClockIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        format_octets(f, &self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid clock identity, expected 8 hexadecimal octets")]
pub struct InvalidClockIdentity;

impl FromStr for ClockIdentity {
    type Err = InvalidClockIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_octets(s).map(ClockIdentity).ok_or(InvalidClockIdentity)
    }
}

impl Serialize for ClockIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = String::deserialize(deserializer)?;
        data.parse().map_err(serde::de::Error::custom)
    }
}
