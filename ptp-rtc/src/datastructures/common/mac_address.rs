use core::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{format_octets, parse_octets};

/// A 48-bit Ethernet address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// The non-forwardable multicast address used by the peer delay mechanism.
    pub const PTP_PEER_MULTICAST: MacAddress = MacAddress([0x01, 0x80, 0xc2, 0x00, 0x00, 0x0e]);

    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl Display for MacAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        format_octets(f, &self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid MAC address, expected 6 hexadecimal octets")]
pub struct InvalidMacAddress;

impl FromStr for MacAddress {
    type Err = InvalidMacAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_octets(s).map(MacAddress).ok_or(InvalidMacAddress)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data = String::deserialize(deserializer)?;
        data.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_multicast() {
        assert!(MacAddress::PTP_PEER_MULTICAST.is_multicast());
        assert!(!MacAddress([0x00, 0x0a, 0x35, 0x01, 0x02, 0x03]).is_multicast());
        assert_eq!(
            "01:80:C2:00:00:0E".parse::<MacAddress>(),
            Ok(MacAddress::PTP_PEER_MULTICAST)
        );
    }
}
