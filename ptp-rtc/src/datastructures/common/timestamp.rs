use serde::{Deserialize, Serialize};

use crate::datastructures::{read_array, write_bytes, WireFormat, WireFormatError};

pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// A time as held in the seconds and nanoseconds registers of the RTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// The seconds field of the timestamp. The two most significant bytes of
    /// the 48-bit wire field are reserved and always zero.
    pub seconds: u32,
    /// The nanoseconds field of the timestamp.
    /// Must be less than 10^9
    pub nanos: u32,
}

impl Timestamp {
    pub fn total_nanos(&self) -> u64 {
        self.seconds as u64 * NANOS_PER_SECOND as u64 + self.nanos as u64
    }

    pub fn from_total_nanos(nanos: u64) -> Self {
        Timestamp {
            seconds: (nanos / NANOS_PER_SECOND as u64) as u32,
            nanos: (nanos % NANOS_PER_SECOND as u64) as u32,
        }
    }
}

impl WireFormat for Timestamp {
    fn wire_size(&self) -> usize {
        10
    }

    fn serialize(&self, buffer: &mut [u8]) -> Result<(), WireFormatError> {
        if buffer.len() < 10 {
            return Err(WireFormatError::BufferTooShort);
        }
        buffer[0..2].fill(0);
        write_bytes(&mut buffer[2..6], &self.seconds.to_be_bytes())?;
        write_bytes(&mut buffer[6..10], &self.nanos.to_be_bytes())
    }

    fn deserialize(buffer: &[u8]) -> Result<Self, WireFormatError> {
        if buffer.len() < 10 {
            return Err(WireFormatError::BufferTooShort);
        }
        Ok(Self {
            seconds: u32::from_be_bytes(read_array(&buffer[2..6])?),
            nanos: u32::from_be_bytes(read_array(&buffer[6..10])?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_wireformat() {
        let representations = [
            (
                [0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01u8],
                Timestamp {
                    seconds: 0x0000_0002,
                    nanos: 0x0000_0001,
                },
            ),
            (
                [0x00, 0x00, 0x65, 0x4a, 0x1b, 0x80, 0x3b, 0x9a, 0xc9, 0xffu8],
                Timestamp {
                    seconds: 0x654a_1b80,
                    nanos: 999_999_999,
                },
            ),
        ];

        for (byte_representation, object_representation) in representations {
            // Test the serialization output
            let mut serialization_buffer = [0xaa; 10];
            WireFormat::serialize(&object_representation, &mut serialization_buffer).unwrap();
            assert_eq!(serialization_buffer, byte_representation);

            // Test the deserialization output
            let deserialized_data =
                <Timestamp as WireFormat>::deserialize(&byte_representation).unwrap();
            assert_eq!(deserialized_data, object_representation);
        }
    }

    #[test]
    fn reserved_bytes_are_ignored() {
        let bytes = [0xff, 0xff, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x06u8];
        assert_eq!(
            <Timestamp as WireFormat>::deserialize(&bytes).unwrap(),
            Timestamp {
                seconds: 5,
                nanos: 6
            }
        );
    }

    #[test]
    fn total_nanos() {
        let ts = Timestamp {
            seconds: 3,
            nanos: 250_000_000,
        };
        assert_eq!(ts.total_nanos(), 3_250_000_000);
        assert_eq!(Timestamp::from_total_nanos(3_250_000_000), ts);
    }
}
