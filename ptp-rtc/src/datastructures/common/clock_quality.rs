use serde::{Deserialize, Serialize};

use crate::datastructures::{read_array, write_bytes, WireFormat, WireFormatError};

/// Quality of a grandmaster clock as advertised in Announce messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClockQuality {
    #[serde(rename = "class")]
    pub clock_class: u8,
    #[serde(rename = "accuracy")]
    pub clock_accuracy: u8,
    pub offset_scaled_log_variance: u16,
}

impl ClockQuality {
    /// The quality as a single number, in the order used by the BMCA:
    /// `class << 24 | accuracy << 16 | variance`.
    pub fn packed(&self) -> u32 {
        (self.clock_class as u32) << 24
            | (self.clock_accuracy as u32) << 16
            | self.offset_scaled_log_variance as u32
    }

    pub fn from_packed(value: u32) -> Self {
        let [clock_class, clock_accuracy, variance_high, variance_low] = value.to_be_bytes();
        ClockQuality {
            clock_class,
            clock_accuracy,
            offset_scaled_log_variance: u16::from_be_bytes([variance_high, variance_low]),
        }
    }
}

impl Default for ClockQuality {
    /// Class 248 (default), accuracy unknown, variance 0x4100.
    fn default() -> Self {
        ClockQuality::from_packed(0xf8fe_4100)
    }
}

impl WireFormat for ClockQuality {
    fn wire_size(&self) -> usize {
        4
    }

    fn serialize(&self, buffer: &mut [u8]) -> Result<(), WireFormatError> {
        write_bytes(buffer, &self.packed().to_be_bytes())
    }

    fn deserialize(buffer: &[u8]) -> Result<Self, WireFormatError> {
        Ok(Self::from_packed(u32::from_be_bytes(read_array(buffer)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_quality_wireformat() {
        let representations = [
            (
                [0xf8, 0xfe, 0x41, 0x00u8],
                ClockQuality {
                    clock_class: 248,
                    clock_accuracy: 0xfe,
                    offset_scaled_log_variance: 0x4100,
                },
            ),
            (
                [0x06, 0x21, 0x00, 0x01u8],
                ClockQuality {
                    clock_class: 6,
                    clock_accuracy: 0x21,
                    offset_scaled_log_variance: 1,
                },
            ),
        ];

        for (byte_representation, object_representation) in representations {
            let mut serialization_buffer = [0; 4];
            WireFormat::serialize(&object_representation, &mut serialization_buffer).unwrap();
            assert_eq!(serialization_buffer, byte_representation);

            let deserialized_data =
                <ClockQuality as WireFormat>::deserialize(&byte_representation).unwrap();
            assert_eq!(deserialized_data, object_representation);
        }
    }

    #[test]
    fn packed_orders_class_first() {
        let good_class = ClockQuality {
            clock_class: 6,
            clock_accuracy: 0xfe,
            offset_scaled_log_variance: 0xffff,
        };
        let good_accuracy = ClockQuality {
            clock_class: 7,
            clock_accuracy: 0x20,
            offset_scaled_log_variance: 0,
        };
        assert!(good_class.packed() < good_accuracy.packed());
        assert_eq!(ClockQuality::default().packed(), 0xf8fe_4100);
    }
}
