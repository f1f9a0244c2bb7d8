//! General datastructures as they appear on the wire

use core::fmt::Debug;

pub mod common;
pub mod messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WireFormatError {
    #[error("enum conversion failed")]
    EnumConversionError,
    #[error("buffer too short")]
    BufferTooShort,
}

impl<Enum: num_enum::TryFromPrimitive> From<num_enum::TryFromPrimitiveError<Enum>>
    for WireFormatError
{
    fn from(_: num_enum::TryFromPrimitiveError<Enum>) -> Self {
        Self::EnumConversionError
    }
}

pub(crate) trait WireFormat: Debug + Clone + Eq {
    /// The byte size on the wire of this object
    fn wire_size(&self) -> usize;

    /// Serializes the object into the PTP wire format.
    fn serialize(&self, buffer: &mut [u8]) -> Result<(), WireFormatError>;

    /// Deserializes the object from the PTP wire format.
    fn deserialize(buffer: &[u8]) -> Result<Self, WireFormatError>;
}

/// Copies the first `N` bytes of `buffer` into an array.
pub(crate) fn read_array<const N: usize>(buffer: &[u8]) -> Result<[u8; N], WireFormatError> {
    buffer
        .get(..N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(WireFormatError::BufferTooShort)
}

pub(crate) fn write_bytes(buffer: &mut [u8], bytes: &[u8]) -> Result<(), WireFormatError> {
    buffer
        .get_mut(..bytes.len())
        .ok_or(WireFormatError::BufferTooShort)?
        .copy_from_slice(bytes);
    Ok(())
}
