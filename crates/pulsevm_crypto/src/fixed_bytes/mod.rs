use core::fmt;

use pulsevm_serialization::{NumBytes, Read, ReadError, Write, WriteError};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedBytes<const N: usize>(pub [u8; N]);

impl<const N: usize> FixedBytes<N> {
    #[inline]
    pub const fn new(bytes: [u8; N]) -> Self {
        FixedBytes(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }
}

impl FixedBytes<32> {
    #[inline]
    pub fn hash(data: impl AsRef<[u8]>) -> Self {
        FixedBytes(crate::Digest::hash(data).0)
    }
}

impl<const N: usize> fmt::Display for FixedBytes<N> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    #[inline]
    fn default() -> Self {
        FixedBytes([0u8; N])
    }
}

impl<const N: usize> NumBytes for FixedBytes<N> {
    #[inline]
    fn num_bytes(&self) -> usize {
        N
    }
}

impl<const N: usize> Write for FixedBytes<N> {
    #[inline]
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        let target = bytes
            .get_mut(*pos..*pos + N)
            .ok_or(WriteError::NotEnoughSpace)?;
        target.copy_from_slice(&self.0);
        *pos += N;
        Ok(())
    }
}

impl<const N: usize> Read for FixedBytes<N> {
    #[inline]
    fn read(data: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        let source = data.get(*pos..*pos + N).ok_or(ReadError::NotEnoughBytes)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(source);
        *pos += N;
        Ok(FixedBytes(bytes))
    }
}

impl<const N: usize> Serialize for FixedBytes<N> {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

impl<const N: usize> AsRef<[u8]> for FixedBytes<N> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> TryFrom<&[u8]> for FixedBytes<N> {
    type Error = ReadError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; N] = value.try_into().map_err(|_| ReadError::NotEnoughBytes)?;
        Ok(FixedBytes(bytes))
    }
}
