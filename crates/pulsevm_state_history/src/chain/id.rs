use core::fmt;
use std::str::FromStr;

use pulsevm_crypto::FixedBytes;
use pulsevm_serialization::{NumBytes, Read, ReadError, Write, WriteError};
use serde::Serialize;

/// Transaction id: sha256 of the packed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Id(pub FixedBytes<32>);

impl Id {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Id(FixedBytes(bytes))
    }

    pub fn hash(data: impl AsRef<[u8]>) -> Self {
        Id(FixedBytes::hash(data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0.0
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid hex string for id")]
pub struct IdParseError;

impl FromStr for Id {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| IdParseError)?;
        let array: [u8; 32] = bytes.try_into().map_err(|_| IdParseError)?;
        Ok(Id::new(array))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl NumBytes for Id {
    #[inline]
    fn num_bytes(&self) -> usize {
        32
    }
}

impl Read for Id {
    #[inline]
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        FixedBytes::read(bytes, pos).map(Id)
    }
}

impl Write for Id {
    #[inline]
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.0.write(bytes, pos)
    }
}
