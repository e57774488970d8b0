use core::fmt;

use pulsevm_serialization::{NumBytes, Read, ReadError, VarUint32, Write, WriteError};
use serde::{Deserialize, Serialize};

/// Length-prefixed opaque byte string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new(data: Vec<u8>) -> Self {
        Bytes(data)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl NumBytes for Bytes {
    #[inline]
    fn num_bytes(&self) -> usize {
        VarUint32::from(self.0.len()).num_bytes() + self.0.len()
    }
}

impl Read for Bytes {
    #[inline]
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        let len = VarUint32::read(bytes, pos)?.0 as usize;
        let data = bytes
            .get(*pos..*pos + len)
            .ok_or(ReadError::NotEnoughBytes)?
            .to_vec();
        *pos += len;
        Ok(Bytes(data))
    }
}

impl Write for Bytes {
    #[inline]
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        let len = u32::try_from(self.0.len()).map_err(|_| WriteError::TryFromIntError)?;
        VarUint32(len).write(bytes, pos)?;
        let target = bytes
            .get_mut(*pos..*pos + self.0.len())
            .ok_or(WriteError::NotEnoughSpace)?;
        target.copy_from_slice(&self.0);
        *pos += self.0.len();
        Ok(())
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex::encode(self.0.as_slice()).fmt(f)
    }
}

impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_string = String::deserialize(deserializer)?;
        let bytes = hex::decode(hex_string).map_err(serde::de::Error::custom)?;
        Ok(Bytes(bytes))
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(data: Vec<u8>) -> Self {
        Bytes(data)
    }
}

impl From<&[u8]> for Bytes {
    fn from(data: &[u8]) -> Self {
        Bytes(data.to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
