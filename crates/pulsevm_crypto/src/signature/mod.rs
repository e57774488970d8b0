use core::fmt;

use pulsevm_serialization::{NumBytes, Read, ReadError, Write, WriteError};
use serde::{Deserialize, Serialize};

use crate::FixedBytes;

/// Key type tag of a K1 (secp256k1) signature.
pub const K1_KEY_TYPE: u8 = 0;

/// Compact recoverable secp256k1 signature as it appears on the wire: a key
/// type tag followed by 65 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signature(pub FixedBytes<65>);

impl Signature {
    pub const fn new(bytes: [u8; 65]) -> Self {
        Signature(FixedBytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG_K1_{}", self.0)
    }
}

impl NumBytes for Signature {
    #[inline]
    fn num_bytes(&self) -> usize {
        1 + 65
    }
}

impl Read for Signature {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        if u8::read(bytes, pos)? != K1_KEY_TYPE {
            return Err(ReadError::ParseError);
        }
        FixedBytes::<65>::read(bytes, pos).map(Signature)
    }
}

impl Write for Signature {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        K1_KEY_TYPE.write(bytes, pos)?;
        self.0.write(bytes, pos)
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let hex_part = s
            .strip_prefix("SIG_K1_")
            .ok_or_else(|| serde::de::Error::custom("unsupported signature prefix"))?;
        let raw = hex::decode(hex_part).map_err(serde::de::Error::custom)?;
        FixedBytes::try_from(raw.as_slice())
            .map(Signature)
            .map_err(serde::de::Error::custom)
    }
}
