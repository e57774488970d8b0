use core::fmt;

use pulsevm_serialization::{NumBytes, Read, ReadError, Write, WriteError};
use serde::Serialize;
use sha2::Digest as ShaDigest;

use crate::FixedBytes;

/// sha256 digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    #[inline]
    pub fn hash(data: impl AsRef<[u8]>) -> Self {
        Digest(sha2::Sha256::digest(data.as_ref()).into())
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl NumBytes for Digest {
    #[inline]
    fn num_bytes(&self) -> usize {
        32
    }
}

impl Write for Digest {
    #[inline]
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        FixedBytes(self.0).write(bytes, pos)
    }
}

impl Read for Digest {
    #[inline]
    fn read(data: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        FixedBytes::<32>::read(data, pos).map(|fixed| Digest(fixed.0))
    }
}

impl Serialize for Digest {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_of_empty_input() {
        assert_eq!(
            Digest::hash(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
