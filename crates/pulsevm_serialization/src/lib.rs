mod primitives;

mod varint;
pub use varint::VarUint32;

use thiserror::Error;

/// Error that can be returned when writing bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WriteError {
    /// Not enough space in the target buffer.
    #[error("not enough space to write value")]
    NotEnoughSpace,
    /// Failed to convert an integer.
    #[error("integer does not fit the wire type")]
    TryFromIntError,
}

/// Error that can be returned when reading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadError {
    /// Not enough bytes left in the source buffer.
    #[error("not enough bytes to read value")]
    NotEnoughBytes,
    /// A varint did not fit into 32 bits.
    #[error("varint overflow")]
    Overflow,
    /// Malformed input.
    #[error("parse error")]
    ParseError,
}

/// Size of the binary encoding of a value.
pub trait NumBytes {
    fn num_bytes(&self) -> usize;
}

pub trait Read: Sized {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError>;

    /// Reads a value that must span the whole input.
    #[inline]
    fn unpack(bytes: &[u8]) -> Result<Self, ReadError> {
        let mut pos = 0;
        let value = Self::read(bytes, &mut pos)?;
        if pos != bytes.len() {
            return Err(ReadError::ParseError);
        }
        Ok(value)
    }
}

pub trait Write: NumBytes {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError>;

    #[inline]
    fn pack(&self) -> Result<Vec<u8>, WriteError> {
        let mut bytes = vec![0u8; self.num_bytes()];
        let mut pos = 0;
        self.write(&mut bytes, &mut pos)?;
        bytes.truncate(pos);
        Ok(bytes)
    }
}

#[inline]
pub(crate) fn ensure_space(bytes: &[u8], pos: usize, need: usize) -> Result<(), WriteError> {
    if bytes.len() < pos + need {
        return Err(WriteError::NotEnoughSpace);
    }
    Ok(())
}

#[inline]
pub(crate) fn ensure_bytes(bytes: &[u8], pos: usize, need: usize) -> Result<(), ReadError> {
    if bytes.len() < pos + need {
        return Err(ReadError::NotEnoughBytes);
    }
    Ok(())
}
