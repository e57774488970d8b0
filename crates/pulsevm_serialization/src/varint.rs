use serde::{Deserialize, Serialize};

use crate::{NumBytes, Read, ReadError, Write, WriteError, ensure_space};

/// LEB128 encoded `u32`, used for every collection length on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarUint32(pub u32);

impl NumBytes for VarUint32 {
    #[inline(always)]
    fn num_bytes(&self) -> usize {
        let bits = 32 - self.0.leading_zeros() as usize;
        bits.div_ceil(7).max(1)
    }
}

impl Read for VarUint32 {
    #[inline]
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        let mut result = 0u32;
        let mut cursor = *pos;
        for i in 0..5 {
            let byte = *bytes.get(cursor).ok_or(ReadError::NotEnoughBytes)?;
            cursor += 1;
            let low7 = u32::from(byte & 0x7F);
            // the fifth group only has room for the top four bits
            if i == 4 && low7 > 0x0F {
                return Err(ReadError::Overflow);
            }
            result |= low7 << (7 * i);
            if byte & 0x80 == 0 {
                *pos = cursor;
                return Ok(VarUint32(result));
            }
        }
        Err(ReadError::Overflow)
    }
}

impl Write for VarUint32 {
    #[inline]
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        ensure_space(bytes, *pos, self.num_bytes())?;
        let mut v = self.0;
        loop {
            let mut byte = (v & 0x7F) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            bytes[*pos] = byte;
            *pos += 1;
            if v == 0 {
                return Ok(());
            }
        }
    }
}

impl From<usize> for VarUint32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from(v: usize) -> Self {
        Self(v as u32)
    }
}

impl From<u32> for VarUint32 {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl Serialize for VarUint32 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for VarUint32 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        u32::deserialize(deserializer).map(VarUint32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varuint_num_bytes() {
        assert_eq!(VarUint32(0).num_bytes(), 1);
        assert_eq!(VarUint32(127).num_bytes(), 1);
        assert_eq!(VarUint32(128).num_bytes(), 2);
        assert_eq!(VarUint32(0x3FFF).num_bytes(), 2);
        assert_eq!(VarUint32(0x4000).num_bytes(), 3);
        assert_eq!(VarUint32(0x0FFF_FFFF).num_bytes(), 4);
        assert_eq!(VarUint32(0x1000_0000).num_bytes(), 5);
        assert_eq!(VarUint32(u32::MAX).num_bytes(), 5);
    }

    #[test]
    fn varuint_read() {
        let mut p = 0;
        assert_eq!(
            VarUint32::read(&[0x80, 0x01], &mut p).unwrap(),
            VarUint32(128)
        );
        assert_eq!(p, 2);
        p = 0;
        assert_eq!(
            VarUint32::read(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F], &mut p).unwrap(),
            VarUint32(u32::MAX)
        );
        p = 0;
        assert_eq!(
            VarUint32::read(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F], &mut p),
            Err(ReadError::Overflow)
        );
        p = 0;
        assert_eq!(
            VarUint32::read(&[0x80], &mut p),
            Err(ReadError::NotEnoughBytes)
        );
    }

    #[test]
    fn varuint_write() {
        let mut buf = [0u8; 16];
        let mut p = 0;
        for v in [0u32, 1, 127, 128, 255] {
            VarUint32(v).write(&mut buf, &mut p).unwrap();
        }
        assert_eq!(&buf[..p], &[0x00, 0x01, 0x7F, 0x80, 0x01, 0xFF, 0x01]);
    }
}
