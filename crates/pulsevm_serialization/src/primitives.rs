use crate::{NumBytes, Read, ReadError, VarUint32, Write, WriteError, ensure_bytes, ensure_space};

macro_rules! impl_le_integer {
    ($($ty:ty),*) => {
        $(
            impl NumBytes for $ty {
                #[inline(always)]
                fn num_bytes(&self) -> usize {
                    core::mem::size_of::<$ty>()
                }
            }

            impl Read for $ty {
                #[inline(always)]
                fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
                    const SIZE: usize = core::mem::size_of::<$ty>();
                    ensure_bytes(bytes, *pos, SIZE)?;
                    let mut raw = [0u8; SIZE];
                    raw.copy_from_slice(&bytes[*pos..*pos + SIZE]);
                    *pos += SIZE;
                    Ok(<$ty>::from_le_bytes(raw))
                }
            }

            impl Write for $ty {
                #[inline(always)]
                fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
                    const SIZE: usize = core::mem::size_of::<$ty>();
                    ensure_space(bytes, *pos, SIZE)?;
                    bytes[*pos..*pos + SIZE].copy_from_slice(&self.to_le_bytes());
                    *pos += SIZE;
                    Ok(())
                }
            }
        )*
    };
}

impl_le_integer!(u8, i8, u16, i16, u32, i32, u64, i64);

impl NumBytes for bool {
    #[inline(always)]
    fn num_bytes(&self) -> usize {
        1
    }
}

impl Read for bool {
    #[inline(always)]
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        match u8::read(bytes, pos)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ReadError::ParseError),
        }
    }
}

impl Write for bool {
    #[inline(always)]
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        (*self as u8).write(bytes, pos)
    }
}

/// Collection lengths are written as `VarUint32`.
fn write_len(len: usize, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
    let len = u32::try_from(len).map_err(|_| WriteError::TryFromIntError)?;
    VarUint32(len).write(bytes, pos)
}

fn read_len(bytes: &[u8], pos: &mut usize) -> Result<usize, ReadError> {
    Ok(VarUint32::read(bytes, pos)?.0 as usize)
}

fn len_num_bytes(len: usize) -> usize {
    VarUint32::from(len).num_bytes()
}

impl NumBytes for String {
    #[inline]
    fn num_bytes(&self) -> usize {
        len_num_bytes(self.len()) + self.len()
    }
}

impl Read for String {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        let len = read_len(bytes, pos)?;
        ensure_bytes(bytes, *pos, len)?;
        let value = std::str::from_utf8(&bytes[*pos..*pos + len])
            .map_err(|_| ReadError::ParseError)?
            .to_owned();
        *pos += len;
        Ok(value)
    }
}

impl Write for String {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        write_len(self.len(), bytes, pos)?;
        ensure_space(bytes, *pos, self.len())?;
        bytes[*pos..*pos + self.len()].copy_from_slice(self.as_bytes());
        *pos += self.len();
        Ok(())
    }
}

impl<T: NumBytes> NumBytes for Option<T> {
    #[inline]
    fn num_bytes(&self) -> usize {
        match self {
            Some(value) => 1 + value.num_bytes(),
            None => 1,
        }
    }
}

impl<T: Read> Read for Option<T> {
    #[inline]
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        if bool::read(bytes, pos)? {
            Ok(Some(T::read(bytes, pos)?))
        } else {
            Ok(None)
        }
    }
}

impl<T: Write> Write for Option<T> {
    #[inline]
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.is_some().write(bytes, pos)?;
        if let Some(value) = self {
            value.write(bytes, pos)?;
        }
        Ok(())
    }
}

impl<T: NumBytes> NumBytes for Box<T> {
    #[inline]
    fn num_bytes(&self) -> usize {
        self.as_ref().num_bytes()
    }
}

impl<T: Read> Read for Box<T> {
    #[inline]
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        T::read(bytes, pos).map(Box::new)
    }
}

impl<T: Write> Write for Box<T> {
    #[inline]
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.as_ref().write(bytes, pos)
    }
}

impl<T: NumBytes> NumBytes for [T] {
    fn num_bytes(&self) -> usize {
        self.iter()
            .fold(len_num_bytes(self.len()), |count, item| count + item.num_bytes())
    }
}

impl<T: Write> Write for [T] {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        write_len(self.len(), bytes, pos)?;
        for item in self {
            item.write(bytes, pos)?;
        }
        Ok(())
    }
}

impl<T: NumBytes> NumBytes for Vec<T> {
    #[inline]
    fn num_bytes(&self) -> usize {
        self.as_slice().num_bytes()
    }
}

impl<T: Write> Write for Vec<T> {
    #[inline]
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.as_slice().write(bytes, pos)
    }
}

impl<T: Read> Read for Vec<T> {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        let len = read_len(bytes, pos)?;
        // every element takes at least one byte
        ensure_bytes(bytes, *pos, len)?;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(T::read(bytes, pos)?);
        }
        Ok(items)
    }
}

impl<T1: NumBytes, T2: NumBytes> NumBytes for (T1, T2) {
    #[inline]
    fn num_bytes(&self) -> usize {
        self.0.num_bytes() + self.1.num_bytes()
    }
}

impl<T1: Read, T2: Read> Read for (T1, T2) {
    #[inline]
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        let first = T1::read(bytes, pos)?;
        let second = T2::read(bytes, pos)?;
        Ok((first, second))
    }
}

impl<T1: Write, T2: Write> Write for (T1, T2) {
    #[inline]
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.0.write(bytes, pos)?;
        self.1.write(bytes, pos)
    }
}
