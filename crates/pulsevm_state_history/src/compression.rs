//! Length-framed zlib sections.
//!
//! A section is `[u32 len][len bytes]`. The length is written as a placeholder
//! and back-patched once the payload is out, so writers can stream into a file
//! without knowing the compressed size up front. An empty collection is framed
//! as `[u32 0]` and never touches the compressor.

use std::io::{self, Read as _, Seek, SeekFrom, Write as _};

use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use pulsevm_serialization::{Read, Write, WriteError};

use crate::error::StateHistoryError;

const LEN_SIZE: usize = core::mem::size_of::<u32>();

/// Reserves a `u32` length slot in `strm` and back-patches it on `finish`.
#[derive(Debug)]
#[must_use = "the length placeholder is only filled in by finish()"]
pub struct LengthWriter {
    start_pos: u64,
}

impl LengthWriter {
    pub fn begin<S: io::Write + Seek>(strm: &mut S) -> Result<Self, StateHistoryError> {
        strm.write_all(&0u32.to_le_bytes())?;
        Ok(LengthWriter {
            start_pos: strm.stream_position()?,
        })
    }

    /// Writes the number of bytes emitted since `begin` into the placeholder and
    /// leaves the stream positioned after the payload.
    pub fn finish<S: io::Write + Seek>(self, strm: &mut S) -> Result<u32, StateHistoryError> {
        let end_pos = strm.stream_position()?;
        let len = u32::try_from(end_pos - self.start_pos).map_err(|_| WriteError::TryFromIntError)?;
        strm.seek(SeekFrom::Start(self.start_pos - LEN_SIZE as u64))?;
        strm.write_all(&len.to_le_bytes())?;
        strm.seek(SeekFrom::Start(end_pos))?;
        Ok(len)
    }
}

/// Writes `items` as one compressed section.
pub fn zlib_pack<S, T>(strm: &mut S, items: &[T], level: Compression) -> Result<(), StateHistoryError>
where
    S: io::Write + Seek,
    T: Write,
{
    if items.is_empty() {
        strm.write_all(&0u32.to_le_bytes())?;
        return Ok(());
    }
    let len_writer = LengthWriter::begin(strm)?;
    let mut encoder = ZlibEncoder::new(&mut *strm, level);
    encoder.write_all(&items.pack()?)?;
    encoder.finish()?;
    len_writer.finish(strm)?;
    Ok(())
}

/// Returns the body of the section starting at `pos` and moves `pos` past it.
pub fn read_section<'a>(buffer: &'a [u8], pos: &mut usize) -> Result<&'a [u8], StateHistoryError> {
    let remaining = buffer.len().saturating_sub(*pos);
    let len = u32::read(buffer, pos).map_err(|_| StateHistoryError::OutOfRange {
        needed: LEN_SIZE,
        remaining,
    })? as usize;
    let remaining = buffer.len() - *pos;
    if len > remaining {
        return Err(StateHistoryError::OutOfRange {
            needed: len,
            remaining,
        });
    }
    let section = &buffer[*pos..*pos + len];
    *pos += len;
    Ok(section)
}

/// Reads a section written by [`zlib_pack`] from an in-memory entry.
pub fn zlib_unpack<T: Read>(buffer: &[u8], pos: &mut usize) -> Result<Vec<T>, StateHistoryError> {
    let section = read_section(buffer, pos)?;
    if section.is_empty() {
        return Ok(Vec::new());
    }
    let decompressed = zlib_decompress(section)?;
    Ok(Vec::<T>::unpack(&decompressed)?)
}

/// Reads a section written by [`zlib_pack`] from a sequential stream. The
/// decompressor never sees bytes beyond the declared length.
pub fn zlib_unpack_from<R, T>(reader: &mut R) -> Result<Vec<T>, StateHistoryError>
where
    R: io::Read,
    T: Read,
{
    let len = read_len(reader)?;
    if len == 0 {
        return Ok(Vec::new());
    }
    let mut source = RestrictedSource::new(reader, len);
    let mut decompressed = Vec::new();
    let result = ZlibDecoder::new(&mut source).read_to_end(&mut decompressed);
    source.check(result)?;
    // the decoder may stop short of the declared length; realign on the section end
    let drained = io::copy(&mut source, &mut io::sink());
    source.check(drained)?;
    Ok(Vec::<T>::unpack(&decompressed)?)
}

fn read_len<R: io::Read>(reader: &mut R) -> Result<usize, StateHistoryError> {
    let mut raw = [0u8; LEN_SIZE];
    match reader.read_exact(&mut raw) {
        Ok(()) => Ok(u32::from_le_bytes(raw) as usize),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(StateHistoryError::OutOfRange {
            needed: LEN_SIZE,
            remaining: 0,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Limits reads from `inner` to the declared section length and reports a
/// section that ends before its declared length.
pub struct RestrictedSource<'a, R> {
    inner: &'a mut R,
    len: usize,
    remaining: usize,
    truncated: bool,
}

impl<'a, R: io::Read> RestrictedSource<'a, R> {
    pub fn new(inner: &'a mut R, len: usize) -> Self {
        RestrictedSource {
            inner,
            len,
            remaining: len,
            truncated: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Maps the result of a read through this source into the log error space.
    pub fn check<T>(&self, result: io::Result<T>) -> Result<T, StateHistoryError> {
        match result {
            Ok(value) if !self.truncated => Ok(value),
            Ok(_) => Err(self.out_of_range()),
            Err(_) if self.truncated => Err(self.out_of_range()),
            Err(e) => Err(e.into()),
        }
    }

    fn out_of_range(&self) -> StateHistoryError {
        StateHistoryError::OutOfRange {
            needed: self.len,
            remaining: self.len - self.remaining,
        }
    }
}

impl<R: io::Read> io::Read for RestrictedSource<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let n = buf.len().min(self.remaining);
        let got = self.inner.read(&mut buf[..n])?;
        if got == 0 {
            self.truncated = true;
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("read datastream over by {}", self.remaining),
            ));
        }
        self.remaining -= got;
        Ok(got)
    }
}

pub fn zlib_compress_bytes(data: &[u8], level: Compression) -> Result<Vec<u8>, StateHistoryError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

pub fn zlib_decompress(data: &[u8]) -> Result<Vec<u8>, StateHistoryError> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| StateHistoryError::Corrupt(format!("zlib decompress failed: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pulsevm_crypto::Bytes;

    use super::*;

    fn segments() -> Vec<Bytes> {
        vec![Bytes::from(vec![1u8; 300]), Bytes::from(&b"cfd"[..])]
    }

    #[test]
    fn empty_collection_is_written_as_zero_length() {
        let mut strm = Cursor::new(Vec::new());
        zlib_pack::<_, Bytes>(&mut strm, &[], Compression::default()).unwrap();
        assert_eq!(strm.into_inner(), vec![0, 0, 0, 0]);

        let mut pos = 0;
        let items: Vec<Bytes> = zlib_unpack(&[0, 0, 0, 0], &mut pos).unwrap();
        assert!(items.is_empty());
        assert_eq!(pos, 4);
    }

    #[test]
    fn length_is_back_patched() {
        let mut strm = Cursor::new(Vec::new());
        strm.write_all(b"head").unwrap();
        zlib_pack(&mut strm, &segments(), Compression::default()).unwrap();
        let end = strm.position() as usize;
        let buffer = strm.into_inner();
        assert_eq!(end, buffer.len());

        let declared = u32::from_le_bytes(buffer[4..8].try_into().unwrap()) as usize;
        assert_eq!(declared, buffer.len() - 8);

        let mut pos = 4;
        let items: Vec<Bytes> = zlib_unpack(&buffer, &mut pos).unwrap();
        assert_eq!(items, segments());
        assert_eq!(pos, buffer.len());
    }

    #[test]
    fn declared_length_past_the_end_is_rejected() {
        let mut strm = Cursor::new(Vec::new());
        zlib_pack(&mut strm, &segments(), Compression::default()).unwrap();
        let mut buffer = strm.into_inner();
        buffer.truncate(buffer.len() - 1);

        let mut pos = 0;
        let err = zlib_unpack::<Bytes>(&buffer, &mut pos).unwrap_err();
        assert!(matches!(err, StateHistoryError::OutOfRange { .. }));

        let err = zlib_unpack::<Bytes>(&[1, 0], &mut 0).unwrap_err();
        assert!(matches!(
            err,
            StateHistoryError::OutOfRange {
                needed: 4,
                remaining: 2
            }
        ));
    }

    #[test]
    fn stream_reader_stops_at_section_end() {
        let mut strm = Cursor::new(Vec::new());
        zlib_pack(&mut strm, &segments(), Compression::best()).unwrap();
        strm.write_all(b"next").unwrap();
        strm.set_position(0);

        let items: Vec<Bytes> = zlib_unpack_from(&mut strm).unwrap();
        assert_eq!(items, segments());
        let mut rest = Vec::new();
        strm.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"next");
    }

    #[test]
    fn stream_reader_reports_truncation() {
        let mut strm = Cursor::new(Vec::new());
        zlib_pack(&mut strm, &segments(), Compression::default()).unwrap();
        let mut buffer = strm.into_inner();
        buffer.truncate(buffer.len() - 3);

        let err = zlib_unpack_from::<_, Bytes>(&mut Cursor::new(buffer)).unwrap_err();
        assert!(matches!(err, StateHistoryError::OutOfRange { .. }));
    }

    #[test]
    fn restricted_source_never_reads_past_its_length() {
        let mut inner = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let mut source = RestrictedSource::new(&mut inner, 3);
        let mut buf = [0u8; 8];
        assert_eq!(io::Read::read(&mut source, &mut buf).unwrap(), 3);
        assert_eq!(io::Read::read(&mut source, &mut buf).unwrap(), 0);
        assert_eq!(source.remaining(), 0);
        assert_eq!(inner.position(), 3);
    }

    #[test]
    fn whole_buffer_helpers() {
        let data = vec![9u8; 1024];
        let compressed = zlib_compress_bytes(&data, Compression::default()).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(zlib_decompress(&compressed).unwrap(), data);
        assert!(matches!(
            zlib_decompress(b"not zlib"),
            Err(StateHistoryError::Corrupt(_))
        ));
    }
}
