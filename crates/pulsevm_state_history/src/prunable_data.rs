use std::io::{self, Seek};

use flate2::Compression;
use pulsevm_crypto::{Bytes, Signature};
use pulsevm_serialization::{Read, Write};

use crate::{
    compression::{LengthWriter, read_section, zlib_pack, zlib_unpack},
    error::StateHistoryError,
    types::PartialTransactionV0,
};

/// How much of a transaction's signatures and context-free data is retained.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PrunableData {
    #[default]
    None,
    FullLegacy {
        signatures: Vec<Signature>,
        context_free_segments: Vec<Bytes>,
    },
    /// Recognized on the wire, but cannot be restored into a trace.
    Partial {
        signatures: Vec<Signature>,
        context_free_segments: Vec<Option<Bytes>>,
    },
    Full {
        signatures: Vec<Signature>,
        context_free_segments: Vec<Bytes>,
    },
}

impl PrunableData {
    pub const NONE_TAG: u8 = 0;
    pub const FULL_LEGACY_TAG: u8 = 1;
    pub const PARTIAL_TAG: u8 = 2;
    pub const FULL_TAG: u8 = 3;

    #[inline]
    pub fn tag(&self) -> u8 {
        match self {
            PrunableData::None => Self::NONE_TAG,
            PrunableData::FullLegacy { .. } => Self::FULL_LEGACY_TAG,
            PrunableData::Partial { .. } => Self::PARTIAL_TAG,
            PrunableData::Full { .. } => Self::FULL_TAG,
        }
    }

    pub fn signatures(&self) -> &[Signature] {
        match self {
            PrunableData::None => &[],
            PrunableData::FullLegacy { signatures, .. }
            | PrunableData::Partial { signatures, .. }
            | PrunableData::Full { signatures, .. } => signatures,
        }
    }

    /// Context-free segments that are actually present, in order.
    pub fn inline_segments(&self) -> Vec<Bytes> {
        match self {
            PrunableData::None => Vec::new(),
            PrunableData::Partial {
                context_free_segments,
                ..
            } => context_free_segments.iter().flatten().cloned().collect(),
            PrunableData::FullLegacy {
                context_free_segments,
                ..
            }
            | PrunableData::Full {
                context_free_segments,
                ..
            } => context_free_segments.clone(),
        }
    }

    /// True when pruning cannot shrink this value any further.
    pub fn is_minimal(&self) -> bool {
        match self {
            PrunableData::None => true,
            PrunableData::FullLegacy {
                signatures,
                context_free_segments,
            }
            | PrunableData::Full {
                signatures,
                context_free_segments,
            } => signatures.is_empty() && context_free_segments.is_empty(),
            PrunableData::Partial {
                signatures,
                context_free_segments,
            } => signatures.is_empty() && context_free_segments.is_empty(),
        }
    }

    /// Redaction policy: minimal values are kept as they are so their tag
    /// survives; everything else collapses to `None`.
    pub fn pruned(&self) -> PrunableData {
        if self.is_minimal() {
            self.clone()
        } else {
            PrunableData::None
        }
    }

    /// Writes the tag, the signatures and the compressed context-free segments.
    pub fn pack<S: io::Write + Seek>(
        &self,
        strm: &mut S,
        level: Compression,
    ) -> Result<(), StateHistoryError> {
        strm.write_all(&[self.tag()])?;
        match self {
            PrunableData::None => {}
            PrunableData::FullLegacy {
                signatures,
                context_free_segments,
            }
            | PrunableData::Full {
                signatures,
                context_free_segments,
            } => {
                strm.write_all(&signatures.pack()?)?;
                zlib_pack(strm, context_free_segments, level)?;
            }
            PrunableData::Partial {
                signatures,
                context_free_segments,
            } => {
                strm.write_all(&signatures.pack()?)?;
                zlib_pack(strm, context_free_segments, level)?;
            }
        }
        Ok(())
    }

    /// Writes one length-framed prunable record.
    pub fn pack_record<S: io::Write + Seek>(
        &self,
        strm: &mut S,
        level: Compression,
    ) -> Result<(), StateHistoryError> {
        let len_writer = LengthWriter::begin(strm)?;
        self.pack(strm, level)?;
        len_writer.finish(strm)?;
        Ok(())
    }

    pub fn unpack(buffer: &[u8], pos: &mut usize) -> Result<Self, StateHistoryError> {
        let tag = u8::read(buffer, pos)?;
        let prunable = match tag {
            Self::NONE_TAG => PrunableData::None,
            Self::FULL_LEGACY_TAG => PrunableData::FullLegacy {
                signatures: Vec::read(buffer, pos)?,
                context_free_segments: zlib_unpack(buffer, pos)?,
            },
            Self::PARTIAL_TAG => PrunableData::Partial {
                signatures: Vec::read(buffer, pos)?,
                context_free_segments: zlib_unpack(buffer, pos)?,
            },
            Self::FULL_TAG => PrunableData::Full {
                signatures: Vec::read(buffer, pos)?,
                context_free_segments: zlib_unpack(buffer, pos)?,
            },
            other => return Err(StateHistoryError::UnknownPrunableTag(other)),
        };
        Ok(prunable)
    }

    /// Reads one length-framed prunable record; the body must be consumed exactly.
    pub fn unpack_record(buffer: &[u8], pos: &mut usize) -> Result<Self, StateHistoryError> {
        let record_start = *pos;
        let body = read_section(buffer, pos)?;
        let mut body_pos = 0;
        let prunable = Self::unpack(body, &mut body_pos)?;
        if body_pos != body.len() {
            return Err(StateHistoryError::Corrupt(format!(
                "prunable record at offset {record_start} has {} trailing bytes",
                body.len() - body_pos
            )));
        }
        Ok(prunable)
    }

    /// Moves the retained data into the partial transaction slot of a trace.
    pub fn restore(self, partial: &mut PartialTransactionV0) -> Result<(), StateHistoryError> {
        match self {
            PrunableData::None => Ok(()),
            PrunableData::FullLegacy {
                signatures,
                context_free_segments,
            }
            | PrunableData::Full {
                signatures,
                context_free_segments,
            } => {
                partial.signatures = signatures;
                partial.context_free_data = context_free_segments;
                Ok(())
            }
            PrunableData::Partial { .. } => Err(StateHistoryError::NotImplemented(
                "restoring partially pruned transaction data",
            )),
        }
    }
}
