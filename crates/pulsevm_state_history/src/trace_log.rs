//! Serialization of one block's traces into a trace log entry.
//!
//! Version 0 entries are a single compressed section of history records with
//! signatures and context-free data inline. Version 1 entries split that data
//! out so it can be pruned later:
//!
//! ```text
//! [u32 total_len][zlib section: Vec<TransactionTraceV0>][prunable record]*
//! ```
//!
//! Prunable records follow the traversal order of [`for_each_packed_transaction`]
//! and are matched back to traces positionally.

use std::io::{self, Cursor, Read as _, Seek};

use pulsevm_serialization::Write;
use spdlog::debug;

use crate::{
    chain::{AugmentedTransactionTrace, PackedTransaction, TransactionTrace},
    compression::{LengthWriter, read_section, zlib_decompress, zlib_pack, zlib_unpack, zlib_unpack_from},
    error::StateHistoryError,
    prunable_data::PrunableData,
    types::{TraceReceiptContext, TransactionTraceV0},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LogVersion {
    V0,
    #[default]
    V1,
}

impl LogVersion {
    pub fn as_u32(self) -> u32 {
        match self {
            LogVersion::V0 => 0,
            LogVersion::V1 => 1,
        }
    }
}

impl TryFrom<u32> for LogVersion {
    type Error = StateHistoryError;

    fn try_from(version: u32) -> Result<Self, Self::Error> {
        match version {
            0 => Ok(LogVersion::V0),
            1 => Ok(LogVersion::V1),
            other => Err(StateHistoryError::UnsupportedVersion(other)),
        }
    }
}

/// Calls `f` for every packed transaction that owns a prunable record, retry
/// traces first.
pub fn for_each_packed_transaction<F>(
    traces: &[AugmentedTransactionTrace],
    mut f: F,
) -> Result<(), StateHistoryError>
where
    F: FnMut(&PackedTransaction) -> Result<(), StateHistoryError>,
{
    for trace in traces {
        visit_packed_transaction(&trace.trace, trace.packed_trx.as_deref(), &mut f)?;
    }
    Ok(())
}

fn visit_packed_transaction<F>(
    trace: &TransactionTrace,
    packed_trx: Option<&PackedTransaction>,
    f: &mut F,
) -> Result<(), StateHistoryError>
where
    F: FnMut(&PackedTransaction) -> Result<(), StateHistoryError>,
{
    if let Some(retry) = trace.failed_dtrx_trace.as_deref() {
        visit_packed_transaction(retry, packed_trx, f)?;
    }
    match packed_trx {
        Some(packed_trx) if trace.failed_dtrx_trace.is_none() => f(packed_trx),
        _ => Ok(()),
    }
}

/// Walks a decoded trace in prunable record order and calls `visitor` for each
/// trace that owns a record. The visitor consumes that record itself.
pub fn visit_deserialized_trace<F>(
    trace: &mut TransactionTraceV0,
    visitor: &mut F,
) -> Result<(), StateHistoryError>
where
    F: FnMut(&mut TransactionTraceV0) -> Result<(), StateHistoryError>,
{
    if let Some(retry) = trace.failed_dtrx_trace.as_deref_mut() {
        visit_deserialized_trace(retry, visitor)?;
    }
    if trace.partial.is_some() {
        visitor(trace)?;
    }
    Ok(())
}

fn pack_unprunable<S: io::Write + Seek>(
    strm: &mut S,
    traces: &[AugmentedTransactionTrace],
    context: &TraceReceiptContext,
) -> Result<(), StateHistoryError> {
    let records: Vec<TransactionTraceV0> = traces
        .iter()
        .map(|trace| TransactionTraceV0::from_augmented(trace, context))
        .collect();
    zlib_pack(strm, &records, context.compression)
}

/// Writes the entry for `traces`, which must already be in block order.
pub fn pack_traces<S: io::Write + Seek>(
    strm: &mut S,
    traces: &[AugmentedTransactionTrace],
    context: &TraceReceiptContext,
) -> Result<(), StateHistoryError> {
    match context.version {
        LogVersion::V0 => pack_unprunable(strm, traces, context),
        LogVersion::V1 => {
            let len_writer = LengthWriter::begin(strm)?;
            pack_unprunable(strm, traces, context)?;
            let mut records = 0usize;
            for_each_packed_transaction(traces, |trx| {
                records += 1;
                trx.get_prunable_data().pack_record(strm, context.compression)
            })?;
            let len = len_writer.finish(strm)?;
            debug!(
                "packed {} traces with {} prunable records into {} bytes",
                traces.len(),
                records,
                len
            );
            Ok(())
        }
    }
}

pub fn encode_traces(
    traces: &[AugmentedTransactionTrace],
    context: &TraceReceiptContext,
) -> Result<Vec<u8>, StateHistoryError> {
    let mut strm = Cursor::new(Vec::new());
    pack_traces(&mut strm, traces, context)?;
    Ok(strm.into_inner())
}

/// Returns the part of a version 1 entry covered by its total length and the
/// offset of the unprunable section inside it.
pub(crate) fn entry_body(entry: &[u8]) -> Result<(&[u8], usize), StateHistoryError> {
    let mut pos = 0;
    let body = read_section(entry, &mut pos)?;
    Ok((&entry[..pos], pos - body.len()))
}

fn restore_v1(entry: &[u8]) -> Result<Vec<TransactionTraceV0>, StateHistoryError> {
    let (entry, mut pos) = entry_body(entry)?;
    let mut traces: Vec<TransactionTraceV0> = zlib_unpack(entry, &mut pos)?;
    let mut restore = |trace: &mut TransactionTraceV0| -> Result<(), StateHistoryError> {
        let prunable = PrunableData::unpack_record(entry, &mut pos)?;
        match trace.partial.as_mut() {
            Some(partial) => prunable.restore(partial),
            None => Ok(()),
        }
    };
    for trace in traces.iter_mut() {
        visit_deserialized_trace(trace, &mut restore)?;
    }
    Ok(traces)
}

/// Decodes an entry produced by [`pack_traces`].
pub fn decode_traces(version: u32, entry: &[u8]) -> Result<Vec<TransactionTraceV0>, StateHistoryError> {
    match LogVersion::try_from(version)? {
        LogVersion::V0 => zlib_unpack(entry, &mut 0),
        LogVersion::V1 => restore_v1(entry),
    }
}

/// Decodes an entry from a sequential reader positioned at its start.
pub fn decode_traces_from<R: io::Read>(
    version: u32,
    reader: &mut R,
) -> Result<Vec<TransactionTraceV0>, StateHistoryError> {
    match LogVersion::try_from(version)? {
        LogVersion::V0 => zlib_unpack_from(reader),
        LogVersion::V1 => {
            let mut len = [0u8; 4];
            reader.read_exact(&mut len).map_err(|e| out_of_range(e, 4, 0))?;
            let total_len = u32::from_le_bytes(len) as usize;
            let mut entry = Vec::new();
            entry.extend_from_slice(&len);
            let read = reader.by_ref().take(total_len as u64).read_to_end(&mut entry)?;
            if read != total_len {
                return Err(StateHistoryError::OutOfRange {
                    needed: total_len,
                    remaining: read,
                });
            }
            restore_v1(&entry)
        }
    }
}

fn out_of_range(e: io::Error, needed: usize, remaining: usize) -> StateHistoryError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        StateHistoryError::OutOfRange { needed, remaining }
    } else {
        e.into()
    }
}

/// The uncompressed version 0 trace binary served to history clients.
pub fn to_traces_bin_v0(version: u32, entry: &[u8]) -> Result<Vec<u8>, StateHistoryError> {
    match LogVersion::try_from(version)? {
        LogVersion::V0 => {
            let section = read_section(entry, &mut 0)?;
            if section.is_empty() {
                return Ok(Vec::<TransactionTraceV0>::new().pack()?);
            }
            zlib_decompress(section)
        }
        LogVersion::V1 => Ok(restore_v1(entry)?.pack()?),
    }
}
