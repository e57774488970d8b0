use std::{collections::HashSet, io::Cursor};

use flate2::Compression;
use spdlog::{debug, info};

use crate::{
    chain::Id,
    compression::zlib_unpack,
    error::{StateHistoryError, pulse_assert},
    prunable_data::PrunableData,
    trace_log::{LogVersion, entry_body, visit_deserialized_trace},
    types::TransactionTraceV0,
};

/// Redaction policy applied to a matched record.
#[inline]
pub fn prune(data: &PrunableData) -> PrunableData {
    data.pruned()
}

/// Planned fate of one prunable record.
struct RecordPlan {
    start: usize,
    end: usize,
    replacement: Option<Vec<u8>>,
}

/// Rewrites the prunable section of a version 1 entry in place.
///
/// Every record is parsed and planned by [`visit`](Self::visit) before
/// [`commit`](Self::commit) touches the buffer or `ids`, so a corrupt record
/// anywhere in the entry leaves both unchanged.
///
/// During the commit a write cursor trails the records. Records before the
/// first change stay where they are; afterwards every record is shifted left
/// over the space freed by pruning. A replacement is never longer than the
/// record it replaces, so the write cursor never passes the record being read.
pub struct TracePruner<'a> {
    buffer: &'a mut [u8],
    read_pos: usize,
    plans: Vec<RecordPlan>,
    matched: Vec<Id>,
    ids: &'a mut HashSet<Id>,
    compression: Compression,
}

impl<'a> TracePruner<'a> {
    pub fn new(buffer: &'a mut [u8], records_start: usize, ids: &'a mut HashSet<Id>) -> Self {
        TracePruner {
            buffer,
            read_pos: records_start,
            plans: Vec::new(),
            matched: Vec::new(),
            ids,
            compression: Compression::default(),
        }
    }

    /// Parses the next prunable record, which belongs to the trace `id`.
    pub fn visit(&mut self, id: &Id) -> Result<(), StateHistoryError> {
        let start = self.read_pos;
        let mut end = start;
        let prunable = PrunableData::unpack_record(&self.buffer[..], &mut end)?;

        let mut replacement = None;
        if self.ids.contains(id) {
            self.matched.push(*id);
            let pruned = prune(&prunable);
            if pruned != prunable {
                let mut strm = Cursor::new(Vec::with_capacity(end - start));
                pruned.pack_record(&mut strm, self.compression)?;
                replacement = Some(self.checked_replacement(start, end - start, strm.into_inner())?);
            }
        }
        self.plans.push(RecordPlan {
            start,
            end,
            replacement,
        });
        self.read_pos = end;
        Ok(())
    }

    /// Accepts `record` as the replacement of the record at `offset` only if
    /// it does not grow.
    fn checked_replacement(
        &self,
        offset: usize,
        original_len: usize,
        record: Vec<u8>,
    ) -> Result<Vec<u8>, StateHistoryError> {
        pulse_assert(
            record.len() <= original_len,
            StateHistoryError::PruneGrowth {
                offset,
                original: original_len,
                pruned: record.len(),
            },
        )?;
        Ok(record)
    }

    /// Number of records that will be rewritten.
    pub fn rewrites(&self) -> usize {
        self.plans.iter().filter(|plan| plan.replacement.is_some()).count()
    }

    /// Applies the planned rewrites and removes the matched ids. Returns the
    /// half-open range of bytes that changed, `(0, 0)` if none did.
    pub fn commit(mut self) -> (usize, usize) {
        let mut write_pos = self.plans.first().map_or(0, |plan| plan.start);
        let mut change_start = None;
        for plan in &self.plans {
            match &plan.replacement {
                Some(record) => {
                    change_start.get_or_insert(write_pos);
                    self.buffer[write_pos..write_pos + record.len()].copy_from_slice(record);
                    write_pos += record.len();
                }
                None => {
                    if change_start.is_some() {
                        self.buffer.copy_within(plan.start..plan.end, write_pos);
                    }
                    write_pos += plan.end - plan.start;
                }
            }
        }
        for id in &self.matched {
            self.ids.remove(id);
        }
        match change_start {
            Some(start) => (start, write_pos),
            None => (0, 0),
        }
    }
}

/// Strips signatures and context-free data of the transactions in `ids` from
/// a trace log entry. Matched ids are removed from `ids`. Bytes past the
/// returned range that used to belong to the entry are left stale. On error
/// neither `entry` nor `ids` is modified.
pub fn prune_traces(
    entry: &mut [u8],
    version: u32,
    ids: &mut HashSet<Id>,
) -> Result<(usize, usize), StateHistoryError> {
    if LogVersion::try_from(version)? == LogVersion::V0 {
        return Err(StateHistoryError::PruneUnsupported);
    }

    let (body, mut records_start) = entry_body(entry)?;
    let body_len = body.len();
    let mut traces: Vec<TransactionTraceV0> = zlib_unpack(body, &mut records_start)?;

    let requested = ids.len();
    let mut pruner = TracePruner::new(&mut entry[..body_len], records_start, ids);
    for trace in traces.iter_mut() {
        visit_deserialized_trace(trace, &mut |trace: &mut TransactionTraceV0| {
            pruner.visit(&trace.id)
        })?;
    }

    let pruned = pruner.rewrites();
    let (start, end) = pruner.commit();
    let not_found = ids.len();
    if pruned > 0 {
        info!("pruned {} of {} requested traces, changed bytes {}..{}", pruned, requested, start, end);
    }
    if not_found > 0 {
        debug!("{} transaction ids were not found in trace log entry", not_found);
    }
    Ok((start, end))
}
