use std::{
    collections::HashMap,
    io::{self, Seek},
    mem,
    sync::Arc,
};

use spdlog::debug;

use crate::{
    chain::{
        ACTIVE_NAME, AugmentedTransactionTrace, Id, ONBLOCK_NAME, PULSE_NAME, PackedTransaction,
        SignedBlock, TransactionTrace,
    },
    config::StateHistoryConfig,
    error::StateHistoryError,
    trace_log::pack_traces,
};

/// True for the system `onblock` transaction executed at the start of every block.
pub fn is_onblock(trace: &TransactionTrace) -> bool {
    let [action_trace] = trace.action_traces() else {
        return false;
    };
    let act = &action_trace.act;
    if act.account != PULSE_NAME || act.name != ONBLOCK_NAME {
        return false;
    }
    match act.authorization.as_slice() {
        [auth] => auth.actor == PULSE_NAME && auth.permission == ACTIVE_NAME,
        _ => false,
    }
}

/// Collects the traces of the block being built and writes them as one trace
/// log entry once the block is finalized.
#[derive(Debug, Default)]
pub struct TraceConverter {
    onblock_trace: Option<AugmentedTransactionTrace>,
    cached_traces: HashMap<Id, AugmentedTransactionTrace>,
    config: StateHistoryConfig,
}

impl TraceConverter {
    pub fn new(config: StateHistoryConfig) -> Self {
        TraceConverter {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &StateHistoryConfig {
        &self.config
    }

    /// Number of traces waiting for the next block, the onblock trace included.
    pub fn pending(&self) -> usize {
        self.cached_traces.len() + usize::from(self.onblock_trace.is_some())
    }

    pub fn add_transaction(
        &mut self,
        trace: Arc<TransactionTrace>,
        packed_trx: Option<Arc<PackedTransaction>>,
    ) {
        if trace.receipt.is_none() {
            return;
        }
        let key = if is_onblock(&trace) {
            None
        } else if let Some(retry) = trace.failed_dtrx_trace.as_deref() {
            // the block refers to the retried transaction
            Some(retry.id)
        } else {
            Some(trace.id)
        };
        let augmented = AugmentedTransactionTrace::new(trace, packed_trx);
        match key {
            None => self.onblock_trace = Some(augmented),
            Some(id) => {
                self.cached_traces.insert(id, augmented);
            }
        }
    }

    /// Orders the collected traces the way `block` lists its transactions,
    /// with the onblock trace first. Always leaves the converter empty.
    pub fn prepare_traces(
        &mut self,
        block: &SignedBlock,
    ) -> Result<Vec<AugmentedTransactionTrace>, StateHistoryError> {
        let onblock_trace = self.onblock_trace.take();
        let cached_traces = mem::take(&mut self.cached_traces);

        let mut traces = Vec::with_capacity(block.transactions.len() + 1);
        traces.extend(onblock_trace);
        for receipt in &block.transactions {
            let id = receipt.trx.id();
            let trace = cached_traces
                .get(id)
                .cloned()
                .ok_or(StateHistoryError::MissingTrace(*id))?;
            traces.push(trace);
        }
        debug!(
            "prepared {} traces for block {} from {} cached",
            traces.len(),
            block.block_num,
            cached_traces.len()
        );
        Ok(traces)
    }

    /// Finalizes the block and writes its trace log entry to `strm`. An
    /// invalid config is reported before any collected trace is dropped.
    pub fn pack<S: io::Write + Seek>(
        &mut self,
        strm: &mut S,
        block: &SignedBlock,
    ) -> Result<(), StateHistoryError> {
        let context = self.config.receipt_context()?;
        let traces = self.prepare_traces(block)?;
        pack_traces(strm, &traces, &context)
    }
}
