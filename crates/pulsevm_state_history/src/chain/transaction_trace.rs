use std::sync::Arc;

use super::{AccountDelta, ActionTrace, Id, PackedTransaction, TransactionReceiptHeader};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionTrace {
    pub id: Id,
    pub block_num: u32,
    /// Present only when the transaction made it into the block.
    pub receipt: Option<TransactionReceiptHeader>,
    pub elapsed: i64,
    pub net_usage: u64,
    pub scheduled: bool,
    pub action_traces: Vec<ActionTrace>,
    pub account_ram_delta: Option<AccountDelta>,
    /// Trace of the failed deferred transaction this trace retried.
    pub failed_dtrx_trace: Option<Arc<TransactionTrace>>,
    pub except: Option<String>,
    pub error_code: Option<u64>,
}

impl TransactionTrace {
    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn action_traces(&self) -> &[ActionTrace] {
        &self.action_traces
    }
}

/// A trace paired with the transaction that produced it, if one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentedTransactionTrace {
    pub trace: Arc<TransactionTrace>,
    pub packed_trx: Option<Arc<PackedTransaction>>,
}

impl AugmentedTransactionTrace {
    pub fn new(trace: Arc<TransactionTrace>, packed_trx: Option<Arc<PackedTransaction>>) -> Self {
        AugmentedTransactionTrace { trace, packed_trx }
    }
}
