
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pulsevm_crypto::{Bytes, Signature};
    use pulsevm_name::Name;
    use pulsevm_serialization::VarUint32;
    use pulsevm_state_history::{
        StateHistoryConfig, StateHistoryError, TraceConverter,
        chain::{
            ACTIVE_NAME, Action, ActionTrace, Id, ONBLOCK_NAME, PULSE_NAME, PackedTransaction,
            PermissionLevel, SignedBlock, Transaction, TransactionHeader, TransactionReceipt,
            TransactionReceiptHeader, TransactionStatus, TransactionTrace, TransactionVariant,
        },
    };

    /// Drives a trace converter the way block production does: transactions
    /// are pushed while the block executes and the entry is written when the
    /// block is produced.
    pub struct Testing {
        pub converter: TraceConverter,
        pub block_num: u32,
        pending_transactions: Vec<TransactionReceipt>,
        next_seed: u8,
    }

    impl Testing {
        pub fn new() -> Self {
            Self::with_config(StateHistoryConfig::default())
        }

        pub fn with_config(config: StateHistoryConfig) -> Self {
            Testing {
                converter: TraceConverter::new(config),
                block_num: 1,
                pending_transactions: vec![],
                next_seed: 1,
            }
        }

        pub fn signed_transaction(
            &mut self,
            signatures: Vec<Signature>,
            context_free_data: Vec<Bytes>,
        ) -> Arc<PackedTransaction> {
            let seed = self.next_seed;
            self.next_seed += 1;
            let mut trx = Transaction::new(
                TransactionHeader::default(),
                vec![],
                vec![Action::new(
                    PULSE_NAME,
                    Name::from_static("reqauth"),
                    vec![PermissionLevel::new(PULSE_NAME, ACTIVE_NAME)],
                    vec![seed],
                )],
            );
            self.set_transaction_headers(&mut trx, seed as u32, 0);
            Arc::new(
                PackedTransaction::from_signed(trx, signatures, context_free_data)
                    .expect("Failed to pack transaction"),
            )
        }

        pub fn set_transaction_headers(&self, trx: &mut Transaction, expiration: u32, delay_sec: u32) {
            trx.header.expiration = expiration;
            trx.header.ref_block_num = self.block_num as u16;
            trx.header.max_net_usage_words = VarUint32(0); // No limit
            trx.header.max_cpu_usage_ms = 0; // No limit
            trx.header.delay_sec = VarUint32(delay_sec);
        }

        pub fn push_onblock(&mut self) -> Arc<TransactionTrace> {
            let act = Action::new(
                PULSE_NAME,
                ONBLOCK_NAME,
                vec![PermissionLevel::new(PULSE_NAME, ACTIVE_NAME)],
                self.block_num.to_le_bytes().to_vec(),
            );
            let trace = Arc::new(TransactionTrace {
                id: Id::hash(format!("onblock {}", self.block_num)),
                block_num: self.block_num,
                receipt: Some(executed_receipt()),
                action_traces: vec![ActionTrace::new(1, 0, PULSE_NAME, act)],
                ..Default::default()
            });
            self.converter.add_transaction(trace.clone(), None);
            trace
        }

        pub fn push_transaction(&mut self, packed: &Arc<PackedTransaction>) -> Arc<TransactionTrace> {
            let trace = Arc::new(TransactionTrace {
                id: *packed.id(),
                block_num: self.block_num,
                receipt: Some(executed_receipt()),
                action_traces: packed
                    .transaction()
                    .actions
                    .iter()
                    .enumerate()
                    .map(|(i, act)| ActionTrace::new(i as u32 + 1, 0, act.account, act.clone()))
                    .collect(),
                ..Default::default()
            });
            self.converter.add_transaction(trace.clone(), Some(packed.clone()));
            self.include(TransactionVariant::Packed((**packed).clone()));
            trace
        }

        /// Pushes the trace of a failed deferred transaction that was retried as
        /// `packed`. The block references the retried transaction's id.
        pub fn push_retried_transaction(
            &mut self,
            packed: &Arc<PackedTransaction>,
        ) -> Arc<TransactionTrace> {
            let retry = Arc::new(TransactionTrace {
                id: *packed.id(),
                block_num: self.block_num,
                receipt: Some(TransactionReceiptHeader::new(TransactionStatus::SoftFail, 50, 4)),
                ..Default::default()
            });
            let trace = Arc::new(TransactionTrace {
                id: Id::hash(format!("onerror {}", packed.id())),
                block_num: self.block_num,
                receipt: Some(executed_receipt()),
                failed_dtrx_trace: Some(retry),
                ..Default::default()
            });
            self.converter.add_transaction(trace.clone(), Some(packed.clone()));
            self.include(TransactionVariant::Id(*packed.id()));
            trace
        }

        /// Pushes a failed deferred transaction whose retry failed again and was
        /// retried a second time as `packed`. Only the innermost trace owns the
        /// prunable record.
        pub fn push_nested_retried_transaction(
            &mut self,
            packed: &Arc<PackedTransaction>,
        ) -> Arc<TransactionTrace> {
            let inner = Arc::new(TransactionTrace {
                id: *packed.id(),
                block_num: self.block_num,
                receipt: Some(TransactionReceiptHeader::new(TransactionStatus::SoftFail, 50, 4)),
                ..Default::default()
            });
            let middle = Arc::new(TransactionTrace {
                id: Id::hash(format!("retry {}", packed.id())),
                block_num: self.block_num,
                receipt: Some(TransactionReceiptHeader::new(TransactionStatus::SoftFail, 50, 4)),
                failed_dtrx_trace: Some(inner),
                ..Default::default()
            });
            let trace = Arc::new(TransactionTrace {
                id: Id::hash(format!("onerror {}", middle.id)),
                block_num: self.block_num,
                receipt: Some(executed_receipt()),
                failed_dtrx_trace: Some(middle.clone()),
                ..Default::default()
            });
            self.converter.add_transaction(trace.clone(), Some(packed.clone()));
            self.include(TransactionVariant::Id(middle.id));
            trace
        }

        pub fn include(&mut self, trx: TransactionVariant) {
            self.pending_transactions
                .push(TransactionReceipt::new(executed_receipt(), trx));
        }

        /// Writes the trace log entry of the pending block and starts the next one.
        pub fn produce_block(&mut self) -> Result<Vec<u8>, StateHistoryError> {
            let block = SignedBlock {
                block_num: self.block_num,
                transactions: std::mem::take(&mut self.pending_transactions),
            };
            self.block_num += 1;
            let mut entry = std::io::Cursor::new(Vec::new());
            self.converter.pack(&mut entry, &block)?;
            Ok(entry.into_inner())
        }

        pub fn log_version(&self) -> u32 {
            self.converter.config().trace_log_version
        }
    }

    pub fn executed_receipt() -> TransactionReceiptHeader {
        TransactionReceiptHeader::new(TransactionStatus::Executed, 100, 16)
    }

    pub fn signature(seed: u8) -> Signature {
        Signature::new([seed; 65])
    }
}
