use flate2::Compression;
use pulsevm_crypto::{Bytes, Digest, Signature};
use pulsevm_name::Name;
use pulsevm_serialization::{NumBytes, Read, ReadError, VarUint32, Write, WriteError};
use serde::Serialize;

use crate::{
    chain::{
        AccountDelta, Action, ActionReceipt, ActionTrace, AugmentedTransactionTrace, Id,
        PackedTransaction, TransactionStatus, TransactionTrace,
    },
    trace_log::LogVersion,
};

/// Implements the binary traits for a state history record: an optional `u8`
/// variant tag followed by the listed fields in order.
macro_rules! impl_history_record {
    ($ty:ident, tag = $tag:expr, { $($field:ident),* $(,)? }) => {
        impl NumBytes for $ty {
            fn num_bytes(&self) -> usize {
                1 $(+ self.$field.num_bytes())*
            }
        }

        impl Read for $ty {
            fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
                if u8::read(bytes, pos)? != $tag {
                    return Err(ReadError::ParseError);
                }
                Ok($ty {
                    $($field: Read::read(bytes, pos)?,)*
                })
            }
        }

        impl Write for $ty {
            fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
                ($tag as u8).write(bytes, pos)?;
                $(self.$field.write(bytes, pos)?;)*
                Ok(())
            }
        }
    };
    ($ty:ident, { $($field:ident),* $(,)? }) => {
        impl NumBytes for $ty {
            fn num_bytes(&self) -> usize {
                0 $(+ self.$field.num_bytes())*
            }
        }

        impl Read for $ty {
            fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
                Ok($ty {
                    $($field: Read::read(bytes, pos)?,)*
                })
            }
        }

        impl Write for $ty {
            fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
                $(self.$field.write(bytes, pos)?;)*
                Ok(())
            }
        }
    };
}

/// Options that shape how chain traces are turned into history records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceReceiptContext {
    pub debug_mode: bool,
    pub version: LogVersion,
    pub compression: Compression,
}

impl TraceReceiptContext {
    pub fn new(debug_mode: bool, version: LogVersion) -> Self {
        TraceReceiptContext {
            debug_mode,
            version,
            compression: Compression::default(),
        }
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AccountAuthSequence {
    pub account: Name,
    pub sequence: u64,
}
impl_history_record!(AccountAuthSequence, { account, sequence });

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ActionReceiptV0 {
    pub receiver: Name,
    pub act_digest: Digest,
    pub global_sequence: u64,
    pub recv_sequence: u64,
    pub auth_sequence: Vec<AccountAuthSequence>,
    pub code_sequence: VarUint32,
    pub abi_sequence: VarUint32,
}
impl_history_record!(ActionReceiptV0, tag = 0, {
    receiver,
    act_digest,
    global_sequence,
    recv_sequence,
    auth_sequence,
    code_sequence,
    abi_sequence,
});

impl From<&ActionReceipt> for ActionReceiptV0 {
    fn from(receipt: &ActionReceipt) -> Self {
        ActionReceiptV0 {
            receiver: receipt.receiver,
            act_digest: receipt.act_digest,
            global_sequence: receipt.global_sequence,
            recv_sequence: receipt.recv_sequence,
            auth_sequence: receipt
                .auth_sequence
                .iter()
                .map(|(account, sequence)| AccountAuthSequence {
                    account: *account,
                    sequence: *sequence,
                })
                .collect(),
            code_sequence: receipt.code_sequence,
            abi_sequence: receipt.abi_sequence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ActionTraceV1 {
    pub action_ordinal: VarUint32,
    pub creator_action_ordinal: VarUint32,
    pub receipt: Option<ActionReceiptV0>,
    pub receiver: Name,
    pub act: Action,
    pub context_free: bool,
    pub elapsed: i64,
    pub console: String,
    pub account_ram_deltas: Vec<AccountDelta>,
    pub except: Option<String>,
    pub error_code: Option<u64>,
    pub return_value: Bytes,
}
impl_history_record!(ActionTraceV1, tag = 1, {
    action_ordinal,
    creator_action_ordinal,
    receipt,
    receiver,
    act,
    context_free,
    elapsed,
    console,
    account_ram_deltas,
    except,
    error_code,
    return_value,
});

impl ActionTraceV1 {
    /// Console output is only kept when the node runs in trace debug mode.
    pub fn from_trace(trace: &ActionTrace, debug_mode: bool) -> Self {
        ActionTraceV1 {
            action_ordinal: VarUint32(trace.action_ordinal),
            creator_action_ordinal: VarUint32(trace.creator_action_ordinal),
            receipt: trace.receipt.as_ref().map(ActionReceiptV0::from),
            receiver: trace.receiver,
            act: trace.act.clone(),
            context_free: trace.context_free,
            elapsed: trace.elapsed,
            console: if debug_mode {
                trace.console.clone()
            } else {
                String::new()
            },
            account_ram_deltas: trace.account_ram_deltas.clone(),
            except: trace.except.clone(),
            error_code: trace.error_code,
            return_value: trace.return_value.clone(),
        }
    }
}

/// Transaction header plus its prunable parts. In version 1 entries the
/// signatures and context-free data stay empty here and are restored from the
/// prunable section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PartialTransactionV0 {
    pub expiration: u32,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub max_net_usage_words: VarUint32,
    pub max_cpu_usage_ms: u8,
    pub delay_sec: VarUint32,
    pub transaction_extensions: Vec<(u16, Bytes)>,
    pub signatures: Vec<Signature>,
    pub context_free_data: Vec<Bytes>,
}
impl_history_record!(PartialTransactionV0, tag = 0, {
    expiration,
    ref_block_num,
    ref_block_prefix,
    max_net_usage_words,
    max_cpu_usage_ms,
    delay_sec,
    transaction_extensions,
    signatures,
    context_free_data,
});

impl PartialTransactionV0 {
    pub fn from_packed(packed_trx: &PackedTransaction, version: LogVersion) -> Self {
        let trx = packed_trx.transaction();
        let prunable = packed_trx.get_prunable_data();
        let (signatures, context_free_data) = match version {
            LogVersion::V0 => (prunable.signatures().to_vec(), prunable.inline_segments()),
            LogVersion::V1 => (Vec::new(), Vec::new()),
        };
        PartialTransactionV0 {
            expiration: trx.header.expiration,
            ref_block_num: trx.header.ref_block_num,
            ref_block_prefix: trx.header.ref_block_prefix,
            max_net_usage_words: trx.header.max_net_usage_words,
            max_cpu_usage_ms: trx.header.max_cpu_usage_ms,
            delay_sec: trx.header.delay_sec,
            transaction_extensions: trx.transaction_extensions.clone(),
            signatures,
            context_free_data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TransactionTraceV0 {
    pub id: Id,
    pub status: TransactionStatus,
    pub cpu_usage_us: u32,
    pub net_usage_words: VarUint32,
    pub elapsed: i64,
    pub net_usage: u64,
    pub scheduled: bool,
    pub action_traces: Vec<ActionTraceV1>,
    pub account_ram_delta: Option<AccountDelta>,
    pub except: Option<String>,
    pub error_code: Option<u64>,
    pub failed_dtrx_trace: Option<Box<TransactionTraceV0>>,
    pub partial: Option<PartialTransactionV0>,
}
impl_history_record!(TransactionTraceV0, tag = 0, {
    id,
    status,
    cpu_usage_us,
    net_usage_words,
    elapsed,
    net_usage,
    scheduled,
    action_traces,
    account_ram_delta,
    except,
    error_code,
    failed_dtrx_trace,
    partial,
});

impl TransactionTraceV0 {
    pub fn from_augmented(trace: &AugmentedTransactionTrace, context: &TraceReceiptContext) -> Self {
        Self::from_trace(&trace.trace, trace.packed_trx.as_deref(), context)
    }

    /// The retry trace is converted with the same packed transaction; only the
    /// innermost trace carries the partial transaction slot.
    fn from_trace(
        trace: &TransactionTrace,
        packed_trx: Option<&PackedTransaction>,
        context: &TraceReceiptContext,
    ) -> Self {
        let (status, cpu_usage_us, net_usage_words) = match &trace.receipt {
            Some(receipt) => (receipt.status, receipt.cpu_usage_us, receipt.net_usage_words),
            None => (TransactionStatus::HardFail, 0, VarUint32(0)),
        };
        let partial = match packed_trx {
            Some(packed_trx) if trace.failed_dtrx_trace.is_none() => {
                Some(PartialTransactionV0::from_packed(packed_trx, context.version))
            }
            _ => None,
        };
        TransactionTraceV0 {
            id: trace.id,
            status,
            cpu_usage_us,
            net_usage_words,
            elapsed: trace.elapsed,
            net_usage: trace.net_usage,
            scheduled: trace.scheduled,
            action_traces: trace
                .action_traces
                .iter()
                .map(|action| ActionTraceV1::from_trace(action, context.debug_mode))
                .collect(),
            account_ram_delta: trace.account_ram_delta,
            except: trace.except.clone(),
            error_code: trace.error_code,
            failed_dtrx_trace: trace
                .failed_dtrx_trace
                .as_deref()
                .map(|retry| Box::new(Self::from_trace(retry, packed_trx, context))),
            partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        chain::{
            ACTIVE_NAME, PULSE_NAME, PermissionLevel, Transaction, TransactionHeader,
            TransactionReceiptHeader,
        },
        prunable_data::PrunableData,
    };

    fn action_trace(console: &str) -> ActionTrace {
        let mut trace = ActionTrace::new(
            1,
            0,
            PULSE_NAME,
            Action::new(
                PULSE_NAME,
                Name::from_static("transfer"),
                vec![PermissionLevel::new(PULSE_NAME, ACTIVE_NAME)],
                vec![1u8, 2, 3],
            ),
        );
        trace.console = console.to_owned();
        trace.receipt = Some(ActionReceipt {
            receiver: PULSE_NAME,
            global_sequence: 10,
            recv_sequence: 4,
            auth_sequence: vec![(PULSE_NAME, 2)],
            ..Default::default()
        });
        trace
    }

    fn packed() -> PackedTransaction {
        PackedTransaction::from_signed(
            Transaction::new(
                TransactionHeader {
                    expiration: 42,
                    ref_block_num: 3,
                    ..Default::default()
                },
                vec![],
                vec![],
            ),
            vec![Signature::new([5u8; 65])],
            vec![Bytes::from(&b"cfd"[..])],
        )
        .unwrap()
    }

    #[test]
    fn records_carry_their_variant_tag() {
        let action = ActionTraceV1::from_trace(&action_trace(""), false);
        let bytes = action.pack().unwrap();
        assert_eq!(bytes[0], 1);
        assert_eq!(ActionTraceV1::unpack(&bytes).unwrap(), action);

        let mut wrong_tag = bytes.clone();
        wrong_tag[0] = 0;
        assert_eq!(ActionTraceV1::unpack(&wrong_tag), Err(ReadError::ParseError));
    }

    #[test]
    fn console_is_kept_only_in_debug_mode() {
        let trace = action_trace("hello");
        assert_eq!(ActionTraceV1::from_trace(&trace, true).console, "hello");
        assert_eq!(ActionTraceV1::from_trace(&trace, false).console, "");
    }

    #[test]
    fn missing_receipt_is_reported_as_hard_fail() {
        let trace = AugmentedTransactionTrace::new(
            Arc::new(TransactionTrace {
                id: Id::hash(b"t"),
                ..Default::default()
            }),
            None,
        );
        let record =
            TransactionTraceV0::from_augmented(&trace, &TraceReceiptContext::new(false, LogVersion::V1));
        assert_eq!(record.status, TransactionStatus::HardFail);
        assert_eq!(record.cpu_usage_us, 0);
        assert_eq!(record.net_usage_words, VarUint32(0));
        assert!(record.partial.is_none());
    }

    #[test]
    fn partial_slot_depends_on_version() {
        let trace = AugmentedTransactionTrace::new(
            Arc::new(TransactionTrace {
                id: Id::hash(b"t"),
                receipt: Some(TransactionReceiptHeader::new(TransactionStatus::Executed, 100, 12)),
                action_traces: vec![action_trace("")],
                ..Default::default()
            }),
            Some(Arc::new(packed())),
        );

        let v0 = TransactionTraceV0::from_augmented(&trace, &TraceReceiptContext::new(false, LogVersion::V0));
        let partial = v0.partial.as_ref().unwrap();
        assert_eq!(partial.expiration, 42);
        assert_eq!(partial.signatures, vec![Signature::new([5u8; 65])]);
        assert_eq!(partial.context_free_data, vec![Bytes::from(&b"cfd"[..])]);

        let v1 = TransactionTraceV0::from_augmented(&trace, &TraceReceiptContext::new(false, LogVersion::V1));
        let partial = v1.partial.as_ref().unwrap();
        assert!(partial.signatures.is_empty());
        assert!(partial.context_free_data.is_empty());
        assert_eq!(v1.cpu_usage_us, 100);
        assert_eq!(TransactionTraceV0::unpack(&v1.pack().unwrap()).unwrap(), v1);
    }

    #[test]
    fn only_the_retry_trace_gets_the_partial_slot() {
        let retry = Arc::new(TransactionTrace {
            id: Id::hash(b"retry"),
            receipt: Some(TransactionReceiptHeader::new(TransactionStatus::SoftFail, 1, 1)),
            ..Default::default()
        });
        let outer = AugmentedTransactionTrace::new(
            Arc::new(TransactionTrace {
                id: Id::hash(b"outer"),
                receipt: Some(TransactionReceiptHeader::new(TransactionStatus::Executed, 1, 1)),
                failed_dtrx_trace: Some(retry),
                ..Default::default()
            }),
            Some(Arc::new(packed())),
        );
        let record =
            TransactionTraceV0::from_augmented(&outer, &TraceReceiptContext::new(false, LogVersion::V1));
        assert!(record.partial.is_none());
        let inner = record.failed_dtrx_trace.as_deref().unwrap();
        assert_eq!(inner.id, Id::hash(b"retry"));
        assert_eq!(inner.status, TransactionStatus::SoftFail);
        assert!(inner.partial.is_some());
        assert_eq!(TransactionTraceV0::unpack(&record.pack().unwrap()).unwrap(), record);
    }

    #[test]
    fn none_prunable_data_converts_to_empty_partial() {
        let packed = PackedTransaction::new(Transaction::default(), PrunableData::None).unwrap();
        let partial = PartialTransactionV0::from_packed(&packed, LogVersion::V0);
        assert!(partial.signatures.is_empty());
        assert!(partial.context_free_data.is_empty());
    }
}
