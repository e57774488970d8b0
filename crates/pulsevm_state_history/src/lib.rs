pub mod chain;
pub mod compression;
pub mod config;
pub mod error;
pub mod prunable_data;
pub mod trace_converter;
pub mod trace_log;
pub mod trace_pruner;
pub mod types;

pub use config::StateHistoryConfig;
pub use error::StateHistoryError;
pub use prunable_data::PrunableData;
pub use trace_converter::{TraceConverter, is_onblock};
pub use trace_log::{
    LogVersion, decode_traces, decode_traces_from, encode_traces, pack_traces, to_traces_bin_v0,
};
pub use trace_pruner::{prune, prune_traces};
pub use types::{TraceReceiptContext, TransactionTraceV0};
