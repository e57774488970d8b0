use std::io;

use pulsevm_serialization::{ReadError, WriteError};
use thiserror::Error;

use crate::chain::Id;

#[derive(Debug, Error)]
pub enum StateHistoryError {
    #[error("missing trace for transaction {0}")]
    MissingTrace(Id),
    #[error("state history log version 0 does not support trace pruning")]
    PruneUnsupported,
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("read datastream over: need {needed} bytes, {remaining} remaining")]
    OutOfRange { needed: usize, remaining: usize },
    #[error("unsupported trace log version {0}")]
    UnsupportedVersion(u32),
    #[error("unknown prunable data tag {0}")]
    UnknownPrunableTag(u8),
    #[error("corrupt trace log entry: {0}")]
    Corrupt(String),
    #[error("pruned record at offset {offset} would grow from {original} to {pruned} bytes")]
    PruneGrowth {
        offset: usize,
        original: usize,
        pruned: usize,
    },
    #[error("deserialization error: {0}")]
    Read(#[from] ReadError),
    #[error("serialization error: {0}")]
    Write(#[from] WriteError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Config(String),
}

#[inline]
pub fn pulse_assert<T>(condition: bool, error: T) -> Result<(), T> {
    if condition { Ok(()) } else { Err(error) }
}
