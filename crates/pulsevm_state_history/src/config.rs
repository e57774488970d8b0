use std::{fs, path::Path};

use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::{error::StateHistoryError, trace_log::LogVersion, types::TraceReceiptContext};

const MAX_COMPRESSION_LEVEL: u32 = 9;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct StateHistoryConfig {
    pub trace_log_version: u32,
    /// Keep action console output in the trace log.
    pub trace_debug_mode: bool,
    /// zlib level; values above 9 are treated as 9.
    pub compression_level: u32,
}

impl Default for StateHistoryConfig {
    fn default() -> Self {
        StateHistoryConfig {
            trace_log_version: 1,
            trace_debug_mode: false,
            compression_level: 6,
        }
    }
}

impl StateHistoryConfig {
    pub fn from_json_str(json: &str) -> Result<Self, StateHistoryError> {
        let config: StateHistoryConfig = serde_json::from_str(json)
            .map_err(|e| StateHistoryError::Config(format!("{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StateHistoryError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), StateHistoryError> {
        self.log_version().map(|_| ())
    }

    pub fn log_version(&self) -> Result<LogVersion, StateHistoryError> {
        LogVersion::try_from(self.trace_log_version).map_err(|_| {
            StateHistoryError::Config(format!(
                "unsupported trace_log_version {}",
                self.trace_log_version
            ))
        })
    }

    pub fn compression(&self) -> Compression {
        Compression::new(self.compression_level.min(MAX_COMPRESSION_LEVEL))
    }

    pub fn receipt_context(&self) -> Result<TraceReceiptContext, StateHistoryError> {
        Ok(TraceReceiptContext::new(self.trace_debug_mode, self.log_version()?)
            .with_compression(self.compression()))
    }
}
