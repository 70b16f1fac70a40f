//! Error types for chainstate decoding and dumping.
//!
//! `FormatError` covers every way the on-disk encoding can be malformed.
//! `DumpError` wraps it together with store, output and configuration
//! failures. Nothing here is recoverable per record: a corrupt entry aborts
//! the whole dump.

use std::io;

use thiserror::Error;

/// Malformed chainstate data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("varint truncated: no terminating byte in {len} byte(s)")]
    TruncatedVarint { len: usize },

    #[error("varint does not fit in 64 bits")]
    VarintOverflow,

    #[error("{field}: varint consumed {consumed} of {len} byte(s)")]
    TrailingBytes {
        field: &'static str,
        consumed: usize,
        len: usize,
    },

    #[error("coin key too short: {len} byte(s), need at least 34")]
    ShortKey { len: usize },

    #[error("coin key prefix is {found:#04x}, expected {expected:#04x}")]
    UnexpectedPrefix { expected: u8, found: u8 },

    #[error("obfuscation key record not found")]
    MissingObfuscationKey,

    #[error("obfuscation key record malformed: length tag {tag}, total length {len} (expected tag 8, length 9)")]
    InvalidObfuscationKey { tag: u8, len: usize },

    #[error("compressed amount {0} overflows u64")]
    AmountOverflow(u64),
}

/// Errors surfaced by the dump driver and its collaborators.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("malformed entry (key {key}): {source}")]
    Entry {
        key: String,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("chainstate store error: {0}")]
    Store(String),

    #[error("dump interrupted after {records} record(s)")]
    Interrupted { records: u64 },

    #[error("output error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl DumpError {
    /// Attach the offending raw key to a decode failure.
    pub fn entry(key: &[u8], source: FormatError) -> Self {
        DumpError::Entry {
            key: hex::encode(key),
            source,
        }
    }

    /// Whether the run should still exit successfully.
    ///
    /// Operator interrupts and a reader closing the output pipe (e.g.
    /// `utxodump | head`) stop the dump without being failures.
    pub fn is_clean_exit(&self) -> bool {
        match self {
            DumpError::Interrupted { .. } => true,
            DumpError::Io(e) => e.kind() == io::ErrorKind::BrokenPipe,
            DumpError::Csv(e) => matches!(
                e.kind(),
                csv::ErrorKind::Io(io_err) if io_err.kind() == io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
