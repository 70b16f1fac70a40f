//! Decode the UTXO set out of a Bitcoin Core `chainstate` LevelDB.
//!
//! The codec (`varint`, `amount`, `obfuscation`, `chainstate`) is independent
//! of the storage engine: it works on raw `(key, value)` byte pairs handed
//! out by any [`store::ChainstateStore`]. [`chainstate_leveldb`] provides the
//! LevelDB-backed store and [`dump`] ties everything together.

pub mod amount;
pub mod chainstate;
pub mod chainstate_leveldb;
pub mod config;
pub mod dump;
pub mod error;
pub mod obfuscation;
pub mod sink;
pub mod store;
pub mod telemetry;
pub mod varint;

pub use chainstate::{decode_entry, decode_key, decode_value, Coin, OutPoint, Txid, UtxoRecord};
pub use dump::{dump_chainstate, dump_utxos, DumpOptions, DumpSummary};
pub use error::{DumpError, FormatError};
pub use obfuscation::{load_obfuscation_key, ObfuscationKey};
pub use sink::{CsvSink, JsonLinesSink, OutputFormat, UtxoSink};
pub use store::ChainstateStore;
