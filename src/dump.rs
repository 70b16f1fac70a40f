//! Dump driver: walk the coin range of a chainstate and stream every decoded
//! UTXO to a sink.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace};

use crate::chainstate::{decode_entry, COIN_RANGE_END, COIN_RANGE_START};
use crate::error::DumpError;
use crate::obfuscation::{load_obfuscation_key, ObfuscationKey};
use crate::sink::UtxoSink;
use crate::store::ChainstateStore;
use crate::telemetry::{truncate_hex, ProgressCounter};

/// Totals for a finished dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub records: u64,
    pub coinbase_records: u64,
    /// Sum of all amounts, in satoshis. Saturates rather than wrapping.
    pub total_amount: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct DumpOptions {
    /// Log a progress line every this many records (0 disables).
    pub progress_interval: u64,
}

impl Default for DumpOptions {
    fn default() -> Self {
        DumpOptions { progress_interval: 1_000_000 }
    }
}

/// Decode every coin in `['C', 'D')` and write it to `sink`, in store order.
///
/// `cancel` is polled before each entry. When it is set the sink is flushed
/// and `DumpError::Interrupted` is returned; records already written are
/// complete. Any malformed entry aborts the dump.
pub fn dump_utxos<S, K>(
    store: &mut S,
    obfuscation: &ObfuscationKey,
    sink: &mut K,
    cancel: &AtomicBool,
    options: DumpOptions,
) -> Result<DumpSummary, DumpError>
where
    S: ChainstateStore + ?Sized,
    K: UtxoSink + ?Sized,
{
    let mut summary = DumpSummary::default();
    let progress = ProgressCounter::new(options.progress_interval);

    sink.write_header()?;

    for entry in store.range(COIN_RANGE_START, COIN_RANGE_END)? {
        if cancel.load(Ordering::Relaxed) {
            sink.flush()?;
            info!(records = summary.records, "Dump interrupted");
            return Err(DumpError::Interrupted { records: summary.records });
        }

        let (key, value) = entry?;
        let record = decode_entry(&key, value, obfuscation).map_err(|e| DumpError::entry(&key, e))?;
        trace!(
            txid = %truncate_hex(&record.txid.to_hex(), 16),
            vout = record.vout,
            height = record.height,
            amount = record.amount,
            "Decoded coin"
        );

        sink.write_record(&record)?;

        summary.records += 1;
        summary.total_amount = summary.total_amount.saturating_add(record.amount);
        if record.coinbase {
            summary.coinbase_records += 1;
        }

        if progress.should_log() {
            info!(
                records = summary.records,
                height = record.height,
                "Dump progress"
            );
        }
    }

    sink.flush()?;
    debug!(records = summary.records, "Coin range exhausted");
    Ok(summary)
}

/// Load the obfuscation key from `store`, then [`dump_utxos`].
pub fn dump_chainstate<S, K>(
    store: &mut S,
    sink: &mut K,
    cancel: &AtomicBool,
    options: DumpOptions,
) -> Result<DumpSummary, DumpError>
where
    S: ChainstateStore + ?Sized,
    K: UtxoSink + ?Sized,
{
    let obfuscation = load_obfuscation_key(store)?;
    dump_utxos(store, &obfuscation, sink, cancel, options)
}
