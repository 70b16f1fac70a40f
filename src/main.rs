//! utxodump
//!
//! Dumps the UTXO set from a Bitcoin Core chainstate LevelDB as CSV (or JSON
//! lines). Every field except the script pubkey is emitted.
//!
//! ## Usage
//!
//! ```bash
//! # Stop bitcoind (or copy the chainstate directory) first: LevelDB is locked
//! utxodump > utxos.csv
//! utxodump --testnet --format json
//! utxodump --chainstate-dir /tmp/chainstate-copy -o utxos.csv
//! ```

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use utxodump::chainstate_leveldb::LevelDbChainstate;
use utxodump::config::{load_settings, DumpSettings};
use utxodump::sink::make_sink;
use utxodump::telemetry::{init_tracing, TelemetryConfig};
use utxodump::{dump_chainstate, DumpError, DumpOptions, DumpSummary, OutputFormat};

#[derive(Parser, Debug)]
#[clap(name = "utxodump")]
#[clap(about = "Dump the UTXO set from a Bitcoin Core chainstate LevelDB", long_about = None)]
struct Args {
    /// Path to the chainstate directory (overrides --datadir and --testnet)
    #[clap(short = 'd', long)]
    chainstate_dir: Option<String>,

    /// Testnet mode (ignored if --chainstate-dir is used)
    #[clap(short = 't', long)]
    testnet: bool,

    /// Node data directory (default: ~/.bitcoin)
    #[clap(long)]
    datadir: Option<String>,

    /// Write to this file instead of stdout
    #[clap(short = 'o', long)]
    output: Option<String>,

    /// Output format
    #[clap(short = 'f', long, value_enum)]
    format: Option<OutputFormat>,

    /// Settings file (default: ./utxodump.toml if present)
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Command-line flags take precedence over file and environment settings.
    fn apply(self, mut settings: DumpSettings) -> DumpSettings {
        if self.chainstate_dir.is_some() {
            settings.chainstate_dir = self.chainstate_dir;
        }
        if self.testnet {
            settings.testnet = true;
        }
        if let Some(datadir) = self.datadir {
            settings.datadir = datadir;
        }
        if self.output.is_some() {
            settings.output = self.output;
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let log_guard = init_tracing(TelemetryConfig::default())?;

    let settings = load_settings(args.config.as_deref())?;
    let settings = args.apply(settings);
    let chainstate_path = settings.chainstate_path();

    if settings.chainstate_dir.is_some() && settings.testnet {
        warn!("--testnet is ignored because an explicit chainstate directory was given");
    }

    let cancel = Arc::new(AtomicBool::new(false));
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current record");
                cancel.store(true, Ordering::Relaxed);
            }
        }
    });

    let result = tokio::task::spawn_blocking(move || run_dump(&chainstate_path, &settings, &cancel)).await?;

    match result {
        Ok(summary) => {
            info!(
                records = summary.records,
                coinbase_records = summary.coinbase_records,
                total_amount = summary.total_amount,
                "Dump complete"
            );
            Ok(())
        }
        Err(e) if e.is_clean_exit() => {
            info!(reason = %e, "Dump stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Dump failed");
            // exit() skips destructors; flush the log file first.
            drop(log_guard);
            std::process::exit(1);
        }
    }
}

/// Open the chainstate and stream it to the configured output.
fn run_dump(chainstate_path: &Path, settings: &DumpSettings, cancel: &AtomicBool) -> Result<DumpSummary, DumpError> {
    let mut store = LevelDbChainstate::open(chainstate_path)?;

    let writer: Box<dyn Write> = match settings.output_path() {
        Some(path) => {
            info!(path = %path.display(), format = ?settings.format, "Writing UTXO set to file");
            Box::new(File::create(&path)?)
        }
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = make_sink(settings.format, writer);

    let options = DumpOptions { progress_interval: settings.progress_interval };
    dump_chainstate(&mut store, sink.as_mut(), cancel, options)
}
