//! Output sinks for decoded UTXO records.

use std::io::Write;

use serde::Deserialize;

use crate::chainstate::UtxoRecord;
use crate::error::DumpError;

/// Column names of the tabular output.
pub const CSV_HEADER: [&str; 5] = ["txid", "vout", "height", "coinbase", "amount"];

/// Append-only destination for records.
pub trait UtxoSink {
    /// Called once before the first record.
    fn write_header(&mut self) -> Result<(), DumpError>;

    fn write_record(&mut self, record: &UtxoRecord) -> Result<(), DumpError>;

    fn flush(&mut self) -> Result<(), DumpError>;
}

/// Comma-separated rows: lowercase hex txid, decimal numbers, coinbase as 0/1.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        CsvSink { writer }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W, DumpError> {
        self.writer
            .into_inner()
            .map_err(|e| DumpError::Io(e.into_error()))
    }
}

impl<W: Write> UtxoSink for CsvSink<W> {
    fn write_header(&mut self) -> Result<(), DumpError> {
        self.writer.write_record(CSV_HEADER)?;
        Ok(())
    }

    fn write_record(&mut self, record: &UtxoRecord) -> Result<(), DumpError> {
        self.writer.serialize((
            record.txid.to_hex(),
            record.vout,
            record.height,
            u8::from(record.coinbase),
            record.amount,
        ))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DumpError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One JSON object per line. No header.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    pub fn into_inner(mut self) -> Result<W, DumpError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> UtxoSink for JsonLinesSink<W> {
    fn write_header(&mut self) -> Result<(), DumpError> {
        Ok(())
    }

    fn write_record(&mut self, record: &UtxoRecord) -> Result<(), DumpError> {
        // Serialize first so a failed write never leaves half a line behind.
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DumpError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Collects records in memory.
impl UtxoSink for Vec<UtxoRecord> {
    fn write_header(&mut self) -> Result<(), DumpError> {
        Ok(())
    }

    fn write_record(&mut self, record: &UtxoRecord) -> Result<(), DumpError> {
        self.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DumpError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Build the sink for `format` on top of `writer`.
pub fn make_sink<'a, W: Write + 'a>(format: OutputFormat, writer: W) -> Box<dyn UtxoSink + 'a> {
    match format {
        OutputFormat::Csv => Box::new(CsvSink::new(writer)),
        OutputFormat::Json => Box::new(JsonLinesSink::new(std::io::BufWriter::new(writer))),
    }
}
