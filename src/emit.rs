//! JSON emitters: one array, or one object per line.
//!
//! Array mode produces a single well-formed JSON array for ordinary
//! consumers; document-store mode writes newline-delimited objects the way
//! MongoDB's import tooling expects them. Both serialize records through
//! `serde_json`, so key order is the record's insertion order.

use std::io::Write;

use crate::driver::RunSummary;
use crate::error::Result;
use crate::record::LogRecord;

/// Consumer of decoded records.
///
/// `finish` is called exactly once, after the last record, with the run
/// summary; emitters that bracket their output close it there.
pub trait Emitter {
    fn emit(&mut self, record: &LogRecord) -> Result<()>;
    fn finish(&mut self, summary: &RunSummary<'_>) -> Result<()>;
}

/// Emits all records as one JSON array, one record per line inside it.
pub struct JsonArrayEmitter<W: Write> {
    out: W,
    count: u64,
}

impl<W: Write> JsonArrayEmitter<W> {
    pub fn new(out: W) -> Self {
        Self { out, count: 0 }
    }
}

impl<W: Write> Emitter for JsonArrayEmitter<W> {
    fn emit(&mut self, record: &LogRecord) -> Result<()> {
        self.out
            .write_all(if self.count == 0 { b"[\n" } else { b",\n" })?;
        serde_json::to_writer(&mut self.out, record)?;
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self, _summary: &RunSummary<'_>) -> Result<()> {
        if self.count == 0 {
            self.out.write_all(b"[]\n")?;
        } else {
            self.out.write_all(b"\n]\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Emits one JSON object per line, no surrounding array (document-store
/// mode).
pub struct JsonLinesEmitter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesEmitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Emitter for JsonLinesEmitter<W> {
    fn emit(&mut self, record: &LogRecord) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self, _summary: &RunSummary<'_>) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
