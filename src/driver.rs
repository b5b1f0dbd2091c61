//! Streaming driver: lines in, emitted records out, strictly in order.
//!
//! The driver owns the per-run bookkeeping. Each line is counted, checked
//! against the range gate, decoded, and handed to the emitter; a line the
//! decoder rejects bumps the error counter and is dropped. Only stream I/O
//! and emitter failures abort the run.

use std::collections::BTreeMap;
use std::io;

use tracing::debug;

use crate::decode::Decoder;
use crate::emit::Emitter;
use crate::error::Result;
use crate::gate::RangeGate;

/// Aggregate counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Physical lines consumed from the input.
    pub lines_read: u64,
    /// Lines that passed the range gate.
    pub admitted: u64,
    /// Records handed to the emitter.
    pub emitted: u64,
    /// Admitted lines the decoder rejected.
    pub errors: u64,
    /// Unrecognised data codes across all emitted records.
    pub missing_codes: u64,
}

/// End-of-stream summary handed to the emitter.
#[derive(Debug)]
pub struct RunSummary<'a> {
    pub stats: RunStats,
    /// Line number to comma-joined unrecognised data codes.
    pub missing_codes: &'a BTreeMap<u64, String>,
}

/// Drive a full conversion: gate, decode, and emit every line in `lines`.
///
/// `lines` may chain several input files; output order always matches
/// input order. For every run, `emitted + errors == admitted`.
pub fn run<I, E>(
    lines: I,
    gate: &RangeGate,
    decoder: &mut Decoder,
    emitter: &mut E,
) -> Result<RunStats>
where
    I: IntoIterator<Item = io::Result<String>>,
    E: Emitter,
{
    let mut stats = RunStats::default();
    for line in lines {
        let line = line?;
        stats.lines_read += 1;
        if !gate.admits(&line) {
            continue;
        }
        stats.admitted += 1;
        match decoder.decode_line(stats.lines_read, &line) {
            Ok(decoded) => {
                emitter.emit(&decoded.record)?;
                stats.emitted += 1;
                stats.missing_codes += u64::from(decoded.missing_codes);
            }
            Err(err) => {
                debug!(line = stats.lines_read, %err, "skipping line");
                stats.errors += 1;
            }
        }
    }
    emitter.finish(&RunSummary {
        stats,
        missing_codes: decoder.missing_codes(),
    })?;
    Ok(stats)
}
