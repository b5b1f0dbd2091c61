//! # hist2json
//!
//! Convert SirsiDynix Symphony history logs into structured JSON.
//!
//! A history log is a line-oriented, caret-delimited journal of every
//! transaction on the ILS: checkouts, discharges, holds, user edits.
//! Each line carries a timestamped header and a run of two-character-tagged
//! fields whose meaning lives in external code tables. This crate decodes
//! those lines into self-describing records with human-readable keys and
//! canonicalised values.
//!
//! ## Overview
//!
//! Decoding a line involves:
//! - **Code tables**: command, data, and client-type tag definitions,
//!   loaded once and read-only afterwards
//! - **Translation**: tag to canonical name, with identity fallback for
//!   unknown tags (a run never aborts on a bad code)
//! - **Canonicalisation**: five date shapes to `YYYY-MM-DD [HH:MM:SS]`,
//!   PIN redaction, branch-prefix stripping, item-barcode enrichment
//! - **Streaming**: a driver that gates lines by date range, decodes, and
//!   hands records to a JSON emitter in input order
//!
//! ## Example
//!
//! ```
//! use hist2json::{CodeTable, Decoder};
//!
//! let mut cmd_codes = CodeTable::new(false);
//! cmd_codes.merge([("EV", "Discharge Item")]);
//! let mut data_codes = CodeTable::new(true);
//! data_codes.merge([("FE", "Station Library")]);
//!
//! let mut decoder = Decoder::new(cmd_codes, data_codes, CodeTable::new(false), None);
//! let decoded = decoder
//!     .decode_line(1, "E202310100510083031R ^S01EVFEEPLRIV^^O00049")
//!     .unwrap();
//!
//! assert_eq!(decoded.record.get("timestamp"), Some("2023-10-10 05:10:08"));
//! assert_eq!(decoded.record.get("command_code"), Some("Discharge Item"));
//! assert_eq!(decoded.record.get("station_library"), Some("RIV"));
//! ```

pub mod clean;
pub mod codes;
pub mod date;
pub mod decode;
pub mod driver;
pub mod emit;
pub mod error;
pub mod gate;
pub mod record;
pub mod source;
pub mod tokenize;

pub use codes::{CodeTable, ItemIndex};
pub use decode::{Decoded, Decoder, LineError, REDACTED_PIN};
pub use driver::{run, RunStats, RunSummary};
pub use emit::{Emitter, JsonArrayEmitter, JsonLinesEmitter};
pub use error::{HistError, Result};
pub use gate::RangeGate;
pub use record::LogRecord;
pub use source::LineSource;
