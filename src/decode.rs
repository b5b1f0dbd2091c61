//! Record decoder: one raw history line in, one decoded record out.
//!
//! The decoder owns the code tables and the optional item index, walks the
//! tokenised fields of a line, and accumulates a [`LogRecord`] with
//! human-readable keys and canonicalised values. It never aborts a run:
//! unknown data codes degrade to `data_code_<tag>` fields and a journal
//! entry, unknown command tags pass through raw, and only a line with an
//! unparseable header is rejected outright.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use crate::codes::{translate_client, translate_command, translate_data, CodeTable, ItemIndex};
use crate::date::normalize_date;
use crate::record::LogRecord;
use crate::tokenize::{is_sentinel, split_data, split_envelope, split_line};

/// Client software identifier; its value is translated, not stored raw.
const TAG_CLIENT_TYPE: &str = "dC";
/// User PIN; its value is redacted unconditionally.
const TAG_USER_PIN: &str = "Uf";
/// The three tags that together form an item-index lookup key.
const TAG_CATALOG_KEY: &str = "tJ";
const TAG_CALL_SEQUENCE: &str = "tL";
const TAG_COPY_NUMBER: &str = "IS";

/// Tags whose values always carry a date, whatever the table calls them.
const DATE_TAGS: [&str; 5] = ["UK", "HB", "UD", "UZ", "CO"];
/// Tags whose values carry a branch code with the internal `EPL` prefix.
const LIBRARY_TAGS: [&str; 4] = ["FE", "FW", "HO", "nu"];

/// Replacement value stored for every `Uf` field.
pub const REDACTED_PIN: &str = "xxxxx";

/// A line the decoder refuses to turn into a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("empty line")]
    Empty,
    #[error("unparseable header {0:?}")]
    BadHeader(String),
}

/// A successfully decoded line.
#[derive(Debug)]
pub struct Decoded {
    pub record: LogRecord,
    /// Unrecognised data codes encountered on this line.
    pub missing_codes: u32,
}

/// Streaming history-log decoder.
///
/// Tables are fixed at construction and shared by every line; the only
/// mutable state is the missing-codes journal.
pub struct Decoder {
    cmd_codes: CodeTable,
    data_codes: CodeTable,
    client_types: CodeTable,
    item_index: Option<ItemIndex>,
    missing_codes: BTreeMap<u64, String>,
}

impl Decoder {
    pub fn new(
        cmd_codes: CodeTable,
        data_codes: CodeTable,
        client_types: CodeTable,
        item_index: Option<ItemIndex>,
    ) -> Self {
        if item_index.is_none() {
            warn!("no item index given: item keys will not be translated into item barcodes");
        }
        Self {
            cmd_codes,
            data_codes,
            client_types,
            item_index,
            missing_codes: BTreeMap::new(),
        }
    }

    /// Decode one raw line.
    ///
    /// `line_no` is the 1-based physical line number, used to key journal
    /// entries for unknown data codes.
    pub fn decode_line(&mut self, line_no: u64, line: &str) -> Result<Decoded, LineError> {
        if line.is_empty() {
            return Err(LineError::Empty);
        }
        let fields = split_line(line);
        let timestamp = normalize_date(fields.header);
        if timestamp.is_empty() {
            return Err(LineError::BadHeader(fields.header.to_string()));
        }

        let mut record = LogRecord::new();
        record.insert("timestamp", timestamp);

        // The command envelope concatenates the command tag and the first
        // data field; hand the remainder back to the payload stream.
        let (command_name, remainder) = match fields.envelope {
            Some(envelope) => {
                let (_, rest) = split_envelope(envelope);
                (translate_command(&self.cmd_codes, envelope).to_string(), rest)
            }
            None => (String::new(), ""),
        };
        record.insert("command_code", command_name.as_str());

        let mut missing = 0u32;
        let mut item_key = ItemKeyParts::default();

        for token in std::iter::once(remainder).chain(fields.payload.iter().copied()) {
            if token.is_empty() || is_sentinel(token) {
                continue;
            }
            let (tag, value) = split_data(token);

            if tag == TAG_CLIENT_TYPE {
                record.insert("client_type", translate_client(&self.client_types, value));
                continue;
            }
            if tag == TAG_USER_PIN {
                record.insert("user_pin", REDACTED_PIN);
                continue;
            }

            let name = translate_data(&self.data_codes, token).to_string();
            if name == tag {
                // Identity return from the translator: unknown data code.
                if record.insert(format!("data_code_{tag}"), value) {
                    self.journal_missing(line_no, tag);
                    missing += 1;
                }
            } else if is_date_field(tag, &name) {
                record.insert(name, normalize_date(value));
            } else if is_library_field(tag, &name) {
                record.insert(name, value.strip_prefix("EPL").unwrap_or(value));
            } else {
                record.insert(name, value);
            }

            if item_key.offer(tag, value) {
                if let Some(index) = &self.item_index {
                    if let Some(barcode) = item_key.key().and_then(|key| index.get(&key)) {
                        record.insert("item_id", barcode);
                    }
                }
            }
        }

        if let Some(post) = post_processor(&command_name) {
            post(&mut record);
        }

        Ok(Decoded {
            record,
            missing_codes: missing,
        })
    }

    /// Journal of unrecognised data codes: line number to comma-joined tags.
    pub fn missing_codes(&self) -> &BTreeMap<u64, String> {
        &self.missing_codes
    }

    fn journal_missing(&mut self, line_no: u64, tag: &str) {
        self.missing_codes
            .entry(line_no)
            .and_modify(|codes| {
                codes.push(',');
                codes.push_str(tag);
            })
            .or_insert_with(|| tag.to_string());
    }
}

/// True when the tag's value must pass through the date normaliser.
fn is_date_field(tag: &str, name: &str) -> bool {
    DATE_TAGS.contains(&tag)
        || name.starts_with("date_")
        || name.ends_with("_activity")
        || name.ends_with("_expires")
        || name.ends_with("_granted")
}

/// True when the tag's value is a branch code carrying the `EPL` prefix.
fn is_library_field(tag: &str, name: &str) -> bool {
    LIBRARY_TAGS.contains(&tag) || name.contains("library")
}

/// Accumulator for the three-part item lookup key.
#[derive(Debug, Default)]
struct ItemKeyParts {
    catalog: Option<String>,
    sequence: Option<String>,
    copy: Option<String>,
}

impl ItemKeyParts {
    /// Record a key part if `tag` is one of the three; returns whether the
    /// part set changed (the cue to attempt a lookup).
    fn offer(&mut self, tag: &str, value: &str) -> bool {
        let slot = match tag {
            TAG_CATALOG_KEY => &mut self.catalog,
            TAG_CALL_SEQUENCE => &mut self.sequence,
            TAG_COPY_NUMBER => &mut self.copy,
            _ => return false,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
        true
    }

    /// The composite `catalog_key|call_seq|copy_num|` key, once all three
    /// parts have been seen.
    fn key(&self) -> Option<String> {
        match (&self.catalog, &self.sequence, &self.copy) {
            (Some(c), Some(s), Some(n)) => Some(format!("{c}|{s}|{n}|")),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Command-specific post-processing
// ---------------------------------------------------------------------------

type PostProcessor = fn(&mut LogRecord);

/// Per-command fixups, keyed by translated command name.
///
/// The decoder loop stays command-agnostic; anything a particular command
/// needs done to its finished record lives here.
fn post_processor(command: &str) -> Option<PostProcessor> {
    match command {
        "Discharge Item" => Some(backfill_discharge_date),
        _ => None,
    }
}

/// Discharges logged without a `date_of_discharge` field get one from the
/// date portion of the transaction timestamp.
fn backfill_discharge_date(record: &mut LogRecord) {
    if record.contains("date_of_discharge") {
        return;
    }
    let date = match record.get("timestamp") {
        Some(ts) => ts.split(' ').next().unwrap_or("").to_string(),
        None => return,
    };
    if !date.is_empty() {
        record.insert("date_of_discharge", date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd_codes() -> CodeTable {
        let mut t = CodeTable::new(false);
        t.merge([("EV", "Discharge Item"), ("JZ", "Create Hold")]);
        t
    }

    fn data_codes() -> CodeTable {
        let mut t = CodeTable::new(true);
        t.merge([
            ("FF", "Station Login"),
            ("Fc", "Station Login Clearance"),
            ("FE", "Station Library"),
            ("NQ", "Item ID"),
            ("UO", "User ID"),
            ("HB", "Date Hold Expires"),
            ("HK", "Hold Type"),
            ("HO", "Hold Pickup Library"),
            ("UZ", "Birth Year"),
            ("tJ", "Catalog Key Number"),
            ("tL", "Call Sequence"),
            ("IS", "Copy Number"),
        ]);
        t
    }

    fn client_types() -> CodeTable {
        let mut t = CodeTable::new(false);
        t.merge([("5", "CLIENT_ONLINE_CATALOG"), ("6", "CLIENT_SIP2")]);
        t
    }

    fn decoder(index: Option<ItemIndex>) -> Decoder {
        Decoder::new(cmd_codes(), data_codes(), client_types(), index)
    }

    fn keys(record: &LogRecord) -> Vec<&str> {
        record.iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_discharge_line_decodes_in_field_order() {
        let mut d = decoder(None);
        let line = "E202310100510083031R ^S01EVFFADMIN^FEEPLRIV^FcNONE^NQ31221112079020^^O00049";
        let out = d.decode_line(1, line).unwrap();
        assert_eq!(out.missing_codes, 0);
        assert_eq!(
            keys(&out.record),
            vec![
                "timestamp",
                "command_code",
                "station_login",
                "station_library",
                "station_login_clearance",
                "item_id",
                "date_of_discharge",
            ]
        );
        assert_eq!(out.record.get("timestamp"), Some("2023-10-10 05:10:08"));
        assert_eq!(out.record.get("command_code"), Some("Discharge Item"));
        assert_eq!(out.record.get("station_library"), Some("RIV"));
        assert_eq!(out.record.get("station_login_clearance"), Some("NONE"));
        assert_eq!(out.record.get("item_id"), Some("31221112079020"));
        // Synthesised from the timestamp: the line itself has no Eg field.
        assert_eq!(out.record.get("date_of_discharge"), Some("2023-10-10"));
    }

    #[test]
    fn test_hold_line_redacts_translates_and_journals() {
        let mut d = decoder(None);
        let line = "E202304110001162995R ^S01JZFFBIBLIOCOMM^FcNONE^FEEPLRIV^UO21221023395855\
                    ^Uf0490^NQ31221059760525^HB04/11/2024^HKTITLE^HOEPLRIV^dC5^^O00112^zZProblem^O0";
        let out = d.decode_line(2, line).unwrap();
        assert_eq!(out.record.get("command_code"), Some("Create Hold"));
        assert_eq!(out.record.get("user_pin"), Some("xxxxx"));
        assert_eq!(out.record.get("date_hold_expires"), Some("2024-04-11"));
        assert_eq!(out.record.get("hold_pickup_library"), Some("RIV"));
        assert_eq!(out.record.get("client_type"), Some("CLIENT_ONLINE_CATALOG"));
        assert_eq!(out.record.get("data_code_zZ"), Some("Problem"));
        assert_eq!(out.missing_codes, 1);
        assert_eq!(d.missing_codes().get(&2).map(String::as_str), Some("zZ"));
        // Structural O-sentinels never become fields.
        assert!(!out.record.iter().any(|(k, _)| k.starts_with("data_code_O")));
    }

    #[test]
    fn test_item_enrichment_hit() {
        let index = {
            use std::io::Write as _;
            let mut f = tempfile::NamedTempFile::new().unwrap();
            f.write_all(b"2161659|47|2|31221023069607\n").unwrap();
            ItemIndex::load(f.path()).unwrap()
        };
        let mut d = decoder(Some(index));
        let line = "E202310100510083031R ^S01EVFFADMIN^tJ2161659^tL47^IS2^^O00049";
        let out = d.decode_line(1, line).unwrap();
        assert_eq!(out.record.get("item_id"), Some("31221023069607"));
        // The parts themselves still decode under their own names.
        assert_eq!(out.record.get("catalog_key_number"), Some("2161659"));
        assert_eq!(out.record.get("call_sequence"), Some("47"));
        assert_eq!(out.record.get("copy_number"), Some("2"));
    }

    #[test]
    fn test_item_enrichment_miss_is_silent() {
        let index = {
            use std::io::Write as _;
            let mut f = tempfile::NamedTempFile::new().unwrap();
            f.write_all(b"1|1|1|31221000000000\n").unwrap();
            ItemIndex::load(f.path()).unwrap()
        };
        let mut d = decoder(Some(index));
        let line = "E202310100510083031R ^S01EVFFADMIN^tJ2161659^tL47^IS2^^O00049";
        let out = d.decode_line(1, line).unwrap();
        assert_eq!(out.record.get("item_id"), None);
        assert!(d.missing_codes().is_empty());
    }

    #[test]
    fn test_no_index_disables_enrichment() {
        let mut d = decoder(None);
        let line = "E202310100510083031R ^S01EVFFADMIN^tJ2161659^tL47^IS2^^O00049";
        let out = d.decode_line(1, line).unwrap();
        assert_eq!(out.record.get("item_id"), None);
    }

    #[test]
    fn test_envelope_login_beats_payload_duplicate() {
        let mut d = decoder(None);
        let line = "E202310100510083031R ^S01EVFFADMIN^FFSIPCHK^^O";
        let out = d.decode_line(1, line).unwrap();
        assert_eq!(out.record.get("station_login"), Some("ADMIN"));
    }

    #[test]
    fn test_unknown_command_tag_passes_through_raw() {
        let mut d = decoder(None);
        let line = "E202310100510083031R ^S01QQFFADMIN^^O";
        let out = d.decode_line(1, line).unwrap();
        assert_eq!(out.record.get("command_code"), Some("QQ"));
    }

    #[test]
    fn test_birth_year_is_a_full_date_under_the_historical_key() {
        let mut d = decoder(None);
        let line = "E202310100510083031R ^S01JZFFADMIN^UZ6/1/1994^^O";
        let out = d.decode_line(1, line).unwrap();
        assert_eq!(out.record.get("birth_year"), Some("1994-06-01"));
    }

    #[test]
    fn test_empty_line_is_an_error() {
        let mut d = decoder(None);
        assert!(matches!(d.decode_line(1, ""), Err(LineError::Empty)));
    }

    #[test]
    fn test_bad_header_is_an_error() {
        let mut d = decoder(None);
        let err = d.decode_line(1, "garbage^S01EVFFADMIN^^O").unwrap_err();
        assert!(matches!(err, LineError::BadHeader(_)));
    }

    #[test]
    fn test_journal_joins_tags_with_commas() {
        let mut d = decoder(None);
        let line = "E202310100510083031R ^S01EVFFADMIN^zZProblem^aAOther^^O";
        d.decode_line(7, line).unwrap();
        assert_eq!(d.missing_codes().get(&7).map(String::as_str), Some("zZ,aA"));
    }
}
