//! Code tables and the item-key/barcode index.
//!
//! Symphony ships its tag definitions as pipe-delimited text, one entry per
//! line (`EV|Discharge Item|`). Three tables drive translation: command
//! codes (two-character tag, title-case name), data codes (two-character
//! tag, snake_case field name), and hold-client types (numeric id, client
//! name). All are built once at startup and read-only afterwards; the only
//! way to extend one is [`CodeTable::merge`], which re-applies the table's
//! normalisation so merged and file-loaded entries are indistinguishable.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::clean::clean_string;
use crate::error::{HistError, Result};
use crate::source::LineSource;
use crate::tokenize::{split_data, split_envelope};

/// One tag-to-name mapping.
///
/// `fold_spaces` fixes the normalisation applied to every value entering
/// the table: data-code tables fold to snake_case, command and client
/// tables preserve spaces and case.
#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    entries: HashMap<String, String>,
    fold_spaces: bool,
}

impl CodeTable {
    /// An empty table with the given value normalisation.
    pub fn new(fold_spaces: bool) -> Self {
        Self {
            entries: HashMap::new(),
            fold_spaces,
        }
    }

    /// Load a pipe-delimited `TAG|Human Name|` file.
    ///
    /// Files are read as ISO-8859-1. A line without a `|` separator is a
    /// fatal configuration error; blank lines are tolerated.
    pub fn load(path: impl AsRef<Path>, fold_spaces: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut table = Self::new(fold_spaces);
        for (idx, line) in LineSource::open(path)?.enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let (tag, rest) = line.split_once('|').ok_or_else(|| HistError::CodeTable {
                path: path.to_path_buf(),
                line: idx + 1,
            })?;
            let value = rest.split('|').next().unwrap_or("");
            table.put(tag, value);
        }
        debug!(path = %path.display(), entries = table.len(), "code table loaded");
        Ok(table)
    }

    /// Merge entries, re-applying this table's normalisation to each value.
    ///
    /// Existing tags are overwritten. Merging the same entry twice leaves
    /// the table unchanged.
    pub fn merge<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (tag, value) in entries {
            self.put(tag.as_ref(), value.as_ref());
        }
    }

    fn put(&mut self, tag: &str, value: &str) {
        self.entries
            .insert(tag.to_string(), clean_string(value, self.fold_spaces));
    }

    /// The normalised value for a tag, if the tag is defined.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries.get(tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------
//
// Translators never fail: a tag without a definition comes back unchanged,
// which is how the decoder recognises a miss.

/// Translate a payload token's data code to its canonical field name.
pub fn translate_data<'a>(table: &'a CodeTable, token: &'a str) -> &'a str {
    let (tag, _) = split_data(token);
    table.get(tag).unwrap_or(tag)
}

/// Translate a command envelope (or bare command tag) to its command name.
pub fn translate_command<'a>(table: &'a CodeTable, token: &'a str) -> &'a str {
    let (tag, _) = split_envelope(token);
    table.get(tag).unwrap_or(tag)
}

/// Translate a numeric client id to its client-type name.
pub fn translate_client<'a>(table: &'a CodeTable, token: &'a str) -> &'a str {
    table.get(token).unwrap_or(token)
}

// ---------------------------------------------------------------------------
// Item index
// ---------------------------------------------------------------------------

/// Item-key to barcode index, from `selitem -oIB` output.
///
/// Input lines look like `12345|55|1|31221012345678|`; the first three
/// fields joined with `|` (trailing `|` included) form the lookup key.
/// Production indexes run past a million entries, so barcodes are kept as
/// `Box<str>` and the key string is built exactly once per entry.
#[derive(Debug, Default)]
pub struct ItemIndex {
    entries: HashMap<String, Box<str>>,
}

impl ItemIndex {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut entries = HashMap::new();
        let mut malformed = 0usize;
        for line in LineSource::open(path)? {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split('|');
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(ckey), Some(cseq), Some(cnum), Some(barcode)) => {
                    entries.insert(
                        format!("{ckey}|{cseq}|{cnum}|"),
                        Box::from(barcode.trim_end()),
                    );
                }
                _ => malformed += 1,
            }
        }
        if malformed > 0 {
            warn!(count = malformed, path = %path.display(), "skipped malformed item index lines");
        }
        debug!(path = %path.display(), entries = entries.len(), "item index loaded");
        Ok(Self { entries })
    }

    /// Look up a `catalog_key|call_seq|copy_num|` composite key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|b| &**b)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
