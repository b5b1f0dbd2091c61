//! Line producer for history-log and code-table files.
//!
//! Symphony files are declared ISO-8859-1 and routinely contain bytes that
//! are not valid UTF-8, so lines are read as raw bytes and decoded with
//! [`encoding_rs::mem::decode_latin1`]. Rotated logs arrive gzip-compressed;
//! a `.gz` extension switches the reader to streaming decompression.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use encoding_rs::mem::decode_latin1;
use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::error::{HistError, Result};

/// A fallible iterator over the lines of one input file.
///
/// Yields each line as a `String` with the trailing `\n` (and `\r`, if
/// present) stripped. I/O failures surface as iterator items so the driver
/// can abort the run.
pub struct LineSource {
    reader: Box<dyn BufRead>,
    buf: Vec<u8>,
}

impl LineSource {
    /// Open a file, transparently decompressing `.gz` input.
    ///
    /// `.Z` (LZW compress) archives cannot be streamed and are rejected as
    /// a configuration error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => {
                debug!(path = %path.display(), "reading gzip-compressed input");
                Ok(Self::from_reader(BufReader::new(MultiGzDecoder::new(file))))
            }
            Some("Z") => Err(HistError::UnsupportedCompression(path.to_path_buf())),
            _ => Ok(Self::from_reader(BufReader::new(file))),
        }
    }

    /// Wrap any buffered reader (tests, stdin).
    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            buf: Vec::new(),
        }
    }
}

impl Iterator for LineSource {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
                Some(Ok(decode_latin1(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines(bytes: &[u8]) -> Vec<String> {
        LineSource::from_reader(Cursor::new(bytes.to_vec()))
            .map(|l| l.unwrap())
            .collect()
    }

    #[test]
    fn test_strips_line_endings() {
        assert_eq!(lines(b"one\ntwo\r\nthree"), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_preserves_empty_lines() {
        assert_eq!(lines(b"one\n\ntwo\n"), vec!["one", "", "two"]);
    }

    #[test]
    fn test_decodes_latin1_bytes() {
        // 0xE9 is 'é' in ISO-8859-1 and invalid as a UTF-8 start byte.
        assert_eq!(lines(b"Caf\xe9\n"), vec!["Café"]);
    }

    #[test]
    fn test_reads_gzip_input() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write as _;

        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"one\ntwo\n").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2023.hist.gz");
        std::fs::write(&path, enc.finish().unwrap()).unwrap();

        let got: Vec<String> = LineSource::open(&path).unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(got, vec!["one", "two"]);
    }

    #[test]
    fn test_rejects_lzw_compress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2023.hist.Z");
        std::fs::write(&path, b"\x1f\x9d").unwrap();
        assert!(matches!(
            LineSource::open(&path),
            Err(HistError::UnsupportedCompression(_))
        ));
    }
}
