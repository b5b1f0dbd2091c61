//! Range gate: pre-decode date filtering on raw line headers.
//!
//! Paying decode cost for lines outside the requested window would dominate
//! a multi-hundred-thousand-line run, so the gate compares the 14-digit
//! header timestamp against the bounds as plain digit strings before any
//! tokenisation happens.

/// An optional half-open `[start, end)` window over header timestamps.
///
/// Bounds are prefixes of `YYYYMMDDhhmmss`; both sides and the extracted
/// timestamp are truncated to the shorter bound before comparison, so
/// `20230412` matches any time of that day.
#[derive(Debug, Clone, Default)]
pub struct RangeGate {
    start: Option<String>,
    end: Option<String>,
}

impl RangeGate {
    /// Build a gate from optional bound strings.
    ///
    /// A non-numeric `start` can never match a header timestamp and is
    /// treated as absent.
    pub fn new(start: Option<&str>, end: Option<&str>) -> Self {
        let numeric = |s: &&str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        Self {
            start: start.filter(numeric).map(str::to_string),
            end: end.map(str::to_string),
        }
    }

    /// True when no bound is set (every parseable line is admitted).
    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Should this raw line be decoded?
    ///
    /// A line whose header does not parse is admitted; the decoder rejects
    /// it with a proper line error instead of the gate silently eating it.
    pub fn admits(&self, line: &str) -> bool {
        let Some(ts) = header_timestamp(line) else {
            return true;
        };
        let width = match (&self.start, &self.end) {
            (None, None) => return true,
            (Some(s), Some(e)) => s.len().min(e.len()),
            (Some(s), None) => s.len(),
            (None, Some(e)) => e.len(),
        }
        .min(ts.len());
        let ts = &ts[..width];
        let after_start = self
            .start
            .as_deref()
            .is_none_or(|s| truncate(s, width) <= ts);
        let before_end = self.end.as_deref().is_none_or(|e| ts < truncate(e, width));
        after_start && before_end
    }
}

/// The 14 digits at header positions 1..15, if the header parses.
fn header_timestamp(line: &str) -> Option<&str> {
    let b = line.as_bytes();
    if b.len() >= 15 && b[0] == b'E' && b[1..15].iter().all(u8::is_ascii_digit) {
        line.get(1..15)
    } else {
        None
    }
}

fn truncate(s: &str, width: usize) -> &str {
    &s[..width.min(s.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(day: &str) -> String {
        format!("E{day}0510083031R ^S01EVFFADMIN^^O00049")
    }

    #[test]
    fn test_open_gate_admits_everything() {
        let gate = RangeGate::new(None, None);
        assert!(gate.is_open());
        assert!(gate.admits(&header("20230412")));
        assert!(gate.admits("garbage"));
    }

    #[test]
    fn test_day_window_is_half_open() {
        let gate = RangeGate::new(Some("20230412"), Some("20230413"));
        assert!(!gate.admits(&header("20230411")));
        assert!(gate.admits(&header("20230412")));
        assert!(!gate.admits(&header("20230413")));
        assert!(!gate.admits(&header("20230414")));
    }

    #[test]
    fn test_end_only_admits_strictly_earlier() {
        let gate = RangeGate::new(None, Some("20230411"));
        assert!(gate.admits(&header("20230410")));
        assert!(!gate.admits(&header("20230411")));
        assert!(!gate.admits(&header("20230414")));
    }

    #[test]
    fn test_start_only() {
        let gate = RangeGate::new(Some("20230413"), None);
        assert!(!gate.admits(&header("20230412")));
        assert!(gate.admits(&header("20230413")));
        assert!(gate.admits(&header("20230414")));
    }

    #[test]
    fn test_bounds_truncate_to_shorter() {
        // Month-wide start, day-wide end: comparison happens at 6 digits.
        let gate = RangeGate::new(Some("202304"), Some("20230501"));
        assert!(gate.admits(&header("20230412")));
        assert!(!gate.admits(&header("20230512")));
    }

    #[test]
    fn test_non_numeric_start_is_ignored() {
        let gate = RangeGate::new(Some("last tuesday"), Some("20230413"));
        assert!(gate.admits(&header("20230101")));
        assert!(!gate.admits(&header("20230413")));
    }

    #[test]
    fn test_unparseable_header_passes() {
        let gate = RangeGate::new(Some("20230412"), Some("20230413"));
        assert!(gate.admits(""));
        assert!(gate.admits("E2023R short"));
        assert!(gate.admits("X20230412051008xxxxR "));
    }
}
