//! Date normaliser for the five timestamp shapes found in history logs.
//!
//! Symphony records dates inconsistently: slash dates (`1/18/2023`), slash
//! dates with a time tail (`1/18/2023,5:40 PM`), 14-digit timestamps
//! (`20230118000059`), and whole header tokens (`E202301180000592981R `).
//! Everything is canonicalised to `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`;
//! an unrecognised shape yields the empty string, never an error.

/// Normalise a date string to `YYYY-MM-DD[ HH:MM:SS]`.
///
/// Shapes are tried in order, first match wins:
///
/// 1. already-canonical output — returned unchanged (idempotence),
/// 2. `M/D/YYYY` or `MM/DD/YYYY`, optionally with a `,H:MM AM/PM` tail
///    (the time is discarded),
/// 3. a 14-digit `YYYYMMDDhhmmss` timestamp,
/// 4. a header token `E<YYYYMMDDhhmmss>...` (leading `E` stripped),
/// 5. anything else — empty string.
pub fn normalize_date(s: &str) -> String {
    if is_canonical(s) {
        return s.to_string();
    }
    // Some dates carry a `,5:40 PM` tail; only the date part matters.
    let head = s.split(',').next().unwrap_or("");
    if head.contains('/') {
        return slash_date(head);
    }
    let digits = head.strip_prefix('E').unwrap_or(head);
    if leading_digits(digits) >= 14 {
        let b = digits.as_bytes();
        return format!(
            "{}-{}-{} {}:{}:{}",
            ascii(&b[0..4]),
            ascii(&b[4..6]),
            ascii(&b[6..8]),
            ascii(&b[8..10]),
            ascii(&b[10..12]),
            ascii(&b[12..14]),
        );
    }
    String::new()
}

/// True for strings already in `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` form.
fn is_canonical(s: &str) -> bool {
    let b = s.as_bytes();
    let date_ok = |b: &[u8]| {
        b.len() == 10
            && b[0..4].iter().all(u8::is_ascii_digit)
            && b[4] == b'-'
            && b[5..7].iter().all(u8::is_ascii_digit)
            && b[7] == b'-'
            && b[8..10].iter().all(u8::is_ascii_digit)
    };
    match b.len() {
        10 => date_ok(b),
        19 => {
            date_ok(&b[0..10])
                && b[10] == b' '
                && b[11..13].iter().all(u8::is_ascii_digit)
                && b[13] == b':'
                && b[14..16].iter().all(u8::is_ascii_digit)
                && b[16] == b':'
                && b[17..19].iter().all(u8::is_ascii_digit)
        }
        _ => false,
    }
}

/// Convert `M/D/YYYY` to `YYYY-MM-DD`, zero-padding month and day.
fn slash_date(s: &str) -> String {
    let mut parts = s.split('/');
    let (month, day, year) = match (parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(d), Some(y)) => (m, d, y),
        _ => return String::new(),
    };
    match (
        month.parse::<u32>(),
        day.parse::<u32>(),
        year.trim().parse::<u32>(),
    ) {
        (Ok(m), Ok(d), Ok(y)) => format!("{y:04}-{m:02}-{d:02}"),
        _ => String::new(),
    }
}

/// Number of leading ASCII digits in `s`.
fn leading_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// View a verified-ASCII byte slice as `&str`.
fn ascii(b: &[u8]) -> &str {
    std::str::from_utf8(b).unwrap_or("")
}
