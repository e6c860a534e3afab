//! Delimiter detection for exported CSV files

use csv::ReaderBuilder;

/// Candidate delimiters, in order of preference when scores tie
pub const CANDIDATES: [u8; 4] = [b';', b',', b'\t', b'|'];

/// Guess the delimiter from a text sample.
///
/// The sample is parsed as CSV once per candidate, so quoted fields may
/// span lines. A candidate qualifies when the header splits into at least
/// two fields and a strict majority of records have the header's width;
/// a few malformed rows do not disqualify it. The candidate with the most
/// matching records wins, then the widest header. Returns `None` when
/// nothing qualifies, e.g. for empty or single-column files.
pub fn sniff_delimiter(sample: &str, truncated: bool) -> Option<u8> {
    let mut best: Option<(u8, usize, usize)> = None;
    for &candidate in CANDIDATES.iter() {
        let Some((consistent, width)) = score(sample, candidate, truncated) else {
            continue;
        };
        match best {
            Some((_, c, w)) if (c, w) >= (consistent, width) => {}
            _ => best = Some((candidate, consistent, width)),
        }
    }

    best.map(|(d, _, _)| d)
}

/// Matching record count and header width, `None` when `delimiter` does
/// not qualify
fn score(sample: &str, delimiter: u8, truncated: bool) -> Option<(usize, usize)> {
    let widths = record_widths(sample, delimiter, truncated);
    let width = *widths.first()?;
    if width < 2 {
        return None;
    }
    let consistent = widths.iter().filter(|w| **w == width).count();
    (consistent * 2 > widths.len()).then_some((consistent, width))
}

/// Field count of every non-blank record in the sample
fn record_widths(sample: &str, delimiter: u8, truncated: bool) -> Vec<usize> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(sample.as_bytes());

    let mut widths = Vec::new();
    for result in reader.byte_records() {
        let Ok(record) = result else {
            break;
        };
        if record.iter().all(|f| f.iter().all(u8::is_ascii_whitespace)) {
            continue;
        }
        widths.push(record.len());
    }

    // The last record of a cut sample is usually partial
    if truncated && widths.len() > 1 && !sample.ends_with('\n') {
        widths.pop();
    }
    widths
}
