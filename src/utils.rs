use std::cmp::Ordering;

/// Period labels are compared as plain strings. This matches chronological
/// order only for labels that sort lexicographically in time, such as
/// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
pub fn compare_periods(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Archive names end in `_YYYYMMDD_HHMMSS`; returns the stem without that suffix.
pub fn strip_timestamp_suffix(stem: &str) -> &str {
    const SUFFIX_LEN: usize = 16;

    if stem.len() <= SUFFIX_LEN || !stem.is_char_boundary(stem.len() - SUFFIX_LEN) {
        return stem;
    }

    let (base, suffix) = stem.split_at(stem.len() - SUFFIX_LEN);
    let bytes = suffix.as_bytes();
    let well_formed = bytes[0] == b'_'
        && bytes[9] == b'_'
        && bytes[1..9].iter().all(u8::is_ascii_digit)
        && bytes[10..].iter().all(u8::is_ascii_digit);

    if well_formed {
        base
    } else {
        stem
    }
}
