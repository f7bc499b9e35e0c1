//! String similarity scores on a 0-100 scale.
//!
//! Inputs to the public scorers are preprocessed with [`full_process`]
//! (ASCII only, lowercase, punctuation folded to spaces). The combined
//! [`weighted_ratio`] picks between whole-string, substring and token-based
//! comparisons depending on how different the two lengths are.

use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.90;
const LONG_PARTIAL_SCALE: f64 = 0.60;

/// Drops non-ASCII characters, maps anything that is not alphanumeric or `_`
/// to a space, lowercases and trims.
pub fn full_process(s: &str) -> String {
    let folded: String = s
        .chars()
        .filter(|c| c.is_ascii())
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    folded.trim().to_string()
}

/// Rounds half to even, then clamps into the score range.
fn intr(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 100.0) as u8
}

fn lcs_len(a: &[u8], b: &[u8]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Indel-normalized similarity in `0.0..=1.0`.
fn raw_ratio(a: &[u8], b: &[u8]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    2.0 * lcs_len(a, b) as f64 / total as f64
}

pub fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    intr(100.0 * raw_ratio(a.as_bytes(), b.as_bytes()))
}

/// Best [`ratio`] of the shorter string against every equal-length window of the longer.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (shorter, longer) = if a.len() <= b.len() {
        (a.as_bytes(), b.as_bytes())
    } else {
        (b.as_bytes(), a.as_bytes())
    };

    let mut best = 0.0_f64;
    for window in longer.windows(shorter.len()) {
        let score = raw_ratio(shorter, window);
        if score > 0.995 {
            return 100;
        }
        best = best.max(score);
    }

    intr(100.0 * best)
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_sort(a: &str, b: &str, partial: bool) -> u8 {
    let sorted_a = sorted_tokens(a);
    let sorted_b = sorted_tokens(b);
    if partial {
        partial_ratio(&sorted_a, &sorted_b)
    } else {
        ratio(&sorted_a, &sorted_b)
    }
}

fn token_set(a: &str, b: &str, partial: bool) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    let sorted_sect = intersection.join(" ");
    let combined_a = format!("{} {}", sorted_sect, only_a.join(" ")).trim().to_string();
    let combined_b = format!("{} {}", sorted_sect, only_b.join(" ")).trim().to_string();

    let score = |x: &str, y: &str| {
        if partial {
            partial_ratio(x, y)
        } else {
            ratio(x, y)
        }
    };

    score(&sorted_sect, &combined_a)
        .max(score(&sorted_sect, &combined_b))
        .max(score(&combined_a, &combined_b))
}

pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    token_sort(&full_process(a), &full_process(b), false)
}

pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    token_set(&full_process(a), &full_process(b), false)
}

pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let p1 = full_process(a);
    let p2 = full_process(b);
    if p1.is_empty() || p2.is_empty() {
        return 0;
    }

    let base = ratio(&p1, &p2) as f64;
    let (len1, len2) = (p1.len() as f64, p2.len() as f64);
    let len_ratio = len1.max(len2) / len1.min(len2);

    if len_ratio < 1.5 {
        let tsor = token_sort(&p1, &p2, false) as f64 * UNBASE_SCALE;
        let tser = token_set(&p1, &p2, false) as f64 * UNBASE_SCALE;
        return intr(base.max(tsor).max(tser));
    }

    let partial_scale = if len_ratio > 8.0 {
        LONG_PARTIAL_SCALE
    } else {
        PARTIAL_SCALE
    };

    let partial = partial_ratio(&p1, &p2) as f64 * partial_scale;
    let ptsor = token_sort(&p1, &p2, true) as f64 * UNBASE_SCALE * partial_scale;
    let ptser = token_set(&p1, &p2, true) as f64 * UNBASE_SCALE * partial_scale;

    intr(base.max(partial).max(ptsor).max(ptser))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_process() {
        assert_eq!(full_process("  Selling, General & Administrative "), "selling  general   administrative");
        assert_eq!(full_process("Stock-Based Compensation"), "stock based compensation");
        assert_eq!(full_process("Café"), "caf");
        assert_eq!(full_process("&&"), "");
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio("abcde", "abcde"), 100);
        assert_eq!(ratio("abcde", "abcdx"), 80);
        assert_eq!(ratio("abc", "xyz"), 0);
        assert_eq!(ratio("", "abc"), 0);
    }

    #[test]
    fn test_partial_ratio_finds_substring() {
        assert_eq!(partial_ratio("abc", "xxabcxx"), 100);
        assert_eq!(partial_ratio("xxabcxx", "abc"), 100);
        assert!(partial_ratio("abd", "xxabcxx") < 100);
    }

    #[test]
    fn test_token_ratios_ignore_order_and_subsets() {
        assert_eq!(token_sort_ratio("Sales Cost", "cost sales"), 100);
        assert_eq!(token_set_ratio("Other Assets", "Other Current Assets"), 100);
    }

    #[test]
    fn test_weighted_ratio_equal_lengths() {
        assert_eq!(weighted_ratio("Cost-of-Sales", "cost of sales"), 100);
        assert_eq!(weighted_ratio("Sales Cost", "Cost Sales"), 95);
        assert_eq!(weighted_ratio("abcde", "abcdx"), 80);
        assert_eq!(weighted_ratio("abcdefghijklmnopqrs", "abcdefghijklmnowxyz"), 79);
    }

    #[test]
    fn test_weighted_ratio_partial_is_scaled() {
        // Substring match through the partial path caps at 90.
        assert_eq!(weighted_ratio("Cash", "Cash and Cash Equivalents"), 90);
        assert_eq!(weighted_ratio("", "Revenue"), 0);
        assert_eq!(weighted_ratio("???", "Revenue"), 0);
    }

    #[test]
    fn test_intr_rounds_half_to_even() {
        assert_eq!(intr(78.5), 78);
        assert_eq!(intr(79.5), 80);
        assert_eq!(intr(79.49), 79);
    }
}
