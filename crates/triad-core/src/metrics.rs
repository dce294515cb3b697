//! Simple response metrics used by the evaluation report.

use std::collections::HashSet;

/// Number of whitespace-separated tokens
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Fraction of distinct query terms that also appear in the response.
///
/// Terms are lowercased whitespace tokens. Returns 0.0 for an empty query and
/// never exceeds 1.0.
pub fn completeness(response: &str, query: &str) -> f64 {
    let query_terms: HashSet<String> = terms(query);
    if query_terms.is_empty() {
        return 0.0;
    }

    let response_terms = terms(response);
    let overlap = query_terms.intersection(&response_terms).count();
    (overlap as f64 / query_terms.len() as f64).min(1.0)
}

/// Relative change of `value` against `baseline` in percent, one decimal.
///
/// `None` when the baseline is zero.
pub fn percent_change(value: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 {
        return None;
    }
    Some(round_to((value / baseline - 1.0) * 100.0, 1))
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Arithmetic mean, 0.0 for an empty input
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}
