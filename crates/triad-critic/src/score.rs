use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use triad_agent::Score;

/// Score assumed when the critic's reply contains no recognisable rating
pub const DEFAULT_SCORE: u8 = 7;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("Critic score {0} is outside the 1-10 range; check the critic prompt template")]
    OutOfRange(u32),
}

/// Where a critique's score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Read from the critic's reply
    Parsed,
    /// The reply had no score; [`DEFAULT_SCORE`] was used
    Default,
}

/// Extract the critic's rating from its reply.
///
/// Recognised forms, in priority order:
/// ```text
/// <score>8</score>
/// Score: 8/10        (an "N/10" or "N out of 10" on a line mentioning "score")
/// 8/10               (first "N/10" or "N out of 10" anywhere)
/// Score: 8           (first integer after the word "score")
/// ```
pub fn extract_score(output: &str) -> Option<u32> {
    if let Some(score) = parse_score_block(output) {
        debug!(score, "Found score block");
        return Some(score);
    }

    let scored_lines = output
        .lines()
        .filter(|line| line.to_lowercase().contains("score"));
    for line in scored_lines {
        if let Some(score) = find_out_of_ten(line) {
            return Some(score);
        }
    }

    if let Some(score) = find_out_of_ten(output) {
        return Some(score);
    }

    find_after_keyword(output)
}

/// Extract and validate the score, falling back to [`DEFAULT_SCORE`] when absent.
pub fn parse_score(output: &str) -> Result<(Score, ScoreSource), ScoreError> {
    match extract_score(output) {
        Some(raw) => u8::try_from(raw)
            .ok()
            .and_then(Score::new)
            .map(|score| (score, ScoreSource::Parsed))
            .ok_or(ScoreError::OutOfRange(raw)),
        None => {
            warn!(
                default = DEFAULT_SCORE,
                "No score found in critic output, using default"
            );
            let score = Score::new(DEFAULT_SCORE)
                .ok_or(ScoreError::OutOfRange(u32::from(DEFAULT_SCORE)))?;
            Ok((score, ScoreSource::Default))
        }
    }
}

fn parse_score_block(output: &str) -> Option<u32> {
    let start = output.find("<score>")?;
    let end = output[start..].find("</score>")? + start;
    parse_digits(output[start + "<score>".len()..end].trim())
}

/// First `N/10` or `N out of 10`, where N is the digit run right before the marker
fn find_out_of_ten(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    let mut best: Option<(usize, u32)> = None;

    for marker in ["/10", "/ 10", " out of 10"] {
        let mut offset = 0;
        while let Some(pos) = lower[offset..].find(marker) {
            let at = offset + pos;
            offset = at + marker.len();

            // "/100" is not a score out of ten
            if lower[offset..].starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }

            if let Some(value) = digits_before(&lower[..at]) {
                if best.map_or(true, |(p, _)| at < p) {
                    best = Some((at, value));
                }
                break;
            }
        }
    }

    best.map(|(_, value)| value)
}

fn digits_before(text: &str) -> Option<u32> {
    let trimmed = text.trim_end();
    let digits: String = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if digits.is_empty() {
        return None;
    }
    // decimals like "7.5/10" are not plain scores
    let before = &trimmed[..trimmed.len() - digits.len()];
    if before.ends_with('.') && before[..before.len() - 1].ends_with(|c: char| c.is_ascii_digit())
    {
        return None;
    }
    parse_digits(&digits)
}

/// A plain digit run as a score; values past `u32::MAX` saturate so they
/// still read as out of range
fn parse_digits(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().unwrap_or(u32::MAX))
}

/// First integer following the word "score" on the same line, skipping
/// parenthesised hints like "(1-10)" and filler words ("score of 8")
fn find_after_keyword(text: &str) -> Option<u32> {
    const FILLER: [&str; 4] = ["of", "is", "a", "="];

    for line in text.lines() {
        let lower = line.to_lowercase();
        let Some(pos) = lower.find("score") else {
            continue;
        };

        let mut rest = String::new();
        let mut depth = 0usize;
        for c in lower[pos + "score".len()..].chars() {
            match c {
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                _ if depth == 0 => rest.push(c),
                _ => {}
            }
        }

        let tokens = rest
            .split(|c: char| c.is_whitespace() || c == ':' || c == ',')
            .filter(|t| !t.is_empty());
        for token in tokens {
            let token = token.trim_end_matches(['.', '!']);
            if let Some(value) = parse_digits(token) {
                return Some(value);
            }
            if !FILLER.contains(&token) {
                break;
            }
        }
    }

    None
}
