use serde::{Deserialize, Serialize};

const DEFAULT_SCORE: u8 = 5;
const DEFAULT_GOOD: &str = "Good answer";
const DEFAULT_IMPROVE: &str = "Keep practicing";

/// The LLM's judgement of an answer's substance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFeedback {
    /// Always within 1–10.
    pub score: u8,
    pub good: String,
    pub improve: String,
}

impl Default for ContentFeedback {
    fn default() -> Self {
        Self {
            score: DEFAULT_SCORE,
            good: DEFAULT_GOOD.to_string(),
            improve: DEFAULT_IMPROVE.to_string(),
        }
    }
}

/// Reads the `SCORE:` / `GOOD:` / `IMPROVE:` lines out of a free-text reply.
///
/// Never fails: anything missing or unreadable keeps its default, and later
/// duplicate lines overwrite earlier ones.
pub fn parse_content_feedback(text: &str) -> ContentFeedback {
    let mut feedback = ContentFeedback::default();

    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("SCORE:") {
            if let Some(score) = parse_score(rest) {
                feedback.score = score;
            }
        } else if let Some(rest) = line.strip_prefix("GOOD:") {
            if let Some(good) = non_empty(rest) {
                feedback.good = good;
            }
        } else if let Some(rest) = line.strip_prefix("IMPROVE:") {
            if let Some(improve) = non_empty(rest) {
                feedback.improve = improve;
            }
        }
    }

    feedback
}

/// First run of ASCII digits, clamped to 1–10. Values too large for `u64` count as 10.
fn parse_score(rest: &str) -> Option<u8> {
    let start = rest.find(|c: char| c.is_ascii_digit())?;
    let digits = &rest[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    let value = digits[..end].parse::<u64>().unwrap_or(u64::MAX);
    Some(value.clamp(1, 10) as u8)
}

fn non_empty(rest: &str) -> Option<String> {
    let trimmed = rest.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
