//! Submitted exam results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A score submitted at the end of an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub username: String,
    pub score: i64,
    pub submitted_at: DateTime<Utc>,
}

impl ExamResult {
    /// Create a result stamped with the current time.
    pub fn new(username: impl Into<String>, score: i64) -> Self {
        Self {
            username: username.into(),
            score,
            submitted_at: Utc::now(),
        }
    }

    /// Parse a client-supplied score.
    ///
    /// Leading integer digits are used; anything unparseable scores 0.
    pub fn parse_score(raw: &str) -> i64 {
        let raw = raw.trim();
        let end = raw
            .char_indices()
            .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
            .map(|(i, _)| i)
            .unwrap_or(raw.len());
        raw[..end].parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score() {
        assert_eq!(ExamResult::parse_score("42"), 42);
        assert_eq!(ExamResult::parse_score(" 17 "), 17);
        assert_eq!(ExamResult::parse_score("85points"), 85);
        assert_eq!(ExamResult::parse_score("-3"), -3);
        assert_eq!(ExamResult::parse_score("abc"), 0);
        assert_eq!(ExamResult::parse_score(""), 0);
    }

    #[test]
    fn test_new_result() {
        let result = ExamResult::new("alice", 90);
        assert_eq!(result.username, "alice");
        assert_eq!(result.score, 90);
    }
}
