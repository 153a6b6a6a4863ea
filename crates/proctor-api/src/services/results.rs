//! In-memory exam results.

use std::sync::{PoisonError, RwLock};

use tracing::info;

use proctor_models::ExamResult;

/// Submitted results in submission order, kept for the process lifetime.
#[derive(Default)]
pub struct ResultStore {
    results: RwLock<Vec<ExamResult>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&self, result: ExamResult) {
        info!(username = %result.username, score = result.score, "Exam result submitted");
        self.results
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result);
    }

    pub fn all(&self) -> Vec<ExamResult> {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// First result recorded for a user.
    pub fn first_for(&self, username: &str) -> Option<ExamResult> {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|r| r.username == username)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_order_and_first_match() {
        let store = ResultStore::new();
        store.submit(ExamResult::new("alice", 80));
        store.submit(ExamResult::new("bob", 65));
        store.submit(ExamResult::new("alice", 95));

        let names: Vec<_> = store.all().into_iter().map(|r| r.username).collect();
        assert_eq!(names, vec!["alice", "bob", "alice"]);

        assert_eq!(store.first_for("alice").map(|r| r.score), Some(80));
        assert!(store.first_for("zoe").is_none());
    }
}
