//! Violation kinds, prohibited-item categories and ledger states.

use serde::{Deserialize, Serialize};

/// Category of a prohibited item spotted in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    MobilePhone,
    Book,
    Laptop,
    Mouse,
    Keyboard,
    Remote,
    Cup,
    /// Small bright or dark blob next to an ear (earbuds, headphones).
    Earphone,
}

/// Detector label fragments mapped to their category.
///
/// A key matches a whole word of the label, case-insensitively, so
/// `"cell phone"` maps to [`ItemCategory::MobilePhone`] while `"headphones"`
/// matches nothing.
const LABEL_TABLE: &[(&str, ItemCategory)] = &[
    ("phone", ItemCategory::MobilePhone),
    ("book", ItemCategory::Book),
    ("laptop", ItemCategory::Laptop),
    ("mouse", ItemCategory::Mouse),
    ("keyboard", ItemCategory::Keyboard),
    ("remote", ItemCategory::Remote),
    ("cup", ItemCategory::Cup),
];

impl ItemCategory {
    /// Wire representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::MobilePhone => "MOBILE_PHONE",
            ItemCategory::Book => "BOOK",
            ItemCategory::Laptop => "LAPTOP",
            ItemCategory::Mouse => "MOUSE",
            ItemCategory::Keyboard => "KEYBOARD",
            ItemCategory::Remote => "REMOTE",
            ItemCategory::Cup => "CUP",
            ItemCategory::Earphone => "EARPHONE",
        }
    }

    /// Look up the category for an object-detector label.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        let mut words = label.split(|c: char| !c.is_alphanumeric());
        words.find_map(|word| {
            LABEL_TABLE
                .iter()
                .find(|(key, _)| *key == word)
                .map(|(_, category)| *category)
        })
    }
}

impl std::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A countable violation.
///
/// Every kind feeds the same per-user counter; the kind only shapes the
/// response token and the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum ViolationKind {
    ProhibitedItem(ItemCategory),
    Gaze,
    Noise,
    FullscreenExit,
    TabChange,
    WindowChange,
}

impl ViolationKind {
    /// Stable label used for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::ProhibitedItem(_) => "prohibited_item",
            ViolationKind::Gaze => "gaze",
            ViolationKind::Noise => "noise",
            ViolationKind::FullscreenExit => "fullscreen_exit",
            ViolationKind::TabChange => "tab_change",
            ViolationKind::WindowChange => "window_change",
        }
    }

    /// Token segment used between `VIOLATION:` and the count.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            ViolationKind::ProhibitedItem(_) => "PROHIBITED_ITEM",
            ViolationKind::Gaze => "GAZE_VIOLATION",
            ViolationKind::Noise => "NOISE_VIOLATION",
            ViolationKind::FullscreenExit => "FULLSCREEN",
            ViolationKind::TabChange => "TAB_CHANGE",
            ViolationKind::WindowChange => "WINDOW_CHANGE",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user ledger state derived from the violation count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerState {
    /// No violations recorded.
    Clean,
    /// Some violations, threshold not reached.
    Flagging,
    /// Threshold reached. Sticky.
    Terminated,
}

impl LedgerState {
    /// Classify a count against a threshold.
    pub fn from_count(count: u64, threshold: u64) -> Self {
        if count >= threshold {
            LedgerState::Terminated
        } else if count == 0 {
            LedgerState::Clean
        } else {
            LedgerState::Flagging
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LedgerState::Terminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup_matches_whole_words() {
        assert_eq!(ItemCategory::from_label("cell phone"), Some(ItemCategory::MobilePhone));
        assert_eq!(ItemCategory::from_label("Book"), Some(ItemCategory::Book));
        assert_eq!(ItemCategory::from_label("KEYBOARD"), Some(ItemCategory::Keyboard));
        assert_eq!(ItemCategory::from_label("person"), None);
        assert_eq!(ItemCategory::from_label("dining table"), None);
        assert_eq!(ItemCategory::from_label("headphones"), None);
        assert_eq!(ItemCategory::from_label("coffee_cup"), Some(ItemCategory::Cup));
    }

    #[test]
    fn test_ledger_state_from_count() {
        assert_eq!(LedgerState::from_count(0, 10), LedgerState::Clean);
        assert_eq!(LedgerState::from_count(1, 10), LedgerState::Flagging);
        assert_eq!(LedgerState::from_count(9, 10), LedgerState::Flagging);
        assert_eq!(LedgerState::from_count(10, 10), LedgerState::Terminated);
        assert!(LedgerState::from_count(42, 10).is_terminal());
    }

    #[test]
    fn test_violation_kind_serde() {
        let json = serde_json::to_string(&ViolationKind::ProhibitedItem(ItemCategory::Cup)).unwrap();
        assert_eq!(json, r#"{"kind":"prohibited_item","category":"CUP"}"#);
        let json = serde_json::to_string(&ViolationKind::TabChange).unwrap();
        assert_eq!(json, r#"{"kind":"tab_change"}"#);
    }
}
