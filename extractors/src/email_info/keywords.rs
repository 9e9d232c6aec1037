use serde::Deserialize;
use shared_types::Priority;

pub const EVENT_KEYWORDS: &[&str] = &[
    "meeting",
    "appointment",
    "conference",
    "call",
    "session",
    "workshop",
    "seminar",
    "presentation",
    "interview",
    "demo",
    "schedule",
    "calendar",
    "event",
    "gather",
    "reunion",
    "invitation",
    "rsvp",
    "reservation",
    "booking",
    "huddle",
];

pub const HIGH_PRIORITY_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "immediate",
    "critical",
    "emergency",
    "important!",
];

pub const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &[
    "important",
    "deadline",
    "soon",
    "required",
    "follow up",
    "action required",
];

pub const ACTION_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "immediate",
    "required",
    "deadline",
    "respond",
    "reply",
    "confirm",
    "action needed",
    "please review",
    "feedback requested",
    "your input",
    "need your",
    "awaiting your",
];

pub const CONFIRMATION_KEYWORDS: &[&str] =
    &["confirmed", "accepted", "approved", "scheduled", "booked"];

pub const NEGATION_KEYWORDS: &[&str] = &["not confirmed", "pending", "tentative", "maybe"];

/// Keyword sets driving classification, priority, action and confirmation.
///
/// Matching is a case-insensitive substring test with no word boundaries,
/// so "call" also fires inside "recall".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeywordSets {
    pub event: Vec<String>,
    pub high_priority: Vec<String>,
    pub medium_priority: Vec<String>,
    pub action: Vec<String>,
    pub confirmation: Vec<String>,
    pub negation: Vec<String>,
}

impl Default for KeywordSets {
    fn default() -> Self {
        Self {
            event: to_owned(EVENT_KEYWORDS),
            high_priority: to_owned(HIGH_PRIORITY_KEYWORDS),
            medium_priority: to_owned(MEDIUM_PRIORITY_KEYWORDS),
            action: to_owned(ACTION_KEYWORDS),
            confirmation: to_owned(CONFIRMATION_KEYWORDS),
            negation: to_owned(NEGATION_KEYWORDS),
        }
    }
}

impl KeywordSets {
    /// Lowercase every keyword and drop blanks so lookups can run against
    /// pre-lowercased text.
    pub fn normalized(self) -> Self {
        Self {
            event: lowercase_all(self.event),
            high_priority: lowercase_all(self.high_priority),
            medium_priority: lowercase_all(self.medium_priority),
            action: lowercase_all(self.action),
            confirmation: lowercase_all(self.confirmation),
            negation: lowercase_all(self.negation),
        }
    }

    pub fn is_event(&self, lower_text: &str) -> bool {
        contains_any(lower_text, &self.event)
    }

    /// High keywords win over medium ones; neither yields `Low`.
    pub fn priority(&self, lower_text: &str) -> Priority {
        if contains_any(lower_text, &self.high_priority) {
            Priority::High
        } else if contains_any(lower_text, &self.medium_priority) {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn requires_action(&self, lower_text: &str) -> bool {
        contains_any(lower_text, &self.action)
    }

    /// A confirmation keyword counts only when no negation keyword is present.
    pub fn is_confirmed(&self, lower_text: &str) -> bool {
        contains_any(lower_text, &self.confirmation) && !contains_any(lower_text, &self.negation)
    }
}

pub fn contains_any(lower_text: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|keyword| lower_text.contains(keyword.as_str()))
}

fn to_owned(keywords: &[&str]) -> Vec<String> {
    keywords.iter().map(|k| k.to_string()).collect()
}

fn lowercase_all(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_event_keyword_count() {
        assert!(KeywordSets::default().event.len() >= 20);
    }

    #[test]
    fn test_event_detection_is_substring_based() {
        let keywords = KeywordSets::default();

        assert!(keywords.is_event("let's set up a meeting"));
        assert!(keywords.is_event("please recall the figures"));
        assert!(keywords.is_event("rsvp by friday"));
        assert!(!keywords.is_event("quick note: lunch was great today."));
    }

    #[test]
    fn test_priority_precedence() {
        let keywords = KeywordSets::default();

        assert_eq!(
            keywords.priority("this is urgent, please respond before the deadline."),
            Priority::High
        );
        assert_eq!(keywords.priority("the deadline is friday"), Priority::Medium);
        assert_eq!(keywords.priority("see you around"), Priority::Low);
    }

    #[test]
    fn test_confirmation_veto() {
        let keywords = KeywordSets::default();

        assert!(keywords.is_confirmed("the room is booked"));
        assert!(!keywords.is_confirmed("the meeting is tentative, not confirmed yet."));
        assert!(!keywords.is_confirmed("accepted, pending approval"));
        assert!(!keywords.is_confirmed("nothing to see here"));
    }

    #[test]
    fn test_normalized_lowercases_and_drops_blanks() {
        let keywords = KeywordSets {
            event: vec!["  Standup ".to_string(), "".to_string()],
            ..KeywordSets::default()
        }
        .normalized();

        assert_eq!(keywords.event, vec!["standup".to_string()]);
        assert!(keywords.is_event("daily standup at 9"));
    }

    #[test]
    fn test_substituted_keyword_sets() {
        let keywords = KeywordSets {
            high_priority: vec!["p0".to_string()],
            medium_priority: vec![],
            ..KeywordSets::default()
        };

        assert_eq!(keywords.priority("p0 outage"), Priority::High);
        assert_eq!(keywords.priority("urgent"), Priority::Low);
    }
}
