//! Heuristic extraction of sender, subject, event details, attendees and
//! priority from free-form message text.
//!
//! Text mentioning any event keyword takes the event path; everything else
//! takes the general path. Each field is filled from the first pattern of
//! its ordered list that matches. A field with no match is left unset.

pub mod keywords;
pub mod normalize;
pub mod patterns;
pub mod validator;

use regex::Regex;
use serde::Deserialize;
use shared_types::{ExtractionError, ExtractionPath, ExtractionResult, Extractor, InputRecord};

pub use keywords::KeywordSets;
pub use patterns::{FieldPattern, PatternList, PatternOverrides, PatternSpec, PatternTable};
pub use validator::validate_pattern_spec;

use normalize::{
    clean_capture, duration_between, format_time, format_time_range, normalize_date,
    truncate_chars,
};

const EVENT_DESCRIPTION_MAX_CHARS: usize = 200;
const GENERAL_DESCRIPTION_MAX_CHARS: usize = 250;
const MIN_SUBJECT_LINE_CHARS: usize = 5;

/// Substitutions for the built-in keyword sets and pattern lists
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub keywords: KeywordSets,
    pub patterns: PatternOverrides,
}

pub struct EmailInfoExtractor {
    keywords: KeywordSets,
    patterns: PatternTable,
    paragraph_break: Regex,
    header_line: Regex,
    name_separator: Regex,
}

impl EmailInfoExtractor {
    pub fn new() -> Self {
        Self::from_parts(KeywordSets::default(), PatternTable::builtin())
    }

    pub fn with_config(config: ExtractorConfig) -> Result<Self, ExtractionError> {
        let patterns = PatternTable::with_overrides(&config.patterns)?;
        Ok(Self::from_parts(config.keywords.normalized(), patterns))
    }

    fn from_parts(keywords: KeywordSets, patterns: PatternTable) -> Self {
        Self {
            keywords,
            patterns,
            paragraph_break: Regex::new(r"\n\s*\n").expect("paragraph regex must compile"),
            header_line: Regex::new(r"(?im)^(?:From|To|Subject|Date):.*\n?")
                .expect("header regex must compile"),
            name_separator: Regex::new(r"\s*,\s*(?:and\s+)?|\s+and\s+").expect("separator regex must compile"),
        }
    }

    pub fn keywords(&self) -> &KeywordSets {
        &self.keywords
    }

    /// Run the extraction over raw text
    pub fn extract_text(&self, text: &str) -> ExtractionResult {
        let lower = text.to_lowercase();

        if self.keywords.is_event(&lower) {
            tracing::debug!("Event keyword found, using event extraction path");
            self.extract_event(text, &lower)
        } else {
            tracing::debug!("No event keyword found, using general extraction path");
            self.extract_general(text, &lower)
        }
    }

    fn extract_event(&self, text: &str, lower: &str) -> ExtractionResult {
        let mut result = ExtractionResult::empty(ExtractionPath::Event);

        result.sender = self.extract_sender(text).or_else(|| {
            self.patterns
                .email_address
                .find(text)
                .map(|m| m.value.to_string())
        });

        let subject = self
            .capture(&self.patterns.subject, text)
            .or_else(|| self.capture(&self.patterns.event_title, text));
        result.event_title = subject.clone();
        result.subject = subject;

        result.event_date = self
            .capture(&self.patterns.date, text)
            .map(|date| normalize_date(&date));

        if let Some(found) = self.patterns.time.first_match(text) {
            tracing::debug!(pattern = found.pattern, "Matched event time");
            match found.end {
                Some(end) => {
                    let (start, end) = (found.value.trim(), end.trim());
                    result.event_time = Some(format_time_range(start, end));
                    result.event_duration = duration_between(start, end);
                }
                None => {
                    result.event_time = clean_capture(found.value).map(|time| format_time(&time));
                }
            }
        }

        result.location = self.capture(&self.patterns.location, text);
        result.attendees = self.collect_attendees(text);
        result.priority = self.keywords.priority(lower);
        result.is_confirmed = self.keywords.is_confirmed(lower);
        result.description = self.capture(&self.patterns.description, text).or_else(|| {
            self.paragraph_break
                .split(text)
                .nth(1)
                .and_then(|p| clean_capture(truncate_chars(p.trim(), EVENT_DESCRIPTION_MAX_CHARS)))
        });
        result.action_required = true;

        result
    }

    fn extract_general(&self, text: &str, lower: &str) -> ExtractionResult {
        let mut result = ExtractionResult::empty(ExtractionPath::General);

        result.subject = self.capture(&self.patterns.subject, text).or_else(|| {
            text.lines()
                .map(str::trim)
                .find(|line| line.chars().count() > MIN_SUBJECT_LINE_CHARS)
                .and_then(clean_capture)
        });
        result.sender = self.extract_sender(text);

        let body = self.header_line.replace_all(text, "");
        result.description = self
            .paragraph_break
            .split(&body)
            .map(str::trim)
            .find(|p| !p.is_empty())
            .and_then(|p| clean_capture(truncate_chars(p, GENERAL_DESCRIPTION_MAX_CHARS)));

        result.attendees = self.collect_attendees(text);
        result.action_required = self.keywords.requires_action(lower);
        result.priority = self.keywords.priority(lower);

        result
    }

    fn extract_sender(&self, text: &str) -> Option<String> {
        self.capture(&self.patterns.sender, text)
    }

    /// First match of the list, cleaned; an empty cleaned value is a miss.
    fn capture(&self, list: &PatternList, text: &str) -> Option<String> {
        let found = list.first_match(text)?;
        tracing::debug!(pattern = found.pattern, "Pattern matched");
        clean_capture(found.value)
    }

    /// Every email address plus every listed or invited name, deduplicated
    /// in first-seen order.
    fn collect_attendees(&self, text: &str) -> Vec<String> {
        let mut attendees: Vec<String> = Vec::new();
        let mut push = |value: String| {
            if !attendees.contains(&value) {
                attendees.push(value);
            }
        };

        for email in self.patterns.email_address.find_all(text) {
            push(email.to_string());
        }

        for found in self.patterns.attendee_names.each_match(text) {
            for name in self.name_separator.split(found.value) {
                if let Some(name) = clean_capture(name) {
                    push(name);
                }
            }
        }

        attendees
    }
}

impl Default for EmailInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for EmailInfoExtractor {
    fn extract(&self, input: &InputRecord) -> ExtractionResult {
        tracing::debug!(
            modality = ?input.modality,
            chars = input.content.chars().count(),
            "Extracting email info"
        );
        self.extract_text(&input.content)
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{InputModality, NormalizedValue, Priority};

    fn extract(text: &str) -> ExtractionResult {
        EmailInfoExtractor::new().extract(&InputRecord::text(text))
    }

    #[test]
    fn test_urgent_general_message() {
        let result = extract("This is urgent, please respond before the deadline.");

        assert_eq!(result.path, ExtractionPath::General);
        assert_eq!(result.priority, Priority::High);
        assert!(result.action_required);
        assert!(!result.is_confirmed);
    }

    #[test]
    fn test_meeting_for_friday() {
        let result = extract("Let's set up a meeting for Friday at 3pm in Room 204.");

        assert!(result.is_event());
        assert_eq!(result.event_date, Some(NormalizedValue::Raw("Friday".to_string())));
        assert_eq!(
            result.event_time,
            Some(NormalizedValue::Normalized("3:00 PM".to_string()))
        );
        assert!(result.location.as_deref().unwrap().contains("Room 204"));
        assert!(result.action_required);
        assert_eq!(result.event_duration, None);
    }

    #[test]
    fn test_tentative_meeting_is_not_confirmed() {
        let result = extract("The meeting is tentative, not confirmed yet.");

        assert!(result.is_event());
        assert!(!result.is_confirmed);
    }

    #[test]
    fn test_duplicate_attendees_collapse() {
        let result = extract("cc: a@x.com, a@x.com");

        assert_eq!(result.attendees, vec!["a@x.com".to_string()]);
    }

    #[test]
    fn test_serial_comma_names_split() {
        let result = extract("Meeting attendees: Alice Smith, Bob Jones, and Carol White");

        assert_eq!(
            result.attendees,
            vec![
                "Alice Smith".to_string(),
                "Bob Jones".to_string(),
                "Carol White".to_string()
            ]
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractor = EmailInfoExtractor::new();
        let record = InputRecord::text(
            "Subject: Design review meeting\n\nTomorrow at 2pm in Room 12 with Alice Smith.\nPlease confirm ASAP.",
        );

        assert_eq!(extractor.extract(&record), extractor.extract(&record));
    }

    #[test]
    fn test_labeled_block_description_is_capped() {
        let text = format!("Team meeting\nAgenda: {}", "x".repeat(400));
        let result = extract(&text);

        assert!(result.is_event());
        assert_eq!(result.description, Some("x".repeat(300)));
    }

    #[test]
    fn test_labeled_block_description() {
        let result = extract(
            "Team meeting\nAgenda: review the roadmap and assign owners for each milestone",
        );

        assert_eq!(
            result.description.as_deref(),
            Some("review the roadmap and assign owners for each milestone")
        );
    }

    #[test]
    fn test_short_labeled_block_falls_through() {
        let result = extract("Team meeting\nAgenda: roadmap");

        assert!(result.is_event());
        assert_eq!(result.description, None);
    }

    #[test]
    fn test_event_paragraph_description_is_capped() {
        let text = format!("Team meeting\n\n{}", "y".repeat(500));
        let result = extract(&text);

        assert!(result.is_event());
        assert_eq!(result.description, Some("y".repeat(200)));
    }

    #[test]
    fn test_general_description_is_capped() {
        let result = extract(&"z".repeat(600));

        assert_eq!(result.path, ExtractionPath::General);
        assert_eq!(result.description, Some("z".repeat(250)));
    }

    #[test]
    fn test_quick_note_is_general() {
        let result = extract("Quick note: lunch was great today.");

        assert_eq!(result.path, ExtractionPath::General);
        assert_eq!(
            result.subject.as_deref(),
            Some("Quick note: lunch was great today")
        );
        assert!(!result.action_required);
        assert_eq!(result.priority, Priority::Low);
        assert_eq!(result.event_title, None);
        assert_eq!(result.location, None);
    }

    #[test]
    fn test_full_event_email() {
        let text = "From: Jane Doe <jane@corp.com>\n\
                    Subject: Quarterly planning meeting\n\
                    To: bob@corp.com\n\
                    \n\
                    Hi team,\n\
                    \n\
                    Please join the planning session on January 15, 2024 from 2:00 pm to 3:30 pm in Conference Room B.\n\
                    Attendees: Alice Smith, Bob Jones and Carol White\n\
                    This is confirmed.";

        let result = extract(text);

        assert!(result.is_event());
        assert_eq!(result.sender.as_deref(), Some("Jane Doe"));
        assert_eq!(result.subject.as_deref(), Some("Quarterly planning meeting"));
        assert_eq!(result.event_title, result.subject);
        assert_eq!(
            result.event_date,
            Some(NormalizedValue::Normalized("Monday, January 15, 2024".to_string()))
        );
        assert_eq!(
            result.event_time,
            Some(NormalizedValue::Normalized("2:00 PM – 3:30 PM".to_string()))
        );
        assert_eq!(result.event_duration.as_deref(), Some("1h 30m"));
        assert_eq!(result.location.as_deref(), Some("Conference Room B"));
        assert_eq!(
            result.attendees,
            vec![
                "jane@corp.com",
                "bob@corp.com",
                "Alice Smith",
                "Bob Jones",
                "Carol White"
            ]
        );
        assert!(result.is_confirmed);
        assert_eq!(result.priority, Priority::Low);
        assert_eq!(result.description.as_deref(), Some("Hi team"));
    }

    #[test]
    fn test_sender_falls_back_to_first_address_on_event_path() {
        let result = extract("Demo moved, ping carol@corp.com or dan@corp.com");

        assert!(result.is_event());
        assert_eq!(result.sender.as_deref(), Some("carol@corp.com"));
    }

    #[test]
    fn test_general_path_has_no_sender_fallback() {
        let result = extract("Send the numbers to carol@corp.com please");

        assert_eq!(result.path, ExtractionPath::General);
        assert_eq!(result.sender, None);
        assert_eq!(result.attendees, vec!["carol@corp.com".to_string()]);
    }

    #[test]
    fn test_general_email_strips_headers() {
        let text = "From: Ops <ops@corp.com>\n\
                    Subject: Server upgrade\n\
                    Date: Mon\n\
                    \n\
                    Please review the attached notes and reply by Friday.\n\
                    \n\
                    Thanks";

        let result = extract(text);

        assert_eq!(result.path, ExtractionPath::General);
        assert_eq!(result.sender.as_deref(), Some("Ops"));
        assert_eq!(result.subject.as_deref(), Some("Server upgrade"));
        assert_eq!(
            result.description.as_deref(),
            Some("Please review the attached notes and reply by Friday")
        );
        assert!(result.action_required);
        assert_eq!(result.event_date, None);
    }

    #[test]
    fn test_time_range_with_duration() {
        let result = extract("Team call on Friday from 10am to 11:15am");

        assert!(result.is_event());
        assert_eq!(result.event_date, Some(NormalizedValue::Raw("Friday".to_string())));
        assert_eq!(
            result.event_time,
            Some(NormalizedValue::Normalized("10:00 AM – 11:15 AM".to_string()))
        );
        assert_eq!(result.event_duration.as_deref(), Some("1h 15m"));
    }

    #[test]
    fn test_meeting_url_location() {
        let result = extract("Join the call: https://zoom.us/j/123456");

        assert!(result.is_event());
        assert_eq!(result.location.as_deref(), Some("https://zoom.us/j/123456"));
    }

    #[test]
    fn test_empty_input_is_the_floor() {
        let result = extract("");

        assert_eq!(result, ExtractionResult::empty(ExtractionPath::General));
    }

    #[test]
    fn test_modality_does_not_change_extraction() {
        let extractor = EmailInfoExtractor::new();
        let text = "Meeting on 2024-03-01 at 14:30";

        let from_text = extractor.extract(&InputRecord::new(text, InputModality::Text));
        let from_audio = extractor.extract(&InputRecord::new(text, InputModality::Audio));

        assert_eq!(from_text, from_audio);
        assert_eq!(
            from_text.event_time,
            Some(NormalizedValue::Normalized("2:30 PM".to_string()))
        );
    }

    #[test]
    fn test_with_config_substitutes_keywords() {
        let config = ExtractorConfig {
            keywords: KeywordSets {
                event: vec!["Standup".to_string()],
                ..KeywordSets::default()
            },
            ..ExtractorConfig::default()
        };
        let extractor = EmailInfoExtractor::with_config(config).unwrap();

        let standup = extractor.extract_text("Daily standup at 9:30");
        assert!(standup.is_event());
        assert_eq!(
            standup.event_time,
            Some(NormalizedValue::Normalized("9:30 AM".to_string()))
        );

        let meeting = extractor.extract_text("Meeting tomorrow");
        assert_eq!(meeting.path, ExtractionPath::General);
    }

    #[test]
    fn test_with_config_rejects_bad_pattern() {
        let config = ExtractorConfig {
            patterns: PatternOverrides {
                location: Some(vec![PatternSpec {
                    name: "Office".to_string(),
                    regex: r"office (\w+)".to_string(),
                    group: 1,
                    end_group: None,
                }]),
                ..PatternOverrides::default()
            },
            ..ExtractorConfig::default()
        };

        assert!(matches!(
            EmailInfoExtractor::with_config(config),
            Err(ExtractionError::ConfigError(_))
        ));
    }

    #[test]
    fn test_version_tracks_crate() {
        assert_eq!(EmailInfoExtractor::new().version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_config_deserializes_from_json() {
        let config: ExtractorConfig = serde_json::from_str(
            r#"{"patterns": {"location": [{"name": "desk", "regex": "(?i)desk\\s+(\\d+)"}]}}"#,
        )
        .unwrap();
        let extractor = EmailInfoExtractor::with_config(config).unwrap();

        let result = extractor.extract_text("Quick sync meeting at desk 42");
        assert_eq!(result.location.as_deref(), Some("42"));
        assert_eq!(extractor.keywords().event.len(), 20);
    }
}
