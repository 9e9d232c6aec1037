use regex::Regex;
use serde::Deserialize;
use shared_types::ExtractionError;

use super::validator::validate_pattern_spec;

/// One candidate pattern for a field. `group` holds the value; `end_group`
/// holds the second endpoint for range patterns.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub name: String,
    pub regex: Regex,
    pub group: usize,
    pub end_group: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch<'p, 't> {
    pub pattern: &'p str,
    pub value: &'t str,
    pub end: Option<&'t str>,
}

impl FieldPattern {
    pub fn find<'p, 't>(&'p self, text: &'t str) -> Option<PatternMatch<'p, 't>> {
        let captures = self.regex.captures(text)?;
        let value = captures.get(self.group)?.as_str();
        let end = self
            .end_group
            .and_then(|g| captures.get(g))
            .map(|m| m.as_str());

        Some(PatternMatch {
            pattern: &self.name,
            value,
            end,
        })
    }

    /// Every non-overlapping capture of `group` in the text.
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.regex
            .captures_iter(text)
            .filter_map(|c| c.get(self.group).map(|m| m.as_str()))
            .collect()
    }
}

/// Ordered candidate patterns for one field; the earliest pattern that
/// matches wins, regardless of how good a later match would be.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<FieldPattern>,
}

impl PatternList {
    pub fn new(patterns: Vec<FieldPattern>) -> Self {
        Self { patterns }
    }

    pub fn first_match<'p, 't>(&'p self, text: &'t str) -> Option<PatternMatch<'p, 't>> {
        self.patterns.iter().find_map(|p| p.find(text))
    }

    /// The first match of each pattern, in list order.
    pub fn each_match<'p, 't>(&'p self, text: &'t str) -> Vec<PatternMatch<'p, 't>> {
        self.patterns.iter().filter_map(|p| p.find(text)).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Serialized form of a pattern, as written in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatternSpec {
    pub name: String,
    pub regex: String,
    #[serde(default = "default_group")]
    pub group: usize,
    #[serde(default)]
    pub end_group: Option<usize>,
}

fn default_group() -> usize {
    1
}

impl PatternSpec {
    pub fn compile(&self) -> Result<FieldPattern, ExtractionError> {
        let regex = validate_pattern_spec(self)?;

        Ok(FieldPattern {
            name: self.name.clone(),
            regex,
            group: self.group,
            end_group: self.end_group,
        })
    }
}

/// Replacement pattern lists, one optional list per field. A present list
/// replaces the built-in list for that field entirely.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatternOverrides {
    pub sender: Option<Vec<PatternSpec>>,
    pub subject: Option<Vec<PatternSpec>>,
    pub event_title: Option<Vec<PatternSpec>>,
    pub date: Option<Vec<PatternSpec>>,
    pub time: Option<Vec<PatternSpec>>,
    pub location: Option<Vec<PatternSpec>>,
    pub attendee_names: Option<Vec<PatternSpec>>,
    pub description: Option<Vec<PatternSpec>>,
}

/// All pattern lists used by the email info extractor
#[derive(Debug, Clone)]
pub struct PatternTable {
    pub sender: PatternList,
    pub email_address: FieldPattern,
    pub subject: PatternList,
    pub event_title: PatternList,
    pub date: PatternList,
    pub time: PatternList,
    pub location: PatternList,
    pub attendee_names: PatternList,
    pub description: PatternList,
}

impl PatternTable {
    pub fn builtin() -> Self {
        Self {
            sender: builtin_list(SENDER_PATTERNS),
            email_address: builtin_pattern(&EMAIL_ADDRESS_PATTERN),
            subject: builtin_list(SUBJECT_PATTERNS),
            event_title: builtin_list(EVENT_TITLE_PATTERNS),
            date: builtin_list(DATE_PATTERNS),
            time: builtin_list(TIME_PATTERNS),
            location: builtin_list(LOCATION_PATTERNS),
            attendee_names: builtin_list(ATTENDEE_NAME_PATTERNS),
            description: builtin_list(DESCRIPTION_PATTERNS),
        }
    }

    pub fn with_overrides(overrides: &PatternOverrides) -> Result<Self, ExtractionError> {
        let mut table = Self::builtin();

        replace_list(&mut table.sender, &overrides.sender)?;
        replace_list(&mut table.subject, &overrides.subject)?;
        replace_list(&mut table.event_title, &overrides.event_title)?;
        replace_list(&mut table.date, &overrides.date)?;
        replace_list(&mut table.time, &overrides.time)?;
        replace_list(&mut table.location, &overrides.location)?;
        replace_list(&mut table.attendee_names, &overrides.attendee_names)?;
        replace_list(&mut table.description, &overrides.description)?;

        Ok(table)
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn replace_list(
    list: &mut PatternList,
    specs: &Option<Vec<PatternSpec>>,
) -> Result<(), ExtractionError> {
    if let Some(specs) = specs {
        let patterns = specs
            .iter()
            .map(PatternSpec::compile)
            .collect::<Result<Vec<_>, _>>()?;
        *list = PatternList::new(patterns);
    }
    Ok(())
}

struct BuiltinPattern {
    name: &'static str,
    regex: &'static str,
    group: usize,
    end_group: Option<usize>,
}

const fn pattern(name: &'static str, regex: &'static str) -> BuiltinPattern {
    BuiltinPattern {
        name,
        regex,
        group: 1,
        end_group: None,
    }
}

fn builtin_pattern(p: &BuiltinPattern) -> FieldPattern {
    FieldPattern {
        name: p.name.to_string(),
        regex: Regex::new(p.regex).expect("built-in pattern must compile"),
        group: p.group,
        end_group: p.end_group,
    }
}

fn builtin_list(patterns: &[BuiltinPattern]) -> PatternList {
    PatternList::new(patterns.iter().map(builtin_pattern).collect())
}

const EMAIL_ADDRESS_PATTERN: BuiltinPattern = pattern(
    "email_address",
    r"([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})",
);

const SENDER_PATTERNS: &[BuiltinPattern] = &[pattern(
    "from_header",
    r"(?i)From:[ \t]*([^\n<]+|<[^>\n]+>)",
)];

const SUBJECT_PATTERNS: &[BuiltinPattern] =
    &[pattern("subject_header", r"(?i)Subject:[ \t]*([^\n]+)")];

const EVENT_TITLE_PATTERNS: &[BuiltinPattern] = &[pattern(
    "keyword_title",
    r"(?i)(?:meeting|call|conference|session|workshop|seminar|presentation|interview|demo|event)(?:\s+(?:about|on|for|regarding))?\s*[:\s-]*\s*([^.\n]+)",
)];

const DATE_PATTERNS: &[BuiltinPattern] = &[
    pattern(
        "weekday_month_day_year",
        r"(?i)\b(?:on|at|for|date)\s*[:\s-]*\s*(\w+day,?\s+\w+\s+\d{1,2}(?:st|nd|rd|th)?,?\s*\d{4})",
    ),
    pattern(
        "numeric_date",
        r"(?i)\b(?:on|at|for|date)\s*[:\s-]*\s*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
    ),
    pattern(
        "month_day_year",
        r"(?i)\b(?:on|at|for|date)\s*[:\s-]*\s*(\w+\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4})",
    ),
    pattern(
        "relative_day",
        r"(?i)\b(?:on|at|for|date)\s*[:\s-]*\s*(tomorrow|today|next\s+\w+day|this\s+\w+day|(?:mon|tues|wednes|thurs|fri|satur|sun)day)\b",
    ),
    pattern(
        "month_abbrev_day_year",
        r"(?i)\b((?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4})",
    ),
    pattern(
        "day_month_abbrev_year",
        r"(?i)\b(\d{1,2}\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{4})",
    ),
    pattern("iso_date", r"\b(\d{4}-\d{2}-\d{2})\b"),
];

const TIME_PATTERNS: &[BuiltinPattern] = &[
    BuiltinPattern {
        name: "time_range",
        regex: r"(?i)\b(?:from|between)\s+(\d{1,2}:\d{2}(?:\s*[ap]m\b)?|\d{1,2}\s*[ap]m\b)\s*(?:to|until|till|and|-|–)\s*(\d{1,2}:\d{2}(?:\s*[ap]m\b)?|\d{1,2}\s*[ap]m\b)",
        group: 1,
        end_group: Some(2),
    },
    pattern(
        "labeled_clock_time",
        r"(?i)\b(?:at|time)\s*[:\s-]*\s*(\d{1,2}:\d{2}(?:\s*[ap]m\b)?)",
    ),
    pattern("meridiem_time", r"(?i)\b(\d{1,2}(?::\d{2})?\s*[ap]m)\b"),
    pattern("clock_time", r"\b(\d{1,2}:\d{2})\b"),
    pattern(
        "at_hour",
        r"(?i)(?:\bat|@)\s+(\d{1,2}(?::\d{2})?(?:\s*o'clock)?)\b",
    ),
];

const LOCATION_PATTERNS: &[BuiltinPattern] = &[
    pattern(
        "labeled_place",
        r"(?i)\b(?:at|in|location|venue|room|place|address)\b\s*[:\s-]*\s*([^.\n,;]+(?:,?\s*[^.\n,;]+)*)",
    ),
    pattern(
        "join_us_at",
        r"(?i)\b(?:join|meet)\s+(?:us|me)\s+(?:at|in)\s+([^.\n,;]+)",
    ),
    pattern(
        "named_room",
        r"(?i)\b((?:conference\s+room|meeting\s+room|room)\s+[A-Za-z0-9]+)",
    ),
    pattern(
        "meeting_url",
        r"(?i)(https?://[^\s]+|meet\.google\.com/[a-z0-9-]+|zoom\.us/j/\d+)",
    ),
];

const ATTENDEE_NAME_PATTERNS: &[BuiltinPattern] = &[
    pattern(
        "listed_names",
        r"\b(?i:with|attendees?|participants?|invitees?|to|cc|bcc)\b\s*[:\s-]*\s*((?:[A-Z][a-z]+\s+[A-Z][a-z]+(?:\s*,\s*(?:and\s+)?|\s+and\s+)?)+)",
    ),
    pattern(
        "invited_name",
        r"(?i:please join|inviting)\s+([A-Z][a-z]+\s+[A-Z][a-z]+)",
    ),
];

const DESCRIPTION_PATTERNS: &[BuiltinPattern] = &[pattern(
    "labeled_block",
    r"(?is)\b(?:agenda|details|description|about)\s*[:\s-]*\s*(.{50,300})",
)];
