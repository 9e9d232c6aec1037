use chrono::NaiveDate;
use shared_types::NormalizedValue;

/// Month-name layouts tried after ordinals, commas and a leading weekday
/// have been removed.
const NAMED_MONTH_FORMATS: &[&str] = &["%B %d %Y", "%b %d %Y", "%d %B %Y", "%d %b %Y"];

/// Clean a captured substring before it is stored.
///
/// Strips everything outside word characters, whitespace and `: @ . / -`
/// (commas and semicolons included), collapses whitespace and drops one
/// trailing period.
pub fn clean_text(text: &str) -> String {
    let kept: String = text.chars().filter(|c| is_kept(*c)).collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");

    match collapsed.strip_suffix('.') {
        Some(rest) => rest.trim_end().to_string(),
        None => collapsed,
    }
}

fn is_kept(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace() || matches!(c, ':' | '@' | '.' | '/' | '-')
}

/// Clean a capture and treat an empty result as a miss.
pub fn clean_capture(text: &str) -> Option<String> {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// At most `max` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Reformat a matched date as "Weekday, Month D, YYYY", or keep it raw.
pub fn normalize_date(raw: &str) -> NormalizedValue {
    match parse_calendar_date(raw) {
        Some(date) => NormalizedValue::Normalized(date.format("%A, %B %-d, %Y").to_string()),
        None => NormalizedValue::Raw(raw.to_string()),
    }
}

/// Parse an absolute calendar date. Relative terms ("tomorrow", "next
/// Friday") and impossible dates ("Feb 30 2024") yield `None`.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = parse_numeric_date(trimmed) {
        return Some(date);
    }

    let spaced = trimmed.replace(',', " ");
    let mut tokens: Vec<&str> = spaced.split_whitespace().collect();

    // A leading weekday is informational only
    if tokens.len() > 1 && tokens[0].to_ascii_lowercase().ends_with("day") {
        tokens.remove(0);
    }

    let cleaned = tokens
        .iter()
        .map(|t| strip_ordinal(t))
        .collect::<Vec<_>>()
        .join(" ");

    NAMED_MONTH_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&cleaned, format).ok())
}

/// `M/D/Y`, `M-D-Y` (US order, two-digit years allowed) and `Y-M-D`.
fn parse_numeric_date(text: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split(['/', '-']).collect();
    if parts.len() != 3 || !parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }

    let numbers: Vec<u32> = parts
        .iter()
        .map(|p| p.parse().ok())
        .collect::<Option<Vec<_>>>()?;

    if parts[0].len() == 4 {
        return NaiveDate::from_ymd_opt(numbers[0] as i32, numbers[1], numbers[2]);
    }

    let year = match parts[2].len() {
        2 if numbers[2] < 50 => 2000 + numbers[2],
        2 => 1900 + numbers[2],
        4 => numbers[2],
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year as i32, numbers[0], numbers[1])
}

fn strip_ordinal(token: &str) -> &str {
    let lower = token.to_ascii_lowercase();
    for suffix in ["st", "nd", "rd", "th"] {
        if lower.ends_with(suffix) {
            let digits = &token[..token.len() - suffix.len()];
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return digits;
            }
        }
    }
    token
}

/// Format a single time of day.
///
/// "3pm" becomes "3:00 PM", "2:30pm" becomes "2:30 PM", and a bare
/// "14:30" is read on the 24-hour clock as "2:30 PM". Anything else is
/// returned raw.
pub fn format_time(raw: &str) -> NormalizedValue {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let (body, period) = split_period(&compact);

    let formatted = match period {
        Some(period) => {
            let suffix = period.to_ascii_uppercase();
            match parse_clock(body) {
                Some((hour, None)) if (1..=12).contains(&hour) => {
                    Some(format!("{}:00 {}", hour, suffix))
                }
                Some((hour, Some(_))) if (1..=12).contains(&hour) => {
                    Some(format!("{} {}", body, suffix))
                }
                _ => None,
            }
        }
        None => match parse_clock(body) {
            Some((hour, Some(minute))) if hour <= 23 => {
                let suffix = if hour >= 12 { "PM" } else { "AM" };
                let display = match hour {
                    0 => 12,
                    h if h > 12 => h - 12,
                    h => h,
                };
                Some(format!("{}:{:02} {}", display, minute, suffix))
            }
            _ => None,
        },
    };

    match formatted {
        Some(value) => NormalizedValue::Normalized(value),
        None => NormalizedValue::Raw(raw.to_string()),
    }
}

/// Format both ends of a range as "start – end". The range only counts as
/// normalized when both ends are.
pub fn format_time_range(start: &str, end: &str) -> NormalizedValue {
    let start = format_time(start);
    let end = format_time(end);
    let joined = format!("{} – {}", start.as_str(), end.as_str());

    if start.is_normalized() && end.is_normalized() {
        NormalizedValue::Normalized(joined)
    } else {
        NormalizedValue::Raw(joined)
    }
}

/// Minutes after midnight for "2:30pm", "2pm", "14:30" and friends. A time
/// without am/pm is read on the 24-hour clock.
pub fn parse_time_of_day(raw: &str) -> Option<u32> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let (body, period) = split_period(&compact);
    let (hour, minute) = parse_clock(body)?;
    let minute = minute.unwrap_or(0);

    let hour = match period {
        Some("pm") if (1..12).contains(&hour) => hour + 12,
        Some("pm") if hour == 12 => 12,
        Some("am") if hour == 12 => 0,
        Some("am") if (1..12).contains(&hour) => hour,
        Some(_) => return None,
        // Bare hours are too ambiguous to place
        None if minute_given(body) && hour <= 23 => hour,
        None => return None,
    };

    Some(hour * 60 + minute)
}

/// Signed difference between two times of day, "Xh Ym" when at least an
/// hour apart, otherwise "Ym". An end before the start is negative.
pub fn duration_between(start: &str, end: &str) -> Option<String> {
    let start = parse_time_of_day(start)? as i64;
    let end = parse_time_of_day(end)? as i64;
    let minutes = end - start;
    let sign = if minutes < 0 { "-" } else { "" };
    let magnitude = minutes.abs();

    if magnitude >= 60 {
        Some(format!("{}{}h {}m", sign, magnitude / 60, magnitude % 60))
    } else {
        Some(format!("{}{}m", sign, magnitude))
    }
}

fn split_period(compact: &str) -> (&str, Option<&str>) {
    for period in ["am", "pm"] {
        if let Some(body) = compact.strip_suffix(period) {
            return (body, Some(period));
        }
    }
    (compact, None)
}

fn minute_given(body: &str) -> bool {
    body.contains(':')
}

/// "H", "HH", "H:MM" or "HH:MM" into (hour, minute).
fn parse_clock(body: &str) -> Option<(u32, Option<u32>)> {
    let (hour, minute) = match body.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (body, None),
    };

    if hour.is_empty() || hour.len() > 2 || !hour.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = hour.parse().ok()?;

    let minute = match minute {
        Some(m) if m.len() == 2 && m.chars().all(|c| c.is_ascii_digit()) => {
            let m: u32 = m.parse().ok()?;
            if m > 59 {
                return None;
            }
            Some(m)
        }
        Some(_) => return None,
        None => None,
    };

    Some((hour, minute))
}
