use regex::Regex;
use shared_types::ExtractionError;
use std::time::{Duration, Instant};

use super::patterns::PatternSpec;

/// Validate a user-supplied pattern and return the compiled regex.
pub fn validate_pattern_spec(spec: &PatternSpec) -> Result<Regex, ExtractionError> {
    validate_pattern_name(&spec.name)?;

    let regex = validate_regex_compiles(&spec.name, &spec.regex)?;

    validate_capture_groups(&spec.name, &regex, spec.group, spec.end_group)?;

    validate_regex_performance(&spec.name, &regex)?;

    Ok(regex)
}

fn validate_pattern_name(name: &str) -> Result<(), ExtractionError> {
    if name.is_empty() || name.len() > 100 {
        return Err(config_error(name, "pattern name must be 1-100 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(config_error(
            name,
            "pattern name must contain only lowercase letters, numbers, and underscores",
        ));
    }
    Ok(())
}

fn validate_regex_compiles(name: &str, pattern: &str) -> Result<Regex, ExtractionError> {
    Regex::new(pattern).map_err(|e| config_error(name, &format!("invalid regex pattern: {}", e)))
}

fn validate_capture_groups(
    name: &str,
    regex: &Regex,
    group: usize,
    end_group: Option<usize>,
) -> Result<(), ExtractionError> {
    let group_count = regex.captures_len();

    if group >= group_count {
        return Err(config_error(
            name,
            &format!(
                "group {} does not exist (regex has {} groups)",
                group, group_count
            ),
        ));
    }

    if let Some(eg) = end_group {
        if eg >= group_count {
            return Err(config_error(
                name,
                &format!(
                    "end_group {} does not exist (regex has {} groups)",
                    eg, group_count
                ),
            ));
        }
    }

    Ok(())
}

fn validate_regex_performance(name: &str, regex: &Regex) -> Result<(), ExtractionError> {
    let test_input = "a".repeat(1000);

    let start = Instant::now();
    let _ = regex.is_match(&test_input);
    let duration = start.elapsed();

    if duration > Duration::from_millis(100) {
        return Err(config_error(name, "regex pattern is too slow"));
    }

    Ok(())
}

fn config_error(name: &str, message: &str) -> ExtractionError {
    ExtractionError::ConfigError(format!("pattern '{}': {}", name, message))
}
