//! Column-level parsers shared by the CSV loaders.
//!
//! Accepts what people actually type into a spreadsheet:
//!   estimate   10 | 10h | 1.5 hrs | 90m | 45 min
//!   status     not started | In-Progress | done
//!   type       essay | LOR | financial aid

use anyhow::{Result, anyhow, bail};
use apptrack_core::{DeadlineType, TaskStatus, TaskType};
use regex::Regex;

fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Effort in hours. A bare number is hours; `m`/`min` suffixes are minutes.
pub fn parse_hours(s: &str) -> Result<f64> {
    let re = Regex::new(concat!(
        r"(?i)^\s*(?P<num>\d+(?:\.\d+)?)\s*",
        r"(?P<unit>h|hr|hrs|hours?|m|min|mins|minutes?)?\s*$"
    ))?;
    let caps = re
        .captures(s)
        .ok_or_else(|| anyhow!("invalid effort '{}' (expected e.g. 10, 10h, 1.5h, 90m)", s))?;
    let num: f64 = caps["num"].parse()?;
    let minutes = caps
        .name("unit")
        .is_some_and(|u| u.as_str().to_lowercase().starts_with('m'));
    Ok(if minutes { num / 60.0 } else { num })
}

/// Same as `parse_hours` but an empty cell means "not recorded".
pub fn parse_optional_hours(s: &str) -> Result<Option<f64>> {
    if s.trim().is_empty() {
        return Ok(None);
    }
    parse_hours(s).map(Some)
}

/// Empty defaults to `NotStarted`.
pub fn parse_task_status(s: &str) -> Result<TaskStatus> {
    Ok(match normalize(s).as_str() {
        "" | "not_started" | "todo" | "open" => TaskStatus::NotStarted,
        "in_progress" | "started" | "doing" => TaskStatus::InProgress,
        "blocked" => TaskStatus::Blocked,
        "complete" | "completed" | "done" => TaskStatus::Complete,
        "skipped" | "skip" | "n/a" => TaskStatus::Skipped,
        other => bail!("unknown task status '{}'", other),
    })
}

pub fn parse_task_type(s: &str) -> Result<TaskType> {
    Ok(match normalize(s).as_str() {
        "essay" | "supplement" => TaskType::Essay,
        "test" | "test_score" | "scores" => TaskType::Test,
        "transcript" => TaskType::Transcript,
        "recommendation" | "rec" | "lor" => TaskType::Recommendation,
        "portfolio" => TaskType::Portfolio,
        "form" => TaskType::Form,
        "interview" => TaskType::Interview,
        "" | "other" => TaskType::Other,
        other => bail!("unknown task type '{}'", other),
    })
}

pub fn parse_deadline_type(s: &str) -> Result<DeadlineType> {
    Ok(match normalize(s).as_str() {
        "" | "official" => DeadlineType::Official,
        "internal" => DeadlineType::Internal,
        "buffer" => DeadlineType::Buffer,
        "personal" => DeadlineType::Personal,
        "ed" | "early_decision" => DeadlineType::EarlyDecision,
        "ea" | "early_action" => DeadlineType::EarlyAction,
        "rd" | "regular" | "regular_decision" => DeadlineType::Regular,
        "priority" => DeadlineType::Priority,
        "financial_aid" | "fafsa" | "css" => DeadlineType::FinancialAid,
        other => bail!("unknown deadline type '{}'", other),
    })
}

/// Spreadsheet booleans. Empty cells take `default`.
pub fn parse_flag(s: &str, default: bool) -> Result<bool> {
    Ok(match normalize(s).as_str() {
        "" => default,
        "true" | "yes" | "y" | "1" | "x" => true,
        "false" | "no" | "n" | "0" => false,
        other => bail!("invalid flag '{}'", other),
    })
}

/// `;`-separated id list, blanks dropped.
pub fn parse_id_list(s: &str) -> Vec<String> {
    s.split(';')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// 1-4, empty defaults to 2.
pub fn parse_priority(s: &str) -> Result<u8> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(2);
    }
    s.parse()
        .map_err(|_| anyhow!("invalid priority '{}'", s))
}

/// 0-100 with an optional trailing `%`. Range is checked by core validation.
pub fn parse_percent(s: &str) -> Result<u8> {
    let s = s.trim().trim_end_matches('%').trim();
    if s.is_empty() {
        return Ok(0);
    }
    s.parse()
        .map_err(|_| anyhow!("invalid progress '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hours_formats() {
        assert_eq!(parse_hours("10").unwrap(), 10.0);
        assert_eq!(parse_hours("10h").unwrap(), 10.0);
        assert_eq!(parse_hours("1.5h").unwrap(), 1.5);
        assert_eq!(parse_hours(" 2 hrs ").unwrap(), 2.0);
        assert_eq!(parse_hours("90m").unwrap(), 1.5);
        assert_eq!(parse_hours("45 min").unwrap(), 0.75);
        assert_eq!(parse_hours("3H").unwrap(), 3.0);
    }

    #[test]
    fn test_parse_hours_rejects_garbage() {
        assert!(parse_hours("").is_err());
        assert!(parse_hours("-2").is_err());
        assert!(parse_hours("ten").is_err());
        assert!(parse_hours("2d").is_err());
        assert_eq!(parse_optional_hours("  ").unwrap(), None);
    }

    #[test]
    fn test_status_and_type_aliases() {
        assert_eq!(parse_task_status("In Progress").unwrap(), TaskStatus::InProgress);
        assert_eq!(parse_task_status("done").unwrap(), TaskStatus::Complete);
        assert_eq!(parse_task_status("").unwrap(), TaskStatus::NotStarted);
        assert!(parse_task_status("maybe").is_err());

        assert_eq!(parse_task_type("LOR").unwrap(), TaskType::Recommendation);
        assert_eq!(parse_deadline_type("ED").unwrap(), DeadlineType::EarlyDecision);
        assert_eq!(parse_deadline_type("financial-aid").unwrap(), DeadlineType::FinancialAid);
    }

    #[test]
    fn test_flags_lists_and_numbers() {
        assert!(parse_flag("", true).unwrap());
        assert!(!parse_flag("no", true).unwrap());
        assert!(parse_flag("maybe", false).is_err());

        assert_eq!(parse_id_list("t1; t2;;"), vec!["t1", "t2"]);
        assert!(parse_id_list("").is_empty());

        assert_eq!(parse_priority("").unwrap(), 2);
        assert_eq!(parse_priority("1").unwrap(), 1);
        assert_eq!(parse_percent("40%").unwrap(), 40);
        assert!(parse_percent("lots").is_err());
    }
}
