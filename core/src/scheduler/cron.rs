//! Cron-like schedule grammar: standard 5-field cron plus the shorthands
//! `@hourly`, `@daily`, `@weekly`, `every Nm`, `every Nh` (§4.3, §9
//! "Cron-like schedule grammar").

use crate::error::{AriaError, Result};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::time::Duration;

/// A parsed job schedule, ready to compute its own next-due time.
#[derive(Debug, Clone)]
pub enum JobSchedule {
    Cron(cron::Schedule),
    Every(Duration),
}

pub fn parse_schedule(raw: &str) -> Result<JobSchedule> {
    let trimmed = raw.trim();
    let expanded = match trimmed {
        "@hourly" => "0 0 * * * * *".to_string(),
        "@daily" => "0 0 0 * * * *".to_string(),
        "@weekly" => "0 0 0 * * SUN *".to_string(),
        _ => {
            if let Some(rest) = trimmed.strip_prefix("every ") {
                return parse_every(rest).map(JobSchedule::Every);
            }
            to_seven_field(trimmed)
        }
    };

    cron::Schedule::from_str(&expanded)
        .map(JobSchedule::Cron)
        .map_err(|e| AriaError::InvalidCron {
            expr: raw.to_string(),
            reason: e.to_string(),
        })
}

/// The `cron` crate requires a leading seconds field (and tolerates a
/// trailing year field); the grammar here is standard 5-field cron, so
/// prepend `0` seconds.
fn to_seven_field(expr: &str) -> String {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    }
}

fn parse_every(rest: &str) -> Result<Duration> {
    let rest = rest.trim();
    let (num_str, unit) = rest.split_at(rest.len().saturating_sub(1));
    let num: u64 = num_str.parse().map_err(|_| AriaError::InvalidCron {
        expr: rest.to_string(),
        reason: "not a number before the unit suffix".to_string(),
    })?;
    match unit {
        "m" => Ok(Duration::from_secs(num * 60)),
        "h" => Ok(Duration::from_secs(num * 3600)),
        _ => Err(AriaError::InvalidCron {
            expr: rest.to_string(),
            reason: "expected a trailing m or h unit".to_string(),
        }),
    }
}

/// The first due time strictly after `after` (§4.3 "next-due time").
pub fn next_after(schedule: &JobSchedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match schedule {
        JobSchedule::Cron(schedule) => schedule.after(&after).next(),
        JobSchedule::Every(duration) => {
            chrono::Duration::from_std(*duration).ok().map(|d| after + d)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_minutes() {
        let schedule = parse_schedule("every 5m").unwrap();
        assert!(matches!(schedule, JobSchedule::Every(d) if d == Duration::from_secs(300)));
    }

    #[test]
    fn parses_hourly_shorthand() {
        let schedule = parse_schedule("@hourly").unwrap();
        let now = Utc::now();
        let next = next_after(&schedule, now).unwrap();
        assert!(next > now);
    }

    #[test]
    fn parses_standard_five_field_cron() {
        let schedule = parse_schedule("0 9 * * MON-FRI").unwrap();
        let now = Utc::now();
        assert!(next_after(&schedule, now).is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_schedule("not a schedule").is_err());
    }
}
