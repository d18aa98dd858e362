//! Relative dates: `2 days ago`, `three weeks from now`, `in 5 hours`,
//! `2 days after 2024-03-01`, `next month`.

use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDate, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use runbar_types::ExecutableCommand;
use tracing::debug;

use crate::format::synthetic_result;
use crate::number_words::{parse_digits, parse_exact, tokenize};

/// Source of "now" for relative date arithmetic.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    fn parse(text: &str) -> Option<Self> {
        let singular = text.strip_suffix('s').unwrap_or(text);
        let unit = match singular {
            "second" | "sec" => Self::Second,
            "minute" | "min" => Self::Minute,
            "hour" | "hr" => Self::Hour,
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            _ => return None,
        };
        Some(unit)
    }

    /// Length in milliseconds; months are 30 days and years 365.
    fn millis(self) -> f64 {
        const SECOND: f64 = 1000.0;
        const DAY: f64 = 86_400.0 * SECOND;
        match self {
            Self::Second => SECOND,
            Self::Minute => 60.0 * SECOND,
            Self::Hour => 3600.0 * SECOND,
            Self::Day => DAY,
            Self::Week => 7.0 * DAY,
            Self::Month => 30.0 * DAY,
            Self::Year => 365.0 * DAY,
        }
    }

    fn label_format(self) -> &'static str {
        match self {
            Self::Second | Self::Minute | Self::Hour => "%Y-%m-%d %H:%M",
            _ => "%Y-%m-%d",
        }
    }
}

const UNIT_PATTERN: &str = r"(?:second|sec|minute|min|hour|hr|day|week|month|year)s?";

static OFFSET_FROM_NOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<amount>.+?)\s+(?P<unit>{UNIT_PATTERN})\s+(?P<direction>ago|from now|later|hence)$"
    ))
    .expect("valid relative time pattern")
});
static IN_OFFSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^in\s+(?P<amount>.+?)\s+(?P<unit>{UNIT_PATTERN})$")).expect("valid relative time pattern")
});
static ANCHORED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<amount>.+?)\s+(?P<unit>{UNIT_PATTERN})\s+(?P<direction>after|before|from)\s+(?P<anchor>.+)$"
    ))
    .expect("valid relative time pattern")
});
static NEXT_OR_LAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?P<direction>next|last|previous)\s+(?P<unit>{UNIT_PATTERN})$"))
        .expect("valid relative time pattern")
});

/// Resolve `query` against the system clock.
pub fn parse_relative_time(query: &str) -> Vec<ExecutableCommand> {
    parse_relative_time_at(query, Utc::now())
}

/// Resolve `query` relative to `now`.
///
/// The command value is the UTC instant in RFC 3339 with millisecond
/// precision; the label is the local date, plus the time for sub-day units.
pub fn parse_relative_time_at(query: &str, now: DateTime<Utc>) -> Vec<ExecutableCommand> {
    resolve(query, now)
        .map(|(instant, unit)| {
            let label = instant.with_timezone(&Local).format(unit.label_format()).to_string();
            synthetic_result(label, instant.to_rfc3339_opts(SecondsFormat::Millis, true))
        })
        .into_iter()
        .collect()
}

fn resolve(query: &str, now: DateTime<Utc>) -> Option<(DateTime<Utc>, TimeUnit)> {
    let text = query.trim().to_lowercase();

    if let Some(captures) = NEXT_OR_LAST.captures(&text) {
        let unit = TimeUnit::parse(&captures["unit"])?;
        let sign = if &captures["direction"] == "next" { 1.0 } else { -1.0 };
        return Some((shift(now, sign, unit)?, unit));
    }
    if let Some(captures) = IN_OFFSET.captures(&text) {
        let unit = TimeUnit::parse(&captures["unit"])?;
        let amount = parse_amount(&captures["amount"])?;
        return Some((shift(now, amount, unit)?, unit));
    }
    if let Some(captures) = OFFSET_FROM_NOW.captures(&text) {
        let unit = TimeUnit::parse(&captures["unit"])?;
        let amount = parse_amount(&captures["amount"])?;
        let sign = if &captures["direction"] == "ago" { -1.0 } else { 1.0 };
        return Some((shift(now, sign * amount, unit)?, unit));
    }
    let captures = ANCHORED.captures(&text)?;
    let unit = TimeUnit::parse(&captures["unit"])?;
    let amount = parse_amount(&captures["amount"])?;
    let sign = if &captures["direction"] == "before" { -1.0 } else { 1.0 };
    let anchor = resolve_anchor(&captures["anchor"], now);
    Some((shift(anchor, sign * amount, unit)?, unit))
}

fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim();
    let amount = match text {
        "a" | "an" | "one" => 1.0,
        _ => parse_digits(text).or_else(|| parse_exact(&tokenize(text)))?,
    };
    (amount >= 0.0).then_some(amount)
}

/// `now`, `today`, `tomorrow`, `yesterday` or an ISO date. Anything else is
/// treated as now.
fn resolve_anchor(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    match text.trim() {
        "now" | "today" => now,
        "tomorrow" => now + Duration::days(1),
        "yesterday" => now - Duration::days(1),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or_else(|| {
                debug!(anchor = other, "unrecognised anchor, counting from now");
                now
            }),
    }
}

fn shift(from: DateTime<Utc>, amount: f64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    let millis = (amount * unit.millis()).round();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    from.checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use runbar_types::CommandHandler;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 0).unwrap()
    }

    fn instant_of(query: &str) -> Option<DateTime<Utc>> {
        let results = parse_relative_time_at(query, now());
        let command = results.into_iter().next()?;
        Some(DateTime::parse_from_rfc3339(&command.value).ok()?.with_timezone(&Utc))
    }

    #[test]
    fn counts_back_from_now() {
        let instant = instant_of("2 days ago").unwrap();
        assert_eq!((now() - instant).num_milliseconds(), 172_800_000);
        assert_eq!(instant_of("three hours ago").unwrap(), now() - Duration::hours(3));
        assert_eq!(instant_of("a week ago").unwrap(), now() - Duration::weeks(1));
    }

    #[test]
    fn counts_forward_from_now() {
        assert_eq!(instant_of("2 days from now").unwrap(), now() + Duration::days(2));
        assert_eq!(instant_of("in 90 minutes").unwrap(), now() + Duration::minutes(90));
        assert_eq!(instant_of("next month").unwrap(), now() + Duration::days(30));
        assert_eq!(instant_of("last year").unwrap(), now() - Duration::days(365));
    }

    #[test]
    fn resolves_anchors() {
        let anchor = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(instant_of("2 days after 2024-03-01").unwrap(), anchor + Duration::days(2));
        assert_eq!(instant_of("1 week before 2024-03-01").unwrap(), anchor - Duration::weeks(1));
        assert_eq!(instant_of("1 day after tomorrow").unwrap(), now() + Duration::days(2));
        assert_eq!(instant_of("2 days after easter").unwrap(), now() + Duration::days(2));
    }

    #[test]
    fn value_is_millisecond_utc_and_label_is_local() {
        let command = parse_relative_time_at("2 days ago", now()).remove(0);
        assert_eq!(command.value, "2025-06-13T12:30:00.000Z");
        assert_eq!(command.handler, CommandHandler::FormulaResult);
        assert!(command.smart_match);
        let expected = (now() - Duration::days(2)).with_timezone(&Local).format("%Y-%m-%d").to_string();
        assert_eq!(command.label, expected);

        let hourly = parse_relative_time_at("2 hours ago", now()).remove(0);
        let expected = (now() - Duration::hours(2))
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        assert_eq!(hourly.label, expected);
    }

    #[test]
    fn ignores_non_temporal_text() {
        assert!(parse_relative_time_at("invalid time", now()).is_empty());
        assert!(parse_relative_time_at("2 days", now()).is_empty());
        assert!(parse_relative_time_at("many days ago", now()).is_empty());
    }

    #[test]
    fn fixed_clock_reports_its_instant() {
        assert_eq!(FixedClock(now()).now(), now());
    }
}
