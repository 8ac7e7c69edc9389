//! Natural-language date and time resolution.
//!
//! Pattern classes are tried in a fixed order; the first class that
//! yields a parseable candidate wins, and within a class candidates are
//! tried in text order. Candidates that fail every known format are
//! skipped silently — a malformed date is never an error, just a miss.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

/// Numeric formats, US order first (`02/05/2026` reads month-first).
const NUMERIC_FORMATS: [&str; 6] = [
    "%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y", "%d-%m-%Y", "%m/%d/%y", "%m-%d-%y",
];

/// Month-name formats; chrono accepts full and abbreviated names for
/// both `%B` and `%b`.
const MONTH_NAME_FORMATS: [&str; 4] = ["%B %d, %Y", "%B %d %Y", "%d %B %Y", "%d %b %Y"];

/// Resolves date and time expressions against a fixed "today".
#[derive(Debug, Clone)]
pub struct DateResolver {
    today: NaiveDate,
    numeric: Regex,
    month_first: Regex,
    day_first: Regex,
    weekday: Regex,
    tomorrow: Regex,
    week: Regex,
    month: Regex,
    time_with_minutes: Regex,
    time_hour_only: Regex,
}

impl DateResolver {
    /// Resolver anchored at the local calendar date.
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    /// Resolver anchored at an explicit date (tests, replays).
    pub fn with_today(today: NaiveDate) -> Self {
        const MONTHS: &str = "jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";
        Self {
            today,
            numeric: Regex::new(r"\b(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})\b").unwrap(),
            month_first: Regex::new(&format!(
                r"\b((?:{MONTHS})[a-z]*)\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:,?\s+(\d{{4}}))?"
            ))
            .unwrap(),
            day_first: Regex::new(&format!(
                r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+((?:{MONTHS})[a-z]*)(?:,?\s+(\d{{4}}))?"
            ))
            .unwrap(),
            weekday: Regex::new(
                r"\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            )
            .unwrap(),
            tomorrow: Regex::new(r"\btomorrow\b").unwrap(),
            week: Regex::new(r"\b(?:end\s+of\s+|this\s+)?week(?:end)?\b").unwrap(),
            month: Regex::new(r"\b(?:end\s+of\s+|this\s+)?month\b").unwrap(),
            time_with_minutes: Regex::new(r"\b(\d{1,2}):(\d{2})\s*(am|pm)?\b").unwrap(),
            time_hour_only: Regex::new(r"\b(\d{1,2})\s*(am|pm)\b").unwrap(),
        }
    }

    /// The reference date this resolver is anchored at.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Resolve the first date expression in `text` to a calendar date.
    pub fn resolve(&self, text: &str) -> Option<NaiveDate> {
        let text = text.to_lowercase();

        // Class 1: explicit numeric dates.
        for m in self.numeric.find_iter(&text) {
            if let Some(date) = parse_with(m.as_str(), &NUMERIC_FORMATS) {
                return Some(date);
            }
        }

        // Class 2: month-name dates. Candidates without a year cannot
        // parse and are skipped, like any other malformed candidate.
        for caps in self.month_first.captures_iter(&text) {
            let year = match caps.get(3) {
                Some(y) => y.as_str(),
                None => continue,
            };
            let candidate = format!("{} {} {}", &caps[1], &caps[2], year);
            if let Some(date) = parse_with(&candidate, &MONTH_NAME_FORMATS) {
                return Some(date);
            }
        }
        for caps in self.day_first.captures_iter(&text) {
            let year = match caps.get(3) {
                Some(y) => y.as_str(),
                None => continue,
            };
            let candidate = format!("{} {} {}", &caps[1], &caps[2], year);
            if let Some(date) = parse_with(&candidate, &MONTH_NAME_FORMATS) {
                return Some(date);
            }
        }

        // Class 3: relative weekdays — strictly in the future.
        if let Some(caps) = self.weekday.captures(&text) {
            if let Some(target) = weekday_from_name(&caps[1]) {
                return Some(self.next_weekday(target));
            }
        }

        // Class 4: relative terms.
        if self.tomorrow.is_match(&text) {
            return Some(self.today + Duration::days(1));
        }
        if self.week.is_match(&text) {
            return Some(self.today + Duration::days(7));
        }
        if self.month.is_match(&text) {
            return Some(self.end_of_month());
        }

        None
    }

    /// Resolve the first time-of-day expression in `text`, normalized
    /// to 24-hour time.
    pub fn resolve_time(&self, text: &str) -> Option<NaiveTime> {
        let text = text.to_lowercase();

        for caps in self.time_with_minutes.captures_iter(&text) {
            let hour: u32 = match caps[1].parse() {
                Ok(h) => h,
                Err(_) => continue,
            };
            let minute: u32 = match caps[2].parse() {
                Ok(m) => m,
                Err(_) => continue,
            };
            let hour = apply_meridiem(hour, caps.get(3).map(|m| m.as_str()));
            if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
                return Some(time);
            }
        }

        for caps in self.time_hour_only.captures_iter(&text) {
            let hour: u32 = match caps[1].parse() {
                Ok(h) => h,
                Err(_) => continue,
            };
            let hour = apply_meridiem(hour, Some(&caps[2]));
            if let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) {
                return Some(time);
            }
        }

        None
    }

    /// Next occurrence of `target`, never today: a Friday resolved on a
    /// Friday lands seven days out.
    fn next_weekday(&self, target: Weekday) -> NaiveDate {
        let ahead = (i64::from(target.num_days_from_monday())
            - i64::from(self.today.weekday().num_days_from_monday()))
        .rem_euclid(7);
        let ahead = if ahead == 0 { 7 } else { ahead };
        self.today + Duration::days(ahead)
    }

    /// Last calendar day of the current month, December rolling into
    /// January of the next year.
    fn end_of_month(&self) -> NaiveDate {
        let (year, month) = (self.today.year(), self.today.month());
        let first_of_next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        first_of_next
            .map(|d| d - Duration::days(1))
            .unwrap_or(self.today)
    }
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_with(candidate: &str, formats: &[&str]) -> Option<NaiveDate> {
    // `%Y` happily parses "26" as year 26; reject that so two-digit
    // years fall through to the `%y` forms.
    formats.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(candidate, fmt)
            .ok()
            .filter(|d| d.year() >= 1000)
    })
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// 12-hour → 24-hour: `12am → 0`, `12pm → 12`, `3pm → 15`.
fn apply_meridiem(hour: u32, meridiem: Option<&str>) -> u32 {
    match meridiem {
        Some("pm") if hour < 12 => hour + 12,
        Some("am") if hour == 12 => 0,
        _ => hour,
    }
}
