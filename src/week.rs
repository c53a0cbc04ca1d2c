//! Week-identifier resolution from snapshot keys and declared metadata.
//!
//! Snapshot producers encode the week three different ways: a declared
//! `week` field inside the document, a `roster_DDMMYYYY.json`-style
//! filename date, or an ISO week/date token somewhere in the key. The
//! resolver normalizes all of them into one grouping string, and
//! separately maps any week string onto the Monday of its calendar week
//! for rendering.

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use regex::Regex;

/// Week patterns compiled once and reused across aggregation passes.
pub struct WeekResolver {
    filename_date: Regex,
    iso_week: Regex,
    iso_date: Regex,
}

impl WeekResolver {
    pub fn new() -> Result<Self> {
        Ok(Self {
            filename_date: Regex::new(r"_(\d{8})\.[A-Za-z0-9]+$")
                .context("filename date pattern")?,
            iso_week: Regex::new(r"(\d{4})-W(\d{2})").context("ISO week pattern")?,
            iso_date: Regex::new(r"(\d{4}-\d{2}-\d{2})").context("ISO date pattern")?,
        })
    }

    /// Resolve the canonical week identifier for one snapshot.
    ///
    /// A non-empty declared week always wins. Otherwise the source key is
    /// matched against the filename-date, ISO-week, and ISO-date patterns
    /// in that order, and finally falls back to the bare filename (or
    /// "Unknown Week" when even that is empty). Total: every input yields
    /// some string.
    pub fn resolve_week(&self, source_key: &str, declared: Option<&str>) -> String {
        if let Some(week) = declared {
            if !week.trim().is_empty() {
                return week.to_string();
            }
        }

        // roster_01092025.json -> day 01, month 09, year 2025
        if let Some(caps) = self.filename_date.captures(source_key) {
            let digits = &caps[1];
            return format!("Week of {}-{}-{}", &digits[4..8], &digits[2..4], &digits[0..2]);
        }

        if let Some(caps) = self.iso_week.captures(source_key) {
            return caps[0].to_string();
        }

        if let Some(caps) = self.iso_date.captures(source_key) {
            return caps[1].to_string();
        }

        let filename = source_key.rsplit('/').next().unwrap_or(source_key);
        let stem = filename
            .rsplit_once('.')
            .map(|(stem, _ext)| stem)
            .unwrap_or(filename);
        if stem.is_empty() {
            "Unknown Week".to_string()
        } else {
            stem.to_string()
        }
    }

    /// Monday of the calendar week a week string refers to.
    ///
    /// An embedded ISO date rolls backward to its week's Monday; an ISO
    /// week token resolves via the first-Monday-of-the-year rule. Strings
    /// carrying neither resolve to the Monday of the current week, so the
    /// calendar always has something to anchor on.
    pub fn monday_of(&self, week: &str) -> NaiveDate {
        if let Some(caps) = self.iso_date.captures(week) {
            if let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
                let back = date.weekday().num_days_from_monday() as i64;
                return date - Duration::days(back);
            }
        }

        if let Some(caps) = self.iso_week.captures(week) {
            if let (Ok(year), Ok(week_num)) = (caps[1].parse::<i32>(), caps[2].parse::<i64>()) {
                if let Some(jan1) = NaiveDate::from_ymd_opt(year, 1, 1) {
                    // 0 = Sunday here: Sunday advances 1 day, everything
                    // else advances to the following Monday.
                    let dow = jan1.weekday().num_days_from_sunday() as i64;
                    let days_to_add = if dow == 0 { 1 } else { 8 - dow };
                    return jan1 + Duration::days(days_to_add + (week_num - 1) * 7);
                }
            }
        }

        let today = Utc::now().date_naive();
        today - Duration::days(today.weekday().num_days_from_monday() as i64)
    }
}
