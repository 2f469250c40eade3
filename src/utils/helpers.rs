//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::OnceLock;
use chrono::{Datelike, Local, NaiveDate, Weekday};
use regex::Regex;

/// Local calendar day at call time; the boundary for past/upcoming listings.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

fn time_of_day_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("time-of-day pattern is valid")
    })
}

/// Check a 24h `HH:MM` time-of-day string
pub fn is_valid_time_of_day(value: &str) -> bool {
    time_of_day_pattern().is_match(value)
}

/// Render a date in the ja-JP long form, e.g. `2025年8月10日日曜日`
pub fn format_japanese_date(day: NaiveDate) -> String {
    let weekday = match day.weekday() {
        Weekday::Mon => "月曜日",
        Weekday::Tue => "火曜日",
        Weekday::Wed => "水曜日",
        Weekday::Thu => "木曜日",
        Weekday::Fri => "金曜日",
        Weekday::Sat => "土曜日",
        Weekday::Sun => "日曜日",
    };
    format!("{}年{}月{}日{}", day.year(), day.month(), day.day(), weekday)
}

/// Render a date in English, e.g. `Sunday, August 10, 2025`
pub fn format_english_date(day: NaiveDate) -> String {
    day.format("%A, %B %-d, %Y").to_string()
}

/// Render a slot time range
pub fn format_time_range(start_at: &str, end_at: &str) -> String {
    format!("{} - {}", start_at, end_at)
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Trim an optional free-text field, mapping blank input to `None`
pub fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
