//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::NaiveDate;
use regex::Regex;

/// Date format used in every date prompt and in exported records
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Parse a `DD.MM.YYYY` date typed by the user
pub fn parse_user_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// Format a date the way users type it
pub fn format_user_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Escape the characters Telegram's HTML parse mode treats specially
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Parse a callback carrying a positive numeric id (`"12"`)
pub fn parse_numeric_callback(callback: &str) -> Option<i32> {
    if callback.is_empty() || !callback.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    callback.parse::<i32>().ok()
}

/// Callback of the "записаться" button: `appoint__<service id>`
const APPOINT_CALLBACK_PATTERN: &str = r"^appoint__([1-9]\d*)$";

/// Build the booking callback for a service
pub fn appoint_callback(service_id: i32) -> String {
    format!("appoint__{}", service_id)
}

/// Service id carried by a booking callback
pub fn parse_appoint_callback(callback: &str) -> Option<i32> {
    let regex = Regex::new(APPOINT_CALLBACK_PATTERN).ok()?;
    regex
        .captures(callback)
        .and_then(|captures| captures.get(1))
        .and_then(|id| id.as_str().parse::<i32>().ok())
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
