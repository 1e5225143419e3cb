//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound for client-requested page sizes
pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page number a listing accepts; larger numbers are read as this page
pub const MAX_PAGE: i64 = 1_000_000;

/// Generate a new request identifier
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format a timestamp for exports and logs
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format an optional timestamp, empty when absent
pub fn format_optional_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map(format_timestamp).unwrap_or_default()
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

/// Resolve 1-based page and page size into (limit, offset)
pub fn page_window(page: Option<i64>, page_size: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let limit = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (limit, (page - 1) * limit)
}

/// Sanitize filename for a Content-Disposition header
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
