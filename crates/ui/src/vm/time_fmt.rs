use chrono::{DateTime, Utc};

/// Calendar date shown on project cards, e.g. `2024-03-01`.
#[must_use]
pub fn format_date(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}
