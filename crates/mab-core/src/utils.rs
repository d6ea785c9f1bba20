use chrono::Utc;

/// RFC3339 timestamp in UTC (for persisted records).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

/// Bot usernames are resolved as `@name`; accept both spellings from callers.
pub fn normalize_username(name: &str) -> String {
    let name = name.trim();
    if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@{name}")
    }
}
