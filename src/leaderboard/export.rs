use chrono::{SecondsFormat, TimeZone, Utc};

use crate::leaderboard::LeaderboardEntry;

pub const CSV_HEADER: &str = "Name,Email,Score,Total,Percent,Timestamp,Date,Duration(s)";
pub const CSV_FILE_NAME: &str = "bitebulbs_leaderboard.csv";

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// ISO-8601 in UTC with milliseconds, e.g. `2024-01-01T00:00:00.000Z`.
pub fn iso_date(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(date) => date.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => String::new(),
    }
}

/// `score / total` as a whole percentage, e.g. `67%` for 2 of 3.
pub fn percent(score: u32, total: u32) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let pct = (score as f64 / total as f64 * 100.0).round();
    format!("{}%", pct as i64)
}

pub fn to_csv(entries: &[LeaderboardEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for entry in entries {
        lines.push(
            [
                quoted(&entry.name),
                quoted(entry.email.as_deref().unwrap_or("")),
                entry.score.to_string(),
                entry.total.to_string(),
                percent(entry.score, entry.total),
                entry.timestamp.to_string(),
                quoted(&iso_date(entry.timestamp)),
                entry.duration_secs.to_string(),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}
