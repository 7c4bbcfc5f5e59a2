//! Pure parsers for webhook activity logs and tunnel-daemon logs.
//!
//! Nothing here fails on malformed input: unparseable lines are dropped and
//! missing fields stay `None`.

use crate::models::{EntryStatus, LogEntry, VpnStatus, WebhookStatus};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Number of entries reported as `recent_calls`.
pub const RECENT_CALLS: usize = 2;

/// A webhook is online if its latest entry is younger than this.
pub fn freshness_window() -> Duration {
    Duration::minutes(10)
}

const CONNECTED_MARKER: &str = "Initialization Sequence Completed";
const HEALTHY_MARKER: &str = "healthy!";

static WEBHOOK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*\[(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})?)\]",
    )
    .expect("webhook timestamp pattern")
});

static PUBLIC_IP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Public IP address is ([0-9A-Fa-f:.]+) \(([^)]+)\)").expect("public ip pattern")
});

static PROVIDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)VPN_SERVICE_PROVIDER[=:]\s*(\S+)").expect("provider pattern")
});

static PEER_SERVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\] Peer Connection Initiated").expect("peer server pattern")
});

const ERROR_KEYWORDS: [&str; 2] = ["error", "failed"];
const SUCCESS_KEYWORDS: [&str; 4] = ["success", "completed", "triggered", "received"];

/// Error keywords win over success keywords in the same message.
pub fn classify(message: &str) -> EntryStatus {
    let lowered = message.to_lowercase();
    if ERROR_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        EntryStatus::Error
    } else if SUCCESS_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        EntryStatus::Success
    } else {
        EntryStatus::Pending
    }
}

/// RFC 3339 with offset, or a naive timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// `[<timestamp>] <message>`; anything else is not an event.
pub fn parse_webhook_line(line: &str) -> Option<LogEntry> {
    let captures = WEBHOOK_LINE.captures(line)?;
    let whole = captures.get(0)?;
    let timestamp = parse_timestamp(captures.get(1)?.as_str())?;
    let message = line[whole.end()..].trim().to_string();
    let status = classify(&message);
    Some(LogEntry {
        timestamp,
        message,
        status,
    })
}

/// The last `limit` events of the log, most recent first.
pub fn parse_webhook_log(content: &str, limit: usize) -> Vec<LogEntry> {
    let entries: Vec<LogEntry> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_webhook_line)
        .collect();
    let start = entries.len().saturating_sub(limit);
    entries[start..].iter().rev().cloned().collect()
}

pub fn webhook_status(content: &str, now: DateTime<Utc>) -> WebhookStatus {
    let recent_calls = parse_webhook_log(content, RECENT_CALLS);
    let last_activity = recent_calls.first().map(|entry| entry.timestamp);
    let is_online = last_activity.map_or(false, |at| now - at < freshness_window());
    WebhookStatus {
        is_online,
        last_activity,
        recent_calls,
    }
}

/// Best-effort scrape of tunnel daemon logs. When a pattern matches more
/// than once the first occurrence in the window wins.
pub fn parse_vpn_status(logs: &str) -> VpnStatus {
    let mut status = VpnStatus {
        connected: logs.contains(CONNECTED_MARKER),
        healthy: logs.contains(HEALTHY_MARKER),
        ..VpnStatus::default()
    };

    if let Some(captures) = PUBLIC_IP.captures(logs) {
        status.public_ip = Some(captures[1].to_string());
        let raw_location = captures[2].trim();
        let parts: Vec<&str> = raw_location.split(',').map(str::trim).collect();
        if parts.len() >= 3 {
            // country, region, city
            status.country = Some(parts[0].to_string());
            status.city = Some(parts[2].to_string());
            status.location = Some(format!("{}, {}", parts[2], parts[0]));
        } else {
            status.location = Some(raw_location.to_string());
        }
    }

    if let Some(captures) = PROVIDER.captures(logs) {
        let provider = captures[1].replace(|c: char| c == '"' || c == '\'', "");
        if !provider.is_empty() {
            status.provider = Some(provider);
        }
    }

    if let Some(captures) = PEER_SERVER.captures(logs) {
        status.server = Some(captures[1].to_string());
    }

    status
}
