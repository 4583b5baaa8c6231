//! Timestamp repair for Prometheus text exposition payloads.
//!
//! A Pushgateway re-exposes the last pushed value of a sample until it is
//! replaced. When a sample carries no timestamp and its exporter goes away,
//! the gateway keeps reporting the old value as current and the series turns
//! into a flat line. Stamping every untimestamped sample with the collection
//! time lets the staleness show downstream. Samples that already carry a
//! timestamp are left alone.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Stamp untimestamped samples of `payload` with the current time.
pub fn add_timestamps(payload: &[u8]) -> Vec<u8> {
    repair(payload, current_timestamp_millis())
}

/// Stamp untimestamped samples of `payload` with `now_millis`.
///
/// Works line by line on `\n`. Empty lines and lines starting with `#` are
/// copied as is. For the rest, the text from the last `}` (or the whole line
/// when there are no labels) is split on whitespace: up to two tokens means
/// `<name> <value>` or `} <value>`, which gets ` <now_millis>` appended. More
/// than two tokens means a timestamp is already there.
pub fn repair(payload: &[u8], now_millis: i64) -> Vec<u8> {
    let stamp = format!(" {now_millis}");
    let mut out = Vec::with_capacity(payload.len() + payload.len() / 8);

    for (i, line) in payload.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        out.extend_from_slice(line);
        if needs_timestamp(line) {
            out.extend_from_slice(stamp.as_bytes());
        }
    }

    out
}

fn needs_timestamp(line: &[u8]) -> bool {
    if line.is_empty() || line[0] == b'#' {
        return false;
    }

    let start = line.iter().rposition(|&b| b == b'}').unwrap_or(0);
    let fields = line[start..]
        .split(|b| b.is_ascii_whitespace())
        .filter(|field| !field.is_empty())
        .count();

    fields <= 2
}
