//! Instance identity reported to the gateway.

/// Resolve the instance name: the override when given, else the local
/// host name.
///
/// The detected name is what the OS reports, usually the short name; no DNS
/// lookup is made. Hosts that must report a fully qualified name pass it
/// with `--instance`.
pub fn resolve(override_name: Option<&str>) -> String {
    match override_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => local_hostname(),
    }
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
