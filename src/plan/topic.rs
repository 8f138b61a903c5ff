//! Topic naming for pub/sub routing.
//!
//! The system-wide policy is the sanitized literal form of a query's
//! canonical rendering: wire-unsafe characters become hyphens and hyphen
//! runs collapse to one. The sanitized name is the routing key; any
//! instability here breaks message delivery between nodes.

/// Namespace prefix applied to every routing key before it is handed to
/// the bus transport.
pub const TOPIC_NAMESPACE: &str = "/topic/";

/// Replace every character outside `[A-Za-z0-9()-]` with a hyphen and
/// collapse runs of hyphens to a single one.
///
/// `"AND(A, B)"` sanitizes to `"AND(A-B)"`.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '(' | ')') {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out
}

/// The full bus destination for a routing key.
pub fn destination(topic: &str) -> String {
    format!("{}{}", TOPIC_NAMESPACE, topic)
}
