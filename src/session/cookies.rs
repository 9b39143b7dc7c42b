//! Cookie parsing, merging, and client-facing rewrites.
//!
//! # Responsibilities
//! - Parse `Cookie` request headers into name/value pairs
//! - Extract the storable `name=value` pair from `Set-Cookie` lines
//! - Merge new pairs into an accumulated cookie string (last write wins)
//! - Rewrite `Set-Cookie` lines so origin-bound cookies survive the
//!   cross-origin hop back to the browser
//!
//! # Design Decisions
//! - Stored state is a plain `name=value; ...` string, attributes dropped;
//!   attributes only matter on the client-facing copy
//! - Merge preserves first-insertion order so repeated merges are stable
//! - A name present earlier but absent from a later response is kept:
//!   state grows or overwrites, never shrinks from omission

/// Split a `Cookie` header (or stored cookie string) into pairs.
///
/// Malformed segments without `=` are skipped.
pub fn parse_pairs(cookie_header: &str) -> Vec<(String, String)> {
    cookie_header
        .split(';')
        .filter_map(|segment| {
            let segment = segment.trim();
            let (name, value) = segment.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// First `name=value` segment of a `Set-Cookie` line, attributes discarded.
pub fn leading_pair(set_cookie_line: &str) -> Option<(String, String)> {
    let first = set_cookie_line.split(';').next()?;
    let (name, value) = first.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Merge new pairs into an existing cookie string.
///
/// Existing names are overwritten in place, new names appended.
pub fn merge_into(existing: &str, new_pairs: &[(String, String)]) -> String {
    let mut merged = parse_pairs(existing);

    for (name, value) in new_pairs {
        match merged.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.clone(),
            None => merged.push((name.clone(), value.clone())),
        }
    }

    merged
        .iter()
        .map(|(n, v)| format!("{}={}", n, v))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Rewrite one `Set-Cookie` line for the proxy's own origin.
///
/// Drops `Domain=...` (scopes the cookie to the proxy host), drops
/// `Secure` (the proxy is typically plain HTTP), and appends
/// `SameSite=None` when no `SameSite` attribute is present so the cookie
/// is sent on cross-origin fetches.
pub fn sanitize_set_cookie(line: &str) -> String {
    let mut has_samesite = false;

    let mut parts: Vec<&str> = Vec::new();
    for segment in line.split(';') {
        let trimmed = segment.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("domain=") || lower == "secure" {
            continue;
        }
        if lower.starts_with("samesite") {
            has_samesite = true;
        }
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    let mut rewritten = parts.join("; ");
    if !has_samesite {
        rewritten.push_str("; SameSite=None");
    }
    rewritten
}
