//! Deterministic cache-key composition.
//!
//! # Responsibilities
//! - Derive a key from method + path + negotiated encoding plus only
//!   the allow-listed header/query/cookie values
//! - Walk every dimension in canonical (alphabetical) order
//!
//! # Design Decisions
//! - Dimensions outside the allow-lists contribute nothing, so requests
//!   differing only there share a key (key-minimization invariant)
//! - An empty allow-list removes that dimension from the key entirely
//! - Absent allow-listed values are skipped rather than encoded as
//!   empty, which still separates present-vs-absent requests
//! - Names and values are escaped before joining, so a delimiter inside
//!   one value can never forge another dimension's boundary
//! - Header names are case-insensitive; query and cookie names match
//!   exactly as configured

use crate::cache::policy::{CachePolicy, Encoding};
use crate::http::request::ForwardRequest;

/// Compose the cache key for a request under a policy.
pub fn compose(request: &ForwardRequest, policy: &CachePolicy, encoding: Encoding) -> String {
    let mut key = format!(
        "{} {} e={}",
        request.method,
        request.path,
        encoding.as_str()
    );

    for name in &policy.header_allow_list {
        for value in request.headers.get_all(name.as_str()) {
            push_dimension(
                &mut key,
                "h",
                name,
                &String::from_utf8_lossy(value.as_bytes()),
            );
        }
    }

    if !policy.query_allow_list.is_empty() {
        let pairs = parse_query(request.query.as_deref().unwrap_or(""));
        for name in &policy.query_allow_list {
            for (k, v) in &pairs {
                if k == name {
                    push_dimension(&mut key, "q", name, v);
                }
            }
        }
    }

    if !policy.cookie_allow_list.is_empty() {
        let cookies = parse_cookies(request);
        for name in &policy.cookie_allow_list {
            for (k, v) in &cookies {
                if k == name {
                    push_dimension(&mut key, "c", name, v);
                }
            }
        }
    }

    key
}

fn push_dimension(key: &mut String, tag: &str, name: &str, value: &str) {
    key.push('|');
    key.push_str(tag);
    key.push(':');
    push_escaped(key, name);
    key.push('=');
    push_escaped(key, value);
}

/// Backslash-escape the characters that delimit key segments.
fn push_escaped(out: &mut String, raw: &str) {
    for c in raw.chars() {
        if matches!(c, '\\' | '|' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn parse_cookies(request: &ForwardRequest) -> Vec<(String, String)> {
    let mut cookies = Vec::new();
    for header in request.headers.get_all(axum::http::header::COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for pair in raw.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next().unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            let value = parts.next().unwrap_or("").trim();
            cookies.push((name.to_string(), value.to_string()));
        }
    }
    cookies
}
