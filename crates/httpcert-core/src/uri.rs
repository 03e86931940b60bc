// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Minimal URL handling for canister request paths.
//!
//! Canister gateways hand the library either a bare path
//! (`/search?q=ic`) or a host-prefixed form (`example.com/search`).
//! Certified URLs are stored reduced: path only, one trailing slash
//! stripped, percent-decoded. The legacy v1 tree is keyed by the raw
//! (undecoded) path instead, so both forms are exposed here.

fn path_bounds(raw: &str) -> (usize, usize) {
    let start = raw.find('/').unwrap_or(0);
    let end = raw.find('?').unwrap_or(raw.len());
    (start.min(end), end)
}

fn percent_decode(s: &str) -> String {
    match urlencoding::decode(s) {
        Ok(decoded) => decoded.into_owned(),
        // Invalid escapes or non-UTF-8 payloads keep their raw form.
        Err(_) => s.to_string(),
    }
}

/// Reduce a request URL to the form certified URLs are stored under.
pub fn reduce_url(raw: &str) -> String {
    let (start, end) = path_bounds(raw);
    let mut path = &raw[start..end];
    if let Some(stripped) = path.strip_suffix('/') {
        path = stripped;
    }
    percent_decode(path)
}

/// The raw path of a request URL: query stripped, nothing decoded.
pub fn raw_path(raw: &str) -> &str {
    let (start, end) = path_bounds(raw);
    &raw[start..end]
}

/// Ordered `(name, value)` pairs of the query string, percent-decoded.
pub fn parse_query(raw: &str) -> Vec<(String, String)> {
    let Some(mark) = raw.find('?') else {
        return Vec::new();
    };
    raw[mark + 1..]
        .split('&')
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((name, value)) => (percent_decode(name), percent_decode(value)),
            None => (percent_decode(item), String::new()),
        })
        .collect()
}
