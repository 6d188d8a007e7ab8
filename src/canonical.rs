//! Canonicalization of requests into the Shared Key signature string.
//!
//! The Shared Key scheme authenticates a request by signing one exact byte
//! string derived from it:
//!
//! ```text
//! VERB\n
//! Content-Encoding\n
//! Content-Language\n
//! Content-Length\n
//! Content-MD5\n
//! Content-Type\n
//! Date\n
//! If-Modified-Since\n
//! If-Match\n
//! If-None-Match\n
//! If-Unmodified-Since\n
//! Range\n
//! CanonicalizedHeaders\n
//! CanonicalizedResource
//! ```
//!
//! Everything here is pure: the same descriptor always produces the same
//! string, regardless of header or query insertion order.

use http::{HeaderMap, HeaderValue};

use crate::request::SignableRequest;

/// Blob service REST API version applied when none is configured.
pub const DEFAULT_API_VERSION: &str = "2023-11-03";

/// Standard headers in the fixed order mandated by the scheme.  Absent
/// headers sign as empty fields, never as omitted lines.
const STANDARD_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

/// Set the two protocol headers every signed request must carry.
///
/// Both are overwritten unconditionally so the transmitted headers and the
/// signed string cannot disagree.  `version` and `date` are resolved by the
/// signer (configured override or default) before this runs.
pub fn apply_default_headers(
    request: &mut SignableRequest,
    version: &HeaderValue,
    date: &HeaderValue,
) {
    request.headers.insert("x-ms-version", version.clone());
    request.headers.insert("x-ms-date", date.clone());
}

/// Build the signature string for `request` under `account`.
///
/// The account name is mandatory for the resource line; callers validate
/// configuration before invoking this.
pub fn string_to_sign(request: &SignableRequest, account: &str) -> String {
    let mut out = String::with_capacity(256);

    out.push_str(&request.method.as_str().to_ascii_uppercase());
    out.push('\n');

    for name in STANDARD_HEADERS {
        out.push_str(standard_header_value(&request.headers, name));
        out.push('\n');
    }

    out.push_str(&canonicalized_headers(&request.headers));
    out.push('\n');

    out.push_str(&canonicalized_resource(
        account,
        &request.path,
        &request.query,
    ));
    out
}

/// Look up a standard header, defaulting to the empty string.
///
/// A Content-Length of zero signs as empty, valid from service version
/// 2015-02-21 onward.
fn standard_header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    let value = headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if name == "content-length" && value == "0" {
        ""
    } else {
        value
    }
}

/// Render the `x-ms-*` headers as sorted `key:value` lines.
///
/// Header names are already lowercase inside [`HeaderMap`], so the prefix
/// match and the ascending sort are case-insensitive by construction.
/// Whitespace runs in each value collapse to a single space.
fn canonicalized_headers(headers: &HeaderMap) -> String {
    let mut entries: Vec<(&str, String)> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-ms-"))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str(), collapse_whitespace(v)))
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    entries
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the canonicalized resource: `/` + account + path, then one
/// `\nkey:value` segment per query parameter in ascending key order.
///
/// Keys compare as strings, so numeric-looking keys sort lexicographically.
fn canonicalized_resource(account: &str, path: &str, query: &[(String, String)]) -> String {
    let mut out = String::with_capacity(1 + account.len() + path.len());
    out.push('/');
    out.push_str(account);
    out.push_str(path);

    let mut params: Vec<&(String, String)> = query.iter().collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, value) in params {
        out.push('\n');
        out.push_str(key);
        out.push(':');
        out.push_str(value);
    }
    out
}

/// Collapse each whitespace run to a single space.
///
/// Leading and trailing runs also become one space; nothing is trimmed,
/// since trimming would change the signed bytes.
fn collapse_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_run = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}
