//! Signable request descriptor.
//!
//! [`SignableRequest`] carries everything the canonicalization scheme reads:
//! the HTTP method, the URL path, the query parameters, and the headers.
//! It is transport-agnostic; after signing, callers copy the headers onto
//! whatever client request type they actually execute.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Percent-encoding set for blob paths: everything except unreserved
/// characters and '/' is encoded ('/' stays literal in blob paths).
const BLOB_PATH_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode a blob path for use in a request URL.
///
/// The canonicalized resource always uses the un-encoded path; this helper
/// is for building the URL the request is actually sent to.
pub fn encode_blob_path(path: &str) -> String {
    utf8_percent_encode(path, &BLOB_PATH_ENCODE_SET).to_string()
}

/// An HTTP request as seen by the Shared Key scheme.
///
/// Header keys are case-insensitive throughout: [`HeaderMap`] lowercases
/// names on insert, and lookups accept any casing.  Query parameter values
/// are stringified at insertion time.
#[derive(Debug, Clone)]
pub struct SignableRequest {
    /// HTTP method.
    pub method: Method,
    /// URL path, e.g. `/mycontainer/myblob`.
    pub path: String,
    /// Query parameters in insertion order; sorted only at
    /// canonicalization time.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: HeaderMap,
}

impl SignableRequest {
    /// Create a descriptor for `method` on `path` with no query parameters
    /// or headers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
        }
    }

    /// Append a query parameter, stringifying the value.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Set a header, replacing any existing value for the same name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Look up a header value by name (any casing) as a string slice.
    ///
    /// Returns `None` when the header is absent or its value is not valid
    /// ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_blob_path_preserves_slashes() {
        assert_eq!(
            encode_blob_path("/container/path/to/blob"),
            "/container/path/to/blob"
        );
    }

    #[test]
    fn test_encode_blob_path_encodes_spaces() {
        assert_eq!(
            encode_blob_path("/container/key with spaces.txt"),
            "/container/key%20with%20spaces.txt"
        );
    }

    #[test]
    fn test_encode_blob_path_unreserved_untouched() {
        assert_eq!(encode_blob_path("A-Z_a.z~0"), "A-Z_a.z~0");
    }

    #[test]
    fn test_with_query_stringifies_values() {
        let request = SignableRequest::new(Method::GET, "/c")
            .with_query("timeout", 20)
            .with_query("comp", "list");
        assert_eq!(
            request.query,
            vec![
                ("timeout".to_string(), "20".to_string()),
                ("comp".to_string(), "list".to_string()),
            ]
        );
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = SignableRequest::new(Method::PUT, "/c/b").with_header(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml"),
        );
        assert_eq!(request.header("Content-Type"), Some("application/xml"));
        assert_eq!(request.header("content-type"), Some("application/xml"));
    }

    #[test]
    fn test_header_absent_is_none() {
        let request = SignableRequest::new(Method::GET, "/c");
        assert_eq!(request.header("content-md5"), None);
    }
}
