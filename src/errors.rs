//! Error types for Shared Key signing.
//!
//! Every failure here is deterministic and fatal for the request being
//! signed: a request with a bad configuration must never go out with a
//! partial or bogus signature, so callers abort instead of retrying.

use thiserror::Error;

/// Errors surfaced while validating credentials or signing a request.
#[derive(Debug, Error)]
pub enum SignError {
    /// The configuration bag has no `account_name`.
    #[error("account_name not set")]
    AccountNameNotSet,

    /// The configuration bag has no `account_key`.
    #[error("account_key not set")]
    AccountKeyNotSet,

    /// The account key is not a valid base64 string.
    #[error("account_key is not valid base64: {0}")]
    InvalidAccountKey(#[from] base64::DecodeError),

    /// A configured value cannot be carried in an HTTP header.
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// Reading a configuration file failed.
    #[error("failed to read configuration file: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// Parsing a configuration file failed.
    #[error("failed to parse configuration file: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}

impl SignError {
    /// Return the error class string.
    ///
    /// A malformed (but present) account key is a `KeyFormatError`; every
    /// other variant is a `ConfigurationError`.
    pub fn code(&self) -> &'static str {
        match self {
            SignError::AccountNameNotSet => "ConfigurationError",
            SignError::AccountKeyNotSet => "ConfigurationError",
            SignError::InvalidAccountKey(_) => "KeyFormatError",
            SignError::InvalidHeaderValue(_) => "ConfigurationError",
            SignError::ConfigRead(_) => "ConfigurationError",
            SignError::ConfigParse(_) => "ConfigurationError",
        }
    }
}
