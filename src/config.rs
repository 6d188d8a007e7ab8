//! Configuration bag and credential validation for Shared Key signing.
//!
//! [`SharedKeyConfig`] is the loosely-typed option bag callers populate
//! (every field optional); [`Credentials`] is its validated form with the
//! account key decoded to raw bytes.  Keeping the bag loose means a missing
//! mandatory field surfaces as a typed [`SignError`] when a signer is built,
//! not as a parse failure.

use serde::Deserialize;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use crate::errors::SignError;

/// Recognized Shared Key signing options.
///
/// `account_name` and `account_key` are mandatory for signing but optional
/// here; `ms_date` and `ms_version` override the request timestamp and the
/// service API version header when set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SharedKeyConfig {
    /// Storage account name (maps into the canonicalized resource and the
    /// `Authorization` header).
    #[serde(default)]
    pub account_name: Option<String>,

    /// Base64-encoded storage account key.
    #[serde(default)]
    pub account_key: Option<String>,

    /// Fixed request timestamp in RFC 2616 format.  When unset, the wall
    /// clock is read once per signed request.
    #[serde(default)]
    pub ms_date: Option<String>,

    /// Service API version for the `x-ms-version` header.  When unset, the
    /// crate default applies.
    #[serde(default)]
    pub ms_version: Option<String>,
}

impl SharedKeyConfig {
    /// Build a config from the two mandatory values.
    pub fn new(account_name: impl Into<String>, account_key: impl Into<String>) -> Self {
        Self {
            account_name: Some(account_name.into()),
            account_key: Some(account_key.into()),
            ms_date: None,
            ms_version: None,
        }
    }

    /// Resolve configuration from environment variables.
    ///
    /// Reads `AZURE_STORAGE_ACCOUNT` and `AZURE_STORAGE_KEY` first, then
    /// falls back to `AZURE_STORAGE_CONNECTION_STRING` for any field still
    /// missing.  Explicitly set variables win over connection-string fields.
    pub fn from_env() -> Self {
        let account_name = std::env::var("AZURE_STORAGE_ACCOUNT").ok();
        let account_key = std::env::var("AZURE_STORAGE_KEY").ok();

        if account_name.is_some() && account_key.is_some() {
            return Self {
                account_name,
                account_key,
                ..Self::default()
            };
        }

        if let Ok(conn_str) = std::env::var("AZURE_STORAGE_CONNECTION_STRING") {
            let parsed = Self::from_connection_string(&conn_str);
            return Self {
                account_name: account_name.or(parsed.account_name),
                account_key: account_key.or(parsed.account_key),
                ..Self::default()
            };
        }

        Self {
            account_name,
            account_key,
            ..Self::default()
        }
    }

    /// Parse an Azure storage connection string.
    ///
    /// Connection strings are `;`-separated `Name=Value` pairs; only
    /// `AccountName` and `AccountKey` are consumed here.  The value is
    /// split on the first `=` so base64 key padding survives intact.
    pub fn from_connection_string(connection_string: &str) -> Self {
        let mut config = Self::default();
        for part in connection_string.split(';') {
            if let Some((name, value)) = part.split_once('=') {
                match name.trim() {
                    "AccountName" => config.account_name = Some(value.trim().to_string()),
                    "AccountKey" => config.account_key = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }
        config
    }
}

/// Validated signing credentials: account name plus raw key bytes.
#[derive(Clone, Debug)]
pub struct Credentials {
    /// Storage account name.
    pub account: String,
    /// Base64-decoded account key.
    pub key: Vec<u8>,
}

impl Credentials {
    /// Validate a configuration bag into usable credentials.
    ///
    /// Fails with [`SignError::AccountKeyNotSet`] or
    /// [`SignError::AccountNameNotSet`] when a mandatory field is missing,
    /// and with [`SignError::InvalidAccountKey`] when the key is not valid
    /// base64.  No signature is ever computed from an invalid bag.
    pub fn from_config(config: &SharedKeyConfig) -> Result<Self, SignError> {
        let account_key = config
            .account_key
            .as_deref()
            .ok_or(SignError::AccountKeyNotSet)?;
        let account = config
            .account_name
            .as_deref()
            .ok_or(SignError::AccountNameNotSet)?;

        let key = BASE64_STANDARD.decode(account_key)?;

        Ok(Self {
            account: account.to_string(),
            key,
        })
    }
}

// -- Loader ------------------------------------------------------------------

/// Load and parse a [`SharedKeyConfig`] from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SharedKeyConfig, SignError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config: SharedKeyConfig = serde_yaml::from_str(&contents)?;
    Ok(config)
}
