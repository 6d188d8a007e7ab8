//! blobsign -- Shared Key request signing for Azure Blob Storage.
//!
//! This crate computes the `Authorization: SharedKey {account}:{signature}`
//! header for a single outgoing Blob service request: it canonicalizes the
//! request's method, headers, path, and query parameters into the exact
//! byte string the service expects, authenticates it with HMAC-SHA256
//! under the account key, and writes the resulting header (plus the
//! `x-ms-version` / `x-ms-date` protocol headers) back onto the request
//! descriptor.  Transport, retries, and credential storage are the
//! caller's business.
//!
//! ```
//! use blobsign::{SharedKeySigner, SignableRequest};
//! use http::Method;
//!
//! let signer = SharedKeySigner::new("myaccount", "c2VjcmV0a2V5").unwrap();
//! let mut request = SignableRequest::new(Method::GET, "/mycontainer")
//!     .with_query("restype", "container")
//!     .with_query("comp", "list");
//! signer.sign(&mut request).unwrap();
//!
//! assert!(request
//!     .header("authorization")
//!     .unwrap()
//!     .starts_with("SharedKey myaccount:"));
//! ```

pub mod canonical;
pub mod config;
pub mod errors;
pub mod request;
pub mod signer;

pub use canonical::DEFAULT_API_VERSION;
pub use config::{load_config, Credentials, SharedKeyConfig};
pub use errors::SignError;
pub use request::{encode_blob_path, SignableRequest};
pub use signer::SharedKeySigner;
