//! The bulk lookup seam between the pronoun core and the network.

use async_trait::async_trait;
use pronouns_types::PronounsResponse;
use thiserror::Error;

/// Failure of a single bulk lookup.
///
/// The core never surfaces these to readers; a failed batch degrades to the
/// `unspecified` sentinel for every requested id.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Connection, TLS, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The body was not a JSON object of id to code.
    #[error("malformed lookup response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Performs one bulk lookup for a set of subject ids.
#[async_trait]
pub trait PronounLookup: Send + Sync {
    async fn lookup_bulk(&self, ids: &[String]) -> Result<PronounsResponse, LookupError>;
}
