//! PronounDB API client.
//!
//! This module provides a lightweight client for the PronounDB bulk lookup
//! endpoint. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Validating `PRONOUNDB_API_BASE` for safety
//! - Building lookup requests with a consistent source header and Accept type
//!
//! The primary entry point is [`PronounDbClient`]. Create an instance via
//! [`PronounDbClient::new_from_env`] and hand it to the lookup core as a
//! [`PronounLookup`].
//!
//! # Example
//!
//! ```ignore
//! use pronouns_api::{PronounDbClient, PronounLookup};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let client = PronounDbClient::new_from_env()?;
//!     let pronouns = client.lookup_bulk(&["1234".to_string()]).await?;
//!     println!("{:?}", pronouns);
//!     Ok(())
//! }
//! ```

mod lookup;

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use pronouns_types::{Platform, PronounsResponse};
use reqwest::{Client, RequestBuilder, Url, header};
use tracing::debug;

pub use lookup::{LookupError, PronounLookup};

/// Environment variable overriding the service base URL.
pub const API_BASE_ENV: &str = "PRONOUNDB_API_BASE";
/// Environment variable overriding the value of the source header.
pub const SOURCE_ENV: &str = "PRONOUNDB_SOURCE";
/// Public PronounDB deployment.
pub const DEFAULT_API_BASE: &str = "https://pronoundb.org";
/// Header identifying the calling client to the service (`X-PronounDB-Source`).
pub const SOURCE_HEADER: &str = "x-pronoundb-source";

const LOOKUP_BULK_PATH: &str = "/api/v1/lookup-bulk";

/// Allowed hostnames or base domains for non-local values of
/// `PRONOUNDB_API_BASE`. Subdomains of these domains are also allowed.
const ALLOWED_PRONOUNDB_DOMAINS: &[&str] = &["pronoundb.org"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];
/// Longest error body kept in a [`LookupError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Thin wrapper around a configured `reqwest::Client` for PronounDB access.
#[derive(Debug, Clone)]
pub struct PronounDbClient {
    pub base_url: String,
    pub http: Client,
    pub source: String,
    pub platform: Platform,
}

impl PronounDbClient {
    /// Construct a client from `PRONOUNDB_API_BASE` and `PRONOUNDB_SOURCE`,
    /// falling back to the public deployment and [`default_source`].
    pub fn new_from_env() -> Result<Self> {
        let base_url = env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.into());
        let source = env::var(SOURCE_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(default_source);
        Self::new(&base_url, source)
    }

    /// Construct a client against an explicit base URL.
    ///
    /// Non-localhost hosts must use HTTPS and be within an allowed domain.
    pub fn new(base_url: &str, source: String) -> Result<Self> {
        validate_base_url(base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        default_headers.insert(
            header::HeaderName::from_static(SOURCE_HEADER),
            header::HeaderValue::from_str(&source).context("source header value")?,
        );

        let http = Client::builder()
            .default_headers(default_headers)
            .user_agent(default_source())
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            source,
            platform: Platform::default(),
        })
    }

    /// Use a different platform discriminator for subsequent lookups.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Build the bulk lookup request for `ids` without sending it.
    pub fn lookup_request(&self, ids: &[String]) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, LOOKUP_BULK_PATH);
        let joined_ids = ids.join(",");
        debug!(%url, id_count = ids.len(), platform = self.platform.as_query_value(), "building lookup request");

        self.http
            .get(url)
            .query(&[("platform", self.platform.as_query_value()), ("ids", joined_ids.as_str())])
    }
}

#[async_trait]
impl PronounLookup for PronounDbClient {
    async fn lookup_bulk(&self, ids: &[String]) -> Result<PronounsResponse, LookupError> {
        let response = self.lookup_request(ids).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Client identifier sent in the source header and User-Agent.
pub fn default_source() -> String {
    format!("pronouns-cli/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS)
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS, and host must be one of the allowed
///   domains or a subdomain thereof
fn validate_base_url(base: &str) -> Result<()> {
    let parsed_base_url = Url::parse(base).map_err(|e| anyhow!("Invalid {} URL '{}': {}", API_BASE_ENV, base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("{} must include a host", API_BASE_ENV))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(anyhow!(
            "{} must use https for non-localhost hosts; got '{}://'",
            API_BASE_ENV,
            parsed_base_url.scheme()
        ));
    }

    let is_allowed_domain = ALLOWED_PRONOUNDB_DOMAINS.iter().any(|&allowed_domain| {
        host_name.eq_ignore_ascii_case(allowed_domain) || host_name.ends_with(&format!(".{}", allowed_domain))
    });
    if !is_allowed_domain {
        return Err(anyhow!(
            "{} host '{}' is not allowed; must be one of {:?} or a subdomain, or localhost",
            API_BASE_ENV,
            host_name,
            ALLOWED_PRONOUNDB_DOMAINS
        ));
    }

    Ok(())
}
