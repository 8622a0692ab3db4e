//! # Pronouns Engine
//!
//! A coalescing cache for pronoun lookups. Many independent per-user reads are
//! folded into debounced bulk requests, results are cached for the lifetime of
//! the process, and callers can always get a synchronous best-effort answer
//! while an asynchronous fetch is in flight.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use pronouns_api::PronounDbClient;
//! use pronouns_engine::PronounService;
//! use pronouns_types::PronounSettings;
//!
//! async fn show(id: &str) -> anyhow::Result<()> {
//!     let client = Arc::new(PronounDbClient::new_from_env()?);
//!     let service = PronounService::new(client, PronounSettings::default());
//!     println!("{:?}", service.formatted_pronouns(id, None).await);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`cache`**: id to last known code; the source of synchronous reads
//! - **`resolver`**: one bulk lookup per batch, failures degrade to `unspecified`
//! - **`coalescer`**: debounced batching and per-id waiter fan-out
//! - **`formatter`**: display text for a code in the configured casing
//! - **`service`**: the synchronous and asynchronous read entry points

pub mod cache;
pub mod coalescer;
pub mod formatter;
pub mod resolver;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::PronounCache;
pub use coalescer::{CoalescerConfig, DEFAULT_DEBOUNCE, RequestCoalescer};
pub use formatter::{format_code, format_pronouns, render};
pub use resolver::BatchResolver;
pub use service::PronounService;
