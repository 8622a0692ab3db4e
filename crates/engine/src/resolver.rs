//! Bulk resolution of a batch of subject ids.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use pronouns_api::PronounLookup;
use pronouns_types::{PronounCode, PronounsResponse, UnknownPronounCode};
use tracing::{debug, error, warn};

use crate::cache::PronounCache;

/// Performs one bulk lookup per batch and records the outcome in the cache.
///
/// The result is total over the requested ids: omitted ids, unknown codes and
/// failed lookups all resolve to [`PronounCode::Unspecified`].
#[derive(Clone)]
pub struct BatchResolver {
    lookup: Arc<dyn PronounLookup>,
    cache: Arc<PronounCache>,
}

impl fmt::Debug for BatchResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchResolver")
            .field("cached_entries", &self.cache.len())
            .finish()
    }
}

impl BatchResolver {
    pub fn new(lookup: Arc<dyn PronounLookup>, cache: Arc<PronounCache>) -> Self {
        Self { lookup, cache }
    }

    pub fn cache(&self) -> &Arc<PronounCache> {
        &self.cache
    }

    pub async fn resolve(&self, ids: &[String]) -> HashMap<String, PronounCode> {
        let resolved = match self.lookup.lookup_bulk(ids).await {
            Ok(response) => normalize_response(ids, response),
            Err(lookup_error) => {
                error!(
                    error = %lookup_error,
                    batch_size = ids.len(),
                    "pronoun lookup failed; treating batch as unspecified"
                );
                ids.iter().map(|id| (id.clone(), PronounCode::Unspecified)).collect()
            }
        };

        self.cache
            .set_many(resolved.iter().map(|(id, code)| (id.clone(), *code)));
        resolved
    }
}

fn normalize_response(ids: &[String], mut response: PronounsResponse) -> HashMap<String, PronounCode> {
    let resolved: HashMap<String, PronounCode> = ids
        .iter()
        .map(|id| {
            let code = match response.remove(id) {
                Some(raw) => raw.parse().unwrap_or_else(|unknown: UnknownPronounCode| {
                    warn!(%id, error = %unknown, "lookup returned an unknown code; treating as unspecified");
                    PronounCode::Unspecified
                }),
                None => PronounCode::Unspecified,
            };
            (id.clone(), code)
        })
        .collect();

    if !response.is_empty() {
        debug!(extra = response.len(), "ignoring ids the batch did not request");
    }
    resolved
}
