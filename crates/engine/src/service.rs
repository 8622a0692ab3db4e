//! Read façade over the pronoun cache and the request coalescer.

use std::fmt;
use std::sync::{Arc, RwLock};

use pronouns_api::PronounLookup;
use pronouns_types::{PronounCode, PronounSettings, PronounSource, ResolvedPronouns};
use tokio::sync::oneshot;
use tracing::warn;

use crate::cache::PronounCache;
use crate::coalescer::{CoalescerConfig, RequestCoalescer};
use crate::formatter::render;
use crate::resolver::BatchResolver;

/// Process-wide pronoun lookup service.
///
/// Construct one per process and share it (for example behind an `Arc`). It
/// owns the cache and the coalescer; nothing else mutates either.
pub struct PronounService {
    cache: Arc<PronounCache>,
    coalescer: Arc<RequestCoalescer>,
    settings: RwLock<PronounSettings>,
}

impl fmt::Debug for PronounService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PronounService")
            .field("cached_entries", &self.cache.len())
            .field("pending", &self.coalescer.pending_len())
            .field("config", &self.coalescer.config())
            .finish()
    }
}

impl PronounService {
    pub fn new(lookup: Arc<dyn PronounLookup>, settings: PronounSettings) -> Self {
        Self::with_config(lookup, settings, CoalescerConfig::default())
    }

    pub fn with_config(lookup: Arc<dyn PronounLookup>, settings: PronounSettings, config: CoalescerConfig) -> Self {
        let cache = Arc::new(PronounCache::new());
        let resolver = BatchResolver::new(lookup, Arc::clone(&cache));
        Self {
            cache,
            coalescer: Arc::new(RequestCoalescer::new(resolver, config)),
            settings: RwLock::new(settings),
        }
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &PronounCache {
        &self.cache
    }

    pub fn settings(&self) -> PronounSettings {
        self.settings.read().expect("settings lock").clone()
    }

    pub fn update_settings(&self, settings: PronounSettings) {
        *self.settings.write().expect("settings lock") = settings;
    }

    /// Best-effort answer from what is already known, without any I/O.
    ///
    /// With `PreferLocalHint` a present hint wins. Otherwise a cached real code
    /// wins, then the hint, then a cached `unspecified` sentinel. Blank hints
    /// count as absent.
    pub fn cached_pronouns(&self, id: &str, hint: Option<&str>) -> Option<ResolvedPronouns> {
        let hint = hint.map(str::trim).filter(|hint| !hint.is_empty());

        if self.settings().pronoun_source == PronounSource::PreferLocalHint
            && let Some(hint) = hint
        {
            return Some(ResolvedPronouns::Hint(hint.to_string()));
        }

        let cached = self.cache.get(id);
        if let Some(code) = cached.filter(|code| !code.is_unspecified()) {
            return Some(ResolvedPronouns::Code(code));
        }

        hint.map(|hint| ResolvedPronouns::Hint(hint.to_string()))
            .or_else(|| cached.map(ResolvedPronouns::Code))
    }

    /// Authoritative answer: the synchronous answer when there is one,
    /// otherwise the result of the next batch that includes `id`.
    pub async fn fetch_pronouns(&self, id: &str, hint: Option<&str>) -> ResolvedPronouns {
        if let Some(resolved) = self.cached_pronouns(id, hint) {
            return resolved;
        }
        ResolvedPronouns::Code(await_waiter(id, self.coalescer.lookup(id)).await)
    }

    /// Look `id` up again even if the cache already has an answer.
    pub async fn refresh(&self, id: &str) -> PronounCode {
        await_waiter(id, self.coalescer.request(id)).await
    }

    /// [`fetch_pronouns`](Self::fetch_pronouns) rendered in the configured format.
    pub async fn formatted_pronouns(&self, id: &str, hint: Option<&str>) -> Option<String> {
        let resolved = self.fetch_pronouns(id, hint).await;
        self.display(&resolved)
    }

    /// Pronouns for a profile view, honoring `show_in_profile` and `show_self`.
    pub async fn profile_pronouns(&self, id: &str, hint: Option<&str>, current_user_id: &str) -> Option<String> {
        let settings = self.settings();
        if !settings.show_in_profile {
            return None;
        }
        if !settings.show_self && id == current_user_id {
            return None;
        }
        self.formatted_pronouns(id, hint).await
    }

    pub fn display(&self, resolved: &ResolvedPronouns) -> Option<String> {
        render(resolved, self.settings().pronouns_format)
    }
}

async fn await_waiter(id: &str, receiver: oneshot::Receiver<PronounCode>) -> PronounCode {
    receiver.await.unwrap_or_else(|_| {
        warn!(%id, "pronoun waiter dropped before its batch settled");
        PronounCode::Unspecified
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingLookup;
    use futures_util::future::join_all;
    use pronouns_types::PronounsFormat;

    fn service_with(lookup: Arc<RecordingLookup>, settings: PronounSettings) -> PronounService {
        PronounService::new(lookup, settings)
    }

    fn prefer(source: PronounSource) -> PronounSettings {
        PronounSettings {
            pronoun_source: source,
            ..PronounSettings::default()
        }
    }

    #[test]
    fn hint_priority_follows_pronoun_source() {
        let lookup = Arc::new(RecordingLookup::with_codes(&[]));
        let service = service_with(lookup, prefer(PronounSource::PreferLocalHint));
        service.cache().set_many([("a".to_string(), PronounCode::HeHim)]);

        assert_eq!(
            service.cached_pronouns("a", Some("she/her")),
            Some(ResolvedPronouns::Hint("she/her".into()))
        );

        service.update_settings(prefer(PronounSource::PreferExternalService));
        assert_eq!(
            service.cached_pronouns("a", Some("she/her")),
            Some(ResolvedPronouns::Code(PronounCode::HeHim))
        );
    }

    #[test]
    fn synchronous_read_falls_back_through_hint_then_sentinel() {
        let lookup = Arc::new(RecordingLookup::with_codes(&[]));
        let service = service_with(lookup, PronounSettings::default());
        service.cache().set_many([("gone".to_string(), PronounCode::Unspecified)]);

        assert_eq!(
            service.cached_pronouns("gone", Some("they/them")),
            Some(ResolvedPronouns::Hint("they/them".into()))
        );
        assert_eq!(
            service.cached_pronouns("gone", Some("   ")),
            Some(ResolvedPronouns::Code(PronounCode::Unspecified))
        );
        assert_eq!(service.cached_pronouns("never", None), None);
    }

    #[test]
    fn synchronous_read_is_idempotent() {
        let lookup = Arc::new(RecordingLookup::with_codes(&[]));
        let service = service_with(lookup, PronounSettings::default());
        service.cache().set_many([("a".to_string(), PronounCode::ItIts)]);

        let first = service.cached_pronouns("a", Some("hint"));
        let second = service.cached_pronouns("a", Some("hint"));
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_for_same_id_issue_one_request() {
        let lookup = Arc::new(RecordingLookup::with_codes(&[("a", "ts")]));
        let service = service_with(lookup.clone(), PronounSettings::default());

        let results = join_all((0..4).map(|_| service.fetch_pronouns("a", None))).await;

        assert!(results.iter().all(|result| *result == ResolvedPronouns::Code(PronounCode::TheyShe)));
        assert_eq!(lookup.calls(), vec![vec!["a".to_string()]]);
    }

    #[tokio::test(start_paused = true)]
    async fn hint_answers_without_network() {
        let lookup = Arc::new(RecordingLookup::with_codes(&[("a", "hh")]));
        let service = service_with(lookup.clone(), PronounSettings::default());

        let resolved = service.fetch_pronouns("a", Some("fae/faer")).await;

        assert_eq!(resolved, ResolvedPronouns::Hint("fae/faer".into()));
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sentinel_is_sticky_until_refresh() {
        let lookup = Arc::new(RecordingLookup::with_codes(&[("a", "sh")]));
        lookup.set_failing(true);
        let service = service_with(lookup.clone(), PronounSettings::default());

        assert!(service.fetch_pronouns("a", None).await.is_unspecified());
        assert!(service.fetch_pronouns("a", None).await.is_unspecified());
        assert_eq!(lookup.calls().len(), 1);

        lookup.set_failing(false);
        assert_eq!(service.refresh("a").await, PronounCode::SheHer);
        assert_eq!(
            service.fetch_pronouns("a", None).await,
            ResolvedPronouns::Code(PronounCode::SheHer)
        );
        assert_eq!(lookup.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_batch_is_durably_cached_for_every_id() {
        let lookup = Arc::new(RecordingLookup::malformed());
        let service = service_with(lookup.clone(), PronounSettings::default());

        let results = join_all([service.fetch_pronouns("a", None), service.fetch_pronouns("b", None)]).await;

        assert!(results.iter().all(ResolvedPronouns::is_unspecified));
        assert_eq!(service.cache().get("a"), Some(PronounCode::Unspecified));
        assert_eq!(service.cache().get("b"), Some(PronounCode::Unspecified));
        assert_eq!(lookup.calls(), vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[tokio::test(start_paused = true)]
    async fn formatted_pronouns_uses_configured_format() {
        let lookup = Arc::new(RecordingLookup::with_codes(&[("a", "hh"), ("b", "any")]));
        let service = service_with(lookup, PronounSettings::default());

        assert_eq!(service.formatted_pronouns("a", None).await.as_deref(), Some("he/him"));
        assert_eq!(service.formatted_pronouns("b", None).await.as_deref(), Some("Any pronouns"));
        assert_eq!(service.formatted_pronouns("c", None).await, None);

        service.update_settings(PronounSettings {
            pronouns_format: PronounsFormat::Capitalized,
            ..PronounSettings::default()
        });
        assert_eq!(service.formatted_pronouns("a", None).await.as_deref(), Some("He/Him"));
    }

    #[tokio::test(start_paused = true)]
    async fn profile_pronouns_honors_visibility_settings() {
        let lookup = Arc::new(RecordingLookup::with_codes(&[("me", "tt"), ("you", "sh")]));
        let service = service_with(
            lookup.clone(),
            PronounSettings {
                show_self: false,
                ..PronounSettings::default()
            },
        );

        assert_eq!(service.profile_pronouns("me", None, "me").await, None);
        assert_eq!(service.profile_pronouns("you", None, "me").await.as_deref(), Some("she/her"));

        service.update_settings(PronounSettings {
            show_in_profile: false,
            ..PronounSettings::default()
        });
        assert_eq!(service.profile_pronouns("you", None, "me").await, None);
        assert_eq!(lookup.calls(), vec![vec!["you".to_string()]]);
    }
}
