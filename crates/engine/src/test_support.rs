use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pronouns_api::{LookupError, PronounLookup};
use pronouns_types::PronounsResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Answer,
    Fail,
    Malformed,
    Panic,
}

/// In-memory lookup that records every batch it receives.
pub(crate) struct RecordingLookup {
    codes: HashMap<String, String>,
    calls: Mutex<Vec<Vec<String>>>,
    behavior: Mutex<Behavior>,
    delay: Duration,
}

impl RecordingLookup {
    pub(crate) fn with_codes(codes: &[(&str, &str)]) -> Self {
        Self {
            codes: codes
                .iter()
                .map(|(id, code)| (id.to_string(), code.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
            behavior: Mutex::new(Behavior::Answer),
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn failing() -> Self {
        Self::with_codes(&[]).behaving(Behavior::Fail)
    }

    pub(crate) fn malformed() -> Self {
        Self::with_codes(&[]).behaving(Behavior::Malformed)
    }

    pub(crate) fn panicking() -> Self {
        Self::with_codes(&[]).behaving(Behavior::Panic)
    }

    /// Simulated network latency, measured on the Tokio clock.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Switch between answering and failing for subsequent batches.
    pub(crate) fn set_failing(&self, failing: bool) {
        *self.behavior.lock().unwrap() = if failing { Behavior::Fail } else { Behavior::Answer };
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn behaving(self, behavior: Behavior) -> Self {
        *self.behavior.lock().unwrap() = behavior;
        self
    }
}

#[async_trait]
impl PronounLookup for RecordingLookup {
    async fn lookup_bulk(&self, ids: &[String]) -> Result<PronounsResponse, LookupError> {
        self.calls.lock().unwrap().push(ids.to_vec());
        let behavior = *self.behavior.lock().unwrap();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match behavior {
            Behavior::Answer => Ok(ids
                .iter()
                .filter_map(|id| self.codes.get(id).map(|code| (id.clone(), code.clone())))
                .collect()),
            Behavior::Fail => Err(LookupError::Status {
                status: 502,
                body: "bad gateway".into(),
            }),
            Behavior::Malformed => {
                let decode_error = serde_json::from_str::<PronounsResponse>("[1, 2, 3]").unwrap_err();
                Err(LookupError::Decode(decode_error))
            }
            Behavior::Panic => panic!("lookup exploded"),
        }
    }
}
