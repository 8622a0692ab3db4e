use std::collections::HashMap;
use std::sync::Mutex;

use pronouns_types::PronounCode;

/// Last known code per subject id.
///
/// Entries are only written by the batch resolver and live for the lifetime of
/// the store; there is no eviction or expiry. Every present key maps to a real
/// code or the `unspecified` sentinel.
#[derive(Debug, Default)]
pub struct PronounCache {
    entries: Mutex<HashMap<String, PronounCode>>,
}

impl PronounCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<PronounCode> {
        self.entries.lock().expect("cache lock").get(id).copied()
    }

    /// Merge `entries` into the store, overwriting existing keys.
    pub fn set_many<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, PronounCode)>,
    {
        self.entries.lock().expect("cache lock").extend(entries);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
