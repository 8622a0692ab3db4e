mod pronoun;
mod settings;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use pronoun::{PronounCode, UnknownPronounCode};
pub use settings::{ParseSettingError, Platform, PronounSettings, PronounSource, PronounsFormat};

/// Raw bulk lookup payload: subject id to wire code.
pub type PronounsResponse = HashMap<String, String>;

/// Outcome of a pronoun read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "lowercase")]
pub enum ResolvedPronouns {
    /// A code from the cache or the lookup service (possibly the sentinel).
    Code(PronounCode),
    /// A caller-supplied hint, shown verbatim.
    Hint(String),
}

impl ResolvedPronouns {
    /// True when this is the "known to have no value" sentinel.
    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Code(PronounCode::Unspecified))
    }
}

impl From<PronounCode> for ResolvedPronouns {
    fn from(code: PronounCode) -> Self {
        Self::Code(code)
    }
}
