//! The closed set of pronoun codes returned by the lookup service.

use std::{error::Error, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A pronoun code as published by the lookup service.
///
/// Every code maps to a canonical display text (see [`PronounCode::canonical_text`]).
/// [`PronounCode::Unspecified`] is the sentinel meaning "known to have no value".
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum PronounCode {
    #[serde(rename = "hh")]
    HeHim,
    #[serde(rename = "hi")]
    HeIt,
    #[serde(rename = "hs")]
    HeShe,
    #[serde(rename = "ht")]
    HeThey,
    #[serde(rename = "ih")]
    ItHim,
    #[serde(rename = "ii")]
    ItIts,
    #[serde(rename = "is")]
    ItShe,
    #[serde(rename = "it")]
    ItThey,
    #[serde(rename = "shh")]
    SheHe,
    #[serde(rename = "sh")]
    SheHer,
    #[serde(rename = "si")]
    SheIt,
    #[serde(rename = "st")]
    SheThey,
    #[serde(rename = "th")]
    TheyHe,
    #[serde(rename = "ti")]
    TheyIt,
    #[serde(rename = "ts")]
    TheyShe,
    #[serde(rename = "tt")]
    TheyThem,
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "other")]
    Other,
    #[serde(rename = "ask")]
    Ask,
    #[serde(rename = "avoid")]
    Avoid,
    #[serde(rename = "unspecified")]
    Unspecified,
}

impl PronounCode {
    /// All codes in service order.
    pub const ALL: [PronounCode; 21] = [
        Self::HeHim,
        Self::HeIt,
        Self::HeShe,
        Self::HeThey,
        Self::ItHim,
        Self::ItIts,
        Self::ItShe,
        Self::ItThey,
        Self::SheHe,
        Self::SheHer,
        Self::SheIt,
        Self::SheThey,
        Self::TheyHe,
        Self::TheyIt,
        Self::TheyShe,
        Self::TheyThem,
        Self::Any,
        Self::Other,
        Self::Ask,
        Self::Avoid,
        Self::Unspecified,
    ];

    /// The wire code (e.g. `"hh"`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::HeHim => "hh",
            Self::HeIt => "hi",
            Self::HeShe => "hs",
            Self::HeThey => "ht",
            Self::ItHim => "ih",
            Self::ItIts => "ii",
            Self::ItShe => "is",
            Self::ItThey => "it",
            Self::SheHe => "shh",
            Self::SheHer => "sh",
            Self::SheIt => "si",
            Self::SheThey => "st",
            Self::TheyHe => "th",
            Self::TheyIt => "ti",
            Self::TheyShe => "ts",
            Self::TheyThem => "tt",
            Self::Any => "any",
            Self::Other => "other",
            Self::Ask => "ask",
            Self::Avoid => "avoid",
            Self::Unspecified => "unspecified",
        }
    }

    /// Canonical, capitalized display text for the code.
    pub fn canonical_text(&self) -> &'static str {
        match self {
            Self::HeHim => "He/Him",
            Self::HeIt => "He/It",
            Self::HeShe => "He/She",
            Self::HeThey => "He/They",
            Self::ItHim => "It/Him",
            Self::ItIts => "It/Its",
            Self::ItShe => "It/She",
            Self::ItThey => "It/They",
            Self::SheHe => "She/He",
            Self::SheHer => "She/Her",
            Self::SheIt => "She/It",
            Self::SheThey => "She/They",
            Self::TheyHe => "They/He",
            Self::TheyIt => "They/It",
            Self::TheyShe => "They/She",
            Self::TheyThem => "They/Them",
            Self::Any => "Any pronouns",
            Self::Other => "Other pronouns",
            Self::Ask => "Ask me my pronouns",
            Self::Avoid => "Avoid pronouns, use my name",
            Self::Unspecified => "No pronouns specified.",
        }
    }

    /// Codes describing a preference rather than a pronoun set. Their canonical
    /// text is shown verbatim in every display format.
    pub fn is_descriptive(&self) -> bool {
        matches!(self, Self::Any | Self::Ask | Self::Avoid | Self::Other)
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }
}

impl fmt::Display for PronounCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PronounCode {
    type Err = UnknownPronounCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.code() == s)
            .ok_or_else(|| UnknownPronounCode(s.to_string()))
    }
}

/// A code outside the closed [`PronounCode`] set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPronounCode(pub String);

impl fmt::Display for UnknownPronounCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown pronoun code '{}'", self.0)
    }
}

impl Error for UnknownPronounCode {}
