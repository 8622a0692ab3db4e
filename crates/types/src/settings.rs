use std::{error::Error, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Casing applied when rendering a pronoun code.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PronounsFormat {
    /// Lowered text, except for descriptive codes which keep their canonical form.
    #[default]
    Lowercase,
    /// Canonical text verbatim.
    Capitalized,
}

impl FromStr for PronounsFormat {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lowercase" => Ok(Self::Lowercase),
            "capitalized" => Ok(Self::Capitalized),
            _ => Err(ParseSettingError::new("pronounsFormat", s, "lowercase, capitalized")),
        }
    }
}

/// Which source wins when both a cached service value and a local hint exist.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PronounSource {
    #[default]
    PreferExternalService,
    PreferLocalHint,
}

impl FromStr for PronounSource {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" | "preferExternalService" => Ok(Self::PreferExternalService),
            "hint" | "preferLocalHint" => Ok(Self::PreferLocalHint),
            _ => Err(ParseSettingError::new("pronounSource", s, "service, hint")),
        }
    }
}

/// Platform discriminator sent with every bulk lookup.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Discord,
    Github,
    Minecraft,
    Osu,
    Twitch,
    Twitter,
}

impl Platform {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::Github => "github",
            Self::Minecraft => "minecraft",
            Self::Osu => "osu",
            Self::Twitch => "twitch",
            Self::Twitter => "twitter",
        }
    }
}

impl FromStr for Platform {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discord" => Ok(Self::Discord),
            "github" => Ok(Self::Github),
            "minecraft" => Ok(Self::Minecraft),
            "osu" => Ok(Self::Osu),
            "twitch" => Ok(Self::Twitch),
            "twitter" => Ok(Self::Twitter),
            _ => Err(ParseSettingError::new(
                "platform",
                s,
                "discord, github, minecraft, osu, twitch, twitter",
            )),
        }
    }
}

/// User-facing configuration read by the lookup core.
///
/// `show_in_profile` and `show_self` only gate whether a result is surfaced;
/// they never change how it is resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PronounSettings {
    pub pronoun_source: PronounSource,
    pub pronouns_format: PronounsFormat,
    pub show_in_profile: bool,
    pub show_self: bool,
}

impl Default for PronounSettings {
    fn default() -> Self {
        Self {
            pronoun_source: PronounSource::default(),
            pronouns_format: PronounsFormat::default(),
            show_in_profile: true,
            show_self: true,
        }
    }
}

impl PronounSettings {
    /// Apply a single `key = value` assignment using the persisted key names.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ParseSettingError> {
        match key {
            "pronounSource" => self.pronoun_source = value.parse()?,
            "pronounsFormat" => self.pronouns_format = value.parse()?,
            "showInProfile" => self.show_in_profile = parse_bool(key, value)?,
            "showSelf" => self.show_self = parse_bool(key, value)?,
            _ => {
                return Err(ParseSettingError::new(
                    "key",
                    key,
                    "pronounSource, pronounsFormat, showInProfile, showSelf",
                ));
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ParseSettingError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ParseSettingError::new(key, value, "true, false")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSettingError {
    setting: String,
    value: String,
    expected: &'static str,
}

impl ParseSettingError {
    fn new(setting: &str, value: &str, expected: &'static str) -> Self {
        Self {
            setting: setting.to_string(),
            value: value.to_string(),
            expected,
        }
    }
}

impl fmt::Display for ParseSettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} '{}'; expected one of: {}",
            self.setting, self.value, self.expected
        )
    }
}

impl Error for ParseSettingError {}
