use pronouns_types::{PronounCode, PronounsFormat, ResolvedPronouns, UnknownPronounCode};

/// Render a code in the requested display format.
///
/// `Capitalized` returns the canonical text. `Lowercase` lowers it, except for
/// descriptive codes (`any`, `ask`, `avoid`, `other`) which stay verbatim.
pub fn format_pronouns(code: PronounCode, format: PronounsFormat) -> String {
    let canonical = code.canonical_text();
    match format {
        PronounsFormat::Capitalized => canonical.to_string(),
        PronounsFormat::Lowercase if code.is_descriptive() => canonical.to_string(),
        PronounsFormat::Lowercase => canonical.to_lowercase(),
    }
}

/// [`format_pronouns`] for a raw wire code.
pub fn format_code(code: &str, format: PronounsFormat) -> Result<String, UnknownPronounCode> {
    Ok(format_pronouns(code.parse()?, format))
}

/// Display text for a read result, or `None` when there is nothing to show.
///
/// Hints are shown verbatim; the `unspecified` sentinel renders as nothing.
pub fn render(resolved: &ResolvedPronouns, format: PronounsFormat) -> Option<String> {
    match resolved {
        ResolvedPronouns::Code(PronounCode::Unspecified) => None,
        ResolvedPronouns::Code(code) => Some(format_pronouns(*code, format)),
        ResolvedPronouns::Hint(hint) => Some(hint.clone()),
    }
}
