//! Emoji and pictograph stripping for collected free text.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::SanitizationIncomplete;

/// Pictographs, skin-tone modifiers, flag halves, the emoji variation
/// selector, the keycap combiner, the zero-width joiner and the tag
/// characters of subdivision flags.
const DISALLOWED_GLYPHS: &str = r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\p{Regional_Indicator}\x{FE0F}\x{20E3}\x{200D}\x{E0020}-\x{E007F}]";

fn disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DISALLOWED_GLYPHS).expect("glyph regex is valid"))
}

/// Strip disallowed glyphs from every item, preserving order and count.
///
/// The result is re-scanned with [`verify`] before it is returned; any
/// survivor fails the whole batch.
pub fn sanitize(items: Vec<String>) -> Result<Vec<String>, SanitizationIncomplete> {
    let re = disallowed();
    let cleaned: Vec<String> = items
        .into_iter()
        .map(|item| re.replace_all(&item, "").trim().to_string())
        .collect();

    verify(&cleaned)?;
    Ok(cleaned)
}

/// Fail on the first item that still carries a disallowed glyph.
pub fn verify(items: &[String]) -> Result<(), SanitizationIncomplete> {
    let re = disallowed();
    match items.iter().position(|item| re.is_match(item)) {
        Some(index) => Err(SanitizationIncomplete { index }),
        None => Ok(()),
    }
}

/// [`sanitize`], degrading the whole batch to empty on failure.
pub fn sanitize_or_empty(items: Vec<String>) -> Vec<String> {
    degrade(sanitize(items))
}

fn degrade(result: Result<Vec<String>, SanitizationIncomplete>) -> Vec<String> {
    match result {
        Ok(cleaned) => cleaned,
        Err(e) => {
            tracing::warn!("{e}; dropping comment batch");
            Vec::new()
        }
    }
}
