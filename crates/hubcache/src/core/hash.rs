use crate::error::{Error, Result};

/// Normalize a provider-supplied hash into a blob file name.
///
/// Strips whitespace, a weak-validator `W/` prefix and surrounding quotes.
/// The result must be usable as a single path component.
pub fn normalize_hash(raw: &str) -> Result<String> {
    let mut hash = raw.trim();
    if let Some(rest) = hash.strip_prefix("W/") {
        hash = rest;
    }
    let hash = hash.trim_matches(|c| c == '"' || c == '\'').trim();

    let bad = hash.is_empty()
        || hash == "."
        || hash == ".."
        || hash.contains(['/', '\\', '\0'])
        || hash.ends_with(".incomplete");
    if bad {
        return Err(Error::InvalidResponse(format!(
            "unusable content hash '{raw}'"
        )));
    }
    Ok(hash.to_string())
}
