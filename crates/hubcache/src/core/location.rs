use url::Url;

use crate::error::{Error, Result};

/// Turn a `Location` header into an absolute URL.
///
/// A value carrying its own scheme is used verbatim; anything else is
/// resolved against `original` the way a browser would, so `/new/loc`
/// keeps only scheme and host and `file.bin` replaces the last segment.
pub fn resolve_location(original: &str, location: &str) -> Result<String> {
    let location = location.trim();
    if location.is_empty() {
        return Ok(original.to_string());
    }
    if Url::parse(location).is_ok() {
        return Ok(location.to_string());
    }
    let base = Url::parse(original)
        .map_err(|e| Error::InvalidResponse(format!("invalid URL '{original}': {e}")))?;
    base.join(location)
        .map(String::from)
        .map_err(|e| Error::InvalidResponse(format!("invalid redirect '{location}': {e}")))
}
