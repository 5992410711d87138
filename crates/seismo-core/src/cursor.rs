//! Opaque continuation tokens.
//!
//! A cursor is the last evaluated composite key of a query page, serialized
//! as JSON with sorted field names and wrapped in URL-safe base64 without
//! padding. Only the query planner produces and consumes them.
//!
//! Decoding validates shape, not freshness: a well-formed key that no
//! longer points at a stored record simply resumes from where it would
//! have been.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{Error, Result};
use crate::record::Key;

/// Encode a composite key as an opaque token.
pub fn encode(key: &Key) -> Result<String> {
    let json = serde_json::to_vec(key)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token produced by [`encode`].
///
/// Fails with [`Error::InvalidCursor`] on bad base64, on a payload that is
/// not a flat object of string/integer values, and on an empty key.
pub fn decode(token: &str) -> Result<Key> {
    // Tolerate padded tokens from clients that re-encode them
    let trimmed = token.trim().trim_end_matches('=');

    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| Error::InvalidCursor(format!("not valid base64: {e}")))?;

    let key: Key = serde_json::from_slice(&bytes)
        .map_err(|e| Error::InvalidCursor(format!("malformed key payload: {e}")))?;

    if key.is_empty() {
        return Err(Error::InvalidCursor("empty key".to_string()));
    }

    Ok(key)
}
