//! Strong entity tags derived from normalized content.

use std::fmt;

use sha2::{Digest, Sha256};

/// Number of digest bytes kept in the tag.
const DIGEST_PREFIX_BYTES: usize = 16;

/// A quoted strong entity tag, e.g. `"9f86d081884c7d659a2feaa0c55ad015-4"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the tag for `content`.
    ///
    /// The value depends only on the bytes given, so callers pass normalized
    /// content to make it insensitive to fragment completion order.
    pub fn compute(content: impl AsRef<[u8]>) -> Self {
        let content = content.as_ref();
        let digest = Sha256::digest(content);
        Self(format!(
            "\"{}-{:x}\"",
            hex::encode(&digest[..DIGEST_PREFIX_BYTES]),
            content.len()
        ))
    }

    /// Wrap an externally computed tag, adding quotes when missing.
    pub fn from_quoted(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if tag.len() >= 2 && tag.starts_with('"') && tag.ends_with('"') {
            Self(tag)
        } else {
            Self(format!("\"{}\"", tag))
        }
    }

    /// The quoted header value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
