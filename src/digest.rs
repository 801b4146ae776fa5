//! Content-addressable digests for logical keys.
//!
//! The primary store is keyed by the BLAKE3 hash of each logical key rather
//! than the key itself. Digests are fixed-width (256 bits) and uniformly
//! distributed, which keeps point lookups cheap regardless of key length.
//!
//! # Example
//!
//! ```
//! use meshkv::digest::{digest, hex_digest};
//!
//! let d = digest(b"ec:1");
//! assert_eq!(d.as_bytes().len(), 32);
//! assert_eq!(d.to_hex(), hex_digest(b"ec:1"));
//! ```

use std::fmt;

/// Width of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A 256-bit one-way hash of a logical key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Returns the raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Renders the digest as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Rebuilds a digest from raw bytes read back from storage.
    ///
    /// Returns `None` if `bytes` is not exactly [`DIGEST_LEN`] long.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; DIGEST_LEN]>::try_from(bytes).ok().map(Self)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Hashes `data` into a [`Digest`].
pub fn digest(data: impl AsRef<[u8]>) -> Digest {
    Digest(*blake3::hash(data.as_ref()).as_bytes())
}

/// Hashes `data` and returns the digest as lowercase hex.
pub fn hex_digest(data: impl AsRef<[u8]>) -> String {
    digest(data).to_hex()
}
