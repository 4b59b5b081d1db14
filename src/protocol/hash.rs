//! Name and key hashing.
//!
//! Cache names and entry keys travel as raw bytes and are folded into the
//! engine's `u64` key space with `FxHasher`. The hasher is deterministic
//! across processes and runs; identical byte strings always map to the same
//! identifier.

use std::hash::Hasher;

use rustc_hash::FxHasher;

/// Hashes a raw token into a 64-bit identifier.
///
/// ```
/// use lrue::protocol::hash_bytes;
///
/// assert_eq!(hash_bytes(b"users"), hash_bytes(b"users"));
/// assert_ne!(hash_bytes(b"users"), hash_bytes(b"Users"));
/// ```
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_sensitive() {
        assert_ne!(hash_bytes(b"ab"), hash_bytes(b"ba"));
    }

    #[test]
    fn spreads_short_tokens() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..10_000u32 {
            assert!(seen.insert(hash_bytes(i.to_string().as_bytes())));
        }
    }
}
