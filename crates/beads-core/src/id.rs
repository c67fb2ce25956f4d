// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue ID suffix generation (spec.md §4.1: `CreateIssue` assigns an ID
//! "by applying the workspace prefix and a stable suffix" via one of
//! three strategies).

use sha2::{Digest, Sha256};

/// Which suffix strategy produced (or should produce) an issue ID.
#[derive(Debug, Clone)]
pub enum IdStrategy {
    /// Caller supplied the full id already; `CreateIssue` only validates it.
    Explicit(String),
    /// Child-of-parent creation: `<parent-suffix>.<n>` where `n` is the
    /// next unused child index for that parent.
    ChildOfParent { parent_suffix: String, index: u32 },
    /// Collision-free short hash of title + timestamp, base36-encoded.
    ShortHash { seed: String, salt: u32 },
}

/// Renders the suffix for a strategy. Callers own collision detection
/// (re-invoking with an incremented `salt`/`index` on conflict); this
/// function is pure.
pub fn generate_suffix(strategy: &IdStrategy) -> String {
    match strategy {
        IdStrategy::Explicit(id) => id.clone(),
        IdStrategy::ChildOfParent { parent_suffix, index } => {
            format!("{parent_suffix}.{index}")
        }
        IdStrategy::ShortHash { seed, salt } => short_hash(seed, *salt),
    }
}

/// Base36, 7-character hash of `seed` salted by `salt` (incremented by
/// the caller on a collision against existing issue ids).
fn short_hash(seed: &str, salt: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(salt.to_le_bytes());
    let digest = hasher.finalize();

    let mut value: u128 = 0;
    for byte in &digest[..16] {
        value = (value << 8) | *byte as u128;
    }

    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::with_capacity(7);
    let mut v = value;
    for _ in 0..7 {
        let digit = (v % 36) as usize;
        out.push(ALPHABET[digit]);
        v /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("alphabet is ascii")
}

/// Builds the full `<prefix>-<suffix>` id string (invariant 1 shape).
pub fn full_id(prefix: &str, suffix: &str) -> String {
    format!("{prefix}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_is_deterministic() {
        let a = generate_suffix(&IdStrategy::ShortHash { seed: "fix login".into(), salt: 0 });
        let b = generate_suffix(&IdStrategy::ShortHash { seed: "fix login".into(), salt: 0 });
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn short_hash_changes_with_salt() {
        let a = generate_suffix(&IdStrategy::ShortHash { seed: "x".into(), salt: 0 });
        let b = generate_suffix(&IdStrategy::ShortHash { seed: "x".into(), salt: 1 });
        assert_ne!(a, b);
    }

    #[test]
    fn child_of_parent_suffix_shape() {
        let suffix = generate_suffix(&IdStrategy::ChildOfParent { parent_suffix: "abc".into(), index: 3 });
        assert_eq!(suffix, "abc.3");
    }

    #[test]
    fn full_id_shape() {
        assert_eq!(full_id("bd", "abc123"), "bd-abc123");
    }
}
