//! Path-safe user keys

use sha2::{Digest, Sha256};
use std::fmt;

/// Short, path-safe key derived from a user id.
///
/// User ids carry platform prefixes, colons and conversation UUIDs, none of
/// which belong in file names or object keys. The key is the first 16 hex
/// characters of the SHA-256 of the id, so it is stable across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserKey(String);

impl UserKey {
    pub fn from_user_id(user_id: &str) -> Self {
        let digest = Sha256::digest(user_id.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Self(hex[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
