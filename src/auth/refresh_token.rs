/// Refresh Token Registry
///
/// Allow-list of refresh tokens the server has issued. A refresh token is
/// honored only when its signature and expiry check out AND it is present
/// here. Entries are never removed; the in-memory registry is emptied only
/// by a process restart.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use sha2::{Digest, Sha256};

pub trait RefreshTokenRegistry: Send + Sync {
    /// Record `token` as honorable.
    fn register(&self, token: &str);

    fn is_registered(&self, token: &str) -> bool;
}

/// Process-lifetime registry. Stores SHA-256 digests, never plaintext tokens.
#[derive(Default)]
pub struct InMemoryRefreshTokenRegistry {
    digests: RwLock<HashSet<String>>,
}

impl InMemoryRefreshTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.digests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RefreshTokenRegistry for InMemoryRefreshTokenRegistry {
    fn register(&self, token: &str) {
        let digest = hash_token(token);
        self.digests
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(digest);
    }

    fn is_registered(&self, token: &str) -> bool {
        let digest = hash_token(token);
        self.digests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&digest)
    }
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
