//! Credential check and ephemeral session table
//!
//! The store is injected into the HTTP layer; extraction and archiving code
//! never touches it. Sessions live only in memory: token → expiry instant,
//! swept on every access. Credentials are compared as SHA-256 digests so the
//! configured password never sits next to request data in plain form.

use crate::config::AuthConfig;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

/// In-memory credential store and session table
pub struct SessionStore {
    username_digest: [u8; 32],
    password_digest: [u8; 32],
    ttl: Duration,
    sessions: Mutex<HashMap<String, Instant>>,
}

fn digest(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().into()
}

impl SessionStore {
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            username_digest: digest(&auth.username),
            password_digest: digest(&auth.password),
            ttl: Duration::from_secs(auth.session_ttl_secs),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Check Basic credentials; on success mint a session token.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<String> {
        if digest(username) != self.username_digest || digest(password) != self.password_digest {
            return None;
        }
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().expect("session table poisoned");
        Self::sweep(&mut sessions);
        sessions.insert(token.clone(), Instant::now() + self.ttl);
        debug!("Session minted, {} active", sessions.len());
        Some(token)
    }

    /// Check a previously-minted token; a valid token has its expiry refreshed.
    pub fn validate(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().expect("session table poisoned");
        Self::sweep(&mut sessions);
        match sessions.get_mut(token) {
            Some(expiry) => {
                *expiry = Instant::now() + self.ttl;
                true
            }
            None => false,
        }
    }

    /// Drop every expired session. Runs on each authenticate/validate touch.
    pub fn sweep_expired(&self) {
        let mut sessions = self.sessions.lock().expect("session table poisoned");
        Self::sweep(&mut sessions);
    }

    fn sweep(sessions: &mut HashMap<String, Instant>) {
        let now = Instant::now();
        sessions.retain(|_, expiry| *expiry > now);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().expect("session table poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_ttl(ttl_secs: u64) -> SessionStore {
        SessionStore::new(&AuthConfig {
            username: "user".to_string(),
            password: "secret".to_string(),
            session_ttl_secs: ttl_secs,
        })
    }

    #[test]
    fn valid_credentials_mint_a_session() {
        let store = store_with_ttl(60);
        let token = store.authenticate("user", "secret").expect("should mint");
        assert!(store.validate(&token));
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn wrong_credentials_are_rejected() {
        let store = store_with_ttl(60);
        assert!(store.authenticate("user", "wrong").is_none());
        assert!(store.authenticate("other", "secret").is_none());
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn unknown_token_is_rejected() {
        let store = store_with_ttl(60);
        assert!(!store.validate("not-a-token"));
    }

    #[test]
    fn expired_sessions_are_swept() {
        let store = store_with_ttl(0);
        let token = store.authenticate("user", "secret").expect("should mint");
        std::thread::sleep(Duration::from_millis(5));
        store.sweep_expired();
        assert_eq!(store.session_count(), 0);
        assert!(!store.validate(&token));
    }

    #[test]
    fn validate_refreshes_expiry() {
        let store = store_with_ttl(60);
        let token = store.authenticate("user", "secret").unwrap();
        assert!(store.validate(&token));
        assert!(store.validate(&token));
        assert_eq!(store.session_count(), 1);
    }
}
