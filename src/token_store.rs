use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

/// Access tokens live for one day, refresh tokens for seven, matching the
/// cookie lifetimes the backend issues them with.
fn access_token_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::days(1)
}

fn refresh_token_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::days(7)
}

#[derive(Debug, Clone)]
struct StoredToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn live_value(&self) -> Option<String> {
        if self.expires_at > Utc::now() {
            Some(self.value.clone())
        } else {
            None
        }
    }
}

/// Single owner of the access/refresh token pair. Every read goes through
/// here, and only the session paths (login, refresh, logout) write. An
/// expired token reads as absent, which callers treat as logged out.
#[derive(Debug, Default)]
pub struct TokenStore {
    access: RwLock<Option<StoredToken>>,
    refresh: RwLock<Option<StoredToken>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_session(&self, access_token: &str, refresh_token: &str) {
        self.set_access_token(access_token);
        self.set_refresh_token(refresh_token);
    }

    pub fn set_access_token(&self, value: &str) {
        *self.access.write().unwrap() = Some(StoredToken {
            value: value.to_string(),
            expires_at: access_token_expiry(),
        });
    }

    pub fn set_refresh_token(&self, value: &str) {
        *self.refresh.write().unwrap() = Some(StoredToken {
            value: value.to_string(),
            expires_at: refresh_token_expiry(),
        });
    }

    pub fn access_token(&self) -> Option<String> {
        self.access.read().unwrap().as_ref().and_then(StoredToken::live_value)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.refresh.read().unwrap().as_ref().and_then(StoredToken::live_value)
    }

    /// Absence of an access token means logged out, even when a refresh
    /// token is still around.
    pub fn is_logged_in(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn clear(&self) {
        *self.access.write().unwrap() = None;
        *self.refresh.write().unwrap() = None;
    }

    #[cfg(test)]
    pub(crate) fn insert_expired_access_token(&self, value: &str) {
        *self.access.write().unwrap() = Some(StoredToken {
            value: value.to_string(),
            expires_at: Utc::now() - Duration::seconds(1),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::TokenStore;

    #[test]
    fn stores_and_returns_both_tokens() {
        let store = TokenStore::new();
        store.store_session("access-1", "refresh-1");
        assert_eq!(store.access_token().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
        assert!(store.is_logged_in());
    }

    #[test]
    fn expired_access_token_reads_as_absent() {
        let store = TokenStore::new();
        store.insert_expired_access_token("stale");
        store.set_refresh_token("refresh-1");
        assert_eq!(store.access_token(), None);
        assert!(!store.is_logged_in());
        // the refresh token is unaffected
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn clear_is_idempotent() {
        let store = TokenStore::new();
        store.store_session("a", "r");
        store.clear();
        store.clear();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn set_access_token_overwrites_previous() {
        let store = TokenStore::new();
        store.set_access_token("old");
        store.set_access_token("new");
        assert_eq!(store.access_token().as_deref(), Some("new"));
    }
}
