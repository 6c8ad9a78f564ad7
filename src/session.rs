//! In-memory session store mirrored to durable storage
//!
//! Single source of truth for "who is logged in". Expiry is checked lazily
//! on every read; nothing here runs in the background.

use fdportal_protocol::Role;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{FdError, Result};
use crate::store::CredentialStorage;
use crate::token;

/// Current credential and the role derived from it
#[derive(Debug)]
pub struct SessionStore<S, C> {
    storage: S,
    clock: C,
    credential: Option<String>,
    role: Option<Role>,
}

impl<S: CredentialStorage, C: Clock> SessionStore<S, C> {
    /// Create an empty store; call `hydrate` to pick up a persisted session
    pub fn new(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            credential: None,
            role: None,
        }
    }

    /// Reload a persisted credential
    ///
    /// A stored credential that is no longer valid is discarded and erased
    /// rather than kept as a stale session.
    pub fn hydrate(&mut self) -> Option<Role> {
        let stored = match self.storage.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "unreadable credential storage, starting anonymous");
                self.clear_quietly();
                return None;
            }
        };

        match stored {
            Some(raw) if token::is_valid(&raw, self.clock.now()) => {
                self.role = token::extract_role(&raw);
                self.credential = Some(raw);
                info!(role = ?self.role, "session restored from storage");
                self.role
            }
            Some(_) => {
                warn!("stored credential is malformed or expired, discarding");
                self.clear_quietly();
                None
            }
            None => {
                debug!("no stored credential");
                None
            }
        }
    }

    /// Commit `raw` as the current session
    ///
    /// The credential is re-validated before anything changes; an invalid one
    /// leaves the previous session untouched. Returns the role claim, which
    /// may be absent.
    pub fn establish(&mut self, raw: &str) -> Result<Option<Role>> {
        let raw = raw.trim();
        let claims = token::decode(raw)
            .map_err(|e| FdError::malformed_credential(format!("Credential rejected: {}", e)))?;

        if claims.exp.is_none() {
            return Err(FdError::malformed_credential("Credential carries no expiry"));
        }
        if !claims.is_live_at(self.clock.now()) {
            return Err(FdError::token_expired("Credential has already expired"));
        }

        self.storage.save(raw)?;
        self.credential = Some(raw.to_string());
        self.role = claims.role;

        info!(role = ?self.role, "session established");
        Ok(self.role)
    }

    /// Forget the session in memory and in durable storage
    ///
    /// Memory is emptied even when erasing storage fails.
    pub fn clear(&mut self) -> Result<()> {
        if self.credential.is_some() {
            info!("session cleared");
        }
        self.credential = None;
        self.role = None;
        self.storage.erase()
    }

    fn clear_quietly(&mut self) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "failed to erase credential storage");
        }
    }

    /// Role claim of the held credential
    pub fn current_role(&self) -> Option<Role> {
        self.role
    }

    /// True iff a credential is held and still valid right now
    pub fn is_active(&self) -> bool {
        self.credential
            .as_deref()
            .is_some_and(|raw| token::is_valid(raw, self.clock.now()))
    }

    /// True when a credential is held, valid or not
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Credential for the `Authorization` header, only while active
    pub fn bearer(&self) -> Option<&str> {
        if self.is_active() {
            self.credential.as_deref()
        } else {
            None
        }
    }

    /// Decoded claims of the held credential
    pub fn claims(&self) -> Option<token::Claims> {
        self.credential
            .as_deref()
            .and_then(|raw| token::decode(raw).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::{ManualClock, MemoryStorage};
    use crate::tests::utils::test_helpers::*;
    use serde_json::json;

    const NOW: i64 = 1_750_000_000;

    fn store() -> (SessionStore<MemoryStorage, ManualClock>, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at(NOW);
        (
            SessionStore::new(storage.clone(), clock.clone()),
            storage,
            clock,
        )
    }

    #[test]
    fn test_starts_empty() {
        let (store, _, _) = store();
        assert!(!store.is_active());
        assert_eq!(store.current_role(), None);
        assert_eq!(store.bearer(), None);
    }

    #[test]
    fn test_establish_valid_credential() {
        let (mut store, storage, _) = store();
        let raw = customer_token(NOW + 60);

        assert_eq!(store.establish(&raw).unwrap(), Some(Role::Customer));
        assert!(store.is_active());
        assert_eq!(store.current_role(), Some(Role::Customer));
        assert_eq!(store.bearer(), Some(raw.as_str()));
        assert_eq!(storage.peek().as_deref(), Some(raw.as_str()));
    }

    #[test]
    fn test_establish_garbage_keeps_previous_session() {
        let (mut store, storage, _) = store();
        let raw = manager_token(NOW + 60);
        store.establish(&raw).unwrap();

        let err = store.establish("not-a-credential").unwrap_err();
        assert!(err.ends_session());
        assert_eq!(store.current_role(), Some(Role::BankManager));
        assert_eq!(storage.peek().as_deref(), Some(raw.as_str()));
    }

    #[test]
    fn test_establish_expired_credential_is_rejected() {
        let (mut store, storage, _) = store();
        let err = store.establish(&customer_token(NOW - 1)).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::TokenExpired);
        assert_eq!(store.current_role(), None);
        assert_eq!(storage.peek(), None);
    }

    #[test]
    fn test_establish_without_exp_is_rejected() {
        let (mut store, _, _) = store();
        let raw = make_token(json!({"role": "CUSTOMER"}));
        assert!(store.establish(&raw).is_err());
        assert!(!store.is_active());
    }

    #[test]
    fn test_establish_without_role_reports_absent_role() {
        let (mut store, _, _) = store();
        let raw = make_token(json!({"sub": "x", "exp": NOW + 60}));
        assert_eq!(store.establish(&raw).unwrap(), None);
        assert!(store.is_active());
    }

    #[test]
    fn test_establish_storage_failure_commits_nothing() {
        let (mut store, storage, _) = store();
        storage.fail_writes(true);
        assert!(store.establish(&customer_token(NOW + 60)).is_err());
        assert!(!store.has_credential());
        assert_eq!(store.current_role(), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (mut store, storage, _) = store();
        store.establish(&customer_token(NOW + 60)).unwrap();

        store.clear().unwrap();
        assert!(!store.is_active());
        assert_eq!(storage.peek(), None);

        store.clear().unwrap();
        assert!(!store.is_active());
        assert_eq!(store.current_role(), None);
    }

    #[test]
    fn test_expiry_is_checked_on_read() {
        let (mut store, _, clock) = store();
        store.establish(&customer_token(NOW + 10)).unwrap();
        assert!(store.is_active());

        clock.advance(10);
        assert!(!store.is_active());
        assert_eq!(store.bearer(), None);
        assert!(store.has_credential());
    }

    #[test]
    fn test_hydrate_restores_valid_credential() {
        let storage = MemoryStorage::with_token(&manager_token(NOW + 300));
        let mut store = SessionStore::new(storage, ManualClock::at(NOW));
        assert_eq!(store.hydrate(), Some(Role::BankManager));
        assert!(store.is_active());
    }

    #[test]
    fn test_hydrate_discards_expired_credential() {
        let storage = MemoryStorage::with_token(&manager_token(NOW - 1));
        let mut store = SessionStore::new(storage.clone(), ManualClock::at(NOW));
        assert_eq!(store.hydrate(), None);
        assert!(!store.is_active());
        assert_eq!(storage.peek(), None);
    }

    #[test]
    fn test_hydrate_discards_malformed_credential() {
        let storage = MemoryStorage::with_token("garbage");
        let mut store = SessionStore::new(storage.clone(), ManualClock::at(NOW));
        assert_eq!(store.hydrate(), None);
        assert_eq!(storage.peek(), None);
    }

    #[test]
    fn test_hydrate_with_unreadable_storage_starts_anonymous() {
        let storage = MemoryStorage::new();
        storage.fail_reads(true);
        let mut store = SessionStore::new(storage, ManualClock::at(NOW));
        assert_eq!(store.hydrate(), None);
        assert!(!store.is_active());
    }
}
