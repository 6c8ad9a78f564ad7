//! Session supervisor: inactivity timeout and route guarding
//!
//! ```text
//!             establish(valid)              activity ──┐
//! [Anonymous] ───────────────→ [Active(role)] ←────────┘
//!      ↑                            │
//!      └── logout / timeout / 401 / expired credential
//! ```
//!
//! The timer exists only while a session does. Every exit path drops it
//! before the store is touched, so a countdown can never fire against a
//! session it was not armed for.

use std::time::Duration;

use fdportal_protocol::Role;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{FdError, Result};
use crate::inactivity::{ActivityKind, InactivityTimer, INACTIVITY_TIMEOUT};
use crate::route::{self, Resolution, Route, SessionState};
use crate::session::SessionStore;
use crate::store::CredentialStorage;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Logout,
    Inactivity,
    Expired,
    Rejected,
}

pub struct SessionSupervisor<S, C> {
    store: SessionStore<S, C>,
    timer: Option<InactivityTimer>,
    timeout: Duration,
}

impl<S: CredentialStorage, C: Clock> SessionSupervisor<S, C> {
    pub fn new(store: SessionStore<S, C>) -> Self {
        Self::with_timeout(store, INACTIVITY_TIMEOUT)
    }

    pub fn with_timeout(store: SessionStore<S, C>, timeout: Duration) -> Self {
        Self {
            store,
            timer: None,
            timeout,
        }
    }

    /// Hydrate from durable storage and arm the timer if a session survives
    pub fn start(&mut self) -> SessionState {
        self.timer = None;
        self.store.hydrate();

        let state = self.state();
        match state {
            SessionState::Active(_) => self.arm(),
            SessionState::Anonymous if self.store.has_credential() => {
                // Decodes, but no usable role.
                self.end_session(EndReason::Rejected);
            }
            SessionState::Anonymous => {}
        }
        self.state()
    }

    /// Guard-level view of the session
    ///
    /// A live credential without a recognized role counts as anonymous.
    pub fn state(&self) -> SessionState {
        match self.current_role() {
            Some(role) if self.is_active() => SessionState::Active(role),
            _ => SessionState::Anonymous,
        }
    }

    /// Establish a session from a credential the server just issued
    ///
    /// Any pending countdown is cancelled first. On failure the previous
    /// session, if any, stays as it was.
    pub fn establish(&mut self, raw: &str) -> Result<Role> {
        self.timer = None;

        match self.store.establish(raw) {
            Ok(Some(role)) => {
                self.arm();
                Ok(role)
            }
            Ok(None) => {
                self.end_session(EndReason::Rejected);
                Err(FdError::malformed_credential(
                    "Credential does not carry a recognized role",
                ))
            }
            Err(e) => {
                if matches!(self.state(), SessionState::Active(_)) {
                    self.arm();
                }
                Err(e)
            }
        }
    }

    /// Record a user-activity signal
    pub fn activity(&mut self, kind: ActivityKind) {
        if let Some(timer) = self.timer.as_mut() {
            timer.rearm();
            debug!(?kind, "activity, inactivity timer rearmed");
        }
    }

    /// Operator-initiated logout
    pub fn logout(&mut self) -> Route {
        self.end_session(EndReason::Logout)
    }

    /// The server answered 401 to an authenticated call
    pub fn reject(&mut self) -> Route {
        self.end_session(EndReason::Rejected)
    }

    /// Resolves when the idle window elapses, then ends the session
    ///
    /// Pends forever while anonymous. Cancel-safe, for use in `select!`.
    pub async fn wait_for_timeout(&mut self) -> Route {
        match self.timer.as_mut() {
            Some(timer) => timer.elapsed().await,
            None => std::future::pending::<()>().await,
        }
        self.end_session(EndReason::Inactivity)
    }

    /// Resolve a navigation request
    ///
    /// A held credential that has expired since the last check is discarded
    /// here. A role mismatch redirects but keeps the session.
    pub fn navigate(&mut self, path: &str) -> Resolution {
        self.expire_if_stale();

        let resolution = route::resolve(path, self.state());
        debug!(path, ?resolution, "route resolved");
        resolution
    }

    /// Credential for an authenticated call
    ///
    /// Returns `None`, ending the session, when it has expired.
    pub fn bearer(&mut self) -> Option<String> {
        self.expire_if_stale();
        self.store.bearer().map(str::to_string)
    }

    pub fn is_active(&self) -> bool {
        self.store.is_active()
    }

    pub fn current_role(&self) -> Option<Role> {
        self.store.current_role()
    }

    pub fn store(&self) -> &SessionStore<S, C> {
        &self.store
    }

    /// Time left before the inactivity timeout, while a session is live
    pub fn idle_remaining(&self) -> Option<Duration> {
        self.timer.as_ref().map(InactivityTimer::remaining)
    }

    fn arm(&mut self) {
        self.timer = Some(InactivityTimer::arm(self.timeout));
    }

    fn expire_if_stale(&mut self) {
        if self.store.has_credential() && !self.store.is_active() {
            self.end_session(EndReason::Expired);
        }
    }

    fn end_session(&mut self, reason: EndReason) -> Route {
        self.timer = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to erase credential storage");
        }
        info!(?reason, "session ended");
        Route::Login
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::GuardDecision;
    use crate::tests::mocks::{ManualClock, MemoryStorage};
    use crate::tests::utils::test_helpers::*;
    use serde_json::json;
    use tokio::time::{self, Instant};

    const NOW: i64 = 1_750_000_000;

    fn supervisor() -> (SessionSupervisor<MemoryStorage, ManualClock>, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at(NOW);
        let store = SessionStore::new(storage.clone(), clock.clone());
        (SessionSupervisor::new(store), storage, clock)
    }

    fn guard(sup: &mut SessionSupervisor<MemoryStorage, ManualClock>, route: Route) -> GuardDecision {
        match sup.navigate(route.path()) {
            Resolution::Render(r) if r == route => GuardDecision::Admit,
            _ => GuardDecision::RedirectToLogin,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_customer_scenario() {
        let (mut sup, _, _) = supervisor();
        let role = sup.establish(&customer_token(NOW + 60)).unwrap();

        assert_eq!(role, Role::Customer);
        assert!(sup.is_active());
        assert_eq!(guard(&mut sup, Route::FdInvest), GuardDecision::Admit);
        assert_eq!(guard(&mut sup, Route::CustomerDashboard), GuardDecision::Admit);
        assert_eq!(guard(&mut sup, Route::ManagerDashboard), GuardDecision::RedirectToLogin);

        // Wrong role for the page does not end the session.
        assert_eq!(sup.state(), SessionState::Active(Role::Customer));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manager_guard() {
        let (mut sup, _, _) = supervisor();
        sup.establish(&manager_token(NOW + 60)).unwrap();

        assert_eq!(guard(&mut sup, Route::ManagerDashboard), GuardDecision::Admit);
        assert_eq!(guard(&mut sup, Route::CustomerDashboard), GuardDecision::RedirectToLogin);
        assert_eq!(guard(&mut sup, Route::FdInvest), GuardDecision::RedirectToLogin);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_manager_credential_denied_everywhere() {
        let storage = MemoryStorage::with_token(&manager_token(NOW - 1));
        let store = SessionStore::new(storage.clone(), ManualClock::at(NOW));
        let mut sup = SessionSupervisor::new(store);

        assert_eq!(sup.start(), SessionState::Anonymous);
        assert!(!sup.is_active());
        for route in [Route::CustomerDashboard, Route::FdInvest, Route::ManagerDashboard] {
            assert_eq!(sup.navigate(route.path()), Resolution::Redirect(Route::Login));
        }
        assert_eq!(storage.peek(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_anonymous_denied_protected_routes() {
        let (mut sup, _, _) = supervisor();
        assert_eq!(guard(&mut sup, Route::CustomerDashboard), GuardDecision::RedirectToLogin);
        assert_eq!(guard(&mut sup, Route::ManagerDashboard), GuardDecision::RedirectToLogin);
    }

    #[tokio::test(start_paused = true)]
    async fn test_credential_without_role_is_refused() {
        let (mut sup, storage, _) = supervisor();
        let raw = make_token(json!({"sub": "nobody", "exp": NOW + 60}));

        assert!(sup.establish(&raw).is_err());
        assert_eq!(sup.state(), SessionState::Anonymous);
        assert_eq!(sup.idle_remaining(), None);
        assert_eq!(storage.peek(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_credential_keeps_prior_role() {
        let (mut sup, _, _) = supervisor();
        sup.establish(&customer_token(NOW + 600)).unwrap();

        assert!(sup.establish("definitely.not.valid").is_err());
        assert_eq!(sup.current_role(), Some(Role::Customer));
        assert!(sup.idle_remaining().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_gap_forces_logout() {
        let (mut sup, storage, _) = supervisor();
        sup.establish(&customer_token(NOW + 3600)).unwrap();

        let start = Instant::now();
        assert_eq!(sup.wait_for_timeout().await, Route::Login);

        assert_eq!(start.elapsed(), INACTIVITY_TIMEOUT);
        assert_eq!(sup.state(), SessionState::Anonymous);
        assert_eq!(storage.peek(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_activity_for_121_seconds() {
        let (mut sup, storage, _) = supervisor();
        sup.establish(&customer_token(NOW + 3600)).unwrap();

        tokio::select! {
            _ = sup.wait_for_timeout() => {}
            _ = time::sleep(Duration::from_secs(121)) => panic!("session outlived the idle window"),
        }

        assert!(!sup.is_active());
        assert_eq!(storage.peek(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_within_window_keeps_session() {
        let (mut sup, _, _) = supervisor();
        sup.establish(&customer_token(NOW + 3600)).unwrap();

        for _ in 0..10 {
            tokio::select! {
                _ = sup.wait_for_timeout() => panic!("timed out despite activity"),
                _ = time::sleep(Duration::from_secs(100)) => {}
            }
            sup.activity(ActivityKind::PointerMove);
        }

        assert_eq!(sup.state(), SessionState::Active(Role::Customer));
        assert_eq!(sup.idle_remaining(), Some(INACTIVITY_TIMEOUT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_anonymous_never_times_out() {
        let (mut sup, _, _) = supervisor();
        tokio::select! {
            _ = sup.wait_for_timeout() => panic!("anonymous session timed out"),
            _ = time::sleep(Duration::from_secs(3600)) => {}
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_cancels_timer() {
        let (mut sup, storage, _) = supervisor();
        sup.establish(&customer_token(NOW + 3600)).unwrap();

        assert_eq!(sup.logout(), Route::Login);
        assert_eq!(sup.idle_remaining(), None);
        assert_eq!(storage.peek(), None);

        tokio::select! {
            _ = sup.wait_for_timeout() => panic!("cancelled timer fired"),
            _ = time::sleep(Duration::from_secs(300)) => {}
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_login_replaces_countdown() {
        let (mut sup, _, _) = supervisor();
        sup.establish(&customer_token(NOW + 3600)).unwrap();
        time::advance(Duration::from_secs(90)).await;

        sup.establish(&manager_token(NOW + 3600)).unwrap();
        assert_eq!(sup.idle_remaining(), Some(INACTIVITY_TIMEOUT));
        assert_eq!(sup.state(), SessionState::Active(Role::BankManager));
    }

    #[tokio::test(start_paused = true)]
    async fn test_credential_expiring_mid_session() {
        let (mut sup, storage, clock) = supervisor();
        sup.establish(&customer_token(NOW + 30)).unwrap();

        clock.advance(31);
        assert_eq!(sup.bearer(), None);
        assert_eq!(sup.state(), SessionState::Anonymous);
        assert_eq!(sup.idle_remaining(), None);
        assert_eq!(storage.peek(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_restores_and_arms() {
        let storage = MemoryStorage::with_token(&customer_token(NOW + 600));
        let store = SessionStore::new(storage, ManualClock::at(NOW));
        let mut sup = SessionSupervisor::new(store);

        assert_eq!(sup.start(), SessionState::Active(Role::Customer));
        assert_eq!(sup.idle_remaining(), Some(INACTIVITY_TIMEOUT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_clears_session() {
        let (mut sup, storage, _) = supervisor();
        sup.establish(&manager_token(NOW + 600)).unwrap();

        assert_eq!(sup.reject(), Route::Login);
        assert!(!sup.is_active());
        assert_eq!(storage.peek(), None);
    }
}
