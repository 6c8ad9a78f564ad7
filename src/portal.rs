//! Portal facade: the operations a user can perform
//!
//! Wires the API client to the session supervisor. Malformed, expired and
//! rejected credentials never escape as errors from here; they end the
//! session and come back as `Outcome::Redirect(Route::Login)`. Everything
//! else that fails is returned for display and leaves the session alone.

use std::time::Duration;

use fdportal_protocol::api::{
    CustomerDashboard, CustomerSummary, FdCalculation, FdRequest, Investment, LoginRequest,
    RegisterRequest,
};
use fdportal_protocol::Role;
use tracing::{debug, info, warn};

use crate::client::FdApi;
use crate::clock::Clock;
use crate::error::{FdError, Result};
use crate::inactivity::ActivityKind;
use crate::route::{landing_route, Resolution, Route, SessionState};
use crate::store::CredentialStorage;
use crate::supervisor::SessionSupervisor;

pub const INVALID_FD_INPUT: &str = "Please enter valid positive numbers for all fields.";

/// Result of an operation that may bounce the user to another route
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ready(T),
    Redirect(Route),
}

/// What a rendered route shows
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Login,
    Register,
    FdCalculator,
    FdInvest,
    CustomerDashboard(CustomerDashboard),
    ManagerDashboard(Vec<CustomerSummary>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub route: Route,
    pub view: View,
}

/// Snapshot for the status card
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub subject: Option<String>,
    pub expires_at: Option<i64>,
    pub idle_remaining: Option<Duration>,
}

pub struct Portal<A, S, C> {
    api: A,
    supervisor: SessionSupervisor<S, C>,
}

impl<A: FdApi, S: CredentialStorage, C: Clock> Portal<A, S, C> {
    pub fn new(api: A, supervisor: SessionSupervisor<S, C>) -> Self {
        Self { api, supervisor }
    }

    /// Pick up a persisted session, if one is still valid
    pub fn start(&mut self) -> SessionState {
        self.supervisor.start()
    }

    /// Log in and return the role's landing route
    ///
    /// A failed login leaves any current session as it was.
    pub async fn login(&mut self, username: &str, password: &str, role: Role) -> Result<Route> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            role,
        };

        let credential = self.api.login(&request).await?;
        let granted = self.supervisor.establish(&credential)?;
        if granted != role {
            debug!(requested = %role, %granted, "server granted a different role");
        }

        info!(username, role = %granted, "logged in");
        Ok(landing_route(Some(granted)))
    }

    /// Register an account; the next stop is the login view
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Route> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        };

        self.api.register(&request).await?;
        info!(username, %role, "registered");
        Ok(Route::Login)
    }

    pub fn logout(&mut self) -> Route {
        self.supervisor.logout()
    }

    /// Navigate to `path`, fetching whatever the view needs
    pub async fn open(&mut self, path: &str) -> Result<Outcome<Page>> {
        let route = match self.supervisor.navigate(path) {
            Resolution::Redirect(target) => return Ok(Outcome::Redirect(target)),
            Resolution::Render(route) => route,
        };

        let view = match route {
            Route::Login => View::Login,
            Route::Register => View::Register,
            Route::FdCalculator => View::FdCalculator,
            Route::FdInvest => View::FdInvest,
            Route::CustomerDashboard => {
                let Some(token) = self.supervisor.bearer() else {
                    return Ok(Outcome::Redirect(Route::Login));
                };
                let fetched = self.api.customer_dashboard(&token).await;
                match self.absorb(fetched)? {
                    Outcome::Ready(dashboard) => View::CustomerDashboard(dashboard),
                    Outcome::Redirect(target) => return Ok(Outcome::Redirect(target)),
                }
            }
            Route::ManagerDashboard => {
                let Some(token) = self.supervisor.bearer() else {
                    return Ok(Outcome::Redirect(Route::Login));
                };
                let fetched = self.api.manager_customers(&token).await;
                match self.absorb(fetched)? {
                    Outcome::Ready(customers) => View::ManagerDashboard(customers),
                    Outcome::Redirect(target) => return Ok(Outcome::Redirect(target)),
                }
            }
            // `/` always resolves to a redirect.
            Route::Root => return Ok(Outcome::Redirect(landing_route(self.current_role()))),
        };

        Ok(Outcome::Ready(Page { route, view }))
    }

    /// Ask the server for a maturity projection; open to everyone
    pub async fn calculate(&self, request: FdRequest) -> Result<FdCalculation> {
        validate_fd(&request)?;
        self.api.calculate(&request).await
    }

    /// Book a fixed deposit for the logged-in customer
    pub async fn invest(&mut self, request: FdRequest) -> Result<Outcome<Investment>> {
        if let Resolution::Redirect(target) = self.supervisor.navigate(Route::FdInvest.path()) {
            return Ok(Outcome::Redirect(target));
        }
        validate_fd(&request)?;

        let Some(token) = self.supervisor.bearer() else {
            return Ok(Outcome::Redirect(Route::Login));
        };
        let booked = self.api.invest(&token, &request).await;
        self.absorb(booked)
    }

    pub fn activity(&mut self, kind: ActivityKind) {
        self.supervisor.activity(kind);
    }

    /// Resolves when the idle window elapses; the session is already gone
    pub async fn wait_for_timeout(&mut self) -> Route {
        self.supervisor.wait_for_timeout().await
    }

    pub fn state(&self) -> SessionState {
        self.supervisor.state()
    }

    pub fn current_role(&self) -> Option<Role> {
        self.state().role()
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.supervisor.state();
        let claims = match state {
            SessionState::Active(_) => self.supervisor.store().claims(),
            SessionState::Anonymous => None,
        };

        SessionStatus {
            state,
            subject: claims.as_ref().and_then(|c| c.sub.clone()),
            expires_at: claims.as_ref().and_then(|c| c.exp),
            idle_remaining: self.supervisor.idle_remaining(),
        }
    }

    // Turns session-ending failures into a trip to the login view.
    fn absorb<T>(&mut self, result: Result<T>) -> Result<Outcome<T>> {
        match result {
            Ok(value) => Ok(Outcome::Ready(value)),
            Err(e) if e.ends_session() => {
                warn!(code = %e.code(), "credential refused, ending session");
                Ok(Outcome::Redirect(self.supervisor.reject()))
            }
            Err(e) => Err(e),
        }
    }
}

fn validate_fd(request: &FdRequest) -> Result<()> {
    if request.is_positive() {
        Ok(())
    } else {
        Err(FdError::validation(INVALID_FD_INPUT))
    }
}
