//! Routing table and role-based route guard

use fdportal_protocol::Role;
use std::fmt;

/// Every path the portal knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Register,
    FdCalculator,
    CustomerDashboard,
    FdInvest,
    ManagerDashboard,
}

const CUSTOMER_ONLY: &[Role] = &[Role::Customer];
const MANAGER_ONLY: &[Role] = &[Role::BankManager];

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Root,
        Route::Login,
        Route::Register,
        Route::FdCalculator,
        Route::CustomerDashboard,
        Route::FdInvest,
        Route::ManagerDashboard,
    ];

    /// Match a path, ignoring query string, fragment and a trailing slash
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default().trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::FdCalculator => "/fd-calculator",
            Route::CustomerDashboard => "/customer-dashboard",
            Route::FdInvest => "/fd-invest",
            Route::ManagerDashboard => "/manager-dashboard",
        }
    }

    /// Roles admitted to this route, `None` for public routes
    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Route::CustomerDashboard | Route::FdInvest => Some(CUSTOMER_ONLY),
            Route::ManagerDashboard => Some(MANAGER_ONLY),
            Route::Root | Route::Login | Route::Register | Route::FdCalculator => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Who is asking, as far as the guard is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Active(Role),
}

impl SessionState {
    pub fn role(&self) -> Option<Role> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Active(role) => Some(*role),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Admit,
    RedirectToLogin,
}

/// Admission check for a role-restricted route
pub fn decide(state: SessionState, allowed: &[Role]) -> GuardDecision {
    match state {
        SessionState::Active(role) if allowed.contains(&role) => GuardDecision::Admit,
        _ => GuardDecision::RedirectToLogin,
    }
}

/// Where `/` leads for a given role
pub fn landing_route(role: Option<Role>) -> Route {
    match role {
        Some(Role::BankManager) => Route::ManagerDashboard,
        Some(Role::Customer) => Route::CustomerDashboard,
        None => Route::Login,
    }
}

/// Result of resolving a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
}

/// Resolve `path` for `state`
pub fn resolve(path: &str, state: SessionState) -> Resolution {
    let Some(route) = Route::parse(path) else {
        return Resolution::Redirect(Route::Login);
    };

    match route {
        Route::Root => Resolution::Redirect(landing_route(state.role())),
        route => match route.allowed_roles() {
            None => Resolution::Render(route),
            Some(allowed) => match decide(state, allowed) {
                GuardDecision::Admit => Resolution::Render(route),
                GuardDecision::RedirectToLogin => Resolution::Redirect(Route::Login),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOMER: SessionState = SessionState::Active(Role::Customer);
    const MANAGER: SessionState = SessionState::Active(Role::BankManager);

    #[test]
    fn test_parse_known_paths() {
        for route in Route::ALL {
            assert_eq!(Route::parse(route.path()), Some(route));
        }
        assert_eq!(Route::parse("/login/"), Some(Route::Login));
        assert_eq!(Route::parse("/fd-invest?amount=1"), Some(Route::FdInvest));
        assert_eq!(Route::parse(""), Some(Route::Root));
        assert_eq!(Route::parse("/admin"), None);
        assert_eq!(Route::parse("login"), None);
    }

    #[test]
    fn test_guard_matrix() {
        let customer_dashboard = Route::CustomerDashboard.allowed_roles().unwrap();
        let manager_dashboard = Route::ManagerDashboard.allowed_roles().unwrap();

        assert_eq!(decide(CUSTOMER, customer_dashboard), GuardDecision::Admit);
        assert_eq!(decide(CUSTOMER, manager_dashboard), GuardDecision::RedirectToLogin);
        assert_eq!(decide(MANAGER, manager_dashboard), GuardDecision::Admit);
        assert_eq!(decide(MANAGER, customer_dashboard), GuardDecision::RedirectToLogin);
        assert_eq!(
            decide(SessionState::Anonymous, customer_dashboard),
            GuardDecision::RedirectToLogin
        );
        assert_eq!(
            decide(SessionState::Anonymous, manager_dashboard),
            GuardDecision::RedirectToLogin
        );
    }

    #[test]
    fn test_public_routes_render_for_everyone() {
        for state in [SessionState::Anonymous, CUSTOMER, MANAGER] {
            for route in [Route::Login, Route::Register, Route::FdCalculator] {
                assert_eq!(resolve(route.path(), state), Resolution::Render(route));
            }
        }
    }

    #[test]
    fn test_root_redirects_by_role() {
        assert_eq!(
            resolve("/", SessionState::Anonymous),
            Resolution::Redirect(Route::Login)
        );
        assert_eq!(
            resolve("/", CUSTOMER),
            Resolution::Redirect(Route::CustomerDashboard)
        );
        assert_eq!(
            resolve("/", MANAGER),
            Resolution::Redirect(Route::ManagerDashboard)
        );
    }

    #[test]
    fn test_unknown_path_redirects_to_login() {
        assert_eq!(resolve("/nowhere", MANAGER), Resolution::Redirect(Route::Login));
    }

    #[test]
    fn test_fd_invest_is_customer_only() {
        assert_eq!(resolve("/fd-invest", CUSTOMER), Resolution::Render(Route::FdInvest));
        assert_eq!(resolve("/fd-invest", MANAGER), Resolution::Redirect(Route::Login));
    }
}
