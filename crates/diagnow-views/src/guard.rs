//! Route guard.

use diagnow_core::session::{Session, SessionState};

use crate::routes::Route;

/// What to do with a requested route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect(Route),
    /// A login is in flight; show a spinner
    Pending,
}

/// Protected routes need an authenticated session, otherwise the user is
/// sent to the login screen.
pub fn guard(route: Route, session: &Session) -> GuardDecision {
    if !route.is_protected() {
        return GuardDecision::Render(route);
    }
    match session.state() {
        SessionState::Authenticated => GuardDecision::Render(route),
        SessionState::Authenticating => GuardDecision::Pending,
        SessionState::Unauthenticated => GuardDecision::Redirect(Route::Login),
    }
}

/// Parse a path and guard it in one step.
pub fn navigate(path: &str, session: &Session) -> GuardDecision {
    guard(Route::parse(path), session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes_always_render() {
        let session = Session::new();
        assert_eq!(navigate("/register", &session), GuardDecision::Render(Route::Register));
    }

    #[test]
    fn test_protected_route_redirects_to_login() {
        let session = Session::new();
        assert_eq!(
            navigate("/patients/p1", &session),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn test_pending_while_authenticating() {
        let mut session = Session::new();
        session.begin_login();
        assert_eq!(guard(Route::Dashboard, &session), GuardDecision::Pending);
    }

    #[test]
    fn test_unknown_path_renders_landing() {
        let session = Session::new();
        assert_eq!(navigate("/nowhere", &session), GuardDecision::Render(Route::Landing));
    }
}
