//! Route guarding between the public and protected route groups.

use super::session::AuthState;

/// Top-level route groups the app is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    /// Login and first-access screens
    Public,
    /// Everything behind sign-in
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/(auth)/login",
            Route::Home => "/(tabs)",
        }
    }

    pub fn group(&self) -> RouteGroup {
        match self {
            Route::Login => RouteGroup::Public,
            Route::Home => RouteGroup::Protected,
        }
    }
}

/// Receives imperative "replace current route" commands.
/// The navigator owns the route table; the session only asks it to move.
pub trait Navigator: Send + Sync {
    fn replace(&self, route: Route);
}

/// Where the navigation framework currently is
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationState {
    /// Routes are mounted and redirects are safe
    pub ready: bool,
    /// Group of the current route. `None` until the first route is reported,
    /// which is treated as protected.
    pub group: Option<RouteGroup>,
}

/// Redirect required for the given auth state and navigation position.
///
/// Nothing happens while auth is loading or before navigation is ready.
pub fn redirect_for(state: &AuthState, nav: &NavigationState) -> Option<Route> {
    if state.is_loading() || !nav.ready {
        return None;
    }
    match (state.is_authenticated(), nav.group.unwrap_or(RouteGroup::Protected)) {
        (false, RouteGroup::Protected) => Some(Route::Login),
        (true, RouteGroup::Public) => Some(Route::Home),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;

    fn nav(group: RouteGroup) -> NavigationState {
        NavigationState {
            ready: true,
            group: Some(group),
        }
    }

    #[test]
    fn test_unauthenticated_in_protected_goes_to_login() {
        assert_eq!(
            redirect_for(&AuthState::Unauthenticated, &nav(RouteGroup::Protected)),
            Some(Route::Login)
        );
        assert_eq!(redirect_for(&AuthState::Unauthenticated, &nav(RouteGroup::Public)), None);
    }

    #[test]
    fn test_authenticated_in_public_goes_home() {
        let state = AuthState::Authenticated(UserProfile::placeholder());
        assert_eq!(redirect_for(&state, &nav(RouteGroup::Public)), Some(Route::Home));
        assert_eq!(redirect_for(&state, &nav(RouteGroup::Protected)), None);
    }

    #[test]
    fn test_no_redirect_while_loading() {
        assert_eq!(redirect_for(&AuthState::Unknown, &nav(RouteGroup::Protected)), None);
        assert_eq!(redirect_for(&AuthState::Authenticating, &nav(RouteGroup::Protected)), None);
    }

    #[test]
    fn test_no_redirect_before_navigation_ready() {
        let nav = NavigationState {
            ready: false,
            group: Some(RouteGroup::Protected),
        };
        assert_eq!(redirect_for(&AuthState::Unauthenticated, &nav), None);
    }

    #[test]
    fn test_unreported_route_is_protected() {
        let root = NavigationState {
            ready: true,
            group: None,
        };
        assert_eq!(redirect_for(&AuthState::Unauthenticated, &root), Some(Route::Login));
        assert_eq!(
            redirect_for(&AuthState::Authenticated(UserProfile::placeholder()), &root),
            None
        );
    }

    #[test]
    fn test_route_groups() {
        assert_eq!(Route::Login.group(), RouteGroup::Public);
        assert_eq!(Route::Home.group(), RouteGroup::Protected);
        assert_eq!(Route::Home.path(), "/(tabs)");
    }
}
