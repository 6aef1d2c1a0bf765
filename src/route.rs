//! Back-office routes and the guard that gates them.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page except `/login` requires a resolved, authenticated session;
//! `/configuracion` additionally requires the `admin` role. A role mismatch
//! sends the user home rather than to login: they are authenticated, just
//! not authorized.

#[cfg(test)]
#[path = "route_test.rs"]
mod route_test;

use crate::net::types::Role;
use crate::state::session::Session;

/// Pages of the admin back-office.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Home,
    Bookings,
    Tours,
    Analytics,
    Settings,
}

impl Route {
    pub const ALL: [Self; 6] = [
        Self::Login,
        Self::Home,
        Self::Bookings,
        Self::Tours,
        Self::Analytics,
        Self::Settings,
    ];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Home => "/",
            Self::Bookings => "/reservas",
            Self::Tours => "/tours",
            Self::Analytics => "/analytics",
            Self::Settings => "/configuracion",
        }
    }

    /// Match a location (query string and fragment ignored) to a route.
    #[must_use]
    pub fn from_path(location: &str) -> Option<Self> {
        let path = location.split(['?', '#']).next().unwrap_or_default().trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    /// Guard protecting this route, or `None` for public pages.
    #[must_use]
    pub fn guard(self) -> Option<RouteGuard> {
        match self {
            Self::Login => None,
            Self::Settings => Some(RouteGuard::requiring(Role::Admin)),
            Self::Home | Self::Bookings | Self::Tours | Self::Analytics => {
                Some(RouteGuard::authenticated())
            }
        }
    }
}

/// Navigation sink for redirects and forced logouts.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session restore still running; show a neutral placeholder, do not redirect yet.
    Loading,
    Redirect(Route),
    Render,
}

/// Gate for a protected view, optionally requiring a role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteGuard {
    required_role: Option<Role>,
}

impl RouteGuard {
    #[must_use]
    pub fn authenticated() -> Self {
        Self { required_role: None }
    }

    #[must_use]
    pub fn requiring(role: Role) -> Self {
        Self { required_role: Some(role) }
    }

    #[must_use]
    pub fn required_role(&self) -> Option<&Role> {
        self.required_role.as_ref()
    }

    #[must_use]
    pub fn evaluate(&self, session: &Session) -> GuardDecision {
        if session.loading {
            return GuardDecision::Loading;
        }
        let Some(user) = &session.user else {
            return GuardDecision::Redirect(Route::Login);
        };
        match &self.required_role {
            Some(role) if *role != user.role => GuardDecision::Redirect(Route::Home),
            _ => GuardDecision::Render,
        }
    }
}

/// Decide what to show for `location`. Unknown locations go home.
#[must_use]
pub fn resolve(location: &str, session: &Session) -> GuardDecision {
    let Some(route) = Route::from_path(location) else {
        return GuardDecision::Redirect(Route::Home);
    };
    route.guard().map_or(GuardDecision::Render, |guard| guard.evaluate(session))
}

/// [`resolve`], then follow any redirect through `navigator`.
pub fn navigate(location: &str, session: &Session, navigator: &dyn Navigator) -> GuardDecision {
    let decision = resolve(location, session);
    if let GuardDecision::Redirect(target) = &decision {
        tracing::debug!(from = %location, to = target.path(), "guard redirect");
        navigator.navigate(*target);
    }
    decision
}
