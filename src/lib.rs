//! Session, authorization and API-access client for the travel agency back-office.
//!
//! ARCHITECTURE
//! ============
//! Leaf first: the credential store holds the bearer token; the HTTP client
//! attaches it to every request and applies the 401 policy; the auth and
//! admin facades map operations to typed calls; the session manager owns
//! who is logged in; the route guard turns session state into render or
//! redirect decisions.
//!
//! [`Backoffice::connect`] wires those pieces together in the only order that
//! works: the session cell exists before the HTTP client so the client's 401
//! observer can end the session it belongs to.

pub mod config;
pub mod error;
pub mod net;
pub mod route;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_helpers;


use std::sync::Arc;

use config::ClientConfig;
use error::ApiError;
use net::admin_api::AdminApi;
use net::auth_api::AuthApi;
use net::http::HttpClient;
use route::{GuardDecision, Navigator};
use state::session::{SessionCell, SessionManager};
use store::CredentialStore;

/// Fully wired client: one store, one HTTP client, one session.
#[derive(Clone)]
pub struct Backoffice {
    session: Arc<SessionManager>,
    admin: AdminApi,
    navigator: Arc<dyn Navigator>,
}

impl Backoffice {
    /// Wire the stack for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(
        config: &ClientConfig,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let cell = SessionCell::new();
        let on_unauthorized = cell.expiry_handler(Arc::clone(&navigator));
        let http = HttpClient::new(config, Arc::clone(&store), on_unauthorized)?;
        let session = SessionManager::new(AuthApi::new(http.clone()), store, cell);

        tracing::debug!(base_url = http.base_url(), "back-office client ready");
        Ok(Self { session: Arc::new(session), admin: AdminApi::new(http), navigator })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    #[must_use]
    pub fn admin(&self) -> &AdminApi {
        &self.admin
    }

    /// Run the route guard for `location` against the current session,
    /// following any redirect through the navigator.
    pub fn open(&self, location: &str) -> GuardDecision {
        route::navigate(location, &self.session.session(), self.navigator.as_ref())
    }
}
