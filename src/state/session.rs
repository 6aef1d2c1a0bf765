//! Auth-session state for the current back-office user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by route guards and user-aware views to coordinate login redirects
//! and identity-dependent rendering. [`SessionManager`] is the only writer;
//! everyone else reads a snapshot or subscribes to the `watch` channel.
//!
//! LIFECYCLE
//! =========
//! `loading = true` from construction until the one-time [`SessionManager::restore`]
//! check resolves, then `false` for good. `user` is present only while a
//! stored credential exists that the server has accepted.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell, watch};

use crate::error::{ApiError, ErrorCode};
use crate::net::auth_api::AuthApi;
use crate::net::http::UnauthorizedHandler;
use crate::net::types::{Ack, Registration, User};
use crate::route::{Navigator, Route};
use crate::store::CredentialStore;

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub loading: bool,
}

impl Session {
    /// State before the startup restore check has resolved.
    #[must_use]
    pub fn restoring() -> Self {
        Self { user: None, loading: true }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None, loading: false }
    }

    #[must_use]
    pub fn authenticated(user: User) -> Self {
        Self { user: Some(user), loading: false }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::restoring()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A login was submitted while another one was still in flight.
    #[error("a login request is already in progress")]
    LoginInProgress,
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Api(e) => e.error_code(),
            Self::LoginInProgress => "E_LOGIN_IN_PROGRESS",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.retryable(),
            Self::LoginInProgress => true,
        }
    }
}

// =============================================================================
// PUBLISHED STATE
// =============================================================================

/// Shared slot holding the published [`Session`].
///
/// Created before the HTTP client so the 401 observer and the manager can
/// share it; mutation is private to this module.
#[derive(Clone)]
pub struct SessionCell {
    tx: Arc<watch::Sender<Session>>,
}

impl SessionCell {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::restoring());
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Observer to hand to the HTTP client: ends the session and navigates to login on 401.
    #[must_use]
    pub fn expiry_handler(&self, navigator: Arc<dyn Navigator>) -> Arc<dyn UnauthorizedHandler> {
        Arc::new(SessionExpiry { cell: self.clone(), navigator })
    }

    fn set_user(&self, user: Option<User>) {
        self.tx.send_modify(|session| session.user = user);
    }

    fn resolve(&self, user: Option<User>) {
        self.tx.send_modify(|session| {
            session.user = user;
            session.loading = false;
        });
    }

    /// End `loading` without touching `user`.
    fn settle(&self) {
        self.tx.send_if_modified(|session| std::mem::replace(&mut session.loading, false));
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

struct SessionExpiry {
    cell: SessionCell,
    navigator: Arc<dyn Navigator>,
}

impl UnauthorizedHandler for SessionExpiry {
    fn on_unauthorized(&self) {
        // Leave `loading` alone: an in-flight restore resolves it itself.
        self.cell.set_user(None);
        self.navigator.navigate(Route::Login);
    }
}

// =============================================================================
// MANAGER
// =============================================================================

/// Owns the session: restore, login, logout.
pub struct SessionManager {
    api: AuthApi,
    store: Arc<dyn CredentialStore>,
    cell: SessionCell,
    restored: OnceCell<()>,
    login_gate: Mutex<()>,
}

impl SessionManager {
    /// `store` must be the same store the API's HTTP client reads.
    #[must_use]
    pub fn new(api: AuthApi, store: Arc<dyn CredentialStore>, cell: SessionCell) -> Self {
        Self { api, store, cell, restored: OnceCell::new(), login_gate: Mutex::new(()) }
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.cell.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.cell.subscribe()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.cell.snapshot().user
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.cell.snapshot().is_authenticated()
    }

    /// Resolve the startup state from the stored credential. Runs once.
    ///
    /// With a credential, asks the server who it belongs to; any failure
    /// clears the credential and resolves anonymous. Without one, resolves
    /// anonymous without touching the network. Concurrent callers wait for
    /// the same check. If every caller drops the future before it finishes,
    /// the next call starts the check over.
    pub async fn restore(&self) -> Session {
        self.restored.get_or_init(|| self.check_stored_credential()).await;
        self.session()
    }

    /// Exchange credentials for a token, store it, and become authenticated.
    ///
    /// On failure the session is left as it was and the error is returned for
    /// the caller to display. No retry is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::LoginInProgress`] if another login is in flight,
    /// or the API/storage error that stopped this one.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let Ok(_gate) = self.login_gate.try_lock() else {
            tracing::debug!("login rejected; another attempt is in flight");
            return Err(SessionError::LoginInProgress);
        };

        let response = self.api.login(email, password).await.inspect_err(|e| {
            tracing::info!(error = %e, code = e.error_code(), "login failed");
        })?;
        self.store.save(&response.token).map_err(ApiError::from)?;

        tracing::info!(user_id = %response.user.id, role = %response.user.role, "login succeeded");
        self.cell.resolve(Some(response.user.clone()));
        Ok(response.user)
    }

    /// End the session. Always succeeds locally.
    ///
    /// The remote call is best-effort; its failure is logged and ignored.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(
                error = %e,
                code = e.error_code(),
                "remote logout failed; clearing local session anyway"
            );
        }
        self.clear_credential();
        self.cell.set_user(None);
        tracing::info!("logged out");
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns the API error for the caller to display.
    pub async fn register(&self, registration: &Registration) -> Result<User, SessionError> {
        Ok(self.api.register(registration).await?)
    }

    /// Ask the server to send a password-reset email.
    ///
    /// # Errors
    ///
    /// Returns the API error for the caller to display.
    pub async fn request_password_reset(&self, email: &str) -> Result<Ack, SessionError> {
        Ok(self.api.request_password_reset(email).await?)
    }

    async fn check_stored_credential(&self) {
        let token = match self.store.read() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "credential store unreadable; continuing anonymous");
                self.cell.resolve(None);
                return;
            }
        };
        let Some(token) = token else {
            self.cell.resolve(None);
            return;
        };

        let user = match self.api.fetch_current_user().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "session restore failed");
                None
            }
        };

        // A login, logout or 401 that landed while the check was in flight owns the session.
        if !self.still_holds(&token) {
            tracing::debug!("credential replaced during restore; keeping current session");
            self.cell.settle();
            return;
        }
        match user {
            Some(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "session restored");
                self.cell.resolve(Some(user));
            }
            None => {
                self.clear_credential();
                self.cell.resolve(None);
            }
        }
    }

    fn still_holds(&self, token: &str) -> bool {
        matches!(self.store.read(), Ok(Some(current)) if current == token)
    }

    fn clear_credential(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "failed to clear stored credential");
        }
    }
}
