//! Auth endpoints: login, logout, current user, register, password reset.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns the decoded body or the HTTP client's error unchanged.
//! A 401 from any of these has already cleared the stored credential.

#[cfg(test)]
#[path = "auth_api_test.rs"]
mod auth_api_test;

use super::http::HttpClient;
use super::types::{Ack, LoginRequest, LoginResponse, PasswordResetRequest, Registration, User};
use crate::error::{ApiError, DecodeError};

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const CURRENT_USER_PATH: &str = "/auth/me";
pub const REGISTER_PATH: &str = "/auth/register";
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// `POST /auth/login`. Sent without any stored credential.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or a body
    /// without a usable token and user.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .http
            .post(LOGIN_PATH)
            .anonymous()
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let login: LoginResponse = response.decode()?;
        if login.token.trim().is_empty() {
            return Err(DecodeError::new(LOGIN_PATH, "empty token").into());
        }
        Ok(login)
    }

    /// `POST /auth/logout`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-2xx status.
    pub async fn logout(&self) -> Result<Ack, ApiError> {
        let response = self.http.post(LOGOUT_PATH).send().await?;
        Ok(response.ack()?)
    }

    /// `GET /auth/me`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or a body that is not a user.
    pub async fn fetch_current_user(&self) -> Result<User, ApiError> {
        let response = self.http.get(CURRENT_USER_PATH).send().await?;
        Ok(response.decode()?)
    }

    /// `POST /auth/register`. Sent without any stored credential.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or a body that is not a user.
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let response = self.http.post(REGISTER_PATH).anonymous().json(registration).send().await?;
        Ok(response.decode()?)
    }

    /// `POST /auth/reset-password`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-2xx status.
    pub async fn request_password_reset(&self, email: &str) -> Result<Ack, ApiError> {
        let response = self
            .http
            .post(RESET_PASSWORD_PATH)
            .json(&PasswordResetRequest { email })
            .send()
            .await?;
        Ok(response.ack()?)
    }
}
