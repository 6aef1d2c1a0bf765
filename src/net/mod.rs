//! Network layer: the HTTP client and the typed facades built on it.
//!
//! ARCHITECTURE
//! ============
//! `http` owns transport and the credential interceptors; `auth_api` and
//! `admin_api` map domain operations to fixed paths and decode typed bodies.
//! Facades never touch the credential store directly.

pub mod admin_api;
pub mod auth_api;
pub mod http;
pub mod types;
