//! Client-side state owned by this crate.

pub mod session;
