//! REST API client module for the rewards backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! backend: login, token refresh, onboarding, points ledger, partner
//! catalog and check-ins.
//!
//! The API uses bearer token authentication. Expired access tokens are
//! refreshed transparently on 401.

pub mod client;
pub mod error;
mod onboarding;
mod rewards;

pub use client::{ApiClient, ApiRequest, Credentials, LoginResponse, DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS};
pub use error::{ApiError, ErrorKind};
