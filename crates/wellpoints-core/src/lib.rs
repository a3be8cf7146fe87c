//! Core library for the wellpoints employee rewards client.
//!
//! Provides the authenticated API client (bearer tokens with transparent
//! refresh), the session controller with route guarding, secure token
//! storage, configuration and the domain models shared by front ends.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use auth::{AuthState, Navigator, Route, RouteGroup, Session, SessionController, SessionError};
pub use config::Config;
pub use storage::{KeyringStore, MemoryStore, SecureStore};
