//! Authentication module for managing the employee session.
//!
//! This module provides:
//! - `Session`: the shared owner of persisted tokens, profile and auth state
//! - `SessionController`: sign-in, sign-out, onboarding and route guarding
//! - `Navigator`: the seam route redirects are issued through
//!
//! Sessions last until sign-out or until a token refresh is rejected.

pub mod controller;
pub mod guard;
pub mod session;

pub use controller::{SessionController, SessionError};
pub use guard::{redirect_for, NavigationState, Navigator, Route, RouteGroup};
pub use session::{
    AuthState, Session, SessionData, ACCESS_TOKEN_KEY, PROFILE_KEY, REFRESH_TOKEN_KEY,
};
