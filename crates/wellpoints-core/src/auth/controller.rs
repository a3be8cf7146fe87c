use std::sync::{Arc, Mutex, PoisonError, Weak};

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{
    OnboardingCandidate, OnboardingCheck, OnboardingCompletion, ProfileOverview, UserProfile,
};
use crate::storage::StoreError;

use super::guard::{redirect_for, NavigationState, Navigator, RouteGroup};
use super::session::{AuthState, Session, SessionData};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid registration number or password")]
    InvalidCredentials,

    #[error("Password and confirmation do not match")]
    PasswordMismatch,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Drives sign-in, sign-out and onboarding, and keeps the navigator in
/// the route group that matches the session.
pub struct SessionController {
    session: Arc<Session>,
    api: ApiClient,
    navigator: Arc<dyn Navigator>,
    nav: Mutex<NavigationState>,
}

impl SessionController {
    pub fn new(api: ApiClient, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            session: Arc::clone(api.session()),
            api,
            navigator,
            nav: Mutex::new(NavigationState::default()),
        }
    }

    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    pub fn is_loading(&self) -> bool {
        self.session.state().is_loading()
    }

    /// In-memory profile of the signed-in employee
    pub fn user(&self) -> Option<UserProfile> {
        self.session.state().profile().cloned()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Restore a persisted session. Only the first call reads storage.
    pub async fn initialize(&self) -> AuthState {
        if self.session.state() != AuthState::Unknown {
            return self.session.state();
        }

        let next = match self.session.load() {
            Ok(Some(data)) => {
                info!(registration = %data.profile.registration, "Restored stored session");
                AuthState::Authenticated(data.profile)
            }
            Ok(None) => {
                debug!("No stored session");
                AuthState::Unauthenticated
            }
            Err(e) => {
                warn!(error = %e, "Failed to load stored session");
                AuthState::Unauthenticated
            }
        };

        self.transition(next);
        self.session.state()
    }

    /// Sign in with registration number and password.
    ///
    /// Tokens and profile are persisted all together or not at all; on
    /// any failure the controller is left unauthenticated.
    pub async fn sign_in(&self, registration: &str, password: &str) -> Result<UserProfile, SessionError> {
        self.transition(AuthState::Authenticating);

        let login = match self.api.login(registration.trim(), password).await {
            Ok(login) => login,
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                self.transition(AuthState::Unauthenticated);
                return Err(match e {
                    ApiError::Unauthorized(_) | ApiError::NotFound(_) => SessionError::InvalidCredentials,
                    ApiError::Validation { status: 400 | 422, .. } => SessionError::InvalidCredentials,
                    other => SessionError::Api(other),
                });
            }
        };

        let data = SessionData {
            access_token: login.access_token,
            refresh_token: login.refresh_token,
            profile: login.profile,
        };
        if let Err(e) = self.session.persist(&data) {
            self.transition(AuthState::Unauthenticated);
            return Err(e.into());
        }

        info!(registration = %data.profile.registration, "Signed in");
        self.transition(AuthState::Authenticated(data.profile.clone()));
        Ok(data.profile)
    }

    /// Start a session from the access token produced by first-access
    /// registration. The registration endpoint returns no profile, so a
    /// placeholder is stored until the real one is fetched.
    pub async fn complete_onboarding_session(&self, access_token: &str) -> Result<(), SessionError> {
        let data = SessionData {
            access_token: access_token.to_string(),
            refresh_token: None,
            profile: UserProfile::placeholder(),
        };
        self.session.persist(&data)?;

        info!("Onboarding session started with placeholder profile");
        self.transition(AuthState::Authenticated(data.profile));
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let cleared = self.session.clear();
        self.transition(AuthState::Unauthenticated);
        cleared?;
        info!("Signed out");
        Ok(())
    }

    /// Fetch the current profile and replace the stored one wholesale.
    ///
    /// A result arriving after the session ended is returned but not stored.
    pub async fn reload_profile(&self) -> Result<ProfileOverview, SessionError> {
        let overview = self.api.fetch_profile_overview().await?;

        if self.session.state().is_authenticated() {
            self.session.replace_profile(&overview.profile)?;
            self.session
                .set_state(AuthState::Authenticated(overview.profile.clone()));
        } else {
            debug!("Session ended while profile was loading, discarding");
        }
        Ok(overview)
    }

    // =========================================================================
    // Onboarding
    // =========================================================================

    /// First step of first access: verify identity
    pub async fn check_onboarding(&self, check: &OnboardingCheck) -> Result<OnboardingCandidate, SessionError> {
        Ok(self.api.check_onboarding(check).await?)
    }

    /// Second step of first access: set the password and sign in
    pub async fn complete_registration(&self, completion: &OnboardingCompletion) -> Result<(), SessionError> {
        if !completion.passwords_match() {
            return Err(SessionError::PasswordMismatch);
        }
        let result = self.api.complete_onboarding(completion).await?;
        self.complete_onboarding_session(&result.access_token).await
    }

    // =========================================================================
    // Route Guarding
    // =========================================================================

    /// The navigation framework mounted its routes
    pub fn on_navigation_ready(&self) {
        self.lock_nav().ready = true;
        self.sync_routes();
    }

    /// The navigation framework moved to a route in `group`
    pub fn on_route_change(&self, group: RouteGroup) {
        self.lock_nav().group = Some(group);
        self.sync_routes();
    }

    /// Re-run route guarding whenever the session changes underneath the
    /// controller, e.g. when the API client expires it after a failed refresh.
    pub fn watch_session(self: &Arc<Self>) -> JoinHandle<()> {
        let controller: Weak<Self> = Arc::downgrade(self);
        let mut changes = self.session.subscribe();

        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                match controller.upgrade() {
                    Some(controller) => controller.sync_routes(),
                    None => break,
                }
            }
        })
    }

    fn transition(&self, next: AuthState) {
        self.session.set_state(next);
        self.sync_routes();
    }

    fn sync_routes(&self) {
        let state = self.session.state();
        let route = {
            let mut nav = self.lock_nav();
            let route = redirect_for(&state, &nav);
            if let Some(route) = route {
                nav.group = Some(route.group());
            }
            route
        };

        if let Some(route) = route {
            info!(route = route.path(), state = state.name(), "Redirecting");
            self.navigator.replace(route);
        }
    }

    fn lock_nav(&self) -> std::sync::MutexGuard<'_, NavigationState> {
        self.nav.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
