use std::sync::{Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError};

use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::models::UserProfile;
use crate::storage::{SecureStore, StoreError};

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "user_token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Storage key for the serialized profile JSON
pub const PROFILE_KEY: &str = "user_profile";

/// Every key owned by the session, in write order.
/// The profile goes first so a persisted access token always has one.
const SESSION_KEYS: [&str; 3] = [PROFILE_KEY, REFRESH_TOKEN_KEY, ACCESS_TOKEN_KEY];

#[derive(Clone, PartialEq, Eq)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub profile: UserProfile,
}

impl std::fmt::Debug for SessionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionData")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("profile", &self.profile)
            .finish()
    }
}

/// Authentication state machine.
///
/// `Unknown` until storage has been read, then `Unauthenticated`,
/// `Authenticating` while a sign-in is in flight, and `Authenticated`
/// with the in-memory profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unknown,
    Unauthenticated,
    Authenticating,
    Authenticated(UserProfile),
}

impl AuthState {
    /// Protected routes must not render while loading
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Unknown | AuthState::Authenticating)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            AuthState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthState::Unknown => "unknown",
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated(_) => "authenticated",
        }
    }
}

/// The single owner of session state.
///
/// Shared by `Arc` between the API client (which reads the access token,
/// rotates tokens after a refresh and expires the session when a refresh
/// fails) and the controller (which drives sign-in and sign-out). All
/// writes to the persisted session keys go through here.
///
/// Every sign-in and every clear starts a new generation. A refresh
/// remembers the generation it started in and may only write tokens or
/// expire the session while that generation is still current.
pub struct Session {
    store: Arc<dyn SecureStore>,
    state: watch::Sender<AuthState>,
    refresh_lock: Mutex<()>,
    generation: StdMutex<u64>,
}

impl Session {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        let (state, _) = watch::channel(AuthState::Unknown);
        Self {
            store,
            state,
            refresh_lock: Mutex::new(()),
            generation: StdMutex::new(0),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state transition
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub(crate) fn set_state(&self, next: AuthState) {
        let previous = self.state.send_replace(next);
        debug!(from = previous.name(), to = self.state.borrow().name(), "Auth state changed");
    }

    /// Read the persisted session.
    ///
    /// A token without a readable profile breaks the session invariant;
    /// the leftovers are cleared and `None` is returned.
    pub fn load(&self) -> Result<Option<SessionData>, StoreError> {
        let access_token = self.store.get(ACCESS_TOKEN_KEY)?;
        let profile_json = self.store.get(PROFILE_KEY)?;

        let (access_token, profile_json) = match (access_token, profile_json) {
            (Some(token), Some(json)) => (token, json),
            (None, None) => return Ok(None),
            _ => {
                warn!("Incomplete session in storage, clearing");
                self.clear()?;
                return Ok(None);
            }
        };

        let profile: UserProfile = match serde_json::from_str(&profile_json) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Stored profile is unreadable, clearing session");
                self.clear()?;
                return Ok(None);
            }
        };

        Ok(Some(SessionData {
            access_token,
            refresh_token: self.store.get(REFRESH_TOKEN_KEY)?,
            profile,
        }))
    }

    /// Generation of the stored session, bumped by `persist` and `clear`
    pub(crate) fn generation(&self) -> u64 {
        *self.lock_generation()
    }

    /// Persisted access token, read fresh on every call
    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Write a whole session. All keys or none: on a failed write every
    /// session key is removed again before the error is returned.
    pub(crate) fn persist(&self, data: &SessionData) -> Result<(), StoreError> {
        let profile_json = serde_json::to_string(&data.profile).map_err(|e| StoreError::Write {
            key: PROFILE_KEY.to_string(),
            reason: e.to_string(),
        })?;

        let mut generation = self.lock_generation();
        *generation += 1;

        let result = self
            .store
            .set(PROFILE_KEY, &profile_json)
            .and_then(|()| match data.refresh_token {
                Some(ref refresh) => self.store.set(REFRESH_TOKEN_KEY, refresh),
                None => self.store.delete(REFRESH_TOKEN_KEY),
            })
            .and_then(|()| self.store.set(ACCESS_TOKEN_KEY, &data.access_token));

        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session, rolling back");
            if let Err(rollback) = self.delete_all() {
                warn!(error = %rollback, "Rollback after failed persist also failed");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Store tokens minted by the refresh endpoint.
    ///
    /// Nothing is written and `false` is returned when the session was
    /// signed out or replaced since `generation`. The refresh token is only
    /// replaced when the backend rotated it.
    pub(crate) fn rotate_tokens(
        &self,
        generation: u64,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<bool, StoreError> {
        let current = self.lock_generation();
        if *current != generation {
            debug!(started = generation, current = *current, "Session changed during refresh, dropping tokens");
            return Ok(false);
        }
        if let Some(refresh) = refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh)?;
        }
        self.store.set(ACCESS_TOKEN_KEY, access_token)?;
        debug!(rotated_refresh = refresh_token.is_some(), "Stored refreshed tokens");
        Ok(true)
    }

    /// Overwrite the stored profile, leaving tokens untouched
    pub(crate) fn replace_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile).map_err(|e| StoreError::Write {
            key: PROFILE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(PROFILE_KEY, &json)
    }

    /// Remove every session key. Attempts all deletes, returns the first failure.
    pub(crate) fn clear(&self) -> Result<(), StoreError> {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.delete_all()
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        let mut first_error = None;
        // Access token first so a partial clear never leaves it without a profile
        for key in SESSION_KEYS.iter().rev() {
            if let Err(e) = self.store.delete(key) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Irrecoverable auth failure: drop persisted state and go unauthenticated.
    ///
    /// Only applies to the session of `generation`. A session that was
    /// already signed out or replaced by a new sign-in is left alone.
    pub(crate) fn expire(&self, generation: u64) {
        let mut current = self.lock_generation();
        if *current != generation {
            debug!(started = generation, current = *current, "Session already replaced, not expiring");
            return;
        }
        *current += 1;
        info!("Session expired, clearing stored credentials");
        if let Err(e) = self.delete_all() {
            warn!(error = %e, "Failed to clear expired session");
        }
        drop(current);
        self.set_state(AuthState::Unauthenticated);
    }

    /// Held for the duration of a token refresh
    pub(crate) async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }

    fn lock_generation(&self) -> StdMutexGuard<'_, u64> {
        self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn profile() -> UserProfile {
        UserProfile {
            employee_id: "42".to_string(),
            name: "Ana Lima".to_string(),
            registration: "12345".to_string(),
            department: "Financeiro".to_string(),
        }
    }

    fn session_data() -> SessionData {
        SessionData {
            access_token: "A".to_string(),
            refresh_token: Some("R".to_string()),
            profile: profile(),
        }
    }

    /// Store that fails writes to one key
    struct FailingStore {
        inner: MemoryStore,
        fail_on: &'static str,
    }

    impl SecureStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if key == self.fail_on {
                return Err(StoreError::Write {
                    key: key.to_string(),
                    reason: "disk full".to_string(),
                });
            }
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key)
        }
    }

    #[test]
    fn test_persist_then_load() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session.persist(&session_data()).unwrap();

        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("A"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("R"));
        assert_eq!(session.load().unwrap(), Some(session_data()));
    }

    #[test]
    fn test_persist_rolls_back_on_failed_write() {
        let store = Arc::new(FailingStore {
            inner: MemoryStore::new(),
            fail_on: ACCESS_TOKEN_KEY,
        });
        let session = Session::new(store.clone());

        assert!(session.persist(&session_data()).is_err());
        assert!(store.inner.is_empty());
    }

    #[test]
    fn test_load_empty_store() {
        let session = Session::new(Arc::new(MemoryStore::new()));
        assert_eq!(session.load().unwrap(), None);
    }

    #[test]
    fn test_load_token_without_profile_clears() {
        let store = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "A").unwrap();
        store.set(REFRESH_TOKEN_KEY, "R").unwrap();
        let session = Session::new(store.clone());

        assert_eq!(session.load().unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_profile_clears() {
        let store = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "A").unwrap();
        store.set(PROFILE_KEY, "{not json").unwrap();
        let session = Session::new(store.clone());

        assert_eq!(session.load().unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_rotate_keeps_refresh_token_when_not_returned() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session.persist(&session_data()).unwrap();

        let generation = session.generation();

        assert!(session.rotate_tokens(generation, "B", None).unwrap());
        assert_eq!(session.access_token().unwrap().as_deref(), Some("B"));
        assert_eq!(session.refresh_token().unwrap().as_deref(), Some("R"));

        assert!(session.rotate_tokens(generation, "C", Some("R2")).unwrap());
        assert_eq!(session.refresh_token().unwrap().as_deref(), Some("R2"));
    }

    #[test]
    fn test_rotate_after_clear_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session.persist(&session_data()).unwrap();
        let generation = session.generation();

        session.clear().unwrap();

        assert!(!session.rotate_tokens(generation, "B", Some("R2")).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_rotate_after_new_sign_in_keeps_new_tokens() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session.persist(&session_data()).unwrap();
        let generation = session.generation();

        let newer = SessionData {
            access_token: "N".to_string(),
            refresh_token: Some("RN".to_string()),
            profile: profile(),
        };
        session.persist(&newer).unwrap();

        assert!(!session.rotate_tokens(generation, "B", Some("R2")).unwrap());
        assert_eq!(session.load().unwrap(), Some(newer));
    }

    #[test]
    fn test_expire_clears_and_notifies() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session.persist(&session_data()).unwrap();
        session.set_state(AuthState::Authenticated(profile()));
        let rx = session.subscribe();

        session.expire(session.generation());

        assert!(store.is_empty());
        assert_eq!(*rx.borrow(), AuthState::Unauthenticated);
    }

    #[test]
    fn test_expire_ignores_replaced_session() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session.persist(&session_data()).unwrap();
        let stale = session.generation();

        session.persist(&session_data()).unwrap();
        session.set_state(AuthState::Authenticated(profile()));
        session.expire(stale);

        assert_eq!(session.load().unwrap(), Some(session_data()));
        assert!(session.state().is_authenticated());
    }

    #[test]
    fn test_auth_state_flags() {
        assert!(AuthState::Unknown.is_loading());
        assert!(AuthState::Authenticating.is_loading());
        assert!(!AuthState::Unauthenticated.is_loading());
        assert!(AuthState::Authenticated(profile()).is_authenticated());
        assert_eq!(AuthState::Authenticated(profile()).profile(), Some(&profile()));
    }

    #[test]
    fn test_session_data_debug_redacts_tokens() {
        let debug = format!("{:?}", session_data());
        assert!(!debug.contains("\"A\""));
        assert!(debug.contains("<redacted>"));
    }
}
