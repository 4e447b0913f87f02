//! Session lifecycle: who is signed in, and keeping their tokens fresh.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::{debug, info, instrument, warn};

use crate::error::AuthError;
use crate::token_store::TokenStore;
use crate::traits::{AuthApi, AuthResponse};
use crate::types::User;
use crate::{AccessToken, Credentials, Registration, Result};

/// Authentication state of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been checked yet.
    Unknown,
    /// The startup check is running.
    Loading,
    /// A user is signed in.
    Authenticated(User),
    /// No one is signed in.
    Anonymous,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// The single source of truth for the current user.
///
/// Built once at startup and handed to every consumer. It is the only
/// component that writes the [`TokenStore`] in response to authentication
/// events. Cheap to clone; clones share state.
///
/// # Concurrency
///
/// Every login, register and logout starts a new session epoch. A refresh
/// commits its result only if the epoch it started under is still current,
/// so a logout racing a refresh always ends with an empty store. Proactive
/// refreshes are coalesced: concurrent callers queue on one gate and reuse
/// the token the first of them obtained.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: Arc<dyn AuthApi>,
    store: TokenStore,
    state: RwLock<SessionState>,
    epoch: AtomicU64,
    pending: AtomicUsize,
    // Serializes the epoch check with the store write that depends on it
    commit: Mutex<()>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn AuthApi>, store: TokenStore) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api,
                store,
                state: RwLock::new(SessionState::Unknown),
                epoch: AtomicU64::new(0),
                pending: AtomicUsize::new(0),
                commit: Mutex::new(()),
                refresh_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> SessionState {
        self.read_state().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.read_state().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.read_state(), SessionState::Authenticated(_))
    }

    /// True while the startup check or a login/register/logout call runs.
    pub fn is_loading(&self) -> bool {
        matches!(*self.read_state(), SessionState::Loading)
            || self.inner.pending.load(Ordering::SeqCst) > 0
    }

    /// Returns the signed-in user or [`AuthError::NotAuthenticated`].
    pub fn require_authenticated(&self) -> Result<User> {
        self.user().ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.inner.store
    }

    // ========================================================================
    // Lifecycle Operations
    // ========================================================================

    /// Reconcile with the backend at startup.
    ///
    /// With a stored access token the server's record replaces the cached
    /// identity; if that query fails the store is cleared. Without a token
    /// a cached identity is adopted as-is. Errors are never surfaced.
    #[instrument(skip(self))]
    pub async fn check_auth(&self) -> SessionState {
        let epoch = self.current_epoch();
        self.set_state(SessionState::Loading);

        let next = if self.inner.store.access_token().is_some() {
            match self.fetch_current_user(epoch).await {
                Ok(user) => {
                    debug!(user = %user.username, "Stored session verified");
                    SessionState::Authenticated(user)
                }
                Err(e) => {
                    warn!(error = %e, "Stored session failed verification, signing out");
                    self.expire_if_current(epoch);
                    SessionState::Anonymous
                }
            }
        } else if let Some(user) = self.inner.store.user() {
            debug!(user = %user.username, "Adopting cached identity");
            SessionState::Authenticated(user)
        } else {
            SessionState::Anonymous
        };

        let _commit = self.lock_commit();
        if self.current_epoch() == epoch {
            self.set_state(next);
        }
        self.state()
    }

    /// Sign in with a username or email and password.
    ///
    /// On failure the state is left unchanged and the backend's message is
    /// returned as [`AuthError::Rejected`].
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        info!("Logging in");
        let _pending = PendingGuard::new(&self.inner.pending);

        let response = self.inner.api.login(credentials).await?;
        self.start_session(response)
    }

    /// Create an account and sign it in.
    #[instrument(skip(self, registration), fields(username = %registration.username()))]
    pub async fn register(&self, registration: &Registration) -> Result<User> {
        info!("Registering account");
        let _pending = PendingGuard::new(&self.inner.pending);

        let response = self.inner.api.register(registration).await?;
        self.start_session(response)
    }

    /// Sign out.
    ///
    /// The server is asked to invalidate the refresh token on a best-effort
    /// basis; local state is cleared no matter how that goes.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        info!("Logging out");
        let _pending = PendingGuard::new(&self.inner.pending);

        // Any refresh still in flight now belongs to a dead session
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(refresh_token) = self.inner.store.refresh_token() {
            let access_token = self.inner.store.access_token();
            if let Err(e) = self
                .inner
                .api
                .logout(&refresh_token, access_token.as_ref())
                .await
            {
                warn!(error = %e, "Server-side logout failed, clearing local session anyway");
            }
        }

        let _commit = self.lock_commit();
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.set_state(SessionState::Anonymous);
        debug!("Logged out");
    }

    /// Exchange the stored refresh token for a new credential pair.
    ///
    /// On failure the store is cleared, the state becomes anonymous and the
    /// error is returned so the caller can send the user to sign in.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<User> {
        let _gate = self.inner.refresh_gate.lock().await;
        let (_, user) = self.refresh_locked().await?;
        Ok(user)
    }

    /// Returns an access token fit for an outgoing request.
    ///
    /// If the stored access token has expired and a refresh token is stored,
    /// the pair is renewed first. `Ok(None)` means there is no token and the
    /// request should go out unauthenticated. A failed renewal clears the
    /// store and yields [`AuthError::SessionExpired`].
    #[instrument(skip(self))]
    pub async fn valid_access_token(&self) -> Result<Option<AccessToken>> {
        let Some(access_token) = self.inner.store.access_token() else {
            return Ok(None);
        };
        if !access_token.is_expired() || self.inner.store.refresh_token().is_none() {
            return Ok(Some(access_token));
        }

        let _gate = self.inner.refresh_gate.lock().await;

        // Another caller may have renewed (or lost) the session while we waited
        match self.inner.store.access_token() {
            None => return Err(AuthError::SessionExpired.into()),
            Some(token) if !token.is_expired() => {
                debug!("Access token already renewed");
                return Ok(Some(token));
            }
            Some(token) if self.inner.store.refresh_token().is_none() => {
                return Ok(Some(token));
            }
            Some(_) => {}
        }

        debug!("Access token expired, refreshing before request");
        match self.refresh_locked().await {
            Ok((token, _)) => Ok(Some(token)),
            Err(e) => {
                warn!(error = %e, "Proactive refresh failed");
                Err(AuthError::SessionExpired.into())
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// The cached identity is only replaced if the session that `epoch`
    /// names is still current.
    async fn fetch_current_user(&self, epoch: u64) -> Result<User> {
        let access_token = self
            .valid_access_token()
            .await?
            .ok_or(AuthError::SessionExpired)?;

        let user = self.inner.api.current_user(&access_token).await?;

        let _commit = self.lock_commit();
        if self.current_epoch() != epoch {
            debug!("Session changed during identity check, not caching");
            return Ok(user);
        }
        if let Err(e) = self.inner.store.set_user(&user) {
            warn!(error = %e, "Failed to cache current user");
        }
        Ok(user)
    }

    /// Must be called with the refresh gate held.
    async fn refresh_locked(&self) -> Result<(AccessToken, User)> {
        let epoch = self.current_epoch();

        let Some(refresh_token) = self.inner.store.refresh_token() else {
            self.expire_if_current(epoch);
            return Err(AuthError::RefreshTokenMissing.into());
        };

        info!("Refreshing session");
        let response = match self.inner.api.refresh(&refresh_token).await {
            Ok(response) => response,
            Err(e) => {
                self.expire_if_current(epoch);
                return Err(e);
            }
        };

        let _commit = self.lock_commit();
        if self.current_epoch() != epoch {
            debug!("Session ended during refresh, discarding new tokens");
            return Err(AuthError::SessionExpired.into());
        }

        if let Err(e) = self
            .inner
            .store
            .save_session(&response.credentials, &response.user)
        {
            self.clear_store();
            self.set_state(SessionState::Anonymous);
            return Err(e);
        }
        self.set_state(SessionState::Authenticated(response.user.clone()));

        debug!("Session refreshed successfully");
        Ok((response.credentials.access_token, response.user))
    }

    fn start_session(&self, response: AuthResponse) -> Result<User> {
        let _commit = self.lock_commit();
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self
            .inner
            .store
            .save_session(&response.credentials, &response.user)
        {
            self.clear_store();
            return Err(e);
        }
        self.set_state(SessionState::Authenticated(response.user.clone()));

        debug!(user = %response.user.username, "Session started");
        Ok(response.user)
    }

    /// Clear the store and go anonymous, unless a newer session replaced
    /// the one that failed.
    fn expire_if_current(&self, epoch: u64) {
        let _commit = self.lock_commit();
        if self.current_epoch() == epoch {
            self.clear_store();
            self.set_state(SessionState::Anonymous);
        }
    }

    fn clear_store(&self) {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
    }

    fn current_epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    fn lock_commit(&self) -> MutexGuard<'_, ()> {
        self.inner
            .commit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: SessionState) {
        let mut guard = self
            .inner
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = state;
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.read_state())
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

/// Marks a user-initiated operation as in flight for [`SessionManager::is_loading`].
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Notify;

    use super::*;
    use crate::error::Error;
    use crate::token_store::test_support::user;
    use crate::tokens::test_support::token_with_exp;
    use crate::{CredentialPair, RefreshToken};

    fn live_token(tag: &str) -> String {
        // Distinct per tag so tests can tell pairs apart
        format!("{}#{}", token_with_exp(Utc::now().timestamp() + 3600), tag)
    }

    fn expired_token() -> String {
        token_with_exp(Utc::now().timestamp() - 60)
    }

    #[derive(Default)]
    struct FakeApi {
        calls: StdMutex<Vec<&'static str>>,
        refresh_count: AtomicUsize,
        refresh_fails: AtomicBool,
        me_fails: AtomicBool,
        logout_fails: AtomicBool,
        hold_refresh: AtomicBool,
        refresh_entered: Notify,
        refresh_release: Notify,
        hold_me: AtomicBool,
        me_entered: Notify,
        me_release: Notify,
    }

    impl FakeApi {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn issue(&self, tag: &str, name: &str) -> AuthResponse {
            AuthResponse {
                credentials: CredentialPair::new(live_token(tag), format!("refresh-{}", tag)),
                access_token_expires: None,
                refresh_token_expires: None,
                user: user(name),
            }
        }
    }

    #[async_trait]
    impl AuthApi for FakeApi {
        async fn register(&self, registration: &Registration) -> Result<AuthResponse> {
            self.record("register");
            if registration.username() == "taken" {
                return Err(AuthError::rejected(Some("Username already exists".into())).into());
            }
            Ok(self.issue("registered", registration.username()))
        }

        async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
            self.record("login");
            if credentials.password() != "correct" {
                return Err(AuthError::rejected(Some("Invalid credentials".into())).into());
            }
            Ok(self.issue("login", credentials.identifier()))
        }

        async fn refresh(&self, _refresh_token: &RefreshToken) -> Result<AuthResponse> {
            self.record("refresh");
            let n = self.refresh_count.fetch_add(1, Ordering::SeqCst) + 1;
            if self.hold_refresh.load(Ordering::SeqCst) {
                self.refresh_entered.notify_one();
                self.refresh_release.notified().await;
            }
            if self.refresh_fails.load(Ordering::SeqCst) {
                return Err(AuthError::rejected(Some("Invalid refresh token".into())).into());
            }
            Ok(self.issue(&format!("refreshed-{}", n), "alice"))
        }

        async fn logout(
            &self,
            _refresh_token: &RefreshToken,
            _access_token: Option<&AccessToken>,
        ) -> Result<()> {
            self.record("logout");
            if self.logout_fails.load(Ordering::SeqCst) {
                return Err(crate::error::TransportError::Connection {
                    message: "connection refused".into(),
                }
                .into());
            }
            Ok(())
        }

        async fn current_user(&self, _access_token: &AccessToken) -> Result<User> {
            self.record("me");
            if self.hold_me.load(Ordering::SeqCst) {
                self.me_entered.notify_one();
                self.me_release.notified().await;
            }
            if self.me_fails.load(Ordering::SeqCst) {
                return Err(crate::error::ProtocolError::new(401, None).into());
            }
            let mut server_copy = user("alice");
            server_copy.email = "alice@server.example".to_string();
            Ok(server_copy)
        }
    }

    fn manager() -> (SessionManager, Arc<FakeApi>) {
        let api = Arc::new(FakeApi::default());
        let session = SessionManager::new(api.clone(), TokenStore::in_memory());
        (session, api)
    }

    fn seed(session: &SessionManager, access: &str) {
        session
            .token_store()
            .save_session(&CredentialPair::new(access, "refresh-seed"), &user("alice"))
            .unwrap();
    }

    #[tokio::test]
    async fn starts_unknown() {
        let (session, _) = manager();
        assert_eq!(session.state(), SessionState::Unknown);
        assert!(!session.is_authenticated());
        assert!(session.require_authenticated().is_err());
    }

    #[tokio::test]
    async fn check_auth_without_storage_is_anonymous() {
        let (session, api) = manager();

        let state = session.check_auth().await;

        assert_eq!(state, SessionState::Anonymous);
        assert!(session.user().is_none());
        assert!(!session.is_loading());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn check_auth_adopts_cached_identity_without_network() {
        let (session, api) = manager();
        session.token_store().set_user(&user("alice")).unwrap();

        let state = session.check_auth().await;

        assert_eq!(state, SessionState::Authenticated(user("alice")));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn check_auth_replaces_cache_with_server_record() {
        let (session, api) = manager();
        seed(&session, &live_token("seed"));

        let state = session.check_auth().await;

        let current = state.user().unwrap();
        assert_eq!(current.email, "alice@server.example");
        assert_eq!(
            session.token_store().user().unwrap().email,
            "alice@server.example"
        );
        assert_eq!(api.calls(), vec!["me"]);
    }

    #[tokio::test]
    async fn check_auth_failure_clears_store_silently() {
        let (session, api) = manager();
        api.me_fails.store(true, Ordering::SeqCst);
        seed(&session, &live_token("seed"));

        let state = session.check_auth().await;

        assert_eq!(state, SessionState::Anonymous);
        assert!(session.token_store().is_empty());
    }

    #[tokio::test]
    async fn check_auth_refreshes_expired_token_first() {
        let (session, api) = manager();
        seed(&session, &expired_token());

        let state = session.check_auth().await;

        assert!(matches!(state, SessionState::Authenticated(_)));
        assert_eq!(api.calls(), vec!["refresh", "me"]);
        assert_eq!(
            session.token_store().refresh_token().unwrap().as_str(),
            "refresh-refreshed-1"
        );
    }

    #[tokio::test]
    async fn login_persists_pair_and_identity() {
        let (session, _) = manager();

        let user = session
            .login(&Credentials::new("alice", "correct"))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert!(session.is_authenticated());
        let pair = session.token_store().credentials().unwrap();
        assert!(pair.access_token.as_str().ends_with("#login"));
        assert_eq!(pair.refresh_token.as_str(), "refresh-login");
        assert_eq!(session.token_store().user().unwrap().username, "alice");
    }

    #[tokio::test]
    async fn rejected_login_leaves_state_unchanged() {
        let (session, _) = manager();
        session.check_auth().await;

        let err = session
            .login(&Credentials::new("alice", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "authentication error: Invalid credentials");
        assert!(matches!(
            err,
            Error::Auth(AuthError::Rejected { ref message }) if message == "Invalid credentials"
        ));
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.token_store().is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn register_starts_session() {
        let (session, _) = manager();

        session
            .register(&Registration::new("bob", "bob@example.com", "pw"))
            .await
            .unwrap();

        assert_eq!(session.user().unwrap().username, "bob");
        assert_eq!(
            session.token_store().refresh_token().unwrap().as_str(),
            "refresh-registered"
        );
    }

    #[tokio::test]
    async fn rejected_register_surfaces_message() {
        let (session, _) = manager();
        let err = session
            .register(&Registration::new("taken", "t@example.com", "pw"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Username already exists"));
        assert!(session.token_store().is_empty());
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_call_fails() {
        let (session, api) = manager();
        api.logout_fails.store(true, Ordering::SeqCst);
        session
            .login(&Credentials::new("alice", "correct"))
            .await
            .unwrap();

        session.logout().await;

        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.token_store().is_empty());
        assert_eq!(api.calls(), vec!["login", "logout"]);
    }

    #[tokio::test]
    async fn logout_without_refresh_token_skips_server() {
        let (session, api) = manager();
        session.token_store().set_user(&user("alice")).unwrap();
        session.check_auth().await;

        session.logout().await;

        assert!(api.calls().is_empty());
        assert!(session.token_store().is_empty());
    }

    #[tokio::test]
    async fn explicit_refresh_replaces_pair() {
        let (session, _) = manager();
        session
            .login(&Credentials::new("alice", "correct"))
            .await
            .unwrap();

        session.refresh_token().await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(
            session.token_store().refresh_token().unwrap().as_str(),
            "refresh-refreshed-1"
        );
    }

    #[tokio::test]
    async fn failed_refresh_clears_and_reraises() {
        let (session, api) = manager();
        api.refresh_fails.store(true, Ordering::SeqCst);
        session
            .login(&Credentials::new("alice", "correct"))
            .await
            .unwrap();

        let err = session.refresh_token().await.unwrap_err();

        assert!(err.to_string().contains("Invalid refresh token"));
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.token_store().is_empty());
    }

    #[tokio::test]
    async fn refresh_without_token_is_an_error() {
        let (session, api) = manager();
        let err = session.refresh_token().await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::RefreshTokenMissing)));
        assert!(err.is_session_expired());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn valid_access_token_passes_live_token_through() {
        let (session, api) = manager();
        let live = live_token("seed");
        seed(&session, &live);

        let token = session.valid_access_token().await.unwrap().unwrap();

        assert_eq!(token.as_str(), live);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn valid_access_token_without_tokens_is_none() {
        let (session, _) = manager();
        assert!(session.valid_access_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_token_without_refresh_token_is_sent_as_is() {
        let (session, api) = manager();
        let stale = expired_token();
        session
            .token_store()
            .set_tokens(&CredentialPair::new(stale.clone(), ""))
            .unwrap();

        let token = session.valid_access_token().await.unwrap().unwrap();

        assert_eq!(token.as_str(), stale);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn proactive_refresh_failure_is_session_expired() {
        let (session, api) = manager();
        api.refresh_fails.store(true, Ordering::SeqCst);
        seed(&session, &expired_token());

        let err = session.valid_access_token().await.unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
        assert!(session.token_store().is_empty());
    }

    #[tokio::test]
    async fn concurrent_proactive_refreshes_are_coalesced() {
        let (session, api) = manager();
        api.hold_refresh.store(true, Ordering::SeqCst);
        seed(&session, &expired_token());

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.valid_access_token().await }
        });
        let second = tokio::spawn({
            let session = session.clone();
            async move { session.valid_access_token().await }
        });

        api.refresh_entered.notified().await;
        tokio::task::yield_now().await;
        api.refresh_release.notify_one();

        let a = first.await.unwrap().unwrap().unwrap();
        let b = second.await.unwrap().unwrap().unwrap();

        assert_eq!(a, b);
        assert_eq!(api.refresh_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn logout_wins_when_refresh_completes_last() {
        let (session, api) = manager();
        api.hold_refresh.store(true, Ordering::SeqCst);
        seed(&session, &expired_token());

        let refresh = tokio::spawn({
            let session = session.clone();
            async move { session.refresh_token().await }
        });

        api.refresh_entered.notified().await;
        session.logout().await;
        api.refresh_release.notify_one();

        let result = refresh.await.unwrap();

        assert!(result.unwrap_err().is_session_expired());
        assert!(session.token_store().is_empty());
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn logout_wins_when_refresh_completes_first() {
        let (session, api) = manager();
        seed(&session, &expired_token());

        session.refresh_token().await.unwrap();
        session.logout().await;

        assert!(session.token_store().is_empty());
        assert_eq!(session.state(), SessionState::Anonymous);
        assert_eq!(api.calls(), vec!["refresh", "logout"]);
    }

    #[tokio::test]
    async fn stale_refresh_failure_does_not_clear_new_login() {
        let (session, api) = manager();
        api.hold_refresh.store(true, Ordering::SeqCst);
        api.refresh_fails.store(true, Ordering::SeqCst);
        seed(&session, &expired_token());

        let refresh = tokio::spawn({
            let session = session.clone();
            async move { session.refresh_token().await }
        });

        api.refresh_entered.notified().await;
        session
            .login(&Credentials::new("alice", "correct"))
            .await
            .unwrap();
        api.refresh_release.notify_one();

        assert!(refresh.await.unwrap().is_err());
        assert_eq!(
            session.token_store().refresh_token().unwrap().as_str(),
            "refresh-login"
        );
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn logout_during_check_auth_stays_logged_out() {
        let (session, api) = manager();
        api.hold_me.store(true, Ordering::SeqCst);
        seed(&session, &live_token("seed"));

        let check = tokio::spawn({
            let session = session.clone();
            async move { session.check_auth().await }
        });

        api.me_entered.notified().await;
        session.logout().await;
        api.me_release.notify_one();

        assert_eq!(check.await.unwrap(), SessionState::Anonymous);
        assert!(session.token_store().is_empty());

        // A fresh manager over the same storage must not resurrect the user
        let restarted = SessionManager::new(api.clone(), session.token_store().clone());
        assert_eq!(restarted.check_auth().await, SessionState::Anonymous);
        assert_eq!(api.calls(), vec!["me", "logout"]);
    }

    #[tokio::test]
    async fn check_auth_does_not_overwrite_identity_of_concurrent_login() {
        let (session, api) = manager();
        api.hold_me.store(true, Ordering::SeqCst);
        seed(&session, &live_token("seed"));

        let check = tokio::spawn({
            let session = session.clone();
            async move { session.check_auth().await }
        });

        api.me_entered.notified().await;
        session
            .login(&Credentials::new("bob", "correct"))
            .await
            .unwrap();
        api.me_release.notify_one();
        check.await.unwrap();

        assert_eq!(session.token_store().user().unwrap().username, "bob");
        assert_eq!(session.user().unwrap().username, "bob");
    }
}
