use std::sync::Arc;

use tracing::{debug, info, warn};

use super::account::{Account, Credentials};
use super::session::Session;
use super::session_store::SessionStore;
use crate::api::contract::LoginRequest;
use crate::api::AuthApi;
use crate::error::{AppError, AppResult};
use crate::token_prefix;

/// Login and logout on top of the session store.
#[derive(Clone)]
pub struct AuthFlow {
    api: Arc<dyn AuthApi>,
    store: Arc<SessionStore>,
}

impl AuthFlow {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<SessionStore>) -> Self { Self { api, store } }

    pub fn store(&self) -> &Arc<SessionStore> { &self.store }

    /// Exchange credentials for a session. Missing fields fail with `Validation` before
    /// anything is sent; every later failure reads as `InvalidCredentials`.
    ///
    /// The login form validates too. This check runs again here so callers that skip the
    /// form never put an empty request on the wire.
    pub async fn login(&self, creds: &Credentials) -> AppResult<Session> {
        creds.validate()?;
        self.store.begin_loading();
        match self.try_login(creds).await {
            Ok(s) => Ok(s),
            Err(e) => {
                warn!(user_type = %creds.user_type, "login failed: {}", e);
                self.store.end_loading();
                Err(AppError::InvalidCredentials)
            }
        }
    }

    async fn try_login(&self, creds: &Credentials) -> AppResult<Session> {
        let resp = self.api.login(&LoginRequest::from(creds)).await?;
        let account = account_from_login(resp.user, creds);
        account.check_invariants()?;
        self.store.set_refresh_token(&resp.refresh_token)?;
        let session = self.store.commit(account, resp.token)?;
        info!(role = %creds.user_type, unit = %creds.unit_id, "login ok");
        Ok(session)
    }

    /// Sign out. Local state goes first and unconditionally; the backend is told on a
    /// detached task whose result is only logged.
    pub fn logout(&self) {
        let token = self.store.token();
        self.store.clear();
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("logout: no runtime, backend not notified");
            return;
        };
        let api = self.api.clone();
        handle.spawn(async move {
            let prefix = token.as_deref().map(token_prefix).unwrap_or("-").to_string();
            match api.logout(token).await {
                Ok(r) => debug!(token = %prefix, success = r.success, "logout acknowledged"),
                Err(e) => warn!(token = %prefix, "logout notification failed: {}", e),
            }
        });
    }
}

/// The declared user type wins over whatever role the backend echoes; students get
/// their identifier as `rm` when the response left it out.
fn account_from_login(mut user: Account, creds: &Credentials) -> Account {
    user.role = creds.user_type;
    if user.is_student() && user.rm.is_none() {
        user.rm = Some(creds.identifier.clone());
    }
    user.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::api::contract::{LoginResponse, LogoutResponse};
    use crate::identity::account::AccountStatus;
    use crate::identity::{Role, AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
    use crate::storage::{LocalStore, MemoryStore};

    struct StubApi {
        fail: bool,
        logouts: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl AuthApi for StubApi {
        async fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
            if self.fail { return Err(AppError::Network("connection refused".into())); }
            Ok(LoginResponse {
                token: "tok-1".into(),
                refresh_token: "ref-1".into(),
                expires_in: 3600,
                user: Account {
                    id: "STU000001".into(),
                    name: "Ana Silva".into(),
                    email: format!("{}@escola.edu.br", req.identifier),
                    // backend echoes a different role on purpose
                    role: Role::Teacher,
                    unit_id: req.unit_id.clone(),
                    unit_name: "Escola Estadual Central".into(),
                    avatar: None,
                    rm: None,
                    course: Some("3º Ano - Ensino Médio".into()),
                    status: AccountStatus::Active,
                    registration_date: None,
                    biometric_id: None,
                },
            })
        }

        async fn logout(&self, token: Option<String>) -> AppResult<LogoutResponse> {
            self.logouts.lock().push(token);
            Ok(LogoutResponse { success: true })
        }
    }

    fn flow(fail: bool) -> (Arc<MemoryStore>, Arc<StubApi>, AuthFlow) {
        let kv = Arc::new(MemoryStore::new());
        let store = Arc::new(SessionStore::new(kv.clone()));
        store.restore();
        let api = Arc::new(StubApi { fail, logouts: Mutex::new(Vec::new()) });
        (kv, api.clone(), AuthFlow::new(api, store))
    }

    #[tokio::test]
    async fn login_forces_declared_role_and_fills_rm() {
        let (kv, _api, f) = flow(false);
        let s = f.login(&Credentials::new("123456", "x", "001", Role::Student)).await.unwrap();
        let u = s.user().unwrap();
        assert_eq!(u.role, Role::Student);
        assert_eq!(u.rm.as_deref(), Some("123456"));
        assert!(s.is_authenticated());
        assert!(!s.is_loading());
        assert!(kv.contains(AUTH_TOKEN_KEY).unwrap());
        assert!(kv.contains(USER_DATA_KEY).unwrap());
        assert_eq!(kv.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("ref-1"));
    }

    #[tokio::test]
    async fn login_strips_student_fields_for_staff() {
        let (_kv, _api, f) = flow(false);
        let s = f.login(&Credentials::new("prof01", "x", "002", Role::Teacher)).await.unwrap();
        let u = s.user().unwrap();
        assert_eq!(u.rm, None);
        assert_eq!(u.course, None);
    }

    #[tokio::test]
    async fn any_failure_is_invalid_credentials() {
        let (kv, _api, f) = flow(true);
        let r = f.login(&Credentials::new("123456", "x", "001", Role::Student)).await;
        assert_eq!(r, Err(AppError::InvalidCredentials));
        assert!(kv.is_empty());
        let cur = f.store().current();
        assert!(!cur.is_loading());
        assert!(!cur.is_authenticated());
    }

    #[tokio::test]
    async fn missing_fields_never_reach_the_backend() {
        let (_kv, _api, f) = flow(false);
        let r = f.login(&Credentials::new("", "x", "001", Role::Student)).await;
        assert!(matches!(r, Err(AppError::Validation(_))));
        assert!(!f.store().current().is_loading());
    }

    #[tokio::test]
    async fn logout_clears_then_notifies() {
        let (kv, api, f) = flow(false);
        f.login(&Credentials::new("123456", "x", "001", Role::Student)).await.unwrap();
        f.logout();
        assert!(kv.is_empty());
        assert_eq!(f.store().current(), Session::empty());
        for _ in 0..50 {
            if !api.logouts.lock().is_empty() { break; }
            tokio::task::yield_now().await;
        }
        assert_eq!(api.logouts.lock().as_slice(), &[Some("tok-1".to_string())]);
    }
}
