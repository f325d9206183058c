//! Application context: owns the session store, the API client and the auth flow for
//! the lifetime of one client process, and tracks the current location.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{AppError, AppResult, Notice};
use crate::identity::{AuthFlow, Credentials, Session, SessionStore};
use crate::routing::{self, View, LOGIN_PATH};
use crate::storage::{FileStore, LocalStore, MemoryStore};

pub struct AppContext {
    store: Arc<SessionStore>,
    api: ApiClient,
    auth: AuthFlow,
    location: RwLock<String>,
}

impl AppContext {
    /// Build the context on top of a key/value store and restore any persisted session.
    pub fn init(config: &ClientConfig, kv: Arc<dyn LocalStore>) -> AppResult<Self> {
        let store = Arc::new(SessionStore::new(kv));
        let api = ApiClient::new(config, store.clone())?;
        let auth = AuthFlow::new(Arc::new(api.clone()), store.clone());
        let restored = store.restore();
        info!(base = %api.base_url(), authenticated = restored.is_authenticated(), "app context ready");
        Ok(Self { store, api, auth, location: RwLock::new(LOGIN_PATH.to_string()) })
    }

    /// Context persisted at `config.storage_path`.
    pub fn with_file_store(config: &ClientConfig) -> AppResult<Self> {
        let kv: Arc<dyn LocalStore> = Arc::new(FileStore::open(&config.storage_path)?);
        Self::init(config, kv)
    }

    /// Context that forgets everything on exit.
    pub fn in_memory(config: &ClientConfig) -> AppResult<Self> {
        Self::init(config, Arc::new(MemoryStore::new()))
    }

    pub fn session(&self) -> Session { self.store.current() }
    pub fn store(&self) -> &Arc<SessionStore> { &self.store }
    pub fn api(&self) -> &ApiClient { &self.api }
    pub fn location(&self) -> String { self.location.read().clone() }

    /// Move to `path` and resolve it. Redirects are followed once, so the stored location
    /// is always where the user ended up.
    pub fn navigate(&self, path: &str) -> View {
        let session = self.store.current();
        let mut view = routing::resolve(&session, path);
        let mut at = path.to_string();
        if let View::Redirect(target) = view {
            at = target.to_string();
            view = routing::resolve(&session, target);
        }
        *self.location.write() = at;
        view
    }

    /// Resolve the current location again, e.g. after the session changed underneath.
    pub fn render(&self) -> View {
        let here = self.location();
        self.navigate(&here)
    }

    pub async fn login(&self, creds: &Credentials) -> AppResult<View> {
        self.auth.login(creds).await?;
        Ok(self.navigate(routing::DASHBOARD_PATH))
    }

    pub fn logout(&self) -> View {
        self.auth.logout();
        self.navigate(LOGIN_PATH)
    }

    /// Turn a failed call into what the user sees. Session expiry sends the user back
    /// to the login route.
    pub fn handle_error(&self, err: &AppError) -> Notice {
        if err.forces_logout() {
            warn!("session expired; returning to login");
            self.store.clear();
            *self.location.write() = LOGIN_PATH.to_string();
        }
        err.notice()
    }
}
