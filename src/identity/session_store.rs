use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::account::Account;
use super::session::Session;
use crate::error::{AppError, AppResult};
use crate::storage::LocalStore;
use crate::{token_prefix, tprintln};

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_DATA_KEY: &str = "user_data";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Single authority for "who is logged in". Survives restarts through the local store.
///
/// Only `commit`, `clear` and the token/profile setters write to the store; everything
/// else reads the in-memory copy.
pub struct SessionStore {
    kv: Arc<dyn LocalStore>,
    current: RwLock<Session>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn LocalStore>) -> Self {
        Self { kv, current: RwLock::new(Session::loading()) }
    }

    /// Snapshot of the in-memory session.
    pub fn current(&self) -> Session { self.current.read().clone() }

    pub fn token(&self) -> Option<String> { self.current.read().token().map(|s| s.to_string()) }

    /// Rebuild the session from the persisted keys. Never fails: corrupted or partial
    /// state is discarded and an empty session comes back.
    pub fn restore(&self) -> Session {
        let restored = match self.read_persisted() {
            Ok(Some((account, token))) => {
                info!(user = %account.id, role = %account.role, "session.restore ok");
                Session::authenticated(account, token)
            }
            Ok(None) => {
                debug!("session.restore: nothing persisted");
                Session::empty()
            }
            Err(AppError::CorruptedSession(reason)) => {
                warn!("session.restore: discarding corrupted session data: {}", reason);
                if let Err(e) = self.kv.remove_many(&[AUTH_TOKEN_KEY, USER_DATA_KEY, REFRESH_TOKEN_KEY]) {
                    warn!("session.restore: failed to discard corrupted keys: {}", e);
                }
                Session::empty()
            }
            Err(e) => {
                warn!("session.restore: local storage unavailable: {}", e);
                Session::empty()
            }
        };
        *self.current.write() = restored.clone();
        restored
    }

    fn read_persisted(&self) -> AppResult<Option<(Account, String)>> {
        let token = self.kv.get(AUTH_TOKEN_KEY)?;
        let data = self.kv.get(USER_DATA_KEY)?;
        match (token, data) {
            (None, None) => Ok(None),
            (Some(token), Some(data)) => {
                if token.trim().is_empty() {
                    return Err(AppError::CorruptedSession("empty auth_token".into()));
                }
                let account: Account = serde_json::from_str(&data)
                    .map_err(|e| AppError::CorruptedSession(format!("user_data: {}", e)))?;
                Ok(Some((account.normalized(), token)))
            }
            (Some(_), None) => Err(AppError::CorruptedSession("auth_token without user_data".into())),
            (None, Some(_)) => Err(AppError::CorruptedSession("user_data without auth_token".into())),
        }
    }

    /// Persist both keys in one write and make the session authenticated.
    pub fn commit(&self, account: Account, token: impl Into<String>) -> AppResult<Session> {
        let token = token.into();
        let account = account.normalized();
        let data = serde_json::to_string(&account)?;
        self.kv.set_many(&[(AUTH_TOKEN_KEY, token.as_str()), (USER_DATA_KEY, data.as_str())])?;
        tprintln!("session.commit user={} token={}", account.id, token_prefix(&token));
        info!(user = %account.id, role = %account.role, "session.commit");
        let s = Session::authenticated(account, token);
        *self.current.write() = s.clone();
        Ok(s)
    }

    /// Drop the session locally. Always takes effect in memory, even if the store write fails.
    pub fn clear(&self) {
        if let Err(e) = self.kv.remove_many(&[AUTH_TOKEN_KEY, USER_DATA_KEY, REFRESH_TOKEN_KEY]) {
            warn!("session.clear: failed to remove persisted keys: {}", e);
        }
        *self.current.write() = Session::empty();
        info!("session.clear");
    }

    pub fn begin_loading(&self) {
        let mut w = self.current.write();
        *w = w.clone().with_loading(true);
    }

    pub fn end_loading(&self) {
        let mut w = self.current.write();
        *w = w.clone().with_loading(false);
    }

    /// Rewrite the bearer token after a refresh. `user_data` is untouched.
    pub fn set_token(&self, token: &str) -> AppResult<()> {
        let mut w = self.current.write();
        if !w.is_authenticated() { return Err(AppError::SessionExpired); }
        self.kv.set(AUTH_TOKEN_KEY, token)?;
        tprintln!("session.set_token token={}", token_prefix(token));
        *w = w.clone().with_token(token.to_string());
        Ok(())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.kv.get(REFRESH_TOKEN_KEY).ok().flatten().filter(|t| !t.is_empty())
    }

    pub fn set_refresh_token(&self, token: &str) -> AppResult<()> {
        self.kv.set(REFRESH_TOKEN_KEY, token)
    }

    /// Profile edit: the whole account record is replaced, never merged.
    pub fn replace_account(&self, account: Account) -> AppResult<Session> {
        let mut w = self.current.write();
        if !w.is_authenticated() { return Err(AppError::Unauthorized); }
        let account = account.normalized();
        let data = serde_json::to_string(&account)?;
        self.kv.set(USER_DATA_KEY, &data)?;
        *w = w.clone().with_user(account);
        Ok(w.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::account::AccountStatus;
    use crate::identity::Role;
    use crate::storage::MemoryStore;

    fn student() -> Account {
        Account {
            id: "STU000123".into(),
            name: "Ana Silva Santos".into(),
            email: "123456@escola.edu.br".into(),
            role: Role::Student,
            unit_id: "001".into(),
            unit_name: "Escola Estadual Central".into(),
            avatar: None,
            rm: Some("123456".into()),
            course: Some("3º Ano - Ensino Médio".into()),
            status: AccountStatus::Active,
            registration_date: None,
            biometric_id: None,
        }
    }

    fn store() -> (Arc<MemoryStore>, SessionStore) {
        let kv = Arc::new(MemoryStore::new());
        let s = SessionStore::new(kv.clone());
        (kv, s)
    }

    #[test]
    fn starts_loading_then_restores_empty() {
        let (_kv, s) = store();
        assert!(s.current().is_loading());
        let r = s.restore();
        assert_eq!(r, Session::empty());
        assert_eq!(s.current(), Session::empty());
    }

    #[test]
    fn commit_then_restore_in_fresh_store() {
        let (kv, s) = store();
        s.commit(student(), "tok-1").unwrap();
        let other = SessionStore::new(kv.clone());
        let r1 = other.restore();
        let r2 = other.restore();
        assert!(r1.is_authenticated());
        assert_eq!(r1, r2);
        assert_eq!(r1.user().and_then(|u| u.rm.as_deref()), Some("123456"));
    }

    #[test]
    fn stray_single_key_is_discarded() {
        let (kv, s) = store();
        kv.set(AUTH_TOKEN_KEY, "tok").unwrap();
        assert_eq!(s.restore(), Session::empty());
        assert!(!kv.contains(AUTH_TOKEN_KEY).unwrap());

        kv.set(USER_DATA_KEY, "{}").unwrap();
        assert_eq!(s.restore(), Session::empty());
        assert!(!kv.contains(USER_DATA_KEY).unwrap());
    }

    #[test]
    fn set_token_requires_session() {
        let (kv, s) = store();
        s.restore();
        assert_eq!(s.set_token("x"), Err(AppError::SessionExpired));
        s.commit(student(), "tok-1").unwrap();
        s.set_token("tok-2").unwrap();
        assert_eq!(s.token().as_deref(), Some("tok-2"));
        assert_eq!(kv.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("tok-2"));
    }

    #[test]
    fn replace_account_overwrites_whole_record() {
        let (kv, s) = store();
        s.commit(student(), "tok").unwrap();
        let mut edited = student();
        edited.name = "Ana S. Santos".into();
        edited.avatar = Some("/avatars/custom.png".into());
        let after = s.replace_account(edited.clone()).unwrap();
        assert_eq!(after.user(), Some(&edited));
        let stored: Account = serde_json::from_str(&kv.get(USER_DATA_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, edited);
    }

    #[test]
    fn clear_removes_refresh_token_too() {
        let (kv, s) = store();
        s.commit(student(), "tok").unwrap();
        s.set_refresh_token("ref").unwrap();
        assert_eq!(s.refresh_token().as_deref(), Some("ref"));
        s.clear();
        assert!(kv.is_empty());
        assert_eq!(s.refresh_token(), None);
        assert_eq!(s.current(), Session::empty());
    }
}
