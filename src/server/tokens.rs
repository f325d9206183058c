use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::Engine;
use parking_lot::RwLock;

use crate::identity::Account;
use crate::{token_prefix, tprintln};

fn gen_token() -> String {
    // 256-bit random token, base64url without padding
    let mut buf = [0u8; 32];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// Refresh tokens outlive access tokens; a week unless configured otherwise.
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

#[derive(Debug, Clone)]
struct Entry {
    account: Account,
    expires_at: Instant,
}

/// Issued access and refresh tokens of the mock backend.
///
/// Expired access tokens stay on record until logout or a sweep, so logging out with an
/// expired token still revokes the account's refresh tokens. Both maps are swept of
/// entries past the refresh lifetime whenever tokens are issued.
pub struct TokenRegistry {
    ttl: Duration,
    refresh_ttl: Duration,
    access: RwLock<HashMap<String, Entry>>,
    refresh: RwLock<HashMap<String, Entry>>,
}

pub struct IssuedTokens {
    pub access: String,
    pub refresh: String,
    pub expires_in: u64,
}

impl TokenRegistry {
    pub fn new(ttl: Duration) -> Self { Self::with_refresh_ttl(ttl, DEFAULT_REFRESH_TTL) }

    pub fn with_refresh_ttl(ttl: Duration, refresh_ttl: Duration) -> Self {
        Self { ttl, refresh_ttl, access: RwLock::new(HashMap::new()), refresh: RwLock::new(HashMap::new()) }
    }

    pub fn issue(&self, account: &Account) -> IssuedTokens {
        self.sweep();
        let access = self.issue_access(account);
        let refresh = gen_token();
        let entry = Entry { account: account.clone(), expires_at: Instant::now() + self.refresh_ttl };
        self.refresh.write().insert(refresh.clone(), entry);
        tprintln!("tokens.issue user={} access={} ttl_secs={}", account.id, token_prefix(&access), self.ttl.as_secs());
        IssuedTokens { access, refresh, expires_in: self.ttl.as_secs() }
    }

    fn issue_access(&self, account: &Account) -> String {
        let token = gen_token();
        let entry = Entry { account: account.clone(), expires_at: Instant::now() + self.ttl };
        self.access.write().insert(token.clone(), entry);
        token
    }

    /// Account behind a live access token.
    pub fn validate(&self, token: &str) -> Option<Account> {
        let now = Instant::now();
        match self.access.read().get(token) {
            Some(e) if e.expires_at > now => Some(e.account.clone()),
            Some(_) => {
                tprintln!("tokens.expired access={}", token_prefix(token));
                None
            }
            None => None,
        }
    }

    /// New access token for a known, unexpired refresh token.
    pub fn refresh(&self, refresh_token: &str) -> Option<(String, u64)> {
        let now = Instant::now();
        let account = match self.refresh.read().get(refresh_token) {
            Some(e) if e.expires_at > now => e.account.clone(),
            _ => return None,
        };
        let access = self.issue_access(&account);
        tprintln!("tokens.refresh user={} access={}", account.id, token_prefix(&access));
        Some((access, self.ttl.as_secs()))
    }

    /// Forget every token of the account behind `token`, expired or not.
    pub fn logout(&self, token: &str) -> bool {
        let Some(entry) = self.access.write().remove(token) else { return false; };
        let id = entry.account.id;
        self.access.write().retain(|_, e| e.account.id != id);
        self.refresh.write().retain(|_, e| e.account.id != id);
        true
    }

    /// Swap the stored account of every token issued to `account.id`.
    pub fn replace_account(&self, account: &Account) {
        for map in [&self.access, &self.refresh] {
            for e in map.write().values_mut().filter(|e| e.account.id == account.id) {
                e.account = account.clone();
            }
        }
    }

    /// Drop refresh tokens past their lifetime and access tokens that expired longer
    /// than a refresh lifetime ago.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut dropped = 0;
        {
            let mut refresh = self.refresh.write();
            let before = refresh.len();
            refresh.retain(|_, e| e.expires_at > now);
            dropped += before - refresh.len();
        }
        let mut access = self.access.write();
        let before = access.len();
        access.retain(|_, e| e.expires_at + self.refresh_ttl > now);
        dropped + before - access.len()
    }

    /// Mark every access token as expired. Refresh tokens keep working.
    pub fn expire_all_access(&self) -> usize {
        let now = Instant::now();
        let mut map = self.access.write();
        for e in map.values_mut() { e.expires_at = now; }
        map.len()
    }

    pub fn revoke_all_refresh(&self) -> usize {
        let mut map = self.refresh.write();
        let n = map.len();
        map.clear();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{AccountStatus, Role};

    fn account() -> Account {
        Account {
            id: "TEA000001".into(),
            name: "Prof. Roberto Lima".into(),
            email: "prof@escola.edu.br".into(),
            role: Role::Teacher,
            unit_id: "001".into(),
            unit_name: "Escola Estadual Central".into(),
            avatar: None,
            rm: None,
            course: None,
            status: AccountStatus::Active,
            registration_date: None,
            biometric_id: None,
        }
    }

    #[test]
    fn issue_validate_and_expire() {
        let reg = TokenRegistry::new(Duration::from_secs(3600));
        let t = reg.issue(&account());
        assert_eq!(t.expires_in, 3600);
        assert_ne!(t.access, t.refresh);
        assert_eq!(reg.validate(&t.access).map(|a| a.id), Some("TEA000001".to_string()));
        assert!(reg.validate(&t.refresh).is_none());

        assert_eq!(reg.expire_all_access(), 1);
        assert!(reg.validate(&t.access).is_none());

        let (fresh, ttl) = reg.refresh(&t.refresh).unwrap();
        assert_eq!(ttl, 3600);
        assert!(reg.validate(&fresh).is_some());
    }

    #[test]
    fn logout_drops_refresh_tokens() {
        let reg = TokenRegistry::new(Duration::from_secs(60));
        let t = reg.issue(&account());
        assert!(reg.logout(&t.access));
        assert!(!reg.logout(&t.access));
        assert!(reg.refresh(&t.refresh).is_none());
    }

    #[test]
    fn logout_with_expired_token_still_revokes_refresh() {
        let reg = TokenRegistry::new(Duration::from_secs(60));
        let t = reg.issue(&account());
        reg.expire_all_access();
        assert!(reg.validate(&t.access).is_none());
        assert!(reg.logout(&t.access));
        assert!(reg.refresh(&t.refresh).is_none());
    }

    #[test]
    fn sweep_drops_stale_tokens() {
        let reg = TokenRegistry::with_refresh_ttl(Duration::ZERO, Duration::ZERO);
        let t = reg.issue(&account());
        std::thread::sleep(Duration::from_millis(5));
        assert!(reg.refresh(&t.refresh).is_none());
        assert_eq!(reg.sweep(), 2);
        assert!(!reg.logout(&t.access));
    }

    #[test]
    fn replaced_account_is_served_by_old_tokens() {
        let reg = TokenRegistry::new(Duration::from_secs(60));
        let t = reg.issue(&account());
        let mut edited = account();
        edited.name = "Prof. Roberto Lima Filho".into();
        reg.replace_account(&edited);
        assert_eq!(reg.validate(&t.access).map(|a| a.name), Some(edited.name.clone()));
        let (fresh, _) = reg.refresh(&t.refresh).unwrap();
        assert_eq!(reg.validate(&fresh).map(|a| a.name), Some(edited.name));
    }

    #[test]
    fn revoked_refresh_fails() {
        let reg = TokenRegistry::new(Duration::from_secs(60));
        let t = reg.issue(&account());
        assert_eq!(reg.revoke_all_refresh(), 1);
        assert!(reg.refresh(&t.refresh).is_none());
    }
}
