use serde::Serialize;

use super::account::Account;
use super::role::Role;

pub type SessionToken = String;

/// Current authentication state.
///
/// Fields are private so `is_authenticated == (user.is_some() && token.is_some())`
/// holds for every value that can exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    user: Option<Account>,
    is_authenticated: bool,
    is_loading: bool,
    token: Option<SessionToken>,
}

impl Default for Session {
    fn default() -> Self { Self::empty() }
}

impl Session {
    /// Signed out, idle.
    pub fn empty() -> Self {
        Self { user: None, is_authenticated: false, is_loading: false, token: None }
    }

    /// Initial state at process start, before restore has run.
    pub fn loading() -> Self {
        Self { is_loading: true, ..Self::empty() }
    }

    pub fn authenticated(user: Account, token: impl Into<SessionToken>) -> Self {
        Self { user: Some(user), is_authenticated: true, is_loading: false, token: Some(token.into()) }
    }

    pub fn user(&self) -> Option<&Account> { self.user.as_ref() }
    pub fn token(&self) -> Option<&str> { self.token.as_deref() }
    pub fn is_authenticated(&self) -> bool { self.is_authenticated }
    pub fn is_loading(&self) -> bool { self.is_loading }
    pub fn role(&self) -> Option<Role> { self.user.as_ref().map(|u| u.role) }

    /// Same state with the loading flag changed.
    pub fn with_loading(mut self, loading: bool) -> Self {
        self.is_loading = loading;
        self
    }

    /// Swap the bearer token of an authenticated session. No-op when signed out.
    pub(crate) fn with_token(mut self, token: SessionToken) -> Self {
        if self.is_authenticated { self.token = Some(token); }
        self
    }

    /// Replace the whole account record of an authenticated session. No-op when signed out.
    pub(crate) fn with_user(mut self, user: Account) -> Self {
        if self.is_authenticated { self.user = Some(user); }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::account::AccountStatus;

    fn account() -> Account {
        Account {
            id: "DEV000001".into(),
            name: "Dev Master".into(),
            email: "dev@escola.edu.br".into(),
            role: Role::Developer,
            unit_id: "002".into(),
            unit_name: "Colégio Municipal Norte".into(),
            avatar: None,
            rm: None,
            course: None,
            status: AccountStatus::Active,
            registration_date: None,
            biometric_id: None,
        }
    }

    #[test]
    fn constructors_hold_invariant() {
        for s in [Session::empty(), Session::loading(), Session::authenticated(account(), "tok")] {
            assert_eq!(s.is_authenticated(), s.user().is_some() && s.token().is_some());
        }
        assert!(Session::loading().is_loading());
        assert!(!Session::empty().is_loading());
    }

    #[test]
    fn token_and_user_swaps_ignore_signed_out() {
        let s = Session::empty().with_token("x".into()).with_user(account());
        assert_eq!(s, Session::empty());
        let a = Session::authenticated(account(), "old").with_token("new".into());
        assert_eq!(a.token(), Some("new"));
        assert_eq!(a.role(), Some(Role::Developer));
    }
}
