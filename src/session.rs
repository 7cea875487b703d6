//! The logged-in user slot.
//!
//! A `Session` starts empty, is filled by a successful login and emptied by
//! logout. It is an ordinary value owned by the caller (see `App`), not
//! process-wide state.

use crate::error::{Error, Result};
use crate::user::{IdentityStore, User};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    current: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for an already-authenticated user, e.g. restored from storage
    pub fn for_user(user: User) -> Self {
        Self {
            current: Some(user),
        }
    }

    /// Verify credentials and make the user current.
    ///
    /// A failed login leaves any existing session untouched.
    pub fn login(&mut self, identity: &IdentityStore, email: &str, secret: &str) -> Result<User> {
        let user = identity.authenticate(email, secret)?;
        tracing::info!(user_id = %user.id, "logged in");
        self.current = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.current.take() {
            tracing::info!(user_id = %user.id, "logged out");
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn require_user(&self) -> Result<&User> {
        self.current.as_ref().ok_or(Error::NotAuthenticated)
    }

    /// Replace the cached user record if it is the session user.
    pub fn refresh(&mut self, user: &User) {
        if let Some(current) = self.current.as_mut() {
            if current.id == user.id {
                *current = user.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use crate::user::tests::cheap_hasher;

    fn identity() -> IdentityStore {
        let identity = IdentityStore::new(Storage::in_memory(), cheap_hasher());
        identity.register("a@x.com", "Ada", "pw").expect("register");
        identity
    }

    #[test]
    fn starts_empty() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
        assert!(matches!(session.require_user(), Err(Error::NotAuthenticated)));
    }

    #[test]
    fn login_sets_and_logout_clears() {
        let identity = identity();
        let mut session = Session::new();
        let user = session.login(&identity, "a@x.com", "pw").expect("login");
        assert!(session.is_authenticated());
        assert_eq!(session.current_user(), Some(&user));

        session.logout();
        assert!(!session.is_authenticated());
        session.logout();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn failed_login_keeps_previous_session() {
        let identity = identity();
        let mut session = Session::new();
        let user = session.login(&identity, "a@x.com", "pw").expect("login");

        let err = session.login(&identity, "a@x.com", "bad").unwrap_err();
        assert!(matches!(err, Error::InvalidCredential(_)));
        assert_eq!(session.current_user(), Some(&user));
    }

    #[test]
    fn refresh_only_touches_session_user() {
        let identity = identity();
        let other = identity.register("b@x.com", "Bo", "pw").expect("register");
        let mut session = Session::new();
        let user = session.login(&identity, "a@x.com", "pw").expect("login");

        session.refresh(&User {
            name: "Renamed".to_string(),
            ..other
        });
        assert_eq!(session.current_user().map(|u| u.name.as_str()), Some("Ada"));

        let renamed = identity.rename(&user.id, "Ada L.").expect("rename");
        session.refresh(&renamed);
        assert_eq!(session.current_user().map(|u| u.name.as_str()), Some("Ada L."));
    }
}
