//! User accounts and credentials.
//!
//! Users live in the `users` collection; credentials are kept apart in
//! `credentials` as `{ user id -> argon2 PHC string }`. Email comparison is
//! exact and case-sensitive.

use std::collections::BTreeMap;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::storage::{Storage, CREDENTIALS_KEY, USERS_KEY};

pub const DEMO_USER_ID: &str = "user_demo";
pub const DEMO_EMAIL: &str = "demo@taskbuddy.com";
pub const DEMO_PASSWORD: &str = "demo123";
pub const DEMO_NAME: &str = "Demo User";

const USER_ID_PREFIX: &str = "user_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

type Credentials = BTreeMap<String, String>;

/// Argon2id hashing with configurable cost
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|err| Error::InvalidConfig(format!("auth: {err}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|err| {
                tracing::error!(error = %err, "argon2 hash_password error");
                Error::OperationFailed(format!("credential hashing failed: {err}"))
            })?;
        Ok(hash.to_string())
    }

    /// Parameters are read back from the PHC string, so hashes made under
    /// an older cost setting keep verifying.
    pub fn verify(&self, secret: &str, encoded: &str) -> Result<bool> {
        let parsed = PasswordHash::new(encoded).map_err(|err| {
            tracing::error!(error = %err, "argon2 parse hash error");
            Error::storage(CREDENTIALS_KEY, format!("malformed credential: {err}"))
        })?;
        Ok(self
            .argon2()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }
}

#[derive(Debug, Clone)]
pub struct IdentityStore {
    storage: Storage,
    hasher: CredentialHasher,
}

impl IdentityStore {
    pub fn new(storage: Storage, hasher: CredentialHasher) -> Self {
        Self { storage, hasher }
    }

    pub fn list(&self) -> Result<Vec<User>> {
        self.storage.load(USERS_KEY)
    }

    pub fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.list()?.into_iter().find(|user| user.id == user_id))
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.list()?.into_iter().find(|user| user.email == email))
    }

    /// Create an account. Fails with `DuplicateEmail` on an exact email match.
    ///
    /// The credential is written while `users` is still locked, so a failed
    /// credential write leaves no account behind.
    pub fn register(&self, email: &str, name: &str, secret: &str) -> Result<User> {
        // Hash outside the lock; argon2 is deliberately slow.
        let encoded = self.hasher.hash(secret)?;

        let user = self.storage.update(USERS_KEY, |users: &mut Vec<User>| {
            if users.iter().any(|user| user.email == email) {
                return Err(Error::DuplicateEmail(email.to_string()));
            }
            let user = User {
                id: generate_user_id(users),
                email: email.to_string(),
                name: name.to_string(),
                created_at: Utc::now(),
            };
            self.store_credential(&user.id, encoded)?;
            users.push(user.clone());
            Ok(user)
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    fn store_credential(&self, user_id: &str, encoded: String) -> Result<()> {
        self.storage
            .update(CREDENTIALS_KEY, |credentials: &mut Credentials| {
                credentials.insert(user_id.to_string(), encoded);
                Ok(())
            })
    }

    /// Check a secret against the stored credential.
    pub fn authenticate(&self, email: &str, secret: &str) -> Result<User> {
        let user = self
            .find_by_email(email)?
            .ok_or_else(|| Error::UserNotFound(email.to_string()))?;

        let credentials: Credentials = self.storage.load(CREDENTIALS_KEY)?;
        let verified = match credentials.get(&user.id) {
            Some(encoded) => self.hasher.verify(secret, encoded)?,
            None => false,
        };
        if !verified {
            tracing::warn!(user_id = %user.id, "credential rejected");
            return Err(Error::InvalidCredential(email.to_string()));
        }
        Ok(user)
    }

    /// Change the display name; everything else about the user is fixed.
    pub fn rename(&self, user_id: &str, name: &str) -> Result<User> {
        let user = self.storage.update(USERS_KEY, |users: &mut Vec<User>| {
            let user = users
                .iter_mut()
                .find(|user| user.id == user_id)
                .ok_or_else(|| Error::UserNotFound(user_id.to_string()))?;
            user.name = name.to_string();
            Ok(user.clone())
        })?;
        tracing::debug!(user_id, "user renamed");
        Ok(user)
    }

    /// Create the demo account when no users exist yet.
    ///
    /// Returns whether the account was created.
    pub fn seed_demo(&self) -> Result<bool> {
        if !self.list()?.is_empty() {
            return Ok(false);
        }
        let encoded = self.hasher.hash(DEMO_PASSWORD)?;

        let created = self.storage.update(USERS_KEY, |users: &mut Vec<User>| {
            if !users.is_empty() {
                return Ok(false);
            }
            self.store_credential(DEMO_USER_ID, encoded)?;
            users.push(User {
                id: DEMO_USER_ID.to_string(),
                email: DEMO_EMAIL.to_string(),
                name: DEMO_NAME.to_string(),
                created_at: Utc::now(),
            });
            Ok(true)
        })?;
        if created {
            tracing::info!("seeded demo user");
        }
        Ok(created)
    }
}

fn generate_user_id(users: &[User]) -> String {
    loop {
        let id = format!("{}{}", USER_ID_PREFIX, Ulid::new().to_string().to_lowercase());
        if !users.iter().any(|user| user.id == id) {
            return id;
        }
    }
}
