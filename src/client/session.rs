//! Client session lifecycle.
//!
//! A `SessionContext` is created by [`SessionContext::hydrate`] from the
//! persisted `token`/`user` keys, filled by [`SessionContext::establish`] after
//! login or registration and cleared by [`SessionContext::teardown`] on logout
//! or when the server answers 401. Callers pass it explicitly to whatever needs
//! the identity.

use serde_json::Value;
use tracing::warn;

use crate::db::UserResponse;

use super::lists::resolve_owner_key;
use super::storage::{KeyValueStore, StorageError};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    token: Option<String>,
    /// Profile as last returned by the server. Kept as raw JSON since older
    /// state files may hold partial profiles.
    user: Option<Value>,
}

impl SessionContext {
    /// Restore the session persisted in `store`.
    ///
    /// Both keys must be present. An unreadable user record clears both keys
    /// and yields a signed-out session.
    pub fn hydrate<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<Self, StorageError> {
        let (Some(token), Some(user)) = (store.get(TOKEN_KEY)?, store.get(USER_KEY)?) else {
            return Ok(Self::default());
        };

        match serde_json::from_str::<Value>(&user) {
            Ok(user) if user.is_object() => Ok(Self {
                token: Some(token),
                user: Some(user),
            }),
            _ => {
                warn!("Stored user profile is unreadable, clearing session");
                store.remove(TOKEN_KEY)?;
                store.remove(USER_KEY)?;
                Ok(Self::default())
            }
        }
    }

    /// Record a freshly issued token and profile, in memory and in `store`
    pub fn establish<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        token: String,
        user: &UserResponse,
    ) -> Result<(), StorageError> {
        let user = to_value(user);
        store.set(TOKEN_KEY, &token)?;
        store.set(USER_KEY, &user.to_string())?;
        self.token = Some(token);
        self.user = Some(user);
        Ok(())
    }

    /// Replace the cached profile after a profile update
    pub fn update_user<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        user: &UserResponse,
    ) -> Result<(), StorageError> {
        let user = to_value(user);
        store.set(USER_KEY, &user.to_string())?;
        self.user = Some(user);
        Ok(())
    }

    pub fn teardown<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) -> Result<(), StorageError> {
        self.token = None;
        self.user = None;
        store.remove(TOKEN_KEY)?;
        store.remove(USER_KEY)?;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref()?.get("id")?.as_str()
    }

    /// Storage scope for this user's word lists
    pub fn owner_key(&self) -> String {
        resolve_owner_key(self.user.as_ref())
    }
}

fn to_value(user: &UserResponse) -> Value {
    // UserResponse only holds strings and integers
    serde_json::to_value(user).unwrap_or(Value::Null)
}
