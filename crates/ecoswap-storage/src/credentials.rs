//! Session credentials held in memory and mirrored to storage.

use crate::{KeyValueStorage, MemoryStorage, StorageError, StorageKeys, StorageResult};
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Profile of the signed-in user.
///
/// Only the fields the client reads are typed; anything else the server sends
/// is kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "id", deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "points_or_zero")]
    pub eco_points: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: None,
            email: None,
            phone: None,
            eco_points: 0,
            extra: Map::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "user id must be a string or number, got {other}"
        ))),
    }
}

fn points_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Everything that makes up a session. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
}

impl SessionCredentials {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

/// In-memory credentials with write-through to a storage backend.
///
/// Reads are served from memory. Every mutation writes storage first and only
/// then updates memory, both under the same lock, so a key is present in
/// storage exactly when the matching in-memory field is set. The one exception
/// is [`CredentialStore::clear`]: memory is emptied even when a storage delete
/// fails, leaving that key on disk until the next successful write or clear.
pub struct CredentialStore {
    storage: Box<dyn KeyValueStorage>,
    cache: Mutex<SessionCredentials>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.lock();
        f.debug_struct("CredentialStore")
            .field("has_access_token", &cache.access_token.is_some())
            .field("has_refresh_token", &cache.refresh_token.is_some())
            .field("user_id", &cache.user.as_ref().map(|u| u.user_id.as_str()))
            .finish()
    }
}

impl CredentialStore {
    /// Load whatever session the backend holds.
    ///
    /// A stored profile that no longer parses is removed and treated as absent.
    pub fn new(storage: impl KeyValueStorage + 'static) -> StorageResult<Self> {
        let storage: Box<dyn KeyValueStorage> = Box::new(storage);

        let access_token = storage.get(StorageKeys::AUTH_TOKEN)?;
        let refresh_token = storage.get(StorageKeys::REFRESH_TOKEN)?;
        let user = match storage.get(StorageKeys::AUTH_USER)? {
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable stored user profile");
                    storage.delete(StorageKeys::AUTH_USER)?;
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            storage,
            cache: Mutex::new(SessionCredentials {
                access_token,
                refresh_token,
                user,
            }),
        })
    }

    /// Store backed by process memory only.
    pub fn in_memory() -> Self {
        Self {
            storage: Box::new(MemoryStorage::new()),
            cache: Mutex::new(SessionCredentials::default()),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.cache.lock().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.cache.lock().refresh_token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.cache.lock().user.clone()
    }

    pub fn snapshot(&self) -> SessionCredentials {
        self.cache.lock().clone()
    }

    pub fn set_access_token(&self, token: &str) -> StorageResult<()> {
        let mut cache = self.cache.lock();
        self.storage.set(StorageKeys::AUTH_TOKEN, token)?;
        cache.access_token = Some(token.to_string());
        Ok(())
    }

    pub fn set_refresh_token(&self, token: Option<&str>) -> StorageResult<()> {
        let mut cache = self.cache.lock();
        self.write_optional(StorageKeys::REFRESH_TOKEN, token)?;
        cache.refresh_token = token.map(str::to_string);
        Ok(())
    }

    pub fn set_user(&self, user: Option<&UserProfile>) -> StorageResult<()> {
        let encoded = user.map(encode_user).transpose()?;
        let mut cache = self.cache.lock();
        self.write_optional(StorageKeys::AUTH_USER, encoded.as_deref())?;
        cache.user = user.cloned();
        Ok(())
    }

    /// Replace the whole session in one step.
    pub fn replace(&self, credentials: SessionCredentials) -> StorageResult<()> {
        let encoded_user = credentials.user.as_ref().map(encode_user).transpose()?;
        let mut cache = self.cache.lock();

        // Memory follows each key as soon as storage accepts it.
        self.write_optional(StorageKeys::AUTH_TOKEN, credentials.access_token.as_deref())?;
        cache.access_token = credentials.access_token;
        self.write_optional(StorageKeys::REFRESH_TOKEN, credentials.refresh_token.as_deref())?;
        cache.refresh_token = credentials.refresh_token;
        self.write_optional(StorageKeys::AUTH_USER, encoded_user.as_deref())?;
        cache.user = credentials.user;
        Ok(())
    }

    /// Remove every session key from memory and storage.
    ///
    /// Memory is always cleared, so a teardown never leaves usable tokens in
    /// the process. Storage deletes are all attempted; the first failure is
    /// returned and the keys it could not delete stay in storage.
    pub fn clear(&self) -> StorageResult<()> {
        let mut cache = self.cache.lock();
        *cache = SessionCredentials::default();

        let mut first_error = None;
        for key in StorageKeys::ALL {
            if let Err(e) = self.storage.delete(key) {
                tracing::warn!(key, error = %e, "failed to remove stored credential");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn write_optional(&self, key: &str, value: Option<&str>) -> StorageResult<()> {
        match value {
            Some(value) => self.storage.set(key, value),
            None => self.storage.delete(key).map(|_| ()),
        }
    }
}

fn encode_user(user: &UserProfile) -> StorageResult<String> {
    serde_json::to_string(user).map_err(|e| StorageError::Encoding(e.to_string()))
}
