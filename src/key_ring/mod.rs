// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0
//! # Fernet key rings
//!
//! A key ring is an ordered list of symmetric Fernet keys. Encryption always
//! uses the first (primary) key while decryption tries every key in order.
//! Two independent rings exist:
//!
//! - `token` used for the token payloads,
//! - `credential` used for the encrypted credential blobs and sensitive
//!   config options. When no credential key repository is configured it
//!   consists of the single all-zero key.
//!
//! Rings are loaded once during the start-up and then only read. Rotation
//! replaces the content under the write lock.
use fernet::Fernet;
use sea_orm::DatabaseConnection;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::DatabaseError;

pub mod repository;
pub mod store;

/// Base64 (URL safe) text of the 32 zero bytes.
pub const ZERO_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// Kind of the key ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyRingKind {
    Token,
    Credential,
}

impl KeyRingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Credential => "credential",
        }
    }
}

impl fmt::Display for KeyRingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum KeyRingError {
    /// The ring holds no keys.
    #[error("key ring is empty")]
    NoKeys,

    /// None of the keys verifies the ciphertext.
    #[error("fernet token cannot be decrypted with any of the keys")]
    Decryption,

    /// Key is not a valid Fernet key.
    #[error("invalid fernet key at position {0}")]
    InvalidKey(usize),

    #[error("key ring lock is poisoned")]
    Poisoned,

    #[error("cannot read fernet key from {path}")]
    KeyRead {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    IO {
        #[from]
        source: std::io::Error,
    },

    #[error(transparent)]
    Database {
        #[from]
        source: DatabaseError,
    },
}

#[derive(Clone)]
struct KeyEntry {
    key: String,
    fernet: Fernet,
}

/// Shared handle of an ordered set of Fernet keys.
#[derive(Clone, Default)]
pub struct KeyRing {
    inner: Arc<RwLock<Vec<KeyEntry>>>,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("len", &self.len())
            .finish()
    }
}

fn build_entries<I, S>(keys: I) -> Result<Vec<KeyEntry>, KeyRingError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .enumerate()
        .map(|(idx, key)| {
            let key = key.as_ref().trim().to_string();
            Fernet::new(&key)
                .map(|fernet| KeyEntry { key, fernet })
                .ok_or(KeyRingError::InvalidKey(idx))
        })
        .collect()
}

impl KeyRing {
    /// Build the ring from the keys with the primary key first.
    pub fn new<I, S>(keys: I) -> Result<Self, KeyRingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            inner: Arc::new(RwLock::new(build_entries(keys)?)),
        })
    }

    /// Ring with the single all-zero key.
    pub fn zero() -> Result<Self, KeyRingError> {
        Self::new([ZERO_KEY])
    }

    /// Ring with freshly generated keys.
    pub fn generate(count: usize) -> Result<Self, KeyRingError> {
        Self::new((0..count).map(|_| Fernet::generate_key()))
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|keys| keys.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys as stored, the primary first.
    pub fn keys(&self) -> Result<Vec<String>, KeyRingError> {
        Ok(self
            .inner
            .read()
            .map_err(|_| KeyRingError::Poisoned)?
            .iter()
            .map(|entry| entry.key.clone())
            .collect())
    }

    /// Short identifier of the primary key.
    pub fn primary_key_id(&self) -> Result<String, KeyRingError> {
        self.inner
            .read()
            .map_err(|_| KeyRingError::Poisoned)?
            .first()
            .map(|entry| entry.key.chars().take(16).collect())
            .ok_or(KeyRingError::NoKeys)
    }

    /// Encrypt the data with the primary key.
    pub fn encrypt(&self, data: &[u8]) -> Result<String, KeyRingError> {
        self.inner
            .read()
            .map_err(|_| KeyRingError::Poisoned)?
            .first()
            .map(|entry| entry.fernet.encrypt(data))
            .ok_or(KeyRingError::NoKeys)
    }

    /// Decrypt the token trying every key in order.
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, KeyRingError> {
        let keys = self.inner.read().map_err(|_| KeyRingError::Poisoned)?;
        if keys.is_empty() {
            return Err(KeyRingError::NoKeys);
        }
        keys.iter()
            .find_map(|entry| entry.fernet.decrypt(token).ok())
            .ok_or(KeyRingError::Decryption)
    }

    /// Replace the content of the ring.
    pub fn replace<I, S>(&self, keys: I) -> Result<(), KeyRingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = build_entries(keys)?;
        let mut guard = self.inner.write().map_err(|_| KeyRingError::Poisoned)?;
        *guard = entries;
        Ok(())
    }

    /// Put a new primary key in front and drop the oldest keys beyond
    /// `max_active_keys`.
    pub fn rotate(&self, max_active_keys: usize) -> Result<Vec<String>, KeyRingError> {
        let new_key = Fernet::generate_key();
        let mut entries = build_entries([new_key])?;
        let mut guard = self.inner.write().map_err(|_| KeyRingError::Poisoned)?;
        entries.extend(guard.iter().cloned());
        entries.truncate(max_active_keys.max(1));
        *guard = entries;
        Ok(guard.iter().map(|entry| entry.key.clone()).collect())
    }
}

/// Process wide key rings.
#[derive(Clone, Debug, Default)]
pub struct KeyRings {
    pub token: KeyRing,
    pub credential: KeyRing,
}

impl KeyRings {
    /// Key rings for the tests and tools that do not persist keys.
    pub fn generate() -> Result<Self, KeyRingError> {
        Ok(Self {
            token: KeyRing::generate(2)?,
            credential: KeyRing::zero()?,
        })
    }

    /// Load the rings from the configured key repositories and the database.
    pub async fn bootstrap(db: &DatabaseConnection, config: &Config) -> Result<Self, KeyRingError> {
        let token = load_ring(
            db,
            KeyRingKind::Token,
            config.fernet_tokens.key_repository.as_ref(),
        )
        .await?;
        let credential = if config.credential.key_repository.is_some() {
            load_ring(
                db,
                KeyRingKind::Credential,
                config.credential.key_repository.as_ref(),
            )
            .await?
        } else {
            debug!("credential key repository is not configured, using the zero key");
            KeyRing::zero()?
        };
        Ok(Self { token, credential })
    }

    pub fn get(&self, kind: KeyRingKind) -> &KeyRing {
        match kind {
            KeyRingKind::Token => &self.token,
            KeyRingKind::Credential => &self.credential,
        }
    }

    /// Rotate the ring and persist the new state.
    pub async fn rotate(
        &self,
        db: &DatabaseConnection,
        config: &Config,
        kind: KeyRingKind,
    ) -> Result<(), KeyRingError> {
        let (repository, max_active_keys) = match kind {
            KeyRingKind::Token => (
                config.fernet_tokens.key_repository.as_ref(),
                config.fernet_tokens.max_active_keys,
            ),
            KeyRingKind::Credential => (
                config.credential.key_repository.as_ref(),
                config.credential.max_active_keys,
            ),
        };
        let keys = self.get(kind).rotate(max_active_keys)?;
        store::save_keys(db, kind, &keys).await?;
        if let Some(path) = repository {
            repository::write_keys(path, &keys).await?;
        }
        info!("rotated the {kind} key ring, {} keys active", keys.len());
        Ok(())
    }
}

async fn load_ring(
    db: &DatabaseConnection,
    kind: KeyRingKind,
    repository: Option<&PathBuf>,
) -> Result<KeyRing, KeyRingError> {
    if let Some(path) = repository {
        let keys = repository::load_keys(path).await?;
        if !keys.is_empty() {
            debug!("loaded {} {kind} keys from {:?}", keys.len(), path);
            store::save_keys(db, kind, &keys).await?;
            return KeyRing::new(keys);
        }
    }
    let keys = store::load_keys(db, kind).await?;
    if !keys.is_empty() {
        return KeyRing::new(keys);
    }
    info!("seeding the {kind} key ring");
    let ring = KeyRing::generate(2)?;
    let keys = ring.keys()?;
    store::save_keys(db, kind, &keys).await?;
    if let Some(path) = repository {
        repository::write_keys(path, &keys).await?;
    }
    Ok(ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_primary_decrypt_any() {
        let old = KeyRing::generate(1).unwrap();
        let data = old.encrypt(b"payload").unwrap();

        let ring = KeyRing::new(old.keys().unwrap()).unwrap();
        ring.rotate(3).unwrap();
        assert_eq!(2, ring.len());
        assert_eq!(b"payload".to_vec(), ring.decrypt(&data).unwrap());

        let fresh = ring.encrypt(b"new").unwrap();
        assert!(matches!(old.decrypt(&fresh), Err(KeyRingError::Decryption)));
    }

    #[test]
    fn test_rotate_retires_oldest() {
        let ring = KeyRing::generate(3).unwrap();
        let before = ring.keys().unwrap();
        let after = ring.rotate(3).unwrap();
        assert_eq!(3, after.len());
        assert_eq!(before[0], after[1]);
        assert_eq!(before[1], after[2]);
        assert!(!after.contains(&before[2]));
    }

    #[test]
    fn test_empty_ring() {
        let ring = KeyRing::default();
        assert!(ring.is_empty());
        assert!(matches!(ring.encrypt(b"x"), Err(KeyRingError::NoKeys)));
        assert!(matches!(ring.decrypt("x"), Err(KeyRingError::NoKeys)));
    }

    #[test]
    fn test_zero_key() {
        let ring = KeyRing::zero().unwrap();
        let data = ring.encrypt(b"secret").unwrap();
        let other_zero = KeyRing::zero().unwrap();
        assert_eq!(b"secret".to_vec(), other_zero.decrypt(&data).unwrap());
        assert_eq!("AAAAAAAAAAAAAAAA", ring.primary_key_id().unwrap());
    }

    #[test]
    fn test_invalid_key() {
        assert!(matches!(
            KeyRing::new(["foo"]),
            Err(KeyRingError::InvalidKey(0))
        ));
    }
}
