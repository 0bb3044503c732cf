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

use axum::extract::FromRef;
use dashmap::DashMap;
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::KeystoneError;
use crate::idp::sync::SyncQueue;
use crate::key_ring::KeyRings;
use crate::provider::Provider;
use crate::token::Token;

type EntityLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

// Placing ServiceState behind Arc is necessary to address DatabaseConnection
// not implementing Clone.
#[derive(FromRef)]
pub struct Service {
    /// Config file
    pub config: Config,
    /// Service/resource Provider
    pub provider: Provider,
    /// Database connection
    #[from_ref(skip)]
    pub db: DatabaseConnection,
    /// Token and credential key rings.
    #[from_ref(skip)]
    pub key_rings: KeyRings,
    /// Verified tokens by their string form.
    #[from_ref(skip)]
    pub token_cache: Cache<String, Token>,
    /// Identity providers waiting for the sync.
    #[from_ref(skip)]
    pub sync_queue: SyncQueue,
    /// Cancelled on the service shutdown.
    #[from_ref(skip)]
    pub shutdown: CancellationToken,
    #[from_ref(skip)]
    entity_locks: EntityLocks,
}

pub type ServiceState = Arc<Service>;

/// Exclusive hold of a named entity. The lock is released on drop.
pub struct EntityLockGuard {
    key: String,
    locks: EntityLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for EntityLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl Service {
    pub fn new(
        cfg: Config,
        db: DatabaseConnection,
        provider: Provider,
        key_rings: KeyRings,
    ) -> Result<Self, KeystoneError> {
        // Cached verifications live for half of the token lifetime.
        let token_cache = Cache::builder()
            .max_capacity(cfg.token.cache_size)
            .time_to_live(Duration::from_secs((cfg.token.expiration / 2).max(1)))
            .build();
        Ok(Self {
            sync_queue: SyncQueue::new(cfg.idp_sync.queue_size),
            config: cfg,
            provider,
            db,
            key_rings,
            token_cache,
            shutdown: CancellationToken::new(),
            entity_locks: Arc::new(DashMap::new()),
        })
    }

    /// Lock the entity named by the `key`, for example
    /// `user:<idp>-<external id>`, waiting for the current holder.
    pub async fn lock_entity<K: Into<String>>(&self, key: K) -> EntityLockGuard {
        let key = key.into();
        let lock = self
            .entity_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        EntityLockGuard {
            key,
            locks: self.entity_locks.clone(),
            guard: Some(guard),
        }
    }

    pub async fn terminate(&self) -> Result<(), KeystoneError> {
        info!("Terminating Keystone");
        self.shutdown.cancel();
        Ok(())
    }
}
