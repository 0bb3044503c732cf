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
//! # Identity provider synchronization
//!
//! Sync jobs run on a small pool of workers fed by a bounded queue so that
//! the directory traffic never competes with the request handlers. A job
//! moves the identity provider `idle → queued → syncing → idle`; a trigger
//! for a provider that is not idle is dropped.
//!
//! The scheduler wakes up every `[idp_sync] scheduler_interval` seconds and
//! queues every enabled directory provider whose last sync is older than its
//! sync interval.
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::idp::IdpApi;
use crate::idp::IdpProviderError;
use crate::idp::driver::{SyncMethod, driver_class};
use crate::idp::types::{IdpHealth, SyncStatus};
use crate::keystone::ServiceState;

/// Queue of the identity providers waiting for the sync.
#[derive(Clone, Debug)]
pub struct SyncQueue {
    sender: mpsc::Sender<String>,
    receiver: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl SyncQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    fn try_push(&self, idp_id: &str) -> Result<(), IdpProviderError> {
        self.sender
            .try_send(idp_id.to_string())
            .map_err(|_| IdpProviderError::QueueFull(idp_id.to_string()))
    }

    /// Next queued identity provider, `None` once cancelled.
    async fn next(&self, cancel: &CancellationToken) -> Option<String> {
        let mut receiver = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            guard = self.receiver.lock() => guard,
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            idp_id = receiver.recv() => idp_id,
        }
    }
}

/// Queue the sync of the identity provider.
///
/// Returns `false` when the provider is not idle and the trigger was
/// dropped.
#[tracing::instrument(level = "info", skip(state))]
pub async fn trigger_sync(state: &ServiceState, idp_id: &str) -> Result<bool, IdpProviderError> {
    let provider = state.provider.get_idp_provider();
    if !provider
        .transition_sync_status(state, idp_id, SyncStatus::Idle, SyncStatus::Queued)
        .await?
    {
        debug!("identity provider {idp_id} is not idle, sync trigger dropped");
        return Ok(false);
    }
    if let Err(err) = state.sync_queue.try_push(idp_id) {
        provider
            .transition_sync_status(state, idp_id, SyncStatus::Queued, SyncStatus::Idle)
            .await?;
        return Err(err);
    }
    Ok(true)
}

/// Probe the identity provider and mirror it into the local tables.
async fn probe_and_sync(
    state: &ServiceState,
    idp_id: &str,
    cancel: &CancellationToken,
) -> Result<(), IdpProviderError> {
    let provider = state.provider.get_idp_provider();
    let idp = provider
        .get_idp(state, idp_id)
        .await?
        .ok_or_else(|| IdpProviderError::NotFound(idp_id.to_string()))?;
    if !idp.enabled {
        return Err(IdpProviderError::Disabled(idp.id));
    }
    let driver = provider.get_driver(state, &idp).await?;
    if let Err(err) = driver.probe().await {
        error!(idp_id = %idp.id, "identity provider probe failed: {err}");
        provider
            .set_health(state, &idp.id, IdpHealth::Disconnected)
            .await?;
        return Err(err);
    }
    provider
        .set_health(state, &idp.id, IdpHealth::Connected)
        .await?;
    driver.sync(state, cancel).await
}

/// Run the sync of a queued identity provider.
///
/// The status returns to `idle` whatever the outcome.
#[tracing::instrument(level = "info", skip(state, cancel))]
pub async fn run_sync(
    state: &ServiceState,
    idp_id: &str,
    cancel: &CancellationToken,
) -> Result<(), IdpProviderError> {
    let provider = state.provider.get_idp_provider();
    if !provider
        .transition_sync_status(state, idp_id, SyncStatus::Queued, SyncStatus::Syncing)
        .await?
    {
        debug!("identity provider {idp_id} is no longer queued");
        return Ok(());
    }
    let res = probe_and_sync(state, idp_id, cancel).await;
    provider
        .transition_sync_status(state, idp_id, SyncStatus::Syncing, SyncStatus::Idle)
        .await?;
    res
}

/// Spawn the sync workers.
pub fn start_workers(state: &ServiceState, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
    (0..state.config.idp_sync.worker_count.max(1))
        .map(|worker| {
            let state = state.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                debug!("sync worker {worker} started");
                while let Some(idp_id) = state.sync_queue.next(&cancel).await {
                    match run_sync(&state, &idp_id, &cancel).await {
                        Ok(()) => info!(idp_id = %idp_id, "identity provider synced"),
                        Err(err) => warn!(idp_id = %idp_id, "identity provider sync failed: {err}"),
                    }
                }
                debug!("sync worker {worker} stopped");
            })
        })
        .collect()
}

/// Queue every directory provider due for the sync. Returns the IDs of the
/// queued providers.
pub async fn schedule_due(state: &ServiceState) -> Result<Vec<String>, IdpProviderError> {
    let now = Utc::now();
    let mut queued = Vec::new();
    for idp in state.provider.get_idp_provider().list_idps(state).await? {
        let full_sync = driver_class(&idp.driver)
            .is_some_and(|class| class.sync_method == SyncMethod::Full);
        if !idp.enabled
            || !full_sync
            || !idp.is_sync_due(now, state.config.idp_sync.default_sync_interval)
        {
            continue;
        }
        match trigger_sync(state, &idp.id).await {
            Ok(true) => queued.push(idp.id),
            Ok(false) => {}
            Err(err) => warn!(idp_id = %idp.id, "failed to queue the sync: {err}"),
        }
    }
    Ok(queued)
}

/// Periodically queue the due identity providers until cancelled.
pub async fn run_scheduler(state: ServiceState, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(
        state.config.idp_sync.scheduler_interval.max(1),
    ));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(err) = schedule_due(&state).await {
                    error!("identity provider sync scheduling failed: {err}");
                }
            }
        }
    }
    debug!("sync scheduler stopped");
}
