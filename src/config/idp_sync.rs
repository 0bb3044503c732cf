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

use serde::Deserialize;

/// Identity provider synchronization.
#[derive(Debug, Deserialize, Clone)]
pub struct IdpSyncSection {
    /// Number of concurrent sync workers.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Capacity of the sync job queue.
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
    /// How often (in seconds) the scheduler looks for IdPs to sync.
    #[serde(default = "default_scheduler_interval")]
    pub scheduler_interval: u64,
    /// Sync interval (in seconds) for IdPs without own setting.
    #[serde(default = "default_sync_interval")]
    pub default_sync_interval: i64,
    /// A queued or syncing IdP older than that (in seconds) may be synced
    /// again.
    #[serde(default = "default_stuck_timeout")]
    pub stuck_timeout: i64,
}

fn default_worker_count() -> usize {
    1
}

fn default_queue_size() -> usize {
    2048
}

fn default_scheduler_interval() -> u64 {
    60
}

fn default_sync_interval() -> i64 {
    900
}

fn default_stuck_timeout() -> i64 {
    1800
}

impl Default for IdpSyncSection {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            queue_size: default_queue_size(),
            scheduler_interval: default_scheduler_interval(),
            default_sync_interval: default_sync_interval(),
            stuck_timeout: default_stuck_timeout(),
        }
    }
}
