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

use crate::db::entity::identity_provider as db_idp;
use crate::idp::IdpProviderError;
use crate::idp::types::*;

mod create;
mod delete;
mod get;
mod list;
mod status;

pub use create::create;
pub use delete::delete;
pub use get::{find_by_target_domain, get};
pub use list::list;
pub use status::{set_health, transition_sync_status};

impl TryFrom<db_idp::Model> for IdentityProvider {
    type Error = IdpProviderError;

    fn try_from(value: db_idp::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            sync_status: SyncStatus::try_from(value.sync_status.as_str())
                .map_err(IdpProviderError::Status)?,
            status: IdpHealth::try_from(value.status.as_str()).map_err(IdpProviderError::Status)?,
            id: value.id,
            name: value.name,
            driver: value.driver,
            template: value.template,
            target_domain_id: value.target_domain_id,
            auto_create_project: value.auto_create_project,
            auto_create_user: value.auto_create_user,
            enabled: value.enabled,
            is_sso: value.is_sso,
            is_default: value.is_default,
            sync_status_at: value.sync_status_at.map(|x| x.and_utc()),
            error_count: value.error_count,
            sync_interval_seconds: value.sync_interval_seconds,
            last_sync: value.last_sync.map(|x| x.and_utc()),
            last_sync_end_at: value.last_sync_end_at.map(|x| x.and_utc()),
            description: value.description,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn get_idp_mock<I: Into<String>>(id: I, driver: &str) -> db_idp::Model {
        db_idp::Model {
            id: id.into(),
            name: "directory".into(),
            driver: driver.into(),
            target_domain_id: Some("default".into()),
            enabled: true,
            auto_create_user: true,
            sync_status: "idle".into(),
            status: "connected".into(),
            ..Default::default()
        }
    }
}
