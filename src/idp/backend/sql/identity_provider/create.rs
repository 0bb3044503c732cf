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

use sea_orm::DatabaseConnection;
use sea_orm::entity::*;

use crate::db::entity::identity_provider as db_idp;
use crate::error::DbContextExt;
use crate::idp::IdpProviderError;
use crate::idp::types::IdentityProvider;

pub async fn create(
    db: &DatabaseConnection,
    idp: IdentityProvider,
) -> Result<IdentityProvider, IdpProviderError> {
    db_idp::ActiveModel {
        id: Set(idp.id),
        name: Set(idp.name),
        driver: Set(idp.driver),
        template: Set(idp.template),
        target_domain_id: Set(idp.target_domain_id),
        auto_create_project: Set(idp.auto_create_project),
        auto_create_user: Set(idp.auto_create_user),
        enabled: Set(idp.enabled),
        is_sso: Set(idp.is_sso),
        is_default: Set(idp.is_default),
        sync_status: Set(idp.sync_status.to_string()),
        sync_status_at: Set(idp.sync_status_at.map(|x| x.naive_utc())),
        status: Set(idp.status.to_string()),
        error_count: Set(idp.error_count),
        sync_interval_seconds: Set(idp.sync_interval_seconds),
        last_sync: Set(idp.last_sync.map(|x| x.naive_utc())),
        last_sync_end_at: Set(idp.last_sync_end_at.map(|x| x.naive_utc())),
        description: Set(idp.description),
    }
    .insert(db)
    .await
    .context("inserting identity provider")?
    .try_into()
}
