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

use chrono::Utc;
use sea_orm::DatabaseConnection;
use sea_orm::entity::*;
use uuid::Uuid;

use crate::db::entity::project as db_project;
use crate::error::DbContextExt;
use crate::resource::ResourceProviderError;
use crate::resource::types::{Domain, DomainCreate, ROOT_DOMAIN_ID};

pub async fn create(
    db: &DatabaseConnection,
    domain: DomainCreate,
) -> Result<Domain, ResourceProviderError> {
    let entry = db_project::ActiveModel {
        id: Set(domain
            .id
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string())),
        name: Set(domain.name),
        description: Set(domain.description),
        enabled: Set(domain.enabled),
        domain_id: Set(ROOT_DOMAIN_ID.into()),
        parent_id: Set(None),
        is_domain: Set(true),
        created_at: Set(Some(Utc::now().naive_utc())),
    }
    .insert(db)
    .await
    .context("creating domain")?;
    Ok(entry.into())
}
