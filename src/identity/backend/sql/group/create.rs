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
use uuid::Uuid;

use crate::db::entity::group as db_group;
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;
use crate::identity::types::{Group, GroupCreate};

pub async fn create(
    db: &DatabaseConnection,
    group: GroupCreate,
) -> Result<Group, IdentityProviderError> {
    let entry = db_group::ActiveModel {
        id: Set(group
            .id
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string())),
        domain_id: Set(group.domain_id),
        name: Set(group.name),
        displayname: Set(group.displayname),
        description: Set(group.description),
    }
    .insert(db)
    .await
    .context("inserting group")?;
    Ok(entry.into())
}
