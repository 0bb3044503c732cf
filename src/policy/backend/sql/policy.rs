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
use sea_orm::query::*;

use crate::db::entity::{policy as db_policy, prelude::Policy as DbPolicy};
use crate::error::DbContextExt;
use crate::policy::PolicyProviderError;
use crate::policy::types::*;

impl TryFrom<db_policy::Model> for Policy {
    type Error = PolicyProviderError;

    fn try_from(value: db_policy::Model) -> Result<Self, Self::Error> {
        let scope = PolicyScope::try_from(value.scope.as_str()).map_err(|message| {
            PolicyProviderError::InvalidPolicy {
                id: value.id.clone(),
                message,
            }
        })?;
        let blob = serde_json::from_str(&value.blob).map_err(|err| {
            PolicyProviderError::InvalidPolicy {
                id: value.id.clone(),
                message: err.to_string(),
            }
        })?;
        Ok(Self {
            id: value.id,
            name: value.name,
            scope,
            blob: PolicyDocument(blob),
            enabled: value.enabled,
            description: value.description,
        })
    }
}

pub async fn get<I: AsRef<str>>(
    db: &DatabaseConnection,
    id: I,
) -> Result<Option<Policy>, PolicyProviderError> {
    DbPolicy::find_by_id(id.as_ref())
        .one(db)
        .await
        .context("fetching policy by id")?
        .map(TryInto::try_into)
        .transpose()
}

pub async fn get_by_name<N: AsRef<str>>(
    db: &DatabaseConnection,
    name: N,
) -> Result<Option<Policy>, PolicyProviderError> {
    DbPolicy::find()
        .filter(db_policy::Column::Name.eq(name.as_ref()))
        .one(db)
        .await
        .context("fetching policy by name")?
        .map(TryInto::try_into)
        .transpose()
}

/// Fetch the policies by IDs. Policies that can not be parsed are skipped.
pub async fn list_by_ids(
    db: &DatabaseConnection,
    ids: &[String],
) -> Result<Vec<Policy>, PolicyProviderError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(DbPolicy::find()
        .filter(db_policy::Column::Id.is_in(ids.iter().cloned()))
        .order_by_asc(db_policy::Column::Name)
        .all(db)
        .await
        .context("fetching policies by ids")?
        .into_iter()
        .filter_map(|model| match Policy::try_from(model) {
            Ok(val) => Some(val),
            Err(err) => {
                tracing::warn!("ignoring policy: {}", err);
                None
            }
        })
        .collect())
}

pub async fn create(db: &DatabaseConnection, policy: Policy) -> Result<Policy, PolicyProviderError> {
    db_policy::ActiveModel {
        id: Set(policy.id),
        name: Set(policy.name),
        scope: Set(policy.scope.to_string()),
        blob: Set(serde_json::to_string(&policy.blob)?),
        enabled: Set(policy.enabled),
        description: Set(policy.description),
    }
    .insert(db)
    .await
    .context("inserting policy")?
    .try_into()
}
