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
use sea_orm::sea_query::OnConflict;

use crate::db::entity::{prelude::RolePolicy as DbRolePolicy, role_policy as db_role_policy};
use crate::error::DbContextExt;
use crate::policy::PolicyProviderError;
use crate::policy::types::*;

impl TryFrom<db_role_policy::Model> for RolePolicy {
    type Error = PolicyProviderError;

    fn try_from(value: db_role_policy::Model) -> Result<Self, Self::Error> {
        let ips = parse_ip_whitelist(&value.ips).map_err(|message| {
            PolicyProviderError::InvalidRolePolicy {
                policy_id: value.policy_id.clone(),
                message,
            }
        })?;
        Ok(Self {
            role_id: Some(value.role_id).filter(|x| !x.is_empty()),
            project_id: Some(value.project_id).filter(|x| !x.is_empty()),
            policy_id: value.policy_id,
            auth: value.auth,
            ips,
            valid_since: value.valid_since.map(|x| x.and_utc()),
            valid_until: value.valid_until.map(|x| x.and_utc()),
        })
    }
}

/// Candidate bindings of the request. Guest requests only see the bindings
/// not requiring authentication.
pub async fn list(
    db: &DatabaseConnection,
    request: &PolicyRequest,
) -> Result<Vec<RolePolicy>, PolicyProviderError> {
    let mut select = DbRolePolicy::find();
    if request.is_guest() {
        select = select.filter(db_role_policy::Column::Auth.eq(false));
    } else {
        select = select.filter(
            Condition::any()
                .add(db_role_policy::Column::RoleId.eq(""))
                .add(db_role_policy::Column::RoleId.is_in(request.role_ids.clone())),
        );
        if let Some(project_id) = &request.project_id {
            select = select.filter(
                Condition::any()
                    .add(db_role_policy::Column::ProjectId.eq(""))
                    .add(db_role_policy::Column::ProjectId.eq(project_id)),
            );
        }
    }
    Ok(select
        .all(db)
        .await
        .context("fetching role policies")?
        .into_iter()
        .filter_map(|model| match RolePolicy::try_from(model) {
            Ok(val) => Some(val),
            Err(err) => {
                tracing::warn!("ignoring role policy binding: {}", err);
                None
            }
        })
        .collect())
}

pub async fn upsert(
    db: &DatabaseConnection,
    binding: RolePolicy,
) -> Result<RolePolicy, PolicyProviderError> {
    let entry = db_role_policy::ActiveModel {
        role_id: Set(binding.role_id.clone().unwrap_or_default()),
        project_id: Set(binding.project_id.clone().unwrap_or_default()),
        policy_id: Set(binding.policy_id.clone()),
        auth: Set(binding.auth),
        ips: Set(format_ip_whitelist(&binding.ips)),
        valid_since: Set(binding.valid_since.map(|x| x.naive_utc())),
        valid_until: Set(binding.valid_until.map(|x| x.naive_utc())),
    };
    DbRolePolicy::insert(entry)
        .on_conflict(
            OnConflict::columns([
                db_role_policy::Column::RoleId,
                db_role_policy::Column::ProjectId,
                db_role_policy::Column::PolicyId,
            ])
            .update_columns([
                db_role_policy::Column::Auth,
                db_role_policy::Column::Ips,
                db_role_policy::Column::ValidSince,
                db_role_policy::Column::ValidUntil,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .context("persisting role policy binding")?;
    Ok(binding)
}
