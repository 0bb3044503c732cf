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
//! User group memberships.
use sea_orm::DatabaseConnection;
use sea_orm::entity::*;
use sea_orm::query::*;
use std::collections::HashSet;

use crate::db::entity::{
    group as db_group,
    prelude::{Group as DbGroup, UserGroupMembership as DbUserGroupMembership},
    user_group_membership as db_user_group_membership,
};
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;
use crate::identity::types::Group;

/// Groups the user is a member of.
pub async fn list_user_groups<U: AsRef<str>>(
    db: &DatabaseConnection,
    user_id: U,
) -> Result<Vec<Group>, IdentityProviderError> {
    Ok(DbGroup::find()
        .inner_join(DbUserGroupMembership)
        .filter(db_user_group_membership::Column::UserId.eq(user_id.as_ref()))
        .order_by_asc(db_group::Column::Name)
        .all(db)
        .await
        .context("listing groups of the user")?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// IDs of the group members.
pub async fn list_group_members<G: AsRef<str>>(
    db: &DatabaseConnection,
    group_id: G,
) -> Result<Vec<String>, IdentityProviderError> {
    Ok(DbUserGroupMembership::find()
        .filter(db_user_group_membership::Column::GroupId.eq(group_id.as_ref()))
        .all(db)
        .await
        .context("listing group members")?
        .into_iter()
        .map(|x| x.user_id)
        .collect())
}

/// Add the user to the group. Existing membership is kept as is.
pub async fn add<U: AsRef<str>, G: AsRef<str>>(
    db: &DatabaseConnection,
    user_id: U,
    group_id: G,
) -> Result<(), IdentityProviderError> {
    let existing = DbUserGroupMembership::find_by_id((
        user_id.as_ref().to_string(),
        group_id.as_ref().to_string(),
    ))
    .one(db)
    .await
    .context("checking group membership")?;
    if existing.is_none() {
        db_user_group_membership::ActiveModel {
            user_id: Set(user_id.as_ref().to_string()),
            group_id: Set(group_id.as_ref().to_string()),
        }
        .insert(db)
        .await
        .context("adding user to the group")?;
    }
    Ok(())
}

/// Replace the group members with the given set of users.
pub async fn set_group_members<G: AsRef<str>>(
    db: &DatabaseConnection,
    group_id: G,
    user_ids: &HashSet<String>,
) -> Result<(), IdentityProviderError> {
    let group_id = group_id.as_ref();
    let txn = db.begin().await.context("starting transaction")?;
    let current: HashSet<String> = DbUserGroupMembership::find()
        .filter(db_user_group_membership::Column::GroupId.eq(group_id))
        .all(&txn)
        .await
        .context("listing group members")?
        .into_iter()
        .map(|x| x.user_id)
        .collect();

    let obsolete: Vec<&String> = current.difference(user_ids).collect();
    if !obsolete.is_empty() {
        DbUserGroupMembership::delete_many()
            .filter(db_user_group_membership::Column::GroupId.eq(group_id))
            .filter(db_user_group_membership::Column::UserId.is_in(obsolete))
            .exec(&txn)
            .await
            .context("removing group members")?;
    }
    let missing: Vec<db_user_group_membership::ActiveModel> = user_ids
        .difference(&current)
        .map(|user_id| db_user_group_membership::ActiveModel {
            user_id: Set(user_id.clone()),
            group_id: Set(group_id.to_string()),
        })
        .collect();
    if !missing.is_empty() {
        DbUserGroupMembership::insert_many(missing)
            .exec_without_returning(&txn)
            .await
            .context("adding group members")?;
    }
    txn.commit().await.context("committing group members")?;
    Ok(())
}
