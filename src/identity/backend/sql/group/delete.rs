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

use sea_orm::entity::*;
use sea_orm::query::*;
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::db::entity::{
    prelude::{Group as DbGroup, UserGroupMembership as DbUserGroupMembership},
    user_group_membership as db_user_group_membership,
};
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;

/// Delete the group and its memberships.
pub async fn delete<G: AsRef<str>>(
    db: &DatabaseConnection,
    group_id: G,
) -> Result<(), IdentityProviderError> {
    let group_id = group_id.as_ref();
    let txn = db.begin().await.context("starting transaction")?;
    DbUserGroupMembership::delete_many()
        .filter(db_user_group_membership::Column::GroupId.eq(group_id))
        .exec(&txn)
        .await
        .context("deleting group memberships")?;
    let res = DbGroup::delete_by_id(group_id)
        .exec(&txn)
        .await
        .context("deleting group")?;
    if res.rows_affected == 0 {
        return Err(IdentityProviderError::GroupNotFound(group_id.to_string()));
    }
    txn.commit().await.context("committing group deletion")?;
    Ok(())
}
