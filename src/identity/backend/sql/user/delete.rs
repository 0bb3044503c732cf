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
    local_user as db_local_user, password as db_password,
    prelude::{
        LocalUser as DbLocalUser, Password as DbPassword, User as DbUser,
        UserGroupMembership as DbUserGroupMembership,
    },
    user_group_membership as db_user_group_membership,
};
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;

/// Delete the user together with the password history and the group
/// memberships.
pub async fn delete<U: AsRef<str>>(
    db: &DatabaseConnection,
    user_id: U,
) -> Result<(), IdentityProviderError> {
    let user_id = user_id.as_ref();
    let txn = db.begin().await.context("starting transaction")?;
    DbUserGroupMembership::delete_many()
        .filter(db_user_group_membership::Column::UserId.eq(user_id))
        .exec(&txn)
        .await
        .context("deleting group memberships of the user")?;
    if let Some(local) = DbLocalUser::find()
        .filter(db_local_user::Column::UserId.eq(user_id))
        .one(&txn)
        .await
        .context("fetching local user")?
    {
        DbPassword::delete_many()
            .filter(db_password::Column::LocalUserId.eq(local.id))
            .exec(&txn)
            .await
            .context("deleting password history")?;
        DbLocalUser::delete_by_id(local.id)
            .exec(&txn)
            .await
            .context("deleting local user")?;
    }
    let res = DbUser::delete_by_id(user_id)
        .exec(&txn)
        .await
        .context("deleting user")?;
    if res.rows_affected == 0 {
        return Err(IdentityProviderError::UserNotFound(user_id.to_string()));
    }
    txn.commit().await.context("committing user deletion")?;
    Ok(())
}
