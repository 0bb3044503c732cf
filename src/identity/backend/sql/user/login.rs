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
use sea_orm::query::*;
use sea_orm::sea_query::Expr;

use crate::db::entity::{prelude::User as DbUser, user as db_user};
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;
use crate::identity::types::LoginContext;

/// Record the last activity of the user.
pub async fn record_login<U: AsRef<str>>(
    db: &DatabaseConnection,
    user_id: U,
    context: &LoginContext,
) -> Result<(), IdentityProviderError> {
    DbUser::update_many()
        .col_expr(
            db_user::Column::LastActiveAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .col_expr(
            db_user::Column::LastLoginIp,
            Expr::value(context.ip.clone()),
        )
        .col_expr(
            db_user::Column::LastLoginSource,
            Expr::value(context.source.clone()),
        )
        .filter(db_user::Column::Id.eq(user_id.as_ref()))
        .exec(db)
        .await
        .context("recording user login")?;
    Ok(())
}
