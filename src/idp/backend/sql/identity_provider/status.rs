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

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use sea_orm::entity::*;
use sea_orm::query::*;
use sea_orm::sea_query::Expr;

use crate::db::entity::{identity_provider as db_idp, prelude::IdentityProvider as DbIdp};
use crate::error::DbContextExt;
use crate::idp::IdpProviderError;
use crate::idp::types::{IdpHealth, SyncStatus};

/// Conditional update of the sync status.
///
/// Entering `syncing` stamps `last_sync`, returning to `idle` stamps
/// `last_sync_end_at`.
pub async fn transition_sync_status<I: AsRef<str>>(
    db: &DatabaseConnection,
    id: I,
    from: SyncStatus,
    to: SyncStatus,
    stuck_before: Option<DateTime<Utc>>,
) -> Result<bool, IdpProviderError> {
    let now = Utc::now().naive_utc();
    let mut update = DbIdp::update_many()
        .col_expr(db_idp::Column::SyncStatus, Expr::value(to.as_str()))
        .col_expr(db_idp::Column::SyncStatusAt, Expr::value(now));
    match to {
        SyncStatus::Syncing => {
            update = update.col_expr(db_idp::Column::LastSync, Expr::value(now));
        }
        SyncStatus::Idle => {
            update = update.col_expr(db_idp::Column::LastSyncEndAt, Expr::value(now));
        }
        SyncStatus::Queued => {}
    }
    let mut status_cond = Condition::any().add(db_idp::Column::SyncStatus.eq(from.as_str()));
    if let Some(stuck_before) = stuck_before {
        status_cond = status_cond.add(db_idp::Column::SyncStatusAt.lt(stuck_before.naive_utc()));
    }
    let res = update
        .filter(db_idp::Column::Id.eq(id.as_ref()))
        .filter(status_cond)
        .exec(db)
        .await
        .context("updating identity provider sync status")?;
    Ok(res.rows_affected > 0)
}

/// Record the reachability. Every `disconnected` mark increments the error
/// counter, `connected` resets it.
pub async fn set_health<I: AsRef<str>>(
    db: &DatabaseConnection,
    id: I,
    health: IdpHealth,
) -> Result<(), IdpProviderError> {
    let update = DbIdp::update_many().col_expr(db_idp::Column::Status, Expr::value(health.as_str()));
    let update = match health {
        IdpHealth::Connected => update.col_expr(db_idp::Column::ErrorCount, Expr::value(0)),
        IdpHealth::Disconnected => update.col_expr(
            db_idp::Column::ErrorCount,
            Expr::col(db_idp::Column::ErrorCount).add(1),
        ),
    };
    update
        .filter(db_idp::Column::Id.eq(id.as_ref()))
        .exec(db)
        .await
        .context("updating identity provider status")?;
    Ok(())
}
