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
use sea_orm::sea_query::{Expr, OnConflict};

use crate::db::entity::{prelude::TokenCache as DbTokenCache, token_cache as db_token_cache};
use crate::error::DbContextExt;
use crate::revoke::RevokeProviderError;
use crate::revoke::types::*;

impl From<db_token_cache::Model> for TokenRecord {
    fn from(value: db_token_cache::Model) -> Self {
        Self {
            audit_ids: TokenRecord::split_chain(&value.audit_ids),
            token: value.token,
            expires_at: value.expires_at.and_utc(),
            method: value.method,
        }
    }
}

pub async fn upsert(
    db: &DatabaseConnection,
    record: &TokenRecord,
    valid: bool,
) -> Result<(), RevokeProviderError> {
    let entry = db_token_cache::ActiveModel {
        token: Set(record.token.clone()),
        expires_at: Set(record.expires_at.naive_utc()),
        valid: Set(valid),
        method: Set(record.method.clone()),
        audit_ids: Set(record.chain()),
    };
    DbTokenCache::insert(entry)
        .on_conflict(
            OnConflict::column(db_token_cache::Column::Token)
                .update_column(db_token_cache::Column::Valid)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .context("persisting token cache record")?;
    Ok(())
}

pub async fn list_valid_by_chain(
    db: &DatabaseConnection,
    method: &str,
    chain: &str,
) -> Result<Vec<TokenRecord>, RevokeProviderError> {
    Ok(DbTokenCache::find()
        .filter(db_token_cache::Column::Method.eq(method))
        .filter(db_token_cache::Column::AuditIds.eq(chain))
        .filter(db_token_cache::Column::Valid.eq(true))
        .all(db)
        .await
        .context("fetching token cache records by the audit chain")?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn invalidate(
    db: &DatabaseConnection,
    tokens: &[String],
) -> Result<u64, RevokeProviderError> {
    if tokens.is_empty() {
        return Ok(0);
    }
    Ok(DbTokenCache::update_many()
        .col_expr(db_token_cache::Column::Valid, Expr::value(false))
        .filter(db_token_cache::Column::Token.is_in(tokens.iter().cloned()))
        .exec(db)
        .await
        .context("invalidating tokens")?
        .rows_affected)
}

pub async fn is_revoked(db: &DatabaseConnection, token: &str) -> Result<bool, RevokeProviderError> {
    Ok(DbTokenCache::find()
        .filter(db_token_cache::Column::Token.eq(token))
        .filter(db_token_cache::Column::Valid.eq(false))
        .count(db)
        .await
        .context("checking token revocation")?
        > 0)
}

pub async fn delete_expired(
    db: &DatabaseConnection,
    before: DateTime<Utc>,
) -> Result<u64, RevokeProviderError> {
    Ok(DbTokenCache::delete_many()
        .filter(db_token_cache::Column::ExpiresAt.lt(before.naive_utc()))
        .exec(db)
        .await
        .context("deleting expired token cache records")?
        .rows_affected)
}
