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
//! Persistence of the key rings in the `fernet_key` table.
use sea_orm::entity::*;
use sea_orm::query::*;
use sea_orm::{DatabaseConnection, TransactionTrait};

use super::{KeyRingError, KeyRingKind};
use crate::db::entity::{fernet_key as db_fernet_key, prelude::FernetKey as DbFernetKey};
use crate::error::DbContextExt;

/// Keys of the ring ordered by the index (primary first).
pub async fn load_keys(
    db: &DatabaseConnection,
    kind: KeyRingKind,
) -> Result<Vec<String>, KeyRingError> {
    Ok(DbFernetKey::find()
        .filter(db_fernet_key::Column::Type.eq(kind.as_str()))
        .order_by_asc(db_fernet_key::Column::Index)
        .all(db)
        .await
        .context("loading fernet keys")?
        .into_iter()
        .map(|row| row.key)
        .collect())
}

/// Replace the stored ring.
pub async fn save_keys(
    db: &DatabaseConnection,
    kind: KeyRingKind,
    keys: &[String],
) -> Result<(), KeyRingError> {
    let txn = db.begin().await.context("starting transaction")?;
    DbFernetKey::delete_many()
        .filter(db_fernet_key::Column::Type.eq(kind.as_str()))
        .exec(&txn)
        .await
        .context("deleting fernet keys")?;
    for (idx, key) in keys.iter().enumerate() {
        db_fernet_key::ActiveModel {
            r#type: Set(kind.as_str().to_string()),
            index: Set(idx as i32),
            key: Set(key.clone()),
        }
        .insert(&txn)
        .await
        .context("persisting fernet key")?;
    }
    txn.commit().await.context("committing fernet keys")?;
    Ok(())
}
