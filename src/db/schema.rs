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
//! Tables derived from the entities.
//!
//! Used by `keystone-manage db-sync` and by the tests running on SQLite.
//! Existing tables are left untouched.
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityName, EntityTrait, Schema};
use tracing::debug;

use crate::db::entity::prelude::*;
use crate::error::{DatabaseError, DbContextExt};

async fn create_table<E>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DatabaseError>
where
    E: EntityTrait,
{
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    debug!("creating table {}", entity.table_name());
    db.execute(db.get_database_backend().build(&stmt))
        .await
        .context(&format!("creating table {}", entity.table_name()))?;
    Ok(())
}

/// Create the missing tables. Referenced tables come first.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    let schema = Schema::new(db.get_database_backend());
    create_table(db, &schema, Project).await?;
    create_table(db, &schema, User).await?;
    create_table(db, &schema, LocalUser).await?;
    create_table(db, &schema, Password).await?;
    create_table(db, &schema, Group).await?;
    create_table(db, &schema, UserGroupMembership).await?;
    create_table(db, &schema, Role).await?;
    create_table(db, &schema, Assignment).await?;
    create_table(db, &schema, Policy).await?;
    create_table(db, &schema, RolePolicy).await?;
    create_table(db, &schema, Region).await?;
    create_table(db, &schema, Service).await?;
    create_table(db, &schema, Endpoint).await?;
    create_table(db, &schema, IdentityProvider).await?;
    create_table(db, &schema, IdMapping).await?;
    create_table(db, &schema, WhitelistedConfig).await?;
    create_table(db, &schema, SensitiveConfig).await?;
    create_table(db, &schema, Credential).await?;
    create_table(db, &schema, FernetKey).await?;
    create_table(db, &schema, TokenCache).await?;
    Ok(())
}
