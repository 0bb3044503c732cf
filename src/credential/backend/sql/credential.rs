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

use crate::credential::CredentialProviderError;
use crate::credential::types::*;
use crate::db::entity::{credential as db_credential, prelude::Credential as DbCredential};
use crate::error::DbContextExt;

impl TryFrom<db_credential::Model> for EncryptedCredential {
    type Error = CredentialProviderError;

    fn try_from(value: db_credential::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            r#type: CredentialType::try_from(value.r#type.as_str())
                .map_err(CredentialProviderError::CredentialType)?,
            id: value.id,
            user_id: value.user_id,
            project_id: value.project_id,
            key_hash: value.key_hash,
            encrypted_blob: value.encrypted_blob,
            enabled: value.enabled,
            created_at: value.created_at.map(|x| x.and_utc()),
        })
    }
}

pub async fn create(
    db: &DatabaseConnection,
    credential: EncryptedCredential,
) -> Result<EncryptedCredential, CredentialProviderError> {
    db_credential::ActiveModel {
        id: Set(credential.id),
        user_id: Set(credential.user_id),
        project_id: Set(credential.project_id),
        r#type: Set(credential.r#type.to_string()),
        key_hash: Set(credential.key_hash),
        encrypted_blob: Set(credential.encrypted_blob),
        enabled: Set(credential.enabled),
        created_at: Set(credential.created_at.map(|x| x.naive_utc())),
    }
    .insert(db)
    .await
    .context("inserting credential")?
    .try_into()
}

pub async fn get<I: AsRef<str>>(
    db: &DatabaseConnection,
    id: I,
) -> Result<Option<EncryptedCredential>, CredentialProviderError> {
    DbCredential::find_by_id(id.as_ref())
        .one(db)
        .await
        .context("fetching credential by id")?
        .map(TryInto::try_into)
        .transpose()
}

pub async fn list<U: AsRef<str>>(
    db: &DatabaseConnection,
    user_id: U,
    r#type: Option<CredentialType>,
) -> Result<Vec<EncryptedCredential>, CredentialProviderError> {
    let mut select = DbCredential::find().filter(db_credential::Column::UserId.eq(user_id.as_ref()));
    if let Some(val) = r#type {
        select = select.filter(db_credential::Column::Type.eq(val.as_str()));
    }
    select
        .order_by_asc(db_credential::Column::Id)
        .all(db)
        .await
        .context("listing credentials")?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    use super::*;

    #[tokio::test]
    async fn test_list_by_type() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![db_credential::Model {
                id: "c1".into(),
                user_id: "u1".into(),
                project_id: None,
                r#type: "totp".into(),
                key_hash: "AAAAAAAAAAAAAAAA".into(),
                encrypted_blob: "gAAAA".into(),
                enabled: true,
                created_at: None,
            }]])
            .into_connection();
        let res = list(&db, "u1", Some(CredentialType::Totp)).await.unwrap();
        assert_eq!(CredentialType::Totp, res[0].r#type);
        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "credential"."id", "credential"."user_id", "credential"."project_id", "credential"."type", "credential"."key_hash", "credential"."encrypted_blob", "credential"."enabled", "credential"."created_at" FROM "credential" WHERE "credential"."user_id" = $1 AND "credential"."type" = $2 ORDER BY "credential"."id" ASC"#,
                ["u1".into(), "totp".into()]
            ),]
        );
    }
}
