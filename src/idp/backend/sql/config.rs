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
//! Identity provider options in the whitelisted and sensitive config tables.
use sea_orm::entity::*;
use sea_orm::query::*;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde_json::Value;

use crate::db::entity::{
    prelude::{SensitiveConfig as DbSensitiveConfig, WhitelistedConfig as DbWhitelistedConfig},
    sensitive_config as db_sensitive_config, whitelisted_config as db_whitelisted_config,
};
use crate::error::DbContextExt;
use crate::idp::IdpProviderError;
use crate::idp::types::{IDP_CONFIG_RES_TYPE, IdpConfig};

/// Read the options. Whitelisted values are JSON documents, sensitive values
/// are returned as the stored ciphertext strings.
pub async fn get<I: AsRef<str>>(
    db: &DatabaseConnection,
    idp_id: I,
) -> Result<(IdpConfig, IdpConfig), IdpProviderError> {
    let mut whitelisted = IdpConfig::default();
    for row in DbWhitelistedConfig::find()
        .filter(db_whitelisted_config::Column::ResType.eq(IDP_CONFIG_RES_TYPE))
        .filter(db_whitelisted_config::Column::ResId.eq(idp_id.as_ref()))
        .all(db)
        .await
        .context("fetching identity provider options")?
    {
        let value: Value =
            serde_json::from_str(&row.value).map_err(|_| IdpProviderError::ConfigValue {
                group: row.group.clone(),
                option: row.opt.clone(),
            })?;
        whitelisted.set(row.group, row.opt, value);
    }

    let mut sensitive = IdpConfig::default();
    for row in DbSensitiveConfig::find()
        .filter(db_sensitive_config::Column::ResType.eq(IDP_CONFIG_RES_TYPE))
        .filter(db_sensitive_config::Column::ResId.eq(idp_id.as_ref()))
        .all(db)
        .await
        .context("fetching identity provider sensitive options")?
    {
        sensitive.set(row.group, row.opt, Value::String(row.value));
    }
    Ok((whitelisted, sensitive))
}

async fn delete_in<C: ConnectionTrait>(db: &C, idp_id: &str) -> Result<(), IdpProviderError> {
    DbWhitelistedConfig::delete_many()
        .filter(db_whitelisted_config::Column::ResType.eq(IDP_CONFIG_RES_TYPE))
        .filter(db_whitelisted_config::Column::ResId.eq(idp_id))
        .exec(db)
        .await
        .context("deleting identity provider options")?;
    DbSensitiveConfig::delete_many()
        .filter(db_sensitive_config::Column::ResType.eq(IDP_CONFIG_RES_TYPE))
        .filter(db_sensitive_config::Column::ResId.eq(idp_id))
        .exec(db)
        .await
        .context("deleting identity provider sensitive options")?;
    Ok(())
}

pub async fn delete<I: AsRef<str>>(db: &DatabaseConnection, idp_id: I) -> Result<(), IdpProviderError> {
    delete_in(db, idp_id.as_ref()).await
}

/// Replace the options. Sensitive values must be encrypted already.
pub async fn set<I: AsRef<str>>(
    db: &DatabaseConnection,
    idp_id: I,
    whitelisted: &IdpConfig,
    sensitive: &IdpConfig,
) -> Result<(), IdpProviderError> {
    let idp_id = idp_id.as_ref();
    let txn = db.begin().await.context("starting transaction")?;
    delete_in(&txn, idp_id).await?;

    let rows = whitelisted
        .iter()
        .map(|(group, opt, value)| {
            Ok(db_whitelisted_config::ActiveModel {
                res_type: Set(IDP_CONFIG_RES_TYPE.into()),
                res_id: Set(idp_id.into()),
                group: Set(group.clone()),
                opt: Set(opt.clone()),
                value: Set(serde_json::to_string(value)?),
            })
        })
        .collect::<Result<Vec<_>, IdpProviderError>>()?;
    if !rows.is_empty() {
        DbWhitelistedConfig::insert_many(rows)
            .exec_without_returning(&txn)
            .await
            .context("storing identity provider options")?;
    }

    let rows: Vec<db_sensitive_config::ActiveModel> = sensitive
        .iter()
        .filter_map(|(group, opt, value)| {
            value.as_str().map(|ciphertext| db_sensitive_config::ActiveModel {
                res_type: Set(IDP_CONFIG_RES_TYPE.into()),
                res_id: Set(idp_id.into()),
                group: Set(group.clone()),
                opt: Set(opt.clone()),
                value: Set(ciphertext.to_string()),
            })
        })
        .collect();
    if !rows.is_empty() {
        DbSensitiveConfig::insert_many(rows)
            .exec_without_returning(&txn)
            .await
            .context("storing identity provider sensitive options")?;
    }
    txn.commit().await.context("committing identity provider options")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_get() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                db_whitelisted_config::Model {
                    res_type: IDP_CONFIG_RES_TYPE.into(),
                    res_id: "idp".into(),
                    group: "ldap".into(),
                    opt: "page_size".into(),
                    value: "50".into(),
                },
                db_whitelisted_config::Model {
                    res_type: IDP_CONFIG_RES_TYPE.into(),
                    res_id: "idp".into(),
                    group: "ldap".into(),
                    opt: "url".into(),
                    value: "\"ldap://dir\"".into(),
                },
            ]])
            .append_query_results([vec![db_sensitive_config::Model {
                res_type: IDP_CONFIG_RES_TYPE.into(),
                res_id: "idp".into(),
                group: "ldap".into(),
                opt: "password".into(),
                value: "gAAAA".into(),
            }]])
            .into_connection();
        let (whitelisted, sensitive) = get(&db, "idp").await.unwrap();
        assert_eq!(Some(&json!(50)), whitelisted.get("ldap", "page_size"));
        assert_eq!(Some("ldap://dir".to_string()), whitelisted.get_str("ldap", "url"));
        assert_eq!(Some("gAAAA".to_string()), sensitive.get_str("ldap", "password"));
    }

    #[tokio::test]
    async fn test_get_broken_value() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![db_whitelisted_config::Model {
                res_type: IDP_CONFIG_RES_TYPE.into(),
                res_id: "idp".into(),
                group: "ldap".into(),
                opt: "url".into(),
                value: "ldap://dir".into(),
            }]])
            .into_connection();
        assert!(matches!(
            get(&db, "idp").await,
            Err(IdpProviderError::ConfigValue { .. })
        ));
    }
}
