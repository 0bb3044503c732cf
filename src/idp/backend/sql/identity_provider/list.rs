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

use crate::db::entity::{identity_provider as db_idp, prelude::IdentityProvider as DbIdp};
use crate::error::DbContextExt;
use crate::idp::IdpProviderError;
use crate::idp::types::IdentityProvider;

pub async fn list(db: &DatabaseConnection) -> Result<Vec<IdentityProvider>, IdpProviderError> {
    DbIdp::find()
        .order_by_asc(db_idp::Column::Name)
        .all(db)
        .await
        .context("listing identity providers")?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}
