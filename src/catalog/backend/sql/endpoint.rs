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

use crate::catalog::CatalogProviderError;
use crate::catalog::types::*;
use crate::db::entity::endpoint as db_endpoint;
use crate::error::DbContextExt;

impl TryFrom<db_endpoint::Model> for Endpoint {
    type Error = CatalogProviderError;

    fn try_from(value: db_endpoint::Model) -> Result<Self, Self::Error> {
        let interface = Interface::try_from(value.interface.as_str()).map_err(|message| {
            CatalogProviderError::InvalidEndpoint {
                id: value.id.clone(),
                message,
            }
        })?;
        Ok(Self {
            id: value.id,
            name: value.name,
            interface,
            region_id: value.region_id,
            service_id: value.service_id,
            url: value.url,
            enabled: value.enabled,
        })
    }
}

pub async fn create(
    db: &DatabaseConnection,
    endpoint: Endpoint,
) -> Result<Endpoint, CatalogProviderError> {
    db_endpoint::ActiveModel {
        id: Set(endpoint.id),
        name: Set(endpoint.name),
        interface: Set(endpoint.interface.to_string()),
        service_id: Set(endpoint.service_id),
        url: Set(endpoint.url),
        enabled: Set(endpoint.enabled),
        region_id: Set(endpoint.region_id),
    }
    .insert(db)
    .await
    .context("inserting endpoint")?
    .try_into()
}
