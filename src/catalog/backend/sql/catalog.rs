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
use std::collections::HashMap;

use crate::catalog::CatalogProviderError;
use crate::catalog::types::*;
use crate::db::entity::{
    endpoint as db_endpoint,
    prelude::{Endpoint as DbEndpoint, Region as DbRegion, Service as DbService},
    service as db_service,
};
use crate::error::DbContextExt;

/// Join the enabled endpoints with the enabled services and the regions.
pub async fn list(db: &DatabaseConnection) -> Result<Vec<CatalogEntry>, CatalogProviderError> {
    let services: HashMap<String, db_service::Model> = DbService::find()
        .filter(db_service::Column::Enabled.eq(true))
        .all(db)
        .await
        .context("fetching enabled services")?
        .into_iter()
        .map(|x| (x.id.clone(), x))
        .collect();
    let regions: HashMap<String, Option<String>> = DbRegion::find()
        .all(db)
        .await
        .context("fetching regions")?
        .into_iter()
        .map(|x| (x.id, x.name))
        .collect();
    let endpoints = DbEndpoint::find()
        .filter(db_endpoint::Column::Enabled.eq(true))
        .all(db)
        .await
        .context("fetching enabled endpoints")?;

    let mut entries = Vec::with_capacity(endpoints.len());
    for ep in endpoints {
        let Some(service) = services.get(&ep.service_id) else {
            continue;
        };
        let interface = match Interface::try_from(ep.interface.as_str()) {
            Ok(val) => val,
            Err(err) => {
                tracing::warn!("skipping endpoint {} in the catalog: {}", ep.id, err);
                continue;
            }
        };
        let region = ep
            .region_id
            .as_ref()
            .and_then(|rid| regions.get(rid).cloned().flatten());
        entries.push(CatalogEntry {
            id: ep.id,
            name: ep.name,
            interface,
            url: ep.url,
            region_id: ep.region_id,
            region,
            service_id: service.id.clone(),
            service_type: service.r#type.clone(),
            service_name: service.name.clone(),
        });
    }
    Ok(entries)
}
