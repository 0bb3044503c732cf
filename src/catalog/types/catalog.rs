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
//! Catalog documents.
//!
//! The catalog is materialized from the flat list of enabled endpoints joined
//! with their service and region. The v3 document nests the endpoints under
//! the service. The v2 document collapses the interfaces of one region into a
//! single endpoint entry.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::endpoint::Interface;

/// An enabled endpoint together with its service and region.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: Option<String>,
    pub interface: Interface,
    pub url: String,
    pub region_id: Option<String>,
    /// Region name.
    pub region: Option<String>,
    pub service_id: String,
    pub service_type: String,
    pub service_name: String,
}

/// The service catalog.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EndpointV3 {
    pub id: String,
    pub name: Option<String>,
    pub interface: Interface,
    pub region: Option<String>,
    pub region_id: Option<String>,
    pub url: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ServiceV3 {
    pub id: String,
    pub name: String,
    pub r#type: String,
    pub endpoints: Vec<EndpointV3>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct EndpointV2 {
    pub id: String,
    pub region: Option<String>,
    #[serde(rename = "publicURL", skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(rename = "internalURL", skip_serializing_if = "Option::is_none")]
    pub internal_url: Option<String>,
    #[serde(rename = "adminURL", skip_serializing_if = "Option::is_none")]
    pub admin_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ServiceV2 {
    pub name: String,
    pub r#type: String,
    pub endpoints_links: Vec<String>,
    pub endpoints: Vec<EndpointV2>,
}

impl Catalog {
    pub fn new(mut entries: Vec<CatalogEntry>) -> Self {
        entries.sort_by(|a, b| {
            (&a.service_type, &a.service_id, &a.region_id, a.interface).cmp(&(
                &b.service_type,
                &b.service_id,
                &b.region_id,
                b.interface,
            ))
        });
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group the entries per service keeping the sorted order.
    fn by_service(&self) -> BTreeMap<(&str, &str), Vec<&CatalogEntry>> {
        let mut services: BTreeMap<(&str, &str), Vec<&CatalogEntry>> = BTreeMap::new();
        for entry in self.entries.iter() {
            services
                .entry((entry.service_type.as_str(), entry.service_id.as_str()))
                .or_default()
                .push(entry);
        }
        services
    }

    /// The v3 catalog document.
    pub fn v3(&self) -> Vec<ServiceV3> {
        self.by_service()
            .into_values()
            .filter_map(|entries| {
                let first = entries.first()?;
                Some(ServiceV3 {
                    id: first.service_id.clone(),
                    name: first.service_name.clone(),
                    r#type: first.service_type.clone(),
                    endpoints: entries
                        .iter()
                        .map(|ep| EndpointV3 {
                            id: ep.id.clone(),
                            name: ep.name.clone(),
                            interface: ep.interface,
                            region: ep.region.clone(),
                            region_id: ep.region_id.clone(),
                            url: ep.url.clone(),
                        })
                        .collect(),
                })
            })
            .collect()
    }

    /// The v2 catalog document with one endpoint entry per region.
    pub fn v2(&self) -> Vec<ServiceV2> {
        self.by_service()
            .into_values()
            .filter_map(|entries| {
                let first = entries.first()?;
                let mut endpoints: Vec<EndpointV2> = Vec::new();
                for ep in entries.iter() {
                    let idx = match endpoints.iter().position(|x| x.region == ep.region_id) {
                        Some(idx) => idx,
                        None => {
                            endpoints.push(EndpointV2 {
                                id: ep.id.clone(),
                                region: ep.region_id.clone(),
                                ..Default::default()
                            });
                            endpoints.len() - 1
                        }
                    };
                    let target = &mut endpoints[idx];
                    let url = Some(ep.url.clone());
                    match ep.interface {
                        Interface::Public => target.public_url = url,
                        Interface::Internal => target.internal_url = url,
                        Interface::Admin => target.admin_url = url,
                    }
                }
                Some(ServiceV2 {
                    name: first.service_name.clone(),
                    r#type: first.service_type.clone(),
                    endpoints_links: Vec::new(),
                    endpoints,
                })
            })
            .collect()
    }
}
