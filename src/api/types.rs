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
//! Keystone API types
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::catalog::types::{EndpointV2, EndpointV3, ServiceV2, ServiceV3};
use crate::policy::types::PolicyGroup;
use crate::resource::types as resource_provider_types;
use crate::token::TokenContext;

/// List of the supported API versionts as [Values].
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct Versions {
    /// List of the versions.
    #[validate(nested)]
    pub versions: Values,
}

impl IntoResponse for Versions {
    fn into_response(self) -> Response {
        (StatusCode::MULTIPLE_CHOICES, Json(self)).into_response()
    }
}

/// A container with the [Version] list.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct Values {
    #[validate(nested)]
    pub values: Vec<Version>,
}

/// Single API version container.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct SingleVersion {
    /// The version.
    #[validate(nested)]
    pub version: Version,
}

impl IntoResponse for SingleVersion {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Single API version.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct Version {
    /// Version id.
    #[validate(length(max = 5))]
    pub id: String,
    /// Version status.
    pub status: VersionStatus,
    /// Date of the version update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    /// Links to the API version.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub links: Option<Vec<Link>>,
    /// Supported media types.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub media_types: Option<Vec<MediaType>>,
}

/// Version status.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub enum VersionStatus {
    /// Stable.
    #[default]
    #[serde(rename = "stable")]
    Stable,
    /// Deprecated.
    #[serde(rename = "deprecated")]
    Deprecated,
}

/// Link object.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct Link {
    /// Link rel attribute.
    #[validate(length(max = 10))]
    pub rel: String,
    /// link href attribute.
    #[validate(url)]
    pub href: String,
}

impl Link {
    pub fn new(href: String) -> Self {
        Self {
            rel: "self".into(),
            href,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct MediaType {
    pub base: String,
    pub r#type: String,
}

impl MediaType {
    pub fn v2() -> Self {
        Self {
            base: "application/json".into(),
            r#type: "application/vnd.openstack.identity-v2.0+json".into(),
        }
    }
}

impl Default for MediaType {
    fn default() -> Self {
        Self {
            base: "application/json".into(),
            r#type: "application/vnd.openstack.identity-v3+json".into(),
        }
    }
}

/// The v3 service catalog.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct Catalog(pub Vec<CatalogService>);

impl Validate for Catalog {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.0.validate()
    }
}

/// A catalog service with its endpoints.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
#[builder(setter(strip_option, into))]
pub struct CatalogService {
    #[validate(length(max = 64))]
    pub id: String,
    #[validate(length(max = 255))]
    pub name: String,
    pub r#type: String,
    #[validate(nested)]
    pub endpoints: Vec<Endpoint>,
}

impl From<ServiceV3> for CatalogService {
    fn from(value: ServiceV3) -> Self {
        Self {
            id: value.id,
            name: value.name,
            r#type: value.r#type,
            endpoints: value.endpoints.into_iter().map(Into::into).collect(),
        }
    }
}

/// A Catalog Endpoint.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
#[builder(setter(strip_option, into))]
pub struct Endpoint {
    #[validate(length(max = 64))]
    pub id: String,
    #[builder(default)]
    pub name: Option<String>,
    #[validate(url)]
    pub url: String,
    #[validate(length(max = 64))]
    pub interface: String,
    #[builder(default)]
    #[validate(length(max = 255))]
    pub region: Option<String>,
    #[builder(default)]
    #[validate(length(max = 64))]
    pub region_id: Option<String>,
}

impl From<EndpointV3> for Endpoint {
    fn from(value: EndpointV3) -> Self {
        Self {
            id: value.id,
            name: value.name,
            url: value.url,
            interface: value.interface.to_string(),
            region: value.region,
            region_id: value.region_id,
        }
    }
}

impl From<Vec<ServiceV3>> for Catalog {
    fn from(value: Vec<ServiceV3>) -> Self {
        Self(value.into_iter().map(Into::into).collect())
    }
}

/// The v2 service catalog entry.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct CatalogServiceV2 {
    pub name: String,
    pub r#type: String,
    pub endpoints_links: Vec<String>,
    pub endpoints: Vec<EndpointV2Api>,
}

/// The v2 endpoint collapsing the interfaces of one region.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct EndpointV2Api {
    pub id: String,
    pub region: Option<String>,
    #[serde(rename = "publicURL", skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(rename = "internalURL", skip_serializing_if = "Option::is_none")]
    pub internal_url: Option<String>,
    #[serde(rename = "adminURL", skip_serializing_if = "Option::is_none")]
    pub admin_url: Option<String>,
}

impl From<EndpointV2> for EndpointV2Api {
    fn from(value: EndpointV2) -> Self {
        Self {
            id: value.id,
            region: value.region,
            public_url: value.public_url,
            internal_url: value.internal_url,
            admin_url: value.admin_url,
        }
    }
}

impl From<ServiceV2> for CatalogServiceV2 {
    fn from(value: ServiceV2) -> Self {
        Self {
            name: value.name,
            r#type: value.r#type,
            endpoints_links: value.endpoints_links,
            endpoints: value.endpoints.into_iter().map(Into::into).collect(),
        }
    }
}

/// Names of the policies activated for the token per scope
/// (`system`, `domain`, `project`).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct Policies(pub BTreeMap<String, Vec<String>>);

impl From<&PolicyGroup> for Policies {
    fn from(value: &PolicyGroup) -> Self {
        Self(
            value
                .names()
                .into_iter()
                .map(|(scope, names)| (scope.to_string(), names))
                .collect(),
        )
    }
}

/// The authorization scope, a project or a domain.
///
/// If multiple scopes are specified in the same request an HTTP 400 Bad
/// Request will be returned, as a token cannot be simultaneously scoped to
/// multiple authorization targets. An ID is sufficient to uniquely identify a
/// project but if a project is specified by name, then the domain of the
/// project must also be specified in order to uniquely identify the project
/// by name. A domain scope may be specified by either the domain’s ID or name
/// with equivalent results.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Project scope.
    Project(ScopeProject),
    /// Domain scope.
    Domain(Domain),
}

impl Validate for Scope {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Project(project) => project.validate(),
            Self::Domain(domain) => domain.validate(),
        }
    }
}

/// Project scope information.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
#[builder(setter(into, strip_option))]
pub struct ScopeProject {
    /// Project ID.
    #[builder(default)]
    #[validate(length(max = 64))]
    pub id: Option<String>,
    /// Project Name.
    #[builder(default)]
    #[validate(length(max = 64))]
    pub name: Option<String>,
    /// Project domain.
    #[builder(default)]
    #[validate(nested)]
    pub domain: Option<Domain>,
}

/// Domain information.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
#[builder(setter(into, strip_option))]
pub struct Domain {
    /// Domain ID.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub id: Option<String>,
    /// Domain Name.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub name: Option<String>,
}

impl Domain {
    pub fn is_empty(&self) -> bool {
        self.id.as_ref().is_none_or(String::is_empty)
            && self.name.as_ref().is_none_or(String::is_empty)
    }
}

/// Project information.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct Project {
    /// Project ID.
    #[validate(length(max = 64))]
    pub id: String,
    /// Project Name.
    #[builder(default)]
    #[validate(length(max = 64))]
    pub name: String,
    /// project domain.
    pub domain: Domain,
}

/// Origin of the authentication request.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct RequestContext {
    /// Client kind, for example `cli` or `web`.
    #[serde(default)]
    #[validate(length(max = 64))]
    pub source: String,
    /// Client address.
    #[serde(default)]
    #[validate(length(max = 64))]
    pub ip: String,
}

impl From<RequestContext> for TokenContext {
    fn from(value: RequestContext) -> Self {
        Self {
            source: value.source,
            ip: value.ip,
        }
    }
}

impl From<resource_provider_types::Domain> for Domain {
    fn from(value: resource_provider_types::Domain) -> Self {
        Self {
            id: Some(value.id),
            name: Some(value.name),
        }
    }
}

impl From<&resource_provider_types::Domain> for Domain {
    fn from(value: &resource_provider_types::Domain) -> Self {
        Self {
            id: Some(value.id.clone()),
            name: Some(value.name.clone()),
        }
    }
}
