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
//! # Initial data
//!
//! Creates the hidden root domain, the `Default` domain, the system project,
//! the administrator and member roles and the system administrator holding
//! the administrator role on the system project. Existing entities are kept,
//! so the bootstrap can run any number of times.
use tracing::info;
use url::Url;

use crate::assignment::{
    AssignmentApi,
    types::{Assignment, AssignmentType, Role, RoleCreate, RoleListParameters},
};
use crate::catalog::{
    CatalogApi, CatalogProviderError,
    types::{Endpoint, Interface, Region, Service},
};
use crate::error::KeystoneError;
use crate::identity::{
    IdentityApi,
    types::{UserCreate, UserResponse},
};
use crate::keystone::ServiceState;
use crate::resource::{
    ResourceApi, ResourceProviderError,
    types::{DEFAULT_DOMAIN_ID, Domain, DomainCreate, Project, ProjectCreate, ROOT_DOMAIN_ID},
};

/// Region of the identity endpoint registered by the bootstrap.
pub const DEFAULT_REGION_ID: &str = "RegionOne";

/// Entities the bootstrap created or found.
#[derive(Clone, Debug)]
pub struct BootstrapInfo {
    pub domain: Domain,
    pub project: Project,
    pub admin_role: Role,
    pub member_role: Role,
    pub user: UserResponse,
}

/// Create the initial data.
///
/// When `public_url` is given the identity service is registered in the
/// catalog with the public endpoint `{public_url}/v3`.
#[tracing::instrument(level = "info", skip(state, password))]
pub async fn bootstrap(
    state: &ServiceState,
    password: &str,
    public_url: Option<&Url>,
) -> Result<BootstrapInfo, KeystoneError> {
    let resource = state.provider.get_resource_provider();
    let assignment = state.provider.get_assignment_provider();
    let identity = state.provider.get_identity_provider();
    let admin = &state.config.admin;

    match resource
        .create_domain(
            state,
            DomainCreate {
                id: Some(ROOT_DOMAIN_ID.into()),
                name: ROOT_DOMAIN_ID.into(),
                enabled: false,
                description: Some("The hidden root domain".into()),
            },
        )
        .await
    {
        Ok(_) => info!("created the root domain"),
        Err(ResourceProviderError::Conflict(_)) => {}
        Err(err) => return Err(err.into()),
    }

    let domain = match resource.get_domain(state, DEFAULT_DOMAIN_ID).await? {
        Some(domain) => domain,
        None => {
            info!("creating the default domain");
            resource
                .create_domain(
                    state,
                    DomainCreate {
                        id: Some(DEFAULT_DOMAIN_ID.into()),
                        name: "Default".into(),
                        enabled: true,
                        description: Some("The default domain".into()),
                    },
                )
                .await?
        }
    };

    let project = match resource
        .get_project_by_name(state, &admin.system_project_name, &domain.id)
        .await?
    {
        Some(project) => project,
        None => {
            info!("creating the system project {}", admin.system_project_name);
            resource
                .create_project(
                    state,
                    ProjectCreate {
                        name: admin.system_project_name.clone(),
                        domain_id: domain.id.clone(),
                        enabled: true,
                        description: Some("Bootstrap system default admin project".into()),
                        ..Default::default()
                    },
                )
                .await?
        }
    };

    let admin_role = ensure_role(state, &admin.admin_role_name).await?;
    let member_role = ensure_role(state, &admin.member_role_name).await?;

    let user = match identity
        .find_user_by_name(state, &admin.admin_user_name, &domain.id)
        .await?
    {
        Some(user) => user,
        None => {
            info!("creating the system administrator {}", admin.admin_user_name);
            identity
                .create_user(
                    state,
                    UserCreate {
                        name: admin.admin_user_name.clone(),
                        domain_id: domain.id.clone(),
                        enabled: true,
                        is_system_account: true,
                        password: Some(password.to_string()),
                        ..Default::default()
                    },
                )
                .await?
        }
    };

    assignment
        .create_grant(
            state,
            Assignment {
                role_id: admin_role.id.clone(),
                role_name: Some(admin_role.name.clone()),
                actor_id: user.id.clone(),
                target_id: project.id.clone(),
                r#type: AssignmentType::UserProject,
                inherited: false,
            },
        )
        .await?;

    if let Some(url) = public_url {
        register_identity_endpoint(state, url).await?;
    }

    Ok(BootstrapInfo {
        domain,
        project,
        admin_role,
        member_role,
        user,
    })
}

async fn ensure_role(state: &ServiceState, name: &str) -> Result<Role, KeystoneError> {
    let assignment = state.provider.get_assignment_provider();
    let existing = assignment
        .list_roles(
            state,
            &RoleListParameters {
                domain_id: None,
                name: Some(name.into()),
            },
        )
        .await?;
    if let Some(role) = existing.into_iter().next() {
        return Ok(role);
    }
    info!("creating the role {name}");
    Ok(assignment
        .create_role(
            state,
            RoleCreate {
                name: name.into(),
                ..Default::default()
            },
        )
        .await?)
}

async fn register_identity_endpoint(state: &ServiceState, url: &Url) -> Result<(), KeystoneError> {
    let catalog = state.provider.get_catalog_provider();
    if catalog.find_service_by_type(state, "identity").await?.is_some() {
        return Ok(());
    }
    match catalog
        .create_region(
            state,
            Region {
                id: DEFAULT_REGION_ID.into(),
                ..Default::default()
            },
        )
        .await
    {
        Ok(_) | Err(CatalogProviderError::Conflict(_)) => {}
        Err(err) => return Err(err.into()),
    }
    let service = catalog
        .create_service(
            state,
            Service {
                id: uuid::Uuid::new_v4().simple().to_string(),
                r#type: "identity".into(),
                name: "keystone".into(),
                enabled: true,
            },
        )
        .await?;
    let endpoint = catalog
        .create_endpoint(
            state,
            Endpoint {
                id: uuid::Uuid::new_v4().simple().to_string(),
                name: None,
                interface: Interface::Public,
                region_id: Some(DEFAULT_REGION_ID.into()),
                service_id: service.id,
                url: format!("{}/v3", url.as_str().trim_end_matches('/')),
                enabled: true,
            },
        )
        .await?;
    info!("registered the identity endpoint {}", endpoint.url);
    Ok(())
}
