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
//! # Attribute mapper
//!
//! Translate the claims asserted by an identity provider into the local
//! user, its domain and optionally a project membership.
use tracing::{debug, warn};

use crate::assignment::AssignmentApi;
use crate::assignment::types::{Assignment, AssignmentType};
use crate::identity::types::UserResponse;
use crate::idp::IdpProviderError;
use crate::idp::driver::Claims;
use crate::idp::linkage::{self, ExternalUser};
use crate::idp::types::{IdentityProvider, IdpAttributeOptions};
use crate::keystone::ServiceState;
use crate::resource::ResourceApi;
use crate::resource::types::{Project, ProjectCreate};

/// Values extracted from the claims by the attribute options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappedAttributes {
    pub user_id: String,
    pub user_name: String,
    pub displayname: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub domain_id: Option<String>,
    pub domain_name: Option<String>,
    pub project: Option<String>,
    pub roles: Vec<String>,
}

fn first(claims: &Claims, key: &Option<String>) -> Option<String> {
    key.as_ref()
        .and_then(|key| claims.get(key))
        .and_then(|values| values.iter().find(|v| !v.is_empty()))
        .cloned()
}

/// Pick the attributes out of the claims.
///
/// Either the user ID or the user name must be present, a missing one is
/// filled from the other.
pub fn extract(
    options: &IdpAttributeOptions,
    claims: &Claims,
) -> Result<MappedAttributes, IdpProviderError> {
    let mut user_id = first(claims, &options.user_id_attribute).unwrap_or_default();
    let mut user_name = first(claims, &options.user_name_attribute).unwrap_or_default();
    match (user_id.is_empty(), user_name.is_empty()) {
        (true, true) => return Err(IdpProviderError::Unauthenticated),
        (true, false) => user_id = user_name.clone(),
        (false, true) => user_name = user_id.clone(),
        (false, false) => {}
    }
    Ok(MappedAttributes {
        user_id,
        user_name,
        displayname: first(claims, &options.user_displayname_attribute),
        email: first(claims, &options.user_email_attribute),
        mobile: first(claims, &options.user_mobile_attribute),
        domain_id: first(claims, &options.domain_id_attribute),
        domain_name: first(claims, &options.domain_name_attribute),
        project: first(claims, &options.project_attribute),
        roles: options
            .roles_attribute
            .as_ref()
            .and_then(|key| claims.get(key))
            .map(|values| values.iter().filter(|v| !v.is_empty()).cloned().collect())
            .unwrap_or_default(),
    })
}

/// Map the claims to the local user, creating the domain and the user when
/// needed, and join the user to the asserted project.
pub async fn map_claims(
    state: &ServiceState,
    idp: &IdentityProvider,
    options: &IdpAttributeOptions,
    claims: &Claims,
) -> Result<UserResponse, IdpProviderError> {
    let attrs = extract(options, claims)?;
    debug!("mapped attributes {:?}", attrs);

    let domain_id = match (&attrs.domain_id, &attrs.domain_name) {
        (None, None) => idp
            .target_domain_id
            .clone()
            .ok_or_else(|| IdpProviderError::MissingOption {
                group: "identity_provider".into(),
                option: "target_domain_id".into(),
            })?,
        (id, name) => {
            let external_id = id.as_ref().or(name.as_ref()).cloned().unwrap_or_default();
            let name = name.as_ref().or(id.as_ref()).cloned().unwrap_or_default();
            linkage::sync_domain(state, idp, &external_id, &name)
                .await?
                .id
        }
    };

    let user = linkage::sync_user(
        state,
        idp,
        &domain_id,
        &ExternalUser {
            id: attrs.user_id.clone(),
            name: attrs.user_name.clone(),
            displayname: attrs.displayname.clone(),
            email: attrs.email.clone(),
            mobile: attrs.mobile.clone(),
            enabled: true,
        },
    )
    .await?;

    if let Err(err) = join_project(state, idp, options, &attrs, &user).await {
        warn!(idp_id = %idp.id, user_id = %user.id, "project join failed: {err}");
    }
    Ok(user)
}

/// Grant the asserted roles on the asserted project. Falls back to the
/// default project and role of the identity provider.
async fn join_project(
    state: &ServiceState,
    idp: &IdentityProvider,
    options: &IdpAttributeOptions,
    attrs: &MappedAttributes,
    user: &UserResponse,
) -> Result<(), IdpProviderError> {
    let project = match &attrs.project {
        Some(name) => find_or_create_project(state, idp, &user.domain_id, name).await?,
        None => None,
    };
    let project = match project {
        Some(project) => project,
        None => match &options.default_project_id {
            Some(id) => match state
                .provider
                .get_resource_provider()
                .get_project(state, id)
                .await?
            {
                Some(project) => project,
                None => return Ok(()),
            },
            None => return Ok(()),
        },
    };

    let assignment = state.provider.get_assignment_provider();
    let mut role_ids = Vec::new();
    for role_name in attrs.roles.iter() {
        match assignment
            .find_role_by_name(state, role_name, Some(&user.domain_id))
            .await?
        {
            Some(role) => role_ids.push(role.id),
            None => debug!("asserted role {role_name} does not exist"),
        }
    }
    if role_ids.is_empty()
        && let Some(default_role) = &options.default_role_id
    {
        role_ids.push(default_role.clone());
    }
    for role_id in role_ids {
        assignment
            .create_grant(
                state,
                Assignment {
                    role_id,
                    role_name: None,
                    actor_id: user.id.clone(),
                    target_id: project.id.clone(),
                    r#type: AssignmentType::UserProject,
                    inherited: false,
                },
            )
            .await?;
    }
    Ok(())
}

async fn find_or_create_project(
    state: &ServiceState,
    idp: &IdentityProvider,
    domain_id: &str,
    name: &str,
) -> Result<Option<Project>, IdpProviderError> {
    let resource = state.provider.get_resource_provider();
    if let Some(project) = resource.get_project_by_name(state, name, domain_id).await? {
        return Ok(Some(project));
    }
    if !idp.auto_create_project {
        return Ok(None);
    }
    let name = resource
        .generate_project_name(state, domain_id, name)
        .await?;
    Ok(Some(
        resource
            .create_project(
                state,
                ProjectCreate {
                    id: None,
                    name,
                    domain_id: domain_id.to_string(),
                    parent_id: None,
                    enabled: true,
                    description: None,
                },
            )
            .await?,
    ))
}
