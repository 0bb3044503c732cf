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
//! # Assignment provider
//!
//! Roles and the grants binding a user or a group to a role on a project or a
//! domain. The effective role set of the user on a target is the union of the
//! direct grants and the grants of every group the user is a member of.
//! Inherited grants are stored but never expanded.
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::assignment::backend::{AssignmentBackend, sql::SqlBackend};
use crate::assignment::types::*;
use crate::config::Config;
use crate::identity::IdentityApi;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;
use crate::resource::{ResourceApi, types::ProjectListParametersBuilder};

pub use error::AssignmentProviderError;
#[cfg(test)]
pub use mock::MockAssignmentProvider;
pub use types::AssignmentApi;

#[derive(Clone)]
pub struct AssignmentProvider {
    backend_driver: Arc<dyn AssignmentBackend>,
}

impl AssignmentProvider {
    pub fn new(
        config: &Config,
        plugin_manager: &PluginManager,
    ) -> Result<Self, AssignmentProviderError> {
        let backend_driver = if let Some(driver) =
            plugin_manager.get_assignment_backend(config.assignment.driver.clone())
        {
            driver.clone()
        } else {
            match config.assignment.driver.as_str() {
                "sql" => Arc::new(SqlBackend::default()),
                other => {
                    return Err(AssignmentProviderError::UnsupportedDriver(
                        other.to_string(),
                    ));
                }
            }
        };
        Ok(Self { backend_driver })
    }

    /// Target ids and the assignment types matching the listing parameters.
    async fn resolve_targets(
        &self,
        state: &ServiceState,
        params: &RoleAssignmentListParameters,
    ) -> Result<(Vec<String>, Vec<AssignmentType>), AssignmentProviderError> {
        if let Some(project_id) = &params.project_id {
            let mut targets = vec![project_id.clone()];
            if params.include_subtree {
                targets.extend(
                    state
                        .provider
                        .get_resource_provider()
                        .list_projects(
                            state,
                            &ProjectListParametersBuilder::default()
                                .parent_id(project_id)
                                .build()?,
                        )
                        .await?
                        .into_iter()
                        .map(|x| x.id),
                );
            }
            Ok((
                targets,
                vec![AssignmentType::UserProject, AssignmentType::GroupProject],
            ))
        } else if let Some(domain_id) = &params.domain_id {
            Ok((
                vec![domain_id.clone()],
                vec![AssignmentType::UserDomain, AssignmentType::GroupDomain],
            ))
        } else {
            Ok((Vec::new(), Vec::new()))
        }
    }
}

#[async_trait]
impl AssignmentApi for AssignmentProvider {
    /// Get single role
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_role<'a>(
        &self,
        state: &ServiceState,
        role_id: &'a str,
    ) -> Result<Option<Role>, AssignmentProviderError> {
        self.backend_driver.get_role(state, role_id).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn find_role_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: Option<&'a str>,
    ) -> Result<Option<Role>, AssignmentProviderError> {
        self.backend_driver
            .get_role_by_name(state, name, domain_id)
            .await
    }

    /// List roles
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_roles(
        &self,
        state: &ServiceState,
        params: &RoleListParameters,
    ) -> Result<Vec<Role>, AssignmentProviderError> {
        self.backend_driver.list_roles(state, params).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn create_role(
        &self,
        state: &ServiceState,
        role: RoleCreate,
    ) -> Result<Role, AssignmentProviderError> {
        role.validate()?;
        self.backend_driver.create_role(state, role).await
    }

    /// List role assignments
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_role_assignments(
        &self,
        state: &ServiceState,
        params: &RoleAssignmentListParameters,
    ) -> Result<Vec<Assignment>, AssignmentProviderError> {
        params.validate()?;
        let identity = state.provider.get_identity_provider();
        let (targets, mut types) = self.resolve_targets(state, params).await?;

        let mut actors: Vec<String> = Vec::new();
        if let Some(uid) = &params.user_id {
            actors.push(uid.clone());
            if params.effective {
                actors.extend(
                    identity
                        .list_groups_of_user(state, uid)
                        .await?
                        .into_iter()
                        .map(|x| x.id),
                );
            } else {
                types.retain(|t| !t.is_group());
                if types.is_empty() {
                    types = vec![AssignmentType::UserProject, AssignmentType::UserDomain];
                }
            }
        } else if let Some(gid) = &params.group_id {
            actors.push(gid.clone());
            types.retain(|t| t.is_group());
            if types.is_empty() {
                types = vec![AssignmentType::GroupProject, AssignmentType::GroupDomain];
            }
        }

        let mut request = RoleAssignmentListForMultipleActorTargetParametersBuilder::default();
        request
            .actors(actors)
            .targets(targets)
            .types(types)
            .exclude_inherited(params.effective)
            .include_names(params.include_names);
        if let Some(role_id) = &params.role_id {
            request.role_id(role_id);
        }
        let found = self
            .backend_driver
            .list_assignments(state, &request.build()?)
            .await?;

        if !params.effective {
            return Ok(found);
        }

        // Effective mode reports every grant against the user it reaches.
        let mut seen: HashSet<Assignment> = HashSet::new();
        let mut result: Vec<Assignment> = Vec::new();
        for assignment in found {
            if !assignment.r#type.is_group() {
                if seen.insert(assignment.clone()) {
                    result.push(assignment);
                }
                continue;
            }
            let members = if let Some(uid) = &params.user_id {
                vec![uid.clone()]
            } else {
                identity
                    .list_group_members(state, &assignment.actor_id)
                    .await?
            };
            for member in members {
                let mut expanded = assignment.clone();
                expanded.actor_id = member;
                expanded.r#type = assignment.r#type.as_user();
                if seen.insert(expanded.clone()) {
                    result.push(expanded);
                }
            }
        }
        Ok(result)
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_effective_roles<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        target_id: &'a str,
    ) -> Result<Vec<Role>, AssignmentProviderError> {
        let mut actors = vec![user_id.to_string()];
        actors.extend(
            state
                .provider
                .get_identity_provider()
                .list_groups_of_user(state, user_id)
                .await?
                .into_iter()
                .map(|x| x.id),
        );
        let request = RoleAssignmentListForMultipleActorTargetParametersBuilder::default()
            .actors(actors)
            .targets(vec![target_id.to_string()])
            .exclude_inherited(true)
            .build()?;
        let role_ids: HashSet<String> = self
            .backend_driver
            .list_assignments(state, &request)
            .await?
            .into_iter()
            .map(|x| x.role_id)
            .collect();

        let mut roles = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            match self.backend_driver.get_role(state, &role_id).await? {
                Some(role) => roles.push(role),
                None => tracing::warn!("assignment references missing role {}", role_id),
            }
        }
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    /// Create assignment grant.
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn create_grant(
        &self,
        state: &ServiceState,
        grant: Assignment,
    ) -> Result<Assignment, AssignmentProviderError> {
        grant.validate()?;
        if self
            .backend_driver
            .get_role(state, &grant.role_id)
            .await?
            .is_none()
        {
            return Err(AssignmentProviderError::RoleNotFound(grant.role_id));
        }
        self.backend_driver.create_grant(state, grant).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn revoke_grant(
        &self,
        state: &ServiceState,
        grant: Assignment,
    ) -> Result<(), AssignmentProviderError> {
        self.backend_driver.revoke_grant(state, grant).await
    }
}
