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
//! # Resource provider
//!
//! Following Keystone concepts are covered by the provider:
//!
//! ## Domain
//!
//! Domains are a collection of projects, users and groups that define
//! administrative boundaries. Domains are stored as projects with the
//! `is_domain` flag under the hidden root domain. A domain linked to an
//! identity provider is `readonly` and reports the driver of that provider.
//!
//! ## Project
//!
//! A container that groups or isolates resources or identity objects.
use async_trait::async_trait;
use std::sync::Arc;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::assignment::{AssignmentApi, types::RoleAssignmentListParametersBuilder};
use crate::config::Config;
use crate::identity::{
    IdentityApi,
    types::{GroupListParametersBuilder, UserListParametersBuilder},
};
use crate::idp::IdpApi;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;
use crate::resource::backend::{ResourceBackend, sql::SqlBackend};
use crate::resource::types::*;

#[cfg(test)]
pub use mock::MockResourceProvider;
pub use error::ResourceProviderError;
pub use types::ResourceApi;

#[derive(Clone)]
pub struct ResourceProvider {
    backend_driver: Arc<dyn ResourceBackend>,
}

impl ResourceProvider {
    pub fn new(
        config: &Config,
        plugin_manager: &PluginManager,
    ) -> Result<Self, ResourceProviderError> {
        let backend_driver = if let Some(driver) =
            plugin_manager.get_resource_backend(config.resource.driver.clone())
        {
            driver.clone()
        } else {
            match config.resource.driver.as_str() {
                "sql" => Arc::new(SqlBackend::default()),
                _ => {
                    return Err(ResourceProviderError::UnsupportedDriver(
                        config.resource.driver.clone(),
                    ));
                }
            }
        };
        Ok(Self { backend_driver })
    }

    /// Fill the driver information of the domain.
    async fn expand_domain(
        &self,
        state: &ServiceState,
        domain: Option<Domain>,
    ) -> Result<Option<Domain>, ResourceProviderError> {
        let Some(mut domain) = domain else {
            return Ok(None);
        };
        if let Some(idp) = state
            .provider
            .get_idp_provider()
            .find_idp_for_domain(state, &domain.id)
            .await?
        {
            domain.readonly = idp.driver != "sql";
            domain.driver = Some(idp.driver);
        }
        Ok(Some(domain))
    }
}

/// Turn an arbitrary text into a project name: lowercase with every
/// character outside of `[a-z0-9_-]` replaced by `-`.
pub fn sanitize_project_name<S: AsRef<str>>(base: S) -> String {
    base.as_ref()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[async_trait]
impl ResourceApi for ResourceProvider {
    /// Get single domain
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<Option<Domain>, ResourceProviderError> {
        let domain = self.backend_driver.get_domain(state, domain_id).await?;
        self.expand_domain(state, domain).await
    }

    /// Get single domain by its name
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn find_domain_by_name<'a>(
        &self,
        state: &ServiceState,
        domain_name: &'a str,
    ) -> Result<Option<Domain>, ResourceProviderError> {
        let domain = self
            .backend_driver
            .get_domain_by_name(state, domain_name)
            .await?;
        self.expand_domain(state, domain).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_domains(
        &self,
        state: &ServiceState,
    ) -> Result<Vec<Domain>, ResourceProviderError> {
        self.backend_driver.list_domains(state).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn create_domain(
        &self,
        state: &ServiceState,
        domain: DomainCreate,
    ) -> Result<Domain, ResourceProviderError> {
        self.backend_driver.create_domain(state, domain).await
    }

    /// Delete the domain.
    ///
    /// Users and groups of the domain are removed first. A failure to remove
    /// any of them aborts the domain removal.
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn delete_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<(), ResourceProviderError> {
        if domain_id == ROOT_DOMAIN_ID {
            return Err(ResourceProviderError::RootDomainImmutable);
        }
        let identity = state.provider.get_identity_provider();
        for user in identity
            .list_users(
                state,
                &UserListParametersBuilder::default()
                    .domain_id(domain_id)
                    .build()?,
            )
            .await?
        {
            identity.delete_user(state, &user.id).await?;
        }
        for group in identity
            .list_groups(
                state,
                &GroupListParametersBuilder::default()
                    .domain_id(domain_id)
                    .build()?,
            )
            .await?
        {
            identity.delete_group(state, &group.id).await?;
        }
        self.backend_driver.delete_domain(state, domain_id).await
    }

    /// Get single project
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_project<'a>(
        &self,
        state: &ServiceState,
        project_id: &'a str,
    ) -> Result<Option<Project>, ResourceProviderError> {
        self.backend_driver.get_project(state, project_id).await
    }

    /// Get single project by Name and Domain ID
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_project_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: &'a str,
    ) -> Result<Option<Project>, ResourceProviderError> {
        self.backend_driver
            .get_project_by_name(state, name, domain_id)
            .await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_projects(
        &self,
        state: &ServiceState,
        params: &ProjectListParameters,
    ) -> Result<Vec<Project>, ResourceProviderError> {
        self.backend_driver.list_projects(state, params).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn create_project(
        &self,
        state: &ServiceState,
        project: ProjectCreate,
    ) -> Result<Project, ResourceProviderError> {
        self.backend_driver.create_project(state, project).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn delete_project<'a>(
        &self,
        state: &ServiceState,
        project_id: &'a str,
    ) -> Result<(), ResourceProviderError> {
        self.validate_delete_condition(state, project_id).await?;
        self.backend_driver.delete_project(state, project_id).await
    }

    fn is_admin_project(&self, state: &ServiceState, project: &Project) -> bool {
        project.domain_id == DEFAULT_DOMAIN_ID
            && project.name == state.config.admin.system_project_name
    }

    /// The system project and the projects with role assignments can not be
    /// deleted.
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn validate_delete_condition<'a>(
        &self,
        state: &ServiceState,
        project_id: &'a str,
    ) -> Result<(), ResourceProviderError> {
        let project = self
            .get_project(state, project_id)
            .await?
            .ok_or_else(|| ResourceProviderError::ProjectNotFound(project_id.to_string()))?;
        if self.is_admin_project(state, &project) {
            return Err(ResourceProviderError::ProjectNotDeletable(
                project.id,
                "system project".into(),
            ));
        }
        let assignments = state
            .provider
            .get_assignment_provider()
            .list_role_assignments(
                state,
                &RoleAssignmentListParametersBuilder::default()
                    .project_id(project_id)
                    .build()?,
            )
            .await?;
        if !assignments.is_empty() {
            return Err(ResourceProviderError::ProjectNotDeletable(
                project.id,
                format!("{} role assignments exist", assignments.len()),
            ));
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, state))]
    async fn generate_project_name<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
        base: &'a str,
    ) -> Result<String, ResourceProviderError> {
        let base = sanitize_project_name(base);
        let mut candidate = base.clone();
        let mut idx = 0;
        while self
            .backend_driver
            .get_project_by_name(state, &candidate, domain_id)
            .await?
            .is_some()
        {
            idx += 1;
            candidate = format!("{base}-{idx}");
        }
        Ok(candidate)
    }
}
