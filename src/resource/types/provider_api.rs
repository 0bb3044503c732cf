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

use async_trait::async_trait;

use crate::keystone::ServiceState;
use crate::resource::error::ResourceProviderError;
use crate::resource::types::*;

#[async_trait]
pub trait ResourceApi: Send + Sync + Clone {
    /// Get single domain by the ID.
    async fn get_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<Option<Domain>, ResourceProviderError>;

    /// Find domain by the name.
    async fn find_domain_by_name<'a>(
        &self,
        state: &ServiceState,
        domain_name: &'a str,
    ) -> Result<Option<Domain>, ResourceProviderError>;

    /// List all domains except the root one.
    async fn list_domains(&self, state: &ServiceState)
    -> Result<Vec<Domain>, ResourceProviderError>;

    /// Create the domain.
    async fn create_domain(
        &self,
        state: &ServiceState,
        domain: DomainCreate,
    ) -> Result<Domain, ResourceProviderError>;

    /// Delete the domain together with its users, groups and projects.
    async fn delete_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<(), ResourceProviderError>;

    /// Get single project by the ID.
    async fn get_project<'a>(
        &self,
        state: &ServiceState,
        project_id: &'a str,
    ) -> Result<Option<Project>, ResourceProviderError>;

    /// Get single project by the name and the domain ID.
    async fn get_project_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: &'a str,
    ) -> Result<Option<Project>, ResourceProviderError>;

    /// List projects.
    async fn list_projects(
        &self,
        state: &ServiceState,
        params: &ProjectListParameters,
    ) -> Result<Vec<Project>, ResourceProviderError>;

    /// Create the project.
    async fn create_project(
        &self,
        state: &ServiceState,
        project: ProjectCreate,
    ) -> Result<Project, ResourceProviderError>;

    /// Delete the project.
    async fn delete_project<'a>(
        &self,
        state: &ServiceState,
        project_id: &'a str,
    ) -> Result<(), ResourceProviderError>;

    /// Whether the project is the system administration project.
    fn is_admin_project(&self, state: &ServiceState, project: &Project) -> bool;

    /// Check that the project can be deleted.
    async fn validate_delete_condition<'a>(
        &self,
        state: &ServiceState,
        project_id: &'a str,
    ) -> Result<(), ResourceProviderError>;

    /// Derive a project name from `base` that is not used in the domain yet.
    async fn generate_project_name<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
        base: &'a str,
    ) -> Result<String, ResourceProviderError>;
}
