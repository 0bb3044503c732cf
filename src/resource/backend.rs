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
//! Resource provider backends.
use async_trait::async_trait;

pub mod sql;

use crate::keystone::ServiceState;
use crate::resource::ResourceProviderError;
use crate::resource::types::*;

#[async_trait]
pub trait ResourceBackend: Send + Sync {
    /// Get single domain by ID.
    async fn get_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<Option<Domain>, ResourceProviderError>;

    /// Get single domain by Name.
    async fn get_domain_by_name<'a>(
        &self,
        state: &ServiceState,
        domain_name: &'a str,
    ) -> Result<Option<Domain>, ResourceProviderError>;

    /// List domains.
    async fn list_domains(&self, state: &ServiceState)
    -> Result<Vec<Domain>, ResourceProviderError>;

    /// Create domain.
    async fn create_domain(
        &self,
        state: &ServiceState,
        domain: DomainCreate,
    ) -> Result<Domain, ResourceProviderError>;

    /// Delete domain and its projects.
    async fn delete_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<(), ResourceProviderError>;

    /// Get single project by ID.
    async fn get_project<'a>(
        &self,
        state: &ServiceState,
        project_id: &'a str,
    ) -> Result<Option<Project>, ResourceProviderError>;

    /// Get single project by Name and Domain ID.
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

    /// Create project.
    async fn create_project(
        &self,
        state: &ServiceState,
        project: ProjectCreate,
    ) -> Result<Project, ResourceProviderError>;

    /// Delete project.
    async fn delete_project<'a>(
        &self,
        state: &ServiceState,
        project_id: &'a str,
    ) -> Result<(), ResourceProviderError>;
}
