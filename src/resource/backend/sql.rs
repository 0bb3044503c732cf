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

mod domain;
mod project;

use super::ResourceBackend;
use crate::keystone::ServiceState;
use crate::resource::ResourceProviderError;
use crate::resource::types::*;

#[derive(Clone, Debug, Default)]
pub struct SqlBackend {}

#[async_trait]
impl ResourceBackend for SqlBackend {
    /// Get single domain by ID
    async fn get_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<Option<Domain>, ResourceProviderError> {
        domain::get_domain_by_id(&state.db, domain_id).await
    }

    /// Get single domain by Name
    async fn get_domain_by_name<'a>(
        &self,
        state: &ServiceState,
        domain_name: &'a str,
    ) -> Result<Option<Domain>, ResourceProviderError> {
        domain::get_domain_by_name(&state.db, domain_name).await
    }

    async fn list_domains(
        &self,
        state: &ServiceState,
    ) -> Result<Vec<Domain>, ResourceProviderError> {
        domain::list(&state.db).await
    }

    async fn create_domain(
        &self,
        state: &ServiceState,
        domain: DomainCreate,
    ) -> Result<Domain, ResourceProviderError> {
        domain::create(&state.db, domain).await
    }

    async fn delete_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<(), ResourceProviderError> {
        domain::delete(&state.db, domain_id).await
    }

    /// Get single project by ID
    async fn get_project<'a>(
        &self,
        state: &ServiceState,
        project_id: &'a str,
    ) -> Result<Option<Project>, ResourceProviderError> {
        project::get_project(&state.db, project_id).await
    }

    /// Get single project by Name and Domain ID
    async fn get_project_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: &'a str,
    ) -> Result<Option<Project>, ResourceProviderError> {
        project::get_project_by_name(&state.db, name, domain_id).await
    }

    async fn list_projects(
        &self,
        state: &ServiceState,
        params: &ProjectListParameters,
    ) -> Result<Vec<Project>, ResourceProviderError> {
        project::list(&state.db, params).await
    }

    async fn create_project(
        &self,
        state: &ServiceState,
        project: ProjectCreate,
    ) -> Result<Project, ResourceProviderError> {
        project::create(&state.db, project).await
    }

    async fn delete_project<'a>(
        &self,
        state: &ServiceState,
        project_id: &'a str,
    ) -> Result<(), ResourceProviderError> {
        project::delete(&state.db, project_id).await
    }
}
