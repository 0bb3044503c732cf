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

use eyre::Result;
use tracing_test::traced_test;

use keystone_iam::assignment::{AssignmentApi, types::RoleAssignmentListParametersBuilder};
use keystone_iam::bootstrap::bootstrap;
use keystone_iam::catalog::CatalogApi;
use keystone_iam::resource::{ResourceApi, types::ROOT_DOMAIN_ID};

use crate::common::{ADMIN_PASSWORD, get_bootstrapped_state, get_state, token_for};

#[tokio::test]
#[traced_test]
async fn test_bootstrap_twice() -> Result<()> {
    let (state, first) = get_bootstrapped_state().await?;
    let second = bootstrap(&state, "other-password", None).await?;

    assert_eq!(first.domain.id, second.domain.id);
    assert_eq!(first.project.id, second.project.id);
    assert_eq!(first.admin_role.id, second.admin_role.id);
    assert_eq!(first.member_role.id, second.member_role.id);
    assert_eq!(first.user.id, second.user.id);
    assert!(second.user.is_system_account);

    let grants = state
        .provider
        .get_assignment_provider()
        .list_role_assignments(
            &state,
            &RoleAssignmentListParametersBuilder::default()
                .user_id(first.user.id.clone())
                .build()?,
        )
        .await?;
    assert_eq!(1, grants.len());
    assert_eq!(first.admin_role.id, grants[0].role_id);
    assert_eq!(first.project.id, grants[0].target_id);

    assert!(
        state
            .provider
            .get_resource_provider()
            .get_domain(&state, ROOT_DOMAIN_ID)
            .await?
            .is_some()
    );

    // The password of the existing administrator is kept.
    token_for(&state, &first.user.name, ADMIN_PASSWORD, None).await?;
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_bootstrap_registers_identity_endpoint() -> Result<()> {
    let state = get_state().await?;
    let url = url::Url::parse("https://keystone.example.com/")?;
    bootstrap(&state, ADMIN_PASSWORD, Some(&url)).await?;
    bootstrap(&state, ADMIN_PASSWORD, Some(&url)).await?;

    let catalog = state.provider.get_catalog_provider();
    let service = catalog.find_service_by_type(&state, "identity").await?;
    assert!(service.is_some());
    let full = catalog.get_catalog(&state).await?;
    assert_eq!(1, full.entries.len());
    assert_eq!("https://keystone.example.com/v3", full.entries[0].url);
    Ok(())
}
