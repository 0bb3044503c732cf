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
//! Role assignments API.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use std::collections::HashMap;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::auth::Auth;
use crate::api::common::{enforce, token_domain};
use crate::api::error::KeystoneApiError;
use crate::assignment::AssignmentApi;
use crate::assignment::types::RoleAssignmentListParameters as ProviderListParameters;
use crate::identity::IdentityApi;
use crate::keystone::ServiceState;
use crate::policy::types::PolicyScope;
use crate::resource::ResourceApi;
use crate::token::Token;
use types::{Assignment, AssignmentList, RoleAssignmentListParameters, Scope};

pub mod types;

pub(crate) const DESCRIPTION: &str = r#"Role assignments.

Lists the roles granted to the users and groups on the projects and domains.
"#;

pub(crate) fn openapi_router() -> OpenApiRouter<ServiceState> {
    OpenApiRouter::new().routes(routes!(list))
}

/// Lookups of the entity names memoized for the single listing.
#[derive(Default)]
struct Names {
    users: HashMap<String, Option<String>>,
    groups: HashMap<String, Option<String>>,
    projects: HashMap<String, Option<String>>,
    domains: HashMap<String, Option<String>>,
}

impl Names {
    async fn fill(
        &mut self,
        state: &ServiceState,
        assignment: &mut Assignment,
    ) -> Result<(), KeystoneApiError> {
        let is_group = assignment.group.is_some();
        if let Some(actor) = assignment.actor_mut() {
            actor.name = if is_group {
                if !self.groups.contains_key(&actor.id) {
                    let name = state
                        .provider
                        .get_identity_provider()
                        .get_group(state, &actor.id)
                        .await?
                        .map(|x| x.name);
                    self.groups.insert(actor.id.clone(), name);
                }
                self.groups.get(&actor.id).cloned().flatten()
            } else {
                if !self.users.contains_key(&actor.id) {
                    let name = state
                        .provider
                        .get_identity_provider()
                        .get_user(state, &actor.id)
                        .await?
                        .map(|x| x.name);
                    self.users.insert(actor.id.clone(), name);
                }
                self.users.get(&actor.id).cloned().flatten()
            };
        }
        let is_project = matches!(assignment.scope, Scope::Project(_));
        let target = assignment.target_mut();
        target.name = if is_project {
            if !self.projects.contains_key(&target.id) {
                let name = state
                    .provider
                    .get_resource_provider()
                    .get_project(state, &target.id)
                    .await?
                    .map(|x| x.name);
                self.projects.insert(target.id.clone(), name);
            }
            self.projects.get(&target.id).cloned().flatten()
        } else {
            if !self.domains.contains_key(&target.id) {
                let name = state
                    .provider
                    .get_resource_provider()
                    .get_domain(state, &target.id)
                    .await?
                    .map(|x| x.name);
                self.domains.insert(target.id.clone(), name);
            }
            self.domains.get(&target.id).cloned().flatten()
        };
        Ok(())
    }
}

/// Drop the assignments of the system accounts.
async fn without_system_accounts(
    state: &ServiceState,
    assignments: Vec<Assignment>,
) -> Result<Vec<Assignment>, KeystoneApiError> {
    let mut system: HashMap<String, bool> = HashMap::new();
    let mut res = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        if let Some(user) = &assignment.user {
            if !system.contains_key(&user.id) {
                let is_system = state
                    .provider
                    .get_identity_provider()
                    .get_user(state, &user.id)
                    .await?
                    .is_some_and(|x| x.is_system_account);
                system.insert(user.id.clone(), is_system);
            }
            if system.get(&user.id).copied().unwrap_or_default() {
                continue;
            }
        }
        res.push(assignment);
    }
    Ok(res)
}

/// Targets the listing is limited to when the permission was granted below
/// the system scope.
#[derive(Debug, PartialEq)]
enum Boundary {
    Project(String),
    Domain(String),
}

/// Narrow the listing to the project or the domain of the caller.
fn restrict_to_grant(
    granted: PolicyScope,
    caller: &Token,
    query: &RoleAssignmentListParameters,
    params: &mut ProviderListParameters,
) -> Result<Option<Boundary>, KeystoneApiError> {
    match granted {
        PolicyScope::System => Ok(None),
        PolicyScope::Project => {
            let project_id = caller.project_id().ok_or(KeystoneApiError::Forbidden)?;
            if query.domain_id.is_some()
                || query.project_id.as_ref().is_some_and(|x| x != project_id)
            {
                return Err(KeystoneApiError::Forbidden);
            }
            params.project_id = Some(project_id.clone());
            params.domain_id = None;
            Ok(Some(Boundary::Project(project_id.clone())))
        }
        PolicyScope::Domain => {
            let domain_id = token_domain(caller)
                .filter(|_| caller.is_scoped())
                .ok_or(KeystoneApiError::Forbidden)?;
            if query.domain_id.as_ref().is_some_and(|x| x != domain_id) {
                return Err(KeystoneApiError::Forbidden);
            }
            Ok(Some(Boundary::Domain(domain_id.to_string())))
        }
    }
}

/// Keep the assignments on the targets inside of the boundary.
async fn within_boundary(
    state: &ServiceState,
    boundary: &Boundary,
    assignments: Vec<Assignment>,
) -> Result<Vec<Assignment>, KeystoneApiError> {
    let mut project_domains: HashMap<String, Option<String>> = HashMap::new();
    let mut res = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let inside = match (boundary, &assignment.scope) {
            (Boundary::Project(project_id), Scope::Project(target)) => target.id == *project_id,
            (Boundary::Project(_), Scope::Domain(_)) => false,
            (Boundary::Domain(domain_id), Scope::Domain(target)) => target.id == *domain_id,
            (Boundary::Domain(domain_id), Scope::Project(target)) => {
                if !project_domains.contains_key(&target.id) {
                    let domain = state
                        .provider
                        .get_resource_provider()
                        .get_project(state, &target.id)
                        .await?
                        .map(|x| x.domain_id);
                    project_domains.insert(target.id.clone(), domain);
                }
                project_domains
                    .get(&target.id)
                    .is_some_and(|x| x.as_ref() == Some(domain_id))
            }
        };
        if inside {
            res.push(assignment);
        }
    }
    Ok(res)
}

/// List role assignments
///
/// Listing the own assignments with `user.id` needs no further permission,
/// any other listing requires `identity:role_assignments:list`. Granted at
/// the project or the domain scope it only covers the assignments on the
/// project or the domain of the caller.
#[utoipa::path(
    get,
    path = "/",
    params(RoleAssignmentListParameters),
    description = "List role assignments",
    responses(
        (status = OK, description = "List of role assignments", body = AssignmentList),
        (status = FORBIDDEN, description = "Listing is not allowed"),
    ),
    security(("x-auth" = [])),
    tag="role_assignments"
)]
#[tracing::instrument(
    name = "api::role_assignment_list",
    level = "debug",
    skip(state, user_auth)
)]
async fn list(
    Auth(user_auth): Auth,
    Query(query): Query<RoleAssignmentListParameters>,
    State(state): State<ServiceState>,
) -> Result<impl IntoResponse, KeystoneApiError> {
    let mut params: ProviderListParameters = (&query).try_into()?;
    let mut boundary = None;
    if query.user_id.as_ref() != Some(user_auth.user_id()) {
        let granted = enforce(&state, &user_auth, "identity:role_assignments:list").await?;
        boundary = restrict_to_grant(granted, &user_auth, &query, &mut params)?;
    }
    let assignments: Result<Vec<Assignment>, _> = state
        .provider
        .get_assignment_provider()
        .list_role_assignments(&state, &params)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect();
    let mut assignments = assignments?;
    if let Some(boundary) = &boundary {
        assignments = within_boundary(&state, boundary, assignments).await?;
    }
    if !query.include_system() {
        assignments = without_system_accounts(&state, assignments).await?;
    }

    let total = assignments.len();
    let mut role_assignments: Vec<Assignment> = assignments
        .into_iter()
        .skip(query.offset.unwrap_or_default())
        .take(query.limit.filter(|x| *x > 0).unwrap_or(usize::MAX))
        .collect();
    if query.include_names() {
        let mut names = Names::default();
        for assignment in role_assignments.iter_mut() {
            names.fill(&state, assignment).await?;
        }
    }
    Ok(AssignmentList {
        role_assignments,
        total,
        limit: query.limit,
        offset: query.offset,
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt; // for `collect`
    use tower::ServiceExt; // for `call`, `oneshot`, and `ready`
    use tower_http::trace::TraceLayer;

    use super::openapi_router;
    use crate::api::v3::role_assignment::types::{
        Assignment as ApiAssignment, AssignmentList as ApiAssignmentList, Reference, Role, Scope,
    };
    use crate::assignment::{
        MockAssignmentProvider,
        types::{Assignment, AssignmentType, RoleAssignmentListParameters},
    };
    use crate::identity::{MockIdentityProvider, types::UserResponse};
    use crate::policy::types::{PolicyGroup, PolicyScope};
    use crate::provider::Provider;
    use crate::resource::{MockResourceProvider, types::Project};
    use crate::tests::{allow_all, get_state, project, project_token, unscoped_token, user};
    use crate::token::{MockTokenProvider, Token};

    fn assignment(actor: &str, target: &str) -> Assignment {
        Assignment {
            role_id: "role".into(),
            role_name: Some("rn".into()),
            actor_id: actor.into(),
            target_id: target.into(),
            r#type: AssignmentType::UserProject,
            inherited: false,
        }
    }

    fn token_mock(caller: Token, policies: PolicyGroup) -> MockTokenProvider {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .returning(move |_, _| Ok(caller.clone()));
        token_mock
            .expect_get_token_policies()
            .returning(move |_, _| Ok(policies.clone()));
        token_mock
    }

    fn identity_mock() -> MockIdentityProvider {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_get_user()
            .withf(|_, id: &'_ str| id == "svc")
            .returning(|_, _| {
                Ok(Some(UserResponse {
                    is_system_account: true,
                    ..user("svc")
                }))
            });
        identity_mock
            .expect_get_user()
            .withf(|_, id: &'_ str| id != "svc")
            .returning(|_, id| Ok(Some(user(id))));
        identity_mock
    }

    async fn get(
        assignment_mock: MockAssignmentProvider,
        policies: PolicyGroup,
        uri: &str,
    ) -> (StatusCode, Option<ApiAssignmentList>) {
        get_as(assignment_mock, unscoped_token("bar"), policies, uri).await
    }

    async fn get_as(
        assignment_mock: MockAssignmentProvider,
        caller: Token,
        policies: PolicyGroup,
        uri: &str,
    ) -> (StatusCode, Option<ApiAssignmentList>) {
        let mut resource_mock = MockResourceProvider::default();
        resource_mock.expect_get_project().returning(|_, id| {
            Ok(Some(if id.starts_with("foreign") {
                Project {
                    domain_id: "other".into(),
                    ..project(id)
                }
            } else {
                project(id)
            }))
        });
        let state = get_state(
            Provider::mocked_builder()
                .assignment(assignment_mock)
                .identity(identity_mock())
                .resource(resource_mock)
                .token(token_mock(caller, policies))
                .build()
                .unwrap(),
        );

        let mut api = openapi_router()
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("x-auth-token", "foo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).ok())
    }

    #[tokio::test]
    async fn test_list() {
        let mut assignment_mock = MockAssignmentProvider::default();
        assignment_mock
            .expect_list_role_assignments()
            .returning(|_, _| Ok(vec![assignment("actor", "target"), assignment("svc", "target")]));

        let (status, res) = get(assignment_mock, allow_all(PolicyScope::System), "/").await;
        assert_eq!(StatusCode::OK, status);
        let res = res.unwrap();
        assert_eq!(1, res.total);
        assert_eq!(
            vec![ApiAssignment {
                role: Role {
                    id: "role".into(),
                    name: Some("rn".into())
                },
                user: Some(Reference {
                    id: "actor".into(),
                    name: None
                }),
                scope: Scope::Project(Reference {
                    id: "target".into(),
                    name: None
                }),
                group: None,
            }],
            res.role_assignments
        );
    }

    #[tokio::test]
    async fn test_list_qp() {
        let mut assignment_mock = MockAssignmentProvider::default();
        assignment_mock
            .expect_list_role_assignments()
            .withf(|_, qp: &RoleAssignmentListParameters| {
                RoleAssignmentListParameters {
                    role_id: Some("role".into()),
                    project_id: Some("project".into()),
                    effective: true,
                    include_names: true,
                    include_subtree: true,
                    ..Default::default()
                } == *qp
            })
            .returning(|_, _| {
                Ok((0..5)
                    .map(|x| assignment(&format!("u{x}"), "project"))
                    .collect())
            });

        let (status, res) = get_as(
            assignment_mock,
            project_token("bar", "project", &["admin"]),
            allow_all(PolicyScope::Project),
            "/?role.id=role&scope.project.id=project&effective&include_names&include_subtree=true&include_system&limit=2&offset=1",
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        let res = res.unwrap();
        assert_eq!(5, res.total);
        assert_eq!(2, res.role_assignments.len());
        assert_eq!("u1", res.role_assignments[0].user.as_ref().unwrap().id);
        assert_eq!(
            Some("u1-name".to_string()),
            res.role_assignments[0].user.as_ref().unwrap().name
        );
        assert_eq!(
            Scope::Project(Reference {
                id: "project".into(),
                name: Some("project-name".into())
            }),
            res.role_assignments[0].scope
        );
    }

    #[tokio::test]
    async fn test_list_own_without_policy() {
        let mut assignment_mock = MockAssignmentProvider::default();
        assignment_mock
            .expect_list_role_assignments()
            .withf(|_, qp: &RoleAssignmentListParameters| qp.user_id.as_deref() == Some("bar"))
            .returning(|_, _| Ok(vec![assignment("bar", "target")]));

        let (status, res) = get(assignment_mock, PolicyGroup::default(), "/?user.id=bar").await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1, res.unwrap().role_assignments.len());
    }

    #[tokio::test]
    async fn test_list_forbidden() {
        let mut assignment_mock = MockAssignmentProvider::default();
        assignment_mock.expect_list_role_assignments().never();

        let (status, _) = get(assignment_mock, PolicyGroup::default(), "/?user.id=other").await;
        assert_eq!(StatusCode::FORBIDDEN, status);
    }

    #[tokio::test]
    async fn test_list_project_grant_needs_project() {
        let mut assignment_mock = MockAssignmentProvider::default();
        assignment_mock.expect_list_role_assignments().never();

        let (status, _) = get(assignment_mock, allow_all(PolicyScope::Project), "/").await;
        assert_eq!(StatusCode::FORBIDDEN, status);
    }

    #[tokio::test]
    async fn test_list_project_grant_limited_to_own_project() {
        let mut assignment_mock = MockAssignmentProvider::default();
        assignment_mock
            .expect_list_role_assignments()
            .withf(|_, qp: &RoleAssignmentListParameters| {
                qp.project_id.as_deref() == Some("p1") && qp.domain_id.is_none()
            })
            .returning(|_, _| Ok(vec![assignment("actor", "p1"), assignment("other", "p1")]));

        let caller = project_token("bar", "p1", &["project_admin"]);
        let (status, res) = get_as(
            assignment_mock,
            caller.clone(),
            allow_all(PolicyScope::Project),
            "/",
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(2, res.unwrap().total);

        for uri in ["/?scope.project.id=p2", "/?scope.domain.id=default"] {
            let mut assignment_mock = MockAssignmentProvider::default();
            assignment_mock.expect_list_role_assignments().never();
            let (status, _) = get_as(
                assignment_mock,
                caller.clone(),
                allow_all(PolicyScope::Project),
                uri,
            )
            .await;
            assert_eq!(StatusCode::FORBIDDEN, status, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_list_domain_grant_limited_to_own_domain() {
        let mut assignment_mock = MockAssignmentProvider::default();
        assignment_mock
            .expect_list_role_assignments()
            .returning(|_, _| {
                Ok(vec![
                    assignment("actor", "p1"),
                    assignment("actor", "foreign-p"),
                    Assignment {
                        r#type: AssignmentType::UserDomain,
                        ..assignment("actor", "default")
                    },
                    Assignment {
                        r#type: AssignmentType::UserDomain,
                        ..assignment("actor", "other")
                    },
                ])
            });

        let caller = project_token("bar", "p1", &["domain_admin"]);
        let (status, res) = get_as(
            assignment_mock,
            caller.clone(),
            allow_all(PolicyScope::Domain),
            "/",
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        let res = res.unwrap();
        assert_eq!(2, res.total);
        assert_eq!(
            vec![
                Scope::Project(Reference {
                    id: "p1".into(),
                    name: None
                }),
                Scope::Domain(Reference {
                    id: "default".into(),
                    name: None
                }),
            ],
            res.role_assignments
                .into_iter()
                .map(|x| x.scope)
                .collect::<Vec<_>>()
        );

        let mut assignment_mock = MockAssignmentProvider::default();
        assignment_mock.expect_list_role_assignments().never();
        let (status, _) = get_as(
            assignment_mock,
            caller,
            allow_all(PolicyScope::Domain),
            "/?scope.domain.id=other",
        )
        .await;
        assert_eq!(StatusCode::FORBIDDEN, status);
    }
}
