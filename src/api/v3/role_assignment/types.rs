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

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::error::KeystoneApiError;
use crate::assignment::types;

#[derive(Builder, Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
#[builder(setter(strip_option, into))]
pub struct Assignment {
    /// Role
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub user: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub group: Option<Reference>,
    pub scope: Scope,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct Role {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Entity referenced by the assignment, the name is present with
/// `include_names`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct Reference {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Reference {
    fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Project(Reference),
    Domain(Reference),
}

impl Assignment {
    /// Mutable reference of the actor (user or group).
    pub(super) fn actor_mut(&mut self) -> Option<&mut Reference> {
        self.user.as_mut().or(self.group.as_mut())
    }

    pub(super) fn target_mut(&mut self) -> &mut Reference {
        match &mut self.scope {
            Scope::Project(x) | Scope::Domain(x) => x,
        }
    }
}

impl TryFrom<types::Assignment> for Assignment {
    type Error = KeystoneApiError;

    fn try_from(value: types::Assignment) -> Result<Self, Self::Error> {
        let mut builder = AssignmentBuilder::default();
        builder.role(Role {
            id: value.role_id,
            name: value.role_name,
        });
        if value.r#type.is_group() {
            builder.group(Reference::new(value.actor_id));
        } else {
            builder.user(Reference::new(value.actor_id));
        }
        if value.r#type.is_project() {
            builder.scope(Scope::Project(Reference::new(value.target_id)));
        } else {
            builder.scope(Scope::Domain(Reference::new(value.target_id)));
        }
        Ok(builder.build()?)
    }
}

impl From<AssignmentBuilderError> for KeystoneApiError {
    fn from(err: AssignmentBuilderError) -> Self {
        Self::InternalError(err.to_string())
    }
}

/// Assignments
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct AssignmentList {
    /// Collection of role assignment objects
    pub role_assignments: Vec<Assignment>,
    /// Number of the matching assignments before the pagination.
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl IntoResponse for AssignmentList {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Interpret the query flag. Any value other than `0` or `false`, including
/// no value, means true.
fn flag(value: &Option<String>) -> bool {
    value
        .as_deref()
        .is_some_and(|x| !matches!(x.to_lowercase().as_str(), "0" | "false"))
}

/// List role assignments query parameters
#[derive(Clone, Debug, Default, Deserialize, Serialize, IntoParams)]
pub struct RoleAssignmentListParameters {
    /// Filters the response by a domain ID.
    #[serde(rename = "scope.domain.id")]
    pub domain_id: Option<String>,

    /// Filters the response by a group ID.
    #[serde(rename = "group.id")]
    pub group_id: Option<String>,

    /// Returns the effective assignments, including any assignments gained by
    /// virtue of group membership.
    pub effective: Option<String>,

    /// Filters the response by a project ID.
    #[serde(rename = "scope.project.id")]
    pub project_id: Option<String>,

    /// Filters the response by a role ID.
    #[serde(rename = "role.id")]
    pub role_id: Option<String>,

    /// Filters the response by a user ID.
    #[serde(rename = "user.id")]
    pub user_id: Option<String>,

    /// If set, then the names of any entities returned will be include as well
    /// as their IDs.
    pub include_names: Option<String>,

    /// Include the assignments on the direct child projects of
    /// `scope.project.id`.
    pub include_subtree: Option<String>,

    /// Include the assignments of the system accounts.
    pub include_system: Option<String>,

    /// Maximal number of the returned assignments.
    pub limit: Option<usize>,

    /// Number of the assignments to skip.
    pub offset: Option<usize>,
}

impl RoleAssignmentListParameters {
    pub fn include_names(&self) -> bool {
        flag(&self.include_names)
    }

    pub fn include_system(&self) -> bool {
        flag(&self.include_system)
    }
}

impl TryFrom<&RoleAssignmentListParameters> for types::RoleAssignmentListParameters {
    type Error = KeystoneApiError;

    fn try_from(value: &RoleAssignmentListParameters) -> Result<Self, Self::Error> {
        let mut builder = types::RoleAssignmentListParametersBuilder::default();
        // Filter by role
        if let Some(val) = &value.role_id {
            builder.role_id(val.clone());
        }

        // Filter by actor
        if let Some(val) = &value.user_id {
            builder.user_id(val.clone());
        } else if let Some(val) = &value.group_id {
            builder.group_id(val.clone());
        }

        // Filter by target
        if let Some(val) = &value.project_id {
            builder.project_id(val.clone());
        } else if let Some(val) = &value.domain_id {
            builder.domain_id(val.clone());
        }

        builder.effective(flag(&value.effective));
        builder.include_names(value.include_names());
        builder.include_subtree(flag(&value.include_subtree));
        Ok(builder.build()?)
    }
}
