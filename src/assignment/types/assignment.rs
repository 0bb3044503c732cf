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

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::BuilderError;

/// The assignment object.
#[derive(Builder, Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct Assignment {
    /// The role ID.
    #[validate(length(max = 64))]
    pub role_id: String,
    /// The role name.
    #[builder(default)]
    #[validate(length(max = 255))]
    pub role_name: Option<String>,
    /// The actor id.
    #[validate(length(max = 64))]
    pub actor_id: String,
    /// The target id.
    #[validate(length(max = 64))]
    pub target_id: String,
    /// The assignment type.
    pub r#type: AssignmentType,
    /// Inherited flag.
    #[builder(default)]
    pub inherited: bool,
}

/// Role assignment type.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash, Serialize)]
pub enum AssignmentType {
    /// Group to the domain.
    GroupDomain,
    /// Group to the project.
    GroupProject,
    /// User to the domain.
    UserDomain,
    /// User to the project.
    UserProject,
}

impl AssignmentType {
    pub fn is_group(&self) -> bool {
        matches!(self, Self::GroupDomain | Self::GroupProject)
    }

    pub fn is_project(&self) -> bool {
        matches!(self, Self::GroupProject | Self::UserProject)
    }

    /// The user counterpart of the group assignment type.
    pub fn as_user(&self) -> Self {
        match self {
            Self::GroupDomain | Self::UserDomain => Self::UserDomain,
            Self::GroupProject | Self::UserProject => Self::UserProject,
        }
    }
}

impl fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::GroupDomain => write!(f, "GroupDomain"),
            Self::GroupProject => write!(f, "GroupProject"),
            Self::UserDomain => write!(f, "UserDomain"),
            Self::UserProject => write!(f, "UserProject"),
        }
    }
}

/// Parameters for listing role assignments for role/target/actor.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct RoleAssignmentListParameters {
    /// Query role assignments filtering results by the role
    #[builder(default)]
    #[validate(length(max = 64))]
    pub role_id: Option<String>,

    /// Get role assignments for the user.
    #[builder(default)]
    #[validate(length(max = 64))]
    pub user_id: Option<String>,

    /// Get role assignments for the group.
    #[builder(default)]
    #[validate(length(max = 64))]
    pub group_id: Option<String>,

    /// Query role assignments on the project.
    #[builder(default)]
    #[validate(length(max = 64))]
    pub project_id: Option<String>,

    /// Query role assignments on the domain.
    #[builder(default)]
    #[validate(length(max = 64))]
    pub domain_id: Option<String>,

    /// Widen the project filter to the direct child projects.
    #[builder(default)]
    pub include_subtree: bool,

    /// Query the effective assignments, including any assignments gained by
    /// virtue of group membership.
    #[builder(default)]
    pub effective: bool,

    /// Include the role names.
    #[builder(default)]
    pub include_names: bool,
}

/// Querying role assignments for list of actors (typically user with all
/// groups user is member of) on list of targets.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct RoleAssignmentListForMultipleActorTargetParameters {
    /// List of actors for which assignments are looked up. Empty matches all.
    #[builder(default)]
    pub actors: Vec<String>,

    /// List of targets for which assignments are looked up. Empty matches all.
    #[builder(default)]
    pub targets: Vec<String>,

    /// Restrict the assignment types. Empty matches all.
    #[builder(default)]
    pub types: Vec<AssignmentType>,

    /// Optionally filter for the concrete role ID.
    #[builder(default)]
    pub role_id: Option<String>,

    /// Skip the inherited assignments.
    #[builder(default)]
    pub exclude_inherited: bool,

    /// Fill in the role names.
    #[builder(default)]
    pub include_names: bool,
}
