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

pub use super::assignment::Entity as Assignment;
pub use super::credential::Entity as Credential;
pub use super::endpoint::Entity as Endpoint;
pub use super::fernet_key::Entity as FernetKey;
pub use super::group::Entity as Group;
pub use super::id_mapping::Entity as IdMapping;
pub use super::identity_provider::Entity as IdentityProvider;
pub use super::local_user::Entity as LocalUser;
pub use super::password::Entity as Password;
pub use super::policy::Entity as Policy;
pub use super::project::Entity as Project;
pub use super::region::Entity as Region;
pub use super::role::Entity as Role;
pub use super::role_policy::Entity as RolePolicy;
pub use super::sensitive_config::Entity as SensitiveConfig;
pub use super::service::Entity as Service;
pub use super::token_cache::Entity as TokenCache;
pub use super::user::Entity as User;
pub use super::user_group_membership::Entity as UserGroupMembership;
pub use super::whitelisted_config::Entity as WhitelistedConfig;
