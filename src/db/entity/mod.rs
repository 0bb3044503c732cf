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
//! Entity definitions.
pub mod prelude;

pub mod assignment;
pub mod credential;
pub mod endpoint;
pub mod fernet_key;
pub mod group;
pub mod id_mapping;
pub mod identity_provider;
pub mod local_user;
pub mod password;
pub mod policy;
pub mod project;
pub mod region;
pub mod role;
pub mod role_policy;
pub mod sea_orm_active_enums;
pub mod sensitive_config;
pub mod service;
pub mod token_cache;
pub mod user;
pub mod user_group_membership;
pub mod whitelisted_config;
