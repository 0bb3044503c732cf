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

//! # Keystone IAM
//!
//! Identity and access management service issuing Fernet tokens for a
//! multi-tenant cloud platform. Users, groups, projects, domains, roles and
//! role-policy bindings live in a SQL store; external directories and SSO
//! providers are plugged in as identity provider drivers.
//!
//! The service answers three questions:
//!
//! - who is the caller: password, token, SAML, OIDC, OAuth2, CAS and LDAP
//!   authentication resolve to a single local user, creating or linking it
//!   through the id-mapping when it comes from an external source;
//!
//! - what may the caller do: the effective roles in the requested project or
//!   domain select the role-policy bindings, which are filtered by the source
//!   IP and the validity window into a scope-indexed policy group;
//!
//! - is a presented token still good: tokens are self-contained MessagePack
//!   payloads in a Fernet envelope, verified against the key ring and the
//!   revocation records, with cascading revocation over the tokens minted
//!   from a revoked one.
//!
//! A background synchronizer mirrors LDAP directories into the local tables
//! and keeps the health of every identity provider.

pub mod api;
pub mod assignment;
pub mod auth;
pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod credential;
pub mod db;
pub mod error;
pub mod identity;
pub mod identity_mapping;
pub mod idp;
pub mod key_ring;
pub mod keystone;
pub mod plugin_manager;
pub mod policy;
pub mod provider;
pub mod resource;
pub mod revoke;
pub mod token;

#[cfg(test)]
mod tests;
