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
//! # Plugin manager
//!
//! A backend is an abstraction around the data access needed by a particular
//! subsystem. The same pluggable implementation is used for the built-in SQL
//! storage and for the custom one.
//!
//! The [PluginManager] is responsible for picking the proper backend for the
//! provider. It also carries additional identity provider driver factories
//! which extend or replace the built-in driver classes.
use std::collections::HashMap;
use std::sync::Arc;

use crate::assignment::backend::AssignmentBackend;
use crate::catalog::backend::CatalogBackend;
use crate::credential::backend::CredentialBackend;
use crate::identity::backend::IdentityBackend;
use crate::identity_mapping::backend::IdentityMappingBackend;
use crate::idp::backend::IdpBackend;
use crate::idp::driver::DriverFactory;
use crate::policy::backend::PolicyBackend;
use crate::resource::backend::ResourceBackend;
use crate::revoke::backend::RevokeBackend;

/// Plugin manager allowing to pass custom backend plugins implementing required
/// trait during the service start.
#[derive(Clone, Default)]
pub struct PluginManager {
    /// Assignments backend plugin.
    assignment_backends: HashMap<String, Arc<dyn AssignmentBackend>>,
    /// Catalog backend plugins.
    catalog_backends: HashMap<String, Arc<dyn CatalogBackend>>,
    /// Credential backend plugins.
    credential_backends: HashMap<String, Arc<dyn CredentialBackend>>,
    /// Identity backend plugins.
    identity_backends: HashMap<String, Arc<dyn IdentityBackend>>,
    /// Identity mapping backend plugins.
    identity_mapping_backends: HashMap<String, Arc<dyn IdentityMappingBackend>>,
    /// Identity provider registry backend plugins.
    idp_backends: HashMap<String, Arc<dyn IdpBackend>>,
    /// Identity provider driver factories.
    identity_drivers: HashMap<String, DriverFactory>,
    /// Policy backend plugins.
    policy_backends: HashMap<String, Arc<dyn PolicyBackend>>,
    /// Resource backend plugins.
    resource_backends: HashMap<String, Arc<dyn ResourceBackend>>,
    /// Revoke backend plugins.
    revoke_backends: HashMap<String, Arc<dyn RevokeBackend>>,
}

impl PluginManager {
    /// Register identity backend.
    pub fn register_identity_backend<S: AsRef<str>>(
        &mut self,
        name: S,
        plugin: Arc<dyn IdentityBackend>,
    ) {
        self.identity_backends
            .insert(name.as_ref().to_string(), plugin);
    }

    /// Register identity provider driver factory. The factory is picked for
    /// the identity providers with the matching `driver`.
    pub fn register_identity_driver<S: AsRef<str>>(&mut self, name: S, factory: DriverFactory) {
        self.identity_drivers
            .insert(name.as_ref().to_string(), factory);
    }

    /// Get registered assignment backend.
    #[allow(clippy::borrowed_box)]
    pub fn get_assignment_backend<S: AsRef<str>>(
        &self,
        name: S,
    ) -> Option<&Arc<dyn AssignmentBackend>> {
        self.assignment_backends.get(name.as_ref())
    }

    /// Get registered catalog backend.
    #[allow(clippy::borrowed_box)]
    pub fn get_catalog_backend<S: AsRef<str>>(&self, name: S) -> Option<&Arc<dyn CatalogBackend>> {
        self.catalog_backends.get(name.as_ref())
    }

    /// Get registered credential backend.
    #[allow(clippy::borrowed_box)]
    pub fn get_credential_backend<S: AsRef<str>>(
        &self,
        name: S,
    ) -> Option<&Arc<dyn CredentialBackend>> {
        self.credential_backends.get(name.as_ref())
    }

    /// Get registered identity backend.
    #[allow(clippy::borrowed_box)]
    pub fn get_identity_backend<S: AsRef<str>>(
        &self,
        name: S,
    ) -> Option<&Arc<dyn IdentityBackend>> {
        self.identity_backends.get(name.as_ref())
    }

    /// Get registered identity mapping backend.
    #[allow(clippy::borrowed_box)]
    pub fn get_identity_mapping_backend<S: AsRef<str>>(
        &self,
        name: S,
    ) -> Option<&Arc<dyn IdentityMappingBackend>> {
        self.identity_mapping_backends.get(name.as_ref())
    }

    /// Get registered identity provider registry backend.
    #[allow(clippy::borrowed_box)]
    pub fn get_idp_backend<S: AsRef<str>>(&self, name: S) -> Option<&Arc<dyn IdpBackend>> {
        self.idp_backends.get(name.as_ref())
    }

    /// Iterate over the registered identity provider driver factories.
    pub fn get_identity_drivers(&self) -> impl Iterator<Item = (&String, &DriverFactory)> {
        self.identity_drivers.iter()
    }

    /// Get registered policy backend.
    #[allow(clippy::borrowed_box)]
    pub fn get_policy_backend<S: AsRef<str>>(&self, name: S) -> Option<&Arc<dyn PolicyBackend>> {
        self.policy_backends.get(name.as_ref())
    }

    /// Get registered resource backend.
    #[allow(clippy::borrowed_box)]
    pub fn get_resource_backend<S: AsRef<str>>(
        &self,
        name: S,
    ) -> Option<&Arc<dyn ResourceBackend>> {
        self.resource_backends.get(name.as_ref())
    }

    /// Get registered revoke backend.
    #[allow(clippy::borrowed_box)]
    pub fn get_revoke_backend<S: AsRef<str>>(&self, name: S) -> Option<&Arc<dyn RevokeBackend>> {
        self.revoke_backends.get(name.as_ref())
    }
}
