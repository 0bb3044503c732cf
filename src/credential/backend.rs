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
//! Credential store backend drivers.
use async_trait::async_trait;

use crate::credential::CredentialProviderError;
use crate::credential::types::*;
use crate::keystone::ServiceState;

pub mod sql;

#[async_trait]
pub trait CredentialBackend: Send + Sync {
    async fn create(
        &self,
        state: &ServiceState,
        credential: EncryptedCredential,
    ) -> Result<EncryptedCredential, CredentialProviderError>;

    async fn get<'a>(
        &self,
        state: &ServiceState,
        id: &'a str,
    ) -> Result<Option<EncryptedCredential>, CredentialProviderError>;

    async fn list<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        r#type: Option<CredentialType>,
    ) -> Result<Vec<EncryptedCredential>, CredentialProviderError>;
}
