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

use super::CredentialBackend;
use crate::credential::CredentialProviderError;
use crate::credential::types::*;
use crate::keystone::ServiceState;

mod credential;

#[derive(Clone, Debug, Default)]
pub struct SqlBackend {}

#[async_trait]
impl CredentialBackend for SqlBackend {
    async fn create(
        &self,
        state: &ServiceState,
        credential: EncryptedCredential,
    ) -> Result<EncryptedCredential, CredentialProviderError> {
        credential::create(&state.db, credential).await
    }

    async fn get<'a>(
        &self,
        state: &ServiceState,
        id: &'a str,
    ) -> Result<Option<EncryptedCredential>, CredentialProviderError> {
        credential::get(&state.db, id).await
    }

    async fn list<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        r#type: Option<CredentialType>,
    ) -> Result<Vec<EncryptedCredential>, CredentialProviderError> {
        credential::list(&state.db, user_id, r#type).await
    }
}
