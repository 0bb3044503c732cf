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

use crate::credential::CredentialProviderError;
use crate::credential::types::*;
use crate::keystone::ServiceState;

#[async_trait]
pub trait CredentialApi: Send + Sync + Clone {
    /// Store the credential encrypting the blob with the credential key ring.
    async fn create_credential(
        &self,
        state: &ServiceState,
        credential: CredentialCreate,
    ) -> Result<Credential, CredentialProviderError>;

    async fn get_credential<'a>(
        &self,
        state: &ServiceState,
        id: &'a str,
    ) -> Result<Option<Credential>, CredentialProviderError>;

    /// List the credentials of the user, optionally of a single type.
    async fn list_credentials<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        r#type: Option<CredentialType>,
    ) -> Result<Vec<Credential>, CredentialProviderError>;
}
