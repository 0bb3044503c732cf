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

use crate::keystone::ServiceState;
use crate::revoke::RevokeProviderError;
use crate::revoke::types::*;

#[async_trait]
pub trait RevokeApi: Send + Sync + Clone {
    /// Store the issued token so that a later revocation of its parent can
    /// find it.
    async fn record_token(
        &self,
        state: &ServiceState,
        record: &TokenRecord,
    ) -> Result<(), RevokeProviderError>;

    /// Revoke the token together with every token minted from it,
    /// recursively. Returns all revoked token strings.
    async fn revoke_token(
        &self,
        state: &ServiceState,
        record: &TokenRecord,
    ) -> Result<Vec<String>, RevokeProviderError>;

    /// Check whether the token has been revoked.
    async fn is_token_revoked<'a>(
        &self,
        state: &ServiceState,
        token: &'a str,
    ) -> Result<bool, RevokeProviderError>;

    /// Delete the records expired longer than the retention period. Returns
    /// the number of deleted records.
    async fn cleanup(&self, state: &ServiceState) -> Result<u64, RevokeProviderError>;
}
