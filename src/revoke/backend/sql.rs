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
use chrono::{DateTime, Utc};

use super::RevokeBackend;
use crate::keystone::ServiceState;
use crate::revoke::RevokeProviderError;
use crate::revoke::types::*;

mod token_cache;

#[derive(Clone, Debug, Default)]
pub struct SqlBackend {}

#[async_trait]
impl RevokeBackend for SqlBackend {
    async fn upsert(
        &self,
        state: &ServiceState,
        record: &TokenRecord,
        valid: bool,
    ) -> Result<(), RevokeProviderError> {
        token_cache::upsert(&state.db, record, valid).await
    }

    async fn list_valid_by_chain<'a>(
        &self,
        state: &ServiceState,
        method: &'a str,
        chain: &'a str,
    ) -> Result<Vec<TokenRecord>, RevokeProviderError> {
        token_cache::list_valid_by_chain(&state.db, method, chain).await
    }

    async fn invalidate(
        &self,
        state: &ServiceState,
        tokens: &[String],
    ) -> Result<u64, RevokeProviderError> {
        token_cache::invalidate(&state.db, tokens).await
    }

    async fn is_revoked<'a>(
        &self,
        state: &ServiceState,
        token: &'a str,
    ) -> Result<bool, RevokeProviderError> {
        token_cache::is_revoked(&state.db, token).await
    }

    async fn delete_expired(
        &self,
        state: &ServiceState,
        before: DateTime<Utc>,
    ) -> Result<u64, RevokeProviderError> {
        token_cache::delete_expired(&state.db, before).await
    }
}
