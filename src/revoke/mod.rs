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
//! # Token cache and revocation
//!
//! Every issued token is recorded in the token cache table. Revocation flips
//! the record to invalid and walks the tokens minted from it: a token minted
//! by the `token` method stores its parent token as the audit chain, so the
//! children of a token are the valid records with `method = "token"` and
//! that token as the chain. Every token is visited at most once, which
//! terminates the walk.
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::config::Config;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;
use crate::revoke::backend::{RevokeBackend, sql::SqlBackend};
use crate::revoke::types::*;

pub use error::RevokeProviderError;
#[cfg(test)]
pub use mock::MockRevokeProvider;
pub use types::RevokeApi;

#[derive(Clone)]
pub struct RevokeProvider {
    /// Backend driver.
    backend_driver: Arc<dyn RevokeBackend>,
}

impl RevokeProvider {
    pub fn new(
        config: &Config,
        plugin_manager: &PluginManager,
    ) -> Result<Self, RevokeProviderError> {
        let backend_driver =
            if let Some(driver) = plugin_manager.get_revoke_backend(config.revoke.driver.clone()) {
                driver.clone()
            } else {
                match config.revoke.driver.as_str() {
                    "sql" => Arc::new(SqlBackend::default()),
                    _ => {
                        return Err(RevokeProviderError::UnsupportedDriver(
                            config.revoke.driver.clone(),
                        ));
                    }
                }
            };
        Ok(Self { backend_driver })
    }
}

#[async_trait]
impl RevokeApi for RevokeProvider {
    #[tracing::instrument(level = "info", skip_all, fields(method = %record.method))]
    async fn record_token(
        &self,
        state: &ServiceState,
        record: &TokenRecord,
    ) -> Result<(), RevokeProviderError> {
        self.backend_driver.upsert(state, record, true).await
    }

    #[tracing::instrument(level = "info", skip_all, fields(method = %record.method))]
    async fn revoke_token(
        &self,
        state: &ServiceState,
        record: &TokenRecord,
    ) -> Result<Vec<String>, RevokeProviderError> {
        self.backend_driver.upsert(state, record, false).await?;

        let mut visited: HashSet<String> = HashSet::from([record.token.clone()]);
        let mut revoked: Vec<String> = vec![record.token.clone()];
        let mut queue: VecDeque<(String, String)> = VecDeque::new();
        // The chain of a token minted from another token is the parent,
        // matching it would hit the siblings.
        if record.method != TOKEN_METHOD && !record.audit_ids.is_empty() {
            queue.push_back((record.method.clone(), record.chain()));
        }
        queue.push_back((TOKEN_METHOD.to_string(), record.token.clone()));

        while let Some((method, chain)) = queue.pop_front() {
            let found: Vec<String> = self
                .backend_driver
                .list_valid_by_chain(state, &method, &chain)
                .await?
                .into_iter()
                .map(|x| x.token)
                .filter(|token| visited.insert(token.clone()))
                .collect();
            if found.is_empty() {
                continue;
            }
            self.backend_driver.invalidate(state, &found).await?;
            for token in found {
                queue.push_back((TOKEN_METHOD.to_string(), token.clone()));
                revoked.push(token);
            }
        }
        tracing::info!("revoked {} token(s)", revoked.len());
        Ok(revoked)
    }

    #[tracing::instrument(level = "info", skip_all)]
    async fn is_token_revoked<'a>(
        &self,
        state: &ServiceState,
        token: &'a str,
    ) -> Result<bool, RevokeProviderError> {
        self.backend_driver.is_revoked(state, token).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn cleanup(&self, state: &ServiceState) -> Result<u64, RevokeProviderError> {
        let before = Utc::now() - Duration::seconds(state.config.revoke.retention);
        let deleted = self.backend_driver.delete_expired(state, before).await?;
        if deleted > 0 {
            tracing::info!("purged {} expired token cache records", deleted);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta};
    use std::sync::Mutex;

    use super::*;
    use crate::provider::Provider;
    use crate::tests::get_state;

    /// Token cache kept in memory, recording every invalidated token.
    #[derive(Default)]
    struct MemoryBackend {
        records: Mutex<Vec<(TokenRecord, bool)>>,
        invalidated: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RevokeBackend for MemoryBackend {
        async fn upsert(
            &self,
            _state: &ServiceState,
            record: &TokenRecord,
            valid: bool,
        ) -> Result<(), RevokeProviderError> {
            let mut records = self.records.lock().unwrap();
            records.retain(|(x, _)| x.token != record.token);
            records.push((record.clone(), valid));
            Ok(())
        }

        async fn list_valid_by_chain<'a>(
            &self,
            _state: &ServiceState,
            method: &'a str,
            chain: &'a str,
        ) -> Result<Vec<TokenRecord>, RevokeProviderError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|(x, valid)| *valid && x.method == method && x.chain() == chain)
                .map(|(x, _)| x.clone())
                .collect())
        }

        async fn invalidate(
            &self,
            _state: &ServiceState,
            tokens: &[String],
        ) -> Result<u64, RevokeProviderError> {
            let mut count = 0;
            for (record, valid) in self.records.lock().unwrap().iter_mut() {
                if tokens.contains(&record.token) {
                    *valid = false;
                    count += 1;
                }
            }
            self.invalidated.lock().unwrap().extend_from_slice(tokens);
            Ok(count)
        }

        async fn is_revoked<'a>(
            &self,
            _state: &ServiceState,
            token: &'a str,
        ) -> Result<bool, RevokeProviderError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .any(|(x, valid)| x.token == token && !valid))
        }

        async fn delete_expired(
            &self,
            _state: &ServiceState,
            before: DateTime<Utc>,
        ) -> Result<u64, RevokeProviderError> {
            let mut records = self.records.lock().unwrap();
            let len = records.len();
            records.retain(|(x, _)| x.expires_at >= before);
            Ok((len - records.len()) as u64)
        }
    }

    fn record(token: &str, method: &str, audit_ids: &[&str]) -> TokenRecord {
        TokenRecord {
            token: token.into(),
            expires_at: Utc::now() + TimeDelta::hours(1),
            method: method.into(),
            audit_ids: audit_ids.iter().map(|x| x.to_string()).collect(),
        }
    }

    /// Provider over the in memory cache holding the records.
    async fn provider(
        state: &ServiceState,
        records: &[TokenRecord],
    ) -> (RevokeProvider, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::default());
        let provider = RevokeProvider {
            backend_driver: backend.clone(),
        };
        for record in records {
            provider.record_token(state, record).await.unwrap();
        }
        (provider, backend)
    }

    async fn revoked(provider: &RevokeProvider, state: &ServiceState, token: &str) -> bool {
        provider.is_token_revoked(state, token).await.unwrap()
    }

    #[tokio::test]
    async fn test_revoke_reaches_grandchildren() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        let t1 = record("t1", "password", &["audit-1"]);
        let t2 = record("t2", TOKEN_METHOD, &["t1"]);
        let t3 = record("t3", TOKEN_METHOD, &["t2"]);
        let other = record("other", "password", &["audit-2"]);
        let (provider, _) = provider(&state, &[t1.clone(), t2, t3, other]).await;

        let res = provider.revoke_token(&state, &t1).await.unwrap();
        assert_eq!(vec!["t1", "t2", "t3"], res);
        for token in ["t1", "t2", "t3"] {
            assert!(revoked(&provider, &state, token).await, "{token}");
        }
        assert!(!revoked(&provider, &state, "other").await);
    }

    #[tokio::test]
    async fn test_revoke_child_keeps_parent_and_siblings() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        let t2a = record("t2a", TOKEN_METHOD, &["t1"]);
        let records = [
            record("t1", "password", &["audit-1"]),
            t2a.clone(),
            record("t2b", TOKEN_METHOD, &["t1"]),
            record("t3", TOKEN_METHOD, &["t2a"]),
            record("t3b", TOKEN_METHOD, &["t2b"]),
        ];
        let (provider, _) = provider(&state, &records).await;

        let res = provider.revoke_token(&state, &t2a).await.unwrap();
        assert_eq!(vec!["t2a", "t3"], res);
        assert!(revoked(&provider, &state, "t2a").await);
        assert!(revoked(&provider, &state, "t3").await);
        for token in ["t1", "t2b", "t3b"] {
            assert!(!revoked(&provider, &state, token).await, "{token}");
        }
    }

    #[tokio::test]
    async fn test_revoke_visits_each_token_once() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        // Two tokens of the same login share the audit chain.
        let p1 = record("p1", "password", &["audit-1"]);
        let records = [
            p1.clone(),
            record("p2", "password", &["audit-1"]),
            record("c1", TOKEN_METHOD, &["p1"]),
            record("c2", TOKEN_METHOD, &["p2"]),
            record("g1", TOKEN_METHOD, &["c1"]),
            record("g2", TOKEN_METHOD, &["c2"]),
        ];
        let (provider, backend) = provider(&state, &records).await;

        let mut res = provider.revoke_token(&state, &p1).await.unwrap();
        res.sort();
        assert_eq!(vec!["c1", "c2", "g1", "g2", "p1", "p2"], res);

        let mut invalidated = backend.invalidated.lock().unwrap().clone();
        let total = invalidated.len();
        invalidated.sort();
        invalidated.dedup();
        assert_eq!(total, invalidated.len());
        assert_eq!(vec!["c1", "c2", "g1", "g2", "p2"], invalidated);
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        let (provider, _) = provider(&state, &[]).await;

        let res = provider
            .revoke_token(&state, &record("lost", "password", &[]))
            .await
            .unwrap();
        assert_eq!(vec!["lost"], res);
        assert!(revoked(&provider, &state, "lost").await);
    }

    #[tokio::test]
    async fn test_cleanup() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        let mut expired = record("old", "password", &[]);
        expired.expires_at =
            Utc::now() - Duration::seconds(state.config.revoke.retention) - TimeDelta::hours(1);
        let (provider, _) =
            provider(&state, &[expired, record("fresh", "password", &[])]).await;

        assert_eq!(1, provider.cleanup(&state).await.unwrap());
        assert_eq!(0, provider.cleanup(&state).await.unwrap());
    }
}
