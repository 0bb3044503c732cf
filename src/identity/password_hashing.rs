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
//! Password hashing.
use std::cmp::max;
use tokio::task;
use tracing::warn;

use crate::config::{Config, PasswordHashingAlgo};
use crate::identity::error::IdentityProviderPasswordHashError;

/// Bcrypt only considers that many leading bytes.
const BCRYPT_MAX_LENGTH: usize = 72;

fn verify_length_and_trunc_password(password: &[u8], max_length: usize) -> &[u8] {
    if password.len() > max_length {
        warn!("Truncating password to the specified value");
        return &password[..max_length];
    }
    password
}

/// Calculate password hash with the configuration defaults.
pub async fn hash_password<S: AsRef<[u8]>>(
    conf: &Config,
    password: S,
) -> Result<String, IdentityProviderPasswordHashError> {
    let password_bytes = verify_length_and_trunc_password(
        password.as_ref(),
        max(conf.identity.max_password_length, BCRYPT_MAX_LENGTH),
    )
    .to_owned();
    match conf.identity.password_hashing_algorithm {
        PasswordHashingAlgo::Bcrypt => {
            let rounds = conf.identity.password_hash_rounds.unwrap_or(12);
            let hash =
                task::spawn_blocking(move || bcrypt::hash(password_bytes, rounds)).await??;
            Ok(hash)
        }
        PasswordHashingAlgo::None => Ok(String::from_utf8_lossy(&password_bytes).into_owned()),
    }
}

/// Verify the password matches the hashed value.
pub async fn verify_password<P: AsRef<[u8]>, H: AsRef<str>>(
    conf: &Config,
    password: P,
    hash: H,
) -> Result<bool, IdentityProviderPasswordHashError> {
    let password_bytes = verify_length_and_trunc_password(
        password.as_ref(),
        max(conf.identity.max_password_length, BCRYPT_MAX_LENGTH),
    )
    .to_owned();
    match conf.identity.password_hashing_algorithm {
        PasswordHashingAlgo::Bcrypt => {
            let password_hash = hash.as_ref().to_string();
            // bcrypt is slow on purpose, keep it off the runtime threads.
            let verify =
                task::spawn_blocking(move || bcrypt::verify(password_bytes, &password_hash))
                    .await??;
            Ok(verify)
        }
        PasswordHashingAlgo::None => Ok(password_bytes == hash.as_ref().as_bytes()),
    }
}
