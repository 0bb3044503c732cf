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
//! Key repository on the file system.
//!
//! Keys are stored one per file named by an integer. The highest index is the
//! primary key, `0` is the staged key.
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{trace, warn};

use super::KeyRingError;

/// Load the keys from the repository directory with the primary key first.
///
/// Missing directory results in the empty list.
pub async fn load_keys<P: AsRef<Path>>(path: P) -> Result<Vec<String>, KeyRingError> {
    let mut keys: BTreeMap<u32, String> = BTreeMap::new();
    if !path.as_ref().exists() {
        return Ok(Vec::new());
    }
    let mut entries = fs::read_dir(path.as_ref()).await?;
    while let Some(entry) = entries.next_entry().await? {
        if let Ok(fname) = entry.file_name().into_string()
            && let Ok(key_order) = fname.parse::<u32>()
        {
            trace!("Loading key {:?}", entry.file_name());
            let key = fs::read_to_string(entry.path())
                .await
                .map_err(|e| KeyRingError::KeyRead {
                    source: e,
                    path: entry.path(),
                })?
                .trim_end()
                .to_string();
            if fernet::Fernet::new(&key).is_some() {
                keys.insert(key_order, key);
            } else {
                warn!(
                    "The key {:?} is not usable for Fernet library",
                    entry.file_name()
                )
            }
        }
    }
    Ok(keys.into_values().rev().collect())
}

/// Replace the content of the repository with the keys (primary first).
pub async fn write_keys<P: AsRef<Path>>(path: P, keys: &[String]) -> Result<(), KeyRingError> {
    fs::create_dir_all(path.as_ref()).await?;
    let mut entries = fs::read_dir(path.as_ref()).await?;
    while let Some(entry) = entries.next_entry().await? {
        if let Ok(fname) = entry.file_name().into_string()
            && fname.parse::<u32>().is_ok()
        {
            fs::remove_file(entry.path()).await?;
        }
    }
    for (idx, key) in keys.iter().rev().enumerate() {
        fs::write(path.as_ref().join(idx.to_string()), key).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_load_highest_index_is_primary() {
        let dir = tempdir().unwrap();
        let k0 = fernet::Fernet::generate_key();
        let k1 = fernet::Fernet::generate_key();
        write!(File::create(dir.path().join("0")).unwrap(), "{k0}\n").unwrap();
        write!(File::create(dir.path().join("1")).unwrap(), "{k1}").unwrap();
        write!(File::create(dir.path().join("README")).unwrap(), "ignored").unwrap();
        write!(File::create(dir.path().join("2")).unwrap(), "not a key").unwrap();

        let keys = load_keys(dir.path()).await.unwrap();
        assert_eq!(vec![k1, k0], keys);
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(load_keys(dir.path().join("nope")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_then_load() {
        let dir = tempdir().unwrap();
        let keys: Vec<String> = (0..3).map(|_| fernet::Fernet::generate_key()).collect();
        write_keys(dir.path(), &keys).await.unwrap();
        write_keys(dir.path(), &keys[..2]).await.unwrap();
        assert_eq!(keys[..2].to_vec(), load_keys(dir.path()).await.unwrap());
    }
}
