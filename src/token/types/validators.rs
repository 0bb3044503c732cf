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

use chrono::{DateTime, Utc};
use validator::ValidationError;

use crate::revoke::types::AUDIT_ID_SEP;

/// Audit ids are joined with a separator in the token cache and must not be
/// empty or contain it.
pub fn validate_audit_ids(audit_ids: &[String]) -> Result<(), ValidationError> {
    for audit_id in audit_ids {
        if audit_id.is_empty() || audit_id.contains(AUDIT_ID_SEP) {
            let mut err = ValidationError::new("invalid_audit_id");
            err.message = Some("Audit ID must be a non empty string without separators".into());
            return Err(err);
        }
    }
    Ok(())
}

pub fn validate_future_datetime(expires_at: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *expires_at <= Utc::now() {
        let mut err = ValidationError::new("expires_in_past");
        err.message = Some("Token expiration must be in the future".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_issued_datetime(issued_at: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *issued_at > Utc::now() {
        let mut err = ValidationError::new("issued_in_future");
        err.message = Some("Token issued_at cannot be in the future".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn test_audit_ids() {
        assert!(validate_audit_ids(&["Zm9vCg".into(), "user-id".into()]).is_ok());
        assert!(validate_audit_ids(&["".into()]).is_err());
        assert!(validate_audit_ids(&["a,b".into()]).is_err());
    }

    #[test]
    fn test_datetimes() {
        assert!(validate_future_datetime(&(Utc::now() + TimeDelta::seconds(10))).is_ok());
        assert!(validate_future_datetime(&(Utc::now() - TimeDelta::seconds(10))).is_err());
        assert!(validate_issued_datetime(&(Utc::now() + TimeDelta::seconds(100))).is_err());
    }
}
