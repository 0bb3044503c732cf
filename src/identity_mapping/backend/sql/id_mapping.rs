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

use crate::db::entity::id_mapping as db_id_mapping;
use crate::identity_mapping::IdentityMappingProviderError;
use crate::identity_mapping::types::*;

mod create;
mod delete;
mod get;
mod list;

pub use create::create;
pub use delete::{delete_by_idp, delete_by_public_id};
pub use get::{get_by_local_id, get_by_public_id};
pub use list::list_by_idp;

impl TryFrom<db_id_mapping::Model> for IdMapping {
    type Error = IdentityMappingProviderError;

    fn try_from(value: db_id_mapping::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            idp_id: value.domain_id,
            entity_type: IdMappingEntityType::try_from(value.entity_type.as_str())
                .map_err(IdentityMappingProviderError::EntityType)?,
            local_id: value.local_id,
            public_id: value.public_id,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn get_id_mapping_mock<P: Into<String>, L: Into<String>>(
        public_id: P,
        local_id: L,
    ) -> db_id_mapping::Model {
        db_id_mapping::Model {
            public_id: public_id.into(),
            domain_id: "idp".into(),
            local_id: local_id.into(),
            entity_type: "user".into(),
        }
    }
}
