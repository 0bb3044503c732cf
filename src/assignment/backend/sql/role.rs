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

use crate::assignment::types::{ROLE_NULL_DOMAIN_ID, Role};
use crate::db::entity::role as db_role;

mod create;
mod get;
mod list;

pub use create::create;
pub use get::{get, get_by_name};
pub use list::list;

impl From<db_role::Model> for Role {
    fn from(value: db_role::Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            domain_id: if value.domain_id == ROLE_NULL_DOMAIN_ID {
                None
            } else {
                Some(value.domain_id)
            },
            description: value.description,
        }
    }
}
