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

use crate::db::entity::group as db_group;
use crate::identity::types::Group;

mod create;
mod delete;
mod get;
mod list;

pub use create::create;
pub use delete::delete;
pub use get::{find_by_name, get};
pub use list::list;

impl From<db_group::Model> for Group {
    fn from(value: db_group::Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            domain_id: value.domain_id,
            displayname: value.displayname,
            description: value.description,
        }
    }
}
