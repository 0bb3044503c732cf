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

mod create;
mod delete;
mod get;

pub use create::create;
pub use delete::delete;
pub use get::{get_domain_by_id, get_domain_by_name, list};

use crate::db::entity::project as db_project;
use crate::resource::types::Domain;

impl From<db_project::Model> for Domain {
    fn from(value: db_project::Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            enabled: value.enabled,
            description: value.description,
            driver: None,
            readonly: false,
        }
    }
}
