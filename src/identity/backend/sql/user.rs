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

use crate::db::entity::user as db_user;
use crate::identity::types::UserResponse;

mod create;
mod delete;
mod get;
mod list;
mod login;
mod update;

pub use create::create;
pub use delete::delete;
pub use get::{find_by_name, get};
pub use list::list;
pub use login::record_login;
pub use update::update;

impl From<db_user::Model> for UserResponse {
    fn from(value: db_user::Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            domain_id: value.domain_id,
            enabled: value.enabled,
            displayname: value.displayname,
            email: value.email,
            mobile: value.mobile,
            default_project_id: value.default_project_id,
            is_system_account: value.is_system_account,
            last_active_at: value.last_active_at.map(|x| x.and_utc()),
            created_at: value.created_at.map(|x| x.and_utc()),
        }
    }
}
