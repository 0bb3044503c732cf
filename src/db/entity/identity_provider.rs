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

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Default)]
#[sea_orm(table_name = "identity_provider")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub driver: String,
    pub template: Option<String>,
    pub target_domain_id: Option<String>,
    pub auto_create_project: bool,
    pub auto_create_user: bool,
    pub enabled: bool,
    pub is_sso: bool,
    pub is_default: bool,
    pub sync_status: String,
    pub sync_status_at: Option<DateTime>,
    pub status: String,
    pub error_count: i32,
    pub sync_interval_seconds: Option<i32>,
    pub last_sync: Option<DateTime>,
    pub last_sync_end_at: Option<DateTime>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
