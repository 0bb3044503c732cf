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
use derive_builder::Builder;
use serde::Serialize;
use std::io::Write;
use validator::Validate;

use crate::assignment::types::Role;
use crate::error::BuilderError;
use crate::identity::types::UserResponse;
use crate::resource::types::Domain;
use crate::token::{
    backend::fernet::{MsgPackToken, utils},
    error::TokenProviderError,
    types::{AuthMethod, Token, TokenContext, validators},
};

#[derive(Builder, Clone, Debug, Default, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct DomainScopePayload {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,

    #[builder(default)]
    pub method: AuthMethod,

    #[builder(default, setter(name = _audit_ids))]
    #[validate(custom(function = "validators::validate_audit_ids"))]
    pub audit_ids: Vec<String>,

    #[validate(custom(function = "validators::validate_future_datetime"))]
    pub expires_at: DateTime<Utc>,

    #[builder(default)]
    #[validate(custom(function = "validators::validate_issued_datetime"))]
    pub issued_at: DateTime<Utc>,

    #[validate(length(min = 1, max = 64))]
    pub domain_id: String,

    #[builder(default)]
    pub context: Option<TokenContext>,

    #[builder(default)]
    pub user: Option<UserResponse>,

    #[builder(default)]
    pub domain: Option<Domain>,

    #[builder(default)]
    pub roles: Option<Vec<Role>>,
}

impl DomainScopePayloadBuilder {
    pub fn audit_ids<I, V>(&mut self, iter: I) -> &mut Self
    where
        I: Iterator<Item = V>,
        V: Into<String>,
    {
        self.audit_ids
            .get_or_insert_with(Vec::new)
            .extend(iter.map(Into::into));
        self
    }
}

impl From<DomainScopePayload> for Token {
    fn from(value: DomainScopePayload) -> Self {
        Self::DomainScope(value)
    }
}

impl MsgPackToken for DomainScopePayload {
    type Token = Self;

    fn assemble<W: Write>(&self, wd: &mut W) -> Result<(), TokenProviderError> {
        utils::write_uuid(wd, &self.user_id)?;
        utils::write_method(wd, self.method)?;
        utils::write_uuid(wd, &self.domain_id)?;
        utils::write_time(wd, self.expires_at)?;
        utils::write_audit_ids(wd, &self.audit_ids)?;
        if let Some(context) = &self.context {
            utils::write_context(wd, context)?;
        }
        Ok(())
    }

    fn disassemble(rd: &mut &[u8], with_context: bool) -> Result<Self::Token, TokenProviderError> {
        // Order of reading is important
        let user_id = utils::read_uuid(rd)?;
        let method = utils::read_method(rd)?;
        let domain_id = utils::read_uuid(rd)?;
        let expires_at = utils::read_time(rd)?;
        let audit_ids = utils::read_audit_ids(rd)?;
        let context = if with_context {
            Some(utils::read_context(rd)?)
        } else {
            None
        };
        Ok(Self::Token {
            user_id,
            method,
            domain_id,
            expires_at,
            audit_ids,
            context,
            ..Default::default()
        })
    }
}
