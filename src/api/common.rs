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
//! # Common API helpers
use axum::http::HeaderMap;
use tracing::debug;

use crate::api::KeystoneApiError;
use crate::api::types::{RequestContext, ScopeProject};
use crate::keystone::ServiceState;
use crate::policy::types::PolicyScope;
use crate::resource::{
    ResourceApi,
    types::{Domain, Project},
};
use crate::token::{Token, TokenApi, TokenContext};

/// Header carrying the token subject to the operation.
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Get the domain by ID or Name
///
/// # Arguments
/// * `state` - The service state
/// * `id` - The domain ID
/// * `name` - The domain name
///
/// # Returns
/// * `Result<Domain, KeystoneApiError>` - The domain object
pub async fn get_domain<I: AsRef<str>, N: AsRef<str>>(
    state: &ServiceState,
    id: Option<I>,
    name: Option<N>,
) -> Result<Domain, KeystoneApiError> {
    if let Some(did) = id.as_ref().filter(|x| !x.as_ref().is_empty()) {
        state
            .provider
            .get_resource_provider()
            .get_domain(state, did.as_ref())
            .await?
            .ok_or_else(|| KeystoneApiError::NotFound {
                resource: "domain".into(),
                identifier: did.as_ref().to_string(),
            })
    } else if let Some(name) = name.as_ref().filter(|x| !x.as_ref().is_empty()) {
        state
            .provider
            .get_resource_provider()
            .find_domain_by_name(state, name.as_ref())
            .await?
            .ok_or_else(|| KeystoneApiError::NotFound {
                resource: "domain".into(),
                identifier: name.as_ref().to_string(),
            })
    } else {
        Err(KeystoneApiError::DomainIdOrName)
    }
}

/// Find the project referred in the scope.
///
/// # Arguments
/// * `state` - The service state.
/// * `scope` - The scope to find the project.
///
/// # Returns
/// The resolved project.
pub async fn find_project_from_scope(
    state: &ServiceState,
    scope: &ScopeProject,
) -> Result<Option<Project>, KeystoneApiError> {
    let project = if let Some(pid) = scope.id.as_ref().filter(|x| !x.is_empty()) {
        state
            .provider
            .get_resource_provider()
            .get_project(state, pid)
            .await?
    } else if let Some(name) = scope.name.as_ref().filter(|x| !x.is_empty()) {
        let domain = scope
            .domain
            .as_ref()
            .filter(|x| !x.is_empty())
            .ok_or(KeystoneApiError::ProjectDomain)?;
        let domain = get_domain(state, domain.id.as_ref(), domain.name.as_ref()).await?;
        state
            .provider
            .get_resource_provider()
            .get_project_by_name(state, name, &domain.id)
            .await?
    } else {
        return Err(KeystoneApiError::ProjectIdOrName);
    };
    Ok(project)
}

/// Read the `X-Subject-Token` header.
pub fn subject_token(headers: &HeaderMap) -> Result<String, KeystoneApiError> {
    Ok(headers
        .get(SUBJECT_TOKEN_HEADER)
        .ok_or(KeystoneApiError::SubjectTokenMissing)?
        .to_str()
        .map_err(|_| KeystoneApiError::InvalidHeader)?
        .to_string())
}

/// Origin of the request.
///
/// The context given in the request body wins. Otherwise the client address
/// comes from the `X-Forwarded-For` (first hop) or `X-Real-IP` headers.
pub fn request_context(headers: &HeaderMap, context: Option<RequestContext>) -> TokenContext {
    let mut context: TokenContext = context.unwrap_or_default().into();
    if context.source.is_empty() {
        context.source = "api".into();
    }
    if context.ip.is_empty() {
        context.ip = headers
            .get("X-Forwarded-For")
            .and_then(|x| x.to_str().ok())
            .and_then(|x| x.split(',').next())
            .or_else(|| headers.get("X-Real-IP").and_then(|x| x.to_str().ok()))
            .map(|x| x.trim().to_string())
            .unwrap_or_default();
    }
    context
}

/// Authorize the operation `<service>:<resource>:<action>[:<extra>]` for
/// the caller token.
///
/// Returns the broadest scope at which the policies of the token allow the
/// operation.
pub async fn enforce(
    state: &ServiceState,
    token: &Token,
    operation: &str,
) -> Result<PolicyScope, KeystoneApiError> {
    let mut parts = operation.splitn(4, ':');
    let (Some(service), Some(resource), Some(action)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(KeystoneApiError::InternalError(format!(
            "malformed operation {operation}"
        )));
    };
    let extra = parts.next();
    state
        .provider
        .get_token_provider()
        .get_token_policies(state, token)
        .await?
        .decide(service, resource, action, extra)
        .ok_or(KeystoneApiError::Forbidden)
}

/// Domain the token belongs to: the scoped domain, the domain of the scoped
/// project or the domain of the user for the unscoped tokens.
pub fn token_domain(token: &Token) -> Option<&str> {
    token
        .domain_id()
        .map(String::as_str)
        .or_else(|| token.project().map(|project| project.domain_id.as_str()))
        .or_else(|| {
            if token.is_scoped() {
                None
            } else {
                token.user().as_ref().map(|user| user.domain_id.as_str())
            }
        })
}

/// Require the subject token to lie within the scope the caller was granted
/// the operation at.
pub fn ensure_token_within(
    granted: PolicyScope,
    caller: &Token,
    subject: &Token,
) -> Result<(), KeystoneApiError> {
    let within = match granted {
        PolicyScope::System => true,
        PolicyScope::Domain => token_domain(caller)
            .filter(|_| caller.is_scoped())
            .is_some_and(|domain_id| token_domain(subject) == Some(domain_id)),
        PolicyScope::Project => caller
            .project_id()
            .is_some_and(|project_id| subject.project_id() == Some(project_id)),
    };
    if within {
        Ok(())
    } else {
        debug!(
            "token of {} is outside of the {} scope of {}",
            subject.user_id(),
            granted,
            caller.user_id()
        );
        Err(KeystoneApiError::Forbidden)
    }
}
