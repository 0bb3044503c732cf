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
//! # Fernet token codec
//!
//! The payload is a MessagePack array:
//! `[version, user_id, method, (domain_id | project_id)?, expires_at,
//! audit_ids, ([source, ip])?]`. Versions 0, 1 and 2 are the unscoped, domain
//! and project scoped tokens, versions 3, 4 and 5 are the same shapes with the
//! request context appended.
use base64::Engine;
use byteorder::ReadBytesExt;
use chrono::{DateTime, TimeDelta, Utc};
use rmp::{
    Marker,
    decode::{ValueReadError, read_marker, read_u8},
    encode::{write_array_len, write_pfix},
};
use std::fmt;
use std::io::{Cursor, Write};
use tracing::trace;

use crate::config::Config;
use crate::key_ring::{KeyRing, KeyRingError};
use crate::token::backend::TokenBackend;
use crate::token::{
    TokenProviderError,
    types::{DomainScopePayload, ProjectScopePayload, Token, UnscopedPayload},
};

pub mod utils;

/// Payload versions in the order the decoder tries them.
const PAYLOAD_VERSIONS: [u8; 6] = [5, 4, 3, 2, 1, 0];

#[derive(Clone)]
pub struct FernetTokenProvider {
    /// Maximal age of the Fernet envelope.
    ttl: TimeDelta,
}

pub trait MsgPackToken {
    type Token;

    /// Construct MsgPack payload for the Token
    fn assemble<W: Write>(&self, wd: &mut W) -> Result<(), TokenProviderError>;

    /// Parse MsgPack payload into the Token
    fn disassemble(rd: &mut &[u8], with_context: bool) -> Result<Self::Token, TokenProviderError>;
}

impl fmt::Debug for FernetTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FernetTokenProvider").finish()
    }
}

/// Read the payload version
fn read_payload_version(rd: &mut &[u8]) -> Result<u8, TokenProviderError> {
    match read_marker(rd).map_err(ValueReadError::from)? {
        Marker::FixPos(dt) => Ok(dt),
        Marker::U8 => Ok(read_u8(rd)?),
        _ => Err(TokenProviderError::InvalidToken),
    }
}

/// Number of array elements of the payload version.
fn payload_len(version: u8) -> u32 {
    let scope = if version % 3 == 0 { 0 } else { 1 };
    let context = if version >= 3 { 1 } else { 0 };
    5 + scope + context
}

/// Decode the payload assuming it is of the given version.
///
/// The payload must report the version and be consumed completely.
fn decode_version(payload: &[u8], version: u8) -> Result<Token, TokenProviderError> {
    let rd = &mut &payload[..];
    let len = match read_marker(rd).map_err(ValueReadError::from)? {
        Marker::FixArray(len) => u32::from(len),
        _ => return Err(TokenProviderError::InvalidToken),
    };
    if read_payload_version(rd)? != version {
        return Err(TokenProviderError::VerMismatch);
    }
    if len != payload_len(version) {
        return Err(TokenProviderError::InvalidToken);
    }
    let with_context = version >= 3;
    let token: Token = match version % 3 {
        0 => UnscopedPayload::disassemble(rd, with_context)?.into(),
        1 => DomainScopePayload::disassemble(rd, with_context)?.into(),
        _ => ProjectScopePayload::disassemble(rd, with_context)?.into(),
    };
    if !rd.is_empty() {
        trace!("{} trailing bytes in the payload", rd.len());
        return Err(TokenProviderError::InvalidToken);
    }
    Ok(token)
}

/// Decode the payload trying the most specific version first.
pub fn decode_payload(payload: &[u8]) -> Result<Token, TokenProviderError> {
    for version in PAYLOAD_VERSIONS {
        match decode_version(payload, version) {
            Err(TokenProviderError::VerMismatch) => continue,
            other => return other,
        }
    }
    Err(TokenProviderError::VerMismatch)
}

/// Encode Token as binary blob as MessagePack
pub fn encode_payload(token: &Token) -> Result<Vec<u8>, TokenProviderError> {
    let mut buf = vec![];
    let version = token.version();
    write_array_len(&mut buf, payload_len(version))
        .map_err(|x| TokenProviderError::RmpEncode(x.to_string()))?;
    write_pfix(&mut buf, version).map_err(|x| TokenProviderError::RmpEncode(x.to_string()))?;
    match token {
        Token::Unscoped(data) => data.assemble(&mut buf)?,
        Token::DomainScope(data) => data.assemble(&mut buf)?,
        Token::ProjectScope(data) => data.assemble(&mut buf)?,
    }
    Ok(buf)
}

impl FernetTokenProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            ttl: TimeDelta::seconds(config.token.expiration as i64),
        }
    }

    /// Decrypt the token
    ///
    /// 1. Verify the envelope age
    /// 2. Decrypt as Fernet
    /// 3. Unpack MessagePack payload and verify its expiration
    pub fn decrypt(&self, key_ring: &KeyRing, credential: &str) -> Result<Token, TokenProviderError> {
        if key_ring.is_empty() {
            return Err(TokenProviderError::Expired);
        }
        let issued_at = get_fernet_timestamp(credential)?;
        let payload = key_ring.decrypt(credential).map_err(|err| match err {
            KeyRingError::NoKeys => TokenProviderError::Expired,
            _ => TokenProviderError::InvalidToken,
        })?;
        let now = Utc::now();
        if now - issued_at > self.ttl {
            trace!("Fernet envelope issued at {:?} is too old", issued_at);
            return Err(TokenProviderError::Expired);
        }
        let mut token = decode_payload(&payload)?;
        if *token.expires_at() <= now {
            trace!("Token has expired at {:?}", token.expires_at());
            return Err(TokenProviderError::Expired);
        }
        token.set_issued_at(issued_at);
        Ok(token)
    }

    /// Encrypt the token
    pub fn encrypt(&self, key_ring: &KeyRing, token: &Token) -> Result<String, TokenProviderError> {
        Ok(key_ring.encrypt(&encode_payload(token)?)?)
    }
}

impl TokenBackend for FernetTokenProvider {
    #[tracing::instrument(level = "trace", skip(self, key_ring, credential))]
    fn decode(&self, key_ring: &KeyRing, credential: &str) -> Result<Token, TokenProviderError> {
        self.decrypt(key_ring, credential)
    }

    #[tracing::instrument(level = "trace", skip(self, key_ring, token))]
    fn encode(&self, key_ring: &KeyRing, token: &Token) -> Result<String, TokenProviderError> {
        self.encrypt(key_ring, token)
    }
}

/// Decode the fernet payload as Base64_urlsafe.
fn b64_decode_url(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(input.trim_end_matches('='))
}

/// Get the fernet payload creation timestamp.
///
/// Extract the payload creation timestamp in the UTC.
fn get_fernet_timestamp(payload: &str) -> Result<DateTime<Utc>, TokenProviderError> {
    let data = b64_decode_url(payload).map_err(|_| TokenProviderError::InvalidToken)?;

    let mut input = Cursor::new(data);

    match input.read_u8() {
        Ok(0x80) => {}
        _ => return Err(TokenProviderError::InvalidToken),
    }

    input
        .read_u64::<byteorder::BigEndian>()
        .map_err(|_| TokenProviderError::InvalidToken)
        .and_then(|val| i64::try_from(val).map_err(|_| TokenProviderError::InvalidToken))
        .and_then(|val| {
            DateTime::from_timestamp(val, 0).ok_or(TokenProviderError::InvalidToken)
        })
}
