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
//! MessagePack primitives of the token payload.
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use rmp::{
    Marker,
    decode::{ValueReadError, read_array_len, read_f64, read_marker},
    encode::{write_array_len, write_bin, write_bool, write_f64, write_pfix, write_str},
};
use std::io::{self, Read, Write};
use uuid::Uuid;

use crate::token::{
    error::TokenProviderError,
    types::{AuthMethod, TokenContext},
};

fn encode_err<E: std::fmt::Display>(err: E) -> TokenProviderError {
    TokenProviderError::RmpEncode(err.to_string())
}

/// Read binary data from the payload
fn read_bin_data<R: Read>(len: u32, rd: &mut R) -> Result<Vec<u8>, io::Error> {
    let mut buf = Vec::with_capacity(len.min(1 << 16) as usize);
    let bytes_read = rd.take(u64::from(len)).read_to_end(&mut buf)?;
    if bytes_read != len as usize {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(buf)
}

/// Length of the `str` or `bin` value following the marker.
fn data_len(marker: Marker, rd: &mut &[u8]) -> Result<u32, TokenProviderError> {
    match marker {
        Marker::FixStr(len) => Ok(len.into()),
        Marker::Str8 | Marker::Bin8 => Ok(rd.read_u8()?.into()),
        Marker::Str16 | Marker::Bin16 => Ok(rd.read_u16::<BigEndian>()?.into()),
        other => Err(TokenProviderError::InvalidTokenUuidMarker(other)),
    }
}

fn is_str(marker: Marker) -> bool {
    matches!(marker, Marker::FixStr(_) | Marker::Str8 | Marker::Str16)
}

fn is_bin(marker: Marker) -> bool {
    matches!(marker, Marker::Bin8 | Marker::Bin16)
}

/// Read the `str` (or `bin` holding text) value.
pub fn read_string(rd: &mut &[u8]) -> Result<String, TokenProviderError> {
    let marker = read_marker(rd).map_err(ValueReadError::from)?;
    let len = data_len(marker, rd)?;
    Ok(String::from_utf8_lossy(&read_bin_data(len, rd)?).into_owned())
}

/// Read the id written by [`write_uuid`].
///
/// Ids that are UUIDs come back in the simple (not hyphenated) form.
pub fn read_uuid(rd: &mut &[u8]) -> Result<String, TokenProviderError> {
    match read_marker(rd).map_err(ValueReadError::from)? {
        Marker::FixArray(2) => match read_marker(rd).map_err(ValueReadError::from)? {
            Marker::True => {
                let marker = read_marker(rd).map_err(ValueReadError::from)?;
                if !is_bin(marker) {
                    return Err(TokenProviderError::InvalidTokenUuidMarker(marker));
                }
                let len = data_len(marker, rd)?;
                Ok(Uuid::from_slice(&read_bin_data(len, rd)?)?
                    .as_simple()
                    .to_string())
            }
            Marker::False => read_string(rd),
            other => Err(TokenProviderError::InvalidTokenUuidMarker(other)),
        },
        other => Err(TokenProviderError::InvalidTokenUuidMarker(other)),
    }
}

/// Write the id as `[true, bin16]` when it is a UUID or `[false, str]`
/// otherwise.
pub fn write_uuid<W: Write>(wd: &mut W, uid: &str) -> Result<(), TokenProviderError> {
    write_array_len(wd, 2).map_err(encode_err)?;
    match Uuid::parse_str(uid) {
        Ok(uuid) => {
            write_bool(wd, true).map_err(encode_err)?;
            write_bin(wd, uuid.as_bytes()).map_err(encode_err)?;
        }
        _ => {
            write_bool(wd, false).map_err(encode_err)?;
            write_str(wd, uid).map_err(encode_err)?;
        }
    }
    Ok(())
}

/// Read the authentication method index.
pub fn read_method(rd: &mut &[u8]) -> Result<AuthMethod, TokenProviderError> {
    match read_marker(rd).map_err(ValueReadError::from)? {
        Marker::FixPos(idx) => {
            AuthMethod::from_index(idx).ok_or(TokenProviderError::UnsupportedAuthMethod(idx))
        }
        _ => Err(TokenProviderError::InvalidToken),
    }
}

pub fn write_method<W: Write>(wd: &mut W, method: AuthMethod) -> Result<(), TokenProviderError> {
    write_pfix(wd, method.index()).map_err(encode_err)
}

/// Read the time represented as a f64 of the UTC seconds
pub fn read_time(rd: &mut &[u8]) -> Result<DateTime<Utc>, TokenProviderError> {
    DateTime::from_timestamp(read_f64(rd)?.round() as i64, 0)
        .ok_or(TokenProviderError::InvalidToken)
}

/// Write the time represented as a f64 of the UTC seconds
pub fn write_time<W: Write>(wd: &mut W, time: DateTime<Utc>) -> Result<(), TokenProviderError> {
    write_f64(wd, time.timestamp() as f64).map_err(encode_err)
}

/// Decode array of audit ids from the payload
pub fn read_audit_ids(rd: &mut &[u8]) -> Result<Vec<String>, TokenProviderError> {
    let len = read_array_len(rd)?;
    let mut result: Vec<String> = Vec::with_capacity(len.min(16) as usize);
    for _ in 0..len {
        let marker = read_marker(rd).map_err(ValueReadError::from)?;
        let size = data_len(marker, rd)?;
        let data = read_bin_data(size, rd)?;
        if is_bin(marker) {
            result.push(URL_SAFE_NO_PAD.encode(data));
        } else if is_str(marker) {
            result.push(String::from_utf8_lossy(&data).into_owned());
        } else {
            return Err(TokenProviderError::InvalidToken);
        }
    }
    Ok(result)
}

/// Encode array of audit ids into the payload.
///
/// Audit ids that are URL safe base64 without padding are stored as the
/// decoded bytes, any other value as the text.
pub fn write_audit_ids<W: Write>(wd: &mut W, data: &[String]) -> Result<(), TokenProviderError> {
    write_array_len(wd, data.len() as u32).map_err(encode_err)?;
    for val in data {
        match URL_SAFE_NO_PAD.decode(val) {
            Ok(raw) if !raw.is_empty() && URL_SAFE_NO_PAD.encode(&raw) == *val => {
                write_bin(wd, &raw).map_err(encode_err)?;
            }
            _ if !val.is_empty() => {
                write_str(wd, val).map_err(encode_err)?;
            }
            _ => return Err(TokenProviderError::AuditIdWrongFormat(val.clone())),
        }
    }
    Ok(())
}

/// Read the `[source, ip]` pair.
pub fn read_context(rd: &mut &[u8]) -> Result<TokenContext, TokenProviderError> {
    if read_array_len(rd)? != 2 {
        return Err(TokenProviderError::InvalidToken);
    }
    Ok(TokenContext {
        source: read_string(rd)?,
        ip: read_string(rd)?,
    })
}

pub fn write_context<W: Write>(wd: &mut W, context: &TokenContext) -> Result<(), TokenProviderError> {
    write_array_len(wd, 2).map_err(encode_err)?;
    write_str(wd, &context.source).map_err(encode_err)?;
    write_str(wd, &context.ip).map_err(encode_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Local, SubsecRound};

    use super::*;

    #[test]
    fn test_write_read_uuid_str() {
        let mut buf = Vec::with_capacity(36);
        let uuid = "abc";
        write_uuid(&mut buf, uuid).unwrap();
        let decoded = read_uuid(&mut buf.as_slice()).unwrap();
        assert_eq!(uuid, decoded);
    }

    #[test]
    fn test_write_read_uuid() {
        let mut buf = Vec::with_capacity(36);
        let test = Uuid::new_v4();
        write_uuid(&mut buf, &test.to_string()).unwrap();
        // fixarray(2), true, bin8(16)
        assert_eq!(2 + 2 + 16, buf.len());
        let decoded = read_uuid(&mut buf.as_slice()).unwrap();
        assert_eq!(test.simple().to_string(), decoded);
    }

    #[test]
    fn test_write_read_time() {
        let test = Local::now().trunc_subsecs(0);
        let mut buf = Vec::with_capacity(36);
        write_time(&mut buf, test.into()).unwrap();
        let decoded = read_time(&mut buf.as_slice()).unwrap();
        assert_eq!(test, decoded);
    }

    #[test]
    fn test_write_audit_ids() {
        let test: Vec<String> = vec!["Zm9vCg".into(), "4b7d364ad87d400b".into(), "alice@x".into()];
        let mut buf = Vec::with_capacity(36);
        write_audit_ids(&mut buf, &test).unwrap();
        let decoded = read_audit_ids(&mut buf.as_slice()).unwrap();
        assert_eq!(test, decoded);
    }

    #[test]
    fn test_write_audit_id_empty() {
        let mut buf = Vec::new();
        assert!(matches!(
            write_audit_ids(&mut buf, &["".into()]),
            Err(TokenProviderError::AuditIdWrongFormat(_))
        ));
    }

    #[test]
    fn test_unknown_method() {
        let mut buf = Vec::new();
        write_pfix(&mut buf, 9).unwrap();
        assert!(matches!(
            read_method(&mut buf.as_slice()),
            Err(TokenProviderError::UnsupportedAuthMethod(9))
        ));
    }
}
