//! Signature parsing plus the `busctl` argument and JSON encodings.
//!
//! `busctl call` takes arguments as a signature followed by a flat token list:
//! arrays are prefixed by their element count, variants by their signature,
//! and struct fields are inlined. Replies printed with `--json=short` are
//! `{"type": SIG, "data": ...}` objects where variants nest the same shape.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value as Json;

use crate::error::{BusError, Result};
use crate::graph::{InterfaceMap, ObjectGraph};
use crate::value::Value;

/// One complete type from a signature string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigType {
    Basic(char),
    Array(Box<SigType>),
    DictEntry(Box<SigType>, Box<SigType>),
    Struct(Vec<SigType>),
    Variant,
}

impl fmt::Display for SigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(c) => write!(f, "{c}"),
            Self::Array(inner) => write!(f, "a{inner}"),
            Self::DictEntry(k, v) => write!(f, "{{{k}{v}}}"),
            Self::Struct(fields) => {
                f.write_str("(")?;
                for field in fields {
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
            Self::Variant => f.write_str("v"),
        }
    }
}

/// Splits a signature into its complete types.
///
/// # Errors
///
/// Returns a decode error for malformed signatures.
pub fn parse_signature(sig: &str) -> Result<Vec<SigType>> {
    let bytes = sig.as_bytes();
    let mut pos = 0;
    let mut types = Vec::new();
    while pos < bytes.len() {
        types.push(parse_one(bytes, &mut pos, sig)?);
    }
    Ok(types)
}

fn parse_one(bytes: &[u8], pos: &mut usize, sig: &str) -> Result<SigType> {
    let Some(&c) = bytes.get(*pos) else {
        return Err(BusError::decode(format!("truncated signature '{sig}'")));
    };
    *pos += 1;
    match c {
        b'b' | b'y' | b'n' | b'q' | b'i' | b'u' | b'x' | b't' | b'd' | b's' | b'o' | b'g' | b'h' => {
            Ok(SigType::Basic(char::from(c)))
        }
        b'v' => Ok(SigType::Variant),
        b'a' => Ok(SigType::Array(Box::new(parse_one(bytes, pos, sig)?))),
        b'(' => {
            let mut fields = Vec::new();
            while bytes.get(*pos) != Some(&b')') {
                if *pos >= bytes.len() {
                    return Err(BusError::decode(format!("unterminated struct in '{sig}'")));
                }
                fields.push(parse_one(bytes, pos, sig)?);
            }
            *pos += 1;
            Ok(SigType::Struct(fields))
        }
        b'{' => {
            let key = parse_one(bytes, pos, sig)?;
            let value = parse_one(bytes, pos, sig)?;
            if bytes.get(*pos) != Some(&b'}') {
                return Err(BusError::decode(format!("unterminated dict entry in '{sig}'")));
            }
            *pos += 1;
            Ok(SigType::DictEntry(Box::new(key), Box::new(value)))
        }
        other => Err(BusError::decode(format!(
            "unsupported type code '{}' in '{sig}'",
            char::from(other)
        ))),
    }
}

/// Encodes arguments for `busctl call`: returns the signature and the token list.
#[must_use]
pub fn encode_args(args: &[Value]) -> (String, Vec<String>) {
    let mut sig = String::new();
    let mut tokens = Vec::new();
    for arg in args {
        sig.push_str(&arg.signature());
        encode_value(arg, &mut tokens);
    }
    (sig, tokens)
}

fn encode_value(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Bool(v) => out.push(v.to_string()),
        Value::Byte(v) => out.push(v.to_string()),
        Value::Int16(v) => out.push(v.to_string()),
        Value::UInt16(v) => out.push(v.to_string()),
        Value::Int32(v) => out.push(v.to_string()),
        Value::UInt32(v) => out.push(v.to_string()),
        Value::Int64(v) => out.push(v.to_string()),
        Value::UInt64(v) => out.push(v.to_string()),
        Value::Double(v) => out.push(v.to_string()),
        Value::Str(s) | Value::ObjectPath(s) => out.push(s.clone()),
        Value::Bytes(bytes) => {
            out.push(bytes.len().to_string());
            out.extend(bytes.iter().map(u8::to_string));
        }
        Value::Array { items, .. } => {
            out.push(items.len().to_string());
            for item in items {
                encode_value(item, out);
            }
        }
        Value::Struct(fields) => {
            for field in fields {
                encode_value(field, out);
            }
        }
        Value::Dict(entries) => {
            out.push(entries.len().to_string());
            for (key, v) in entries {
                let inner = v.unwrapped();
                out.push(key.clone());
                out.push(inner.signature());
                encode_value(inner, out);
            }
        }
        Value::Variant(inner) => {
            let inner = inner.unwrapped();
            out.push(inner.signature());
            encode_value(inner, out);
        }
    }
}

/// Decodes a JSON value according to its type. Variants are unwrapped.
///
/// # Errors
///
/// Returns a decode error if the JSON does not have the shape of `ty`.
pub fn decode_json(ty: &SigType, json: &Json) -> Result<Value> {
    let mismatch = || BusError::decode(format!("expected '{ty}', got {json}"));
    match ty {
        SigType::Basic(c) => decode_basic(*c, json).ok_or_else(mismatch),
        SigType::Variant => decode_variant(json),
        SigType::Array(inner) => match inner.as_ref() {
            SigType::Basic('y') => {
                let items = json.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .map(Value::Bytes)
                    .ok_or_else(mismatch)
            }
            SigType::DictEntry(_, value_ty) => {
                let object = json.as_object().ok_or_else(mismatch)?;
                let mut entries = BTreeMap::new();
                for (key, v) in object {
                    entries.insert(key.clone(), decode_json(value_ty, v)?);
                }
                Ok(Value::Dict(entries))
            }
            element => {
                let items = json.as_array().ok_or_else(mismatch)?;
                Ok(Value::Array {
                    element: element.to_string(),
                    items: items
                        .iter()
                        .map(|item| decode_json(element, item))
                        .collect::<Result<_>>()?,
                })
            }
        },
        SigType::Struct(fields) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            if items.len() != fields.len() {
                return Err(mismatch());
            }
            Ok(Value::Struct(
                fields
                    .iter()
                    .zip(items)
                    .map(|(f, item)| decode_json(f, item))
                    .collect::<Result<_>>()?,
            ))
        }
        SigType::DictEntry(..) => Err(BusError::decode("dict entry outside of an array")),
    }
}

fn decode_basic(code: char, json: &Json) -> Option<Value> {
    Some(match code {
        'b' => Value::Bool(json.as_bool()?),
        'y' => Value::Byte(u8::try_from(json.as_u64()?).ok()?),
        'n' => Value::Int16(i16::try_from(json.as_i64()?).ok()?),
        'q' => Value::UInt16(u16::try_from(json.as_u64()?).ok()?),
        'i' => Value::Int32(i32::try_from(json.as_i64()?).ok()?),
        'u' | 'h' => Value::UInt32(u32::try_from(json.as_u64()?).ok()?),
        'x' => Value::Int64(json.as_i64()?),
        't' => Value::UInt64(json.as_u64()?),
        'd' => Value::Double(json.as_f64()?),
        's' | 'g' => Value::Str(json.as_str()?.to_string()),
        'o' => Value::ObjectPath(json.as_str()?.to_string()),
        _ => return None,
    })
}

fn decode_variant(json: &Json) -> Result<Value> {
    let sig = json
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| BusError::decode(format!("variant without type: {json}")))?;
    let data = json
        .get("data")
        .ok_or_else(|| BusError::decode(format!("variant without data: {json}")))?;
    let types = parse_signature(sig)?;
    match types.as_slice() {
        [single] => decode_json(single, data),
        _ => Err(BusError::decode(format!("variant must hold one type, got '{sig}'"))),
    }
}

/// Decodes `busctl --json=short call` output into the method's out arguments.
///
/// # Errors
///
/// Returns a decode error for malformed output.
pub fn decode_reply(text: &str) -> Result<Vec<Value>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let json: Json = serde_json::from_str(text).map_err(|e| BusError::decode(e.to_string()))?;
    let sig = json.get("type").and_then(Json::as_str).unwrap_or_default();
    let types = parse_signature(sig)?;
    let data = json.get("data").cloned().unwrap_or(Json::Array(Vec::new()));
    let items = data
        .as_array()
        .ok_or_else(|| BusError::decode(format!("reply data is not an array: {data}")))?;
    if items.len() != types.len() {
        return Err(BusError::decode(format!(
            "reply has {} values for signature '{sig}'",
            items.len()
        )));
    }
    types
        .iter()
        .zip(items)
        .map(|(ty, item)| decode_json(ty, item))
        .collect()
}

/// Decodes `busctl --json=short get-property` output.
///
/// # Errors
///
/// Returns a decode error for malformed output.
pub fn decode_property(text: &str) -> Result<Value> {
    let json: Json =
        serde_json::from_str(text.trim()).map_err(|e| BusError::decode(e.to_string()))?;
    decode_variant(&json)
}

/// Decodes the reply of `GetManagedObjects` (`a{oa{sa{sv}}}`) into a snapshot.
///
/// # Errors
///
/// Returns a decode error if the reply has another shape.
pub fn decode_managed_objects(text: &str) -> Result<ObjectGraph> {
    let reply = decode_reply(text)?;
    let Some(Value::Dict(objects)) = reply.into_iter().next() else {
        return Err(BusError::decode("GetManagedObjects reply is not a dictionary"));
    };

    let mut graph = BTreeMap::new();
    for (path, ifaces) in objects {
        let Value::Dict(ifaces) = ifaces else {
            return Err(BusError::decode(format!("interfaces of {path} are not a dictionary")));
        };
        let mut map = InterfaceMap::new();
        for (iface, props) in ifaces {
            let Value::Dict(props) = props else {
                return Err(BusError::decode(format!("properties of {path} {iface} are not a dictionary")));
            };
            map.insert(iface, props);
        }
        graph.insert(path, map);
    }
    Ok(ObjectGraph::from_objects(graph))
}
