//! `/deserialize`: rebuilds an object graph from caller-supplied bytes
//!
//! Payloads are base64 of a JSON document. A JSON object whose only key is
//! `__reduce__` holding `[name, [args...]]` is a call instruction: the
//! arguments are rebuilt first and then the named callable runs, during
//! reconstruction and before anything inspects the result.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use serde_json::Value as Json;

use super::literal::{format_float, quote_str};
use crate::config::AppState;
use crate::error::AppError;
use crate::http;

pub const REDUCE_KEY: &str = "__reduce__";

/// Reconstructed value graph
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Object>),
    Dict(Vec<(String, Object)>),
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::Str(s) => f.write_str(&quote_str(s)),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Dict(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {value}", quote_str(key))?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Object {
    /// Text form used by `str`: strings unquoted, everything else as displayed
    fn to_text(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn reconstruct_error(message: impl Into<String>) -> AppError {
    AppError::Reconstruct(message.into())
}

/// Decode base64, parse JSON and rebuild the object graph
pub fn loads(encoded: &str) -> Result<Object, AppError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    let json: Json = serde_json::from_slice(&bytes)?;
    reconstruct(json)
}

/// Rebuild an object graph, running every reduce node on the way
pub fn reconstruct(json: Json) -> Result<Object, AppError> {
    match json {
        Json::Null => Ok(Object::Null),
        Json::Bool(b) => Ok(Object::Bool(b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Ok(Object::Int(i)),
            None => n
                .as_f64()
                .map(Object::Float)
                .ok_or_else(|| reconstruct_error(format!("unrepresentable number {n}"))),
        },
        Json::String(s) => Ok(Object::Str(s)),
        Json::Array(items) => Ok(Object::List(
            items
                .into_iter()
                .map(reconstruct)
                .collect::<Result<_, _>>()?,
        )),
        Json::Object(mut map) => {
            if map.len() == 1 {
                if let Some(instruction) = map.remove(REDUCE_KEY) {
                    return reduce(instruction);
                }
            }
            Ok(Object::Dict(
                map.into_iter()
                    .map(|(k, v)| Ok((k, reconstruct(v)?)))
                    .collect::<Result<_, AppError>>()?,
            ))
        }
    }
}

/// Run a `[name, [args...]]` call instruction
fn reduce(instruction: Json) -> Result<Object, AppError> {
    let Json::Array(mut parts) = instruction else {
        return Err(reconstruct_error("reduce expects [name, args]"));
    };
    if parts.len() != 2 {
        return Err(reconstruct_error("reduce expects [name, args]"));
    }
    let raw_args = parts.pop().unwrap_or_default();
    let Json::String(name) = parts.pop().unwrap_or_default() else {
        return Err(reconstruct_error("reduce callable must be a name"));
    };
    let Json::Array(raw_args) = raw_args else {
        return Err(reconstruct_error("reduce arguments must be a list"));
    };

    let args = raw_args
        .into_iter()
        .map(reconstruct)
        .collect::<Result<Vec<_>, _>>()?;
    call(&name, args)
}

fn single(name: &str, mut args: Vec<Object>) -> Result<Object, AppError> {
    if args.len() != 1 {
        return Err(reconstruct_error(format!(
            "{name}() takes 1 argument, got {}",
            args.len()
        )));
    }
    Ok(args.remove(0))
}

/// Registered callables reachable from a payload
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn call(name: &str, args: Vec<Object>) -> Result<Object, AppError> {
    match name {
        "str" => Ok(Object::Str(single(name, args)?.to_text())),
        "int" => match single(name, args)? {
            Object::Int(i) => Ok(Object::Int(i)),
            Object::Float(f) => Ok(Object::Int(f.trunc() as i64)),
            Object::Bool(b) => Ok(Object::Int(i64::from(b))),
            Object::Str(s) => s
                .trim()
                .parse()
                .map(Object::Int)
                .map_err(|e| reconstruct_error(format!("int(): {e}"))),
            other => Err(reconstruct_error(format!("int() cannot convert {other}"))),
        },
        "float" => match single(name, args)? {
            Object::Int(i) => Ok(Object::Float(i as f64)),
            Object::Float(f) => Ok(Object::Float(f)),
            Object::Str(s) => s
                .trim()
                .parse()
                .map(Object::Float)
                .map_err(|e| reconstruct_error(format!("float(): {e}"))),
            other => Err(reconstruct_error(format!("float() cannot convert {other}"))),
        },
        "len" => {
            let len = match single(name, args)? {
                Object::Str(s) => s.chars().count(),
                Object::List(items) => items.len(),
                Object::Dict(entries) => entries.len(),
                other => return Err(reconstruct_error(format!("len() of {other}"))),
            };
            i64::try_from(len)
                .map(Object::Int)
                .map_err(|e| reconstruct_error(e.to_string()))
        }
        "list" => Ok(Object::List(args)),
        "dict" => args
            .into_iter()
            .map(|pair| match pair {
                Object::List(mut kv) if kv.len() == 2 => {
                    let value = kv.remove(1);
                    Ok((kv.remove(0).to_text(), value))
                }
                other => Err(reconstruct_error(format!("dict() entry {other} is not a pair"))),
            })
            .collect::<Result<_, _>>()
            .map(Object::Dict),
        "getenv" => {
            let key = single(name, args)?.to_text();
            Ok(std::env::var(key).map_or(Object::Null, Object::Str))
        }
        "read_file" => {
            let path = single(name, args)?.to_text();
            Ok(Object::Str(std::fs::read_to_string(path)?))
        }
        other => Err(reconstruct_error(format!("unknown callable '{other}'"))),
    }
}

pub async fn deserialize(state: &AppState, data: &str) -> Result<Response<Full<Bytes>>, AppError> {
    let data = data.to_string();
    let object = tokio::task::spawn_blocking(move || loads(&data)).await??;

    Ok(http::build_ok_response(
        object.to_string(),
        &state.config.http.default_content_type,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(value: &Json) -> String {
        STANDARD.encode(value.to_string())
    }

    #[test]
    fn test_plain_graph() {
        let payload = encode(&json!({"name": "widget", "tags": ["a", 1, 2.5, null, true]}));
        let obj = loads(&payload).unwrap();
        assert_eq!(
            obj.to_string(),
            "{'name': 'widget', 'tags': ['a', 1, 2.5, null, true]}"
        );
    }

    #[test]
    fn test_reduce_runs_during_load() {
        let payload = encode(&json!({"__reduce__": ["len", [["x", "y", "z"]]]}));
        assert_eq!(loads(&payload).unwrap(), Object::Int(3));
    }

    #[test]
    fn test_nested_reduce() {
        let payload = encode(&json!({
            "__reduce__": ["int", [{"__reduce__": ["str", [41]]}]]
        }));
        assert_eq!(loads(&payload).unwrap(), Object::Int(41));
    }

    #[test]
    fn test_reduce_reads_environment() {
        std::env::set_var("DSO_GETENV_PROBE", "leaked-value");
        let payload = encode(&json!({
            "stolen": {"__reduce__": ["getenv", ["DSO_GETENV_PROBE"]]}
        }));
        assert_eq!(loads(&payload).unwrap().to_string(), "{'stolen': 'leaked-value'}");
    }

    #[test]
    fn test_reduce_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, "top secret").unwrap();
        let payload = encode(&json!({"__reduce__": ["read_file", [path.to_str().unwrap()]]}));
        assert_eq!(loads(&payload).unwrap(), Object::Str("top secret".to_string()));
    }

    #[test]
    fn test_dict_and_list_callables() {
        let payload = encode(&json!({
            "__reduce__": ["dict", [["k", {"__reduce__": ["list", [1, 2]]}]]]
        }));
        assert_eq!(loads(&payload).unwrap().to_string(), "{'k': [1, 2]}");
    }

    #[test]
    fn test_key_alongside_reduce_is_plain_dict() {
        let payload = encode(&json!({"__reduce__": ["len", [[]]], "other": 1}));
        assert!(matches!(loads(&payload).unwrap(), Object::Dict(_)));
    }

    #[test]
    fn test_bad_inputs() {
        assert!(matches!(loads("***"), Err(AppError::Decode(_))));
        assert!(matches!(
            loads(&STANDARD.encode("not json")),
            Err(AppError::Json(_))
        ));
        assert!(matches!(
            loads(&encode(&json!({"__reduce__": ["system", ["id"]]}))),
            Err(AppError::Reconstruct(_))
        ));
        assert!(matches!(
            loads(&encode(&json!({"__reduce__": ["len", [1, 2]]}))),
            Err(AppError::Reconstruct(_))
        ));
    }
}
