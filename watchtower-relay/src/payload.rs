//! Registry push notification payload.
//!
//! Only the fields needed for tag filtering and logging are decoded; the raw
//! bytes are what gets forwarded downstream.
//!
//! Registries are loose about this shape, so decoding is lenient: object keys
//! match case-insensitively (an exact match wins), and `null` or missing values
//! read as empty. A value of the wrong JSON type is still an error.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field}: expected {expected}, found {found}")]
    UnexpectedType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Docker Hub style push notification.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushNotification {
    pub push_data: PushData,
    pub repository: Repository,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushData {
    pub tag: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub repo_name: String,
}

impl PushNotification {
    /// Decode a webhook body.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_slice(body)?;

        let Some(root) = object(&value, "payload")? else {
            return Ok(Self::default());
        };

        let push_data = match object_field(root, "push_data")? {
            Some(push_data) => PushData {
                tag: string_field(push_data, "push_data.tag")?,
            },
            None => PushData::default(),
        };

        let repository = match object_field(root, "repository")? {
            Some(repository) => Repository {
                name: string_field(repository, "repository.name")?,
                repo_name: string_field(repository, "repository.repo_name")?,
            },
            None => Repository::default(),
        };

        Ok(Self {
            push_data,
            repository,
        })
    }

    /// Repository name, falling back to `repo_name` when `name` is empty.
    pub fn repository_name(&self) -> &str {
        if self.repository.name.is_empty() {
            &self.repository.repo_name
        } else {
            &self.repository.name
        }
    }

    pub fn tag(&self) -> &str {
        &self.push_data.tag
    }
}

/// Look up `key`, preferring an exact match over a case-insensitive one.
fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Last segment of a dotted field path, used as the JSON key.
fn key_of(field: &'static str) -> &'static str {
    field.rsplit('.').next().unwrap_or(field)
}

fn object<'a>(
    value: &'a Value,
    field: &'static str,
) -> Result<Option<&'a Map<String, Value>>, PayloadError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(unexpected(field, "object", other)),
    }
}

fn object_field<'a>(
    map: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a Map<String, Value>>, PayloadError> {
    match lookup(map, key_of(field)) {
        Some(value) => object(value, field),
        None => Ok(None),
    }
}

fn string_field(map: &Map<String, Value>, field: &'static str) -> Result<String, PayloadError> {
    match lookup(map, key_of(field)) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(unexpected(field, "string", other)),
    }
}

fn unexpected(field: &'static str, expected: &'static str, found: &Value) -> PayloadError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    PayloadError::UnexpectedType {
        field,
        expected,
        found,
    }
}
