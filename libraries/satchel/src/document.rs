use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document as the store returns it: system fields (`$id`, `$createdAt`)
/// plus the collection's own attributes, untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name)?.as_str()
    }

    /// The normalized id of a relation attribute, if it points anywhere.
    pub fn relation(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(relation_id)
    }
}

/// Normalizes a relation value to a plain id. The store sometimes returns
/// relations as bare id strings and sometimes as expanded objects carrying
/// `$id`; empty strings count as no reference. Everything downstream of this
/// function sees plain ids only.
pub fn relation_id(value: &Value) -> Option<&str> {
    let id = match value {
        Value::String(id) => id.as_str(),
        Value::Object(fields) => fields.get("$id").and_then(Value::as_str)?,
        _ => return None,
    };
    if id.is_empty() { None } else { Some(id) }
}

/// Who a permission applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Any,
    User(String),
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Any => write!(f, "any"),
            Role::User(id) => write!(f, "user:{id}"),
        }
    }
}

/// A grant attached to a document, serialized in the provider's textual form,
/// e.g. `read("any")` or `delete("user:abc123")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    Read(Role),
    Update(Role),
    Delete(Role),
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Read(role) => write!(f, "read(\"{role}\")"),
            Permission::Update(role) => write!(f, "update(\"{role}\")"),
            Permission::Delete(role) => write!(f, "delete(\"{role}\")"),
        }
    }
}

impl Serialize for Permission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
