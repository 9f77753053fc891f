// Schemaless record used by the proxy and the in-memory record store.
//
// Every resource (users, roles, categories, activity logs, pages) is stored
// as a JSON object with a string `id`; typed screens deserialize it into
// their own entity structs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::Entity;
use crate::core::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a create payload; `id` in the payload is ignored
    pub fn from_input(id: impl Into<String>, input: Value) -> Result<Self> {
        let mut fields = match input {
            Value::Object(fields) => fields,
            other => {
                return Err(AppError::validation(format!(
                    "Record payload must be a JSON object, got {}",
                    type_name(&other)
                )))
            }
        };
        fields.remove("id");

        Ok(Self {
            id: id.into(),
            fields,
        })
    }

    /// Shallow-merge an update payload into the record
    pub fn apply(&mut self, input: Value) -> Result<()> {
        match input {
            Value::Object(patch) => {
                for (key, value) in patch {
                    if key != "id" {
                        self.fields.insert(key, value);
                    }
                }
                Ok(())
            }
            other => Err(AppError::validation(format!(
                "Update payload must be a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Field lookup; `id` resolves to the record id
    pub fn field(&self, name: &str) -> Option<Value> {
        if name == "id" {
            return Some(Value::String(self.id.clone()));
        }
        self.fields.get(name).cloned()
    }

    pub fn set_flag(&mut self, name: &str, value: bool) {
        self.fields.insert(name.to_string(), Value::Bool(value));
    }

    /// Case-insensitive substring match over string fields
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.id.to_lowercase().contains(&needle)
            || self.fields.values().any(|value| match value {
                Value::String(s) => s.to_lowercase().contains(&needle),
                _ => false,
            })
    }

    fn flag(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }
}

impl Entity for Record {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_active(&self) -> Option<bool> {
        self.flag("isActive")
    }

    fn is_deleted(&self) -> Option<bool> {
        self.flag("isDeleted")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
