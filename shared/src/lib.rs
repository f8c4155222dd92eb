use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Object types the engine refers to by name.
pub mod object_types {
    pub const USER: &str = "user";
    pub const EMAIL_TEMPLATE: &str = "html_template";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Bool,
    Date,
    Timestamp,
    Object,
    ObjectMulti,
    Grouping,
    GroupingMulti,
}

impl FieldType {
    pub fn is_multi_value(&self) -> bool {
        matches!(self, FieldType::ObjectMulti | FieldType::GroupingMulti)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::Object)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub subtype: Option<String>, // referenced obj_type for object fields
}

impl Field {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            subtype: None,
        }
    }

    pub fn reference(name: &str, obj_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Object,
            subtype: Some(obj_type.to_string()),
        }
    }

    pub fn multi_reference(name: &str, obj_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::ObjectMulti,
            subtype: Some(obj_type.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityDefinition {
    pub obj_type: String,
    pub fields: BTreeMap<String, Field>,
}

impl EntityDefinition {
    pub fn new(obj_type: &str) -> Self {
        Self {
            obj_type: obj_type.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub entity_id: Option<String>,
    pub account_id: String,
    pub definition: EntityDefinition,
    pub values: BTreeMap<String, Value>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity {
    pub fn new(definition: EntityDefinition, account_id: &str) -> Self {
        Self {
            entity_id: None,
            account_id: account_id.to_string(),
            definition,
            values: BTreeMap::new(),
            archived: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn with_id(mut self, entity_id: &str) -> Self {
        self.entity_id = Some(entity_id.to_string());
        self
    }

    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_value(name, value.into());
        self
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    pub fn obj_type(&self) -> &str {
        &self.definition.obj_type
    }

    /// The saved id, if any. Empty ids count as unsaved.
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    pub fn get_value_text(&self, name: &str) -> String {
        self.get_value(name).map(value_to_text).unwrap_or_default()
    }

    pub fn set_value(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Appends to a multi-value field, skipping values already present.
    pub fn add_multi_value(&mut self, name: &str, value: Value) {
        if value.is_null() {
            return;
        }

        let slot = self.values.entry(name.to_string()).or_insert(Value::Null);
        if let Value::Array(items) = slot {
            if !items.contains(&value) {
                items.push(value);
            }
            return;
        }

        let previous = slot.take();
        *slot = if previous.is_null() || previous == value {
            Value::Array(vec![value])
        } else {
            Value::Array(vec![previous, value])
        };
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub entity_id: String,
    pub account_id: String,
    pub name: Option<String>,
}

impl User {
    pub fn new(entity_id: &str, account_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            account_id: account_id.to_string(),
            name: None,
        }
    }
}

/// Renders a field value the way it appears inside merged text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}
