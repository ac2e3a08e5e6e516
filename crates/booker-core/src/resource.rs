//! Resources and resource types as exchanged with the REST API.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::schema::{Schema, SchemaDefinition, deserialize_definition};

// ─── Resource types ──────────────────────────────────────────────────────────

/// An admin-defined category of bookable resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceType {
  pub id:                i64,
  /// Display name (`type` on the wire).
  #[serde(rename = "type", default, deserialize_with = "nullable")]
  pub type_name:         String,
  /// Older servers send the display name as `name` instead.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:              Option<String>,
  #[serde(
    default,
    deserialize_with = "deserialize_definition",
    skip_serializing_if = "Option::is_none"
  )]
  pub schema_definition: Option<SchemaDefinition>,
}

impl ResourceType {
  /// `type`, falling back to `name`.
  pub fn display_name(&self) -> &str {
    if self.type_name.trim().is_empty() {
      self.name.as_deref().unwrap_or_default()
    } else {
      &self.type_name
    }
  }

  /// The normalized property schema; empty when none was sent.
  pub fn schema(&self) -> Schema {
    self
      .schema_definition
      .as_ref()
      .map(SchemaDefinition::normalize)
      .unwrap_or_default()
  }
}

/// Body of `POST /admin/resource_types`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewResourceType {
  #[serde(rename = "type")]
  pub type_name:         String,
  pub schema_definition: Map<String, Value>,
}

// ─── Property values ─────────────────────────────────────────────────────────

/// A typed property value stored on a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
  Bool(bool),
  Number(Number),
  Text(String),
  /// Anything structured a server may have stored; shown as JSON.
  Json(Value),
}

impl PropertyValue {
  pub fn integer(n: i64) -> Self { Self::Number(Number::from(n)) }
}

impl fmt::Display for PropertyValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Bool(b) => write!(f, "{b}"),
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
      Self::Json(v) => write!(f, "{v}"),
    }
  }
}

// ─── Resources ───────────────────────────────────────────────────────────────

fn default_active() -> bool { true }

/// A bookable resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
  pub id:          i64,
  #[serde(default, deserialize_with = "nullable")]
  pub name:        String,
  pub type_id:     i64,
  #[serde(default, deserialize_with = "nullable")]
  pub location:    String,
  #[serde(default, deserialize_with = "nullable")]
  pub description: String,
  #[serde(default = "default_active")]
  pub is_active:   bool,
  #[serde(default, deserialize_with = "nullable")]
  pub properties:  BTreeMap<String, PropertyValue>,
}

/// Body of `POST /admin/resources`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewResource {
  pub name:        String,
  pub type_id:     i64,
  pub location:    String,
  pub description: String,
  pub properties:  BTreeMap<String, PropertyValue>,
}

/// Body of `PUT /admin/resources/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceUpdate {
  pub name:        String,
  pub type_id:     i64,
  pub location:    String,
  pub description: String,
  pub is_active:   bool,
  pub properties:  BTreeMap<String, PropertyValue>,
}

/// Treat an explicit JSON `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
