//! Resource-type schemas: the admin-defined property declarations that
//! drive the dynamic part of a resource form.
//!
//! A schema arrives from the server as [`SchemaDefinition`]: either a JSON
//! encoded string or an already structured object. [`SchemaDefinition::normalize`]
//! is the only place that distinguishes the two; everything downstream works
//! with the normalized [`Schema`].

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum::EnumString;

use crate::{ValidationErrors, resource::NewResourceType};

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// The primitive kind declared for one schema property.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
pub enum SchemaKind {
  #[strum(serialize = "string")]
  String,
  #[strum(serialize = "number")]
  Number,
  #[strum(serialize = "int", serialize = "integer")]
  Integer,
  #[strum(serialize = "boolean")]
  Boolean,
  #[strum(serialize = "date")]
  Date,
  /// Anything else; edited and submitted as trimmed text.
  #[strum(default)]
  Other(String),
}

impl SchemaKind {
  pub fn as_str(&self) -> &str {
    match self {
      Self::String => "string",
      Self::Number => "number",
      Self::Integer => "int",
      Self::Boolean => "boolean",
      Self::Date => "date",
      Self::Other(s) => s,
    }
  }

  /// Interpret a declared kind name; unknown names become [`Self::Other`].
  pub fn named(name: &str) -> Self {
    name.parse().unwrap_or_else(|_| Self::Other(name.to_string()))
  }

  /// `number`, `int` and `integer` all submit as integers.
  pub fn is_numeric(&self) -> bool { matches!(self, Self::Number | Self::Integer) }
}

impl fmt::Display for SchemaKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Normalized schema ───────────────────────────────────────────────────────

/// Property key → declared kind. Keys are unique and non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema(BTreeMap<String, SchemaKind>);

impl Schema {
  /// Build from a JSON object. Blank keys are dropped; non-string kind
  /// declarations become [`SchemaKind::Other`].
  pub fn from_map(map: &Map<String, Value>) -> Self {
    map
      .iter()
      .filter(|(key, _)| !key.trim().is_empty())
      .map(|(key, kind)| {
        let kind = match kind {
          Value::String(s) => SchemaKind::named(s),
          other => SchemaKind::Other(other.to_string()),
        };
        (key.clone(), kind)
      })
      .collect()
  }

  pub fn get(&self, key: &str) -> Option<&SchemaKind> { self.0.get(key) }

  pub fn contains_key(&self, key: &str) -> bool { self.0.contains_key(key) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaKind)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }
}

impl FromIterator<(String, SchemaKind)> for Schema {
  fn from_iter<I: IntoIterator<Item = (String, SchemaKind)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

// ─── Wire form ───────────────────────────────────────────────────────────────

/// `schema_definition` exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaDefinition {
  /// A JSON document encoded as a string.
  Raw(String),
  /// An already structured object.
  Parsed(Map<String, Value>),
}

impl SchemaDefinition {
  /// Classify an arbitrary JSON value. Anything that is neither a string nor
  /// an object carries no schema.
  pub fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::String(s) => Some(Self::Raw(s)),
      Value::Object(map) => Some(Self::Parsed(map)),
      _ => None,
    }
  }

  /// Produce the normalized schema. An unparseable raw string yields an
  /// empty schema rather than an error.
  pub fn normalize(&self) -> Schema {
    match self {
      Self::Parsed(map) => Schema::from_map(map),
      Self::Raw(raw) => match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(map) => Schema::from_map(&map),
        Err(e) => {
          tracing::warn!(error = %e, "schema_definition is not a JSON object; using empty schema");
          Schema::default()
        }
      },
    }
  }
}

/// Serde adapter for an optional, loosely typed `schema_definition` field.
pub(crate) fn deserialize_definition<'de, D>(
  deserializer: D,
) -> Result<Option<SchemaDefinition>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  Ok(SchemaDefinition::from_value(value))
}

// ─── Type drafts ─────────────────────────────────────────────────────────────

/// Validate the admin "create resource type" form and build its payload.
///
/// Error keys are `type` and `schema_definition`.
pub fn validate_type_draft(
  type_name: &str,
  schema_text: &str,
) -> Result<NewResourceType, ValidationErrors> {
  let mut errors = ValidationErrors::new();

  if type_name.trim().is_empty() {
    errors.insert("type".into(), "Type is required".into());
  }

  let schema = if schema_text.trim().is_empty() {
    errors.insert(
      "schema_definition".into(),
      "Schema definition is required".into(),
    );
    None
  } else {
    match serde_json::from_str::<Value>(schema_text) {
      Ok(Value::Object(map)) => Some(map),
      Ok(_) => {
        errors.insert(
          "schema_definition".into(),
          "Schema definition must be a JSON object".into(),
        );
        None
      }
      Err(_) => {
        errors.insert("schema_definition".into(), "Invalid JSON format".into());
        None
      }
    }
  };

  match schema {
    Some(schema_definition) if errors.is_empty() => Ok(NewResourceType {
      type_name: type_name.trim().to_string(),
      schema_definition,
    }),
    _ => Err(errors),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn object(v: Value) -> Map<String, Value> {
    match v {
      Value::Object(map) => map,
      _ => panic!("not an object"),
    }
  }

  #[test]
  fn kind_names() {
    assert_eq!(SchemaKind::named("number"), SchemaKind::Number);
    assert_eq!(SchemaKind::named("int"), SchemaKind::Integer);
    assert_eq!(SchemaKind::named("integer"), SchemaKind::Integer);
    assert_eq!(SchemaKind::named("boolean"), SchemaKind::Boolean);
    assert_eq!(SchemaKind::named("date"), SchemaKind::Date);
    assert_eq!(SchemaKind::named("string"), SchemaKind::String);
    assert_eq!(
      SchemaKind::named("Number"),
      SchemaKind::Other("Number".into())
    );
    assert_eq!(SchemaKind::named("uuid").to_string(), "uuid");
  }

  #[test]
  fn parsed_and_raw_normalize_the_same() {
    let map = object(json!({ "capacity": "number", "floor": "int" }));
    let raw = SchemaDefinition::Raw(Value::Object(map.clone()).to_string());
    let parsed = SchemaDefinition::Parsed(map);
    assert_eq!(raw.normalize(), parsed.normalize());
    assert_eq!(parsed.normalize().get("floor"), Some(&SchemaKind::Integer));
  }

  #[test]
  fn unparseable_raw_is_empty() {
    let raw = SchemaDefinition::Raw("{capacity: number".into());
    assert!(raw.normalize().is_empty());

    let array = SchemaDefinition::Raw("[1, 2]".into());
    assert!(array.normalize().is_empty());
  }

  #[test]
  fn blank_keys_dropped_and_odd_kinds_kept_as_other() {
    let schema = Schema::from_map(&object(json!({
      "  ": "string",
      "wing": { "enum": ["east", "west"] },
    })));
    assert_eq!(schema.len(), 1);
    assert!(matches!(schema.get("wing"), Some(SchemaKind::Other(_))));
  }

  #[test]
  fn from_value_classifies() {
    assert!(matches!(
      SchemaDefinition::from_value(json!("{}")),
      Some(SchemaDefinition::Raw(_))
    ));
    assert!(matches!(
      SchemaDefinition::from_value(json!({})),
      Some(SchemaDefinition::Parsed(_))
    ));
    assert!(SchemaDefinition::from_value(json!(null)).is_none());
    assert!(SchemaDefinition::from_value(json!(3)).is_none());
  }

  #[test]
  fn type_draft_validation() {
    let errors = validate_type_draft(" ", "").unwrap_err();
    assert_eq!(errors["type"], "Type is required");
    assert_eq!(errors["schema_definition"], "Schema definition is required");

    let errors = validate_type_draft("Room", "{not json").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["schema_definition"], "Invalid JSON format");

    let errors = validate_type_draft("Room", "[\"capacity\"]").unwrap_err();
    assert_eq!(
      errors["schema_definition"],
      "Schema definition must be a JSON object"
    );

    let ok = validate_type_draft(" Meeting Room ", r#"{"capacity":"number"}"#)
      .unwrap();
    assert_eq!(ok.type_name, "Meeting Room");
    assert_eq!(ok.schema_definition["capacity"], "number");
  }
}
