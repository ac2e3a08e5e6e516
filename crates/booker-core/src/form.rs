//! The schema-driven part of a resource form.
//!
//! [`SchemaFormModel`] tracks which resource type's schema is in effect and
//! owns the dynamic [`SchemaField`]s derived from it. The static fields
//! (name, location, …) live in [`ResourceDraft`].

use std::collections::BTreeMap;

use crate::{
  ValidationErrors,
  coerce::{FieldValue, InputKind, coerce, input_kind_for},
  label::label_for,
  resource::{PropertyValue, Resource, ResourceType},
  schema::{Schema, SchemaKind},
};

/// Location offered for meeting rooms when none has been entered.
pub const MEETING_ROOM_LOCATION: &str = "Office";

const NAME_SUGGESTIONS: &[(&str, &[&str])] = &[
  ("meeting room", &["Topaz", "Emerald", "Sapphire", "Citrine"]),
  ("laptop", &["Windows", "Mac OS", "Linux", "Ubuntu"]),
  ("turf", &["Turf A", "Turf B", "Turf C", "Turf D"]),
];

// ─── Mode & static fields ────────────────────────────────────────────────────

/// Whether a session creates a new resource or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
  Create,
  Edit { resource_id: i64 },
}

/// The schema-independent fields of a resource form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDraft {
  pub name:        String,
  pub type_id:     Option<i64>,
  pub location:    String,
  pub description: String,
  /// Only editable (and only submitted) in the edit flow.
  pub is_active:   bool,
}

impl Default for ResourceDraft {
  fn default() -> Self {
    Self {
      name:        String::new(),
      type_id:     None,
      location:    String::new(),
      description: String::new(),
      is_active:   true,
    }
  }
}

impl ResourceDraft {
  pub fn from_resource(resource: &Resource) -> Self {
    Self {
      name:        resource.name.clone(),
      type_id:     Some(resource.type_id),
      location:    resource.location.clone(),
      description: resource.description.clone(),
      is_active:   resource.is_active,
    }
  }
}

// ─── Dynamic fields ──────────────────────────────────────────────────────────

/// One form field generated from one schema property.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
  pub key:      String,
  pub kind:     SchemaKind,
  pub value:    FieldValue,
  /// Every schema property is currently mandatory, whatever the type.
  pub required: bool,
}

impl SchemaField {
  /// `"Capacity (number)"`
  pub fn label(&self) -> String { format!("{} ({})", label_for(&self.key), self.kind) }

  pub fn input_kind(&self) -> InputKind { input_kind_for(&self.kind) }

  /// Key under which this field's validation error is reported.
  pub fn error_key(&self) -> String { property_error_key(&self.key) }
}

pub fn property_error_key(key: &str) -> String { format!("property_{key}") }

/// Build one field per schema key, seeded from `existing` property values.
pub fn derive_fields(
  schema: &Schema,
  existing: Option<&BTreeMap<String, PropertyValue>>,
) -> Vec<SchemaField> {
  schema
    .iter()
    .map(|(key, kind)| SchemaField {
      key:      key.to_string(),
      kind:     kind.clone(),
      value:    seed_value(kind, existing.and_then(|props| props.get(key))),
      required: true,
    })
    .collect()
}

fn seed_value(kind: &SchemaKind, existing: Option<&PropertyValue>) -> FieldValue {
  match (kind, existing) {
    (SchemaKind::Boolean, Some(PropertyValue::Bool(b))) => FieldValue::Flag(*b),
    (SchemaKind::Boolean, Some(PropertyValue::Text(s))) => FieldValue::Flag(s == "true"),
    (SchemaKind::Boolean, _) => FieldValue::Flag(false),
    (_, Some(value)) => FieldValue::Text(value.to_string()),
    (_, None) => FieldValue::default(),
  }
}

// ─── Suggestions ─────────────────────────────────────────────────────────────

/// Suggest a default location for the type, but only while none is entered.
pub fn suggested_location(type_name: &str, current_location: &str) -> Option<&'static str> {
  let is_meeting_room = type_name.to_lowercase().contains("meeting room");
  (is_meeting_room && current_location.trim().is_empty()).then_some(MEETING_ROOM_LOCATION)
}

/// Conventional resource names for well-known types.
pub fn name_suggestions(type_name: &str) -> &'static [&'static str] {
  let lower = type_name.to_lowercase();
  NAME_SUGGESTIONS
    .iter()
    .find(|(needle, _)| lower.contains(needle))
    .map(|(_, names)| *names)
    .unwrap_or_default()
}

// ─── Validation & submission ─────────────────────────────────────────────────

/// Check the static fields and every given schema field. Pure.
pub fn validate(draft: &ResourceDraft, fields: &[SchemaField]) -> ValidationErrors {
  let mut errors = ValidationErrors::new();

  if draft.name.trim().is_empty() {
    errors.insert("name".into(), "Name is required".into());
  }
  if draft.type_id.is_none() {
    errors.insert("type_id".into(), "Type is required".into());
  }
  if draft.location.trim().is_empty() {
    errors.insert("location".into(), "Location is required".into());
  }
  if draft.description.trim().is_empty() {
    errors.insert("description".into(), "Description is required".into());
  }

  for field in fields {
    if field.required && field.value.is_missing() {
      errors.insert(
        field.error_key(),
        format!("{} is required", label_for(&field.key)),
      );
    }
  }

  errors
}

/// Coerce every field; skipped fields are omitted, so the result may be empty
/// but is never absent.
pub fn build_properties(fields: &[SchemaField]) -> BTreeMap<String, PropertyValue> {
  fields
    .iter()
    .filter_map(|f| coerce(&f.kind, Some(&f.value)).map(|v| (f.key.clone(), v)))
    .collect()
}

// ─── Model ───────────────────────────────────────────────────────────────────

/// Where the schema for the current type selection stands.
#[derive(Debug, Clone, Default)]
pub enum SchemaState {
  /// No type selected.
  #[default]
  NoType,
  /// The type's definition is being fetched.
  Loading { type_id: i64 },
  /// The schema is resolved and the fields are live.
  Ready {
    resource_type: ResourceType,
    schema:        Schema,
  },
  /// Resolving the type failed; there are no dynamic fields.
  Error { type_id: i64, message: String },
}

/// Dynamic fields for the currently selected resource type.
#[derive(Debug, Clone, Default)]
pub struct SchemaFormModel {
  state:  SchemaState,
  fields: Vec<SchemaField>,
}

impl SchemaFormModel {
  pub fn state(&self) -> &SchemaState { &self.state }

  /// Live fields; empty unless the state is [`SchemaState::Ready`].
  pub fn fields(&self) -> &[SchemaField] { &self.fields }

  pub fn resource_type(&self) -> Option<&ResourceType> {
    match &self.state {
      SchemaState::Ready { resource_type, .. } => Some(resource_type),
      _ => None,
    }
  }

  pub fn clear(&mut self) {
    self.state = SchemaState::NoType;
    self.fields.clear();
  }

  pub fn start_loading(&mut self, type_id: i64) {
    self.state = SchemaState::Loading { type_id };
    self.fields.clear();
  }

  /// Enter `Ready`, deriving fields from the type's schema and `seed`.
  pub fn resolve(
    &mut self,
    resource_type: ResourceType,
    seed: Option<&BTreeMap<String, PropertyValue>>,
  ) {
    let schema = resource_type.schema();
    self.fields = derive_fields(&schema, seed);
    tracing::debug!(
      type_id = resource_type.id,
      fields = self.fields.len(),
      "schema resolved"
    );
    self.state = SchemaState::Ready {
      resource_type,
      schema,
    };
  }

  /// Enter `Error`, discarding any field values.
  pub fn fail(&mut self, type_id: i64, message: impl Into<String>) {
    self.state = SchemaState::Error {
      type_id,
      message: message.into(),
    };
    self.fields.clear();
  }

  /// Set a field's value. Returns `false` if `key` is not a live field.
  pub fn set_value(&mut self, key: &str, value: FieldValue) -> bool {
    match self.fields.iter_mut().find(|f| f.key == key) {
      Some(field) => {
        field.value = value;
        true
      }
      None => false,
    }
  }

  pub fn properties(&self) -> BTreeMap<String, PropertyValue> { build_properties(&self.fields) }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn schema(pairs: &[(&str, SchemaKind)]) -> Schema {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  fn room_type() -> ResourceType {
    serde_json::from_value(json!({
      "id": 1,
      "type": "Meeting Room",
      "schema_definition": { "capacity": "number", "hasProjector": "boolean" },
    }))
    .unwrap()
  }

  #[test]
  fn create_flow_fields_start_empty() {
    let fields = derive_fields(
      &schema(&[("capacity", SchemaKind::Number), ("hasProjector", SchemaKind::Boolean)]),
      None,
    );
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].key, "capacity");
    assert_eq!(fields[0].value, FieldValue::Text(String::new()));
    assert_eq!(fields[1].value, FieldValue::Flag(false));
    assert!(fields.iter().all(|f| f.required));
  }

  #[test]
  fn edit_flow_seeds_from_existing_properties() {
    let existing = BTreeMap::from([("capacity".to_string(), PropertyValue::integer(4))]);
    let fields = derive_fields(
      &schema(&[("capacity", SchemaKind::Number), ("extra", SchemaKind::String)]),
      Some(&existing),
    );
    assert_eq!(fields[0].value, FieldValue::Text("4".into()));
    assert_eq!(fields[1].key, "extra");
    assert_eq!(fields[1].value, FieldValue::Text(String::new()));
  }

  #[test]
  fn boolean_seeds() {
    let existing = BTreeMap::from([
      ("a".to_string(), PropertyValue::Bool(true)),
      ("b".to_string(), PropertyValue::Text("true".into())),
      ("c".to_string(), PropertyValue::Text("nope".into())),
    ]);
    let fields = derive_fields(
      &schema(&[
        ("a", SchemaKind::Boolean),
        ("b", SchemaKind::Boolean),
        ("c", SchemaKind::Boolean),
      ]),
      Some(&existing),
    );
    let values: Vec<_> = fields.iter().map(|f| f.value.clone()).collect();
    assert_eq!(
      values,
      vec![FieldValue::Flag(true), FieldValue::Flag(true), FieldValue::Flag(false)]
    );
  }

  #[test]
  fn labels_carry_the_kind() {
    let fields = derive_fields(&schema(&[("max_people", SchemaKind::Integer)]), None);
    assert_eq!(fields[0].label(), "Max People (int)");
    assert_eq!(fields[0].error_key(), "property_max_people");
  }

  #[test]
  fn empty_form_with_two_text_fields_has_six_errors() {
    let fields = derive_fields(
      &schema(&[("capacity", SchemaKind::Number), ("floor", SchemaKind::String)]),
      None,
    );
    let errors = validate(&ResourceDraft::default(), &fields);
    assert_eq!(errors.len(), 6);
    for key in ["name", "type_id", "location", "description", "property_capacity", "property_floor"] {
      assert!(errors.contains_key(key), "missing {key}");
    }
    assert_eq!(errors["property_capacity"], "Capacity is required");
  }

  #[test]
  fn empty_form_with_number_and_boolean_has_six_errors() {
    let fields = derive_fields(
      &schema(&[("capacity", SchemaKind::Number), ("hasProjector", SchemaKind::Boolean)]),
      None,
    );
    let errors = validate(&ResourceDraft::default(), &fields);
    assert_eq!(
      errors.keys().collect::<Vec<_>>(),
      [
        "description",
        "location",
        "name",
        "property_capacity",
        "property_hasProjector",
        "type_id",
      ]
    );
    assert_eq!(errors["property_hasProjector"], "Has Projector is required");

    // Checking the box satisfies the requirement.
    let mut fields = fields;
    fields[1].value = FieldValue::Flag(true);
    assert!(!validate(&ResourceDraft::default(), &fields).contains_key("property_hasProjector"));
  }

  #[test]
  fn whitespace_counts_as_missing() {
    let draft = ResourceDraft {
      name:        "  ".into(),
      type_id:     Some(1),
      location:    "Office".into(),
      description: "\t".into(),
      is_active:   true,
    };
    let errors = validate(&draft, &[]);
    assert_eq!(errors.keys().collect::<Vec<_>>(), ["description", "name"]);
  }

  #[test]
  fn properties_skip_blank_values() {
    let mut fields = derive_fields(
      &schema(&[("capacity", SchemaKind::Number), ("hasProjector", SchemaKind::Boolean)]),
      None,
    );
    fields[0].value = FieldValue::Text("10".into());
    fields[1].value = FieldValue::Text("false".into());
    assert_eq!(
      build_properties(&fields),
      BTreeMap::from([
        ("capacity".to_string(), PropertyValue::integer(10)),
        ("hasProjector".to_string(), PropertyValue::Bool(false)),
      ])
    );

    fields[0].value = FieldValue::Text(String::new());
    fields[1].value = FieldValue::Text("true".into());
    assert_eq!(
      build_properties(&fields),
      BTreeMap::from([("hasProjector".to_string(), PropertyValue::Bool(true))])
    );

    assert!(build_properties(&[]).is_empty());
  }

  #[test]
  fn suggestions() {
    assert_eq!(suggested_location("Large MEETING ROOM", ""), Some("Office"));
    assert_eq!(suggested_location("Meeting Room", "HQ"), None);
    assert_eq!(suggested_location("Laptop", ""), None);

    assert_eq!(name_suggestions("Meeting Room")[0], "Topaz");
    assert_eq!(name_suggestions("Gaming laptop").len(), 4);
    assert!(name_suggestions("Projector").is_empty());
  }

  #[test]
  fn model_transitions() {
    let mut model = SchemaFormModel::default();
    assert!(matches!(model.state(), SchemaState::NoType));

    model.start_loading(1);
    assert!(matches!(model.state(), SchemaState::Loading { type_id: 1 }));

    model.resolve(room_type(), None);
    assert_eq!(model.fields().len(), 2);
    assert_eq!(model.resource_type().map(|t| t.id), Some(1));
    assert!(model.set_value("capacity", FieldValue::Text("8".into())));
    assert!(!model.set_value("missing", FieldValue::Text("8".into())));
    assert_eq!(model.properties()["capacity"], PropertyValue::integer(8));

    model.fail(1, "boom");
    assert!(model.fields().is_empty());
    assert!(matches!(model.state(), SchemaState::Error { .. }));

    model.clear();
    assert!(matches!(model.state(), SchemaState::NoType));
  }
}
