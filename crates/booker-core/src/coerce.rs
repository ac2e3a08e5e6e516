//! Conversion between raw form values and schema-typed property values.

use strum::{AsRefStr, Display};

use crate::{resource::PropertyValue, schema::SchemaKind};

/// The control used to edit a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum InputKind {
  Text,
  Number,
  Checkbox,
}

/// A raw form value: text from an input, or a checkbox state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
  Text(String),
  Flag(bool),
}

impl FieldValue {
  /// A checkbox always holds a value; text is blank when only whitespace.
  pub fn is_blank(&self) -> bool {
    match self {
      Self::Text(s) => s.trim().is_empty(),
      Self::Flag(_) => false,
    }
  }

  /// Whether a required field counts as unfilled: blank text or an unchecked
  /// box. An unchecked box still submits as `false`.
  pub fn is_missing(&self) -> bool {
    match self {
      Self::Text(_) => self.is_blank(),
      Self::Flag(checked) => !checked,
    }
  }
}

impl Default for FieldValue {
  fn default() -> Self { Self::Text(String::new()) }
}

pub fn input_kind_for(kind: &SchemaKind) -> InputKind {
  match kind {
    SchemaKind::Number | SchemaKind::Integer => InputKind::Number,
    SchemaKind::Boolean => InputKind::Checkbox,
    _ => InputKind::Text,
  }
}

/// Coerce a raw value to the declared kind.
///
/// `None` means "skip": the key is left out of the submitted properties
/// entirely. Blank or absent values are always skipped, as are numeric
/// values with no leading integer.
pub fn coerce(kind: &SchemaKind, raw: Option<&FieldValue>) -> Option<PropertyValue> {
  let raw = raw.filter(|v| !v.is_blank())?;

  match kind {
    SchemaKind::Number | SchemaKind::Integer => {
      let text = match raw {
        FieldValue::Text(s) => s.as_str(),
        FieldValue::Flag(_) => return None,
      };
      parse_leading_int(text).map(PropertyValue::integer)
    }
    SchemaKind::Boolean => Some(PropertyValue::Bool(match raw {
      FieldValue::Flag(b) => *b,
      FieldValue::Text(s) => s == "true",
    })),
    SchemaKind::String | SchemaKind::Date | SchemaKind::Other(_) => match raw {
      FieldValue::Text(s) => Some(PropertyValue::Text(s.trim().to_string())),
      FieldValue::Flag(b) => Some(PropertyValue::Text(b.to_string())),
    },
  }
}

/// Parse an optional sign followed by the leading run of ASCII digits,
/// ignoring surrounding whitespace and anything after the digits.
/// `"42"` → 42, `"12.5"` → 12, `"-3 rooms"` → -3, `"abc"` → `None`.
fn parse_leading_int(text: &str) -> Option<i64> {
  let text = text.trim();
  let sign = usize::from(text.starts_with(['-', '+']));
  let digits = text[sign..].bytes().take_while(u8::is_ascii_digit).count();
  if digits == 0 {
    return None;
  }
  text[..sign + digits].parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(s: &str) -> FieldValue { FieldValue::Text(s.into()) }

  fn all_kinds() -> Vec<SchemaKind> {
    vec![
      SchemaKind::String,
      SchemaKind::Number,
      SchemaKind::Integer,
      SchemaKind::Boolean,
      SchemaKind::Date,
      SchemaKind::Other("uuid".into()),
    ]
  }

  #[test]
  fn blank_and_absent_are_skipped_for_every_kind() {
    for kind in all_kinds() {
      assert_eq!(coerce(&kind, Some(&text(""))), None, "{kind}");
      assert_eq!(coerce(&kind, Some(&text("   "))), None, "{kind}");
      assert_eq!(coerce(&kind, None), None, "{kind}");
    }
  }

  #[test]
  fn numbers() {
    assert_eq!(
      coerce(&SchemaKind::Number, Some(&text("42"))),
      Some(PropertyValue::integer(42))
    );
    assert_eq!(coerce(&SchemaKind::Integer, Some(&text("abc"))), None);
    assert_eq!(
      coerce(&SchemaKind::Integer, Some(&text(" 12.5 "))),
      Some(PropertyValue::integer(12))
    );
    assert_eq!(
      coerce(&SchemaKind::Number, Some(&text("-3 rooms"))),
      Some(PropertyValue::integer(-3))
    );
    assert_eq!(coerce(&SchemaKind::Number, Some(&text("-"))), None);
    assert_eq!(
      coerce(&SchemaKind::Number, Some(&text("99999999999999999999"))),
      None
    );
    assert_eq!(
      coerce(&SchemaKind::Integer, Some(&text("+7"))),
      Some(PropertyValue::integer(7))
    );
  }

  #[test]
  fn integer_bounds_are_accepted() {
    assert_eq!(
      coerce(&SchemaKind::Integer, Some(&text("-9223372036854775808"))),
      Some(PropertyValue::integer(i64::MIN))
    );
    assert_eq!(
      coerce(&SchemaKind::Number, Some(&text("9223372036854775807 seats"))),
      Some(PropertyValue::integer(i64::MAX))
    );
    assert_eq!(
      coerce(&SchemaKind::Number, Some(&text("-9223372036854775809"))),
      None
    );
  }

  #[test]
  fn booleans() {
    let b = SchemaKind::Boolean;
    assert_eq!(coerce(&b, Some(&text("true"))), Some(PropertyValue::Bool(true)));
    assert_eq!(coerce(&b, Some(&text("false"))), Some(PropertyValue::Bool(false)));
    assert_eq!(coerce(&b, Some(&text("yes"))), Some(PropertyValue::Bool(false)));
    assert_eq!(coerce(&b, Some(&text("TRUE"))), Some(PropertyValue::Bool(false)));
    assert_eq!(
      coerce(&b, Some(&FieldValue::Flag(true))),
      Some(PropertyValue::Bool(true))
    );
    assert_eq!(
      coerce(&b, Some(&FieldValue::Flag(false))),
      Some(PropertyValue::Bool(false))
    );
  }

  #[test]
  fn unchecked_box_is_missing_but_not_blank() {
    assert!(!FieldValue::Flag(false).is_blank());
    assert!(FieldValue::Flag(false).is_missing());
    assert!(!FieldValue::Flag(true).is_missing());
    assert!(text(" ").is_missing());
    assert!(!text("false").is_missing());
  }

  #[test]
  fn strings_are_trimmed() {
    assert_eq!(
      coerce(&SchemaKind::String, Some(&text("  room A  "))),
      Some(PropertyValue::Text("room A".into()))
    );
    assert_eq!(
      coerce(&SchemaKind::Date, Some(&text("2024-05-01"))),
      Some(PropertyValue::Text("2024-05-01".into()))
    );
  }

  #[test]
  fn input_kinds() {
    assert_eq!(input_kind_for(&SchemaKind::Number), InputKind::Number);
    assert_eq!(input_kind_for(&SchemaKind::Integer), InputKind::Number);
    assert_eq!(input_kind_for(&SchemaKind::Boolean), InputKind::Checkbox);
    assert_eq!(input_kind_for(&SchemaKind::Date), InputKind::Text);
    assert_eq!(input_kind_for(&SchemaKind::String), InputKind::Text);
    assert_eq!(InputKind::Checkbox.as_ref(), "checkbox");
    assert_eq!(InputKind::Number.to_string(), "number");
  }
}
