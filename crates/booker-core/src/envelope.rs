//! Response envelopes.
//!
//! The API wraps payloads inconsistently: sometimes the payload is the body
//! itself, sometimes it sits under `data`, sometimes under a named key such as
//! `resource_types`. [`Envelope::decode`] is the one place that knows this.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Named keys that may wrap a list of resource types.
pub const RESOURCE_TYPES_KEYS: &[&str] = &["resource_types", "resourceTypes"];
/// Named keys that may wrap a single resource type.
pub const RESOURCE_TYPE_KEYS: &[&str] = &["resource_type", "resourceType"];
/// Named keys that may wrap a page of resources.
pub const RESOURCES_KEYS: &[&str] = &["resources"];
/// Named keys that may wrap a single resource.
pub const RESOURCE_KEYS: &[&str] = &["resource"];

/// Where in the body the payload was found.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
  /// The body is the payload.
  Bare(T),
  /// `{ "data": payload }`
  Wrapped(T),
  /// `{ "<named key>": payload }`
  Named(T),
}

impl<T: DeserializeOwned> Envelope<T> {
  /// Try the bare body, then `data`, then each of `names` in order.
  /// Returns `None` when no shape yields a `T`.
  pub fn decode(body: Value, names: &[&str]) -> Option<Self> {
    if let Ok(payload) = T::deserialize(&body) {
      return Some(Self::Bare(payload));
    }

    let Value::Object(mut map) = body else {
      return None;
    };

    if let Some(payload) = map.remove("data").and_then(|v| serde_json::from_value(v).ok()) {
      return Some(Self::Wrapped(payload));
    }

    names
      .iter()
      .filter_map(|name| map.remove(*name))
      .find_map(|v| serde_json::from_value(v).ok())
      .map(Self::Named)
  }
}

impl<T> Envelope<T> {
  pub fn into_inner(self) -> T {
    match self {
      Self::Bare(t) | Self::Wrapped(t) | Self::Named(t) => t,
    }
  }
}
