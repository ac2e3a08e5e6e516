//! Human-readable labels for schema property keys.

/// Turn a `snake_case` or `camelCase` key into a Title Case label.
///
/// `meeting_room` → `Meeting Room`, `capacityValue` → `Capacity Value`.
/// The result never has leading or trailing whitespace, and feeding it back
/// through `label_for` is safe.
pub fn label_for(key: &str) -> String {
  let mut spaced = String::with_capacity(key.len() + 4);
  for c in key.chars() {
    match c {
      '_' => spaced.push(' '),
      c if c.is_ascii_uppercase() => {
        spaced.push(' ');
        spaced.push(c);
      }
      c => spaced.push(c),
    }
  }

  spaced
    .split_whitespace()
    .map(capitalize)
    .collect::<Vec<_>>()
    .join(" ")
}

fn capitalize(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first
      .to_uppercase()
      .chain(chars.flat_map(char::to_lowercase))
      .collect(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn snake_case() {
    assert_eq!(label_for("meeting_room"), "Meeting Room");
  }

  #[test]
  fn camel_case() {
    assert_eq!(label_for("capacityValue"), "Capacity Value");
    assert_eq!(label_for("hasProjector"), "Has Projector");
  }

  #[test]
  fn shouting_words_are_lowered() {
    assert_eq!(label_for("FLOOR"), "F L O O R");
    assert_eq!(label_for("floor_NUMBER"), "Floor N U M B E R");
  }

  #[test]
  fn collapses_separators_and_trims() {
    assert_eq!(label_for("__wifi__ssid_"), "Wifi Ssid");
    assert_eq!(label_for("  spaced   out "), "Spaced Out");
    assert_eq!(label_for(""), "");
  }

  #[test]
  fn applying_twice_is_safe() {
    for key in ["meeting_room", "capacityValue", "x", "_A_b_", "été_ok"] {
      let once = label_for(key);
      let twice = label_for(&once);
      assert_eq!(twice.trim(), twice);
      assert!(!twice.contains("  "));
    }
  }
}
