//! Who is using the frontend: the bearer token and role obtained at login.

use serde::Deserialize;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  Admin,
  User,
}

/// Read-only view of the current login session.
pub trait SessionContext: Send + Sync {
  fn token(&self) -> Option<&str>;

  fn role(&self) -> Option<Role>;

  /// Admin-only screens are refused when the role is known and not admin.
  /// An unknown role is left for the server to judge.
  fn may_administer(&self) -> bool { !matches!(self.role(), Some(Role::User)) }
}

/// A session whose values were fixed at startup (config file, flags, env).
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
  token: Option<String>,
  role:  Option<Role>,
}

impl StaticSession {
  pub fn new(token: Option<String>, role: Option<Role>) -> Self {
    Self {
      token: token.filter(|t| !t.trim().is_empty()),
      role,
    }
  }
}

impl SessionContext for StaticSession {
  fn token(&self) -> Option<&str> { self.token.as_deref() }

  fn role(&self) -> Option<Role> { self.role }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parsing() {
    assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!("User".parse::<Role>().unwrap(), Role::User);
    assert!("root".parse::<Role>().is_err());
    assert_eq!(Role::Admin.to_string(), "admin");
  }

  #[test]
  fn blank_token_is_no_token() {
    let session = StaticSession::new(Some("  ".into()), None);
    assert_eq!(session.token(), None);
    assert!(session.may_administer());
  }

  #[test]
  fn users_may_not_administer() {
    let session = StaticSession::new(Some("t".into()), Some(Role::User));
    assert_eq!(session.token(), Some("t"));
    assert!(!session.may_administer());
    assert!(StaticSession::new(None, Some(Role::Admin)).may_administer());
  }
}
