//! User records — people referenced by ticket relations.
//!
//! A user is keyed by its unique upstream name. Most users enter the store
//! as stubs (name only, created on first reference from a relation) and are
//! enriched later when full ticket data or profile fields arrive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Partial user attributes carried by a fact. Absent fields leave the
/// stored record untouched on merge; a stub carries nothing at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAttrs {
  pub display_name: Option<String>,
  /// Avatar size label (e.g. `"48x48"`) to URL.
  pub avatar_urls:  BTreeMap<String, String>,
  pub active:       Option<bool>,
  pub time_zone:    Option<String>,
  /// Open-ended label/value pairs from profile enrichment.
  pub profile:      BTreeMap<String, String>,
}

/// A stored user. Uniquely keyed by `name`; never duplicated and never
/// deleted — later facts merge into the existing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
  pub name:         String,
  pub display_name: Option<String>,
  pub avatar_urls:  BTreeMap<String, String>,
  pub active:       Option<bool>,
  pub time_zone:    Option<String>,
  pub profile:      BTreeMap<String, String>,
}

impl UserRecord {
  /// A record holding only the unique key.
  pub fn stub(name: impl Into<String>) -> Self {
    Self {
      name:         name.into(),
      display_name: None,
      avatar_urls:  BTreeMap::new(),
      active:       None,
      time_zone:    None,
      profile:      BTreeMap::new(),
    }
  }

  /// Merge `attrs` into this record. Present values overwrite, absent
  /// values are left alone, map entries are unioned (newer wins per key).
  pub fn merge(&mut self, attrs: UserAttrs) {
    if attrs.display_name.is_some() {
      self.display_name = attrs.display_name;
    }
    if attrs.active.is_some() {
      self.active = attrs.active;
    }
    if attrs.time_zone.is_some() {
      self.time_zone = attrs.time_zone;
    }
    self.avatar_urls.extend(attrs.avatar_urls);
    self.profile.extend(attrs.profile);
  }

  /// The user's office/location profile field, if known and non-empty.
  pub fn office(&self) -> Option<&str> {
    self.profile.get("Office").map(String::as_str).filter(|o| !o.is_empty())
  }

  /// Display name with the unique name as fallback.
  pub fn label(&self) -> &str {
    self.display_name.as_deref().unwrap_or(&self.name)
  }
}
