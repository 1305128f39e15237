//! Heuristic field extraction from the profile page.
//!
//! The page's detail sections (`item-details` lists) hold `<dl>` blocks
//! whose text reads `Label: value`. Rather than a full DOM, we slice each
//! detail section out of the markup, strip tags, collapse whitespace, and
//! split on the first colon. The extraction is total: a page with no
//! recognisable detail section yields an empty map, never an error.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;

/// Flat label:value mapping scraped from the profile document.
pub type ProfileFields = BTreeMap<String, String>;

static DL_BLOCK: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s)<dl[^>]*>(.*?)</dl>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Extract `Label: value` pairs from every `item-details` section.
pub fn extract_fields(document: &str) -> ProfileFields {
  let mut fields = ProfileFields::new();
  for (start, _) in document.match_indices("item-details") {
    let section = &document[start..];
    let section = match section.find("</ul>") {
      Some(end) => &section[..end],
      None => section,
    };
    for capture in DL_BLOCK.captures_iter(section) {
      let text = TAG.replace_all(&capture[1], " ");
      let text = WHITESPACE.replace_all(&text, " ");
      let mut parts = text.split(':');
      let (Some(label), Some(value)) = (parts.next(), parts.next()) else {
        continue;
      };
      let label = label.trim();
      if !label.is_empty() {
        fields.insert(label.to_string(), value.trim().to_string());
      }
    }
  }
  fields
}

#[cfg(test)]
mod tests {
  use super::*;

  const PAGE: &str = r#"
    <html><body>
      <ul class="item-details">
        <li><dl><dt>Full Name:</dt><dd>Alice Liddell</dd></dl></li>
        <li><dl>
          <dt>Office:</dt>
          <dd>Beijing</dd>
        </dl></li>
      </ul>
      <ul class="item-details">
        <li><dl><dt>Department:</dt><dd>Framework</dd></dl></li>
      </ul>
    </body></html>
  "#;

  #[test]
  fn extracts_labelled_pairs_from_all_detail_sections() {
    let fields = extract_fields(PAGE);
    assert_eq!(
      fields.get("Full Name").map(String::as_str),
      Some("Alice Liddell")
    );
    assert_eq!(fields.get("Office").map(String::as_str), Some("Beijing"));
    assert_eq!(fields.get("Department").map(String::as_str), Some("Framework"));
  }

  #[test]
  fn markup_outside_detail_sections_is_ignored() {
    let page = r#"<dl><dt>Stray</dt><dd>: value</dd></dl>"#;
    assert!(extract_fields(page).is_empty());
  }

  #[test]
  fn malformed_or_empty_documents_yield_empty_maps() {
    assert!(extract_fields("").is_empty());
    assert!(extract_fields("<html>login required</html>").is_empty());
    assert!(extract_fields("item-details <dl>no closing tag").is_empty());
  }
}
