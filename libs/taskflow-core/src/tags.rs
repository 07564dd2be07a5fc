//! Tag list conversions
//!
//! Tags travel as an ordered list in the models and as a single
//! comma-separated string on the wire and in the task form. Order is kept
//! and duplicates are allowed.

use taskflow_common::TAG_SEPARATOR;

/// Split comma-separated tag text into a tag list
///
/// Entries are trimmed and empty entries dropped.
///
/// # Examples
///
/// ```
/// # use taskflow_core::tags::parse_tag_text;
/// assert_eq!(parse_tag_text("draft, urgent"), vec!["draft", "urgent"]);
/// assert_eq!(parse_tag_text(" a,,b , "), vec!["a", "b"]);
/// assert!(parse_tag_text("").is_empty());
/// ```
pub fn parse_tag_text(text: &str) -> Vec<String> {
    text.split(TAG_SEPARATOR)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Join a tag list into its wire form
///
/// Returns `None` when no non-empty tag remains, so the field can be left
/// out of a payload.
///
/// # Examples
///
/// ```
/// # use taskflow_core::tags::tags_to_wire;
/// let tags = vec!["draft".to_string(), " urgent ".to_string()];
/// assert_eq!(tags_to_wire(&tags).as_deref(), Some("draft,urgent"));
/// assert_eq!(tags_to_wire(&[]), None);
/// ```
pub fn tags_to_wire(tags: &[String]) -> Option<String> {
    let cleaned: Vec<&str> = tags
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join(&TAG_SEPARATOR.to_string()))
    }
}

/// Read a wire tag string back into a list
pub fn tags_from_wire(wire: Option<&str>) -> Vec<String> {
    wire.map(parse_tag_text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_tag_text_keeps_order_and_duplicates() {
        assert_eq!(
            parse_tag_text("review, design, review"),
            vec!["review", "design", "review"]
        );
    }

    #[test]
    fn test_parse_tag_text_inner_spaces_preserved() {
        assert_eq!(
            parse_tag_text("high priority, ui/ux"),
            vec!["high priority", "ui/ux"]
        );
    }

    #[test]
    fn test_tags_from_wire() {
        assert_eq!(tags_from_wire(Some("a,b")), vec!["a", "b"]);
        assert!(tags_from_wire(Some("")).is_empty());
        assert!(tags_from_wire(None).is_empty());
    }

    #[test]
    fn test_tags_to_wire_skips_blank_entries() {
        let tags = vec![" ".to_string(), "x".to_string(), String::new()];
        assert_eq!(tags_to_wire(&tags).as_deref(), Some("x"));

        let blank = vec!["  ".to_string()];
        assert_eq!(tags_to_wire(&blank), None);
    }

    proptest! {
        #[test]
        fn prop_wire_form_reads_back(tags in prop::collection::vec("[a-z][a-z0-9 /-]{0,10}[a-z0-9]", 0..8)) {
            let wire = tags_to_wire(&tags);
            prop_assert_eq!(tags_from_wire(wire.as_deref()), tags);
        }

        #[test]
        fn prop_parsed_tags_are_trimmed_and_non_empty(text in "[a-z ,]{0,40}") {
            for tag in parse_tag_text(&text) {
                prop_assert!(!tag.is_empty());
                prop_assert_eq!(tag.trim(), tag.as_str());
                prop_assert!(!tag.contains(','));
            }
        }
    }
}
