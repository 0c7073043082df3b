//! Markdown + YAML front matter codec for bean files.
//!
//! A bean file is a `---` delimited YAML header followed by a blank line and
//! the free-text body. Identity fields (id, slug, path) live in the filename
//! and are never written to the header.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::error::{BeansError, Result};
use crate::model::{Links, Record};

const DELIMITER: &str = "---";

/// The subset of `Record` that is serialized to the header block.
///
/// Field order here is the on-disk field order.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FrontMatter {
    #[serde(default, deserialize_with = "null_as_empty")]
    title: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    status: String,

    #[serde(
        rename = "type",
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    record_type: String,

    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    priority: String,

    #[serde(
        default,
        deserialize_with = "tags_or_empty",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    tags: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Links::is_empty")]
    links: Links,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn tags_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<BTreeSet<String>, D::Error> {
    let tags = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(tags
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect())
}

/// Parse a bean from raw file bytes.
///
/// The returned record has empty identity fields; the caller fills them in
/// from the filename.
///
/// # Errors
///
/// Returns `Decode` for non-UTF-8 input or an unterminated header, and
/// `Yaml` if the header is not valid YAML for the known fields.
pub fn decode(bytes: &[u8]) -> Result<Record> {
    let text = std::str::from_utf8(bytes).map_err(|e| BeansError::Decode {
        reason: format!("not valid UTF-8: {e}"),
    })?;
    decode_str(text)
}

/// Parse a bean from text. See [`decode`].
///
/// # Errors
///
/// Returns `Decode` for an unterminated header and `Yaml` for a malformed
/// one.
pub fn decode_str(text: &str) -> Result<Record> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some((header, body)) = split_front_matter(text)? else {
        return Ok(Record {
            body: text.to_string(),
            ..Default::default()
        });
    };

    let front: FrontMatter = if header.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(header)?
    };

    Ok(Record {
        title: front.title,
        status: front.status,
        record_type: front.record_type,
        priority: front.priority,
        tags: front.tags,
        links: front.links,
        created_at: front.created_at,
        updated_at: front.updated_at,
        body: strip_separator_line(body).to_string(),
        ..Default::default()
    })
}

/// Serialize a bean to its on-disk text form.
///
/// # Errors
///
/// Returns `Yaml` if the header cannot be serialized.
pub fn encode(record: &Record) -> Result<String> {
    let front = FrontMatter {
        title: record.title.clone(),
        status: record.status.clone(),
        record_type: record.record_type.clone(),
        priority: record.priority.clone(),
        tags: record.tags.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
        links: record.links.clone(),
    };
    let header = serde_yaml::to_string(&front)?;

    let mut out = String::with_capacity(header.len() + record.body.len() + 16);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&header);
    if !header.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    if !record.body.is_empty() {
        out.push('\n');
        out.push_str(&record.body);
    }
    Ok(out)
}

/// Split `text` into `(header, rest)` if it opens with a delimiter line.
fn split_front_matter(text: &str) -> Result<Option<(&str, &str)>> {
    let Some(first_end) = line_end(text, 0) else {
        return Ok(None);
    };
    if trim_line(&text[..first_end]) != DELIMITER {
        return Ok(None);
    }

    let header_start = next_line_start(text, first_end);
    let mut pos = header_start;
    while pos < text.len() {
        let end = line_end(text, pos).unwrap_or(text.len());
        if trim_line(&text[pos..end]) == DELIMITER {
            let rest_start = next_line_start(text, end);
            return Ok(Some((&text[header_start..pos], &text[rest_start..])));
        }
        pos = next_line_start(text, end);
    }

    Err(BeansError::Decode {
        reason: "front matter is not terminated by '---'".to_string(),
    })
}

fn line_end(text: &str, from: usize) -> Option<usize> {
    if from >= text.len() {
        return None;
    }
    Some(text[from..].find('\n').map_or(text.len(), |i| from + i))
}

fn next_line_start(text: &str, line_end: usize) -> usize {
    (line_end + 1).min(text.len())
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches('\r').trim_end()
}

/// Drop the single blank line that separates the header from the body.
fn strip_separator_line(body: &str) -> &str {
    body.strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinkType;
    use chrono::TimeZone;

    #[test]
    fn test_decode_basic() {
        let input = "---\ntitle: Test Bean\nstatus: open\n---\n\nThis is the body.";
        let record = decode(input.as_bytes()).unwrap();
        assert_eq!(record.title, "Test Bean");
        assert_eq!(record.status, "open");
        assert_eq!(record.body, "This is the body.");
    }

    #[test]
    fn test_decode_timestamps() {
        let input = "---\ntitle: With Times\nstatus: in-progress\ncreated_at: 2024-01-15T10:30:00Z\nupdated_at: 2024-01-16T14:45:00Z\n---\n\nBody content here.";
        let record = decode_str(input).unwrap();
        assert_eq!(
            record.created_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(
            record.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 16, 14, 45, 0).unwrap())
        );
    }

    #[test]
    fn test_decode_empty_body() {
        let record = decode_str("---\ntitle: No Body\nstatus: done\n---").unwrap();
        assert_eq!(record.title, "No Body");
        assert_eq!(record.body, "");
    }

    #[test]
    fn test_decode_multiline_body() {
        let input = "---\ntitle: Multi Line\nstatus: open\n---\n\n# Header\n\n- Item 1\n- Item 2\n\nParagraph text.";
        let record = decode_str(input).unwrap();
        assert_eq!(record.body, "# Header\n\n- Item 1\n- Item 2\n\nParagraph text.");
    }

    #[test]
    fn test_decode_plain_text_is_body() {
        let record = decode_str("Just plain text without any YAML frontmatter.").unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.status, "");
        assert_eq!(record.body, "Just plain text without any YAML frontmatter.");
    }

    #[test]
    fn test_decode_unknown_type_is_kept() {
        let input = "---\ntitle: Legacy Bean\nstatus: open\ntype: deprecated-type-no-longer-in-config\n---";
        let record = decode_str(input).unwrap();
        assert_eq!(record.record_type, "deprecated-type-no-longer-in-config");
    }

    #[test]
    fn test_decode_ignores_unknown_fields_and_nulls() {
        let input = "---\ntitle:\nstatus: open\nassignee: someone\n---\n";
        let record = decode_str(input).unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.status, "open");
    }

    #[test]
    fn test_decode_crlf() {
        let input = "---\r\ntitle: Windows\r\nstatus: open\r\n---\r\n\r\nBody\r\n";
        let record = decode_str(input).unwrap();
        assert_eq!(record.title, "Windows");
        assert_eq!(record.body, "Body\r\n");
    }

    #[test]
    fn test_decode_unterminated_header_fails() {
        let result = decode_str("---\ntitle: Broken\n");
        assert!(matches!(result, Err(BeansError::Decode { .. })));
    }

    #[test]
    fn test_decode_malformed_yaml_fails() {
        let result = decode_str("---\ntitle: [unclosed\n---\n");
        assert!(matches!(result, Err(BeansError::Yaml(_))));
    }

    #[test]
    fn test_decode_invalid_utf8_fails() {
        let result = decode(&[0x2d, 0x2d, 0x2d, 0x0a, 0xff, 0xfe]);
        assert!(matches!(result, Err(BeansError::Decode { .. })));
    }

    #[test]
    fn test_decode_tags_and_links() {
        let input = "---\ntitle: Linked\nstatus: open\ntags:\n  - ui\n  - ui\n  - backend\nlinks:\n  parent: p1\n  blocks: [b1, b2]\n---\n";
        let record = decode_str(input).unwrap();
        assert_eq!(record.tags.len(), 2);
        assert!(record.has_tag("ui"));
        assert_eq!(record.links.parent(), Some("p1"));
        assert_eq!(record.links.targets(&LinkType::Blocks), ["b1", "b2"]);
    }

    #[test]
    fn test_encode_field_order() {
        let record = Record {
            title: "Typed Bean".to_string(),
            status: "open".to_string(),
            record_type: "bug".to_string(),
            ..Default::default()
        };
        let text = encode(&record).unwrap();
        assert_eq!(text, "---\ntitle: Typed Bean\nstatus: open\ntype: bug\n---\n");
    }

    #[test]
    fn test_encode_omits_absent_optional_fields() {
        let record = Record {
            title: "Plain".to_string(),
            status: "open".to_string(),
            ..Default::default()
        };
        let text = encode(&record).unwrap();
        assert!(!text.contains("type:"));
        assert!(!text.contains("priority:"));
        assert!(!text.contains("tags:"));
        assert!(!text.contains("links:"));
        assert!(!text.contains("created_at:"));
    }

    #[test]
    fn test_encode_body_follows_blank_line() {
        let record = Record {
            title: "With Body".to_string(),
            status: "done".to_string(),
            body: "This is content.".to_string(),
            ..Default::default()
        };
        let text = encode(&record).unwrap();
        assert!(text.ends_with("---\n\nThis is content."));
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 16, 14, 45, 0).unwrap();
        let mut record = Record {
            title: "Timestamped: Bean".to_string(),
            status: "in-progress".to_string(),
            record_type: "feature".to_string(),
            priority: "high".to_string(),
            created_at: Some(now),
            updated_at: Some(later),
            body: "\nStarts with a blank line.\n\nWith multiple paragraphs.\n".to_string(),
            ..Default::default()
        };
        record.tags.insert("frontend".to_string());
        record.links.add(LinkType::Parent, "abcd");
        record.links.add(LinkType::Blocks, "efgh");

        let parsed = decode_str(&encode(&record).unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_roundtrip_empty_body_stays_empty() {
        let record = Record {
            title: "Basic Bean".to_string(),
            status: "open".to_string(),
            ..Default::default()
        };
        let parsed = decode_str(&encode(&record).unwrap()).unwrap();
        assert_eq!(parsed.body, "");
    }
}
