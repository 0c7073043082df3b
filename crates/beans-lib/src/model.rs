//! Core data types for beans-lib.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Typed relationship between two beans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkType {
    Parent,
    Blocks,
    Relates,
    Duplicates,
    Custom(String),
}

impl LinkType {
    /// Names of the built-in link types.
    pub const KNOWN: [&'static str; 4] = ["parent", "blocks", "relates", "duplicates"];

    /// True for the built-in types, false for `Custom`.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Parent => "parent",
            Self::Blocks => "blocks",
            Self::Relates => "relates",
            Self::Duplicates => "duplicates",
            Self::Custom(value) => value,
        }
    }

    /// Link types for which cycles are structurally disallowed.
    #[must_use]
    pub const fn is_hierarchical(&self) -> bool {
        matches!(self, Self::Parent | Self::Blocks)
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = crate::error::BeansError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "" => Err(crate::error::BeansError::validation(
                "link_type",
                "cannot be empty",
            )),
            "parent" => Ok(Self::Parent),
            "blocks" => Ok(Self::Blocks),
            "relates" | "related" | "relates-to" => Ok(Self::Relates),
            "duplicates" => Ok(Self::Duplicates),
            _ => Ok(Self::Custom(value)),
        }
    }
}

impl Serialize for LinkType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LinkType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Targets of one link type: a single id or a list of ids on disk.
#[derive(Deserialize)]
#[serde(untagged)]
enum TargetsRepr {
    One(String),
    Many(Vec<String>),
}

/// Outgoing links of a bean: link type to the ordered, de-duplicated set of
/// target ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links(BTreeMap<LinkType, Vec<String>>);

impl Links {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target. Returns `false` if the pair was already present.
    pub fn add(&mut self, link_type: LinkType, target: impl Into<String>) -> bool {
        let target = target.into();
        let targets = self.0.entry(link_type).or_default();
        if targets.contains(&target) {
            return false;
        }
        targets.push(target);
        true
    }

    /// Remove a target. Returns `false` if the pair was not present.
    pub fn remove(&mut self, link_type: &LinkType, target: &str) -> bool {
        let Some(targets) = self.0.get_mut(link_type) else {
            return false;
        };
        let before = targets.len();
        targets.retain(|t| t != target);
        let removed = targets.len() != before;
        if targets.is_empty() {
            self.0.remove(link_type);
        }
        removed
    }

    /// Remove every link to `target`, whatever its type. Returns the number
    /// of pairs removed.
    pub fn remove_target(&mut self, target: &str) -> usize {
        let mut removed = 0;
        for targets in self.0.values_mut() {
            let before = targets.len();
            targets.retain(|t| t != target);
            removed += before - targets.len();
        }
        self.0.retain(|_, targets| !targets.is_empty());
        removed
    }

    #[must_use]
    pub fn contains(&self, link_type: &LinkType, target: &str) -> bool {
        self.0
            .get(link_type)
            .is_some_and(|targets| targets.iter().any(|t| t == target))
    }

    #[must_use]
    pub fn targets(&self, link_type: &LinkType) -> &[String] {
        self.0.get(link_type).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.targets(&LinkType::Parent).first().map(String::as_str)
    }

    /// Iterate over every `(link type, target)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&LinkType, &str)> {
        self.0
            .iter()
            .flat_map(|(link_type, targets)| targets.iter().map(move |t| (link_type, t.as_str())))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Links {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Links {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<BTreeMap<LinkType, TargetsRepr>>::deserialize(deserializer)?;
        let mut links = Self::new();
        for (link_type, targets) in raw.unwrap_or_default() {
            let targets = match targets {
                TargetsRepr::One(target) => vec![target],
                TargetsRepr::Many(targets) => targets,
            };
            for target in targets {
                let target = target.trim();
                if !target.is_empty() {
                    links.add(link_type.clone(), target);
                }
            }
        }
        Ok(links)
    }
}

/// A single tracked issue, persisted as one markdown file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Unique id (from the filename).
    pub id: String,

    /// Human-readable filename part, derived from the title.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub slug: String,

    /// Path relative to the store root (e.g. "epic-auth/abc1--login.md").
    pub path: PathBuf,

    pub title: String,
    pub status: String,

    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub record_type: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub priority: String,

    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    #[serde(skip_serializing_if = "Links::is_empty")]
    pub links: Links,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Create a bare record with an id and title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// An edge pointing at a bean, as recorded in the reverse-link index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IncomingLink {
    pub source: String,
    pub link_type: LinkType,
}

impl IncomingLink {
    #[must_use]
    pub fn new(source: impl Into<String>, link_type: LinkType) -> Self {
        Self {
            source: source.into(),
            link_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_type_parse() {
        assert_eq!("Parent".parse::<LinkType>().unwrap(), LinkType::Parent);
        assert_eq!("related".parse::<LinkType>().unwrap(), LinkType::Relates);
        assert_eq!(
            "follows".parse::<LinkType>().unwrap(),
            LinkType::Custom("follows".to_string())
        );
        assert!("  ".parse::<LinkType>().is_err());
    }

    #[test]
    fn test_hierarchical_types() {
        assert!(LinkType::Parent.is_hierarchical());
        assert!(LinkType::Blocks.is_hierarchical());
        assert!(!LinkType::Relates.is_hierarchical());
        assert!(!LinkType::Custom("x".into()).is_hierarchical());
    }

    #[test]
    fn test_links_add_is_idempotent() {
        let mut links = Links::new();
        assert!(links.add(LinkType::Blocks, "b"));
        assert!(!links.add(LinkType::Blocks, "b"));
        assert!(links.add(LinkType::Blocks, "c"));
        assert_eq!(links.targets(&LinkType::Blocks), ["b", "c"]);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_links_remove_drops_empty_types() {
        let mut links = Links::new();
        links.add(LinkType::Parent, "p");
        assert!(!links.remove(&LinkType::Parent, "other"));
        assert!(links.remove(&LinkType::Parent, "p"));
        assert!(links.is_empty());
    }

    #[test]
    fn test_links_remove_target_across_types() {
        let mut links = Links::new();
        links.add(LinkType::Relates, "x");
        links.add(LinkType::Blocks, "x");
        links.add(LinkType::Blocks, "y");
        assert_eq!(links.remove_target("x"), 2);
        assert_eq!(links.iter().collect::<Vec<_>>(), vec![(&LinkType::Blocks, "y")]);
    }

    #[test]
    fn test_links_accept_scalar_or_list() {
        let yaml = "parent: abc\nblocks:\n  - d1\n  - d2\n  - d1\n";
        let links: Links = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(links.parent(), Some("abc"));
        assert_eq!(links.targets(&LinkType::Blocks), ["d1", "d2"]);
    }
}
