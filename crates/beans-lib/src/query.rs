//! Query and filter types for bean operations.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::BeansError;
use crate::model::Record;

/// Fields to update on a bean.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    pub title: Option<String>,
    pub status: Option<String>,
    pub record_type: Option<String>,
    pub priority: Option<String>,
    pub body: Option<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

impl RecordUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.status.is_none()
            && self.record_type.is_none()
            && self.priority.is_none()
            && self.body.is_none()
            && self.add_tags.is_empty()
            && self.remove_tags.is_empty()
    }

    /// Apply the patch to `record`, returning the names of changed fields.
    pub fn apply(&self, record: &mut Record) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if let Some(ref title) = self.title {
            record.title.clone_from(title);
            changed.push("title");
        }
        if let Some(ref status) = self.status {
            record.status.clone_from(status);
            changed.push("status");
        }
        if let Some(ref record_type) = self.record_type {
            record.record_type.clone_from(record_type);
            changed.push("type");
        }
        if let Some(ref priority) = self.priority {
            record.priority.clone_from(priority);
            changed.push("priority");
        }
        if let Some(ref body) = self.body {
            record.body.clone_from(body);
            changed.push("body");
        }
        if !self.add_tags.is_empty() || !self.remove_tags.is_empty() {
            for tag in &self.add_tags {
                record.tags.insert(tag.clone());
            }
            for tag in &self.remove_tags {
                record.tags.remove(tag);
            }
            changed.push("tags");
        }
        changed
    }
}

/// Sort key for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Id,
    Title,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl FromStr for SortField {
    type Err = BeansError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "title" => Ok(Self::Title),
            "status" => Ok(Self::Status),
            "created" | "created_at" | "created-at" => Ok(Self::CreatedAt),
            "updated" | "updated_at" | "updated-at" => Ok(Self::UpdatedAt),
            other => Err(BeansError::validation(
                "sort",
                format!("unknown sort field '{other}' (id, title, status, created, updated)"),
            )),
        }
    }
}

/// Filter options for listing beans.
#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    pub statuses: Option<Vec<String>>,
    pub types: Option<Vec<String>>,
    pub priorities: Option<Vec<String>>,
    /// All specified tags must be present.
    pub tags: Option<Vec<String>>,
    pub title_contains: Option<String>,
    pub limit: Option<usize>,
    pub sort: SortField,
    pub reverse: bool,
}

impl ListFilters {
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(ref statuses) = self.statuses {
            if !statuses.iter().any(|s| s == &record.status) {
                return false;
            }
        }
        if let Some(ref types) = self.types {
            if !types.iter().any(|t| t == &record.record_type) {
                return false;
            }
        }
        if let Some(ref priorities) = self.priorities {
            if !priorities.iter().any(|p| p == &record.priority) {
                return false;
            }
        }
        if let Some(ref tags) = self.tags {
            if !tags.iter().all(|t| record.has_tag(t)) {
                return false;
            }
        }
        if let Some(ref needle) = self.title_contains {
            if !record
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }

    /// Order two records by the configured sort field, ties broken by id.
    #[must_use]
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let primary = match self.sort {
            SortField::Id => Ordering::Equal,
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Status => a.status.cmp(&b.status),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        if self.reverse {
            ordering.reverse()
        } else {
            ordering
        }
    }
}
