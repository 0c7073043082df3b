//! ID generation and filename encoding for beans.
//!
//! IDs are short random strings drawn from a base36 alphabet, optionally
//! prefixed (e.g. `beans-a1b2`). Files are named `<id>--<slug>.md`; older
//! `<id>.<slug>.md` and `<id>-<slug>.md` names are still understood.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::error::{BeansError, Result};

/// Default symbol set for generated IDs.
pub const DEFAULT_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Default number of random symbols per ID.
pub const DEFAULT_ID_LENGTH: usize = 4;

/// Extension of bean files, without the dot.
pub const FILE_EXTENSION: &str = "md";

/// Separator between ID and slug in canonical filenames.
pub const SLUG_SEPARATOR: &str = "--";

/// Slug written for a slugless bean whose ID contains `-` or `.`.
pub const FALLBACK_SLUG: &str = "untitled";

const MAX_SLUG_LENGTH: usize = 50;

static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new("-+").expect("valid regex"));

/// ID generation configuration.
#[derive(Debug, Clone)]
pub struct IdConfig {
    /// Prepended verbatim to every ID (e.g. "beans-").
    pub prefix: String,
    /// Symbols to draw from.
    pub alphabet: String,
    /// Number of random symbols.
    pub length: usize,
    /// Candidates to try before giving up on a crowded ID space.
    pub max_attempts: usize,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            alphabet: DEFAULT_ALPHABET.to_string(),
            length: DEFAULT_ID_LENGTH,
            max_attempts: 1000,
        }
    }
}

impl IdConfig {
    /// Create a new ID config with the given prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }
}

/// ID generator that produces unique bean IDs.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    config: IdConfig,
}

impl IdGenerator {
    /// Create a new ID generator with the given config.
    #[must_use]
    pub const fn new(config: IdConfig) -> Self {
        Self { config }
    }

    /// Create a new ID generator with default config.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(IdConfig::default())
    }

    /// Get the configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Draw a single candidate without collision checking.
    ///
    /// # Errors
    ///
    /// Returns `EmptyAlphabet` if the configured alphabet has no symbols.
    pub fn generate_candidate(&self) -> Result<String> {
        generate(&self.config.alphabet, self.config.length, &self.config.prefix)
    }

    /// Generate an ID, checking for collisions with the provided checker.
    ///
    /// The checker function should return `true` if the ID already exists.
    ///
    /// # Errors
    ///
    /// Returns `EmptyAlphabet` for an unusable alphabet, or
    /// `IdSpaceExhausted` if every attempt collided.
    pub fn generate<F>(&self, exists: F) -> Result<String>
    where
        F: Fn(&str) -> bool,
    {
        for attempt in 0..self.config.max_attempts {
            let id = self.generate_candidate()?;
            if !exists(&id) {
                return Ok(id);
            }
            tracing::debug!(id = %id, attempt, "ID collision, regenerating");
        }
        Err(BeansError::IdSpaceExhausted {
            attempts: self.config.max_attempts,
        })
    }
}

/// Draw `length` symbols uniformly from `alphabet` and append them to
/// `prefix`.
///
/// # Errors
///
/// Returns `EmptyAlphabet` if `alphabet` is empty.
pub fn generate(alphabet: &str, length: usize, prefix: &str) -> Result<String> {
    let symbols: Vec<char> = alphabet.chars().collect();
    if symbols.is_empty() {
        return Err(BeansError::EmptyAlphabet);
    }

    let mut rng = rand::rng();
    let mut id = String::with_capacity(prefix.len() + length);
    id.push_str(prefix);
    for _ in 0..length {
        id.push(symbols[rng.random_range(0..symbols.len())]);
    }
    Ok(id)
}

/// Slug to write for `id`. An ID containing `-` or `.` always gets a slug,
/// otherwise `decode_filename` would split the ID itself.
#[must_use]
pub fn effective_slug<'a>(id: &str, slug: &'a str) -> &'a str {
    if slug.is_empty() && id.contains(['-', '.']) {
        FALLBACK_SLUG
    } else {
        slug
    }
}

/// Build the canonical filename for an ID and optional slug.
#[must_use]
pub fn encode_filename(id: &str, slug: &str) -> String {
    let slug = effective_slug(id, slug);
    if slug.is_empty() {
        format!("{id}.{FILE_EXTENSION}")
    } else {
        format!("{id}{SLUG_SEPARATOR}{slug}.{FILE_EXTENSION}")
    }
}

/// Return true if the canonical filename for `id` decodes back to `id`.
/// Fails only for IDs containing the `--` separator.
#[must_use]
pub fn filename_preserves_id(id: &str, slug: &str) -> bool {
    decode_filename(&encode_filename(id, slug)).0 == id
}

/// Split a bean filename into `(id, slug)`.
///
/// Accepts, in priority order:
/// - `f7g--user-registration.md` (canonical)
/// - `f7g.user-registration.md` (dot legacy)
/// - `f7g-user-registration.md` (dash legacy)
/// - `f7g.md` (ID only)
///
/// The first separator found wins, so an ID-only name whose ID contains a
/// dash is read as a dash-legacy name.
#[must_use]
pub fn decode_filename(name: &str) -> (String, String) {
    let stem = strip_extension(name);

    if let Some(idx) = stem.find(SLUG_SEPARATOR).filter(|&idx| idx > 0) {
        return (
            stem[..idx].to_string(),
            stem[idx + SLUG_SEPARATOR.len()..].to_string(),
        );
    }

    if let Some(idx) = stem.find('.').filter(|&idx| idx > 0) {
        return (stem[..idx].to_string(), stem[idx + 1..].to_string());
    }

    match stem.split_once('-') {
        Some((id, slug)) => (id.to_string(), slug.to_string()),
        None => (stem.to_string(), String::new()),
    }
}

/// Which naming convention a filename follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameForm {
    Canonical,
    DotLegacy,
    DashLegacy,
    IdOnly,
}

impl FilenameForm {
    #[must_use]
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::DotLegacy | Self::DashLegacy)
    }
}

/// Classify a filename by the separator `decode_filename` would split on.
#[must_use]
pub fn filename_form(name: &str) -> FilenameForm {
    let stem = strip_extension(name);
    if stem.find(SLUG_SEPARATOR).is_some_and(|idx| idx > 0) {
        FilenameForm::Canonical
    } else if stem.find('.').is_some_and(|idx| idx > 0) {
        FilenameForm::DotLegacy
    } else if stem.contains('-') {
        FilenameForm::DashLegacy
    } else {
        FilenameForm::IdOnly
    }
}

/// Compute the canonical path for a legacy-named file, keeping its
/// directory. Returns `None` when no rename is needed.
#[must_use]
pub fn canonical_rename(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    if !filename_form(name).is_legacy() {
        return None;
    }
    let (id, slug) = decode_filename(name);
    if slug.is_empty() {
        return None;
    }
    let canonical = encode_filename(&id, &slug);
    (canonical != name).then(|| path.with_file_name(canonical))
}

/// Convert a title to a filename-friendly slug.
#[must_use]
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase().replace([' ', '_'], "-");
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();
    let collapsed = DASH_RUNS.replace_all(&kept, "-");
    let trimmed = collapsed.trim_matches('-');

    if trimmed.chars().count() > MAX_SLUG_LENGTH {
        let truncated: String = trimmed.chars().take(MAX_SLUG_LENGTH).collect();
        truncated.trim_end_matches('-').to_string()
    } else {
        trimmed.to_string()
    }
}

/// Return true if the path names a bean file.
#[must_use]
pub fn is_bean_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FILE_EXTENSION)
}

fn strip_extension(name: &str) -> &str {
    name.strip_suffix(".md").unwrap_or(name)
}
