//! Directory-backed bean graph store.
//!
//! The store owns one immutable [`Snapshot`] (records plus the reverse-link
//! index) behind a lock. A reload builds a fresh snapshot and swaps it in
//! whole; single-record mutations copy the snapshot only while a reader
//! still holds the old one.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use walkdir::{DirEntry, WalkDir};

use crate::codec;
use crate::error::{BeansError, Outcome, Result, Warning};
use crate::id::{self, IdGenerator};
use crate::links::{self, LinkGraph};
use crate::model::{IncomingLink, LinkType, Record};
use crate::query::{ListFilters, RecordUpdate};

/// One consistent view of the store: every record plus the derived
/// target -> incoming links index, tagged with its load generation.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    generation: u64,
    /// Bumped by every in-place change; reset when a load builds a fresh
    /// snapshot.
    revision: u64,
    records: BTreeMap<String, Record>,
    incoming: HashMap<String, Vec<IncomingLink>>,
}

impl Snapshot {
    fn build(generation: u64, records: BTreeMap<String, Record>) -> Self {
        let mut snapshot = Self {
            generation,
            revision: 0,
            records: BTreeMap::new(),
            incoming: HashMap::new(),
        };
        for record in records.into_values() {
            snapshot.upsert(record);
        }
        snapshot.revision = 0;
        snapshot
    }

    /// Load generation this snapshot belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    /// Iterate over all records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Links pointing at `id`, in the order they were indexed.
    #[must_use]
    pub fn find_incoming(&self, id: &str) -> &[IncomingLink] {
        self.incoming.get(id).map_or(&[], Vec::as_slice)
    }

    /// Records matching `filters`, sorted and limited as requested.
    #[must_use]
    pub fn list(&self, filters: &ListFilters) -> Vec<Record> {
        let mut matched: Vec<&Record> = self.iter().filter(|r| filters.matches(r)).collect();
        matched.sort_by(|a, b| filters.compare(a, b));
        if let Some(limit) = filters.limit {
            matched.truncate(limit);
        }
        matched.into_iter().cloned().collect()
    }

    /// Insert or replace a record, keeping the incoming index in step.
    fn upsert(&mut self, record: Record) {
        self.revision = self.revision.wrapping_add(1);
        self.unindex(&record.id);
        for (link_type, target) in record.links.iter() {
            self.incoming
                .entry(target.to_string())
                .or_default()
                .push(IncomingLink::new(record.id.clone(), link_type.clone()));
        }
        self.records.insert(record.id.clone(), record);
    }

    fn remove(&mut self, id: &str) -> Option<Record> {
        self.revision = self.revision.wrapping_add(1);
        self.unindex(id);
        self.records.remove(id)
    }

    /// Drop every index entry whose source is `id`.
    fn unindex(&mut self, id: &str) {
        let Some(old) = self.records.get(id) else {
            return;
        };
        for (_, target) in old.links.iter() {
            if let Some(entries) = self.incoming.get_mut(target) {
                entries.retain(|link| link.source != id);
                if entries.is_empty() {
                    self.incoming.remove(target);
                }
            }
        }
    }
}

impl LinkGraph for Snapshot {
    fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    fn targets(&self, id: &str, link_type: &LinkType) -> &[String] {
        self.records
            .get(id)
            .map_or(&[], |record| record.links.targets(link_type))
    }
}

/// Result of deleting a bean.
#[derive(Debug, Clone)]
pub struct DeleteReport {
    pub record: Record,
    /// Ids of beans whose links to the deleted bean were stripped.
    pub updated_sources: Vec<String>,
    /// Total number of link pairs removed from other beans.
    pub removed_links: usize,
}

/// A filename migration, relative to the store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub id: String,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Bean store rooted at a directory of markdown files.
///
/// Shared between threads through `Arc`; every method takes `&self`.
pub struct GraphStore {
    root: PathBuf,
    state: RwLock<Arc<Snapshot>>,
}

impl GraphStore {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create an empty store for `root`. Nothing is read until [`load`].
    ///
    /// [`load`]: GraphStore::load
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Create a store and load it.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be scanned.
    pub fn open(root: impl Into<PathBuf>) -> Result<Outcome<Self>> {
        let store = Self::new(root);
        let loaded = store.load()?;
        Ok(loaded.map(|_| store))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the root directory and replace the current snapshot.
    ///
    /// Unreadable or malformed files are skipped and reported as warnings;
    /// when two files carry the same id the first in sorted path order wins.
    /// Returns the number of records loaded.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the root directory does not exist or is not a
    /// directory.
    pub fn load(&self) -> Result<Outcome<usize>> {
        let meta = fs::metadata(&self.root)?;
        if !meta.is_dir() {
            return Err(BeansError::Config(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let seen = self.version();
        let (mut records, mut warnings) = self.scan();

        let mut state = self.state.write();
        if (state.generation, state.revision) != seen {
            // A write committed while the directory was being read; scan
            // again with writers held off so it is not reverted.
            tracing::debug!("Store changed during scan, rescanning");
            (records, warnings) = self.scan();
        }

        let count = records.len();
        let generation = state.generation + 1;
        *state = Arc::new(Snapshot::build(generation, records));
        drop(state);

        tracing::info!(count, generation, warnings = warnings.len(), "Loaded beans");
        Ok(Outcome::with_warnings(count, warnings))
    }

    fn version(&self) -> (u64, u64) {
        let state = self.state.read();
        (state.generation, state.revision)
    }

    /// Read every bean file under the root.
    fn scan(&self) -> (BTreeMap<String, Record>, Vec<Warning>) {
        let mut records: BTreeMap<String, Record> = BTreeMap::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable entry");
                    warnings.push(Warning::UnreadableFile {
                        path,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || !id::is_bean_file(entry.path()) {
                continue;
            }

            match self.read_entry(&entry) {
                Ok(record) => {
                    if let Some(kept) = records.get(&record.id) {
                        tracing::warn!(id = %record.id, path = %record.path.display(), "Duplicate bean id");
                        warnings.push(Warning::DuplicateId {
                            id: record.id.clone(),
                            path: record.path,
                            kept: kept.path.clone(),
                        });
                        continue;
                    }
                    tracing::debug!(id = %record.id, path = %record.path.display(), "Loaded bean");
                    records.insert(record.id.clone(), record);
                }
                Err(err) => {
                    tracing::warn!(path = %entry.path().display(), error = %err, "Skipping bean file");
                    warnings.push(Warning::UnreadableFile {
                        path: self.relative(entry.path()),
                        reason: err.to_string(),
                    });
                }
            }
        }

        (records, warnings)
    }

    fn read_entry(&self, entry: &DirEntry) -> Result<Record> {
        let name = entry.file_name().to_string_lossy();
        let (id, slug) = id::decode_filename(&name);
        if id.is_empty() {
            return Err(BeansError::Decode {
                reason: "filename has no id".to_string(),
            });
        }

        let bytes = fs::read(entry.path())?;
        let mut record = codec::decode(&bytes)?;
        record.id = id;
        record.slug = slug;
        record.path = self.relative(entry.path());
        Ok(record)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Current snapshot. It stays unchanged for as long as it is held.
    #[must_use]
    pub fn all(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state.read())
    }

    /// Look up a bean by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no bean has this id.
    pub fn get(&self, id: &str) -> Result<Record> {
        self.state
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| BeansError::NotFound { id: id.to_string() })
    }

    /// Links pointing at `id` as `(source, link type)` pairs.
    #[must_use]
    pub fn find_incoming(&self, id: &str) -> Vec<IncomingLink> {
        self.state.read().find_incoming(id).to_vec()
    }

    #[must_use]
    pub fn list(&self, filters: &ListFilters) -> Vec<Record> {
        self.state.read().list(filters)
    }

    /// Absolute path of a bean's file.
    #[must_use]
    pub fn file_path(&self, record: &Record) -> PathBuf {
        self.root.join(&record.path)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Write `record` to its canonical file and update the snapshot.
    ///
    /// The write target is `<dir>/<id>--<slug>.md`, where `<dir>` is the
    /// directory of the record's current path. A file under a different
    /// name is left in place. Returns the record as stored.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty id or a path escaping the root,
    /// and `Io`/`Yaml` if the file cannot be written.
    pub fn save(&self, record: &Record) -> Result<Record> {
        let mut state = self.state.write();
        self.commit(Arc::make_mut(&mut state), record.clone())
    }

    /// Create a bean from `draft` with a fresh id.
    ///
    /// The draft's `id` is ignored and its `path`, if set, names the
    /// directory (relative to the root) to create the file in. Links are
    /// added one by one through the link rules, so a draft parent that does
    /// not exist produces a dangling-link warning.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty title, `IdSpaceExhausted` when no
    /// free id can be found, link rule errors, or `Io` on write failure.
    pub fn create(&self, draft: Record, generator: &IdGenerator) -> Result<Outcome<Record>> {
        if draft.title.trim().is_empty() {
            return Err(BeansError::validation("title", "cannot be empty"));
        }

        let mut state = self.state.write();
        let id = generator.generate(|candidate| state.contains(candidate))?;
        let now = Utc::now();

        let slug = if draft.slug.is_empty() {
            id::slugify(&draft.title)
        } else {
            draft.slug
        };
        let slug = id::effective_slug(&id, &slug).to_string();
        let path = draft.path.join(id::encode_filename(&id, &slug));

        let mut record = Record {
            id,
            slug,
            path,
            title: draft.title,
            status: draft.status,
            record_type: draft.record_type,
            priority: draft.priority,
            tags: draft.tags,
            body: draft.body,
            created_at: Some(draft.created_at.unwrap_or(now)),
            updated_at: Some(draft.updated_at.unwrap_or(now)),
            ..Default::default()
        };

        let mut warnings = Vec::new();
        for (link_type, target) in draft.links.iter() {
            warnings.extend(links::add_link(
                &mut record,
                link_type.clone(),
                target,
                &**state,
            )?);
        }

        let stored = self.commit(Arc::make_mut(&mut state), record)?;
        tracing::info!(id = %stored.id, path = %stored.path.display(), "Created bean");
        Ok(Outcome::with_warnings(stored, warnings))
    }

    /// Apply a field patch to a bean and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the bean does not exist, or `Io` on write
    /// failure.
    pub fn update(&self, id: &str, update: &RecordUpdate) -> Result<Record> {
        let mut state = self.state.write();
        let mut record = state
            .get(id)
            .cloned()
            .ok_or_else(|| BeansError::NotFound { id: id.to_string() })?;

        let changed = update.apply(&mut record);
        if changed.is_empty() {
            return Ok(record);
        }
        record.updated_at = Some(Utc::now());

        tracing::debug!(id, fields = ?changed, "Updating bean");
        self.commit_replacing(Arc::make_mut(&mut state), record)
    }

    /// Add `id --link_type--> target` after checking the link rules.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown source, the link rule errors
    /// (`SelfLink`, `DuplicateParent`, `LinkCycle`), or `Io` on write
    /// failure.
    pub fn link(&self, id: &str, link_type: LinkType, target: &str) -> Result<Outcome<Record>> {
        let mut state = self.state.write();
        let mut record = state
            .get(id)
            .cloned()
            .ok_or_else(|| BeansError::NotFound { id: id.to_string() })?;

        let before = record.links.clone();
        let warnings = links::add_link(&mut record, link_type, target, &**state)?;
        if record.links == before {
            return Ok(Outcome::with_warnings(record, warnings));
        }
        record.updated_at = Some(Utc::now());

        let stored = self.commit_replacing(Arc::make_mut(&mut state), record)?;
        Ok(Outcome::with_warnings(stored, warnings))
    }

    /// Remove `id --link_type--> target`. A missing pair is not an error.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown source or `Io` on write failure.
    pub fn unlink(&self, id: &str, link_type: &LinkType, target: &str) -> Result<Record> {
        let mut state = self.state.write();
        let mut record = state
            .get(id)
            .cloned()
            .ok_or_else(|| BeansError::NotFound { id: id.to_string() })?;

        if !links::remove_link(&mut record, link_type, target) {
            return Ok(record);
        }
        record.updated_at = Some(Utc::now());
        self.commit_replacing(Arc::make_mut(&mut state), record)
    }

    /// Delete a bean and strip every link pointing at it.
    ///
    /// Each bean that linked to the deleted one is rewritten.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the bean does not exist, or `Io` on a file
    /// failure.
    pub fn delete(&self, id: &str) -> Result<DeleteReport> {
        let mut state = self.state.write();
        let snapshot = Arc::make_mut(&mut state);
        let record = snapshot
            .get(id)
            .cloned()
            .ok_or_else(|| BeansError::NotFound { id: id.to_string() })?;

        match fs::remove_file(self.file_path(&record)) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(id, "Bean file already gone");
            }
            Err(err) => return Err(err.into()),
        }

        let mut sources: Vec<String> = snapshot
            .find_incoming(id)
            .iter()
            .map(|link| link.source.clone())
            .filter(|source| source != id)
            .collect();
        sources.sort();
        sources.dedup();

        snapshot.remove(id);

        let mut removed_links = 0;
        for source in &sources {
            let Some(mut referrer) = snapshot.get(source).cloned() else {
                continue;
            };
            removed_links += referrer.links.remove_target(id);
            referrer.updated_at = Some(Utc::now());
            self.commit_replacing(snapshot, referrer)?;
        }

        tracing::info!(id, sources = sources.len(), removed_links, "Deleted bean");
        Ok(DeleteReport {
            record,
            updated_sources: sources,
            removed_links,
        })
    }

    /// Delete every bean matching `predicate`.
    ///
    /// # Errors
    ///
    /// Stops at the first failed deletion and returns its error.
    pub fn delete_where<F>(&self, predicate: F) -> Result<Vec<DeleteReport>>
    where
        F: Fn(&Record) -> bool,
    {
        let ids: Vec<String> = self
            .all()
            .iter()
            .filter(|record| predicate(record))
            .map(|record| record.id.clone())
            .collect();

        let mut reports = Vec::with_capacity(ids.len());
        for id in ids {
            match self.delete(&id) {
                Ok(report) => reports.push(report),
                Err(BeansError::NotFound { .. }) => {
                    tracing::debug!(id = %id, "Bean vanished before deletion");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(reports)
    }

    /// Rename legacy `<id>.<slug>.md` / `<id>-<slug>.md` files to
    /// `<id>--<slug>.md`. With `dry_run` nothing is touched.
    ///
    /// A rename whose target already exists is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `Io` if a rename fails.
    pub fn migrate_filenames(&self, dry_run: bool) -> Result<Outcome<Vec<Rename>>> {
        let mut state = self.state.write();
        let mut renames = Vec::new();
        let mut warnings = Vec::new();

        let candidates: Vec<(String, PathBuf, PathBuf)> = state
            .iter()
            .filter_map(|record| {
                id::canonical_rename(&record.path)
                    .map(|to| (record.id.clone(), record.path.clone(), to))
            })
            .collect();

        for (id, from, to) in candidates {
            if self.root.join(&to).exists() {
                warnings.push(Warning::RenameSkipped {
                    from,
                    to,
                    reason: "target already exists".to_string(),
                });
                continue;
            }

            if !dry_run {
                fs::rename(self.root.join(&from), self.root.join(&to))?;
                let snapshot = Arc::make_mut(&mut state);
                if let Some(mut record) = snapshot.get(&id).cloned() {
                    record.path.clone_from(&to);
                    snapshot.upsert(record);
                }
                tracing::info!(id = %id, from = %from.display(), to = %to.display(), "Renamed bean file");
            }
            renames.push(Rename { id, from, to });
        }

        Ok(Outcome::with_warnings(renames, warnings))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Write `record` to its canonical path and store it in `snapshot`.
    fn commit(&self, snapshot: &mut Snapshot, mut record: Record) -> Result<Record> {
        if record.id.trim().is_empty() {
            return Err(BeansError::validation("id", "cannot be empty"));
        }
        if !id::filename_preserves_id(&record.id, &record.slug) {
            return Err(BeansError::validation(
                "id",
                format!("{} cannot be stored in a filename", record.id),
            ));
        }
        if !is_contained(&record.path) {
            return Err(BeansError::validation(
                "path",
                format!("{} is outside the beans directory", record.path.display()),
            ));
        }

        record.path = canonical_path(&record);
        let contents = codec::encode(&record)?;
        write_atomic(&self.root.join(&record.path), &contents)?;
        tracing::debug!(id = %record.id, path = %record.path.display(), "Wrote bean");

        snapshot.upsert(record.clone());
        Ok(record)
    }

    /// Like [`commit`](Self::commit), but removes the previous file when the
    /// canonical name differs so the id stays backed by one file.
    fn commit_replacing(&self, snapshot: &mut Snapshot, record: Record) -> Result<Record> {
        let previous = record.path.clone();
        let stored = self.commit(snapshot, record)?;
        if !previous.as_os_str().is_empty() && previous != stored.path {
            match fs::remove_file(self.root.join(&previous)) {
                Ok(()) => {
                    tracing::debug!(from = %previous.display(), to = %stored.path.display(), "Replaced bean file");
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(stored)
    }
}

fn canonical_path(record: &Record) -> PathBuf {
    let name = id::encode_filename(&record.id, &record.slug);
    match record.path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Write through a hidden temp file in the same directory, then rename.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let name = path
        .file_name()
        .map_or_else(|| "bean".into(), |name| name.to_string_lossy());
    let tmp = parent.join(format!(".{name}.tmp"));

    fs::write(&tmp, contents)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}
