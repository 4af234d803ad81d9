//! Whole-collection persistence for every record kind.
//!
//! Each kind lives in one collection. Every mutation loads the entire
//! collection, edits it in memory and writes the entire collection back.
//!
//! Layout (file backend):
//!   .sprint/data/stories.json          `{"version": 1, "records": [...]}`
//!   .sprint/data/sprints.json
//!   .sprint/data/activities.json       newest first, capped at 100
//!   .sprint/data/standups.json
//!   .sprint/data/retrospectives.json
//!   .sprint/data/burndown.json
//!
//! There is no locking and no write-ahead log. Two processes mutating the
//! same collection race and the last whole-file write wins; the store is
//! only sound for one process driven by one user at a time.

use crate::activity::{self, Activity, ActivityKind};
use crate::error::{Result, SprintError};
use crate::{io, paths};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Version written into every data file.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Kind / Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Stories,
    Sprints,
    Activities,
    Standups,
    Retrospectives,
    Burndown,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Stories,
        Kind::Sprints,
        Kind::Activities,
        Kind::Standups,
        Kind::Retrospectives,
        Kind::Burndown,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Kind::Stories => "stories.json",
            Kind::Sprints => "sprints.json",
            Kind::Activities => "activities.json",
            Kind::Standups => "standups.json",
            Kind::Retrospectives => "retrospectives.json",
            Kind::Burndown => "burndown.json",
        }
    }

    /// Singular noun used in activity descriptions.
    pub fn noun(self) -> &'static str {
        match self {
            Kind::Stories => "story",
            Kind::Sprints => "sprint",
            Kind::Activities => "activity",
            Kind::Standups => "standup",
            Kind::Retrospectives => "retrospective",
            Kind::Burndown => "burndown snapshot",
        }
    }

    /// Activity tag for saves and deletes of this kind; `None` keeps the
    /// kind out of the activity log.
    pub fn activity_kind(self) -> Option<ActivityKind> {
        match self {
            Kind::Stories => Some(ActivityKind::Story),
            Kind::Sprints => Some(ActivityKind::Sprint),
            Kind::Standups => Some(ActivityKind::Standup),
            Kind::Retrospectives => Some(ActivityKind::Retrospective),
            Kind::Activities | Kind::Burndown => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// A value stored in one of the collections.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: Kind;

    /// Unique key within the collection.
    fn id(&self) -> &str;

    /// Human-readable name used in activity entries.
    fn display_name(&self) -> String {
        self.id().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saved {
    Created,
    Updated,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Loads and replaces whole collections. Backends know nothing about
/// individual records; the [`Store`] does the upsert/filter work.
pub trait Backend {
    /// Current contents of `kind`, empty when nothing has been written yet.
    fn load(&self, kind: Kind) -> Result<Vec<Value>>;

    /// Replace the contents of `kind` with `records`.
    fn persist(&self, kind: Kind, records: Vec<Value>) -> Result<()>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    records: &'a [Value],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCollection {
    Versioned { version: u32, records: Vec<Value> },
    Legacy(Vec<Value>),
}

/// One pretty-printed JSON file per kind under `.sprint/data/`.
#[derive(Debug, Clone)]
pub struct JsonFiles {
    root: PathBuf,
}

impl JsonFiles {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn path_for(&self, kind: Kind) -> PathBuf {
        paths::collection_path(&self.root, kind.file_name())
    }

    /// Write an empty collection for every kind that has no file yet.
    /// Returns the paths that were created.
    pub fn create_missing(&self) -> Result<Vec<PathBuf>> {
        let empty = serde_json::to_string_pretty(&EnvelopeRef {
            version: FORMAT_VERSION,
            records: &[],
        })?;
        let mut created = Vec::new();
        for kind in Kind::ALL {
            let path = self.path_for(kind);
            if io::write_if_missing(&path, empty.as_bytes())? {
                created.push(path);
            }
        }
        Ok(created)
    }
}

impl Backend for JsonFiles {
    fn load(&self, kind: Kind) -> Result<Vec<Value>> {
        let Some(content) = io::read_optional(&self.path_for(kind))? else {
            return Ok(Vec::new());
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let stored: StoredCollection =
            serde_json::from_str(&content).map_err(|source| SprintError::CorruptCollection {
                kind: kind.to_string(),
                source,
            })?;
        match stored {
            StoredCollection::Versioned { version, .. } if version > FORMAT_VERSION => {
                Err(SprintError::UnsupportedVersion {
                    kind: kind.to_string(),
                    found: version,
                    supported: FORMAT_VERSION,
                })
            }
            StoredCollection::Versioned { records, .. } => Ok(records),
            StoredCollection::Legacy(records) => Ok(records),
        }
    }

    fn persist(&self, kind: Kind, records: Vec<Value>) -> Result<()> {
        let envelope = EnvelopeRef {
            version: FORMAT_VERSION,
            records: &records,
        };
        let data = serde_json::to_string_pretty(&envelope)?;
        let path = self.path_for(kind);
        io::atomic_write(&path, data.as_bytes())?;
        tracing::debug!(kind = %kind, count = records.len(), path = %path.display(), "wrote collection");
        Ok(())
    }
}

/// Process-local collections, used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct InMemory {
    collections: Mutex<HashMap<Kind, Vec<Value>>>,
}

impl Backend for InMemory {
    fn load(&self, kind: Kind) -> Result<Vec<Value>> {
        let guard = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.get(&kind).cloned().unwrap_or_default())
    }

    fn persist(&self, kind: Kind, records: Vec<Value>) -> Result<()> {
        let mut guard = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(kind, records);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Typed access to the collections of a [`Backend`].
#[derive(Debug)]
pub struct Store<B = JsonFiles> {
    backend: B,
}

impl Store<JsonFiles> {
    /// File-backed store rooted at a project directory.
    pub fn open(root: &Path) -> Self {
        Self::with_backend(JsonFiles::new(root))
    }
}

impl Store<InMemory> {
    pub fn in_memory() -> Self {
        Self::with_backend(InMemory::default())
    }
}

impl<B: Backend> Store<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn load_typed<R: Record>(&self) -> Result<Vec<R>> {
        self.backend
            .load(R::KIND)?
            .into_iter()
            .map(|value| {
                serde_json::from_value(value).map_err(|source| SprintError::CorruptCollection {
                    kind: R::KIND.to_string(),
                    source,
                })
            })
            .collect()
    }

    fn persist_typed<R: Record>(&self, records: &[R]) -> Result<()> {
        let values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.backend.persist(R::KIND, values)
    }

    /// Upsert `record`: replace in place when the id exists, append otherwise.
    pub fn save<R: Record>(&self, record: &R) -> Result<Saved>
    where
        R: Clone,
    {
        let mut records: Vec<R> = self.load_typed()?;
        let outcome = match records.iter().position(|r| r.id() == record.id()) {
            Some(pos) => {
                records[pos] = record.clone();
                Saved::Updated
            }
            None => {
                records.push(record.clone());
                Saved::Created
            }
        };
        self.persist_typed(&records)?;

        let verb = match outcome {
            Saved::Created => "Created",
            Saved::Updated => "Updated",
        };
        self.log(
            R::KIND,
            format!("{verb} {}: {}", R::KIND.noun(), record.display_name()),
        );
        Ok(outcome)
    }

    pub fn get<R: Record>(&self, id: &str) -> Result<Option<R>> {
        Ok(self.load_typed::<R>()?.into_iter().find(|r| r.id() == id))
    }

    pub fn list<R: Record>(&self) -> Result<Vec<R>> {
        self.load_typed()
    }

    /// Like [`Store::list`], but a failed read degrades to an empty
    /// collection with a warning instead of an error.
    pub fn list_or_empty<R: Record>(&self) -> Vec<R> {
        match self.load_typed() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(kind = %R::KIND, error = %e, "treating unreadable collection as empty");
                Vec::new()
            }
        }
    }

    /// Remove the record with `id`. Returns `false` if it was not present.
    pub fn delete<R: Record>(&self, id: &str) -> Result<bool> {
        let mut records: Vec<R> = self.load_typed()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Ok(false);
        }
        self.persist_typed(&records)?;
        self.log(R::KIND, format!("Deleted {}: {id}", R::KIND.noun()));
        Ok(true)
    }

    /// Insert at the head of the activity log and keep the newest 100.
    pub fn append_activity(&self, entry: Activity) -> Result<()> {
        let mut log: Vec<Activity> = self.load_typed()?;
        activity::push_front(&mut log, entry);
        self.persist_typed(&log)
    }

    pub fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>> {
        let mut log: Vec<Activity> = self.load_typed()?;
        log.truncate(limit);
        Ok(log)
    }

    /// Activity logging never fails the write that triggered it.
    fn log(&self, kind: Kind, description: String) {
        let Some(activity_kind) = kind.activity_kind() else {
            return;
        };
        if let Err(e) = self.append_activity(Activity::new(activity_kind, description)) {
            tracing::warn!(error = %e, "failed to record activity");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ACTIVITY_LIMIT;
    use crate::story::Story;
    use crate::types::Priority;
    use tempfile::TempDir;

    fn story(title: &str) -> Story {
        Story::new(title, "desc", "ac", Priority::Medium, Vec::<String>::new())
    }

    #[test]
    fn save_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());
        let s = story("Login flow");
        assert_eq!(store.save(&s).unwrap(), Saved::Created);
        let loaded: Story = store.get(&s.id).unwrap().unwrap();
        assert_eq!(loaded, s);
    }

    #[test]
    fn save_existing_id_replaces_in_place() {
        let store = Store::in_memory();
        let a = story("A");
        let mut b = story("B");
        store.save(&a).unwrap();
        store.save(&b).unwrap();

        b.title = "B renamed".to_string();
        assert_eq!(store.save(&b).unwrap(), Saved::Updated);

        let all: Vec<Story> = store.list().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, a.id);
        assert_eq!(all[1].title, "B renamed");
    }

    #[test]
    fn delete_removes_only_target() {
        let store = Store::in_memory();
        let a = story("A");
        let b = story("B");
        let c = story("C");
        for s in [&a, &b, &c] {
            store.save(s).unwrap();
        }
        assert!(store.delete::<Story>(&b.id).unwrap());
        assert!(!store.delete::<Story>(&b.id).unwrap());

        let all: Vec<Story> = store.list().unwrap();
        assert_eq!(all, vec![a, c]);
    }

    #[test]
    fn missing_file_is_empty_collection() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());
        let all: Vec<Story> = store.list().unwrap();
        assert!(all.is_empty());
        assert!(store.get::<Story>("nope").unwrap().is_none());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());
        let path = store.backend().path_for(Kind::Stories);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            store.list::<Story>(),
            Err(SprintError::CorruptCollection { .. })
        ));
        assert!(store.list_or_empty::<Story>().is_empty());
        // A save must not clobber the unreadable file.
        assert!(store.save(&story("A")).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn legacy_bare_array_is_read_and_upgraded() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());
        let s = story("Legacy");
        let path = store.backend().path_for(Kind::Stories);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, serde_json::to_string(&vec![&s]).unwrap()).unwrap();

        let all: Vec<Story> = store.list().unwrap();
        assert_eq!(all.len(), 1);

        store.save(&story("New")).unwrap();
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], FORMAT_VERSION);
        assert_eq!(raw["records"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn newer_format_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());
        let path = store.backend().path_for(Kind::Sprints);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"version": 99, "records": []}"#).unwrap();
        assert!(matches!(
            store.list::<crate::sprint::Sprint>(),
            Err(SprintError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn saves_and_deletes_are_logged_newest_first() {
        let store = Store::in_memory();
        let mut s = story("Checkout");
        store.save(&s).unwrap();
        s.title = "Checkout v2".to_string();
        store.save(&s).unwrap();
        store.delete::<Story>(&s.id).unwrap();

        let log = store.recent_activities(10).unwrap();
        assert_eq!(log.len(), 3);
        assert!(log[0].description.starts_with("Deleted story"));
        assert_eq!(log[1].description, "Updated story: Checkout v2");
        assert_eq!(log[2].description, "Created story: Checkout");
        assert_eq!(log[2].kind, ActivityKind::Story);
    }

    #[test]
    fn activity_log_is_capped() {
        let store = Store::in_memory();
        for i in 0..(ACTIVITY_LIMIT + 20) {
            store
                .append_activity(Activity::new(ActivityKind::Sprint, format!("n{i}")))
                .unwrap();
        }
        let log = store.recent_activities(usize::MAX).unwrap();
        assert_eq!(log.len(), ACTIVITY_LIMIT);
        assert_eq!(log[0].description, format!("n{}", ACTIVITY_LIMIT + 19));
    }

    #[test]
    fn create_missing_writes_empty_envelopes_once() {
        let dir = TempDir::new().unwrap();
        let files = JsonFiles::new(dir.path());
        assert_eq!(files.create_missing().unwrap().len(), Kind::ALL.len());
        assert!(files.create_missing().unwrap().is_empty());

        let raw = std::fs::read_to_string(files.path_for(Kind::Stories)).unwrap();
        let v: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["version"], FORMAT_VERSION);
        assert!(Store::open(dir.path()).list::<Story>().unwrap().is_empty());
    }
}
