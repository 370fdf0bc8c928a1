//! Application state persistence.
//!
//! The whole state is stored as one JSON record. Loading never fails: a
//! missing, unreadable or corrupt file yields the first-run state, and a
//! record from an earlier day gets its daily counters reset. Saving is
//! atomic (temp file + rename) and stamps the record with the current day.
//! `JsonFileStore` holds an fs2 lock on a sidecar file for its lifetime.

use crate::engine::roll_over;
use crate::types::null_as_default;
use crate::{AppState, Error, Language, Mantra, MantraId, Result, CYCLE_LENGTH};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Storage backend for the application state
pub trait StateStore {
    /// Load the stored state, corrected for days elapsed since it was saved
    ///
    /// May block while another process holds the store.
    fn load(&mut self, today: NaiveDate) -> AppState;

    /// Persist the state, stamping it with `today`
    fn save(&mut self, state: &AppState, today: NaiveDate) -> Result<()>;
}

// ============================================================================
// Stored record format
// ============================================================================

/// On-disk layout of the state
///
/// Every field is optional, and null reads as missing, so that older or
/// partial files still load. The aliases accept the camelCase keys of
/// earlier versions.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct StateRecord {
    #[serde(deserialize_with = "null_as_default")]
    mantras: Vec<Mantra>,
    #[serde(alias = "selectedMantraId")]
    selected_mantra_id: Option<MantraId>,
    #[serde(alias = "soundEnabled", deserialize_with = "lenient_sound")]
    sound_enabled: bool,
    language: Language,
    #[serde(alias = "lastOpenedDate", deserialize_with = "lenient_date")]
    last_opened: Option<NaiveDate>,
}

impl Default for StateRecord {
    fn default() -> Self {
        Self {
            mantras: Vec::new(),
            selected_mantra_id: None,
            sound_enabled: true,
            language: Language::En,
            last_opened: None,
        }
    }
}

impl StateRecord {
    fn from_state(state: &AppState, today: NaiveDate) -> Self {
        Self {
            mantras: state.mantras.clone(),
            selected_mantra_id: state.selected_mantra_id.clone(),
            sound_enabled: state.sound_enabled,
            language: state.language,
            last_opened: Some(today),
        }
    }

    /// Repair whatever the invariants of `AppState` don't allow
    ///
    /// A record without a usable date is treated as coming from an unknown
    /// earlier day, so its daily counters get reset on load.
    fn into_state(self) -> AppState {
        let mut seen = HashSet::new();
        let mut mantras = Vec::with_capacity(self.mantras.len());

        for mut mantra in self.mantras {
            if mantra.id.is_blank() || mantra.name.trim().is_empty() {
                tracing::warn!("Dropping stored mantra without id or name: {:?}", mantra.id);
                continue;
            }
            if !seen.insert(mantra.id.clone()) {
                tracing::warn!("Dropping duplicate stored mantra {}", mantra.id);
                continue;
            }
            if mantra.current_step >= CYCLE_LENGTH {
                tracing::warn!(
                    "Stored step {} of {} out of range, resetting cycle",
                    mantra.current_step,
                    mantra.id
                );
                mantra.current_step = 0;
            }
            mantras.push(mantra);
        }

        let selected_mantra_id = self
            .selected_mantra_id
            .filter(|id| mantras.iter().any(|m| &m.id == id));

        AppState {
            mantras,
            selected_mantra_id,
            sound_enabled: self.sound_enabled,
            language: self.language,
            last_opened: self.last_opened.unwrap_or(NaiveDate::MIN),
        }
    }
}

fn lenient_sound<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!("Ignoring malformed last opened date {:?}: {}", s, e);
            None
        }
    }))
}

/// Parse a stored record and apply the daily rollover
fn restore(contents: &str, today: NaiveDate) -> serde_json::Result<AppState> {
    let record: StateRecord = serde_json::from_str(contents)?;
    Ok(roll_over(record.into_state(), today))
}

fn serialize(state: &AppState, today: NaiveDate) -> Result<String> {
    // Compact JSON; the file is rewritten after every tap
    Ok(serde_json::to_string(&StateRecord::from_state(state, today))?)
}

// ============================================================================
// File persistence
// ============================================================================

impl AppState {
    /// Load state from a file
    ///
    /// Returns the first-run state if the file doesn't exist or can't be
    /// read or parsed; problems are logged, never returned. No locking here:
    /// `JsonFileStore` serializes processes around the whole load/save cycle.
    pub fn load(path: &Path, today: NaiveDate) -> Self {
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Self::new(today);
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(
                    "Failed to read state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Self::new(today);
            }
        };

        match restore(&contents, today) {
            Ok(state) => {
                tracing::debug!("Loaded state with {} mantras from {:?}", state.mantras.len(), path);
                state
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Self::new(today)
            }
        }
    }

    /// Save state to a file
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path, today: NaiveDate) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("state path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        // Temp file in the same directory so the rename stays atomic
        let temp = NamedTempFile::new_in(parent)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(serialize(self, today)?.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;

        // Atomically replace old state file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved state to {:?}", path);
        Ok(())
    }
}

/// State stored in a JSON file on disk
///
/// `load` takes an exclusive lock on `<state file>.lock` and the store keeps
/// it until dropped, so a second process blocks in `load` until this one is
/// done. Its load sees every save made under the previous lock.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Option<File>,
}

impl JsonFileStore {
    /// Create a store for the given state file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: None,
        }
    }

    /// Store at `<data_dir>/state.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("state.json"))
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Block until this store holds the writer lock
    fn acquire(&mut self) -> Result<()> {
        if self.lock.is_some() {
            return Ok(());
        }

        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;

        tracing::debug!("Acquired state lock {:?}", lock_path);
        self.lock = Some(file);
        Ok(())
    }
}

impl Drop for JsonFileStore {
    fn drop(&mut self) {
        if let Some(file) = self.lock.take() {
            let _ = file.unlock();
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&mut self, today: NaiveDate) -> AppState {
        if let Err(e) = self.acquire() {
            tracing::warn!(
                "Unable to lock {:?}: {}. Concurrent runs may overwrite each other.",
                self.lock_path(),
                e
            );
        }
        AppState::load(&self.path, today)
    }

    fn save(&mut self, state: &AppState, today: NaiveDate) -> Result<()> {
        self.acquire()?;
        state.save(&self.path, today)
    }
}

/// State kept as a serialized blob in memory
///
/// Goes through the same record format as the file store; useful for hosts
/// that own their own storage and for tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blob: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing serialized record
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&mut self, today: NaiveDate) -> AppState {
        let Some(blob) = self.blob.as_deref() else {
            tracing::info!("No stored state, using default state");
            return AppState::new(today);
        };
        restore(blob, today).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse stored state: {}. Using defaults.", e);
            AppState::new(today)
        })
    }

    fn save(&mut self, state: &AppState, today: NaiveDate) -> Result<()> {
        self.blob = Some(serialize(state, today)?);
        Ok(())
    }
}
