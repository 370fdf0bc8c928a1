//! Core domain types for the japa counter.
//!
//! This module defines the data model shared by the engine and persistence:
//! - Mantra identifiers and mantras with their counters
//! - Display language
//! - The process-wide application state

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of taps that make up one completed cycle (one mala).
pub const CYCLE_LENGTH: u32 = 108;

// ============================================================================
// Mantra Types
// ============================================================================

/// Stable identifier of a mantra
///
/// Fresh ids are UUIDv7 strings so that they sort by creation time. Ids
/// written by older versions (any string) are kept as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MantraId(String);

impl MantraId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, creation-ordered id
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for MantraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MantraId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One trackable chant target with its counters
///
/// Field aliases accept the camelCase keys used by earlier state files. A
/// missing or null field reads as zero/empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mantra {
    #[serde(deserialize_with = "null_as_default")]
    pub id: MantraId,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(alias = "currentStep", deserialize_with = "null_as_default")]
    pub current_step: u32,
    #[serde(alias = "todayCounts", deserialize_with = "null_as_default")]
    pub today_count: u64,
    #[serde(alias = "todayMalas", deserialize_with = "null_as_default")]
    pub today_cycles: u64,
    #[serde(alias = "totalLifetimeCounts", deserialize_with = "null_as_default")]
    pub lifetime_count: u64,
    #[serde(alias = "totalLifetimeMalas", deserialize_with = "null_as_default")]
    pub lifetime_cycles: u64,
}

impl Mantra {
    /// Create a mantra with all counters at zero
    ///
    /// The name is stored trimmed. Callers are expected to reject blank names
    /// before getting here.
    pub fn new(id: MantraId, name: &str) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            ..Self::default()
        }
    }

    /// Count one tap. Returns true when the tap completed a cycle.
    pub fn tap(&mut self) -> bool {
        self.today_count += 1;
        self.lifetime_count += 1;
        self.current_step += 1;

        if self.current_step >= CYCLE_LENGTH {
            self.current_step = 0;
            self.today_cycles += 1;
            self.lifetime_cycles += 1;
            return true;
        }
        false
    }

    /// Undo one tap within the current cycle
    ///
    /// Does nothing at step 0. Completed cycles are never taken back, so a
    /// step back right after a cycle completed is a no-op too.
    pub fn step_back(&mut self) {
        if self.current_step == 0 {
            return;
        }
        self.current_step -= 1;
        self.today_count = self.today_count.saturating_sub(1);
        self.lifetime_count = self.lifetime_count.saturating_sub(1);
    }

    /// Abandon the in-progress cycle. Counters are kept.
    pub fn reset_cycle(&mut self) {
        self.current_step = 0;
    }

    /// Zero the daily counters; step and lifetime totals survive.
    pub fn clear_today(&mut self) {
        self.today_count = 0;
        self.today_cycles = 0;
    }

    /// Fraction of the current cycle completed, in `[0, 1)`
    pub fn progress(&self) -> f64 {
        f64::from(self.current_step) / f64::from(CYCLE_LENGTH)
    }
}

// ============================================================================
// Settings Types
// ============================================================================

/// Display language
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "hi" => Ok(Language::Hi),
            other => Err(format!("unknown language code '{}'", other)),
        }
    }
}

// Null or unknown codes in a stored file fall back to English instead of
// invalidating the whole record.
impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(code) = Option::<String>::deserialize(deserializer)? else {
            return Ok(Language::En);
        };
        Ok(code.parse().unwrap_or_else(|e| {
            tracing::warn!("{}, falling back to en", e);
            Language::En
        }))
    }
}

/// Read a null the same way as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Application State
// ============================================================================

/// Process-wide application state, one per installation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppState {
    /// Newest first, unique by id
    pub mantras: Vec<Mantra>,
    pub selected_mantra_id: Option<MantraId>,
    pub sound_enabled: bool,
    pub language: Language,
    pub last_opened: NaiveDate,
}

impl AppState {
    /// First-run state for the given day
    pub fn new(today: NaiveDate) -> Self {
        Self {
            mantras: Vec::new(),
            selected_mantra_id: None,
            sound_enabled: true,
            language: Language::En,
            last_opened: today,
        }
    }

    pub fn mantra(&self, id: &MantraId) -> Option<&Mantra> {
        self.mantras.iter().find(|m| &m.id == id)
    }

    pub fn mantra_mut(&mut self, id: &MantraId) -> Option<&mut Mantra> {
        self.mantras.iter_mut().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &MantraId) -> bool {
        self.mantra(id).is_some()
    }

    pub fn selected_mantra(&self) -> Option<&Mantra> {
        self.selected_mantra_id
            .as_ref()
            .and_then(|id| self.mantra(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mantra_trims_name() {
        let mantra = Mantra::new(MantraId::from("a"), "  Om Namah Shivaya ");
        assert_eq!(mantra.name, "Om Namah Shivaya");
        assert_eq!(mantra.current_step, 0);
        assert_eq!(mantra.lifetime_count, 0);
    }

    #[test]
    fn test_generated_ids_are_unique_and_ordered() {
        let first = MantraId::generate();
        let second = MantraId::generate();
        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn test_step_back_saturates_counts() {
        // Counts can be lower than the step after a day rollover
        let mut mantra = Mantra {
            current_step: 3,
            ..Mantra::new(MantraId::from("a"), "Om")
        };
        mantra.step_back();
        assert_eq!(mantra.current_step, 2);
        assert_eq!(mantra.today_count, 0);
        assert_eq!(mantra.lifetime_count, 0);
    }

    #[test]
    fn test_progress() {
        let mut mantra = Mantra::new(MantraId::from("a"), "Om");
        assert_eq!(mantra.progress(), 0.0);
        for _ in 0..54 {
            mantra.tap();
        }
        assert!((mantra.progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_language_parse_and_lenient_deserialize() {
        assert_eq!("hi".parse::<Language>().unwrap(), Language::Hi);
        assert_eq!(" EN ".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());

        let lang: Language = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(lang, Language::En);
        let lang: Language = serde_json::from_str("null").unwrap();
        assert_eq!(lang, Language::En);
        assert_eq!(serde_json::to_string(&Language::Hi).unwrap(), "\"hi\"");
    }

    #[test]
    fn test_mantra_accepts_legacy_keys() {
        let json = r#"{
            "id": "1700000000000",
            "name": "Om",
            "totalLifetimeCounts": 500,
            "totalLifetimeMalas": 4,
            "todayCounts": 20,
            "todayMalas": 0,
            "currentStep": 20
        }"#;
        let mantra: Mantra = serde_json::from_str(json).unwrap();
        assert_eq!(mantra.id.as_str(), "1700000000000");
        assert_eq!(mantra.lifetime_count, 500);
        assert_eq!(mantra.lifetime_cycles, 4);
        assert_eq!(mantra.today_count, 20);
        assert_eq!(mantra.current_step, 20);
    }

    #[test]
    fn test_mantra_null_fields_read_as_zero() {
        let json = r#"{"id": "a", "name": "Om", "todayCounts": null, "totalLifetimeCounts": 9}"#;
        let mantra: Mantra = serde_json::from_str(json).unwrap();
        assert_eq!(mantra.today_count, 0);
        assert_eq!(mantra.lifetime_count, 9);
    }
}
