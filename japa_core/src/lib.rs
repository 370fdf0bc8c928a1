#![forbid(unsafe_code)]

//! Core domain model and counting logic for the japa mantra counter.
//!
//! This crate provides:
//! - Domain types (mantras, application state, language)
//! - Counter engine (tap, step back, cycle completion, day rollover)
//! - Persistence (locked, atomic JSON state file)
//! - Session boundary (authoritative state, save-after-every-action)
//! - CSV statistics export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod engine;
pub mod state;
pub mod session;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use engine::{apply, Action, TapOutcome, Transition};
pub use state::{JsonFileStore, MemoryStore, StateStore};
pub use session::{Clock, CycleFeedback, Dispatched, FixedClock, JapaSession, LocalClock, NoFeedback};
pub use export::write_stats_csv;
