//! The boundary between the presentation layer and the counter engine.
//!
//! A `JapaSession` owns the one authoritative `AppState`. Each dispatched
//! action runs through the engine, the new state replaces the old one, and
//! only then is it handed to the store. A failed save is logged and
//! otherwise ignored: the in-memory state stays current either way.

use crate::engine::{apply, roll_over, Action};
use crate::{AppState, Mantra, MantraId, StateStore};
use chrono::{Local, NaiveDate};

/// Source of the current calendar day
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Calendar day in the local time zone
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one day
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Receiver of cycle-completion events (bell, vibration, animation)
pub trait CycleFeedback {
    fn cycle_completed(&mut self, mantra: &Mantra, sound_enabled: bool);
}

/// Feedback sink that ignores everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFeedback;

impl CycleFeedback for NoFeedback {
    fn cycle_completed(&mut self, _mantra: &Mantra, _sound_enabled: bool) {}
}

/// What a dispatched action did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispatched {
    pub cycle_completed: bool,
    pub saved: bool,
}

/// Owner of the running application state
pub struct JapaSession<S, C, F> {
    state: AppState,
    store: S,
    clock: C,
    feedback: F,
}

impl<S, C, F> JapaSession<S, C, F>
where
    S: StateStore,
    C: Clock,
    F: CycleFeedback,
{
    /// Load the stored state (rolled over to today) and take ownership of it
    pub fn open(mut store: S, clock: C, feedback: F) -> Self {
        let state = store.load(clock.today());
        tracing::debug!(
            "Session opened with {} mantras on {}",
            state.mantras.len(),
            state.last_opened
        );
        Self {
            state,
            store,
            clock,
            feedback,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply one action, notify feedback, then persist
    ///
    /// If the calendar day changed since the state was loaded, the daily
    /// rollover is applied first.
    pub fn dispatch(&mut self, action: Action) -> Dispatched {
        let today = self.clock.today();
        let current = std::mem::replace(&mut self.state, AppState::new(today));
        let current = roll_over(current, today);

        let transition = apply(current, &action);
        self.state = transition.state;

        if transition.cycle_completed {
            if let Some(mantra) = tapped_mantra(&action).and_then(|id| self.state.mantra(id)) {
                self.feedback
                    .cycle_completed(mantra, self.state.sound_enabled);
            }
        }

        let saved = self.persist(today);
        Dispatched {
            cycle_completed: transition.cycle_completed,
            saved,
        }
    }

    /// Best-effort save; failures are logged only
    fn persist(&mut self, today: NaiveDate) -> bool {
        match self.store.save(&self.state, today) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to save state: {}. Continuing with in-memory state.", e);
                false
            }
        }
    }
}

fn tapped_mantra(action: &Action) -> Option<&MantraId> {
    match action {
        Action::Tap(id) => Some(id),
        _ => None,
    }
}
