//! Counter engine: the state transitions behind every user action.
//!
//! Every operation takes a state snapshot and returns the next one. Nothing
//! here touches the clock, the disk or any feedback device:
//! - Invalid input (blank name, unknown id) is a no-op, never an error
//! - A tap that wraps the step reports the completed cycle to the caller
//! - Stepping back never takes back a completed cycle
//! - Day rollover is a pure comparison against an injected "today"

use crate::{AppState, Language, Mantra, MantraId};
use chrono::NaiveDate;

/// Result of a tap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    /// No mantra with that id; state unchanged
    NotFound,
    /// Tap counted within the current cycle
    Counted,
    /// Tap counted and it finished a cycle
    CycleCompleted,
}

impl TapOutcome {
    pub fn cycle_completed(self) -> bool {
        matches!(self, TapOutcome::CycleCompleted)
    }
}

/// Prepend a new mantra with a freshly generated id
///
/// No-op if `name` is blank after trimming.
pub fn create_mantra(state: AppState, name: &str) -> AppState {
    if name.trim().is_empty() {
        tracing::debug!("Ignoring create with blank mantra name");
        return state;
    }
    create_mantra_with_id(state, MantraId::generate(), name)
}

/// Prepend a new mantra with a caller-chosen id
///
/// No-op if `name` is blank or the id is blank or already taken.
pub fn create_mantra_with_id(mut state: AppState, id: MantraId, name: &str) -> AppState {
    if name.trim().is_empty() || id.is_blank() || state.contains(&id) {
        tracing::debug!("Ignoring create for mantra id {:?}", id);
        return state;
    }

    tracing::info!("Created mantra {} ({})", name.trim(), id);
    state.mantras.insert(0, Mantra::new(id, name));
    state
}

/// Remove a mantra, clearing the selection if it pointed at it
pub fn delete_mantra(mut state: AppState, id: &MantraId) -> AppState {
    let before = state.mantras.len();
    state.mantras.retain(|m| &m.id != id);

    if state.mantras.len() != before {
        tracing::info!("Deleted mantra {}", id);
    }
    if state.selected_mantra_id.as_ref() == Some(id) {
        state.selected_mantra_id = None;
    }
    state
}

/// Select a mantra; an unknown id clears the selection
pub fn select_mantra(mut state: AppState, id: &MantraId) -> AppState {
    state.selected_mantra_id = if state.contains(id) {
        Some(id.clone())
    } else {
        tracing::debug!("Select of unknown mantra {} clears selection", id);
        None
    };
    state
}

/// Count one tap against a mantra
pub fn tap(mut state: AppState, id: &MantraId) -> (AppState, TapOutcome) {
    let outcome = match state.mantra_mut(id) {
        None => TapOutcome::NotFound,
        Some(mantra) => {
            if mantra.tap() {
                tracing::info!(
                    "Completed cycle {} of {} (lifetime {})",
                    mantra.today_cycles,
                    mantra.name,
                    mantra.lifetime_cycles
                );
                TapOutcome::CycleCompleted
            } else {
                TapOutcome::Counted
            }
        }
    };
    (state, outcome)
}

/// Undo one tap within the current cycle
///
/// No-op for an unknown id or at step 0. Cycle counters are left alone even
/// when the previous tap completed a cycle.
pub fn step_back(mut state: AppState, id: &MantraId) -> AppState {
    if let Some(mantra) = state.mantra_mut(id) {
        mantra.step_back();
    }
    state
}

/// Return the in-progress cycle to step 0, keeping all counters
///
/// Confirmation is the caller's job; once invoked the reset is unconditional.
pub fn reset_current_cycle(mut state: AppState, id: &MantraId) -> AppState {
    if let Some(mantra) = state.mantra_mut(id) {
        tracing::info!("Reset cycle of {} at step {}", mantra.name, mantra.current_step);
        mantra.reset_cycle();
    }
    state
}

pub fn toggle_sound(mut state: AppState) -> AppState {
    state.sound_enabled = !state.sound_enabled;
    state
}

pub fn set_language(mut state: AppState, language: Language) -> AppState {
    state.language = language;
    state
}

/// Apply the daily reset if `today` differs from the last opened day
///
/// Zeroes every mantra's today counters and stamps `today`. The current step
/// and lifetime totals carry over, so a cycle in progress survives midnight.
pub fn roll_over(mut state: AppState, today: NaiveDate) -> AppState {
    if state.last_opened == today {
        return state;
    }

    tracing::info!(
        "New day detected ({} -> {}), resetting daily counters",
        state.last_opened,
        today
    );
    for mantra in &mut state.mantras {
        mantra.clear_today();
    }
    state.last_opened = today;
    state
}

// ============================================================================
// Action dispatch
// ============================================================================

/// A user request, as delivered by the presentation layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    CreateMantra { name: String },
    DeleteMantra(MantraId),
    SelectMantra(MantraId),
    Tap(MantraId),
    StepBack(MantraId),
    /// Caller must already hold the user's confirmation
    ResetCurrentCycle(MantraId),
    ToggleSound,
    SetLanguage(Language),
}

/// New state after an action, plus whether a tap finished a cycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: AppState,
    pub cycle_completed: bool,
}

/// Run one action through the engine
pub fn apply(state: AppState, action: &Action) -> Transition {
    let mut cycle_completed = false;

    let state = match action {
        Action::CreateMantra { name } => create_mantra(state, name),
        Action::DeleteMantra(id) => delete_mantra(state, id),
        Action::SelectMantra(id) => select_mantra(state, id),
        Action::Tap(id) => {
            let (state, outcome) = tap(state, id);
            cycle_completed = outcome.cycle_completed();
            state
        }
        Action::StepBack(id) => step_back(state, id),
        Action::ResetCurrentCycle(id) => reset_current_cycle(state, id),
        Action::ToggleSound => toggle_sound(state),
        Action::SetLanguage(language) => set_language(state, *language),
    };

    Transition {
        state,
        cycle_completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CYCLE_LENGTH;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn state_with(names: &[&str]) -> AppState {
        let mut state = AppState::new(day("2024-01-01"));
        for (i, name) in names.iter().enumerate() {
            state = create_mantra_with_id(state, MantraId::new(format!("m{}", i)), name);
        }
        state
    }

    fn tap_n(mut state: AppState, id: &MantraId, n: u32) -> (AppState, u32) {
        let mut completions = 0;
        for _ in 0..n {
            let (next, outcome) = tap(state, id);
            if outcome.cycle_completed() {
                completions += 1;
            }
            state = next;
        }
        (state, completions)
    }

    #[test]
    fn test_create_prepends_with_zero_counters() {
        let state = create_mantra(AppState::new(day("2024-01-01")), "Om");
        let state = create_mantra(state, "  Gayatri  ");

        assert_eq!(state.mantras.len(), 2);
        assert_eq!(state.mantras[0].name, "Gayatri");
        assert_eq!(state.mantras[1].name, "Om");
        assert_eq!(state.mantras[0].current_step, 0);
        assert_eq!(state.mantras[0].lifetime_cycles, 0);
        assert_ne!(state.mantras[0].id, state.mantras[1].id);
        assert_eq!(state.selected_mantra_id, None);
    }

    #[test]
    fn test_create_blank_name_is_noop() {
        let state = state_with(&["Om"]);
        assert_eq!(create_mantra(state.clone(), ""), state);
        assert_eq!(create_mantra(state.clone(), "   "), state);
    }

    #[test]
    fn test_create_with_taken_id_is_noop() {
        let state = state_with(&["Om"]);
        let again = create_mantra_with_id(state.clone(), MantraId::from("m0"), "Other");
        assert_eq!(again, state);
    }

    #[test]
    fn test_full_cycle_of_taps() {
        let state = state_with(&["Om"]);
        let id = MantraId::from("m0");

        let (state, completions) = tap_n(state, &id, CYCLE_LENGTH);
        let mantra = state.mantra(&id).unwrap();

        assert_eq!(completions, 1);
        assert_eq!(mantra.current_step, 0);
        assert_eq!(mantra.today_cycles, 1);
        assert_eq!(mantra.lifetime_cycles, 1);
        assert_eq!(mantra.today_count, u64::from(CYCLE_LENGTH));
        assert_eq!(mantra.lifetime_count, u64::from(CYCLE_LENGTH));
    }

    #[test]
    fn test_cycle_completes_on_the_last_tap_only() {
        let state = state_with(&["Om"]);
        let id = MantraId::from("m0");

        let (state, completions) = tap_n(state, &id, CYCLE_LENGTH - 1);
        assert_eq!(completions, 0);
        assert_eq!(state.mantra(&id).unwrap().current_step, CYCLE_LENGTH - 1);

        let (state, outcome) = tap(state, &id);
        assert_eq!(outcome, TapOutcome::CycleCompleted);
        assert_eq!(state.mantra(&id).unwrap().current_step, 0);
    }

    #[test]
    fn test_om_tapped_110_times() {
        let state = create_mantra(AppState::new(day("2024-01-01")), "Om");
        let id = state.mantras[0].id.clone();

        let (state, _) = tap_n(state, &id, 110);
        let mantra = state.mantra(&id).unwrap();

        assert_eq!(mantra.current_step, 2);
        assert_eq!(mantra.today_cycles, 1);
        assert_eq!(mantra.today_count, 110);
    }

    #[test]
    fn test_tap_only_touches_target() {
        let state = state_with(&["Om", "Ram"]);
        let (state, _) = tap(state, &MantraId::from("m1"));

        assert_eq!(state.mantra(&MantraId::from("m1")).unwrap().today_count, 1);
        assert_eq!(state.mantra(&MantraId::from("m0")).unwrap().today_count, 0);
    }

    #[test]
    fn test_step_back_inverts_tap_within_cycle() {
        let state = state_with(&["Om"]);
        let id = MantraId::from("m0");
        let (state, _) = tap_n(state, &id, 5);

        let (tapped, _) = tap(state.clone(), &id);
        assert_eq!(step_back(tapped, &id), state);
    }

    #[test]
    fn test_step_back_does_not_undo_completed_cycle() {
        let state = state_with(&["Om"]);
        let id = MantraId::from("m0");
        let (state, _) = tap_n(state, &id, CYCLE_LENGTH - 1);

        let (state, outcome) = tap(state, &id);
        assert!(outcome.cycle_completed());

        // Step is now 0, so step back has nothing to undo
        let state = step_back(state, &id);
        let mantra = state.mantra(&id).unwrap();
        assert_eq!(mantra.current_step, 0);
        assert_eq!(mantra.today_cycles, 1);
        assert_eq!(mantra.lifetime_cycles, 1);
        assert_eq!(mantra.today_count, u64::from(CYCLE_LENGTH));
    }

    #[test]
    fn test_step_back_at_zero_is_noop() {
        let state = state_with(&["Om"]);
        assert_eq!(step_back(state.clone(), &MantraId::from("m0")), state);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let state = state_with(&["Om"]);
        let missing = MantraId::from("nope");

        let (tapped, outcome) = tap(state.clone(), &missing);
        assert_eq!(outcome, TapOutcome::NotFound);
        assert_eq!(tapped, state);
        assert_eq!(step_back(state.clone(), &missing), state);
        assert_eq!(reset_current_cycle(state.clone(), &missing), state);
        assert_eq!(delete_mantra(state.clone(), &missing), state);
    }

    #[test]
    fn test_reset_current_cycle_keeps_counters() {
        let state = state_with(&["Om"]);
        let id = MantraId::from("m0");
        let (state, _) = tap_n(state, &id, 150);

        let state = reset_current_cycle(state, &id);
        let mantra = state.mantra(&id).unwrap();
        assert_eq!(mantra.current_step, 0);
        assert_eq!(mantra.today_count, 150);
        assert_eq!(mantra.today_cycles, 1);
        assert_eq!(mantra.lifetime_count, 150);
        assert_eq!(mantra.lifetime_cycles, 1);
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let state = select_mantra(state_with(&["Om", "Ram"]), &MantraId::from("m0"));

        let state = delete_mantra(state, &MantraId::from("m0"));
        assert_eq!(state.mantras.len(), 1);
        assert_eq!(state.selected_mantra_id, None);
    }

    #[test]
    fn test_delete_other_keeps_selection() {
        let state = select_mantra(state_with(&["Om", "Ram"]), &MantraId::from("m0"));

        let state = delete_mantra(state, &MantraId::from("m1"));
        assert_eq!(state.selected_mantra_id, Some(MantraId::from("m0")));
    }

    #[test]
    fn test_select_unknown_clears_selection() {
        let state = select_mantra(state_with(&["Om"]), &MantraId::from("m0"));
        assert_eq!(state.selected_mantra().unwrap().name, "Om");

        let state = select_mantra(state, &MantraId::from("gone"));
        assert_eq!(state.selected_mantra_id, None);
    }

    #[test]
    fn test_toggle_sound_and_language() {
        let state = AppState::new(day("2024-01-01"));
        assert!(state.sound_enabled);

        let state = toggle_sound(state);
        assert!(!state.sound_enabled);
        let state = toggle_sound(state);
        assert!(state.sound_enabled);

        let state = set_language(state, Language::Hi);
        assert_eq!(state.language, Language::Hi);
    }

    #[test]
    fn test_roll_over_resets_today_only() {
        let state = state_with(&["Om", "Ram"]);
        let (state, _) = tap_n(state, &MantraId::from("m0"), 120);
        let (state, _) = tap_n(state, &MantraId::from("m1"), 7);

        let rolled = roll_over(state, day("2024-01-02"));
        assert_eq!(rolled.last_opened, day("2024-01-02"));

        let om = rolled.mantra(&MantraId::from("m0")).unwrap();
        assert_eq!(om.today_count, 0);
        assert_eq!(om.today_cycles, 0);
        assert_eq!(om.current_step, 12);
        assert_eq!(om.lifetime_count, 120);
        assert_eq!(om.lifetime_cycles, 1);

        let ram = rolled.mantra(&MantraId::from("m1")).unwrap();
        assert_eq!(ram.today_count, 0);
        assert_eq!(ram.current_step, 7);
    }

    #[test]
    fn test_roll_over_same_day_is_noop() {
        let state = state_with(&["Om"]);
        let (state, _) = tap_n(state, &MantraId::from("m0"), 3);

        assert_eq!(roll_over(state.clone(), day("2024-01-01")), state);
    }

    #[test]
    fn test_apply_reports_cycle_completion() {
        let state = state_with(&["Om"]);
        let id = MantraId::from("m0");
        let (state, _) = tap_n(state, &id, CYCLE_LENGTH - 1);

        let transition = apply(state, &Action::Tap(id.clone()));
        assert!(transition.cycle_completed);

        let transition = apply(transition.state, &Action::Tap(id));
        assert!(!transition.cycle_completed);
    }

    #[test]
    fn test_apply_dispatches_every_action() {
        let state = AppState::new(day("2024-01-01"));
        let t = apply(state, &Action::CreateMantra { name: "Om".into() });
        let id = t.state.mantras[0].id.clone();

        let t = apply(t.state, &Action::SelectMantra(id.clone()));
        let t = apply(t.state, &Action::Tap(id.clone()));
        let t = apply(t.state, &Action::Tap(id.clone()));
        let t = apply(t.state, &Action::StepBack(id.clone()));
        assert_eq!(t.state.selected_mantra().unwrap().current_step, 1);

        let t = apply(t.state, &Action::ResetCurrentCycle(id.clone()));
        assert_eq!(t.state.selected_mantra().unwrap().current_step, 0);
        assert_eq!(t.state.selected_mantra().unwrap().today_count, 1);

        let t = apply(t.state, &Action::ToggleSound);
        let t = apply(t.state, &Action::SetLanguage(Language::Hi));
        assert!(!t.state.sound_enabled);
        assert_eq!(t.state.language, Language::Hi);

        let t = apply(t.state, &Action::DeleteMantra(id));
        assert!(t.state.mantras.is_empty());
        assert_eq!(t.state.selected_mantra_id, None);
        assert!(!t.cycle_completed);
    }
}
