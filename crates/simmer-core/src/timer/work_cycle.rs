//! Work/break alternator.
//!
//! ## State Transitions
//!
//! ```text
//! Work -> Break -> Work -> ...      (no terminal state)
//! ```
//!
//! Each completed work phase counts one round (a "session" in pomodoro
//! terms). When the count reaches `WorkRules::rounds`:
//!
//! - pomodoro takes its long break instead of the short one;
//! - every ruleset schedules the counter to clear on the following
//!   break -> work transition, so the full count stays visible for the whole
//!   break before it wraps.
//!
//! Reaching zero stops the clock: the next phase is loaded but waits for a
//! `toggle()`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::traits::{Countdown, TimerKind};
use crate::catalog::work_mode_config;
use crate::error::ValidationError;
use crate::events::Event;
use crate::format::minutes_to_seconds;

/// Which ruleset a work cycle follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkMode {
    #[default]
    Pomodoro,
    DeepWork,
    Custom,
}

impl WorkMode {
    pub const ALL: [WorkMode; 3] = [Self::Pomodoro, Self::DeepWork, Self::Custom];

    pub fn label(self) -> &'static str {
        work_mode_config(self).label
    }
}

/// The phase a work cycle is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Work,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRules {
    pub mode: WorkMode,
    pub work_secs: u32,
    pub break_secs: u32,
    /// `None` disables the long break cycle.
    pub long_break_secs: Option<u32>,
    /// Work phases per cycle; pomodoro takes its long break after this many.
    pub rounds: u32,
}

impl WorkRules {
    /// Catalog defaults for `mode`.
    pub fn for_mode(mode: WorkMode) -> Self {
        work_mode_config(mode).rules()
    }

    /// User-chosen work block, break and round count.
    ///
    /// # Errors
    ///
    /// Rejects zero minutes or zero rounds.
    pub fn custom(work_minutes: u32, break_minutes: u32, rounds: u32) -> Result<Self, ValidationError> {
        let rules = Self {
            mode: WorkMode::Custom,
            work_secs: minutes_to_seconds(work_minutes),
            break_secs: minutes_to_seconds(break_minutes),
            long_break_secs: None,
            rounds,
        };
        rules.validate()?;
        Ok(rules)
    }

    /// # Errors
    ///
    /// Rejects any zero duration or a zero round count.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.work_secs == 0 {
            return Err(ValidationError::zero_duration("work"));
        }
        if self.break_secs == 0 {
            return Err(ValidationError::zero_duration("break"));
        }
        if self.long_break_secs == Some(0) {
            return Err(ValidationError::zero_duration("long_break"));
        }
        if self.rounds == 0 {
            return Err(ValidationError::InvalidValue {
                field: "rounds".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkCycle {
    rules: WorkRules,
    mode: Mode,
    /// The current break is the long one.
    long_break: bool,
    /// Duration the in-flight phase was seeded with.
    phase_secs: u32,
    remaining_secs: u32,
    running: bool,
    rounds_completed: u32,
    /// The cycle filled up; clear the counter on the next return to work.
    clear_pending: bool,
}

impl WorkCycle {
    /// # Errors
    ///
    /// Rejects invalid rules.
    pub fn new(rules: WorkRules) -> Result<Self, ValidationError> {
        rules.validate()?;
        Ok(Self::seeded(rules))
    }

    /// Idle cycle on the catalog rules for `mode`.
    pub fn for_mode(mode: WorkMode) -> Self {
        Self::seeded(WorkRules::for_mode(mode))
    }

    fn seeded(rules: WorkRules) -> Self {
        Self {
            rules,
            mode: Mode::Work,
            long_break: false,
            phase_secs: rules.work_secs,
            remaining_secs: rules.work_secs,
            running: false,
            rounds_completed: 0,
            clear_pending: false,
        }
    }

    pub fn rules(&self) -> &WorkRules {
        &self.rules
    }

    pub fn current_mode(&self) -> Mode {
        self.mode
    }

    pub fn is_long_break(&self) -> bool {
        self.long_break
    }

    /// Bookkeeping count: wraps to 0 as soon as a cycle fills up.
    pub fn rounds_completed(&self) -> u32 {
        if self.clear_pending {
            0
        } else {
            self.rounds_completed
        }
    }

    /// Count to show: holds the full count through the break that follows
    /// a completed cycle, then clears when work resumes.
    pub fn rounds_completed_for_display(&self) -> u32 {
        self.rounds_completed.min(self.rules.rounds)
    }

    /// End the current phase now, exactly as if it had reached zero.
    pub fn skip(&mut self) -> Vec<Event> {
        self.transition(true)
    }

    /// # Errors
    ///
    /// Rejects a zero duration.
    pub fn set_work_secs(&mut self, secs: u32) -> Result<(), ValidationError> {
        if secs == 0 {
            return Err(ValidationError::zero_duration("work"));
        }
        self.rules.work_secs = secs;
        if self.mode == Mode::Work {
            self.reseed_if_idle(secs);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Rejects a zero duration.
    pub fn set_break_secs(&mut self, secs: u32) -> Result<(), ValidationError> {
        if secs == 0 {
            return Err(ValidationError::zero_duration("break"));
        }
        self.rules.break_secs = secs;
        if self.mode == Mode::Break && !self.long_break {
            self.reseed_if_idle(secs);
        }
        Ok(())
    }

    /// Change or drop the long break. Dropping it during a long break keeps
    /// the break that is already loaded.
    ///
    /// # Errors
    ///
    /// Rejects a zero duration.
    pub fn set_long_break_secs(&mut self, secs: Option<u32>) -> Result<(), ValidationError> {
        if secs == Some(0) {
            return Err(ValidationError::zero_duration("long_break"));
        }
        self.rules.long_break_secs = secs;
        if let (Some(secs), Mode::Break, true) = (secs, self.mode, self.long_break) {
            self.reseed_if_idle(secs);
        }
        Ok(())
    }

    /// Change the cycle length. A counter already at or past the new length
    /// starts over, unless a full cycle is on display and about to clear.
    ///
    /// # Errors
    ///
    /// Rejects zero rounds.
    pub fn set_rounds(&mut self, rounds: u32) -> Result<(), ValidationError> {
        if rounds == 0 {
            return Err(ValidationError::InvalidValue {
                field: "rounds".into(),
                message: "must be at least 1".into(),
            });
        }
        self.rules.rounds = rounds;
        if !self.clear_pending && self.rounds_completed >= rounds {
            debug!(rounds, "round count shrank below progress; counter cleared");
            self.rounds_completed = 0;
        }
        Ok(())
    }

    /// Swap in a whole new rule set. Switching to a different work mode
    /// resets the cycle; new values for the same mode go through the
    /// individual setters, so an in-flight countdown is never disturbed.
    /// Returns whether the cycle was reset.
    ///
    /// # Errors
    ///
    /// Rejects invalid rules; nothing changes in that case.
    pub fn apply_rules(&mut self, rules: WorkRules) -> Result<bool, ValidationError> {
        rules.validate()?;
        if rules.mode != self.rules.mode {
            info!(from = ?self.rules.mode, to = ?rules.mode, "work mode switched");
            self.rules = rules;
            Countdown::reset(self);
            return Ok(true);
        }
        self.set_work_secs(rules.work_secs)?;
        self.set_break_secs(rules.break_secs)?;
        self.set_long_break_secs(rules.long_break_secs)?;
        self.set_rounds(rules.rounds)?;
        Ok(false)
    }

    fn reseed_if_idle(&mut self, secs: u32) {
        if self.running {
            debug!(mode = ?self.mode, secs, "duration change deferred to next transition");
        } else {
            self.seed(secs);
        }
    }

    fn seed(&mut self, secs: u32) {
        self.phase_secs = secs;
        self.remaining_secs = secs;
    }

    fn transition(&mut self, skipped: bool) -> Vec<Event> {
        let from = self.mode;
        match from {
            Mode::Work => {
                self.rounds_completed = self.rounds_completed.saturating_add(1);
                let cycle_done = self.rounds_completed >= self.rules.rounds;
                if cycle_done {
                    self.clear_pending = true;
                }
                let long_break = match (cycle_done, self.rules.long_break_secs) {
                    (true, Some(secs)) => Some(secs),
                    _ => None,
                };
                self.long_break = long_break.is_some();
                self.mode = Mode::Break;
                self.seed(long_break.unwrap_or(self.rules.break_secs));
                if self.long_break {
                    info!(rounds = self.rounds_completed, "long break");
                }
            }
            Mode::Break => {
                if self.clear_pending {
                    self.rounds_completed = 0;
                    self.clear_pending = false;
                }
                self.mode = Mode::Work;
                self.long_break = false;
                self.seed(self.rules.work_secs);
            }
        }
        self.running = false;

        debug!(
            ?from,
            to = ?self.mode,
            skipped,
            rounds = self.rounds_completed,
            "work cycle transition"
        );
        vec![Event::ModeChanged {
            from,
            to: self.mode,
            long_break: self.long_break,
            duration_secs: self.phase_secs,
            rounds_completed: self.rounds_completed_for_display(),
            skipped,
            at: Utc::now(),
        }]
    }
}

impl Default for WorkCycle {
    fn default() -> Self {
        Self::for_mode(WorkMode::default())
    }
}

impl Countdown for WorkCycle {
    fn kind(&self) -> TimerKind {
        TimerKind::Work
    }

    fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    fn phase_secs(&self) -> u32 {
        self.phase_secs
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn is_complete(&self) -> bool {
        false
    }

    fn can_reset(&self) -> bool {
        self.mode != Mode::Work
            || self.remaining_secs != self.rules.work_secs
            || self.rounds_completed != 0
    }

    fn phase_label(&self) -> &str {
        match (self.mode, self.long_break) {
            (Mode::Work, _) => "Work",
            (Mode::Break, false) => "Break",
            (Mode::Break, true) => "Long Break",
        }
    }

    fn mode(&self) -> Option<Mode> {
        Some(self.mode)
    }

    fn rounds_for_display(&self) -> Option<u32> {
        Some(self.rounds_completed_for_display())
    }

    fn toggle(&mut self) -> Option<Event> {
        self.running = !self.running;
        let at = Utc::now();
        Some(if self.running {
            Event::TimerStarted {
                timer: TimerKind::Work,
                remaining_secs: self.remaining_secs,
                at,
            }
        } else {
            Event::TimerPaused {
                timer: TimerKind::Work,
                remaining_secs: self.remaining_secs,
                at,
            }
        })
    }

    fn reset(&mut self) -> Option<Event> {
        self.running = false;
        self.mode = Mode::Work;
        self.long_break = false;
        self.rounds_completed = 0;
        self.clear_pending = false;
        self.seed(self.rules.work_secs);
        Some(Event::TimerReset {
            timer: TimerKind::Work,
            at: Utc::now(),
        })
    }

    fn tick(&mut self) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        trace!(mode = ?self.mode, remaining = self.remaining_secs, "tick");
        if self.remaining_secs > 0 {
            return Vec::new();
        }
        self.transition(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn pomodoro() -> WorkCycle {
        WorkCycle::new(WorkRules {
            mode: WorkMode::Pomodoro,
            work_secs: 3,
            break_secs: 2,
            long_break_secs: Some(5),
            rounds: 4,
        })
        .unwrap()
    }

    fn deep_work(rounds: u32) -> WorkCycle {
        WorkCycle::new(WorkRules {
            mode: WorkMode::DeepWork,
            work_secs: 3,
            break_secs: 2,
            long_break_secs: None,
            rounds,
        })
        .unwrap()
    }

    /// Start the current phase and tick it down to zero.
    fn finish_phase(cycle: &mut WorkCycle) -> Vec<Event> {
        cycle.toggle();
        let mut events = Vec::new();
        while events.is_empty() {
            events = cycle.tick();
        }
        events
    }

    #[test]
    fn rejects_invalid_rules() {
        let mut rules = WorkRules::for_mode(WorkMode::DeepWork);
        rules.rounds = 0;
        assert!(WorkCycle::new(rules).is_err());
        assert!(WorkRules::custom(0, 5, 4).is_err());
        assert!(WorkRules::custom(25, 5, 0).is_err());
    }

    #[test]
    fn starts_idle_on_work() {
        let cycle = WorkCycle::new(WorkRules::for_mode(WorkMode::Pomodoro)).unwrap();
        assert_eq!(cycle.current_mode(), Mode::Work);
        assert_eq!(cycle.remaining_secs(), 25 * 60);
        assert!(!cycle.is_running());
        assert!(!cycle.can_reset());
        assert_eq!(cycle.phase_label(), "Work");
    }

    #[test]
    fn work_to_break_stops_clock() {
        let mut cycle = pomodoro();
        let events = finish_phase(&mut cycle);
        assert_eq!(cycle.current_mode(), Mode::Break);
        assert_eq!(cycle.remaining_secs(), 2);
        assert!(!cycle.is_running());
        assert!(matches!(
            &events[..],
            [Event::ModeChanged { from: Mode::Work, to: Mode::Break, long_break: false, skipped: false, .. }]
        ));
    }

    #[test]
    fn pomodoro_long_break_on_fourth_session() {
        let mut cycle = pomodoro();
        let mut breaks = Vec::new();
        let mut counters = Vec::new();
        for _ in 0..4 {
            finish_phase(&mut cycle);
            breaks.push((cycle.is_long_break(), cycle.remaining_secs()));
            counters.push((cycle.rounds_completed(), cycle.rounds_completed_for_display()));
            finish_phase(&mut cycle);
        }
        assert_eq!(
            breaks,
            vec![(false, 2), (false, 2), (false, 2), (true, 5)]
        );
        assert_eq!(counters, vec![(1, 1), (2, 2), (3, 3), (0, 4)]);
        // Back on work after the long break with a clean counter.
        assert_eq!(cycle.current_mode(), Mode::Work);
        assert_eq!(cycle.rounds_completed_for_display(), 0);
    }

    #[test]
    fn long_break_label() {
        let mut cycle = pomodoro();
        for _ in 0..3 {
            finish_phase(&mut cycle);
            finish_phase(&mut cycle);
        }
        finish_phase(&mut cycle);
        assert_eq!(cycle.phase_label(), "Long Break");
    }

    #[test]
    fn deep_work_shows_full_count_then_clears() {
        let mut cycle = deep_work(3);
        let mut shown = Vec::new();
        for _ in 0..6 {
            finish_phase(&mut cycle);
            shown.push(cycle.rounds_completed_for_display());
            assert!(!cycle.is_long_break());
            finish_phase(&mut cycle);
            shown.push(cycle.rounds_completed_for_display());
        }
        assert_eq!(shown, vec![1, 1, 2, 2, 3, 0, 1, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn reset_from_break_zeroes_everything() {
        let mut cycle = pomodoro();
        finish_phase(&mut cycle);
        cycle.toggle();
        cycle.tick();
        assert!(cycle.can_reset());
        cycle.reset();
        assert_eq!(cycle.current_mode(), Mode::Work);
        assert_eq!(cycle.remaining_secs(), 3);
        assert_eq!(cycle.rounds_completed_for_display(), 0);
        assert!(!cycle.is_running());
        assert!(!cycle.can_reset());
    }

    #[test]
    fn skip_matches_natural_completion() {
        for ticks_before_skip in 0..3 {
            let mut natural = pomodoro();
            finish_phase(&mut natural);

            let mut skipped = pomodoro();
            skipped.toggle();
            for _ in 0..ticks_before_skip {
                skipped.tick();
            }
            let events = skipped.skip();
            assert!(matches!(&events[..], [Event::ModeChanged { skipped: true, .. }]));
            assert_eq!(skipped, natural);
        }
    }

    #[test]
    fn skip_counts_towards_long_break() {
        let mut cycle = pomodoro();
        for _ in 0..3 {
            cycle.skip();
            cycle.skip();
        }
        cycle.skip();
        assert!(cycle.is_long_break());
        assert_eq!(cycle.rounds_completed_for_display(), 4);
        cycle.skip();
        assert_eq!(cycle.rounds_completed_for_display(), 0);
    }

    #[test]
    fn work_duration_edit_applies_when_idle_on_work() {
        let mut cycle = pomodoro();
        cycle.set_work_secs(10).unwrap();
        assert_eq!(cycle.remaining_secs(), 10);
        assert!(!cycle.can_reset());
    }

    #[test]
    fn work_duration_edit_deferred_while_running() {
        let mut cycle = pomodoro();
        cycle.toggle();
        cycle.tick();
        cycle.set_work_secs(10).unwrap();
        assert_eq!(cycle.remaining_secs(), 2);
        assert_eq!(cycle.phase_secs(), 3);
        cycle.tick();
        cycle.tick();
        finish_phase(&mut cycle);
        assert_eq!(cycle.current_mode(), Mode::Work);
        assert_eq!(cycle.remaining_secs(), 10);
    }

    #[test]
    fn break_duration_edit_deferred_while_on_work() {
        let mut cycle = pomodoro();
        cycle.set_break_secs(7).unwrap();
        assert_eq!(cycle.remaining_secs(), 3);
        finish_phase(&mut cycle);
        assert_eq!(cycle.remaining_secs(), 7);
    }

    #[test]
    fn break_duration_edit_applies_when_idle_on_break() {
        let mut cycle = pomodoro();
        finish_phase(&mut cycle);
        cycle.set_break_secs(9).unwrap();
        assert_eq!(cycle.remaining_secs(), 9);
        // Work edits while showing the break wait for the next work phase.
        cycle.set_work_secs(11).unwrap();
        assert_eq!(cycle.remaining_secs(), 9);
    }

    #[test]
    fn short_break_edit_leaves_long_break_alone() {
        let mut cycle = pomodoro();
        for _ in 0..3 {
            cycle.skip();
            cycle.skip();
        }
        cycle.skip();
        assert!(cycle.is_long_break());
        cycle.set_break_secs(9).unwrap();
        assert_eq!(cycle.remaining_secs(), 5);
        cycle.set_long_break_secs(Some(8)).unwrap();
        assert_eq!(cycle.remaining_secs(), 8);
    }

    #[test]
    fn shrinking_rounds_restarts_counter() {
        let mut cycle = deep_work(4);
        cycle.skip();
        cycle.skip();
        cycle.skip();
        cycle.skip();
        assert_eq!(cycle.rounds_completed(), 2);
        cycle.set_rounds(2).unwrap();
        assert_eq!(cycle.rounds_completed(), 0);
    }

    #[test]
    fn apply_rules_with_new_mode_resets() {
        let mut cycle = pomodoro();
        finish_phase(&mut cycle);
        let reset = cycle
            .apply_rules(WorkRules::for_mode(WorkMode::DeepWork))
            .unwrap();
        assert!(reset);
        assert_eq!(cycle.current_mode(), Mode::Work);
        assert_eq!(cycle.remaining_secs(), 50 * 60);
        assert_eq!(cycle.rules().long_break_secs, None);
    }

    #[test]
    fn apply_rules_same_mode_defers_while_running() {
        let mut cycle = WorkCycle::new(WorkRules::custom(1, 1, 2).unwrap()).unwrap();
        cycle.toggle();
        cycle.tick();
        let reset = cycle.apply_rules(WorkRules::custom(2, 3, 2).unwrap()).unwrap();
        assert!(!reset);
        assert_eq!(cycle.remaining_secs(), 59);
        assert!(cycle.is_running());
        assert_eq!(cycle.rules().work_secs, 120);
    }

    #[test]
    fn snapshot_carries_mode_and_rounds() {
        let mut cycle = pomodoro();
        finish_phase(&mut cycle);
        match cycle.snapshot() {
            Event::StateSnapshot {
                timer,
                mode,
                rounds_completed,
                remaining_secs,
                ..
            } => {
                assert_eq!(timer, TimerKind::Work);
                assert_eq!(mode, Some(Mode::Break));
                assert_eq!(rounds_completed, Some(1));
                assert_eq!(remaining_secs, 2);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn counter_never_exceeds_rounds(rounds in 1u32..8, phases in 1usize..60) {
            let mut cycle = deep_work(rounds);
            for _ in 0..phases {
                cycle.skip();
                prop_assert!(cycle.rounds_completed_for_display() <= rounds);
                prop_assert!(cycle.rounds_completed() < rounds);
                prop_assert!(cycle.remaining_secs() <= cycle.phase_secs());
            }
        }
    }
}
