//! Single-phase countdown.
//!
//! ```text
//! Idle -> Running <-> Paused -> Complete
//! ```
//!
//! `Complete` is terminal until `reset()` or `start()`.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, trace};

use super::traits::{Countdown, TimerKind};
use crate::error::ValidationError;
use crate::events::Event;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleCountdown {
    kind: TimerKind,
    label: String,
    /// Duration a reset returns to.
    configured_secs: u32,
    /// Duration the in-flight countdown was seeded with.
    phase_secs: u32,
    remaining_secs: u32,
    running: bool,
    complete: bool,
}

impl SimpleCountdown {
    /// Create an idle countdown of `duration_secs`.
    ///
    /// # Errors
    ///
    /// Rejects a zero duration.
    pub fn new(
        kind: TimerKind,
        label: impl Into<String>,
        duration_secs: u32,
    ) -> Result<Self, ValidationError> {
        let label = label.into();
        if duration_secs == 0 {
            return Err(ValidationError::zero_duration(label));
        }
        Ok(Self {
            kind,
            label,
            configured_secs: duration_secs,
            phase_secs: duration_secs,
            remaining_secs: duration_secs,
            running: false,
            complete: false,
        })
    }

    /// Catalog durations are non-zero by construction.
    pub(crate) fn from_catalog(kind: TimerKind, label: &'static str, duration_secs: u32) -> Self {
        debug_assert!(duration_secs > 0);
        Self {
            kind,
            label: label.to_string(),
            configured_secs: duration_secs,
            phase_secs: duration_secs,
            remaining_secs: duration_secs,
            running: false,
            complete: false,
        }
    }

    /// Re-initialize with a new duration, dropping any progress.
    ///
    /// # Errors
    ///
    /// Rejects a zero duration; the countdown is left untouched.
    pub fn start(&mut self, duration_secs: u32) -> Result<(), ValidationError> {
        if duration_secs == 0 {
            return Err(ValidationError::zero_duration(self.label.as_str()));
        }
        self.configured_secs = duration_secs;
        self.seed(duration_secs);
        self.running = false;
        self.complete = false;
        Ok(())
    }

    /// Change the configured duration.
    ///
    /// When not running the countdown is re-seeded right away. While running
    /// the in-flight countdown is left alone and only the next reset picks
    /// the new value up.
    ///
    /// # Errors
    ///
    /// Rejects a zero duration.
    pub fn set_duration(&mut self, duration_secs: u32) -> Result<(), ValidationError> {
        if duration_secs == 0 {
            return Err(ValidationError::zero_duration(self.label.as_str()));
        }
        self.configured_secs = duration_secs;
        if self.running {
            debug!(timer = ?self.kind, duration_secs, "duration change deferred until reset");
        } else {
            self.seed(duration_secs);
            self.complete = false;
        }
        Ok(())
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn configured_secs(&self) -> u32 {
        self.configured_secs
    }

    fn seed(&mut self, secs: u32) {
        self.phase_secs = secs;
        self.remaining_secs = secs;
    }
}

impl Countdown for SimpleCountdown {
    fn kind(&self) -> TimerKind {
        self.kind
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
        self.complete
    }

    fn can_reset(&self) -> bool {
        self.remaining_secs != self.configured_secs || self.complete
    }

    fn phase_label(&self) -> &str {
        &self.label
    }

    fn toggle(&mut self) -> Option<Event> {
        if self.complete {
            return None;
        }
        self.running = !self.running;
        let at = Utc::now();
        Some(if self.running {
            Event::TimerStarted {
                timer: self.kind,
                remaining_secs: self.remaining_secs,
                at,
            }
        } else {
            Event::TimerPaused {
                timer: self.kind,
                remaining_secs: self.remaining_secs,
                at,
            }
        })
    }

    fn reset(&mut self) -> Option<Event> {
        self.running = false;
        self.complete = false;
        self.seed(self.configured_secs);
        Some(Event::TimerReset {
            timer: self.kind,
            at: Utc::now(),
        })
    }

    fn tick(&mut self) -> Vec<Event> {
        if !self.running || self.complete {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        trace!(timer = ?self.kind, remaining = self.remaining_secs, "tick");
        if self.remaining_secs > 0 {
            return Vec::new();
        }

        self.running = false;
        self.complete = true;
        info!(timer = ?self.kind, label = %self.label, "countdown complete");
        vec![Event::TimerCompleted {
            timer: self.kind,
            phase_index: 0,
            label: self.label.clone(),
            at: Utc::now(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pasta(secs: u32) -> SimpleCountdown {
        SimpleCountdown::new(TimerKind::Pasta, "Regular", secs).unwrap()
    }

    fn run(timer: &mut SimpleCountdown, ticks: u32) -> Vec<Event> {
        (0..ticks).flat_map(|_| timer.tick()).collect()
    }

    #[test]
    fn rejects_zero_duration() {
        assert!(SimpleCountdown::new(TimerKind::Egg, "Soft", 0).is_err());
        let mut timer = pasta(10);
        assert!(timer.start(0).is_err());
        assert!(timer.set_duration(0).is_err());
        assert_eq!(timer.remaining_secs(), 10);
    }

    #[test]
    fn tick_while_idle_is_noop() {
        let mut timer = pasta(10);
        assert!(timer.tick().is_empty());
        assert_eq!(timer.remaining_secs(), 10);
        assert!(!timer.can_reset());
    }

    #[test]
    fn completes_after_duration_ticks() {
        let mut timer = pasta(3);
        timer.toggle();
        let events = run(&mut timer, 3);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::TimerCompleted { timer: TimerKind::Pasta, .. }));
        assert_eq!(timer.remaining_secs(), 0);
        assert!(timer.is_complete());
        assert!(!timer.is_running());

        // Extra ticks after completion do nothing.
        assert!(run(&mut timer, 5).is_empty());
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn toggle_is_noop_when_complete() {
        let mut timer = pasta(1);
        timer.toggle();
        timer.tick();
        assert!(timer.toggle().is_none());
        assert!(!timer.is_running());
    }

    #[test]
    fn reset_returns_to_configured_duration() {
        let mut timer = pasta(10);
        timer.toggle();
        run(&mut timer, 4);
        assert!(timer.can_reset());
        timer.reset();
        assert_eq!(timer.remaining_secs(), 10);
        assert!(!timer.is_running());
        assert!(!timer.can_reset());
    }

    #[test]
    fn reset_after_completion() {
        let mut timer = pasta(2);
        timer.toggle();
        run(&mut timer, 2);
        assert!(timer.can_reset());
        timer.reset();
        assert!(!timer.is_complete());
        assert_eq!(timer.remaining_secs(), 2);
    }

    #[test]
    fn duration_change_while_idle_reseeds() {
        let mut timer = pasta(10);
        timer.set_duration(20).unwrap();
        assert_eq!(timer.remaining_secs(), 20);
        assert!(!timer.can_reset());
    }

    #[test]
    fn duration_change_after_completion_clears_complete() {
        let mut timer = pasta(1);
        timer.toggle();
        timer.tick();
        timer.set_duration(5).unwrap();
        assert!(!timer.is_complete());
        assert_eq!(timer.remaining_secs(), 5);
    }

    #[test]
    fn duration_change_while_running_is_deferred() {
        let mut timer = pasta(10);
        timer.toggle();
        run(&mut timer, 3);
        timer.set_duration(20).unwrap();
        assert_eq!(timer.remaining_secs(), 7);
        assert_eq!(timer.phase_secs(), 10);
        assert!(timer.can_reset());

        timer.reset();
        assert_eq!(timer.remaining_secs(), 20);
    }

    #[test]
    fn can_reset_tracks_duration_changes() {
        let mut timer = pasta(10);
        timer.toggle();
        run(&mut timer, 10);
        timer.reset();
        assert!(!timer.can_reset());

        timer.toggle();
        run(&mut timer, 2);
        assert!(timer.can_reset());
        timer.set_duration(8).unwrap();
        assert!(!timer.can_reset());
        timer.set_duration(9).unwrap();
        assert!(timer.can_reset());
    }

    #[test]
    fn progress_within_phase() {
        let mut timer = pasta(4);
        assert_eq!(timer.progress(), 0.0);
        timer.toggle();
        run(&mut timer, 1);
        assert!((timer.progress() - 0.25).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn d_ticks_complete(d in 1u32..=600) {
            let mut timer = pasta(d);
            timer.toggle();
            run(&mut timer, d);
            prop_assert_eq!(timer.remaining_secs(), 0);
            prop_assert!(timer.is_complete());
            prop_assert!(!timer.is_running());
        }

        #[test]
        fn partial_run_then_reset_is_fresh(d in 1u32..=600, frac in 0.0f64..1.0) {
            let ticks = ((d as f64) * frac) as u32;
            prop_assume!(ticks < d);
            let mut timer = pasta(d);
            timer.toggle();
            run(&mut timer, ticks);
            timer.reset();
            prop_assert_eq!(timer.remaining_secs(), d);
            prop_assert!(!timer.is_complete());
            prop_assert!(!timer.can_reset());
        }

        #[test]
        fn toggle_twice_and_reset_twice_are_idempotent(d in 1u32..=120, ticks in 0u32..120) {
            let mut timer = pasta(d);
            timer.toggle();
            run(&mut timer, ticks.min(d.saturating_sub(1)));
            let running = timer.is_running();
            timer.toggle();
            timer.toggle();
            prop_assert_eq!(timer.is_running(), running);

            timer.reset();
            let once = timer.clone();
            timer.reset();
            prop_assert_eq!(timer, once);
        }
    }
}
