use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Mode, TimerContext, TimerKind};

/// Every state change in a timer produces an Event.
/// The presentation layer polls snapshots; alerts subscribe to the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        timer: TimerKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        timer: TimerKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        timer: TimerKind,
        at: DateTime<Utc>,
    },
    /// All four cook timers were reset together.
    CookTimersReset {
        at: DateTime<Utc>,
    },
    /// A sequence reached zero on a phase and moved on to the next one.
    PhaseAdvanced {
        timer: TimerKind,
        phase_index: usize,
        label: String,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// A countdown or the last phase of a sequence reached zero.
    TimerCompleted {
        timer: TimerKind,
        phase_index: usize,
        label: String,
        at: DateTime<Utc>,
    },
    /// The work cycle switched between work and break.
    ModeChanged {
        from: Mode,
        to: Mode,
        long_break: bool,
        duration_secs: u32,
        rounds_completed: u32,
        skipped: bool,
        at: DateTime<Utc>,
    },
    ContextSwitched {
        from: TimerContext,
        to: TimerContext,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        timer: TimerKind,
        label: String,
        remaining_secs: u32,
        running: bool,
        complete: bool,
        can_reset: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<Mode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phase_index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rounds_completed: Option<u32>,
        progress: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for events that mark a zero crossing, i.e. the ones an alert
    /// sound or notification should react to.
    pub fn is_zero_crossing(&self) -> bool {
        matches!(
            self,
            Event::PhaseAdvanced { .. } | Event::TimerCompleted { .. } | Event::ModeChanged { skipped: false, .. }
        )
    }
}
