use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::work_cycle::Mode;
use crate::events::Event;

/// Which timer an event or snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerKind {
    Work,
    Pasta,
    Egg,
    Sauce,
    CustomStages,
}

/// The uniform control surface every timer variant exposes.
///
/// Implementors are plain synchronous state machines: nothing here sleeps or
/// spawns. Time only moves when the owner calls `tick()`, normally from a
/// [`TickSource`](super::TickSource) via a [`TimerDriver`](super::TimerDriver).
/// Calling any command in a state where it makes no sense is a no-op.
pub trait Countdown {
    fn kind(&self) -> TimerKind;

    /// Seconds left in the current phase.
    fn remaining_secs(&self) -> u32;

    /// Full length of the phase currently counting down.
    fn phase_secs(&self) -> u32;

    fn is_running(&self) -> bool;

    fn is_complete(&self) -> bool;

    /// Whether `reset()` would change anything. Recomputed on every call.
    fn can_reset(&self) -> bool;

    /// Status text for the current phase.
    fn phase_label(&self) -> &str;

    /// Start or pause. Does nothing once complete.
    fn toggle(&mut self) -> Option<Event>;

    fn reset(&mut self) -> Option<Event>;

    /// Advance by one tick. Returns the transitions this tick caused.
    fn tick(&mut self) -> Vec<Event>;

    /// Whether a tick source should currently be armed for this timer.
    fn wants_tick(&self) -> bool {
        self.is_running()
    }

    fn mode(&self) -> Option<Mode> {
        None
    }

    fn phase_index(&self) -> Option<usize> {
        None
    }

    fn rounds_for_display(&self) -> Option<u32> {
        None
    }

    /// 0.0 .. 1.0 progress within the current phase.
    fn progress(&self) -> f64 {
        let total = self.phase_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs() as f64 / total as f64)
    }

    /// Build a full state snapshot event.
    fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            timer: self.kind(),
            label: self.phase_label().to_string(),
            remaining_secs: self.remaining_secs(),
            running: self.is_running(),
            complete: self.is_complete(),
            can_reset: self.can_reset(),
            mode: self.mode(),
            phase_index: self.phase_index(),
            rounds_completed: self.rounds_for_display(),
            progress: self.progress(),
            at: Utc::now(),
        }
    }
}
