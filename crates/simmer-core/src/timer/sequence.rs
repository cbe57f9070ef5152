//! Sequential multi-phase countdown.
//!
//! Runs an ordered, non-empty list of named phases back to back. When a
//! phase reaches zero the next one starts immediately with its full
//! duration; after the last phase the sequence is complete and stays on the
//! last phase so its label can still be shown.

use std::ops::Deref;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::traits::{Countdown, TimerKind};
use crate::catalog::{NEW_STAGE_MINUTES, STAGE_LABEL_MAX_CHARS};
use crate::error::ValidationError;
use crate::events::Event;
use crate::format::minutes_to_seconds;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phase {
    pub label: String,
    /// Duration in seconds, at least 1.
    pub seconds: u32,
}

impl Phase {
    /// # Errors
    ///
    /// Rejects a zero duration.
    pub fn new(label: impl Into<String>, seconds: u32) -> Result<Self, ValidationError> {
        let label = label.into();
        if seconds == 0 {
            return Err(ValidationError::zero_duration(label));
        }
        Ok(Self { label, seconds })
    }

    /// # Errors
    ///
    /// Rejects zero minutes.
    pub fn from_minutes(label: impl Into<String>, minutes: u32) -> Result<Self, ValidationError> {
        Self::new(label, minutes_to_seconds(minutes))
    }

    /// Catalog entries are non-zero by construction.
    pub(crate) fn from_catalog(label: &'static str, minutes: u32) -> Self {
        debug_assert!(minutes > 0);
        Self {
            label: label.to_string(),
            seconds: minutes_to_seconds(minutes),
        }
    }
}

/// An immutable, non-empty list of phases.
///
/// Cloning shares the underlying slice. Editing produces a new list; a
/// running [`PhaseSequence`] never sees its phases change underneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Phase>", into = "Vec<Phase>")]
pub struct PhaseList(Arc<[Phase]>);

impl PhaseList {
    /// # Errors
    ///
    /// Rejects an empty list or any phase with a zero duration.
    pub fn new(phases: Vec<Phase>) -> Result<Self, ValidationError> {
        if phases.is_empty() {
            return Err(ValidationError::EmptyCollection("phases".into()));
        }
        if let Some(phase) = phases.iter().find(|p| p.seconds == 0) {
            return Err(ValidationError::zero_duration(phase.label.as_str()));
        }
        Ok(Self(phases.into()))
    }

    pub(crate) fn from_static<const N: usize>(phases: [Phase; N]) -> Self {
        debug_assert!(N > 0);
        Self(Arc::from(phases))
    }

    pub fn total_secs(&self) -> u32 {
        self.0.iter().fold(0u32, |acc, p| acc.saturating_add(p.seconds))
    }

    /// Time left across the whole list when `remaining_secs` are left in
    /// phase `index`.
    pub fn remaining_from(&self, index: usize, remaining_secs: u32) -> u32 {
        self.0
            .iter()
            .skip(index + 1)
            .fold(remaining_secs, |acc, p| acc.saturating_add(p.seconds))
    }

    // ── Stage editing ────────────────────────────────────────────────

    /// Append a default "Stage N" phase.
    pub fn with_stage_added(&self) -> Self {
        let mut phases = self.0.to_vec();
        phases.push(Phase {
            label: default_stage_label(phases.len()),
            seconds: minutes_to_seconds(NEW_STAGE_MINUTES),
        });
        Self(phases.into())
    }

    /// # Errors
    ///
    /// Fails when `index` is out of bounds or it is the only stage left.
    pub fn without_stage(&self, index: usize) -> Result<Self, ValidationError> {
        self.check_index(index)?;
        if self.0.len() == 1 {
            return Err(ValidationError::InvalidValue {
                field: "phases".into(),
                message: "cannot remove the last stage".into(),
            });
        }
        let mut phases = self.0.to_vec();
        phases.remove(index);
        Ok(Self(phases.into()))
    }

    /// Rename a stage. Labels are cut to [`STAGE_LABEL_MAX_CHARS`]; a blank
    /// label falls back to "Stage N".
    ///
    /// # Errors
    ///
    /// Fails when `index` is out of bounds.
    pub fn with_stage_label(&self, index: usize, label: &str) -> Result<Self, ValidationError> {
        self.check_index(index)?;
        let trimmed = label.trim();
        let label = if trimmed.is_empty() {
            default_stage_label(index)
        } else {
            trimmed.chars().take(STAGE_LABEL_MAX_CHARS).collect()
        };
        let mut phases = self.0.to_vec();
        phases[index].label = label;
        Ok(Self(phases.into()))
    }

    /// # Errors
    ///
    /// Fails when `index` is out of bounds or `minutes` is zero.
    pub fn with_stage_minutes(&self, index: usize, minutes: u32) -> Result<Self, ValidationError> {
        self.check_index(index)?;
        if minutes == 0 {
            return Err(ValidationError::zero_duration(self.0[index].label.as_str()));
        }
        let mut phases = self.0.to_vec();
        phases[index].seconds = minutes_to_seconds(minutes);
        Ok(Self(phases.into()))
    }

    fn check_index(&self, index: usize) -> Result<(), ValidationError> {
        if index >= self.0.len() {
            return Err(ValidationError::OutOfBounds {
                collection: "phases".into(),
                index,
                len: self.0.len(),
            });
        }
        Ok(())
    }
}

fn default_stage_label(index: usize) -> String {
    format!("Stage {}", index + 1)
}

impl Deref for PhaseList {
    type Target = [Phase];

    fn deref(&self) -> &[Phase] {
        &self.0
    }
}

impl TryFrom<Vec<Phase>> for PhaseList {
    type Error = ValidationError;

    fn try_from(phases: Vec<Phase>) -> Result<Self, Self::Error> {
        Self::new(phases)
    }
}

impl From<PhaseList> for Vec<Phase> {
    fn from(list: PhaseList) -> Self {
        list.0.to_vec()
    }
}

/// Countdown over a [`PhaseList`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseSequence {
    kind: TimerKind,
    phases: PhaseList,
    phase_index: usize,
    remaining_secs: u32,
    running: bool,
    complete: bool,
}

impl PhaseSequence {
    pub fn new(kind: TimerKind, phases: PhaseList) -> Self {
        let remaining_secs = phases[0].seconds;
        Self {
            kind,
            phases,
            phase_index: 0,
            remaining_secs,
            running: false,
            complete: false,
        }
    }

    /// Replace the phase list and rewind to phase 0, stopped.
    pub fn start(&mut self, phases: PhaseList) {
        debug!(timer = ?self.kind, phases = phases.len(), "phase list loaded");
        self.phases = phases;
        self.rewind();
    }

    /// Like [`PhaseSequence::start`], but an identical list keeps the
    /// current progress. Returns whether the sequence was re-initialized.
    pub fn load(&mut self, phases: PhaseList) -> bool {
        if phases == self.phases {
            return false;
        }
        self.start(phases);
        true
    }

    pub fn phases(&self) -> &PhaseList {
        &self.phases
    }

    pub fn current_phase(&self) -> &Phase {
        &self.phases[self.phase_index]
    }

    /// Time left across the current phase and every later one.
    pub fn total_remaining_secs(&self) -> u32 {
        self.phases
            .remaining_from(self.phase_index, self.remaining_secs)
    }

    fn rewind(&mut self) {
        self.phase_index = 0;
        self.remaining_secs = self.phases[0].seconds;
        self.running = false;
        self.complete = false;
    }
}

impl Countdown for PhaseSequence {
    fn kind(&self) -> TimerKind {
        self.kind
    }

    fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    fn phase_secs(&self) -> u32 {
        self.current_phase().seconds
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn can_reset(&self) -> bool {
        self.phase_index != 0 || self.remaining_secs != self.phases[0].seconds || self.complete
    }

    fn phase_label(&self) -> &str {
        &self.current_phase().label
    }

    fn phase_index(&self) -> Option<usize> {
        Some(self.phase_index)
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
        self.rewind();
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
        trace!(timer = ?self.kind, phase = self.phase_index, remaining = self.remaining_secs, "tick");
        if self.remaining_secs > 0 {
            return Vec::new();
        }

        let next = self.phase_index + 1;
        if next < self.phases.len() {
            self.phase_index = next;
            let phase = &self.phases[next];
            self.remaining_secs = phase.seconds;
            debug!(timer = ?self.kind, phase = next, label = %phase.label, "phase advanced");
            return vec![Event::PhaseAdvanced {
                timer: self.kind,
                phase_index: next,
                label: phase.label.clone(),
                duration_secs: phase.seconds,
                at: Utc::now(),
            }];
        }

        // Stay on the last phase; its label is shown while complete.
        self.running = false;
        self.complete = true;
        info!(timer = ?self.kind, "sequence complete");
        vec![Event::TimerCompleted {
            timer: self.kind,
            phase_index: self.phase_index,
            label: self.current_phase().label.clone(),
            at: Utc::now(),
        }]
    }
}
