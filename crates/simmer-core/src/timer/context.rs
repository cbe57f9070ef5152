//! Work/cook context holder.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cook::CookRouter;
use super::traits::{Countdown, TimerKind};
use super::work_cycle::{Mode, WorkCycle, WorkRules};
use crate::error::ValidationError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerContext {
    #[default]
    Work,
    Cook,
}

impl TimerContext {
    pub fn label(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Cook => "Cook",
        }
    }
}

/// One work cycle and one cook router behind a context switch.
///
/// Both controllers tick whenever their own running flag is set, whichever
/// context is displayed. Use [`Workbench::switch_context`] to stop the one
/// being left, or [`Workbench::switch_context_keep_running`] to let it run on
/// in the background.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbench {
    context: TimerContext,
    work: WorkCycle,
    cook: CookRouter,
}

impl Workbench {
    pub fn new(work: WorkCycle, cook: CookRouter) -> Self {
        Self {
            context: TimerContext::default(),
            work,
            cook,
        }
    }

    pub fn context(&self) -> TimerContext {
        self.context
    }

    /// Switch contexts and reset the controller being left.
    pub fn switch_context(&mut self, to: TimerContext) -> Vec<Event> {
        if to == self.context {
            return Vec::new();
        }
        let mut events: Vec<Event> = self.controller_mut(self.context).reset().into_iter().collect();
        events.extend(self.switch_context_keep_running(to));
        events
    }

    /// Switch contexts without touching either controller.
    pub fn switch_context_keep_running(&mut self, to: TimerContext) -> Vec<Event> {
        if to == self.context {
            return Vec::new();
        }
        let from = std::mem::replace(&mut self.context, to);
        if self.controller(from).is_running() {
            debug!(?from, "leaving a running context in the background");
        }
        info!(?from, ?to, "context switched");
        vec![Event::ContextSwitched {
            from,
            to,
            at: Utc::now(),
        }]
    }

    /// Replace the work rules. Picking a different work mode resets the
    /// cycle; same-mode edits go through the cycle's deferred setters.
    /// Returns whether the cycle was reset.
    ///
    /// # Errors
    ///
    /// Rejects invalid rules; the cycle is left untouched.
    pub fn select_work_mode(&mut self, rules: WorkRules) -> Result<bool, ValidationError> {
        self.work.apply_rules(rules)
    }

    pub fn work(&self) -> &WorkCycle {
        &self.work
    }

    pub fn work_mut(&mut self) -> &mut WorkCycle {
        &mut self.work
    }

    pub fn cook(&self) -> &CookRouter {
        &self.cook
    }

    pub fn cook_mut(&mut self) -> &mut CookRouter {
        &mut self.cook
    }

    /// The controller of the displayed context.
    pub fn active(&self) -> &dyn Countdown {
        self.controller(self.context)
    }

    fn active_mut(&mut self) -> &mut dyn Countdown {
        self.controller_mut(self.context)
    }

    fn controller(&self, context: TimerContext) -> &dyn Countdown {
        match context {
            TimerContext::Work => &self.work,
            TimerContext::Cook => &self.cook,
        }
    }

    fn controller_mut(&mut self, context: TimerContext) -> &mut dyn Countdown {
        match context {
            TimerContext::Work => &mut self.work,
            TimerContext::Cook => &mut self.cook,
        }
    }
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new(WorkCycle::default(), CookRouter::new())
    }
}

impl Countdown for Workbench {
    fn kind(&self) -> TimerKind {
        self.active().kind()
    }

    fn remaining_secs(&self) -> u32 {
        self.active().remaining_secs()
    }

    fn phase_secs(&self) -> u32 {
        self.active().phase_secs()
    }

    fn is_running(&self) -> bool {
        self.active().is_running()
    }

    fn is_complete(&self) -> bool {
        self.active().is_complete()
    }

    fn can_reset(&self) -> bool {
        self.active().can_reset()
    }

    fn phase_label(&self) -> &str {
        self.active().phase_label()
    }

    fn mode(&self) -> Option<Mode> {
        self.active().mode()
    }

    fn phase_index(&self) -> Option<usize> {
        self.active().phase_index()
    }

    fn rounds_for_display(&self) -> Option<u32> {
        self.active().rounds_for_display()
    }

    fn toggle(&mut self) -> Option<Event> {
        self.active_mut().toggle()
    }

    fn reset(&mut self) -> Option<Event> {
        self.active_mut().reset()
    }

    fn tick(&mut self) -> Vec<Event> {
        let mut events = self.work.tick();
        events.extend(self.cook.tick());
        events
    }

    fn wants_tick(&self) -> bool {
        self.work.wants_tick() || self.cook.wants_tick()
    }
}
