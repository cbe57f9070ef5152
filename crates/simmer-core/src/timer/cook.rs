//! Cook timer router.
//!
//! Four independent timers sit behind one control surface: pasta and egg
//! are single countdowns, sauce and custom stages are phase sequences. The
//! selected one answers every [`Countdown`] query and command; the others
//! keep their own progress, and keep ticking if they were left running.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::countdown::SimpleCountdown;
use super::sequence::{PhaseList, PhaseSequence};
use super::traits::{Countdown, TimerKind};
use crate::catalog::{default_custom_stages, EggVariant, PastaVariant, SauceVariant};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookMode {
    #[default]
    Pasta,
    Egg,
    Sauce,
    Custom,
}

impl CookMode {
    pub const ALL: [CookMode; 4] = [Self::Pasta, Self::Egg, Self::Sauce, Self::Custom];

    pub fn label(self) -> &'static str {
        crate::catalog::cook_mode_label(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookRouter {
    mode: CookMode,
    pasta_variant: PastaVariant,
    egg_variant: EggVariant,
    sauce_variant: SauceVariant,
    pasta: SimpleCountdown,
    egg: SimpleCountdown,
    sauce: PhaseSequence,
    custom: PhaseSequence,
}

impl CookRouter {
    /// Router on catalog defaults with the pasta timer selected.
    pub fn new() -> Self {
        Self::with_variants(
            PastaVariant::default(),
            EggVariant::default(),
            SauceVariant::default(),
            default_custom_stages(),
        )
    }

    pub fn with_variants(
        pasta: PastaVariant,
        egg: EggVariant,
        sauce: SauceVariant,
        custom_stages: PhaseList,
    ) -> Self {
        Self {
            mode: CookMode::default(),
            pasta_variant: pasta,
            egg_variant: egg,
            sauce_variant: sauce,
            pasta: catalog_countdown(TimerKind::Pasta, pasta.label(), pasta.seconds()),
            egg: catalog_countdown(TimerKind::Egg, egg.label(), egg.seconds()),
            sauce: PhaseSequence::new(TimerKind::Sauce, sauce.phases()),
            custom: PhaseSequence::new(TimerKind::CustomStages, custom_stages),
        }
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn cook_mode(&self) -> CookMode {
        self.mode
    }

    /// Switch the displayed timer. Nothing is reset or paused.
    pub fn select(&mut self, mode: CookMode) {
        if mode != self.mode {
            debug!(from = ?self.mode, to = ?mode, "cook mode selected");
        }
        self.mode = mode;
    }

    pub fn active(&self) -> &dyn Countdown {
        match self.mode {
            CookMode::Pasta => &self.pasta,
            CookMode::Egg => &self.egg,
            CookMode::Sauce => &self.sauce,
            CookMode::Custom => &self.custom,
        }
    }

    fn active_mut(&mut self) -> &mut dyn Countdown {
        match self.mode {
            CookMode::Pasta => &mut self.pasta,
            CookMode::Egg => &mut self.egg,
            CookMode::Sauce => &mut self.sauce,
            CookMode::Custom => &mut self.custom,
        }
    }

    fn all_mut(&mut self) -> [&mut dyn Countdown; 4] {
        [
            &mut self.pasta,
            &mut self.egg,
            &mut self.sauce,
            &mut self.custom,
        ]
    }

    // ── Variants ─────────────────────────────────────────────────────

    pub fn pasta_variant(&self) -> PastaVariant {
        self.pasta_variant
    }

    pub fn egg_variant(&self) -> EggVariant {
        self.egg_variant
    }

    pub fn sauce_variant(&self) -> SauceVariant {
        self.sauce_variant
    }

    /// Takes effect now when the pasta timer is idle, on its next reset
    /// otherwise.
    pub fn set_pasta_variant(&mut self, variant: PastaVariant) {
        self.pasta_variant = variant;
        self.pasta.set_label(variant.label());
        apply_catalog_duration(&mut self.pasta, variant.seconds());
    }

    pub fn set_egg_variant(&mut self, variant: EggVariant) {
        self.egg_variant = variant;
        self.egg.set_label(variant.label());
        apply_catalog_duration(&mut self.egg, variant.seconds());
    }

    /// A different recipe restarts the sauce sequence from its first phase.
    pub fn set_sauce_variant(&mut self, variant: SauceVariant) {
        self.sauce_variant = variant;
        self.sauce.load(variant.phases());
    }

    /// Swap in an edited stage list. Returns whether the custom sequence was
    /// restarted; an identical list keeps its progress.
    pub fn set_custom_stages(&mut self, stages: PhaseList) -> bool {
        self.custom.load(stages)
    }

    // ── Sub-timers ───────────────────────────────────────────────────

    pub fn pasta(&self) -> &SimpleCountdown {
        &self.pasta
    }

    pub fn egg(&self) -> &SimpleCountdown {
        &self.egg
    }

    pub fn sauce(&self) -> &PhaseSequence {
        &self.sauce
    }

    pub fn custom(&self) -> &PhaseSequence {
        &self.custom
    }

    pub fn sauce_phases(&self) -> &PhaseList {
        self.sauce.phases()
    }

    pub fn custom_stages(&self) -> &PhaseList {
        self.custom.phases()
    }

    /// The sequence behind the selected mode, if it is a sequence.
    pub fn active_sequence(&self) -> Option<&PhaseSequence> {
        match self.mode {
            CookMode::Sauce => Some(&self.sauce),
            CookMode::Custom => Some(&self.custom),
            CookMode::Pasta | CookMode::Egg => None,
        }
    }
}

impl Default for CookRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn catalog_countdown(kind: TimerKind, label: &'static str, secs: u32) -> SimpleCountdown {
    SimpleCountdown::from_catalog(kind, label, secs)
}

fn apply_catalog_duration(timer: &mut SimpleCountdown, secs: u32) {
    if let Err(err) = timer.set_duration(secs) {
        warn!(%err, "catalog duration rejected");
    }
}

impl Countdown for CookRouter {
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

    fn phase_index(&self) -> Option<usize> {
        self.active().phase_index()
    }

    fn toggle(&mut self) -> Option<Event> {
        self.active_mut().toggle()
    }

    /// Resets all four timers, not just the selected one.
    fn reset(&mut self) -> Option<Event> {
        for timer in self.all_mut() {
            timer.reset();
        }
        debug!("all cook timers reset");
        Some(Event::CookTimersReset { at: Utc::now() })
    }

    /// Every sub-timer sees the tick; idle ones ignore it.
    fn tick(&mut self) -> Vec<Event> {
        self.all_mut()
            .into_iter()
            .flat_map(|timer| timer.tick())
            .collect()
    }

    fn wants_tick(&self) -> bool {
        self.pasta.is_running()
            || self.egg.is_running()
            || self.sauce.is_running()
            || self.custom.is_running()
    }
}
