//! Constant mode catalog.
//!
//! Default durations and round counts for every work mode, and the variant
//! tables for every cook mode. Everything here is read-only at run time;
//! user-editable values live in [`crate::config`] and are turned into
//! [`WorkRules`] / [`PhaseList`] values before they reach a timer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::format::minutes_to_seconds;
use crate::timer::{CookMode, Phase, PhaseList, WorkMode, WorkRules};

pub const SECONDS_PER_MINUTE: u32 = 60;
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Longest custom stage label, in characters.
pub const STAGE_LABEL_MAX_CHARS: usize = 16;
/// Minutes given to a newly added custom stage.
pub const NEW_STAGE_MINUTES: u32 = 5;

// ── Work context ─────────────────────────────────────────────────────

/// Default rules for a work mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkModeConfig {
    pub mode: WorkMode,
    pub label: &'static str,
    pub work_minutes: u32,
    pub break_minutes: u32,
    /// `None` means the mode has no long break cycle.
    pub long_break_minutes: Option<u32>,
    /// Sessions before a long break (pomodoro) or rounds per cycle.
    pub rounds: u32,
}

impl WorkModeConfig {
    pub fn rules(&self) -> WorkRules {
        WorkRules {
            mode: self.mode,
            work_secs: minutes_to_seconds(self.work_minutes),
            break_secs: minutes_to_seconds(self.break_minutes),
            long_break_secs: self.long_break_minutes.map(minutes_to_seconds),
            rounds: self.rounds,
        }
    }
}

pub const POMODORO: WorkModeConfig = WorkModeConfig {
    mode: WorkMode::Pomodoro,
    label: "Pomodoro",
    work_minutes: 25,
    break_minutes: 5,
    long_break_minutes: Some(15),
    rounds: 4,
};

pub const DEEP_WORK: WorkModeConfig = WorkModeConfig {
    mode: WorkMode::DeepWork,
    label: "Deep Work",
    work_minutes: 50,
    break_minutes: 10,
    long_break_minutes: None,
    rounds: 3,
};

pub const CUSTOM_WORK: WorkModeConfig = WorkModeConfig {
    mode: WorkMode::Custom,
    label: "Custom",
    work_minutes: 25,
    break_minutes: 5,
    long_break_minutes: None,
    rounds: 4,
};

pub fn work_mode_config(mode: WorkMode) -> &'static WorkModeConfig {
    match mode {
        WorkMode::Pomodoro => &POMODORO,
        WorkMode::DeepWork => &DEEP_WORK,
        WorkMode::Custom => &CUSTOM_WORK,
    }
}

// ── Cook context ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PastaVariant {
    Fresh,
    Thin,
    #[default]
    Medium,
    Thick,
}

impl PastaVariant {
    pub const ALL: [PastaVariant; 4] = [Self::Fresh, Self::Thin, Self::Medium, Self::Thick];

    pub fn label(self) -> &'static str {
        match self {
            Self::Fresh => "Fresh",
            Self::Thin => "Thin",
            Self::Medium => "Regular",
            Self::Thick => "Thick",
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::Fresh => 3,
            Self::Thin => 8,
            Self::Medium => 11,
            Self::Thick => 14,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Fresh => "Fresh pasta (tagliatelle, pappardelle), 3 min",
            Self::Thin => "Thin dry pasta (spaghetti, linguine), 8 min",
            Self::Medium => "Regular dry pasta (penne, rigatoni, fusilli), 11 min",
            Self::Thick => "Thick dry pasta (paccheri, reginette), 14 min",
        }
    }

    pub fn seconds(self) -> u32 {
        minutes_to_seconds(self.minutes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EggVariant {
    Soft,
    #[default]
    Medium,
    Hard,
}

impl EggVariant {
    pub const ALL: [EggVariant; 3] = [Self::Soft, Self::Medium, Self::Hard];

    pub fn label(self) -> &'static str {
        match self {
            Self::Soft => "Soft",
            Self::Medium => "Jammy",
            Self::Hard => "Hard",
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::Soft => 4,
            Self::Medium => 7,
            Self::Hard => 12,
        }
    }

    pub fn seconds(self) -> u32 {
        minutes_to_seconds(self.minutes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SauceVariant {
    #[default]
    Quick,
    Slow,
}

impl SauceVariant {
    pub const ALL: [SauceVariant; 2] = [Self::Quick, Self::Slow];

    pub fn label(self) -> &'static str {
        match self {
            Self::Quick => "Quick",
            Self::Slow => "Slow",
        }
    }

    /// Soffritto, tomatoes, then a reduction; the slow sauce sweats the
    /// onion longer and simmers on low heat.
    pub fn phases(self) -> PhaseList {
        let (soffritto, simmer) = match self {
            Self::Quick => (5, 15),
            Self::Slow => (8, 40),
        };
        PhaseList::from_static([
            Phase::from_catalog("Soffritto", soffritto),
            Phase::from_catalog("Add tomatoes", 2),
            Phase::from_catalog("Simmer", simmer),
        ])
    }
}

/// The stage list a fresh custom cook timer starts with.
pub fn default_custom_stages() -> PhaseList {
    PhaseList::from_static([Phase::from_catalog("Stage 1", NEW_STAGE_MINUTES)])
}

pub fn cook_mode_label(mode: CookMode) -> &'static str {
    match mode {
        CookMode::Pasta => "Pasta",
        CookMode::Egg => "Egg",
        CookMode::Sauce => "Sauce",
        CookMode::Custom => "Custom",
    }
}

// ── Export ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct VariantEntry {
    pub id: String,
    pub label: &'static str,
    pub minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SauceEntry {
    pub id: String,
    pub label: &'static str,
    pub phases: PhaseList,
}

/// The whole catalog in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub work_modes: Vec<WorkModeConfig>,
    pub pasta: Vec<VariantEntry>,
    pub egg: Vec<VariantEntry>,
    pub sauce: Vec<SauceEntry>,
    pub custom_stages: PhaseList,
}

fn variant_id<T: Serialize>(variant: T) -> String {
    serde_json::to_value(variant)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

impl Catalog {
    pub fn build() -> Self {
        Self {
            work_modes: vec![POMODORO, DEEP_WORK, CUSTOM_WORK],
            pasta: PastaVariant::ALL
                .iter()
                .map(|&v| VariantEntry {
                    id: variant_id(v),
                    label: v.label(),
                    minutes: v.minutes(),
                    description: Some(v.description()),
                })
                .collect(),
            egg: EggVariant::ALL
                .iter()
                .map(|&v| VariantEntry {
                    id: variant_id(v),
                    label: v.label(),
                    minutes: v.minutes(),
                    description: None,
                })
                .collect(),
            sauce: SauceVariant::ALL
                .iter()
                .map(|&v| SauceEntry {
                    id: variant_id(v),
                    label: v.label(),
                    phases: v.phases(),
                })
                .collect(),
            custom_stages: default_custom_stages(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pomodoro_defaults() {
        let rules = POMODORO.rules();
        assert_eq!(rules.work_secs, 25 * 60);
        assert_eq!(rules.break_secs, 5 * 60);
        assert_eq!(rules.long_break_secs, Some(15 * 60));
        assert_eq!(rules.rounds, 4);
    }

    #[test]
    fn deep_work_has_no_long_break() {
        assert_eq!(DEEP_WORK.rules().long_break_secs, None);
        assert_eq!(DEEP_WORK.rounds, 3);
    }

    #[test]
    fn sauce_totals() {
        assert_eq!(SauceVariant::Quick.phases().total_secs(), (5 + 2 + 15) * 60);
        assert_eq!(SauceVariant::Slow.phases().total_secs(), (8 + 2 + 40) * 60);
        assert_eq!(SauceVariant::Slow.phases()[2].label, "Simmer");
    }

    #[test]
    fn variant_defaults_match_catalog() {
        assert_eq!(PastaVariant::default().label(), "Regular");
        assert_eq!(EggVariant::default().label(), "Jammy");
        assert_eq!(SauceVariant::default(), SauceVariant::Quick);
    }

    #[test]
    fn catalog_exports_ids() {
        let catalog = Catalog::build();
        let ids: Vec<_> = catalog.pasta.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["fresh", "thin", "medium", "thick"]);
        assert_eq!(
            catalog.pasta[2].description,
            Some("Regular dry pasta (penne, rigatoni, fusilli), 11 min")
        );
        assert!(catalog.egg.iter().all(|e| e.description.is_none()));
        assert_eq!(catalog.custom_stages.len(), 1);
    }
}
