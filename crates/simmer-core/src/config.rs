//! TOML-based user configuration.
//!
//! Stores the user-editable side of the catalog:
//! - the selected work mode and per-mode durations
//! - the selected cook mode, variant picks and custom stages
//! - whether phases advance without a toggle
//!
//! Configuration is stored at `~/.config/simmer/config.toml`, or under
//! `$SIMMER_CONFIG_DIR` when that is set.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{
    default_custom_stages, EggVariant, PastaVariant, SauceVariant, CUSTOM_WORK, DEEP_WORK,
    POMODORO, SECONDS_PER_MINUTE,
};
use crate::error::ConfigError;
use crate::format::minutes_to_seconds;
use crate::timer::{
    CookMode, CookRouter, Phase, PhaseList, WorkCycle, WorkMode, WorkRules, Workbench,
};

const CONFIG_FILE: &str = "config.toml";

/// Returns the config directory, creating it if needed.
///
/// `$SIMMER_CONFIG_DIR` wins when set. Otherwise `~/.config/simmer[-dev]/`,
/// picked by `SIMMER_ENV=dev`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SIMMER_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SIMMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("simmer-dev")
            } else {
                base_dir.join("simmer")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Pomodoro durations, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_pomodoro_work")]
    pub work_minutes: u32,
    #[serde(default = "default_pomodoro_break")]
    pub break_minutes: u32,
    #[serde(default = "default_pomodoro_long_break")]
    pub long_break_minutes: u32,
    #[serde(default = "default_pomodoro_sessions")]
    pub sessions_before_long_break: u32,
}

/// A work/break cycle without a long break, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub rounds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkConfig {
    #[serde(default)]
    pub mode: WorkMode,
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default = "default_deep_work")]
    pub deep_work: CycleConfig,
    #[serde(default = "default_custom_work")]
    pub custom: CycleConfig,
}

/// One custom cook stage, in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub label: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookConfig {
    #[serde(default)]
    pub mode: CookMode,
    #[serde(default)]
    pub pasta: PastaVariant,
    #[serde(default)]
    pub egg: EggVariant,
    #[serde(default)]
    pub sauce: SauceVariant,
    #[serde(default = "default_stages")]
    pub custom_stages: Vec<StageConfig>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/simmer/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Start the next work phase without waiting for a toggle.
    #[serde(default)]
    pub auto_advance: bool,
    #[serde(default)]
    pub work: WorkConfig,
    #[serde(default)]
    pub cook: CookConfig,
}

// Default functions
fn default_pomodoro_work() -> u32 {
    POMODORO.work_minutes
}
fn default_pomodoro_break() -> u32 {
    POMODORO.break_minutes
}
fn default_pomodoro_long_break() -> u32 {
    POMODORO.long_break_minutes.unwrap_or(15)
}
fn default_pomodoro_sessions() -> u32 {
    POMODORO.rounds
}
fn default_deep_work() -> CycleConfig {
    CycleConfig {
        work_minutes: DEEP_WORK.work_minutes,
        break_minutes: DEEP_WORK.break_minutes,
        rounds: DEEP_WORK.rounds,
    }
}
fn default_custom_work() -> CycleConfig {
    CycleConfig {
        work_minutes: CUSTOM_WORK.work_minutes,
        break_minutes: CUSTOM_WORK.break_minutes,
        rounds: CUSTOM_WORK.rounds,
    }
}
fn default_stages() -> Vec<StageConfig> {
    default_custom_stages()
        .iter()
        .map(|phase| StageConfig {
            label: phase.label.clone(),
            minutes: phase.seconds / 60,
        })
        .collect()
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_pomodoro_work(),
            break_minutes: default_pomodoro_break(),
            long_break_minutes: default_pomodoro_long_break(),
            sessions_before_long_break: default_pomodoro_sessions(),
        }
    }
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            mode: WorkMode::default(),
            pomodoro: PomodoroConfig::default(),
            deep_work: default_deep_work(),
            custom: default_custom_work(),
        }
    }
}

impl Default for CookConfig {
    fn default() -> Self {
        Self {
            mode: CookMode::default(),
            pasta: PastaVariant::default(),
            egg: EggVariant::default(),
            sauce: SauceVariant::default(),
            custom_stages: default_stages(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_advance: false,
            work: WorkConfig::default(),
            cook: CookConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        if key.is_empty() {
            return Err(unknown());
        }
        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|e| invalid(e.to_string()))?,
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Path of the config file inside [`data_dir`].
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory is unavailable.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join(CONFIG_FILE))
    }

    /// Load from disk, writing the defaults out on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation, or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
                cfg.validate()?;
                debug!(path = %path.display(), "config loaded");
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                info!(path = %path.display(), "wrote default config");
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string())),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key in memory. The new value must parse
    /// as the type already stored under the key, and the whole config must
    /// still validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is rejected;
    /// the config is unchanged in that case.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// [`Config::set_value`], then save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value is rejected,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Work rules for `mode` with the user's durations applied.
    ///
    /// # Errors
    ///
    /// Rejects zero durations or rounds.
    pub fn work_rules(&self, mode: WorkMode) -> Result<WorkRules, ConfigError> {
        let rules = match mode {
            WorkMode::Pomodoro => {
                let p = &self.work.pomodoro;
                WorkRules {
                    mode,
                    work_secs: minutes_to_seconds(p.work_minutes),
                    break_secs: minutes_to_seconds(p.break_minutes),
                    long_break_secs: Some(minutes_to_seconds(p.long_break_minutes)),
                    rounds: p.sessions_before_long_break,
                }
            }
            WorkMode::DeepWork => cycle_rules(mode, &self.work.deep_work),
            WorkMode::Custom => cycle_rules(mode, &self.work.custom),
        };
        rules.validate().map_err(|e| prefixed(work_table(mode), e))?;
        Ok(rules)
    }

    /// # Errors
    ///
    /// Rejects an empty list or a zero-minute stage.
    pub fn custom_stages(&self) -> Result<PhaseList, ConfigError> {
        let phases = self
            .cook
            .custom_stages
            .iter()
            .map(|stage| Phase::from_minutes(stage.label.as_str(), stage.minutes))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| prefixed("cook.custom_stages", e))?;
        PhaseList::new(phases).map_err(|e| prefixed("cook.custom_stages", e))
    }

    /// Store an edited stage list. Stages are kept in whole minutes.
    ///
    /// # Errors
    ///
    /// Rejects a stage that is not a whole number of minutes; the config is
    /// unchanged in that case.
    pub fn set_custom_stages(&mut self, stages: &PhaseList) -> Result<(), ConfigError> {
        let stored = stages
            .iter()
            .map(|phase| {
                if phase.seconds % SECONDS_PER_MINUTE != 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "cook.custom_stages".to_string(),
                        message: format!(
                            "stage '{}' lasts {}s, not a whole number of minutes",
                            phase.label, phase.seconds
                        ),
                    });
                }
                Ok(StageConfig {
                    label: phase.label.clone(),
                    minutes: phase.seconds / SECONDS_PER_MINUTE,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.cook.custom_stages = stored;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for mode in WorkMode::ALL {
            self.work_rules(mode)?;
        }
        self.custom_stages()?;
        Ok(())
    }

    /// Cook router on the configured variants, with the configured cook
    /// mode selected.
    ///
    /// # Errors
    ///
    /// Rejects invalid custom stages.
    pub fn cook_router(&self) -> Result<CookRouter, ConfigError> {
        let mut router = CookRouter::with_variants(
            self.cook.pasta,
            self.cook.egg,
            self.cook.sauce,
            self.custom_stages()?,
        );
        router.select(self.cook.mode);
        Ok(router)
    }

    /// Work cycle on the configured mode.
    ///
    /// # Errors
    ///
    /// Rejects invalid durations.
    pub fn work_cycle(&self) -> Result<WorkCycle, ConfigError> {
        Ok(WorkCycle::new(self.work_rules(self.work.mode)?)?)
    }

    /// # Errors
    ///
    /// Rejects any invalid value.
    pub fn workbench(&self) -> Result<Workbench, ConfigError> {
        Ok(Workbench::new(self.work_cycle()?, self.cook_router()?))
    }
}

fn cycle_rules(mode: WorkMode, cycle: &CycleConfig) -> WorkRules {
    WorkRules {
        mode,
        work_secs: minutes_to_seconds(cycle.work_minutes),
        break_secs: minutes_to_seconds(cycle.break_minutes),
        long_break_secs: None,
        rounds: cycle.rounds,
    }
}

fn work_table(mode: WorkMode) -> &'static str {
    match mode {
        WorkMode::Pomodoro => "work.pomodoro",
        WorkMode::DeepWork => "work.deep_work",
        WorkMode::Custom => "work.custom",
    }
}

fn prefixed(table: &str, err: crate::error::ValidationError) -> ConfigError {
    ConfigError::InvalidValue {
        key: table.to_string(),
        message: err.to_string(),
    }
}
