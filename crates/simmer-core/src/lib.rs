//! # Simmer Core Library
//!
//! Timer state machines for a focus and cooking timer: pomodoro, deep-work
//! and custom work cycles, single countdowns for pasta and eggs, and
//! phase-sequence timers for sauces and user-defined stages. The `simmer`
//! CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timers**: synchronous state machines behind the [`Countdown`] trait.
//!   They never read the clock; time only moves on `tick()`.
//! - **Tick sources**: [`IntervalTickSource`] drives real time on tokio,
//!   [`ManualTickSource`] drives tests and external loops.
//! - **Driver**: [`TimerDriver`] keeps exactly one tick stream armed per
//!   running timer and broadcasts every [`Event`].
//! - **Catalog / Config**: constant mode tables, and the TOML file the user
//!   edits on top of them.
//!
//! ## Key Components
//!
//! - [`WorkCycle`]: work/break alternation with round counting
//! - [`CookRouter`]: four cook timers behind one control surface
//! - [`Workbench`]: work and cook contexts side by side
//! - [`Config`]: user configuration

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod timer;

pub use catalog::{Catalog, EggVariant, PastaVariant, SauceVariant};
pub use config::Config;
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use timer::{
    CookMode, CookRouter, Countdown, IntervalTickSource, ManualTickSource, Mode, Phase,
    PhaseList, PhaseSequence, SimpleCountdown, TickSource, TimerContext, TimerDriver, TimerKind,
    WorkCycle, WorkMode, WorkRules, Workbench,
};
