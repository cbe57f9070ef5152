use clap::{Args, ValueEnum};
use simmer_core::{Config, WorkCycle, WorkMode};

use super::session::{self, SessionOptions};
use super::CliResult;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WorkModeArg {
    Pomodoro,
    DeepWork,
    Custom,
}

impl From<WorkModeArg> for WorkMode {
    fn from(arg: WorkModeArg) -> Self {
        match arg {
            WorkModeArg::Pomodoro => WorkMode::Pomodoro,
            WorkModeArg::DeepWork => WorkMode::DeepWork,
            WorkModeArg::Custom => WorkMode::Custom,
        }
    }
}

#[derive(Debug, Args)]
pub struct WorkArgs {
    /// Work mode; defaults to the configured one
    #[arg(long, value_enum)]
    mode: Option<WorkModeArg>,
    /// Stop after this many completed phases
    #[arg(long)]
    phases: Option<u32>,
    /// Start each next phase automatically
    #[arg(long)]
    auto: bool,
}

pub async fn run(args: WorkArgs) -> CliResult {
    let config = Config::load()?;
    let mode = args.mode.map_or(config.work.mode, WorkMode::from);
    let cycle = WorkCycle::new(config.work_rules(mode)?)?;
    tracing::debug!(?mode, rules = ?cycle.rules(), "starting work cycle");

    let options = SessionOptions {
        phase_limit: args.phases,
        auto_advance: args.auto || config.auto_advance,
    };
    session::run(cycle, options).await
}
