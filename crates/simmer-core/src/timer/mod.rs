mod context;
mod cook;
mod countdown;
mod driver;
mod sequence;
mod tick;
mod traits;
mod work_cycle;

pub use context::{TimerContext, Workbench};
pub use cook::{CookMode, CookRouter};
pub use countdown::SimpleCountdown;
pub use driver::TimerDriver;
pub use sequence::{Phase, PhaseList, PhaseSequence};
pub use tick::{IntervalTickSource, ManualTickHandle, ManualTickSource, TickCallback, TickSource};
pub use traits::{Countdown, TimerKind};
pub use work_cycle::{Mode, WorkCycle, WorkMode, WorkRules};
