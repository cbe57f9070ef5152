//! Runs one timer on the real clock until it is done or interrupted.

use simmer_core::catalog::TICK_INTERVAL;
use simmer_core::format::clock;
use simmer_core::{Countdown, Event, IntervalTickSource, TimerDriver};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::CliResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Stop after this many work/break transitions (auto-advance only).
    pub phase_limit: Option<u32>,
    /// Start the next phase without waiting for a toggle.
    pub auto_advance: bool,
}

/// Start `timer` and stream its state until it completes or Ctrl-C arrives.
/// A work cycle stops at its first phase change unless auto-advance is on,
/// then at the phase limit. Prints an `mm:ss` status line per tick and
/// every event as a JSON line.
pub async fn run<C>(timer: C, options: SessionOptions) -> CliResult
where
    C: Countdown + Send + 'static,
{
    let mut driver = TimerDriver::new(timer, IntervalTickSource::current()?);
    let mut events = driver.subscribe();
    let mut display = tokio::time::interval(TICK_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    driver.toggle();
    let mut transitions = 0;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
            _ = display.tick() => {
                let (label, remaining) =
                    driver.with(|t| (t.phase_label().to_string(), t.remaining_secs()));
                println!("{label:<12} {}", clock(remaining));
            }
            received = events.recv() => match received {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    match event {
                        Event::TimerCompleted { .. } => break,
                        Event::ModeChanged { .. } => {
                            transitions += 1;
                            let limit_hit =
                                options.phase_limit.is_some_and(|limit| transitions >= limit);
                            // Without auto-advance nothing would restart the clock.
                            if limit_hit || !options.auto_advance {
                                break;
                            }
                            if !driver.with(|t| t.is_running()) {
                                driver.toggle();
                            }
                        }
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    let snapshot = driver.snapshot();
    println!("{}", serde_json::to_string(&snapshot)?);
    Ok(())
}
