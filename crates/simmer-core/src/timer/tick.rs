//! Clock tick sources.
//!
//! A tick source is the single time base behind a running timer. Once armed
//! it invokes its callback once per interval until disarmed, or until the
//! callback itself returns `ControlFlow::Break`.
//!
//! Arming an already armed source always disarms the previous stream first,
//! so a source never drives more than one callback at a time.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

use crate::catalog::TICK_INTERVAL;
use crate::error::Result;

/// Invoked once per tick. Returning `Break` ends the stream.
pub type TickCallback = Box<dyn FnMut() -> ControlFlow<()> + Send + 'static>;

pub trait TickSource: Send {
    /// Start invoking `callback` once per interval, replacing any stream
    /// that is already armed.
    fn arm(&mut self, callback: TickCallback);

    /// Stop all future callbacks. Idempotent.
    fn disarm(&mut self);

    fn is_armed(&self) -> bool;
}

// ── Interval (tokio) ─────────────────────────────────────────────────

/// Real-time tick source backed by a `tokio::time::interval` task.
#[derive(Debug)]
pub struct IntervalTickSource {
    runtime: Handle,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl IntervalTickSource {
    /// One tick per [`TICK_INTERVAL`], spawned on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self::with_period(runtime, TICK_INTERVAL)
    }

    pub fn with_period(runtime: Handle, period: Duration) -> Self {
        Self {
            runtime,
            period,
            task: None,
        }
    }

    /// Use the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn current() -> Result<Self> {
        Ok(Self::new(Handle::try_current()?))
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl TickSource for IntervalTickSource {
    fn arm(&mut self, mut callback: TickCallback) {
        self.disarm();
        let period = self.period;
        trace!(?period, "arming interval tick source");
        let task = self.runtime.spawn(async move {
            // First tick one full period after arming, not immediately.
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if callback().is_break() {
                    break;
                }
            }
        });
        self.task = Some(task);
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            trace!("disarming interval tick source");
            task.abort();
        }
    }

    fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for IntervalTickSource {
    fn drop(&mut self) {
        self.disarm();
    }
}

// ── Manual ───────────────────────────────────────────────────────────

#[derive(Default)]
struct ManualSlot {
    callback: Option<TickCallback>,
    /// Bumped on every arm/disarm so a callback that is mid-flight during
    /// `fire()` is not put back over a newer stream.
    generation: u64,
    arms: usize,
}

/// Deterministic tick source: ticks only when a [`ManualTickHandle`] fires.
///
/// Useful for tests and for callers that already own a clock (a render
/// loop, a terminal event loop).
#[derive(Default)]
pub struct ManualTickSource {
    slot: Arc<Mutex<ManualSlot>>,
}

/// Clone-able handle that fires ticks into a [`ManualTickSource`].
#[derive(Clone)]
pub struct ManualTickHandle {
    slot: Arc<Mutex<ManualSlot>>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ManualTickHandle {
        ManualTickHandle {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl TickSource for ManualTickSource {
    fn arm(&mut self, callback: TickCallback) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        slot.arms += 1;
        slot.callback = Some(callback);
    }

    fn disarm(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.callback.take().is_some() {
            slot.generation += 1;
        }
    }

    fn is_armed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callback
            .is_some()
    }
}

impl ManualTickHandle {
    /// Deliver one tick. Returns false if nothing was armed.
    pub fn fire(&self) -> bool {
        let (generation, mut callback) = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.callback.take() {
                Some(callback) => (slot.generation, callback),
                None => return false,
            }
        };

        let flow = callback();

        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.generation == generation {
            match flow {
                ControlFlow::Continue(()) => slot.callback = Some(callback),
                ControlFlow::Break(()) => slot.generation += 1,
            }
        }
        true
    }

    /// Deliver up to `n` ticks, stopping early once the stream ends.
    /// Returns how many were delivered.
    pub fn fire_n(&self, n: usize) -> usize {
        let mut delivered = 0;
        while delivered < n && self.fire() {
            delivered += 1;
        }
        delivered
    }

    pub fn is_armed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callback
            .is_some()
    }

    /// How many times the source has been armed in total.
    pub fn arm_count(&self) -> usize {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).arms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_callback(counter: &Arc<AtomicUsize>) -> TickCallback {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        })
    }

    #[test]
    fn manual_fire_without_arm_is_noop() {
        let source = ManualTickSource::new();
        let handle = source.handle();
        assert!(!handle.fire());
        assert!(!source.is_armed());
    }

    #[test]
    fn manual_rearm_replaces_previous_stream() {
        let mut source = ManualTickSource::new();
        let handle = source.handle();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        source.arm(counting_callback(&first));
        source.arm(counting_callback(&second));
        handle.fire_n(3);

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 3);
        assert_eq!(handle.arm_count(), 2);
    }

    #[test]
    fn manual_disarm_is_idempotent() {
        let mut source = ManualTickSource::new();
        let handle = source.handle();
        let counter = Arc::new(AtomicUsize::new(0));
        source.arm(counting_callback(&counter));
        source.disarm();
        source.disarm();
        assert!(!handle.fire());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn manual_break_ends_stream() {
        let mut source = ManualTickSource::new();
        let handle = source.handle();
        let counter = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&counter);
        source.arm(Box::new(move || {
            if inner.fetch_add(1, Ordering::SeqCst) + 1 >= 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }));
        assert_eq!(handle.fire_n(5), 2);
        assert!(!source.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_once_per_period() {
        let mut source = IntervalTickSource::current().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        source.arm(counting_callback(&counter));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        source.disarm();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(!source.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_rearm_never_doubles_ticks() {
        let mut source = IntervalTickSource::current().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        source.arm(counting_callback(&counter));
        source.arm(counting_callback(&counter));
        source.arm(counting_callback(&counter));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn interval_requires_runtime() {
        assert!(IntervalTickSource::current().is_err());
    }
}
