//! Couples a [`Countdown`] to a [`TickSource`].
//!
//! The driver owns the only tick stream for its timer. Every command goes
//! through [`TimerDriver::command`], which re-syncs the source afterwards:
//! armed while the timer wants ticks, disarmed otherwise. Each arm bumps an
//! epoch, and a callback that wakes up under a stale epoch ends its stream
//! without touching the timer, so a reset or a quick pause/resume can never
//! leave two streams decrementing the same countdown.
//!
//! Whether the current stream is live is tracked next to the timer, not
//! asked of the source. A stream that decides to stop clears the flag under
//! the same lock as its last tick, before any event goes out, so a
//! subscriber that restarts the timer on that event always gets a new
//! stream.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::tick::TickSource;
use super::traits::Countdown;
use crate::events::Event;

const EVENT_CAPACITY: usize = 64;

struct Shared<C> {
    timer: C,
    epoch: u64,
    /// The stream armed under `epoch` has not ended yet.
    live: bool,
}

pub struct TimerDriver<C, S: TickSource> {
    shared: Arc<Mutex<Shared<C>>>,
    source: S,
    events: broadcast::Sender<Event>,
}

impl<C, S> TimerDriver<C, S>
where
    C: Countdown + Send + 'static,
    S: TickSource,
{
    pub fn new(timer: C, source: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut driver = Self {
            shared: Arc::new(Mutex::new(Shared {
                timer,
                epoch: 0,
                live: false,
            })),
            source,
            events,
        };
        // A timer handed over mid-run keeps running.
        driver.sync();
        driver
    }

    /// Receive every event the timer emits from now on, including ones
    /// produced by ticks.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Read the timer under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&lock(&self.shared).timer)
    }

    /// Mutate the timer without publishing anything, then re-sync the
    /// tick source.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut C) -> R) -> R {
        let out = f(&mut lock(&self.shared).timer);
        self.sync();
        out
    }

    /// Run a command, publish the events it returns and re-sync the tick
    /// source.
    pub fn command<I>(&mut self, f: impl FnOnce(&mut C) -> I) -> Vec<Event>
    where
        I: IntoIterator<Item = Event>,
    {
        let events: Vec<Event> = f(&mut lock(&self.shared).timer).into_iter().collect();
        publish(&self.events, &events);
        self.sync();
        events
    }

    pub fn toggle(&mut self) -> Vec<Event> {
        self.command(|timer| timer.toggle())
    }

    /// The stream is torn down before the timer is touched so no tick can
    /// land between the two.
    pub fn reset(&mut self) -> Vec<Event> {
        self.retire_stream();
        self.command(|timer| timer.reset())
    }

    pub fn snapshot(&self) -> Event {
        self.with(|timer| timer.snapshot())
    }

    /// Whether a tick stream is live for the current epoch.
    pub fn is_ticking(&self) -> bool {
        lock(&self.shared).live
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Arm or disarm the source to match the timer.
    pub fn sync(&mut self) {
        let (wants_tick, live) = {
            let shared = lock(&self.shared);
            (shared.timer.wants_tick(), shared.live)
        };
        match (wants_tick, live) {
            (true, false) => self.arm(),
            (false, true) => self.retire_stream(),
            // A stream that ended on its own may still hold a finished task.
            (false, false) => self.source.disarm(),
            (true, true) => {}
        }
    }

    fn arm(&mut self) {
        self.source.disarm();
        let epoch = {
            let mut shared = lock(&self.shared);
            shared.epoch += 1;
            shared.live = true;
            shared.epoch
        };
        debug!(epoch, "tick stream armed");

        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        self.source.arm(Box::new(move || {
            let (emitted, keep_going) = {
                let mut guard = lock(&shared);
                if guard.epoch != epoch {
                    trace!(epoch, current = guard.epoch, "stale tick stream");
                    return ControlFlow::Break(());
                }
                let emitted = guard.timer.tick();
                let keep_going = guard.timer.wants_tick();
                if !keep_going {
                    guard.live = false;
                }
                (emitted, keep_going)
            };
            publish(&events, &emitted);
            if keep_going {
                ControlFlow::Continue(())
            } else {
                trace!(epoch, "tick stream finished");
                ControlFlow::Break(())
            }
        }));
    }

    fn retire_stream(&mut self) {
        {
            let mut shared = lock(&self.shared);
            shared.epoch += 1;
            shared.live = false;
        }
        self.source.disarm();
    }
}

impl<C, S: TickSource> Drop for TimerDriver<C, S> {
    fn drop(&mut self) {
        self.source.disarm();
    }
}

fn lock<C>(shared: &Mutex<Shared<C>>) -> MutexGuard<'_, Shared<C>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn publish(sender: &broadcast::Sender<Event>, events: &[Event]) {
    for event in events {
        // No subscribers is fine.
        let _ = sender.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{
        CookMode, CookRouter, ManualTickHandle, ManualTickSource, Mode, SimpleCountdown,
        TickCallback, TimerKind, WorkCycle, WorkRules,
    };
    use pretty_assertions::assert_eq;

    fn countdown_driver(secs: u32) -> (TimerDriver<SimpleCountdown, ManualTickSource>, ManualTickHandle) {
        let source = ManualTickSource::new();
        let handle = source.handle();
        let timer = SimpleCountdown::new(TimerKind::Egg, "Soft", secs).unwrap();
        (TimerDriver::new(timer, source), handle)
    }

    fn remaining<C: Countdown + Send + 'static>(driver: &TimerDriver<C, ManualTickSource>) -> u32 {
        driver.with(|timer| timer.remaining_secs())
    }

    #[test]
    fn idle_timer_is_not_armed() {
        let (driver, handle) = countdown_driver(10);
        assert!(!driver.is_ticking());
        assert!(!handle.fire());
    }

    #[test]
    fn toggle_arms_and_pause_disarms() {
        let (mut driver, handle) = countdown_driver(10);
        driver.toggle();
        assert!(driver.is_ticking());
        assert_eq!(handle.fire_n(3), 3);
        assert_eq!(remaining(&driver), 7);

        driver.toggle();
        assert!(!driver.is_ticking());
        assert!(!handle.fire());
        assert_eq!(remaining(&driver), 7);
    }

    #[test]
    fn rapid_pause_resume_never_double_decrements() {
        let (mut driver, handle) = countdown_driver(10);
        for _ in 0..5 {
            driver.toggle();
            driver.toggle();
        }
        driver.toggle();
        assert!(handle.fire());
        assert_eq!(remaining(&driver), 9);
        assert_eq!(handle.arm_count(), 6);
    }

    #[test]
    fn completion_ends_the_stream() {
        let (mut driver, handle) = countdown_driver(2);
        driver.toggle();
        assert_eq!(handle.fire_n(10), 2);
        assert!(!driver.is_ticking());
        assert!(driver.with(|timer| timer.is_complete()));
    }

    #[test]
    fn reset_disarms_before_reseeding() {
        let (mut driver, handle) = countdown_driver(10);
        driver.toggle();
        handle.fire_n(4);
        let events = driver.reset();
        assert!(matches!(events[..], [Event::TimerReset { .. }]));
        assert!(!driver.is_ticking());
        assert!(!handle.fire());
        assert_eq!(remaining(&driver), 10);
    }

    #[test]
    fn tick_events_reach_subscribers() {
        let (mut driver, handle) = countdown_driver(2);
        let mut rx = driver.subscribe();
        driver.toggle();
        handle.fire_n(2);

        assert!(matches!(rx.try_recv(), Ok(Event::TimerStarted { remaining_secs: 2, .. })));
        assert!(matches!(
            rx.try_recv(),
            Ok(Event::TimerCompleted { timer: TimerKind::Egg, .. })
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn work_phase_completion_stops_until_toggled() {
        let source = ManualTickSource::new();
        let handle = source.handle();
        let rules = WorkRules::custom(1, 1, 2).unwrap();
        let mut driver = TimerDriver::new(WorkCycle::new(rules).unwrap(), source);
        let mut rx = driver.subscribe();

        driver.toggle();
        assert_eq!(handle.fire_n(120), 60);
        assert!(!driver.is_ticking());
        assert_eq!(driver.with(|cycle| cycle.current_mode()), Mode::Break);

        let _started = rx.try_recv();
        assert!(matches!(
            rx.try_recv(),
            Ok(Event::ModeChanged { from: Mode::Work, to: Mode::Break, .. })
        ));

        driver.toggle();
        assert!(driver.is_ticking());
    }

    #[test]
    fn update_resyncs_after_background_edits() {
        let source = ManualTickSource::new();
        let handle = source.handle();
        let mut driver = TimerDriver::new(CookRouter::new(), source);

        driver.toggle();
        driver.update(|router| router.select(CookMode::Egg));
        // The pasta timer is still running in the background.
        assert!(driver.is_ticking());
        handle.fire_n(5);
        assert_eq!(driver.with(|router| router.pasta().remaining_secs()), 11 * 60 - 5);
        assert!(!driver.with(|router| router.is_running()));
    }

    #[test]
    fn running_timer_is_armed_on_construction() {
        let source = ManualTickSource::new();
        let handle = source.handle();
        let mut timer = SimpleCountdown::new(TimerKind::Pasta, "Fresh", 5).unwrap();
        timer.toggle();
        let driver = TimerDriver::new(timer, source);
        assert!(driver.is_ticking());
        assert!(handle.fire());
        assert_eq!(remaining(&driver), 4);
    }

    /// Reports itself armed until explicitly disarmed, like an interval task
    /// that has returned `Break` but not yet been reaped.
    struct LingeringSource {
        inner: ManualTickSource,
        armed: bool,
    }

    impl TickSource for LingeringSource {
        fn arm(&mut self, callback: TickCallback) {
            self.inner.arm(callback);
            self.armed = true;
        }

        fn disarm(&mut self) {
            self.inner.disarm();
            self.armed = false;
        }

        fn is_armed(&self) -> bool {
            self.armed
        }
    }

    #[test]
    fn restart_after_phase_end_rearms_even_if_old_stream_lingers() {
        let inner = ManualTickSource::new();
        let handle = inner.handle();
        let source = LingeringSource { inner, armed: false };
        let rules = WorkRules::custom(1, 1, 2).unwrap();
        let mut driver = TimerDriver::new(WorkCycle::new(rules).unwrap(), source);

        driver.toggle();
        assert_eq!(handle.fire_n(120), 60);
        assert!(driver.source().is_armed());
        assert!(!driver.is_ticking());

        driver.toggle();
        assert!(driver.is_ticking());
        assert_eq!(handle.arm_count(), 2);
        assert!(handle.fire());
        assert_eq!(driver.with(|cycle| cycle.remaining_secs()), 59);
    }

    #[test]
    fn ended_stream_is_reported_before_its_last_events_arrive() {
        let (mut driver, handle) = countdown_driver(1);
        let mut rx = driver.subscribe();
        driver.toggle();
        let _started = rx.try_recv();
        handle.fire();
        assert!(matches!(rx.try_recv(), Ok(Event::TimerCompleted { .. })));
        assert!(!driver.is_ticking());

        driver.update(|timer| timer.set_duration(3).unwrap());
        driver.toggle();
        assert!(driver.is_ticking());
        assert_eq!(handle.fire_n(5), 3);
    }
}
