use std::error::Error;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Errors raised by the periodic trigger
pub mod error;

use error::TimingError;

/// What an action reports back to the trigger after a firing.
///
/// An `Err` is logged and the schedule carries on; the next firing has already been armed by the
/// time the action runs.
pub type ActionResult = Result<(), Box<dyn Error + Send + Sync>>;

type Action<S> = dyn Fn(S) -> ActionResult + Send + Sync;

/// Everything guarded by the trigger's lock.
struct Schedule<S> {
    running: bool,

    /// Bumped every time a firing is armed or cancelled. A waiting thread only fires if the
    /// generation it was armed with is still the current one.
    generation: u64,

    firings: u64,

    /// Caller state handed to the action as a snapshot on every firing.
    state: S,
}

struct Shared<S> {
    interval: Duration,
    schedule: Mutex<Schedule<S>>,
    cancelled: Condvar,
    action: Box<Action<S>>,
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Schedule<S>> {
        // the action never runs under this lock, so a poisoned lock still holds a consistent schedule
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel(&self, schedule: &mut Schedule<S>) {
        schedule.running = false;
        schedule.generation = schedule.generation.wrapping_add(1);
        self.cancelled.notify_all();
    }
}

/// Invokes an action repeatedly, roughly every `interval`, until it is stopped or dropped.
///
/// The trigger is armed as soon as it is constructed. Each armed firing waits on its own thread;
/// when the deadline passes the trigger first re-arms itself for the next firing and only then
/// runs the action, outside of the lock. A slow action therefore neither delays the cadence nor
/// blocks [`Trigger::stop`], and two actions may overlap if one of them runs longer than
/// `interval`.
///
/// `S` is an optional piece of state owned by the trigger. It lives under the same lock as the
/// running flag, can be changed with [`Trigger::update`] from any thread, and every firing passes
/// a consistent snapshot of it to the action.
pub struct Trigger<S = ()> {
    shared: Arc<Shared<S>>,
}

impl Trigger<()> {
    /// Create a trigger running a stateless action and arm its first firing.
    pub fn new<F>(interval: Duration, action: F) -> Result<Self, TimingError>
    where
        F: Fn() -> ActionResult + Send + Sync + 'static,
    {
        Self::with_state(interval, (), move |()| action())
    }
}

impl<S: Clone + Send + 'static> Trigger<S> {
    /// Create a trigger that owns `state` and arm its first firing.
    pub fn with_state<F>(interval: Duration, state: S, action: F) -> Result<Self, TimingError>
    where
        F: Fn(S) -> ActionResult + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(TimingError::InvalidInterval);
        }
        let trigger = Self {
            shared: Arc::new(Shared {
                interval,
                schedule: Mutex::new(Schedule {
                    running: false,
                    generation: 0,
                    firings: 0,
                    state,
                }),
                cancelled: Condvar::new(),
                action: Box::new(action),
            }),
        };
        trigger.start()?;
        Ok(trigger)
    }

    /// Arm the next firing `interval` from now. Does nothing if a firing is already pending.
    pub fn start(&self) -> Result<(), TimingError> {
        let mut schedule = self.shared.lock();
        arm(&self.shared, &mut schedule)
    }

    /// Cancel the pending firing. An action that is already running is not interrupted.
    pub fn stop(&self) -> Result<(), TimingError> {
        let mut schedule = self.shared.lock();
        if !schedule.running {
            return Err(TimingError::invalid_state(
                "stop called on a trigger that is not running",
            ));
        }
        self.shared.cancel(&mut schedule);
        Ok(())
    }

    /// Stop the trigger if it is running, start it otherwise.
    pub fn toggle(&self) -> Result<(), TimingError> {
        let mut schedule = self.shared.lock();
        if schedule.running {
            self.shared.cancel(&mut schedule);
            Ok(())
        } else {
            arm(&self.shared, &mut schedule)
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    pub fn interval(&self) -> Duration {
        self.shared.interval
    }

    /// Number of firings since construction.
    pub fn firings(&self) -> u64 {
        self.shared.lock().firings
    }

    /// Mutate the trigger's state under its lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.shared.lock().state)
    }

    pub fn snapshot(&self) -> S {
        self.shared.lock().state.clone()
    }
}

impl<S> Drop for Trigger<S> {
    fn drop(&mut self) {
        let mut schedule = self.shared.lock();
        self.shared.cancel(&mut schedule);
    }
}

fn arm<S: Clone + Send + 'static>(
    shared: &Arc<Shared<S>>,
    schedule: &mut Schedule<S>,
) -> Result<(), TimingError> {
    if schedule.running {
        return Ok(());
    }
    let generation = schedule.generation.wrapping_add(1);
    let deadline = Instant::now() + shared.interval;
    let shared_clone = Arc::clone(shared);
    // The new thread blocks on the lock held by our caller, so it always observes the
    // generation written below.
    thread::Builder::new()
        .name("trigger".to_string())
        .spawn(move || wait_and_fire(shared_clone, generation, deadline))?;
    schedule.generation = generation;
    schedule.running = true;
    Ok(())
}

fn wait_and_fire<S: Clone + Send + 'static>(
    shared: Arc<Shared<S>>,
    generation: u64,
    deadline: Instant,
) {
    let mut schedule = shared.lock();
    loop {
        if !schedule.running || schedule.generation != generation {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        schedule = match shared.cancelled.wait_timeout(schedule, deadline - now) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        };
    }

    schedule.running = false;
    schedule.firings += 1;
    if let Err(e) = arm(&shared, &mut schedule) {
        log::error!("Cannot re-arm the trigger. The schedule ends here: {}", e);
    }
    let snapshot = schedule.state.clone();
    drop(schedule);

    if let Err(e) = (shared.action)(snapshot) {
        log::error!("Trigger action failed: {}", e);
    }
}
