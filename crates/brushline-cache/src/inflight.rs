//! In-flight request coalescing
//!
//! When several threads miss on the same key at once, exactly one (the
//! leader) computes; the rest block on a condvar and receive the
//! leader's result. A leader that fails wakes its followers empty-handed
//! and they fall back to computing for themselves.

use ahash::AHashMap;
use brushline_estimate::CalculationResult;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

enum FlightState {
    Pending,
    Done(Option<Arc<CalculationResult>>),
}

/// One running computation that followers can wait on
pub struct Flight {
    state: Mutex<FlightState>,
    done: Condvar,
}

/// Outcome of a bounded wait on a flight
pub enum WaitOutcome {
    /// The leader finished; `None` means it failed
    Done(Option<Arc<CalculationResult>>),
    /// The timeout elapsed while the flight was still pending
    TimedOut,
}

/// The caller's role for one key
pub enum FlightRole<'a> {
    /// This caller computes; it must complete (or drop) the lease
    Leader(FlightLease<'a>),
    /// Another caller is already computing this key
    Follower(Arc<Flight>),
}

/// Tracks which keys currently have a computation running
#[derive(Default)]
pub struct InflightMap {
    flights: Mutex<AHashMap<String, Arc<Flight>>>,
}

impl InflightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the flight for `key`, creating it if none is running
    pub fn begin(&self, key: &str) -> FlightRole<'_> {
        let mut flights = self
            .flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(flight) = flights.get(key) {
            return FlightRole::Follower(Arc::clone(flight));
        }

        let flight = Arc::new(Flight {
            state: Mutex::new(FlightState::Pending),
            done: Condvar::new(),
        });
        flights.insert(key.to_string(), Arc::clone(&flight));
        FlightRole::Leader(FlightLease {
            map: self,
            key: key.to_string(),
            flight,
            completed: false,
        })
    }

    /// Block until the leader finishes; `None` means it failed
    pub fn wait(flight: &Flight) -> Option<Arc<CalculationResult>> {
        let mut state = flight
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            match &*state {
                FlightState::Done(outcome) => return outcome.clone(),
                FlightState::Pending => {
                    state = flight
                        .done
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Block for at most `timeout`, then abandon the wait
    ///
    /// Abandoning does not disturb the flight: the leader keeps
    /// computing and other followers keep waiting.
    pub fn wait_timeout(flight: &Flight, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let mut state = flight
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if let FlightState::Done(outcome) = &*state {
                return WaitOutcome::Done(outcome.clone());
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut;
            }
            let (guard, _) = flight
                .done
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }
}

/// A leader's obligation to finish its flight
pub struct FlightLease<'a> {
    map: &'a InflightMap,
    key: String,
    flight: Arc<Flight>,
    completed: bool,
}

impl FlightLease<'_> {
    /// Publish the outcome and wake every follower
    pub fn complete(mut self, outcome: Option<Arc<CalculationResult>>) {
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: Option<Arc<CalculationResult>>) {
        if self.completed {
            return;
        }
        self.completed = true;

        self.map
            .flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);

        let mut state = self
            .flight
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *state = FlightState::Done(outcome);
        self.flight.done.notify_all();
    }
}

impl Drop for FlightLease<'_> {
    // A leader that unwinds still wakes its followers.
    fn drop(&mut self) {
        self.finish(None);
    }
}
