//! Testing utilities for Fulcrum stores.
//!
//! Recorders capture what subscribers and middleware observe, and
//! [`wait_for`] settles asynchronous pipelines deterministically under both
//! real and paused tokio clocks.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use fulcrum_core::{Action, ActionSource, StateValue};

/// Records every state a subscriber observes, in order.
///
/// ```ignore
/// let recorder = StateRecorder::new();
/// let _sub = store.subscribe(recorder.observer());
/// // ... dispatch ...
/// assert_eq!(recorder.states(), vec![0, 1, 2]);
/// ```
pub struct StateRecorder<S> {
    states: Arc<Mutex<Vec<S>>>,
}

impl<S: StateValue> StateRecorder<S> {
    pub fn new() -> Self {
        Self {
            states: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An observer closure to hand to `Store::subscribe`.
    pub fn observer(&self) -> impl FnMut(&S) + Send + 'static {
        let sink = Arc::clone(&self.states);
        move |state: &S| sink.lock().push(state.clone())
    }

    /// Everything observed so far.
    pub fn states(&self) -> Vec<S> {
        self.states.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }
}

impl<S: StateValue> Default for StateRecorder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for StateRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            states: Arc::clone(&self.states),
        }
    }
}

/// Records every action (with its source) a middleware tap observes.
pub struct ActionRecorder<A> {
    actions: Arc<Mutex<Vec<(A, ActionSource)>>>,
}

impl<A: Action> ActionRecorder<A> {
    pub fn new() -> Self {
        Self {
            actions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A tap closure to hand to `TapMiddleware::new`.
    pub fn tap(&self) -> impl FnMut(&A, &ActionSource) + Send + 'static {
        let sink = Arc::clone(&self.actions);
        move |action: &A, source: &ActionSource| sink.lock().push((action.clone(), source.clone()))
    }

    /// The recorded actions, without their sources.
    pub fn actions(&self) -> Vec<A> {
        self.actions
            .lock()
            .iter()
            .map(|(action, _)| action.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.lock().len()
    }
}

impl<A: Action> Default for ActionRecorder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for ActionRecorder<A> {
    fn clone(&self) -> Self {
        Self {
            actions: Arc::clone(&self.actions),
        }
    }
}

const WAIT_ROUNDS: usize = 400;
const WAIT_STEP: Duration = Duration::from_millis(5);

/// Poll until `condition` holds, yielding to the runtime between polls.
///
/// Under `#[tokio::test(start_paused = true)]` the sleep auto-advances the
/// clock, so timer-driven effects fire without wall-clock delay. Panics if
/// the condition never holds.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..WAIT_ROUNDS {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
        tokio::time::sleep(WAIT_STEP).await;
    }
    panic!("condition not met within {WAIT_ROUNDS} polling rounds");
}

/// Let already-queued work drain without advancing time.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
