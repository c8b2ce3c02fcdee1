//! Dispatch-back and state-read capabilities handed to middleware.
//!
//! Both capabilities are plain closures behind `Arc`, which is what makes
//! optics lifting cheap: a narrower middleware gets the same capabilities
//! pre-composed with a projection ([`StateAccessor::map`]) or an embedding
//! ([`Dispatcher::contramap`]).

use std::sync::Arc;

use crate::core::{Action, ActionSource, StateValue};

/// A capability to dispatch actions back into a store.
///
/// Cloneable and freely shareable with effect tasks running on arbitrary
/// executors; everything sent through it is serialized by the store worker.
pub struct Dispatcher<A> {
    send: Arc<dyn Fn(A, ActionSource) + Send + Sync>,
}

impl<A: Action> Dispatcher<A> {
    /// Wrap a raw send closure.
    ///
    /// Mostly useful for test harnesses; stores build their own dispatcher.
    pub fn new(send: impl Fn(A, ActionSource) + Send + Sync + 'static) -> Self {
        Self {
            send: Arc::new(send),
        }
    }

    /// Dispatch an action. Never blocks.
    ///
    /// If the store has shut down the action is dropped; late results from
    /// in-flight effects are expected noise, not an error.
    pub fn dispatch(&self, action: A, source: ActionSource) {
        (self.send)(action, source);
    }

    /// Derive a dispatcher for a narrower action type by embedding each
    /// narrow action into this dispatcher's action type.
    pub fn contramap<B: Action>(
        &self,
        embed: impl Fn(B) -> A + Send + Sync + 'static,
    ) -> Dispatcher<B> {
        let send = Arc::clone(&self.send);
        Dispatcher {
            send: Arc::new(move |action, src| send(embed(action), src)),
        }
    }
}

impl<A> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            send: Arc::clone(&self.send),
        }
    }
}

/// A live reader of the store's current state.
///
/// Reads always observe the most recently committed state; the returned
/// value is a snapshot and goes stale immediately.
pub struct StateAccessor<S> {
    read: Arc<dyn Fn() -> S + Send + Sync>,
}

impl<S: StateValue> StateAccessor<S> {
    /// Wrap a raw read closure.
    ///
    /// Mostly useful for test harnesses; stores build their own accessor.
    pub fn new(read: impl Fn() -> S + Send + Sync + 'static) -> Self {
        Self {
            read: Arc::new(read),
        }
    }

    /// Snapshot the current state.
    pub fn get(&self) -> S {
        (self.read)()
    }

    /// Derive an accessor for a sub-state by composing with a projection.
    pub fn map<L: StateValue>(
        &self,
        project: impl Fn(S) -> L + Send + Sync + 'static,
    ) -> StateAccessor<L> {
        let read = Arc::clone(&self.read);
        StateAccessor {
            read: Arc::new(move || project(read())),
        }
    }
}

impl<S> Clone for StateAccessor<S> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
        }
    }
}

/// The wiring a middleware receives from its store, exactly once, before any
/// action is handled.
pub struct MiddlewareContext<S, A> {
    state: StateAccessor<S>,
    output: Dispatcher<A>,
}

impl<S: StateValue, A: Action> MiddlewareContext<S, A> {
    pub fn new(state: StateAccessor<S>, output: Dispatcher<A>) -> Self {
        Self { state, output }
    }

    /// Snapshot the current state.
    pub fn state(&self) -> S {
        self.state.get()
    }

    /// The live state reader.
    pub fn accessor(&self) -> &StateAccessor<S> {
        &self.state
    }

    /// The dispatch-back capability.
    pub fn output(&self) -> &Dispatcher<A> {
        &self.output
    }

    /// Dispatch a follow-up action through this context's output.
    pub fn dispatch(&self, action: A, source: ActionSource) {
        self.output.dispatch(action, source);
    }
}

impl<S, A> Clone for MiddlewareContext<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: StateAccessor {
                read: Arc::clone(&self.state.read),
            },
            output: Dispatcher {
                send: Arc::clone(&self.output.send),
            },
        }
    }
}
