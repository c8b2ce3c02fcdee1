//! The middleware trait and its composition monoid.
//!
//! Middleware observes every dispatched action around the reducer. A store
//! turn invokes the composed chain twice: [`Middleware::handle`] before the
//! reducer commits (with the pre-mutation state still readable through the
//! context accessor) and [`Middleware::after_commit`] after subscribers have
//! observed the new state, which is where effects start.
//!
//! Composition is a monoid: [`NoopMiddleware`] is the identity and
//! [`ComposedMiddleware`] the associative append. Appending runs the left
//! middleware first, then the right one, for every action; neither can
//! short-circuit the other.

use crate::core::{Action, ActionSource, StateValue};
use crate::dispatch::MiddlewareContext;

/// A component that observes actions before and after the reducer and may
/// trigger asynchronous effects.
///
/// Constructed once, wired to a store exactly once via
/// [`receive_context`](Middleware::receive_context), and living as long as
/// the store. Handling an action before wiring is a programming error;
/// implementations fail fast rather than misroute.
pub trait Middleware<S, A>: Send + 'static {
    /// Receive the store wiring: a live state accessor and a dispatch-back
    /// capability. Called exactly once, before any action is handled.
    fn receive_context(&mut self, context: MiddlewareContext<S, A>);

    /// Pre-commit step for one action.
    ///
    /// The context accessor still reads the pre-mutation state. Follow-up
    /// actions dispatched here re-enter the pipeline breadth-first and are
    /// processed after the current action finishes its reducer step.
    fn handle(&mut self, action: &A, source: &ActionSource);

    /// Post-commit step, invoked once subscribers have seen the new state.
    ///
    /// Deferred work staged during [`handle`](Middleware::handle) runs here.
    fn after_commit(&mut self) {}
}

/// The composition identity: ignores its context and does nothing.
pub struct NoopMiddleware;

impl<S: StateValue, A: Action> Middleware<S, A> for NoopMiddleware {
    fn receive_context(&mut self, _context: MiddlewareContext<S, A>) {}

    fn handle(&mut self, _action: &A, _source: &ActionSource) {}
}

/// An ordered chain of middleware, itself a middleware.
///
/// Every child sees every action; the left-most runs first in both the
/// pre-commit and the post-commit phase.
pub struct ComposedMiddleware<S, A> {
    children: Vec<Box<dyn Middleware<S, A>>>,
}

impl<S: StateValue, A: Action> ComposedMiddleware<S, A> {
    /// An empty chain, equivalent to [`NoopMiddleware`].
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
        }
    }

    /// Append a middleware to the right end of the chain.
    pub fn append(&mut self, middleware: Box<dyn Middleware<S, A>>) {
        self.children.push(middleware);
    }

    /// Builder-style append.
    pub fn then(mut self, middleware: impl Middleware<S, A>) -> Self {
        self.append(Box::new(middleware));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<S: StateValue, A: Action> Default for ComposedMiddleware<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateValue, A: Action> Middleware<S, A> for ComposedMiddleware<S, A> {
    fn receive_context(&mut self, context: MiddlewareContext<S, A>) {
        for child in &mut self.children {
            child.receive_context(context.clone());
        }
    }

    fn handle(&mut self, action: &A, source: &ActionSource) {
        for child in &mut self.children {
            child.handle(action, source);
        }
    }

    fn after_commit(&mut self) {
        for child in &mut self.children {
            child.after_commit();
        }
    }
}

/// A middleware that observes each action and its source without touching
/// state or dispatching. Useful for action logging.
pub struct TapMiddleware<F> {
    tap: F,
}

impl<F> TapMiddleware<F> {
    pub fn new(tap: F) -> Self {
        Self { tap }
    }
}

impl<S, A, F> Middleware<S, A> for TapMiddleware<F>
where
    S: StateValue,
    A: Action,
    F: FnMut(&A, &ActionSource) + Send + 'static,
{
    fn receive_context(&mut self, _context: MiddlewareContext<S, A>) {}

    fn handle(&mut self, action: &A, source: &ActionSource) {
        (self.tap)(action, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Dispatcher, StateAccessor};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn test_context() -> MiddlewareContext<u32, String> {
        MiddlewareContext::new(
            StateAccessor::new(|| 0),
            Dispatcher::new(|_action, _source| {}),
        )
    }

    struct Recording {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware<u32, String> for Recording {
        fn receive_context(&mut self, _context: MiddlewareContext<u32, String>) {}

        fn handle(&mut self, action: &String, _source: &ActionSource) {
            self.log.lock().push(format!("{}:{}", self.label, action));
        }

        fn after_commit(&mut self) {
            self.log.lock().push(format!("{}:after", self.label));
        }
    }

    #[test]
    fn composed_chain_runs_left_to_right_without_short_circuiting() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ComposedMiddleware::new()
            .then(Recording {
                label: "left",
                log: log.clone(),
            })
            .then(Recording {
                label: "right",
                log: log.clone(),
            });

        chain.receive_context(test_context());
        chain.handle(&"a".to_string(), &ActionSource::unknown());
        chain.after_commit();

        assert_eq!(
            log.lock().as_slice(),
            ["left:a", "right:a", "left:after", "right:after"]
        );
    }

    #[test]
    fn noop_is_an_identity_for_composition() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ComposedMiddleware::new()
            .then(NoopMiddleware)
            .then(Recording {
                label: "mid",
                log: log.clone(),
            })
            .then(NoopMiddleware);

        chain.receive_context(test_context());
        chain.handle(&"a".to_string(), &ActionSource::unknown());

        assert_eq!(log.lock().as_slice(), ["mid:a"]);
    }

    #[test]
    fn tap_middleware_sees_every_action() {
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let mut chain = ComposedMiddleware::new().then(TapMiddleware::new(
            move |action: &String, _source: &ActionSource| sink.lock().push(action.clone()),
        ));

        chain.receive_context(test_context());
        chain.handle(&"a".to_string(), &ActionSource::unknown());
        chain.handle(&"b".to_string(), &ActionSource::unknown());

        assert_eq!(log.lock().as_slice(), ["a", "b"]);
    }
}
