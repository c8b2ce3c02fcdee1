//! Optics scoping for middleware.
//!
//! A middleware written against a narrow `(LocalState, LocalAction)` pair
//! becomes usable at a wider composite scope by supplying plain first-class
//! functions: an action projection (prism), an action embedding, and a state
//! projection. No subclassing and no virtual dispatch; the local component
//! stays fully unit-testable in isolation.
//!
//! When the action projection returns `None`, the lifted component is a
//! strict no-op for that dispatch: the inner middleware is never invoked, so
//! it cannot read state, dispatch, or stage an effect.

use std::sync::Arc;

use tracing::trace;

use crate::core::{Action, ActionSource, StateValue, Token};
use crate::dispatch::MiddlewareContext;
use crate::effect::Effect;
use crate::middleware::Middleware;
use crate::registry::{run_effect, CancellationRegistry};

/// A narrow middleware lifted to a wider `(GlobalState, GlobalAction)`
/// scope.
///
/// The inner middleware receives a context whose accessor is pre-composed
/// with the state projection and whose output embeds every locally-produced
/// follow-up action back into the global action type.
pub struct LiftedMiddleware<M, GS, GA, LS, LA> {
    inner: M,
    action_prism: Arc<dyn Fn(&GA) -> Option<LA> + Send + Sync>,
    embed: Arc<dyn Fn(LA) -> GA + Send + Sync>,
    project: Arc<dyn Fn(GS) -> LS + Send + Sync>,
}

impl<M, GS, GA, LS, LA> LiftedMiddleware<M, GS, GA, LS, LA>
where
    M: Middleware<LS, LA>,
    GS: StateValue,
    GA: Action,
    LS: StateValue,
    LA: Action,
{
    pub fn new(
        inner: M,
        action_prism: impl Fn(&GA) -> Option<LA> + Send + Sync + 'static,
        embed: impl Fn(LA) -> GA + Send + Sync + 'static,
        project: impl Fn(GS) -> LS + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            action_prism: Arc::new(action_prism),
            embed: Arc::new(embed),
            project: Arc::new(project),
        }
    }
}

impl<M, GS, GA, LS, LA> Middleware<GS, GA> for LiftedMiddleware<M, GS, GA, LS, LA>
where
    M: Middleware<LS, LA>,
    GS: StateValue,
    GA: Action,
    LS: StateValue,
    LA: Action,
{
    fn receive_context(&mut self, context: MiddlewareContext<GS, GA>) {
        let project = Arc::clone(&self.project);
        let embed = Arc::clone(&self.embed);
        let local = MiddlewareContext::new(
            context.accessor().map(move |global| project(global)),
            context.output().contramap(move |local| embed(local)),
        );
        self.inner.receive_context(local);
    }

    fn handle(&mut self, action: &GA, source: &ActionSource) {
        if let Some(local) = (self.action_prism)(action) {
            self.inner.handle(&local, source);
        }
    }

    fn after_commit(&mut self) {
        // Irrelevant actions staged nothing, so this stays a no-op for them.
        self.inner.after_commit();
    }
}

/// Effect middleware scoped over an indexed collection of homogeneous
/// sub-states.
///
/// The action carries an explicit element identifier. `element` looks the
/// matching sub-state up by identity on every invocation, never from a
/// cached copy, and a miss means the local component simply does not run
/// this turn. Follow-up actions produced by its effects are embedded back
/// into the global action type together with the identifier that produced
/// them.
pub struct KeyedEffectMiddleware<GS, GA, LS, LA, Id, T, F> {
    context: Option<MiddlewareContext<GS, GA>>,
    action_prism: Arc<dyn Fn(&GA) -> Option<(Id, LA)> + Send + Sync>,
    embed: Arc<dyn Fn(Id, LA) -> GA + Send + Sync>,
    element: Arc<dyn Fn(&GS, &Id) -> Option<LS> + Send + Sync>,
    effect_for: F,
    registry: CancellationRegistry<T>,
    staged: Vec<(Id, Effect<LA, T>, ActionSource)>,
}

impl<GS, GA, LS, LA, Id, T, F> KeyedEffectMiddleware<GS, GA, LS, LA, Id, T, F>
where
    GS: StateValue,
    GA: Action,
    LS: StateValue,
    LA: Action,
    Id: Clone + Send + Sync + 'static,
    T: Token,
    F: FnMut(&Id, &LA, &LS) -> Effect<LA, T> + Send + 'static,
{
    pub fn new(
        action_prism: impl Fn(&GA) -> Option<(Id, LA)> + Send + Sync + 'static,
        embed: impl Fn(Id, LA) -> GA + Send + Sync + 'static,
        element: impl Fn(&GS, &Id) -> Option<LS> + Send + Sync + 'static,
        effect_for: F,
    ) -> Self {
        Self {
            context: None,
            action_prism: Arc::new(action_prism),
            embed: Arc::new(embed),
            element: Arc::new(element),
            effect_for,
            registry: CancellationRegistry::new(),
            staged: Vec::new(),
        }
    }

    /// A handle onto this instance's token registry, for inspection.
    pub fn registry(&self) -> CancellationRegistry<T> {
        self.registry.clone()
    }
}

impl<GS, GA, LS, LA, Id, T, F> Middleware<GS, GA> for KeyedEffectMiddleware<GS, GA, LS, LA, Id, T, F>
where
    GS: StateValue,
    GA: Action,
    LS: StateValue,
    LA: Action,
    Id: Clone + Send + Sync + 'static,
    T: Token,
    F: FnMut(&Id, &LA, &LS) -> Effect<LA, T> + Send + 'static,
{
    fn receive_context(&mut self, context: MiddlewareContext<GS, GA>) {
        debug_assert!(
            self.context.is_none(),
            "KeyedEffectMiddleware wired to a store twice"
        );
        self.context = Some(context);
    }

    fn handle(&mut self, action: &GA, source: &ActionSource) {
        let Some((id, local)) = (self.action_prism)(action) else {
            return;
        };
        let context = self
            .context
            .as_ref()
            .expect("KeyedEffectMiddleware handled an action before receive_context");
        let global = context.state();
        // Fresh lookup by identity; the element may have left the collection
        // since the action was dispatched.
        let Some(element) = (self.element)(&global, &id) else {
            trace!(source = %source, "keyed action matched no element, skipping");
            return;
        };
        let effect = (self.effect_for)(&id, &local, &element);
        if !effect.is_noop() {
            self.staged.push((id, effect, source.clone()));
        }
    }

    fn after_commit(&mut self) {
        let staged = std::mem::take(&mut self.staged);
        if staged.is_empty() {
            return;
        }
        let context = self
            .context
            .as_ref()
            .expect("KeyedEffectMiddleware committed before receive_context");
        for (id, effect, source) in staged {
            let embed = Arc::clone(&self.embed);
            let output = context
                .output()
                .contramap(move |local| embed(id.clone(), local));
            run_effect(effect, &source, &output, &self.registry);
        }
    }
}
