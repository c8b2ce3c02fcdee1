//! The standard effect-producing middleware.

use tracing::trace;

use crate::core::{Action, ActionSource, StateValue, Token};
use crate::dispatch::MiddlewareContext;
use crate::effect::Effect;
use crate::middleware::Middleware;
use crate::registry::{run_effect, CancellationRegistry};

/// A middleware that derives an [`Effect`] from each incoming action and the
/// pre-mutation state, and starts it after the new state has been published.
///
/// Each instance owns its own [`CancellationRegistry`], so cancellation
/// tokens are scoped to the instance: two `EffectMiddleware`s using equal
/// token values never interfere.
///
/// ```ignore
/// let search = EffectMiddleware::new(|action: &AppAction, state: &AppState| {
///     match action {
///         AppAction::QueryChanged(q) => {
///             Effect::promise(run_search(q.clone())).cancellable("search")
///         }
///         _ => Effect::none(),
///     }
/// });
/// ```
pub struct EffectMiddleware<S, A, T, F> {
    context: Option<MiddlewareContext<S, A>>,
    effect_for: F,
    registry: CancellationRegistry<T>,
    staged: Vec<(Effect<A, T>, ActionSource)>,
}

impl<S, A, T, F> EffectMiddleware<S, A, T, F>
where
    S: StateValue,
    A: Action,
    T: Token,
    F: FnMut(&A, &S) -> Effect<A, T> + Send + 'static,
{
    pub fn new(effect_for: F) -> Self {
        Self {
            context: None,
            effect_for,
            registry: CancellationRegistry::new(),
            staged: Vec::new(),
        }
    }

    /// A handle onto this instance's token registry, for inspection.
    ///
    /// Take a clone before moving the middleware into a store builder.
    pub fn registry(&self) -> CancellationRegistry<T> {
        self.registry.clone()
    }
}

impl<S, A, T, F> Middleware<S, A> for EffectMiddleware<S, A, T, F>
where
    S: StateValue,
    A: Action,
    T: Token,
    F: FnMut(&A, &S) -> Effect<A, T> + Send + 'static,
{
    fn receive_context(&mut self, context: MiddlewareContext<S, A>) {
        debug_assert!(
            self.context.is_none(),
            "EffectMiddleware wired to a store twice"
        );
        self.context = Some(context);
    }

    fn handle(&mut self, action: &A, source: &ActionSource) {
        let context = self
            .context
            .as_ref()
            .expect("EffectMiddleware handled an action before receive_context");
        let state = context.state();
        let effect = (self.effect_for)(action, &state);
        if !effect.is_noop() {
            self.staged.push((effect, source.clone()));
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
            .expect("EffectMiddleware committed before receive_context");
        for (effect, source) in staged {
            trace!(source = %source, "starting effect");
            run_effect(effect, &source, context.output(), &self.registry);
        }
    }
}
