//! In-flight effect tracking and the effect runner.
//!
//! Each effect-running middleware instance owns one [`CancellationRegistry`]:
//! a token-keyed table of live subscriptions. At most one live entry exists
//! per token; registering under an occupied token tears the old entry down
//! first. Removal on natural completion is guarded by the subscription id so
//! a superseding effect is never torn down by its predecessor finishing.
//!
//! Cancellation is cooperative: it stops the store's forwarding task, so no
//! further actions reach the pipeline. Work already in flight inside the
//! underlying stream (a network request, say) may still complete on its own
//! executor; its results simply go nowhere.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{AbortHandle, Abortable};
use futures::stream::StreamExt;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::core::{Action, ActionSource, Token};
use crate::dispatch::Dispatcher;
use crate::effect::{Effect, EffectBody};

pub(crate) struct RunningEffect {
    id: Uuid,
    handle: AbortHandle,
}

/// Token-keyed table of in-flight effect subscriptions.
///
/// Scoped to one middleware instance; two instances using equal token values
/// never interfere with each other.
pub struct CancellationRegistry<T> {
    entries: Arc<DashMap<T, RunningEffect>>,
}

impl<T: Token> CancellationRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Whether a live entry exists for `token`.
    pub fn is_registered(&self, token: &T) -> bool {
        self.entries.contains_key(token)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tear down the live entry for `token`, if any. Removal happens
    /// synchronously, so a subsequent same-token registration is free to
    /// proceed without collision. No live entry is a silent no-op.
    pub(crate) fn cancel(&self, token: &T) {
        if let Some((_, entry)) = self.entries.remove(token) {
            entry.handle.abort();
            debug!(effect = %entry.id, "cancelled in-flight effect");
        }
    }

    fn register(&self, token: T, entry: RunningEffect) {
        // Supersede before subscribing: the old entry must be gone first.
        self.cancel(&token);
        self.entries.insert(token, entry);
    }

    /// Remove the entry for `token` on natural completion, but only if it
    /// still belongs to subscription `id`.
    fn complete(&self, token: &T, id: Uuid) {
        self.entries.remove_if(token, |_, entry| entry.id == id);
    }
}

impl<T> Clone for CancellationRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

/// Subscribe to an effect exactly once, forwarding every emitted action into
/// the dispatcher.
///
/// Immediate bodies dispatch inline (still superseding a same-token
/// predecessor and completing on the spot); asynchronous bodies spawn a
/// forwarding task registered under the token, if any.
pub(crate) fn run_effect<A: Action, T: Token>(
    effect: Effect<A, T>,
    source: &ActionSource,
    output: &Dispatcher<A>,
    registry: &CancellationRegistry<T>,
) {
    let (token, body) = effect.into_parts();
    match body {
        EffectBody::Noop => {}
        EffectBody::Cancel(target) => registry.cancel(&target),
        EffectBody::Value(action) => {
            if let Some(token) = &token {
                registry.cancel(token);
            }
            output.dispatch(action, source.clone());
        }
        EffectBody::Sequence(actions) => {
            if let Some(token) = &token {
                registry.cancel(token);
            }
            for action in actions {
                output.dispatch(action, source.clone());
            }
        }
        EffectBody::Promise(future) => {
            let stream = futures::stream::once(future).filter_map(futures::future::ready);
            spawn_forwarding(stream.boxed(), token, source.clone(), output, registry);
        }
        EffectBody::Stream(stream) => {
            spawn_forwarding(stream, token, source.clone(), output, registry);
        }
    }
}

fn spawn_forwarding<A: Action, T: Token>(
    mut stream: futures::stream::BoxStream<'static, A>,
    token: Option<T>,
    source: ActionSource,
    output: &Dispatcher<A>,
    registry: &CancellationRegistry<T>,
) {
    let id = Uuid::new_v4();
    let (handle, abort_registration) = AbortHandle::new_pair();

    // Register before spawning so there is no window in which the task could
    // finish without an entry to clean up.
    if let Some(token) = &token {
        registry.register(token.clone(), RunningEffect { id, handle });
        trace!(effect = %id, "registered cancellable effect");
    }

    let output = output.clone();
    let registry = registry.clone();
    tokio::spawn(async move {
        let forward = async {
            while let Some(action) = stream.next().await {
                output.dispatch(action, source.clone());
            }
        };
        // An aborted subscription skips straight past the forwarding loop;
        // its registry entry was already removed by the cancelling side.
        let _ = Abortable::new(forward, abort_registration).await;
        if let Some(token) = &token {
            registry.complete(token, id);
            trace!(effect = %id, "effect completed");
        }
    });
}
