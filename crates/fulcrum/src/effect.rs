//! Cancellable, failure-free, deferred producers of follow-up actions.
//!
//! An [`Effect`] represents "zero, one, or many forthcoming actions,
//! eventually, or nothing at all". Construction never runs the body; that
//! happens only when the store subscribes to it after the triggering action
//! commits. Per instance the lifecycle is
//!
//! ```text
//! Constructed ──► Running ──► Completed
//!                    │
//!                    └──────► Cancelled
//! ```
//!
//! with both terminal states final; an effect never re-enters `Running`.
//!
//! Effects carry no failure channel. Any failure-capable upstream operation
//! must be caught and converted at construction time; see
//! [`Effect::fire_and_forget`], whose error mapper is a mandatory, explicit
//! conversion point. "Operation failed" is just another action value flowing
//! through the same pipeline as any success action.

use std::future::Future;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{BoxStream, Stream, StreamExt};
use smallvec::SmallVec;

use crate::core::{Action, Token};

/// Immediate effects rarely carry more than a handful of actions.
type ActionBatch<A> = SmallVec<[A; 4]>;

pub(crate) enum EffectBody<A, T> {
    /// The distinguished no-op. Not the same thing as an empty stream: the
    /// store skips subscription overhead entirely for this variant.
    Noop,
    /// One action, available immediately.
    Value(A),
    /// An ordered batch of actions, available immediately.
    Sequence(ActionBatch<A>),
    /// A single eventual action, or nothing.
    Promise(BoxFuture<'static, Option<A>>),
    /// The opaque asynchronous stream capability. The core adds no operators
    /// of its own; `map`/`filter`/`merge` belong to the stream's ecosystem.
    Stream(BoxStream<'static, A>),
    /// A request to tear down whatever currently runs under a token.
    Cancel(T),
}

/// A deferred unit of work producing follow-up actions, with an optional
/// cancellation token.
///
/// Starting an effect whose token matches a live one *supersedes* it: the
/// previous subscription is torn down before the new one registers. Tokens
/// are scoped to the middleware instance that runs the effect.
pub struct Effect<A, T = ()> {
    token: Option<T>,
    body: EffectBody<A, T>,
}

impl<A: Action, T: Token> Effect<A, T> {
    fn from_body(body: EffectBody<A, T>) -> Self {
        Self { token: None, body }
    }

    /// The no-op effect. Distinguishable from a real-but-empty asynchronous
    /// effect so the store can skip subscription overhead.
    pub fn none() -> Self {
        Self::from_body(EffectBody::Noop)
    }

    /// Emit a single action immediately.
    pub fn just(action: A) -> Self {
        Self::from_body(EffectBody::Value(action))
    }

    /// Emit an ordered sequence of actions immediately.
    pub fn sequence(actions: impl IntoIterator<Item = A>) -> Self {
        Self::from_body(EffectBody::Sequence(actions.into_iter().collect()))
    }

    /// Emit at most one action, eventually.
    pub fn promise<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Option<A>> + Send + 'static,
    {
        Self::from_body(EffectBody::Promise(future.boxed()))
    }

    /// Run side-effecting work with no output on success.
    ///
    /// Failures never propagate and are never silently lost: `on_error` is
    /// the mandatory conversion point turning them into an optional follow-up
    /// action (return `None` to deliberately drop the failure).
    pub fn fire_and_forget<Fut, E>(work: Fut, on_error: E) -> Self
    where
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
        E: FnOnce(anyhow::Error) -> Option<A> + Send + 'static,
    {
        Self::from_body(EffectBody::Promise(
            async move {
                match work.await {
                    Ok(()) => None,
                    Err(err) => on_error(err),
                }
            }
            .boxed(),
        ))
    }

    /// Forward every value of an asynchronous stream as an action, in the
    /// stream's emission order.
    pub fn from_stream<St>(stream: St) -> Self
    where
        St: Stream<Item = A> + Send + 'static,
    {
        Self::from_body(EffectBody::Stream(stream.boxed()))
    }

    /// Tear down the live effect registered under `token`, if any.
    /// Cancelling a token with no live entry is a silent no-op.
    pub fn cancel(token: T) -> Self {
        Self::from_body(EffectBody::Cancel(token))
    }

    /// Attach a cancellation token. A later effect run under the same token,
    /// by the same middleware instance, supersedes this one.
    pub fn cancellable(mut self, token: T) -> Self {
        self.token = Some(token);
        self
    }

    /// Whether this is the distinguished no-op.
    pub fn is_noop(&self) -> bool {
        matches!(self.body, EffectBody::Noop)
    }

    /// Rewrap every produced action. The token, if any, is preserved.
    pub fn map<B: Action>(self, f: impl Fn(A) -> B + Send + Sync + 'static) -> Effect<B, T> {
        let body = match self.body {
            EffectBody::Noop => EffectBody::Noop,
            EffectBody::Value(a) => EffectBody::Value(f(a)),
            EffectBody::Sequence(actions) => {
                EffectBody::Sequence(actions.into_iter().map(f).collect())
            }
            EffectBody::Promise(fut) => {
                EffectBody::Promise(fut.map(move |opt| opt.map(f)).boxed())
            }
            EffectBody::Stream(stream) => EffectBody::Stream(stream.map(f).boxed()),
            EffectBody::Cancel(token) => EffectBody::Cancel(token),
        };
        Effect {
            token: self.token,
            body,
        }
    }

    pub(crate) fn into_parts(self) -> (Option<T>, EffectBody<A, T>) {
        (self.token, self.body)
    }
}
