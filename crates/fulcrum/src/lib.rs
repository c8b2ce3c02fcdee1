//! # Fulcrum
//!
//! A serialized unidirectional state container where reducers transition,
//! middleware observes, and effects funnel results back as actions.
//!
//! ## Core Concepts
//!
//! Fulcrum separates **deciding** from **doing**:
//! - [`Reducer`] = pure state transitions (`(State, Action) -> State`)
//! - [`Middleware`] = observation around the reducer, the only place
//!   asynchronous [`Effect`]s start
//!
//! The key principle: **one queue, one owner**. A single worker task owns
//! the authoritative state; everything impure runs elsewhere and re-enters
//! through `dispatch`.
//!
//! ## Architecture
//!
//! ```text
//! Edge (UI/callbacks)
//!     │
//!     ▼ dispatch(action, source)
//! serialized queue (FIFO) ◄──────────────────────────────┐
//!     │                                                  │
//!     ▼ worker turn                                      │
//! Middleware chain.handle() ── may dispatch ─────────────┤
//!     │                                                  │
//!     ▼                                                  │
//! Reducer(state, action) ─► new authoritative state      │
//!     │                                                  │
//!     ▼                                                  │
//! Subscribers (in subscription order)                    │
//!     │                                                  │
//!     ▼                                                  │
//! Middleware chain.after_commit()                        │
//!     │                                                  │
//!     └─► Effect ─► tokio task ─► emitted actions ───────┘
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Actions are values** - Immutable intents, no shared identity
//! 2. **Reducers are pure** - No IO, no failure, total over their inputs
//! 3. **One queue defines order** - Subscribers observe states in exact
//!    dispatch order, with no partially-applied states
//! 4. **Re-entrant dispatch is breadth-first** - Nested dispatches queue
//!    behind the current action instead of recursing
//! 5. **Effects cannot fail** - Upstream failures are converted to optional
//!    actions at construction, explicitly
//! 6. **Tokens are instance-scoped** - Each effect middleware owns its own
//!    cancellation registry
//!
//! ## Example
//!
//! ```ignore
//! use fulcrum_core::{source, Effect, EffectMiddleware, Reducer, StoreBuilder};
//!
//! #[derive(Debug, Clone)]
//! enum AppAction {
//!     QueryChanged(String),
//!     Results(Vec<String>),
//! }
//!
//! #[derive(Debug, Clone, Default)]
//! struct AppState {
//!     query: String,
//!     results: Vec<String>,
//! }
//!
//! let reducer = Reducer::new(|state: &mut AppState, action: &AppAction| match action {
//!     AppAction::QueryChanged(q) => state.query = q.clone(),
//!     AppAction::Results(r) => state.results = r.clone(),
//! });
//!
//! // Restarting the search supersedes the in-flight one via the token.
//! let search = EffectMiddleware::new(|action: &AppAction, _state: &AppState| {
//!     match action {
//!         AppAction::QueryChanged(q) => {
//!             let query = q.clone();
//!             Effect::promise(async move {
//!                 Some(AppAction::Results(run_search(query).await))
//!             })
//!             .cancellable("search")
//!         }
//!         _ => Effect::none(),
//!     }
//! });
//!
//! let store = StoreBuilder::new(AppState::default())
//!     .with_reducer(reducer)
//!     .with_middleware(search)
//!     .build();
//!
//! let _sub = store.subscribe(|state| render(state));
//! store.dispatch(AppAction::QueryChanged("fulcrum".into()), source!());
//! ```
//!
//! ## What This Is Not
//!
//! Fulcrum is **not**:
//! - A UI framework
//! - A persistence layer
//! - A stream-operator library (streams come in as an opaque capability)
//! - A network transport
//!
//! Fulcrum **is**:
//! > A serialized unidirectional state container where reducers transition,
//! > middleware observes, and effects funnel results back as actions.

// Core modules
mod core;
mod dispatch;
mod effect;
mod effect_middleware;
mod error;
mod lift;
mod middleware;
mod reducer;
mod registry;
mod source_macro;
mod store;

// Re-export core traits and metadata
pub use crate::core::{Action, ActionSource, StateValue, Token};

// Re-export capabilities handed to middleware
pub use dispatch::{Dispatcher, MiddlewareContext, StateAccessor};

// Re-export the transition function algebra
pub use reducer::Reducer;

// Re-export middleware types
pub use middleware::{ComposedMiddleware, Middleware, NoopMiddleware, TapMiddleware};

// Re-export optics lifting
pub use lift::{KeyedEffectMiddleware, LiftedMiddleware};

// Re-export effect types
pub use effect::Effect;
pub use effect_middleware::EffectMiddleware;
pub use registry::CancellationRegistry;

// Re-export store types (primary entry point)
pub use store::{Store, StoreBuilder, Subscription};

// Re-export error types
pub use error::StoreError;
