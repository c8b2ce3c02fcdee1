//! The dispatch pipeline: a serialized owner of current state.
//!
//! The store spawns one worker task owning the authoritative state. Every
//! dispatch, whether from the application edge, from middleware, or from an
//! effect task, funnels through one unbounded channel into that worker,
//! which gives three guarantees for free:
//!
//! 1. no two dispatches ever run state-mutating logic concurrently;
//! 2. actions are processed in the order `dispatch` accepted them (FIFO);
//! 3. re-entrant dispatch from inside the pipeline drains breadth-first
//!    through the queue instead of recursing, bounding stack depth.
//!
//! One worker turn, strictly in order: middleware pre-commit (the chain
//! still reads the pre-mutation state), reducer, publish to subscribers in
//! subscription order, middleware post-commit (effects start here).

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::core::{Action, ActionSource, StateValue};
use crate::dispatch::{Dispatcher, MiddlewareContext, StateAccessor};
use crate::error::StoreError;
use crate::middleware::{ComposedMiddleware, Middleware};
use crate::reducer::Reducer;

enum Envelope<A> {
    Action(A, ActionSource),
    Shutdown,
}

struct Subscriber<S> {
    id: Uuid,
    observer: Box<dyn FnMut(&S) + Send>,
}

type SubscriberTable<S> = Arc<Mutex<Vec<Subscriber<S>>>>;

/// Assembles a [`Store`]: initial state, then any number of reducers and
/// middleware.
///
/// Repeated [`with_reducer`](StoreBuilder::with_reducer) calls append under
/// the reducer monoid; repeated
/// [`with_middleware`](StoreBuilder::with_middleware) calls append to the
/// composed chain in registration order.
pub struct StoreBuilder<S, A> {
    initial: S,
    reducer: Reducer<S, A>,
    middleware: ComposedMiddleware<S, A>,
}

impl<S: StateValue, A: Action> StoreBuilder<S, A> {
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            reducer: Reducer::identity(),
            middleware: ComposedMiddleware::new(),
        }
    }

    pub fn with_reducer(mut self, reducer: Reducer<S, A>) -> Self {
        self.reducer = self.reducer.then(reducer);
        self
    }

    pub fn with_middleware(mut self, middleware: impl Middleware<S, A>) -> Self {
        self.middleware.append(Box::new(middleware));
        self
    }

    /// Wire the middleware chain (each middleware receives its context
    /// exactly once), spawn the worker, and hand back the store.
    ///
    /// Must run inside a tokio runtime.
    pub fn build(self) -> Store<S, A> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(self.initial.clone());

        let accessor = StateAccessor::new(move || state_rx.borrow().clone());
        let sender = tx.clone();
        let dispatcher = Dispatcher::new(move |action, source: ActionSource| {
            if sender.send(Envelope::Action(action, source)).is_err() {
                trace!("store is shut down, dropping late action");
            }
        });

        let mut middleware = self.middleware;
        middleware.receive_context(MiddlewareContext::new(accessor.clone(), dispatcher.clone()));

        let subscribers: SubscriberTable<S> = Arc::new(Mutex::new(Vec::new()));
        let worker = Worker {
            rx,
            state: self.initial,
            reducer: self.reducer,
            middleware,
            published: state_tx,
            subscribers: Arc::clone(&subscribers),
        };

        Store {
            tx,
            dispatcher,
            accessor,
            subscribers,
            worker: Some(tokio::spawn(worker.run())),
        }
    }
}

struct Worker<S, A> {
    rx: mpsc::UnboundedReceiver<Envelope<A>>,
    state: S,
    reducer: Reducer<S, A>,
    middleware: ComposedMiddleware<S, A>,
    published: watch::Sender<S>,
    subscribers: SubscriberTable<S>,
}

impl<S: StateValue, A: Action> Worker<S, A> {
    async fn run(mut self) -> S {
        while let Some(envelope) = self.rx.recv().await {
            match envelope {
                Envelope::Action(action, source) => self.turn(action, source),
                Envelope::Shutdown => {
                    debug!("store worker shutting down");
                    self.drain();
                    break;
                }
            }
        }
        self.state
    }

    /// Process everything still queued behind the stop signal.
    ///
    /// Follow-ups dispatched re-entrantly while the queue drains land behind
    /// the `Shutdown` envelope; they belong to actions that were accepted
    /// before it and still get their turn.
    fn drain(&mut self) {
        while let Ok(envelope) = self.rx.try_recv() {
            if let Envelope::Action(action, source) = envelope {
                self.turn(action, source);
            }
        }
    }

    fn turn(&mut self, action: A, source: ActionSource) {
        trace!(action = ?action, source = %source, "processing action");

        // 1. Middleware pre-commit, against the pre-mutation state.
        self.middleware.handle(&action, &source);

        // 2. The transition function replaces the authoritative state.
        self.reducer.reduce(&mut self.state, &action);

        // 3. Snapshot refresh and subscriber publish share one critical
        //    section: a concurrent subscribe either reads the previous
        //    snapshot and joins this loop, or reads this one and joins the
        //    next. Never both.
        {
            let mut subscribers = self.subscribers.lock();
            self.published.send_replace(self.state.clone());
            for subscriber in subscribers.iter_mut() {
                (subscriber.observer)(&self.state);
            }
        }

        // 4. Middleware post-commit: staged effects start now that
        //    subscribers have seen the new state.
        self.middleware.after_commit();
    }
}

/// The serialized owner of current state.
///
/// Cheap handle methods only; all mutation happens on the worker task.
pub struct Store<S, A> {
    tx: mpsc::UnboundedSender<Envelope<A>>,
    dispatcher: Dispatcher<A>,
    accessor: StateAccessor<S>,
    subscribers: SubscriberTable<S>,
    worker: Option<JoinHandle<S>>,
}

impl<S: StateValue, A: Action> Store<S, A> {
    /// Enqueue an action. Returns immediately; the mutation happens on the
    /// worker's next turn.
    pub fn dispatch(&self, action: A, source: ActionSource) {
        self.dispatcher.dispatch(action, source);
    }

    /// A cloneable dispatch-back handle for edges outside the middleware
    /// chain (UI callbacks, external subscriptions).
    pub fn dispatcher(&self) -> Dispatcher<A> {
        self.dispatcher.clone()
    }

    /// Snapshot the current state.
    pub fn state(&self) -> S {
        self.accessor.get()
    }

    /// A live state reader.
    pub fn accessor(&self) -> StateAccessor<S> {
        self.accessor.clone()
    }

    /// Register an observer for every future state value.
    ///
    /// The current state is delivered synchronously, once, before this
    /// returns. Subscribers are independent; dropping one subscription does
    /// not affect the others. Observers run on the worker task and must not
    /// call [`subscribe`](Store::subscribe) re-entrantly.
    pub fn subscribe(&self, observer: impl FnMut(&S) + Send + 'static) -> Subscription<S> {
        let id = Uuid::new_v4();
        let mut observer = Box::new(observer);
        // Registration and the initial delivery happen under the table lock,
        // which the worker also holds while refreshing the snapshot, so no
        // committed state can be delivered twice or slip between them.
        let mut subscribers = self.subscribers.lock();
        let current = self.accessor.get();
        observer(&current);
        subscribers.push(Subscriber { id, observer });
        drop(subscribers);

        Subscription {
            id,
            table: Arc::downgrade(&self.subscribers),
            detached: false,
        }
    }

    /// Stop the store: every action dispatched before this call is still
    /// processed, along with any middleware follow-ups those actions
    /// trigger, then the worker exits and the final state comes back.
    ///
    /// In-flight effects keep running; their late results are dropped at the
    /// dispatcher with a trace log.
    pub async fn shutdown(mut self) -> Result<S, StoreError> {
        let worker = self
            .worker
            .take()
            .expect("store worker handle taken twice");
        if self.tx.send(Envelope::Shutdown).is_err() {
            warn!("store worker already gone at shutdown");
        }
        Ok(worker.await?)
    }
}

impl<S, A> Drop for Store<S, A> {
    fn drop(&mut self) {
        // The middleware context keeps a sender alive inside the worker, so
        // without an explicit stop signal the task would idle forever.
        if self.worker.is_some() {
            let _ = self.tx.send(Envelope::Shutdown);
        }
    }
}

/// Handle for one store subscription. Unsubscribes on drop unless
/// [`detach`](Subscription::detach)ed.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription<S> {
    id: Uuid,
    table: Weak<Mutex<Vec<Subscriber<S>>>>,
    detached: bool,
}

impl<S> Subscription<S> {
    /// Explicitly remove this observer. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}

    /// Keep the observer registered for the lifetime of the store.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl<S> Drop for Subscription<S> {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Some(table) = self.table.upgrade() {
            table.lock().retain(|subscriber| subscriber.id != self.id);
        }
    }
}
