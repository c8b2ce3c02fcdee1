//! Core vocabulary traits and the diagnostic action-source metadata.

use std::fmt;
use std::hash::Hash;

/// Marker trait for actions.
///
/// Actions are immutable values describing an intent to change state or to
/// trigger work. They are compared by value where needed and carry no shared
/// identity.
///
/// Auto-implemented via blanket impl for `Clone + Debug + Send + 'static`.
pub trait Action: Clone + fmt::Debug + Send + 'static {}

impl<T> Action for T where T: Clone + fmt::Debug + Send + 'static {}

/// Marker trait for state snapshots.
///
/// Exactly one authoritative instance lives inside the store worker; every
/// read outside of it is a stale-by-design snapshot.
///
/// Auto-implemented via blanket impl for `Clone + Send + Sync + 'static`.
pub trait StateValue: Clone + Send + Sync + 'static {}

impl<T> StateValue for T where T: Clone + Send + Sync + 'static {}

/// Marker trait for cancellation tokens.
///
/// Any equatable, hashable value works. Tokens identify a class of
/// superseding effects; they are scoped per middleware instance, never
/// globally.
///
/// Auto-implemented via blanket impl.
pub trait Token: Hash + Eq + Clone + Send + Sync + 'static {}

impl<T> Token for T where T: Hash + Eq + Clone + Send + Sync + 'static {}

/// Diagnostic origin metadata attached to every dispatched action.
///
/// Carried alongside the action through the whole pipeline for observability.
/// It never alters the action's identity and has no effect on routing.
///
/// Use the [`source!`](crate::source) macro to capture the call site:
///
/// ```ignore
/// store.dispatch(AppAction::Refresh, source!());
/// store.dispatch(AppAction::Retry, source!("retry button"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ActionSource {
    /// Originating file, as captured by `file!()`.
    pub file: &'static str,
    /// Originating line, as captured by `line!()`.
    pub line: u32,
    /// Optional free-text annotation.
    pub info: Option<String>,
}

impl ActionSource {
    pub fn new(file: &'static str, line: u32) -> Self {
        Self {
            file,
            line,
            info: None,
        }
    }

    /// Attach a free-text note to this source.
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    /// Placeholder source for actions whose origin is not tracked.
    pub fn unknown() -> Self {
        Self {
            file: "<unknown>",
            line: 0,
            info: None,
        }
    }
}

impl fmt::Display for ActionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)?;
        if let Some(info) = &self.info {
            write!(f, " ({info})")?;
        }
        Ok(())
    }
}
