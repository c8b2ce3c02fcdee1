//! Macro for capturing dispatch call sites.

/// Build an [`ActionSource`](crate::ActionSource) for the current call site.
///
/// Expands to the `file!()` and `line!()` of the invocation, with an optional
/// free-text note:
///
/// ```ignore
/// use fulcrum_core::source;
///
/// store.dispatch(AppAction::Refresh, source!());
/// store.dispatch(AppAction::Retry, source!("retry button"));
/// ```
#[macro_export]
macro_rules! source {
    () => {
        $crate::ActionSource::new(file!(), line!())
    };
    ($info:expr) => {
        $crate::ActionSource::new(file!(), line!()).with_info($info)
    };
}
