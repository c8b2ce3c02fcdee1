//! # Counter Demo
//!
//! The smallest possible Fulcrum store: a pure counter, an action-logging
//! tap, and a subscriber printing every committed state in order.

use anyhow::Result;
use fulcrum_core::{source, ActionSource, Reducer, StoreBuilder, TapMiddleware};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone)]
enum CounterAction {
    Increase,
    Decrease,
}

// Action is auto-implemented via blanket impl for Clone + Debug + Send + 'static

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let reducer = Reducer::new(|count: &mut i64, action: &CounterAction| match action {
        CounterAction::Increase => *count += 1,
        CounterAction::Decrease => *count -= 1,
    });

    let store = StoreBuilder::new(0i64)
        .with_reducer(reducer)
        .with_middleware(TapMiddleware::new(
            |action: &CounterAction, src: &ActionSource| {
                info!(action = ?action, source = %src, "dispatched");
            },
        ))
        .build();

    let subscription = store.subscribe(|count| println!("count = {count}"));

    use CounterAction::{Decrease, Increase};
    for action in [
        Increase, Increase, Increase, Decrease, Increase, Decrease, Decrease,
    ] {
        store.dispatch(action, source!("demo loop"));
    }

    let final_count = store.shutdown().await?;
    println!("final = {final_count}");
    drop(subscription);

    Ok(())
}
