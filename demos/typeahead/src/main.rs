//! # Typeahead Demo
//!
//! Shows token-based effect supersession: every keystroke restarts the
//! search under the same cancellation token, so only the results for the
//! final query ever reach the store. Pressing escape cancels outright.

use std::time::Duration;

use anyhow::Result;
use fulcrum_core::{source, Effect, EffectMiddleware, Reducer, StoreBuilder};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone)]
enum SearchAction {
    QueryChanged(String),
    Escape,
    Results { query: String, hits: Vec<String> },
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Default)]
struct SearchState {
    query: String,
    hits: Vec<String>,
    searches_completed: u32,
}

// ============================================================================
// Fake backend
// ============================================================================

/// Pretends to be a slow index lookup.
async fn run_search(query: String) -> Vec<String> {
    tokio::time::sleep(Duration::from_millis(150)).await;
    ["fulcrum", "fulminant", "fullness", "fumble"]
        .iter()
        .filter(|word| word.starts_with(&query))
        .map(|word| (*word).to_string())
        .collect()
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let reducer = Reducer::new(|state: &mut SearchState, action: &SearchAction| match action {
        SearchAction::QueryChanged(query) => state.query = query.clone(),
        SearchAction::Escape => state.hits.clear(),
        SearchAction::Results { hits, .. } => {
            state.hits = hits.clone();
            state.searches_completed += 1;
        }
    });

    let search = EffectMiddleware::new(|action: &SearchAction, _state: &SearchState| match action {
        SearchAction::QueryChanged(query) => {
            let query = query.clone();
            Effect::promise(async move {
                let hits = run_search(query.clone()).await;
                Some(SearchAction::Results { query, hits })
            })
            .cancellable("search")
        }
        SearchAction::Escape => Effect::cancel("search"),
        SearchAction::Results { .. } => Effect::none(),
    });

    let store = StoreBuilder::new(SearchState::default())
        .with_reducer(reducer)
        .with_middleware(search)
        .build();

    let _sub = store.subscribe(|state: &SearchState| {
        info!(
            query = %state.query,
            hits = state.hits.len(),
            completed = state.searches_completed,
            "state committed"
        );
    });

    // Rapid keystrokes: each restart supersedes the in-flight search.
    for query in ["f", "fu", "ful"] {
        store.dispatch(SearchAction::QueryChanged(query.into()), source!("keystroke"));
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    // Let the surviving search land.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let state = store.state();
    println!("query={:?} hits={:?}", state.query, state.hits);
    println!(
        "searches completed: {} (three keystrokes, one result)",
        state.searches_completed
    );

    // One more search, cancelled before it can land.
    store.dispatch(SearchAction::QueryChanged("fum".into()), source!("keystroke"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.dispatch(SearchAction::Escape, source!("escape key"));
    tokio::time::sleep(Duration::from_millis(300)).await;

    let final_state = store.shutdown().await?;
    println!(
        "after escape: hits={:?} completed={}",
        final_state.hits, final_state.searches_completed
    );

    Ok(())
}
