//! Stress tests: many concurrent dispatchers and late subscribers against
//! one serialized pipeline.

use std::time::Duration;

use fulcrum_testing::StateRecorder;

use fulcrum_core::{ActionSource, Reducer, StoreBuilder};

const TASKS: usize = 8;
const DISPATCHES_PER_TASK: usize = 50;

#[derive(Debug, Clone)]
struct Bump;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatchers_lose_nothing_and_interleave_cleanly() {
    let store = StoreBuilder::new(0u64)
        .with_reducer(Reducer::new(|n: &mut u64, _action: &Bump| *n += 1))
        .build();

    let recorder = StateRecorder::new();
    let _sub = store.subscribe(recorder.observer());

    let mut handles = Vec::new();
    for task in 0..TASKS {
        let dispatcher = store.dispatcher();
        handles.push(tokio::spawn(async move {
            for _ in 0..DISPATCHES_PER_TASK {
                dispatcher.dispatch(Bump, ActionSource::unknown());
                if fastrand::bool() {
                    tokio::task::yield_now().await;
                }
                if fastrand::u8(..) < 16 {
                    tokio::time::sleep(Duration::from_micros(u64::from(fastrand::u8(..50)))).await;
                }
            }
            task
        }));
    }
    for handle in handles {
        handle.await.expect("dispatcher task panicked");
    }

    let final_state = store.shutdown().await.expect("worker exits cleanly");
    let expected = (TASKS * DISPATCHES_PER_TASK) as u64;
    assert_eq!(final_state, expected);

    // Every turn increments by exactly one, so regardless of sender
    // interleaving the observed sequence must be dense and ordered.
    let states = recorder.states();
    assert_eq!(states.len() as u64, expected + 1);
    for (i, state) in states.iter().enumerate() {
        assert_eq!(*state, i as u64);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn late_subscribers_never_observe_a_duplicate_or_a_gap() {
    let store = StoreBuilder::new(0u64)
        .with_reducer(Reducer::new(|n: &mut u64, _action: &Bump| *n += 1))
        .build();

    let dispatcher = store.dispatcher();
    let pump = tokio::spawn(async move {
        for _ in 0..200 {
            dispatcher.dispatch(Bump, ActionSource::unknown());
            if fastrand::bool() {
                tokio::task::yield_now().await;
            }
        }
    });

    // Join mid-stream: each subscribe races the worker's publish step.
    let mut recorders = Vec::new();
    let mut subscriptions = Vec::new();
    for _ in 0..16 {
        let recorder = StateRecorder::new();
        subscriptions.push(store.subscribe(recorder.observer()));
        recorders.push(recorder);
        tokio::task::yield_now().await;
    }

    pump.await.expect("dispatcher task panicked");
    let final_state = store.shutdown().await.expect("worker exits cleanly");
    assert_eq!(final_state, 200);

    // Each observer gets its initial delivery exactly once and then every
    // later commit exactly once: consecutive values, through to the end.
    for recorder in &recorders {
        let states = recorder.states();
        assert!(!states.is_empty());
        for pair in states.windows(2) {
            assert_eq!(pair[1], pair[0] + 1);
        }
        assert_eq!(states.last().copied(), Some(200));
    }
}
