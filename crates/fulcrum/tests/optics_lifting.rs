//! Optics lifting tests: scoped middleware, keyed collections, and the
//! no-op guarantee for irrelevant actions.

use fulcrum_testing::{wait_for, ActionRecorder};

use fulcrum_core::{
    source, Effect, EffectMiddleware, KeyedEffectMiddleware, LiftedMiddleware, Reducer,
    StoreBuilder, TapMiddleware,
};

#[derive(Debug, Clone, PartialEq)]
enum PanelAction {
    Ping,
    Pong,
}

fn panel_reducer() -> Reducer<i64, PanelAction> {
    Reducer::new(|count, action| {
        if matches!(action, PanelAction::Pong) {
            *count += 1;
        }
    })
}

/// Replies to every ping with a pong, in its own narrow world.
fn panel_middleware() -> EffectMiddleware<
    i64,
    PanelAction,
    (),
    impl FnMut(&PanelAction, &i64) -> Effect<PanelAction, ()> + Send + 'static,
> {
    EffectMiddleware::new(|action: &PanelAction, _state: &i64| match action {
        PanelAction::Ping => Effect::just(PanelAction::Pong),
        PanelAction::Pong => Effect::none(),
    })
}

#[derive(Debug, Clone, PartialEq)]
enum AppAction {
    Panel(PanelAction),
    Noise,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AppState {
    panel: i64,
    noise_seen: u32,
}

fn focus_panel(state: &mut AppState) -> &mut i64 {
    &mut state.panel
}

fn panel_prism(action: &AppAction) -> Option<PanelAction> {
    match action {
        AppAction::Panel(panel) => Some(panel.clone()),
        AppAction::Noise => None,
    }
}

#[tokio::test]
async fn a_lifted_middleware_round_trips_through_the_global_action_type() {
    let recorder = ActionRecorder::new();
    let lifted = LiftedMiddleware::new(
        panel_middleware(),
        panel_prism,
        AppAction::Panel,
        |state: AppState| state.panel,
    );

    let store = StoreBuilder::new(AppState::default())
        .with_reducer(Reducer::new(|state: &mut AppState, action: &AppAction| {
            if matches!(action, AppAction::Noise) {
                state.noise_seen += 1;
            }
        }))
        .with_reducer(panel_reducer().lift(panel_prism, focus_panel))
        .with_middleware(TapMiddleware::new(recorder.tap()))
        .with_middleware(lifted)
        .build();

    store.dispatch(AppAction::Panel(PanelAction::Ping), source!());
    wait_for(|| store.state().panel == 1).await;

    let final_state = store.shutdown().await.expect("worker exits cleanly");
    assert_eq!(final_state.panel, 1);
    // The pong came back embedded in the global action type.
    assert_eq!(
        recorder.actions(),
        vec![
            AppAction::Panel(PanelAction::Ping),
            AppAction::Panel(PanelAction::Pong),
        ]
    );
}

#[tokio::test]
async fn a_lifted_middleware_is_inert_for_actions_it_does_not_own() {
    let recorder = ActionRecorder::new();
    let lifted = LiftedMiddleware::new(
        panel_middleware(),
        panel_prism,
        AppAction::Panel,
        |state: AppState| state.panel,
    );

    let store = StoreBuilder::new(AppState::default())
        .with_reducer(panel_reducer().lift(panel_prism, focus_panel))
        .with_middleware(TapMiddleware::new(recorder.tap()))
        .with_middleware(lifted)
        .build();

    store.dispatch(AppAction::Noise, source!());
    store.dispatch(AppAction::Noise, source!());

    let final_state = store.shutdown().await.expect("worker exits cleanly");
    // No panel change, no follow-up dispatches.
    assert_eq!(final_state.panel, 0);
    assert_eq!(recorder.actions(), vec![AppAction::Noise, AppAction::Noise]);
}

#[derive(Debug, Clone, PartialEq)]
enum ItemAction {
    Load,
    Loaded,
}

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: u32,
    loaded: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum ListAction {
    Item(u32, ItemAction),
}

type ListState = Vec<Item>;

fn item_reducer() -> Reducer<bool, ItemAction> {
    Reducer::new(|loaded, action| {
        if matches!(action, ItemAction::Loaded) {
            *loaded = true;
        }
    })
}

fn item_prism(action: &ListAction) -> Option<(u32, ItemAction)> {
    let ListAction::Item(id, item_action) = action;
    Some((*id, item_action.clone()))
}

fn locate_loaded<'a>(state: &'a mut ListState, id: &u32) -> Option<&'a mut bool> {
    state
        .iter_mut()
        .find(|item| item.id == *id)
        .map(|item| &mut item.loaded)
}

fn keyed_loader() -> KeyedEffectMiddleware<
    ListState,
    ListAction,
    bool,
    ItemAction,
    u32,
    (),
    impl FnMut(&u32, &ItemAction, &bool) -> Effect<ItemAction, ()> + Send + 'static,
> {
    KeyedEffectMiddleware::new(
        item_prism,
        |id, action| ListAction::Item(id, action),
        |state: &ListState, id: &u32| {
            state
                .iter()
                .find(|item| item.id == *id)
                .map(|item| item.loaded)
        },
        |_id: &u32, action: &ItemAction, _loaded: &bool| match action {
            ItemAction::Load => Effect::just(ItemAction::Loaded),
            ItemAction::Loaded => Effect::none(),
        },
    )
}

fn two_items() -> ListState {
    vec![
        Item {
            id: 1,
            loaded: false,
        },
        Item {
            id: 2,
            loaded: false,
        },
    ]
}

#[tokio::test]
async fn a_keyed_action_only_touches_the_matching_element() {
    let store = StoreBuilder::new(two_items())
        .with_reducer(item_reducer().for_each(item_prism, locate_loaded))
        .with_middleware(keyed_loader())
        .build();

    store.dispatch(ListAction::Item(2, ItemAction::Load), source!());
    wait_for(|| store.state()[1].loaded).await;

    let final_state = store.shutdown().await.expect("worker exits cleanly");
    assert!(!final_state[0].loaded);
    assert!(final_state[1].loaded);
}

#[tokio::test]
async fn a_keyed_action_for_a_missing_element_is_a_silent_noop() {
    let recorder = ActionRecorder::new();
    let store = StoreBuilder::new(two_items())
        .with_reducer(item_reducer().for_each(item_prism, locate_loaded))
        .with_middleware(TapMiddleware::new(recorder.tap()))
        .with_middleware(keyed_loader())
        .build();

    store.dispatch(ListAction::Item(99, ItemAction::Load), source!());

    let final_state = store.shutdown().await.expect("worker exits cleanly");
    // No state change and no dispatched follow-up.
    assert_eq!(final_state, two_items());
    assert_eq!(
        recorder.actions(),
        vec![ListAction::Item(99, ItemAction::Load)]
    );
}
