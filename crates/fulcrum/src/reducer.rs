//! Pure transition functions and their composition algebra.
//!
//! Reducers form a monoid: [`Reducer::identity`] changes nothing, and
//! [`Reducer::then`] is an associative append that applies the right reducer
//! to the output of the left one. Optics lifting ([`Reducer::lift`] and
//! [`Reducer::for_each`]) converts a reducer written against a narrow
//! `(State, Action)` pair into one usable at a wider composite scope.

use std::sync::Arc;

use crate::core::{Action, StateValue};

/// A pure transition function `(State, Action) -> State`, expressed in-place
/// as `Fn(&mut S, &A)`.
///
/// Reducers must never fail: given any valid input they return *some* state,
/// even if unchanged. A panic here corrupts the single source of truth.
pub struct Reducer<S, A> {
    run: Arc<dyn Fn(&mut S, &A) + Send + Sync>,
}

impl<S: StateValue, A: Action> Reducer<S, A> {
    pub fn new(run: impl Fn(&mut S, &A) + Send + Sync + 'static) -> Self {
        Self { run: Arc::new(run) }
    }

    /// The monoid identity: leaves every state untouched.
    pub fn identity() -> Self {
        Self::new(|_, _| {})
    }

    /// Apply this reducer to a state.
    pub fn reduce(&self, state: &mut S, action: &A) {
        (self.run)(state, action);
    }

    /// Monoid append: apply `next` right after `self`.
    ///
    /// Associative, with [`Reducer::identity`] as the two-sided unit.
    pub fn then(self, next: Reducer<S, A>) -> Reducer<S, A> {
        let left = self.run;
        let right = next.run;
        Reducer {
            run: Arc::new(move |state, action| {
                left(state, action);
                right(state, action);
            }),
        }
    }

    /// Lift this reducer into a wider `(GlobalState, GlobalAction)` scope.
    ///
    /// `action` projects a global action down to this reducer's action type;
    /// returning `None` marks the action as irrelevant, and the lifted
    /// reducer is a strict no-op for that dispatch. `state` is a mutable lens
    /// focusing the global state on this reducer's sub-state, covering both
    /// the read projection and the write-back injection.
    pub fn lift<GS, GA>(
        self,
        action: impl Fn(&GA) -> Option<A> + Send + Sync + 'static,
        state: impl for<'a> Fn(&'a mut GS) -> &'a mut S + Send + Sync + 'static,
    ) -> Reducer<GS, GA>
    where
        GS: StateValue,
        GA: Action,
    {
        let run = self.run;
        Reducer {
            run: Arc::new(move |global, global_action| {
                if let Some(local) = action(global_action) {
                    run(state(global), &local);
                }
            }),
        }
    }

    /// Lift this reducer over an indexed collection of homogeneous
    /// sub-states.
    ///
    /// `action` extracts the element identifier together with the local
    /// action; `locate` resolves the matching element by identity on every
    /// invocation, never from a cached copy. A locator miss means the element
    /// is gone this turn and the dispatch is a silent no-op.
    pub fn for_each<GS, GA, Id>(
        self,
        action: impl Fn(&GA) -> Option<(Id, A)> + Send + Sync + 'static,
        locate: impl for<'a> Fn(&'a mut GS, &Id) -> Option<&'a mut S> + Send + Sync + 'static,
    ) -> Reducer<GS, GA>
    where
        GS: StateValue,
        GA: Action,
        Id: Send + Sync + 'static,
    {
        let run = self.run;
        Reducer {
            run: Arc::new(move |global, global_action| {
                if let Some((id, local)) = action(global_action) {
                    if let Some(element) = locate(global, &id) {
                        run(element, &local);
                    }
                }
            }),
        }
    }
}

impl<S, A> Clone for Reducer<S, A> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Counter {
        Increase,
        Decrease,
    }

    fn counter() -> Reducer<i64, Counter> {
        Reducer::new(|n, action| match action {
            Counter::Increase => *n += 1,
            Counter::Decrease => *n -= 1,
        })
    }

    fn apply(reducer: &Reducer<i64, Counter>, start: i64, actions: &[Counter]) -> i64 {
        let mut state = start;
        for action in actions {
            reducer.reduce(&mut state, action);
        }
        state
    }

    #[test]
    fn identity_is_a_two_sided_unit() {
        let inputs = [
            (0, Counter::Increase),
            (5, Counter::Decrease),
            (-3, Counter::Increase),
        ];
        for (start, action) in inputs {
            let plain = counter();
            let left = Reducer::identity().then(counter());
            let right = counter().then(Reducer::identity());

            let mut a = start;
            let mut b = start;
            let mut c = start;
            plain.reduce(&mut a, &action);
            left.reduce(&mut b, &action);
            right.reduce(&mut c, &action);
            assert_eq!(a, b);
            assert_eq!(a, c);
        }
    }

    #[test]
    fn then_is_associative() {
        let f = || counter();
        let g = || Reducer::<i64, Counter>::new(|n, _| *n *= 2);
        let h = || Reducer::<i64, Counter>::new(|n, _| *n -= 3);

        let grouped_left = f().then(g()).then(h());
        let grouped_right = f().then(g().then(h()));

        for start in [-2, 0, 7] {
            for action in [Counter::Increase, Counter::Decrease] {
                let mut a = start;
                let mut b = start;
                grouped_left.reduce(&mut a, &action);
                grouped_right.reduce(&mut b, &action);
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn then_applies_right_after_left() {
        // (n + 1) * 2, not (n * 2) + 1
        let composed = counter().then(Reducer::new(|n, _| *n *= 2));
        let mut state = 3;
        composed.reduce(&mut state, &Counter::Increase);
        assert_eq!(state, 8);
    }

    #[derive(Debug, Clone, PartialEq)]
    enum AppAction {
        Count(Counter),
        Rename(String),
    }

    #[derive(Debug, Clone, PartialEq)]
    struct AppState {
        count: i64,
        name: String,
    }

    fn focus_count(state: &mut AppState) -> &mut i64 {
        &mut state.count
    }

    fn focus_self(state: &mut i64) -> &mut i64 {
        state
    }

    #[test]
    fn lifting_with_identity_optics_matches_the_unlifted_reducer() {
        let lifted: Reducer<i64, Counter> =
            counter().lift(|a: &Counter| Some(a.clone()), focus_self);

        assert_eq!(apply(&counter(), 0, &[Counter::Increase]), 1);
        assert_eq!(apply(&lifted, 0, &[Counter::Increase]), 1);
        assert_eq!(
            apply(&counter(), 9, &[Counter::Decrease, Counter::Decrease]),
            apply(&lifted, 9, &[Counter::Decrease, Counter::Decrease]),
        );
    }

    #[test]
    fn lifted_reducer_ignores_irrelevant_actions() {
        let lifted = counter().lift(
            |a: &AppAction| match a {
                AppAction::Count(c) => Some(c.clone()),
                AppAction::Rename(_) => None,
            },
            focus_count,
        );

        let mut state = AppState {
            count: 0,
            name: "before".into(),
        };
        lifted.reduce(&mut state, &AppAction::Rename("after".into()));
        assert_eq!(state.count, 0);
        assert_eq!(state.name, "before");

        lifted.reduce(&mut state, &AppAction::Count(Counter::Increase));
        assert_eq!(state.count, 1);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        count: i64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct ListState {
        items: Vec<Item>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum ListAction {
        Item(u32, Counter),
    }

    fn locate_item<'a>(state: &'a mut ListState, id: &u32) -> Option<&'a mut i64> {
        state
            .items
            .iter_mut()
            .find(|item| item.id == *id)
            .map(|item| &mut item.count)
    }

    #[test]
    fn for_each_touches_only_the_matching_element() {
        let lifted = counter().for_each(
            |ListAction::Item(id, action)| Some((*id, action.clone())),
            locate_item,
        );

        let mut state = ListState {
            items: vec![Item { id: 1, count: 0 }, Item { id: 2, count: 10 }],
        };

        lifted.reduce(&mut state, &ListAction::Item(2, Counter::Increase));
        assert_eq!(state.items[0].count, 0);
        assert_eq!(state.items[1].count, 11);
    }

    #[test]
    fn for_each_with_unknown_id_changes_nothing() {
        let lifted = counter().for_each(
            |ListAction::Item(id, action)| Some((*id, action.clone())),
            locate_item,
        );

        let mut state = ListState {
            items: vec![Item { id: 1, count: 0 }],
        };
        let before = state.clone();

        lifted.reduce(&mut state, &ListAction::Item(99, Counter::Increase));
        assert_eq!(state, before);
    }
}
