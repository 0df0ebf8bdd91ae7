//! Translation of an external automaton into the elimination graph.
//!
//! The builder walks the caller's automaton depth-first, memoizing each
//! external state to an arena node, and arranges the shape the elimination
//! engine relies on: a synthetic source with no incoming edges, a single
//! drain with no outgoing edges, and no state that cannot reach the drain.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::ast::TransitionFactory;
use crate::charset::builder_order;
use crate::graph::{NodeList, StateId};
use crate::{ConvertError, FaSource};

/// Builds the internal graph for `fa`.
///
/// Returns `None` when no final state is reachable, which the caller turns
/// into the empty-language expression.
pub(crate) fn build_graph<F: FaSource>(
    fa: &F,
    factory: &mut TransitionFactory,
) -> Result<Option<NodeList>, ConvertError> {
    let mut list = NodeList::new();
    let initial = list.initial();

    // The external start state gets its own node behind an ε edge, so the
    // graph's source is never final even when the automaton's start is.
    let entry = list.create_node();
    let eps = factory.empty_string()?;
    list.link_nodes(initial, entry, eps)?;

    let mut translated: FxHashMap<F::State, StateId> = FxHashMap::default();
    translated.insert(fa.initial(), entry);
    let mut stack: Vec<F::State> = vec![fa.initial()];

    while let Some(state) = stack.pop() {
        let node = translated[&state];
        if fa.is_final(&state) {
            list.mark_final(node);
        }
        // Deterministic emission order: non-empty charsets first, then
        // lexicographic over the range lists. The expression must be a
        // function of the automaton, not of iterator whims.
        let mut edges: SmallVec<[_; 8]> = SmallVec::from_vec(fa.out_edges(&state));
        edges.sort_by(|(_, a), (_, b)| builder_order(a, b));
        for (target, chars) in edges {
            let target_node = match translated.get(&target) {
                Some(&id) => id,
                None => {
                    let id = list.create_node();
                    translated.insert(target.clone(), id);
                    stack.push(target);
                    id
                }
            };
            let transition = factory.character_transition(chars)?;
            list.link_nodes(node, target_node, transition)?;
        }
    }

    if list.finals().is_empty() {
        return Ok(None);
    }

    // Funnel every final into a single drain.
    let drain = list.create_node();
    for f in list.finals().to_vec() {
        let eps = factory.empty_string()?;
        list.link_nodes(f, drain, eps)?;
    }
    list.set_finals(vec![drain]);

    prune_unproductive(&mut list, drain);
    Ok(Some(list))
}

/// Disconnects every state that cannot reach `drain`.
///
/// Reverse DFS over the incoming-edge sets; states outside the reached set
/// keep their identity but lose all edges.
fn prune_unproductive(list: &mut NodeList, drain: StateId) {
    let mut productive: FxHashSet<StateId> = FxHashSet::default();
    let mut stack = vec![drain];
    productive.insert(drain);
    while let Some(s) = stack.pop() {
        for source in list.in_sources_sorted(s, false) {
            if productive.insert(source) {
                stack.push(source);
            }
        }
    }
    for s in list.state_ids().collect::<Vec<_>>() {
        if !productive.contains(&s) {
            list.isolate(s);
        }
    }
}
