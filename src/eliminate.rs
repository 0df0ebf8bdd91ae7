//! Cost-driven state elimination over the automaton graph.
//!
//! Interior states are removed one at a time; each removal replaces the
//! state's in/out edge pairs with edges labeled by concatenated (and, for a
//! self-loop, starred) transitions. The removal order follows a cost
//! heuristic that approximates how many AST nodes the removal will produce,
//! and after every removal a worklist of cheap local rewrites keeps the
//! frontier small before the next cost scan.
//!
//! The combinators here mutate their operands, so the engine hands them
//! fresh copies whenever one sub-AST would otherwise land on several new
//! edges.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::ast::{Concatenation, Element, TransitionFactory};
use crate::graph::{NodeList, StateId};
use crate::simplify::factor_out_common_affixes;
use crate::ConvertError;

/// `a ⋅ b`, flattened in place.
///
/// A wide alternation operand is first run through affix factoring so the
/// concatenation does not multiply it out through distributivity later.
pub(crate) fn concat(mut a: Concatenation, mut b: Concatenation) -> Concatenation {
    factor_wide_alternation(&mut a);
    factor_wide_alternation(&mut b);
    a.elements.append(&mut b.elements);
    a
}

/// If `c` is exactly one alternation with two or more alternatives, factor
/// the alternatives' common affixes out into `c`'s element list.
fn factor_wide_alternation(c: &mut Concatenation) {
    let wide = matches!(
        c.single_element(),
        Some(Element::Alternation(a)) if a.alternatives.len() >= 2
    );
    if !wide {
        return;
    }
    let Some(Element::Alternation(mut alternation)) = c.elements.pop() else {
        return;
    };
    let (prefix, suffix) = factor_out_common_affixes(&mut alternation.alternatives);
    c.elements = prefix;
    // if every alternative was consumed by the affixes, the alternation is ε
    if !alternation.alternatives.iter().all(Concatenation::is_empty_string) {
        c.elements.push(Element::Alternation(alternation));
    }
    c.elements.extend(suffix);
}

/// `a ∪ b`, keeping the result as flat as CharSet merging allows.
pub(crate) fn union(
    factory: &mut TransitionFactory,
    mut a: Concatenation,
    mut b: Concatenation,
) -> Result<Concatenation, ConvertError> {
    // two plain classes melt into one
    if single_class(&a).is_some() && single_class(&b).is_some() {
        let Some(Element::CharacterClass(right)) = b.elements.pop() else {
            return Err(ConvertError::Unreachable("single-class operand lost its class"));
        };
        let Some(Element::CharacterClass(left)) = a.elements.first_mut() else {
            return Err(ConvertError::Unreachable("single-class operand lost its class"));
        };
        left.characters = left.characters.union(&right.characters)?;
        return Ok(a);
    }

    if let Some(Element::Alternation(_)) = a.single_element() {
        let Some(Element::Alternation(mut alternation)) = a.elements.pop() else {
            return Err(ConvertError::Unreachable("alternation operand lost its alternation"));
        };
        match b.single_element() {
            Some(Element::Alternation(_)) => {
                if let Some(Element::Alternation(other)) = b.elements.pop() {
                    alternation.alternatives.extend(other.alternatives);
                }
            }
            _ => push_alternative(&mut alternation.alternatives, b)?,
        }
        a.elements.push(Element::Alternation(alternation));
        return Ok(a);
    }

    if let Some(Element::Alternation(_)) = b.single_element() {
        let Some(Element::Alternation(mut alternation)) = b.elements.pop() else {
            return Err(ConvertError::Unreachable("alternation operand lost its alternation"));
        };
        insert_alternative_front(&mut alternation.alternatives, a)?;
        b.elements.push(Element::Alternation(alternation));
        return Ok(b);
    }

    let alternation = factory.alternation(vec![a, b])?;
    factory.concatenation(vec![Element::Alternation(alternation)])
}

fn single_class(c: &Concatenation) -> Option<&crate::ast::CharacterClass> {
    match c.single_element() {
        Some(Element::CharacterClass(cc)) => Some(cc),
        _ => None,
    }
}

/// Appends `alt` to an alternative list; a plain class is merged into an
/// existing plain-class alternative instead of widening the alternation.
fn push_alternative(
    alternatives: &mut Vec<Concatenation>,
    alt: Concatenation,
) -> Result<(), ConvertError> {
    if let Some(new_class) = single_class(&alt) {
        for existing in alternatives.iter_mut() {
            let existing_len = existing.elements.len();
            let merged = match existing.elements.first_mut() {
                Some(Element::CharacterClass(cc)) if existing_len == 1 => {
                    cc.characters = cc.characters.union(&new_class.characters)?;
                    true
                }
                _ => false,
            };
            if merged {
                return Ok(());
            }
        }
    }
    alternatives.push(alt);
    Ok(())
}

fn insert_alternative_front(
    alternatives: &mut Vec<Concatenation>,
    alt: Concatenation,
) -> Result<(), ConvertError> {
    if let Some(new_class) = single_class(&alt) {
        for existing in alternatives.iter_mut() {
            let existing_len = existing.elements.len();
            let merged = match existing.elements.first_mut() {
                Some(Element::CharacterClass(cc)) if existing_len == 1 => {
                    cc.characters = cc.characters.union(&new_class.characters)?;
                    true
                }
                _ => false,
            };
            if merged {
                return Ok(());
            }
        }
    }
    alternatives.insert(0, alt);
    Ok(())
}

/// Kleene star. Trivial quantifier shapes are rewritten in place instead of
/// nesting.
pub(crate) fn star(
    factory: &mut TransitionFactory,
    mut a: Concatenation,
) -> Result<Concatenation, ConvertError> {
    if a.is_empty_string() {
        return Ok(a);
    }
    if let Some(Element::Quantifier(_)) = a.single_element() {
        if let Some(Element::Quantifier(q)) = a.elements.first_mut() {
            if q.max == Some(0) {
                a.elements.clear();
                return Ok(a);
            }
            if q.min <= 1 {
                q.min = 0;
                q.max = None;
                return Ok(a);
            }
        }
    }
    let quantifier = factory.quantifier(0, None, vec![a])?;
    factory.concatenation(vec![Element::Quantifier(quantifier)])
}

/// One-or-more repetition, with the same trivial-shape collapses as `star`.
pub(crate) fn plus(
    factory: &mut TransitionFactory,
    mut a: Concatenation,
) -> Result<Concatenation, ConvertError> {
    if a.is_empty_string() {
        return Ok(a);
    }
    if let Some(Element::Quantifier(_)) = a.single_element() {
        if let Some(Element::Quantifier(q)) = a.elements.first_mut() {
            if q.max == Some(0) {
                a.elements.clear();
                return Ok(a);
            }
            if q.min <= 1 {
                q.max = None;
                return Ok(a);
            }
        }
    }
    let quantifier = factory.quantifier(1, None, vec![a])?;
    factory.concatenation(vec![Element::Quantifier(quantifier)])
}

/// Adds `from → to` labeled `t`, unioning with an existing edge label.
fn link_with_union(
    list: &mut NodeList,
    factory: &mut TransitionFactory,
    from: StateId,
    to: StateId,
    t: Concatenation,
) -> Result<(), ConvertError> {
    match list.unlink_nodes(from, to) {
        Some(existing) => {
            let merged = union(factory, existing, t)?;
            list.link_nodes(from, to, merged)
        }
        None => list.link_nodes(from, to, t),
    }
}

/// Expected size of the transitions produced by removing `s`: each new edge
/// is a three-way concat when a self-loop must be starred in, a two-way
/// concat otherwise.
fn cost(list: &NodeList, s: StateId) -> usize {
    let ins = list.in_degree(s);
    let outs = list.out_degree(s);
    if list.has_self_loop(s) {
        (ins - 1) * (outs - 1) * 3
    } else {
        ins * outs * 2
    }
}

/// Removes `s`, bridging every in/out pair through copied transitions.
/// Returns the neighbors whose edge sets changed.
fn remove_state(
    list: &mut NodeList,
    factory: &mut TransitionFactory,
    s: StateId,
) -> Result<SmallVec<[StateId; 8]>, ConvertError> {
    let loop_star = match list.unlink_nodes(s, s) {
        Some(label) => Some(star(factory, label)?),
        None => None,
    };
    let ins = list.in_sources_sorted(s, true);
    let outs = list.out_targets_sorted(s, true);

    let mut affected: SmallVec<[StateId; 8]> = SmallVec::new();
    for &i in &ins {
        let in_label = list
            .unlink_nodes(i, s)
            .ok_or(ConvertError::Unreachable("in-edge vanished during removal"))?;
        for &o in &outs {
            let mut bridge = factory.copy(&in_label)?;
            if let Some(r) = &loop_star {
                bridge = concat(bridge, factory.copy(r)?);
            }
            let out_label = list
                .transition(s, o)
                .ok_or(ConvertError::Unreachable("out-edge vanished during removal"))?;
            let out_copy = factory.copy(out_label)?;
            bridge = concat(bridge, out_copy);
            link_with_union(list, factory, i, o, bridge)?;
        }
        affected.push(i);
    }
    for &o in &outs {
        let _ = list.unlink_nodes(s, o);
        affected.push(o);
    }
    Ok(affected)
}

/// Cheap rewrites applied to a state whose neighborhood just changed.
fn trivialize(
    list: &mut NodeList,
    factory: &mut TransitionFactory,
    s: StateId,
    remaining: &mut Vec<StateId>,
    worklist: &mut VecDeque<StateId>,
) -> Result<(), ConvertError> {
    if list.has_self_loop(s) {
        let real_ins = list.in_sources_sorted(s, true);
        let real_outs = list.out_targets_sorted(s, true);

        if real_ins.len() == 1
            && list.transition(real_ins[0], s) == list.transition(s, s)
        {
            // (A)-[a]->(B)-[a]*->(B): the loop is the in-label again, so the
            // in-edge becomes a+. The loop label is structurally equal to the
            // in-label, so plus() may consume it and relink replaces the rest.
            let i = real_ins[0];
            let loop_label = list
                .unlink_nodes(s, s)
                .ok_or(ConvertError::Unreachable("self-loop vanished"))?;
            let fused = plus(factory, loop_label)?;
            list.relink_nodes(i, s, fused)?;
            worklist.push_back(i);
            worklist.push_back(s);
        } else if real_outs.len() == 1
            && list.transition(s, real_outs[0]) == list.transition(s, s)
        {
            let o = real_outs[0];
            let loop_label = list
                .unlink_nodes(s, s)
                .ok_or(ConvertError::Unreachable("self-loop vanished"))?;
            let fused = plus(factory, loop_label)?;
            list.relink_nodes(s, o, fused)?;
            worklist.push_back(o);
            worklist.push_back(s);
        } else if real_outs.len() == 1 {
            // pull the starred loop into the unique out-edge: c* b
            let o = real_outs[0];
            let loop_label = list
                .unlink_nodes(s, s)
                .ok_or(ConvertError::Unreachable("self-loop vanished"))?;
            let starred = star(factory, loop_label)?;
            let out_label = list
                .unlink_nodes(s, o)
                .ok_or(ConvertError::Unreachable("fused out-edge vanished"))?;
            list.link_nodes(s, o, concat(starred, out_label))?;
            worklist.push_back(o);
            worklist.push_back(s);
        } else if real_ins.len() == 1 {
            // symmetric fusion into the unique in-edge: a c*
            let i = real_ins[0];
            let loop_label = list
                .unlink_nodes(s, s)
                .ok_or(ConvertError::Unreachable("self-loop vanished"))?;
            let starred = star(factory, loop_label)?;
            let in_label = list
                .unlink_nodes(i, s)
                .ok_or(ConvertError::Unreachable("fused in-edge vanished"))?;
            list.link_nodes(i, s, concat(in_label, starred))?;
            worklist.push_back(i);
            worklist.push_back(s);
        }
    }

    // single-in single-out interior states fold into one edge
    if remaining.contains(&s)
        && !list.has_self_loop(s)
        && list.in_degree(s) == 1
        && list.out_degree(s) == 1
    {
        let i = list.in_sources_sorted(s, false)[0];
        let o = list.out_targets_sorted(s, false)[0];
        let in_label = list
            .unlink_nodes(i, s)
            .ok_or(ConvertError::Unreachable("absorbed in-edge vanished"))?;
        let out_label = list
            .unlink_nodes(s, o)
            .ok_or(ConvertError::Unreachable("absorbed out-edge vanished"))?;
        link_with_union(list, factory, i, o, concat(in_label, out_label))?;
        remaining.retain(|&r| r != s);
        worklist.push_back(i);
        worklist.push_back(o);
    }

    Ok(())
}

/// Runs elimination to completion and returns the residual transition, the
/// label of the single surviving `initial → final` edge.
pub(crate) fn eliminate(
    list: &mut NodeList,
    factory: &mut TransitionFactory,
) -> Result<Concatenation, ConvertError> {
    let initial = list.initial();
    let finals: FxHashSet<StateId> = list.finals().iter().copied().collect();
    let mut remaining: Vec<StateId> = Vec::with_capacity(list.state_count());
    remaining.extend(
        list.state_ids()
            .filter(|s| *s != initial && !finals.contains(s)),
    );

    while !remaining.is_empty() {
        let mut best = 0;
        let mut best_cost = cost(list, remaining[0]);
        for (idx, &s) in remaining.iter().enumerate().skip(1) {
            let c = cost(list, s);
            if c < best_cost {
                best = idx;
                best_cost = c;
            }
        }
        let s = remaining.remove(best);
        let affected = remove_state(list, factory, s)?;

        let mut worklist: VecDeque<StateId> = affected.into_iter().collect();
        while let Some(w) = worklist.pop_front() {
            trivialize(list, factory, w, &mut remaining, &mut worklist)?;
        }
    }

    let &[fin] = list.finals() else {
        return Err(ConvertError::StateEliminationFailed);
    };
    let sources = list.in_sources_sorted(fin, false);
    let fed_only_by_initial = sources.len() == 1 && sources[0] == initial;
    if !fed_only_by_initial || list.out_degree(initial) != 1 {
        return Err(ConvertError::StateEliminationFailed);
    }
    list.unlink_nodes(initial, fin)
        .ok_or(ConvertError::StateEliminationFailed)
}
