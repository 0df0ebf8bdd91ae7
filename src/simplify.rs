//! Post-elimination cleanup passes over the result AST.
//!
//! The simplifier runs whole-tree passes until one changes nothing, bounded
//! by the caller's pass limit. Each pass walks post-order and applies local
//! rewrites: splicing nested alternations, normalizing an explicit empty
//! alternative into quantifier form, factoring common affixes out of
//! alternatives, collapsing trivial quantifiers, and merging adjacent or
//! nested repetitions of the same body.

use crate::ast::{
    Alternation, Concatenation, Element, Expression, Quantifier,
};

/// Runs passes until a fixed point or until `maximum_passes` is exhausted.
/// Exhausting the pass budget is not an error; the current tree is kept.
pub(crate) fn simplify(expr: &mut Expression, maximum_passes: Option<usize>) -> usize {
    let mut passes = 0;
    while maximum_passes.map_or(true, |limit| passes < limit) {
        let changed = pass_expression(expr);
        passes += 1;
        if !changed {
            break;
        }
    }
    passes
}

fn pass_expression(expr: &mut Expression) -> bool {
    let mut changed = false;
    for alternative in &mut expr.alternatives {
        changed |= pass_concatenation(alternative);
    }
    changed | rewrite_alternatives(&mut expr.alternatives)
}

fn pass_concatenation(concat: &mut Concatenation) -> bool {
    let mut changed = false;
    for element in &mut concat.elements {
        changed |= pass_element(element);
    }
    changed |= inline_trivial_elements(concat);
    changed | merge_adjacent_quantifiers(concat)
}

fn pass_element(element: &mut Element) -> bool {
    let mut changed = false;
    match element {
        Element::CharacterClass(_) => {}
        Element::Alternation(a) => {
            for alternative in &mut a.alternatives {
                changed |= pass_concatenation(alternative);
            }
            changed |= rewrite_alternatives(&mut a.alternatives);
        }
        Element::Quantifier(q) => {
            for alternative in &mut q.alternatives {
                changed |= pass_concatenation(alternative);
            }
            changed |= rewrite_alternatives(&mut q.alternatives);
            changed |= fuse_nested_quantifier(q);
        }
        Element::Assertion(a) => {
            for alternative in &mut a.alternatives {
                changed |= pass_concatenation(alternative);
            }
            changed |= rewrite_alternatives(&mut a.alternatives);
        }
    }
    changed
}

/// Rewrites shared by every node that owns an alternative list.
fn rewrite_alternatives(alternatives: &mut Vec<Concatenation>) -> bool {
    let mut changed = inline_alternation_alternatives(alternatives);
    changed |= normalize_empty_alternative(alternatives);
    changed | factor_common_affixes(alternatives)
}

/// An alternative that is exactly one alternation is spliced into its
/// parent's list.
fn inline_alternation_alternatives(alternatives: &mut Vec<Concatenation>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < alternatives.len() {
        let nested = matches!(
            alternatives[i].single_element(),
            Some(Element::Alternation(_))
        );
        if !nested {
            i += 1;
            continue;
        }
        let mut concat = alternatives.remove(i);
        if let Some(Element::Alternation(inner)) = concat.elements.pop() {
            alternatives.splice(i..i, inner.alternatives);
        }
        changed = true;
    }
    changed
}

/// Drops an explicit ε alternative and compensates so the language keeps
/// admitting the empty string.
fn normalize_empty_alternative(alternatives: &mut Vec<Concatenation>) -> bool {
    if alternatives.len() < 2 || !alternatives.iter().any(Concatenation::is_empty_string) {
        return false;
    }
    alternatives.retain(|a| !a.is_empty_string());
    if alternatives.is_empty() {
        // every alternative was ε
        alternatives.push(Concatenation::default());
        return true;
    }
    if alternatives.iter().any(Concatenation::can_match_empty_string) {
        return true;
    }
    // a lone x{1,n} alternative can simply start at zero
    for alternative in alternatives.iter_mut() {
        if matches!(alternative.single_element(), Some(Element::Quantifier(q)) if q.min == 1) {
            if let Some(Element::Quantifier(q)) = alternative.elements.first_mut() {
                q.min = 0;
                return true;
            }
        }
    }
    let body = std::mem::take(alternatives);
    let optional = Quantifier {
        min: 0,
        max: Some(1),
        alternatives: body,
    };
    alternatives.push(Concatenation {
        elements: vec![Element::Quantifier(optional)],
    });
    true
}

/// Length of the longest element prefix shared by every alternative.
fn common_prefix_len(alternatives: &[Concatenation]) -> usize {
    let first = &alternatives[0];
    let mut len = 0;
    'scan: while len < first.elements.len() {
        let candidate = &first.elements[len];
        for other in &alternatives[1..] {
            if other.elements.get(len) != Some(candidate) {
                break 'scan;
            }
        }
        len += 1;
    }
    len
}

/// Length of the longest element suffix shared by every alternative, not
/// overlapping the first `prefix` elements.
fn common_suffix_len(alternatives: &[Concatenation], prefix: usize) -> usize {
    let first = &alternatives[0];
    let mut len = 0;
    'scan: while prefix + len < first.elements.len() {
        let candidate = &first.elements[first.elements.len() - 1 - len];
        for other in &alternatives[1..] {
            if prefix + len >= other.elements.len() {
                break 'scan;
            }
            if other.elements[other.elements.len() - 1 - len] != *candidate {
                break 'scan;
            }
        }
        len += 1;
    }
    len
}

/// Strips the longest shared prefix and suffix off every alternative and
/// returns them. The lists left behind are the stripped middles.
pub(crate) fn factor_out_common_affixes(
    alternatives: &mut [Concatenation],
) -> (Vec<Element>, Vec<Element>) {
    if alternatives.len() < 2 {
        return (Vec::new(), Vec::new());
    }
    let prefix_len = common_prefix_len(alternatives);
    let suffix_len = common_suffix_len(alternatives, prefix_len);
    if prefix_len == 0 && suffix_len == 0 {
        return (Vec::new(), Vec::new());
    }
    let mut prefix = Vec::new();
    let mut suffix = Vec::new();
    for (idx, alternative) in alternatives.iter_mut().enumerate() {
        let tail_at = alternative.elements.len() - suffix_len;
        let tail = alternative.elements.split_off(tail_at);
        let middle = alternative.elements.split_off(prefix_len);
        let head = std::mem::replace(&mut alternative.elements, middle);
        if idx == 0 {
            prefix = head;
            suffix = tail;
        }
    }
    (prefix, suffix)
}

/// `prefix (middle1|…|middleK) suffix` as a single alternative, when the
/// alternatives share affixes.
fn factor_common_affixes(alternatives: &mut Vec<Concatenation>) -> bool {
    if alternatives.len() < 2 {
        return false;
    }
    let (prefix, suffix) = factor_out_common_affixes(alternatives);
    if prefix.is_empty() && suffix.is_empty() {
        return false;
    }
    let middles = std::mem::take(alternatives);
    let mut elements = prefix;
    if !middles.iter().all(Concatenation::is_empty_string) {
        elements.push(Element::Alternation(Alternation {
            alternatives: middles,
        }));
    }
    elements.extend(suffix);
    alternatives.push(Concatenation { elements });
    true
}

/// Element-level collapses inside one concatenation: `x{..0}` vanishes,
/// `x{1}` and ε-admitting `x{0,1}` unwrap, a one-armed alternation splices.
fn inline_trivial_elements(concat: &mut Concatenation) -> bool {
    enum Action {
        Keep,
        Drop,
        Splice,
    }
    let mut changed = false;
    let mut i = 0;
    while i < concat.elements.len() {
        let action = match &concat.elements[i] {
            Element::Quantifier(q) if q.max == Some(0) => Action::Drop,
            Element::Quantifier(q)
                if q.alternatives.len() == 1
                    && (q.min == 1 && q.max == Some(1)
                        || q.min == 0
                            && q.max == Some(1)
                            && q.alternatives[0].can_match_empty_string()) =>
            {
                Action::Splice
            }
            Element::Alternation(a) if a.alternatives.len() == 1 => Action::Splice,
            _ => Action::Keep,
        };
        match action {
            Action::Keep => i += 1,
            Action::Drop => {
                concat.elements.remove(i);
                changed = true;
            }
            Action::Splice => {
                let removed = concat.elements.remove(i);
                let body = match removed {
                    Element::Quantifier(q) => q.alternatives.into_iter().next(),
                    Element::Alternation(a) => a.alternatives.into_iter().next(),
                    _ => None,
                };
                if let Some(inner) = body {
                    concat.elements.splice(i..i, inner.elements);
                }
                changed = true;
            }
        }
    }
    changed
}

fn add_max(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.saturating_add(y)),
        _ => None,
    }
}

/// `0` absorbs, `∞ ⋅ 0 = 0`, otherwise `∞` propagates.
fn safe_mul(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    if a == Some(0) || b == Some(0) {
        return Some(0);
    }
    match (a, b) {
        (Some(x), Some(y)) => Some(x.saturating_mul(y)),
        _ => None,
    }
}

/// True if `q` repeats exactly the single element `candidate`.
fn quantifies_exactly(q: &Quantifier, candidate: &Element) -> bool {
    match q.alternatives.as_slice() {
        [body] => body.single_element() == Some(candidate),
        _ => false,
    }
}

/// Fuses neighboring repetitions of the same body inside one element list:
/// `q x`, `x q`, and `q1 q2`.
fn merge_adjacent_quantifiers(concat: &mut Concatenation) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i + 1 < concat.elements.len() {
        let merged = merge_pair(&mut concat.elements, i);
        if merged {
            changed = true;
            // a merge can expose a new pair to the left
            i = i.saturating_sub(1);
        } else {
            i += 1;
        }
    }
    changed
}

fn merge_pair(elements: &mut Vec<Element>, i: usize) -> bool {
    enum Merge {
        EqualBodies,
        BumpDropRight,
        BumpDropLeft,
        None,
    }
    let decision = match (&elements[i], &elements[i + 1]) {
        (Element::Quantifier(a), Element::Quantifier(b)) if a.alternatives == b.alternatives => {
            Merge::EqualBodies
        }
        (Element::Quantifier(q), other) if quantifies_exactly(q, other) => Merge::BumpDropRight,
        (other, Element::Quantifier(q)) if quantifies_exactly(q, other) => Merge::BumpDropLeft,
        _ => Merge::None,
    };
    match decision {
        Merge::EqualBodies => {
            let removed = elements.remove(i + 1);
            if let (Element::Quantifier(a), Element::Quantifier(b)) = (&mut elements[i], removed) {
                a.min = a.min.saturating_add(b.min);
                a.max = add_max(a.max, b.max);
            }
            true
        }
        Merge::BumpDropRight => {
            elements.remove(i + 1);
            if let Element::Quantifier(q) = &mut elements[i] {
                q.min = q.min.saturating_add(1);
                q.max = add_max(q.max, Some(1));
            }
            true
        }
        Merge::BumpDropLeft => {
            elements.remove(i);
            if let Element::Quantifier(q) = &mut elements[i] {
                q.min = q.min.saturating_add(1);
                q.max = add_max(q.max, Some(1));
            }
            true
        }
        Merge::None => false,
    }
}

/// `(x{a,b}){c,d}` with both minima in `{0,1}` flattens to
/// `x{a⋅c, b⋅d}`.
fn fuse_nested_quantifier(q: &mut Quantifier) -> bool {
    if !q.low_min() {
        return false;
    }
    let fusable = match q.alternatives.as_slice() {
        [body] => matches!(body.single_element(), Some(Element::Quantifier(inner)) if inner.low_min()),
        _ => false,
    };
    if !fusable {
        return false;
    }
    let Some(mut body) = q.alternatives.pop() else {
        return false;
    };
    let Some(Element::Quantifier(inner)) = body.elements.pop() else {
        return false;
    };
    q.min *= inner.min;
    q.max = safe_mul(q.max, inner.max);
    q.alternatives = inner.alternatives;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::CharacterClass;
    use crate::charset::CharSet;

    const MAX: u32 = 0xFFFF;

    fn class(c: u32) -> Element {
        Element::CharacterClass(CharacterClass {
            characters: CharSet::single(MAX, c).unwrap(),
        })
    }

    fn chain(chars: &[u32]) -> Concatenation {
        Concatenation {
            elements: chars.iter().map(|&c| class(c)).collect(),
        }
    }

    fn expr(alternatives: Vec<Concatenation>) -> Expression {
        Expression { alternatives }
    }

    #[test]
    fn test_inline_nested_alternation() {
        let inner = Alternation {
            alternatives: vec![chain(&[98]), chain(&[99])],
        };
        let mut e = expr(vec![
            chain(&[97]),
            Concatenation {
                elements: vec![Element::Alternation(inner)],
            },
        ]);
        simplify(&mut e, None);
        assert_eq!(e.alternatives.len(), 3, "inner alternatives are spliced up");
    }

    #[test]
    fn test_empty_alternative_becomes_optional() {
        // ε|a  →  (a)?
        let mut e = expr(vec![Concatenation::default(), chain(&[97])]);
        simplify(&mut e, None);
        assert_eq!(e.alternatives.len(), 1);
        let Some(Element::Quantifier(q)) = e.alternatives[0].single_element() else {
            panic!("expected an optional quantifier, got {:?}", e);
        };
        assert_eq!((q.min, q.max), (0, Some(1)));
    }

    #[test]
    fn test_empty_alternative_lowers_plus() {
        // ε|a+  →  a*
        let plus = Quantifier {
            min: 1,
            max: None,
            alternatives: vec![chain(&[97])],
        };
        let mut e = expr(vec![
            Concatenation::default(),
            Concatenation {
                elements: vec![Element::Quantifier(plus)],
            },
        ]);
        simplify(&mut e, None);
        assert_eq!(e.alternatives.len(), 1);
        let Some(Element::Quantifier(q)) = e.alternatives[0].single_element() else {
            panic!("expected a quantifier, got {:?}", e);
        };
        assert_eq!((q.min, q.max), (0, None));
    }

    #[test]
    fn test_empty_alternative_dropped_when_redundant() {
        // ε|a*  →  a*
        let star = Quantifier {
            min: 0,
            max: None,
            alternatives: vec![chain(&[97])],
        };
        let mut e = expr(vec![
            Concatenation::default(),
            Concatenation {
                elements: vec![Element::Quantifier(star)],
            },
        ]);
        simplify(&mut e, None);
        assert_eq!(e.alternatives.len(), 1);
        let Some(Element::Quantifier(q)) = e.alternatives[0].single_element() else {
            panic!("expected a quantifier, got {:?}", e);
        };
        assert_eq!((q.min, q.max), (0, None));
    }

    #[test]
    fn test_factor_common_prefix_and_suffix() {
        // abc|abd  →  ab(c|d)
        let mut e = expr(vec![chain(&[97, 98, 99]), chain(&[97, 98, 100])]);
        simplify(&mut e, None);
        assert_eq!(e.alternatives.len(), 1);
        let elements = &e.alternatives[0].elements;
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0], class(97));
        assert_eq!(elements[1], class(98));
        assert!(matches!(&elements[2], Element::Alternation(a) if a.alternatives.len() == 2));
    }

    #[test]
    fn test_factor_identical_alternatives_collapse() {
        let mut e = expr(vec![chain(&[97, 98]), chain(&[97, 98])]);
        simplify(&mut e, None);
        assert_eq!(e.alternatives.len(), 1);
        assert_eq!(e.alternatives[0], chain(&[97, 98]));
    }

    #[test]
    fn test_inline_exactly_once_quantifier() {
        let once = Quantifier {
            min: 1,
            max: Some(1),
            alternatives: vec![chain(&[97, 98])],
        };
        let mut e = expr(vec![Concatenation {
            elements: vec![Element::Quantifier(once), class(99)],
        }]);
        simplify(&mut e, None);
        assert_eq!(e.alternatives[0], chain(&[97, 98, 99]));
    }

    #[test]
    fn test_drop_zero_max_quantifier() {
        let never = Quantifier {
            min: 0,
            max: Some(0),
            alternatives: vec![chain(&[97])],
        };
        let mut e = expr(vec![Concatenation {
            elements: vec![Element::Quantifier(never), class(98)],
        }]);
        simplify(&mut e, None);
        assert_eq!(e.alternatives[0], chain(&[98]));
    }

    #[test]
    fn test_merge_quantifier_with_adjacent_body() {
        // a* a  →  a{1,}   and   a a*  →  a{1,}
        for quantifier_first in [true, false] {
            let star = Quantifier {
                min: 0,
                max: None,
                alternatives: vec![chain(&[97])],
            };
            let elements = if quantifier_first {
                vec![Element::Quantifier(star), class(97)]
            } else {
                vec![class(97), Element::Quantifier(star)]
            };
            let mut e = expr(vec![Concatenation { elements }]);
            simplify(&mut e, None);
            let Some(Element::Quantifier(q)) = e.alternatives[0].single_element() else {
                panic!("expected merged quantifier, got {:?}", e);
            };
            assert_eq!((q.min, q.max), (1, None));
        }
    }

    #[test]
    fn test_merge_adjacent_quantifiers_same_body() {
        // a{1,2} a{3,4}  →  a{4,6}
        let q1 = Quantifier {
            min: 1,
            max: Some(2),
            alternatives: vec![chain(&[97])],
        };
        let q2 = Quantifier {
            min: 3,
            max: Some(4),
            alternatives: vec![chain(&[97])],
        };
        let mut e = expr(vec![Concatenation {
            elements: vec![Element::Quantifier(q1), Element::Quantifier(q2)],
        }]);
        simplify(&mut e, None);
        let Some(Element::Quantifier(q)) = e.alternatives[0].single_element() else {
            panic!("expected merged quantifier, got {:?}", e);
        };
        assert_eq!((q.min, q.max), (4, Some(6)));
    }

    #[test]
    fn test_fuse_nested_quantifiers() {
        // (a+)?  →  a*
        let inner = Quantifier {
            min: 1,
            max: None,
            alternatives: vec![chain(&[97])],
        };
        let outer = Quantifier {
            min: 0,
            max: Some(1),
            alternatives: vec![Concatenation {
                elements: vec![Element::Quantifier(inner)],
            }],
        };
        let mut e = expr(vec![Concatenation {
            elements: vec![Element::Quantifier(outer), class(98)],
        }]);
        simplify(&mut e, None);
        let elements = &e.alternatives[0].elements;
        assert_eq!(elements.len(), 2);
        let Element::Quantifier(q) = &elements[0] else {
            panic!("expected fused quantifier, got {:?}", elements);
        };
        assert_eq!((q.min, q.max), (0, None));
        assert_eq!(q.alternatives, vec![chain(&[97])]);
    }

    #[test]
    fn test_safe_mul() {
        assert_eq!(safe_mul(Some(0), None), Some(0), "∞ ⋅ 0 must be 0");
        assert_eq!(safe_mul(None, Some(0)), Some(0));
        assert_eq!(safe_mul(None, Some(3)), None);
        assert_eq!(safe_mul(Some(2), Some(3)), Some(6));
        assert_eq!(safe_mul(None, None), None);
    }

    #[test]
    fn test_fixed_point_is_idempotent() {
        let mut e = expr(vec![chain(&[97, 98, 99]), chain(&[97, 98, 100])]);
        simplify(&mut e, None);
        let settled = e.clone();
        let changed = pass_expression(&mut e);
        assert!(!changed, "one extra pass after the fixed point must be a no-op");
        assert_eq!(e, settled);
    }

    #[test]
    fn test_pass_limit_respected() {
        let mut e = expr(vec![chain(&[97, 98, 99]), chain(&[97, 98, 100])]);
        let passes = simplify(&mut e, Some(1));
        assert_eq!(passes, 1, "the pass budget is a hard stop");
    }
}
