//! fa2regex: convert finite automata over character sets into regular
//! expression ASTs.
//!
//! The conversion runs classical state elimination over an internal graph
//! built from the caller's automaton, then simplifies the resulting tree.
//! The output is structurally equivalent in language to the input automaton;
//! no attempt is made at a globally minimal or canonical expression.
//!
//! ```
//! use fa2regex::{fa_to_regex, CharSet, FaSource, Options};
//!
//! /// An automaton accepting exactly the word "a".
//! struct Lit;
//!
//! impl FaSource for Lit {
//!     type State = u8;
//!     fn initial(&self) -> u8 {
//!         0
//!     }
//!     fn is_final(&self, state: &u8) -> bool {
//!         *state == 1
//!     }
//!     fn out_edges(&self, state: &u8) -> Vec<(u8, CharSet)> {
//!         match state {
//!             0 => vec![(1, CharSet::single(0xFFFF, 'a' as u32).unwrap())],
//!             _ => Vec::new(),
//!         }
//!     }
//! }
//!
//! let expr = fa_to_regex(&Lit, &Options::default()).unwrap();
//! assert_eq!(expr.alternatives.len(), 1);
//! ```

mod ast;
mod builder;
mod charset;
mod eliminate;
mod graph;
mod simplify;
pub mod unicode_categories;

use std::fmt;
use std::hash::Hash;

pub use ast::{
    expression_node_count, node_count, Alternation, Assertion, AssertionKind, CharacterClass,
    Concatenation, Element, Expression, Quantifier, TransitionFactory,
};
pub use charset::{CharRange, CharSet, UNICODE_MAXIMUM};

/// Errors surfaced by the conversion and by `CharSet` operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// A range violated `0 ≤ min ≤ max ≤ maximum` at `CharSet` construction.
    RangeOutOfBounds { min: u32, max: u32, maximum: u32 },
    /// A binary `CharSet` operation mixed two different alphabets.
    DomainMismatch { left: u32, right: u32 },
    /// An edge already exists for the ordered state pair.
    AlreadyLinked,
    /// No edge exists for the ordered state pair.
    NotLinked,
    /// The AST node budget was exhausted.
    TooManyNodes { limit: usize },
    /// Elimination finished in a shape it promised never to reach; either an
    /// engine bug or an input iterator breaking its contract.
    StateEliminationFailed,
    /// An impossible dispatch arm was reached.
    Unreachable(&'static str),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::RangeOutOfBounds { min, max, maximum } => {
                write!(f, "range {}..={} out of bounds for maximum {}", min, max, maximum)
            }
            ConvertError::DomainMismatch { left, right } => {
                write!(f, "charset maxima differ: {} vs {}", left, right)
            }
            ConvertError::AlreadyLinked => write!(f, "states are already linked"),
            ConvertError::NotLinked => write!(f, "states are not linked"),
            ConvertError::TooManyNodes { limit } => {
                write!(f, "too many AST nodes (limit {})", limit)
            }
            ConvertError::StateEliminationFailed => {
                write!(f, "state elimination ended in an invalid shape")
            }
            ConvertError::Unreachable(what) => write!(f, "entered unreachable code: {}", what),
        }
    }
}

impl std::error::Error for ConvertError {}

/// The automaton the caller hands in.
///
/// States need only a hashable identity. `is_final` must be pure and stable
/// for the duration of one conversion, and `out_edges` must return at most
/// one entry per target state, with every charset sharing one `maximum`.
/// Empty charsets are allowed; they label edges that match nothing.
pub trait FaSource {
    type State: Clone + Eq + Hash;

    /// The start state.
    fn initial(&self) -> Self::State;

    /// Whether `state` accepts.
    fn is_final(&self, state: &Self::State) -> bool;

    /// Labeled transitions out of `state`.
    fn out_edges(&self, state: &Self::State) -> Vec<(Self::State, CharSet)>;
}

/// Conversion limits.
#[derive(Debug, Clone)]
pub struct Options {
    /// Hard ceiling on AST nodes constructed during the conversion,
    /// structural copies included. Exceeding it fails with `TooManyNodes`.
    pub maximum_nodes: usize,
    /// Upper bound on simplifier passes; `None` runs to a fixed point.
    /// Exhausting the bound keeps the current tree, it is not an error.
    pub maximum_optimization_passes: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            maximum_nodes: 10_000,
            maximum_optimization_passes: None,
        }
    }
}

/// Converts `fa` into an equivalent regular expression.
///
/// An automaton with no reachable final state yields an expression with zero
/// alternatives, the empty language.
pub fn fa_to_regex<F: FaSource>(fa: &F, options: &Options) -> Result<Expression, ConvertError> {
    let mut factory = TransitionFactory::new(options.maximum_nodes);
    let Some(mut list) = builder::build_graph(fa, &mut factory)? else {
        return Ok(Expression {
            alternatives: Vec::new(),
        });
    };
    let residual = eliminate::eliminate(&mut list, &mut factory)?;
    let mut expr = expression_from_residual(residual);
    simplify::simplify(&mut expr, options.maximum_optimization_passes);
    Ok(expr)
}

/// Lifts the residual transition into the root node; a residual that is one
/// bare alternation donates its alternatives directly.
fn expression_from_residual(mut residual: Concatenation) -> Expression {
    if matches!(residual.single_element(), Some(Element::Alternation(_))) {
        if let Some(Element::Alternation(alternation)) = residual.elements.pop() {
            return Expression {
                alternatives: alternation.alternatives,
            };
        }
    }
    Expression {
        alternatives: vec![residual],
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{expr_matches, fa_accepts, VecFa, XorShift};
    use super::*;

    const MAX: u32 = 0xFFFF;

    fn single(c: char) -> CharSet {
        CharSet::single(MAX, c as u32).unwrap()
    }

    fn chars(cs: &[char]) -> CharSet {
        CharSet::from_chars(MAX, cs.iter().copied()).unwrap()
    }

    fn convert(fa: &VecFa) -> Expression {
        fa_to_regex(fa, &Options::default()).unwrap()
    }

    fn expect_class(element: &Element) -> &CharSet {
        match element {
            Element::CharacterClass(c) => &c.characters,
            other => panic!("expected a character class, got {:?}", other),
        }
    }

    #[test]
    fn test_single_char() {
        // q0 --a--> q1, q1 final
        let fa = VecFa::new(0, &[1], &[(0, 1, single('a'))]);
        let expr = convert(&fa);
        assert_eq!(expr.alternatives.len(), 1);
        let alt = &expr.alternatives[0];
        assert_eq!(alt.elements.len(), 1);
        assert_eq!(expect_class(&alt.elements[0]), &single('a'));
    }

    #[test]
    fn test_kleene_star() {
        // q0 initial and final, q0 --a--> q0
        let fa = VecFa::new(0, &[0], &[(0, 0, single('a'))]);
        let expr = convert(&fa);
        assert_eq!(expr.alternatives.len(), 1);
        let Some(Element::Quantifier(q)) = expr.alternatives[0].single_element() else {
            panic!("expected a star quantifier, got {}", expr);
        };
        assert_eq!((q.min, q.max), (0, None));
        assert_eq!(q.alternatives.len(), 1);
        assert_eq!(
            expect_class(&q.alternatives[0].elements[0]),
            &single('a')
        );
    }

    #[test]
    fn test_alternation_merges_into_one_class() {
        // q0 --a--> f1, q0 --b--> f2, both final
        let fa = VecFa::new(
            0,
            &[1, 2],
            &[(0, 1, single('a')), (0, 2, single('b'))],
        );
        let expr = convert(&fa);
        assert_eq!(expr.alternatives.len(), 1);
        let alt = &expr.alternatives[0];
        assert_eq!(alt.elements.len(), 1);
        assert_eq!(expect_class(&alt.elements[0]), &chars(&['a', 'b']));
    }

    #[test]
    fn test_common_prefix_factoring() {
        // abc | abd along two separate paths
        let fa = VecFa::new(
            0,
            &[3, 6],
            &[
                (0, 1, single('a')),
                (1, 2, single('b')),
                (2, 3, single('c')),
                (0, 4, single('a')),
                (4, 5, single('b')),
                (5, 6, single('d')),
            ],
        );
        let expr = convert(&fa);
        assert_eq!(expr.alternatives.len(), 1, "got {}", expr);
        let elements = &expr.alternatives[0].elements;
        assert_eq!(elements.len(), 3, "expected a⋅b⋅(c|d), got {}", expr);
        assert_eq!(expect_class(&elements[0]), &single('a'));
        assert_eq!(expect_class(&elements[1]), &single('b'));
        match &elements[2] {
            Element::Alternation(alternation) => {
                assert_eq!(alternation.alternatives.len(), 2);
                for alternative in &alternation.alternatives {
                    assert_eq!(alternative.elements.len(), 1);
                    let class = expect_class(&alternative.elements[0]);
                    assert!(
                        class == &single('c') || class == &single('d'),
                        "unexpected branch {:?}",
                        class
                    );
                }
            }
            Element::CharacterClass(c) => {
                // the two branches may have been merged into one class
                assert_eq!(&c.characters, &chars(&['c', 'd']));
            }
            other => panic!("expected (c|d), got {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_final_is_empty_language() {
        let fa = VecFa::new(0, &[], &[(0, 1, single('a'))]);
        let expr = convert(&fa);
        assert!(expr.alternatives.is_empty());
    }

    #[test]
    fn test_node_ceiling() {
        let fa = VecFa::new(
            0,
            &[4],
            &[
                (0, 1, single('a')),
                (1, 2, single('b')),
                (2, 3, single('c')),
                (3, 4, single('d')),
            ],
        );
        let options = Options {
            maximum_nodes: 10,
            ..Options::default()
        };
        assert!(matches!(
            fa_to_regex(&fa, &options),
            Err(ConvertError::TooManyNodes { limit: 10 })
        ));
        // the same automaton fits a sane budget
        assert!(fa_to_regex(&fa, &Options::default()).is_ok());
    }

    #[test]
    fn test_deterministic_across_iteration_orders() {
        let edges = [
            (0u32, 1u32, single('a')),
            (0, 2, single('b')),
            (1, 3, single('c')),
            (2, 3, single('d')),
            (3, 3, single('e')),
            (1, 2, single('f')),
        ];
        let fa = VecFa::new(0, &[3], &edges);
        let expr_fwd = convert(&fa);
        let expr_rev = convert(&VecFa::new(0, &[3], &edges).reversed());
        assert_eq!(
            expr_fwd, expr_rev,
            "structurally equal output regardless of edge iteration order"
        );
    }

    #[test]
    fn test_loop_between_two_states() {
        // (ab)* : q0 --a--> q1 --b--> q0, q0 final
        let fa = VecFa::new(
            0,
            &[0],
            &[(0, 1, single('a')), (1, 0, single('b'))],
        );
        let expr = convert(&fa);
        for (word, expected) in [
            (vec![], true),
            (vec!['a' as u32, 'b' as u32], true),
            (vec!['a' as u32, 'b' as u32, 'a' as u32, 'b' as u32], true),
            (vec!['a' as u32], false),
            (vec!['b' as u32, 'a' as u32], false),
        ] {
            assert_eq!(
                expr_matches(&expr, &word),
                expected,
                "(ab)* on {:?}, got {}",
                word,
                expr
            );
        }
    }

    #[test]
    fn test_empty_charset_edge_is_dead() {
        // an empty-set edge to a final must contribute nothing
        let fa = VecFa::new(
            0,
            &[1, 2],
            &[
                (0, 1, CharSet::empty(MAX)),
                (0, 2, single('a')),
            ],
        );
        let expr = convert(&fa);
        assert!(expr_matches(&expr, &['a' as u32]));
        assert!(!expr_matches(&expr, &[]));
        assert!(!expr_matches(&expr, &['b' as u32]));
    }

    #[test]
    fn test_language_equivalence_on_random_automata() {
        let alphabet = ['a' as u32, 'b' as u32, 'c' as u32];
        let mut rng = XorShift::new(0x9E3779B97F4A7C15);

        for round in 0..60 {
            let states = 2 + rng.below(4) as u32;
            let mut edges = Vec::new();
            for from in 0..states {
                for to in 0..states {
                    if rng.below(100) < 45 {
                        let mut members = Vec::new();
                        for &c in &alphabet {
                            if rng.below(2) == 0 {
                                members.push(c);
                            }
                        }
                        if members.is_empty() {
                            continue;
                        }
                        let set = CharSet::from_ranges(
                            MAX,
                            members.iter().map(|&c| CharRange::single(c)),
                        )
                        .unwrap();
                        edges.push((from, to, set));
                    }
                }
            }
            let mut finals = Vec::new();
            for s in 0..states {
                if rng.below(3) == 0 {
                    finals.push(s);
                }
            }
            let fa = VecFa::new(0, &finals, &edges);
            // dense little graphs can still breed big labels; give them room
            let options = Options {
                maximum_nodes: 1_000_000,
                ..Options::default()
            };
            let expr = fa_to_regex(&fa, &options).unwrap();

            // every word up to length 5 over the alphabet plus a foreign
            // letter must agree with the direct simulation
            let probe = ['a' as u32, 'b' as u32, 'c' as u32, 'd' as u32];
            let mut words: Vec<Vec<u32>> = vec![Vec::new()];
            let mut frontier: Vec<Vec<u32>> = vec![Vec::new()];
            for _ in 0..5 {
                let mut next = Vec::new();
                for w in &frontier {
                    for &c in &probe {
                        let mut w2 = w.clone();
                        w2.push(c);
                        next.push(w2);
                    }
                }
                words.extend(next.iter().cloned());
                frontier = next;
                // cap the probe set; deeper words add little
                if frontier.len() > 1024 {
                    break;
                }
            }
            for word in &words {
                assert_eq!(
                    fa_accepts(&fa, word),
                    expr_matches(&expr, word),
                    "round {}: disagreement on {:?} for {}",
                    round,
                    word,
                    expr
                );
            }
        }
    }

    #[test]
    fn test_simplified_never_larger_on_scenarios() {
        let scenarios = [
            VecFa::new(0, &[1], &[(0, 1, single('a'))]),
            VecFa::new(0, &[0], &[(0, 0, single('a'))]),
            VecFa::new(
                0,
                &[2],
                &[(0, 1, single('a')), (1, 2, single('b')), (2, 0, single('c'))],
            ),
        ];
        for fa in &scenarios {
            let unsimplified = fa_to_regex(
                fa,
                &Options {
                    maximum_optimization_passes: Some(0),
                    ..Options::default()
                },
            )
            .unwrap();
            let simplified = fa_to_regex(fa, &Options::default()).unwrap();
            assert!(
                expression_node_count(&simplified) <= expression_node_count(&unsimplified),
                "simplification grew the tree: {} vs {}",
                simplified,
                unsimplified
            );
        }
    }

    #[test]
    fn test_pass_limit_keeps_result_usable() {
        let fa = VecFa::new(
            0,
            &[3],
            &[
                (0, 1, single('a')),
                (1, 2, single('b')),
                (2, 3, single('c')),
            ],
        );
        let limited = fa_to_regex(
            &fa,
            &Options {
                maximum_optimization_passes: Some(1),
                ..Options::default()
            },
        )
        .unwrap();
        let word: Vec<u32> = "abc".chars().map(|c| c as u32).collect();
        assert!(expr_matches(&limited, &word));
    }
}
