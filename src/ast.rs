//! Regular-expression AST nodes and the budgeted node factory.
//!
//! The node shapes are the simple (position-free) regex tree: a root
//! [`Expression`] holds alternatives, each alternative is a
//! [`Concatenation`] of [`Element`]s, and elements are character classes,
//! alternations, quantifiers, or assertions. An empty concatenation is the
//! empty string; an alternation with zero alternatives is the empty
//! language.
//!
//! Every node built during a conversion goes through a
//! [`TransitionFactory`], which counts nodes against a hard ceiling so a
//! pathological automaton fails with `TooManyNodes` instead of exhausting
//! memory.

use std::fmt;

use crate::charset::CharSet;
use crate::ConvertError;

/// A set-of-characters leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterClass {
    pub characters: CharSet,
}

/// A sequence of elements. Empty means the empty string.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Concatenation {
    pub elements: Vec<Element>,
}

/// A choice between alternatives. Zero alternatives is the empty language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alternation {
    pub alternatives: Vec<Concatenation>,
}

/// A bounded or unbounded repetition of its body. `max == None` means ∞.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quantifier {
    pub min: u32,
    pub max: Option<u32>,
    pub alternatives: Vec<Concatenation>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssertionKind {
    Ahead,
    Behind,
}

/// A zero-width lookaround.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assertion {
    pub kind: AssertionKind,
    pub negate: bool,
    pub alternatives: Vec<Concatenation>,
}

/// Anything that can appear inside a concatenation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    CharacterClass(CharacterClass),
    Alternation(Alternation),
    Quantifier(Quantifier),
    Assertion(Assertion),
}

/// The root node returned to callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    pub alternatives: Vec<Concatenation>,
}

impl Quantifier {
    /// True for `x*` and `x{0,n}` style quantifiers with `min <= 1`.
    #[inline]
    pub fn low_min(&self) -> bool {
        self.min <= 1
    }
}

impl Concatenation {
    #[inline]
    pub fn is_empty_string(&self) -> bool {
        self.elements.is_empty()
    }

    /// The sole element, if this concatenation has exactly one.
    #[inline]
    pub fn single_element(&self) -> Option<&Element> {
        match self.elements.as_slice() {
            [e] => Some(e),
            _ => None,
        }
    }

    pub fn can_match_empty_string(&self) -> bool {
        self.elements.iter().all(Element::can_match_empty_string)
    }
}

impl Element {
    pub fn can_match_empty_string(&self) -> bool {
        match self {
            Element::CharacterClass(_) | Element::Assertion(_) => false,
            Element::Alternation(a) => alternatives_match_empty(&a.alternatives),
            Element::Quantifier(q) => q.min == 0 || alternatives_match_empty(&q.alternatives),
        }
    }
}

impl Expression {
    pub fn can_match_empty_string(&self) -> bool {
        alternatives_match_empty(&self.alternatives)
    }
}

fn alternatives_match_empty(alternatives: &[Concatenation]) -> bool {
    alternatives.iter().any(Concatenation::can_match_empty_string)
}

/// Total number of AST nodes in a subtree, counting every concatenation,
/// alternation, quantifier, assertion and character class.
pub fn node_count(concat: &Concatenation) -> usize {
    1 + concat.elements.iter().map(element_node_count).sum::<usize>()
}

fn element_node_count(element: &Element) -> usize {
    match element {
        Element::CharacterClass(_) => 1,
        Element::Alternation(a) => 1 + a.alternatives.iter().map(node_count).sum::<usize>(),
        Element::Quantifier(q) => 1 + q.alternatives.iter().map(node_count).sum::<usize>(),
        Element::Assertion(s) => 1 + s.alternatives.iter().map(node_count).sum::<usize>(),
    }
}

/// Counts how many nodes in an [`Expression`], for budget and monotonicity
/// checks.
pub fn expression_node_count(expr: &Expression) -> usize {
    1 + expr.alternatives.iter().map(node_count).sum::<usize>()
}

/// Constructs AST nodes against a hard node budget.
///
/// One factory lives for the duration of one conversion; the count includes
/// structural copies.
pub struct TransitionFactory {
    created: usize,
    limit: usize,
}

impl TransitionFactory {
    pub fn new(limit: usize) -> Self {
        Self { created: 0, limit }
    }

    /// Nodes created so far, copies included.
    #[inline]
    pub fn created(&self) -> usize {
        self.created
    }

    fn charge(&mut self, nodes: usize) -> Result<(), ConvertError> {
        self.created += nodes;
        if self.created > self.limit {
            return Err(ConvertError::TooManyNodes { limit: self.limit });
        }
        Ok(())
    }

    /// The ε transition: an empty concatenation.
    pub fn empty_string(&mut self) -> Result<Concatenation, ConvertError> {
        self.charge(1)?;
        Ok(Concatenation::default())
    }

    /// A transition matching exactly one character from `set`.
    pub fn character_transition(&mut self, set: CharSet) -> Result<Concatenation, ConvertError> {
        self.charge(2)?;
        Ok(Concatenation {
            elements: vec![Element::CharacterClass(CharacterClass { characters: set })],
        })
    }

    pub fn alternation(
        &mut self,
        alternatives: Vec<Concatenation>,
    ) -> Result<Alternation, ConvertError> {
        self.charge(1)?;
        Ok(Alternation { alternatives })
    }

    pub fn quantifier(
        &mut self,
        min: u32,
        max: Option<u32>,
        alternatives: Vec<Concatenation>,
    ) -> Result<Quantifier, ConvertError> {
        debug_assert!(max.map_or(true, |m| min <= m));
        self.charge(1)?;
        Ok(Quantifier {
            min,
            max,
            alternatives,
        })
    }

    pub fn concatenation(&mut self, elements: Vec<Element>) -> Result<Concatenation, ConvertError> {
        self.charge(1)?;
        Ok(Concatenation { elements })
    }

    /// A lookaround node. State elimination never emits one (transition
    /// labels stay assertion-free), but callers assembling expressions by
    /// hand construct them here so they count against the same budget.
    pub fn assertion(
        &mut self,
        kind: AssertionKind,
        negate: bool,
        alternatives: Vec<Concatenation>,
    ) -> Result<Assertion, ConvertError> {
        self.charge(1)?;
        Ok(Assertion {
            kind,
            negate,
            alternatives,
        })
    }

    /// Deep structural clone, charged node-for-node against the budget.
    ///
    /// Combinators mutate their operands in place, so any sub-AST that ends
    /// up on more than one new edge must be copied first.
    pub fn copy(&mut self, t: &Concatenation) -> Result<Concatenation, ConvertError> {
        self.charge(node_count(t))?;
        Ok(t.clone())
    }
}

// Compact rendering for demos and test diagnostics. Not a regex printer;
// textual regex I/O is out of scope.

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_alternatives(f, &self.alternatives)
    }
}

impl fmt::Display for Concatenation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            return write!(f, "ε");
        }
        for e in &self.elements {
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::CharacterClass(c) => {
                write!(f, "[")?;
                for r in c.characters.ranges() {
                    if r.min == r.max {
                        write_point(f, r.min)?;
                    } else {
                        write_point(f, r.min)?;
                        write!(f, "-")?;
                        write_point(f, r.max)?;
                    }
                }
                write!(f, "]")
            }
            Element::Alternation(a) => {
                write!(f, "(")?;
                write_alternatives(f, &a.alternatives)?;
                write!(f, ")")
            }
            Element::Quantifier(q) => {
                write!(f, "(")?;
                write_alternatives(f, &q.alternatives)?;
                match (q.min, q.max) {
                    (0, None) => write!(f, ")*"),
                    (1, None) => write!(f, ")+"),
                    (0, Some(1)) => write!(f, ")?"),
                    (min, None) => write!(f, "){{{},}}", min),
                    (min, Some(max)) if min == max => write!(f, "){{{}}}", min),
                    (min, Some(max)) => write!(f, "){{{},{}}}", min, max),
                }
            }
            Element::Assertion(a) => {
                let tag = match (a.kind, a.negate) {
                    (AssertionKind::Ahead, false) => "?=",
                    (AssertionKind::Ahead, true) => "?!",
                    (AssertionKind::Behind, false) => "?<=",
                    (AssertionKind::Behind, true) => "?<!",
                };
                write!(f, "({}", tag)?;
                write_alternatives(f, &a.alternatives)?;
                write!(f, ")")
            }
        }
    }
}

fn write_alternatives(f: &mut fmt::Formatter<'_>, alternatives: &[Concatenation]) -> fmt::Result {
    if alternatives.is_empty() {
        return write!(f, "∅");
    }
    for (i, alt) in alternatives.iter().enumerate() {
        if i > 0 {
            write!(f, "|")?;
        }
        write!(f, "{}", alt)?;
    }
    Ok(())
}

fn write_point(f: &mut fmt::Formatter<'_>, c: u32) -> fmt::Result {
    match char::from_u32(c) {
        Some(ch) if !ch.is_control() && !"[]-()|".contains(ch) => write!(f, "{}", ch),
        _ => write!(f, "\\u{{{:x}}}", c),
    }
}
