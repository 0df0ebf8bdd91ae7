//! Mutable automaton graph used during state elimination.
//!
//! States live in an arena (`Vec` indexed by [`StateId`]) so edges are just
//! pairs of indices and no reference cycles exist. Each state keeps its
//! outgoing transitions in a map keyed by target and the set of states with
//! an edge into it, so both directions of adjacency are O(1). At most one
//! edge exists between any ordered pair of states; callers that need a
//! parallel edge union the labels instead.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::ast::Concatenation;
use crate::ConvertError;

/// Index of a state in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Default)]
struct State {
    /// Outgoing edges, label owned here.
    out: FxHashMap<StateId, Concatenation>,
    /// States with an edge into this one.
    incoming: FxHashSet<StateId>,
}

/// Arena of states with one initial state and a set of finals.
///
/// The list owns all states; a conversion creates one, consumes it during
/// elimination, and drops it.
pub struct NodeList {
    states: Vec<State>,
    initial: StateId,
    finals: Vec<StateId>,
}

impl NodeList {
    /// Creates the arena with its initial state already allocated.
    pub fn new() -> Self {
        let mut list = Self {
            states: Vec::new(),
            initial: StateId(0),
            finals: Vec::new(),
        };
        list.initial = list.create_node();
        list
    }

    pub fn create_node(&mut self) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(State::default());
        id
    }

    #[inline]
    pub fn initial(&self) -> StateId {
        self.initial
    }

    #[inline]
    pub fn finals(&self) -> &[StateId] {
        &self.finals
    }

    pub fn mark_final(&mut self, s: StateId) {
        if !self.finals.contains(&s) {
            self.finals.push(s);
        }
    }

    pub fn set_finals(&mut self, finals: Vec<StateId>) {
        self.finals = finals;
    }

    /// Number of states ever created, including isolated ones.
    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Adds an edge. Fails if one already exists for this ordered pair.
    pub fn link_nodes(
        &mut self,
        from: StateId,
        to: StateId,
        transition: Concatenation,
    ) -> Result<(), ConvertError> {
        if self.states[from.index()].out.contains_key(&to) {
            return Err(ConvertError::AlreadyLinked);
        }
        self.states[from.index()].out.insert(to, transition);
        self.states[to.index()].incoming.insert(from);
        Ok(())
    }

    /// Removes an edge, returning its label if one existed.
    pub fn unlink_nodes(&mut self, from: StateId, to: StateId) -> Option<Concatenation> {
        let removed = self.states[from.index()].out.remove(&to)?;
        self.states[to.index()].incoming.remove(&from);
        Some(removed)
    }

    /// Replaces the label of an existing edge, returning the old label.
    /// Fails if there is no edge for this ordered pair.
    pub fn relink_nodes(
        &mut self,
        from: StateId,
        to: StateId,
        transition: Concatenation,
    ) -> Result<Concatenation, ConvertError> {
        match self.states[from.index()].out.get_mut(&to) {
            Some(slot) => Ok(std::mem::replace(slot, transition)),
            None => Err(ConvertError::NotLinked),
        }
    }

    #[inline]
    pub fn transition(&self, from: StateId, to: StateId) -> Option<&Concatenation> {
        self.states[from.index()].out.get(&to)
    }

    #[inline]
    pub fn has_self_loop(&self, s: StateId) -> bool {
        self.states[s.index()].out.contains_key(&s)
    }

    /// Number of incoming edges, self-loop included.
    #[inline]
    pub fn in_degree(&self, s: StateId) -> usize {
        self.states[s.index()].incoming.len()
    }

    /// Number of outgoing edges, self-loop included.
    #[inline]
    pub fn out_degree(&self, s: StateId) -> usize {
        self.states[s.index()].out.len()
    }

    /// Sources of incoming edges, sorted for deterministic iteration.
    /// `exclude_self` drops the self-loop source.
    pub fn in_sources_sorted(&self, s: StateId, exclude_self: bool) -> SmallVec<[StateId; 8]> {
        let mut ids: SmallVec<[StateId; 8]> = self.states[s.index()]
            .incoming
            .iter()
            .copied()
            .filter(|&i| !exclude_self || i != s)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Targets of outgoing edges, sorted for deterministic iteration.
    /// `exclude_self` drops the self-loop target.
    pub fn out_targets_sorted(&self, s: StateId, exclude_self: bool) -> SmallVec<[StateId; 8]> {
        let mut ids: SmallVec<[StateId; 8]> = self.states[s.index()]
            .out
            .keys()
            .copied()
            .filter(|&o| !exclude_self || o != s)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// All state ids in creation order.
    pub fn state_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.states.len() as u32).map(StateId)
    }

    /// Removes every edge touching `s`, leaving it isolated.
    pub fn isolate(&mut self, s: StateId) {
        for i in self.in_sources_sorted(s, false) {
            let _ = self.unlink_nodes(i, s);
        }
        for o in self.out_targets_sorted(s, false) {
            let _ = self.unlink_nodes(s, o);
        }
    }
}

impl Default for NodeList {
    fn default() -> Self {
        Self::new()
    }
}
