//! Persistent graphs of interacting colliders.
//!
//! Nodes are collider handles; edges carry per-pair state that survives
//! across steps, which is what makes 0↔≥1 transition detection (and thereby
//! event generation) possible. Edge lookup by unordered pair is O(1) through
//! a [`PairKey`]-indexed map, and per-collider neighbor iteration is
//! O(degree) through the underlying adjacency lists.

use indexmap::IndexMap;

use crate::collision::collider::ColliderHandle;
use crate::collision::contact_types::{ContactPair, IntersectionPair};
use crate::data_structures::{EdgeIndex, InteractionGraph, NodeIndex, PairKey};

/// A persistent graph keyed by unordered collider pairs.
///
/// [`ContactGraph`] and [`IntersectionGraph`] are both instances of this
/// structure; they differ only in their edge payload.
#[derive(Clone, Debug, Default)]
pub struct PairGraph<E> {
    graph: InteractionGraph<ColliderHandle, E>,
    /// Maps each registered collider to its node.
    ///
    /// `IndexMap` keeps iteration in insertion order, which the deterministic
    /// execution mode relies on.
    node_of: IndexMap<ColliderHandle, NodeIndex>,
    /// Maps each pair to its edge.
    edge_of: IndexMap<PairKey, EdgeIndex>,
}

impl<E> PairGraph<E> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            graph: InteractionGraph::new(),
            node_of: IndexMap::new(),
            edge_of: IndexMap::new(),
        }
    }

    /// The number of pairs currently tracked.
    pub fn len(&self) -> usize {
        self.edge_of.len()
    }

    /// Returns `true` if no pairs are tracked.
    pub fn is_empty(&self) -> bool {
        self.edge_of.is_empty()
    }

    /// The pair key for two collider handles.
    #[inline]
    pub fn pair_key(collider1: ColliderHandle, collider2: ColliderHandle) -> PairKey {
        PairKey::new(collider1.index(), collider2.index())
    }

    /// Returns `true` if the given pair key is tracked.
    #[inline]
    pub fn contains_key(&self, pair_key: &PairKey) -> bool {
        self.edge_of.contains_key(pair_key)
    }

    /// Returns the pair state between two colliders, if tracked.
    pub fn get(&self, collider1: ColliderHandle, collider2: ColliderHandle) -> Option<&E> {
        let edge = *self.edge_of.get(&Self::pair_key(collider1, collider2))?;
        self.graph.edge_weight(edge)
    }

    /// Returns the pair state between two colliders mutably, if tracked.
    pub fn get_mut(
        &mut self,
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    ) -> Option<&mut E> {
        let edge = *self.edge_of.get(&Self::pair_key(collider1, collider2))?;
        self.graph.edge_weight_mut(edge)
    }

    /// Inserts a pair with the given state. The colliders are registered
    /// as nodes if they were not already.
    ///
    /// Does nothing and returns `None` if the pair is already tracked;
    /// otherwise returns its new edge index.
    pub fn insert_pair(
        &mut self,
        collider1: ColliderHandle,
        collider2: ColliderHandle,
        state: E,
    ) -> Option<EdgeIndex> {
        let key = Self::pair_key(collider1, collider2);
        if self.edge_of.contains_key(&key) {
            return None;
        }
        let node1 = self.node_index_or_insert(collider1);
        let node2 = self.node_index_or_insert(collider2);
        let edge = self.graph.add_edge(node1, node2, state);
        self.edge_of.insert(key, edge);
        Some(edge)
    }

    /// Removes the pair between two colliders, returning its state.
    ///
    /// Colliders left without any tracked pair are unregistered.
    pub fn remove_pair(
        &mut self,
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    ) -> Option<E> {
        let key = Self::pair_key(collider1, collider2);
        let edge = self.edge_of.swap_remove(&key)?;
        let state = self.graph.remove_edge(edge);
        self.remove_node_if_isolated(collider1);
        self.remove_node_if_isolated(collider2);
        state
    }

    /// Iterates over all tracked pair states.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.graph.all_edge_weights()
    }

    /// Iterates over all tracked pair states mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.graph.all_edge_weights_mut()
    }

    /// Iterates over the edge indices of all tracked pairs, in insertion
    /// order of the pairs.
    pub(crate) fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.edge_of.values().copied()
    }

    /// Iterates over `(pair key, edge index)` entries of all tracked pairs,
    /// in insertion order of the pairs.
    pub(crate) fn edge_entries(&self) -> impl Iterator<Item = (PairKey, EdgeIndex)> + '_ {
        self.edge_of.iter().map(|(&key, &edge)| (key, edge))
    }

    /// Returns the state behind a raw edge index.
    pub(crate) fn edge_weight(&self, edge: EdgeIndex) -> Option<&E> {
        self.graph.edge_weight(edge)
    }

    /// Returns the state behind a raw edge index mutably.
    pub(crate) fn edge_weight_mut(&mut self, edge: EdgeIndex) -> Option<&mut E> {
        self.graph.edge_weight_mut(edge)
    }

    /// Iterates over the pair states involving the given collider.
    pub fn interactions_with(&self, collider: ColliderHandle) -> impl Iterator<Item = &E> {
        self.node_of
            .get(&collider)
            .into_iter()
            .flat_map(|&node| self.graph.edges_of(node))
            .filter_map(|(edge, _)| self.graph.edge_weight(edge))
    }

    /// Iterates over the handles of all colliders whose pair with the given
    /// collider is currently tracked.
    pub fn colliders_interacting_with(
        &self,
        collider: ColliderHandle,
    ) -> impl Iterator<Item = ColliderHandle> + '_ {
        self.node_of
            .get(&collider)
            .into_iter()
            .flat_map(|&node| self.graph.edges_of(node))
            .filter_map(|(_, other)| self.graph.node_weight(other).copied())
    }

    /// Removes every pair involving the given collider.
    ///
    /// The callback receives each removed pair state, letting the caller
    /// emit events or wake bodies for pairs that were active.
    pub fn remove_collider_with<F>(&mut self, collider: ColliderHandle, mut pair_callback: F)
    where
        F: FnMut(E),
    {
        let Some(&node) = self.node_of.get(&collider) else {
            return;
        };

        let neighbors: Vec<(EdgeIndex, NodeIndex)> = self.graph.edges_of(node).collect();
        for (edge, other) in neighbors {
            let other_handle = self
                .graph
                .node_weight(other)
                .copied()
                .unwrap_or(ColliderHandle::INVALID);
            let key = Self::pair_key(collider, other_handle);
            self.edge_of.swap_remove(&key);
            if let Some(state) = self.graph.remove_edge(edge) {
                pair_callback(state);
            }
            self.remove_node_if_isolated(other_handle);
        }

        self.node_of.swap_remove(&collider);
        self.graph.remove_node(node);
    }

    fn node_index_or_insert(&mut self, collider: ColliderHandle) -> NodeIndex {
        *self
            .node_of
            .entry(collider)
            .or_insert_with(|| self.graph.add_node(collider))
    }

    fn remove_node_if_isolated(&mut self, collider: ColliderHandle) {
        if let Some(&node) = self.node_of.get(&collider) {
            if self.graph.edges_of(node).next().is_none() {
                self.node_of.swap_remove(&collider);
                self.graph.remove_node(node);
            }
        }
    }
}

/// The persistent graph of contact pairs between non-sensor colliders.
///
/// A pair is tracked from the moment the broad phase reports overlapping
/// (inflated) AABBs until it reports them disjoint, even while the shapes
/// themselves are separated. Use [`ContactPair::is_touching`] to check for
/// actual contact.
pub type ContactGraph = PairGraph<ContactPair>;

/// The persistent graph of intersection pairs involving sensor colliders.
pub type IntersectionGraph = PairGraph<IntersectionPair>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Handle;

    fn handle(index: u32) -> ColliderHandle {
        ColliderHandle(Handle::from_raw_parts(index, 0))
    }

    fn pair(collider1: ColliderHandle, collider2: ColliderHandle) -> IntersectionPair {
        IntersectionPair {
            collider1,
            collider2,
            intersecting: false,
            events_enabled: true,
            custom_filter: false,
        }
    }

    #[test]
    fn insert_lookup_remove() {
        let mut graph = PairGraph::<IntersectionPair>::new();
        let (a, b, c) = (handle(0), handle(1), handle(2));

        graph.insert_pair(a, b, pair(a, b));
        graph.insert_pair(a, c, pair(a, c));

        assert!(graph.get(a, b).is_some());
        assert!(graph.get(b, a).is_some());
        assert!(graph.get(b, c).is_none());
        assert_eq!(graph.len(), 2);

        // Duplicate insertion is a no-op.
        assert!(graph.insert_pair(b, a, pair(a, b)).is_none());
        assert_eq!(graph.len(), 2);

        let neighbors: Vec<_> = graph.colliders_interacting_with(a).collect();
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.contains(&b) && neighbors.contains(&c));

        assert!(graph.remove_pair(a, b).is_some());
        assert!(graph.get(a, b).is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn remove_collider_retires_all_pairs() {
        let mut graph = PairGraph::<IntersectionPair>::new();
        let (a, b, c) = (handle(0), handle(1), handle(2));

        graph.insert_pair(a, b, pair(a, b));
        graph.insert_pair(a, c, pair(a, c));
        graph.insert_pair(b, c, pair(b, c));

        let mut removed = 0;
        graph.remove_collider_with(a, |_| removed += 1);
        assert_eq!(removed, 2);
        assert_eq!(graph.len(), 1);
        assert!(graph.get(b, c).is_some());
        assert_eq!(graph.colliders_interacting_with(a).count(), 0);
    }
}
