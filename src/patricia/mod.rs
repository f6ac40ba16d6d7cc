//------------ PatriciaTrie --------------------------------------------------

//! An exact radix trie over byte-string keys.
//!
//! Edges are labeled with byte spans rather than single bytes: a node's
//! label is the span consumed to get from its parent to it. Labels of
//! siblings never share a non-empty prefix, so at every node at most one
//! edge can continue a given key. Inserting a key that shares only part of
//! an edge label splits that edge.
//!
//! Nodes live in a single arena vector and refer to their children by
//! index. A split creates a new node and rewrites the one child slot of the
//! parent that pointed to the old subtree; nothing else moves. Nodes are
//! only freed when the trie is dropped.
//!
//! Values are stored as `Arc<V>`. A value may be shared between the trie
//! and the caller (or several tries) without copying.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};

const ROOT: usize = 0;

#[derive(Debug)]
struct Node<V> {
    label: Vec<u8>,
    value: Option<Arc<V>>,
    edges: Vec<usize>,
}

impl<V> Node<V> {
    fn new(label: Vec<u8>, value: Option<Arc<V>>) -> Self {
        Self {
            label,
            value,
            edges: vec![],
        }
    }
}

#[derive(Debug)]
pub struct PatriciaTrie<V> {
    nodes: Vec<Node<V>>,
    // number of nodes holding a value
    len: usize,
}

impl<V> PatriciaTrie<V> {
    /// Create an empty trie, holding only the root with an empty label.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(vec![], None)],
            len: 0,
        }
    }

    /// Insert `value` under `key`. Returns the value that was stored under
    /// `key` before, if any.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<Arc<V>> {
        self.insert_shared(key, Arc::new(value))
    }

    /// Insert an already shared value under `key`. Returns the previous
    /// value, if any.
    pub fn insert_shared(
        &mut self,
        key: &[u8],
        value: Arc<V>,
    ) -> Option<Arc<V>> {
        trace!("insert key {}", key.escape_ascii());
        let mut current = ROOT;
        let mut rest = key;

        loop {
            if rest.is_empty() {
                return self.store(current, value);
            }

            let found = self.node(current).edges.iter().find_map(|&child| {
                let shared = shared_prefix_len(rest, &self.node(child).label);
                (shared > 0).then_some((child, shared))
            });

            let Some((child, shared)) = found else {
                // Nothing in common with any edge: new leaf under current.
                let leaf = self.push(Node::new(rest.to_vec(), Some(value)));
                self.node_mut(current).edges.push(leaf);
                self.len += 1;
                return None;
            };

            rest = rest.get(shared..).unwrap_or_default();

            if shared == self.node(child).label.len() {
                current = child;
                continue;
            }

            // Partial match on the edge label: abc + abd -> ab, {c, d}
            let split = self.split(current, child, shared);
            if rest.is_empty() {
                // The key ends inside the old label, e.g. abc + ab.
                return self.store(split, value);
            }
            let leaf = self.push(Node::new(rest.to_vec(), Some(value)));
            self.node_mut(split).edges.push(leaf);
            self.len += 1;
            return None;
        }
    }

    /// Get the value stored under exactly `key`.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.find(key)
            .and_then(|idx| self.node(idx).value.as_deref())
    }

    /// Get a new handle to the value stored under exactly `key`.
    pub fn get_shared(&self, key: &[u8]) -> Option<Arc<V>> {
        self.find(key)
            .and_then(|idx| self.node(idx).value.as_ref().map(Arc::clone))
    }

    /// Get a mutable reference to the value under `key`. If the value is
    /// also held outside of this trie, it is cloned first, so that other
    /// holders keep seeing the old value.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V>
    where
        V: Clone,
    {
        let idx = self.find(key)?;
        self.node_mut(idx).value.as_mut().map(Arc::make_mut)
    }

    /// The number of keys with a value.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of nodes, including the root and the internal nodes
    /// created by splits.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // Walk down the edges while they are prefixes of the remaining key.
    fn find(&self, key: &[u8]) -> Option<usize> {
        let mut current = ROOT;
        let mut rest = key;

        while !rest.is_empty() {
            let next = self
                .node(current)
                .edges
                .iter()
                .copied()
                .find(|&child| rest.starts_with(&self.node(child).label))?;
            rest = rest
                .get(self.node(next).label.len()..)
                .unwrap_or_default();
            current = next;
        }

        Some(current)
    }

    fn store(&mut self, idx: usize, value: Arc<V>) -> Option<Arc<V>> {
        let previous = self.node_mut(idx).value.replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    // Insert a new internal node holding the first `shared` bytes of the
    // label of `child`, between `parent` and `child`. Returns the index of
    // the new node.
    fn split(&mut self, parent: usize, child: usize, shared: usize) -> usize {
        let label = std::mem::take(&mut self.node_mut(child).label);
        let (prefix, suffix) = label.split_at(shared);
        debug!(
            "split {} into {} + {}",
            label.escape_ascii(),
            prefix.escape_ascii(),
            suffix.escape_ascii()
        );

        self.node_mut(child).label = suffix.to_vec();
        let mut internal = Node::new(prefix.to_vec(), None);
        internal.edges.push(child);
        let split = self.push(internal);

        for edge in self.node_mut(parent).edges.iter_mut() {
            if *edge == child {
                *edge = split;
            }
        }
        split
    }

    fn push(&mut self, node: Node<V>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    // Arena indices are only handed out by `push` and nodes are never
    // removed, so every index we hold is in bounds.
    #[allow(clippy::indexing_slicing)]
    fn node(&self, idx: usize) -> &Node<V> {
        &self.nodes[idx]
    }

    #[allow(clippy::indexing_slicing)]
    fn node_mut(&mut self, idx: usize) -> &mut Node<V> {
        &mut self.nodes[idx]
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        idx: usize,
        indent: usize,
    ) -> fmt::Result {
        let node = self.node(idx);
        write!(f, "|{}> {}", "-".repeat(indent), node.label.escape_ascii())?;
        if node.value.is_some() {
            write!(f, " *")?;
        }
        writeln!(f)?;
        for &child in &node.edges {
            self.fmt_node(f, child, indent + 2)?;
        }
        Ok(())
    }
}

impl<V> Default for PatriciaTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the tree, one node per line, indented by depth. Nodes holding a
/// value are marked with a `*`.
impl<V> fmt::Display for PatriciaTrie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, ROOT, 0)
    }
}

fn shared_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
