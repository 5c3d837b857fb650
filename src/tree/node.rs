//! Arena-backed ordered multi-way tree
//!
//! A [`Forest`] owns every node it has ever created. Nodes are addressed by
//! [`NodeId`] handles; a node's parent link is a plain handle and never owns
//! anything, children are owned through the parent's ordered child list.
//! Node identity is handle identity: two nodes holding equal values are still
//! distinct nodes.
//!
//! Handles are only meaningful for the forest that issued them. Passing a
//! handle from another forest is a programming error and panics like an
//! out-of-bounds slice index.

use crate::error::TreeError;
use std::fmt;

/// Handle to a node inside a [`Forest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A set of disjoint ordered trees sharing one node arena
#[derive(Debug, Clone)]
pub struct Forest<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Default for Forest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Forest<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Number of nodes ever created, attached or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Every handle issued so far, in creation order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.slots.len()).map(NodeId)
    }

    /// Create a bare root node
    pub fn insert(&mut self, value: T) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            value,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn value(&self, id: NodeId) -> &T {
        &self.slots[id.0].value
    }

    pub fn value_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.slots[id.0].value
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.slots[id.0].children.get(index).copied()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.slots[id.0].parent.is_none()
    }

    /// Topmost ancestor, or the node itself when it is a root
    pub fn root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.slots[current.0].parent {
            current = parent;
        }
        current
    }

    /// Depth of the node; a root is at level 0
    pub fn level(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Parent first, root last
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            forest: self,
            next: self.slots[id.0].parent,
        }
    }

    pub fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(id).chain(self.ancestors(id))
    }

    /// Pre-order walk of the node's subtree, starting at the node itself
    pub fn self_and_descendants(&self, id: NodeId) -> Descendants<'_, T> {
        Descendants {
            forest: self,
            stack: vec![id],
        }
    }

    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.self_and_descendants(id).skip(1)
    }

    /// Every node reachable from this node's root
    pub fn all(&self, id: NodeId) -> Descendants<'_, T> {
        self.self_and_descendants(self.root(id))
    }

    pub fn self_and_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.slots[id.0].parent {
            Some(parent) => self.slots[parent.0].children.clone(),
            None => vec![id],
        }
    }

    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.self_and_siblings(id)
            .into_iter()
            .filter(|&n| n != id)
            .collect()
    }

    /// All nodes of this node's tree at depth `level`, in pre-order
    pub fn nodes_at_level(&self, id: NodeId, level: usize) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![(self.root(id), 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if depth == level {
                found.push(node);
                continue;
            }
            for &child in self.slots[node.0].children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        found
    }

    pub fn self_and_same_level(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes_at_level(id, self.level(id))
    }

    pub fn same_level(&self, id: NodeId) -> Vec<NodeId> {
        self.self_and_same_level(id)
            .into_iter()
            .filter(|&n| n != id)
            .collect()
    }

    /// Create a child holding `value` at `index` (end when `None`)
    pub fn add(
        &mut self,
        parent: NodeId,
        value: T,
        index: Option<usize>,
    ) -> Result<NodeId, TreeError> {
        self.check_index(parent, index)?;
        let child = self.insert(value);
        self.attach(parent, child, index)?;
        Ok(child)
    }

    /// Attach an existing root node as a child of `parent`
    pub fn attach(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: Option<usize>,
    ) -> Result<(), TreeError> {
        self.check_index(parent, index)?;

        if !self.is_root(child) {
            return Err(TreeError::NotARoot(child));
        }
        if parent == child {
            return Err(TreeError::Cycle(child));
        }
        // a root that is an ancestor of the target is necessarily the target's root
        if self.root(parent) == child {
            return Err(TreeError::RootOfTarget(child));
        }

        self.slots[child.0].parent = Some(parent);
        let children = &mut self.slots[parent.0].children;
        match index {
            Some(i) => children.insert(i, child),
            None => children.push(child),
        }
        Ok(())
    }

    pub fn add_first_child(&mut self, parent: NodeId, value: T) -> Result<NodeId, TreeError> {
        self.add(parent, value, Some(0))
    }

    pub fn attach_first_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.attach(parent, child, Some(0))
    }

    pub fn add_first_sibling(&mut self, id: NodeId, value: T) -> Result<NodeId, TreeError> {
        let parent = self.parent(id).ok_or(TreeError::NoParent(id))?;
        self.add_first_child(parent, value)
    }

    pub fn add_last_sibling(&mut self, id: NodeId, value: T) -> Result<NodeId, TreeError> {
        let parent = self.parent(id).ok_or(TreeError::NoParent(id))?;
        self.add(parent, value, None)
    }

    /// Wrap a root node in a new parent holding `value`
    pub fn add_parent(&mut self, id: NodeId, value: T) -> Result<NodeId, TreeError> {
        if !self.is_root(id) {
            return Err(TreeError::AlreadyParented(id));
        }
        let parent = self.insert(value);
        self.attach(parent, id, None)?;
        Ok(parent)
    }

    pub fn attach_parent(&mut self, id: NodeId, parent: NodeId) -> Result<(), TreeError> {
        if !self.is_root(id) {
            return Err(TreeError::AlreadyParented(id));
        }
        self.attach(parent, id, None)
    }

    /// Detach the node (and with it, its subtree) from its parent
    pub fn disconnect(&mut self, id: NodeId) -> Result<(), TreeError> {
        let parent = self.slots[id.0]
            .parent
            .ok_or(TreeError::DisconnectRoot(id))?;
        self.slots[parent.0].children.retain(|&c| c != id);
        self.slots[id.0].parent = None;
        Ok(())
    }

    fn check_index(&self, parent: NodeId, index: Option<usize>) -> Result<(), TreeError> {
        let len = self.slots[parent.0].children.len();
        match index {
            Some(i) if i > len => Err(TreeError::IndexOutOfRange { index: i, len }),
            _ => Ok(()),
        }
    }
}

/// Iterator over a node's ancestors, nearest first
pub struct Ancestors<'a, T> {
    forest: &'a Forest<T>,
    next: Option<NodeId>,
}

impl<'a, T> Iterator for Ancestors<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.forest.slots[current.0].parent;
        Some(current)
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a, T> {
    forest: &'a Forest<T>,
    stack: Vec<NodeId>,
}

impl<'a, T> Iterator for Descendants<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.forest.slots[current.0].children.iter().rev().copied());
        Some(current)
    }
}
