//! Left-child/right-sibling tree arena
//!
//! The CST, the terminal projection and the AST are all n-ary trees stored
//! with two links per node: `left_child` points at the first child and
//! `right_sibling` at the next node of the same chain. Nodes live in a flat
//! `Vec` and are addressed by [`NodeId`]; a node can be linked into the tree
//! at most once.

use thiserror::Error;

pub type NodeId = usize;

/// Rejected attempts to link nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    Dangling(NodeId),

    #[error("node {0} was supplied more than once")]
    Duplicate(NodeId),

    #[error("node {0} is already linked into the tree")]
    AlreadyLinked(NodeId),
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    line: usize,
    left_child: Option<NodeId>,
    right_sibling: Option<NodeId>,
    linked: bool,
}

#[derive(Debug, Clone)]
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
    root: Option<NodeId>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Allocate an unlinked node.
    pub fn push(&mut self, value: T, line: usize) -> NodeId {
        self.nodes.push(Node {
            value,
            line,
            left_child: None,
            right_sibling: None,
            linked: false,
        });
        self.nodes.len() - 1
    }

    /// Allocate `items` as a fresh sibling chain and return its head.
    ///
    /// With a `parent`, the chain becomes its children, appended after any it
    /// already has.
    pub fn push_chain<I>(
        &mut self,
        parent: Option<NodeId>,
        items: I,
    ) -> Option<NodeId>
    where
        I: IntoIterator<Item = (T, usize)>,
    {
        let mut head = None;
        let mut previous: Option<NodeId> = None;
        for (value, line) in items {
            let id = self.push(value, line);
            match previous {
                Some(prev) => {
                    self.nodes[prev].right_sibling = Some(id);
                    self.nodes[id].linked = true;
                }
                None => head = Some(id),
            }
            previous = Some(id);
        }

        if let (Some(parent), Some(head)) = (parent, head) {
            match self.nodes[parent].left_child {
                Some(first) => {
                    let last = self.last_sibling(first);
                    self.nodes[last].right_sibling = Some(head);
                }
                None => self.nodes[parent].left_child = Some(head),
            }
            self.nodes[head].linked = true;
        }
        head
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn value(&self, id: NodeId) -> &T {
        &self.nodes[id].value
    }

    pub fn value_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.nodes[id].value
    }

    pub fn line(&self, id: NodeId) -> usize {
        self.nodes[id].line
    }

    pub fn left_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].left_child
    }

    pub fn right_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].right_sibling
    }

    fn check_linkable(&self, id: NodeId) -> Result<(), TreeError> {
        match self.nodes.get(id) {
            None => Err(TreeError::Dangling(id)),
            Some(node) if node.linked || self.root == Some(id) => {
                Err(TreeError::AlreadyLinked(id))
            }
            Some(_) => Ok(()),
        }
    }

    /// Link `children` as one sibling chain under `parent`, in order.
    ///
    /// Every child must exist, appear once, and not already be linked
    /// anywhere. Nothing is modified when validation fails.
    pub fn attach_children(
        &mut self,
        parent: NodeId,
        children: &[NodeId],
    ) -> Result<(), TreeError> {
        if parent >= self.nodes.len() {
            return Err(TreeError::Dangling(parent));
        }
        for (i, &child) in children.iter().enumerate() {
            if child == parent || children[..i].contains(&child) {
                return Err(TreeError::Duplicate(child));
            }
            self.check_linkable(child)?;
        }

        for pair in children.windows(2) {
            self.nodes[pair[0]].right_sibling = Some(pair[1]);
        }
        for &child in children {
            self.nodes[child].linked = true;
        }
        self.nodes[parent].left_child = children.first().copied();
        Ok(())
    }

    /// Make `child` the left child of `parent`.
    pub fn set_left_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<(), TreeError> {
        if parent >= self.nodes.len() {
            return Err(TreeError::Dangling(parent));
        }
        if parent == child {
            return Err(TreeError::Duplicate(child));
        }
        self.check_linkable(child)?;
        self.nodes[child].linked = true;
        self.nodes[parent].left_child = Some(child);
        Ok(())
    }

    /// Last node of the sibling chain starting at `id`.
    pub fn last_sibling(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(next) = self.nodes[current].right_sibling {
            current = next;
        }
        current
    }

    /// Follow right siblings to the end, descend into the left child, and
    /// repeat until a node with neither link is reached.
    pub fn deepest_last(&self, id: NodeId) -> NodeId {
        let mut current = self.last_sibling(id);
        while let Some(child) = self.nodes[current].left_child {
            current = self.last_sibling(child);
        }
        current
    }

    /// The chain starting at `id` (inclusive).
    pub fn siblings(&self, id: NodeId) -> Siblings<'_, T> {
        Siblings {
            tree: self,
            next: Some(id),
        }
    }

    /// Children of `id`, first child first.
    pub fn children(&self, id: NodeId) -> Siblings<'_, T> {
        Siblings {
            tree: self,
            next: self.nodes[id].left_child,
        }
    }

    /// Next node of a flat walk: the right sibling, otherwise the left child.
    pub fn next_in_walk(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id];
        node.right_sibling.or(node.left_child)
    }

    /// Flat walk from the root following [`Tree::next_in_walk`].
    pub fn walk(&self) -> Walk<'_, T> {
        Walk {
            tree: self,
            next: self.root,
        }
    }
}

pub struct Siblings<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Siblings<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.right_sibling(current);
        Some(current)
    }
}

pub struct Walk<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Walk<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_in_walk(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(
        tree: &mut Tree<&'static str>,
        names: &[&'static str],
    ) -> Vec<NodeId> {
        names.iter().map(|&n| tree.push(n, 1)).collect()
    }

    #[test]
    fn test_attach_children_builds_sibling_chain() {
        let mut tree = Tree::new();
        let parent = tree.push("parent", 1);
        let kids = leaves(&mut tree, &["a", "b", "c"]);
        tree.attach_children(parent, &kids).unwrap();

        let names: Vec<_> =
            tree.children(parent).map(|id| *tree.value(id)).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(tree.last_sibling(kids[0]), kids[2]);
    }

    #[test]
    fn test_duplicate_child_is_rejected() {
        let mut tree = Tree::new();
        let parent = tree.push("parent", 1);
        let kids = leaves(&mut tree, &["a", "b"]);
        let err = tree
            .attach_children(parent, &[kids[0], kids[1], kids[0]])
            .unwrap_err();
        assert_eq!(err, TreeError::Duplicate(kids[0]));
        assert_eq!(tree.left_child(parent), None);
        assert_eq!(tree.right_sibling(kids[0]), None);
    }

    #[test]
    fn test_child_cannot_be_linked_twice() {
        let mut tree = Tree::new();
        let first = tree.push("first", 1);
        let second = tree.push("second", 1);
        let kid = tree.push("kid", 1);
        tree.attach_children(first, &[kid]).unwrap();
        assert_eq!(
            tree.attach_children(second, &[kid]),
            Err(TreeError::AlreadyLinked(kid))
        );
    }

    #[test]
    fn test_dangling_child_is_rejected() {
        let mut tree: Tree<&str> = Tree::new();
        let parent = tree.push("parent", 1);
        assert_eq!(
            tree.attach_children(parent, &[42]),
            Err(TreeError::Dangling(42))
        );
    }

    #[test]
    fn test_walk_prefers_right_sibling_then_left_child() {
        let mut tree = Tree::new();
        let top = tree.push_chain(None, [("a", 1), ("b", 1)]).unwrap();
        tree.set_root(top);
        let last = tree.last_sibling(top);
        let below = tree.push_chain(Some(last), [("c", 2), ("d", 2)]).unwrap();

        let order: Vec<_> = tree.walk().map(|id| *tree.value(id)).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
        assert_eq!(tree.left_child(last), Some(below));
        assert_eq!(tree.deepest_last(top), tree.last_sibling(below));
    }
}
