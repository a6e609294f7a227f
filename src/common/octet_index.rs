//! AVL tree keyed by a single octet, one instance per address level.
//!
//! Every node owns its siblings (`left`, `right`) and the index of the next
//! level (`subtree`), so a whole address tree is a strict ownership tree with
//! no sharing. Fan-out per level is at most 256 keys, which keeps the height
//! of any [OctetIndex] at or below 11 and the recursion shallow.

use std::cmp::Ordering;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::common::HandlerChain;

type Link = Option<Box<OctetNode>>;

#[derive(Debug, Clone, Default)]
/// Balanced index of the octets present at one level.
pub struct OctetIndex {
    root: Link,
}

#[derive(Debug, Clone)]
/// One octet at one level, with the index of the following octets and
/// the handlers bound to the prefix it terminates.
pub struct OctetNode {
    key: u8,
    height: u8,
    left: Link,
    right: Link,
    subtree: OctetIndex,
    handlers: Option<HandlerChain>,
}

impl OctetNode {
    fn new(key: u8) -> Self {
        OctetNode {
            key,
            height: 1,
            left: None,
            right: None,
            subtree: OctetIndex::new(),
            handlers: None,
        }
    }

    // === Getters ===

    pub fn key(&self) -> u8 {
        self.key
    }

    /// AVL height, a leaf has height 1.
    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn left(&self) -> Option<&OctetNode> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&OctetNode> {
        self.right.as_deref()
    }

    /// Index of the next level below this octet.
    pub fn subtree(&self) -> &OctetIndex {
        &self.subtree
    }

    pub fn subtree_mut(&mut self) -> &mut OctetIndex {
        &mut self.subtree
    }

    /// Handlers bound to this node, if any were ever attached.
    pub fn handlers(&self) -> Option<&HandlerChain> {
        self.handlers.as_ref()
    }

    /// Handlers bound to this node, creating an empty chain on first use.
    pub fn handlers_mut(&mut self) -> &mut HandlerChain {
        self.handlers.get_or_insert_with(HandlerChain::new)
    }

    /// `height(left) - height(right)`
    pub fn balance(&self) -> i16 {
        height(&self.left) as i16 - height(&self.right) as i16
    }

    // === Private Methods ===

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }
}

impl OctetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // === Getters ===

    pub fn root(&self) -> Option<&OctetNode> {
        self.root.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of keys at this level.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Height of the root, `0` for an empty index.
    pub fn height(&self) -> u8 {
        height(&self.root)
    }

    pub fn contains(&self, key: u8) -> bool {
        self.get(key).is_some()
    }

    /// Binary search for `key`.
    pub fn get(&self, key: u8) -> Option<&OctetNode> {
        let mut current = self.root.as_deref();

        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(node),
            };
        }

        None
    }

    pub fn get_mut(&mut self, key: u8) -> Option<&mut OctetNode> {
        let mut current = self.root.as_deref_mut();

        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref_mut(),
                Ordering::Greater => node.right.as_deref_mut(),
                Ordering::Equal => return Some(node),
            };
        }

        None
    }

    /// In-order iterator over the nodes of this level.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }

    /// Keys of this level in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.iter().map(|node| node.key)
    }

    // === Public Methods ===

    /// Return the node for `key`, inserting a fresh leaf and rebalancing
    /// if it is not present yet. An existing node is returned unchanged.
    pub fn insert(&mut self, key: u8) -> &mut OctetNode {
        self.root = Some(insert(self.root.take(), key));

        match self.get_mut(key) {
            Some(node) => node,
            None => unreachable!("octet {key} missing right after insertion"),
        }
    }

    /// Remove `key` together with everything it owns (its subtree and
    /// handlers), and return `true` if it was present.
    pub fn remove(&mut self, key: u8) -> bool {
        let mut removed = None;
        self.root = remove(self.root.take(), key, &mut removed);

        removed.is_some()
    }
}

impl<'a> IntoIterator for &'a OctetIndex {
    type Item = &'a OctetNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over an [OctetIndex], see [OctetIndex::iter].
pub struct Iter<'a> {
    stack: Vec<&'a OctetNode>,
}

impl<'a> Iter<'a> {
    fn push_left(&mut self, mut node: Option<&'a OctetNode>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a OctetNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());

        Some(node)
    }
}

// === Serialization ===

impl Serialize for OctetIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl Serialize for OctetNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let signatures = self.handlers.as_ref().filter(|chain| !chain.is_empty());

        let mut state =
            serializer.serialize_struct("OctetNode", 4 + signatures.is_some() as usize)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("subtree", &self.subtree)?;
        state.serialize_field("left", &self.left)?;
        state.serialize_field("right", &self.right)?;
        if let Some(chain) = signatures {
            state.serialize_field("signatures", chain)?;
        }
        state.end()
    }
}

// === Tree primitives ===

fn height(link: &Link) -> u8 {
    link.as_ref().map_or(0, |node| node.height)
}

fn rotate_right(mut y: Box<OctetNode>) -> Box<OctetNode> {
    let Some(mut x) = y.left.take() else {
        return y;
    };

    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();

    x
}

fn rotate_left(mut x: Box<OctetNode>) -> Box<OctetNode> {
    let Some(mut y) = x.right.take() else {
        return x;
    };

    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();

    y
}

fn insert(link: Link, key: u8) -> Box<OctetNode> {
    let Some(mut node) = link else {
        return Box::new(OctetNode::new(key));
    };

    match key.cmp(&node.key) {
        Ordering::Less => node.left = Some(insert(node.left.take(), key)),
        Ordering::Greater => node.right = Some(insert(node.right.take(), key)),
        Ordering::Equal => return node,
    }

    node.update_height();
    let balance = node.balance();

    // The inserted key's side of the heavy child picks single or double rotation.
    if balance > 1 {
        if let Some(left) = node.left.take() {
            node.left = Some(if key > left.key {
                rotate_left(left)
            } else {
                left
            });
        }
        return rotate_right(node);
    }

    if balance < -1 {
        if let Some(right) = node.right.take() {
            node.right = Some(if key < right.key {
                rotate_right(right)
            } else {
                right
            });
        }
        return rotate_left(node);
    }

    node
}

/// Restore the AVL property of `node` after a removal below it, choosing
/// single or double rotation from the heavy child's own balance.
fn rebalance(mut node: Box<OctetNode>) -> Box<OctetNode> {
    node.update_height();
    let balance = node.balance();

    if balance > 1 {
        if let Some(left) = node.left.take() {
            node.left = Some(if left.balance() < 0 {
                rotate_left(left)
            } else {
                left
            });
        }
        return rotate_right(node);
    }

    if balance < -1 {
        if let Some(right) = node.right.take() {
            node.right = Some(if right.balance() > 0 {
                rotate_right(right)
            } else {
                right
            });
        }
        return rotate_left(node);
    }

    node
}

/// Detach the minimum of a subtree, returning what remains and the minimum.
fn take_min(mut node: Box<OctetNode>) -> (Link, Box<OctetNode>) {
    match node.left.take() {
        None => (node.right.take(), node),
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;

            (Some(rebalance(node)), min)
        }
    }
}

fn remove(link: Link, key: u8, removed: &mut Link) -> Link {
    let mut node = link?;

    match key.cmp(&node.key) {
        Ordering::Less => node.left = remove(node.left.take(), key, removed),
        Ordering::Greater => node.right = remove(node.right.take(), key, removed),
        Ordering::Equal => {
            let left = node.left.take();
            let right = node.right.take();
            *removed = Some(node);

            match (left, right) {
                (None, None) => return None,
                (Some(child), None) | (None, Some(child)) => return Some(child),
                (Some(left), Some(right)) => {
                    // The in-order successor takes the removed node's place,
                    // carrying its own subtree and handlers with it.
                    let (rest, mut successor) = take_min(right);
                    successor.left = Some(left);
                    successor.right = rest;
                    node = successor;
                }
            }
        }
    }

    Some(rebalance(node))
}
