//! Height-balanced binary search tree with stable node handles.
//!
//! Nodes are individually allocated and linked through raw pointers. The
//! parent link is a non-owning back-reference; every node is owned by the
//! slot that points down at it, the real root by the tree's root slot.
//! Rotations and deletions only relink nodes, so a [`Handle`] to a node
//! keeps designating the same key and value until that node is removed.
//!
//! # Examples
//! ```
//! use avl_tree::{AvlTree, TreeError};
//!
//! let mut tree = AvlTree::new();
//! for k in [4, 2, 6, 1, 3, 5, 7] {
//!     tree.insert(k, k * 10).unwrap();
//! }
//! assert_eq!(tree.keys(), [&1, &2, &3, &4, &5, &6, &7]);
//! assert_eq!(tree.height(), 2);
//! assert_eq!(tree.find(&5), Ok(&50));
//! assert_eq!(tree.insert(5, 0), Err(TreeError::DuplicateKey));
//!
//! assert_eq!(tree.remove(&4), Ok((4, 40)));
//! assert_eq!(tree.find(&4), Err(TreeError::NotFound));
//!
//! let evens = tree.range(&2, &6, |v| v % 20 == 0);
//! assert_eq!(evens, [&20, &60]);
//! ```

use std::{
    borrow::Borrow,
    cmp::Ordering,
    fmt,
    marker::PhantomData,
    sync::atomic::{self, AtomicUsize},
};

use node::{Link, Node, NodePtr};

mod build;
mod debug;
mod node;
mod query;
mod remove;
mod rotate;

pub use query::Iter;
pub use remove::Detached;

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("key not found")]
    NotFound,
    #[error("key already present")]
    DuplicateKey,
    #[error("node storage could not be allocated")]
    AllocationFailure,
    #[error("invalid input")]
    InvalidInput,
    #[error("handle does not belong to this tree")]
    InvalidHandle,
    #[error("tree is not empty")]
    NotEmpty,
}

pub struct AvlTree<K, V> {
    // Root slot; the node it holds is the only one without a parent.
    root: Link<K, V>,
    len: usize,
    id: usize,
    // For dropck; the tree owns boxed nodes.
    _marker: PhantomData<Box<Node<K, V>>>,
}

/// A non-owning reference to one node of one tree.
///
/// Handles are plain copies of a pointer plus the identity of the tree
/// that produced them. They stay valid across rotations and across the
/// removal of other nodes, and dangle once their own node is removed or
/// the tree is dropped or overwritten.
pub struct Handle<K, V> {
    node: NodePtr<K, V>,
    tree: usize,
}

impl<K, V> Copy for Handle<K, V> {}
impl<K, V> Clone for Handle<K, V> {
    fn clone(&self) -> Self { *self }
}
impl<K, V> PartialEq for Handle<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.tree == other.tree
    }
}
impl<K, V> Eq for Handle<K, V> {}
impl<K, V> fmt::Debug for Handle<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("node", &self.node)
            .field("tree", &self.tree)
            .finish()
    }
}

fn fresh_id() -> usize {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    NEXT.fetch_add(1, atomic::Ordering::Relaxed)
}

unsafe impl<K: Send, V: Send> Send for AvlTree<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for AvlTree<K, V> {}

impl<K, V> AvlTree<K, V> {
    pub fn new() -> Self {
        Self { root: None, len: 0, id: fresh_id(), _marker: PhantomData }
    }

    pub fn len(&self) -> usize { self.len }
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Height of the root; `-1` for an empty tree, `0` for a single node.
    pub fn height(&self) -> i32 { node::height(self.root) }

    pub fn min(&self) -> Option<&K> {
        self.root.map(|root| unsafe { &(*node::leftmost(root).as_ptr()).key })
    }
    pub fn max(&self) -> Option<&K> {
        self.root
            .map(|root| unsafe { &(*node::rightmost(root).as_ptr()).key })
    }

    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            unsafe { node::drop_subtree(root) };
        }
        self.len = 0;
        self.id = fresh_id();
    }

    fn handle(&self, node: NodePtr<K, V>) -> Handle<K, V> {
        Handle { node, tree: self.id }
    }

    /// The link that owns `node`: the parent's matching child field, or
    /// the root slot when `node` has no parent.
    ///
    /// # Safety
    /// `node` is linked into this tree.
    unsafe fn slot_of(&mut self, node: NodePtr<K, V>) -> &mut Link<K, V> {
        unsafe {
            match (*node.as_ptr()).parent {
                None => &mut self.root,
                Some(parent) => {
                    let parent = parent.as_ptr();
                    if (*parent).left == Some(node) {
                        &mut (*parent).left
                    } else {
                        debug_assert_eq!((*parent).right, Some(node));
                        &mut (*parent).right
                    }
                }
            }
        }
    }

    fn find_node<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;
        while let Some(ptr) = cur {
            let node = ptr.as_ptr();
            cur = match key.cmp(unsafe { (*node).key.borrow() }) {
                Ordering::Equal => return Some(ptr),
                Ordering::Less => unsafe { (*node).left },
                Ordering::Greater => unsafe { (*node).right },
            };
        }
        None
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Inserts a new entry and returns a handle to its node.
    ///
    /// Fails with [`TreeError::DuplicateKey`] if an equal key is present,
    /// and with [`TreeError::AllocationFailure`] if the node cannot be
    /// allocated. The tree is unchanged on failure.
    pub fn insert(
        &mut self,
        key: K,
        value: V,
    ) -> Result<Handle<K, V>, TreeError> {
        let (parent, go_left) = self.descend(&key)?;
        let new =
            Node::try_new(key, value).ok_or(TreeError::AllocationFailure)?;
        unsafe { self.attach(new, parent, go_left) };
        Ok(self.handle(new))
    }

    /// The would-be parent of `key` and the side it goes to.
    fn descend(&self, key: &K) -> Result<(Link<K, V>, bool), TreeError> {
        let mut parent = None;
        let mut go_left = false;
        let mut cur = self.root;
        while let Some(ptr) = cur {
            let node = ptr.as_ptr();
            parent = Some(ptr);
            cur = match key.cmp(unsafe { &(*node).key }) {
                Ordering::Equal => return Err(TreeError::DuplicateKey),
                Ordering::Less => {
                    go_left = true;
                    unsafe { (*node).left }
                }
                Ordering::Greater => {
                    go_left = false;
                    unsafe { (*node).right }
                }
            };
        }
        Ok((parent, go_left))
    }

    /// Links a detached leaf below `parent` and rebalances.
    ///
    /// # Safety
    /// `new` is a detached leaf and `(parent, go_left)` came from
    /// [`AvlTree::descend`] on its key with no mutation in between.
    unsafe fn attach(
        &mut self,
        new: NodePtr<K, V>,
        parent: Link<K, V>,
        go_left: bool,
    ) {
        unsafe {
            (*new.as_ptr()).parent = parent;
            match parent {
                None => self.root = Some(new),
                Some(p) if go_left => (*p.as_ptr()).left = Some(new),
                Some(p) => (*p.as_ptr()).right = Some(new),
            }
            self.len += 1;
            self.retrace(parent);
        }
    }

    pub fn find<Q>(&self, key: &Q) -> Result<&V, TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key)
            .map(|ptr| unsafe { &(*ptr.as_ptr()).value })
            .ok_or(TreeError::NotFound)
    }

    /// Mutable access to a value; keys cannot be changed in place.
    pub fn find_mut<Q>(&mut self, key: &Q) -> Result<&mut V, TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key)
            .map(|ptr| unsafe { &mut (*ptr.as_ptr()).value })
            .ok_or(TreeError::NotFound)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).is_some()
    }

    pub fn find_handle<Q>(&self, key: &Q) -> Result<Handle<K, V>, TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key)
            .map(|ptr| self.handle(ptr))
            .ok_or(TreeError::NotFound)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Result<(K, V), TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.find_node(key).ok_or(TreeError::NotFound)?;
        Ok(unsafe { self.remove_node(ptr) })
    }
}

impl<K, V> AvlTree<K, V> {
    /// Removes the node designated by `handle` without searching for it.
    ///
    /// Returns [`TreeError::InvalidHandle`] if the handle was produced by
    /// another tree, or by this tree before it was cleared or overwritten.
    ///
    /// # Safety
    /// The node designated by `handle` must not have been removed since
    /// the handle was obtained.
    pub unsafe fn remove_by_handle(
        &mut self,
        handle: Handle<K, V>,
    ) -> Result<(K, V), TreeError> {
        if handle.tree != self.id {
            return Err(TreeError::InvalidHandle);
        }
        Ok(unsafe { self.remove_node(handle.node) })
    }

    /// Borrows the entry designated by `handle`.
    ///
    /// # Safety
    /// Same contract as [`AvlTree::remove_by_handle`].
    pub unsafe fn resolve(
        &self,
        handle: Handle<K, V>,
    ) -> Result<(&K, &V), TreeError> {
        if handle.tree != self.id {
            return Err(TreeError::InvalidHandle);
        }
        let node = handle.node.as_ptr();
        Ok(unsafe { (&(*node).key, &(*node).value) })
    }
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self { Self::new() }
}

impl<K, V> Drop for AvlTree<K, V> {
    fn drop(&mut self) {
        if let Some(root) = self.root.take() {
            unsafe { node::drop_subtree(root) };
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
