use std::{
    alloc::{self, Layout},
    mem,
};

use log::trace;

use crate::{
    node::{update_height, Link, Node, NodePtr},
    AvlTree, TreeError,
};

impl<K: Ord, V> AvlTree<K, V> {
    /// Fills an empty tree from strictly ascending `keys` and their
    /// `values`, in linear time.
    ///
    /// The lower middle element of every range becomes the root of its
    /// subtree, so the result is as balanced as a binary tree can be.
    ///
    /// # Errors
    /// [`TreeError::NotEmpty`] if the tree holds any node,
    /// [`TreeError::InvalidInput`] if the lengths differ or the keys are not
    /// strictly ascending, [`TreeError::AllocationFailure`] if node storage
    /// runs out. The tree is unchanged on error.
    ///
    /// # Examples
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.build_from_sorted(vec![1, 2, 3, 4, 5], vec!['a'; 5]).unwrap();
    /// assert_eq!(tree.height(), 2);
    /// assert_eq!(tree.len(), 5);
    /// ```
    pub fn build_from_sorted(
        &mut self,
        keys: Vec<K>,
        values: Vec<V>,
    ) -> Result<(), TreeError> {
        if !self.is_empty() {
            return Err(TreeError::NotEmpty);
        }
        if keys.len() != values.len() || keys.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(TreeError::InvalidInput);
        }

        let n = keys.len();
        let nodes = alloc_all(keys.into_iter().zip(values), n)?;
        self.root = unsafe { link_sorted(&nodes, None) };
        self.len = n;
        trace!("built {n} nodes, height {}", self.height());
        Ok(())
    }
}

impl<K: Clone, V: Clone> AvlTree<K, V> {
    /// Deep copy with the same shape, or [`TreeError::AllocationFailure`].
    ///
    /// The copy is a new tree: handles into `self` are rejected by it.
    pub fn try_clone(&self) -> Result<Self, TreeError> {
        // Pre-order, with the size of each node's left subtree.
        let mut order = vec_for(self.len)?;
        let mut lefts = vec_for(self.len)?;
        unsafe { preorder(self.root, &mut order, &mut lefts) };

        let copies = alloc_all(
            order.iter().map(|&ptr| unsafe {
                let node = ptr.as_ptr();
                ((*node).key.clone(), (*node).value.clone())
            }),
            self.len,
        )?;

        let mut res = Self::new();
        res.root = unsafe { link_preorder(&copies, &lefts, None) };
        res.len = self.len;
        Ok(res)
    }
}

impl<K: Clone, V: Clone> Clone for AvlTree<K, V> {
    fn clone(&self) -> Self {
        self.try_clone().unwrap_or_else(|_| {
            alloc::handle_alloc_error(Layout::new::<Node<K, V>>())
        })
    }
}

fn vec_for<T>(n: usize) -> Result<Vec<T>, TreeError> {
    let mut res = Vec::new();
    res.try_reserve_exact(n).map_err(|_| TreeError::AllocationFailure)?;
    Ok(res)
}

/// Nodes allocated but not linked yet; dropping the batch frees them.
struct Batch<K, V>(Vec<NodePtr<K, V>>);

impl<K, V> Drop for Batch<K, V> {
    fn drop(&mut self) {
        for ptr in self.0.drain(..) {
            drop(unsafe { Node::free(ptr) });
        }
    }
}

/// Allocates one detached node per entry. Nothing is leaked if an
/// allocation fails or the iterator panics.
fn alloc_all<K, V>(
    entries: impl Iterator<Item = (K, V)>,
    n: usize,
) -> Result<Vec<NodePtr<K, V>>, TreeError> {
    let mut batch = Batch(vec_for(n)?);
    for (key, value) in entries {
        let ptr =
            Node::try_new(key, value).ok_or(TreeError::AllocationFailure)?;
        batch.0.push(ptr);
    }
    Ok(mem::take(&mut batch.0))
}

/// Pushes the subtree in pre-order along with left subtree sizes, and
/// returns its size.
///
/// # Safety
/// `link` is `None` or the root of a live subtree.
unsafe fn preorder<K, V>(
    link: Link<K, V>,
    order: &mut Vec<NodePtr<K, V>>,
    lefts: &mut Vec<usize>,
) -> usize {
    let Some(ptr) = link else { return 0 };
    let at = order.len();
    order.push(ptr);
    lefts.push(0);
    unsafe {
        let left = preorder((*ptr.as_ptr()).left, order, lefts);
        lefts[at] = left;
        1 + left + preorder((*ptr.as_ptr()).right, order, lefts)
    }
}

/// # Safety
/// `nodes` are detached and sorted by key.
unsafe fn link_sorted<K, V>(
    nodes: &[NodePtr<K, V>],
    parent: Link<K, V>,
) -> Link<K, V> {
    if nodes.is_empty() {
        return None;
    }
    let mid = (nodes.len() - 1) / 2;
    let ptr = nodes[mid];
    unsafe {
        let node = ptr.as_ptr();
        (*node).parent = parent;
        (*node).left = link_sorted(&nodes[..mid], Some(ptr));
        (*node).right = link_sorted(&nodes[mid + 1..], Some(ptr));
        update_height(ptr);
    }
    Some(ptr)
}

/// # Safety
/// `nodes` are detached and listed in pre-order, `lefts` holding their
/// left subtree sizes.
unsafe fn link_preorder<K, V>(
    nodes: &[NodePtr<K, V>],
    lefts: &[usize],
    parent: Link<K, V>,
) -> Link<K, V> {
    let (&ptr, rest) = nodes.split_first()?;
    let (&left, rest_lefts) = lefts.split_first()?;
    let (l, r) = rest.split_at(left);
    let (ll, rl) = rest_lefts.split_at(left);
    unsafe {
        let node = ptr.as_ptr();
        (*node).parent = parent;
        (*node).left = link_preorder(l, ll, Some(ptr));
        (*node).right = link_preorder(r, rl, Some(ptr));
        update_height(ptr);
    }
    Some(ptr)
}
