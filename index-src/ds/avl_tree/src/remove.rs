use std::{
    borrow::Borrow,
    fmt,
    marker::PhantomData,
    mem::{self, ManuallyDrop},
};

use crate::{
    node::{leftmost, Node, NodePtr},
    AvlTree, Handle, TreeError,
};

/// An entry taken out of a tree together with its node.
///
/// [`AvlTree::reattach`] links the very same node back in without
/// allocating. Dropping the entry frees the node.
pub struct Detached<K, V> {
    node: NodePtr<K, V>,
    _marker: PhantomData<Box<Node<K, V>>>,
}

impl<K, V> Detached<K, V> {
    pub fn key(&self) -> &K { unsafe { &(*self.node.as_ptr()).key } }
    pub fn value(&self) -> &V { unsafe { &(*self.node.as_ptr()).value } }

    pub fn into_inner(self) -> (K, V) {
        let this = ManuallyDrop::new(self);
        unsafe { Node::free(this.node) }
    }
}

impl<K, V> Drop for Detached<K, V> {
    fn drop(&mut self) { drop(unsafe { Node::free(self.node) }); }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Detached<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Detached")
            .field(self.key())
            .field(self.value())
            .finish()
    }
}

unsafe impl<K: Send, V: Send> Send for Detached<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Detached<K, V> {}

impl<K: Ord, V> AvlTree<K, V> {
    /// Takes the entry for `key` out of the tree but keeps its node, so
    /// that putting it back cannot fail for lack of memory.
    ///
    /// # Examples
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// for k in 1..=5 {
    ///     tree.insert(k, k * k).unwrap();
    /// }
    /// let four = tree.detach(&4).unwrap();
    /// assert_eq!(tree.keys(), [&1, &2, &3, &5]);
    /// assert_eq!(four.value(), &16);
    /// tree.reattach(four).unwrap();
    /// assert_eq!(tree.len(), 5);
    /// ```
    pub fn detach<Q>(&mut self, key: &Q) -> Result<Detached<K, V>, TreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.find_node(key).ok_or(TreeError::NotFound)?;
        unsafe { self.detach_node(ptr) };
        Ok(Detached { node: ptr, _marker: PhantomData })
    }

    /// Links a detached entry back in; never allocates.
    ///
    /// Hands the entry back if an equal key is present. Handles obtained
    /// before [`AvlTree::detach`] designate the entry again once it is
    /// back in the tree it came from.
    pub fn reattach(
        &mut self,
        entry: Detached<K, V>,
    ) -> Result<Handle<K, V>, Detached<K, V>> {
        let Ok((parent, go_left)) = self.descend(entry.key()) else {
            return Err(entry);
        };
        let node = ManuallyDrop::new(entry).node;
        unsafe { self.attach(node, parent, go_left) };
        Ok(self.handle(node))
    }
}

impl<K, V> AvlTree<K, V> {
    /// Unlinks `ptr`, rebalances from its former parent and frees it.
    ///
    /// # Safety
    /// `ptr` is linked into this tree.
    pub(crate) unsafe fn remove_node(&mut self, ptr: NodePtr<K, V>) -> (K, V) {
        unsafe {
            self.detach_node(ptr);
            Node::free(ptr)
        }
    }

    /// Unlinks `ptr` and rebalances from its former parent, leaving it a
    /// detached leaf.
    ///
    /// # Safety
    /// `ptr` is linked into this tree.
    unsafe fn detach_node(&mut self, ptr: NodePtr<K, V>) {
        unsafe {
            let node = ptr.as_ptr();
            if let (Some(_), Some(right)) = ((*node).left, (*node).right) {
                self.swap_with_successor(ptr, leftmost(right));
                debug_assert!((*node).left.is_none());
            }
            self.unlink(ptr);
            let parent = (*node).parent.take();
            self.retrace(parent);
            self.len -= 1;
            (*node).height = 0;
        }
    }

    /// Detaches a node with at most one child, moving that child (if any)
    /// into the detached node's slot. The node keeps its own parent link
    /// so that the caller can start the upward walk from there.
    ///
    /// # Safety
    /// `ptr` is linked into this tree and has at most one child.
    unsafe fn unlink(&mut self, ptr: NodePtr<K, V>) {
        unsafe {
            let node = ptr.as_ptr();
            debug_assert!((*node).left.is_none() || (*node).right.is_none());
            let child = (*node).left.or((*node).right);
            if let Some(child) = child {
                (*child.as_ptr()).parent = (*node).parent;
            }
            *self.slot_of(ptr) = child;
            (*node).left = None;
            (*node).right = None;
        }
    }

    /// Exchanges the structural positions of `target` and its in-order
    /// successor `succ`: links, parent links and cached heights move, the
    /// nodes themselves (and their payloads) stay where they are.
    ///
    /// Afterwards `target` has no left child and can be unlinked.
    ///
    /// # Safety
    /// `target` has two children and `succ` is the leftmost node of its
    /// right subtree.
    unsafe fn swap_with_successor(
        &mut self,
        target: NodePtr<K, V>,
        succ: NodePtr<K, V>,
    ) {
        unsafe {
            let (t, s) = (target.as_ptr(), succ.as_ptr());
            debug_assert!((*s).left.is_none());

            *self.slot_of(target) = Some(succ);

            if (*t).right == Some(succ) {
                //     t            s
                //    / \          / \
                //   a   s   =>   a   t
                //        \            \
                //         c            c
                (*s).parent = (*t).parent;
                (*t).parent = Some(succ);
                (*t).right = (*s).right;
                (*s).right = Some(target);
            } else {
                let Some(sp) = (*s).parent else { unreachable!() };
                (*sp.as_ptr()).left = Some(target);
                (*s).parent = mem::replace(&mut (*t).parent, Some(sp));
                mem::swap(&mut (*t).right, &mut (*s).right);
                if let Some(right) = (*s).right {
                    (*right.as_ptr()).parent = Some(succ);
                }
            }
            if let Some(right) = (*t).right {
                (*right.as_ptr()).parent = Some(target);
            }

            (*s).left = (*t).left.take();
            if let Some(left) = (*s).left {
                (*left.as_ptr()).parent = Some(succ);
            }
            mem::swap(&mut (*t).height, &mut (*s).height);
        }
    }
}
