use std::{
    alloc::{self, Layout},
    ptr::NonNull,
};

pub(crate) type NodePtr<K, V> = NonNull<Node<K, V>>;
pub(crate) type Link<K, V> = Option<NodePtr<K, V>>;

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    // Non-owning; only used to walk upwards and to find the owning slot.
    pub(crate) parent: Link<K, V>,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    // A leaf has height 0; an absent child counts as -1.
    pub(crate) height: i32,
}

impl<K, V> Node<K, V> {
    /// Allocates a detached leaf holding `key` and `value`.
    ///
    /// Returns `None` when the allocator cannot provide the storage; the
    /// payload is dropped in that case.
    pub(crate) fn try_new(key: K, value: V) -> Option<NodePtr<K, V>> {
        let layout = Layout::new::<Self>();
        let ptr = NonNull::new(unsafe { alloc::alloc(layout) } as *mut Self)?;
        let node = Node {
            key,
            value,
            parent: None,
            left: None,
            right: None,
            height: 0,
        };
        unsafe { ptr.as_ptr().write(node) };
        Some(ptr)
    }

    /// Releases the node and hands its payload back.
    ///
    /// # Safety
    /// `ptr` was returned by [`Node::try_new`] and no link of a live tree
    /// refers to it any more.
    pub(crate) unsafe fn free(ptr: NodePtr<K, V>) -> (K, V) {
        // `Layout::new::<Self>()` is exactly what `Box` uses.
        let node = unsafe { Box::from_raw(ptr.as_ptr()) };
        let Node { key, value, .. } = *node;
        (key, value)
    }
}

pub(crate) fn height<K, V>(link: Link<K, V>) -> i32 {
    link.map_or(-1, |ptr| unsafe { (*ptr.as_ptr()).height })
}

/// # Safety
/// `ptr` and its children are live nodes.
pub(crate) unsafe fn update_height<K, V>(ptr: NodePtr<K, V>) {
    unsafe {
        let node = ptr.as_ptr();
        (*node).height = 1 + height((*node).left).max(height((*node).right));
    }
}

/// Left height minus right height, absent children counting as -1.
///
/// # Safety
/// `ptr` and its children are live nodes.
pub(crate) unsafe fn balance_factor<K, V>(ptr: NodePtr<K, V>) -> i32 {
    unsafe {
        let node = ptr.as_ptr();
        height((*node).left) - height((*node).right)
    }
}

/// # Safety
/// `ptr` is the root of a live subtree.
pub(crate) unsafe fn leftmost<K, V>(mut ptr: NodePtr<K, V>) -> NodePtr<K, V> {
    while let Some(left) = unsafe { (*ptr.as_ptr()).left } {
        ptr = left;
    }
    ptr
}

/// # Safety
/// `ptr` is the root of a live subtree.
pub(crate) unsafe fn rightmost<K, V>(mut ptr: NodePtr<K, V>) -> NodePtr<K, V> {
    while let Some(right) = unsafe { (*ptr.as_ptr()).right } {
        ptr = right;
    }
    ptr
}

/// In-order successor through the parent links.
///
/// # Safety
/// `ptr` belongs to a live tree whose parent links are consistent.
pub(crate) unsafe fn successor<K, V>(ptr: NodePtr<K, V>) -> Link<K, V> {
    unsafe {
        if let Some(right) = (*ptr.as_ptr()).right {
            return Some(leftmost(right));
        }
        let mut child = ptr;
        while let Some(parent) = (*child.as_ptr()).parent {
            if (*parent.as_ptr()).left == Some(child) {
                return Some(parent);
            }
            child = parent;
        }
        None
    }
}

/// Frees every node of the subtree, children first.
///
/// # Safety
/// The subtree is detached from any tree that will be used again.
pub(crate) unsafe fn drop_subtree<K, V>(ptr: NodePtr<K, V>) {
    unsafe {
        let node = ptr.as_ptr();
        if let Some(left) = (*node).left {
            drop_subtree(left);
        }
        if let Some(right) = (*node).right {
            drop_subtree(right);
        }
        drop(Node::free(ptr));
    }
}
