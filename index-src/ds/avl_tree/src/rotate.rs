use log::trace;

use crate::{
    node::{balance_factor, update_height, Link, NodePtr},
    AvlTree,
};

impl<K, V> AvlTree<K, V> {
    /// Walks from `start` up to the root, refreshing heights and fixing
    /// every ancestor that became unbalanced.
    ///
    /// Every ancestor is checked, even after a rotation has already
    /// restored the height of the subtree.
    ///
    /// # Safety
    /// `start` is `None` or a node linked into this tree, and all nodes
    /// below the path have correct heights.
    pub(crate) unsafe fn retrace(&mut self, start: Link<K, V>) {
        let mut cur = start;
        while let Some(ptr) = cur {
            unsafe {
                update_height(ptr);
                self.rebalance(ptr);
                cur = (*ptr.as_ptr()).parent;
            }
        }
    }

    /// # Safety
    /// `ptr` is linked into this tree and its children are balanced.
    unsafe fn rebalance(&mut self, ptr: NodePtr<K, V>) {
        unsafe {
            match balance_factor(ptr) {
                2 => {
                    let Some(left) = (*ptr.as_ptr()).left else {
                        unreachable!("left-heavy node without a left child")
                    };
                    if balance_factor(left) == -1 {
                        trace!("left-right rotation");
                        self.rotate_left(left);
                    } else {
                        trace!("right rotation");
                    }
                    self.rotate_right(ptr);
                }
                -2 => {
                    let Some(right) = (*ptr.as_ptr()).right else {
                        unreachable!("right-heavy node without a right child")
                    };
                    if balance_factor(right) == 1 {
                        trace!("right-left rotation");
                        self.rotate_right(right);
                    } else {
                        trace!("left rotation");
                    }
                    self.rotate_left(ptr);
                }
                bf => debug_assert!((-1..=1).contains(&bf), "factor {bf}"),
            }
        }
    }

    // ```text
    //        x            y
    //       / \          / \
    //      y   c   =>   a   x
    //     / \              / \
    //    a   b            b   c
    // ```
    /// Promotes the left child of `x` into its place.
    ///
    /// # Safety
    /// `x` is linked into this tree and has a left child.
    unsafe fn rotate_right(&mut self, x: NodePtr<K, V>) {
        unsafe {
            let Some(y) = (*x.as_ptr()).left else { unreachable!() };
            *self.slot_of(x) = Some(y);
            let (xp, yp) = (x.as_ptr(), y.as_ptr());
            (*yp).parent = (*xp).parent;
            (*xp).parent = Some(y);

            (*xp).left = (*yp).right;
            if let Some(b) = (*yp).right {
                (*b.as_ptr()).parent = Some(x);
            }
            (*yp).right = Some(x);

            update_height(x);
            update_height(y);
        }
    }

    /// Mirror image of [`AvlTree::rotate_right`].
    ///
    /// # Safety
    /// `x` is linked into this tree and has a right child.
    unsafe fn rotate_left(&mut self, x: NodePtr<K, V>) {
        unsafe {
            let Some(y) = (*x.as_ptr()).right else { unreachable!() };
            *self.slot_of(x) = Some(y);
            let (xp, yp) = (x.as_ptr(), y.as_ptr());
            (*yp).parent = (*xp).parent;
            (*xp).parent = Some(y);

            (*xp).right = (*yp).left;
            if let Some(b) = (*yp).left {
                (*b.as_ptr()).parent = Some(x);
            }
            (*yp).left = Some(x);

            update_height(x);
            update_height(y);
        }
    }
}

#[test]
fn single_rotations() {
    let mut tree = AvlTree::new();
    for k in [1, 2, 3] {
        tree.insert(k, ()).unwrap();
    }
    assert_eq!(tree.min(), Some(&1));
    assert_eq!(tree.root.map(|r| unsafe { (*r.as_ptr()).key }), Some(2));
    assert_eq!(tree.height(), 1);

    let mut tree = AvlTree::new();
    for k in [3, 2, 1] {
        tree.insert(k, ()).unwrap();
    }
    assert_eq!(tree.root.map(|r| unsafe { (*r.as_ptr()).key }), Some(2));
    tree.check_invariants().unwrap();
}

#[test]
fn double_rotations() {
    let mut tree = AvlTree::new();
    for k in [3, 1, 2] {
        tree.insert(k, ()).unwrap();
    }
    assert_eq!(tree.root.map(|r| unsafe { (*r.as_ptr()).key }), Some(2));
    tree.check_invariants().unwrap();

    let mut tree = AvlTree::new();
    for k in [1, 3, 2] {
        tree.insert(k, ()).unwrap();
    }
    assert_eq!(tree.root.map(|r| unsafe { (*r.as_ptr()).key }), Some(2));
    assert_eq!(tree.keys(), [&1, &2, &3]);
    tree.check_invariants().unwrap();
}

#[test]
fn factor_counts_missing_child_as_minus_one() {
    let mut tree = AvlTree::new();
    tree.insert(1, ()).unwrap();
    tree.insert(2, ()).unwrap();
    let root = tree.root.unwrap();
    // Only a right child of height 0.
    assert_eq!(unsafe { balance_factor(root) }, -1);
    tree.insert(0, ()).unwrap();
    assert_eq!(unsafe { balance_factor(root) }, 0);
}
