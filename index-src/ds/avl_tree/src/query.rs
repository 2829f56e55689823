use std::{cmp::Ordering, iter::FusedIterator, marker::PhantomData};

use crate::{
    node::{leftmost, successor, Link, Node},
    AvlTree, Handle, TreeError,
};

/// In-order iterator over the entries of an [`AvlTree`].
///
/// Steps through parent links, so it needs no stack of its own.
pub struct Iter<'a, K, V> {
    next: Link<K, V>,
    remaining: usize,
    _marker: PhantomData<&'a Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let ptr = self.next?;
        unsafe {
            self.next = successor(ptr);
            self.remaining -= 1;
            let node = ptr.as_ptr();
            Some((&(*node).key, &(*node).value))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        let Self { next, remaining, .. } = *self;
        Self { next, remaining, _marker: PhantomData }
    }
}

impl<'a, K, V> IntoIterator for &'a AvlTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl<K, V> AvlTree<K, V> {
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            next: self.root.map(|root| unsafe { leftmost(root) }),
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    pub fn keys(&self) -> Vec<&K> { self.iter().map(|(k, _)| k).collect() }
    pub fn values(&self) -> Vec<&V> { self.iter().map(|(_, v)| v).collect() }

    /// Handles to every node, in ascending key order.
    pub fn handles(&self) -> Vec<Handle<K, V>> {
        let mut res = Vec::with_capacity(self.len);
        let mut cur = self.root.map(|root| unsafe { leftmost(root) });
        while let Some(ptr) = cur {
            res.push(self.handle(ptr));
            cur = unsafe { successor(ptr) };
        }
        res
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Values whose keys lie in `lo..=hi` and that satisfy `pred`, in
    /// ascending key order.
    ///
    /// Subtrees that cannot intersect the interval are never entered. The
    /// output is counted first and then filled, so it is allocated once.
    ///
    /// # Examples
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// for k in 1..=10 {
    ///     tree.insert(k, k * k).unwrap();
    /// }
    /// assert_eq!(tree.range(&3, &6, |v| v % 2 == 0), [&16, &36]);
    /// assert!(tree.range(&6, &3, |_| true).is_empty());
    /// ```
    pub fn range<F>(&self, lo: &K, hi: &K, pred: F) -> Vec<&V>
    where
        F: Fn(&V) -> bool,
    {
        if lo > hi {
            return vec![];
        }
        let mut count = 0;
        unsafe { walk_range(self.root, lo, hi, &pred, &mut |_| count += 1) };
        let mut res = Vec::with_capacity(count);
        unsafe { walk_range(self.root, lo, hi, &pred, &mut |v| res.push(v)) };
        debug_assert_eq!(res.len(), count);
        res
    }

    /// Nearest entry to `reference` under a caller-defined closeness.
    ///
    /// `cmp(candidate, best, reference)` returns [`Ordering::Greater`] when
    /// `candidate` is closer to `reference` than `best`. Only the nodes on
    /// the search path of `reference` are compared, which finds the true
    /// optimum whenever closeness grows monotonically towards `reference`
    /// along the key order (e.g. numeric distance). For other rules the
    /// answer is a good candidate but not necessarily the best one.
    ///
    /// # Examples
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// for k in [1, 3, 8, 10] {
    ///     tree.insert(k, ()).unwrap();
    /// }
    /// let by_distance =
    ///     |a: &i32, b: &i32, r: &i32| (b - r).abs().cmp(&(a - r).abs());
    /// assert_eq!(tree.closest(&5, by_distance), Ok((&3, &())));
    /// ```
    pub fn closest<F>(
        &self,
        reference: &K,
        mut cmp: F,
    ) -> Result<(&K, &V), TreeError>
    where
        F: FnMut(&K, &K, &K) -> Ordering,
    {
        let mut best: Link<K, V> = None;
        let mut cur = self.root;
        while let Some(ptr) = cur {
            let node = ptr.as_ptr();
            let key = unsafe { &(*node).key };
            best = match best {
                Some(b)
                    if cmp(key, unsafe { &(*b.as_ptr()).key }, reference)
                        != Ordering::Greater =>
                {
                    Some(b)
                }
                _ => Some(ptr),
            };
            cur = unsafe {
                if reference < key { (*node).left } else { (*node).right }
            };
        }
        best.map(|ptr| unsafe {
            let node = ptr.as_ptr();
            (&(*node).key, &(*node).value)
        })
        .ok_or(TreeError::NotFound)
    }
}

/// Pruned in-order walk: the left subtree is entered only if the key is
/// above `lo`, the right one only if it is below `hi`.
///
/// # Safety
/// `link` is `None` or the root of a live subtree that outlives `'a`.
unsafe fn walk_range<'a, K: Ord + 'a, V: 'a>(
    link: Link<K, V>,
    lo: &K,
    hi: &K,
    pred: &impl Fn(&V) -> bool,
    visit: &mut impl FnMut(&'a V),
) {
    let Some(ptr) = link else { return };
    unsafe {
        let node: &'a Node<K, V> = &*ptr.as_ptr();
        if &node.key > lo {
            walk_range(node.left, lo, hi, pred, visit);
        }
        if lo <= &node.key && &node.key <= hi && pred(&node.value) {
            visit(&node.value);
        }
        if &node.key < hi {
            walk_range(node.right, lo, hi, pred, visit);
        }
    }
}
