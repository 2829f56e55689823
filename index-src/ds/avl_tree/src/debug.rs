use std::fmt::{self, Write};

use crate::{
    node::{Link, NodePtr},
    AvlTree,
};

impl<K: Ord, V> AvlTree<K, V> {
    /// Checks every structural invariant: parent links, strict key order,
    /// cached heights, balance factors and the node count.
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(root) = self.root {
            if unsafe { (*root.as_ptr()).parent }.is_some() {
                return Err("root has a parent".to_owned());
            }
        }
        let (_, count) = unsafe { check(self.root, None, None) }?;
        if count != self.len {
            return Err(format!("len is {}, found {count} nodes", self.len));
        }
        Ok(())
    }
}

/// Returns the height and size of the subtree.
///
/// # Safety
/// `link` is `None` or the root of a live subtree.
unsafe fn check<K: Ord, V>(
    link: Link<K, V>,
    lo: Option<&K>,
    hi: Option<&K>,
) -> Result<(i32, usize), String> {
    let Some(ptr) = link else { return Ok((-1, 0)) };
    let node = unsafe { &*ptr.as_ptr() };
    if lo.is_some_and(|lo| lo >= &node.key)
        || hi.is_some_and(|hi| &node.key >= hi)
    {
        return Err("keys out of order".to_owned());
    }
    for child in [node.left, node.right].into_iter().flatten() {
        if unsafe { (*child.as_ptr()).parent } != Some(ptr) {
            return Err("broken parent link".to_owned());
        }
    }
    let (lh, ls) = unsafe { check(node.left, lo, Some(&node.key)) }?;
    let (rh, rs) = unsafe { check(node.right, Some(&node.key), hi) }?;
    if node.height != 1 + lh.max(rh) {
        return Err(format!("stale height {}", node.height));
    }
    if (lh - rh).abs() > 1 {
        return Err(format!("balance factor {}", lh - rh));
    }
    Ok((node.height, 1 + ls + rs))
}

impl<K: fmt::Debug, V> AvlTree<K, V> {
    /// Draws the shape of the tree, one key per line.
    ///
    /// ```
    /// use avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// for k in 1..=4 {
    ///     tree.insert(k, ()).unwrap();
    /// }
    /// assert_eq!(tree.visualize(), "\
    /// 2
    /// ├── L: 1
    /// └── R: 3
    ///     └── R: 4
    /// ");
    /// ```
    pub fn visualize(&self) -> String {
        let mut res = String::new();
        if let Some(root) = self.root {
            let key = unsafe { &(*root.as_ptr()).key };
            writeln!(res, "{key:?}").ok();
            unsafe { draw_children(root, &mut String::new(), &mut res) };
        }
        res
    }
}

/// # Safety
/// `ptr` is a live node.
unsafe fn draw_children<K: fmt::Debug, V>(
    ptr: NodePtr<K, V>,
    prefix: &mut String,
    out: &mut String,
) {
    let node = unsafe { &*ptr.as_ptr() };
    let children: Vec<_> = [("L", node.left), ("R", node.right)]
        .into_iter()
        .filter_map(|(side, link)| Some((side, link?)))
        .collect();
    for (i, &(side, child)) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let key = unsafe { &(*child.as_ptr()).key };
        let branch = if last { "└── " } else { "├── " };
        writeln!(out, "{prefix}{branch}{side}: {key:?}").ok();

        let len = prefix.len();
        prefix.push_str(if last { "    " } else { "│   " });
        unsafe { draw_children(child, prefix, out) };
        prefix.truncate(len);
    }
}

#[test]
fn detects_broken_trees() {
    let mut tree = AvlTree::new();
    for k in 0..7 {
        tree.insert(k, ()).unwrap();
    }
    assert_eq!(tree.check_invariants(), Ok(()));

    let root = tree.root.unwrap();
    unsafe { (*root.as_ptr()).height += 1 };
    assert!(tree.check_invariants().unwrap_err().contains("height"));
    unsafe { (*root.as_ptr()).height -= 1 };

    tree.len += 1;
    assert!(tree.check_invariants().unwrap_err().contains("len"));
    tree.len -= 1;

    unsafe { (*root.as_ptr()).key = 100 };
    assert_eq!(tree.check_invariants(), Err("keys out of order".to_owned()));
    unsafe { (*root.as_ptr()).key = 3 };
    assert_eq!(tree.check_invariants(), Ok(()));
}

#[test]
fn draw() {
    let mut tree = AvlTree::new();
    for k in [4, 2, 6, 1, 3, 7] {
        tree.insert(k, ()).unwrap();
    }
    let expected = "\
4
├── L: 2
│   ├── L: 1
│   └── R: 3
└── R: 6
    └── R: 7
";
    assert_eq!(tree.visualize(), expected);
    assert_eq!(AvlTree::<i32, ()>::new().visualize(), "");
}
