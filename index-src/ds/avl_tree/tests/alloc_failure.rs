use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
    ptr,
};

use avl_tree::{AvlTree, TreeError};

thread_local! {
    // Allocations this thread may still make; `None` for no limit.
    static BUDGET: Cell<Option<usize>> = const { Cell::new(None) };
}

struct Rationed;

fn take_one() -> bool {
    BUDGET
        .try_with(|budget| match budget.get() {
            None => true,
            Some(0) => false,
            Some(n) => {
                budget.set(Some(n - 1));
                true
            }
        })
        .unwrap_or(true)
}

unsafe impl GlobalAlloc for Rationed {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if take_one() {
            unsafe { System.alloc(layout) }
        } else {
            ptr::null_mut()
        }
    }
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: Rationed = Rationed;

/// Runs `f` allowing `n` more allocations; every later one fails.
fn with_budget<T>(n: usize, f: impl FnOnce() -> T) -> T {
    BUDGET.with(|budget| budget.set(Some(n)));
    let res = f();
    BUDGET.with(|budget| budget.set(None));
    res
}

fn evens(n: i32) -> AvlTree<i32, String> {
    let mut tree = AvlTree::new();
    for k in 0..n {
        tree.insert(2 * k, k.to_string()).unwrap();
    }
    tree
}

#[test]
fn insert_failure() {
    let mut tree = evens(40);
    let keys: Vec<_> = tree.keys().into_iter().copied().collect();
    let handles = tree.handles();

    for k in (1..80).step_by(2) {
        let value = k.to_string();
        let res = with_budget(0, || tree.insert(k, value));
        assert_eq!(res.err(), Some(TreeError::AllocationFailure));
        tree.check_invariants().unwrap();
        assert_eq!(tree.handles(), handles);
    }
    assert!(tree.keys().into_iter().copied().eq(keys));

    let value = "one".to_owned();
    assert!(with_budget(1, || tree.insert(1, value)).is_ok());
    assert_eq!(tree.len(), 41);
}

#[test]
fn build_failure() {
    let keys: Vec<_> = (0..30).collect();
    let values: Vec<_> = keys.iter().map(|k| format!("v{k}")).collect();

    let mut budget = 0;
    let tree = loop {
        let mut tree = AvlTree::new();
        let (k, v) = (keys.clone(), values.clone());
        match with_budget(budget, || tree.build_from_sorted(k, v)) {
            Ok(()) => break tree,
            Err(e) => {
                assert_eq!(e, TreeError::AllocationFailure);
                assert!(tree.is_empty());
                assert_eq!(tree.height(), -1);
            }
        }
        budget += 1;
    };
    assert!(budget > keys.len());
    tree.check_invariants().unwrap();
    assert_eq!(tree.find(&17), Ok(&"v17".to_owned()));
}

#[test]
fn clone_failure() {
    let mut tree = AvlTree::new();
    for k in 0..30 {
        tree.insert(k * 7 % 30, k).unwrap();
    }
    let shape = tree.visualize();

    let mut budget = 0;
    let copy = loop {
        match with_budget(budget, || tree.try_clone()) {
            Ok(copy) => break copy,
            Err(e) => assert_eq!(e, TreeError::AllocationFailure),
        }
        tree.check_invariants().unwrap();
        budget += 1;
    };
    assert!(budget > tree.len());
    assert_eq!(copy.visualize(), shape);
    assert_eq!(tree.visualize(), shape);
}

#[test]
fn reattach_needs_no_memory() {
    let mut tree = evens(25);
    let before = tree.handles();
    for k in (0..50).step_by(2) {
        let res = with_budget(0, || {
            let entry = tree.detach(&k)?;
            assert_eq!(tree.len(), 24);
            tree.reattach(entry).map_err(|_| TreeError::DuplicateKey)
        });
        assert!(res.is_ok());
        tree.check_invariants().unwrap();
    }
    // Same nodes, same order.
    assert_eq!(tree.handles(), before);
}
