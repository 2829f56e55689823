use std::cmp::Ordering;

/// Ordered map kept as a plain sorted vector.
///
/// Every operation is a linear scan or a `Vec` shift; it only exists to
/// check the balanced trees against.
pub struct SortedAssoc<K, V>(Vec<(K, V)>);

impl<K: Ord, V> SortedAssoc<K, V> {
    pub fn new() -> Self { Self(vec![]) }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn len(&self) -> usize { self.0.len() }

    /// Returns `false` and leaves the map unchanged if `key` is present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        match self.0.iter().position(|(k, _)| k >= &key) {
            Some(i) if self.0[i].0 == key => false,
            Some(i) => {
                self.0.insert(i, (key, value));
                true
            }
            None => {
                self.0.push((key, value));
                true
            }
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let i = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(i))
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> Vec<&K> { self.0.iter().map(|(k, _)| k).collect() }
    pub fn values(&self) -> Vec<&V> { self.0.iter().map(|(_, v)| v).collect() }

    pub fn min(&self) -> Option<&K> { self.0.first().map(|(k, _)| k) }
    pub fn max(&self) -> Option<&K> { self.0.last().map(|(k, _)| k) }

    pub fn range_filter(
        &self,
        lo: &K,
        hi: &K,
        pred: impl Fn(&V) -> bool,
    ) -> Vec<&V> {
        self.0
            .iter()
            .filter(|(k, v)| lo <= k && k <= hi && pred(v))
            .map(|(_, v)| v)
            .collect()
    }

    /// Exhaustive nearest-key search: `cmp(candidate, best, reference)`
    /// returns `Greater` when `candidate` is the better one. The first key
    /// seen in ascending order wins among equally good keys.
    pub fn closest(
        &self,
        reference: &K,
        mut cmp: impl FnMut(&K, &K, &K) -> Ordering,
    ) -> Option<&K> {
        let mut best: Option<&K> = None;
        for (k, _) in &self.0 {
            best = match best {
                Some(b) if cmp(k, b, reference) != Ordering::Greater => Some(b),
                _ => Some(k),
            };
        }
        best
    }
}

impl<K: Ord, V> Default for SortedAssoc<K, V> {
    fn default() -> Self { Self::new() }
}

#[test]
fn sanity_check() {
    let mut map = SortedAssoc::new();
    assert!(map.insert(3, "c"));
    assert!(map.insert(1, "a"));
    assert!(map.insert(2, "b"));
    assert!(!map.insert(2, "x"));
    assert_eq!(map.keys(), [&1, &2, &3]);
    assert_eq!(map.get(&2), Some(&"b"));
    assert_eq!(map.range_filter(&2, &3, |_| true), [&"b", &"c"]);
    assert_eq!(map.remove(&1), Some((1, "a")));
    assert_eq!(map.remove(&1), None);
    assert_eq!(map.min(), Some(&2));
    assert_eq!(map.len(), 2);

    let dist = |a: &i32, b: &i32, r: &i32| (b - r).abs().cmp(&(a - r).abs());
    assert_eq!(map.closest(&0, dist), Some(&2));
    assert_eq!(SortedAssoc::<i32, ()>::new().closest(&0, dist), None);
}
