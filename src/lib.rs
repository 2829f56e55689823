//! An AVL-tree index and the competition record manager built on it.
//!
//! - [`ds`]: the tree itself ([`ds::AvlTree`]).
//! - [`records`]: teams and players indexed by identity and by ranking.
//! - [`naive`]: slow reference implementations used as test oracles.

pub use ds;
pub use naive;
pub use records;
