/// Re-exports each listed crate both as a module and as a glob, so that
/// category crates can surface their members under one path.
///
/// ```ignore
/// doc_inline_reexport! {
///     avl_tree,
/// }
/// // `ds::avl_tree::AvlTree` and `ds::AvlTree` now both resolve.
/// ```
#[macro_export]
macro_rules! doc_inline_reexport {
    ( $($lib:ident,)* ) => { $(
        #[doc(inline)]
        pub use $lib::{self, *};
    )* };
}
