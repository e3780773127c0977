//! Basis-term exponent tuples and their canonical enumeration.
//!
//! Every short-range term is identified by its position in a canonical enumeration of
//! exponent tuples `(k, l, m, n, p, q)` whose sum is bounded by `omega`. Two orderings
//! are supported through the [`TermEnumerator`] trait, and the [`PowerTable`] carries a
//! symmetry-partner half for non-S-wave runs.

pub mod enumerator;
pub mod power_table;
pub mod term;

pub use enumerator::{NestedEnumerator, ShellEnumerator, TermEnumerator, TermOrdering};
pub use power_table::{PowerTable, SplitTables, leading_range, table_size};
pub use term::{BasisTerm, NonlinearParams, QiClass};
