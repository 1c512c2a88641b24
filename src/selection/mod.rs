//! Requested-field trees and the helpers used to inspect and extend them.

pub mod depends_on;
pub mod errors;
pub mod resolve_tree;

pub use depends_on::{parse_selection_set, SelectionField};
pub use errors::SelectionError;
pub use resolve_tree::{
    args_equal, check_args, merge_selection, reconcile_arguments, resolve_aliased_by_name,
    resolve_by_name, selection_from, synthesize_missing, Arguments, ResolveTree, Selection,
};
