//! CLI command handlers.

mod run;
mod validate;

pub use run::{run_merge, MergeArgs};
pub use validate::run_validate;
