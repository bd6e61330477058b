//! CLI subcommand implementations.

pub mod categories;
pub mod log;
pub mod suggest;
pub mod summary;
pub mod track;
pub mod util;
