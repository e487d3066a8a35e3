//! CLI command handlers. Each command is in its own file.

mod completions;
mod defaults;
mod run;
mod schedule;

pub use completions::{run_completions, run_man};
pub use defaults::run_defaults;
#[cfg(test)]
pub(crate) use run::run_options;
pub use run::{run_retry, RunArgs};
pub use schedule::run_schedule;
