mod args;
pub mod canned;
mod repl;

pub use args::CliArgs;
pub use repl::{AppState, run_repl};
