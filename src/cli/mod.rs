/// CLI argument parsing and command handling - Gateway
mod args;
mod commands;

pub use args::{parse_param, Cli, Commands, OutputFormat};
pub use commands::{handle_command, resolve_config};
