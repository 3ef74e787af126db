pub mod commands;
pub mod output;

pub use commands::{execute, CliCommand};
pub use output::print_json;
