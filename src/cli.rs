//! CLI domain: parse, route, and output only.
//! No domain orchestration; single route table dispatches to the tree service.

mod output;
mod parse;
mod route;

pub use output::{
    format_pending_text, format_roots_json, format_roots_text, format_witness_json, map_error,
};
pub use parse::{Cli, Commands};
pub use route::{resolve_config, RunContext};
