// CLI module
// Interactive chat and its slash commands

pub mod chat;
pub mod commands;

pub use chat::run_chat;
pub use commands::{format_stats, format_summary, handle_command, Command};
