//! Chat transports and the operational command surface for Verdant.
//!
//! The full reason/act loop is for real questions. Commands (`!help`,
//! `!plants`, `!reminders`, `!clear`, `!weather <loc>`) are deterministic
//! shortcuts that dispatch straight into the memory store and tool
//! registry — thin plumbing, not agent logic.

pub mod cli;
pub mod commands;

pub use cli::CliChannel;
pub use commands::{Command, CommandDispatcher};
