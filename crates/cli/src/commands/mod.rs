//! Command handlers for the Sahayak CLI.

mod chat;
mod search;
mod stats;

pub use chat::ChatCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;
