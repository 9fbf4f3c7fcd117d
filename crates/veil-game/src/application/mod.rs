//! Application layer: command handlers, query handlers and connection callbacks.

pub mod command_handlers;
pub mod presence;
pub mod query_handlers;
