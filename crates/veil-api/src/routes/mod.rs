//! Route modules, one per resource.

pub mod actions;
pub mod auth;
pub mod characters;
pub mod health;
pub mod players;
pub mod stream;
