//! Domain layer: commands and visibility rules.

pub mod commands;
pub mod visibility;
