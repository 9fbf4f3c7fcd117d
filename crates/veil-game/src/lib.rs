//! Veil Game — the game master's operations.
//!
//! Responsible for what each viewer may see (`domain::visibility`), the
//! assignment and reveal/hide transitions, and the snapshots pushed to
//! clients when they connect.

pub mod application;
pub mod domain;
