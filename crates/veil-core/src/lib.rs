//! Veil Core — shared domain abstractions.
//!
//! This crate defines the identifiers, entity records, viewer roles, error
//! type and data store traits that every other crate depends on. It contains
//! no infrastructure code.

pub mod error;
pub mod ids;
pub mod model;
pub mod repository;
pub mod viewer;
