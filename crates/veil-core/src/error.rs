//! Domain error types.

use std::fmt;

use thiserror::Error;

use crate::ids::{ActionId, CharacterId, PlayerId};

/// The kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A player record.
    Player,
    /// A character record.
    Character,
    /// A character's revealed-fields record.
    RevealedFields,
    /// An action record.
    Action,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Player => "player",
            Self::Character => "character",
            Self::RevealedFields => "revealed fields",
            Self::Action => "action",
        })
    }
}

/// A state-machine transition that is not valid for the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTransition {
    /// The character is already assigned to this player.
    #[error("character {character_id} is already assigned to player {player_id}")]
    AlreadyAssigned {
        /// The character.
        character_id: CharacterId,
        /// The player it is already assigned to.
        player_id: PlayerId,
    },

    /// The character is not assigned to anyone.
    #[error("character {0} is not assigned to a player")]
    NotAssigned(CharacterId),

    /// An action cannot be revealed because its character has no owner.
    #[error("action {action_id} cannot be revealed: character {character_id} is not assigned")]
    CharacterNotAssigned {
        /// The action.
        action_id: ActionId,
        /// Its unowned character.
        character_id: CharacterId,
    },

    /// The action is already revealed.
    #[error("action {0} is already revealed")]
    AlreadyRevealed(ActionId),

    /// The action is already hidden.
    #[error("action {0} is already hidden")]
    AlreadyHidden(ActionId),
}

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An entity id unknown to the data store.
    #[error("{kind} {id} not found")]
    NotFound {
        /// What was looked up.
        kind: EntityKind,
        /// The raw id that was looked up.
        id: i64,
    },

    /// The operation is not valid for the current assignment/reveal state.
    #[error("invalid state: {0}")]
    InvalidState(#[from] InvalidTransition),

    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persistence failure.
    #[error("store error: {0}")]
    Store(String),
}

impl DomainError {
    /// Shorthand for a missing player.
    #[must_use]
    pub fn player_not_found(id: PlayerId) -> Self {
        Self::NotFound {
            kind: EntityKind::Player,
            id: id.get(),
        }
    }

    /// Shorthand for a missing character.
    #[must_use]
    pub fn character_not_found(id: CharacterId) -> Self {
        Self::NotFound {
            kind: EntityKind::Character,
            id: id.get(),
        }
    }

    /// Shorthand for a missing revealed-fields record.
    #[must_use]
    pub fn fields_not_found(id: CharacterId) -> Self {
        Self::NotFound {
            kind: EntityKind::RevealedFields,
            id: id.get(),
        }
    }

    /// Shorthand for a missing action.
    #[must_use]
    pub fn action_not_found(id: ActionId) -> Self {
        Self::NotFound {
            kind: EntityKind::Action,
            id: id.get(),
        }
    }
}
