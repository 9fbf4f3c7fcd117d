//! Data store abstractions.
//!
//! Every call may fail with `DomainError::Store`; lookups of unknown ids fail
//! with `DomainError::NotFound`. Callers propagate both as-is.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::ids::{ActionId, CharacterId, PlayerId};
use crate::model::{Action, Character, CharacterProfile, NewAction, Player, RevealedFields};

/// Persistence for player records.
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Load one player.
    async fn get_player(&self, id: PlayerId) -> Result<Player, DomainError>;

    /// Load every player, ordered by id.
    async fn list_players(&self) -> Result<Vec<Player>, DomainError>;

    /// Create a player with the given display name.
    async fn create_player(&self, name: &str) -> Result<Player, DomainError>;

    /// Overwrite a player's display name.
    async fn update_player(&self, player: &Player) -> Result<Player, DomainError>;

    /// Delete a player. Characters owned by the player become unassigned.
    async fn delete_player(&self, id: PlayerId) -> Result<(), DomainError>;
}

/// Persistence for characters and their revealed-fields records.
#[async_trait]
pub trait CharacterRepository: Send + Sync {
    /// Load one character.
    async fn get_character(&self, id: CharacterId) -> Result<Character, DomainError>;

    /// Load every character, ordered by id.
    async fn list_characters(&self) -> Result<Vec<Character>, DomainError>;

    /// Load the characters assigned to a player, ordered by id.
    async fn list_characters_owned_by(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<Character>, DomainError>;

    /// Create an unassigned character together with its all-hidden
    /// revealed-fields record, atomically.
    async fn create_character(
        &self,
        profile: &CharacterProfile,
    ) -> Result<(Character, RevealedFields), DomainError>;

    /// Overwrite a character, including its owner.
    async fn update_character(&self, character: &Character) -> Result<Character, DomainError>;

    /// Delete a character with its revealed-fields record and its actions.
    async fn delete_character(&self, id: CharacterId) -> Result<(), DomainError>;

    /// Load a character's revealed-fields record.
    async fn get_revealed_fields(&self, id: CharacterId) -> Result<RevealedFields, DomainError>;

    /// Overwrite a character's revealed-fields record.
    async fn update_revealed_fields(
        &self,
        fields: &RevealedFields,
    ) -> Result<RevealedFields, DomainError>;
}

/// Persistence for actions.
#[async_trait]
pub trait ActionRepository: Send + Sync {
    /// Load one action.
    async fn get_action(&self, id: ActionId) -> Result<Action, DomainError>;

    /// Load a character's actions, ordered by id.
    async fn list_actions(&self, character_id: CharacterId) -> Result<Vec<Action>, DomainError>;

    /// Create a hidden action.
    async fn create_action(&self, action: &NewAction) -> Result<Action, DomainError>;

    /// Overwrite an action's content and revealed flag.
    async fn update_action(&self, action: &Action) -> Result<Action, DomainError>;

    /// Delete an action.
    async fn delete_action(&self, id: ActionId) -> Result<(), DomainError>;
}

/// The full data store: players, characters and actions.
pub trait Store: PlayerRepository + CharacterRepository + ActionRepository {}

impl<T> Store for T where T: PlayerRepository + CharacterRepository + ActionRepository {}
