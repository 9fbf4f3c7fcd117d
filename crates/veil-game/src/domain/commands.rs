//! Commands issued by the game master (and by players logging in).

use uuid::Uuid;
use veil_core::ids::{ActionId, CharacterId, PlayerId};
use veil_core::model::{CharacterProfile, RevealedFields};

/// Command to create a character.
#[derive(Debug, Clone)]
pub struct CreateCharacter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The character's fields.
    pub profile: CharacterProfile,
}

/// Command to replace a character's fields. Ownership is untouched.
#[derive(Debug, Clone)]
pub struct UpdateCharacter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The character identifier.
    pub character_id: CharacterId,
    /// The new fields.
    pub profile: CharacterProfile,
}

/// Command to delete a character and everything attached to it.
#[derive(Debug, Clone)]
pub struct DeleteCharacter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The character identifier.
    pub character_id: CharacterId,
}

/// Command to assign a character to a player.
#[derive(Debug, Clone)]
pub struct AssignCharacter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The character identifier.
    pub character_id: CharacterId,
    /// The new owner.
    pub player_id: PlayerId,
}

/// Command to take a character away from its owner.
#[derive(Debug, Clone)]
pub struct UnassignCharacter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The character identifier.
    pub character_id: CharacterId,
}

/// Command to replace a character's per-field reveal flags.
#[derive(Debug, Clone)]
pub struct UpdateRevealedFields {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The new flags; `fields.character_id` selects the character.
    pub fields: RevealedFields,
}

/// Command to create a hidden action.
#[derive(Debug, Clone)]
pub struct CreateAction {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The character the action belongs to.
    pub character_id: CharacterId,
    /// The secret itself.
    pub content: String,
}

/// Command to rewrite an action's content.
#[derive(Debug, Clone)]
pub struct UpdateAction {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The action identifier.
    pub action_id: ActionId,
    /// The new content.
    pub content: String,
}

/// Command to delete an action.
#[derive(Debug, Clone)]
pub struct DeleteAction {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The action identifier.
    pub action_id: ActionId,
}

/// Command to show an action to its character's owner.
#[derive(Debug, Clone)]
pub struct RevealAction {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The action identifier.
    pub action_id: ActionId,
}

/// Command to take an action back from its character's owner.
#[derive(Debug, Clone)]
pub struct HideAction {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The action identifier.
    pub action_id: ActionId,
}

/// Command to create a player, or rename the caller's existing one.
#[derive(Debug, Clone)]
pub struct RegisterPlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's existing player, if they already have one.
    pub existing: Option<PlayerId>,
    /// The chosen display name.
    pub name: String,
}

/// Command to delete a player.
#[derive(Debug, Clone)]
pub struct DeletePlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player identifier.
    pub player_id: PlayerId,
}
