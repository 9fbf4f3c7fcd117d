//! The closed set of messages pushed to connected clients.
//!
//! Every message serializes as `{ "type": <tag>, "data": <payload> }`, where
//! the shape of `data` is fixed per tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use veil_core::ids::{ActionId, CharacterId, PlayerId};
use veil_core::model::{Action, CharacterWithActions, Player, RevealedFields};

/// A player together with their online status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    /// The player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Whether the player currently has a live stream.
    pub is_online: bool,
    /// When the live stream was opened, if online.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_since: Option<DateTime<Utc>>,
}

/// A full character plus its reveal flags. Administrator only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterWithFields {
    /// The unredacted character.
    pub character: CharacterWithActions,
    /// Its reveal flags.
    pub fields: RevealedFields,
}

/// Initial snapshot for the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitAdminData {
    /// Every player with online status.
    pub players: Vec<PlayerStatus>,
    /// Every character, unredacted, with all actions.
    pub characters: Vec<CharacterWithActions>,
    /// Reveal flags for every character.
    pub fields: Vec<RevealedFields>,
}

/// A message delivered over a client's stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum Message {
    /// A character snapshot: full for the administrator, redacted for players.
    Character(CharacterWithActions),
    /// A full character with its reveal flags.
    CharacterWithFields(CharacterWithFields),
    /// An action snapshot.
    Action(Action),
    /// The character is gone from the recipient's view.
    DeleteCharacter(CharacterId),
    /// The action is gone from the recipient's view.
    DeleteAction(ActionId),
    /// The player was deleted.
    DeletePlayer(PlayerId),
    /// A player's owned characters, redacted.
    InitPlayer(Vec<CharacterWithActions>),
    /// The administrator's full snapshot.
    InitAdmin(InitAdminData),
    /// A player opened a stream.
    PlayerConnected(Player),
    /// A player's stream closed.
    PlayerDisconnected(PlayerId),
}

impl Message {
    /// The wire tag of this message.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Character(_) => "character",
            Self::CharacterWithFields(_) => "character-with-fields",
            Self::Action(_) => "action",
            Self::DeleteCharacter(_) => "delete-character",
            Self::DeleteAction(_) => "delete-action",
            Self::DeletePlayer(_) => "delete-player",
            Self::InitPlayer(_) => "init-player",
            Self::InitAdmin(_) => "init-admin",
            Self::PlayerConnected(_) => "player-connected",
            Self::PlayerDisconnected(_) => "player-disconnected",
        }
    }
}
