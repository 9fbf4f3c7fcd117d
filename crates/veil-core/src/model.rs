//! Entity records owned by the data store.

use serde::{Deserialize, Serialize};

use crate::ids::{ActionId, CharacterId, PlayerId};

/// A player account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// The player identifier.
    pub id: PlayerId,
    /// Display name chosen at login.
    pub name: String,
}

/// The redactable fields of a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterProfile {
    /// The character's name.
    pub name: String,
    /// The character's race.
    pub race: String,
    /// The character's gender.
    pub gender: String,
    /// The character's age.
    pub age: String,
    /// Free-form background.
    pub description: String,
    /// What the character looks like.
    pub appearance: String,
}

/// A non-player character managed by the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// The character identifier.
    pub id: CharacterId,
    /// The redactable fields.
    #[serde(flatten)]
    pub profile: CharacterProfile,
    /// The player the character is assigned to, if any.
    pub owner_player_id: Option<PlayerId>,
}

/// Per-field reveal flags for one character. All false at creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct RevealedFields {
    /// The character these flags belong to.
    pub character_id: CharacterId,
    /// Whether `name` is revealed.
    #[serde(default)]
    pub name: bool,
    /// Whether `race` is revealed.
    #[serde(default)]
    pub race: bool,
    /// Whether `gender` is revealed.
    #[serde(default)]
    pub gender: bool,
    /// Whether `age` is revealed.
    #[serde(default)]
    pub age: bool,
    /// Whether `description` is revealed.
    #[serde(default)]
    pub description: bool,
    /// Whether `appearance` is revealed.
    #[serde(default)]
    pub appearance: bool,
}

impl RevealedFields {
    /// Flags with every field hidden.
    #[must_use]
    pub fn hidden(character_id: CharacterId) -> Self {
        Self {
            character_id,
            ..Self::default()
        }
    }

    /// Flags with every field revealed.
    #[must_use]
    pub fn all(character_id: CharacterId) -> Self {
        Self {
            character_id,
            name: true,
            race: true,
            gender: true,
            age: true,
            description: true,
            appearance: true,
        }
    }
}

/// A narrative secret attached to a character.
///
/// Actions carry no owner of their own: the owner is always the owning
/// character's `owner_player_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// The action identifier.
    pub id: ActionId,
    /// The character this action belongs to.
    pub character_id: CharacterId,
    /// The secret itself.
    pub content: String,
    /// Whether the owning player may see this action.
    pub revealed: bool,
}

/// Payload for creating an action. New actions start hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAction {
    /// The character the action belongs to.
    pub character_id: CharacterId,
    /// The secret itself.
    pub content: String,
}

/// A character together with its actions; the snapshot shape sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterWithActions {
    /// The character.
    #[serde(flatten)]
    pub character: Character,
    /// The character's actions, in id order.
    pub actions: Vec<Action>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_character_with_actions_serializes_flat_camel_case() {
        let snapshot = CharacterWithActions {
            character: Character {
                id: CharacterId(1),
                profile: CharacterProfile {
                    name: "Grak".to_owned(),
                    ..CharacterProfile::default()
                },
                owner_player_id: Some(PlayerId(7)),
            },
            actions: vec![Action {
                id: ActionId(2),
                character_id: CharacterId(1),
                content: "sneaks".to_owned(),
                revealed: true,
            }],
        };

        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["id"], json!(1));
        assert_eq!(value["name"], json!("Grak"));
        assert_eq!(value["race"], json!(""));
        assert_eq!(value["ownerPlayerId"], json!(7));
        assert_eq!(value["actions"][0]["characterId"], json!(1));
        assert_eq!(value["actions"][0]["revealed"], json!(true));
    }

    #[test]
    fn test_revealed_fields_default_to_hidden_when_omitted() {
        let fields: RevealedFields =
            serde_json::from_value(json!({ "characterId": 4, "name": true })).unwrap();

        assert_eq!(fields.character_id, CharacterId(4));
        assert!(fields.name);
        assert!(!fields.race && !fields.gender && !fields.age);
        assert!(!fields.description && !fields.appearance);
    }
}
