//! Row shapes as they come out of `PostgreSQL`.

use sqlx::FromRow;
use veil_core::ids::{ActionId, CharacterId, PlayerId};
use veil_core::model::{Action, Character, CharacterProfile, Player, RevealedFields};

#[derive(Debug, FromRow)]
pub(crate) struct PlayerRow {
    id: i64,
    name: String,
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Self {
            id: PlayerId(row.id),
            name: row.name,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct CharacterRow {
    id: i64,
    name: String,
    race: String,
    gender: String,
    age: String,
    description: String,
    appearance: String,
    owner_player_id: Option<i64>,
}

impl From<CharacterRow> for Character {
    fn from(row: CharacterRow) -> Self {
        Self {
            id: CharacterId(row.id),
            profile: CharacterProfile {
                name: row.name,
                race: row.race,
                gender: row.gender,
                age: row.age,
                description: row.description,
                appearance: row.appearance,
            },
            owner_player_id: row.owner_player_id.map(PlayerId),
        }
    }
}

#[derive(Debug, FromRow)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct RevealedFieldsRow {
    character_id: i64,
    name: bool,
    race: bool,
    gender: bool,
    age: bool,
    description: bool,
    appearance: bool,
}

impl From<RevealedFieldsRow> for RevealedFields {
    fn from(row: RevealedFieldsRow) -> Self {
        Self {
            character_id: CharacterId(row.character_id),
            name: row.name,
            race: row.race,
            gender: row.gender,
            age: row.age,
            description: row.description,
            appearance: row.appearance,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ActionRow {
    id: i64,
    character_id: i64,
    content: String,
    revealed: bool,
}

impl From<ActionRow> for Action {
    fn from(row: ActionRow) -> Self {
        Self {
            id: ActionId(row.id),
            character_id: CharacterId(row.character_id),
            content: row.content,
            revealed: row.revealed,
        }
    }
}
