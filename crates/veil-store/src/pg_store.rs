//! `PostgreSQL` implementation of the repository traits.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;
use veil_core::error::DomainError;
use veil_core::ids::{ActionId, CharacterId, PlayerId};
use veil_core::model::{Action, Character, CharacterProfile, NewAction, Player, RevealedFields};
use veil_core::repository::{ActionRepository, CharacterRepository, PlayerRepository};

use crate::rows::{ActionRow, CharacterRow, PlayerRow, RevealedFieldsRow};

const CHARACTER_COLUMNS: &str =
    "id, name, race, gender, age, description, appearance, owner_player_id";
const FIELDS_COLUMNS: &str = "character_id, name, race, gender, age, description, appearance";

fn store_error(err: sqlx::Error) -> DomainError {
    error!(error = %err, "database query failed");
    DomainError::Store(err.to_string())
}

fn expect_one(rows_affected: u64, missing: impl FnOnce() -> DomainError) -> Result<(), DomainError> {
    if rows_affected == 0 {
        Err(missing())
    } else {
        Ok(())
    }
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerRepository for PgStore {
    async fn get_player(&self, id: PlayerId) -> Result<Player, DomainError> {
        sqlx::query_as::<_, PlayerRow>("SELECT id, name FROM players WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(Player::from)
            .ok_or_else(|| DomainError::player_not_found(id))
    }

    async fn list_players(&self) -> Result<Vec<Player>, DomainError> {
        let rows = sqlx::query_as::<_, PlayerRow>("SELECT id, name FROM players ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Player::from).collect())
    }

    async fn create_player(&self, name: &str) -> Result<Player, DomainError> {
        sqlx::query_as::<_, PlayerRow>("INSERT INTO players (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map(Player::from)
            .map_err(store_error)
    }

    async fn update_player(&self, player: &Player) -> Result<Player, DomainError> {
        sqlx::query_as::<_, PlayerRow>(
            "UPDATE players SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(player.id.get())
        .bind(&player.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(Player::from)
        .ok_or_else(|| DomainError::player_not_found(player.id))
    }

    async fn delete_player(&self, id: PlayerId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        expect_one(result.rows_affected(), || DomainError::player_not_found(id))
    }
}

#[async_trait]
impl CharacterRepository for PgStore {
    async fn get_character(&self, id: CharacterId) -> Result<Character, DomainError> {
        sqlx::query_as::<_, CharacterRow>(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(Character::from)
        .ok_or_else(|| DomainError::character_not_found(id))
    }

    async fn list_characters(&self) -> Result<Vec<Character>, DomainError> {
        let rows = sqlx::query_as::<_, CharacterRow>(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(rows.into_iter().map(Character::from).collect())
    }

    async fn list_characters_owned_by(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<Character>, DomainError> {
        let rows = sqlx::query_as::<_, CharacterRow>(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE owner_player_id = $1 ORDER BY id"
        ))
        .bind(player_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(rows.into_iter().map(Character::from).collect())
    }

    async fn create_character(
        &self,
        profile: &CharacterProfile,
    ) -> Result<(Character, RevealedFields), DomainError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let character: Character = sqlx::query_as::<_, CharacterRow>(&format!(
            "INSERT INTO characters (name, race, gender, age, description, appearance) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CHARACTER_COLUMNS}"
        ))
        .bind(&profile.name)
        .bind(&profile.race)
        .bind(&profile.gender)
        .bind(&profile.age)
        .bind(&profile.description)
        .bind(&profile.appearance)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?
        .into();

        let fields: RevealedFields = sqlx::query_as::<_, RevealedFieldsRow>(&format!(
            "INSERT INTO character_revealed_fields (character_id) VALUES ($1) \
             RETURNING {FIELDS_COLUMNS}"
        ))
        .bind(character.id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?
        .into();

        tx.commit().await.map_err(store_error)?;
        Ok((character, fields))
    }

    async fn update_character(&self, character: &Character) -> Result<Character, DomainError> {
        let profile = &character.profile;
        sqlx::query_as::<_, CharacterRow>(&format!(
            "UPDATE characters SET name = $2, race = $3, gender = $4, age = $5, \
             description = $6, appearance = $7, owner_player_id = $8 \
             WHERE id = $1 RETURNING {CHARACTER_COLUMNS}"
        ))
        .bind(character.id.get())
        .bind(&profile.name)
        .bind(&profile.race)
        .bind(&profile.gender)
        .bind(&profile.age)
        .bind(&profile.description)
        .bind(&profile.appearance)
        .bind(character.owner_player_id.map(PlayerId::get))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(Character::from)
        .ok_or_else(|| DomainError::character_not_found(character.id))
    }

    async fn delete_character(&self, id: CharacterId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM characters WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        expect_one(result.rows_affected(), || DomainError::character_not_found(id))
    }

    async fn get_revealed_fields(&self, id: CharacterId) -> Result<RevealedFields, DomainError> {
        sqlx::query_as::<_, RevealedFieldsRow>(&format!(
            "SELECT {FIELDS_COLUMNS} FROM character_revealed_fields WHERE character_id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(RevealedFields::from)
        .ok_or_else(|| DomainError::fields_not_found(id))
    }

    async fn update_revealed_fields(
        &self,
        fields: &RevealedFields,
    ) -> Result<RevealedFields, DomainError> {
        sqlx::query_as::<_, RevealedFieldsRow>(&format!(
            "UPDATE character_revealed_fields SET name = $2, race = $3, gender = $4, \
             age = $5, description = $6, appearance = $7 \
             WHERE character_id = $1 RETURNING {FIELDS_COLUMNS}"
        ))
        .bind(fields.character_id.get())
        .bind(fields.name)
        .bind(fields.race)
        .bind(fields.gender)
        .bind(fields.age)
        .bind(fields.description)
        .bind(fields.appearance)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(RevealedFields::from)
        .ok_or_else(|| DomainError::fields_not_found(fields.character_id))
    }
}

#[async_trait]
impl ActionRepository for PgStore {
    async fn get_action(&self, id: ActionId) -> Result<Action, DomainError> {
        sqlx::query_as::<_, ActionRow>(
            "SELECT id, character_id, content, revealed FROM actions WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(Action::from)
        .ok_or_else(|| DomainError::action_not_found(id))
    }

    async fn list_actions(&self, character_id: CharacterId) -> Result<Vec<Action>, DomainError> {
        let rows = sqlx::query_as::<_, ActionRow>(
            "SELECT id, character_id, content, revealed FROM actions \
             WHERE character_id = $1 ORDER BY id",
        )
        .bind(character_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(rows.into_iter().map(Action::from).collect())
    }

    async fn create_action(&self, action: &NewAction) -> Result<Action, DomainError> {
        sqlx::query_as::<_, ActionRow>(
            "INSERT INTO actions (character_id, content) VALUES ($1, $2) \
             RETURNING id, character_id, content, revealed",
        )
        .bind(action.character_id.get())
        .bind(&action.content)
        .fetch_one(&self.pool)
        .await
        .map(Action::from)
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                DomainError::character_not_found(action.character_id)
            }
            _ => store_error(err),
        })
    }

    async fn update_action(&self, action: &Action) -> Result<Action, DomainError> {
        sqlx::query_as::<_, ActionRow>(
            "UPDATE actions SET content = $2, revealed = $3 WHERE id = $1 \
             RETURNING id, character_id, content, revealed",
        )
        .bind(action.id.get())
        .bind(&action.content)
        .bind(action.revealed)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?
        .map(Action::from)
        .ok_or_else(|| DomainError::action_not_found(action.id))
    }

    async fn delete_action(&self, id: ActionId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM actions WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        expect_one(result.rows_affected(), || DomainError::action_not_found(id))
    }
}
