//! Read-side queries: initial snapshots and administrator listings.

use std::collections::HashMap;

use tracing::instrument;
use veil_core::error::DomainError;
use veil_core::ids::PlayerId;
use veil_core::model::{Character, CharacterWithActions};
use veil_core::repository::Store;
use veil_core::viewer::Viewer;
use veil_stream::ClientInfo;
use veil_stream::messages::{CharacterWithFields, InitAdminData, PlayerStatus};

use crate::domain::visibility::view_for;

async fn with_actions(
    store: &dyn Store,
    character: Character,
) -> Result<CharacterWithActions, DomainError> {
    let actions = store.list_actions(character.id).await?;
    Ok(CharacterWithActions { character, actions })
}

/// The characters assigned to a player, each redacted and filtered for them.
///
/// # Errors
///
/// Returns `DomainError::Store` if a lookup fails.
#[instrument(skip(store))]
pub async fn player_snapshot(
    store: &dyn Store,
    player_id: PlayerId,
) -> Result<Vec<CharacterWithActions>, DomainError> {
    let viewer = Viewer::Player(player_id);
    let mut snapshot = Vec::new();
    for character in store.list_characters_owned_by(player_id).await? {
        let fields = store.get_revealed_fields(character.id).await?;
        let full = with_actions(store, character).await?;
        snapshot.push(view_for(&full, &fields, viewer));
    }
    Ok(snapshot)
}

/// Every player, marked online if one of `online` is their live connection.
///
/// # Errors
///
/// Returns `DomainError::Store` if the lookup fails.
pub async fn list_players_with_status(
    store: &dyn Store,
    online: &[ClientInfo],
) -> Result<Vec<PlayerStatus>, DomainError> {
    let since: HashMap<PlayerId, _> = online
        .iter()
        .filter_map(|client| client.viewer.player_id().map(|id| (id, client.connected_at)))
        .collect();

    Ok(store
        .list_players()
        .await?
        .into_iter()
        .map(|player| {
            let online_since = since.get(&player.id).copied();
            PlayerStatus {
                id: player.id,
                name: player.name,
                is_online: online_since.is_some(),
                online_since,
            }
        })
        .collect())
}

/// Every character, unredacted, with its actions and reveal flags.
///
/// # Errors
///
/// Returns `DomainError::Store` if a lookup fails.
pub async fn list_characters(store: &dyn Store) -> Result<Vec<CharacterWithFields>, DomainError> {
    let mut characters = Vec::new();
    for character in store.list_characters().await? {
        let fields = store.get_revealed_fields(character.id).await?;
        characters.push(CharacterWithFields {
            character: with_actions(store, character).await?,
            fields,
        });
    }
    Ok(characters)
}

/// The administrator's initial snapshot.
///
/// # Errors
///
/// Returns `DomainError::Store` if a lookup fails.
#[instrument(skip_all, fields(online = online.len()))]
pub async fn admin_snapshot(
    store: &dyn Store,
    online: &[ClientInfo],
) -> Result<InitAdminData, DomainError> {
    let players = list_players_with_status(store, online).await?;
    let (characters, fields) = list_characters(store)
        .await?
        .into_iter()
        .map(|entry| (entry.character, entry.fields))
        .unzip();
    Ok(InitAdminData {
        players,
        characters,
        fields,
    })
}
