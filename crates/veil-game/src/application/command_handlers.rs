//! Command handlers for the game master's operations.
//!
//! Every handler persists first and broadcasts after. The first store failure
//! short-circuits the handler, so a change that was not persisted is never
//! announced. Within one handler, messages are submitted in the order clients
//! must observe them: removals from a previous owner before additions for a
//! new one.

use tracing::{info, instrument};
use veil_core::error::{DomainError, InvalidTransition};
use veil_core::ids::{CharacterId, PlayerId};
use veil_core::model::{Action, Character, CharacterWithActions, NewAction, Player};
use veil_core::repository::Store;
use veil_core::viewer::Viewer;
use veil_stream::Broadcaster;
use veil_stream::messages::{CharacterWithFields, Message};

use crate::domain::commands::{
    AssignCharacter, CreateAction, CreateCharacter, DeleteAction, DeleteCharacter, DeletePlayer,
    HideAction, RegisterPlayer, RevealAction, UnassignCharacter, UpdateAction, UpdateCharacter,
    UpdateRevealedFields,
};
use crate::domain::visibility::view_for;

fn require_text(value: &str, what: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{what} must not be empty")));
    }
    Ok(())
}

async fn load_snapshot(
    store: &dyn Store,
    character: Character,
) -> Result<CharacterWithActions, DomainError> {
    let actions = store.list_actions(character.id).await?;
    Ok(CharacterWithActions { character, actions })
}

/// Hides every revealed action of a character, announcing each one as soon
/// as it is persisted. Returns all of the character's actions after the
/// change, and how many were hidden.
async fn hide_revealed_actions(
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
    character_id: CharacterId,
    owner: Option<PlayerId>,
) -> Result<(Vec<Action>, usize), DomainError> {
    let mut actions = store.list_actions(character_id).await?;
    let mut hidden = 0;
    for action in &mut actions {
        if action.revealed {
            action.revealed = false;
            *action = store.update_action(action).await?;
            announce_hidden(broadcaster, owner, action).await;
            hidden += 1;
        }
    }
    Ok((actions, hidden))
}

/// Announces a hidden action: the full action to the administrator, a
/// deletion to the owner who could see it.
async fn announce_hidden(broadcaster: &dyn Broadcaster, owner: Option<PlayerId>, action: &Action) {
    broadcaster
        .send(Viewer::Admin, Message::Action(action.clone()))
        .await;
    if let Some(owner) = owner {
        broadcaster
            .send(Viewer::Player(owner), Message::DeleteAction(action.id))
            .await;
    }
}

/// Sends a character to its owner, redacted, if it has one.
async fn send_to_owner(
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
    snapshot: &CharacterWithActions,
) -> Result<(), DomainError> {
    let Some(owner) = snapshot.character.owner_player_id else {
        return Ok(());
    };
    let fields = store.get_revealed_fields(snapshot.character.id).await?;
    let viewer = Viewer::Player(owner);
    broadcaster
        .send(viewer, Message::Character(view_for(snapshot, &fields, viewer)))
        .await;
    Ok(())
}

/// Unassigns a character that is known to be assigned to `previous`.
async fn unassign(
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
    mut character: Character,
    previous: PlayerId,
) -> Result<CharacterWithActions, DomainError> {
    let (actions, hidden) =
        hide_revealed_actions(store, broadcaster, character.id, Some(previous)).await?;
    character.owner_player_id = None;
    let character = store.update_character(&character).await?;
    info!(
        character_id = %character.id,
        previous_owner = %previous,
        hidden,
        "character unassigned"
    );

    let snapshot = CharacterWithActions { character, actions };
    broadcaster
        .send(
            Viewer::Player(previous),
            Message::DeleteCharacter(snapshot.character.id),
        )
        .await;
    broadcaster
        .send(Viewer::Admin, Message::Character(snapshot.clone()))
        .await;
    Ok(snapshot)
}

/// Handles the `CreateCharacter` command: creates the character with all
/// fields hidden and shows it to the administrator.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the name is blank, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id))]
pub async fn handle_create_character(
    command: &CreateCharacter,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<CharacterWithFields, DomainError> {
    require_text(&command.profile.name, "character name")?;

    let (character, fields) = store.create_character(&command.profile).await?;
    info!(character_id = %character.id, "character created");

    let created = CharacterWithFields {
        character: CharacterWithActions {
            character,
            actions: Vec::new(),
        },
        fields,
    };
    broadcaster
        .send(Viewer::Admin, Message::CharacterWithFields(created.clone()))
        .await;
    Ok(created)
}

/// Handles the `UpdateCharacter` command: replaces the profile and
/// rebroadcasts the character (full to the administrator, redacted to its
/// owner).
///
/// # Errors
///
/// Returns `DomainError::Validation` if the name is blank,
/// `DomainError::NotFound` if the character does not exist, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, character_id = %command.character_id))]
pub async fn handle_update_character(
    command: &UpdateCharacter,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<CharacterWithActions, DomainError> {
    require_text(&command.profile.name, "character name")?;

    let existing = store.get_character(command.character_id).await?;
    let character = store
        .update_character(&Character {
            id: existing.id,
            profile: command.profile.clone(),
            owner_player_id: existing.owner_player_id,
        })
        .await?;
    let snapshot = load_snapshot(store, character).await?;
    info!("character updated");

    broadcaster
        .send(Viewer::Admin, Message::Character(snapshot.clone()))
        .await;
    send_to_owner(store, broadcaster, &snapshot).await?;
    Ok(snapshot)
}

/// Handles the `DeleteCharacter` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the character does not exist, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, character_id = %command.character_id))]
pub async fn handle_delete_character(
    command: &DeleteCharacter,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<(), DomainError> {
    let character = store.get_character(command.character_id).await?;
    store.delete_character(character.id).await?;
    info!("character deleted");

    broadcaster
        .send(Viewer::Admin, Message::DeleteCharacter(character.id))
        .await;
    if let Some(owner) = character.owner_player_id {
        broadcaster
            .send(Viewer::Player(owner), Message::DeleteCharacter(character.id))
            .await;
    }
    Ok(())
}

/// Handles the `AssignCharacter` command.
///
/// Revealed actions are hidden first, so nothing a previous owner was shown
/// carries over to the new owner. The previous owner is told the character
/// is gone before the new owner receives it.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the character or player does not exist,
/// `DomainError::InvalidState` if the character is already assigned to this
/// player, or `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(
    correlation_id = %command.correlation_id,
    character_id = %command.character_id,
    player_id = %command.player_id,
))]
pub async fn handle_assign_character(
    command: &AssignCharacter,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<CharacterWithActions, DomainError> {
    let mut character = store.get_character(command.character_id).await?;
    store.get_player(command.player_id).await?;

    if character.owner_player_id == Some(command.player_id) {
        return Err(InvalidTransition::AlreadyAssigned {
            character_id: character.id,
            player_id: command.player_id,
        }
        .into());
    }

    let previous = character.owner_player_id;
    let fields = store.get_revealed_fields(character.id).await?;
    let (actions, hidden) =
        hide_revealed_actions(store, broadcaster, character.id, previous).await?;
    character.owner_player_id = Some(command.player_id);
    let character = store.update_character(&character).await?;
    info!(previous_owner = ?previous, hidden, "character assigned");

    let snapshot = CharacterWithActions { character, actions };
    if let Some(previous) = previous {
        broadcaster
            .send(
                Viewer::Player(previous),
                Message::DeleteCharacter(snapshot.character.id),
            )
            .await;
    }
    broadcaster
        .send(Viewer::Admin, Message::Character(snapshot.clone()))
        .await;
    let owner = Viewer::Player(command.player_id);
    broadcaster
        .send(owner, Message::Character(view_for(&snapshot, &fields, owner)))
        .await;
    Ok(snapshot)
}

/// Handles the `UnassignCharacter` command: clears the owner and hides every
/// revealed action.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the character does not exist,
/// `DomainError::InvalidState` if it is not assigned, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, character_id = %command.character_id))]
pub async fn handle_unassign_character(
    command: &UnassignCharacter,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<CharacterWithActions, DomainError> {
    let character = store.get_character(command.character_id).await?;
    let Some(previous) = character.owner_player_id else {
        return Err(InvalidTransition::NotAssigned(character.id).into());
    };
    unassign(store, broadcaster, character, previous).await
}

/// Handles the `UpdateRevealedFields` command: persists the flags, then
/// rebroadcasts the character to the administrator (with its flags) and,
/// redacted, to its owner.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the character does not exist, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, character_id = %command.fields.character_id))]
pub async fn handle_update_revealed_fields(
    command: &UpdateRevealedFields,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<CharacterWithFields, DomainError> {
    let character = store.get_character(command.fields.character_id).await?;
    let fields = store.update_revealed_fields(&command.fields).await?;
    let snapshot = load_snapshot(store, character).await?;
    info!(revealed = ?fields, "revealed fields updated");

    let updated = CharacterWithFields {
        character: snapshot,
        fields,
    };
    broadcaster
        .send(Viewer::Admin, Message::CharacterWithFields(updated.clone()))
        .await;
    if let Some(owner) = updated.character.character.owner_player_id {
        let viewer = Viewer::Player(owner);
        broadcaster
            .send(
                viewer,
                Message::Character(view_for(&updated.character, &fields, viewer)),
            )
            .await;
    }
    Ok(updated)
}

/// Handles the `CreateAction` command. New actions are hidden, so only the
/// administrator hears about them.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the content is blank,
/// `DomainError::NotFound` if the character does not exist, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, character_id = %command.character_id))]
pub async fn handle_create_action(
    command: &CreateAction,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<Action, DomainError> {
    require_text(&command.content, "action content")?;

    let character = store.get_character(command.character_id).await?;
    let action = store
        .create_action(&NewAction {
            character_id: character.id,
            content: command.content.clone(),
        })
        .await?;
    info!(action_id = %action.id, "action created");

    broadcaster
        .send(Viewer::Admin, Message::Action(action.clone()))
        .await;
    Ok(action)
}

/// Handles the `UpdateAction` command. The owner hears about it only if the
/// action is revealed.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the content is blank,
/// `DomainError::NotFound` if the action does not exist, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, action_id = %command.action_id))]
pub async fn handle_update_action(
    command: &UpdateAction,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<Action, DomainError> {
    require_text(&command.content, "action content")?;

    let mut action = store.get_action(command.action_id).await?;
    let character = store.get_character(action.character_id).await?;
    action.content.clone_from(&command.content);
    let action = store.update_action(&action).await?;
    info!("action updated");

    broadcaster
        .send(Viewer::Admin, Message::Action(action.clone()))
        .await;
    if let (true, Some(owner)) = (action.revealed, character.owner_player_id) {
        broadcaster
            .send(Viewer::Player(owner), Message::Action(action.clone()))
            .await;
    }
    Ok(action)
}

/// Handles the `DeleteAction` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the action does not exist, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, action_id = %command.action_id))]
pub async fn handle_delete_action(
    command: &DeleteAction,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<(), DomainError> {
    let action = store.get_action(command.action_id).await?;
    let character = store.get_character(action.character_id).await?;
    store.delete_action(action.id).await?;
    info!("action deleted");

    broadcaster
        .send(Viewer::Admin, Message::DeleteAction(action.id))
        .await;
    if let (true, Some(owner)) = (action.revealed, character.owner_player_id) {
        broadcaster
            .send(Viewer::Player(owner), Message::DeleteAction(action.id))
            .await;
    }
    Ok(())
}

/// Handles the `RevealAction` command: the full action goes to the
/// administrator and to the owning player.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the action or its character does not
/// exist, `DomainError::InvalidState` if the character is unassigned or the
/// action is already revealed, or `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, action_id = %command.action_id))]
pub async fn handle_reveal_action(
    command: &RevealAction,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<Action, DomainError> {
    let mut action = store.get_action(command.action_id).await?;
    let character = store.get_character(action.character_id).await?;
    let Some(owner) = character.owner_player_id else {
        return Err(InvalidTransition::CharacterNotAssigned {
            action_id: action.id,
            character_id: character.id,
        }
        .into());
    };
    if action.revealed {
        return Err(InvalidTransition::AlreadyRevealed(action.id).into());
    }

    action.revealed = true;
    let action = store.update_action(&action).await?;
    info!(owner = %owner, "action revealed");

    broadcaster
        .send(Viewer::Admin, Message::Action(action.clone()))
        .await;
    broadcaster
        .send(Viewer::Player(owner), Message::Action(action.clone()))
        .await;
    Ok(action)
}

/// Handles the `HideAction` command. The administrator receives the full
/// action; the owner is told it was deleted and never sees its content again.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the action or its character does not
/// exist, `DomainError::InvalidState` if the action is already hidden, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, action_id = %command.action_id))]
pub async fn handle_hide_action(
    command: &HideAction,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<Action, DomainError> {
    let mut action = store.get_action(command.action_id).await?;
    if !action.revealed {
        return Err(InvalidTransition::AlreadyHidden(action.id).into());
    }
    let character = store.get_character(action.character_id).await?;

    action.revealed = false;
    let action = store.update_action(&action).await?;
    info!("action hidden");

    announce_hidden(broadcaster, character.owner_player_id, &action).await;
    Ok(action)
}

/// Handles the `RegisterPlayer` command: renames the caller's player if it
/// still exists, otherwise creates a new one.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the name is blank, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, existing = ?command.existing))]
pub async fn handle_register_player(
    command: &RegisterPlayer,
    store: &dyn Store,
) -> Result<Player, DomainError> {
    require_text(&command.name, "player name")?;
    let name = command.name.trim();

    if let Some(id) = command.existing {
        match store.get_player(id).await {
            Ok(_) => {
                let player = store
                    .update_player(&Player {
                        id,
                        name: name.to_owned(),
                    })
                    .await?;
                info!(player_id = %player.id, "player renamed");
                return Ok(player);
            }
            Err(DomainError::NotFound { .. }) => {}
            Err(err) => return Err(err),
        }
    }

    let player = store.create_player(name).await?;
    info!(player_id = %player.id, "player created");
    Ok(player)
}

/// Handles the `DeletePlayer` command: unassigns every character the player
/// owns (with the full unassign cascade), then deletes the player.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the player does not exist, or
/// `DomainError::Store` if persistence fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, player_id = %command.player_id))]
pub async fn handle_delete_player(
    command: &DeletePlayer,
    store: &dyn Store,
    broadcaster: &dyn Broadcaster,
) -> Result<(), DomainError> {
    let player = store.get_player(command.player_id).await?;
    for character in store.list_characters_owned_by(player.id).await? {
        unassign(store, broadcaster, character, player.id).await?;
    }
    store.delete_player(player.id).await?;
    info!("player deleted");

    broadcaster
        .send(Viewer::Admin, Message::DeletePlayer(player.id))
        .await;
    Ok(())
}
