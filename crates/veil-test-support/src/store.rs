//! Test stores: `Store` implementations backed by memory, or by nothing.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::oneshot;
use veil_core::error::DomainError;
use veil_core::ids::{ActionId, CharacterId, PlayerId};
use veil_core::model::{Action, Character, CharacterProfile, NewAction, Player, RevealedFields};
use veil_core::repository::{ActionRepository, CharacterRepository, PlayerRepository};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    players: BTreeMap<PlayerId, Player>,
    characters: BTreeMap<CharacterId, Character>,
    fields: BTreeMap<CharacterId, RevealedFields>,
    actions: BTreeMap<ActionId, Action>,
}

impl State {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A store holding everything in memory, with the same cascade rules as the
/// database schema: deleting a character removes its flags and actions,
/// deleting a player unassigns their characters.
///
/// Ids are allocated from one counter shared by every entity kind, so an id
/// never identifies two records.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    fail_writes: AtomicBool,
    write_budget: Mutex<Option<usize>>,
    paused_list: Mutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
}

/// Controls a `list_actions` call held open by
/// [`InMemoryStore::pause_next_list_actions`].
#[derive(Debug)]
pub struct PausedRead {
    /// Resolves once the call has read its actions and is waiting.
    pub reached: oneshot::Receiver<()>,
    /// Lets the call return what it read.
    pub release: oneshot::Sender<()>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// While enabled, every write fails with `DomainError::Store` and changes
    /// nothing. Reads keep working.
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Lets the next `writes` writes succeed and fails every one after.
    pub fn fail_writes_after(&self, writes: usize) {
        *self.write_budget.lock().unwrap() = Some(writes);
    }

    /// Makes the next `list_actions` call wait, after reading, until the
    /// returned `release` fires. Writes made meanwhile are not in its result.
    pub fn pause_next_list_actions(&self) -> PausedRead {
        let (reached_tx, reached) = oneshot::channel();
        let (release, release_rx) = oneshot::channel();
        *self.paused_list.lock().unwrap() = Some((reached_tx, release_rx));
        PausedRead { reached, release }
    }

    fn write(&self) -> Result<std::sync::MutexGuard<'_, State>, DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Store("write rejected".into()));
        }
        if let Some(remaining) = self.write_budget.lock().unwrap().as_mut() {
            if *remaining == 0 {
                return Err(DomainError::Store("write budget exhausted".into()));
            }
            *remaining -= 1;
        }
        Ok(self.read())
    }

    fn read(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl PlayerRepository for InMemoryStore {
    async fn get_player(&self, id: PlayerId) -> Result<Player, DomainError> {
        self.read()
            .players
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::player_not_found(id))
    }

    async fn list_players(&self) -> Result<Vec<Player>, DomainError> {
        Ok(self.read().players.values().cloned().collect())
    }

    async fn create_player(&self, name: &str) -> Result<Player, DomainError> {
        let mut state = self.write()?;
        let player = Player {
            id: PlayerId(state.allocate()),
            name: name.to_owned(),
        };
        state.players.insert(player.id, player.clone());
        Ok(player)
    }

    async fn update_player(&self, player: &Player) -> Result<Player, DomainError> {
        let mut state = self.write()?;
        let slot = state
            .players
            .get_mut(&player.id)
            .ok_or_else(|| DomainError::player_not_found(player.id))?;
        slot.clone_from(player);
        Ok(player.clone())
    }

    async fn delete_player(&self, id: PlayerId) -> Result<(), DomainError> {
        let mut state = self.write()?;
        state
            .players
            .remove(&id)
            .ok_or_else(|| DomainError::player_not_found(id))?;
        for character in state.characters.values_mut() {
            if character.owner_player_id == Some(id) {
                character.owner_player_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CharacterRepository for InMemoryStore {
    async fn get_character(&self, id: CharacterId) -> Result<Character, DomainError> {
        self.read()
            .characters
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::character_not_found(id))
    }

    async fn list_characters(&self) -> Result<Vec<Character>, DomainError> {
        Ok(self.read().characters.values().cloned().collect())
    }

    async fn list_characters_owned_by(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<Character>, DomainError> {
        Ok(self
            .read()
            .characters
            .values()
            .filter(|c| c.owner_player_id == Some(player_id))
            .cloned()
            .collect())
    }

    async fn create_character(
        &self,
        profile: &CharacterProfile,
    ) -> Result<(Character, RevealedFields), DomainError> {
        let mut state = self.write()?;
        let character = Character {
            id: CharacterId(state.allocate()),
            profile: profile.clone(),
            owner_player_id: None,
        };
        let fields = RevealedFields::hidden(character.id);
        state.characters.insert(character.id, character.clone());
        state.fields.insert(character.id, fields);
        Ok((character, fields))
    }

    async fn update_character(&self, character: &Character) -> Result<Character, DomainError> {
        let mut state = self.write()?;
        if let Some(owner) = character.owner_player_id
            && !state.players.contains_key(&owner)
        {
            return Err(DomainError::player_not_found(owner));
        }
        let slot = state
            .characters
            .get_mut(&character.id)
            .ok_or_else(|| DomainError::character_not_found(character.id))?;
        slot.clone_from(character);
        Ok(character.clone())
    }

    async fn delete_character(&self, id: CharacterId) -> Result<(), DomainError> {
        let mut state = self.write()?;
        state
            .characters
            .remove(&id)
            .ok_or_else(|| DomainError::character_not_found(id))?;
        state.fields.remove(&id);
        state.actions.retain(|_, action| action.character_id != id);
        Ok(())
    }

    async fn get_revealed_fields(&self, id: CharacterId) -> Result<RevealedFields, DomainError> {
        self.read()
            .fields
            .get(&id)
            .copied()
            .ok_or_else(|| DomainError::fields_not_found(id))
    }

    async fn update_revealed_fields(
        &self,
        fields: &RevealedFields,
    ) -> Result<RevealedFields, DomainError> {
        let mut state = self.write()?;
        let slot = state
            .fields
            .get_mut(&fields.character_id)
            .ok_or_else(|| DomainError::fields_not_found(fields.character_id))?;
        *slot = *fields;
        Ok(*fields)
    }
}

#[async_trait]
impl ActionRepository for InMemoryStore {
    async fn get_action(&self, id: ActionId) -> Result<Action, DomainError> {
        self.read()
            .actions
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::action_not_found(id))
    }

    async fn list_actions(&self, character_id: CharacterId) -> Result<Vec<Action>, DomainError> {
        let actions: Vec<Action> = self
            .read()
            .actions
            .values()
            .filter(|a| a.character_id == character_id)
            .cloned()
            .collect();
        let paused = self.paused_list.lock().unwrap().take();
        if let Some((reached, release)) = paused {
            let _ = reached.send(());
            let _ = release.await;
        }
        Ok(actions)
    }

    async fn create_action(&self, action: &NewAction) -> Result<Action, DomainError> {
        let mut state = self.write()?;
        if !state.characters.contains_key(&action.character_id) {
            return Err(DomainError::character_not_found(action.character_id));
        }
        let created = Action {
            id: ActionId(state.allocate()),
            character_id: action.character_id,
            content: action.content.clone(),
            revealed: false,
        };
        state.actions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_action(&self, action: &Action) -> Result<Action, DomainError> {
        let mut state = self.write()?;
        let slot = state
            .actions
            .get_mut(&action.id)
            .ok_or_else(|| DomainError::action_not_found(action.id))?;
        slot.clone_from(action);
        Ok(action.clone())
    }

    async fn delete_action(&self, id: ActionId) -> Result<(), DomainError> {
        self.write()?
            .actions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::action_not_found(id))
    }
}

/// A store that always returns an infrastructure error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingStore;

fn refused<T>() -> Result<T, DomainError> {
    Err(DomainError::Store("connection refused".into()))
}

#[async_trait]
impl PlayerRepository for FailingStore {
    async fn get_player(&self, _id: PlayerId) -> Result<Player, DomainError> {
        refused()
    }

    async fn list_players(&self) -> Result<Vec<Player>, DomainError> {
        refused()
    }

    async fn create_player(&self, _name: &str) -> Result<Player, DomainError> {
        refused()
    }

    async fn update_player(&self, _player: &Player) -> Result<Player, DomainError> {
        refused()
    }

    async fn delete_player(&self, _id: PlayerId) -> Result<(), DomainError> {
        refused()
    }
}

#[async_trait]
impl CharacterRepository for FailingStore {
    async fn get_character(&self, _id: CharacterId) -> Result<Character, DomainError> {
        refused()
    }

    async fn list_characters(&self) -> Result<Vec<Character>, DomainError> {
        refused()
    }

    async fn list_characters_owned_by(
        &self,
        _player_id: PlayerId,
    ) -> Result<Vec<Character>, DomainError> {
        refused()
    }

    async fn create_character(
        &self,
        _profile: &CharacterProfile,
    ) -> Result<(Character, RevealedFields), DomainError> {
        refused()
    }

    async fn update_character(&self, _character: &Character) -> Result<Character, DomainError> {
        refused()
    }

    async fn delete_character(&self, _id: CharacterId) -> Result<(), DomainError> {
        refused()
    }

    async fn get_revealed_fields(&self, _id: CharacterId) -> Result<RevealedFields, DomainError> {
        refused()
    }

    async fn update_revealed_fields(
        &self,
        _fields: &RevealedFields,
    ) -> Result<RevealedFields, DomainError> {
        refused()
    }
}

#[async_trait]
impl ActionRepository for FailingStore {
    async fn get_action(&self, _id: ActionId) -> Result<Action, DomainError> {
        refused()
    }

    async fn list_actions(&self, _character_id: CharacterId) -> Result<Vec<Action>, DomainError> {
        refused()
    }

    async fn create_action(&self, _action: &NewAction) -> Result<Action, DomainError> {
        refused()
    }

    async fn update_action(&self, _action: &Action) -> Result<Action, DomainError> {
        refused()
    }

    async fn delete_action(&self, _id: ActionId) -> Result<(), DomainError> {
        refused()
    }
}
