//! What a viewer is entitled to see.
//!
//! Pure functions: no store access, no side effects. Every broadcast and every
//! snapshot goes through them.

use veil_core::model::{Action, Character, CharacterProfile, CharacterWithActions, RevealedFields};
use veil_core::viewer::Viewer;

/// Clears every profile field whose reveal flag is false.
///
/// `id` and `owner_player_id` are never redacted.
#[must_use]
pub fn redact(character: &Character, fields: &RevealedFields) -> Character {
    let keep = |revealed: bool, value: &str| {
        if revealed {
            value.to_owned()
        } else {
            String::new()
        }
    };
    let profile = &character.profile;

    Character {
        id: character.id,
        profile: CharacterProfile {
            name: keep(fields.name, &profile.name),
            race: keep(fields.race, &profile.race),
            gender: keep(fields.gender, &profile.gender),
            age: keep(fields.age, &profile.age),
            description: keep(fields.description, &profile.description),
            appearance: keep(fields.appearance, &profile.appearance),
        },
        owner_player_id: character.owner_player_id,
    }
}

/// Filters `character`'s actions down to what `viewer` may see.
///
/// The administrator sees every action. A player sees only revealed actions
/// belonging to `character`, and only when `character` is assigned to them.
#[must_use]
pub fn filter_actions(actions: &[Action], character: &Character, viewer: Viewer) -> Vec<Action> {
    match viewer {
        Viewer::Admin => actions.to_vec(),
        Viewer::Player(player_id) => {
            if character.owner_player_id != Some(player_id) {
                return Vec::new();
            }
            actions
                .iter()
                .filter(|action| action.revealed && action.character_id == character.id)
                .cloned()
                .collect()
        }
    }
}

/// The snapshot of a character `viewer` is entitled to: the full record for
/// the administrator, the redacted record with visible actions for a player.
#[must_use]
pub fn view_for(
    snapshot: &CharacterWithActions,
    fields: &RevealedFields,
    viewer: Viewer,
) -> CharacterWithActions {
    let character = match viewer {
        Viewer::Admin => snapshot.character.clone(),
        Viewer::Player(_) => redact(&snapshot.character, fields),
    };
    CharacterWithActions {
        actions: filter_actions(&snapshot.actions, &snapshot.character, viewer),
        character,
    }
}

#[cfg(test)]
mod tests {
    use veil_core::ids::{ActionId, CharacterId, PlayerId};

    use super::*;

    fn grak(owner: Option<PlayerId>) -> Character {
        Character {
            id: CharacterId(1),
            profile: CharacterProfile {
                name: "Grak".to_owned(),
                race: "Orc".to_owned(),
                gender: "Male".to_owned(),
                age: "40".to_owned(),
                description: "Smells of smoke".to_owned(),
                appearance: "Scarred".to_owned(),
            },
            owner_player_id: owner,
        }
    }

    fn action(id: i64, revealed: bool) -> Action {
        Action {
            id: ActionId(id),
            character_id: CharacterId(1),
            content: format!("secret {id}"),
            revealed,
        }
    }

    #[test]
    fn test_redact_with_all_flags_false_clears_every_profile_field() {
        // Arrange
        let character = grak(Some(PlayerId(7)));

        // Act
        let redacted = redact(&character, &RevealedFields::hidden(CharacterId(1)));

        // Assert
        assert_eq!(redacted.id, character.id);
        assert_eq!(redacted.owner_player_id, Some(PlayerId(7)));
        assert_eq!(redacted.profile, CharacterProfile::default());
    }

    #[test]
    fn test_redact_with_all_flags_true_is_identity() {
        // Arrange
        let character = grak(None);

        // Act
        let redacted = redact(&character, &RevealedFields::all(CharacterId(1)));

        // Assert
        assert_eq!(redacted, character);
    }

    #[test]
    fn test_redact_keeps_only_flagged_fields() {
        // Arrange
        let character = grak(Some(PlayerId(7)));
        let fields = RevealedFields {
            name: true,
            appearance: true,
            ..RevealedFields::hidden(CharacterId(1))
        };

        // Act
        let redacted = redact(&character, &fields);

        // Assert
        assert_eq!(redacted.profile.name, "Grak");
        assert_eq!(redacted.profile.appearance, "Scarred");
        assert!(redacted.profile.race.is_empty());
        assert!(redacted.profile.gender.is_empty());
        assert!(redacted.profile.age.is_empty());
        assert!(redacted.profile.description.is_empty());
    }

    #[test]
    fn test_filter_actions_for_owner_returns_only_revealed() {
        // Arrange
        let character = grak(Some(PlayerId(7)));
        let actions = vec![action(1, true), action(2, false), action(3, true)];

        // Act
        let visible = filter_actions(&actions, &character, Viewer::Player(PlayerId(7)));

        // Assert
        let ids: Vec<_> = visible.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![ActionId(1), ActionId(3)]);
        assert!(visible.iter().all(|a| a.revealed));
    }

    #[test]
    fn test_filter_actions_for_other_player_returns_nothing() {
        // Arrange
        let character = grak(Some(PlayerId(7)));
        let actions = vec![action(1, true), action(2, true)];

        // Act
        let stranger = filter_actions(&actions, &character, Viewer::Player(PlayerId(8)));
        let unowned = filter_actions(&actions, &grak(None), Viewer::Player(PlayerId(7)));

        // Assert
        assert!(stranger.is_empty());
        assert!(unowned.is_empty());
    }

    #[test]
    fn test_filter_actions_drops_actions_of_other_characters() {
        // Arrange
        let character = grak(Some(PlayerId(7)));
        let mut foreign = action(5, true);
        foreign.character_id = CharacterId(2);

        // Act
        let visible = filter_actions(&[foreign], &character, Viewer::Player(PlayerId(7)));

        // Assert
        assert!(visible.is_empty());
    }

    #[test]
    fn test_filter_actions_for_admin_is_unfiltered() {
        // Arrange
        let character = grak(None);
        let actions = vec![action(1, false), action(2, true)];

        // Act
        let visible = filter_actions(&actions, &character, Viewer::Admin);

        // Assert
        assert_eq!(visible, actions);
    }

    #[test]
    fn test_view_for_player_redacts_and_filters() {
        // Arrange
        let snapshot = CharacterWithActions {
            character: grak(Some(PlayerId(7))),
            actions: vec![action(1, false), action(2, true)],
        };
        let fields = RevealedFields {
            name: true,
            ..RevealedFields::hidden(CharacterId(1))
        };

        // Act
        let player_view = view_for(&snapshot, &fields, Viewer::Player(PlayerId(7)));
        let admin_view = view_for(&snapshot, &fields, Viewer::Admin);

        // Assert
        assert_eq!(player_view.character.profile.name, "Grak");
        assert!(player_view.character.profile.race.is_empty());
        assert_eq!(player_view.actions, vec![action(2, true)]);
        assert_eq!(admin_view, snapshot);
    }
}
