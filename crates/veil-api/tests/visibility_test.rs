//! End-to-end visibility: what an assigned player's live stream receives as
//! the administrator assigns, reveals and hides.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use veil_core::ids::{ActionId, CharacterId};
use veil_core::repository::PlayerRepository;
use veil_core::viewer::Viewer;
use veil_stream::Message;
use veil_test_support::{assert_no_message, next_message};

#[tokio::test]
async fn test_assigned_player_sees_only_what_is_revealed() {
    // Arrange
    let server = common::build_test_app();
    let ada = server.store.create_player("Ada").await.unwrap();
    let grak = server
        .create_character(json!({
            "name": "Grak",
            "race": "Orc",
            "description": "Secretly a spy for the duke"
        }))
        .await;
    let mut stream = server.hub.connect(Viewer::Player(ada.id), "Ada").await.unwrap();
    assert_eq!(next_message(&mut stream).await, Message::InitPlayer(vec![]));

    // Act: assign
    let (status, _) = server
        .as_admin(
            "POST",
            &format!("/api/v1/characters/{grak}/assign"),
            Some(json!({ "playerId": ada.id })),
        )
        .await;

    // Assert: everything redacted
    assert_eq!(status, StatusCode::OK);
    let Message::Character(view) = next_message(&mut stream).await else {
        panic!("expected a character snapshot");
    };
    assert_eq!(view.character.id, CharacterId(grak));
    assert_eq!(view.character.owner_player_id, Some(ada.id));
    assert_eq!(view.character.profile.name, "");
    assert_eq!(view.character.profile.description, "");
    assert!(view.actions.is_empty());

    // Act: reveal the name only
    let (status, _) = server
        .as_admin(
            "PUT",
            &format!("/api/v1/characters/{grak}/reveal"),
            Some(json!({ "name": true })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let Message::Character(view) = next_message(&mut stream).await else {
        panic!("expected a character snapshot");
    };
    assert_eq!(view.character.profile.name, "Grak");
    assert_eq!(view.character.profile.race, "");

    // Act: a new action starts hidden
    let action = server.create_action(grak, "Poisoned the well").await;

    assert_no_message(&mut stream).await;

    // Act: reveal it
    let (status, _) = server
        .as_admin("POST", &format!("/api/v1/actions/{action}/reveal"), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let Message::Action(revealed) = next_message(&mut stream).await else {
        panic!("expected an action");
    };
    assert_eq!(revealed.id, ActionId(action));
    assert_eq!(revealed.content, "Poisoned the well");

    // Act: hide it again
    let (status, _) = server
        .as_admin("POST", &format!("/api/v1/actions/{action}/hide"), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        next_message(&mut stream).await,
        Message::DeleteAction(ActionId(action))
    );
}

#[tokio::test]
async fn test_reassign_retracts_from_old_owner_and_hides_actions() {
    // Arrange
    let server = common::build_test_app();
    let ada = server.store.create_player("Ada").await.unwrap();
    let bo = server.store.create_player("Bo").await.unwrap();
    let grak = server.create_character(json!({ "name": "Grak" })).await;
    let action = server.create_action(grak, "Knows the password").await;

    let mut ada_stream = server.hub.connect(Viewer::Player(ada.id), "Ada").await.unwrap();
    let mut bo_stream = server.hub.connect(Viewer::Player(bo.id), "Bo").await.unwrap();
    assert_eq!(next_message(&mut ada_stream).await, Message::InitPlayer(vec![]));
    assert_eq!(next_message(&mut bo_stream).await, Message::InitPlayer(vec![]));

    let assign_uri = format!("/api/v1/characters/{grak}/assign");
    server
        .as_admin("POST", &assign_uri, Some(json!({ "playerId": ada.id })))
        .await;
    server
        .as_admin("POST", &format!("/api/v1/actions/{action}/reveal"), None)
        .await;
    assert!(matches!(next_message(&mut ada_stream).await, Message::Character(_)));
    assert!(matches!(next_message(&mut ada_stream).await, Message::Action(_)));

    // Act
    let (status, json) = server
        .as_admin("POST", &assign_uri, Some(json!({ "playerId": bo.id })))
        .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ownerPlayerId"], bo.id.get());
    assert_eq!(json["actions"][0]["revealed"], false);

    assert_eq!(
        next_message(&mut ada_stream).await,
        Message::DeleteAction(ActionId(action))
    );
    assert_eq!(
        next_message(&mut ada_stream).await,
        Message::DeleteCharacter(CharacterId(grak))
    );
    assert_no_message(&mut ada_stream).await;

    let Message::Character(view) = next_message(&mut bo_stream).await else {
        panic!("expected a character snapshot");
    };
    assert_eq!(view.character.owner_player_id, Some(bo.id));
    assert!(view.actions.is_empty());
}

#[tokio::test]
async fn test_assigning_to_current_owner_is_rejected_without_messages() {
    let server = common::build_test_app();
    let ada = server.store.create_player("Ada").await.unwrap();
    let grak = server.create_character(json!({ "name": "Grak" })).await;
    let assign_uri = format!("/api/v1/characters/{grak}/assign");
    server
        .as_admin("POST", &assign_uri, Some(json!({ "playerId": ada.id })))
        .await;
    let mut stream = server.hub.connect(Viewer::Player(ada.id), "Ada").await.unwrap();
    assert!(matches!(next_message(&mut stream).await, Message::InitPlayer(_)));

    let (status, json) = server
        .as_admin("POST", &assign_uri, Some(json!({ "playerId": ada.id })))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "invalid_state");
    assert_no_message(&mut stream).await;
}

#[tokio::test]
async fn test_hidden_action_edits_never_reach_the_owner() {
    let server = common::build_test_app();
    let ada = server.store.create_player("Ada").await.unwrap();
    let grak = server.create_character(json!({ "name": "Grak" })).await;
    server
        .as_admin(
            "POST",
            &format!("/api/v1/characters/{grak}/assign"),
            Some(json!({ "playerId": ada.id })),
        )
        .await;
    let action = server.create_action(grak, "Hides a dagger").await;
    let mut stream = server.hub.connect(Viewer::Player(ada.id), "Ada").await.unwrap();
    let Message::InitPlayer(characters) = next_message(&mut stream).await else {
        panic!("expected init-player");
    };
    assert!(characters[0].actions.is_empty());

    let (status, _) = server
        .as_admin(
            "PUT",
            &format!("/api/v1/actions/{action}"),
            Some(json!({ "content": "Hides two daggers" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_no_message(&mut stream).await;
}
