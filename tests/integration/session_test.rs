//! Room session integration tests
//!
//! Several clients per room, each driving a real `RoomSession` through the
//! channel harness.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use talkroom::backend::chat::log::{Cursor, InMemoryLog, MessageLog};
use talkroom::backend::directory::{StaticRooms, StaticUsers};
use talkroom::backend::error::BackendError;
use talkroom::backend::realtime::{CloseReason, Outbound};
use talkroom::backend::server::{AppState, ServerConfig};

use crate::common::{assert_strictly_increasing, FailingLog, TestClient};
use crate::{assert_err, assert_kind, assert_ok};

#[tokio::test]
async fn test_text_message_reaches_the_room() {
    let app = AppState::in_memory();
    let mut alice = TestClient::connect(&app, "r1", "alice").await;
    let mut bob = TestClient::connect(&app, "r1", "bob").await;

    let joined = alice.recv_kind("userJoined").await;
    assert_eq!(joined["user_id"], "bob");

    alice.send_text("hello").await;

    let received = bob.recv_kind("text").await;
    assert_eq!(received["content"], "hello");
    assert_eq!(received["author_id"], "alice");
    assert_eq!(received["room_id"], "r1");
    assert!(received["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(received["timestamp"].as_str().is_some_and(|ts| !ts.is_empty()));

    let echoed = alice.recv_kind("text").await;
    assert_eq!(echoed["id"], received["id"]);

    assert_ok!(bob.disconnect().await);
    assert_ok!(alice.disconnect().await);
}

#[tokio::test]
async fn test_client_supplied_id_is_kept() {
    let app = AppState::in_memory();
    let mut alice = TestClient::connect(&app, "r1", "alice").await;

    let id = uuid::Uuid::now_v7();
    alice
        .send(json!({ "kind": "text", "id": id, "content": "with id", "author_id": "mallory" }))
        .await;

    let echoed = alice.recv_kind("text").await;
    assert_eq!(echoed["id"], id.to_string());
    assert_eq!(echoed["author_id"], "alice");

    let stored = assert_ok!(app.history.get_history("r1", None).await);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let app = AppState::in_memory();
    let mut alice = TestClient::connect(&app, "r1", "alice").await;
    let mut carol = TestClient::connect(&app, "r2", "carol").await;

    alice.send_text("only r1").await;
    alice.recv_kind("text").await;

    carol.assert_silent().await;
    assert!(assert_ok!(app.history.get_history("r2", None).await).is_empty());
}

#[tokio::test]
async fn test_reconnect_catches_up_in_order() {
    let app = AppState::in_memory();
    let mut alice = TestClient::connect(&app, "r1", "alice").await;

    for content in ["one", "two", "three"] {
        alice.send_text(content).await;
        alice.recv_kind("text").await;
    }
    assert_ok!(alice.disconnect().await);

    let history = assert_ok!(app.history.get_history("r1", None).await);
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|m| m.author_id == "alice"));
    let ids: Vec<_> = history.iter().map(|m| m.id).collect();
    assert_strictly_increasing(&ids);

    let mut bob = TestClient::connect(&app, "r1", "bob").await;
    for expected in ["one", "two", "three"] {
        let replayed = bob.recv_json().await;
        assert_kind!(replayed, "text");
        assert_eq!(replayed["content"], expected);
    }
    bob.assert_silent().await;
}

#[tokio::test]
async fn test_history_after_cursor_skips_older_messages() {
    let app = AppState::in_memory();
    let mut alice = TestClient::connect(&app, "r1", "alice").await;
    for content in ["one", "two", "three"] {
        alice.send_text(content).await;
        alice.recv_kind("text").await;
    }

    let all = assert_ok!(app.history.get_history("r1", None).await);
    let after_first = assert_ok!(
        app.history
            .get_history("r1", Some(Cursor::Id(all[0].id)))
            .await
    );
    assert_eq!(after_first, all[1..].to_vec());
}

#[tokio::test]
async fn test_catch_up_is_limited_to_newest_messages() {
    let config = ServerConfig {
        catch_up_limit: 2,
        ..ServerConfig::default()
    };
    let app = AppState::new(config, Arc::new(InMemoryLog::capped_list(100)));
    let mut alice = TestClient::connect(&app, "r1", "alice").await;
    for content in ["one", "two", "three"] {
        alice.send_text(content).await;
        alice.recv_kind("text").await;
    }

    let mut bob = TestClient::connect(&app, "r1", "bob").await;
    assert_eq!(bob.recv_json().await["content"], "two");
    assert_eq!(bob.recv_json().await["content"], "three");
    bob.assert_silent().await;
}

#[tokio::test]
async fn test_typing_is_relayed_but_not_stored() {
    let app = AppState::in_memory();
    let mut alice = TestClient::connect(&app, "r1", "alice").await;
    let mut bob = TestClient::connect(&app, "r1", "bob").await;
    alice.recv_kind("userJoined").await;

    alice.send(json!({ "kind": "typing", "is_typing": true })).await;

    let typing = bob.recv_json().await;
    assert_kind!(typing, "typing");
    assert_eq!(typing["user_id"], "alice");
    assert_eq!(typing["is_typing"], true);

    alice.assert_silent().await;
    assert!(assert_ok!(app.log.range("r1", None).await).is_empty());
}

#[tokio::test]
async fn test_unknown_kind_is_ignored() {
    let app = AppState::in_memory();
    let mut alice = TestClient::connect(&app, "r1", "alice").await;
    let mut bob = TestClient::connect(&app, "r1", "bob").await;
    alice.recv_kind("userJoined").await;

    alice.send(json!({ "kind": "sticker", "sticker_id": 7 })).await;
    alice.send_raw("not json at all").await;
    alice.send(json!({ "kind": "image", "name": "missing url" })).await;
    bob.assert_silent().await;

    alice.send_text("still here").await;
    assert_eq!(bob.recv_kind("text").await["content"], "still here");
    assert!(app.registry.contains("r1", "alice").await);
}

#[tokio::test]
async fn test_image_message_is_stored_and_broadcast() {
    let app = AppState::in_memory();
    let mut alice = TestClient::connect(&app, "r1", "alice").await;

    alice
        .send(json!({ "kind": "image", "image_url": "https://cdn.example/x.png", "name": "x.png", "size": 1024 }))
        .await;

    let echoed = alice.recv_kind("image").await;
    assert_eq!(echoed["image_url"], "https://cdn.example/x.png");
    assert_eq!(echoed["size"], 1024);

    let stored = assert_ok!(app.history.get_history("r1", None).await);
    assert_eq!(stored[0].kind(), "image");
}

#[tokio::test]
async fn test_storage_failure_is_reported_to_sender_only() {
    let app = AppState::new(ServerConfig::default(), Arc::new(FailingLog));
    let mut alice = TestClient::connect(&app, "r1", "alice").await;
    let mut bob = TestClient::connect(&app, "r1", "bob").await;
    alice.recv_kind("userJoined").await;

    alice.send_text("lost").await;

    let failure = alice.recv_json().await;
    assert_kind!(failure, "deliveryFailed");
    assert!(failure["message_id"].as_str().is_some());
    bob.assert_silent().await;

    alice.send(json!({ "kind": "typing", "is_typing": true })).await;
    assert_kind!(bob.recv_json().await, "typing");
}

#[tokio::test]
async fn test_departure_is_announced() {
    let app = AppState::in_memory();
    let mut alice = TestClient::connect(&app, "r1", "alice").await;
    let bob = TestClient::connect(&app, "r1", "bob").await;
    alice.recv_kind("userJoined").await;

    assert_ok!(bob.disconnect().await);

    let left = alice.recv_json().await;
    assert_kind!(left, "userLeft");
    assert_eq!(left["user_id"], "bob");
    assert!(!app.registry.contains("r1", "bob").await);
}

#[tokio::test]
async fn test_second_connection_evicts_first() {
    let app = AppState::in_memory();
    let mut alice = TestClient::connect(&app, "r1", "alice").await;
    let mut old_bob = TestClient::connect(&app, "r1", "bob").await;
    alice.recv_kind("userJoined").await;

    let mut new_bob = TestClient::start(&app, json!({ "room_id": "r1", "user_id": "bob" }));
    assert_eq!(old_bob.recv_close().await, CloseReason::Evicted);
    alice.recv_kind("userJoined").await;
    assert_eq!(app.registry.connection_count("r1").await, 2);

    assert_ok!(old_bob.disconnect().await);
    alice.assert_silent().await;
    assert!(app.registry.contains("r1", "bob").await);

    alice.send_text("to the new bob").await;
    assert_eq!(new_bob.recv_kind("text").await["content"], "to the new bob");

    assert_ok!(new_bob.disconnect().await);
    assert_eq!(alice.recv_kind("userLeft").await["user_id"], "bob");
}

#[tokio::test]
async fn test_joined_event_carries_display_name() {
    let users = StaticUsers::new().with_name("bob", "Bob B.");
    let app = AppState::in_memory().with_users(Arc::new(users));
    let mut alice = TestClient::connect(&app, "r1", "alice").await;
    let _bob = TestClient::connect(&app, "r1", "bob").await;

    let joined = alice.recv_kind("userJoined").await;
    assert_eq!(joined["display_name"], "Bob B.");
}

#[tokio::test]
async fn test_non_member_is_rejected() {
    let rooms = StaticRooms::new().with_member("r1", "alice");
    let app = AppState::in_memory().with_rooms(Arc::new(rooms));

    let mallory = TestClient::start(&app, json!({ "room_id": "r1", "user_id": "mallory" }));
    let (result, mut outbound) = mallory.finish().await;

    assert_err!(result, BackendError::Forbidden { .. });
    assert_eq!(outbound.recv().await, Some(Outbound::Close(CloseReason::Rejected)));
    assert!(!app.registry.contains("r1", "mallory").await);
}

#[tokio::test]
async fn test_camel_case_handshake_is_accepted() {
    let app = AppState::in_memory();
    let mut alice = TestClient::start(&app, json!({ "roomId": "r1", "userId": "alice" }));

    alice.send_text("hi").await;
    assert_eq!(alice.recv_kind("text").await["author_id"], "alice");
}

#[tokio::test]
async fn test_order_is_preserved_per_sender() {
    let app = AppState::in_memory();
    let alice = TestClient::connect(&app, "r1", "alice").await;
    let mut bob = TestClient::connect(&app, "r1", "bob").await;

    for n in 0..20 {
        alice.send_text(&format!("m{n}")).await;
    }
    for n in 0..20 {
        assert_eq!(bob.recv_kind("text").await["content"], format!("m{n}"));
    }

    let stored = assert_ok!(app.log.range("r1", None).await);
    let seqs: Vec<_> = stored.iter().map(|e| e.seq).collect();
    assert_strictly_increasing(&seqs);
}
