use super::test_support::*;
use super::*;

use std::time::Duration;

use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::memory_store::MemoryRoomStore;
use plaza_domain::Position;
use plaza_shared::{ChatRequest, LeaveRoomRequest, UpdatePositionRequest, UpdateTypingRequest};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

async fn join(ws: &mut WsClient, room_id: &RoomId, user_name: &str) -> UserId {
    ws_join_room(ws, room_id, user_name).await.0
}

#[tokio::test]
async fn when_user_creates_room_then_they_receive_scene_and_user_id() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state.clone()).await;
    let mut ws = ws_connect(addr).await;

    let (room_id, user_id) = ws_create_room(&mut ws, "ana", "lobby").await;

    assert_eq!(room_id.room_name(), "lobby");
    let room = state.app.store.get_room(&room_id).await.unwrap().unwrap();
    assert_eq!(room.len(), 1);
    let creator = room.user(&user_id).unwrap();
    assert_eq!(creator.position, Position::new(0, 0));
    assert_eq!(creator.user_name, "ana");

    let info = state.connections.get(&user_id).await.unwrap();
    assert_eq!(info.room_id, Some(room_id));

    server.abort();
}

#[tokio::test]
async fn when_second_user_joins_then_both_see_two_users() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state).await;
    let mut ana = ws_connect(addr).await;
    let mut ben = ws_connect(addr).await;

    let (room_id, ana_id) = ws_create_room(&mut ana, "ana", "lobby").await;
    let (ben_id, seen_by_ben) = ws_join_room(&mut ben, &room_id, "ben").await;

    let seen_by_ana = ws_expect_scene(&mut ana, &room_id, 2).await;
    let ids: Vec<_> = seen_by_ana.users.iter().map(|u| u.user_id.clone()).collect();
    assert!(ids.contains(&ana_id));
    assert!(ids.contains(&ben_id));

    assert_eq!(seen_by_ben.users.len(), 2);
    let ben_user = seen_by_ben
        .users
        .iter()
        .find(|u| u.user_id == ben_id)
        .unwrap();
    assert_ne!(ben_user.position, Position::new(0, 0));

    server.abort();
}

#[tokio::test]
async fn when_user_sends_chat_then_room_receives_truncated_text_with_name() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state).await;
    let mut ana = ws_connect(addr).await;
    let mut ben = ws_connect(addr).await;

    let (room_id, ana_id) = ws_create_room(&mut ana, "ana", "lobby").await;
    join(&mut ben, &room_id, "ben").await;
    ws_expect_scene(&mut ana, &room_id, 2).await;

    let long = "x".repeat(75);
    ws_send_client(
        &mut ana,
        &ClientMessage::BroadcastMessage(ChatRequest {
            from: ana_id,
            room_id: room_id.clone(),
            msg: long,
        }),
    )
    .await;

    for ws in [&mut ana, &mut ben] {
        let msg = ws_expect_message(ws, RECV_TIMEOUT, |m| {
            matches!(m, ServerMessage::BroadcastMessage(_))
        })
        .await;
        let ServerMessage::BroadcastMessage(chat) = msg else {
            unreachable!()
        };
        assert_eq!(chat.msg.chars().count(), 60);
        assert_eq!(chat.from, "ana");
    }

    server.abort();
}

#[tokio::test]
async fn when_payload_names_another_user_then_it_is_dropped() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state).await;
    let mut ana = ws_connect(addr).await;
    let mut ben = ws_connect(addr).await;

    let (room_id, ana_id) = ws_create_room(&mut ana, "ana", "lobby").await;
    join(&mut ben, &room_id, "ben").await;
    ws_expect_scene(&mut ana, &room_id, 2).await;

    // Ben speaks and walks as Ana
    ws_send_client(
        &mut ben,
        &ClientMessage::BroadcastMessage(ChatRequest {
            from: ana_id.clone(),
            room_id: room_id.clone(),
            msg: "not me".into(),
        }),
    )
    .await;
    ws_send_client(
        &mut ben,
        &ClientMessage::UpdatePosition(UpdatePositionRequest {
            user_id: ana_id,
            room_id: room_id.clone(),
            dest: "5,5".into(),
        }),
    )
    .await;

    ws_expect_no_message_matching(&mut ana, Duration::from_millis(300), |m| {
        matches!(m, ServerMessage::BroadcastMessage(_))
            || matches!(m, ServerMessage::UpdateScene(scene) if scene.room_id == room_id)
    })
    .await;

    server.abort();
}

#[tokio::test]
async fn when_user_moves_then_scenes_follow_each_step() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state.clone()).await;
    let mut ws = ws_connect(addr).await;

    let (room_id, user_id) = ws_create_room(&mut ws, "ana", "lobby").await;

    ws_send_client(
        &mut ws,
        &ClientMessage::UpdatePosition(UpdatePositionRequest {
            user_id: user_id.clone(),
            room_id: room_id.clone(),
            dest: "0,3".into(),
        }),
    )
    .await;

    // The relayed creation scene may still arrive first
    let mut cols = Vec::new();
    while cols.last() != Some(&3) {
        let scene = ws_expect_scene(&mut ws, &room_id, 1).await;
        let col = scene.users[0].position.col;
        if col > 0 {
            cols.push(col);
        }
    }
    assert_eq!(cols, vec![1, 2, 3]);

    let room = state.app.store.get_room(&room_id).await.unwrap().unwrap();
    assert_eq!(room.user(&user_id).unwrap().position, Position::new(0, 3));
    room.check_invariants().unwrap();

    server.abort();
}

#[tokio::test]
async fn when_destination_is_malformed_then_nothing_moves() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state).await;
    let mut ws = ws_connect(addr).await;

    let (room_id, user_id) = ws_create_room(&mut ws, "ana", "lobby").await;

    for dest in ["nowhere", "10,10", "-1,0"] {
        ws_send_client(
            &mut ws,
            &ClientMessage::UpdatePosition(UpdatePositionRequest {
                user_id: user_id.clone(),
                room_id: room_id.clone(),
                dest: dest.into(),
            }),
        )
        .await;
    }

    ws_expect_no_message_matching(&mut ws, Duration::from_millis(200), |m| {
        matches!(m, ServerMessage::UpdateScene(scene)
            if scene.users.iter().any(|u| u.position != Position::ORIGIN))
    })
    .await;

    server.abort();
}

#[tokio::test]
async fn when_user_types_then_room_sees_flag() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state).await;
    let mut ana = ws_connect(addr).await;
    let mut ben = ws_connect(addr).await;

    let (room_id, ana_id) = ws_create_room(&mut ana, "ana", "lobby").await;
    join(&mut ben, &room_id, "ben").await;

    ws_send_client(
        &mut ana,
        &ClientMessage::UpdateTyping(UpdateTypingRequest {
            room_id: room_id.clone(),
            user_id: ana_id.clone(),
            is_typing: true,
        }),
    )
    .await;

    ws_expect_message(&mut ben, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UpdateScene(scene)
            if scene.users.iter().any(|u| u.user_id == ana_id && u.is_typing))
    })
    .await;

    server.abort();
}

#[tokio::test]
async fn when_user_leaves_then_others_see_smaller_scene_and_last_leave_closes_room() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state.clone()).await;
    let mut ana = ws_connect(addr).await;
    let mut ben = ws_connect(addr).await;

    let (room_id, ana_id) = ws_create_room(&mut ana, "ana", "lobby").await;
    let ben_id = join(&mut ben, &room_id, "ben").await;
    ws_expect_scene(&mut ana, &room_id, 2).await;

    ws_send_client(
        &mut ben,
        &ClientMessage::LeaveRoom(LeaveRoomRequest { user_id: ben_id.clone() }),
    )
    .await;
    ws_expect_scene(&mut ana, &room_id, 1).await;

    let ben_client = state.app.store.get_client(&ben_id).await.unwrap().unwrap();
    assert_eq!(ben_client.room_id, None);

    ws_send_client(
        &mut ana,
        &ClientMessage::LeaveRoom(LeaveRoomRequest { user_id: ana_id }),
    )
    .await;

    let store = state.app.store.clone();
    let closed = room_id.clone();
    eventually(|| {
        let store = store.clone();
        let closed = closed.clone();
        async move { store.get_room(&closed).await.unwrap().is_none() }
    })
    .await;

    server.abort();
}

#[tokio::test]
async fn when_user_disconnects_then_they_are_removed_everywhere() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state.clone()).await;
    let mut ana = ws_connect(addr).await;
    let mut ben = ws_connect(addr).await;

    let (room_id, _) = ws_create_room(&mut ana, "ana", "lobby").await;
    let ben_id = join(&mut ben, &room_id, "ben").await;
    ws_expect_scene(&mut ana, &room_id, 2).await;

    ben.close(None).await.unwrap();
    drop(ben);

    let scene = ws_expect_scene(&mut ana, &room_id, 1).await;
    assert!(scene.users.iter().all(|u| u.user_id != ben_id));

    let connections = state.connections.clone();
    eventually(|| {
        let connections = connections.clone();
        async move { connections.connection_count().await == 1 }
    })
    .await;
    assert!(state.app.store.get_client(&ben_id).await.unwrap().is_none());

    server.abort();
}

#[tokio::test]
async fn when_user_disconnects_then_socket_closes_before_client_record_is_deleted() {
    let store = Arc::new(SlowDeleteStore {
        inner: MemoryRoomStore::new(),
        stall: Duration::from_secs(1),
    });
    let state = build_ws_state_with_store(store, test_config()).await;
    let (addr, server) = spawn_ws_server(state.clone()).await;
    let mut ana = ws_connect(addr).await;
    let mut ben = ws_connect(addr).await;

    let (room_id, _) = ws_create_room(&mut ana, "ana", "lobby").await;
    let ben_id = join(&mut ben, &room_id, "ben").await;
    ws_expect_scene(&mut ana, &room_id, 2).await;

    ben.close(None).await.unwrap();

    // Ben is out of the room and his socket is closed while the record remains
    ws_expect_scene(&mut ana, &room_id, 1).await;
    tokio::time::timeout(Duration::from_millis(800), ws_expect_close(&mut ben))
        .await
        .unwrap();
    assert!(state.app.store.get_client(&ben_id).await.unwrap().is_some());

    let store = state.app.store.clone();
    eventually(|| {
        let store = store.clone();
        let ben_id = ben_id.clone();
        async move { store.get_client(&ben_id).await.unwrap().is_none() }
    })
    .await;

    server.abort();
}

#[tokio::test]
async fn when_user_switches_rooms_then_old_room_events_stop() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state).await;
    let mut ana = ws_connect(addr).await;
    let mut ben = ws_connect(addr).await;

    let (first, _) = ws_create_room(&mut ana, "ana", "first").await;
    let ben_id = join(&mut ben, &first, "ben").await;
    ws_expect_scene(&mut ana, &first, 2).await;

    let (second, _) = ws_create_room(&mut ana, "ana", "second").await;
    assert_ne!(first, second);

    ws_send_client(
        &mut ben,
        &ClientMessage::BroadcastMessage(ChatRequest {
            from: ben_id,
            room_id: first.clone(),
            msg: "anyone?".into(),
        }),
    )
    .await;
    ws_expect_message(&mut ben, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::BroadcastMessage(_))
    })
    .await;

    ws_expect_no_message_matching(&mut ana, Duration::from_millis(200), |m| {
        matches!(m, ServerMessage::BroadcastMessage(_))
    })
    .await;

    server.abort();
}

#[tokio::test]
async fn when_frames_are_malformed_then_connection_stays_usable() {
    let state = build_ws_state(test_config()).await;
    let (addr, server) = spawn_ws_server(state).await;
    let mut ws = ws_connect(addr).await;

    ws_send_raw(&mut ws, "hello").await;
    ws_send_raw(&mut ws, r#"{"event":"dance","data":{}}"#).await;
    ws_send_raw(&mut ws, r#"{"event":"newRoom","data":{"userName":"ana"}}"#).await;

    let (room_id, _) = ws_create_room(&mut ws, "ana", "lobby").await;
    assert_eq!(room_id.room_name(), "lobby");

    server.abort();
}

#[tokio::test]
async fn when_ip_exceeds_connection_limit_then_socket_is_closed() {
    let config = EngineConfig {
        ws_connection_limit: Some(1),
        ..test_config()
    };
    let state = build_ws_state(config).await;
    let (addr, server) = spawn_ws_server(state.clone()).await;

    let mut first = ws_connect(addr).await;
    // A round trip guarantees the first socket holds its slot
    ws_create_room(&mut first, "ana", "lobby").await;

    let mut second = ws_connect(addr).await;
    let frame = ws_expect_close(&mut second).await.unwrap();
    assert_eq!(frame.code, CloseCode::Policy);

    assert_eq!(state.connections.connection_count().await, 1);

    server.abort();
}
