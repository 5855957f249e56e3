use super::*;

use std::time::Duration;

use axum::routing::get;
use tokio::net::TcpListener;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{protocol::CloseFrame as WsCloseFrame, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};

use async_trait::async_trait;
use plaza_domain::{ClientUpdate, RoomData};
use plaza_shared::{JoinRoomRequest, NewRoomRequest, SceneUpdate};

use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::memory_bus::MemoryEventBus;
use crate::infrastructure::memory_store::MemoryRoomStore;
use crate::infrastructure::ports::{RoomStore, StoreError};
use crate::infrastructure::random::SystemRandom;

pub(crate) type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub(crate) const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Config with a short step delay so walks finish quickly over real sockets.
pub(crate) fn test_config() -> EngineConfig {
    EngineConfig {
        move_step_delay: Duration::from_millis(10),
        ..EngineConfig::default()
    }
}

pub(crate) async fn build_ws_state(config: EngineConfig) -> Arc<WsState> {
    let app = Arc::new(App::in_memory(config));
    app.init().await.unwrap();
    Arc::new(WsState::new(app))
}

/// Same as [`build_ws_state`] over a caller-supplied store.
pub(crate) async fn build_ws_state_with_store(
    store: Arc<dyn RoomStore>,
    config: EngineConfig,
) -> Arc<WsState> {
    let app = Arc::new(App::new(
        store,
        Arc::new(MemoryEventBus::new()),
        Arc::new(SystemRandom::new()),
        config,
    ));
    app.init().await.unwrap();
    Arc::new(WsState::new(app))
}

/// In-memory store whose `delete_client` takes `stall` to finish.
pub(crate) struct SlowDeleteStore {
    pub(crate) inner: MemoryRoomStore,
    pub(crate) stall: Duration,
}

#[async_trait]
impl RoomStore for SlowDeleteStore {
    async fn create_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError> {
        self.inner.create_room(room_id, room).await
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Option<RoomData>, StoreError> {
        self.inner.get_room(room_id).await
    }

    async fn update_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError> {
        self.inner.update_room(room_id, room).await
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        self.inner.delete_room(room_id).await
    }

    async fn list_rooms(&self, limit: usize) -> Result<Vec<(RoomId, RoomData)>, StoreError> {
        self.inner.list_rooms(limit).await
    }

    async fn ensure_default_room(&self, room_id: &RoomId, name: &str) -> Result<(), StoreError> {
        self.inner.ensure_default_room(room_id, name).await
    }

    async fn add_client(&self, client: &Client) -> Result<(), StoreError> {
        self.inner.add_client(client).await
    }

    async fn get_client(&self, client_id: &UserId) -> Result<Option<Client>, StoreError> {
        self.inner.get_client(client_id).await
    }

    async fn update_client(
        &self,
        client_id: &UserId,
        update: ClientUpdate,
    ) -> Result<(), StoreError> {
        self.inner.update_client(client_id, update).await
    }

    async fn delete_client(&self, client_id: &UserId) -> Result<(), StoreError> {
        tokio::time::sleep(self.stall).await;
        self.inner.delete_client(client_id).await
    }
}

pub(crate) async fn spawn_ws_server(
    state: Arc<WsState>,
) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = axum::Router::new().route("/ws", get(ws_handler).with_state(state));

    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (addr, handle)
}

pub(crate) async fn ws_connect(addr: SocketAddr) -> WsClient {
    let url = format!("ws://{}/ws", addr);
    let (ws, _resp) = connect_async(url).await.unwrap();
    ws
}

pub(crate) async fn ws_send_client(ws: &mut WsClient, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(WsMessage::Text(json)).await.unwrap();
}

pub(crate) async fn ws_send_raw(ws: &mut WsClient, text: &str) {
    ws.send(WsMessage::Text(text.to_string())).await.unwrap();
}

pub(crate) async fn ws_recv_server(ws: &mut WsClient) -> ServerMessage {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        match msg {
            WsMessage::Text(text) => {
                return serde_json::from_str::<ServerMessage>(&text).unwrap();
            }
            WsMessage::Close(frame) => panic!("connection closed: {frame:?}"),
            _ => {}
        }
    }
}

pub(crate) async fn ws_expect_message<F>(
    ws: &mut WsClient,
    timeout: Duration,
    mut predicate: F,
) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                return msg;
            }
        }
    })
    .await
    .unwrap()
}

pub(crate) async fn ws_expect_no_message_matching<F>(
    ws: &mut WsClient,
    timeout: Duration,
    mut predicate: F,
) where
    F: FnMut(&ServerMessage) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                panic!("unexpected message: {:?}", msg);
            }
        }
    })
    .await;

    // We only succeed if we timed out without seeing a matching message.
    assert!(result.is_err());
}

/// Wait for the server's close frame.
pub(crate) async fn ws_expect_close(ws: &mut WsClient) -> Option<WsCloseFrame<'static>> {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(WsMessage::Close(frame))) => return frame,
                Some(Ok(_)) => {}
                Some(Err(_)) | None => return None,
            }
        }
    })
    .await
    .unwrap()
}

/// Wait for a scene of `room_id` holding exactly `count` users.
pub(crate) async fn ws_expect_scene(ws: &mut WsClient, room_id: &RoomId, count: usize) -> SceneUpdate {
    let msg = ws_expect_message(ws, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UpdateScene(scene) if &scene.room_id == room_id && scene.users.len() == count)
    })
    .await;
    match msg {
        ServerMessage::UpdateScene(scene) => scene,
        other => panic!("expected scene, got {other:?}"),
    }
}

pub(crate) async fn ws_expect_user_id(ws: &mut WsClient) -> UserId {
    match ws_expect_message(ws, RECV_TIMEOUT, |m| matches!(m, ServerMessage::SetUserId(_))).await {
        ServerMessage::SetUserId(set) => set.user_id,
        other => panic!("expected setUserId, got {other:?}"),
    }
}

/// Create a room over `ws` and return its id and the creator's user id.
pub(crate) async fn ws_create_room(ws: &mut WsClient, user_name: &str, room_name: &str) -> (RoomId, UserId) {
    ws_send_client(
        ws,
        &ClientMessage::NewRoom(NewRoomRequest {
            user_name: user_name.to_string(),
            room_name: room_name.to_string(),
        }),
    )
    .await;

    let scene = match ws_expect_message(ws, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UpdateScene(scene)
            if scene.room_id.room_name() == room_name && scene.users.len() == 1)
    })
    .await
    {
        ServerMessage::UpdateScene(scene) => scene,
        other => panic!("expected scene, got {other:?}"),
    };
    let user_id = ws_expect_user_id(ws).await;
    (scene.room_id, user_id)
}

/// Join `room_id` over `ws`. Returns the joiner's user id and the last
/// scene delivered before it.
pub(crate) async fn ws_join_room(ws: &mut WsClient, room_id: &RoomId, user_name: &str) -> (UserId, SceneUpdate) {
    ws_send_client(
        ws,
        &ClientMessage::JoinRoom(JoinRoomRequest {
            room_id: room_id.clone(),
            user_name: user_name.to_string(),
        }),
    )
    .await;

    tokio::time::timeout(RECV_TIMEOUT, async {
        let mut last_scene = None;
        loop {
            match ws_recv_server(ws).await {
                ServerMessage::UpdateScene(scene) if &scene.room_id == room_id => {
                    last_scene = Some(scene);
                }
                ServerMessage::SetUserId(set) => {
                    return (set.user_id, last_scene.expect("scene before setUserId"));
                }
                _ => {}
            }
        }
    })
    .await
    .unwrap()
}

/// Poll `check` until it holds or the receive timeout passes.
pub(crate) async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(RECV_TIMEOUT, async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap()
}
