//! Integration tests for the Tilewar server: real sockets, real rooms.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tilewar::{InMemoryMapStore, TilewarServer};
use tilewar_map::{Coord, GameMode, Grid, ItemKind, MapDocument, MapSize, Tile, TileKind};
use tilewar_protocol::{
    AccessCode, Attributes, ClientMessage, DiceSize, JoinFailure, PlayerId, PlayerProfile,
    ServerMessage,
};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn meadow() -> MapDocument {
    let mut tiles = Grid::filled(10, 10, Tile::new(TileKind::Grass));
    for col in 0..2 {
        *tiles.tile_mut(Coord::new(0, col)).unwrap() =
            Tile::with_item(TileKind::Grass, ItemKind::Spawn);
    }
    MapDocument {
        name: "meadow".into(),
        description: "open grass".into(),
        size: MapSize::Small,
        mode: GameMode::Classic,
        tiles,
        is_visible: true,
    }
}

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let mut store = InMemoryMapStore::new();
    store.save("meadow", meadow()).expect("meadow is valid");

    let server = TilewarServer::builder()
        .bind("127.0.0.1:0")
        .build(store)
        .await
        .expect("server should build");
    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

fn profile(name: &str, speed: u32) -> PlayerProfile {
    PlayerProfile {
        name: name.into(),
        avatar: "knight".into(),
        attributes: Attributes {
            speed,
            ..Attributes::default()
        },
        attack_dice: DiceSize::D6,
        defense_dice: DiceSize::D4,
    }
}

async fn send(ws: &mut ClientWs, msg: &ClientMessage) {
    let text = serde_json::to_string(msg).expect("encode");
    ws.send(Message::Text(text.into())).await.expect("send");
}

async fn recv(ws: &mut ClientWs) -> ServerMessage {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for a message")
        .expect("stream ended")
        .expect("recv failed");
    serde_json::from_slice(&msg.into_data()).expect("decode")
}

/// Skips messages until one matches.
async fn recv_until(ws: &mut ClientWs, pred: impl Fn(&ServerMessage) -> bool) -> ServerMessage {
    loop {
        let msg = recv(ws).await;
        if pred(&msg) {
            return msg;
        }
    }
}

/// Creates a room on the meadow map and returns its code.
async fn create_room(ws: &mut ClientWs, name: &str, speed: u32) -> AccessCode {
    send(
        ws,
        &ClientMessage::CreateRoom {
            map_id: "meadow".into(),
            organizer: profile(name, speed),
        },
    )
    .await;
    match recv(ws).await {
        ServerMessage::RoomCreated { access_code } => access_code,
        other => panic!("expected roomCreated, got {other:?}"),
    }
}

async fn enter_room(ws: &mut ClientWs, access_code: AccessCode, name: &str) -> ServerMessage {
    send(
        ws,
        &ClientMessage::AddPlayerToRoom {
            access_code,
            player: profile(name, 4),
        },
    )
    .await;
    recv(ws).await
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_code_then_state() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let code = create_room(&mut ws, "Ayla", 6).await;
    assert!(AccessCode::new(code.0).is_some());

    match recv(&mut ws).await {
        ServerMessage::RoomState {
            access_code,
            players,
            is_locked,
            max_players,
            room_id,
            ..
        } => {
            assert_eq!(access_code, code);
            assert_eq!(players.len(), 1);
            assert_eq!(players[0].name, "Ayla");
            assert!(!is_locked);
            assert_eq!(max_players, 2);
            assert_eq!(room_id, "meadow");
        }
        other => panic!("expected roomState, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_room_unknown_map_returns_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        &ClientMessage::CreateRoom {
            map_id: "nowhere".into(),
            organizer: profile("Ayla", 4),
        },
    )
    .await;
    match recv(&mut ws).await {
        ServerMessage::Error { message } => assert!(message.contains("nowhere")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_room_blank_name_returns_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    send(
        &mut ws,
        &ClientMessage::CreateRoom {
            map_id: "meadow".into(),
            organizer: profile("  ", 4),
        },
    )
    .await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::Error { .. }));
}

#[tokio::test]
async fn test_create_room_attribute_above_range_returns_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    let mut organizer = profile("Ayla", 4);
    organizer.attributes.attack = u32::MAX;
    send(
        &mut ws,
        &ClientMessage::CreateRoom {
            map_id: "meadow".into(),
            organizer,
        },
    )
    .await;
    match recv(&mut ws).await {
        ServerMessage::Error { message } => assert!(message.contains("at most")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_frame_returns_error_and_keeps_connection() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text(r#"{"type":"fly"}"#.into()))
        .await
        .expect("send");
    assert!(matches!(recv(&mut ws).await, ServerMessage::Error { .. }));

    create_room(&mut ws, "Ayla", 4).await;
}

#[tokio::test]
async fn test_join_room_unknown_code_is_code_invalid() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let code = AccessCode(1000);
    send(&mut ws, &ClientMessage::JoinRoom { access_code: code }).await;
    assert_eq!(
        recv(&mut ws).await,
        ServerMessage::JoinGameResponse {
            access_code: code,
            valid: false,
            reason: Some(JoinFailure::CodeInvalid),
        }
    );
}

#[tokio::test]
async fn test_join_flow_second_player_fills_and_locks_room() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host, "Ayla", 6).await;

    let mut guest = connect(&addr).await;
    send(&mut guest, &ClientMessage::JoinRoom { access_code: code }).await;
    assert_eq!(
        recv(&mut guest).await,
        ServerMessage::JoinGameResponse {
            access_code: code,
            valid: true,
            reason: None,
        }
    );

    let admitted = enter_room(&mut guest, code, "Ayla").await;
    assert!(matches!(
        admitted,
        ServerMessage::JoinGameResponse { valid: true, .. }
    ));
    let state = recv_until(&mut guest, |m| matches!(m, ServerMessage::RoomState { .. })).await;
    let ServerMessage::RoomState { players, .. } = state else {
        unreachable!()
    };
    assert_eq!(players[1].name, "Ayla-2");

    recv_until(&mut host, |m| {
        matches!(m, ServerMessage::RoomLocked { is_locked: true, .. })
    })
    .await;

    let mut late = connect(&addr).await;
    send(&mut late, &ClientMessage::JoinRoom { access_code: code }).await;
    assert_eq!(
        recv(&mut late).await,
        ServerMessage::JoinGameResponse {
            access_code: code,
            valid: false,
            reason: Some(JoinFailure::LockedRoom),
        }
    );

    let refused = enter_room(&mut late, code, "Cy").await;
    assert_eq!(
        refused,
        ServerMessage::JoinGameResponse {
            access_code: code,
            valid: false,
            reason: Some(JoinFailure::LockedAfterJoin),
        }
    );
}

#[tokio::test]
async fn test_lock_room_by_guest_is_rejected() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host, "Ayla", 6).await;
    let mut guest = connect(&addr).await;
    enter_room(&mut guest, code, "Bo").await;

    send(&mut guest, &ClientMessage::LockRoom { access_code: code }).await;
    recv_until(&mut guest, |m| matches!(m, ServerMessage::Error { .. })).await;
}

#[tokio::test]
async fn test_guest_disconnect_unlocks_room_for_host() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host, "Ayla", 6).await;
    let mut guest = connect(&addr).await;
    enter_room(&mut guest, code, "Bo").await;
    recv_until(&mut host, |m| matches!(m, ServerMessage::RoomLocked { .. })).await;

    guest.close(None).await.expect("close");

    recv_until(&mut host, |m| {
        matches!(m, ServerMessage::RoomUnlocked { is_locked: false, .. })
    })
    .await;
    let state = recv_until(&mut host, |m| matches!(m, ServerMessage::RoomState { .. })).await;
    let ServerMessage::RoomState { players, .. } = state else {
        unreachable!()
    };
    assert_eq!(players.len(), 1);
}

#[tokio::test]
async fn test_start_game_and_end_turn_over_the_wire() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host, "Ayla", 6).await;
    let mut guest = connect(&addr).await;
    enter_room(&mut guest, code, "Bo").await;

    send(&mut host, &ClientMessage::StartGame { access_code: code }).await;
    let started = recv_until(&mut guest, |m| matches!(m, ServerMessage::GameStarted { .. })).await;
    let ServerMessage::GameStarted { turn_order, .. } = started else {
        unreachable!()
    };
    let first: PlayerId = turn_order[0];
    let second: PlayerId = turn_order[1];
    assert_eq!(
        recv(&mut guest).await,
        ServerMessage::StartTurn { player_id: first }
    );

    // the host is faster, so the guest must wait
    send(&mut guest, &ClientMessage::UserEndTurn).await;
    recv_until(&mut guest, |m| matches!(m, ServerMessage::Error { .. })).await;

    send(&mut host, &ClientMessage::UserEndTurn).await;
    recv_until(&mut guest, |m| {
        *m == ServerMessage::EndTurn { player_id: first }
    })
    .await;
    assert_eq!(
        recv_until(&mut guest, |m| matches!(m, ServerMessage::StartTurn { .. })).await,
        ServerMessage::StartTurn { player_id: second }
    );
}
