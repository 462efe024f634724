//! Per-connection handler: decode, dispatch, reply.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task draining the player's outbound channel
//!   2. Loop: receive frames → decode → lobby call or in-game routing
//!   3. On close, remove the player from whatever room they are in

use std::sync::Arc;

use tilewar_protocol::{
    AccessCode, ClientMessage, Codec, JsonCodec, Player, PlayerId, PlayerProfile, ServerMessage,
};
use tilewar_room::{PlayerSender, RoomError};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::{MapStore, TilewarError, WebSocketConnection};

/// Drop guard that takes the player out of their room when the handler
/// exits, even on panic. `Drop` is synchronous, so the async removal runs
/// in a fire-and-forget task.
struct DepartureGuard<S: MapStore> {
    player_id: PlayerId,
    state: Arc<ServerState<S>>,
}

impl<S: MapStore> Drop for DepartureGuard<S> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut registry = state.registry.lock().await;
            match registry.remove_player(player_id).await {
                Ok(_) | Err(RoomError::NotInRoom(_)) => {}
                Err(e) => tracing::debug!(%player_id, error = %e, "cleanup after disconnect failed"),
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S: MapStore>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S>>,
) -> Result<(), TilewarError> {
    let conn = Arc::new(conn);
    let player_id = conn.player_id();
    tracing::info!(%player_id, "player connected");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), rx, state.codec));
    let _guard = DepartureGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let result = read_loop(&conn, &state, player_id, &tx).await;

    writer.abort();
    let _ = conn.close().await;
    // _guard drops here → room departure fires.
    result
}

async fn write_loop(
    conn: Arc<WebSocketConnection>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    codec: JsonCodec,
) {
    let player_id = conn.player_id();
    while let Some(msg) = rx.recv().await {
        let text = match codec.encode_text(&msg) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(%player_id, error = %e, "failed to encode outbound message");
                continue;
            }
        };
        if let Err(e) = conn.send_text(text).await {
            tracing::debug!(%player_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

async fn read_loop<S: MapStore>(
    conn: &WebSocketConnection,
    state: &ServerState<S>,
    player_id: PlayerId,
    tx: &PlayerSender,
) -> Result<(), TilewarError> {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode message");
                reply(tx, ServerMessage::error(e.to_string()));
                continue;
            }
        };

        if let Err(e) = dispatch(state, player_id, msg, tx).await {
            tracing::debug!(%player_id, error = %e, "request rejected");
            reply(tx, ServerMessage::error(e.to_string()));
        }
    }
}

/// Queues a message for this connection only.
fn reply(tx: &PlayerSender, msg: ServerMessage) {
    let _ = tx.send(msg);
}

fn join_refused(access_code: AccessCode, reason: tilewar_protocol::JoinFailure) -> ServerMessage {
    ServerMessage::JoinGameResponse {
        access_code,
        valid: false,
        reason: Some(reason),
    }
}

/// Runs one request. Errors are reported back to the sender as `error`;
/// join refusals get their own `joinGameResponse` instead.
async fn dispatch<S: MapStore>(
    state: &ServerState<S>,
    player_id: PlayerId,
    msg: ClientMessage,
    tx: &PlayerSender,
) -> Result<(), TilewarError> {
    if msg.is_in_game() {
        // the registry lock is released before queueing into the room
        let room = state.registry.lock().await.room_handle_of(player_id)?;
        return Ok(room.send_game_message(player_id, msg).await?);
    }

    match msg {
        ClientMessage::CreateRoom { map_id, organizer } => {
            let organizer = admit_profile(player_id, organizer)?;
            let map = state
                .store
                .load(&map_id)
                .ok_or_else(|| TilewarError::UnknownMap(map_id.clone()))?;
            let mut registry = state.registry.lock().await;
            registry.create_room(map_id, map, organizer, tx.clone())?;
        }

        ClientMessage::JoinRoom { access_code } => {
            let registry = state.registry.lock().await;
            match registry.check_join(access_code).await {
                Ok(_) => reply(
                    tx,
                    ServerMessage::JoinGameResponse {
                        access_code,
                        valid: true,
                        reason: None,
                    },
                ),
                Err(e) => match e.join_check_failure() {
                    Some(reason) => reply(tx, join_refused(access_code, reason)),
                    None => return Err(e.into()),
                },
            }
        }

        ClientMessage::AddPlayerToRoom {
            access_code,
            player,
        } => {
            let player = admit_profile(player_id, player)?;
            let mut registry = state.registry.lock().await;
            // success is announced by the room itself
            if let Err(e) = registry.join_room(access_code, player, tx.clone()).await {
                match e.admission_failure() {
                    Some(reason) => reply(tx, join_refused(access_code, reason)),
                    None => return Err(e.into()),
                }
            }
        }

        ClientMessage::AddVirtualPlayer {
            access_code,
            behavior,
        } => {
            let registry = state.registry.lock().await;
            registry
                .add_virtual_player(access_code, player_id, behavior)
                .await?;
        }

        ClientMessage::LockRoom { access_code } => {
            state.registry.lock().await.lock(access_code, player_id).await?;
        }

        ClientMessage::UnlockRoom { access_code } => {
            state
                .registry
                .lock()
                .await
                .unlock(access_code, player_id)
                .await?;
        }

        ClientMessage::KickPlayer { player_id: target } => {
            let mut registry = state.registry.lock().await;
            let access_code = registry
                .room_of(player_id)
                .ok_or(RoomError::NotInRoom(player_id))?;
            registry.kick(access_code, player_id, target).await?;
        }

        ClientMessage::LeaveGame { access_code } => {
            let mut registry = state.registry.lock().await;
            if registry.room_of(player_id) != Some(access_code) {
                return Err(RoomError::NotInRoom(player_id).into());
            }
            registry.remove_player(player_id).await?;
        }

        ClientMessage::StartGame { access_code } => {
            state
                .registry
                .lock()
                .await
                .start_game(access_code, player_id)
                .await?;
        }

        // in-game messages were routed above
        _ => {}
    }
    Ok(())
}

fn admit_profile(player_id: PlayerId, profile: PlayerProfile) -> Result<Player, TilewarError> {
    profile.validate()?;
    Ok(Player::from_profile(player_id, profile))
}
