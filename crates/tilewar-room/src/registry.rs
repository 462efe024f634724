//! Room registry: creates, tracks, and routes players to rooms.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tilewar_map::MapDocument;
use tilewar_protocol::{AccessCode, AiBehavior, ClientMessage, Player, PlayerId};

use crate::actor::spawn_room;
use crate::{Departure, GameConfig, PlayerSender, Room, RoomError, RoomHandle, RoomInfo};

/// Owns every live room, keyed by access code, and knows which room each
/// connected human is in.
///
/// This is the entry point for room operations from the connection layer.
/// A player is in at most one room at a time.
pub struct RoomRegistry {
    rooms: HashMap<AccessCode, RoomHandle>,
    /// Reverse index from a human player's connection to their room.
    /// Virtual players are never listed here.
    connections: HashMap<PlayerId, AccessCode>,
    config: GameConfig,
    rng: StdRng,
}

impl RoomRegistry {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// A registry drawing access codes and room seeds from `rng`.
    pub fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        Self {
            rooms: HashMap::new(),
            connections: HashMap::new(),
            config,
            rng,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Draws an unused code, giving up after the configured number of
    /// attempts.
    fn draw_code(&mut self) -> Result<AccessCode, RoomError> {
        let attempts = self.config.code_attempts;
        for _ in 0..attempts {
            let code = AccessCode(self.rng.random_range(AccessCode::MIN..=AccessCode::MAX));
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(RoomError::CodeSpaceExhausted(attempts))
    }

    fn handle(&self, access_code: AccessCode) -> Result<&RoomHandle, RoomError> {
        self.rooms
            .get(&access_code)
            .ok_or(RoomError::NotFound(access_code))
    }

    /// Opens a room with `organizer` as its first player and spawns its
    /// actor. The organizer receives `roomCreated`.
    pub fn create_room(
        &mut self,
        map_id: impl Into<String>,
        map: MapDocument,
        organizer: Player,
        sender: PlayerSender,
    ) -> Result<AccessCode, RoomError> {
        if self.connections.contains_key(&organizer.id) {
            return Err(RoomError::AlreadyInRoom(organizer.id));
        }
        let access_code = self.draw_code()?;
        let organizer_id = organizer.id;
        let room = Room::new(access_code, map_id, map, organizer);
        let room_rng = StdRng::from_rng(&mut self.rng);
        let handle = spawn_room(room, sender, self.config.clone(), room_rng);

        self.rooms.insert(access_code, handle);
        self.connections.insert(organizer_id, access_code);
        tracing::info!(%access_code, organizer = %organizer_id, "room created");
        Ok(access_code)
    }

    /// The `joinRoom` check: the code exists and the room still admits
    /// players.
    pub async fn check_join(&self, access_code: AccessCode) -> Result<RoomInfo, RoomError> {
        let info = self.handle(access_code)?.info().await?;
        if !info.state.is_lobby() || info.is_locked {
            return Err(RoomError::Locked(access_code));
        }
        if info.player_count >= info.max_players {
            return Err(RoomError::Full(access_code));
        }
        Ok(info)
    }

    /// Adds a finished character to the room. Returns the player as
    /// admitted, possibly renamed.
    pub async fn join_room(
        &mut self,
        access_code: AccessCode,
        player: Player,
        sender: PlayerSender,
    ) -> Result<Player, RoomError> {
        if self.connections.contains_key(&player.id) {
            return Err(RoomError::AlreadyInRoom(player.id));
        }
        let joined = self.handle(access_code)?.join(player, sender).await?;
        self.connections.insert(joined.id, access_code);
        Ok(joined)
    }

    /// Removes a human from whatever room they are in. Destroys the room
    /// when no human is left.
    pub async fn remove_player(&mut self, player_id: PlayerId) -> Result<Departure, RoomError> {
        let access_code = self
            .connections
            .remove(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;
        let departure = match self.handle(access_code)?.leave(player_id).await {
            Ok(departure) => departure,
            Err(RoomError::Unavailable(code)) => {
                tracing::warn!(%access_code, %player_id, "room actor is gone, destroying room");
                self.destroy_room(access_code).await?;
                return Err(RoomError::Unavailable(code));
            }
            Err(e) => return Err(e),
        };

        if departure.humans_left == 0 {
            self.destroy_room(access_code).await?;
        }
        Ok(departure)
    }

    pub async fn lock(&self, access_code: AccessCode, requester: PlayerId) -> Result<(), RoomError> {
        self.handle(access_code)?.lock(requester).await
    }

    pub async fn unlock(
        &self,
        access_code: AccessCode,
        requester: PlayerId,
    ) -> Result<(), RoomError> {
        self.handle(access_code)?.unlock(requester).await
    }

    /// Organizer-only removal of `target`.
    pub async fn kick(
        &mut self,
        access_code: AccessCode,
        requester: PlayerId,
        target: PlayerId,
    ) -> Result<Departure, RoomError> {
        let departure = self.handle(access_code)?.kick(requester, target).await?;
        if self.connections.get(&target) == Some(&access_code) {
            self.connections.remove(&target);
        }
        Ok(departure)
    }

    pub async fn start_game(
        &self,
        access_code: AccessCode,
        requester: PlayerId,
    ) -> Result<(), RoomError> {
        self.handle(access_code)?.start(requester).await
    }

    pub async fn add_virtual_player(
        &self,
        access_code: AccessCode,
        requester: PlayerId,
        behavior: AiBehavior,
    ) -> Result<Player, RoomError> {
        self.handle(access_code)?
            .add_virtual(requester, behavior)
            .await
    }

    /// A handle to the room a connected human is in. Callers holding the
    /// registry behind a lock can release it before talking to the room.
    pub fn room_handle_of(&self, player_id: PlayerId) -> Result<RoomHandle, RoomError> {
        let access_code = self.room_of(player_id).ok_or(RoomError::NotInRoom(player_id))?;
        self.handle(access_code).cloned()
    }

    /// Routes an in-game action to the sender's room.
    pub async fn route_message(
        &self,
        player_id: PlayerId,
        msg: ClientMessage,
    ) -> Result<(), RoomError> {
        self.room_handle_of(player_id)?
            .send_game_message(player_id, msg)
            .await
    }

    /// Shuts a room down, frees its code, and drops its players from the
    /// index.
    pub async fn destroy_room(&mut self, access_code: AccessCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(&access_code)
            .ok_or(RoomError::NotFound(access_code))?;

        let _ = handle.shutdown().await;
        self.connections.retain(|_, code| *code != access_code);

        tracing::info!(%access_code, "room destroyed");
        Ok(())
    }

    pub async fn room_info(&self, access_code: AccessCode) -> Result<RoomInfo, RoomError> {
        self.handle(access_code)?.info().await
    }

    /// The room a connected human is in, if any.
    pub fn room_of(&self, player_id: PlayerId) -> Option<AccessCode> {
        self.connections.get(&player_id).copied()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn access_codes(&self) -> Vec<AccessCode> {
        self.rooms.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_code_exhausted_space_reports_attempts() {
        let config = GameConfig {
            code_attempts: 0,
            ..GameConfig::default()
        };
        let mut registry = RoomRegistry::with_rng(config, StdRng::seed_from_u64(1));
        assert!(matches!(
            registry.draw_code(),
            Err(RoomError::CodeSpaceExhausted(0))
        ));
    }

    #[test]
    fn test_draw_code_stays_in_four_digits() {
        let mut registry = RoomRegistry::with_rng(GameConfig::default(), StdRng::seed_from_u64(7));
        for _ in 0..200 {
            let code = registry.draw_code().unwrap();
            assert!(AccessCode::new(code.0).is_some());
        }
    }

    fn meadow() -> MapDocument {
        use tilewar_map::{Coord, GameMode, Grid, ItemKind, MapSize, Tile, TileKind};

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

    fn human(id: u64) -> Player {
        Player::from_profile(
            PlayerId(id),
            tilewar_protocol::PlayerProfile {
                name: format!("P{id}"),
                avatar: String::new(),
                attributes: tilewar_protocol::Attributes::default(),
                attack_dice: tilewar_protocol::DiceSize::D6,
                defense_dice: tilewar_protocol::DiceSize::D4,
            },
        )
    }

    #[tokio::test]
    async fn test_remove_player_dead_actor_frees_code() {
        let mut registry = RoomRegistry::with_rng(GameConfig::default(), StdRng::seed_from_u64(3));
        let (tx1, _rx1) = tokio::sync::mpsc::unbounded_channel();
        let code = registry.create_room("meadow", meadow(), human(1), tx1).unwrap();
        let (tx2, _rx2) = tokio::sync::mpsc::unbounded_channel();
        registry.join_room(code, human(2), tx2).await.unwrap();

        // stop the actor behind the registry's back
        registry.rooms[&code].shutdown().await.unwrap();

        let err = registry.remove_player(PlayerId(1)).await.unwrap_err();
        assert!(matches!(err, RoomError::Unavailable(c) if c == code));
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.room_of(PlayerId(2)), None);
        assert!(matches!(
            registry.remove_player(PlayerId(2)).await,
            Err(RoomError::NotInRoom(_))
        ));
    }

    #[tokio::test]
    async fn test_room_handle_of_outlives_registry_borrow() {
        let registry = tokio::sync::Mutex::new(RoomRegistry::with_rng(
            GameConfig::default(),
            StdRng::seed_from_u64(4),
        ));
        let (tx1, mut rx1) = tokio::sync::mpsc::unbounded_channel();
        let code = registry
            .lock()
            .await
            .create_room("meadow", meadow(), human(1), tx1)
            .unwrap();

        let handle = registry.lock().await.room_handle_of(PlayerId(1)).unwrap();
        assert_eq!(handle.access_code(), code);
        assert!(matches!(
            registry.lock().await.room_handle_of(PlayerId(9)),
            Err(RoomError::NotInRoom(_))
        ));

        // the registry stays locked while the room is reached
        let _held = registry.lock().await;
        handle
            .send_game_message(PlayerId(1), ClientMessage::UserEndTurn)
            .await
            .unwrap();
        handle.info().await.unwrap();
        let last = std::iter::from_fn(|| rx1.try_recv().ok()).last();
        assert!(matches!(last, Some(tilewar_protocol::ServerMessage::Error { .. })));
    }
}
