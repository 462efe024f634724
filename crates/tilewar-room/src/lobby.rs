//! The pre-game room: membership, organizer role and the lock.
//!
//! Everything here is synchronous. The room actor owns one [`Room`] and
//! turns each mutation into outbound messages.

use tilewar_map::MapDocument;
use tilewar_protocol::{AccessCode, Player, PlayerId, ServerMessage};

use crate::{RoomError, RoomState};

/// What changed when a player left or was kicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub player: Player,
    /// Set when the leaver was the organizer and someone took over.
    pub new_organizer: Option<PlayerId>,
    /// The room dropped below capacity and the lock was lifted.
    pub unlocked: bool,
    /// Human players still in the room.
    pub humans_left: usize,
}

/// A live room.
#[derive(Debug, Clone)]
pub struct Room {
    access_code: AccessCode,
    map_id: String,
    map: MapDocument,
    players: Vec<Player>,
    organizer: PlayerId,
    locked: bool,
    max_players: usize,
    state: RoomState,
}

impl Room {
    /// Opens an unlocked room with the organizer as its only player.
    pub fn new(
        access_code: AccessCode,
        map_id: impl Into<String>,
        map: MapDocument,
        organizer: Player,
    ) -> Self {
        let max_players = map.size.max_players();
        Self {
            access_code,
            map_id: map_id.into(),
            map,
            organizer: organizer.id,
            players: vec![organizer],
            locked: false,
            max_players,
            state: RoomState::Lobby,
        }
    }

    pub fn access_code(&self) -> AccessCode {
        self.access_code
    }

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    pub fn map(&self) -> &MapDocument {
        &self.map
    }

    /// Players in arrival order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn organizer(&self) -> PlayerId {
        self.organizer
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn human_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_virtual).count()
    }

    /// Moves to the next lifecycle state. Returns `false` if `target` is
    /// not the direct successor.
    pub fn transition_to(&mut self, target: RoomState) -> bool {
        if !self.state.can_transition_to(target) {
            return false;
        }
        self.state = target;
        true
    }

    /// Checks that the room can still take players.
    pub fn check_admission(&self) -> Result<(), RoomError> {
        if !self.state.is_lobby() || self.locked {
            return Err(RoomError::Locked(self.access_code));
        }
        if self.is_full() {
            return Err(RoomError::Full(self.access_code));
        }
        Ok(())
    }

    /// Appends a player, renaming them if the name is taken. Locks the
    /// room when it becomes full.
    pub fn add_player(&mut self, mut player: Player) -> Result<&Player, RoomError> {
        self.check_admission()?;
        if self.player(player.id).is_some() {
            return Err(RoomError::AlreadyInRoom(player.id));
        }
        player.name = self.unique_name(&player.name);
        self.players.push(player);
        if self.is_full() {
            self.locked = true;
            tracing::debug!(access_code = %self.access_code, "room full, locked");
        }
        let last = self.players.len() - 1;
        Ok(&self.players[last])
    }

    /// Organizer-only, lobby-only insertion of a computer player.
    pub fn add_virtual_player(
        &mut self,
        requester: PlayerId,
        player: Player,
    ) -> Result<&Player, RoomError> {
        self.require_organizer(requester)?;
        self.require_lobby()?;
        self.add_player(player)
    }

    /// `name`, or `name-2`, `name-3`, ... whichever is free.
    fn unique_name(&self, name: &str) -> String {
        let taken = |candidate: &str| self.players.iter().any(|p| p.name == candidate);
        if !taken(name) {
            return name.to_string();
        }
        (2..)
            .map(|n| format!("{name}-{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    /// Removes a player for any reason. Hands the organizer role to the
    /// next human in arrival order and lifts an automatic lock.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<Departure, RoomError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(RoomError::NotInRoom(id))?;
        let was_full = self.is_full();
        let player = self.players.remove(index);

        let mut new_organizer = None;
        if self.organizer == id {
            let next = self.players[index..]
                .iter()
                .chain(&self.players[..index])
                .find(|p| !p.is_virtual)
                .map(|p| p.id);
            if let Some(next) = next {
                self.organizer = next;
                new_organizer = Some(next);
            }
        }

        let unlocked = was_full && self.locked && self.state.is_lobby();
        if unlocked {
            self.locked = false;
        }

        Ok(Departure {
            player,
            new_organizer,
            unlocked,
            humans_left: self.human_count(),
        })
    }

    fn require_organizer(&self, requester: PlayerId) -> Result<(), RoomError> {
        if requester != self.organizer {
            return Err(RoomError::NotOrganizer(requester));
        }
        Ok(())
    }

    fn require_lobby(&self) -> Result<(), RoomError> {
        if !self.state.is_lobby() {
            return Err(RoomError::InvalidState(format!(
                "room is {}, not in the lobby",
                self.state
            )));
        }
        Ok(())
    }

    /// Organizer-only lock.
    pub fn lock(&mut self, requester: PlayerId) -> Result<(), RoomError> {
        self.require_organizer(requester)?;
        self.require_lobby()?;
        self.locked = true;
        Ok(())
    }

    /// Organizer-only unlock. A full room stays locked.
    pub fn unlock(&mut self, requester: PlayerId) -> Result<(), RoomError> {
        self.require_organizer(requester)?;
        self.require_lobby()?;
        if self.is_full() {
            return Err(RoomError::Full(self.access_code));
        }
        self.locked = false;
        Ok(())
    }

    /// Organizer-only removal of another player, lobby only.
    pub fn kick(&mut self, requester: PlayerId, target: PlayerId) -> Result<Departure, RoomError> {
        self.require_organizer(requester)?;
        self.require_lobby()?;
        if target == requester {
            return Err(RoomError::CannotKickSelf);
        }
        self.remove_player(target)
    }

    /// Organizer-only check that a game can start now.
    pub fn check_start(&self, requester: PlayerId) -> Result<(), RoomError> {
        self.require_organizer(requester)?;
        self.require_lobby()?;
        if self.players.len() < 2 {
            return Err(RoomError::NotEnoughPlayers {
                found: self.players.len(),
                needed: 2,
            });
        }
        Ok(())
    }

    /// Locks the room for good and enters [`RoomState::InGame`].
    pub fn begin_game(&mut self) {
        self.locked = true;
        self.transition_to(RoomState::InGame);
    }

    /// The `roomState` snapshot.
    pub fn state_message(&self) -> ServerMessage {
        ServerMessage::RoomState {
            room_id: self.map_id.clone(),
            access_code: self.access_code,
            players: self.players.clone(),
            organizer: self.organizer,
            is_locked: self.locked,
            max_players: self.max_players,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewar_map::{GameMode, Grid, MapSize, Tile, TileKind};
    use tilewar_protocol::{AiBehavior, Attributes, DiceSize, PlayerProfile};

    fn map(size: MapSize) -> MapDocument {
        MapDocument {
            name: "m".into(),
            description: "d".into(),
            size,
            mode: GameMode::Classic,
            tiles: Grid::filled(1, 1, Tile::new(TileKind::Grass)),
            is_visible: true,
        }
    }

    fn player(id: u64, name: &str) -> Player {
        Player::from_profile(
            PlayerId(id),
            PlayerProfile {
                name: name.into(),
                avatar: String::new(),
                attributes: Attributes::default(),
                attack_dice: DiceSize::D6,
                defense_dice: DiceSize::D4,
            },
        )
    }

    fn room(size: MapSize) -> Room {
        Room::new(AccessCode(1234), "map-1", map(size), player(1, "Ayla"))
    }

    #[test]
    fn test_new_room_is_unlocked_lobby_with_organizer() {
        let room = room(MapSize::Medium);
        assert_eq!(room.organizer(), PlayerId(1));
        assert!(!room.is_locked());
        assert_eq!(room.state(), RoomState::Lobby);
        assert_eq!(room.max_players(), 4);
    }

    #[test]
    fn test_add_player_duplicate_name_gets_suffix() {
        let mut room = room(MapSize::Large);
        assert_eq!(room.add_player(player(2, "Ayla")).unwrap().name, "Ayla-2");
        assert_eq!(room.add_player(player(3, "Ayla")).unwrap().name, "Ayla-3");
    }

    #[test]
    fn test_add_player_until_full_auto_locks() {
        let mut room = room(MapSize::Small);
        room.add_player(player(2, "Bo")).unwrap();
        assert!(room.is_locked());
        assert!(matches!(
            room.add_player(player(3, "Cy")),
            Err(RoomError::Locked(_))
        ));
    }

    #[test]
    fn test_remove_player_below_capacity_auto_unlocks() {
        let mut room = room(MapSize::Small);
        room.add_player(player(2, "Bo")).unwrap();
        let departure = room.remove_player(PlayerId(2)).unwrap();
        assert!(departure.unlocked);
        assert!(!room.is_locked());
    }

    #[test]
    fn test_remove_player_keeps_manual_lock() {
        let mut room = room(MapSize::Medium);
        room.add_player(player(2, "Bo")).unwrap();
        room.lock(PlayerId(1)).unwrap();
        let departure = room.remove_player(PlayerId(2)).unwrap();
        assert!(!departure.unlocked);
        assert!(room.is_locked());
    }

    #[test]
    fn test_remove_organizer_promotes_next_human() {
        let mut room = room(MapSize::Large);
        room.add_player(Player::virtual_player(
            PlayerId(PlayerId::VIRTUAL_BASE),
            "Bot".into(),
            AiBehavior::Aggressive,
        ))
        .unwrap();
        room.add_player(player(3, "Cy")).unwrap();

        let departure = room.remove_player(PlayerId(1)).unwrap();
        assert_eq!(departure.new_organizer, Some(PlayerId(3)));
        assert_eq!(room.organizer(), PlayerId(3));
        assert_eq!(departure.humans_left, 1);
    }

    #[test]
    fn test_remove_last_human_reports_zero_humans() {
        let mut room = room(MapSize::Medium);
        room.add_player(Player::virtual_player(
            PlayerId(PlayerId::VIRTUAL_BASE),
            "Bot".into(),
            AiBehavior::Defensive,
        ))
        .unwrap();
        let departure = room.remove_player(PlayerId(1)).unwrap();
        assert_eq!(departure.humans_left, 0);
        assert_eq!(departure.new_organizer, None);
    }

    #[test]
    fn test_lock_by_non_organizer_fails() {
        let mut room = room(MapSize::Medium);
        room.add_player(player(2, "Bo")).unwrap();
        assert!(matches!(
            room.lock(PlayerId(2)),
            Err(RoomError::NotOrganizer(PlayerId(2)))
        ));
        assert!(!room.is_locked());
    }

    #[test]
    fn test_unlock_full_room_is_refused() {
        let mut room = room(MapSize::Small);
        room.add_player(player(2, "Bo")).unwrap();
        assert!(matches!(room.unlock(PlayerId(1)), Err(RoomError::Full(_))));
        assert!(room.is_locked());
    }

    #[test]
    fn test_kick_self_is_refused() {
        let mut room = room(MapSize::Medium);
        assert!(matches!(
            room.kick(PlayerId(1), PlayerId(1)),
            Err(RoomError::CannotKickSelf)
        ));
    }

    #[test]
    fn test_kick_after_start_is_refused() {
        let mut room = room(MapSize::Medium);
        room.add_player(player(2, "Bo")).unwrap();
        room.begin_game();
        assert!(matches!(
            room.kick(PlayerId(1), PlayerId(2)),
            Err(RoomError::InvalidState(_))
        ));
    }

    #[test]
    fn test_check_start_needs_two_players() {
        let room = room(MapSize::Medium);
        assert!(matches!(
            room.check_start(PlayerId(1)),
            Err(RoomError::NotEnoughPlayers { found: 1, needed: 2 })
        ));
    }

    #[test]
    fn test_begin_game_locks_and_transitions() {
        let mut room = room(MapSize::Medium);
        room.add_player(player(2, "Bo")).unwrap();
        room.begin_game();
        assert!(room.is_locked());
        assert_eq!(room.state(), RoomState::InGame);
        assert!(matches!(
            room.add_player(player(3, "Cy")),
            Err(RoomError::Locked(_))
        ));
    }

    #[test]
    fn test_add_virtual_player_by_non_organizer_fails() {
        let mut room = room(MapSize::Medium);
        room.add_player(player(2, "Bo")).unwrap();
        let bot = Player::virtual_player(
            PlayerId(PlayerId::VIRTUAL_BASE),
            "Bot".into(),
            AiBehavior::Aggressive,
        );
        assert!(matches!(
            room.add_virtual_player(PlayerId(2), bot.clone()),
            Err(RoomError::NotOrganizer(_))
        ));
        let added = room.add_virtual_player(PlayerId(1), bot).unwrap();
        assert!(added.is_virtual);
        assert_eq!(room.human_count(), 2);
    }
}
