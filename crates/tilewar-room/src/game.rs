//! The in-game dispatcher.
//!
//! One [`GameSession`] per started room. Every inbound action and every
//! clock tick goes through it; each call validates first, then mutates,
//! then returns the outbound messages in the order clients must see them.

use rand::Rng;
use tilewar_combat::{BattleOutcome, Fighter};
use tilewar_map::{Coord, GameMode, Grid, ItemKind, MapDocument, Tile, TileKind};
use tilewar_protocol::{
    AccessCode, AiBehavior, ClientMessage, GameStatistics, Player, PlayerId, PlayerPosition,
    Recipient, ServerMessage,
};
use tilewar_tick::CountdownTick;

use crate::{
    BattlePhase, BootstrapError, GameConfig, GameError, StatisticsTracker, TurnScheduler,
    bootstrap,
};

/// One message and who gets it.
pub type Outbound = (Recipient, ServerMessage);

#[derive(Debug, Clone)]
struct Pawn {
    player: Player,
    position: Coord,
    spawn: Coord,
}

/// Board, turn, battle and statistics state of a running game.
#[derive(Debug, Clone)]
pub struct GameSession {
    access_code: AccessCode,
    config: GameConfig,
    mode: GameMode,
    board: Grid,
    pawns: Vec<Pawn>,
    turns: TurnScheduler,
    movement_left: u32,
    action_used: bool,
    battle: Option<BattlePhase>,
    stats: StatisticsTracker,
    winner: Option<PlayerId>,
}

fn walkable(tile: &Tile) -> bool {
    tile.kind.is_walkable()
}

impl GameSession {
    /// Sets up the board and hands out the first turn.
    ///
    /// Emits `gameStarted` followed by `startTurn`.
    pub fn start<R: Rng>(
        access_code: AccessCode,
        config: &GameConfig,
        map: &MapDocument,
        players: &[Player],
        rng: &mut R,
    ) -> Result<(Self, Vec<Outbound>), BootstrapError> {
        let setup = bootstrap(map, players, rng)?;

        let pawns: Vec<Pawn> = setup
            .spawns
            .iter()
            .filter_map(|&(id, at)| {
                players.iter().find(|p| p.id == id).map(|p| Pawn {
                    player: p.clone(),
                    position: at,
                    spawn: at,
                })
            })
            .collect();
        let mut stats = StatisticsTracker::new(&setup.tiles, players);
        for &(id, at) in &setup.spawns {
            stats.record_visit(id, at);
        }

        let mut session = Self {
            access_code,
            config: config.clone(),
            mode: map.mode,
            board: setup.tiles,
            pawns,
            turns: TurnScheduler::new(setup.turn_order.clone(), config.turn_secs),
            movement_left: 0,
            action_used: false,
            battle: None,
            stats,
            winner: None,
        };

        let mut out = vec![(
            Recipient::All,
            ServerMessage::GameStarted {
                tiles: session.board.clone(),
                positions: session.positions(),
                turn_order: setup.turn_order,
            },
        )];
        session.turns.start();
        session.begin_turn(&mut out);

        tracing::info!(%access_code, players = players.len(), "game started");
        Ok((session, out))
    }

    // -- Accessors --

    pub fn board(&self) -> &Grid {
        &self.board
    }

    pub fn positions(&self) -> Vec<PlayerPosition> {
        self.pawns
            .iter()
            .map(|p| PlayerPosition {
                player_id: p.player.id,
                tile: p.position,
            })
            .collect()
    }

    pub fn position_of(&self, id: PlayerId) -> Option<Coord> {
        self.pawn(id).map(|p| p.position)
    }

    pub fn spawn_of(&self, id: PlayerId) -> Option<Coord> {
        self.pawn(id).map(|p| p.spawn)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.pawn(id).map(|p| &p.player)
    }

    pub fn turns(&self) -> &TurnScheduler {
        &self.turns
    }

    pub fn current_turn(&self) -> Option<PlayerId> {
        self.turns.current()
    }

    pub fn movement_left(&self) -> u32 {
        self.movement_left
    }

    pub fn battle(&self) -> Option<&BattlePhase> {
        self.battle.as_ref()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    pub fn statistics(&self) -> GameStatistics {
        self.stats.report()
    }

    fn pawn(&self, id: PlayerId) -> Option<&Pawn> {
        self.pawns.iter().find(|p| p.player.id == id)
    }

    fn pawn_index(&self, id: PlayerId) -> Option<usize> {
        self.pawns.iter().position(|p| p.player.id == id)
    }

    fn occupant(&self, at: Coord) -> Option<PlayerId> {
        self.pawns
            .iter()
            .find(|p| p.position == at)
            .map(|p| p.player.id)
    }

    // -- Inbound actions --

    /// Applies one in-game action from `sender`.
    pub fn handle<R: Rng>(
        &mut self,
        sender: PlayerId,
        msg: ClientMessage,
        rng: &mut R,
    ) -> Result<Vec<Outbound>, GameError> {
        if self.winner.is_some() {
            return Err(GameError::GameOver);
        }
        if self.pawn(sender).is_none() {
            return Err(GameError::NotInGame(sender));
        }

        let mut out = Vec::new();
        match msg {
            ClientMessage::UserEndTurn => self.end_turn(sender, &mut out)?,
            ClientMessage::UserMoved { from, to } => self.move_player(sender, from, to, &mut out)?,
            ClientMessage::UserDidDoorAction { tile } => self.toggle_door(sender, tile, &mut out)?,
            ClientMessage::UserDidBattleAction { enemy_id } => {
                self.start_battle(sender, enemy_id, &mut out)?
            }
            ClientMessage::UserAttacked => self.attack(sender, rng, &mut out)?,
            ClientMessage::UserTriedEscape => self.escape(sender, rng, &mut out)?,
            _ => return Err(GameError::NotAnAction),
        }
        Ok(out)
    }

    /// Movement-phase actions need the turn and no running battle.
    fn require_holder(&self, sender: PlayerId) -> Result<(), GameError> {
        if self.battle.is_some() {
            return Err(GameError::BattleInProgress);
        }
        if self.turns.current() != Some(sender) {
            return Err(GameError::NotYourTurn(sender));
        }
        Ok(())
    }

    fn end_turn(&mut self, sender: PlayerId, out: &mut Vec<Outbound>) -> Result<(), GameError> {
        if self.battle.is_some() {
            return Err(GameError::BattleInProgress);
        }
        self.turns.end_turn(sender)?;
        out.push((Recipient::All, ServerMessage::EndTurn { player_id: sender }));
        self.begin_turn(out);
        Ok(())
    }

    fn move_player(
        &mut self,
        sender: PlayerId,
        from: Coord,
        to: Coord,
        out: &mut Vec<Outbound>,
    ) -> Result<(), GameError> {
        self.require_holder(sender)?;
        let index = self.pawn_index(sender).ok_or(GameError::NotInGame(sender))?;
        let position = self.pawns[index].position;
        if position != from {
            return Err(GameError::InvalidMove(format!(
                "player is at {position}, not {from}"
            )));
        }
        if !from.is_adjacent(to) {
            return Err(GameError::InvalidMove(format!("{from} to {to} is not one step")));
        }
        let tile = self
            .board
            .get(to)
            .ok_or_else(|| GameError::InvalidMove(format!("{to} is off the board")))?;
        let cost = tile
            .kind
            .movement_cost()
            .ok_or_else(|| GameError::InvalidMove(format!("{to} cannot be entered")))?;
        if self.occupant(to).is_some() {
            return Err(GameError::InvalidMove(format!("{to} is occupied")));
        }
        if cost > self.movement_left {
            return Err(GameError::InvalidMove(format!(
                "{to} costs {cost} but only {} movement left",
                self.movement_left
            )));
        }

        self.movement_left -= cost;
        self.pawns[index].position = to;
        self.stats.record_visit(sender, to);
        out.push((
            Recipient::All,
            ServerMessage::PlayerMoved {
                player_id: sender,
                from,
                to,
                movement_left: self.movement_left,
            },
        ));
        self.pick_up(index, to, out);

        let pawn = &self.pawns[index];
        if self.mode == GameMode::CaptureTheFlag
            && pawn.position == pawn.spawn
            && pawn.player.inventory.contains(ItemKind::Flag)
        {
            self.declare_victory(sender, out);
        }
        Ok(())
    }

    /// Moves the item on `at` into the pawn's inventory if a slot is free.
    fn pick_up(&mut self, index: usize, at: Coord, out: &mut Vec<Outbound>) {
        let Some(item) = self.board.get(at).and_then(|t| t.item) else {
            return;
        };
        if !item.is_collectible() || !self.pawns[index].player.inventory.add(item) {
            return;
        }
        if let Some(tile) = self.board.get_mut(at) {
            tile.item = None;
        }
        let player_id = self.pawns[index].player.id;
        self.stats.record_item(player_id, item);
        out.push((
            Recipient::All,
            ServerMessage::ItemPickedUp {
                player_id,
                item,
                tile: at,
            },
        ));
    }

    fn toggle_door(
        &mut self,
        sender: PlayerId,
        at: Coord,
        out: &mut Vec<Outbound>,
    ) -> Result<(), GameError> {
        self.require_holder(sender)?;
        if self.action_used {
            return Err(GameError::ActionUsed);
        }
        let position = self.position_of(sender).ok_or(GameError::NotInGame(sender))?;
        if !position.is_adjacent(at) {
            return Err(GameError::InvalidTarget(format!("{at} is not next to the player")));
        }
        let kind = self.board.get(at).map(|t| t.kind);
        let Some(kind) = kind.filter(|k| k.is_door()) else {
            return Err(GameError::InvalidTarget(format!("no door at {at}")));
        };
        if kind == TileKind::OpenDoor && self.occupant(at).is_some() {
            return Err(GameError::DoorBlocked(at));
        }

        let toggled = kind.toggled();
        if let Some(tile) = self.board.get_mut(at) {
            tile.kind = toggled;
        }
        self.action_used = true;
        self.stats.record_door(at);
        out.push((
            Recipient::All,
            ServerMessage::DoorToggled {
                tile: at,
                open: toggled == TileKind::OpenDoor,
            },
        ));
        Ok(())
    }

    fn fighter_for(&self, pawn: &Pawn) -> Fighter {
        let on_ice = self
            .board
            .get(pawn.position)
            .is_some_and(|t| t.kind == TileKind::Ice);
        Fighter::new(
            pawn.player.id,
            pawn.player.attributes,
            pawn.player.attack_dice,
            pawn.player.defense_dice,
        )
        .with_items(pawn.player.inventory.items())
        .standing_on_ice(on_ice)
    }

    fn start_battle(
        &mut self,
        sender: PlayerId,
        enemy: PlayerId,
        out: &mut Vec<Outbound>,
    ) -> Result<(), GameError> {
        self.require_holder(sender)?;
        if self.action_used {
            return Err(GameError::ActionUsed);
        }
        if enemy == sender {
            return Err(GameError::InvalidTarget("cannot battle yourself".into()));
        }
        let challenger = self.pawn(sender).ok_or(GameError::NotInGame(sender))?;
        let defender = self
            .pawn(enemy)
            .ok_or_else(|| GameError::InvalidTarget(format!("{enemy} is not in the game")))?;
        if !challenger.position.is_adjacent(defender.position) {
            return Err(GameError::InvalidTarget(format!("{enemy} is not adjacent")));
        }

        let phase = BattlePhase::new(
            self.fighter_for(challenger),
            self.fighter_for(defender),
            &self.config,
        );
        out.push((
            Recipient::All,
            ServerMessage::BattleStarted {
                first: sender,
                second: enemy,
                current_turn: phase.current_turn(),
            },
        ));
        self.battle = Some(phase);
        self.action_used = true;
        self.turns.pause();
        self.stats.record_combat(sender, enemy);
        tracing::debug!(access_code = %self.access_code, %sender, %enemy, "battle started");
        Ok(())
    }

    fn attack<R: Rng>(
        &mut self,
        sender: PlayerId,
        rng: &mut R,
        out: &mut Vec<Outbound>,
    ) -> Result<(), GameError> {
        let battle = self.battle.as_mut().ok_or(GameError::NoBattle)?;
        let resolution = battle.session_mut().attack(sender, rng)?;
        self.stats.record_attack(&resolution.report);
        out.push((
            Recipient::All,
            ServerMessage::OpponentAttacked {
                result: resolution.report,
            },
        ));
        self.after_battle_action(resolution.outcome, out);
        Ok(())
    }

    fn escape<R: Rng>(
        &mut self,
        sender: PlayerId,
        rng: &mut R,
        out: &mut Vec<Outbound>,
    ) -> Result<(), GameError> {
        let battle = self.battle.as_mut().ok_or(GameError::NoBattle)?;
        let resolution = battle.session_mut().escape(sender, rng)?;
        self.stats.record_evasion(sender);
        out.push((
            Recipient::All,
            ServerMessage::OpponentTriedEscape {
                player_id: sender,
                succeeded: resolution.succeeded,
                evasions_left: resolution.evasions_left,
            },
        ));
        self.after_battle_action(resolution.outcome, out);
        Ok(())
    }

    fn after_battle_action(&mut self, outcome: BattleOutcome, out: &mut Vec<Outbound>) {
        match outcome {
            BattleOutcome::Continues { next } => {
                if let Some(battle) = self.battle.as_mut() {
                    battle.restart_countdown();
                }
                out.push((Recipient::All, ServerMessage::BattleTurn { player_id: next }));
            }
            BattleOutcome::Won { winner, loser } => self.finish_battle(winner, loser, false, out),
            BattleOutcome::Escaped { by } => {
                tracing::debug!(access_code = %self.access_code, %by, "battle escaped");
                self.end_battle(None, out);
            }
        }
    }

    fn end_battle(&mut self, winner: Option<PlayerId>, out: &mut Vec<Outbound>) {
        self.battle = None;
        self.turns.resume();
        out.push((Recipient::All, ServerMessage::BattleEnded { winner }));
    }

    /// Credits the win and sends the loser home. A loser who is leaving
    /// the game stays put; [`Self::remove_player`] handles their turn.
    fn finish_battle(
        &mut self,
        winner: PlayerId,
        loser: PlayerId,
        loser_leaving: bool,
        out: &mut Vec<Outbound>,
    ) {
        let first = self.battle.as_ref().map(|b| b.session().first());
        let msg = if first == Some(winner) {
            ServerMessage::FirstPlayerWonBattle { winner, loser }
        } else {
            ServerMessage::SecondPlayerWonBattle { winner, loser }
        };
        out.push((Recipient::All, msg));
        self.stats.record_battle_result(winner, loser);
        self.end_battle(Some(winner), out);
        tracing::info!(access_code = %self.access_code, %winner, %loser, "battle won");

        if !loser_leaving {
            self.send_home(loser, out);
        }

        if self.mode == GameMode::Classic
            && self.stats.victories(winner) >= self.config.battle_wins_to_victory
        {
            self.declare_victory(winner, out);
            return;
        }
        if !loser_leaving && self.turns.current() == Some(loser) {
            self.pass_turn(out);
        }
    }

    /// Drops a carried flag, then puts the pawn back on its spawn point or
    /// the nearest free walkable tile.
    fn send_home(&mut self, id: PlayerId, out: &mut Vec<Outbound>) {
        let Some(index) = self.pawn_index(id) else {
            return;
        };
        self.drop_flag(index, out);

        let spawn = self.pawns[index].spawn;
        let target = if self.occupant(spawn).is_none_or(|other| other == id) {
            Some(spawn)
        } else {
            self.board
                .flood(spawn, walkable)
                .into_iter()
                .find(|at| self.occupant(*at).is_none())
        };
        let Some(target) = target else {
            tracing::warn!(access_code = %self.access_code, %id, "no free tile to respawn on");
            return;
        };
        self.pawns[index].position = target;
        self.stats.record_visit(id, target);
        out.push((
            Recipient::All,
            ServerMessage::PlayerRespawned {
                player_id: id,
                tile: target,
            },
        ));
    }

    /// Puts a carried flag on the nearest walkable tile without an item.
    fn drop_flag(&mut self, index: usize, out: &mut Vec<Outbound>) {
        if !self.pawns[index].player.inventory.contains(ItemKind::Flag) {
            return;
        }
        let from = self.pawns[index].position;
        let spot = self
            .board
            .flood(from, walkable)
            .into_iter()
            .find(|at| self.board.get(*at).is_some_and(|t| t.item.is_none()));
        let Some(at) = spot else {
            return;
        };
        self.pawns[index].player.inventory.remove(ItemKind::Flag);
        if let Some(tile) = self.board.get_mut(at) {
            tile.item = Some(ItemKind::Flag);
        }
        out.push((
            Recipient::All,
            ServerMessage::ItemDropped {
                player_id: self.pawns[index].player.id,
                item: ItemKind::Flag,
                tile: at,
            },
        ));
    }

    fn declare_victory(&mut self, winner: PlayerId, out: &mut Vec<Outbound>) {
        self.winner = Some(winner);
        self.battle = None;
        self.turns.finish();
        out.push((
            Recipient::All,
            ServerMessage::GameBoardPlayerWon { player_id: winner },
        ));
        out.push((
            Recipient::All,
            ServerMessage::GameStatistics(self.stats.report()),
        ));
        tracing::info!(access_code = %self.access_code, %winner, "game won");
    }

    // -- Turn rotation --

    /// Resets the per-turn budget and announces the holder.
    fn begin_turn(&mut self, out: &mut Vec<Outbound>) {
        let Some(holder) = self.turns.current() else {
            return;
        };
        self.movement_left = self
            .pawn(holder)
            .map_or(0, |p| p.player.movement_points());
        self.action_used = false;
        self.stats.record_turn();
        out.push((Recipient::All, ServerMessage::StartTurn { player_id: holder }));
    }

    /// Ends the holder's turn without their consent (timeout, lost battle).
    fn pass_turn(&mut self, out: &mut Vec<Outbound>) {
        if let Some(holder) = self.turns.current() {
            out.push((Recipient::All, ServerMessage::EndTurn { player_id: holder }));
        }
        if self.turns.advance().is_some() {
            self.begin_turn(out);
        }
    }

    // -- Clock --

    /// One clock tick: advances the battle or movement countdown and lets
    /// virtual players act.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> Vec<Outbound> {
        let mut out = Vec::new();
        if self.winner.is_some() {
            return out;
        }
        if self.battle.is_some() {
            self.tick_battle(rng, &mut out);
        } else {
            self.tick_movement(&mut out);
        }
        out
    }

    fn tick_battle<R: Rng>(&mut self, rng: &mut R, out: &mut Vec<Outbound>) {
        let Some(current) = self.battle.as_ref().map(BattlePhase::current_turn) else {
            return;
        };
        if let Some(behavior) = self.pawn(current).and_then(|p| p.player.behavior) {
            self.act_for_virtual_fighter(current, behavior, rng, out);
            return;
        }

        let step = match self.battle.as_mut() {
            Some(battle) => battle.tick(),
            None => return,
        };
        match step {
            CountdownTick::Running(remaining) => {
                out.push((Recipient::All, ServerMessage::BattleTimer { remaining }));
            }
            CountdownTick::Expired => {
                out.push((Recipient::All, ServerMessage::BattleTimer { remaining: 0 }));
                if let Err(err) = self.attack(current, rng, out) {
                    tracing::warn!(access_code = %self.access_code, %err, "automatic attack rejected");
                }
            }
            CountdownTick::Held => {}
        }
    }

    fn act_for_virtual_fighter<R: Rng>(
        &mut self,
        id: PlayerId,
        behavior: AiBehavior,
        rng: &mut R,
        out: &mut Vec<Outbound>,
    ) {
        let can_escape = self
            .battle
            .as_ref()
            .and_then(|b| b.session().fighter(id))
            .is_some_and(|f| f.evasions_left > 0);
        let result = match behavior {
            AiBehavior::Defensive if can_escape => self.escape(id, rng, out),
            _ => self.attack(id, rng, out),
        };
        if let Err(err) = result {
            tracing::warn!(access_code = %self.access_code, %id, %err, "virtual player action rejected");
        }
    }

    fn tick_movement(&mut self, out: &mut Vec<Outbound>) {
        let Some(holder) = self.turns.current() else {
            return;
        };
        if self.pawn(holder).is_some_and(|p| p.player.is_virtual) {
            self.pass_turn(out);
            return;
        }
        match self.turns.tick() {
            CountdownTick::Running(remaining) => {
                out.push((Recipient::All, ServerMessage::TurnTimer { remaining }));
            }
            CountdownTick::Expired => {
                out.push((Recipient::All, ServerMessage::TurnTimer { remaining: 0 }));
                self.pass_turn(out);
            }
            CountdownTick::Held => {}
        }
    }

    // -- Disconnects --

    /// Takes a departed player off the board.
    ///
    /// A fighter forfeits their battle, a turn holder loses their turn,
    /// and the last player left wins.
    pub fn remove_player(&mut self, id: PlayerId) -> Vec<Outbound> {
        let mut out = Vec::new();
        if self.pawn(id).is_none() {
            return out;
        }

        if self.winner.is_none() {
            let forfeit = match self.battle.as_mut() {
                Some(battle) if battle.session().involves(id) => {
                    battle.session_mut().forfeit(id).ok()
                }
                _ => None,
            };
            if let Some(BattleOutcome::Won { winner, loser }) = forfeit {
                self.finish_battle(winner, loser, true, &mut out);
            }
        }

        let Some(index) = self.pawn_index(id) else {
            return out;
        };
        self.drop_flag(index, &mut out);
        self.pawns.remove(index);
        let held_turn = self.turns.remove(id);
        tracing::debug!(access_code = %self.access_code, %id, held_turn, "player left the game");

        if self.winner.is_some() {
            return out;
        }
        if held_turn {
            out.push((Recipient::All, ServerMessage::EndTurn { player_id: id }));
        }
        match self.pawns.len() {
            0 => self.turns.finish(),
            1 => {
                let last = self.pawns[0].player.id;
                self.declare_victory(last, &mut out);
            }
            _ if held_turn => self.begin_turn(&mut out),
            _ => {}
        }
        out
    }
}
