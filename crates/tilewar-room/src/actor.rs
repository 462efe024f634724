//! Room actor: an isolated Tokio task that owns one room.
//!
//! The lobby, the running game and the clock all live inside the task.
//! Commands arrive one at a time over a bounded channel, so no two
//! mutations of the same room ever interleave.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use tilewar_protocol::{
    AccessCode, AiBehavior, ClientMessage, Player, PlayerId, Recipient, ServerMessage,
};
use tilewar_tick::TickScheduler;
use tokio::sync::{mpsc, oneshot};

use crate::{Departure, GameConfig, GameSession, Outbound, Room, RoomError, RoomState};

/// Ids handed to virtual players. Starts at the reserved range.
static NEXT_VIRTUAL_ID: AtomicU64 = AtomicU64::new(PlayerId::VIRTUAL_BASE);

/// Channel sender for delivering outbound messages to one connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
///
/// Variants carrying a `oneshot::Sender` expect a reply.
pub(crate) enum RoomCommand {
    Join {
        player: Player,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<Player, RoomError>>,
    },
    AddVirtual {
        requester: PlayerId,
        behavior: AiBehavior,
        reply: oneshot::Sender<Result<Player, RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<Departure, RoomError>>,
    },
    Kick {
        requester: PlayerId,
        target: PlayerId,
        reply: oneshot::Sender<Result<Departure, RoomError>>,
    },
    Lock {
        requester: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Unlock {
        requester: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Start {
        requester: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    /// An in-game action. Rejections go back to the sender as `error`.
    Game {
        sender: PlayerId,
        msg: ClientMessage,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub access_code: AccessCode,
    pub map_id: String,
    pub state: RoomState,
    pub organizer: PlayerId,
    pub player_count: usize,
    pub human_count: usize,
    pub max_players: usize,
    pub is_locked: bool,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    access_code: AccessCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn access_code(&self) -> AccessCode {
        self.access_code
    }

    /// Sends a command and waits for its reply.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.access_code))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.access_code))
    }

    pub async fn join(&self, player: Player, sender: PlayerSender) -> Result<Player, RoomError> {
        self.request(|reply| RoomCommand::Join {
            player,
            sender,
            reply,
        })
        .await?
    }

    pub async fn add_virtual(
        &self,
        requester: PlayerId,
        behavior: AiBehavior,
    ) -> Result<Player, RoomError> {
        self.request(|reply| RoomCommand::AddVirtual {
            requester,
            behavior,
            reply,
        })
        .await?
    }

    pub async fn leave(&self, player_id: PlayerId) -> Result<Departure, RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    pub async fn kick(&self, requester: PlayerId, target: PlayerId) -> Result<Departure, RoomError> {
        self.request(|reply| RoomCommand::Kick {
            requester,
            target,
            reply,
        })
        .await?
    }

    pub async fn lock(&self, requester: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Lock { requester, reply })
            .await?
    }

    pub async fn unlock(&self, requester: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Unlock { requester, reply })
            .await?
    }

    pub async fn start(&self, requester: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { requester, reply })
            .await?
    }

    /// Fire-and-forget delivery of an in-game action.
    pub async fn send_game_message(
        &self,
        sender: PlayerId,
        msg: ClientMessage,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Game { sender, msg })
            .await
            .map_err(|_| RoomError::Unavailable(self.access_code))
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.access_code))
    }
}

enum Event {
    Command(Option<RoomCommand>),
    Tick,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    game: Option<GameSession>,
    config: GameConfig,
    /// Outbound channels of human players.
    senders: HashMap<PlayerId, PlayerSender>,
    clock: TickScheduler,
    rng: StdRng,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    fn access_code(&self) -> AccessCode {
        self.room.access_code()
    }

    async fn run(mut self) {
        let access_code = self.access_code();
        tracing::info!(%access_code, "room actor started");

        let organizer = self.room.organizer();
        self.dispatch(vec![
            (
                Recipient::Player(organizer),
                ServerMessage::RoomCreated { access_code },
            ),
            (Recipient::All, self.room.state_message()),
        ]);

        loop {
            let event = tokio::select! {
                cmd = self.receiver.recv() => Event::Command(cmd),
                _ = self.clock.wait_for_tick() => Event::Tick,
            };
            match event {
                Event::Command(Some(RoomCommand::Shutdown)) | Event::Command(None) => {
                    self.dispatch(vec![(Recipient::All, ServerMessage::RoomClosed)]);
                    break;
                }
                Event::Command(Some(cmd)) => self.handle_command(cmd),
                Event::Tick => self.on_tick(),
            }
        }

        tracing::info!(%access_code, "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                player,
                sender,
                reply,
            } => {
                let result = self.handle_join(player, sender);
                let _ = reply.send(result);
            }
            RoomCommand::AddVirtual {
                requester,
                behavior,
                reply,
            } => {
                let result = self.handle_add_virtual(requester, behavior);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.handle_leave(player_id);
                let _ = reply.send(result);
            }
            RoomCommand::Kick {
                requester,
                target,
                reply,
            } => {
                let result = self.handle_kick(requester, target);
                let _ = reply.send(result);
            }
            RoomCommand::Lock { requester, reply } => {
                let result = self.room.lock(requester).map(|()| {
                    self.dispatch(vec![(
                        Recipient::All,
                        ServerMessage::RoomLocked {
                            message: "the organizer locked the room".into(),
                            is_locked: true,
                        },
                    )]);
                });
                let _ = reply.send(result);
            }
            RoomCommand::Unlock { requester, reply } => {
                let result = self.room.unlock(requester).map(|()| {
                    self.dispatch(vec![(
                        Recipient::All,
                        ServerMessage::RoomUnlocked {
                            message: "the organizer unlocked the room".into(),
                            is_locked: false,
                        },
                    )]);
                });
                let _ = reply.send(result);
            }
            RoomCommand::Start { requester, reply } => {
                let result = self.handle_start(requester);
                let _ = reply.send(result);
            }
            RoomCommand::Game { sender, msg } => self.handle_game_message(sender, msg),
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            // handled by the run loop
            RoomCommand::Shutdown => {}
        }
    }

    fn handle_join(&mut self, player: Player, sender: PlayerSender) -> Result<Player, RoomError> {
        let was_locked = self.room.is_locked();
        let joined = self.room.add_player(player)?.clone();
        self.senders.insert(joined.id, sender);
        tracing::info!(
            access_code = %self.access_code(),
            player_id = %joined.id,
            players = self.room.players().len(),
            "player joined"
        );

        let mut out = vec![
            (
                Recipient::Player(joined.id),
                ServerMessage::JoinGameResponse {
                    access_code: self.access_code(),
                    valid: true,
                    reason: None,
                },
            ),
            (Recipient::All, self.room.state_message()),
        ];
        if !was_locked && self.room.is_locked() {
            out.push((
                Recipient::All,
                ServerMessage::RoomLocked {
                    message: "the room is full".into(),
                    is_locked: true,
                },
            ));
        }
        self.dispatch(out);
        Ok(joined)
    }

    fn handle_add_virtual(
        &mut self,
        requester: PlayerId,
        behavior: AiBehavior,
    ) -> Result<Player, RoomError> {
        let id = PlayerId(NEXT_VIRTUAL_ID.fetch_add(1, Ordering::Relaxed));
        let name = match behavior {
            AiBehavior::Aggressive => "Aggressive bot",
            AiBehavior::Defensive => "Defensive bot",
        };
        let player = Player::virtual_player(id, name.into(), behavior);
        let added = self.room.add_virtual_player(requester, player)?.clone();
        tracing::info!(access_code = %self.access_code(), player_id = %id, ?behavior, "virtual player added");
        self.dispatch(vec![(Recipient::All, self.room.state_message())]);
        Ok(added)
    }

    /// Lobby notifications after someone left, in the order clients apply
    /// them.
    fn departure_messages(&self, departure: &Departure) -> Vec<Outbound> {
        let mut out = Vec::new();
        if let Some(new_organizer) = departure.new_organizer {
            out.push((
                Recipient::All,
                ServerMessage::OrganizerLeft { new_organizer },
            ));
        }
        if departure.unlocked {
            out.push((
                Recipient::All,
                ServerMessage::RoomUnlocked {
                    message: "a place is free again".into(),
                    is_locked: false,
                },
            ));
        }
        out.push((Recipient::All, self.room.state_message()));
        out
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<Departure, RoomError> {
        let departure = self.room.remove_player(player_id)?;
        self.senders.remove(&player_id);
        tracing::info!(
            access_code = %self.access_code(),
            %player_id,
            humans_left = departure.humans_left,
            "player left"
        );

        let mut out = self.departure_messages(&departure);
        if let Some(game) = self.game.as_mut() {
            out.extend(game.remove_player(player_id));
        }
        self.dispatch(out);
        self.check_finished();
        Ok(departure)
    }

    fn handle_kick(
        &mut self,
        requester: PlayerId,
        target: PlayerId,
    ) -> Result<Departure, RoomError> {
        let departure = self.room.kick(requester, target)?;
        // the kicked player still has a sender here and sees the notice
        self.dispatch(vec![(
            Recipient::All,
            ServerMessage::PlayerKicked {
                kicked_player_id: target,
            },
        )]);
        self.senders.remove(&target);
        tracing::info!(access_code = %self.access_code(), %target, "player kicked");

        self.dispatch(self.departure_messages(&departure));
        Ok(departure)
    }

    fn handle_start(&mut self, requester: PlayerId) -> Result<(), RoomError> {
        self.room.check_start(requester)?;
        let (game, out) = GameSession::start(
            self.access_code(),
            &self.config,
            self.room.map(),
            self.room.players(),
            &mut self.rng,
        )?;
        self.room.begin_game();
        self.game = Some(game);
        self.clock.start();
        self.dispatch(out);
        Ok(())
    }

    fn handle_game_message(&mut self, sender: PlayerId, msg: ClientMessage) {
        if self.room.player(sender).is_none() {
            tracing::warn!(access_code = %self.access_code(), %sender, "message from non-member, ignoring");
            return;
        }
        let Some(game) = self.game.as_mut() else {
            self.send_to(sender, &ServerMessage::error("the game has not started"));
            return;
        };

        match game.handle(sender, msg, &mut self.rng) {
            Ok(out) => self.dispatch(out),
            Err(err) => {
                tracing::debug!(access_code = %self.access_code(), %sender, %err, "action rejected");
                self.send_to(sender, &ServerMessage::error(err.to_string()));
            }
        }
        self.check_finished();
    }

    fn on_tick(&mut self) {
        let out = match self.game.as_mut() {
            Some(game) => game.tick(&mut self.rng),
            None => return,
        };
        self.dispatch(out);
        self.check_finished();
    }

    /// Moves the room to `Finished` once the game has a winner.
    fn check_finished(&mut self) {
        let finished = self.game.as_ref().is_some_and(GameSession::is_finished);
        if finished && self.room.transition_to(RoomState::Finished) {
            self.clock.stop();
            tracing::info!(access_code = %self.access_code(), "game finished");
        }
    }

    /// Dispatches outbound messages to the correct recipients.
    fn dispatch(&self, msgs: Vec<Outbound>) {
        for (recipient, msg) in msgs {
            match recipient {
                Recipient::All => {
                    for pid in self.senders.keys() {
                        self.send_to(*pid, &msg);
                    }
                }
                Recipient::Player(pid) => self.send_to(pid, &msg),
            }
        }
    }

    /// Drops the message silently if the connection is gone.
    fn send_to(&self, player_id: PlayerId, msg: &ServerMessage) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(msg.clone());
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            access_code: self.access_code(),
            map_id: self.room.map_id().to_string(),
            state: self.room.state(),
            organizer: self.room.organizer(),
            player_count: self.room.players().len(),
            human_count: self.room.human_count(),
            max_players: self.room.max_players(),
            is_locked: self.room.is_locked(),
        }
    }
}

/// Spawns a room actor task and returns a handle to it.
pub(crate) fn spawn_room(
    room: Room,
    organizer_sender: PlayerSender,
    config: GameConfig,
    rng: StdRng,
) -> RoomHandle {
    let access_code = room.access_code();
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let mut senders = HashMap::new();
    senders.insert(room.organizer(), organizer_sender);

    let actor = RoomActor {
        room,
        game: None,
        clock: TickScheduler::with_period(config.tick_period()),
        config,
        senders,
        rng,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        access_code,
        sender: tx,
    }
}
