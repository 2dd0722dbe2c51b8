use super::ClientCommand;
use super::DedupCache;
use super::RoomError;
use super::RoomId;
use super::RoomState;
use super::RoomStatus;
use super::ServerMessage;
use super::Shared;
use super::SocketId;
use super::TimerGate;
use super::TimerKind;
use super::next_fire;
use super::valid_display_name;
use slap_core::MIN_PLAYERS;
use slap_core::now_ms;
use slap_cards::Seed;
use slap_database::TransitionKind;
use slap_engine::DealOptions;
use slap_engine::Effect;
use slap_engine::GameConfig;
use slap_engine::GameEvent;
use slap_engine::GameState;
use slap_engine::GameStateView;
use slap_engine::GameStatus;
use slap_engine::UserId;
use slap_engine::apply;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;

/// Work items on a room's serialized queue. Client commands, timer fires,
/// and disconnect accounting all pass through here, one at a time.
pub(crate) enum Job {
    Command {
        socket: SocketId,
        command: ClientCommand,
    },
    Timer {
        generation: u64,
        kind: TimerKind,
    },
    Disconnect {
        user_id: UserId,
    },
}

/// Sender half of a room's queue, held by the parlor.
pub(crate) struct RoomHandle {
    pub tx: UnboundedSender<Job>,
}

/// Per-room command loop. Owns the room's timer generation, the late-slap
/// dedup cache, and the bound match id; everything else lives in the store
/// and is reloaded per job, so two workers for distinct rooms never touch
/// the same state.
pub(crate) struct Worker {
    room_id: RoomId,
    shared: Arc<Shared>,
    tx: UnboundedSender<Job>,
    gate: TimerGate,
    dedup: DedupCache,
    active_match: Option<uuid::Uuid>,
}

impl Worker {
    pub fn spawn(room_id: RoomId, shared: Arc<Shared>) -> (RoomHandle, oneshot::Receiver<()>) {
        let (tx, rx) = unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        let worker = Self {
            room_id,
            shared,
            tx: tx.clone(),
            gate: TimerGate::new(),
            dedup: DedupCache::new(),
            active_match: None,
        };
        tokio::spawn(worker.run(rx, done_tx));
        (RoomHandle { tx }, done_rx)
    }

    async fn run(mut self, mut rx: UnboundedReceiver<Job>, done: oneshot::Sender<()>) {
        log::debug!("[room {}] worker started", self.room_id);
        while let Some(job) = rx.recv().await {
            if self.handle(job).await {
                break;
            }
        }
        log::debug!("[room {}] worker stopped", self.room_id);
        let _ = done.send(());
    }

    /// Runs one job to completion. Returns true when the room is gone and
    /// the worker should wind down.
    async fn handle(&mut self, job: Job) -> bool {
        match job {
            Job::Command { socket, command } => self.on_command(socket, command).await,
            Job::Timer { generation, kind } => {
                if !self.gate.accepts(generation) {
                    log::trace!("[room {}] stale timer dropped", self.room_id);
                    return false;
                }
                self.on_timer(kind).await
            }
            Job::Disconnect { user_id } => self.on_disconnect(user_id).await,
        }
    }

    async fn on_command(&mut self, socket: SocketId, command: ClientCommand) -> bool {
        let Some(mut room) = self.load().await else {
            self.send_socket(socket, RoomError::RoomNotFound.into_message())
                .await;
            return true;
        };
        let result = match command {
            ClientCommand::RoomJoin {
                display_name,
                user_id,
                ..
            } => self.join(&mut room, socket, display_name, user_id).await,
            ClientCommand::RoomLeave {} => self.leave(&mut room, socket).await,
            ClientCommand::LobbyReady { ready } => self.ready(&mut room, socket, ready).await,
            ClientCommand::LobbyKick { user_id } => self.kick(&mut room, socket, user_id).await,
            ClientCommand::LobbyStart {} => self.start(&mut room, socket).await,
            ClientCommand::GameStop {} => self.stop(&mut room, socket).await,
            ClientCommand::GameFlip { .. } => {
                let user = match self.caller(socket).await {
                    Ok(user) => user,
                    Err(e) => return self.fail(socket, &room, e).await,
                };
                self.run_engine(&mut room, GameEvent::Flip { user_id: user }, Some(socket))
                    .await
            }
            ClientCommand::GameSlap {
                event_id,
                gesture,
                client_seq,
                client_time,
                offset_ms,
                rtt_ms,
            } => {
                let user = match self.caller(socket).await {
                    Ok(user) => user,
                    Err(e) => return self.fail(socket, &room, e).await,
                };
                if self
                    .dedup
                    .is_late_duplicate(&event_id, &user, now_ms())
                {
                    log::debug!("[room {}] late slap from {} dropped", self.room_id, user);
                    return false;
                }
                self.run_engine(
                    &mut room,
                    GameEvent::slap(
                        user, event_id, gesture, client_seq, client_time, offset_ms, rtt_ms,
                    ),
                    Some(socket),
                )
                .await
            }
            // Handled before the room queue; nothing to do here.
            ClientCommand::RoomCreate { .. } | ClientCommand::Ping { .. } => Ok(false),
        };
        match result {
            Ok(deleted) => deleted,
            Err(error) => self.fail(socket, &room, error).await,
        }
    }

    async fn on_timer(&mut self, kind: TimerKind) -> bool {
        let Some(mut room) = self.load().await else {
            return true;
        };
        let event = match kind {
            TimerKind::SlapDeadline => GameEvent::ResolveSlapWindow,
            TimerKind::TurnTimeout => GameEvent::TurnTimeout,
        };
        match self.run_engine(&mut room, event, None).await {
            Ok(deleted) => deleted,
            Err(error) => {
                log::debug!("[room {}] timer event rejected: {}", self.room_id, error);
                false
            }
        }
    }

    async fn on_disconnect(&mut self, user: UserId) -> bool {
        let Some(mut room) = self.load().await else {
            return true;
        };
        if room.member(&user).is_none() {
            return false;
        }
        log::info!("[room {}] {} disconnected", self.room_id, user);
        room.set_connected(&user, false);
        room.touch(now_ms());
        if self.save(&room).await.is_err() {
            return false;
        }
        self.broadcast_room(&room).await;
        if room.game_state.is_some() {
            self.broadcast_game(&room).await;
        }
        false
    }

    // ------------------------------------------------------------------
    // Command handlers. Each returns Ok(true) when the room was deleted.
    // ------------------------------------------------------------------

    async fn join(
        &mut self,
        room: &mut RoomState,
        socket: SocketId,
        display_name: String,
        user_id: Option<UserId>,
    ) -> Result<bool, RoomError> {
        let name = valid_display_name(&display_name)?;
        let now = now_ms();

        // A recognized returning user gets their seat back in any phase.
        if let Some(user) = user_id.filter(|u| room.member(u).is_some()) {
            if let Some(member) = room.member_mut(&user) {
                member.display_name = name.clone();
            }
            if let Some(game) = room.game_state.as_mut() {
                if let Some(player) = game.players.iter_mut().find(|p| p.user_id == user) {
                    player.display_name = name;
                }
            }
            room.set_connected(&user, true);
            room.touch(now);
            self.save(room).await?;
            self.bind(socket, user, room.room_id).await;
            let _ = self.shared.store.set_user_room(user, room.room_id).await;
            log::info!("[room {}] {} reconnected", self.room_id, user);
            self.broadcast_room(room).await;
            if let Some(game) = &room.game_state {
                let snapshot = GameStateView::project(game, &user);
                self.send_socket(socket, ServerMessage::game_state(snapshot, now_ms()))
                    .await;
            }
            return Ok(false);
        }

        if room.status != RoomStatus::Lobby {
            return Err(RoomError::NotInLobby);
        }
        let user = UserId::default();
        room.add_member(user, name)?;
        room.touch(now);
        self.save(room).await?;
        self.bind(socket, user, room.room_id).await;
        let _ = self.shared.store.set_user_room(user, room.room_id).await;
        self.journal_snapshot(room, TransitionKind::Join).await;
        log::info!("[room {}] {} joined", self.room_id, user);
        self.broadcast_room(room).await;
        Ok(false)
    }

    async fn leave(&mut self, room: &mut RoomState, socket: SocketId) -> Result<bool, RoomError> {
        let user = self.caller(socket).await?;
        if room.member(&user).is_none() {
            return Err(RoomError::RoomNotFound);
        }
        let now = now_ms();

        // Mid-match departures keep the seat so the player can come back;
        // the engine needs stable seat indexes while a match runs.
        if room.status == RoomStatus::InGame {
            room.set_connected(&user, false);
            room.touch(now);
            self.save(room).await?;
            self.unbind(&user).await;
            let _ = self.shared.store.clear_user_room(user).await;
            self.journal_snapshot(room, TransitionKind::Leave).await;
            self.broadcast_room(room).await;
            self.broadcast_game(room).await;
            return Ok(false);
        }

        room.remove_member(&user);
        self.unbind(&user).await;
        let _ = self.shared.store.clear_user_room(user).await;
        if room.is_empty() {
            let _ = self.shared.store.delete(room).await;
            self.journal_snapshot(room, TransitionKind::Delete).await;
            if let Some(repo) = &self.shared.repo {
                repo.mark_room_deleted(room.room_id.uuid()).await;
            }
            self.gate.reset();
            log::info!("[room {}] last member left, room deleted", self.room_id);
            return Ok(true);
        }
        room.touch(now);
        self.save(room).await?;
        self.journal_snapshot(room, TransitionKind::Leave).await;
        log::info!("[room {}] {} left", self.room_id, user);
        self.broadcast_room(room).await;
        Ok(false)
    }

    async fn ready(
        &mut self,
        room: &mut RoomState,
        socket: SocketId,
        ready: bool,
    ) -> Result<bool, RoomError> {
        let user = self.caller(socket).await?;
        if room.status != RoomStatus::Lobby {
            return Err(RoomError::NotInLobby);
        }
        let Some(member) = room.member_mut(&user) else {
            return Err(RoomError::RoomNotFound);
        };
        member.ready = ready;
        room.touch(now_ms());
        self.save(room).await?;
        self.broadcast_room(room).await;
        Ok(false)
    }

    async fn kick(
        &mut self,
        room: &mut RoomState,
        socket: SocketId,
        target: UserId,
    ) -> Result<bool, RoomError> {
        let caller = self.caller(socket).await?;
        if room.status != RoomStatus::Lobby {
            return Err(RoomError::NotInLobby);
        }
        if !room.is_host(&caller) {
            return Err(RoomError::NotHost);
        }
        let Some(member) = room.member(&target) else {
            return Err(RoomError::InvalidTarget);
        };
        if target == caller || room.is_host(&target) || member.ready {
            return Err(RoomError::InvalidTarget);
        }

        // Tell the target before their identity is unbound.
        {
            let registry = self.shared.registry.lock().await;
            registry.send_user(
                &target,
                &ServerMessage::RoomKicked {
                    room_code: room.room_code.clone(),
                    by_user_id: caller,
                },
            );
        }
        room.remove_member(&target);
        self.unbind(&target).await;
        let _ = self.shared.store.clear_user_room(target).await;
        room.touch(now_ms());
        self.save(room).await?;
        self.journal_snapshot(room, TransitionKind::Leave).await;
        log::info!("[room {}] {} kicked by host", self.room_id, target);
        self.broadcast_room(room).await;
        Ok(false)
    }

    async fn start(&mut self, room: &mut RoomState, socket: SocketId) -> Result<bool, RoomError> {
        let caller = self.caller(socket).await?;
        if room.status != RoomStatus::Lobby {
            return Err(RoomError::NotInLobby);
        }
        if !room.is_host(&caller) {
            return Err(RoomError::NotHost);
        }
        if room.players.len() < MIN_PLAYERS {
            return Err(RoomError::Internal);
        }
        let entrants: Vec<(UserId, String)> = room
            .players
            .iter()
            .map(|m| (m.user_id, m.display_name.clone()))
            .collect();
        let seed = Seed::Number(rand::rng().random());
        let mut game = GameState::deal(
            &entrants,
            GameConfig::default(),
            DealOptions {
                seed: Some(seed),
                deck: None,
                shuffle: true,
            },
        )
        .map_err(|e| {
            log::error!("[room {}] deal failed: {}", self.room_id, e);
            RoomError::Internal
        })?;
        for player in game.players.iter_mut() {
            if let Some(member) = room.member(&player.user_id) {
                player.connected = member.connected;
                player.ready = member.ready;
            }
        }
        room.status = RoomStatus::InGame;
        room.game_state = Some(game);
        room.touch(now_ms());
        self.save(room).await?;
        self.journal_snapshot(room, TransitionKind::Start).await;
        if let Some(repo) = self.shared.repo.clone() {
            self.active_match = repo.start_match(room.room_id.uuid()).await;
        }
        log::info!("[room {}] match started", self.room_id);
        self.broadcast_room(room).await;
        self.broadcast_game(room).await;
        self.reschedule(room);
        Ok(false)
    }

    async fn stop(&mut self, room: &mut RoomState, socket: SocketId) -> Result<bool, RoomError> {
        let caller = self.caller(socket).await?;
        match room.status {
            // Stopping a live match is the host's call.
            RoomStatus::InGame => {
                if !room.is_host(&caller) {
                    return Err(RoomError::NotHost);
                }
                if let Some(match_id) = self.active_match.take() {
                    if let Some(repo) = &self.shared.repo {
                        repo.finish_match(
                            match_id,
                            None,
                            serde_json::json!({ "reason": "GAME_STOPPED" }),
                        )
                        .await;
                    }
                }
                self.back_to_lobby(room, TransitionKind::Stop).await?;
                log::info!("[room {}] match stopped by host", self.room_id);
                Ok(false)
            }
            // Any member may fold a finished room back into the lobby.
            RoomStatus::Finished => {
                self.back_to_lobby(room, TransitionKind::Stop).await?;
                Ok(false)
            }
            RoomStatus::Lobby => Err(RoomError::NotInGame),
        }
    }

    async fn back_to_lobby(
        &mut self,
        room: &mut RoomState,
        transition: TransitionKind,
    ) -> Result<(), RoomError> {
        room.status = RoomStatus::Lobby;
        room.game_state = None;
        for member in room.players.iter_mut() {
            member.ready = false;
        }
        room.touch(now_ms());
        self.save(room).await?;
        self.gate.reset();
        self.journal_snapshot(room, transition).await;
        self.broadcast_room(room).await;
        Ok(())
    }

    /// Feeds one event through the pure engine and carries out its verdict:
    /// persist, journal, broadcast effects then snapshots, reschedule.
    async fn run_engine(
        &mut self,
        room: &mut RoomState,
        event: GameEvent,
        socket: Option<SocketId>,
    ) -> Result<bool, RoomError> {
        let Some(game) = room.game_state.as_ref() else {
            return Err(RoomError::NotInGame);
        };
        let now = now_ms();
        let outcome = apply(game, &event, now);
        let mutated = outcome.state.version != game.version;

        if mutated {
            let finished = outcome.state.status == GameStatus::Finished;
            room.game_state = Some(outcome.state.clone());
            if finished {
                room.status = RoomStatus::Finished;
            }
            room.touch(now);
            self.save(room).await?;

            for effect in &outcome.effects {
                if let Some(message) = ServerMessage::from_effect(effect) {
                    self.broadcast_all(room, message).await;
                }
                self.journal_effect(effect).await;
                if let Effect::SlapResult {
                    event_id,
                    ordered_user_ids,
                    ..
                } = effect
                {
                    self.dedup
                        .record(event_id.clone(), now, ordered_user_ids.clone());
                }
                if let Effect::GameFinished { winner_user_id } = effect {
                    if let Some(match_id) = self.active_match.take() {
                        if let Some(repo) = &self.shared.repo {
                            repo.finish_match(
                                match_id,
                                Some(winner_user_id.uuid()),
                                serde_json::json!({ "reason": "WIN" }),
                            )
                            .await;
                        }
                    }
                    self.journal_snapshot(room, TransitionKind::Finish).await;
                    log::info!("[room {}] match won by {}", self.room_id, winner_user_id);
                }
            }

            self.broadcast_room(room).await;
            self.broadcast_game(room).await;
            self.reschedule(room);
        }

        if let Some(error) = outcome.error {
            let error = RoomError::from(error);
            if let Some(socket) = socket {
                if !error.is_silent() {
                    self.send_socket(socket, error.into_message()).await;
                }
                if error.is_recoverable() {
                    self.resync(room, socket).await;
                }
            } else {
                log::debug!("[room {}] engine rejected timer event: {}", self.room_id, error);
            }
        }
        Ok(false)
    }

    // ------------------------------------------------------------------
    // Plumbing.
    // ------------------------------------------------------------------

    async fn load(&self) -> Option<RoomState> {
        match self.shared.store.room_by_id(self.room_id).await {
            Ok(room) => room,
            Err(e) => {
                log::error!("[room {}] store read failed: {}", self.room_id, e);
                None
            }
        }
    }

    async fn save(&self, room: &RoomState) -> Result<(), RoomError> {
        self.shared.store.save(room).await.map_err(|e| {
            log::error!("[room {}] store write failed: {}", self.room_id, e);
            RoomError::Internal
        })
    }

    /// Resolves the acting user for a socket, insisting it is bound to this
    /// very room.
    async fn caller(&self, socket: SocketId) -> Result<UserId, RoomError> {
        let registry = self.shared.registry.lock().await;
        match registry.binding(socket) {
            Some((user, room)) if room == self.room_id => Ok(user),
            _ => Err(RoomError::RoomNotFound),
        }
    }

    async fn bind(&self, socket: SocketId, user: UserId, room: RoomId) {
        self.shared.registry.lock().await.bind(socket, user, room);
    }

    async fn unbind(&self, user: &UserId) {
        self.shared.registry.lock().await.unbind_user(user);
    }

    async fn send_socket(&self, socket: SocketId, message: ServerMessage) {
        self.shared.registry.lock().await.send(socket, message);
    }

    /// Reports a command failure, resyncing the socket when the client is
    /// probably just behind.
    async fn fail(&self, socket: SocketId, room: &RoomState, error: RoomError) -> bool {
        if !error.is_silent() {
            self.send_socket(socket, error.into_message()).await;
        }
        if error.is_recoverable() {
            self.resync(room, socket).await;
        }
        false
    }

    async fn resync(&self, room: &RoomState, socket: SocketId) {
        let registry = self.shared.registry.lock().await;
        let Some((user, _)) = registry.binding(socket) else {
            return;
        };
        registry.send(socket, ServerMessage::room_state(room.view(), user));
        if let Some(game) = &room.game_state {
            let snapshot = GameStateView::project(game, &user);
            registry.send(socket, ServerMessage::game_state(snapshot, now_ms()));
        }
    }

    async fn broadcast_room(&self, room: &RoomState) {
        let registry = self.shared.registry.lock().await;
        for member in &room.players {
            registry.send_user(
                &member.user_id,
                &ServerMessage::room_state(room.view(), member.user_id),
            );
        }
    }

    async fn broadcast_game(&self, room: &RoomState) {
        let Some(game) = &room.game_state else {
            return;
        };
        let now = now_ms();
        let registry = self.shared.registry.lock().await;
        for member in &room.players {
            let snapshot = GameStateView::project(game, &member.user_id);
            registry.send_user(&member.user_id, &ServerMessage::game_state(snapshot, now));
        }
    }

    async fn broadcast_all(&self, room: &RoomState, message: ServerMessage) {
        let registry = self.shared.registry.lock().await;
        for member in &room.players {
            registry.send_user(&member.user_id, &message);
        }
    }

    async fn journal_snapshot(&self, room: &RoomState, transition: TransitionKind) {
        let Some(repo) = &self.shared.repo else {
            return;
        };
        repo.upsert_room_metadata(
            room.room_id.uuid(),
            &room.room_code,
            room.status.as_str(),
            room.host_user_id.uuid(),
            room.version as i64,
        )
        .await;
        let payload = serde_json::to_value(room.view()).unwrap_or_default();
        repo.write_room_snapshot(room.room_id.uuid(), transition, room.version as i64, payload)
            .await;
    }

    async fn journal_effect(&self, effect: &Effect) {
        let (Some(repo), Some(match_id)) = (&self.shared.repo, self.active_match) else {
            return;
        };
        let payload = match effect {
            // Window opens are not match events; results subsume them.
            Effect::SlapWindowOpen { .. } => return,
            Effect::SlapResult {
                event_id,
                ordered_user_ids,
                loser_user_id,
                reason,
                pile_taken,
            } => serde_json::json!({
                "eventId": event_id,
                "orderedUserIds": ordered_user_ids,
                "loserUserId": loser_user_id,
                "reason": reason,
                "pileTaken": pile_taken,
            }),
            Effect::Penalty {
                user_id,
                kind,
                pile_taken,
            } => serde_json::json!({
                "userId": user_id,
                "penaltyType": kind,
                "pileTaken": pile_taken,
            }),
            Effect::GameFinished { winner_user_id } => serde_json::json!({
                "winnerUserId": winner_user_id,
            }),
        };
        repo.append_match_event(match_id, effect.journal_type(), payload)
            .await;
    }

    /// Arms the room's single one-shot timer for the current state. Every
    /// call bumps the generation, so whatever was pending goes stale.
    fn reschedule(&mut self, room: &RoomState) {
        let generation = self.gate.bump();
        if room.status != RoomStatus::InGame {
            return;
        }
        let Some(game) = &room.game_state else {
            return;
        };
        if let Some((kind, delay)) = next_fire(game, now_ms()) {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                let _ = tx.send(Job::Timer { generation, kind });
            });
        }
    }
}

impl RoomError {
    /// The wire `error` event for this failure.
    pub(crate) fn into_message(self) -> ServerMessage {
        ServerMessage::error(self.code(), self.message())
    }
}
