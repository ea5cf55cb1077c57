//! 로비
//!
//! 연결된 세션, 매칭 대기열, 진행 중인 게임을 소유하고 클라이언트 메시지를 알맞은 곳으로
//! 보냅니다. 한 번에 하나의 메시지만 처리되도록 `LobbyActor` 가 감싸서 사용합니다.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    card::Catalog,
    enums::{PlayerId, PlayerState},
    exception::{GameError, GameResult},
    game::{bot, rules::GameRules, Game, GameSetup, Phase, SeatSetup},
    server::{
        protocol::{CardList, ClientMessage, ServerMessage},
        queue::MatchQueue,
        sink::{NullSink, SharedSink},
    },
};

const MAX_USERNAME_LEN: usize = 24;
const BOT_NAME: &str = "Bot";

/// 사용자 이름 검증
pub trait Authenticator: Send {
    fn authenticate(&self, username: &str) -> bool;
}

/// 공백을 제외하고 1 자 이상 24 자 이하인 이름을 받아들입니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAuthenticator;

impl Authenticator for DefaultAuthenticator {
    fn authenticate(&self, username: &str) -> bool {
        let name = username.trim();
        !name.is_empty() && name.chars().count() <= MAX_USERNAME_LEN
    }
}

struct Session {
    username: Option<String>,
    state: PlayerState,
    sink: SharedSink,
    game: Option<Uuid>,
}

pub struct Lobby {
    catalog: Arc<Catalog>,
    rules: GameRules,
    authenticator: Box<dyn Authenticator>,
    sessions: HashMap<PlayerId, Session>,
    games: HashMap<Uuid, Game>,
    queue: MatchQueue,
    next_player_id: PlayerId,
    seed: Option<u64>,
    games_created: u64,
}

impl Lobby {
    pub fn new(catalog: Arc<Catalog>, rules: GameRules) -> Self {
        Self {
            catalog,
            rules,
            authenticator: Box::new(DefaultAuthenticator),
            sessions: HashMap::new(),
            games: HashMap::new(),
            queue: MatchQueue::new(),
            next_player_id: 0,
            seed: None,
            games_created: 0,
        }
    }

    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Box::new(authenticator);
        self
    }

    /// 이후 만들어지는 게임의 난수를 고정합니다.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 새 연결을 등록하고 플레이어 id 를 발급합니다.
    pub fn connect(&mut self, sink: SharedSink) -> PlayerId {
        let player_id = self.allocate_player_id();
        self.sessions.insert(
            player_id,
            Session {
                username: None,
                state: PlayerState::Init,
                sink,
                game: None,
            },
        );
        info!("Player {} connected", player_id);
        player_id
    }

    /// 연결 종료. 대기열에서 빼고, 게임 중이었다면 상대의 승리로 끝냅니다.
    pub fn disconnect(&mut self, player_id: PlayerId) {
        let Some(session) = self.sessions.get_mut(&player_id) else {
            return;
        };
        session.state = PlayerState::Disconnected;
        let game_id = session.game.take();
        self.queue.remove(player_id);

        if let Some(game_id) = game_id {
            if let Some(game) = self.games.get_mut(&game_id) {
                game.forfeit(player_id);
            }
            self.sync_game(game_id);
        }
        self.sessions.remove(&player_id);
        info!("Player {} disconnected", player_id);
    }

    /// 메시지 하나를 처리합니다. 거부 사유는 `error` 패킷으로 돌려보냅니다.
    pub fn handle(&mut self, player_id: PlayerId, message: ClientMessage) {
        if !self.sessions.contains_key(&player_id) {
            warn!("Message from unknown player {}: {:?}", player_id, message);
            return;
        }
        if let Err(e) = self.dispatch(player_id, message) {
            self.report(player_id, e);
        }
    }

    pub fn state_of(&self, player_id: PlayerId) -> Option<PlayerState> {
        self.sessions.get(&player_id).map(|s| s.state)
    }

    pub fn username_of(&self, player_id: PlayerId) -> Option<&str> {
        self.sessions
            .get(&player_id)
            .and_then(|s| s.username.as_deref())
    }

    pub fn game_of(&self, player_id: PlayerId) -> Option<&Game> {
        self.sessions
            .get(&player_id)
            .and_then(|s| s.game)
            .and_then(|game_id| self.games.get(&game_id))
    }

    pub fn queue(&self) -> &MatchQueue {
        &self.queue
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    fn allocate_player_id(&mut self) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        id
    }

    fn dispatch(&mut self, player_id: PlayerId, message: ClientMessage) -> GameResult<()> {
        if let ClientMessage::Auth { username } = message {
            return self.authenticate(player_id, username);
        }
        if self.username_of(player_id).is_none() {
            return Err(GameError::NotAuthenticated);
        }

        match message {
            ClientMessage::Auth { .. } => Ok(()),
            ClientMessage::Queue => self.enqueue(player_id),
            ClientMessage::Dequeue => self.dequeue(player_id),
            ClientMessage::PlayBot => self.start_bot_game(player_id),
            ClientMessage::LoadCards => {
                self.send(
                    player_id,
                    ServerMessage::CardList(CardList {
                        cards: self.catalog.cards().iter().map(|c| (**c).clone()).collect(),
                        minions: self.catalog.minions().iter().map(|m| (**m).clone()).collect(),
                    }),
                );
                Ok(())
            }
            ClientMessage::EndTurn => self.with_game(player_id, |game| {
                if !game.switch_turns(player_id)? {
                    debug!("Player {} ended a turn out of order", player_id);
                }
                Ok(())
            }),
            ClientMessage::PlayCard {
                card,
                target,
                position,
            } => self.with_game(player_id, |game| {
                game.play_card(player_id, card, target, position)
            }),
            ClientMessage::DoMulligan { redo_mask } => {
                self.with_game(player_id, |game| game.do_mulligan(player_id, &redo_mask))
            }
            ClientMessage::DoAttack { from, to } => {
                self.with_game(player_id, |game| game.do_attack(player_id, from, to))
            }
        }
    }

    fn authenticate(&mut self, player_id: PlayerId, username: String) -> GameResult<()> {
        if self.username_of(player_id).is_some() {
            return Err(GameError::AlreadyAuthenticated);
        }
        if !self.authenticator.authenticate(&username) {
            warn!("Player {} failed to authenticate as {:?}", player_id, username);
            if let Some(session) = self.sessions.get(&player_id) {
                session
                    .sink
                    .send(ServerMessage::Error(GameError::AuthenticationFailed.to_string()));
                session.sink.close();
            }
            return Ok(());
        }

        let username = username.trim().to_string();
        info!("Player {} authenticated as {}", player_id, username);
        if let Some(session) = self.sessions.get_mut(&player_id) {
            session.username = Some(username);
        }
        self.set_state(player_id, PlayerState::Lobby);
        Ok(())
    }

    fn enqueue(&mut self, player_id: PlayerId) -> GameResult<()> {
        self.require_idle(player_id)?;
        self.queue.enqueue(player_id);
        self.set_state(player_id, PlayerState::Queued);
        debug!("Player {} queued ({} waiting)", player_id, self.queue.len());

        if let Some((first, second)) = self.queue.pop_pair() {
            self.start_game(first, Some(second))?;
        }
        Ok(())
    }

    fn dequeue(&mut self, player_id: PlayerId) -> GameResult<()> {
        if !self.queue.remove(player_id) {
            return Err(GameError::NotQueued);
        }
        self.set_state(player_id, PlayerState::Lobby);
        Ok(())
    }

    fn start_bot_game(&mut self, player_id: PlayerId) -> GameResult<()> {
        if self.queue.remove(player_id) {
            self.set_state(player_id, PlayerState::Lobby);
        }
        self.require_idle(player_id)?;
        self.start_game(player_id, None)
    }

    fn require_idle(&self, player_id: PlayerId) -> GameResult<()> {
        let session = self.sessions.get(&player_id).ok_or(GameError::NotInGame)?;
        if session.game.is_some() {
            return Err(GameError::AlreadyInGame);
        }
        if session.state == PlayerState::Queued {
            return Err(GameError::AlreadyQueued);
        }
        Ok(())
    }

    /// 두 세션(또는 세션과 봇)으로 게임을 만듭니다.
    fn start_game(&mut self, first: PlayerId, second: Option<PlayerId>) -> GameResult<()> {
        let seat_a = self.seat_for(first)?;
        let seat_b = match second {
            Some(player_id) => self.seat_for(player_id)?,
            None => SeatSetup {
                id: self.allocate_player_id(),
                username: BOT_NAME.to_string(),
                sink: Arc::new(NullSink),
                deck: None,
                bot: true,
            },
        };
        let bot_id = second.is_none().then_some(seat_b.id);

        let seed = self.seed.map(|seed| seed.wrapping_add(self.games_created));
        self.games_created += 1;
        let mut game = match Game::new(GameSetup {
            catalog: self.catalog.clone(),
            rules: self.rules.clone(),
            seats: [seat_a, seat_b],
            seed,
        }) {
            Ok(game) => game,
            Err(e) => {
                for player_id in [Some(first), second].into_iter().flatten() {
                    self.set_state(player_id, PlayerState::Lobby);
                }
                return Err(e);
            }
        };
        if let Some(bot_id) = bot_id {
            bot::mulligan(&mut game, bot_id)?;
        }

        let game_id = game.id();
        for player_id in [Some(first), second].into_iter().flatten() {
            if let Some(session) = self.sessions.get_mut(&player_id) {
                session.game = Some(game_id);
            }
        }
        self.games.insert(game_id, game);
        self.sync_game(game_id);
        Ok(())
    }

    fn seat_for(&self, player_id: PlayerId) -> GameResult<SeatSetup> {
        let session = self.sessions.get(&player_id).ok_or(GameError::NotInGame)?;
        Ok(SeatSetup {
            id: player_id,
            username: session.username.clone().unwrap_or_default(),
            sink: session.sink.clone(),
            deck: None,
            bot: false,
        })
    }

    /// 플레이어가 속한 게임에 작업을 적용하고, 봇 차례를 진행한 뒤 세션 상태를 맞춥니다.
    fn with_game<F>(&mut self, player_id: PlayerId, f: F) -> GameResult<()>
    where
        F: FnOnce(&mut Game) -> GameResult<()>,
    {
        let game_id = self
            .sessions
            .get(&player_id)
            .and_then(|s| s.game)
            .ok_or(GameError::NotInGame)?;
        let game = self.games.get_mut(&game_id).ok_or(GameError::NotInGame)?;

        let result = f(game).and_then(|()| bot::run(game));
        self.sync_game(game_id);
        result
    }

    /// 게임 단계에 맞춰 세션 상태를 갱신합니다. 끝난 게임은 정리하고 로비로 돌려보냅니다.
    fn sync_game(&mut self, game_id: Uuid) {
        let Some(game) = self.games.get(&game_id) else {
            return;
        };
        let phase = game.phase();
        let players = game.player_ids();

        let state = match phase {
            Phase::Mulligan => PlayerState::Mulligan,
            Phase::Active { .. } => PlayerState::Active,
            Phase::Ended { .. } => {
                self.games.remove(&game_id);
                for player_id in players {
                    if let Some(session) = self.sessions.get_mut(&player_id) {
                        session.game = None;
                    }
                    self.set_state(player_id, PlayerState::Lobby);
                }
                info!("Game {} closed", game_id);
                return;
            }
        };
        for player_id in players {
            self.set_state(player_id, state);
        }
    }

    fn set_state(&mut self, player_id: PlayerId, state: PlayerState) {
        let Some(session) = self.sessions.get_mut(&player_id) else {
            return;
        };
        if session.state == state || session.state == PlayerState::Disconnected {
            return;
        }
        session.state = state;
        session
            .sink
            .send(ServerMessage::GameState(state.as_str().to_string()));
    }

    fn send(&self, player_id: PlayerId, packet: ServerMessage) {
        if let Some(session) = self.sessions.get(&player_id) {
            session.sink.send(packet);
        }
    }

    fn report(&mut self, player_id: PlayerId, e: GameError) {
        if e.is_user_rejection() {
            warn!("Request of player {} rejected: {}", player_id, e);
            self.send(player_id, ServerMessage::Error(e.to_string()));
            return;
        }
        error!("Failed to handle message of player {}: {}", player_id, e);
        self.send(
            player_id,
            ServerMessage::Error("Internal server error".to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_authenticator_checks_length() {
        let auth = DefaultAuthenticator;
        assert!(auth.authenticate("alice"));
        assert!(auth.authenticate("  bob  "));
        assert!(!auth.authenticate("   "));
        assert!(!auth.authenticate(&"x".repeat(MAX_USERNAME_LEN + 1)));
    }
}
