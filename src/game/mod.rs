//! 게임 세션 엔진
//!
//! 한 게임의 두 좌석, 턴/멀리건 상태 기계, 하수인 인스턴스 id 발급, 좌석 간 조회와
//! 두 원격 화면으로의 브로드캐스트를 담당합니다. 모든 변경은 한 번의 메시지 처리 안에서
//! 동기적으로 끝납니다.

pub mod bot;
pub mod interpreter;
pub mod minion;
pub mod play;
pub mod player;
pub mod rules;
pub mod turn;

use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use tracing::info;
use uuid::Uuid;

use crate::{
    card::Catalog,
    enums::{CardId, MinionInstanceId, PlayerId},
    exception::{GameError, GameResult},
    server::{
        protocol::{GameEnd, GameInit, ServerMessage},
        sink::SharedSink,
    },
};
use minion::Minion;
use player::Player;
use rules::GameRules;

/// 카드나 훅이 겨냥하는 대상입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// 행동하는 플레이어의 상대 영웅
    Opponent,
    /// 행동하는 플레이어 자신의 영웅
    Player,
    Minion(MinionInstanceId),
    None,
}

/// 게임 진행 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 양쪽 모두 멀리건을 마칠 때까지의 초기 단계
    Mulligan,
    Active { turn: PlayerId },
    /// 종료. 이후의 변경은 모두 거부됩니다.
    Ended { winner: Option<PlayerId> },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Mulligan => "mulligan",
            Phase::Active { .. } => "active",
            Phase::Ended { .. } => "ended",
        }
    }
}

/// 좌석 하나를 만드는 데 필요한 정보
pub struct SeatSetup {
    pub id: PlayerId,
    pub username: String,
    pub sink: SharedSink,
    /// 지정하지 않으면 카탈로그에서 무작위 덱을 만듭니다. 뽑기는 끝에서부터 합니다.
    pub deck: Option<Vec<CardId>>,
    pub bot: bool,
}

pub struct GameSetup {
    pub catalog: Arc<Catalog>,
    pub rules: GameRules,
    pub seats: [SeatSetup; 2],
    /// 테스트에서 결과를 고정하기 위한 시드
    pub seed: Option<u64>,
}

pub struct Game {
    id: Uuid,
    catalog: Arc<Catalog>,
    rules: GameRules,
    players: [Player; 2],
    phase: Phase,
    minion_id_counter: MinionInstanceId,
    rng: StdRng,
}

impl Game {
    /// 두 좌석으로 새 게임을 만들고 시작 손패를 나눠준 뒤 `gameInit` 을 보냅니다.
    /// 게임은 곧바로 멀리건 단계에 들어갑니다.
    pub fn new(setup: GameSetup) -> GameResult<Self> {
        let GameSetup {
            catalog,
            rules,
            seats,
            seed,
        } = setup;
        let [seat_a, seat_b] = seats;
        if seat_a.id == seat_b.id {
            return Err(GameError::internal(format!(
                "both seats have player id {}",
                seat_a.id
            )));
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let build = |seat: SeatSetup, rng: &mut StdRng| -> GameResult<Player> {
            let deck = match seat.deck {
                Some(deck) => deck,
                None => catalog.build_deck(rules.deck_size, rng),
            };
            if let Some(unknown) = deck.iter().find(|id| catalog.card(**id).is_none()) {
                return Err(GameError::UnknownCard(*unknown));
            }
            Ok(Player::new(
                seat.id,
                seat.username,
                seat.sink,
                seat.bot,
                deck,
                &rules,
            ))
        };
        let player_a = build(seat_a, &mut rng)?;
        let player_b = build(seat_b, &mut rng)?;

        let mut game = Self {
            id: Uuid::new_v4(),
            catalog,
            rules,
            players: [player_a, player_b],
            phase: Phase::Mulligan,
            minion_id_counter: 0,
            rng,
        };
        game.deal_opening_hands();

        info!(
            "Game {} created: {} ({}) vs {} ({})",
            game.id,
            game.players[0].username(),
            game.players[0].id(),
            game.players[1].username(),
            game.players[1].id()
        );
        Ok(game)
    }

    fn deal_opening_hands(&mut self) {
        let opening = self.rules.opening_hand.min(self.rules.max_cards);
        for player in self.players.iter_mut() {
            for _ in 0..opening {
                match player.deck.pop() {
                    Some(card) => player.hand.push(card),
                    None => break,
                }
            }
        }

        for seat in 0..2 {
            let (me, other) = (&self.players[seat], &self.players[1 - seat]);
            me.send(ServerMessage::GameInit(GameInit {
                player_id: me.id(),
                opponent_id: other.id(),
                opponent_name: other.username().to_string(),
                hand: me.hand().to_vec(),
                opponent_hand_size: other.hand().len(),
                cards_left: me.deck().len(),
                health: me.health(),
                mana: me.mana(),
            }));
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// 현재 턴을 가진 플레이어. 멀리건 중이거나 종료되었으면 None
    pub fn turn(&self) -> Option<PlayerId> {
        match self.phase {
            Phase::Active { turn } => Some(turn),
            _ => None,
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended { .. })
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            Phase::Ended { winner } => winner,
            _ => None,
        }
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    pub fn player_ids(&self) -> [PlayerId; 2] {
        [self.players[0].id(), self.players[1].id()]
    }

    fn seat_of(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id() == player_id)
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.seat_of(player_id).map(|seat| &self.players[seat])
    }

    pub(crate) fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.seat_of(player_id).map(move |seat| &mut self.players[seat])
    }

    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        self.seat_of(player_id).map(|seat| self.players[1 - seat].id())
    }

    pub(crate) fn require_player(&self, player_id: PlayerId) -> GameResult<&Player> {
        self.player(player_id).ok_or(GameError::NotInGame)
    }

    pub(crate) fn require_opponent(&self, player_id: PlayerId) -> GameResult<PlayerId> {
        self.opponent_of(player_id).ok_or(GameError::NotInGame)
    }

    /// 양쪽 보드에서 하수인을 찾습니다.
    pub fn find_minion(&self, instance_id: MinionInstanceId) -> Option<&Minion> {
        self.players
            .iter()
            .find_map(|p| p.minions.iter().find(|m| m.instance_id() == instance_id))
    }

    pub(crate) fn find_minion_mut(&mut self, instance_id: MinionInstanceId) -> Option<&mut Minion> {
        self.players
            .iter_mut()
            .find_map(|p| p.minions.iter_mut().find(|m| m.instance_id() == instance_id))
    }

    /// (좌석 인덱스, 보드 위치)
    pub(crate) fn locate_minion(&self, instance_id: MinionInstanceId) -> Option<(usize, usize)> {
        self.players.iter().enumerate().find_map(|(seat, p)| {
            p.minions
                .iter()
                .position(|m| m.instance_id() == instance_id)
                .map(|index| (seat, index))
        })
    }

    pub(crate) fn next_minion_id(&mut self) -> MinionInstanceId {
        let id = self.minion_id_counter;
        self.minion_id_counter += 1;
        id
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// 두 원격 화면 모두에게 보냅니다.
    pub(crate) fn broadcast(&self, packet: ServerMessage) {
        self.players[0].send(packet.clone());
        self.players[1].send(packet);
    }

    pub(crate) fn send_to(&self, player_id: PlayerId, packet: ServerMessage) {
        if let Some(player) = self.player(player_id) {
            player.send(packet);
        }
    }

    /// 턴을 가진 플레이어만 통과시킵니다.
    pub(crate) fn require_turn(&self, player_id: PlayerId, action: &'static str) -> GameResult<()> {
        self.require_player(player_id)?;
        match self.phase {
            Phase::Ended { .. } => Err(GameError::GameOver),
            Phase::Mulligan => Err(GameError::WrongPhase {
                phase: self.phase.name(),
                action,
            }),
            Phase::Active { turn } if turn != player_id => Err(GameError::NotYourTurn),
            Phase::Active { .. } => Ok(()),
        }
    }

    /// 게임을 끝냅니다. 이미 끝났다면 아무 일도 하지 않습니다.
    pub fn end(&mut self, winner: Option<PlayerId>, reason: &str) {
        if self.is_ended() {
            return;
        }
        self.phase = Phase::Ended { winner };
        info!(
            "Game {} ended: winner {:?} ({})",
            self.id, winner, reason
        );
        self.broadcast(ServerMessage::GameEnd(GameEnd {
            winner_id: winner,
            reason: reason.to_string(),
        }));
    }

    /// 연결이 끊긴 좌석을 패배 처리합니다.
    pub fn forfeit(&mut self, loser: PlayerId) {
        let winner = self.opponent_of(loser);
        self.end(winner, "opponent disconnected");
    }
}
