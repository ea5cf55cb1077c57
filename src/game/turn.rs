use rand::Rng;
use tracing::{debug, info};

use crate::{
    enums::{PlayerId, Trigger},
    exception::{GameError, GameResult},
    server::protocol::{MulliganResult, NextTurn, ServerMessage},
};

use super::{Game, Phase, Target};

impl Game {
    /// 표시된 손패 위치의 카드를 덱의 무작위 카드와 맞바꿉니다. 좌석마다 한 번만 가능합니다.
    ///
    /// 두 좌석이 모두 끝내면 선공을 정하고 게임을 시작합니다.
    pub fn do_mulligan(&mut self, player_id: PlayerId, redo_mask: &[bool]) -> GameResult<()> {
        let player = self.require_player(player_id)?;
        match self.phase {
            Phase::Mulligan => {}
            Phase::Ended { .. } => return Err(GameError::GameOver),
            phase => {
                return Err(GameError::WrongPhase {
                    phase: phase.name(),
                    action: "mulligan",
                })
            }
        }
        if player.mulligan_done {
            return Err(GameError::MulliganAlreadyDone);
        }

        let redo: Vec<usize> = redo_mask
            .iter()
            .take(player.hand.len())
            .enumerate()
            .filter_map(|(index, redo)| redo.then_some(index))
            .collect();
        for index in redo {
            let deck_len = self.require_player(player_id)?.deck.len();
            if deck_len == 0 {
                break;
            }
            let pick = self.rng().gen_range(0..deck_len);
            let Some(player) = self.player_mut(player_id) else {
                return Err(GameError::NotInGame);
            };
            std::mem::swap(&mut player.hand[index], &mut player.deck[pick]);
        }

        let Some(player) = self.player_mut(player_id) else {
            return Err(GameError::NotInGame);
        };
        player.mulligan_done = true;
        let hand = player.hand.clone();
        player.send(ServerMessage::MulliganResult(MulliganResult {
            player_id,
            hand: Some(hand),
        }));
        let opponent = self.require_opponent(player_id)?;
        self.send_to(
            opponent,
            ServerMessage::MulliganResult(MulliganResult {
                player_id,
                hand: None,
            }),
        );
        debug!("Player {} finished the mulligan", player_id);

        if self.players.iter().all(|p| p.mulligan_done) {
            self.start()?;
        }
        Ok(())
    }

    /// 무작위로 선공을 정하고, 후공에게 코인을 준 뒤 첫 턴을 알립니다.
    fn start(&mut self) -> GameResult<()> {
        let first_seat = self.rng().gen_range(0..2);
        let first = self.players[first_seat].id();
        let second = self.players[1 - first_seat].id();

        self.phase = Phase::Active { turn: first };
        if let Some(coin) = self.rules.coin_card {
            self.add_card(second, coin);
        }

        info!("Game {} started, player {} goes first", self.id, first);
        let mana = self.require_player(first)?.mana();
        self.broadcast(ServerMessage::NextTurn(NextTurn { turn: first, mana }));
        Ok(())
    }

    /// 요청한 플레이어가 턴을 가지고 있을 때만 턴을 넘깁니다.
    ///
    /// 턴을 가지지 않은 요청은 아무 일도 하지 않고 `Ok(false)` 를 돌려줍니다.
    pub fn switch_turns(&mut self, requesting: PlayerId) -> GameResult<bool> {
        self.require_player(requesting)?;
        let ending = match self.phase {
            Phase::Active { turn } if turn == requesting => turn,
            _ => {
                debug!(
                    "Player {} asked to end a turn it does not hold",
                    requesting
                );
                return Ok(false);
            }
        };
        let next = self.require_opponent(ending)?;

        self.fire_board_hooks(ending, Trigger::TurnEnd)?;
        if self.is_ended() {
            return Ok(true);
        }

        self.phase = Phase::Active { turn: next };
        let mana = self.require_player(next)?.mana() + 1;
        self.set_mana(next, mana);

        for minion in self.require_player(next)?.minion_ids() {
            self.set_can_attack(minion, true);
        }
        if self.rules.draw_on_turn_start {
            self.draw_card(next);
        }

        self.fire_board_hooks(next, Trigger::TurnStart)?;
        if self.is_ended() {
            return Ok(true);
        }

        let mana = self.require_player(next)?.mana();
        debug!("Turn passed from {} to {}", ending, next);
        self.broadcast(ServerMessage::NextTurn(NextTurn { turn: next, mana }));
        Ok(true)
    }

    /// 한 플레이어 보드의 하수인들이 가진 훅을 보드 순서대로 실행합니다.
    fn fire_board_hooks(&mut self, player_id: PlayerId, trigger: Trigger) -> GameResult<()> {
        for minion in self.require_player(player_id)?.minion_ids() {
            if self.is_ended() {
                break;
            }
            self.fire_hook(minion, trigger, Target::Minion(minion))?;
        }
        Ok(())
    }
}
