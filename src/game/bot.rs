//! 네트워크 연결 없이 좌석을 채우는 간단한 상대
//!
//! 멀리건은 바로 끝내고, 자기 턴에는 낼 수 있는 카드를 내고 공격할 수 있는 하수인으로
//! 공격한 다음 턴을 넘깁니다.

use tracing::{debug, info};

use crate::{
    enums::{Attribute, CardId, PlayerId},
    exception::GameResult,
};

use super::{Game, Phase, Target};

/// 한 턴에 시도하는 카드 사용 횟수의 상한
const MAX_PLAYS_PER_TURN: usize = 20;

pub fn mulligan(game: &mut Game, bot: PlayerId) -> GameResult<()> {
    game.do_mulligan(bot, &[])
}

/// 봇이 턴을 가지고 있으면 한 턴을 진행합니다.
pub fn take_turn(game: &mut Game, bot: PlayerId) -> GameResult<()> {
    if game.turn() != Some(bot) {
        return Ok(());
    }
    play_cards(game, bot)?;
    attack(game, bot)?;
    if !game.is_ended() {
        game.switch_turns(bot)?;
    }
    Ok(())
}

/// 턴을 가진 좌석이 봇인 동안 계속 진행합니다.
pub fn run(game: &mut Game) -> GameResult<()> {
    while let Phase::Active { turn } = game.phase() {
        let is_bot = game.player(turn).is_some_and(|p| p.is_bot());
        if !is_bot {
            break;
        }
        take_turn(game, turn)?;
        // 양쪽이 모두 봇이면 한 턴씩만 진행합니다.
        if game.opponent_of(turn).and_then(|id| game.player(id)).is_some_and(|p| p.is_bot()) {
            break;
        }
    }
    Ok(())
}

fn play_cards(game: &mut Game, bot: PlayerId) -> GameResult<()> {
    for _ in 0..MAX_PLAYS_PER_TURN {
        let Some(player) = game.player(bot) else {
            return Ok(());
        };
        let choice = player.hand().iter().find_map(|card| {
            let target = pick_card_target(game, bot, *card);
            game.can_play(bot, *card, target).then_some((*card, target))
        });
        let Some((card, target)) = choice else {
            return Ok(());
        };

        match game.play_card(bot, card, target, None) {
            Ok(()) => {}
            Err(e) if e.is_user_rejection() => {
                debug!("Bot {} could not play card {}: {}", bot, card, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        if game.is_ended() {
            return Ok(());
        }
    }
    Ok(())
}

fn pick_card_target(game: &Game, bot: PlayerId, card: CardId) -> Target {
    let needs_target = game.catalog().card(card).is_some_and(|c| c.target);
    if !needs_target {
        return Target::None;
    }
    if game.is_friendly_card(card) {
        return game
            .player(bot)
            .and_then(|p| p.minions().first())
            .map(|m| Target::Minion(m.instance_id()))
            .unwrap_or(Target::Player);
    }
    game.opponent_of(bot)
        .and_then(|id| game.player(id))
        .and_then(|p| p.minions().first())
        .map(|m| Target::Minion(m.instance_id()))
        .unwrap_or(Target::Opponent)
}

fn attack(game: &mut Game, bot: PlayerId) -> GameResult<()> {
    let Some(attackers) = game.player(bot).map(|p| {
        p.minions()
            .iter()
            .filter(|m| m.can_attack())
            .map(|m| m.instance_id())
            .collect::<Vec<_>>()
    }) else {
        return Ok(());
    };

    for attacker in attackers {
        if game.is_ended() {
            break;
        }
        let target = game
            .opponent_of(bot)
            .and_then(|id| game.player(id))
            .and_then(|p| p.minions().iter().find(|m| m.has_attribute(Attribute::Taunt)))
            .map(|m| Target::Minion(m.instance_id()))
            .unwrap_or(Target::Opponent);

        if let Err(e) = game.do_attack(bot, attacker, target) {
            if !e.is_user_rejection() {
                return Err(e);
            }
            debug!("Bot {} attack with {} rejected: {}", bot, attacker, e);
        }
    }
    if game.is_ended() {
        info!("Bot {} finished the game", bot);
    }
    Ok(())
}
