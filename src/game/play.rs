use tracing::debug;

use crate::{
    card::action::Action,
    enums::{Attribute, CardId, CardKind, MinionInstanceId, PlayerId, Trigger},
    exception::{ActionError, GameError, GameResult},
    server::protocol::{PlayCard, ServerMessage},
};

use super::{
    interpreter::{ActionContext, Effect},
    Game, Target,
};

impl Game {
    /// 손패의 카드를 사용합니다.
    ///
    /// 카드 효과, 하수인 소환, 카드 사용에 반응하는 훅을 모두 먼저 해석한 뒤에 손패에서
    /// 카드를 빼고 한꺼번에 적용합니다. 해석 단계에서 실패하면 상태는 바뀌지 않습니다.
    pub fn play_card(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        target: Target,
        position: Option<usize>,
    ) -> GameResult<()> {
        self.require_turn(player_id, "play a card")?;
        let player = self.require_player(player_id)?;
        let hand_index = player
            .hand
            .iter()
            .position(|id| *id == card_id)
            .ok_or(GameError::CardNotInHand(card_id))?;
        let card = self
            .catalog
            .card(card_id)
            .cloned()
            .ok_or(GameError::UnknownCard(card_id))?;

        if card.cost > player.mana {
            return Err(GameError::NotEnoughMana {
                needed: card.cost,
                available: player.mana,
            });
        }
        if card.target {
            match target {
                Target::None => return Err(GameError::TargetRequired),
                Target::Minion(id) if self.find_minion(id).is_none() => {
                    return Err(ActionError::InvalidTarget(id).into())
                }
                _ => {}
            }
        }
        if card.kind == CardKind::Minion && player.minions.len() >= self.rules.max_minions {
            return Err(GameError::BoardFull);
        }
        let position = position.map(|p| p.min(player.minions.len()));

        let opponent = self.require_opponent(player_id)?;
        let mut context = ActionContext::new(player_id, opponent)
            .with_target(target)
            .with_card(card_id);
        context.position = position;
        let mut effects = self.resolve(&card.actions, &context)?;
        if card.kind == CardKind::Minion {
            effects.push(Effect::Spawn {
                player: player_id,
                minions: card.spawn.clone(),
                position,
                card: Some(card_id),
            });
        }
        effects.extend(self.resolve_play_watchers(player_id, Trigger::PlayerPlayCard)?);
        effects.extend(self.resolve_play_watchers(opponent, Trigger::OpponentPlayCard)?);

        if let Some(player) = self.player_mut(player_id) {
            player.hand.remove(hand_index);
        }
        debug!("Player {} plays {} ({})", player_id, card.name, card_id);
        self.commit(effects)?;

        if self.is_ended() {
            return Ok(());
        }
        let Some(player) = self.player_mut(player_id) else {
            return Err(GameError::NotInGame);
        };
        player.mana = player.mana.saturating_sub(card.cost);
        let player_mana = player.mana;
        self.broadcast(ServerMessage::PlayCard(PlayCard {
            player_mana,
            player_id,
            card_id,
        }));
        Ok(())
    }

    /// 카드 사용에 반응하는 훅을 해석만 합니다. 각 하수인은 자신을 대상으로 합니다.
    fn resolve_play_watchers(
        &self,
        owner: PlayerId,
        trigger: Trigger,
    ) -> GameResult<Vec<Effect>> {
        let opponent = self.require_opponent(owner)?;
        let mut effects = Vec::new();
        for minion in self.require_player(owner)?.minions() {
            let Some(actions) = minion.hook(trigger) else {
                continue;
            };
            let context = ActionContext::new(owner, opponent)
                .with_target(Target::Minion(minion.instance_id()))
                .with_source(minion.instance_id());
            let resolved =
                self.resolve_hook(actions, &context, trigger, minion.instance_id())?;
            effects.extend(resolved);
        }
        Ok(effects)
    }

    /// 자신의 하수인으로 상대 영웅이나 상대 하수인을 공격합니다.
    ///
    /// 하수인끼리 싸우면 공격 전의 공격력으로 서로 피해를 주며, 대상이 먼저 피해를 받습니다.
    pub fn do_attack(
        &mut self,
        player_id: PlayerId,
        from: MinionInstanceId,
        to: Target,
    ) -> GameResult<()> {
        self.require_turn(player_id, "attack")?;
        let opponent = self.require_opponent(player_id)?;
        let attacker = self
            .require_player(player_id)?
            .minion(from)
            .ok_or(GameError::MinionNotFound(from))?;
        if !attacker.can_attack() {
            return Err(GameError::MinionCannotAttack(from));
        }
        let attack = attacker.attack();

        let defenders = self.require_player(opponent)?;
        let taunted = defenders
            .minions()
            .iter()
            .any(|m| m.has_attribute(Attribute::Taunt));

        match to {
            Target::Opponent => {
                if taunted {
                    return Err(GameError::MustAttackTaunt);
                }
                debug!("Minion {} attacks player {}", from, opponent);
                let health = defenders.health();
                self.set_player_health(opponent, health - attack, Some(from))?;
            }
            Target::Minion(id) => {
                let defender = defenders.minion(id).ok_or(GameError::InvalidTarget)?;
                if taunted && !defender.has_attribute(Attribute::Taunt) {
                    return Err(GameError::MustAttackTaunt);
                }
                let counter = defender.attack();
                let health = defender.health();
                debug!("Minion {} attacks minion {}", from, id);

                self.set_minion_health(id, health - attack, Some(from))?;
                if let Some(health) = self.find_minion(from).map(|m| m.health()) {
                    self.set_minion_health(from, health - counter, Some(id))?;
                }
            }
            Target::Player | Target::None => return Err(GameError::InvalidTarget),
        }

        if !self.is_ended() {
            self.set_can_attack(from, false);
        }
        Ok(())
    }

    /// 카드가 지금 사용 가능한지 효과를 적용하지 않고 확인합니다.
    pub fn can_play(&self, player_id: PlayerId, card_id: CardId, target: Target) -> bool {
        let Some(player) = self.player(player_id) else {
            return false;
        };
        let Some(card) = self.catalog.card(card_id) else {
            return false;
        };
        if self.turn() != Some(player_id)
            || card.cost > player.mana
            || !player.hand.contains(&card_id)
            || (card.target && target == Target::None)
            || (card.kind == CardKind::Minion && player.minions.len() >= self.rules.max_minions)
        {
            return false;
        }
        let opponent = match self.opponent_of(player_id) {
            Some(opponent) => opponent,
            None => return false,
        };
        let context = ActionContext::new(player_id, opponent).with_target(target);
        self.resolve(&card.actions, &context).is_ok()
    }

    /// 카드가 대상을 아군 쪽에 쓰는 종류인지 (회복, 강화)
    pub(crate) fn is_friendly_card(&self, card_id: CardId) -> bool {
        self.catalog.card(card_id).is_some_and(|card| {
            card.actions.iter().any(|a| {
                matches!(
                    a,
                    Action::Heal(_)
                        | Action::BuffAttack(_)
                        | Action::BuffHealth(_)
                        | Action::Attribute(_)
                )
            })
        })
    }
}
