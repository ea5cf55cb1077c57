//! interpreter.rs
//!
//! 효과 서술자 목록을 두 단계로 처리합니다.
//!
//! 1. `resolve` : 현재 상태를 읽기만 하면서 모든 서술자를 검증하고 적용할 효과(`Effect`) 목록을 만듭니다.
//!    하나라도 실패하면 아무 효과도 만들어지지 않습니다.
//! 2. `commit` : 만들어진 효과를 순서대로 적용합니다. 게임이 끝나면 남은 효과는 버려집니다.

use rand::{seq::index::sample, Rng};
use tracing::debug;

use crate::{
    card::action::{Action, Predicate},
    enums::{Attribute, CardId, MinionId, MinionInstanceId, PlayerId},
    exception::{ActionError, GameResult},
};

use super::{Game, Target};

/// 서술자를 해석할 때의 문맥입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionContext {
    /// 행동하는 플레이어. 훅이라면 훅을 가진 하수인의 소유자입니다.
    pub actor: PlayerId,
    pub opponent: PlayerId,
    pub target: Target,
    /// 효과를 일으킨 하수인. 클라이언트 연출용(attackFrom)으로 전달됩니다.
    pub source: Option<MinionInstanceId>,
    /// 소환 위치
    pub position: Option<usize>,
    pub card: Option<CardId>,
}

impl ActionContext {
    pub fn new(actor: PlayerId, opponent: PlayerId) -> Self {
        Self {
            actor,
            opponent,
            target: Target::None,
            source: None,
            position: None,
            card: None,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_source(mut self, source: MinionInstanceId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_card(mut self, card: CardId) -> Self {
        self.card = Some(card);
        self
    }
}

/// 해석된 대상
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Hero(PlayerId),
    Minion(MinionInstanceId),
}

/// 검증을 마친, 적용 대기 중인 효과입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Draw {
        player: PlayerId,
        count: u32,
    },
    Heal {
        subject: Subject,
        amount: i32,
        source: Option<MinionInstanceId>,
    },
    Damage {
        subject: Subject,
        amount: i32,
        source: Option<MinionInstanceId>,
    },
    /// 행동 주체의 하수인, 상대 하수인, 상대 영웅, 행동 주체의 영웅 순서로 피해를 줍니다.
    AreaDamage {
        actor: PlayerId,
        opponent: PlayerId,
        amount: i32,
        include_own: bool,
        source: Option<MinionInstanceId>,
    },
    /// 대상은 적용 시점에 고릅니다.
    RandomDamage {
        actor: PlayerId,
        opponent: PlayerId,
        amount: i32,
        include_own: bool,
        source: Option<MinionInstanceId>,
    },
    BuffAttack {
        minion: MinionInstanceId,
        amount: i32,
    },
    BuffHealth {
        minion: MinionInstanceId,
        amount: i32,
        source: Option<MinionInstanceId>,
    },
    BuffAttackAll {
        player: PlayerId,
        amount: i32,
    },
    BuffHealthAll {
        player: PlayerId,
        amount: i32,
        source: Option<MinionInstanceId>,
    },
    Mana {
        player: PlayerId,
        amount: i32,
    },
    Discard {
        player: PlayerId,
        count: u32,
    },
    Spawn {
        player: PlayerId,
        minions: Vec<MinionId>,
        position: Option<usize>,
        card: Option<CardId>,
    },
    Replace {
        minion: MinionInstanceId,
        with: MinionId,
    },
    Destroy {
        minion: MinionInstanceId,
        source: Option<MinionInstanceId>,
    },
    AddAttribute {
        minion: MinionInstanceId,
        attribute: Attribute,
    },
    Silence {
        minion: MinionInstanceId,
    },
    CardCopy {
        player: PlayerId,
        from: PlayerId,
        count: u32,
    },
}

impl Game {
    /// 서술자 목록을 검증하고 효과 목록으로 바꿉니다. 상태는 바꾸지 않습니다.
    pub fn resolve(
        &self,
        actions: &[Action],
        context: &ActionContext,
    ) -> Result<Vec<Effect>, ActionError> {
        let mut effects = Vec::with_capacity(actions.len());
        for action in actions {
            self.resolve_action(action, context, &mut effects)?;
        }
        Ok(effects)
    }

    fn resolve_action(
        &self,
        action: &Action,
        ctx: &ActionContext,
        effects: &mut Vec<Effect>,
    ) -> Result<(), ActionError> {
        let effect = match action {
            Action::Draw(count) => Effect::Draw {
                player: ctx.actor,
                count: *count,
            },
            Action::Heal(amount) => Effect::Heal {
                subject: self.resolve_subject(ctx)?,
                amount: *amount,
                source: ctx.source,
            },
            Action::Damage(amount) => Effect::Damage {
                subject: self.resolve_subject(ctx)?,
                amount: *amount,
                source: ctx.source,
            },
            Action::AllDamage(amount) | Action::AllDamageOpponent(amount) => Effect::AreaDamage {
                actor: ctx.actor,
                opponent: ctx.opponent,
                amount: *amount,
                include_own: matches!(action, Action::AllDamage(_)),
                source: ctx.source,
            },
            Action::RandomDamage(amount) | Action::RandomDamageOpponent(amount) => {
                Effect::RandomDamage {
                    actor: ctx.actor,
                    opponent: ctx.opponent,
                    amount: *amount,
                    include_own: matches!(action, Action::RandomDamage(_)),
                    source: ctx.source,
                }
            }
            Action::BuffAttack(amount) => Effect::BuffAttack {
                minion: self.resolve_minion(ctx)?,
                amount: *amount,
            },
            Action::BuffHealth(amount) => Effect::BuffHealth {
                minion: self.resolve_minion(ctx)?,
                amount: *amount,
                source: ctx.source,
            },
            Action::BuffAttackAll(amount) => Effect::BuffAttackAll {
                player: ctx.actor,
                amount: *amount,
            },
            Action::BuffHealthAll(amount) => Effect::BuffHealthAll {
                player: ctx.actor,
                amount: *amount,
                source: ctx.source,
            },
            Action::Mana(amount) => Effect::Mana {
                player: ctx.actor,
                amount: *amount,
            },
            Action::Discard(count) => Effect::Discard {
                player: ctx.actor,
                count: *count,
            },
            Action::Spawn(minions) => {
                if let Some(unknown) = minions.iter().find(|id| self.catalog.minion(**id).is_none())
                {
                    return Err(ActionError::UnknownMinion(*unknown));
                }
                Effect::Spawn {
                    player: ctx.actor,
                    minions: minions.clone(),
                    position: ctx.position,
                    card: ctx.card,
                }
            }
            Action::Replace(with) => {
                if self.catalog.minion(*with).is_none() {
                    return Err(ActionError::UnknownMinion(*with));
                }
                Effect::Replace {
                    minion: self.resolve_minion(ctx)?,
                    with: *with,
                }
            }
            Action::Destroy => Effect::Destroy {
                minion: self.resolve_minion(ctx)?,
                source: ctx.source,
            },
            Action::Attribute(attribute) => {
                let minion = self.resolve_minion(ctx)?;
                if self
                    .find_minion(minion)
                    .is_some_and(|m| m.has_attribute(*attribute))
                {
                    return Err(ActionError::AttributePresent(*attribute));
                }
                Effect::AddAttribute {
                    minion,
                    attribute: *attribute,
                }
            }
            Action::Silence => Effect::Silence {
                minion: self.resolve_minion(ctx)?,
            },
            Action::CardCopy(count) => Effect::CardCopy {
                player: ctx.actor,
                from: ctx.opponent,
                count: *count,
            },
            Action::If { predicate, then } => {
                let subject = self.resolve_subject(ctx)?;
                if !self.evaluate(predicate, subject) {
                    return Err(ActionError::PredicateFailed);
                }
                for action in then {
                    self.resolve_action(action, ctx, effects)?;
                }
                return Ok(());
            }
        };
        effects.push(effect);
        Ok(())
    }

    fn resolve_subject(&self, ctx: &ActionContext) -> Result<Subject, ActionError> {
        match ctx.target {
            Target::Opponent => Ok(Subject::Hero(ctx.opponent)),
            Target::Player => Ok(Subject::Hero(ctx.actor)),
            Target::Minion(id) if self.find_minion(id).is_some() => Ok(Subject::Minion(id)),
            Target::Minion(id) => Err(ActionError::InvalidTarget(id)),
            Target::None => Err(ActionError::NoTarget),
        }
    }

    fn resolve_minion(&self, ctx: &ActionContext) -> Result<MinionInstanceId, ActionError> {
        match self.resolve_subject(ctx)? {
            Subject::Minion(id) => Ok(id),
            Subject::Hero(_) => Err(ActionError::NotAMinion),
        }
    }

    fn evaluate(&self, predicate: &Predicate, subject: Subject) -> bool {
        let (attack, health, max_health, minion) = match subject {
            Subject::Hero(player) => match self.player(player) {
                Some(p) => (0, p.health(), self.rules.max_health, None),
                None => return false,
            },
            Subject::Minion(id) => match self.find_minion(id) {
                Some(m) => (m.attack(), m.health(), m.max_health(), Some(m)),
                None => return false,
            },
        };
        match predicate {
            Predicate::IsMinion => minion.is_some(),
            Predicate::IsHero => minion.is_none(),
            Predicate::HasAttribute(attribute) => minion.is_some_and(|m| m.has_attribute(*attribute)),
            Predicate::LacksAttribute(attribute) => {
                minion.map_or(true, |m| !m.has_attribute(*attribute))
            }
            Predicate::HealthAtMost(n) => health <= *n,
            Predicate::HealthAtLeast(n) => health >= *n,
            Predicate::AttackAtMost(n) => attack <= *n,
            Predicate::AttackAtLeast(n) => attack >= *n,
            Predicate::Damaged => health < max_health,
        }
    }

    /// 효과를 순서대로 적용합니다.
    pub fn commit(&mut self, effects: Vec<Effect>) -> GameResult<()> {
        for effect in effects {
            if self.is_ended() {
                debug!("Game {} ended, remaining effects are dropped", self.id);
                break;
            }
            self.apply(effect)?;
        }
        Ok(())
    }

    fn apply(&mut self, effect: Effect) -> GameResult<()> {
        debug!("Game {}: applying {:?}", self.id, effect);
        match effect {
            Effect::Draw { player, count } => {
                for _ in 0..count {
                    self.draw_card(player);
                }
            }
            Effect::Heal {
                subject,
                amount,
                source,
            } => self.adjust_health(subject, amount, source)?,
            Effect::Damage {
                subject,
                amount,
                source,
            } => self.adjust_health(subject, -amount, source)?,
            Effect::AreaDamage {
                actor,
                opponent,
                amount,
                include_own,
                source,
            } => {
                let mut subjects = Vec::new();
                if include_own {
                    subjects.extend(self.minion_subjects(actor));
                }
                subjects.extend(self.minion_subjects(opponent));
                subjects.push(Subject::Hero(opponent));
                if include_own {
                    subjects.push(Subject::Hero(actor));
                }
                for subject in subjects {
                    if self.is_ended() {
                        break;
                    }
                    self.adjust_health(subject, -amount, source)?;
                }
            }
            Effect::RandomDamage {
                actor,
                opponent,
                amount,
                include_own,
                source,
            } => {
                let mut pool = self.minion_subjects(opponent);
                pool.push(Subject::Hero(opponent));
                if include_own {
                    pool.extend(self.minion_subjects(actor));
                    pool.push(Subject::Hero(actor));
                }
                let index = self.rng().gen_range(0..pool.len());
                self.adjust_health(pool[index], -amount, source)?;
            }
            Effect::BuffAttack { minion, amount } => {
                if let Some(attack) = self.find_minion(minion).map(|m| m.attack()) {
                    self.set_minion_attack(minion, attack + amount);
                }
            }
            Effect::BuffHealth {
                minion,
                amount,
                source,
            } => self.buff_minion_health(minion, amount, source)?,
            Effect::BuffAttackAll { player, amount } => {
                for minion in self.require_player(player)?.minion_ids() {
                    if let Some(attack) = self.find_minion(minion).map(|m| m.attack()) {
                        self.set_minion_attack(minion, attack + amount);
                    }
                }
            }
            Effect::BuffHealthAll {
                player,
                amount,
                source,
            } => {
                for minion in self.require_player(player)?.minion_ids() {
                    if self.is_ended() {
                        break;
                    }
                    self.buff_minion_health(minion, amount, source)?;
                }
            }
            Effect::Mana { player, amount } => {
                let mana = self.require_player(player)?.mana() as i64 + amount as i64;
                let mana = mana.clamp(0, self.rules.max_mana as i64) as u32;
                self.set_mana(player, mana);
            }
            Effect::Discard { player, count } => self.discard_random(player, count),
            Effect::Spawn {
                player,
                minions,
                position,
                card,
            } => {
                for (offset, minion) in minions.into_iter().enumerate() {
                    let position = position.map(|p| p.saturating_add(offset));
                    self.spawn_minion(player, minion, position, card)?;
                }
            }
            Effect::Replace { minion, with } => {
                let Some((seat, index)) = self.locate_minion(minion) else {
                    return Ok(());
                };
                let owner = self.players[seat].id();
                self.destroy_minion(minion, None, false)?;
                self.spawn_minion(owner, with, Some(index), None)?;
            }
            Effect::Destroy { minion, source } => self.destroy_minion(minion, source, true)?,
            Effect::AddAttribute { minion, attribute } => self.add_attribute(minion, attribute),
            Effect::Silence { minion } => self.silence(minion),
            Effect::CardCopy {
                player,
                from,
                count,
            } => {
                let hand = self.require_player(from)?.hand().to_vec();
                let amount = (count as usize).min(hand.len());
                let picked = sample(self.rng(), hand.len(), amount).into_vec();
                for index in picked {
                    self.add_card(player, hand[index]);
                }
            }
        }
        Ok(())
    }

    fn minion_subjects(&self, player: PlayerId) -> Vec<Subject> {
        self.player(player)
            .map(|p| p.minion_ids().into_iter().map(Subject::Minion).collect())
            .unwrap_or_default()
    }

    fn adjust_health(
        &mut self,
        subject: Subject,
        delta: i32,
        source: Option<MinionInstanceId>,
    ) -> GameResult<()> {
        match subject {
            Subject::Hero(player) => {
                let health = self.require_player(player)?.health();
                self.set_player_health(player, health + delta, source)
            }
            Subject::Minion(id) => match self.find_minion(id).map(|m| m.health()) {
                Some(health) => self.set_minion_health(id, health + delta, source),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        card::Catalog,
        game::{rules::GameRules, GameSetup, SeatSetup},
        server::sink::NullSink,
    };

    const CATALOG: &str = r#"{
        "cards": [{"id": 0, "name": "Filler", "cost": 1, "kind": "spell", "actions": [{"draw": 1}]}],
        "minions": [
            {"id": 0, "name": "Plain", "attack": 2, "health": 3},
            {"id": 1, "name": "Guard", "attack": 1, "health": 4, "attributes": ["shield"]}
        ]
    }"#;

    fn game() -> Game {
        let catalog = Arc::new(Catalog::from_json(CATALOG).unwrap());
        let seat = |id| SeatSetup {
            id,
            username: format!("player{}", id),
            sink: Arc::new(NullSink),
            deck: Some(vec![0; 10]),
            bot: false,
        };
        Game::new(GameSetup {
            catalog,
            rules: GameRules::default(),
            seats: [seat(0), seat(1)],
            seed: Some(1),
        })
        .unwrap()
    }

    #[test]
    fn failed_resolution_produces_nothing() {
        let mut game = game();
        let guard = game.spawn_minion(1, 1, None, None).unwrap().unwrap();
        let ctx = ActionContext::new(0, 1).with_target(Target::Minion(guard));

        let result = game.resolve(
            &[Action::Draw(1), Action::Attribute(Attribute::Shield)],
            &ctx,
        );

        assert_eq!(result, Err(ActionError::AttributePresent(Attribute::Shield)));
        assert_eq!(game.player(0).unwrap().deck().len(), 7);
    }

    #[test]
    fn minion_verbs_reject_hero_targets() {
        let game = game();
        let ctx = ActionContext::new(0, 1).with_target(Target::Opponent);

        assert_eq!(game.resolve(&[Action::Silence], &ctx), Err(ActionError::NotAMinion));
        assert_eq!(
            game.resolve(&[Action::Damage(1)], &ActionContext::new(0, 1)),
            Err(ActionError::NoTarget)
        );
    }

    #[test]
    fn conditional_verbs_check_their_predicate() {
        let mut game = game();
        let plain = game.spawn_minion(1, 0, None, None).unwrap().unwrap();
        let ctx = ActionContext::new(0, 1).with_target(Target::Minion(plain));
        let execute = |limit| Action::If {
            predicate: Predicate::HealthAtMost(limit),
            then: vec![Action::Destroy],
        };

        assert_eq!(
            game.resolve(&[execute(2)], &ctx),
            Err(ActionError::PredicateFailed)
        );

        let effects = game.resolve(&[execute(3)], &ctx).unwrap();
        game.commit(effects).unwrap();
        assert!(game.find_minion(plain).is_none());
    }

    #[test]
    fn health_buffs_raise_the_maximum() {
        let mut game = game();
        let plain = game.spawn_minion(0, 0, None, None).unwrap().unwrap();
        let ctx = ActionContext::new(0, 1).with_target(Target::Minion(plain));

        let effects = game.resolve(&[Action::BuffHealth(2)], &ctx).unwrap();
        game.commit(effects).unwrap();

        let minion = game.find_minion(plain).unwrap();
        assert_eq!((minion.health(), minion.max_health()), (5, 5));
    }

    #[test]
    fn area_damage_hits_both_boards_and_heroes() {
        let mut game = game();
        let mine = game.spawn_minion(0, 0, None, None).unwrap().unwrap();
        let theirs = game.spawn_minion(1, 0, None, None).unwrap().unwrap();

        let effects = game
            .resolve(&[Action::AllDamage(1)], &ActionContext::new(0, 1))
            .unwrap();
        game.commit(effects).unwrap();

        assert_eq!(game.find_minion(mine).unwrap().health(), 2);
        assert_eq!(game.find_minion(theirs).unwrap().health(), 2);
        assert_eq!(game.player(0).unwrap().health(), 29);
        assert_eq!(game.player(1).unwrap().health(), 29);
    }

    #[test]
    fn spawns_remember_the_card_that_caused_them() {
        let game = game();
        let ctx = ActionContext::new(0, 1).with_card(0).with_position(2);

        let effects = game.resolve(&[Action::Spawn(vec![0, 1])], &ctx).unwrap();

        assert_eq!(
            effects,
            vec![Effect::Spawn {
                player: 0,
                minions: vec![0, 1],
                position: Some(2),
                card: Some(0),
            }]
        );
    }

    #[test]
    fn commit_stops_once_the_game_is_over() {
        let mut game = game();
        let effects = vec![
            Effect::Damage {
                subject: Subject::Hero(1),
                amount: 100,
                source: None,
            },
            Effect::Draw {
                player: 0,
                count: 1,
            },
        ];

        game.commit(effects).unwrap();

        assert_eq!(game.winner(), Some(0));
        assert_eq!(game.player(0).unwrap().hand().len(), 3);
    }
}
