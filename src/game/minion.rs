use std::collections::BTreeSet;

use tracing::{debug, error};

use crate::{
    card::{action::Action, Hooks, MinionDefinition},
    enums::{Attribute, CardId, MinionId, MinionInstanceId, PlayerId, Trigger},
    exception::{GameError, GameResult},
    server::protocol::{AddMinion, RemoveMinion, ServerMessage, UpdateMinion},
};

use super::{
    interpreter::{ActionContext, Effect},
    Game, Target,
};

/// 보드 위에 있는 하수인 인스턴스입니다.
///
/// 필드는 게임 모듈 안에서만 바꿀 수 있고, 모든 변경은 `Game` 의 메서드를 거쳐
/// 양쪽 화면에 전달됩니다.
#[derive(Debug, Clone)]
pub struct Minion {
    pub(super) instance_id: MinionInstanceId,
    pub(super) definition_id: MinionId,
    pub(super) owner: PlayerId,
    pub(super) attack: i32,
    pub(super) health: i32,
    pub(super) max_health: i32,
    pub(super) attributes: BTreeSet<Attribute>,
    pub(super) hooks: Hooks,
    pub(super) can_attack: bool,
}

impl Minion {
    pub(super) fn from_definition(
        definition: &MinionDefinition,
        instance_id: MinionInstanceId,
        owner: PlayerId,
    ) -> Self {
        let can_attack = definition.attributes.contains(&Attribute::Charge);
        Self {
            instance_id,
            definition_id: definition.id,
            owner,
            attack: definition.attack,
            health: definition.health,
            max_health: definition.health,
            attributes: definition.attributes.clone(),
            hooks: definition.hooks.clone(),
            can_attack,
        }
    }

    pub fn instance_id(&self) -> MinionInstanceId {
        self.instance_id
    }

    pub fn definition_id(&self) -> MinionId {
        self.definition_id
    }

    pub fn attack(&self) -> i32 {
        self.attack
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn attributes(&self) -> &BTreeSet<Attribute> {
        &self.attributes
    }

    pub fn has_attribute(&self, attribute: Attribute) -> bool {
        self.attributes.contains(&attribute)
    }

    pub fn can_attack(&self) -> bool {
        self.can_attack
    }

    pub fn hook(&self, trigger: Trigger) -> Option<&[Action]> {
        self.hooks.get(&trigger).map(Vec::as_slice)
    }
}

impl Game {
    /// 하수인을 소환합니다. 보드가 가득 찼으면 아무 것도 하지 않고 None 을 돌려줍니다.
    pub(crate) fn spawn_minion(
        &mut self,
        owner: PlayerId,
        minion_id: MinionId,
        position: Option<usize>,
        card_id: Option<CardId>,
    ) -> GameResult<Option<MinionInstanceId>> {
        let definition = self
            .catalog
            .minion(minion_id)
            .cloned()
            .ok_or(GameError::UnknownMinion(minion_id))?;
        let max_minions = self.rules.max_minions;
        match self.player(owner) {
            Some(player) if player.minions.len() >= max_minions => {
                debug!(
                    "Board of player {} is full, minion {} is not spawned",
                    owner, minion_id
                );
                return Ok(None);
            }
            Some(_) => {}
            None => return Err(GameError::NotInGame),
        }

        let instance_id = self.next_minion_id();
        let minion = Minion::from_definition(&definition, instance_id, owner);
        let has_attack = minion.can_attack;

        let Some(player) = self.player_mut(owner) else {
            return Err(GameError::NotInGame);
        };
        let index = position
            .unwrap_or(player.minions.len())
            .min(player.minions.len());
        player.minions.insert(index, minion);

        debug!(
            "Player {} spawned {} (instance {}) at {}",
            owner, definition.name, instance_id, index
        );
        self.broadcast(ServerMessage::AddMinion(AddMinion {
            player_id: owner,
            minion_instance_id: instance_id,
            minion_id,
            has_attack,
            card_id,
            position: index,
        }));
        Ok(Some(instance_id))
    }

    /// 공격력은 0 미만이 되지 않습니다. 값이 바뀐 경우에만 알립니다.
    pub(crate) fn set_minion_attack(&mut self, instance_id: MinionInstanceId, value: i32) {
        let Some(minion) = self.find_minion_mut(instance_id) else {
            return;
        };
        let attack = value.max(0);
        if minion.attack == attack {
            return;
        }
        minion.attack = attack;
        let owner = minion.owner;
        self.broadcast(ServerMessage::UpdateMinion(UpdateMinion {
            player_id: owner,
            minion_instance_id: instance_id,
            attack: Some(attack),
            ..Default::default()
        }));
    }

    /// 최대 체력을 올리고 같은 만큼 회복시킵니다.
    ///
    /// 음수 강화는 최대 체력만 줄이고 현재 체력을 그 값으로 맞춥니다. 피해가 아니므로
    /// 보호막이나 피해 훅을 거치지 않습니다.
    pub(crate) fn buff_minion_health(
        &mut self,
        instance_id: MinionInstanceId,
        amount: i32,
        source: Option<MinionInstanceId>,
    ) -> GameResult<()> {
        let Some(minion) = self.find_minion_mut(instance_id) else {
            return Ok(());
        };
        minion.max_health = (minion.max_health + amount).max(1);
        if amount >= 0 {
            let health = minion.health + amount;
            return self.set_minion_health(instance_id, health, source);
        }

        if minion.health <= minion.max_health {
            return Ok(());
        }
        minion.health = minion.max_health;
        let (owner, health) = (minion.owner, minion.health);
        self.broadcast(ServerMessage::UpdateMinion(UpdateMinion {
            player_id: owner,
            minion_instance_id: instance_id,
            health: Some(health),
            attack_from: source,
            ..Default::default()
        }));
        Ok(())
    }

    /// 하수인 체력 변경 경로입니다.
    ///
    /// [0, max_health] 로 고정하고, 피해라면 보호막이 먼저 막습니다. 피해가 실제로 들어가면
    /// 모든 하수인의 `minion_damage` 훅이 돌고, 체력이 0 이하가 되면 파괴되며, 살아남으면
    /// 자신의 `self_damage` 훅이 돕니다.
    pub(crate) fn set_minion_health(
        &mut self,
        instance_id: MinionInstanceId,
        value: i32,
        source: Option<MinionInstanceId>,
    ) -> GameResult<()> {
        if self.is_ended() {
            return Ok(());
        }
        let Some(minion) = self.find_minion_mut(instance_id) else {
            return Ok(());
        };
        if minion.health <= 0 {
            return Ok(());
        }

        let health = value.clamp(0, minion.max_health);
        let damaged = health < minion.health;
        let owner = minion.owner;

        if damaged && minion.attributes.remove(&Attribute::Shield) {
            debug!("Shield of minion {} absorbed the damage", instance_id);
            let attributes = minion.attributes.iter().copied().collect();
            self.broadcast(ServerMessage::UpdateMinion(UpdateMinion {
                player_id: owner,
                minion_instance_id: instance_id,
                attributes: Some(attributes),
                attack_from: source,
                ..Default::default()
            }));
            return Ok(());
        }
        if health == minion.health {
            return Ok(());
        }
        minion.health = health;

        if damaged {
            self.fire_damage_watchers(owner, instance_id)?;
        }

        let Some(minion) = self.find_minion(instance_id) else {
            return Ok(());
        };
        if minion.health <= 0 {
            return self.destroy_minion(instance_id, source, true);
        }

        if damaged {
            self.fire_hook(instance_id, Trigger::SelfDamage, Target::Minion(instance_id))?;
        }

        let Some(minion) = self.find_minion(instance_id) else {
            return Ok(());
        };
        let (health, attributes) = (minion.health, minion.attributes.iter().copied().collect());
        self.broadcast(ServerMessage::UpdateMinion(UpdateMinion {
            player_id: owner,
            minion_instance_id: instance_id,
            health: Some(health),
            attributes: Some(attributes),
            attack_from: source,
            ..Default::default()
        }));
        Ok(())
    }

    /// 피해를 입은 하수인의 소유자 보드부터, 그 다음 상대 보드의 `minion_damage` 훅을 실행합니다.
    fn fire_damage_watchers(
        &mut self,
        owner: PlayerId,
        damaged: MinionInstanceId,
    ) -> GameResult<()> {
        let opponent = self.require_opponent(owner)?;
        for side in [owner, opponent] {
            let watchers = self.require_player(side)?.minion_ids();
            for watcher in watchers {
                if self.is_ended() {
                    return Ok(());
                }
                self.fire_hook(watcher, Trigger::MinionDamage, Target::Minion(damaged))?;
            }
        }
        Ok(())
    }

    /// 하수인을 보드에서 제거합니다.
    ///
    /// `fire_events` 가 참이면 죽음 훅, 아군의 `friendly_death`, 상대의 `opponent_death`
    /// 순서로 실행합니다. 교체(replace)처럼 죽음이 아닌 제거에는 거짓을 넘깁니다.
    /// 죽음 훅은 하수인이 보드에 있을 때 해석되므로 자신을 대상으로 삼을 수 있습니다.
    pub(crate) fn destroy_minion(
        &mut self,
        instance_id: MinionInstanceId,
        source: Option<MinionInstanceId>,
        fire_events: bool,
    ) -> GameResult<()> {
        let Some((seat, index)) = self.locate_minion(instance_id) else {
            return Ok(());
        };
        let owner = self.players[seat].minions[index].owner;
        let death_effects = match self.players[seat].minions[index].hook(Trigger::Death) {
            Some(actions) if fire_events => {
                let actions = actions.to_vec();
                let context = ActionContext::new(owner, self.require_opponent(owner)?)
                    .with_target(Target::Minion(instance_id))
                    .with_source(instance_id)
                    .with_position(index);
                self.resolve_hook(&actions, &context, Trigger::Death, instance_id)?
            }
            _ => Vec::new(),
        };

        let minion = self.players[seat].minions.remove(index);
        debug!("Minion {} of player {} is removed", instance_id, owner);
        self.broadcast(ServerMessage::RemoveMinion(RemoveMinion {
            player_id: owner,
            minion_instance_id: instance_id,
            health: minion.health,
            attack_from: source,
        }));

        if !fire_events {
            return Ok(());
        }
        self.commit(death_effects)?;

        let opponent = self.require_opponent(owner)?;
        for (side, trigger) in [
            (owner, Trigger::FriendlyDeath),
            (opponent, Trigger::OpponentDeath),
        ] {
            let watchers = self.require_player(side)?.minion_ids();
            for watcher in watchers {
                if self.is_ended() {
                    return Ok(());
                }
                self.fire_hook(watcher, trigger, Target::Minion(watcher))?;
            }
        }
        Ok(())
    }

    pub(crate) fn set_can_attack(&mut self, instance_id: MinionInstanceId, can_attack: bool) {
        let Some(minion) = self.find_minion_mut(instance_id) else {
            return;
        };
        if minion.can_attack == can_attack {
            return;
        }
        minion.can_attack = can_attack;
        let owner = minion.owner;
        self.broadcast(ServerMessage::UpdateMinion(UpdateMinion {
            player_id: owner,
            minion_instance_id: instance_id,
            has_attack: Some(can_attack),
            ..Default::default()
        }));
    }

    pub(crate) fn add_attribute(&mut self, instance_id: MinionInstanceId, attribute: Attribute) {
        let Some(minion) = self.find_minion_mut(instance_id) else {
            return;
        };
        if !minion.attributes.insert(attribute) {
            return;
        }
        if attribute == Attribute::Charge {
            minion.can_attack = true;
        }
        let owner = minion.owner;
        let attributes = minion.attributes.iter().copied().collect();
        let has_attack = minion.can_attack;
        self.broadcast(ServerMessage::UpdateMinion(UpdateMinion {
            player_id: owner,
            minion_instance_id: instance_id,
            attributes: Some(attributes),
            has_attack: Some(has_attack),
            ..Default::default()
        }));
    }

    /// 속성과 훅을 모두 제거합니다.
    pub(crate) fn silence(&mut self, instance_id: MinionInstanceId) {
        let Some(minion) = self.find_minion_mut(instance_id) else {
            return;
        };
        minion.attributes.clear();
        minion.hooks.clear();
        let owner = minion.owner;
        self.broadcast(ServerMessage::UpdateMinion(UpdateMinion {
            player_id: owner,
            minion_instance_id: instance_id,
            attributes: Some(Vec::new()),
            ..Default::default()
        }));
    }

    /// 보드 위 하수인의 훅을 실행합니다. 훅을 가진 하수인의 소유자가 행동 주체가 됩니다.
    pub(crate) fn fire_hook(
        &mut self,
        instance_id: MinionInstanceId,
        trigger: Trigger,
        target: Target,
    ) -> GameResult<()> {
        let Some(minion) = self.find_minion(instance_id) else {
            return Ok(());
        };
        let Some(actions) = minion.hook(trigger) else {
            return Ok(());
        };
        let actions = actions.to_vec();
        let owner = minion.owner;
        let context = ActionContext::new(owner, self.require_opponent(owner)?)
            .with_target(target)
            .with_source(instance_id);
        self.run_hook(&actions, &context, trigger, instance_id)
    }

    /// 훅을 해석하고 곧바로 적용합니다.
    pub(crate) fn run_hook(
        &mut self,
        actions: &[Action],
        context: &ActionContext,
        trigger: Trigger,
        instance_id: MinionInstanceId,
    ) -> GameResult<()> {
        let effects = self.resolve_hook(actions, context, trigger, instance_id)?;
        self.commit(effects)
    }

    /// 훅 해석 실패는 카탈로그 오류로 보고 내부 오류가 됩니다.
    pub(crate) fn resolve_hook(
        &self,
        actions: &[Action],
        context: &ActionContext,
        trigger: Trigger,
        instance_id: MinionInstanceId,
    ) -> GameResult<Vec<Effect>> {
        self.resolve(actions, context).map_err(|e| {
            error!(
                "Hook {} of minion {} failed to resolve: {}",
                trigger, instance_id, e
            );
            GameError::internal(format!(
                "hook {} of minion {} failed: {}",
                trigger, instance_id, e
            ))
        })
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
            {"id": 1, "name": "Guard", "attack": 1, "health": 4, "attributes": ["shield"]},
            {"id": 2, "name": "Mouse", "attack": 1, "health": 1, "attributes": ["deathrattle"],
             "hooks": {"death": [{"spawn": [0]}]}},
            {"id": 3, "name": "Watcher", "attack": 1, "health": 5,
             "hooks": {"minion_damage": [{"buff_attack": 1}]}}
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
            seed: Some(3),
        })
        .unwrap()
    }

    fn spawn(game: &mut Game, owner: PlayerId, minion: MinionId) -> MinionInstanceId {
        game.spawn_minion(owner, minion, None, None).unwrap().unwrap()
    }

    #[test]
    fn shield_absorbs_any_amount_of_damage() {
        let mut game = game();
        let guard = spawn(&mut game, 0, 1);

        game.set_minion_health(guard, -10, None).unwrap();

        let minion = game.find_minion(guard).unwrap();
        assert_eq!(minion.health(), 4);
        assert!(!minion.has_attribute(Attribute::Shield));

        game.set_minion_health(guard, 3, None).unwrap();
        assert_eq!(game.find_minion(guard).unwrap().health(), 3);
    }

    #[test]
    fn healing_is_capped_at_maximum_health() {
        let mut game = game();
        let plain = spawn(&mut game, 0, 0);

        game.set_minion_health(plain, 1, None).unwrap();
        game.set_minion_health(plain, 9, None).unwrap();

        assert_eq!(game.find_minion(plain).unwrap().health(), 3);
    }

    #[test]
    fn damage_watchers_see_damage_on_either_board() {
        let mut game = game();
        let _watcher = spawn(&mut game, 0, 3);
        let enemy = spawn(&mut game, 1, 0);

        game.set_minion_health(enemy, 2, None).unwrap();

        let minion = game.find_minion(enemy).unwrap();
        assert_eq!((minion.attack(), minion.health()), (3, 2));
    }

    #[test]
    fn death_hook_spawns_in_the_vacated_slot() {
        let mut game = game();
        let left = spawn(&mut game, 0, 0);
        let mouse = spawn(&mut game, 0, 2);
        let right = spawn(&mut game, 0, 0);

        game.set_minion_health(mouse, 0, None).unwrap();

        let ids = game.player(0).unwrap().minion_ids();
        assert_eq!(ids.len(), 3);
        assert_eq!((ids[0], ids[2]), (left, right));
        assert!(game.find_minion(mouse).is_none());
        assert_eq!(game.find_minion(ids[1]).unwrap().definition_id(), 0);
    }

    #[test]
    fn removed_minions_ignore_further_changes() {
        let mut game = game();
        let plain = spawn(&mut game, 0, 0);
        game.destroy_minion(plain, None, false).unwrap();

        game.set_minion_health(plain, 1, None).unwrap();
        game.set_minion_attack(plain, 5);

        assert!(game.find_minion(plain).is_none());
        assert!(game.player(0).unwrap().minions().is_empty());
    }
}
