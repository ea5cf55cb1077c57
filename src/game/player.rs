use tracing::debug;

use crate::{
    enums::{CardId, MinionInstanceId, PlayerId},
    exception::GameResult,
    server::{
        protocol::{AddCard, DiscardCard, ServerMessage, UpdatePlayer},
        sink::SharedSink,
    },
};

use super::{minion::Minion, rules::GameRules, Game};

/// 한 좌석의 가변 상태입니다. 게임이 소유합니다.
pub struct Player {
    id: PlayerId,
    username: String,
    sink: SharedSink,
    bot: bool,
    pub(super) hand: Vec<CardId>,
    /// 맨 끝이 덱의 맨 위입니다.
    pub(super) deck: Vec<CardId>,
    pub(super) mana: u32,
    pub(super) health: i32,
    pub(super) minions: Vec<Minion>,
    pub(super) mulligan_done: bool,
}

impl Player {
    pub(super) fn new(
        id: PlayerId,
        username: String,
        sink: SharedSink,
        bot: bool,
        deck: Vec<CardId>,
        rules: &GameRules,
    ) -> Self {
        Self {
            id,
            username,
            sink,
            bot,
            hand: Vec::new(),
            deck,
            mana: rules.initial_mana,
            health: rules.initial_health,
            minions: Vec::new(),
            mulligan_done: false,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_bot(&self) -> bool {
        self.bot
    }

    pub fn hand(&self) -> &[CardId] {
        &self.hand
    }

    pub fn deck(&self) -> &[CardId] {
        &self.deck
    }

    pub fn mana(&self) -> u32 {
        self.mana
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn minions(&self) -> &[Minion] {
        &self.minions
    }

    pub fn minion(&self, instance_id: MinionInstanceId) -> Option<&Minion> {
        self.minions.iter().find(|m| m.instance_id() == instance_id)
    }

    pub fn minion_ids(&self) -> Vec<MinionInstanceId> {
        self.minions.iter().map(|m| m.instance_id()).collect()
    }

    pub fn mulligan_done(&self) -> bool {
        self.mulligan_done
    }

    pub(super) fn send(&self, packet: ServerMessage) {
        self.sink.send(packet);
    }
}

impl Game {
    /// 덱 맨 위 카드를 손패로 가져옵니다. 손패가 가득 찼다면 그 카드는 버려집니다.
    pub(crate) fn draw_card(&mut self, player_id: PlayerId) {
        let Some(player) = self.player_mut(player_id) else {
            return;
        };
        let Some(card) = player.deck.pop() else {
            debug!("Player {} tried to draw from an empty deck", player_id);
            return;
        };
        self.add_card(player_id, card);
    }

    /// 손패에 카드를 넣는 유일한 경로입니다. 손패 한도를 넘으면 `discardCard` 로 알립니다.
    pub(crate) fn add_card(&mut self, player_id: PlayerId, card: CardId) {
        let max_cards = self.rules.max_cards;
        let Some(player) = self.player_mut(player_id) else {
            return;
        };
        if player.hand.len() >= max_cards {
            debug!(
                "Hand of player {} is full, card {} is discarded",
                player_id, card
            );
            self.broadcast(ServerMessage::DiscardCard(DiscardCard {
                player_id,
                card_id: card,
            }));
            return;
        }

        player.hand.push(card);
        let cards_left = player.deck.len();
        player.send(ServerMessage::AddCard(AddCard {
            player: player_id,
            card: Some(card),
            cards_left,
        }));
        if let Some(opponent) = self.opponent_of(player_id) {
            self.send_to(
                opponent,
                ServerMessage::AddCard(AddCard {
                    player: player_id,
                    card: None,
                    cards_left,
                }),
            );
        }
    }

    /// 손패에서 무작위로 카드를 버립니다.
    pub(crate) fn discard_random(&mut self, player_id: PlayerId, count: u32) {
        use rand::Rng;

        for _ in 0..count {
            let len = match self.player(player_id) {
                Some(player) if !player.hand.is_empty() => player.hand.len(),
                _ => return,
            };
            let index = self.rng().gen_range(0..len);
            let Some(player) = self.player_mut(player_id) else {
                return;
            };
            let card = player.hand.remove(index);
            self.broadcast(ServerMessage::DiscardCard(DiscardCard {
                player_id,
                card_id: card,
            }));
        }
    }

    pub(crate) fn set_mana(&mut self, player_id: PlayerId, mana: u32) {
        let mana = mana.min(self.rules.max_mana);
        let Some(player) = self.player_mut(player_id) else {
            return;
        };
        if player.mana == mana {
            return;
        }
        player.mana = mana;
        self.broadcast(ServerMessage::UpdatePlayer(UpdatePlayer {
            player_id,
            mana: Some(mana),
            ..Default::default()
        }));
    }

    /// 영웅 체력 변경 경로. [0, max_health] 로 고정하고, 0 이 되면 게임을 끝냅니다.
    pub(crate) fn set_player_health(
        &mut self,
        player_id: PlayerId,
        value: i32,
        source: Option<MinionInstanceId>,
    ) -> GameResult<()> {
        if self.is_ended() {
            return Ok(());
        }
        let max_health = self.rules.max_health;
        let Some(player) = self.player_mut(player_id) else {
            return Ok(());
        };
        let health = value.clamp(0, max_health);
        if player.health != health {
            player.health = health;
            self.broadcast(ServerMessage::UpdatePlayer(UpdatePlayer {
                player_id,
                health: Some(health),
                attack_from: source,
                ..Default::default()
            }));
        }

        if health <= 0 {
            let winner = self.require_opponent(player_id)?;
            self.end(Some(winner), "hero destroyed");
        }
        Ok(())
    }
}
