#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use card_server::{
    card::Catalog,
    enums::{CardId, MinionInstanceId, PlayerId},
    game::{rules::GameRules, Game, GameSetup, SeatSetup},
    server::{
        protocol::ServerMessage,
        sink::{PacketSink, SharedSink},
    },
};
use parking_lot::Mutex;

// --- 테스트 카탈로그의 카드 id ---
pub const RECRUIT: CardId = 0;
pub const BOLT: CardId = 1;
pub const BLAST: CardId = 2;
pub const STUDY: CardId = 3;
pub const COPYCAT: CardId = 4;
pub const BRUTE_CARD: CardId = 5;
pub const WALL_CARD: CardId = 6;
pub const SHIELD_UP: CardId = 7;
pub const COIN: CardId = 8;
pub const TICKER_CARD: CardId = 9;
pub const WATCHER_CARD: CardId = 10;
pub const MOUSE_CARD: CardId = 11;
pub const CHARGER_CARD: CardId = 12;
pub const MEND: CardId = 13;
pub const ARMY: CardId = 14;
pub const WARCRY: CardId = 15;
pub const VOLLEY: CardId = 16;
pub const CHAOS: CardId = 17;
pub const PURGE: CardId = 18;
pub const POLYMORPH: CardId = 19;
pub const HUSH: CardId = 20;
pub const SURGE: CardId = 21;
pub const DRAIN: CardId = 22;
pub const MOURNER_CARD: CardId = 23;
pub const AVENGER_CARD: CardId = 24;
pub const BRAWLER_CARD: CardId = 25;
pub const FAN_CARD: CardId = 26;
pub const CRITIC_CARD: CardId = 27;
pub const WITHER: CardId = 28;
pub const MARTYR_CARD: CardId = 29;

pub const RECRUIT_MINION: u32 = 0;
pub const PUP: u32 = 6;

/// 덱 구성에 쓰이는 카드는 모두 0 마나 하수인 카드입니다. 14 번 이후는 지급 전용입니다.
const TEST_CATALOG: &str = r#"{
    "cards": [
        {"id": 0, "name": "Recruit", "cost": 0, "kind": "minion", "spawn": [0]},
        {"id": 1, "name": "Bolt", "cost": 1, "kind": "spell", "target": true, "obtainable": false,
         "actions": [{"damage": 3}]},
        {"id": 2, "name": "Blast", "cost": 2, "kind": "spell", "obtainable": false,
         "actions": [{"all_damage": 1}]},
        {"id": 3, "name": "Study", "cost": 1, "kind": "spell", "obtainable": false,
         "actions": [{"draw": 2}]},
        {"id": 4, "name": "Copycat", "cost": 1, "kind": "spell", "obtainable": false,
         "actions": [{"card_copy": 2}]},
        {"id": 5, "name": "Brute", "cost": 0, "kind": "minion", "spawn": [1]},
        {"id": 6, "name": "Wall", "cost": 0, "kind": "minion", "spawn": [2]},
        {"id": 7, "name": "Shield Up", "cost": 0, "kind": "spell", "target": true, "obtainable": false,
         "actions": [{"attribute": "shield"}]},
        {"id": 8, "name": "Coin", "cost": 0, "kind": "spell", "obtainable": false,
         "actions": [{"mana": 1}]},
        {"id": 9, "name": "Ticker", "cost": 0, "kind": "minion", "spawn": [3]},
        {"id": 10, "name": "Watcher", "cost": 0, "kind": "minion", "spawn": [4]},
        {"id": 11, "name": "Mouse", "cost": 0, "kind": "minion", "spawn": [5]},
        {"id": 12, "name": "Charger", "cost": 0, "kind": "minion", "spawn": [7]},
        {"id": 13, "name": "Mend", "cost": 0, "kind": "spell", "target": true, "obtainable": false,
         "actions": [{"heal": 5}]},
        {"id": 14, "name": "Army", "cost": 0, "kind": "minion", "obtainable": false, "spawn": [0, 0, 0]},
        {"id": 15, "name": "Warcry", "cost": 0, "kind": "spell", "obtainable": false,
         "actions": [{"all_damage": 1}, {"buff_attack_all": 1}, {"buff_health_all": 1}]},
        {"id": 16, "name": "Volley", "cost": 0, "kind": "spell", "obtainable": false,
         "actions": [{"random_damage_opponent": 1}]},
        {"id": 17, "name": "Chaos", "cost": 0, "kind": "spell", "obtainable": false,
         "actions": [{"random_damage": 1}]},
        {"id": 18, "name": "Purge", "cost": 0, "kind": "spell", "obtainable": false,
         "actions": [{"discard": 2}]},
        {"id": 19, "name": "Polymorph", "cost": 0, "kind": "spell", "target": true, "obtainable": false,
         "actions": [{"replace": 6}]},
        {"id": 20, "name": "Hush", "cost": 0, "kind": "spell", "target": true, "obtainable": false,
         "actions": ["silence"]},
        {"id": 21, "name": "Surge", "cost": 0, "kind": "spell", "obtainable": false,
         "actions": [{"mana": 20}]},
        {"id": 22, "name": "Drain", "cost": 0, "kind": "spell", "obtainable": false,
         "actions": [{"mana": -20}]},
        {"id": 23, "name": "Mourner", "cost": 0, "kind": "minion", "obtainable": false, "spawn": [8]},
        {"id": 24, "name": "Avenger", "cost": 0, "kind": "minion", "obtainable": false, "spawn": [9]},
        {"id": 25, "name": "Brawler", "cost": 0, "kind": "minion", "obtainable": false, "spawn": [10]},
        {"id": 26, "name": "Fan", "cost": 0, "kind": "minion", "obtainable": false, "spawn": [11]},
        {"id": 27, "name": "Critic", "cost": 0, "kind": "minion", "obtainable": false, "spawn": [12]},
        {"id": 28, "name": "Wither", "cost": 0, "kind": "spell", "target": true, "obtainable": false,
         "actions": [{"buff_health": -3}]},
        {"id": 29, "name": "Martyr", "cost": 0, "kind": "minion", "obtainable": false, "spawn": [13]}
    ],
    "minions": [
        {"id": 0, "name": "Recruit", "attack": 1, "health": 1},
        {"id": 1, "name": "Brute", "attack": 5, "health": 5},
        {"id": 2, "name": "Wall", "attack": 3, "health": 5, "attributes": ["taunt"]},
        {"id": 3, "name": "Ticker", "attack": 5, "health": 5,
         "hooks": {"turn_end": [{"buff_health": 2}]}},
        {"id": 4, "name": "Watcher", "attack": 5, "health": 5,
         "hooks": {"turn_start": [{"buff_attack": 2}]}},
        {"id": 5, "name": "Mouse", "attack": 1, "health": 1, "attributes": ["deathrattle"],
         "hooks": {"death": [{"spawn": [6, 6]}]}},
        {"id": 6, "name": "Pup", "attack": 1, "health": 1},
        {"id": 7, "name": "Charger", "attack": 2, "health": 1, "attributes": ["charge"]},
        {"id": 8, "name": "Mourner", "attack": 1, "health": 3,
         "hooks": {"friendly_death": [{"buff_attack": 1}]}},
        {"id": 9, "name": "Avenger", "attack": 1, "health": 3,
         "hooks": {"opponent_death": [{"buff_health": 1}]}},
        {"id": 10, "name": "Brawler", "attack": 2, "health": 6,
         "hooks": {"self_damage": [{"buff_attack": 2}]}},
        {"id": 11, "name": "Fan", "attack": 1, "health": 2,
         "hooks": {"player_play_card": [{"buff_attack": 1}]}},
        {"id": 12, "name": "Critic", "attack": 1, "health": 2,
         "hooks": {"opponent_play_card": [{"buff_health": 1}]}},
        {"id": 13, "name": "Martyr", "attack": 1, "health": 1, "attributes": ["deathrattle"],
         "hooks": {"death": [{"buff_attack": 3}, {"spawn": [6]}]}}
    ]
}"#;

pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_json(TEST_CATALOG).unwrap())
}

pub fn rules() -> GameRules {
    GameRules {
        coin_card: Some(COIN),
        ..Default::default()
    }
}

/// 받은 패킷을 모두 기록하는 sink
#[derive(Clone, Default)]
pub struct RecordingSink {
    packets: Arc<Mutex<Vec<ServerMessage>>>,
    closed: Arc<AtomicBool>,
}

impl PacketSink for RecordingSink {
    fn send(&self, packet: ServerMessage) {
        self.packets.lock().push(packet);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl RecordingSink {
    pub fn shared(&self) -> SharedSink {
        Arc::new(self.clone())
    }

    pub fn packets(&self) -> Vec<ServerMessage> {
        self.packets.lock().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.packets.lock().iter().map(|p| p.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.packets.lock().len()
    }

    pub fn last(&self) -> Option<ServerMessage> {
        self.packets.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.packets.lock().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn contains_kind(&self, kind: &str) -> bool {
        self.packets.lock().iter().any(|p| p.kind() == kind)
    }
}

/// 시작 손패가 `hand` 순서대로 나오고, 그 아래에 Recruit 가 `filler` 장 깔린 덱
pub fn deck_with_hand(hand: &[CardId], filler: usize) -> Vec<CardId> {
    let mut deck = vec![RECRUIT; filler];
    deck.extend(hand.iter().rev());
    deck
}

pub struct TestGame {
    pub game: Game,
    pub sinks: [RecordingSink; 2],
}

impl TestGame {
    /// 두 좌석(id 0, 1)이 같은 덱으로 시작하는 멀리건 단계의 게임
    pub fn new(deck: Vec<CardId>, rules: GameRules) -> Self {
        let sinks = [RecordingSink::default(), RecordingSink::default()];
        let seat = |id: PlayerId, sink: &RecordingSink| SeatSetup {
            id,
            username: format!("player{}", id),
            sink: sink.shared(),
            deck: Some(deck.clone()),
            bot: false,
        };
        let game = Game::new(GameSetup {
            catalog: catalog(),
            rules,
            seats: [seat(0, &sinks[0]), seat(1, &sinks[1])],
            seed: Some(42),
        })
        .unwrap();
        Self { game, sinks }
    }

    /// 양쪽 모두 카드를 바꾸지 않고 멀리건을 마친 게임. (선공, 후공) 을 함께 돌려줍니다.
    pub fn started(deck: Vec<CardId>, rules: GameRules) -> (Self, PlayerId, PlayerId) {
        let mut test = Self::new(deck, rules);
        test.game.do_mulligan(0, &[]).unwrap();
        test.game.do_mulligan(1, &[]).unwrap();
        let first = test.game.turn().unwrap();
        let second = test.game.opponent_of(first).unwrap();
        (test, first, second)
    }

    pub fn sink(&self, player_id: PlayerId) -> &RecordingSink {
        &self.sinks[player_id as usize]
    }

    /// 가장 최근에 소환된 하수인
    pub fn last_minion(&self, player_id: PlayerId) -> MinionInstanceId {
        let player = self.game.player(player_id).unwrap();
        player
            .minions()
            .iter()
            .map(|m| m.instance_id())
            .max()
            .unwrap()
    }

    /// 보드 왼쪽부터 (하수인 정의 id, 공격력, 체력)
    pub fn board(&self, player_id: PlayerId) -> Vec<(u32, i32, i32)> {
        self.game
            .player(player_id)
            .unwrap()
            .minions()
            .iter()
            .map(|m| (m.definition_id(), m.attack(), m.health()))
            .collect()
    }

    pub fn end_turn(&mut self, player_id: PlayerId) {
        assert!(self.game.switch_turns(player_id).unwrap());
    }
}
