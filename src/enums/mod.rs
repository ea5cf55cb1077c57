use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// 플레이어(좌석) 식별자. 연결 순서대로 0 부터 증가합니다.
pub type PlayerId = u32;
/// 카드 정의 id
pub type CardId = u32;
/// 하수인 정의 id
pub type MinionId = u32;
/// 게임 안에서 발급되는 하수인 인스턴스 id. 재사용되지 않습니다.
pub type MinionInstanceId = u32;

/// 하수인에 부착되는 속성 플래그입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// 상대는 도발 하수인부터 공격해야 합니다.
    Taunt,
    /// 다음 피해 한 번을 무효화합니다.
    Shield,
    /// 소환된 턴에 바로 공격할 수 있습니다.
    Charge,
    /// 죽을 때 death 훅이 있음을 클라이언트에 표시합니다.
    Deathrattle,
}

impl Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Taunt => write!(f, "taunt"),
            Self::Shield => write!(f, "shield"),
            Self::Charge => write!(f, "charge"),
            Self::Deathrattle => write!(f, "deathrattle"),
        }
    }
}

/// 하수인 훅이 발동되는 시점입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    SelfDamage,
    MinionDamage,
    Death,
    FriendlyDeath,
    OpponentDeath,
    TurnStart,
    TurnEnd,
    PlayerPlayCard,
    OpponentPlayCard,
}

impl Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SelfDamage => "self_damage",
            Self::MinionDamage => "minion_damage",
            Self::Death => "death",
            Self::FriendlyDeath => "friendly_death",
            Self::OpponentDeath => "opponent_death",
            Self::TurnStart => "turn_start",
            Self::TurnEnd => "turn_end",
            Self::PlayerPlayCard => "player_play_card",
            Self::OpponentPlayCard => "opponent_play_card",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Minion,
    Spell,
}

/// 연결된 플레이어의 로비 상태입니다. `gameState` 패킷으로 그대로 전달됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Init,
    Lobby,
    Queued,
    Mulligan,
    Active,
    Disconnected,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Lobby => "lobby",
            Self::Queued => "queued",
            Self::Mulligan => "mulligan",
            Self::Active => "active",
            Self::Disconnected => "disconnected",
        }
    }
}

impl Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
