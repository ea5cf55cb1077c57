use actix::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    card::{CardDefinition, MinionDefinition},
    enums::{Attribute, CardId, MinionId, MinionInstanceId, PlayerId},
    exception::{GameError, GameResult},
    game::Target,
};

// --- Client to Server Messages ---

/// 클라이언트가 보내는 `{type, data}` 패킷을 해석한 결과입니다.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Auth { username: String },
    Queue,
    Dequeue,
    PlayBot,
    EndTurn,
    PlayCard {
        card: CardId,
        target: Target,
        position: Option<usize>,
    },
    DoMulligan { redo_mask: Vec<bool> },
    DoAttack { from: MinionInstanceId, to: Target },
    LoadCards,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// 원본 클라이언트는 username 문자열만 보내기도 합니다.
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthData {
    Name(String),
    Object { username: String },
}

#[derive(Deserialize)]
struct PlayCardData {
    card: CardId,
    #[serde(default)]
    target: Option<RawTarget>,
    #[serde(default)]
    position: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MulliganData {
    #[serde(default)]
    redo_mask: Vec<MaskBit>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaskBit {
    Flag(bool),
    Number(u8),
}

#[derive(Deserialize)]
struct AttackData {
    from: MinionInstanceId,
    to: RawTarget,
}

/// 대상의 와이어 표현: 하수인 인스턴스 id 또는 "opponent" / "player"
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Minion(MinionInstanceId),
    Named(String),
}

impl RawTarget {
    fn into_target(self) -> GameResult<Target> {
        match self {
            RawTarget::Minion(id) => Ok(Target::Minion(id)),
            RawTarget::Named(name) => match name.as_str() {
                "opponent" => Ok(Target::Opponent),
                "player" | "self" => Ok(Target::Player),
                other => Err(GameError::protocol(format!("unknown target '{}'", other))),
            },
        }
    }
}

fn data<T: serde::de::DeserializeOwned>(kind: &str, value: Value) -> GameResult<T> {
    serde_json::from_value(value)
        .map_err(|e| GameError::protocol(format!("invalid data for '{}': {}", kind, e)))
}

impl ClientMessage {
    pub fn parse(text: &str) -> GameResult<Self> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| GameError::protocol(format!("not a packet: {}", e)))?;
        let kind = envelope.kind.as_str();
        let value = envelope.data;

        let message = match kind {
            "auth" => {
                let username = match data::<AuthData>(kind, value)? {
                    AuthData::Name(name) => name,
                    AuthData::Object { username } => username,
                };
                ClientMessage::Auth { username }
            }
            "queue" => ClientMessage::Queue,
            "dequeue" => ClientMessage::Dequeue,
            "playBot" => ClientMessage::PlayBot,
            "endTurn" => ClientMessage::EndTurn,
            "loadCards" => ClientMessage::LoadCards,
            "playCard" => {
                let play: PlayCardData = data(kind, value)?;
                let target = match play.target {
                    Some(raw) => raw.into_target()?,
                    None => Target::None,
                };
                ClientMessage::PlayCard {
                    card: play.card,
                    target,
                    position: play.position,
                }
            }
            "doMulligan" => {
                let mulligan: MulliganData = data(kind, value)?;
                let redo_mask = mulligan
                    .redo_mask
                    .into_iter()
                    .map(|bit| match bit {
                        MaskBit::Flag(flag) => flag,
                        MaskBit::Number(n) => n != 0,
                    })
                    .collect();
                ClientMessage::DoMulligan { redo_mask }
            }
            "doAttack" => {
                let attack: AttackData = data(kind, value)?;
                ClientMessage::DoAttack {
                    from: attack.from,
                    to: attack.to.into_target()?,
                }
            }
            other => {
                return Err(GameError::protocol(format!(
                    "unknown packet type '{}'",
                    other
                )))
            }
        };
        Ok(message)
    }
}

// --- Server to Client Messages ---

#[derive(Serialize, Message, Clone, Debug, PartialEq)]
#[rtype(result = "()")]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    GameState(String),
    Error(String),
    GameInit(GameInit),
    MulliganResult(MulliganResult),
    NextTurn(NextTurn),
    AddCard(AddCard),
    DiscardCard(DiscardCard),
    AddMinion(AddMinion),
    UpdateMinion(UpdateMinion),
    RemoveMinion(RemoveMinion),
    UpdatePlayer(UpdatePlayer),
    PlayCard(PlayCard),
    GameEnd(GameEnd),
    CardList(CardList),
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GameState(_) => "gameState",
            Self::Error(_) => "error",
            Self::GameInit(_) => "gameInit",
            Self::MulliganResult(_) => "mulliganResult",
            Self::NextTurn(_) => "nextTurn",
            Self::AddCard(_) => "addCard",
            Self::DiscardCard(_) => "discardCard",
            Self::AddMinion(_) => "addMinion",
            Self::UpdateMinion(_) => "updateMinion",
            Self::RemoveMinion(_) => "removeMinion",
            Self::UpdatePlayer(_) => "updatePlayer",
            Self::PlayCard(_) => "playCard",
            Self::GameEnd(_) => "gameEnd",
            Self::CardList(_) => "cardList",
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameInit {
    pub player_id: PlayerId,
    pub opponent_id: PlayerId,
    pub opponent_name: String,
    pub hand: Vec<CardId>,
    pub opponent_hand_size: usize,
    pub cards_left: usize,
    pub health: i32,
    pub mana: u32,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MulliganResult {
    pub player_id: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<CardId>>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NextTurn {
    pub turn: PlayerId,
    pub mana: u32,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddCard {
    pub player: PlayerId,
    /// 카드 값은 소유자에게만 전달됩니다.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardId>,
    pub cards_left: usize,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscardCard {
    pub player_id: PlayerId,
    pub card_id: CardId,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddMinion {
    pub player_id: PlayerId,
    pub minion_instance_id: MinionInstanceId,
    pub minion_id: MinionId,
    pub has_attack: bool,
    pub card_id: Option<CardId>,
    pub position: usize,
}

#[derive(Serialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMinion {
    pub player_id: PlayerId,
    pub minion_instance_id: MinionInstanceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Attribute>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_attack: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_from: Option<MinionInstanceId>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMinion {
    pub player_id: PlayerId,
    pub minion_instance_id: MinionInstanceId,
    pub health: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_from: Option<MinionInstanceId>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayer {
    pub player_id: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mana: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_from: Option<MinionInstanceId>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayCard {
    pub player_mana: u32,
    pub player_id: PlayerId,
    pub card_id: CardId,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameEnd {
    pub winner_id: Option<PlayerId>,
    pub reason: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct CardList {
    pub cards: Vec<CardDefinition>,
    pub minions: Vec<MinionDefinition>,
}

// CardDefinition 에는 PartialEq 가 없으므로 id 목록으로 비교합니다.
impl PartialEq for CardList {
    fn eq(&self, other: &Self) -> bool {
        let ids = |list: &CardList| {
            (
                list.cards.iter().map(|c| c.id).collect::<Vec<_>>(),
                list.minions.iter().map(|m| m.id).collect::<Vec<_>>(),
            )
        };
        ids(self) == ids(other)
    }
}
