use serde::Deserialize;

use crate::enums::CardId;

/// 게임 밸런스 상수. 설정 파일의 `[game.rules]` 에서 덮어쓸 수 있습니다.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameRules {
    pub initial_health: i32,
    pub max_health: i32,
    pub initial_mana: u32,
    pub max_mana: u32,
    pub max_minions: usize,
    pub max_cards: usize,
    pub deck_size: usize,
    pub opening_hand: usize,
    /// 후공에게 지급하는 카드
    pub coin_card: Option<CardId>,
    pub draw_on_turn_start: bool,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            initial_health: 30,
            max_health: 30,
            initial_mana: 1,
            max_mana: 10,
            max_minions: 8,
            max_cards: 10,
            deck_size: 30,
            opening_hand: 3,
            coin_card: Some(14),
            draw_on_turn_start: true,
        }
    }
}

impl GameRules {
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_health <= 0 || self.initial_health > self.max_health {
            return Err(format!(
                "initial_health {} must be within 1..={}",
                self.initial_health, self.max_health
            ));
        }
        if self.initial_mana > self.max_mana {
            return Err(format!(
                "initial_mana {} exceeds max_mana {}",
                self.initial_mana, self.max_mana
            ));
        }
        if self.opening_hand > self.max_cards {
            return Err(format!(
                "opening_hand {} exceeds max_cards {}",
                self.opening_hand, self.max_cards
            ));
        }
        Ok(())
    }
}
