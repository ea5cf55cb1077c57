pub mod action;

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::Path,
    sync::Arc,
};

use once_cell::sync::Lazy;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    enums::{Attribute, CardId, CardKind, MinionId, Trigger},
    exception::{GameError, GameResult},
};
use action::Action;

/// 훅 이름 -> 효과 서술자 목록
pub type Hooks = BTreeMap<Trigger, Vec<Action>>;

/// 카드 한 장의 정적 정의입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 사용에 필요한 마나
    pub cost: u32,
    pub kind: CardKind,
    #[serde(default)]
    pub actions: Vec<Action>,
    /// 하수인 카드가 소환하는 하수인 정의 목록
    #[serde(default)]
    pub spawn: Vec<MinionId>,
    /// 사용할 때 대상을 지정해야 하는지 여부
    #[serde(default)]
    pub target: bool,
    /// 덱 구성에 포함될 수 있는지 여부 (The Coin 처럼 지급 전용 카드는 false)
    #[serde(default = "default_obtainable")]
    pub obtainable: bool,
}

fn default_obtainable() -> bool {
    true
}

/// 하수인의 정적 정의입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinionDefinition {
    pub id: MinionId,
    pub name: String,
    pub attack: i32,
    pub health: i32,
    #[serde(default)]
    pub attributes: BTreeSet<Attribute>,
    #[serde(default)]
    pub hooks: Hooks,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    cards: Vec<CardDefinition>,
    minions: Vec<MinionDefinition>,
}

/// 카드/하수인 정의 테이블. 한 번 만들어지면 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct Catalog {
    cards: HashMap<CardId, Arc<CardDefinition>>,
    minions: HashMap<MinionId, Arc<MinionDefinition>>,
}

const DEFAULT_CATALOG: &str = include_str!("../../data/catalog.json");

static DEFAULT: Lazy<Arc<Catalog>> = Lazy::new(|| match Catalog::from_json(DEFAULT_CATALOG) {
    Ok(catalog) => Arc::new(catalog),
    Err(e) => {
        error!("Embedded catalog is invalid: {}", e);
        Arc::new(Catalog::empty())
    }
});

impl Catalog {
    /// 실행 파일에 포함된 기본 카탈로그
    pub fn global() -> Arc<Catalog> {
        DEFAULT.clone()
    }

    pub fn empty() -> Self {
        Self {
            cards: HashMap::new(),
            minions: HashMap::new(),
        }
    }

    pub fn new(cards: Vec<CardDefinition>, minions: Vec<MinionDefinition>) -> GameResult<Self> {
        let catalog = Self {
            cards: cards.into_iter().map(|c| (c.id, Arc::new(c))).collect(),
            minions: minions.into_iter().map(|m| (m.id, Arc::new(m))).collect(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> GameResult<Self> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        Self::new(file.cards, file.minions)
    }

    pub fn load(path: impl AsRef<Path>) -> GameResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json(&raw)?;
        info!(
            "Catalog loaded from {:?}: {} cards, {} minions",
            path.as_ref(),
            catalog.cards.len(),
            catalog.minions.len()
        );
        Ok(catalog)
    }

    pub fn card(&self, id: CardId) -> Option<&Arc<CardDefinition>> {
        self.cards.get(&id)
    }

    pub fn minion(&self, id: MinionId) -> Option<&Arc<MinionDefinition>> {
        self.minions.get(&id)
    }

    /// id 순으로 정렬된 카드 목록
    pub fn cards(&self) -> Vec<Arc<CardDefinition>> {
        let mut cards: Vec<_> = self.cards.values().cloned().collect();
        cards.sort_by_key(|c| c.id);
        cards
    }

    pub fn minions(&self) -> Vec<Arc<MinionDefinition>> {
        let mut minions: Vec<_> = self.minions.values().cloned().collect();
        minions.sort_by_key(|m| m.id);
        minions
    }

    /// 획득 가능한 카드를 각각 두 장씩 넣고 섞은 뒤 `size` 장으로 자른 덱을 만듭니다.
    pub fn build_deck<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Vec<CardId> {
        let mut ids: Vec<CardId> = self
            .cards()
            .iter()
            .filter(|c| c.obtainable)
            .map(|c| c.id)
            .collect();
        ids.extend(ids.clone());
        ids.shuffle(rng);
        ids.truncate(size);
        ids
    }

    fn validate(&self) -> GameResult<()> {
        for card in self.cards.values() {
            if card.kind == CardKind::Minion && card.spawn.is_empty() {
                return Err(GameError::Catalog(format!(
                    "minion card {} ({}) spawns nothing",
                    card.id, card.name
                )));
            }
            for minion_id in &card.spawn {
                self.require_minion(*minion_id, &card.name)?;
            }
            self.validate_actions(&card.actions, &card.name)?;
        }
        for minion in self.minions.values() {
            if minion.health <= 0 {
                return Err(GameError::Catalog(format!(
                    "minion {} ({}) has no health",
                    minion.id, minion.name
                )));
            }
            for actions in minion.hooks.values() {
                self.validate_actions(actions, &minion.name)?;
            }
        }
        Ok(())
    }

    fn validate_actions(&self, actions: &[Action], owner: &str) -> GameResult<()> {
        for action in actions {
            match action {
                Action::Spawn(ids) => {
                    for id in ids {
                        self.require_minion(*id, owner)?;
                    }
                }
                Action::Replace(id) => self.require_minion(*id, owner)?,
                Action::If { then, .. } => self.validate_actions(then, owner)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn require_minion(&self, id: MinionId, owner: &str) -> GameResult<()> {
        if self.minions.contains_key(&id) {
            Ok(())
        } else {
            Err(GameError::Catalog(format!(
                "'{}' references unknown minion {}",
                owner, id
            )))
        }
    }
}
