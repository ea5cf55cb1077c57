//! action.rs
//!
//! 카드와 하수인 훅에 기록되는 효과 서술자(action)를 정의합니다.
//! 서술자는 직접 실행되지 않고 `game::interpreter` 를 거쳐 검증된 뒤 효과로 변환됩니다.

use serde::{Deserialize, Serialize};

use crate::enums::{Attribute, MinionId};

/// 효과 서술자. 카탈로그 JSON 에서는 serde 의 externally tagged 형태로 기록됩니다.
///
/// ```
/// use card_server::card::action::Action;
///
/// let actions: Vec<Action> = serde_json::from_str(r#"[{"draw": 2}, "silence"]"#).unwrap();
/// assert_eq!(actions, vec![Action::Draw(2), Action::Silence]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// 자신의 덱에서 n 장을 뽑습니다.
    Draw(u32),
    /// 대상의 체력을 n 만큼 회복합니다.
    Heal(i32),
    /// 대상에게 n 의 피해를 줍니다.
    Damage(i32),
    /// 양쪽 영웅과 모든 하수인에게 피해를 줍니다.
    AllDamage(i32),
    /// 상대 영웅과 상대 하수인에게 피해를 줍니다.
    AllDamageOpponent(i32),
    /// 모든 하수인과 영웅 중 무작위 하나에게 피해를 줍니다.
    RandomDamage(i32),
    /// 상대 하수인과 상대 영웅 중 무작위 하나에게 피해를 줍니다.
    RandomDamageOpponent(i32),
    BuffAttack(i32),
    BuffHealth(i32),
    BuffAttackAll(i32),
    BuffHealthAll(i32),
    /// 자신의 마나를 조정합니다.
    Mana(i32),
    /// 자신의 손패에서 무작위로 n 장을 버립니다.
    Discard(u32),
    Spawn(Vec<MinionId>),
    /// 대상을 죽음 처리 없이 제거하고 같은 자리에 다른 하수인을 소환합니다.
    Replace(MinionId),
    Destroy,
    Attribute(Attribute),
    /// 모든 속성과 훅을 제거합니다.
    Silence,
    /// 상대 손패에서 최대 n 장을 복사해 옵니다.
    CardCopy(u32),
    /// 조건이 참일 때만 하위 서술자를 적용합니다. 거짓이면 묶음 전체가 실패합니다.
    If {
        predicate: Predicate,
        then: Vec<Action>,
    },
}

/// `if` 서술자가 대상에게 적용하는 조건입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    IsMinion,
    IsHero,
    HasAttribute(Attribute),
    LacksAttribute(Attribute),
    HealthAtMost(i32),
    HealthAtLeast(i32),
    AttackAtMost(i32),
    AttackAtLeast(i32),
    /// 체력이 최대 체력보다 낮음
    Damaged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_parse_from_catalog_form() {
        let raw = r#"[
            {"spawn": [10, 10]},
            {"attribute": "shield"},
            "destroy",
            {"if": {"predicate": {"has_attribute": "taunt"}, "then": [{"damage": 3}]}}
        ]"#;
        let actions: Vec<Action> = serde_json::from_str(raw).unwrap();

        assert_eq!(actions[0], Action::Spawn(vec![10, 10]));
        assert_eq!(actions[1], Action::Attribute(Attribute::Shield));
        assert_eq!(actions[2], Action::Destroy);
        assert_eq!(
            actions[3],
            Action::If {
                predicate: Predicate::HasAttribute(Attribute::Taunt),
                then: vec![Action::Damage(3)],
            }
        );
    }

    #[test]
    fn unknown_verbs_are_rejected() {
        let parsed = serde_json::from_str::<Vec<Action>>(r#"[{"explode": 1}]"#);
        assert!(parsed.is_err());
    }
}
