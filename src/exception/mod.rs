use thiserror::Error;

use crate::enums::{Attribute, CardId, MinionId, MinionInstanceId};

// ===================================================================
// 에러 분류
// ===================================================================

/// 에러가 어떻게 처리되어야 하는지를 나타냅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 클라이언트 요청이 규칙에 맞지 않음. `error` 패킷으로 알리고 상태는 그대로 둡니다.
    UserRejection,
    /// 해석할 수 없는 메시지. 로그만 남깁니다.
    ProtocolViolation,
    /// 검증을 통과한 이후의 실패. 현재 작업을 중단합니다.
    InternalInconsistency,
    /// 설정, 카탈로그 로딩 등 서버 기동 중 발생하는 에러
    Startup,
}

/// 효과 서술자(action)가 검증 단계에서 거부된 이유
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("this action requires a target")]
    NoTarget,

    #[error("target {0} does not exist")]
    InvalidTarget(MinionInstanceId),

    #[error("this action can only target a minion")]
    NotAMinion,

    #[error("target already has attribute '{0}'")]
    AttributePresent(Attribute),

    #[error("the condition of this card is not met")]
    PredicateFailed,

    #[error("unknown minion definition {0}")]
    UnknownMinion(MinionId),
}

#[derive(Error, Debug)]
pub enum GameError {
    // --- UserRejection ---
    #[error("You must log in first!")]
    NotAuthenticated,

    #[error("You are already logged in!")]
    AlreadyAuthenticated,

    #[error("Authentication failed!")]
    AuthenticationFailed,

    #[error("You are not in a game!")]
    NotInGame,

    #[error("You are already in a game!")]
    AlreadyInGame,

    #[error("You are already searching for a game!")]
    AlreadyQueued,

    #[error("You are not searching for a game!")]
    NotQueued,

    #[error("It is not currently your turn!")]
    NotYourTurn,

    #[error("Action '{action}' is not allowed during {phase}")]
    WrongPhase {
        phase: &'static str,
        action: &'static str,
    },

    #[error("You have already done your mulligan!")]
    MulliganAlreadyDone,

    #[error("You do not have this card!")]
    CardNotInHand(CardId),

    #[error("You do not have enough mana to play this card!")]
    NotEnoughMana { needed: u32, available: u32 },

    #[error("This card requires a target to be played on!")]
    TargetRequired,

    #[error("Cannot attack that object!")]
    InvalidTarget,

    #[error("Cannot play this card, board is full!")]
    BoardFull,

    #[error("Cannot play this card in this situation! ({0})")]
    CannotPlay(#[from] ActionError),

    #[error("No minion found to perform attack!")]
    MinionNotFound(MinionInstanceId),

    #[error("This minion cannot attack right now!")]
    MinionCannotAttack(MinionInstanceId),

    #[error("You must attack a minion with taunt!")]
    MustAttackTaunt,

    #[error("The game is already over!")]
    GameOver,

    // --- ProtocolViolation ---
    #[error("Malformed packet: {0}")]
    Protocol(String),

    // --- InternalInconsistency ---
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Unknown card definition {0}")]
    UnknownCard(CardId),

    #[error("Unknown minion definition {0}")]
    UnknownMinion(MinionId),

    // --- Startup ---
    #[error("Invalid catalog: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(_) => ErrorKind::ProtocolViolation,
            Self::Internal(_) | Self::UnknownCard(_) | Self::UnknownMinion(_) => {
                ErrorKind::InternalInconsistency
            }
            Self::Catalog(_) | Self::Config(_) | Self::Json(_) | Self::Io(_) => ErrorKind::Startup,
            _ => ErrorKind::UserRejection,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.kind() == ErrorKind::UserRejection
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_and_faults_are_classified() {
        assert_eq!(GameError::NotYourTurn.kind(), ErrorKind::UserRejection);
        assert_eq!(
            GameError::CannotPlay(ActionError::NoTarget).kind(),
            ErrorKind::UserRejection
        );
        assert_eq!(
            GameError::protocol("bad").kind(),
            ErrorKind::ProtocolViolation
        );
        assert_eq!(
            GameError::internal("hook").kind(),
            ErrorKind::InternalInconsistency
        );
        assert_eq!(GameError::Catalog("x".into()).kind(), ErrorKind::Startup);
    }

    #[test]
    fn rejection_messages_are_client_facing() {
        assert_eq!(
            GameError::NotEnoughMana {
                needed: 3,
                available: 1
            }
            .to_string(),
            "You do not have enough mana to play this card!"
        );
        assert_eq!(
            GameError::MustAttackTaunt.to_string(),
            "You must attack a minion with taunt!"
        );
    }
}
