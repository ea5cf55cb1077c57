//! 네트워크 계층
//!
//! websocket 세션(`ws_session`)이 텍스트 프레임을 `protocol` 로 해석해 `LobbyActor` 에 넘기고,
//! 게임 엔진이 만든 패킷은 `sink` 를 통해 다시 세션으로 돌아갑니다.

pub mod actor;
pub mod lobby;
pub mod protocol;
pub mod queue;
pub mod sink;
pub mod ws_session;
