use std::sync::Arc;

use super::protocol::ServerMessage;

/// 플레이어의 원격 화면으로 패킷을 내보내는 통로입니다.
///
/// 게임 엔진은 이 트레이트만 알고, 실제 전송(websocket 세션 등)은 서버 쪽에서 구현합니다.
pub trait PacketSink: Send + Sync {
    fn send(&self, packet: ServerMessage);

    /// 연결을 강제로 닫습니다. 기본 구현은 아무 것도 하지 않습니다.
    fn close(&self) {}
}

pub type SharedSink = Arc<dyn PacketSink>;

/// 네트워크에 연결되지 않은 좌석(봇)을 위한 sink
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PacketSink for NullSink {
    fn send(&self, _packet: ServerMessage) {}
}
