use actix::prelude::*;
use tracing::info;

use crate::{enums::PlayerId, server::protocol::ClientMessage};

use super::{lobby::Lobby, sink::SharedSink};

/// 새 연결 등록. 발급된 플레이어 id 를 돌려줍니다.
#[derive(Message)]
#[rtype(result = "PlayerId")]
pub struct Connect {
    pub sink: SharedSink,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub player_id: PlayerId,
}

/// 해석을 마친 클라이언트 메시지
#[derive(Message)]
#[rtype(result = "()")]
pub struct Inbound {
    pub player_id: PlayerId,
    pub message: ClientMessage,
}

/// 로비를 소유하는 액터. 메일박스가 모든 메시지 처리를 한 줄로 세웁니다.
pub struct LobbyActor {
    lobby: Lobby,
}

impl LobbyActor {
    pub fn new(lobby: Lobby) -> Self {
        Self { lobby }
    }
}

impl Actor for LobbyActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("LobbyActor started");
    }
}

impl Handler<Connect> for LobbyActor {
    type Result = MessageResult<Connect>;

    fn handle(&mut self, msg: Connect, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.lobby.connect(msg.sink))
    }
}

impl Handler<Disconnect> for LobbyActor {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Self::Context) -> Self::Result {
        self.lobby.disconnect(msg.player_id);
    }
}

impl Handler<Inbound> for LobbyActor {
    type Result = ();

    fn handle(&mut self, msg: Inbound, _ctx: &mut Self::Context) -> Self::Result {
        self.lobby.handle(msg.player_id, msg.message);
    }
}
