use std::time::{Duration, Instant};

use actix::{
    fut, Actor, ActorContext, ActorFutureExt, Addr, AsyncContext, ContextFutureSpawner, Handler,
    Message, Running, StreamHandler, WrapFuture,
};
use actix_web_actors::ws;
use tracing::{error, info, warn};

use crate::{
    enums::PlayerId,
    server::{
        actor::{Connect, Disconnect, Inbound, LobbyActor},
        protocol::{ClientMessage, ServerMessage},
        sink::PacketSink,
    },
};

type Ctx = ws::WebsocketContext<WsSession>;

/// 서버 쪽에서 연결을 끊을 때 보내는 메시지
#[derive(Message)]
#[rtype(result = "()")]
pub struct CloseSession;

/// 게임 엔진이 보내는 패킷을 websocket 세션 액터로 넘깁니다.
pub struct SessionSink {
    addr: Addr<WsSession>,
}

impl PacketSink for SessionSink {
    fn send(&self, packet: ServerMessage) {
        self.addr.do_send(packet);
    }

    fn close(&self) {
        self.addr.do_send(CloseSession);
    }
}

/// 클라이언트 하나의 websocket 연결
pub struct WsSession {
    player_id: Option<PlayerId>,
    hb: Instant,
    lobby: Addr<LobbyActor>,
    heartbeat_interval: Duration,
    client_timeout: Duration,
}

impl WsSession {
    pub fn new(
        lobby: Addr<LobbyActor>,
        heartbeat_interval: Duration,
        client_timeout: Duration,
    ) -> Self {
        Self {
            player_id: None,
            hb: Instant::now(),
            lobby,
            heartbeat_interval,
            client_timeout,
        }
    }

    fn hb(&self, ctx: &mut Ctx) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.hb) > act.client_timeout {
                info!(
                    "Websocket client {:?} heartbeat failed, disconnecting!",
                    act.player_id
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_text(&mut self, text: &str) {
        let Some(player_id) = self.player_id else {
            warn!("Message received before registration: {}", text);
            return;
        };
        match ClientMessage::parse(text) {
            Ok(message) => self.lobby.do_send(Inbound { player_id, message }),
            Err(e) => warn!("Ignoring malformed message from {}: {}", player_id, e),
        }
    }
}

impl Actor for WsSession {
    type Context = Ctx;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb(ctx);

        let sink = std::sync::Arc::new(SessionSink {
            addr: ctx.address(),
        });
        self.lobby
            .send(Connect { sink })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(player_id) => {
                        info!("WsSession started for player {}", player_id);
                        act.player_id = Some(player_id);
                    }
                    Err(e) => {
                        error!("Failed to register session: {}", e);
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        if let Some(player_id) = self.player_id.take() {
            self.lobby.do_send(Disconnect { player_id });
        }
        Running::Stop
    }
}

impl Handler<ServerMessage> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, ctx: &mut Self::Context) -> Self::Result {
        match serde_json::to_string(&msg) {
            Ok(text) => ctx.text(text),
            Err(e) => error!("Failed to serialize {} packet: {}", msg.kind(), e),
        }
    }
}

impl Handler<CloseSession> for WsSession {
    type Result = ();

    fn handle(&mut self, _msg: CloseSession, ctx: &mut Self::Context) -> Self::Result {
        ctx.close(None);
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                self.handle_text(&text);
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary frames are not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                error!("Websocket protocol error: {}", e);
                ctx.stop();
            }
        }
    }
}
