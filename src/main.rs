use std::{sync::Arc, time::Duration};

use actix::{Actor, System};
use actix_web::{get, web, App, Error, HttpRequest, HttpResponse, HttpServer};
use actix_web_actors::ws;
use card_server::{
    card::Catalog,
    env::Settings,
    server::{actor::LobbyActor, lobby::Lobby, ws_session::WsSession},
    AppState, LogExt, LoggerManager,
};
use clap::Parser;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "card_server",
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,
)]
struct Args {
    /// 설정 파일의 server.port 를 덮어씁니다.
    #[arg(long)]
    port: Option<u16>,

    /// 설정 파일의 server.bind_address 를 덮어씁니다.
    #[arg(long)]
    bind: Option<String>,
}

#[get("/ws/")]
async fn game_ws_route(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(
        state.lobby.clone(),
        Duration::from_secs(state.settings.server.heartbeat_interval_seconds),
        Duration::from_secs(state.settings.server.client_timeout_seconds),
    );
    ws::start(session, &req, stream)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    // 1. 환경변수 로드
    dotenv::dotenv().ok();

    // 2. 설정 파일 로드
    let mut settings = Settings::new().expect("Failed to load settings");
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(bind) = args.bind {
        settings.server.bind_address = bind;
    }

    // 3. 로거 초기화
    let logger_manager = Arc::new(LoggerManager::setup(&settings));
    info!("Logger initialized");

    // 4. 카탈로그, 규칙 준비
    let catalog = match &settings.game.catalog_path {
        Some(path) => Arc::new(
            Catalog::load(path)
                .log_ok(|_| info!("Catalog loaded from {}", path))
                .log_err(|e| error!("Failed to load catalog {}: {}", path, e))
                .expect("Failed to load catalog"),
        ),
        None => Catalog::global(),
    };
    if let Err(e) = settings.game.rules.validate() {
        error!("Invalid game rules: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
    }
    info!(
        "Catalog ready: {} cards, {} minions",
        catalog.cards().len(),
        catalog.minions().len()
    );

    // 5. 로비 시작
    let lobby = LobbyActor::new(Lobby::new(catalog, settings.game.rules.clone())).start();

    let app_state = AppState {
        settings: settings.clone(),
        lobby,
        logger_manager,
    };

    // 6. HTTP 서버 시작
    let bind_address = format!("{}:{}", settings.server.bind_address, settings.server.port);
    info!("Starting HTTP server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        let health_route = || async { HttpResponse::Ok().body("OK") };

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .service(game_ws_route)
            .route("/health", web::get().to(health_route))
    })
    .bind(&bind_address)?
    .run();

    info!("Card server is running on {}", bind_address);

    // 7. 종료 신호 대기
    tokio::select! {
        res = &mut server => {
            error!("Server exited unexpectedly");
            return res;
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received. Initiating graceful shutdown...");
            System::current().stop();
        },
    }

    server.await?;
    info!("System has shut down gracefully");
    Ok(())
}
