use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::game::rules::GameRules;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub game: GameSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        println!("Loading configuration for RUN_MODE: {}", &run_mode);

        let s = Config::builder()
            // 실행 환경별 파일 (development.toml, production.toml). 없으면 기본값을 씁니다.
            .add_source(
                File::with_name(&format!("config/{}", run_mode))
                    .format(FileFormat::Toml)
                    .required(false),
            )
            // 환경 변수 (예: APP__SERVER__PORT=8000)
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// TOML 문자열에서 설정을 읽습니다.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub heartbeat_interval_seconds: u64,
    pub client_timeout_seconds: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            heartbeat_interval_seconds: 5,
            client_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: String,
    pub filename: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            filename: "card_server.log".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GameSettings {
    /// 지정하지 않으면 실행 파일에 포함된 카탈로그를 사용합니다.
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub rules: GameRules,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings = Settings::from_toml(
            r#"
            [server]
            port = 9000

            [game.rules]
            max_minions = 7
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.bind_address, "0.0.0.0");
        assert_eq!(settings.logging.directory, "logs");
        assert_eq!(settings.game.rules.max_minions, 7);
        assert_eq!(settings.game.rules.max_cards, 10);
        assert!(settings.game.catalog_path.is_none());
    }
}
