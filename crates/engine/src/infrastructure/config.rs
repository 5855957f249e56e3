//! Engine configuration from the process environment.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use plaza_domain::RoomId;

use super::timeout_store::DEFAULT_STORE_TIMEOUT;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_WELCOME_ROOM: &str = "welcome";
const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(180);

/// Runtime settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub server_host: String,
    pub server_port: u16,
    /// Display name of the room that always exists.
    pub welcome_room_name: String,
    /// Concurrent WebSocket connections allowed per source IP. `None` = no cap.
    pub ws_connection_limit: Option<usize>,
    pub store_timeout: Duration,
    /// Pause between animated movement steps.
    pub move_step_delay: Duration,
    /// Shared Redis backend. `None` keeps state and fan-out in process.
    pub redis_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_HOST.to_string(),
            server_port: DEFAULT_PORT,
            welcome_room_name: DEFAULT_WELCOME_ROOM.to_string(),
            ws_connection_limit: None,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            move_step_delay: DEFAULT_STEP_DELAY,
            redis_url: None,
        }
    }
}

impl EngineConfig {
    /// Read `SERVER_HOST`, `SERVER_PORT`/`PORT`, `WELCOME_ROOM_NAME`,
    /// `WSCONN_LIMIT`, `STORE_TIMEOUT_SECS`, `MOVE_STEP_DELAY_MS` and the
    /// Redis location (`REDIS_URL`, or `REDIS_SERVER` plus `REDIS_PASSWORD`).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let server_port = var("SERVER_PORT").or_else(|| var("PORT"));
        let store_timeout_secs = parse_or(
            "STORE_TIMEOUT_SECS",
            var("STORE_TIMEOUT_SECS"),
            defaults.store_timeout.as_secs(),
        );
        let step_delay_ms = parse_or(
            "MOVE_STEP_DELAY_MS",
            var("MOVE_STEP_DELAY_MS"),
            u64::try_from(defaults.move_step_delay.as_millis()).unwrap_or(180),
        );

        // REDIS_URL wins; otherwise build one from host:port and password
        let redis_url = var("REDIS_URL").or_else(|| {
            var("REDIS_SERVER").map(|server| match var("REDIS_PASSWORD") {
                Some(password) => format!("redis://:{password}@{server}"),
                None => format!("redis://{server}"),
            })
        });

        Self {
            server_host: var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", server_port, defaults.server_port),
            welcome_room_name: var("WELCOME_ROOM_NAME").unwrap_or(defaults.welcome_room_name),
            ws_connection_limit: var("WSCONN_LIMIT").and_then(|raw| match raw.parse() {
                Ok(limit) => Some(limit),
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "Invalid WSCONN_LIMIT, connections are not capped");
                    None
                }
            }),
            store_timeout: Duration::from_secs(store_timeout_secs),
            move_step_delay: Duration::from_millis(step_delay_ms),
            redis_url,
        }
    }

    /// Id of the welcome room: its name with suffix `0`.
    pub fn welcome_room_id(&self) -> RoomId {
        RoomId::compose(&self.welcome_room_name, 0)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, default = %default, "Invalid setting, using default");
            default
        }
    }
}
