use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_PRACTICE_LIMIT: usize = 10;
const MAX_PRACTICE_LIMIT: usize = 100;
const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;
const MAX_SESSION_TTL_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// JSON catalog document; the built-in seed catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    /// Practice questions handed to one screen
    pub practice_limit: usize,
    /// Acting user when no identity header is present (single-learner mode)
    pub default_user_id: Option<String>,
    /// Unfinished play sessions are dropped this long after they start
    pub session_ttl_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 3000,
            log_level: "info".to_string(),
            catalog_path: None,
            practice_limit: DEFAULT_PRACTICE_LIMIT,
            default_user_id: None,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(defaults.host);

        let log_level = std::env::var("RUST_LOG").unwrap_or(defaults.log_level);

        let catalog_path = std::env::var("CATALOG_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let practice_limit = std::env::var("PRACTICE_LIMIT")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(defaults.practice_limit)
            .clamp(1, MAX_PRACTICE_LIMIT);

        let default_user_id = std::env::var("DEFAULT_USER_ID")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let session_ttl_minutes = std::env::var("SESSION_TTL_MINUTES")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(defaults.session_ttl_minutes)
            .clamp(1, MAX_SESSION_TTL_MINUTES);

        Self {
            host,
            port,
            log_level,
            catalog_path,
            practice_limit,
            default_user_id,
            session_ttl_minutes,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes.clamp(1, MAX_SESSION_TTL_MINUTES))
    }
}
