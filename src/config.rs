//! Environment-driven configuration (`.env` is honoured through dotenvy).

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_URL: &str = "mongodb://localhost:27017/hobbyconnect";
const DEFAULT_DATA_DIR: &str = "crm_data";
const DEFAULT_DATABASE_NAME: &str = "hobbyconnect";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_JWT_SECRET: &str = "estate-crm-dev-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file here.
    pub dir: Option<PathBuf>,
}

/// Where the document store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// The connection string as configured, for log lines.
    pub url: String,
    pub path: PathBuf,
}

impl DbConfig {
    /// Resolves a `MONGODB_URL`-style connection string to a store path.
    ///
    /// `mongodb://host:port/<name>` (and `mongodb+srv://`) select the
    /// database `<name>` under `data_dir`; anything else is taken as a path.
    pub fn from_url(url: &str, data_dir: &Path) -> Self {
        let path = match url.split_once("://") {
            Some((scheme, rest)) if scheme.starts_with("mongodb") => {
                let name = rest
                    .split_once('/')
                    .map(|(_, db)| db.split(['?', '/']).next().unwrap_or_default())
                    .filter(|db| !db.is_empty())
                    .unwrap_or(DEFAULT_DATABASE_NAME);
                data_dir.join(name)
            }
            _ => PathBuf::from(url),
        };
        Self {
            url: url.to_string(),
            path,
        }
    }

    /// Reads `MONGODB_URL` and `CRM_DATA_DIR`.
    pub fn from_env() -> Self {
        let url = env::var("MONGODB_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let data_dir = env::var("CRM_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        Self::from_url(&url, Path::new(&data_dir))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database: DbConfig,
    pub jwt_secret: String,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let bind = env::var("CRM_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind
            .parse()
            .map_err(|e| format!("invalid CRM_BIND_ADDR `{bind}`: {e}"))?;

        Ok(Self {
            bind_addr,
            database: DbConfig::from_env(),
            jwt_secret: env::var("CRM_JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            log: LogConfig::from_env(),
        })
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        let format = match env::var("CRM_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        Self {
            format,
            dir: env::var("CRM_LOG_DIR").ok().filter(|d| !d.is_empty()).map(PathBuf::from),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            dir: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database: DbConfig::from_url(DEFAULT_DATABASE_URL, Path::new(DEFAULT_DATA_DIR)),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            log: LogConfig::default(),
        }
    }
}
