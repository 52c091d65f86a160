use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command-line flags. Environment variables take precedence over these.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "snip", about = "URL shortener service", long_about = None)]
pub struct Args {
    /// Address to listen on
    #[arg(short = 'a', long = "address")]
    pub address: Option<String>,

    /// Base URL prepended to returned short codes
    #[arg(short = 'b', long = "base-url")]
    pub base_url: Option<String>,

    /// Snapshot file for the in-memory backend
    #[arg(short = 'f', long = "file-storage-path")]
    pub file_storage_path: Option<String>,

    /// PostgreSQL connection string; enables the relational backend
    #[arg(short = 'd', long = "database-dsn")]
    pub database_dsn: Option<String>,

    /// File that audit events are appended to
    #[arg(long = "audit-file")]
    pub audit_file: Option<String>,

    /// Endpoint that audit events are posted to
    #[arg(long = "audit-url")]
    pub audit_url: Option<String>,

    /// Secret used to sign auth cookies
    #[arg(long = "secret")]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub audit: AuditConfig,
    pub auth: AuthConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    /// Always ends with `/`
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    pub file: Option<PathBuf>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// If None, a random secret is generated and cookies won't survive restarts
    pub secret: Option<String>,
}

impl StorageConfig {
    const fn default_max_connections() -> u32 {
        5
    }
}

impl Config {
    /// Load `.env`, parse the command line and apply environment overrides
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let args = Args::parse();
        Self::from_args_and_env(args, |key| std::env::var(key).ok())
    }

    pub fn from_args_and_env(
        args: Args,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        // Environment first, then flag, then default. Empty values disable a setting.
        let pick = |key: &str, flag: Option<String>| -> Option<String> {
            env(key)
                .or(flag)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let address =
            pick("SERVER_ADDRESS", args.address).unwrap_or_else(|| "localhost:8080".to_string());

        let mut base_url = pick("BASE_URL", args.base_url)
            .unwrap_or_else(|| format!("http://{}/", address));
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let max_connections = match env("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be a positive integer: {e}")
            })?,
            None => StorageConfig::default_max_connections(),
        };
        if max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be greater than zero");
        }

        let log_level = env("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Config {
            server: ServerConfig { address, base_url },
            storage: StorageConfig {
                database_url: pick("DATABASE_DSN", args.database_dsn),
                max_connections,
                snapshot_path: pick("FILE_STORAGE_PATH", args.file_storage_path)
                    .map(PathBuf::from),
            },
            audit: AuditConfig {
                file: pick("AUDIT_FILE", args.audit_file).map(PathBuf::from),
                url: pick("AUDIT_URL", args.audit_url),
            },
            auth: AuthConfig {
                secret: pick("SECRET_KEY", args.secret),
            },
            log_level,
        })
    }
}
