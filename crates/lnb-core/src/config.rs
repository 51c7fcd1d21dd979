use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::UserId, errors::Error, Result};

const DEFAULT_DATABASE_PATH: &str = "/data/bot.db";
const DEFAULT_PORT: u16 = 8080;

/// Typed process configuration, sourced from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub owner_id: Option<UserId>,

    // Webhook ingress
    pub webhook_api_key: String,
    pub port: u16,
    pub request_timeout: Duration,

    // Storage
    pub database_path: PathBuf,

    // Lifecycle
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Load from the process environment, after merging a local `.env` file if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).and_then(non_empty);

        // Required
        let telegram_bot_token = var("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let webhook_api_key = var("WEBHOOK_API_KEY").ok_or_else(|| {
            Error::Config("WEBHOOK_API_KEY environment variable is required".to_string())
        })?;

        let database_path =
            PathBuf::from(var("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.into()));

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("invalid PORT {raw:?}: {e}")))?,
            None => DEFAULT_PORT,
        };

        let owner_id = match var("OWNER_ID") {
            Some(raw) => Some(UserId(
                raw.trim()
                    .parse::<i64>()
                    .map_err(|e| Error::Config(format!("invalid OWNER_ID {raw:?}: {e}")))?,
            )),
            None => None,
        };

        let request_timeout = parse_secs("REQUEST_TIMEOUT_SECS", var("REQUEST_TIMEOUT_SECS"), 30)?;
        let shutdown_timeout =
            parse_secs("SHUTDOWN_TIMEOUT_SECS", var("SHUTDOWN_TIMEOUT_SECS"), 10)?;

        Ok(Self {
            telegram_bot_token,
            owner_id,
            webhook_api_key,
            port,
            request_timeout,
            database_path,
            shutdown_timeout,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    let quoted = val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')));
    if quoted {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

/// A whole, non-zero number of seconds; `default` when unset.
fn parse_secs(key: &str, raw: Option<String>, default: u64) -> Result<Duration> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(default));
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(Error::Config(format!("{key} must be greater than zero"))),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(Error::Config(format!("invalid {key} {raw:?}: {e}"))),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
