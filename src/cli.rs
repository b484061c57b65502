//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::auth::{ACCESS_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};
use crate::store::MemoryStore;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

const MIN_SECRET_LENGTH: usize = 32;

pub const ACCESS_SECRET_ENV: &str = "ACCESS_TOKEN_SECRET";
pub const REFRESH_SECRET_ENV: &str = "REFRESH_TOKEN_SECRET";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tokenrelay",
    about = "Stateless access/refresh token authentication server"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "TOKENRELAY_PORT", default_value = "3000")]
    pub port: u16,

    /// Public origin of the server (e.g., "https://auth.example.com").
    /// Cookies get the Secure flag when this is https.
    #[arg(long, env = "TOKENRELAY_ORIGIN", default_value = "http://localhost:3000")]
    pub origin: String,

    /// JSON file with the users known to the credential store
    #[arg(short, long, env = "TOKENRELAY_USERS_FILE")]
    pub users_file: Option<PathBuf>,

    /// Path to file containing the access token secret. Prefer the ACCESS_TOKEN_SECRET env var
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer the REFRESH_TOKEN_SECRET env var
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = ACCESS_TOKEN_TTL_SECS, value_parser = clap::value_parser!(u64).range(1..=MAX_TOKEN_TTL_SECS))]
    pub access_ttl: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = REFRESH_TOKEN_TTL_SECS, value_parser = clap::value_parser!(u64).range(1..=MAX_TOKEN_TTL_SECS))]
    pub refresh_ttl: u64,

    /// Issue a new refresh token on every refresh and reject the previous one
    #[arg(long)]
    pub rotate_refresh_tokens: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load a signing secret from an environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_secret(env_var: &str, secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            env_var = %env_var,
            "Secret is required. Set the environment variable (recommended) or pass the secret file option"
        );
        return None;
    };

    validate_secret(env_var, secret)
}

fn validate_secret(name: &str, secret: String) -> Option<String> {
    if secret.len() < MIN_SECRET_LENGTH {
        error!(
            secret = %name,
            "Secret is shorter than {} characters. Use a longer secret", MIN_SECRET_LENGTH
        );
        return None;
    }
    Some(secret)
}

/// Load both signing secrets and check that they differ.
pub fn load_secrets(args: &Args) -> Option<(String, String)> {
    let access = load_secret(ACCESS_SECRET_ENV, args.access_secret_file.as_deref())?;
    let refresh = load_secret(REFRESH_SECRET_ENV, args.refresh_secret_file.as_deref())?;
    check_distinct(access, refresh)
}

fn check_distinct(access: String, refresh: String) -> Option<(String, String)> {
    if access == refresh {
        error!("Access and refresh secrets must be different");
        return None;
    }
    Some((access, refresh))
}

/// Parse and validate the public origin URL.
/// Returns None and logs an error if validation fails.
pub fn validate_origin(origin: &str) -> Option<Url> {
    let url = match Url::parse(origin) {
        Ok(url) => url,
        Err(e) => {
            error!(origin = %origin, error = %e, "Invalid origin URL");
            return None;
        }
    };

    let is_https = url.scheme() == "https";
    let is_localhost = matches!(url.host_str(), Some("localhost" | "127.0.0.1"));

    if !is_https && !is_localhost {
        error!("origin must use HTTPS for non-localhost deployments");
        return None;
    }

    Some(url)
}

/// Load the credential store from the users file.
pub fn load_store(users_file: Option<&Path>) -> Option<MemoryStore> {
    let Some(path) = users_file else {
        warn!("No users file given; every login will be rejected");
        return Some(MemoryStore::new());
    };

    match MemoryStore::from_file(path) {
        Ok(store) => {
            if store.is_empty() {
                warn!(path = %path.display(), "Users file is empty; every login will be rejected");
            } else {
                info!(path = %path.display(), users = store.len(), "Users loaded");
            }
            Some(store)
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to load users file");
            None
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    args: &Args,
    store: MemoryStore,
    origin: &Url,
    access_secret: String,
    refresh_secret: String,
) -> ServerConfig {
    ServerConfig {
        store: Arc::new(store),
        access_secret: access_secret.into_bytes(),
        refresh_secret: refresh_secret.into_bytes(),
        access_ttl: args.access_ttl,
        refresh_ttl: args.refresh_ttl,
        rotate_refresh_tokens: args.rotate_refresh_tokens,
        secure_cookies: origin.scheme() == "https",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_origin() {
        assert!(validate_origin("https://auth.example.com").is_some());
        assert!(validate_origin("http://localhost:3000").is_some());
        assert!(validate_origin("http://127.0.0.1:3000").is_some());
        assert!(validate_origin("http://auth.example.com").is_none());
        assert!(validate_origin("not a url").is_none());
    }

    #[test]
    fn test_secret_length() {
        assert!(validate_secret("test", "short".to_string()).is_none());
        assert!(validate_secret("test", "x".repeat(MIN_SECRET_LENGTH)).is_some());
    }

    #[test]
    fn test_secrets_must_differ() {
        let secret = "s".repeat(MIN_SECRET_LENGTH);
        assert!(check_distinct(secret.clone(), secret.clone()).is_none());
        assert!(check_distinct(secret, "t".repeat(MIN_SECRET_LENGTH)).is_some());
    }

    #[test]
    fn test_secure_cookies_follow_origin() {
        let args = Args::parse_from(["tokenrelay"]);
        let secret_a = "a".repeat(MIN_SECRET_LENGTH);
        let secret_b = "b".repeat(MIN_SECRET_LENGTH);

        let https = Url::parse("https://auth.example.com").unwrap();
        let config = build_config(&args, MemoryStore::new(), &https, secret_a.clone(), secret_b.clone());
        assert!(config.secure_cookies);
        assert_eq!(config.access_ttl, ACCESS_TOKEN_TTL_SECS);
        assert_eq!(config.refresh_ttl, REFRESH_TOKEN_TTL_SECS);
        assert!(!config.rotate_refresh_tokens);

        let local = Url::parse("http://localhost:3000").unwrap();
        let config = build_config(&args, MemoryStore::new(), &local, secret_a, secret_b);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_parse_ttl_flags() {
        let args = Args::parse_from([
            "tokenrelay",
            "--access-ttl",
            "60",
            "--refresh-ttl",
            "3600",
            "--rotate-refresh-tokens",
        ]);
        assert_eq!(args.access_ttl, 60);
        assert_eq!(args.refresh_ttl, 3600);
        assert!(args.rotate_refresh_tokens);

        assert!(Args::try_parse_from(["tokenrelay", "--access-ttl", "0"]).is_err());
    }

    #[test]
    fn test_ttl_upper_bound() {
        let max = MAX_TOKEN_TTL_SECS.to_string();
        let args = Args::parse_from(["tokenrelay", "--refresh-ttl", max.as_str()]);
        assert_eq!(args.refresh_ttl, MAX_TOKEN_TTL_SECS);

        let too_long = (MAX_TOKEN_TTL_SECS + 1).to_string();
        assert!(Args::try_parse_from(["tokenrelay", "--access-ttl", too_long.as_str()]).is_err());
        assert!(Args::try_parse_from(["tokenrelay", "--refresh-ttl", too_long.as_str()]).is_err());

        let huge = u64::MAX.to_string();
        assert!(Args::try_parse_from(["tokenrelay", "--refresh-ttl", huge.as_str()]).is_err());
    }

    #[test]
    fn test_load_store_from_file() {
        let path = std::env::temp_dir().join(format!("tokenrelay-users-{}.json", uuid::Uuid::new_v4()));

        std::fs::write(&path, "[]").unwrap();
        let store = load_store(Some(&path)).unwrap();
        assert!(store.is_empty());

        std::fs::write(&path, "not json").unwrap();
        assert!(load_store(Some(&path)).is_none());

        std::fs::remove_file(&path).unwrap();
    }
}
