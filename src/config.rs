//! Process configuration.
//!
//! Every setting is a CLI flag with an environment-variable fallback. The
//! token secret has no default: the server refuses to start without one.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::auth::{AuthSettings, DEFAULT_HASH_COST, MAX_HASH_COST, MIN_HASH_COST};
use crate::error::{Error, Result};

/// Secrets shorter than this still work but are logged as weak.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Parser, Clone)]
#[command(name = "bookshop")]
#[command(about = "HTTP JSON API for a bookshop")]
#[command(version)]
pub struct Config {
    /// Interface to listen on
    #[arg(long, env = "BOOKSHOP_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "BOOKSHOP_DATABASE", default_value = "bookshop.db")]
    pub database: PathBuf,

    /// Shared secret that signs login tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in seconds
    #[arg(long, env = "BOOKSHOP_TOKEN_TTL", default_value_t = 3600)]
    pub token_ttl: u64,

    /// bcrypt cost factor (4..=31)
    #[arg(long, env = "BOOKSHOP_HASH_COST", default_value_t = DEFAULT_HASH_COST)]
    pub hash_cost: u32,

    /// Replace all data with the sample catalog before serving
    #[arg(long)]
    pub seed: bool,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Checks the auth-related settings and bundles them for [`AuthService`].
    ///
    /// [`AuthService`]: crate::auth::AuthService
    pub fn auth_settings(&self) -> Result<AuthSettings> {
        let secret = self.jwt_secret.trim();
        if secret.is_empty() {
            return Err(Error::Config("JWT_SECRET must not be empty".to_owned()));
        }
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&self.hash_cost) {
            return Err(Error::Config(format!(
                "hash cost must be between {MIN_HASH_COST} and {MAX_HASH_COST}"
            )));
        }
        if self.token_ttl == 0 {
            return Err(Error::Config("token TTL must be positive".to_owned()));
        }
        Ok(AuthSettings::new(secret.as_bytes())
            .token_ttl(Duration::from_secs(self.token_ttl))
            .hash_cost(self.hash_cost))
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr())
            .field("database", &self.database)
            .field("token_ttl", &self.token_ttl)
            .field("hash_cost", &self.hash_cost)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("bookshop").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let config = parse(&["--jwt-secret", "s3cret", "--host", "0.0.0.0", "--port", "8080"]).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.database, PathBuf::from("bookshop.db"));
        let auth = config.auth_settings().unwrap();
        assert_eq!(auth.secret, b"s3cret");
        assert_eq!(auth.token_ttl, Duration::from_secs(3600));
        assert_eq!(auth.hash_cost, 10);
    }

    #[test]
    fn blank_secret_is_refused() {
        let config = parse(&["--jwt-secret", "   "]).unwrap();
        assert!(matches!(config.auth_settings(), Err(Error::Config(_))));
    }

    #[test]
    fn hash_cost_out_of_range_is_refused() {
        let config = parse(&["--jwt-secret", "s", "--hash-cost", "3"]).unwrap();
        assert!(matches!(config.auth_settings(), Err(Error::Config(_))));
        let config = parse(&["--jwt-secret", "s", "--hash-cost", "32"]).unwrap();
        assert!(matches!(config.auth_settings(), Err(Error::Config(_))));
        let config = parse(&["--jwt-secret", "s", "--hash-cost", "4"]).unwrap();
        assert_eq!(config.auth_settings().unwrap().hash_cost, 4);
    }

    #[test]
    fn debug_hides_secret() {
        let config = parse(&["--jwt-secret", "hunter2"]).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
