//! Server configuration

use std::env;

/// Runtime configuration, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// SQLite database path; absent means the in-memory store
    pub database_path: Option<String>,

    /// HMAC secret for session tokens
    pub token_secret: String,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Recognized variables:
    /// - `PORT` (default: 3000)
    /// - `DATABASE_PATH` (default: in-memory store)
    /// - `TOKEN_SECRET` (default: an ephemeral secret; sessions will not
    ///   survive a restart)
    pub fn from_env() -> Self {
        fn get_env(key: &str) -> Option<String> {
            env::var(key).ok().filter(|s| !s.is_empty())
        }

        let port = get_env("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let database_path = get_env("DATABASE_PATH");

        let token_secret = match get_env("TOKEN_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!(
                    "TOKEN_SECRET not set; using an ephemeral secret, sessions will not survive restarts"
                );
                uuid::Uuid::new_v4().to_string()
            }
        };

        Self {
            port,
            database_path,
            token_secret,
        }
    }
}
