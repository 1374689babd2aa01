//! Dashboard configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use construcard_auth::{FileSessionStore, SessionConfig};

pub const DEFAULT_LOGIN_LATENCY: Duration = Duration::from_millis(1000);

/// Longest accepted session TTL (ten years).
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Directory holding the persisted session slot.
    pub session_dir: PathBuf,
    /// Simulated credential check delay of the demo backend.
    pub login_latency: Duration,
    pub session_ttl: Option<Duration>,
}

impl DashboardConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable numbers fall back
    /// to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_dir = match lookup("CONSTRUCARD_SESSION_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => FileSessionStore::default_dir()
                .context("failed to resolve session directory; set CONSTRUCARD_SESSION_DIR")?,
        };

        let login_latency = parse_u64(&lookup, "CONSTRUCARD_LOGIN_LATENCY_MS")
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_LOGIN_LATENCY);

        let session_ttl = parse_u64(&lookup, "CONSTRUCARD_SESSION_TTL_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .filter(|ttl| {
                let accepted = *ttl <= MAX_SESSION_TTL;
                if !accepted {
                    tracing::warn!(
                        ttl_secs = ttl.as_secs(),
                        max_secs = MAX_SESSION_TTL.as_secs(),
                        "ignoring session ttl above the maximum; sessions will not expire"
                    );
                }
                accepted
            });

        Ok(Self {
            session_dir,
            login_latency,
            session_ttl,
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            session_ttl: self.session_ttl,
            ..SessionConfig::default()
        }
    }
}

fn parse_u64<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, value = %raw, error = %err, "ignoring invalid configuration value");
            None
        }
    }
}
