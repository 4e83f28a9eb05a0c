//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). `DATABASE_URL` has no default; its
//! absence is reported by the connection manager on first use rather
//! than at startup.

use std::net::SocketAddr;
use std::str::FromStr;

/// What the slug allocator does once every numbered candidate is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlugFallback {
    /// Use `base-<event id>`.
    #[default]
    AppendId,
    /// Fail the write with a duplicate-slug error.
    Reject,
}

impl FromStr for SlugFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append-id" | "append_id" | "id" => Ok(Self::AppendId),
            "reject" | "error" => Ok(Self::Reject),
            other => Err(format!("unknown slug fallback `{other}`")),
        }
    }
}

/// Slug allocation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlugPolicy {
    /// Highest numbered suffix tried before falling back.
    pub max_collisions: u32,
    /// Behavior once `max_collisions` is exceeded.
    pub fallback: SlugFallback,
    /// Commit attempts per write when a concurrent writer claims the slug
    /// between allocation and commit.
    pub commit_attempts: u32,
}

impl Default for SlugPolicy {
    fn default() -> Self {
        Self {
            max_collisions: 50,
            fallback: SlugFallback::AppendId,
            commit_attempts: 8,
        }
    }
}

/// Connection settings for the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection target. `memory://...` selects the in-process store.
    pub url: Option<String>,
    /// Maximum number of database connections in the pool.
    pub max_connections: u32,
    /// Minimum idle connections in the pool.
    pub min_connections: u32,
    /// Timeout in seconds for acquiring a database connection.
    pub connect_timeout_secs: u64,
    /// Apply embedded migrations after connecting.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 5,
            run_migrations: true,
        }
    }
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Backing store settings.
    pub database: DatabaseConfig,

    /// Slug allocation policy.
    pub slug: SlugPolicy,

    /// Include internal error details in server-error responses.
    pub expose_internal_errors: bool,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()?;

        let defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: parse_env(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_env(&lookup, "DATABASE_MIN_CONNECTIONS", defaults.min_connections),
            connect_timeout_secs: parse_env(
                &lookup,
                "DATABASE_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
            run_migrations: parse_env_bool(
                &lookup,
                "DATABASE_RUN_MIGRATIONS",
                defaults.run_migrations,
            ),
        };

        let defaults = SlugPolicy::default();
        let slug = SlugPolicy {
            max_collisions: parse_env(&lookup, "SLUG_MAX_COLLISIONS", defaults.max_collisions),
            fallback: parse_env(&lookup, "SLUG_FALLBACK", defaults.fallback),
            commit_attempts: parse_env(&lookup, "SLUG_COMMIT_ATTEMPTS", defaults.commit_attempts)
                .max(1),
        };

        let is_production =
            lookup("APP_ENV").is_some_and(|env| env.trim().eq_ignore_ascii_case("production"));
        let expose_internal_errors =
            parse_env_bool(&lookup, "EXPOSE_INTERNAL_ERRORS", !is_production);

        let request_timeout_secs = parse_env(&lookup, "REQUEST_TIMEOUT_SECS", 30);
        let log_json =
            lookup("LOG_FORMAT").is_some_and(|f| f.trim().eq_ignore_ascii_case("json"));

        Ok(Self {
            listen_addr,
            database,
            slug,
            expose_internal_errors,
            request_timeout_secs,
            log_json,
        })
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_env<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a variable as a boolean. Accepts `"true"`, `"1"`, `"false"`,
/// `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> GatewayConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let Ok(config) = GatewayConfig::from_lookup(|key| vars.get(key).cloned()) else {
            panic!("config should load");
        };
        config
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]);
        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.slug, SlugPolicy::default());
        assert!(config.expose_internal_errors);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(!config.log_json);
    }

    #[test]
    fn blank_database_url_counts_as_missing() {
        assert_eq!(load(&[("DATABASE_URL", "  ")]).database.url, None);
    }

    #[test]
    fn production_hides_internal_errors_unless_overridden() {
        assert!(!load(&[("APP_ENV", "Production")]).expose_internal_errors);
        assert!(
            load(&[("APP_ENV", "production"), ("EXPOSE_INTERNAL_ERRORS", "1")])
                .expose_internal_errors
        );
    }

    #[test]
    fn slug_policy_reads_overrides() {
        let config = load(&[
            ("SLUG_MAX_COLLISIONS", "3"),
            ("SLUG_FALLBACK", "reject"),
            ("SLUG_COMMIT_ATTEMPTS", "0"),
        ]);
        assert_eq!(config.slug.max_collisions, 3);
        assert_eq!(config.slug.fallback, SlugFallback::Reject);
        assert_eq!(config.slug.commit_attempts, 1);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = load(&[
            ("DATABASE_MAX_CONNECTIONS", "lots"),
            ("SLUG_FALLBACK", "shrug"),
            ("DATABASE_RUN_MIGRATIONS", "maybe"),
        ]);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.slug.fallback, SlugFallback::AppendId);
        assert!(config.database.run_migrations);
    }

    #[test]
    fn bad_listen_addr_is_an_error() {
        assert!(GatewayConfig::from_lookup(|key| {
            (key == "LISTEN_ADDR").then(|| "not-an-addr".to_string())
        })
        .is_err());
    }
}
