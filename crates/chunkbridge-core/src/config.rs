//! Environment configuration for the chunkbridge tools.
//!
//! Connection settings are read from environment variables, optionally
//! seeded from a `.env` file. Resolution goes through a lookup function so
//! callers (and tests) decide where values come from.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chunkbridge_store::config::{MilvusConfig, TidbConfig, DEFAULT_MILVUS_TOKEN};
use tracing::debug;

use crate::errors::{BridgeError, BridgeResult};

// ============================================================================
// Variable names
// ============================================================================

pub const ENV_MILVUS_HOST: &str = "MILVUS_HOST";
pub const ENV_MILVUS_PORT: &str = "MILVUS_GRPC_PORT";
pub const ENV_MILVUS_TOKEN: &str = "MILVUS_TOKEN";
pub const ENV_MILVUS_TIMEOUT: &str = "MILVUS_TIMEOUT_SECS";
pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_USERNAME: &str = "DB_USERNAME";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_DATABASE: &str = "DB_DATABASE";

/// Variable naming an alternative `.env` file.
pub const ENV_FILE_VAR: &str = "CHUNKBRIDGE_ENV_FILE";

// ============================================================================
// .env loading
// ============================================================================

/// Load a `.env` file into the process environment.
///
/// With an explicit `path` the file must exist. Without one, `.env` is looked
/// up from the working directory and its absence is not an error. Variables
/// that are already set are never overridden.
///
/// Returns the path that was loaded, if any.
pub fn load_dotenv(path: Option<&Path>) -> BridgeResult<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| BridgeError::InvalidConfiguration {
                message: format!("cannot read env file {}: {}", path.display(), e),
                hint: "Check the --env-file path".to_string(),
            })?;
            debug!("Loaded environment from {}", path.display());
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(found) => {
                debug!("Loaded environment from {}", found.display());
                Ok(Some(found))
            }
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(BridgeError::InvalidConfiguration {
                message: format!("cannot parse .env file: {}", e),
                hint: "Fix the .env syntax or point --env-file elsewhere".to_string(),
            }),
        },
    }
}

/// Lookup function backed by the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

// ============================================================================
// Resolution
// ============================================================================

/// Collects values and remembers every required variable that was missing.
struct Resolver<F> {
    lookup: F,
    missing: Vec<String>,
}

impl<F> Resolver<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &str) -> Option<String> {
        let value = self.optional(key);
        if value.is_none() {
            self.missing.push(key.to_string());
        }
        value
    }

    fn finish(self) -> BridgeResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(BridgeError::MissingEnv { vars: self.missing })
        }
    }
}

fn parse_port(key: &str, value: &str) -> BridgeResult<u16> {
    value
        .parse::<u16>()
        .map_err(|_| BridgeError::InvalidConfiguration {
            message: format!("{}={:?} is not a valid port", key, value),
            hint: format!("Set {} to a number between 0 and 65535", key),
        })
}

struct MilvusVars {
    host: Option<String>,
    port: Option<String>,
    token: Option<String>,
    timeout: Option<String>,
}

fn read_milvus<F: Fn(&str) -> Option<String>>(r: &mut Resolver<F>) -> MilvusVars {
    MilvusVars {
        host: r.required(ENV_MILVUS_HOST),
        port: r.required(ENV_MILVUS_PORT),
        token: r.optional(ENV_MILVUS_TOKEN),
        timeout: r.optional(ENV_MILVUS_TIMEOUT),
    }
}

fn build_milvus(vars: MilvusVars) -> BridgeResult<MilvusConfig> {
    let (Some(host), Some(port)) = (vars.host, vars.port) else {
        return Err(BridgeError::MissingEnv {
            vars: vec![ENV_MILVUS_HOST.to_string(), ENV_MILVUS_PORT.to_string()],
        });
    };
    let mut config = MilvusConfig::new(host, parse_port(ENV_MILVUS_PORT, &port)?)
        .with_token(vars.token.unwrap_or_else(|| DEFAULT_MILVUS_TOKEN.to_string()));
    if let Some(raw) = vars.timeout {
        let secs = raw
            .parse::<u64>()
            .map_err(|_| BridgeError::InvalidConfiguration {
                message: format!("{}={:?} is not a number of seconds", ENV_MILVUS_TIMEOUT, raw),
                hint: format!("Set {} to a whole number, e.g. 30", ENV_MILVUS_TIMEOUT),
            })?;
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

struct TidbVars {
    host: Option<String>,
    port: Option<String>,
    username: Option<String>,
    password: Option<String>,
    database: Option<String>,
}

fn read_tidb<F: Fn(&str) -> Option<String>>(r: &mut Resolver<F>) -> TidbVars {
    TidbVars {
        host: r.required(ENV_DB_HOST),
        port: r.required(ENV_DB_PORT),
        username: r.required(ENV_DB_USERNAME),
        password: (r.lookup)(ENV_DB_PASSWORD),
        database: r.required(ENV_DB_DATABASE),
    }
}

fn build_tidb(vars: TidbVars, enable_ssl: bool) -> BridgeResult<TidbConfig> {
    let (Some(host), Some(port), Some(username), Some(database)) =
        (vars.host, vars.port, vars.username, vars.database)
    else {
        return Err(BridgeError::MissingEnv {
            vars: vec![
                ENV_DB_HOST.to_string(),
                ENV_DB_PORT.to_string(),
                ENV_DB_USERNAME.to_string(),
                ENV_DB_DATABASE.to_string(),
            ],
        });
    };
    let port = parse_port(ENV_DB_PORT, &port)?;
    Ok(TidbConfig::new(
        host,
        port,
        username,
        vars.password.unwrap_or_default(),
        database,
    )
    .with_ssl(enable_ssl))
}

/// Resolve the Milvus connection settings.
pub fn milvus_config<F>(lookup: F) -> BridgeResult<MilvusConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut resolver = Resolver::new(lookup);
    let vars = read_milvus(&mut resolver);
    resolver.finish()?;
    build_milvus(vars)
}

/// Resolve the TiDB connection settings.
pub fn tidb_config<F>(lookup: F, enable_ssl: bool) -> BridgeResult<TidbConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut resolver = Resolver::new(lookup);
    let vars = read_tidb(&mut resolver);
    resolver.finish()?;
    build_tidb(vars, enable_ssl)
}

/// Resolve both stores at once, reporting every missing variable together.
pub fn migration_config<F>(lookup: F, enable_ssl: bool) -> BridgeResult<(MilvusConfig, TidbConfig)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut resolver = Resolver::new(lookup);
    let milvus = read_milvus(&mut resolver);
    let tidb = read_tidb(&mut resolver);
    resolver.finish()?;
    Ok((build_milvus(milvus)?, build_tidb(tidb, enable_ssl)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const FULL: &[(&str, &str)] = &[
        ("MILVUS_HOST", "milvus"),
        ("MILVUS_GRPC_PORT", "19530"),
        ("DB_HOST", "tidb"),
        ("DB_PORT", "4000"),
        ("DB_USERNAME", "root"),
        ("DB_DATABASE", "test"),
    ];

    #[test]
    fn test_milvus_config_defaults() {
        let config = milvus_config(lookup(FULL)).unwrap();
        assert_eq!(config.base_url(), "http://milvus:19530");
        assert_eq!(config.token, DEFAULT_MILVUS_TOKEN);
    }

    #[test]
    fn test_milvus_overrides() {
        let config = milvus_config(lookup(&[
            ("MILVUS_HOST", "m"),
            ("MILVUS_GRPC_PORT", "1"),
            ("MILVUS_TOKEN", "u:p"),
            ("MILVUS_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.token, "u:p");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_migration_config_lists_all_missing() {
        let err = migration_config(lookup(&[("DB_PORT", "4000")]), true).unwrap_err();
        match err {
            BridgeError::MissingEnv { vars } => assert_eq!(
                vars,
                vec![
                    "MILVUS_HOST",
                    "MILVUS_GRPC_PORT",
                    "DB_HOST",
                    "DB_USERNAME",
                    "DB_DATABASE"
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let err = milvus_config(lookup(&[("MILVUS_HOST", "  "), ("MILVUS_GRPC_PORT", "1")]))
            .unwrap_err();
        assert!(matches!(err, BridgeError::MissingEnv { ref vars } if vars == &["MILVUS_HOST"]));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = FULL.to_vec();
        pairs.push(("DB_PORT", "forty"));
        pairs.retain(|(k, v)| *k != "DB_PORT" || *v == "forty");
        let err = tidb_config(lookup(&pairs), true).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn test_tidb_config_ssl_and_password() {
        let config = tidb_config(lookup(FULL), false).unwrap();
        assert!(!config.enable_ssl);
        assert_eq!(config.password, "");
        assert_eq!(config.display_target(), "tidb:4000/test");

        let (_, config) = migration_config(lookup(FULL), true).unwrap();
        assert!(config.enable_ssl);
    }

    #[test]
    fn test_load_explicit_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.env");
        std::fs::write(&path, "CHUNKBRIDGE_TEST_ONLY_VAR=from-file\n").unwrap();

        let loaded = load_dotenv(Some(&path)).unwrap();
        assert_eq!(loaded.as_deref(), Some(path.as_path()));
        assert_eq!(
            process_env("CHUNKBRIDGE_TEST_ONLY_VAR").as_deref(),
            Some("from-file")
        );
    }

    #[test]
    fn test_load_missing_env_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dotenv(Some(&dir.path().join("absent.env"))).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfiguration { .. }));
    }
}
