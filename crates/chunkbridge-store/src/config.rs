//! Connection settings for the store backends.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Token accepted by a stock Milvus deployment.
pub const DEFAULT_MILVUS_TOKEN: &str = "root:Milvus";

/// Default HTTP timeout for Milvus calls.
pub const DEFAULT_MILVUS_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for acquiring the TiDB connection.
pub const DEFAULT_TIDB_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// MilvusConfig
// ============================================================================

/// Where and how to reach Milvus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilvusConfig {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing)]
    pub token: String,
    pub timeout: Duration,
}

impl MilvusConfig {
    /// Create a config with the default token and timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            token: DEFAULT_MILVUS_TOKEN.to_string(),
            timeout: DEFAULT_MILVUS_TIMEOUT,
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL of the REST endpoint.
    ///
    /// A host that already carries a scheme is used as-is.
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }
}

// ============================================================================
// TidbConfig
// ============================================================================

/// Where and how to reach TiDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
    pub enable_ssl: bool,
    pub connect_timeout: Duration,
}

impl TidbConfig {
    /// Create a config with TLS enabled.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            database: database.into(),
            enable_ssl: true,
            connect_timeout: DEFAULT_TIDB_CONNECT_TIMEOUT,
        }
    }

    /// Enable or disable TLS.
    pub fn with_ssl(mut self, enable_ssl: bool) -> Self {
        self.enable_ssl = enable_ssl;
        self
    }

    /// `host:port/database` for log lines; never includes credentials.
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milvus_base_url() {
        assert_eq!(
            MilvusConfig::new("localhost", 19530).base_url(),
            "http://localhost:19530"
        );
        assert_eq!(
            MilvusConfig::new("https://milvus.internal/", 443).base_url(),
            "https://milvus.internal:443"
        );
    }

    #[test]
    fn test_milvus_defaults() {
        let config = MilvusConfig::new("h", 1).with_token("u:p");
        assert_eq!(config.token, "u:p");
        assert_eq!(config.timeout, DEFAULT_MILVUS_TIMEOUT);
    }

    #[test]
    fn test_tidb_display_target_hides_password() {
        let config = TidbConfig::new("tidb", 4000, "root", "secret", "test").with_ssl(false);
        assert!(!config.enable_ssl);
        assert_eq!(config.display_target(), "tidb:4000/test");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
