use std::path::PathBuf;

use core_config::{ConfigError, FromEnv, env_or_default, env_parse_optional, env_parse_or, env_required};

/// Process-level settings for the gRPC host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on concurrently executing index calls
    pub max_workers: usize,
    pub index_path: PathBuf,
    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
}

impl ServerConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            host: "[::]".to_string(),
            port: 50051,
            max_workers: 10,
            index_path: index_path.into(),
            metrics_port: None,
        }
    }

    /// `host:port`, resolved when binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let max_workers: usize = env_parse_or("FAISS_GRPC_MAX_WORKERS", 10)?;
        if max_workers == 0 {
            return Err(ConfigError::ParseError {
                key: "FAISS_GRPC_MAX_WORKERS".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            host: env_or_default("FAISS_GRPC_HOST", "[::]"),
            port: env_parse_or("FAISS_GRPC_PORT", 50051)?,
            max_workers,
            index_path: PathBuf::from(env_required("FAISS_GRPC_INDEX_PATH")?),
            metrics_port: env_parse_optional("METRICS_PORT")?,
        })
    }
}
