use core_config::{ConfigError, FromEnv, env_bool_or, env_parse_optional};

pub const NPROBE_ENV: &str = "FAISS_GRPC_NPROBE";
pub const NORMALIZE_QUERY_ENV: &str = "FAISS_GRPC_NORMALIZE_QUERY";

/// Search-time behavior of the query service.
///
/// Immutable once the service is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Number of inverted lists probed per search. `None` keeps the index default.
    pub probe_count: Option<u32>,
    /// L2-normalize client query vectors before searching.
    pub normalize_query: bool,
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe_count(mut self, probe_count: u32) -> Self {
        self.probe_count = Some(probe_count);
        self
    }

    pub fn with_normalize_query(mut self, normalize_query: bool) -> Self {
        self.normalize_query = normalize_query;
        self
    }
}

impl FromEnv for ServiceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // 0 is treated like unset
            probe_count: env_parse_optional::<u32>(NPROBE_ENV)?.filter(|&n| n > 0),
            normalize_query: env_bool_or(NORMALIZE_QUERY_ENV, false)?,
        })
    }
}
