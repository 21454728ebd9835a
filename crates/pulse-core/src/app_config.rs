use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide settings. Provider credentials are not part of it; they
/// travel with each aggregation request.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub instagram_base_url: String,
    pub search_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub search_max_attempts: u32,
    pub instagram_max_attempts: u32,
    pub network_backoff_base_secs: u64,
    pub network_backoff_step_secs: u64,
    pub rate_limit_min_wait_secs: u64,
    pub rate_limit_jitter_secs: u64,
    pub max_wait_secs: u64,
    pub comment_concurrency: usize,
    pub aggregate_deadline_secs: u64,
    pub default_query: String,
    pub default_result_count: u32,
}
