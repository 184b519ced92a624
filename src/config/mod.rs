use std::env;

/// Config holds transport-level settings for talking to a chassis
#[derive(Debug, Clone)]
pub struct Config {
    /// Management API port used when the address carries none
    pub default_port: u16,
    /// Per-request timeout in seconds
    pub http_timeout_secs: u64,
    /// Chassis certificates are self-signed out of the factory, so
    /// verification is off unless explicitly enabled
    pub verify_tls: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            default_port: get_env("CF_DEFAULT_PORT", "8443").parse().unwrap_or(8443),
            http_timeout_secs: get_env("CF_HTTP_TIMEOUT_SECS", "30")
                .parse()
                .unwrap_or(30),
            verify_tls: get_env("CF_VERIFY_TLS", "false") == "true",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_port: 8443,
            http_timeout_secs: 30,
            verify_tls: false,
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
