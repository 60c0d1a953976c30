//! Configuration module for the Jenkins exporter.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Routes served next to the metrics route.
pub const RESERVED_PATHS: [&str; 2] = ["/", "/healthz"];

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Jenkins base URL (default: "http://localhost:8080")
    pub jenkins_url: String,
    /// Jenkins user name (default: "admin")
    pub jenkins_username: String,
    /// Jenkins API token or password (default: "admin")
    pub jenkins_password: String,
    /// Timeout for every Jenkins request (default: 30s)
    pub jenkins_timeout: Duration,
    /// Time between two poll cycles (default: 5m)
    pub run_interval: Duration,
    /// Address the HTTP server binds to (default: "0.0.0.0:9118")
    pub listen_address: String,
    /// Route serving the metrics (default: "/metrics")
    pub telemetry_path: String,
    /// Upper bound on concurrent requests during the duration fan-out (default: 10)
    pub fetch_concurrency: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            jenkins_url: "http://localhost:8080".to_string(),
            jenkins_username: "admin".to_string(),
            jenkins_password: "admin".to_string(),
            jenkins_timeout: Duration::from_secs(30),
            run_interval: Duration::from_secs(300),
            listen_address: "0.0.0.0:9118".to_string(),
            telemetry_path: "/metrics".to_string(),
            fetch_concurrency: 10,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `JENKINS_URL`: Jenkins base URL
    /// - `JENKINS_USERNAME`: Jenkins user name
    /// - `JENKINS_PASSWORD`: Jenkins API token or password
    /// - `JENKINS_TIMEOUT`: request timeout in seconds
    /// - `JENKINS_EXPORTER_RUN_INTERVAL`: poll interval in seconds
    /// - `JENKINS_EXPORTER_LISTEN_ADDRESS`: listen address, `host:port`
    /// - `JENKINS_EXPORTER_TELEMETRY_PATH`: metrics route
    /// - `JENKINS_EXPORTER_FETCH_CONCURRENCY`: fan-out request limit
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup("JENKINS_URL") {
            cfg.jenkins_url = url.trim_end_matches('/').to_string();
        }

        if let Some(username) = lookup("JENKINS_USERNAME") {
            cfg.jenkins_username = username;
        }

        if let Some(password) = lookup("JENKINS_PASSWORD") {
            cfg.jenkins_password = password;
        }

        if let Some(secs) = lookup("JENKINS_TIMEOUT").and_then(|s| parse_secs(&s)) {
            cfg.jenkins_timeout = secs;
        }

        if let Some(secs) = lookup("JENKINS_EXPORTER_RUN_INTERVAL").and_then(|s| parse_secs(&s)) {
            cfg.run_interval = secs;
        }

        if let Some(addr) = lookup("JENKINS_EXPORTER_LISTEN_ADDRESS") {
            cfg.listen_address = addr;
        }

        if let Some(path) = lookup("JENKINS_EXPORTER_TELEMETRY_PATH") {
            let path = if path.starts_with('/') {
                path
            } else {
                format!("/{}", path)
            };
            if RESERVED_PATHS.contains(&path.as_str()) {
                tracing::warn!(
                    "Telemetry path {} collides with a built-in route, using {}",
                    path,
                    cfg.telemetry_path
                );
            } else {
                cfg.telemetry_path = path;
            }
        }

        if let Some(n) = lookup("JENKINS_EXPORTER_FETCH_CONCURRENCY")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
        {
            cfg.fetch_concurrency = n;
        }

        cfg
    }
}

/// Parse a positive number of seconds.
fn parse_secs(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_from(vars: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.jenkins_url, "http://localhost:8080");
        assert_eq!(cfg.run_interval, Duration::from_secs(300));
        assert_eq!(cfg.listen_address, "0.0.0.0:9118");
        assert_eq!(cfg.telemetry_path, "/metrics");
    }

    #[test]
    fn test_env_overrides() {
        let cfg = load_from(&[
            ("JENKINS_URL", "https://ci.example.com/"),
            ("JENKINS_USERNAME", "bot"),
            ("JENKINS_TIMEOUT", "5"),
            ("JENKINS_EXPORTER_RUN_INTERVAL", "60"),
            ("JENKINS_EXPORTER_TELEMETRY_PATH", "prom"),
            ("JENKINS_EXPORTER_FETCH_CONCURRENCY", "4"),
        ]);
        assert_eq!(cfg.jenkins_url, "https://ci.example.com");
        assert_eq!(cfg.jenkins_username, "bot");
        assert_eq!(cfg.jenkins_password, "admin");
        assert_eq!(cfg.jenkins_timeout, Duration::from_secs(5));
        assert_eq!(cfg.run_interval, Duration::from_secs(60));
        assert_eq!(cfg.telemetry_path, "/prom");
        assert_eq!(cfg.fetch_concurrency, 4);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = load_from(&[
            ("JENKINS_EXPORTER_RUN_INTERVAL", "0"),
            ("JENKINS_TIMEOUT", "soon"),
            ("JENKINS_EXPORTER_FETCH_CONCURRENCY", "0"),
        ]);
        assert_eq!(cfg.run_interval, Duration::from_secs(300));
        assert_eq!(cfg.jenkins_timeout, Duration::from_secs(30));
        assert_eq!(cfg.fetch_concurrency, 10);
    }

    #[test]
    fn test_telemetry_path_cannot_shadow_other_routes() {
        for path in ["/", "/healthz", "healthz"] {
            let cfg = load_from(&[("JENKINS_EXPORTER_TELEMETRY_PATH", path)]);
            assert_eq!(cfg.telemetry_path, "/metrics");
        }
    }
}
