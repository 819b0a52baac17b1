//! Configuration for the cgbench dashboard and runner defaults

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{DashboardError, Result};

/// Dashboard server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Address the HTTP/WebSocket server binds to
    pub bind: SocketAddr,
    /// Directory the static front end is served from
    pub static_dir: PathBuf,
    /// Capacity of the viewer broadcast channel
    pub frame_buffer: usize,
    /// Defaults applied to runs that omit global options
    pub runner: RunnerDefaults,
}

/// Global runner options shared by every cgroup in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerDefaults {
    /// Run duration in seconds
    pub time: u64,
    /// I/O queue depth per cgroup
    pub q_depth: u32,
    /// Worker threads per cgroup
    pub nr_thread: u32,
    /// Name prefix for the cgroups the runner creates
    pub prefix_cgroup_name: String,
    /// Block-layer I/O scheduler the run is pinned to
    pub scheduler: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".parse().expect("static default address"),
            static_dir: PathBuf::from("./static"),
            frame_buffer: 64,
            runner: RunnerDefaults::default(),
        }
    }
}

impl Default for RunnerDefaults {
    fn default() -> Self {
        Self {
            time: 60,
            q_depth: 32,
            nr_thread: 4,
            prefix_cgroup_name: String::from("tester.trace."),
            scheduler: String::from("bfq"),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| DashboardError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DashboardError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment-variable overrides on top of the loaded values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(bind) = std::env::var("CGBENCH_BIND") {
            match bind.parse() {
                Ok(addr) => self.bind = addr,
                Err(_) => tracing::warn!("ignoring unparsable CGBENCH_BIND={}", bind),
            }
        }
        if let Ok(dir) = std::env::var("CGBENCH_STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        if let Ok(time) = std::env::var("CGBENCH_RUN_TIME") {
            self.runner.time = time.parse().unwrap_or(self.runner.time);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_buffer == 0 {
            return Err(DashboardError::Config(
                "frame_buffer must be at least 1".to_string(),
            ));
        }
        if self.runner.time == 0 {
            return Err(DashboardError::Config(
                "runner.time must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.runner.scheduler, "bfq");
        assert_eq!(config.runner.q_depth, 32);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");

        let mut config = DashboardConfig::default();
        config.runner.time = 120;
        config.to_file(&path).unwrap();

        let loaded = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(loaded.runner.time, 120);
        assert_eq!(loaded.bind, config.bind);
    }

    #[test]
    fn test_zero_run_time_rejected() {
        let mut config = DashboardConfig::default();
        config.runner.time = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides_applied_and_unparsable_values_fall_back() {
        std::env::set_var("CGBENCH_BIND", "0.0.0.0:9000");
        std::env::set_var("CGBENCH_STATIC_DIR", "/srv/cgbench/static");
        std::env::set_var("CGBENCH_RUN_TIME", "not-a-number");

        let mut config = DashboardConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.static_dir, PathBuf::from("/srv/cgbench/static"));
        // unparsable run time keeps the configured value
        assert_eq!(config.runner.time, RunnerDefaults::default().time);

        std::env::set_var("CGBENCH_RUN_TIME", "120");
        config.apply_env_overrides();
        assert_eq!(config.runner.time, 120);

        std::env::remove_var("CGBENCH_BIND");
        std::env::remove_var("CGBENCH_STATIC_DIR");
        std::env::remove_var("CGBENCH_RUN_TIME");
    }
}
