//! Runner configuration assembly
//!
//! Collects the driver selection, per-cgroup options and global
//! defaults into the JSON document the benchmark runner consumes:
//! `{"driver": "...", "setting": {..., "task_option": [...]}}`.
//! Option validation happens here, before a run is allowed to start.

use serde::{Deserialize, Serialize};

use cgbench_common::config::RunnerDefaults;
use cgbench_common::{CgroupOptions, DashboardError, DriverKind, Result};

/// Everything needed to launch one benchmarking run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    pub driver: DriverKind,
    pub cgroups: Vec<CgroupOptions>,
    pub defaults: RunnerDefaults,
}

/// The `setting` block of the runner config document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSetting {
    pub nr_tasks: usize,
    pub time: u64,
    pub q_depth: u32,
    pub nr_thread: u32,
    pub prefix_cgroup_name: String,
    pub scheduler: String,
    pub task_option: Vec<CgroupOptions>,
}

/// Top-level runner config document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub driver: DriverKind,
    pub setting: RunnerSetting,
}

impl RunPlan {
    pub fn new(driver: DriverKind, cgroups: Vec<CgroupOptions>, defaults: RunnerDefaults) -> Self {
        Self {
            driver,
            cgroups,
            defaults,
        }
    }

    /// The entity count of the run derives from the per-cgroup option
    /// list, one chart series per entry
    pub fn entity_count(&self) -> usize {
        self.cgroups.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.cgroups.is_empty() {
            return Err(DashboardError::Config(
                "a run needs at least one cgroup".to_string(),
            ));
        }
        for (idx, cgroup) in self.cgroups.iter().enumerate() {
            if cgroup.weight == 0 {
                return Err(DashboardError::Config(format!(
                    "cgroup-{}: weight must be positive",
                    idx + 1
                )));
            }
            if cgroup.trace_data_path.trim().is_empty() {
                return Err(DashboardError::Config(format!(
                    "cgroup-{}: trace_data_path is empty",
                    idx + 1
                )));
            }
        }
        Ok(())
    }

    /// Serialize into the runner's config document
    pub fn to_runner_config(&self) -> Result<String> {
        self.validate()?;
        let config = RunnerConfig {
            driver: self.driver,
            setting: RunnerSetting {
                nr_tasks: self.cgroups.len(),
                time: self.defaults.time,
                q_depth: self.defaults.q_depth,
                nr_thread: self.defaults.nr_thread,
                prefix_cgroup_name: self.defaults.prefix_cgroup_name.clone(),
                scheduler: self.defaults.scheduler.clone(),
                task_option: self.cgroups.clone(),
            },
        };
        Ok(serde_json::to_string(&config)?)
    }
}
