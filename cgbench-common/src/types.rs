use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Number of ticks kept in every chart's sliding window
pub const WINDOW_SIZE: usize = 60;

/// Metrics charted by the dashboard, one chart panel each.
///
/// The wire keys match what the trace-replay runner emits in its
/// interval results (`lat`, `cur_bw`, `avg_bw`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Latency,
    CurrentBandwidth,
    AverageBandwidth,
}

impl Metric {
    /// All metrics in their fixed panel order
    pub const ALL: [Metric; 3] = [
        Metric::Latency,
        Metric::CurrentBandwidth,
        Metric::AverageBandwidth,
    ];

    /// Key used in sample maps and runner output
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Latency => "lat",
            Metric::CurrentBandwidth => "cur_bw",
            Metric::AverageBandwidth => "avg_bw",
        }
    }

    /// Human-readable chart title
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Latency => "Latency",
            Metric::CurrentBandwidth => "Current Bandwidth",
            Metric::AverageBandwidth => "Average Bandwidth",
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::ALL.iter().copied().find(|m| m.key() == key)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Identifier of a tracked entity (cgroup) inside a sample.
///
/// The runner is inconsistent about the form it emits: raw 1-based
/// integers and prefixed strings like `"cgroup-3"` both occur. Both
/// deserialize here; resolution to a series index happens in the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Index(u64),
    Name(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Index(n) => write!(f, "{}", n),
            EntityId::Name(s) => f.write_str(s),
        }
    }
}

/// One entity's measurements for one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: EntityId,
    pub metrics: HashMap<String, f64>,
}

impl Sample {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            metrics: HashMap::new(),
        }
    }

    pub fn with_metric(mut self, metric: Metric, value: f64) -> Self {
        self.metrics.insert(metric.key().to_string(), value);
        self
    }
}

/// One tick's worth of samples, one entry per entity
pub type SampleBatch = Vec<Sample>;

/// Benchmark driver selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    TraceReplay,
    Docker,
}

impl Default for DriverKind {
    fn default() -> Self {
        DriverKind::TraceReplay
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverKind::TraceReplay => f.write_str("trace-replay"),
            DriverKind::Docker => f.write_str("docker"),
        }
    }
}

/// Per-cgroup options collected from the configuration form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CgroupOptions {
    pub weight: u32,
    pub trace_data_path: String,
}

impl Default for CgroupOptions {
    fn default() -> Self {
        Self {
            weight: 1000,
            trace_data_path: String::from("./sample/sample1.dat"),
        }
    }
}

/// Bookkeeping for one benchmarking run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub driver: DriverKind,
    pub entity_count: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    pub fn begin(driver: DriverKind, entity_count: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            driver,
            entity_count,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
