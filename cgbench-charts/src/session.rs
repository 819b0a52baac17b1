use std::fmt;

use tracing::{info, warn};

use cgbench_common::{DashboardError, DriverKind, Metric, Result, RunRecord, Sample};

use crate::registry::ChartRegistry;
use crate::router::{BatchReport, SampleRouter};
use crate::surface::SurfaceProvider;

/// Lifecycle of one benchmarking run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No active registry; configuration input is accepted
    Idle,
    /// A driver was selected; per-entity options are being collected
    Configuring,
    /// Charts are live and consuming sample batches
    Running,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Configuring => f.write_str("configuring"),
            RunState::Running => f.write_str("running"),
        }
    }
}

/// Owner of the run lifecycle and the chart registry.
///
/// All transport events funnel through here on a single logical thread
/// of execution; the session never mutates chart state outside of
/// `apply_batch`. Transport ordering (start before data, end after the
/// last data) is assumed from the connection's FIFO delivery, not
/// re-checked per event.
pub struct RunSession<P: SurfaceProvider> {
    state: RunState,
    provider: P,
    metrics: Vec<Metric>,
    driver: DriverKind,
    registry: Option<ChartRegistry>,
    record: Option<RunRecord>,
}

impl<P: SurfaceProvider> RunSession<P> {
    pub fn new(provider: P) -> Self {
        Self::with_metrics(provider, &Metric::ALL)
    }

    pub fn with_metrics(provider: P, metrics: &[Metric]) -> Self {
        Self {
            state: RunState::Idle,
            provider,
            metrics: metrics.to_vec(),
            driver: DriverKind::default(),
            registry: None,
            record: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn driver(&self) -> DriverKind {
        self.driver
    }

    /// Registry of the current (or most recent) run
    pub fn registry(&self) -> Option<&ChartRegistry> {
        self.registry.as_ref()
    }

    /// Record of the current (or most recent) run
    pub fn record(&self) -> Option<&RunRecord> {
        self.record.as_ref()
    }

    /// Select a driver and begin collecting options. Re-selecting while
    /// still configuring is fine; doing so mid-run is not.
    pub fn configure(&mut self, driver: DriverKind) -> Result<()> {
        if self.state == RunState::Running {
            return Err(self.rejected("configure"));
        }
        self.driver = driver;
        self.state = RunState::Configuring;
        info!(%driver, "driver selected");
        Ok(())
    }

    /// Enter `Running` and build the chart registry exactly once.
    ///
    /// A second start while already running is an invalid transition and
    /// leaves the current run untouched; accepting it would orphan the
    /// live charts and duplicate color assignments.
    pub fn start(&mut self, entity_count: usize) -> Result<()> {
        if self.state == RunState::Running {
            return Err(self.rejected("start"));
        }

        let registry = ChartRegistry::initialize(entity_count, &self.metrics, &mut self.provider)?;
        self.registry = Some(registry);
        self.record = Some(RunRecord::begin(self.driver, entity_count));
        self.state = RunState::Running;
        info!(entity_count, driver = %self.driver, "run started");
        Ok(())
    }

    /// Route one sample batch into the charts.
    ///
    /// Outside `Running` this is a logged no-op, which makes stray
    /// late-arriving ticks after teardown harmless.
    pub fn apply_batch(&mut self, samples: &[Sample]) -> Result<Option<BatchReport>> {
        if self.state != RunState::Running {
            warn!(state = %self.state, "dropping sample batch outside of a run");
            return Ok(None);
        }
        let registry = self
            .registry
            .as_mut()
            .expect("running state always has a registry");
        let report = SampleRouter::apply_batch(registry, samples)?;
        Ok(Some(report))
    }

    /// Redraw every chart from its current in-memory state. A no-op
    /// before the first run.
    pub fn render(&mut self) -> Result<()> {
        match self.registry.as_mut() {
            Some(registry) => registry.render(),
            None => Ok(()),
        }
    }

    /// Finish the run. The registry is left inert; the next start
    /// overwrites it.
    pub fn end(&mut self) -> Result<RunRecord> {
        if self.state != RunState::Running {
            return Err(self.rejected("end"));
        }
        self.state = RunState::Idle;
        let record = self
            .record
            .as_mut()
            .expect("running state always has a record");
        record.finish();
        info!(run_id = %record.run_id, "run finished");
        Ok(record.clone())
    }

    fn rejected(&self, event: &str) -> DashboardError {
        let err = DashboardError::InvalidStateTransition {
            state: self.state.to_string(),
            event: event.to_string(),
        };
        warn!("{}", err);
        err
    }
}
