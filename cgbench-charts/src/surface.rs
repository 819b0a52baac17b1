use cgbench_common::{Metric, Result};

use crate::chart::ChartSnapshot;

/// Render sink for one chart.
///
/// The dashboard binary binds charts to WebSocket broadcast surfaces;
/// tests bind them to recording doubles. Drawing must be idempotent:
/// redrawing an unchanged snapshot is a valid no-op for the viewer.
pub trait ChartSurface: Send {
    fn draw(&mut self, snapshot: &ChartSnapshot) -> Result<()>;
}

/// Source of render surfaces, consulted once per metric at registry
/// construction. Returning `None` for a metric means the dashboard is
/// missing a panel and initialization must fail fast.
pub trait SurfaceProvider {
    fn surface_for(&mut self, metric: Metric) -> Option<Box<dyn ChartSurface>>;
}
