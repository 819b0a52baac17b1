use rand::Rng;
use tracing::{debug, info};

use cgbench_common::{DashboardError, Metric, Result};

use crate::chart::Chart;
use crate::surface::{ChartSurface, SurfaceProvider};

/// Owner of every metric chart for one benchmarking run.
///
/// Built exactly once per run: all charts share the same entity count,
/// the same entity-to-index assignment and the same color palette for
/// the registry's whole lifetime.
pub struct ChartRegistry {
    charts: Vec<Chart>,
    surfaces: Vec<Box<dyn ChartSurface>>,
    entity_count: usize,
    palette: Vec<(u8, u8, u8)>,
}

impl ChartRegistry {
    /// Build one chart per metric, each with `entity_count` zeroed
    /// series, bound to the surface the provider hands out for it.
    ///
    /// Fails with `MissingSurface` if any metric has no surface, so a
    /// partial dashboard is caught at construction rather than mid-run.
    pub fn initialize<P: SurfaceProvider>(
        entity_count: usize,
        metrics: &[Metric],
        provider: &mut P,
    ) -> Result<Self> {
        if entity_count == 0 {
            return Err(DashboardError::InvalidEntityCount(entity_count));
        }

        let palette = generate_palette(entity_count);

        let mut charts = Vec::with_capacity(metrics.len());
        let mut surfaces = Vec::with_capacity(metrics.len());
        for &metric in metrics {
            let surface = provider
                .surface_for(metric)
                .ok_or(DashboardError::MissingSurface { metric })?;
            charts.push(Chart::new(metric, &palette));
            surfaces.push(surface);
        }

        info!(
            entity_count,
            charts = charts.len(),
            "chart registry initialized"
        );

        Ok(Self {
            charts,
            surfaces,
            entity_count,
            palette,
        })
    }

    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.charts.iter().map(|c| c.metric())
    }

    pub fn chart(&self, metric: Metric) -> Option<&Chart> {
        self.charts.iter().find(|c| c.metric() == metric)
    }

    pub(crate) fn chart_mut(&mut self, metric: Metric) -> Option<&mut Chart> {
        self.charts.iter_mut().find(|c| c.metric() == metric)
    }

    /// Color triple assigned to the entity at `index`, identical across
    /// every chart in the registry
    pub fn color(&self, index: usize) -> Option<(u8, u8, u8)> {
        self.palette.get(index).copied()
    }

    /// Push the current in-memory state of every chart to its surface.
    ///
    /// Idempotent: calling with unchanged data redraws without altering
    /// any series.
    pub fn render(&mut self) -> Result<()> {
        for (chart, surface) in self.charts.iter().zip(self.surfaces.iter_mut()) {
            let snapshot = chart.snapshot();
            debug!(metric = %snapshot.metric, "rendering chart");
            surface.draw(&snapshot)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChartRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartRegistry")
            .field("charts", &self.charts)
            .field("surfaces", &self.surfaces.len())
            .field("entity_count", &self.entity_count)
            .field("palette", &self.palette)
            .finish()
    }
}

/// One random RGB triple per entity, generated once and reused across
/// all charts so an entity keeps its color in every panel
fn generate_palette(entity_count: usize) -> Vec<(u8, u8, u8)> {
    let mut rng = rand::thread_rng();
    (0..entity_count)
        .map(|_| (rng.gen::<u8>(), rng.gen::<u8>(), rng.gen::<u8>()))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use cgbench_common::{Metric, Result};

    use crate::chart::ChartSnapshot;
    use crate::surface::{ChartSurface, SurfaceProvider};

    /// Surface double that remembers everything drawn on it
    pub struct RecordingSurface {
        pub frames: Arc<Mutex<Vec<ChartSnapshot>>>,
    }

    impl ChartSurface for RecordingSurface {
        fn draw(&mut self, snapshot: &ChartSnapshot) -> Result<()> {
            self.frames.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    /// Provider with a configurable set of available panels
    pub struct TestProvider {
        pub available: Vec<Metric>,
        pub frames: HashMap<Metric, Arc<Mutex<Vec<ChartSnapshot>>>>,
    }

    impl TestProvider {
        pub fn with_all_panels() -> Self {
            Self::with_panels(&Metric::ALL)
        }

        pub fn with_panels(metrics: &[Metric]) -> Self {
            Self {
                available: metrics.to_vec(),
                frames: metrics
                    .iter()
                    .map(|m| (*m, Arc::new(Mutex::new(Vec::new()))))
                    .collect(),
            }
        }

        pub fn frame_count(&self, metric: Metric) -> usize {
            self.frames[&metric].lock().unwrap().len()
        }

        pub fn last_frame(&self, metric: Metric) -> Option<ChartSnapshot> {
            self.frames[&metric].lock().unwrap().last().cloned()
        }
    }

    impl SurfaceProvider for TestProvider {
        fn surface_for(&mut self, metric: Metric) -> Option<Box<dyn ChartSurface>> {
            if !self.available.contains(&metric) {
                return None;
            }
            Some(Box::new(RecordingSurface {
                frames: Arc::clone(&self.frames[&metric]),
            }))
        }
    }
}
