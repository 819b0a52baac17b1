use tracing::warn;

use cgbench_common::{DashboardError, EntityId, Result, Sample};

use crate::registry::ChartRegistry;

/// Outcome of one batch application. Recoverable per-entry failures are
/// collected here instead of aborting the batch; the caller decides how
/// to surface them.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Number of sample entries whose values were applied
    pub applied: usize,
    /// Recoverable errors raised while applying the batch
    pub errors: Vec<DashboardError>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Routes incoming sample batches into the chart registry.
///
/// The entity id embedded in each sample, not its position in the
/// batch, selects the series: delivery order across ticks is not
/// guaranteed to match entity order.
pub struct SampleRouter;

impl SampleRouter {
    /// Apply one tick's batch to the registry, then render exactly once.
    ///
    /// A malformed entry (unparsable id, zero id, index out of range)
    /// is skipped and reported without touching the rest of the batch.
    /// A batch whose size differs from the registry's entity count is
    /// reported too, but its valid entries are still applied.
    pub fn apply_batch(registry: &mut ChartRegistry, samples: &[Sample]) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        if samples.len() != registry.entity_count() {
            let err = DashboardError::BatchSizeMismatch {
                expected: registry.entity_count(),
                actual: samples.len(),
            };
            warn!("{}", err);
            report.errors.push(err);
        }

        let metrics: Vec<_> = registry.metrics().collect();
        for sample in samples {
            let index = match resolve_series_index(&sample.id, registry.entity_count()) {
                Ok(index) => index,
                Err(err) => {
                    warn!("{}", err);
                    report.errors.push(err);
                    continue;
                }
            };

            for &metric in &metrics {
                if let Some(value) = sample.metrics.get(metric.key()) {
                    if let Some(chart) = registry.chart_mut(metric) {
                        chart.push(index, *value);
                    }
                }
            }
            report.applied += 1;
        }

        // One redraw per batch, not per value
        registry.render()?;

        Ok(report)
    }
}

/// Canonical entity-id resolution: the trailing unsigned integer in the
/// id is 1-based; minus one gives the series index. `"cgroup-3"` and
/// `3` both land in series index 2.
pub fn resolve_series_index(id: &EntityId, entity_count: usize) -> Result<usize> {
    let number = match id {
        EntityId::Index(n) => *n,
        EntityId::Name(name) => trailing_integer(name).ok_or_else(|| {
            DashboardError::MalformedSample {
                id: name.clone(),
                reason: "no trailing integer".to_string(),
            }
        })?,
    };

    if number == 0 {
        return Err(DashboardError::MalformedSample {
            id: id.to_string(),
            reason: "entity ids are 1-based".to_string(),
        });
    }

    let index = usize::try_from(number - 1).map_err(|_| DashboardError::MalformedSample {
        id: id.to_string(),
        reason: format!("id {} does not fit a series index", number),
    })?;
    if index >= entity_count {
        return Err(DashboardError::MalformedSample {
            id: id.to_string(),
            reason: format!("index {} out of range for {} entities", index, entity_count),
        });
    }

    Ok(index)
}

fn trailing_integer(name: &str) -> Option<u64> {
    let digits: String = name
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
