use serde::{Deserialize, Serialize};

use cgbench_common::{Metric, WINDOW_SIZE};

use crate::series::SlidingSeries;

/// Static visual attributes of one series, generated once at chart
/// creation and never changed afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStyle {
    /// Fill color, `rgba(r, g, b, 0.2)`
    pub background_color: String,
    /// Stroke color, `rgba(r, g, b, 1)`
    pub border_color: String,
    pub border_width: u32,
}

impl SeriesStyle {
    /// Build the fill/stroke pair for one RGB triple
    pub fn from_rgb(rgb: (u8, u8, u8)) -> Self {
        let (r, g, b) = rgb;
        Self {
            background_color: format!("rgba({}, {}, {}, 0.2)", r, g, b),
            border_color: format!("rgba({}, {}, {}, 1)", r, g, b),
            border_width: 1,
        }
    }
}

/// One metric's full set of sliding-window series plus static visual
/// config. Series index is the entity's stable position, assigned at
/// registry construction.
#[derive(Debug, Clone)]
pub struct Chart {
    metric: Metric,
    series: Vec<SlidingSeries>,
    labels: Vec<String>,
    styles: Vec<SeriesStyle>,
}

impl Chart {
    pub fn new(metric: Metric, palette: &[(u8, u8, u8)]) -> Self {
        Self {
            metric,
            series: palette.iter().map(|_| SlidingSeries::new()).collect(),
            labels: vec![String::new(); WINDOW_SIZE],
            styles: palette.iter().map(|rgb| SeriesStyle::from_rgb(*rgb)).collect(),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn series(&self, index: usize) -> Option<&SlidingSeries> {
        self.series.get(index)
    }

    pub fn style(&self, index: usize) -> Option<&SeriesStyle> {
        self.styles.get(index)
    }

    /// Push one value into the series at `index`
    pub fn push(&mut self, index: usize, value: f64) -> bool {
        match self.series.get_mut(index) {
            Some(series) => {
                series.push(value);
                true
            }
            None => false,
        }
    }

    /// Immutable snapshot in the shape the front-end chart library
    /// consumes: positional labels plus one dataset per entity
    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            metric: self.metric,
            title: self.metric.label().to_string(),
            labels: self.labels.clone(),
            datasets: self
                .series
                .iter()
                .zip(self.styles.iter())
                .enumerate()
                .map(|(idx, (series, style))| SeriesData {
                    label: format!("Cgroup-{}", idx + 1),
                    data: series.to_vec(),
                    style: style.clone(),
                })
                .collect(),
        }
    }
}

/// Renderable view of one chart at one instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub metric: Metric,
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<SeriesData>,
}

/// One entity's dataset inside a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesData {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(flatten)]
    pub style: SeriesStyle,
}
