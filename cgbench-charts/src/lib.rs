//! Live-chart state for the cgbench dashboard
//!
//! This crate holds the part of the dashboard with real behavioral
//! contracts: fixed-size sliding windows of per-cgroup samples, the
//! registry of metric charts fed by those windows, the router that
//! distributes incoming sample batches into them, and the run-lifecycle
//! state machine that gates all of it.
//!
//! Chart state is exclusively owned by whoever drives the session; all
//! mutation goes through [`SampleRouter::apply_batch`] and rendering is
//! pushed out through the [`ChartSurface`] seam.

pub mod chart;
pub mod registry;
pub mod router;
pub mod series;
pub mod session;
pub mod surface;

pub use chart::{Chart, ChartSnapshot, SeriesData, SeriesStyle};
pub use registry::ChartRegistry;
pub use router::{BatchReport, SampleRouter};
pub use series::SlidingSeries;
pub use session::{RunSession, RunState};
pub use surface::{ChartSurface, SurfaceProvider};
