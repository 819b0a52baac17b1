//! The session event loop
//!
//! One tokio task owns the [`RunSession`] and with it all mutable chart
//! state. Runner events arrive in order over an mpsc channel (the
//! transport's per-connection FIFO provides start-before-data and
//! end-after-data); chart frames fan out over a broadcast channel to
//! however many viewer sockets are connected.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{info, warn};

use cgbench_charts::{ChartSnapshot, ChartSurface, RunSession, SurfaceProvider};
use cgbench_common::{DriverKind, Metric, Result, RunRecord, SampleBatch};

use crate::interval::{batch_from_intervals, IntervalResult};

/// Event delivered by the runner connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunnerEvent {
    /// Driver selected in the configuration form
    Configure { driver: DriverKind },
    /// A run begins; charts are built for `entity_count` cgroups
    Start { entity_count: usize },
    /// One tick's worth of pre-shaped samples
    Data { samples: SampleBatch },
    /// One tick's worth of raw trace-replay interval results
    Interval { results: Vec<IntervalResult> },
    /// The run is over
    End,
}

/// One chart redraw pushed to viewers
#[derive(Debug, Clone, Serialize)]
pub struct ChartFrame {
    pub timestamp: DateTime<Utc>,
    pub chart: ChartSnapshot,
}

/// Session view exposed on `/api/state`
#[derive(Debug, Clone, Serialize, Default)]
pub struct SessionStatus {
    pub state: String,
    pub record: Option<RunRecord>,
}

pub type SharedStatus = Arc<RwLock<SessionStatus>>;

/// Render surface that publishes snapshots to the viewer broadcast
/// channel. All metrics share one channel; the snapshot carries the
/// metric so viewers can address the right panel.
struct BroadcastSurface {
    frames: broadcast::Sender<ChartFrame>,
}

impl ChartSurface for BroadcastSurface {
    fn draw(&mut self, snapshot: &ChartSnapshot) -> Result<()> {
        let frame = ChartFrame {
            timestamp: Utc::now(),
            chart: snapshot.clone(),
        };
        // No connected viewers is not an error; frames are ephemeral
        let _ = self.frames.send(frame);
        Ok(())
    }
}

/// Hands every metric a broadcast surface. The dashboard front end
/// always renders all panels, so no metric is ever missing here.
pub struct BroadcastProvider {
    frames: broadcast::Sender<ChartFrame>,
}

impl BroadcastProvider {
    pub fn new(frames: broadcast::Sender<ChartFrame>) -> Self {
        Self { frames }
    }
}

impl SurfaceProvider for BroadcastProvider {
    fn surface_for(&mut self, _metric: Metric) -> Option<Box<dyn ChartSurface>> {
        Some(Box::new(BroadcastSurface {
            frames: self.frames.clone(),
        }))
    }
}

/// Drive the session until the event channel closes.
pub async fn run_session_loop(
    mut events: mpsc::Receiver<RunnerEvent>,
    frames: broadcast::Sender<ChartFrame>,
    status: SharedStatus,
) {
    let mut session = RunSession::new(BroadcastProvider::new(frames));

    while let Some(event) = events.recv().await {
        handle_event(&mut session, event);

        let mut view = status.write().await;
        view.state = session.state().to_string();
        view.record = session.record().cloned();
    }

    info!("runner event channel closed, session loop exiting");
}

fn handle_event(session: &mut RunSession<BroadcastProvider>, event: RunnerEvent) {
    match event {
        RunnerEvent::Configure { driver } => {
            if let Err(err) = session.configure(driver) {
                warn!("configure rejected: {}", err);
            }
        }
        RunnerEvent::Start { entity_count } => match session.start(entity_count) {
            // Initial render so viewers see the zeroed charts at once
            Ok(()) => {
                if let Err(err) = session.render() {
                    warn!("initial render failed: {}", err);
                }
            }
            Err(err) => warn!("start rejected: {}", err),
        },
        RunnerEvent::Data { samples } => {
            if let Err(err) = session.apply_batch(&samples) {
                warn!("batch failed: {}", err);
            }
        }
        RunnerEvent::Interval { results } => {
            let (batch, finished) = batch_from_intervals(&results);
            if !batch.is_empty() {
                if let Err(err) = session.apply_batch(&batch) {
                    warn!("batch failed: {}", err);
                }
            }
            if finished {
                if let Err(err) = session.end() {
                    warn!("end rejected: {}", err);
                }
            }
        }
        RunnerEvent::End => {
            if let Err(err) = session.end() {
                warn!("end rejected: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgbench_common::{EntityId, Sample};

    fn batch(values: &[f64]) -> SampleBatch {
        values
            .iter()
            .enumerate()
            .map(|(idx, v)| {
                Sample::new(EntityId::Name(format!("cgroup-{}", idx + 1)))
                    .with_metric(Metric::Latency, *v)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_loop_emits_one_frame_set_per_batch_and_ignores_stray_data() {
        let (events_tx, events_rx) = mpsc::channel(16);
        let (frames_tx, mut frames_rx) = broadcast::channel(64);
        let status: SharedStatus = Arc::default();

        let task = tokio::spawn(run_session_loop(
            events_rx,
            frames_tx,
            Arc::clone(&status),
        ));

        events_tx
            .send(RunnerEvent::Start { entity_count: 2 })
            .await
            .unwrap();
        events_tx
            .send(RunnerEvent::Data {
                samples: batch(&[5.0, 7.0]),
            })
            .await
            .unwrap();
        events_tx.send(RunnerEvent::End).await.unwrap();
        events_tx
            .send(RunnerEvent::Data {
                samples: batch(&[9.0, 9.0]),
            })
            .await
            .unwrap();
        drop(events_tx);
        task.await.unwrap();

        // start renders once, the one live batch renders once; the
        // stray post-end batch renders nothing
        let mut frames = Vec::new();
        while let Ok(frame) = frames_rx.try_recv() {
            frames.push(frame);
        }
        assert_eq!(frames.len(), 2 * Metric::ALL.len());

        let last_latency = frames
            .iter()
            .rev()
            .find(|f| f.chart.metric == Metric::Latency)
            .unwrap();
        assert_eq!(*last_latency.chart.datasets[0].data.last().unwrap(), 5.0);
        assert_eq!(*last_latency.chart.datasets[1].data.last().unwrap(), 7.0);

        let view = status.read().await;
        assert_eq!(view.state, "idle");
        assert!(view.record.as_ref().unwrap().finished_at.is_some());
    }

    #[tokio::test]
    async fn test_interval_fin_ends_the_run() {
        let (events_tx, events_rx) = mpsc::channel(16);
        let (frames_tx, _frames_rx) = broadcast::channel(64);
        let status: SharedStatus = Arc::default();

        let task = tokio::spawn(run_session_loop(
            events_rx,
            frames_tx,
            Arc::clone(&status),
        ));

        let live: IntervalResult = serde_json::from_str(
            r#"{"data": {"type": 0, "lat": 1.0, "cur_bw": 2.0, "avg_bw": 3.0},
                "meta": {"cgroup_id": 1}}"#,
        )
        .unwrap();
        let fin: IntervalResult =
            serde_json::from_str(r#"{"data": {"type": 3}, "meta": {"cgroup_id": 1}}"#).unwrap();

        events_tx
            .send(RunnerEvent::Start { entity_count: 1 })
            .await
            .unwrap();
        events_tx
            .send(RunnerEvent::Interval {
                results: vec![live],
            })
            .await
            .unwrap();
        events_tx
            .send(RunnerEvent::Interval { results: vec![fin] })
            .await
            .unwrap();
        drop(events_tx);
        task.await.unwrap();

        let view = status.read().await;
        assert_eq!(view.state, "idle");
    }

    #[test]
    fn test_runner_event_wire_format() {
        let event: RunnerEvent =
            serde_json::from_str(r#"{"type": "start", "entity_count": 3}"#).unwrap();
        assert!(matches!(event, RunnerEvent::Start { entity_count: 3 }));

        let event: RunnerEvent = serde_json::from_str(
            r#"{"type": "data",
                "samples": [{"id": "cgroup-1", "metrics": {"lat": 5.0}}]}"#,
        )
        .unwrap();
        match event {
            RunnerEvent::Data { samples } => assert_eq!(samples.len(), 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
