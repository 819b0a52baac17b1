//! Translation of trace-replay interval results into sample batches
//!
//! The runner prints one JSON object per cgroup per tick:
//! `{"data": {"type": 0, "lat": ..., "cur_bw": ..., "avg_bw": ...},
//!   "meta": {"cgroup_id": 3}}`.
//! A `type` of 3 marks the end of the stream for that cgroup.

use serde::{Deserialize, Serialize};

use cgbench_common::{EntityId, Metric, Sample, SampleBatch};

/// Message type the runner uses to signal end-of-stream
pub const FIN: u32 = 3;

/// One cgroup's interval result as emitted by the runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalResult {
    pub data: IntervalData,
    pub meta: IntervalMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalData {
    #[serde(rename = "type")]
    pub kind: u32,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub cur_bw: Option<f64>,
    #[serde(default)]
    pub avg_bw: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalMeta {
    pub cgroup_id: u64,
}

impl IntervalResult {
    pub fn is_fin(&self) -> bool {
        self.data.kind == FIN
    }

    /// Convert into a routed sample; `None` for FIN markers
    pub fn to_sample(&self) -> Option<Sample> {
        if self.is_fin() {
            return None;
        }
        let mut sample = Sample::new(EntityId::Index(self.meta.cgroup_id));
        if let Some(lat) = self.data.lat {
            sample = sample.with_metric(Metric::Latency, lat);
        }
        if let Some(cur_bw) = self.data.cur_bw {
            sample = sample.with_metric(Metric::CurrentBandwidth, cur_bw);
        }
        if let Some(avg_bw) = self.data.avg_bw {
            sample = sample.with_metric(Metric::AverageBandwidth, avg_bw);
        }
        Some(sample)
    }
}

/// Build one tick's sample batch from a group of interval results.
/// Returns the batch plus whether any entry was a FIN marker.
pub fn batch_from_intervals(results: &[IntervalResult]) -> (SampleBatch, bool) {
    let mut batch = Vec::with_capacity(results.len());
    let mut finished = false;
    for result in results {
        match result.to_sample() {
            Some(sample) => batch.push(sample),
            None => finished = true,
        }
    }
    (batch, finished)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval_json(kind: u32, cgroup_id: u64) -> String {
        format!(
            r#"{{"data": {{"type": {}, "lat": 5.5, "cur_bw": 100.0, "avg_bw": 90.0}},
                "meta": {{"cgroup_id": {}}}}}"#,
            kind, cgroup_id
        )
    }

    #[test]
    fn test_interval_maps_metric_keys() {
        let result: IntervalResult = serde_json::from_str(&interval_json(0, 2)).unwrap();
        let sample = result.to_sample().unwrap();

        assert_eq!(sample.id, EntityId::Index(2));
        assert_eq!(sample.metrics["lat"], 5.5);
        assert_eq!(sample.metrics["cur_bw"], 100.0);
        assert_eq!(sample.metrics["avg_bw"], 90.0);
    }

    #[test]
    fn test_fin_is_recognized_and_produces_no_sample() {
        let json = r#"{"data": {"type": 3}, "meta": {"cgroup_id": 1}}"#;
        let result: IntervalResult = serde_json::from_str(json).unwrap();
        assert!(result.is_fin());
        assert!(result.to_sample().is_none());
    }

    #[test]
    fn test_batch_from_intervals_flags_fin() {
        let live: IntervalResult = serde_json::from_str(&interval_json(0, 1)).unwrap();
        let fin: IntervalResult =
            serde_json::from_str(r#"{"data": {"type": 3}, "meta": {"cgroup_id": 2}}"#).unwrap();

        let (batch, finished) = batch_from_intervals(&[live.clone(), fin]);
        assert_eq!(batch.len(), 1);
        assert!(finished);

        let (batch, finished) = batch_from_intervals(&[live.clone(), live]);
        assert_eq!(batch.len(), 2);
        assert!(!finished);
    }
}
