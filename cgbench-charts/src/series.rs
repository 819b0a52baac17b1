use std::collections::VecDeque;

use cgbench_common::WINDOW_SIZE;

/// Sliding window over the most recent [`WINDOW_SIZE`] ticks of one
/// metric for one entity.
///
/// The window starts full of zeros and stays at exactly `WINDOW_SIZE`
/// values: every push appends at the tail and evicts the head.
#[derive(Debug, Clone)]
pub struct SlidingSeries {
    values: VecDeque<f64>,
}

impl SlidingSeries {
    pub fn new() -> Self {
        let mut values = VecDeque::with_capacity(WINDOW_SIZE);
        values.resize(WINDOW_SIZE, 0.0);
        Self { values }
    }

    /// Append a value at the tail and evict the oldest at the head
    pub fn push(&mut self, value: f64) {
        self.values.pop_front();
        self.values.push_back(value);
        debug_assert_eq!(self.values.len(), WINDOW_SIZE);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recently pushed value
    pub fn latest(&self) -> f64 {
        *self.values.back().expect("window is never empty")
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Snapshot of the window, oldest first
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

impl Default for SlidingSeries {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_series_is_full_of_zeros() {
        let series = SlidingSeries::new();
        assert_eq!(series.len(), WINDOW_SIZE);
        assert!(series.iter().all(|v| v == 0.0));
    }

    #[test]
    fn test_push_keeps_length_invariant() {
        let mut series = SlidingSeries::new();
        for i in 0..200 {
            series.push(i as f64);
            assert_eq!(series.len(), WINDOW_SIZE);
        }
    }

    #[test]
    fn test_window_holds_last_sixty_values_in_order() {
        let mut series = SlidingSeries::new();
        let total = 150usize;
        for i in 0..total {
            series.push(i as f64);
        }
        let expected: Vec<f64> = ((total - WINDOW_SIZE)..total).map(|i| i as f64).collect();
        assert_eq!(series.to_vec(), expected);
        assert_eq!(series.latest(), (total - 1) as f64);
    }

    #[test]
    fn test_partial_fill_keeps_leading_zeros() {
        let mut series = SlidingSeries::new();
        series.push(5.0);
        series.push(7.0);
        let values = series.to_vec();
        assert_eq!(values.len(), WINDOW_SIZE);
        assert!(values[..WINDOW_SIZE - 2].iter().all(|v| *v == 0.0));
        assert_eq!(&values[WINDOW_SIZE - 2..], &[5.0, 7.0]);
    }
}
