// Time Window Container - Rolling time-based data window
// Generic container with age-based pruning and capacity management

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// CVD lookback windows reported per venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CvdWindow {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "24h")]
    TwentyFourHours,
}

impl CvdWindow {
    pub const ALL: [CvdWindow; 4] = [
        CvdWindow::FiveMinutes,
        CvdWindow::OneHour,
        CvdWindow::TwelveHours,
        CvdWindow::TwentyFourHours,
    ];

    /// Longest window; ledgers never need to retain anything older
    pub const MAX: CvdWindow = CvdWindow::TwentyFourHours;

    pub fn seconds(&self) -> f64 {
        match self {
            CvdWindow::FiveMinutes => 300.0,
            CvdWindow::OneHour => 3_600.0,
            CvdWindow::TwelveHours => 43_200.0,
            CvdWindow::TwentyFourHours => 86_400.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CvdWindow::FiveMinutes => "5m",
            CvdWindow::OneHour => "1h",
            CvdWindow::TwelveHours => "12h",
            CvdWindow::TwentyFourHours => "24h",
        }
    }

    /// Position in `ALL`
    pub fn index(&self) -> usize {
        match self {
            CvdWindow::FiveMinutes => 0,
            CvdWindow::OneHour => 1,
            CvdWindow::TwelveHours => 2,
            CvdWindow::TwentyFourHours => 3,
        }
    }
}

impl fmt::Display for CvdWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rolling window of (timestamp_secs, data) pairs kept in insertion order.
///
/// Insertion order is not required to be timestamp order, so `prune` sweeps the
/// whole window rather than stopping at the first fresh entry.
pub struct TimeWindow<T> {
    duration_secs: f64,         // How far back entries are kept
    max_capacity: usize,        // Maximum items to prevent unbounded growth
    data: VecDeque<(f64, T)>,
}

impl<T> TimeWindow<T> {
    /// Create a new time window
    /// duration_secs: how long to keep data
    /// max_capacity: maximum number of items (oldest insertions are evicted first)
    pub fn new(duration_secs: f64, max_capacity: usize) -> Self {
        Self {
            duration_secs,
            max_capacity,
            data: VecDeque::with_capacity(max_capacity.min(10_000)),
        }
    }

    /// A window bounded only by item count
    pub fn bounded(max_capacity: usize) -> Self {
        Self::new(f64::INFINITY, max_capacity)
    }

    /// Add an item with its timestamp, returning the item evicted for capacity
    pub fn add(&mut self, timestamp: f64, item: T) -> Option<(f64, T)> {
        let evicted = if self.data.len() >= self.max_capacity {
            self.data.pop_front()
        } else {
            None
        };

        self.data.push_back((timestamp, item));
        evicted
    }

    /// Remove items older than `duration_secs` before `current_time`
    pub fn prune(&mut self, current_time: f64) -> usize {
        self.prune_with(current_time, |_| {})
    }

    /// Like `prune`, handing every removed item to `on_evict`
    pub fn prune_with(&mut self, current_time: f64, mut on_evict: impl FnMut(T)) -> usize {
        let cutoff = current_time - self.duration_secs;

        // Fast path: expired items are usually at the front
        let mut removed = 0;
        while self.data.front().is_some_and(|(ts, _)| *ts < cutoff) {
            if let Some((_, item)) = self.data.pop_front() {
                on_evict(item);
                removed += 1;
            }
        }

        if self.data.iter().any(|(ts, _)| *ts < cutoff) {
            let mut kept = VecDeque::with_capacity(self.data.len());
            for (ts, item) in self.data.drain(..) {
                if ts < cutoff {
                    on_evict(item);
                    removed += 1;
                } else {
                    kept.push_back((ts, item));
                }
            }
            self.data = kept;
        }

        removed
    }

    /// Evict the oldest insertions until at most `len` items remain
    pub fn shrink_to(&mut self, len: usize, mut on_evict: impl FnMut(T)) {
        while self.data.len() > len {
            if let Some((_, item)) = self.data.pop_front() {
                on_evict(item);
            }
        }
    }

    /// Iterate over all items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &(f64, T)> {
        self.data.iter()
    }

    /// Items with `timestamp >= cutoff` (inclusive)
    pub fn iter_since(&self, cutoff: f64) -> impl Iterator<Item = &(f64, T)> {
        self.data.iter().filter(move |(ts, _)| *ts >= cutoff)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get the most recent insertion
    pub fn last(&self) -> Option<&(f64, T)> {
        self.data.back()
    }

    /// Get the oldest insertion
    pub fn first(&self) -> Option<&(f64, T)> {
        self.data.front()
    }
}

impl<T: Copy> TimeWindow<T> {
    /// Copy the values out, oldest first
    pub fn values(&self) -> Vec<T> {
        self.data.iter().map(|(_, v)| *v).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut window: TimeWindow<i32> = TimeWindow::new(1000.0, 100);

        window.add(100.0, 1);
        window.add(200.0, 2);
        window.add(300.0, 3);

        assert_eq!(window.len(), 3);
        assert!(!window.is_empty());

        let last = window.last().unwrap();
        assert_eq!(last.0, 300.0);
        assert_eq!(last.1, 3);
    }

    #[test]
    fn test_pruning() {
        let mut window: TimeWindow<i32> = TimeWindow::new(100.0, 100);

        window.add(0.0, 1);
        window.add(50.0, 2);
        window.add(100.0, 3);
        window.add(150.0, 4);
        window.add(200.0, 5);

        // Cutoff is 100; the entry exactly at the cutoff survives
        assert_eq!(window.prune(200.0), 2);
        assert_eq!(window.values(), vec![3, 4, 5]);
    }

    #[test]
    fn test_pruning_out_of_order() {
        let mut window: TimeWindow<i32> = TimeWindow::new(100.0, 100);

        window.add(150.0, 1);
        window.add(20.0, 2);
        window.add(180.0, 3);
        window.add(10.0, 4);

        let mut evicted = Vec::new();
        window.prune_with(200.0, |v| evicted.push(v));
        assert_eq!(evicted, vec![2, 4]);
        assert_eq!(window.values(), vec![1, 3]);
        assert!(window.iter().all(|(ts, _)| *ts >= 100.0));
    }

    #[test]
    fn test_capacity() {
        let mut window: TimeWindow<i32> = TimeWindow::new(10_000.0, 3);

        window.add(100.0, 1);
        window.add(200.0, 2);
        window.add(300.0, 3);
        assert_eq!(window.add(400.0, 4), Some((100.0, 1)));

        assert_eq!(window.len(), 3);
        assert_eq!(window.first().unwrap().0, 200.0);
    }

    #[test]
    fn test_shrink_to() {
        let mut window: TimeWindow<i32> = TimeWindow::bounded(10);
        for i in 0..6 {
            window.add(i as f64, i);
        }

        let mut evicted = Vec::new();
        window.shrink_to(2, |v| evicted.push(v));
        assert_eq!(evicted, vec![0, 1, 2, 3]);
        assert_eq!(window.values(), vec![4, 5]);
    }

    #[test]
    fn test_iter_since_is_inclusive() {
        let mut window: TimeWindow<f64> = TimeWindow::bounded(100);
        window.add(10.0, 1.0);
        window.add(20.0, 2.0);
        window.add(30.0, 4.0);

        let sum: f64 = window.iter_since(20.0).map(|(_, v)| v).sum();
        assert_eq!(sum, 6.0);
    }

    #[test]
    fn test_bounded_never_expires() {
        let mut window: TimeWindow<i32> = TimeWindow::bounded(5);
        window.add(0.0, 1);
        assert_eq!(window.prune(1e12), 0);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut window: TimeWindow<i32> = TimeWindow::new(10_000.0, 100);

        window.add(100.0, 1);
        window.add(200.0, 2);

        window.clear();
        assert!(window.is_empty());
    }

    #[test]
    fn test_cvd_windows() {
        let secs: Vec<f64> = CvdWindow::ALL.iter().map(|w| w.seconds()).collect();
        assert_eq!(secs, vec![300.0, 3_600.0, 43_200.0, 86_400.0]);
        assert_eq!(CvdWindow::MAX.seconds(), 86_400.0);
        assert_eq!(CvdWindow::TwelveHours.to_string(), "12h");
        assert!(CvdWindow::ALL.iter().enumerate().all(|(i, w)| w.index() == i));
    }
}
