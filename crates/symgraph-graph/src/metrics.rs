use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Windowed moving average for smoothing per-analysis latency.
#[derive(Debug)]
pub struct MovingAverage {
    window_size: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            values: VecDeque::with_capacity(window_size),
            sum: 0.0,
        }
    }

    pub fn record(&mut self, value: f64) {
        if self.values.len() >= self.window_size {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.values.push_back(value);
        self.sum += value;
    }

    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f64
        }
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Cross-cutting counters over the tracker. Gauges mirror store state after
/// each mutation; counters only ever go up.
#[derive(Debug, Default)]
pub struct TrackerMetrics {
    total_symbols: AtomicU64,
    total_dependencies: AtomicU64,
    dependency_updates: AtomicU64,
    impact_analyses: AtomicU64,
    cyclic_dependencies_detected: AtomicU64,
    real_time_updates_sent: AtomicU64,
    analysis_time_ms: Mutex<MovingAverage>,
}

impl TrackerMetrics {
    pub fn set_total_symbols(&self, n: usize) {
        self.total_symbols.store(n as u64, Ordering::Relaxed);
    }

    pub fn set_total_dependencies(&self, n: usize) {
        self.total_dependencies.store(n as u64, Ordering::Relaxed);
    }

    pub fn record_dependency_update(&self) {
        self.dependency_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle_detected(&self) {
        self.cyclic_dependencies_detected
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis(&self, elapsed: Duration) {
        self.impact_analyses.fetch_add(1, Ordering::Relaxed);
        self.analysis_time_ms
            .lock()
            .record(elapsed.as_secs_f64() * 1_000.0);
    }

    pub fn record_updates_sent(&self, n: usize) {
        self.real_time_updates_sent
            .fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn cycles_detected(&self) -> u64 {
        self.cyclic_dependencies_detected.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_symbols: self.total_symbols.load(Ordering::Relaxed),
            total_dependencies: self.total_dependencies.load(Ordering::Relaxed),
            dependency_updates: self.dependency_updates.load(Ordering::Relaxed),
            impact_analyses: self.impact_analyses.load(Ordering::Relaxed),
            cyclic_dependencies_detected: self
                .cyclic_dependencies_detected
                .load(Ordering::Relaxed),
            real_time_updates_sent: self.real_time_updates_sent.load(Ordering::Relaxed),
            average_analysis_time_ms: self.analysis_time_ms.lock().average(),
        }
    }
}

/// Read-only view handed to callers; safe to serialize straight out to the
/// metrics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_symbols: u64,
    pub total_dependencies: u64,
    pub dependency_updates: u64,
    pub impact_analyses: u64,
    pub cyclic_dependencies_detected: u64,
    pub real_time_updates_sent: u64,
    pub average_analysis_time_ms: f64,
}
