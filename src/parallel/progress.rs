//! Throughput and ETA reporting for long sweeps.
//!
//! Workers never touch a tracker directly: they push [ProgressEvent]s through a
//! bounded channel and a single reporter thread owns the trackers.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use super::runner::ProgressCallback;

pub const DEFAULT_UPDATE_FREQUENCY: usize = 10;
pub const DEFAULT_ETA_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressStats {
    pub processed: usize,
    pub total: usize,
    pub percentage: f64,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    #[serde(with = "option_duration_secs")]
    pub eta: Option<Duration>,
    /// Items per second over the whole run.
    pub rate: f64,
}

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    label: String,
    total: usize,
    processed: usize,
    update_frequency: usize,
    window_size: usize,
    recent_item_durations: VecDeque<Duration>,
    started: Instant,
    last_update: Instant,
    last_reported: Option<usize>,
}

impl ProgressTracker {
    pub fn new(label: impl Into<String>, total: usize) -> Self {
        Self::started_at(label, total, Instant::now())
    }

    fn started_at(label: impl Into<String>, total: usize, now: Instant) -> Self {
        Self {
            label: label.into(),
            total,
            processed: 0,
            update_frequency: DEFAULT_UPDATE_FREQUENCY,
            window_size: DEFAULT_ETA_WINDOW,
            recent_item_durations: VecDeque::with_capacity(DEFAULT_ETA_WINDOW),
            started: now,
            last_update: now,
            last_reported: None,
        }
    }

    pub fn with_update_frequency(mut self, every: usize) -> Self {
        self.update_frequency = every.max(1);
        self
    }

    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size.max(1);
        self
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Record `increment` more items. Returns true when a report should be emitted.
    pub fn update(&mut self, increment: usize) -> bool {
        self.update_at(increment, Instant::now())
    }

    fn update_at(&mut self, increment: usize, now: Instant) -> bool {
        if increment > 0 {
            let per_item = now.saturating_duration_since(self.last_update) / increment as u32;
            if self.recent_item_durations.len() == self.window_size {
                self.recent_item_durations.pop_front();
            }
            self.recent_item_durations.push_back(per_item);
            self.last_update = now;
            self.processed = (self.processed + increment).min(self.total);
        }

        let crossed_step = self.processed / self.update_frequency
            > self.last_reported.unwrap_or(0) / self.update_frequency;
        let reached_total = self.processed >= self.total;
        let fire = Some(self.processed) != self.last_reported && (crossed_step || reached_total);
        if fire {
            self.last_reported = Some(self.processed);
        }
        fire
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f64 / self.total as f64 * 100.0
        }
    }

    /// Remaining time from the recent window, or the lifetime rate when the window is empty.
    pub fn eta(&self) -> Option<Duration> {
        self.eta_at(Instant::now())
    }

    fn eta_at(&self, now: Instant) -> Option<Duration> {
        let remaining = self.total.saturating_sub(self.processed) as u32;
        if remaining == 0 {
            return Some(Duration::ZERO);
        }
        if !self.recent_item_durations.is_empty() {
            let sum: Duration = self.recent_item_durations.iter().sum();
            let average = sum / self.recent_item_durations.len() as u32;
            return Some(average * remaining);
        }
        if self.processed == 0 {
            return None;
        }
        let average = now.saturating_duration_since(self.started) / self.processed as u32;
        Some(average * remaining)
    }

    pub fn stats(&self) -> ProgressStats {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.started);
        let rate = if elapsed.is_zero() {
            0.0
        } else {
            self.processed as f64 / elapsed.as_secs_f64()
        };
        ProgressStats {
            processed: self.processed,
            total: self.total,
            percentage: self.percentage(),
            elapsed,
            eta: self.eta_at(now),
            rate,
        }
    }

    pub fn log_report(&self) {
        let stats = self.stats();
        info!(
            target: "draftsim::progress",
            "{}: {}/{} ({:.1}%) elapsed {} eta {}",
            self.label,
            stats.processed,
            stats.total,
            stats.percentage,
            format_duration(stats.elapsed),
            stats.eta.map(format_duration).unwrap_or_else(|| "unknown".to_string()),
        );
    }

    /// Force the final 100% report.
    pub fn complete(&mut self) -> ProgressStats {
        self.processed = self.total;
        self.last_reported = Some(self.total);
        self.recent_item_durations.clear();
        self.log_report();
        self.stats()
    }
}

/// Outer progress over configurations, inner progress over one configuration's runs.
#[derive(Debug, Clone)]
pub struct MultiLevelProgressTracker {
    outer: ProgressTracker,
    inner: ProgressTracker,
    inner_total: usize,
}

impl MultiLevelProgressTracker {
    pub fn new(outer_total: usize, inner_total: usize) -> Self {
        Self {
            outer: ProgressTracker::new("configurations", outer_total).with_update_frequency(1),
            inner: Self::fresh_inner(inner_total),
            inner_total,
        }
    }

    fn fresh_inner(inner_total: usize) -> ProgressTracker {
        let every = (inner_total / 4).max(1);
        ProgressTracker::new("runs", inner_total).with_update_frequency(every)
    }

    pub fn outer(&self) -> &ProgressTracker {
        &self.outer
    }

    pub fn inner(&self) -> &ProgressTracker {
        &self.inner
    }

    /// Move the inner tracker to an absolute completed count.
    pub fn update_inner(&mut self, completed: usize) -> bool {
        let increment = completed.saturating_sub(self.inner.processed());
        self.inner.update(increment)
    }

    /// Finish the current configuration and reset the inner tracker.
    pub fn next_outer(&mut self) -> bool {
        self.inner = Self::fresh_inner(self.inner_total);
        self.outer.update(1)
    }

    /// Fraction of all runs done, counting the partial configuration.
    pub fn overall_fraction(&self) -> f64 {
        if self.outer.total() == 0 {
            return 1.0;
        }
        let inner_fraction = if self.inner_total == 0 {
            0.0
        } else {
            self.inner.processed() as f64 / self.inner_total as f64
        };
        ((self.outer.processed() as f64 + inner_fraction) / self.outer.total() as f64).min(1.0)
    }

    pub fn overall_percentage(&self) -> f64 {
        self.overall_fraction() * 100.0
    }

    pub fn overall_eta(&self) -> Option<Duration> {
        let fraction = self.overall_fraction();
        if fraction <= 0.0 {
            return None;
        }
        let elapsed = self.outer.stats().elapsed.as_secs_f64();
        Some(Duration::from_secs_f64(elapsed / fraction * (1.0 - fraction)))
    }

    pub fn log_report(&self) {
        info!(
            target: "draftsim::progress",
            "config {}/{} runs {}/{} overall {:.1}% eta {}",
            self.outer.processed(),
            self.outer.total(),
            self.inner.processed(),
            self.inner_total,
            self.overall_percentage(),
            self.overall_eta().map(format_duration).unwrap_or_else(|| "unknown".to_string()),
        );
    }

    pub fn complete(&mut self) -> ProgressStats {
        self.outer.complete()
    }
}

/// Messages from the sweep to the reporter thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    RunCompleted { completed: usize, total: usize },
    ConfigCompleted,
}

/// Runner callback that forwards counts without ever blocking a worker.
/// Counts are cumulative, so a dropped message is superseded by the next one.
pub fn channel_callback(sender: SyncSender<ProgressEvent>) -> ProgressCallback {
    Arc::new(move |completed, total| {
        if let Err(TrySendError::Disconnected(_)) =
            sender.try_send(ProgressEvent::RunCompleted { completed, total })
        {
            tracing::debug!(target: "draftsim::progress", "progress reporter has stopped");
        }
    })
}

/// Reporter loop: owns the tracker until every sender is dropped.
pub fn drain_progress(
    events: Receiver<ProgressEvent>,
    mut tracker: MultiLevelProgressTracker,
) -> ProgressStats {
    for event in events {
        let fire = match event {
            ProgressEvent::RunCompleted { completed, .. } => tracker.update_inner(completed),
            ProgressEvent::ConfigCompleted => tracker.next_outer(),
        };
        if fire {
            tracker.log_report();
        }
    }
    tracker.complete()
}

/// "45s", "5m 32s", "1h 15m".
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}

mod option_duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }
}
