//! Autogrowth detector.
//!
//! A file grows in discrete increments. Growth since the last increment is
//! kept in a per-file carry; every time the carry covers the next increment
//! one event is emitted. Whatever is left over stays in the carry for the
//! next period, so the sum of emitted increments always equals the size
//! delta plus the old carry minus the new carry.
//!
//! An anomaly override replaces the base increment with small preferred
//! increments. Only increments no larger than `base / frequency_multiplier`
//! are eligible, so the same growth yields at least `frequency_multiplier`
//! times as many events. Configuration loading rejects overrides where no
//! preferred increment fits under that cap.

use chrono::TimeDelta;
use growth_core::{
    AnomalyOverride, AutogrowthEvent, AutogrowthRule, FileType, RandomSource, SimulationPeriod,
};

/// Slack for floating point comparisons of megabyte amounts.
const EPSILON_MB: f64 = 1e-9;

/// Events detected for one file in one period.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Events ordered by increasing size and timestamp
    pub events: Vec<AutogrowthEvent>,
    /// Growth not covered by any event, carried into the next period
    pub carry_mb: f64,
}

impl Detection {
    pub fn total_increment_mb(&self) -> f64 {
        self.events.iter().map(|e| e.increment_mb).sum()
    }
}

/// Detect the autogrowth events caused by a file growing from `old_size_mb`
/// to `new_size_mb` during `period`.
///
/// A shrinking file emits nothing and keeps its carry.
pub fn detect_events<R: RandomSource>(
    old_size_mb: f64,
    new_size_mb: f64,
    carry_mb: f64,
    rule: &AutogrowthRule,
    anomaly: Option<&AnomalyOverride>,
    period: &SimulationPeriod,
    rng: &mut R,
) -> Detection {
    if new_size_mb <= old_size_mb {
        return Detection {
            events: Vec::new(),
            carry_mb,
        };
    }
    let mut pending_mb = carry_mb.max(0.0) + (new_size_mb - old_size_mb);
    // allocated size right after the last emitted increment
    let mut allocated_mb = new_size_mb - pending_mb;

    let anomaly = anomaly.filter(|a| a.applies_to(rule.file_type));
    let mut increments = Vec::new();

    loop {
        let base_mb = rule.increment_for(allocated_mb);
        let increment_mb = match anomaly {
            Some(anomaly) => match anomaly_increment(anomaly, base_mb, pending_mb, rng) {
                Some(mb) => mb,
                None => break,
            },
            None => base_mb,
        };
        if increment_mb <= 0.0 || pending_mb + EPSILON_MB < increment_mb {
            break;
        }
        increments.push((allocated_mb, increment_mb));
        allocated_mb += increment_mb;
        pending_mb -= increment_mb;
    }

    let timestamps = event_timestamps(increments.len(), period, rng);
    let events = increments
        .into_iter()
        .zip(timestamps)
        .map(|((previous_mb, increment_mb), timestamp)| {
            let cost = EventCost::draw(increment_mb, rule.file_type, rng);
            AutogrowthEvent {
                timestamp,
                file_type: rule.file_type,
                previous_mb,
                increment_mb,
                new_mb: previous_mb + increment_mb,
                duration_ms: cost.duration_ms,
                blocking: cost.blocking,
                io_wait_ms: cost.io_wait_ms,
                blocked_processes: cost.blocked_processes,
            }
        })
        .collect();

    Detection {
        events,
        carry_mb: pending_mb.max(0.0),
    }
}

/// Draw the next anomaly increment, or `None` when not even the smallest
/// eligible increment fits in the pending growth.
fn anomaly_increment<R: RandomSource>(
    anomaly: &AnomalyOverride,
    base_mb: f64,
    pending_mb: f64,
    rng: &mut R,
) -> Option<f64> {
    let mut candidates: Vec<f64> = anomaly.preferred_increments_mb.clone();
    candidates.sort_by(f64::total_cmp);

    let cap_mb = base_mb / anomaly.frequency_multiplier.max(1.0);
    let eligible: Vec<f64> = candidates
        .iter()
        .copied()
        .filter(|mb| *mb <= cap_mb)
        .collect();
    // only reachable for percent rules on a file smaller than any it started at
    let eligible = if eligible.is_empty() {
        vec![*candidates.first()?]
    } else {
        eligible
    };

    let smallest = eligible[0];
    if pending_mb + EPSILON_MB < smallest {
        return None;
    }
    let drawn = if rng.chance(anomaly.small_increment_bias) {
        smallest
    } else {
        rng.pick(&eligible).copied().unwrap_or(smallest)
    };
    if pending_mb + EPSILON_MB < drawn {
        Some(smallest)
    } else {
        Some(drawn)
    }
}

/// Sorted event timestamps spread across the period, at millisecond
/// resolution.
fn event_timestamps<R: RandomSource>(
    count: usize,
    period: &SimulationPeriod,
    rng: &mut R,
) -> Vec<chrono::NaiveDateTime> {
    let period_ms = (period.duration_seconds().max(0) * 1000) as f64;
    let mut offsets: Vec<i64> = (0..count)
        .map(|_| rng.uniform(0.0, period_ms) as i64)
        .collect();
    offsets.sort_unstable();
    offsets
        .into_iter()
        .map(|ms| period.start + TimeDelta::milliseconds(ms))
        .collect()
}

/// Simulated cost of one file extension. Larger increments take longer and
/// are more likely to block; log files cannot skip zero-initialisation and
/// are slower per megabyte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventCost {
    pub duration_ms: u64,
    pub io_wait_ms: u64,
    pub blocking: bool,
    pub blocked_processes: u32,
}

impl EventCost {
    pub fn draw<R: RandomSource>(increment_mb: f64, file_type: FileType, rng: &mut R) -> Self {
        let zeroing = match file_type {
            FileType::Data => 1.0,
            FileType::Log => 1.6,
        };
        let duration_ms =
            ((40.0 + increment_mb * 3.0) * zeroing * rng.uniform(0.8, 1.25)).round() as u64;
        let io_wait_ms = (duration_ms as f64 * rng.uniform(0.15, 0.45)).round() as u64;

        let blocking_probability = (0.15 + increment_mb / 512.0 * 0.6).min(0.95);
        let blocking = rng.chance(blocking_probability);
        let blocked_processes = if blocking {
            let waiting = duration_ms as f64 / 250.0 * rng.uniform(0.5, 1.5);
            (1 + waiting as u32).min(50)
        } else {
            0
        };

        Self {
            duration_ms,
            io_wait_ms,
            blocking,
            blocked_processes,
        }
    }
}
