//! IO volume model.

use growth_core::{round3, GrowthPatternSpec, RandomSource, SimulationPeriod, WorkloadShape};

/// Page size used to convert operation counts into volume.
pub const PAGE_SIZE_BYTES: f64 = 8192.0;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Reads and writes performed in one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodIo {
    pub reads: u64,
    pub writes: u64,
}

impl PeriodIo {
    pub fn read_gb(&self) -> f64 {
        round3(self.reads as f64 * PAGE_SIZE_BYTES / BYTES_PER_GB)
    }

    pub fn write_gb(&self) -> f64 {
        round3(self.writes as f64 * PAGE_SIZE_BYTES / BYTES_PER_GB)
    }

    /// Written volume in MB, unrounded; drives log growth.
    pub fn write_mb(&self) -> f64 {
        self.writes as f64 * PAGE_SIZE_BYTES / BYTES_PER_MB
    }
}

/// Draw the period's IO: an IOPS rate from the workload range, scaled by the
/// pattern's IO multiplier and the day/night factor, over the period length.
pub fn simulate_io<R: RandomSource>(
    shape: &WorkloadShape,
    pattern: &GrowthPatternSpec,
    period: &SimulationPeriod,
    rng: &mut R,
) -> PeriodIo {
    let seconds = period.duration_seconds().max(0) as f64;
    let (read_factor, write_factor) = shape.factors(period.kind);

    let reads_per_sec = rng.uniform(shape.reads_per_sec.min, shape.reads_per_sec.max);
    let writes_per_sec = rng.uniform(shape.writes_per_sec.min, shape.writes_per_sec.max);

    PeriodIo {
        reads: (reads_per_sec * read_factor * pattern.io_multiplier * seconds).round() as u64,
        writes: (writes_per_sec * write_factor * pattern.io_multiplier * seconds).round() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use growth_core::{FloatRange, PeriodKind, ScriptedRandom};

    fn shape() -> WorkloadShape {
        WorkloadShape {
            reads_per_sec: FloatRange::new(100.0, 100.0),
            writes_per_sec: FloatRange::new(10.0, 10.0),
            day_read_factor: 2.0,
            day_write_factor: 1.0,
            night_read_factor: 0.5,
            night_write_factor: 4.0,
            log_growth_factor: 0.001,
        }
    }

    fn pattern(io_multiplier: f64) -> GrowthPatternSpec {
        GrowthPatternSpec {
            name: "stable".to_string(),
            mean_growth_pct_range: FloatRange::new(0.0, 3.0),
            cleanup_probability: 0.0,
            cleanup_effectiveness_range: FloatRange::new(0.0, 0.0),
            io_multiplier,
            day_multiplier: 1.0,
            night_multiplier: 1.0,
        }
    }

    fn period(kind: PeriodKind) -> SimulationPeriod {
        let start = crate::scheduler::simulation_epoch();
        SimulationPeriod {
            start,
            end: start + chrono::TimeDelta::hours(12),
            kind,
        }
    }

    #[test]
    fn test_io_scales_with_period_and_multiplier() {
        let mut rng = ScriptedRandom::constant(0.5);
        let day = simulate_io(&shape(), &pattern(1.0), &period(PeriodKind::Day), &mut rng);
        assert_eq!(day.reads, 100 * 2 * 43_200);
        assert_eq!(day.writes, 10 * 43_200);

        let night = simulate_io(&shape(), &pattern(2.0), &period(PeriodKind::Night), &mut rng);
        assert_eq!(night.reads, 100 * 43_200);
        assert_eq!(night.writes, 10 * 4 * 2 * 43_200);
    }

    #[test]
    fn test_volume_uses_8k_pages() {
        let io = PeriodIo {
            reads: 131_072,
            writes: 65_536,
        };
        assert_eq!(io.read_gb(), 1.0);
        assert_eq!(io.write_gb(), 0.5);
        assert_eq!(io.write_mb(), 512.0);
    }
}
