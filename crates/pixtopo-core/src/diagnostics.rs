//! Analysis diagnostics: timing and counts for each stage.
//!
//! [`analyze_with_diagnostics`] runs the same stages as
//! [`analyze`](crate::analyze) and records how long each one took and what
//! it produced. Time is read through the [`Clock`] trait so the core crate
//! never touches a platform clock itself.
//!
//! Durations are serialized as fractional seconds (`f64`), since
//! `std::time::Duration` does not implement serde traits.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::connectivity::Connectivity;
use crate::distance::{self, DistanceGrid};
use crate::erosion;
use crate::raster::{Grid, SimpleMask};
use crate::simple;
use crate::types::{Analysis, AnalysisConfig, TopologyError};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    /// Stage 1: distance transform.
    pub distance_transform: StageDiagnostics,
    /// Stage 2: erosion (thresholding the stage 1 distances).
    pub erosion: StageDiagnostics,
    /// Stage 3: simple-point classification.
    pub classification: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: AnalysisSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Distance transform metrics.
    DistanceTransform {
        /// Background pixels seeding the wavefront.
        source_count: usize,
        /// Largest finite distance, `None` when nothing is finite.
        max_distance: Option<u32>,
        /// Cells left unreachable (all of them, or none).
        unreachable_count: usize,
    },
    /// Erosion metrics.
    Erosion {
        /// Structuring element side length.
        structuring_size: u32,
        /// Distance threshold, `structuring_size / 2`.
        radius: u32,
        /// Foreground pixels before erosion.
        foreground_before: usize,
        /// Foreground pixels after erosion.
        foreground_after: usize,
    },
    /// Simple-point classification metrics.
    Classification {
        /// Foreground connectivity used.
        connectivity: Connectivity,
        /// Pixels classified simple.
        simple_count: usize,
        /// Foreground pixels classified simple.
        simple_foreground_count: usize,
    },
}

/// High-level summary for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Grid rows.
    pub rows: usize,
    /// Grid columns.
    pub cols: usize,
    /// Total pixel count.
    pub pixel_count: usize,
    /// Foreground pixels in the input.
    pub foreground_count: usize,
    /// Foreground pixels left after erosion.
    pub eroded_foreground_count: usize,
    /// Pixels classified simple.
    pub simple_count: usize,
}

impl AnalysisDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Analysis Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Grid: {}x{} ({} pixels, {} foreground)",
            self.summary.rows,
            self.summary.cols,
            self.summary.pixel_count,
            self.summary.foreground_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Eroded foreground: {}  |  Simple points: {}",
            self.summary.eroded_foreground_count, self.summary.simple_count,
        ));

        lines.join("\n")
    }

    /// Stages in execution order, with display names.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 3] {
        [
            ("Distance Transform", &self.distance_transform),
            ("Erosion", &self.erosion),
            ("Classification", &self.classification),
        ]
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::DistanceTransform {
            source_count,
            max_distance,
            unreachable_count,
        } => match max_distance {
            Some(max) => format!("{source_count} sources, max distance {max}"),
            None if *unreachable_count > 0 => {
                format!("no background, {unreachable_count} unreachable")
            }
            None => "empty grid".to_string(),
        },
        StageMetrics::Erosion {
            structuring_size,
            radius,
            foreground_before,
            foreground_after,
        } => format!(
            "size={structuring_size} r={radius} fg {foreground_before}->{foreground_after}"
        ),
        StageMetrics::Classification {
            connectivity,
            simple_count,
            simple_foreground_count,
        } => format!(
            "{connectivity}/{} {simple_count} simple ({simple_foreground_count} foreground)",
            connectivity.dual()
        ),
    }
}

fn distance_metrics(grid: &Grid, distances: &DistanceGrid) -> StageMetrics {
    StageMetrics::DistanceTransform {
        source_count: grid.count(|p| p.is_background()),
        max_distance: distances.cells().iter().filter_map(|d| d.finite()).max(),
        unreachable_count: distances.count(|d| d.is_unreachable()),
    }
}

fn classification_metrics(
    grid: &Grid,
    mask: &SimpleMask,
    connectivity: Connectivity,
) -> StageMetrics {
    StageMetrics::Classification {
        connectivity,
        simple_count: mask.count(|&simple| simple),
        simple_foreground_count: mask
            .enumerate()
            .filter(|&(p, &simple)| simple && grid[p].is_foreground())
            .count(),
    }
}

/// Run [`analyze`](crate::analyze) while timing each stage.
///
/// # Errors
///
/// Returns [`TopologyError::Validation`] if `config` is invalid. Nothing
/// is computed in that case.
pub fn analyze_with_diagnostics<C: Clock>(
    grid: &Grid,
    config: &AnalysisConfig,
    clock: &C,
) -> Result<(Analysis, AnalysisDiagnostics), TopologyError> {
    config.validate()?;
    let total_start = clock.now();

    let start = clock.now();
    let distances = distance::transform(grid);
    let distance_transform = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: distance_metrics(grid, &distances),
    };

    let start = clock.now();
    let eroded = erosion::erode_with(grid, &distances, config.structuring_size)?;
    let foreground_count = grid.foreground_count();
    let eroded_foreground_count = eroded.foreground_count();
    let erosion = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Erosion {
            structuring_size: config.structuring_size,
            radius: config.structuring_size / 2,
            foreground_before: foreground_count,
            foreground_after: eroded_foreground_count,
        },
    };

    let start = clock.now();
    let simple = simple::classify(grid, config.connectivity);
    let classification = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: classification_metrics(grid, &simple, config.connectivity),
    };

    let total_duration = clock.elapsed(&total_start);
    let summary = AnalysisSummary {
        rows: grid.rows(),
        cols: grid.cols(),
        pixel_count: grid.dimensions().cell_count(),
        foreground_count,
        eroded_foreground_count,
        simple_count: simple.count(|&s| s),
    };
    debug!(
        "analysis of {} grid took {:.3}ms",
        grid.dimensions(),
        duration_ms(total_duration)
    );

    let analysis = Analysis {
        config: *config,
        distances,
        eroded,
        simple,
    };
    let diagnostics = AnalysisDiagnostics {
        distance_transform,
        erosion,
        classification,
        total_duration,
        summary,
    };
    Ok((analysis, diagnostics))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    use crate::types::{Dimensions, Pixel, ValidationError};

    /// Clock that advances one millisecond per reading.
    struct StepClock {
        ticks: Cell<u64>,
    }

    impl StepClock {
        const fn new() -> Self {
            Self {
                ticks: Cell::new(0),
            }
        }
    }

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn grid() -> Grid {
        "\
        00000
        01110
        01110
        01110
        00000"
            .parse()
            .unwrap()
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_match_plain_analysis() {
        let config = AnalysisConfig {
            connectivity: Connectivity::Eight,
            structuring_size: 3,
        };
        let (analysis, _) = analyze_with_diagnostics(&grid(), &config, &StepClock::new()).unwrap();
        assert_eq!(analysis, crate::analyze(&grid(), &config).unwrap());
    }

    #[test]
    fn stage_metrics_are_counted() {
        let config = AnalysisConfig {
            connectivity: Connectivity::Four,
            structuring_size: 5,
        };
        let (_, diag) = analyze_with_diagnostics(&grid(), &config, &StepClock::new()).unwrap();

        assert_eq!(
            diag.distance_transform.metrics,
            StageMetrics::DistanceTransform {
                source_count: 16,
                max_distance: Some(2),
                unreachable_count: 0,
            }
        );
        assert_eq!(
            diag.erosion.metrics,
            StageMetrics::Erosion {
                structuring_size: 5,
                radius: 2,
                foreground_before: 9,
                foreground_after: 1,
            }
        );
        assert_eq!(
            diag.summary,
            AnalysisSummary {
                rows: 5,
                cols: 5,
                pixel_count: 25,
                foreground_count: 9,
                eroded_foreground_count: 1,
                simple_count: diag.summary.simple_count,
            }
        );
        // Every pixel of the 3x3 block except its center is simple.
        assert!(matches!(
            diag.classification.metrics,
            StageMetrics::Classification {
                simple_foreground_count: 8,
                simple_count,
                ..
            } if simple_count == diag.summary.simple_count
        ));
    }

    #[test]
    fn stage_durations_come_from_the_clock() {
        let (_, diag) =
            analyze_with_diagnostics(&grid(), &AnalysisConfig::default(), &StepClock::new())
                .unwrap();
        for (name, stage) in diag.stages() {
            assert_eq!(stage.duration, Duration::from_millis(1), "{name}");
        }
        assert!(diag.total_duration >= Duration::from_millis(3));
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let config = AnalysisConfig {
            structuring_size: 4,
            ..AnalysisConfig::default()
        };
        let clock = StepClock::new();
        let result = analyze_with_diagnostics(&grid(), &config, &clock);
        assert!(matches!(
            result,
            Err(TopologyError::Validation(ValidationError::StructuringSize(4)))
        ));
        assert_eq!(clock.ticks.get(), 0);
    }

    #[test]
    fn no_background_reports_unreachable() {
        let grid = Grid::new_fill(Dimensions::new(2, 3), Pixel::Foreground);
        let (_, diag) =
            analyze_with_diagnostics(&grid, &AnalysisConfig::default(), &StepClock::new())
                .unwrap();
        assert_eq!(
            diag.distance_transform.metrics,
            StageMetrics::DistanceTransform {
                source_count: 0,
                max_distance: None,
                unreachable_count: 6,
            }
        );
        assert!(diag.report().contains("no background, 6 unreachable"));
    }

    #[test]
    fn report_lists_every_stage() {
        let (_, diag) =
            analyze_with_diagnostics(&grid(), &AnalysisConfig::default(), &StepClock::new())
                .unwrap();
        let report = diag.report();
        assert!(report.contains("Analysis Diagnostics Report"));
        assert!(report.contains("Grid: 5x5 (25 pixels, 9 foreground)"));
        for (name, _) in diag.stages() {
            assert!(report.contains(name), "missing {name}");
        }
        assert!(report.contains("four/eight"));
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let (_, diag) =
            analyze_with_diagnostics(&grid(), &AnalysisConfig::default(), &StepClock::new())
                .unwrap();
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["erosion"]["duration"], serde_json::json!(0.001));
        let back: AnalysisDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.summary, diag.summary);
        assert_eq!(back.erosion.duration, Duration::from_millis(1));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let json = r#"{"duration": -1.0, "metrics": {"Erosion": {
            "structuring_size": 3, "radius": 1,
            "foreground_before": 0, "foreground_after": 0}}}"#;
        assert!(serde_json::from_str::<StageDiagnostics>(json).is_err());
    }
}
