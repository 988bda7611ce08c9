//! Chart state and rendering
//!
//! The chart plots the two value series against their arrival index on a
//! fixed cadence, independent of how fast samples come in. The vertical
//! bounds live in a `ViewRange` that auto-rescrolls when data leaves it
//! and that the zoom controls manipulate directly.

mod render;
mod ticker;

pub use render::save_chart;
pub use ticker::{ChartTask, ChartView};

use std::path::PathBuf;
use std::time::Duration;

/// The currently displayed vertical bounds of the chart.
///
/// `y_max` is always `y_min + y_span` and the span is always positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRange {
    y_min: f64,
    y_span: f64,
}

impl ViewRange {
    pub fn new(y_min: f64, y_max: f64) -> ViewRange {
        assert!(y_max > y_min, "empty vertical range");
        ViewRange {
            y_min,
            y_span: y_max - y_min,
        }
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn y_max(&self) -> f64 {
        self.y_min + self.y_span
    }

    pub fn y_span(&self) -> f64 {
        self.y_span
    }

    /// Auto-rescroll policy: when either data bound leaves the current
    /// range, recenter on the data minimum keeping the span. Values are
    /// assumed non-negative, so the bottom is floored at zero. Returns
    /// whether the range moved.
    pub fn rescroll_to(&mut self, data_min: f64, data_max: f64) -> bool {
        if data_max > self.y_max() || data_min < self.y_min {
            self.recenter(data_min);
            true
        } else {
            false
        }
    }

    /// Halve the span and recenter around the observed data minimum.
    pub fn zoom_in(&mut self, data_min: f64) {
        self.y_span /= 2.0;
        self.recenter(data_min);
    }

    /// Double the span and recenter around the observed data minimum.
    pub fn zoom_out(&mut self, data_min: f64) {
        self.y_span *= 2.0;
        self.recenter(data_min);
    }

    fn recenter(&mut self, data_min: f64) {
        self.y_min = (data_min - self.y_span / 2.0).max(0.0);
    }
}

impl Default for ViewRange {
    fn default() -> ViewRange {
        ViewRange {
            y_min: 20.0,
            y_span: 30.0,
        }
    }
}

/// Knobs for one graphing session.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Vertical bounds at session start.
    pub view: ViewRange,
    /// Redraw cadence.
    pub cadence: Duration,
    /// Directory the stop-time image artifact lands in.
    pub out_dir: PathBuf,
    /// Pixel size of the image artifact.
    pub size: (u32, u32),
}

impl Default for ChartConfig {
    fn default() -> ChartConfig {
        ChartConfig {
            view: ViewRange::default(),
            cadence: Duration::from_millis(200),
            out_dir: PathBuf::from("."),
            size: (1600, 800),
        }
    }
}

/// Name of the image artifact written when graphing stops. The format is
/// relied on by tooling that globs these files; do not change it.
pub fn artifact_name(at: chrono::DateTime<chrono::Local>) -> String {
    format!("graph_stop_{}.png", at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_range_is_20_to_50() {
        let view = ViewRange::default();
        assert_eq!(view.y_min(), 20.0);
        assert_eq!(view.y_max(), 50.0);
        assert_eq!(view.y_span(), 30.0);
    }

    #[test]
    fn rescroll_only_moves_when_data_escapes() {
        let mut view = ViewRange::default();
        assert!(!view.rescroll_to(25.0, 45.0));
        assert_eq!(view, ViewRange::default());

        assert!(view.rescroll_to(25.0, 55.0));
        assert_eq!(view.y_min(), 10.0);
        assert_eq!(view.y_max(), 40.0);
    }

    #[test]
    fn rescroll_floors_at_zero() {
        let mut view = ViewRange::default();
        assert!(view.rescroll_to(5.0, 45.0));
        assert_eq!(view.y_min(), 0.0);
        assert_eq!(view.y_max(), 30.0);
    }

    #[test]
    fn zoom_in_then_out_restores_the_span() {
        let mut view = ViewRange::default();
        view.zoom_in(30.0);
        assert_eq!(view.y_span(), 15.0);
        assert_eq!(view.y_min(), 22.5);
        view.zoom_out(30.0);
        assert_eq!(view.y_span(), 30.0);
        assert_eq!(view.y_min(), 15.0);
    }

    #[test]
    fn zoom_recenter_floors_at_zero() {
        let mut view = ViewRange::default();
        view.zoom_out(2.0);
        assert_eq!(view.y_min(), 0.0);
        assert_eq!(view.y_max(), 60.0);
    }

    #[test]
    fn artifact_name_matches_the_glob_format() {
        let at = chrono::Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 9).unwrap();
        assert_eq!(artifact_name(at), "graph_stop_20240305_143009.png");
    }
}
