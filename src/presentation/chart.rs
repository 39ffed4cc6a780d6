// Time series chart - request rate and average latency on one shared surface
use super::surface::{DrawSurface, Pen};
use crate::domain::line::LineId;
use crate::domain::metrics::LineSeries;

pub const SURFACE_W: f64 = 800.0;
pub const SURFACE_H: f64 = 160.0;

const MARGIN_LEFT: f64 = 30.0;
const MARGIN_TOP: f64 = 10.0;
const MARGIN_RIGHT: f64 = 10.0;
const MARGIN_BOTTOM: f64 = 20.0;

/// Floor for the request-rate scale so an empty or all-zero series still
/// yields a usable axis.
const RATE_SCALE_FLOOR: f64 = 5.0;
/// Floor for the latency maximum, same purpose.
const LATENCY_SCALE_FLOOR: f64 = 50.0;

/// The shared vertical scale both series are plotted against: latency
/// borrows the rate scale whenever the rate maximum is larger, which
/// visually compresses small latencies. This is the compatibility
/// scaling mode — an independently-scaled dual-axis mode belongs next
/// to it, not inside it.
pub fn compat_shared_scale(max_rate: f64, max_latency: f64) -> f64 {
    max_rate.max(max_latency)
}

fn floored_max(values: &[f64], floor: f64) -> f64 {
    values.iter().copied().fold(floor, f64::max)
}

/// Renders one line's `rps` and `latency_avg` polylines onto a fixed
/// 800×160 y-down surface. Every call fully re-renders from the given
/// series; no history is retained between calls, and the x axis is
/// categorical by sample index, not by time.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesChart {
    line: LineId,
}

impl TimeSeriesChart {
    pub fn new(line: LineId) -> Self {
        Self { line }
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface, series: &LineSeries) {
        surface.clear();

        // L-shaped axis frame at constant margins
        surface.polyline(
            &[
                (MARGIN_LEFT, MARGIN_TOP),
                (MARGIN_LEFT, SURFACE_H - MARGIN_BOTTOM),
                (SURFACE_W - MARGIN_RIGHT, SURFACE_H - MARGIN_BOTTOM),
            ],
            Pen::Axis,
        );

        let max_rate = floored_max(&series.rps, RATE_SCALE_FLOOR);
        let max_latency = floored_max(&series.latency_avg, LATENCY_SCALE_FLOOR);

        plot(surface, &series.rps, Pen::Rate, max_rate);
        plot(
            surface,
            &series.latency_avg,
            Pen::Latency,
            compat_shared_scale(max_rate, max_latency),
        );

        let raw_latency_max = series
            .latency_avg
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let shown_latency_max = if raw_latency_max.is_finite() {
            raw_latency_max
        } else {
            0.0
        };
        surface.text(40.0, 16.0, Pen::Label, &format!("max RPS={max_rate}"));
        surface.text(
            140.0,
            16.0,
            Pen::Label,
            &format!("max Avg(ms)={shown_latency_max}"),
        );
    }
}

/// Left-to-right polyline at equal horizontal spacing regardless of the
/// time deltas between samples.
fn plot(surface: &mut dyn DrawSurface, values: &[f64], pen: Pen, scale: f64) {
    let n = values.len();
    if n == 0 {
        return;
    }
    let usable_w = SURFACE_W - 50.0;
    let step = usable_w / 1.0_f64.max((n - 1) as f64);
    // bottom margin plus label headroom above the plot
    let usable_h = SURFACE_H - 40.0;
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = MARGIN_LEFT + i as f64 * step;
            let y = (SURFACE_H - MARGIN_BOTTOM) - (v / scale) * usable_h;
            (x, y)
        })
        .collect();
    surface.polyline(&points, pen);
}
