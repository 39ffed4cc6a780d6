// Drawing surface seam - charts render through this, the real canvas lives behind it
/// Semantic stroke identity; the backing surface decides actual colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pen {
    Axis,
    Rate,
    Latency,
    Label,
}

/// A fixed-size y-down pixel surface the chart can be redrawn onto.
/// Implementations are expected to be cheap to clear: every redraw wipes
/// the whole surface, there is no incremental diffing.
pub trait DrawSurface {
    fn clear(&mut self);
    fn polyline(&mut self, points: &[(f64, f64)], pen: Pen);
    fn text(&mut self, x: f64, y: f64, pen: Pen, text: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Polyline { points: Vec<(f64, f64)>, pen: Pen },
    Text { x: f64, y: f64, pen: Pen, text: String },
}

/// Captures the command stream instead of rasterizing it. Backs the
/// chart tests and headless captures.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// The polylines drawn with a given pen, in draw order.
    pub fn polylines(&self, pen: Pen) -> Vec<&[(f64, f64)]> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Polyline { points, pen: p } if *p == pen => Some(points.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<(f64, f64, &str)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { x, y, text, .. } => Some((*x, *y, text.as_str())),
                _ => None,
            })
            .collect()
    }
}

impl DrawSurface for RecordingSurface {
    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn polyline(&mut self, points: &[(f64, f64)], pen: Pen) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            pen,
        });
    }

    fn text(&mut self, x: f64, y: f64, pen: Pen, text: &str) {
        self.commands.push(DrawCommand::Text {
            x,
            y,
            pen,
            text: text.to_string(),
        });
    }
}
