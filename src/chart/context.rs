//! Ambient chart context
//!
//! [`ChartContext`] owns the "current figure" that generated code draws
//! into. Its lifecycle is explicit: `reset()` before a run, then
//! `capture()` to take the result. [`PlotHandle`] is the pyplot-style
//! handle bound into the script scope; every call mutates the shared
//! figure.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use super::figure::{AxisValue, Figure, GridSlot, Series, SeriesKind};

/// Invalid arguments to a plotting call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlotError {
    #[error("{call}: x has {x} values but y has {y}")]
    LengthMismatch {
        call: &'static str,
        x: usize,
        y: usize,
    },

    #[error("{call}: no data to draw")]
    EmptyData { call: &'static str },

    #[error("{call}: {reason}")]
    InvalidArgument { call: &'static str, reason: String },
}

impl PlotError {
    pub(crate) fn invalid(call: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            call,
            reason: reason.into(),
        }
    }
}

pub type PlotResult = Result<(), PlotError>;

/// Largest subplot grid side; the SVG document is sized per row and column
pub const MAX_GRID_SIDE: i64 = 10;

/// Process-wide current-figure state for chart scripts
#[derive(Debug, Default)]
pub struct ChartContext {
    figure: Arc<Mutex<Figure>>,
}

impl ChartContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard whatever the previous run drew
    pub fn reset(&self) {
        self.figure.lock().clear(None);
    }

    /// Handle for binding into a script scope
    pub fn handle(&self) -> PlotHandle {
        PlotHandle {
            figure: Arc::clone(&self.figure),
        }
    }

    /// Take the current figure, leaving an empty one behind
    pub fn capture(&self) -> Figure {
        std::mem::take(&mut *self.figure.lock())
    }

    /// Peek at the current figure without taking it
    pub fn snapshot(&self) -> Figure {
        self.figure.lock().clone()
    }
}

/// pyplot-style handle over the ambient figure
#[derive(Debug, Clone)]
pub struct PlotHandle {
    figure: Arc<Mutex<Figure>>,
}

impl PlotHandle {
    /// Start a fresh figure
    pub fn figure(&self, suptitle: Option<String>) {
        self.figure.lock().clear(suptitle);
    }

    /// Select (creating if needed) a subplot of a rows x cols grid
    pub fn subplot(&self, rows: i64, cols: i64, index: i64) -> PlotResult {
        if rows < 1 || cols < 1 {
            return Err(PlotError::invalid("subplot", "grid must be at least 1x1"));
        }
        if rows > MAX_GRID_SIDE || cols > MAX_GRID_SIDE {
            return Err(PlotError::invalid(
                "subplot",
                format!("grid too large, at most {0}x{0}", MAX_GRID_SIDE),
            ));
        }
        let cells = rows
            .checked_mul(cols)
            .ok_or_else(|| PlotError::invalid("subplot", "grid too large"))?;
        if index < 1 || index > cells {
            return Err(PlotError::invalid(
                "subplot",
                format!("index {} outside a {}x{} grid", index, rows, cols),
            ));
        }

        self.figure.lock().select(GridSlot {
            rows: rows as usize,
            cols: cols as usize,
            index: index as usize,
        });
        Ok(())
    }

    /// Line series
    pub fn plot(&self, x: Vec<AxisValue>, y: Vec<f64>, label: Option<String>) -> PlotResult {
        self.push_xy("plot", SeriesKind::Line, x, y, label)
    }

    /// Point series
    pub fn scatter(&self, x: Vec<AxisValue>, y: Vec<f64>, label: Option<String>) -> PlotResult {
        self.push_xy("scatter", SeriesKind::Scatter, x, y, label)
    }

    /// Vertical bars
    pub fn bar(&self, categories: Vec<AxisValue>, values: Vec<f64>, label: Option<String>) -> PlotResult {
        self.push_xy("bar", SeriesKind::Bar, categories, values, label)
    }

    /// Horizontal bars
    pub fn barh(&self, categories: Vec<AxisValue>, values: Vec<f64>, label: Option<String>) -> PlotResult {
        self.push_xy("barh", SeriesKind::BarHorizontal, categories, values, label)
    }

    /// Pie chart; values must be non-negative with a positive total
    pub fn pie(&self, values: Vec<f64>, labels: Vec<String>) -> PlotResult {
        if values.len() != labels.len() {
            return Err(PlotError::LengthMismatch {
                call: "pie",
                x: labels.len(),
                y: values.len(),
            });
        }
        if values.is_empty() {
            return Err(PlotError::EmptyData { call: "pie" });
        }
        if values.iter().any(|v| *v < 0.0) {
            return Err(PlotError::invalid("pie", "values must not be negative"));
        }
        if values.iter().sum::<f64>() <= 0.0 {
            return Err(PlotError::invalid("pie", "values must not all be zero"));
        }

        let x = labels.into_iter().map(AxisValue::Category).collect();
        self.push_series(Series::new(SeriesKind::Pie, x, values));
        Ok(())
    }

    /// Histogram, binned eagerly into `bins` equal-width counts
    pub fn hist(&self, values: Vec<f64>, bins: i64) -> PlotResult {
        if bins < 1 {
            return Err(PlotError::invalid("hist", "bins must be at least 1"));
        }
        if values.is_empty() {
            return Err(PlotError::EmptyData { call: "hist" });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PlotError::invalid("hist", "values must be finite numbers"));
        }

        let (starts, counts) = bin_values(&values, bins as usize);
        let x = starts.into_iter().map(AxisValue::Number).collect();
        self.push_series(Series::new(SeriesKind::Histogram, x, counts));
        Ok(())
    }

    pub fn title(&self, text: String) {
        self.figure.lock().current_axes().title = Some(text);
    }

    pub fn xlabel(&self, text: String) {
        self.figure.lock().current_axes().xlabel = Some(text);
    }

    pub fn ylabel(&self, text: String) {
        self.figure.lock().current_axes().ylabel = Some(text);
    }

    pub fn legend(&self) {
        self.figure.lock().current_axes().legend = true;
    }

    pub fn grid(&self, on: bool) {
        self.figure.lock().current_axes().grid = on;
    }

    pub fn xlim(&self, lo: f64, hi: f64) -> PlotResult {
        check_limits("xlim", lo, hi)?;
        self.figure.lock().current_axes().xlim = Some((lo, hi));
        Ok(())
    }

    pub fn ylim(&self, lo: f64, hi: f64) -> PlotResult {
        check_limits("ylim", lo, hi)?;
        self.figure.lock().current_axes().ylim = Some((lo, hi));
        Ok(())
    }

    fn push_xy(
        &self,
        call: &'static str,
        kind: SeriesKind,
        x: Vec<AxisValue>,
        y: Vec<f64>,
        label: Option<String>,
    ) -> PlotResult {
        if x.len() != y.len() {
            return Err(PlotError::LengthMismatch {
                call,
                x: x.len(),
                y: y.len(),
            });
        }
        if y.is_empty() {
            return Err(PlotError::EmptyData { call });
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(PlotError::invalid(call, "values must be finite numbers"));
        }

        self.push_series(Series::new(kind, x, y).with_label(label));
        Ok(())
    }

    fn push_series(&self, series: Series) {
        self.figure.lock().current_axes().series.push(series);
    }
}

fn check_limits(call: &'static str, lo: f64, hi: f64) -> PlotResult {
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(PlotError::invalid(
            call,
            format!("expected lower < upper, got ({}, {})", lo, hi),
        ));
    }
    Ok(())
}

/// Equal-width bins over [min, max]; the last bin is closed
fn bin_values(values: &[f64], bins: usize) -> (Vec<f64>, Vec<f64>) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min {
        (max - min) / bins as f64
    } else {
        1.0
    };

    let mut counts = vec![0.0; bins];
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1.0;
    }

    let starts = (0..bins).map(|i| min + i as f64 * width).collect();
    (starts, counts)
}
