//! Figure model - the chart object handed to callers
//!
//! A [`Figure`] is a grid of [`Axes`], each holding decorations and a list
//! of [`Series`]. It is plain data: once captured from the ambient context
//! it belongs to the caller.

use serde::Serialize;

/// An x coordinate: numeric, or a category label
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    Category(String),
}

impl AxisValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AxisValue::Number(n) => Some(*n),
            AxisValue::Category(_) => None,
        }
    }
}

impl std::fmt::Display for AxisValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisValue::Number(n) => write!(f, "{}", n),
            AxisValue::Category(c) => write!(f, "{}", c),
        }
    }
}

/// How a series is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Line,
    Scatter,
    Bar,
    BarHorizontal,
    Pie,
    Histogram,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Line => "line",
            SeriesKind::Scatter => "scatter",
            SeriesKind::Bar => "bar",
            SeriesKind::BarHorizontal => "barh",
            SeriesKind::Pie => "pie",
            SeriesKind::Histogram => "histogram",
        }
    }
}

/// One drawn data set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub kind: SeriesKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Positions, categories, pie labels or histogram bin starts
    pub x: Vec<AxisValue>,
    /// Values, same length as `x`
    pub y: Vec<f64>,
}

impl Series {
    pub fn new(kind: SeriesKind, x: Vec<AxisValue>, y: Vec<f64>) -> Self {
        Self {
            kind,
            label: None,
            x,
            y,
        }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Whether every x value is a category label
    pub fn is_categorical(&self) -> bool {
        !self.x.is_empty() && self.x.iter().all(|v| matches!(v, AxisValue::Category(_)))
    }
}

/// Location of an axes within the figure grid (1-based index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSlot {
    pub rows: usize,
    pub cols: usize,
    pub index: usize,
}

impl GridSlot {
    pub const SINGLE: GridSlot = GridSlot {
        rows: 1,
        cols: 1,
        index: 1,
    };

    /// Zero-based (row, column) of this slot
    pub fn cell(&self) -> (usize, usize) {
        let zero = self.index.saturating_sub(1);
        (zero / self.cols.max(1), zero % self.cols.max(1))
    }
}

/// One plotting area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axes {
    pub slot: GridSlot,
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub legend: bool,
    pub grid: bool,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    pub series: Vec<Series>,
}

impl Axes {
    pub fn new(slot: GridSlot) -> Self {
        Self {
            slot,
            title: None,
            xlabel: None,
            ylabel: None,
            legend: false,
            grid: false,
            xlim: None,
            ylim: None,
            series: Vec::new(),
        }
    }

    /// At least one series with data
    pub fn is_drawable(&self) -> bool {
        self.series.iter().any(|s| !s.is_empty())
    }
}

/// A complete chart: suptitle plus a grid of axes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Figure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suptitle: Option<String>,
    pub axes: Vec<Axes>,
    #[serde(skip)]
    current: Option<usize>,
}

impl Figure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over, optionally with a suptitle
    pub fn clear(&mut self, suptitle: Option<String>) {
        *self = Self {
            suptitle,
            ..Self::default()
        };
    }

    /// The current axes, created in a single-cell grid if none exists
    pub fn current_axes(&mut self) -> &mut Axes {
        let idx = match self.current {
            Some(idx) => idx,
            None => {
                self.axes.push(Axes::new(GridSlot::SINGLE));
                self.axes.len() - 1
            }
        };
        self.current = Some(idx);
        &mut self.axes[idx]
    }

    /// Make the axes at `slot` current, creating it if needed
    pub fn select(&mut self, slot: GridSlot) -> &mut Axes {
        let idx = match self.axes.iter().position(|a| a.slot == slot) {
            Some(idx) => idx,
            None => {
                self.axes.push(Axes::new(slot));
                self.axes.len() - 1
            }
        };
        self.current = Some(idx);
        &mut self.axes[idx]
    }

    /// Whether any axes holds a non-empty series
    pub fn is_drawable(&self) -> bool {
        self.axes.iter().any(Axes::is_drawable)
    }

    /// Total number of non-empty series
    pub fn element_count(&self) -> usize {
        self.axes
            .iter()
            .flat_map(|a| a.series.iter())
            .filter(|s| !s.is_empty())
            .count()
    }

    /// Grid dimensions needed to place every axes
    pub fn grid_shape(&self) -> (usize, usize) {
        self.axes.iter().fold((1, 1), |(rows, cols), axes| {
            let (r, c) = axes.slot.cell();
            (
                rows.max(axes.slot.rows).max(r + 1),
                cols.max(axes.slot.cols).max(c + 1),
            )
        })
    }

    /// First non-empty title: suptitle, then axes titles
    pub fn headline(&self) -> Option<&str> {
        self.suptitle
            .as_deref()
            .or_else(|| self.axes.iter().find_map(|a| a.title.as_deref()))
    }
}
