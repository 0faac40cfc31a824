//! Chart Module - model-generated illustrative charts
//!
//! A chart request flows through [`CodeSynthesizer`] (prompt), a model
//! call, [`CodeSanitizer`] (cleanup) and a [`CodeRunner`] that executes
//! the code against the ambient [`ChartContext`]. [`ChartExecutor`] ties
//! the steps together and returns a [`ChartResult`].

pub mod caption;
pub mod context;
pub mod executor;
pub mod figure;
pub mod runner;
pub mod sanitize;
pub mod svg;
pub mod synth;

pub use caption::caption_for;
pub use context::{ChartContext, PlotError, PlotHandle};
pub use executor::{ChartExecutor, ChartResult};
pub use figure::{Axes, AxisValue, Figure, GridSlot, Series, SeriesKind};
pub use runner::{AllowedSymbols, CodeRunner, ExecutionOutcome, FaultKind, RhaiRunner, RunnerLimits};
pub use sanitize::CodeSanitizer;
pub use svg::to_svg;
pub use synth::CodeSynthesizer;
