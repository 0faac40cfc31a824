//! User interface components for the healthlens CLI
//!
//! Output goes through a [`Printer`] that knows whether it is talking to an
//! interactive terminal, a CI log or a pipe. Long model calls show a
//! [`RequestSpinner`] only when progress output makes sense.

pub mod output;
pub mod progress;

pub use output::{OutputMode, Printer};
pub use progress::RequestSpinner;
