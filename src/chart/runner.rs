//! Code runner - executes generated chart code
//!
//! Generated code is treated as a message to an untrusted interpreter.
//! [`CodeRunner`] is the single place where the constrained-scope policy
//! lives: callers hand over source plus the [`AllowedSymbols`] it may see
//! and get an [`ExecutionOutcome`] back, never a panic or raw error.
//!
//! [`RhaiRunner`] is the embedded implementation. Its engine has no
//! module resolver, no `eval`, and its output hooks go to `tracing`
//! instead of stdout; the only symbol in scope is the plot handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Scope};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

use super::context::{PlotError, PlotHandle};
use super::figure::AxisValue;

type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

/// Resource bounds for one script run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerLimits {
    /// Maximum interpreter operations
    pub max_operations: u64,
    /// Maximum function call depth
    pub max_call_levels: usize,
    /// Maximum elements in one array
    pub max_array_size: usize,
    /// Maximum bytes in one string
    pub max_string_size: usize,
    /// Wall-clock budget in milliseconds
    pub wall_clock_ms: u64,
}

impl Default for RunnerLimits {
    fn default() -> Self {
        Self {
            max_operations: 500_000,
            max_call_levels: 32,
            max_array_size: 10_000,
            max_string_size: 64 * 1024,
            wall_clock_ms: 5_000,
        }
    }
}

impl RunnerLimits {
    pub fn wall_clock(&self) -> Duration {
        Duration::from_millis(self.wall_clock_ms)
    }

    /// Zero would mean "unlimited" to the interpreter, so it is rejected
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("chart.max_operations", self.max_operations == 0),
            ("chart.max_call_levels", self.max_call_levels == 0),
            ("chart.max_array_size", self.max_array_size == 0),
            ("chart.max_string_size", self.max_string_size == 0),
            ("chart.wall_clock_ms", self.wall_clock_ms == 0),
        ];

        match checks.iter().find(|(_, is_zero)| *is_zero) {
            Some((field, _)) => Err(ConfigError::invalid(*field, "must be greater than 0")),
            None => Ok(()),
        }
    }
}

/// Symbols a script may reference
#[derive(Debug, Clone)]
pub struct AllowedSymbols {
    bindings: Vec<(&'static str, PlotHandle)>,
}

impl AllowedSymbols {
    /// Name the plot handle is bound to
    pub const PLOT_HANDLE: &'static str = "plt";

    /// Only the plot handle, bound as `plt`
    pub fn plotting(handle: PlotHandle) -> Self {
        Self {
            bindings: vec![(Self::PLOT_HANDLE, handle)],
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.iter().map(|(name, _)| *name)
    }

    fn bindings(&self) -> &[(&'static str, PlotHandle)] {
        &self.bindings
    }
}

/// Why a script stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Source did not parse
    Syntax,
    /// Script raised: unknown function, bad argument, type error
    Runtime,
    /// A resource limit was hit
    Limit,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Syntax => "syntax error",
            FaultKind::Runtime => "runtime error",
            FaultKind::Limit => "resource limit exceeded",
        }
    }
}

/// Result of running one script
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Completed { operations: u64 },
    Faulted { kind: FaultKind, message: String },
}

impl ExecutionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed { .. })
    }

    fn fault(kind: FaultKind, message: impl Into<String>) -> Self {
        ExecutionOutcome::Faulted {
            kind,
            message: message.into(),
        }
    }
}

/// Interpreter for generated code
pub trait CodeRunner: Send + Sync {
    /// Interpreter name, for logs
    fn name(&self) -> &'static str;

    /// Run `code` with only `symbols` in scope. Blocking.
    fn execute(&self, code: &str, symbols: &AllowedSymbols) -> ExecutionOutcome;
}

/// Embedded Rhai interpreter
#[derive(Debug, Clone, Default)]
pub struct RhaiRunner {
    limits: RunnerLimits,
}

impl RhaiRunner {
    pub fn new(limits: RunnerLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RunnerLimits {
        &self.limits
    }

    /// Fresh engine whose progress hook enforces the wall clock from `started`
    fn engine(&self, started: Instant, operations: Arc<AtomicU64>) -> Engine {
        let mut engine = Engine::new();

        engine
            .set_max_operations(self.limits.max_operations)
            .set_max_call_levels(self.limits.max_call_levels)
            .set_max_array_size(self.limits.max_array_size)
            .set_max_string_size(self.limits.max_string_size)
            .set_max_modules(0)
            .set_module_resolver(DummyModuleResolver::new());
        engine.disable_symbol("eval");

        engine.on_print(|text| tracing::debug!("chart script: {}", text));
        engine.on_debug(|text, _, pos| tracing::debug!("chart script {:?}: {}", pos, text));

        let budget = self.limits.wall_clock();
        engine.on_progress(move |count| {
            operations.store(count, Ordering::Relaxed);
            if started.elapsed() > budget {
                Some(Dynamic::from(format!(
                    "wall-clock budget of {} ms exceeded",
                    budget.as_millis()
                )))
            } else {
                None
            }
        });

        register_plot_api(&mut engine, &self.limits);
        engine
    }
}

impl CodeRunner for RhaiRunner {
    fn name(&self) -> &'static str {
        "rhai"
    }

    fn execute(&self, code: &str, symbols: &AllowedSymbols) -> ExecutionOutcome {
        let started = Instant::now();
        let operations = Arc::new(AtomicU64::new(0));
        let engine = self.engine(started, Arc::clone(&operations));

        let ast = match engine.compile(code) {
            Ok(ast) => ast,
            Err(e) => return ExecutionOutcome::fault(FaultKind::Syntax, e.to_string()),
        };

        let mut scope = Scope::new();
        for (name, handle) in symbols.bindings() {
            scope.push(*name, handle.clone());
        }

        let outcome = match engine.run_ast_with_scope(&mut scope, &ast) {
            Ok(()) => ExecutionOutcome::Completed {
                operations: operations.load(Ordering::Relaxed),
            },
            Err(err) => classify(&err),
        };

        tracing::trace!(
            "Script finished in {:?} after {} operations",
            started.elapsed(),
            operations.load(Ordering::Relaxed)
        );
        outcome
    }
}

/// Errors raised inside script functions arrive wrapped once per call level
fn root_cause(err: &EvalAltResult) -> &EvalAltResult {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => root_cause(inner),
        EvalAltResult::ErrorInModule(_, inner, _) => root_cause(inner),
        other => other,
    }
}

fn classify(err: &EvalAltResult) -> ExecutionOutcome {
    let kind = match root_cause(err) {
        EvalAltResult::ErrorParsing(..) => FaultKind::Syntax,
        EvalAltResult::ErrorTooManyOperations(..)
        | EvalAltResult::ErrorTerminated(..)
        | EvalAltResult::ErrorDataTooLarge(..)
        | EvalAltResult::ErrorStackOverflow(..)
        | EvalAltResult::ErrorTooManyModules(..) => FaultKind::Limit,
        _ => FaultKind::Runtime,
    };

    let message = match root_cause(err) {
        EvalAltResult::ErrorTerminated(reason, _) => reason.to_string(),
        EvalAltResult::ErrorStackOverflow(..) => "function calls nested too deeply".to_string(),
        other => other.to_string(),
    };

    ExecutionOutcome::fault(kind, message)
}

fn plot_err(e: PlotError) -> Box<EvalAltResult> {
    e.to_string().into()
}

fn to_number(call: &str, value: &Dynamic) -> ScriptResult<f64> {
    if let Ok(i) = value.as_int() {
        return Ok(i as f64);
    }
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    Err(format!("{}: expected a number, got {}", call, value.type_name()).into())
}

fn to_numbers(call: &str, values: &Array) -> ScriptResult<Vec<f64>> {
    values.iter().map(|v| to_number(call, v)).collect()
}

fn to_axis_values(call: &str, values: &Array) -> ScriptResult<Vec<AxisValue>> {
    values
        .iter()
        .map(|v| {
            if v.is_string() {
                Ok(AxisValue::Category(v.to_string()))
            } else {
                to_number(call, v).map(AxisValue::Number)
            }
        })
        .collect()
}

fn to_labels(values: &Array) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

const DEFAULT_BINS: i64 = 10;

/// Bin counts are allocated natively, outside the interpreter's array limit
fn check_bins(bins: i64, max_bins: usize) -> ScriptResult<()> {
    let max = i64::try_from(max_bins).unwrap_or(i64::MAX);
    if bins > max {
        return Err(plot_err(PlotError::invalid(
            "hist",
            format!("{} bins exceeds the limit of {}", bins, max),
        )));
    }
    Ok(())
}

/// Register the pyplot-style API on `PlotHandle`
fn register_plot_api(engine: &mut Engine, limits: &RunnerLimits) {
    engine.register_type_with_name::<PlotHandle>("PlotHandle");

    engine.register_fn("figure", |plt: &mut PlotHandle| plt.figure(None));
    engine.register_fn("figure", |plt: &mut PlotHandle, title: ImmutableString| {
        plt.figure(Some(title.to_string()))
    });

    engine.register_fn(
        "subplot",
        |plt: &mut PlotHandle, rows: i64, cols: i64, index: i64| -> ScriptResult<()> {
            plt.subplot(rows, cols, index).map_err(plot_err)
        },
    );
    // Three-digit shorthand: subplot(121)
    engine.register_fn(
        "subplot",
        |plt: &mut PlotHandle, code: i64| -> ScriptResult<()> {
            if !(111..=999).contains(&code) {
                return Err(format!("subplot: {} is not a three-digit grid code", code).into());
            }
            plt.subplot(code / 100, (code / 10) % 10, code % 10)
                .map_err(plot_err)
        },
    );

    engine.register_fn(
        "plot",
        |plt: &mut PlotHandle, x: Array, y: Array| -> ScriptResult<()> {
            plt.plot(to_axis_values("plot", &x)?, to_numbers("plot", &y)?, None)
                .map_err(plot_err)
        },
    );
    engine.register_fn(
        "plot",
        |plt: &mut PlotHandle, x: Array, y: Array, label: ImmutableString| -> ScriptResult<()> {
            plt.plot(
                to_axis_values("plot", &x)?,
                to_numbers("plot", &y)?,
                Some(label.to_string()),
            )
            .map_err(plot_err)
        },
    );

    engine.register_fn(
        "scatter",
        |plt: &mut PlotHandle, x: Array, y: Array| -> ScriptResult<()> {
            plt.scatter(to_axis_values("scatter", &x)?, to_numbers("scatter", &y)?, None)
                .map_err(plot_err)
        },
    );
    engine.register_fn(
        "scatter",
        |plt: &mut PlotHandle, x: Array, y: Array, label: ImmutableString| -> ScriptResult<()> {
            plt.scatter(
                to_axis_values("scatter", &x)?,
                to_numbers("scatter", &y)?,
                Some(label.to_string()),
            )
            .map_err(plot_err)
        },
    );

    engine.register_fn(
        "bar",
        |plt: &mut PlotHandle, x: Array, y: Array| -> ScriptResult<()> {
            plt.bar(to_axis_values("bar", &x)?, to_numbers("bar", &y)?, None)
                .map_err(plot_err)
        },
    );
    engine.register_fn(
        "bar",
        |plt: &mut PlotHandle, x: Array, y: Array, label: ImmutableString| -> ScriptResult<()> {
            plt.bar(
                to_axis_values("bar", &x)?,
                to_numbers("bar", &y)?,
                Some(label.to_string()),
            )
            .map_err(plot_err)
        },
    );

    engine.register_fn(
        "barh",
        |plt: &mut PlotHandle, x: Array, y: Array| -> ScriptResult<()> {
            plt.barh(to_axis_values("barh", &x)?, to_numbers("barh", &y)?, None)
                .map_err(plot_err)
        },
    );
    engine.register_fn(
        "barh",
        |plt: &mut PlotHandle, x: Array, y: Array, label: ImmutableString| -> ScriptResult<()> {
            plt.barh(
                to_axis_values("barh", &x)?,
                to_numbers("barh", &y)?,
                Some(label.to_string()),
            )
            .map_err(plot_err)
        },
    );

    engine.register_fn(
        "pie",
        |plt: &mut PlotHandle, values: Array, labels: Array| -> ScriptResult<()> {
            plt.pie(to_numbers("pie", &values)?, to_labels(&labels))
                .map_err(plot_err)
        },
    );

    let max_bins = limits.max_array_size;
    let default_bins = i64::try_from(max_bins).map_or(DEFAULT_BINS, |max| DEFAULT_BINS.min(max));
    engine.register_fn(
        "hist",
        move |plt: &mut PlotHandle, values: Array| -> ScriptResult<()> {
            plt.hist(to_numbers("hist", &values)?, default_bins)
                .map_err(plot_err)
        },
    );
    engine.register_fn(
        "hist",
        move |plt: &mut PlotHandle, values: Array, bins: i64| -> ScriptResult<()> {
            check_bins(bins, max_bins)?;
            plt.hist(to_numbers("hist", &values)?, bins)
                .map_err(plot_err)
        },
    );

    engine.register_fn("title", |plt: &mut PlotHandle, text: ImmutableString| {
        plt.title(text.to_string())
    });
    engine.register_fn("xlabel", |plt: &mut PlotHandle, text: ImmutableString| {
        plt.xlabel(text.to_string())
    });
    engine.register_fn("ylabel", |plt: &mut PlotHandle, text: ImmutableString| {
        plt.ylabel(text.to_string())
    });
    engine.register_fn("legend", |plt: &mut PlotHandle| plt.legend());
    engine.register_fn("grid", |plt: &mut PlotHandle| plt.grid(true));
    engine.register_fn("grid", |plt: &mut PlotHandle, on: bool| plt.grid(on));

    engine.register_fn(
        "xlim",
        |plt: &mut PlotHandle, lo: Dynamic, hi: Dynamic| -> ScriptResult<()> {
            plt.xlim(to_number("xlim", &lo)?, to_number("xlim", &hi)?)
                .map_err(plot_err)
        },
    );
    engine.register_fn(
        "ylim",
        |plt: &mut PlotHandle, lo: Dynamic, hi: Dynamic| -> ScriptResult<()> {
            plt.ylim(to_number("ylim", &lo)?, to_number("ylim", &hi)?)
                .map_err(plot_err)
        },
    );

    engine.register_fn("tight_layout", |_plt: &mut PlotHandle| {});
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::context::ChartContext;
    use crate::chart::figure::SeriesKind;

    fn run(code: &str) -> (ExecutionOutcome, ChartContext) {
        run_with(RunnerLimits::default(), code)
    }

    fn run_with(limits: RunnerLimits, code: &str) -> (ExecutionOutcome, ChartContext) {
        let ctx = ChartContext::new();
        let outcome = RhaiRunner::new(limits).execute(code, &AllowedSymbols::plotting(ctx.handle()));
        (outcome, ctx)
    }

    #[test]
    fn line_chart_script_draws() {
        let (outcome, ctx) = run(r#"
            let years = [2019, 2020, 2021];
            let share = [10.5, 20, 31.25];
            plt.plot(years, share, "Adoption");
            plt.title("AI adoption");
            plt.legend();
        "#);

        assert!(outcome.is_completed(), "{:?}", outcome);
        let figure = ctx.capture();
        let series = &figure.axes[0].series[0];
        assert_eq!(series.kind, SeriesKind::Line);
        assert_eq!(series.y, vec![10.5, 20.0, 31.25]);
        assert_eq!(series.label.as_deref(), Some("Adoption"));
        assert!(figure.axes[0].legend);
    }

    #[test]
    fn categorical_bars_and_pie() {
        let (outcome, ctx) = run(r#"
            plt.subplot(1, 2, 1);
            plt.bar(["Imaging", "Triage", "Admin"], [40, 25, 35]);
            plt.subplot(122);
            plt.pie([40, 60], ["AI", "Manual"]);
            plt.tight_layout();
        "#);

        assert!(outcome.is_completed(), "{:?}", outcome);
        let figure = ctx.capture();
        assert_eq!(figure.axes.len(), 2);
        assert!(figure.axes[0].series[0].is_categorical());
        assert_eq!(figure.axes[1].series[0].kind, SeriesKind::Pie);
    }

    #[test]
    fn data_only_script_completes_without_drawing() {
        let (outcome, ctx) = run("let x = [1, 2, 3]; let total = x.len();");
        assert!(outcome.is_completed());
        assert!(!ctx.capture().is_drawable());
    }

    #[test]
    fn show_is_not_available() {
        let (outcome, _) = run("plt.plot([1], [1]); plt.show();");
        match outcome {
            ExecutionOutcome::Faulted { kind, message } => {
                assert_eq!(kind, FaultKind::Runtime);
                assert!(message.contains("show"));
            }
            other => panic!("Expected fault, got {:?}", other),
        }
    }

    #[test]
    fn eval_is_disabled() {
        let (outcome, _) = run(r#"eval("plt.plot([1], [1])");"#);
        assert!(!outcome.is_completed());
    }

    #[test]
    fn imports_cannot_reach_files() {
        let (outcome, _) = run(r#"import "/etc/passwd" as secrets;"#);
        assert!(!outcome.is_completed());
    }

    #[test]
    fn only_plot_handle_in_scope() {
        let symbols = AllowedSymbols::plotting(ChartContext::new().handle());
        assert_eq!(symbols.names().collect::<Vec<_>>(), vec!["plt"]);
    }

    #[test]
    fn syntax_error_is_reported() {
        let (outcome, _) = run("plt.plot([1, 2], [3, 4]");
        assert!(matches!(
            outcome,
            ExecutionOutcome::Faulted {
                kind: FaultKind::Syntax,
                ..
            }
        ));
    }

    #[test]
    fn bad_arguments_are_runtime_faults() {
        let (outcome, _) = run(r#"plt.plot([1, 2, 3], [1, "two", 3]);"#);
        match outcome {
            ExecutionOutcome::Faulted { kind, message } => {
                assert_eq!(kind, FaultKind::Runtime);
                assert!(message.contains("expected a number"));
            }
            other => panic!("Expected fault, got {:?}", other),
        }

        let (outcome, _) = run("plt.plot([1, 2, 3], [1, 2]);");
        assert!(!outcome.is_completed());
    }

    #[test]
    fn infinite_loop_hits_operation_limit() {
        let limits = RunnerLimits {
            max_operations: 10_000,
            ..RunnerLimits::default()
        };
        let (outcome, _) = run_with(limits, "loop { let x = 1; }");
        assert!(matches!(
            outcome,
            ExecutionOutcome::Faulted {
                kind: FaultKind::Limit,
                ..
            }
        ));
    }

    #[test]
    fn wall_clock_budget_terminates_script() {
        let limits = RunnerLimits {
            max_operations: u64::MAX,
            wall_clock_ms: 50,
            ..RunnerLimits::default()
        };
        let (outcome, _) = run_with(limits, "loop { let x = 1; }");
        match outcome {
            ExecutionOutcome::Faulted { kind, message } => {
                assert_eq!(kind, FaultKind::Limit);
                assert!(message.contains("wall-clock"));
            }
            other => panic!("Expected fault, got {:?}", other),
        }
    }

    #[test]
    fn deep_recursion_hits_call_limit() {
        let (outcome, _) = run("fn down(n) { down(n + 1) } down(0);");
        assert!(matches!(
            outcome,
            ExecutionOutcome::Faulted {
                kind: FaultKind::Limit,
                ..
            }
        ));
    }

    #[test]
    fn oversized_array_hits_limit() {
        let limits = RunnerLimits {
            max_array_size: 10,
            ..RunnerLimits::default()
        };
        let (outcome, _) = run_with(limits, "let a = []; for i in 0..100 { a.push(i); }");
        assert!(matches!(
            outcome,
            ExecutionOutcome::Faulted {
                kind: FaultKind::Limit,
                ..
            }
        ));
    }

    #[test]
    fn hist_bins_bounded_by_array_limit() {
        let limits = RunnerLimits {
            max_array_size: 10,
            wall_clock_ms: 50,
            ..RunnerLimits::default()
        };
        let (outcome, ctx) = run_with(limits, "plt.hist([1.0, 2.0], 20000000);");
        match outcome {
            ExecutionOutcome::Faulted { kind, message } => {
                assert_eq!(kind, FaultKind::Runtime);
                assert!(message.contains("hist"));
                assert!(message.contains("exceeds the limit of 10"));
            }
            other => panic!("Expected fault, got {:?}", other),
        }
        assert!(!ctx.capture().is_drawable());

        let (outcome, ctx) = run_with(limits, "plt.hist([1.0, 2.0, 3.0], 10);");
        assert!(outcome.is_completed(), "{:?}", outcome);
        assert_eq!(ctx.capture().axes[0].series[0].y.len(), 10);
    }

    #[test]
    fn default_bins_respect_small_array_limit() {
        let limits = RunnerLimits {
            max_array_size: 4,
            ..RunnerLimits::default()
        };
        let (outcome, ctx) = run_with(limits, "plt.hist([1, 2, 3, 4]);");
        assert!(outcome.is_completed(), "{:?}", outcome);
        assert_eq!(ctx.capture().axes[0].series[0].y.len(), 4);
    }

    #[test]
    fn overflowing_subplot_grid_is_a_fault() {
        let (outcome, ctx) = run("plt.subplot(9223372036854775807, 2, 1); plt.plot([1], [1]);");
        match outcome {
            ExecutionOutcome::Faulted { kind, message } => {
                assert_eq!(kind, FaultKind::Runtime);
                assert!(message.contains("subplot"));
            }
            other => panic!("Expected fault, got {:?}", other),
        }
        assert!(!ctx.capture().is_drawable());
    }

    #[test]
    fn zero_limits_rejected() {
        let limits = RunnerLimits {
            wall_clock_ms: 0,
            ..RunnerLimits::default()
        };
        assert!(limits.validate().is_err());
        assert!(RunnerLimits::default().validate().is_ok());
    }
}
