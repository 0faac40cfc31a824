//! Chart Executor Integration Tests
//!
//! Covers the generate → sanitize → execute → capture flow, figure
//! isolation between renders and script limits.

use std::sync::Arc;

use healthlens::ai::provider::MockProvider;
use healthlens::chart::{to_svg, SeriesKind};
use healthlens::{AiConfig, ChartError, ChartExecutor};

fn executor() -> ChartExecutor {
    ChartExecutor::with_provider(Arc::new(MockProvider::new()), &AiConfig::ollama())
}

fn execution_detail(error: Option<&ChartError>) -> String {
    match error {
        Some(ChartError::ExecutionFault { detail }) => detail.clone(),
        other => panic!("Expected ExecutionFault, got {:?}", other),
    }
}

#[tokio::test]
async fn model_code_renders_to_svg() {
    let result = executor().render("AI triage in emergency rooms").await;

    let figure = result.figure().expect("chart should render");
    assert_eq!(figure.headline(), Some("AI adoption in hospitals"));
    assert!(result
        .caption()
        .unwrap()
        .starts_with("This graph supports the topic: 'AI triage in emergency rooms'."));

    let svg = to_svg(figure);
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("AI adoption in hospitals"));
}

#[tokio::test]
async fn fences_and_blocking_calls_are_stripped() {
    let provider = Arc::new(MockProvider::new());
    provider
        .add_response(
            "```rhai\n\
             plt.bar([\"Radiology\", \"Pathology\"], [40, 25]);\n\
             plt.show();\n\
             ```",
        )
        .await;
    let executor = ChartExecutor::with_provider(provider, &AiConfig::ollama());

    let result = executor.render("AI by specialty").await;
    let figure = result.figure().expect("chart should render");
    assert_eq!(figure.axes[0].series[0].kind, SeriesKind::Bar);
}

#[tokio::test]
async fn data_without_drawing_is_no_visual_element() {
    let result = executor()
        .render_code("t", "let rates = [0.91, 0.87, 0.95];\nlet labels = [\"a\", \"b\", \"c\"];")
        .await;

    assert_eq!(result.error(), Some(&ChartError::NoVisualElement));
    assert!(result.caption().is_none());
}

#[tokio::test]
async fn empty_code_is_no_visual_element() {
    let result = executor().render_code("t", "```\n```").await;
    assert_eq!(result.error(), Some(&ChartError::NoVisualElement));
}

#[tokio::test]
async fn provider_failure_is_chart_failure() {
    let provider = Arc::new(MockProvider::new());
    provider.add_failure("connection refused").await;
    let executor = ChartExecutor::with_provider(provider, &AiConfig::ollama());

    match executor.render("t").await.error() {
        Some(ChartError::ProviderFailure { detail }) => assert!(detail.contains("refused")),
        other => panic!("Expected ProviderFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_call_is_execution_fault() {
    let result = executor()
        .render_code("t", "import \"os\" as os;\nplt.plot([1], [1]);")
        .await;
    assert!(!result.is_success());
    assert!(matches!(result.error(), Some(ChartError::ExecutionFault { .. })));
}

#[tokio::test]
async fn failed_render_leaves_no_state_behind() {
    let executor = executor();

    // Draws, then fails: the partial figure must be discarded
    let failed = executor
        .render_code("a", "plt.plot([1, 2, 3], [4, 5, 6]);\nthrow \"boom\";")
        .await;
    assert!(execution_detail(failed.error()).contains("boom"));

    let next = executor.render_code("b", "plt.title(\"Only a title\");").await;
    assert_eq!(next.error(), Some(&ChartError::NoVisualElement));
}

#[tokio::test]
async fn sequential_renders_are_independent() {
    let executor = executor();

    let first = executor
        .render_code("a", "plt.subplot(1, 2, 1); plt.plot([1, 2], [1, 2]); plt.subplot(1, 2, 2); plt.bar([\"x\"], [3]);")
        .await;
    let second = executor.render_code("b", "plt.pie([60, 40], [\"AI\", \"Manual\"]);").await;

    assert_eq!(first.figure().unwrap().axes.len(), 2);
    let figure = second.figure().unwrap();
    assert_eq!(figure.axes.len(), 1);
    assert_eq!(figure.element_count(), 1);
    assert_eq!(figure.axes[0].series[0].kind, SeriesKind::Pie);
}

#[tokio::test]
async fn concurrent_renders_are_serialized() {
    let executor = executor();

    let line = "for i in 0..200 { let x = i * 2; }\nplt.plot([1, 2, 3], [1, 4, 9]); plt.title(\"Line\");";
    let scatter = "plt.scatter([1, 2, 3], [3, 2, 1]); plt.title(\"Scatter\");";

    let (a, b) = tokio::join!(
        executor.render_code("line", line),
        executor.render_code("scatter", scatter)
    );

    let a = a.figure().expect("line chart");
    let b = b.figure().expect("scatter chart");
    assert_eq!(a.element_count(), 1);
    assert_eq!(b.element_count(), 1);
    assert_eq!(a.axes[0].series[0].kind, SeriesKind::Line);
    assert_eq!(b.axes[0].series[0].kind, SeriesKind::Scatter);
    assert_eq!(a.headline(), Some("Line"));
    assert_eq!(b.headline(), Some("Scatter"));
}

#[tokio::test]
async fn runaway_loop_hits_operation_limit() {
    let mut config = AiConfig::ollama();
    config.script_limits.max_operations = 10_000;
    let executor = ChartExecutor::with_provider(Arc::new(MockProvider::new()), &config);

    let result = executor
        .render_code("t", "let x = 0;\nloop { x += 1; }")
        .await;

    assert!(execution_detail(result.error()).contains("resource limit exceeded"));

    // The executor keeps working after a limit fault
    assert!(executor
        .render_code("t", "plt.plot([1, 2], [2, 1]);")
        .await
        .is_success());
}

#[tokio::test]
async fn length_mismatch_is_execution_fault() {
    let result = executor()
        .render_code("t", "plt.plot([1, 2, 3], [1, 2]);")
        .await;
    assert!(execution_detail(result.error()).contains("plot"));
}

#[tokio::test]
async fn oversized_subplot_grid_is_execution_fault() {
    let executor = executor();
    let result = executor
        .render_code("t", "plt.subplot(9223372036854775807, 2, 1); plt.plot([1], [1]);")
        .await;

    let detail = execution_detail(result.error());
    assert!(detail.contains("subplot"));
    assert!(!detail.contains("chart worker failed"));

    assert!(executor
        .render_code("t", "plt.plot([1, 2], [2, 1]);")
        .await
        .is_success());
}

#[tokio::test]
async fn histogram_bins_are_bounded() {
    let mut config = AiConfig::ollama();
    config.script_limits.max_array_size = 10;
    let executor = ChartExecutor::with_provider(Arc::new(MockProvider::new()), &config);

    let result = executor
        .render_code("t", "plt.hist([1.0, 2.0], 20000000);")
        .await;
    assert!(execution_detail(result.error()).contains("hist"));
}
