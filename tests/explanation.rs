//! Explanation Service Integration Tests
//!
//! Drives the public explanation API against the scripted mock provider.

use std::sync::Arc;
use std::time::Duration;

use healthlens::ai::provider::MockProvider;
use healthlens::ai::{AudienceNote, PromptBuilder, ResponseParser};
use healthlens::{
    AiConfig, AudienceProfile, EducationLevel, ExplanationService, GenerationError, Tone,
};

fn service(provider: Arc<MockProvider>) -> ExplanationService {
    ExplanationService::with_provider(provider, &AiConfig::ollama())
}

#[tokio::test]
async fn explanation_has_body_and_subtopics() {
    let provider = Arc::new(MockProvider::new());
    provider
        .add_response(
            "Wearables track heart rhythm around the clock.\n\
             Algorithms flag irregular beats for a doctor to review.\n\
             \n\
             - Atrial fibrillation detection\n\
             - Battery life and data gaps\n",
        )
        .await;

    let result = service(provider)
        .explain("How do smartwatches help cardiology?", &AudienceProfile::default())
        .await
        .unwrap();

    assert_eq!(
        result.body(),
        "Wearables track heart rhythm around the clock. Algorithms flag irregular beats for a doctor to review."
    );
    assert_eq!(
        result.subtopics(),
        vec!["Atrial fibrillation detection", "Battery life and data gaps"]
    );
    assert_eq!(result.metadata.provider, "Mock");
}

#[tokio::test]
async fn extra_subtopics_are_truncated_to_three() {
    let provider = Arc::new(MockProvider::new());
    provider
        .add_response("Body.\n- One\n- Two\n- Three\n- Four\n- Five")
        .await;

    let result = service(provider)
        .explain("q", &AudienceProfile::default())
        .await
        .unwrap();

    assert_eq!(result.subtopics(), vec!["One", "Two", "Three"]);
}

#[tokio::test]
async fn no_bullets_means_no_subtopics() {
    let provider = Arc::new(MockProvider::new());
    provider
        .add_response("A single paragraph with no follow-ups.")
        .await;

    let result = service(provider)
        .explain("q", &AudienceProfile::default())
        .await
        .unwrap();

    assert_eq!(result.body(), "A single paragraph with no follow-ups.");
    assert!(result.subtopics().is_empty());
}

#[tokio::test]
async fn empty_answer_is_empty_response() {
    let provider = Arc::new(MockProvider::new());
    provider.add_response("   \n\n").await;

    let err = service(provider)
        .explain("q", &AudienceProfile::default())
        .await
        .unwrap_err();

    assert_eq!(err, GenerationError::EmptyResponse);
}

#[tokio::test]
async fn provider_failure_is_typed() {
    let provider = Arc::new(MockProvider::new());
    provider.add_failure("HTTP 429: rate limited").await;

    let err = service(provider)
        .explain("q", &AudienceProfile::default())
        .await
        .unwrap_err();

    match err {
        GenerationError::Provider { detail } => assert!(detail.contains("429")),
        other => panic!("Expected Provider, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_provider_is_timeout() {
    let provider = Arc::new(MockProvider::new().with_delay(500));
    let service = service(provider).with_timeout(Duration::from_millis(20));

    let err = service
        .explain("q", &AudienceProfile::default())
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Timeout { millis: 20 }));
    let stats = service.stats().await;
    assert_eq!(stats.timeouts, 1);
}

#[tokio::test]
async fn request_carries_tone_and_audience_note() {
    let provider = Arc::new(MockProvider::new());
    let audience = AudienceProfile::new(14, EducationLevel::Secondary, Tone::Technical);

    service(provider.clone())
        .explain("How does AI read X-rays?", &audience)
        .await
        .unwrap();

    let request = provider.last_request().await.unwrap();
    let system = request.system_prompt().unwrap();
    assert!(system.contains(Tone::Technical.instruction()));
    assert!(system.contains(AudienceNote::ChildOrTeen.instruction()));
    assert!((request.temperature - 0.7).abs() < f32::EPSILON);
}

#[test]
fn audience_rules_apply_in_priority_order() {
    // Age under 16 wins over education
    assert_eq!(
        AudienceNote::select(12, EducationLevel::PhD),
        AudienceNote::ChildOrTeen
    );
    // Young with school education
    assert_eq!(
        AudienceNote::select(20, EducationLevel::Secondary),
        AudienceNote::YoungSchool
    );
    // Young with a degree falls through to the advanced rule
    assert_eq!(
        AudienceNote::select(20, EducationLevel::University),
        AudienceNote::Advanced
    );
    assert_eq!(
        AudienceNote::select(40, EducationLevel::Primary),
        AudienceNote::Default
    );
    // Boundaries
    assert_eq!(
        AudienceNote::select(16, EducationLevel::Primary),
        AudienceNote::YoungSchool
    );
    assert_eq!(
        AudienceNote::select(25, EducationLevel::Secondary),
        AudienceNote::Default
    );
}

#[test]
fn tone_does_not_change_audience_note() {
    for tone in [Tone::Informative, Tone::Technical] {
        let audience = AudienceProfile::new(12, EducationLevel::PhD, tone);
        let prompt = PromptBuilder::new().build("q", &audience);
        assert!(prompt.system.contains(AudienceNote::ChildOrTeen.instruction()));
        assert!(prompt.system.contains(tone.instruction()));
    }
}

#[test]
fn parser_accepts_what_the_prompt_asks_for() {
    let prompt = PromptBuilder::new().build("q", &AudienceProfile::default());
    assert!(prompt.system.contains("- "));

    let result = ResponseParser::parse("Body text.\n- First\n• Second");
    assert_eq!(result.subtopics(), vec!["First", "Second"]);
}
