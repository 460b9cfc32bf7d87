//! End-to-end planning flow tests
//!
//! Runs the full flow against an in-process LLM that answers per section,
//! and once against a mocked OpenAI-compatible endpoint.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use rihla::agent::{AgentRegistry, AgentRunner};
use rihla::core::config::FlowConfig;
use rihla::core::{Config, Message, Result, RihlaError, SectionKey, ToolDefinition, TripRequest};
use rihla::llm::{GenerateOptions, GroqClient, LLMProvider, LLMResponse};
use rihla::render::present::render_outcome;
use rihla::render::ImageNormalizer;
use rihla::research::{FlowState, PlanningFlow};
use rihla::tools::ToolRegistry;

const RESEARCH_MODEL: &str = "research-model";
const REPORT_MODEL: &str = "report-model";

/// One recorded model call
#[derive(Debug, Clone)]
struct Call {
    model: String,
    prompt: String,
}

/// Answers each task with a marker naming its section
struct TravelLlm {
    fail_flights: bool,
    calls: Mutex<Vec<Call>>,
}

impl TravelLlm {
    fn new(fail_flights: bool) -> Arc<Self> {
        Arc::new(Self {
            fail_flights,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, model: &str, prompt: &str) -> Result<LLMResponse> {
        let body = if prompt.contains("## Flight Report") {
            "FINAL-PLAN ![Eiffel Tower](//cdn.example/eiffel.jpg)".to_string()
        } else if prompt.contains("User Destination:") {
            "DESTINATION-REPORT ![Louvre](upload.example/louvre.png)".to_string()
        } else if prompt.contains("Search for events") {
            "EVENTS-REPORT".to_string()
        } else if prompt.contains("weather information") {
            "WEATHER-REPORT".to_string()
        } else if prompt.contains("Flights from") {
            if self.fail_flights {
                return Err(RihlaError::provider_status("amadeus", 503, "service unavailable"));
            }
            "FLIGHTS-REPORT".to_string()
        } else {
            return Err(RihlaError::provider("travel-llm", "unexpected prompt"));
        };
        Ok(LLMResponse::text(model, body))
    }
}

#[async_trait]
impl LLMProvider for TravelLlm {
    async fn chat(&self, model: &str, messages: &[Message], _options: Option<GenerateOptions>) -> Result<LLMResponse> {
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.calls.lock().unwrap().push(Call {
            model: model.to_string(),
            prompt: prompt.clone(),
        });
        self.answer(model, &prompt)
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        _tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.chat(model, messages, options).await
    }

    fn name(&self) -> &str {
        "travel-llm"
    }
}

fn config(parallel: bool) -> Config {
    let mut config = Config::default();
    config.models.research = RESEARCH_MODEL.to_string();
    config.models.report = REPORT_MODEL.to_string();
    config.flow = FlowConfig {
        parallel,
        section_timeout_secs: 60,
    };
    config
}

fn flow(config: &Config, llm: Arc<dyn LLMProvider>) -> PlanningFlow {
    PlanningFlow::new(
        AgentRegistry::profiles_from_config(config),
        AgentRunner::new(llm, Arc::new(ToolRegistry::new()), 3),
        ImageNormalizer::scheme_only(),
        &config.flow,
        "Arabic",
    )
}

fn cairo_to_paris() -> TripRequest {
    let dates = TripRequest::parse_dates(&["2025-06-01", "2025-06-04"]).unwrap();
    TripRequest::new("Cairo", "Paris", dates, "museums, food").unwrap()
}

#[tokio::test]
async fn test_cairo_to_paris_researches_four_sections_then_synthesizes_once() {
    let llm = TravelLlm::new(false);
    let config = config(true);
    let mut flow = flow(&config, llm.clone());

    let outcome = flow.run(cairo_to_paris()).await.unwrap();
    assert_eq!(flow.state(), FlowState::Presenting);
    assert_eq!(outcome.succeeded(), 4);

    let calls = llm.calls();
    assert_eq!(calls.len(), 5);

    let research: Vec<&Call> = calls.iter().filter(|c| c.model == RESEARCH_MODEL).collect();
    assert_eq!(research.len(), 4);
    for marker in ["User Destination:", "Search for events", "weather information", "Flights from"] {
        assert_eq!(
            research.iter().filter(|c| c.prompt.contains(marker)).count(),
            1,
            "expected exactly one research call for '{}'",
            marker
        );
    }

    let synthesis: Vec<&Call> = calls.iter().filter(|c| c.model == REPORT_MODEL).collect();
    assert_eq!(synthesis.len(), 1);
    for body in ["FLIGHTS-REPORT", "WEATHER-REPORT", "EVENTS-REPORT"] {
        assert!(synthesis[0].prompt.contains(body));
    }
    // Reports reach synthesis already normalized
    assert!(synthesis[0]
        .prompt
        .contains("DESTINATION-REPORT ![Louvre](https://upload.example/louvre.png)"));

    let report = outcome.final_report.unwrap();
    assert_eq!(report.destination, "Paris");
    assert_eq!(report.body, "FINAL-PLAN ![Eiffel Tower](https://cdn.example/eiffel.jpg)");
}

#[tokio::test]
async fn test_flights_failure_is_shown_inline() {
    let llm = TravelLlm::new(true);
    let config = config(true);
    let mut flow = flow(&config, llm.clone());

    let outcome = flow.run(cairo_to_paris()).await.unwrap();
    assert_eq!(outcome.succeeded(), 3);

    let flights = outcome.section(SectionKey::Flights).unwrap();
    let err = flights.result.as_ref().unwrap_err();
    assert!(err.to_string().contains("flights section"));
    assert!(err.is_retryable());

    for key in [SectionKey::Destination, SectionKey::Events, SectionKey::Weather] {
        assert!(outcome.section(key).unwrap().result.is_ok());
    }

    let synthesis = llm
        .calls()
        .into_iter()
        .find(|c| c.model == REPORT_MODEL)
        .unwrap();
    assert!(synthesis.prompt.contains("[section unavailable: flights section"));
    assert!(outcome.final_report.is_ok());

    let text = render_outcome(&outcome);
    assert!(text.contains("✈️ Flight Options"));
    assert!(text.contains("⚠️ Error: flights section"));
    assert!(text.contains("WEATHER-REPORT"));
}

#[tokio::test]
async fn test_sequential_flow_keeps_canonical_order() {
    let llm = TravelLlm::new(false);
    let config = config(false);
    let mut flow = flow(&config, llm.clone());

    let outcome = flow.run(cairo_to_paris()).await.unwrap();
    let order: Vec<SectionKey> = outcome.sections.iter().map(|s| s.section).collect();
    assert_eq!(order, SectionKey::ALL.to_vec());

    let calls = llm.calls();
    assert!(calls[0].prompt.contains("User Destination:"));
    assert!(calls[1].prompt.contains("Search for events"));
    assert!(calls[2].prompt.contains("weather information"));
    assert!(calls[3].prompt.contains("Flights from"));
    assert_eq!(calls[4].model, REPORT_MODEL);
}

#[tokio::test]
async fn test_flow_over_openai_compatible_endpoint() {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer gsk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "research-model",
            "choices": [{"message": {"role": "assistant", "content": "Bonjour ![Seine](img.example/seine.webp)"}}]
        })))
        .expect(5)
        .mount(&server)
        .await;

    let client = GroqClient::new(
        server.uri(),
        secrecy::SecretString::from("gsk-test".to_string()),
        std::time::Duration::from_secs(10),
    )
    .unwrap();

    let config = config(true);
    let mut flow = flow(&config, Arc::new(client));
    let outcome = flow.run(cairo_to_paris()).await.unwrap();

    assert_eq!(outcome.succeeded(), 4);
    assert_eq!(
        outcome.final_report.unwrap().body,
        "Bonjour ![Seine](https://img.example/seine.webp)"
    );
}
