//! Planning flow
//!
//! Drives one planning run: four independent research sections, then a
//! single synthesis call that merges whatever succeeded. Sections run
//! concurrently on a `JoinSet` unless the flow is configured to run them
//! one after another; results are always reported in canonical order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::agent::{AgentProfile, AgentRegistry, AgentRole, AgentRunner};
use crate::core::config::FlowConfig;
use crate::core::{
    Config, Credentials, FinalReport, ResearchReport, Result, RihlaError, SectionKey, TripRequest,
};
use crate::llm::LLMProvider;
use crate::render::ImageNormalizer;
use crate::research::prompts::{self, TaskPrompt};
use crate::tools::ToolRegistry;

/// Lifecycle of a planning run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    CollectingInput,
    Researching,
    Synthesizing,
    Presenting,
    Done,
}

impl FlowState {
    /// Whether `next` may follow this state
    pub fn can_advance_to(self, next: FlowState) -> bool {
        use FlowState::*;
        matches!(
            (self, next),
            (CollectingInput, Researching)
                | (Researching, Synthesizing)
                | (Researching, Done)
                | (Synthesizing, Presenting)
                | (Synthesizing, Done)
                | (Presenting, Done)
        )
    }
}

/// Result of one research section
#[derive(Debug)]
pub struct SectionOutcome {
    pub section: SectionKey,
    pub result: Result<ResearchReport>,
}

/// Everything a planning run produced
#[derive(Debug)]
pub struct PlanOutcome {
    pub request: TripRequest,
    /// One entry per section, in canonical order
    pub sections: Vec<SectionOutcome>,
    pub final_report: Result<FinalReport>,
}

impl PlanOutcome {
    pub fn section(&self, key: SectionKey) -> Option<&SectionOutcome> {
        self.sections.iter().find(|s| s.section == key)
    }

    /// Number of sections that produced a report
    pub fn succeeded(&self) -> usize {
        self.sections.iter().filter(|s| s.result.is_ok()).count()
    }
}

/// Orchestrates research and synthesis for one trip
pub struct PlanningFlow {
    agents: AgentRegistry,
    runner: AgentRunner,
    normalizer: ImageNormalizer,
    language: String,
    parallel: bool,
    section_timeout: Duration,
    state: FlowState,
}

impl PlanningFlow {
    pub fn new(
        agents: AgentRegistry,
        runner: AgentRunner,
        normalizer: ImageNormalizer,
        flow: &FlowConfig,
        language: impl Into<String>,
    ) -> Self {
        Self {
            agents,
            runner,
            normalizer,
            language: language.into(),
            parallel: flow.parallel,
            section_timeout: Duration::from_secs(flow.section_timeout_secs),
            state: FlowState::CollectingInput,
        }
    }

    /// Wire the flow from configuration
    ///
    /// Fails before any network call when a credential is missing.
    pub fn from_config(config: &Config, credentials: &Credentials, llm: Arc<dyn LLMProvider>) -> Result<Self> {
        let agents = AgentRegistry::from_config(config, credentials)?;
        let tools = ToolRegistry::from_config(config, credentials, &agents.required_tools())?;
        let runner = AgentRunner::from_config(config, llm, Arc::new(tools));
        let normalizer = ImageNormalizer::from_config(config)?;

        Ok(Self::new(agents, runner, normalizer, &config.flow, config.report.language.clone()))
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    fn advance(&mut self, next: FlowState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(RihlaError::validation(format!(
                "planning flow cannot move from {:?} to {:?}",
                self.state, next
            )));
        }
        tracing::debug!(from = ?self.state, to = ?next, "Flow state change");
        self.state = next;
        Ok(())
    }

    /// Mark presentation as complete
    pub fn finish(&mut self) -> Result<()> {
        if self.state == FlowState::Done {
            return Ok(());
        }
        self.advance(FlowState::Done)
    }

    /// Task prompt for one research section
    pub fn section_prompt(&self, request: &TripRequest, section: SectionKey) -> TaskPrompt {
        let language = self.language.as_str();
        match section {
            SectionKey::Destination => {
                prompts::destination_prompt(request.destination(), request.interests(), language)
            }
            SectionKey::Events => prompts::events_prompt(
                request.destination(),
                request.travel_dates(),
                request.interests(),
                language,
            ),
            SectionKey::Weather => {
                prompts::weather_prompt(request.destination(), request.travel_dates(), language)
            }
            SectionKey::Flights => prompts::flights_prompt(
                request.origin(),
                request.destination(),
                request.travel_dates(),
                language,
            ),
        }
    }

    /// Research all sections, then synthesize the final report
    ///
    /// Section failures are recorded in the outcome. The flow ends in
    /// `Presenting` when a final report exists and in `Done` otherwise.
    pub async fn run(&mut self, request: TripRequest) -> Result<PlanOutcome> {
        self.advance(FlowState::Researching)?;
        tracing::info!(
            origin = request.origin(),
            destination = request.destination(),
            dates = %request.dates_label(),
            parallel = self.parallel,
            "Planning started"
        );

        let sections = if self.parallel {
            self.research_parallel(&request).await
        } else {
            self.research_sequential(&request).await
        };

        let succeeded = sections.iter().filter(|s| s.result.is_ok()).count();
        if succeeded == 0 {
            tracing::error!("Every research section failed, skipping synthesis");
            self.advance(FlowState::Done)?;
            return Ok(PlanOutcome {
                request,
                sections,
                final_report: Err(RihlaError::provider("research", "no research section succeeded")),
            });
        }

        self.advance(FlowState::Synthesizing)?;
        let final_report = self.synthesize(&request, &sections).await;

        match &final_report {
            Ok(_) => self.advance(FlowState::Presenting)?,
            Err(e) => {
                tracing::error!(error = %e, "Synthesis failed");
                self.advance(FlowState::Done)?;
            }
        }

        tracing::info!(succeeded, synthesized = final_report.is_ok(), "Planning finished");
        Ok(PlanOutcome {
            request,
            sections,
            final_report,
        })
    }

    fn section_job(&self, request: &TripRequest, section: SectionKey) -> SectionJob {
        SectionJob {
            section,
            profile: self.agents.for_section(section).clone(),
            prompt: self.section_prompt(request, section),
            runner: self.runner.clone(),
            normalizer: self.normalizer.clone(),
            timeout: self.section_timeout,
        }
    }

    async fn research_parallel(&self, request: &TripRequest) -> Vec<SectionOutcome> {
        let mut set = JoinSet::new();
        for section in SectionKey::ALL {
            let job = self.section_job(request, section);
            set.spawn(job.run());
        }

        let mut done: HashMap<SectionKey, SectionOutcome> = HashMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcome) => {
                    done.insert(outcome.section, outcome);
                }
                Err(e) => tracing::error!(error = %e, "Research task aborted"),
            }
        }

        SectionKey::ALL
            .iter()
            .map(|key| {
                done.remove(key).unwrap_or_else(|| SectionOutcome {
                    section: *key,
                    result: Err(RihlaError::provider("research", format!("{} task aborted", key))),
                })
            })
            .collect()
    }

    async fn research_sequential(&self, request: &TripRequest) -> Vec<SectionOutcome> {
        let mut outcomes = Vec::with_capacity(SectionKey::ALL.len());
        for section in SectionKey::ALL {
            outcomes.push(self.section_job(request, section).run().await);
        }
        outcomes
    }

    async fn synthesize(&self, request: &TripRequest, sections: &[SectionOutcome]) -> Result<FinalReport> {
        let writer = self.agents.profile(AgentRole::ReportWriter);
        let prompt = prompts::report_prompt(sections, &self.language);

        let body = tokio::time::timeout(self.section_timeout, self.runner.run(writer, &prompt))
            .await
            .map_err(|_| RihlaError::Timeout {
                what: "report synthesis".to_string(),
                secs: self.section_timeout.as_secs(),
            })??;

        let normalized = self.normalizer.normalize(&body).await;
        Ok(FinalReport {
            destination: request.destination().to_string(),
            body: normalized.text,
        })
    }
}

/// One research section, owned so it can run on its own task
struct SectionJob {
    section: SectionKey,
    profile: AgentProfile,
    prompt: TaskPrompt,
    runner: AgentRunner,
    normalizer: ImageNormalizer,
    timeout: Duration,
}

impl SectionJob {
    async fn run(self) -> SectionOutcome {
        let section = self.section;
        let result = match tokio::time::timeout(self.timeout, self.runner.run(&self.profile, &self.prompt)).await {
            Ok(Ok(body)) => {
                let normalized = self.normalizer.normalize(&body).await;
                Ok(ResearchReport {
                    section,
                    body: normalized.text,
                })
            }
            Ok(Err(e)) => Err(RihlaError::with_context(format!("{} section", section), e)),
            Err(_) => Err(RihlaError::Timeout {
                what: format!("{} section", section),
                secs: self.timeout.as_secs(),
            }),
        };

        match &result {
            Ok(_) => tracing::info!(%section, "Section researched"),
            Err(e) => tracing::warn!(%section, error = %e, "Section failed"),
        }
        SectionOutcome { section, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Message;
    use crate::core::ToolDefinition;
    use crate::llm::{GenerateOptions, LLMResponse};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    /// Answers every research task; fails or stalls on request
    struct StubLlm {
        fail_all: bool,
        stall_weather: bool,
    }

    #[async_trait]
    impl LLMProvider for StubLlm {
        async fn chat(&self, model: &str, messages: &[Message], _o: Option<GenerateOptions>) -> Result<LLMResponse> {
            let prompt = &messages[messages.len() - 1].content;
            if self.stall_weather && prompt.contains("weather information") {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.fail_all && !prompt.contains("## Flight Report") {
                return Err(RihlaError::provider_status("stub", 500, "down"));
            }
            Ok(LLMResponse::text(model, "report ![pic](//img.example/a.png)"))
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
            "stub"
        }
    }

    fn flow(llm: StubLlm, parallel: bool, timeout_secs: u64) -> PlanningFlow {
        let config = Config::default();
        let runner = AgentRunner::new(Arc::new(llm), Arc::new(ToolRegistry::new()), 2);
        PlanningFlow::new(
            AgentRegistry::profiles_from_config(&config),
            runner,
            ImageNormalizer::scheme_only(),
            &FlowConfig {
                parallel,
                section_timeout_secs: timeout_secs,
            },
            "Arabic",
        )
    }

    fn request() -> TripRequest {
        TripRequest::new(
            "Cairo",
            "Paris",
            vec![NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()],
            "museums",
        )
        .unwrap()
    }

    #[test]
    fn test_state_transitions() {
        assert!(FlowState::CollectingInput.can_advance_to(FlowState::Researching));
        assert!(FlowState::Synthesizing.can_advance_to(FlowState::Presenting));
        assert!(!FlowState::Researching.can_advance_to(FlowState::Presenting));
        assert!(!FlowState::Done.can_advance_to(FlowState::Researching));
    }

    #[tokio::test]
    async fn test_sequential_run_normalizes_reports() {
        let mut flow = flow(
            StubLlm {
                fail_all: false,
                stall_weather: false,
            },
            false,
            60,
        );
        let outcome = flow.run(request()).await.unwrap();

        assert_eq!(flow.state(), FlowState::Presenting);
        let order: Vec<SectionKey> = outcome.sections.iter().map(|s| s.section).collect();
        assert_eq!(order, SectionKey::ALL.to_vec());

        let destination = outcome.section(SectionKey::Destination).unwrap();
        assert!(destination
            .result
            .as_ref()
            .unwrap()
            .body
            .contains("![pic](https://img.example/a.png)"));

        let report = outcome.final_report.unwrap();
        assert_eq!(report.destination, "Paris");
        assert!(report.body.contains("https://img.example/a.png"));

        flow.finish().unwrap();
        assert_eq!(flow.state(), FlowState::Done);
    }

    #[tokio::test]
    async fn test_all_sections_failed_skips_synthesis() {
        let mut flow = flow(
            StubLlm {
                fail_all: true,
                stall_weather: false,
            },
            true,
            60,
        );
        let outcome = flow.run(request()).await.unwrap();

        assert_eq!(outcome.succeeded(), 0);
        assert_eq!(flow.state(), FlowState::Done);
        let err = outcome.final_report.unwrap_err();
        assert!(err.to_string().contains("no research section succeeded"));
    }

    #[tokio::test]
    async fn test_section_timeout() {
        let mut flow = flow(
            StubLlm {
                fail_all: false,
                stall_weather: true,
            },
            true,
            1,
        );
        let outcome = flow.run(request()).await.unwrap();

        let weather = outcome.section(SectionKey::Weather).unwrap();
        match weather.result.as_ref().unwrap_err() {
            RihlaError::Timeout { what, secs } => {
                assert_eq!(what, "weather section");
                assert_eq!(*secs, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(outcome.succeeded(), 3);
        assert!(outcome.final_report.is_ok());
    }

    #[tokio::test]
    async fn test_flow_runs_once() {
        let mut flow = flow(
            StubLlm {
                fail_all: false,
                stall_weather: false,
            },
            true,
            60,
        );
        flow.run(request()).await.unwrap();
        assert!(flow.run(request()).await.is_err());
    }
}
