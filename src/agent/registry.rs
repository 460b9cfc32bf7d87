//! Agent registry
//!
//! The four agent profiles of a planning run, built once from configuration
//! and passed explicitly to the flow. Building the registry is also where
//! missing credentials are caught, before any model or tool is called.

use crate::core::{Config, Credential, Credentials, Result, SectionKey};
use crate::tools::{names, ToolRegistry};

/// The agent roles of a planning run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    /// Landmarks, attractions and visitor information, with pictures
    DestinationResearcher,
    /// Events matching the traveller's interests during the trip
    EventsResearcher,
    /// Flights and weather
    TravelAgent,
    /// Merges the four sections into the final report
    ReportWriter,
}

impl AgentRole {
    pub const ALL: [AgentRole; 4] = [
        AgentRole::DestinationResearcher,
        AgentRole::EventsResearcher,
        AgentRole::TravelAgent,
        AgentRole::ReportWriter,
    ];

    /// The role that researches a section
    pub fn for_section(section: SectionKey) -> Self {
        match section {
            SectionKey::Destination => AgentRole::DestinationResearcher,
            SectionKey::Events => AgentRole::EventsResearcher,
            SectionKey::Weather | SectionKey::Flights => AgentRole::TravelAgent,
        }
    }

    fn index(self) -> usize {
        match self {
            AgentRole::DestinationResearcher => 0,
            AgentRole::EventsResearcher => 1,
            AgentRole::TravelAgent => 2,
            AgentRole::ReportWriter => 3,
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AgentRole::DestinationResearcher => "destination_researcher",
            AgentRole::EventsResearcher => "events_researcher",
            AgentRole::TravelAgent => "travel_agent",
            AgentRole::ReportWriter => "report_writer",
        };
        f.write_str(name)
    }
}

/// Everything needed to run one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub role: AgentRole,
    /// Human-readable role name
    pub label: String,
    pub goal: String,
    /// Character traits given to the model
    pub persona: String,
    /// Model reference passed to the LLM provider
    pub model: String,
    /// Registered tool names this agent may call
    pub tools: Vec<String>,
}

impl AgentProfile {
    /// System message for this agent
    pub fn system_prompt(&self) -> String {
        let tools = if self.tools.is_empty() {
            "You have no tools. Work only from the material you are given.".to_string()
        } else {
            format!(
                "Call your tools ({}) to gather facts before answering. \
                 When you have enough material, answer without calling a tool.",
                self.tools.join(", ")
            )
        };

        format!(
            "You are the {}.\nGoal: {}.\nYou are {}.\n\n{}",
            self.label, self.goal, self.persona, tools
        )
    }
}

/// The agent profiles for one planning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRegistry {
    profiles: [AgentProfile; 4],
}

fn profile(role: AgentRole, label: &str, goal: &str, persona: &str, model: &str, tools: &[&str]) -> AgentProfile {
    AgentProfile {
        role,
        label: label.to_string(),
        goal: goal.to_string(),
        persona: persona.to_string(),
        model: model.to_string(),
        tools: tools.iter().map(|t| t.to_string()).collect(),
    }
}

impl AgentRegistry {
    /// Profiles from configuration, without checking credentials
    pub fn profiles_from_config(config: &Config) -> Self {
        let research = config.models.research.as_str();

        Self {
            profiles: [
                profile(
                    AgentRole::DestinationResearcher,
                    "Web Research Agent",
                    "research destinations and find relevant images",
                    "diligent, thorough, comprehensive and visual-focused",
                    research,
                    &[names::WEB_SEARCH, names::WIKI_ARTICLES, names::SEARCH_IMAGES],
                ),
                profile(
                    AgentRole::EventsResearcher,
                    "Events Research Agent",
                    "find events and activities that match the traveller's interests",
                    "diligent, accurate, up to date and visual-focused",
                    research,
                    &[names::WEB_SEARCH, names::SEARCH_IMAGES],
                ),
                profile(
                    AgentRole::TravelAgent,
                    "Travel Agent",
                    "assist travellers with flights and weather",
                    "friendly, hardworking and detailed when reporting back to users",
                    research,
                    &[names::SEARCH_FLIGHTS, names::WEATHER_FORECAST],
                ),
                profile(
                    AgentRole::ReportWriter,
                    "Travel Report Agent",
                    "write comprehensive travel reports with visual elements",
                    "friendly, hardworking, visual-oriented and detailed in reporting",
                    &config.models.report,
                    &[],
                ),
            ],
        }
    }

    /// Build the registry, failing when any needed credential is missing
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        let registry = Self::profiles_from_config(config);
        credentials.ensure(&registry.required_credentials(config))?;

        tracing::debug!(
            research_model = %config.models.research,
            report_model = %config.models.report,
            "Agent registry ready"
        );
        Ok(registry)
    }

    pub fn profile(&self, role: AgentRole) -> &AgentProfile {
        &self.profiles[role.index()]
    }

    /// The profile that researches a section
    pub fn for_section(&self, section: SectionKey) -> &AgentProfile {
        self.profile(AgentRole::for_section(section))
    }

    pub fn profiles(&self) -> impl Iterator<Item = &AgentProfile> {
        self.profiles.iter()
    }

    /// Distinct tool names across all profiles, in first-use order
    pub fn required_tools(&self) -> Vec<&str> {
        let mut tools: Vec<&str> = Vec::new();
        for tool in self.profiles.iter().flat_map(|p| p.tools.iter()) {
            if !tools.contains(&tool.as_str()) {
                tools.push(tool.as_str());
            }
        }
        tools
    }

    /// The LLM key plus every credential a profile's tools need
    pub fn required_credentials(&self, config: &Config) -> Vec<Credential> {
        let mut required = vec![Credential::Groq];
        for tool in self.required_tools() {
            for cred in ToolRegistry::required_credentials(tool, config) {
                if !required.contains(&cred) {
                    required.push(cred);
                }
            }
        }
        required
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ImageProvider;
    use crate::core::RihlaError;

    fn all_credentials() -> Credentials {
        Credentials::from_lookup(|_| Some("key".to_string()))
    }

    #[test]
    fn test_roles_and_tools() {
        let registry = AgentRegistry::from_config(&Config::default(), &all_credentials()).unwrap();

        let destination = registry.for_section(SectionKey::Destination);
        assert_eq!(destination.role, AgentRole::DestinationResearcher);
        assert_eq!(
            destination.tools,
            vec!["web_search", "wiki_articles", "search_images"]
        );

        assert_eq!(
            registry.for_section(SectionKey::Weather),
            registry.for_section(SectionKey::Flights)
        );
        assert!(registry.profile(AgentRole::ReportWriter).tools.is_empty());
        assert_eq!(registry.required_tools().len(), 5);
    }

    #[test]
    fn test_models_per_role() {
        let mut config = Config::default();
        config.models.research = "small".to_string();
        config.models.report = "large".to_string();
        let registry = AgentRegistry::profiles_from_config(&config);

        assert_eq!(registry.profile(AgentRole::EventsResearcher).model, "small");
        assert_eq!(registry.profile(AgentRole::TravelAgent).model, "small");
        assert_eq!(registry.profile(AgentRole::ReportWriter).model, "large");
    }

    #[test]
    fn test_building_twice_is_equal() {
        let config = Config::default();
        let creds = all_credentials();
        assert_eq!(
            AgentRegistry::from_config(&config, &creds).unwrap(),
            AgentRegistry::from_config(&config, &creds).unwrap()
        );
    }

    #[test]
    fn test_missing_credentials_listed_together() {
        let mut config = Config::default();
        config.tools.image_provider = ImageProvider::Pexels;
        let creds = Credentials::from_lookup(|name| {
            (name == "GROQ_API_KEY" || name == "SERPER_API_KEY").then(|| "key".to_string())
        });

        match AgentRegistry::from_config(&config, &creds).unwrap_err() {
            RihlaError::MissingCredentials(missing) => assert_eq!(
                missing,
                vec![
                    "PEXELS_API_KEY",
                    "AMADEUS_API_KEY",
                    "AMADEUS_API_SECRET",
                    "WEATHER_API_KEY"
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wikipedia_images_need_no_key() {
        let mut config = Config::default();
        config.tools.image_provider = ImageProvider::Wikipedia;
        let creds = Credentials::from_lookup(|name| (name != "PEXELS_API_KEY").then(|| "key".to_string()));
        assert!(AgentRegistry::from_config(&config, &creds).is_ok());
    }

    #[test]
    fn test_system_prompt_mentions_tools() {
        let registry = AgentRegistry::profiles_from_config(&Config::default());
        let prompt = registry.profile(AgentRole::TravelAgent).system_prompt();
        assert!(prompt.contains("Travel Agent"));
        assert!(prompt.contains("search_flights, weather_forecast"));
        assert!(registry
            .profile(AgentRole::ReportWriter)
            .system_prompt()
            .contains("no tools"));
    }
}
