//! Task prompts for the research and report agents
//!
//! Every builder is a pure function of its inputs: the same trip always
//! produces the same prompt text.

use chrono::NaiveDate;

use crate::core::SectionKey;
use crate::research::SectionOutcome;

/// Context and instruction handed to one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPrompt {
    /// Facts about the trip (or the research to merge)
    pub context: String,
    /// What to produce and how to format it
    pub instruction: String,
}

impl TaskPrompt {
    /// Single user message combining context and instruction
    pub fn to_message(&self) -> String {
        format!("{}\n\n## Task\n{}", self.context, self.instruction)
    }
}

/// Order in which sections are laid out for the report writer
pub const REPORT_ORDER: [SectionKey; 4] = [
    SectionKey::Flights,
    SectionKey::Weather,
    SectionKey::Destination,
    SectionKey::Events,
];

const IMAGE_RULES: &str = "\
- Make sure that the query to the image tool is in English even if the traveller wrote in another language
- Ensure image links start with http:// or https://
- Format images as: ![Description](https://full-image-url)";

/// ISO-8601 dates joined by `, `
pub fn format_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn language_rule(language: &str) -> String {
    format!("- **Important**: Write the entire response in {}.", language)
}

fn or_none(interests: &str) -> &str {
    if interests.trim().is_empty() {
        "no particular interests"
    } else {
        interests
    }
}

pub fn destination_prompt(destination: &str, interests: &str, language: &str) -> TaskPrompt {
    let interests = or_none(interests);
    TaskPrompt {
        context: format!("User Destination: {}\nUser Interests: {}", destination, interests),
        instruction: format!(
            "Research and generate a comprehensive travel report about {destination}.\n\
             - Use the image search tool to find 4-5 high-quality images of major landmarks\n\
             {IMAGE_RULES}\n\
             - Add a short caption below each image\n\
             - Research attractions and activities related to: {interests}\n\
             - Organize the report with clear sections and headings\n\
             - Place images naturally in the content where relevant\n\
             - Include practical visitor information\n\
             - Format the entire response in clean Markdown\n\
             {language}",
            destination = destination,
            IMAGE_RULES = IMAGE_RULES,
            interests = interests,
            language = language_rule(language),
        ),
    }
}

pub fn events_prompt(destination: &str, dates: &[NaiveDate], interests: &str, language: &str) -> TaskPrompt {
    let dates = format_dates(dates);
    let interests = or_none(interests);
    TaskPrompt {
        context: format!(
            "Destination: {}\nDates: {}\nInterests: {}",
            destination, dates, interests
        ),
        instruction: format!(
            "Search for events happening in {destination} during {dates} that match the following interests: {interests}.\n\n\
             For each event, include:\n\
             - Event name\n\
             - Date and time\n\
             - Venue/location\n\
             - Ticket information (if available)\n\
             - A short description of the event\n\
             {IMAGE_RULES}\n\
             - Format event images as: ![Event Name](https://full-image-url)\n\
             - Ensure the information is accurate and up-to-date\n\
             - Place images naturally throughout the content where relevant\n\
             - Format the entire response in clean Markdown\n\
             {language}",
            destination = destination,
            dates = dates,
            interests = interests,
            IMAGE_RULES = IMAGE_RULES,
            language = language_rule(language),
        ),
    }
}

pub fn weather_prompt(destination: &str, dates: &[NaiveDate], language: &str) -> TaskPrompt {
    TaskPrompt {
        context: format!("Destination: {}\nDates: {}", destination, format_dates(dates)),
        instruction: format!(
            "Provide detailed weather information for the given destination and dates, including:\n\
             1. Temperature ranges\n\
             2. Precipitation chances\n\
             3. General weather patterns\n\
             4. Recommended clothing and gear\n\n\
             Respond entirely in {}.",
            language
        ),
    }
}

pub fn flights_prompt(origin: &str, destination: &str, dates: &[NaiveDate], language: &str) -> TaskPrompt {
    TaskPrompt {
        context: format!(
            "Flights from {} to {} on {}",
            origin,
            destination,
            format_dates(dates)
        ),
        instruction: format!(
            "Find the top 3 affordable and convenient flight options.\n\
             Use IATA airport or city codes when calling the flight search tool.\n\
             Provide concise bullet-point information for each.\n\
             Include airline, departure and arrival times, duration, and price if available.\n\
             Respond entirely in {}.",
            language
        ),
    }
}

fn report_heading(section: SectionKey) -> &'static str {
    match section {
        SectionKey::Flights => "Flight Report",
        SectionKey::Weather => "Weather Report",
        SectionKey::Destination => "Destination Report",
        SectionKey::Events => "Events Report",
    }
}

/// Synthesis prompt; every section body appears verbatim, failed ones as a placeholder
pub fn report_prompt(sections: &[SectionOutcome], language: &str) -> TaskPrompt {
    let context = REPORT_ORDER
        .iter()
        .map(|key| {
            let body = match sections.iter().find(|s| s.section == *key) {
                Some(SectionOutcome { result: Ok(report), .. }) => report.body.clone(),
                Some(SectionOutcome { result: Err(e), .. }) => {
                    format!("[section unavailable: {}]", e)
                }
                None => "[section unavailable: not researched]".to_string(),
            };
            format!("## {}\n{}", report_heading(*key), body)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    TaskPrompt {
        context,
        instruction: format!(
            "Create a comprehensive travel report that includes the following:\n\
             1. Retain all images from the destination and events reports.\n\
             2. Organize the information clearly and logically.\n\
             3. Maintain all markdown formatting.\n\
             4. Ensure images are displayed correctly with captions.\n\
             5. Include all essential details from each section.\n\
             6. Where a section is unavailable, say so briefly and continue.\n\n\
             Respond entirely in {}.",
            language
        ),
    }
}
