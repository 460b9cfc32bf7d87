//! CLI commands
//!
//! Handlers behind `rihla plan` and `rihla config`.

use std::io;
use std::sync::Arc;

use crate::agent::AgentRegistry;
use crate::cli::{ConfigAction, PlanArgs, TripForm};
use crate::core::{Config, Credentials, Result, RihlaError, TripRequest};
use crate::llm::{GroqClient, LLMProvider};
use crate::render::present::print_outcome;
use crate::render::Exporter;
use crate::research::PlanningFlow;

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(config: &mut Config, args: &PlanArgs) {
    if args.sequential {
        config.flow.parallel = false;
    }
    if let Some(strategy) = args.image_strategy {
        config.images.strategy = strategy;
    }
    if !args.formats.is_empty() {
        config.export.formats = args.formats.clone();
    }
    if args.no_export {
        config.export.formats.clear();
    }
    if let Some(ref dir) = args.output_dir {
        config.export.output_dir = dir.clone();
    }
}

/// Trip request from flags, asking on stdin for anything missing
pub fn collect_request(args: &PlanArgs) -> Result<TripRequest> {
    let form = TripForm {
        origin: args.origin.clone(),
        destination: args.destination.clone(),
        dates: args.dates.clone(),
        interests: args.interests.clone(),
    };

    if args.no_input || (form.missing().is_empty() && form.interests.is_some()) {
        return form.into_request();
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    println!("📝 Trip details");
    form.complete(&mut input, &mut output)
}

/// Run a planning session; returns whether a final report was produced
pub async fn plan(args: PlanArgs, mut config: Config) -> Result<bool> {
    apply_overrides(&mut config, &args);

    let credentials = Credentials::from_env();
    // Report every missing key at once, before the LLM client asks for its own
    credentials.ensure(&AgentRegistry::profiles_from_config(&config).required_credentials(&config))?;

    let llm: Arc<dyn LLMProvider> = Arc::new(GroqClient::from_config(&config, &credentials)?);
    let mut flow = PlanningFlow::from_config(&config, &credentials, llm)?;

    let request = collect_request(&args)?;
    println!("🎈 Planning your trip to {}...\n", request.destination());

    let outcome = flow.run(request).await?;
    print_outcome(&outcome);

    let report = match &outcome.final_report {
        Ok(report) => report,
        Err(_) => return Ok(false),
    };

    let exporter = Exporter::from_config(&config);
    for (format, result) in exporter.export_all(report).await {
        match result {
            Ok(path) => println!("📥 Saved {:?} to {}", format, path.display()),
            Err(e) => eprintln!("⚠️ Could not export {:?}: {}", format, e),
        }
    }

    flow.finish()?;
    Ok(true)
}

/// Handle `rihla config <action>`
pub fn config(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let text = toml::to_string_pretty(config)
                .map_err(|e| RihlaError::config(format!("Failed to serialize config: {}", e)))?;
            println!("# {}\n{}", Config::config_file().display(), text);
        }
        ConfigAction::Init { force } => {
            let path = Config::config_file();
            if path.exists() && !force {
                return Err(RihlaError::config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            let path = Config::default().save()?;
            println!("Wrote {}", path.display());
        }
        ConfigAction::Path => println!("{}", Config::config_file().display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ExportFormat, ImageStrategy};
    use std::path::PathBuf;

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        let args = PlanArgs {
            sequential: true,
            image_strategy: Some(ImageStrategy::SchemeOnly),
            formats: vec![ExportFormat::Html],
            output_dir: Some(PathBuf::from("out")),
            ..Default::default()
        };
        apply_overrides(&mut config, &args);

        assert!(!config.flow.parallel);
        assert_eq!(config.images.strategy, ImageStrategy::SchemeOnly);
        assert_eq!(config.export.formats, vec![ExportFormat::Html]);
        assert_eq!(config.export.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_no_export_clears_formats() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            &PlanArgs {
                no_export: true,
                ..Default::default()
            },
        );
        assert!(config.export.formats.is_empty());
    }

    #[test]
    fn test_no_input_requires_flags() {
        let args = PlanArgs {
            origin: Some("Cairo".to_string()),
            no_input: true,
            ..Default::default()
        };
        let err = collect_request(&args).unwrap_err();
        assert!(err.to_string().contains("destination city"));
    }

    #[test]
    fn test_full_flags_skip_prompt() {
        let args = PlanArgs {
            origin: Some("Cairo".to_string()),
            destination: Some("Paris".to_string()),
            dates: vec!["2025-06-01".to_string()],
            interests: Some("food".to_string()),
            ..Default::default()
        };
        let trip = collect_request(&args).unwrap();
        assert_eq!(trip.origin(), "Cairo");
    }
}
