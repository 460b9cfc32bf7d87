//! Terminal presentation of a planning run

use crate::research::{PlanOutcome, SectionOutcome};

const RULE: &str = "─────────────────────────────";

fn section_block(outcome: &SectionOutcome) -> String {
    let body = match &outcome.result {
        Ok(report) => report.body.trim().to_string(),
        Err(e) => format!("⚠️ Error: {}", e),
    };
    format!("## {}\n{}\n\n{}\n", outcome.section.title(), RULE, body)
}

/// Render the whole run: trip header, every section in order, then the plan
pub fn render_outcome(outcome: &PlanOutcome) -> String {
    let request = &outcome.request;
    let mut out = format!(
        "# ✈️ {} → {}\nDates: {}\n",
        request.origin(),
        request.destination(),
        request.dates_label()
    );
    if !request.interests().is_empty() {
        out.push_str(&format!("Interests: {}\n", request.interests()));
    }
    out.push('\n');

    for section in &outcome.sections {
        out.push_str(&section_block(section));
        out.push('\n');
    }

    out.push_str(&format!("## 🗺️ Travel Plan\n{}\n\n", RULE));
    match &outcome.final_report {
        Ok(report) => out.push_str(report.body.trim()),
        Err(e) => out.push_str(&format!("⚠️ Error: {}", e)),
    }
    out.push('\n');
    out
}

/// Print the run to stdout
pub fn print_outcome(outcome: &PlanOutcome) {
    println!("{}", render_outcome(outcome));
}
