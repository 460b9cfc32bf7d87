//! Interactive trip form
//!
//! Fills in the trip fields that were not passed as flags by asking on the
//! terminal. Reader and writer are generic so the form can be driven from
//! tests.

use std::io::{BufRead, Write};

use crate::core::{Result, RihlaError, TripRequest};

/// Trip fields gathered so far
#[derive(Debug, Clone, Default)]
pub struct TripForm {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub dates: Vec<String>,
    pub interests: Option<String>,
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

/// Print `label`, read one line; `None` on end of input
fn ask(input: &mut impl BufRead, output: &mut impl Write, label: &str) -> Result<Option<String>> {
    write!(output, "{}: ", label)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

impl TripForm {
    /// Fields still missing, by their prompt name
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if blank(&self.origin) {
            missing.push("departure city");
        }
        if blank(&self.destination) {
            missing.push("destination city");
        }
        if self.dates.is_empty() {
            missing.push("travel dates");
        }
        missing
    }

    /// Validate without prompting
    pub fn into_request(self) -> Result<TripRequest> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(RihlaError::validation(format!(
                "please fill in all required fields: {}",
                missing.join(", ")
            )));
        }

        let dates = TripRequest::parse_dates(&self.dates)?;
        TripRequest::new(
            self.origin.unwrap_or_default(),
            self.destination.unwrap_or_default(),
            dates,
            self.interests.unwrap_or_default(),
        )
    }

    /// Ask for every missing field, re-asking while an answer is unusable
    pub fn complete(mut self, input: &mut impl BufRead, output: &mut impl Write) -> Result<TripRequest> {
        let ended = || RihlaError::validation("input ended before the trip was complete");

        while blank(&self.origin) {
            self.origin = Some(ask(input, output, "Departure city")?.ok_or_else(ended)?);
        }
        while blank(&self.destination) {
            self.destination = Some(ask(input, output, "Destination city")?.ok_or_else(ended)?);
        }

        loop {
            if !self.dates.is_empty() {
                match TripRequest::parse_dates(&self.dates) {
                    Ok(_) => break,
                    Err(e) => {
                        writeln!(output, "{}", e)?;
                        self.dates.clear();
                    }
                }
            }
            let line = ask(input, output, "Travel dates (YYYY-MM-DD, comma separated)")?.ok_or_else(ended)?;
            self.dates = line
                .split(',')
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
        }

        if self.interests.is_none() {
            let line = ask(input, output, "Your interests (museums, food, walking...)")?;
            self.interests = Some(line.unwrap_or_default());
        }

        self.into_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_complete_asks_missing_fields() {
        let form = TripForm {
            origin: Some("Cairo".to_string()),
            ..Default::default()
        };
        let mut input = Cursor::new("Paris\nnot-a-date\n2025-06-03, 2025-06-01\nmuseums\n");
        let mut output = Vec::new();

        let trip = form.complete(&mut input, &mut output).unwrap();
        assert_eq!(trip.destination(), "Paris");
        assert_eq!(trip.dates_label(), "2025-06-01, 2025-06-03");
        assert_eq!(trip.interests(), "museums");

        let shown = String::from_utf8(output).unwrap();
        assert!(!shown.contains("Departure city"));
        assert!(shown.contains("invalid date 'not-a-date'"));
    }

    #[test]
    fn test_end_of_input_is_validation_error() {
        let mut input = Cursor::new("Cairo\n");
        let err = TripForm::default()
            .complete(&mut input, &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Validation);
    }

    #[test]
    fn test_into_request_lists_missing() {
        let err = TripForm {
            destination: Some("Paris".to_string()),
            ..Default::default()
        }
        .into_request()
        .unwrap_err();
        assert!(err.to_string().contains("departure city, travel dates"));
    }
}
