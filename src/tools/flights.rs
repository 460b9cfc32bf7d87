//! Flight offer search through the Amadeus self-service API
//!
//! Authentication is an OAuth2 client-credentials exchange; the access token
//! is cached until shortly before it expires.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::core::{Config, Result, RihlaError, ToolCall, ToolCategory, ToolDefinition, ToolResult};
use crate::tools::http::{build_client, check_status};
use crate::tools::registry::{names, Tool};

/// Seconds shaved off the advertised token lifetime
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 30;

/// Amadeus flight search tool
pub struct FlightSearchTool {
    client: Client,
    base_url: String,
    client_id: SecretString,
    client_secret: SecretString,
    max_offers: u32,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<FlightOffer>,
}

#[derive(Debug, Deserialize)]
struct FlightOffer {
    price: Price,
    #[serde(default)]
    itineraries: Vec<Itinerary>,
}

#[derive(Debug, Deserialize)]
struct Price {
    total: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    #[serde(default)]
    duration: String,
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Segment {
    departure: Endpoint,
    arrival: Endpoint,
    carrier_code: String,
    #[serde(default)]
    number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Endpoint {
    iata_code: String,
    at: String,
}

impl FlightSearchTool {
    pub fn new(
        base_url: impl Into<String>,
        client_id: SecretString,
        client_secret: SecretString,
        max_offers: u32,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            max_offers,
            token: Mutex::new(None),
        })
    }

    pub fn from_config(config: &Config, client_id: SecretString, client_secret: SecretString) -> Result<Self> {
        Self::new(
            &config.tools.amadeus_url,
            client_id,
            client_secret,
            config.tools.max_flight_offers,
            Duration::from_secs(config.tools.timeout_secs),
        )
    }

    /// Get a valid access token, refreshing it when needed
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("Requesting Amadeus access token");
        let response = self
            .client
            .post(format!("{}/v1/security/oauth2/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.expose_secret()),
                ("client_secret", self.client_secret.expose_secret()),
            ])
            .send()
            .await?;
        let response = check_status("amadeus", response).await?;
        let token: TokenResponse = response.json().await?;

        let lifetime = token.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
        *guard = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });

        Ok(token.access_token)
    }

    fn format_offers(origin: &str, destination: &str, offers: &[FlightOffer]) -> String {
        if offers.is_empty() {
            return format!("No flight offers found from {} to {}.", origin, destination);
        }

        let mut output = format!("Flight offers from {} to {}:\n", origin, destination);
        for (i, offer) in offers.iter().enumerate() {
            output.push_str(&format!(
                "\nOffer {}: {} {}\n",
                i + 1,
                offer.price.total,
                offer.price.currency
            ));
            for (leg, itinerary) in offers_legs(offer) {
                output.push_str(&format!("  {} (duration {}):\n", leg, itinerary.duration));
                for segment in &itinerary.segments {
                    output.push_str(&format!(
                        "    {}{} {} {} -> {} {}\n",
                        segment.carrier_code,
                        segment.number,
                        segment.departure.iata_code,
                        segment.departure.at,
                        segment.arrival.iata_code,
                        segment.arrival.at
                    ));
                }
            }
        }
        output
    }
}

fn offers_legs(offer: &FlightOffer) -> impl Iterator<Item = (&'static str, &Itinerary)> {
    offer
        .itineraries
        .iter()
        .enumerate()
        .map(|(i, it)| (if i == 0 { "Outbound" } else { "Return" }, it))
}

fn is_iata_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

#[async_trait]
impl Tool for FlightSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            names::SEARCH_FLIGHTS,
            "Search flight offers between two cities. Codes are IATA city or airport codes (e.g. CAI, PAR).",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "origin": {
                        "type": "string",
                        "description": "IATA code of the departure city or airport"
                    },
                    "destination": {
                        "type": "string",
                        "description": "IATA code of the arrival city or airport"
                    },
                    "departure_date": {
                        "type": "string",
                        "description": "Departure date, YYYY-MM-DD"
                    },
                    "return_date": {
                        "type": "string",
                        "description": "Return date, YYYY-MM-DD (optional)"
                    },
                    "adults": {
                        "type": "integer",
                        "description": "Number of adult travellers (default 1)"
                    }
                },
                "required": ["origin", "destination", "departure_date"]
            }),
        )
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Flights
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let origin = call.require_string("origin")?.to_uppercase();
        let destination = call.require_string("destination")?.to_uppercase();
        let departure = call.require_string("departure_date")?;
        let return_date = call.get_string("return_date");
        let adults = call.get_u32("adults").unwrap_or(1).max(1);

        for code in [&origin, &destination] {
            if !is_iata_code(code) {
                return Err(RihlaError::validation(format!(
                    "'{}' is not an IATA code; use a three-letter city or airport code",
                    code
                )));
            }
        }

        let token = self.access_token().await?;

        let mut query: Vec<(&str, String)> = vec![
            ("originLocationCode", origin.clone()),
            ("destinationLocationCode", destination.clone()),
            ("departureDate", departure),
            ("adults", adults.to_string()),
            ("max", self.max_offers.to_string()),
        ];
        if let Some(ret) = return_date {
            query.push(("returnDate", ret));
        }

        let response = self
            .client
            .get(format!("{}/v2/shopping/flight-offers", self.base_url))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;
        let response = check_status("amadeus", response).await?;

        let mut offers: OffersResponse = response.json().await?;
        offers.data.truncate(self.max_offers as usize);
        tracing::debug!(%origin, %destination, offers = offers.data.len(), "Flight search finished");

        Ok(ToolResult::success(
            names::SEARCH_FLIGHTS,
            Self::format_offers(&origin, &destination, &offers.data),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool_for(server: &MockServer) -> FlightSearchTool {
        FlightSearchTool::new(
            server.uri(),
            SecretString::from("id".to_string()),
            SecretString::from("secret".to_string()),
            3,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_flights_reuses_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/security/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok", "expires_in": 1799
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/shopping/flight-offers"))
            .and(header("authorization", "Bearer tok"))
            .and(query_param("originLocationCode", "CAI"))
            .and(query_param("destinationLocationCode", "PAR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "price": {"total": "412.50", "currency": "EUR"},
                    "itineraries": [{
                        "duration": "PT4H55M",
                        "segments": [{
                            "departure": {"iataCode": "CAI", "at": "2025-12-20T09:10:00"},
                            "arrival": {"iataCode": "CDG", "at": "2025-12-20T13:05:00"},
                            "carrierCode": "MS",
                            "number": "799"
                        }]
                    }]
                }]
            })))
            .mount(&server)
            .await;

        let tool = tool_for(&server);
        let call = ToolCall::new(
            "search_flights",
            json!({"origin": "cai", "destination": "PAR", "departure_date": "2025-12-20"}),
        );
        let first = tool.execute(&call).await.unwrap();
        tool.execute(&call).await.unwrap();

        assert!(first.output.contains("412.50 EUR"));
        assert!(first.output.contains("MS799 CAI 2025-12-20T09:10:00 -> CDG"));
    }

    #[tokio::test]
    async fn test_rejects_city_names() {
        let server = MockServer::start().await;
        let err = tool_for(&server)
            .execute(&ToolCall::new(
                "search_flights",
                json!({"origin": "Cairo", "destination": "PAR", "departure_date": "2025-12-20"}),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Validation);
    }

    #[test]
    fn test_no_offers_message() {
        assert_eq!(
            FlightSearchTool::format_offers("CAI", "PAR", &[]),
            "No flight offers found from CAI to PAR."
        );
    }
}
