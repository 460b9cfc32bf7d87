//! Weather forecasts through WeatherAPI.com

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::core::{Config, Result, ToolCall, ToolCategory, ToolDefinition, ToolResult};
use crate::tools::http::{build_client, check_status};
use crate::tools::registry::{names, Tool};

/// WeatherAPI.com caps free forecasts at 14 days
const MAX_FORECAST_DAYS: u32 = 14;

/// Weather forecast tool
pub struct WeatherTool {
    client: Client,
    base_url: String,
    api_key: SecretString,
    default_days: u32,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    location: Location,
    current: Option<Current>,
    forecast: Forecast,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    #[serde(default)]
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    date: String,
    day: Day,
}

#[derive(Debug, Deserialize)]
struct Day {
    maxtemp_c: f64,
    mintemp_c: f64,
    #[serde(default)]
    daily_chance_of_rain: f64,
    condition: Condition,
}

impl WeatherTool {
    pub fn new(base_url: impl Into<String>, api_key: SecretString, default_days: u32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            default_days,
        })
    }

    pub fn from_config(config: &Config, api_key: SecretString) -> Result<Self> {
        Self::new(
            &config.tools.weather_url,
            api_key,
            config.tools.forecast_days,
            Duration::from_secs(config.tools.timeout_secs),
        )
    }

    fn format_forecast(forecast: &ForecastResponse) -> String {
        let mut output = format!(
            "Weather for {}, {}:\n",
            forecast.location.name, forecast.location.country
        );

        if let Some(current) = &forecast.current {
            output.push_str(&format!(
                "Now: {:.0}°C, {}\n",
                current.temp_c, current.condition.text
            ));
        }

        for day in &forecast.forecast.forecastday {
            output.push_str(&format!(
                "{}: {:.0}°C to {:.0}°C, {}, {:.0}% chance of rain\n",
                day.date, day.day.mintemp_c, day.day.maxtemp_c, day.day.condition.text, day.day.daily_chance_of_rain
            ));
        }
        output
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            names::WEATHER_FORECAST,
            "Get the current weather and a daily forecast for a city",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "City name in English"
                    },
                    "days": {
                        "type": "integer",
                        "description": "Number of forecast days (1-14)"
                    }
                },
                "required": ["location"]
            }),
        )
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Weather
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let location = call.require_string("location")?;
        let days = call
            .get_u32("days")
            .unwrap_or(self.default_days)
            .clamp(1, MAX_FORECAST_DAYS);

        let response = self
            .client
            .get(format!("{}/v1/forecast.json", self.base_url))
            .query(&[
                ("key", self.api_key.expose_secret().to_string()),
                ("q", location.clone()),
                ("days", days.to_string()),
            ])
            .send()
            .await?;
        let response = check_status("weatherapi", response).await?;

        let forecast: ForecastResponse = response.json().await?;
        tracing::debug!(%location, days = forecast.forecast.forecastday.len(), "Weather forecast fetched");

        Ok(ToolResult::success(
            names::WEATHER_FORECAST,
            Self::format_forecast(&forecast),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_forecast_is_clamped_and_formatted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .and(query_param("q", "Paris"))
            .and(query_param("days", "14"))
            .and(query_param("key", "wkey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": {"name": "Paris", "country": "France"},
                "current": {"temp_c": 6.2, "condition": {"text": "Overcast"}},
                "forecast": {"forecastday": [{
                    "date": "2025-12-20",
                    "day": {
                        "maxtemp_c": 8.0, "mintemp_c": 2.4,
                        "daily_chance_of_rain": 70,
                        "condition": {"text": "Light rain"}
                    }
                }]}
            })))
            .mount(&server)
            .await;

        let tool = WeatherTool::new(
            server.uri(),
            SecretString::from("wkey".to_string()),
            10,
            Duration::from_secs(5),
        )
        .unwrap();
        let result = tool
            .execute(&ToolCall::new(
                "weather_forecast",
                json!({"location": "Paris", "days": 30}),
            ))
            .await
            .unwrap();

        assert!(result.output.starts_with("Weather for Paris, France"));
        assert!(result.output.contains("Now: 6°C, Overcast"));
        assert!(result.output.contains("2025-12-20: 2°C to 8°C, Light rain, 70% chance of rain"));
    }

    #[tokio::test]
    async fn test_bad_key_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .respond_with(ResponseTemplate::new(401).set_body_string("API key is invalid"))
            .mount(&server)
            .await;

        let tool = WeatherTool::new(
            server.uri(),
            SecretString::from("bad".to_string()),
            3,
            Duration::from_secs(5),
        )
        .unwrap();
        let err = tool
            .execute(&ToolCall::new("weather_forecast", json!({"location": "Paris"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Upstream);
        assert!(!err.is_retryable());
    }
}
