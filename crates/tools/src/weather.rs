//! Weather tool — current conditions plus watering advice.
//!
//! Calls the OpenWeatherMap current-weather endpoint and derives a
//! watering recommendation from temperature, humidity, and conditions.
//! An unconfigured key or a provider outage produces a failed ToolResult
//! with a readable message; the loop turns that into an observation the
//! model can work around.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

use verdant_core::error::ToolError;
use verdant_core::message::UserId;
use verdant_core::tool::{Tool, ToolResult};

pub struct WeatherTool {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl WeatherTool {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Get current weather for a location, with watering advice based \
         on the conditions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City name, e.g. 'Jakarta' or 'New York'"
                }
            },
            "required": ["location"]
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(12)
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
        _user: &UserId,
    ) -> Result<ToolResult, ToolError> {
        let location = arguments["location"]
            .as_str()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments {
                tool_name: "weather".into(),
                reason: "missing 'location'".into(),
            })?;

        let Some(api_key) = &self.api_key else {
            return Ok(ToolResult::failure(
                "The weather provider is not configured (no API key set).",
            ));
        };

        let url = format!("{}/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", location), ("appid", api_key.as_str()), ("units", "metric")])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(location, error = %e, "Weather request failed");
                return Ok(ToolResult::failure(format!(
                    "Could not reach the weather provider for {location}: {e}"
                )));
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Ok(ToolResult::failure(format!(
                "Could not retrieve weather for {location} (status {status}). \
                 Please check the location name."
            )));
        }

        let body: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                return Ok(ToolResult::failure(format!(
                    "Weather data for {location} could not be parsed: {e}"
                )));
            }
        };

        match parse_report(location, &body) {
            Ok(report) => {
                let output = report.render();
                let data = serde_json::to_value(&report).ok();
                Ok(ToolResult::ok(output, data))
            }
            Err(reason) => Ok(ToolResult::failure(format!(
                "Weather data format error for {location}: {reason}"
            ))),
        }
    }
}

/// Parsed current-weather data.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    pub location: String,
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub humidity: u64,
    pub conditions: String,
    pub wind_speed: f64,
}

impl WeatherReport {
    /// Human-readable summary plus watering advice.
    pub fn render(&self) -> String {
        format!(
            "Weather in {}:\n\
             Temperature: {:.1}°C (feels like {:.1}°C)\n\
             Conditions: {}\n\
             Humidity: {}%\n\
             Wind: {:.1} m/s\n\n{}",
            self.location,
            self.temp_c,
            self.feels_like_c,
            self.conditions,
            self.humidity,
            self.wind_speed,
            self.watering_advice()
        )
    }

    /// Watering recommendation derived from the conditions.
    pub fn watering_advice(&self) -> &'static str {
        let rainy = ["rain", "drizzle", "thunderstorm"]
            .iter()
            .any(|w| self.conditions.to_lowercase().contains(w));
        if rainy {
            "Rain expected - you can skip watering today."
        } else if self.humidity < 40 || self.temp_c > 30.0 {
            "Plants may need extra watering due to dry/hot conditions."
        } else {
            "Good conditions for regular watering schedule."
        }
    }
}

/// Extract a report from an OpenWeatherMap current-weather payload.
pub fn parse_report(location: &str, body: &serde_json::Value) -> Result<WeatherReport, String> {
    let main = body
        .get("main")
        .ok_or_else(|| "missing 'main' section".to_string())?;
    let temp_c = main["temp"].as_f64().ok_or("missing temperature")?;
    let feels_like_c = main["feels_like"].as_f64().unwrap_or(temp_c);
    let humidity = main["humidity"].as_u64().ok_or("missing humidity")?;
    let conditions = body["weather"][0]["description"]
        .as_str()
        .unwrap_or("unknown")
        .to_string();
    let wind_speed = body["wind"]["speed"].as_f64().unwrap_or(0.0);

    Ok(WeatherReport {
        location: location.to_string(),
        temp_c,
        feels_like_c,
        humidity,
        conditions,
        wind_speed,
    })
}
