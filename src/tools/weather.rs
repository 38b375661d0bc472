//! Weather lookup tool.
//!
//! Fetches current conditions for a city from WeatherAPI.com. Without a
//! configured API key the tool returns clearly marked simulated data, so
//! the agent remains demonstrable offline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;

use super::Tool;

const WEATHER_API_URL: &str = "http://api.weatherapi.com/v1/current.json";

/// Current-conditions lookup backed by WeatherAPI.com.
pub struct WeatherTool {
    api_key: Option<String>,
    client: Client,
}

impl WeatherTool {
    /// Create a new weather tool. `api_key` of `None` enables simulated mode.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    location: WeatherLocation,
    current: WeatherCurrent,
}

#[derive(Debug, Deserialize)]
struct WeatherLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WeatherCurrent {
    temp_c: f64,
    feelslike_c: f64,
    condition: WeatherCondition,
    humidity: u32,
    wind_kph: f64,
    last_updated: String,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WeatherErrorResponse {
    error: WeatherErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WeatherErrorDetail {
    message: String,
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather conditions for a city: temperature, sky condition, \
         humidity, and wind. Use this when the user asks what the weather is \
         like, how warm or cold it is, or whether it is raining somewhere."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City name (e.g. 'Roma', 'Milano', 'New York')"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let city = args.get("city").and_then(Value::as_str).unwrap_or_default();

        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                return Ok(json!({
                    "success": true,
                    "city": city,
                    "temperature_c": 18,
                    "condition": "Partly cloudy",
                    "humidity": 65,
                    "wind_kph": 12,
                    "note": "Simulated data. Configure a WeatherAPI.com key for live conditions."
                })
                .to_string());
            }
        };

        let response = match self
            .client
            .get(WEATHER_API_URL)
            .query(&[("key", api_key.as_str()), ("q", city), ("lang", "it")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return Ok(json!({
                    "success": false,
                    "error": format!("weather request failed: {}", e)
                })
                .to_string());
            }
        };

        let body = response.text().await.unwrap_or_default();

        // WeatherAPI reports failures (unknown city, bad key) as an error
        // object; surface its message to the model.
        if let Ok(err) = serde_json::from_str::<WeatherErrorResponse>(&body) {
            return Ok(json!({
                "success": false,
                "error": err.error.message
            })
            .to_string());
        }

        match serde_json::from_str::<WeatherResponse>(&body) {
            Ok(data) => Ok(json!({
                "success": true,
                "city": data.location.name,
                "country": data.location.country,
                "temperature_c": data.current.temp_c,
                "feels_like_c": data.current.feelslike_c,
                "condition": data.current.condition.text,
                "humidity": data.current.humidity,
                "wind_kph": data.current.wind_kph,
                "last_updated": data.current.last_updated
            })
            .to_string()),
            Err(e) => Ok(json!({
                "success": false,
                "error": format!("unexpected weather response: {}", e)
            })
            .to_string()),
        }
    }
}
