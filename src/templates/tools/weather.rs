// SPDX-License-Identifier: MIT

use super::tool_schema;
use crate::adk::error::{AdkError, Result};
use crate::adk::tool::{Tool, ToolOutput};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

static WEATHER_SCHEMA: Lazy<Value> = Lazy::new(tool_schema::<WeatherArgs>);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Celsius,
    Fahrenheit,
}

impl Units {
    fn as_str(self) -> &'static str {
        match self {
            Units::Celsius => "celsius",
            Units::Fahrenheit => "fahrenheit",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WeatherArgs {
    /// The name of the city
    pub city: String,
    /// Temperature units (celsius or fahrenheit)
    #[serde(default)]
    pub units: Units,
}

/// Mock weather lookup for a handful of cities
pub struct GetWeatherTool;

impl GetWeatherTool {
    fn lookup(city: &str) -> Option<(i32, &'static str)> {
        match city.to_lowercase().as_str() {
            "paris" => Some((15, "cloudy")),
            "london" => Some((12, "rainy")),
            "new york" => Some((20, "sunny")),
            "tokyo" => Some((18, "partly cloudy")),
            _ => None,
        }
    }

    pub fn report(args: &WeatherArgs) -> Value {
        let Some((celsius, condition)) = Self::lookup(&args.city) else {
            return json!({
                "status": "error",
                "city": args.city,
                "message": format!("Weather information not available for {}", args.city),
            });
        };

        let temperature = match args.units {
            Units::Celsius => celsius.to_string(),
            Units::Fahrenheit => format!("{:?}", f64::from(celsius) * 9.0 / 5.0 + 32.0),
        };

        json!({
            "status": "success",
            "city": args.city,
            "temperature": temperature,
            "units": args.units.as_str(),
            "condition": condition,
        })
    }
}

#[async_trait]
impl Tool for GetWeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather information for a city."
    }

    fn schema(&self) -> &Value {
        &WEATHER_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let args: WeatherArgs = serde_json::from_value(input)
            .map_err(|e| AdkError::tool(self.name(), format!("invalid arguments: {}", e)))?;
        log::debug!("Weather lookup for {}", args.city);
        Ok(Self::report(&args).into())
    }
}
