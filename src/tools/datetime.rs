//! Date and time tool.
//!
//! Reports the current local date and time in machine-readable ISO fields
//! plus a human-readable Italian form, matching the assistant's locale.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local};
use serde_json::{json, Value};

use crate::error::Result;

use super::Tool;

const WEEKDAYS_IT: [&str; 7] = [
    "Lunedì",
    "Martedì",
    "Mercoledì",
    "Giovedì",
    "Venerdì",
    "Sabato",
    "Domenica",
];

const MONTHS_IT: [&str; 12] = [
    "Gennaio",
    "Febbraio",
    "Marzo",
    "Aprile",
    "Maggio",
    "Giugno",
    "Luglio",
    "Agosto",
    "Settembre",
    "Ottobre",
    "Novembre",
    "Dicembre",
];

/// Current local date/time.
pub struct DateTimeTool;

impl DateTimeTool {
    fn payload(now: DateTime<Local>) -> Value {
        let weekday = WEEKDAYS_IT[now.weekday().num_days_from_monday() as usize];
        let month = MONTHS_IT[now.month0() as usize];

        json!({
            "success": true,
            "date_iso": now.format("%Y-%m-%d").to_string(),
            "time_iso": now.format("%H:%M:%S").to_string(),
            "datetime_iso": now.to_rfc3339(),
            "day_of_week": weekday,
            "formatted": format!("{} {} {} {}", weekday, now.day(), month, now.year()),
            "timestamp": now.timestamp()
        })
    }
}

#[async_trait]
impl Tool for DateTimeTool {
    fn name(&self) -> &str {
        "get_datetime"
    }

    fn description(&self) -> &str {
        "Get the current date and time. Use this when the user asks what day \
         or time it is, what day of the week a computation should start from, \
         or anything else that needs the present moment as a reference."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value) -> Result<String> {
        Ok(Self::payload(Local::now()).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_payload_fields() {
        // Thursday 2025-08-07, 14:30:05 local time
        let now = Local.with_ymd_and_hms(2025, 8, 7, 14, 30, 5).unwrap();
        let payload = DateTimeTool::payload(now);

        assert_eq!(payload["success"], true);
        assert_eq!(payload["date_iso"], "2025-08-07");
        assert_eq!(payload["time_iso"], "14:30:05");
        assert_eq!(payload["day_of_week"], "Giovedì");
        assert_eq!(payload["formatted"], "Giovedì 7 Agosto 2025");
        assert_eq!(payload["timestamp"], now.timestamp());
        assert!(payload["datetime_iso"]
            .as_str()
            .unwrap()
            .starts_with("2025-08-07T14:30:05"));
    }

    #[test]
    fn test_weekday_table_wraps_sunday() {
        let sunday = Local.with_ymd_and_hms(2025, 8, 10, 9, 0, 0).unwrap();
        let payload = DateTimeTool::payload(sunday);
        assert_eq!(payload["day_of_week"], "Domenica");
    }

    #[tokio::test]
    async fn test_execute_returns_success() {
        let output = DateTimeTool.execute(json!({})).await.unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["success"], true);
        assert!(parsed["timestamp"].is_i64());
    }

    #[test]
    fn test_schema_has_no_required_parameters() {
        let schema = DateTimeTool.input_schema();
        assert!(schema["required"].as_array().unwrap().is_empty());
    }
}
