use reqwest::{header, Client, Error as ReqwestError};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Custom error type for Moonraker API operations.
#[derive(Debug)]
pub enum MoonrakerError {
    /// Error during HTTP request (e.g., network issues, printer offline).
    HttpRequestError(ReqwestError),
    /// Error deserializing the response payload from JSON.
    DeserializationError(serde_json::Error),
    /// The response was missing an expected field.
    MissingData(String),
}

impl Display for MoonrakerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MoonrakerError::HttpRequestError(e) => write!(f, "HTTP request error: {}", e),
            MoonrakerError::DeserializationError(e) => write!(f, "JSON deserialization error: {}", e),
            MoonrakerError::MissingData(path) => write!(f, "Moonraker response missing '{}'", path),
        }
    }
}

impl std::error::Error for MoonrakerError {}

impl From<ReqwestError> for MoonrakerError {
    fn from(err: ReqwestError) -> Self {
        MoonrakerError::HttpRequestError(err)
    }
}

impl From<serde_json::Error> for MoonrakerError {
    fn from(err: serde_json::Error) -> Self {
        MoonrakerError::DeserializationError(err)
    }
}

/// Reported state of a power-switch device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    /// Moonraker reports the device state as a string; anything other than
    /// a literal "off" keeps the lights running.
    fn from_api(value: &str) -> Self {
        if value == "off" { PowerState::Off } else { PowerState::On }
    }
}

/// Actual/target pairs for both heaters, from one `/api/printer` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaterReadings {
    pub extruder_actual: f32,
    pub extruder_target: f32,
    pub bed_actual: f32,
    pub bed_target: f32,
}

#[derive(Debug, Deserialize)]
struct PrinterResponse {
    temperature: TemperatureBlock,
}

#[derive(Debug, Deserialize)]
struct TemperatureBlock {
    tool0: HeaterSample,
    bed: HeaterSample,
}

#[derive(Debug, Deserialize)]
struct HeaterSample {
    actual: f32,
    target: f32,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    state: String,
}

/// A client for the subset of the Moonraker HTTP API the monitor polls.
#[derive(Debug)]
pub struct MoonrakerClient {
    base_url: String,
    client: Client,
}

impl MoonrakerClient {
    /// Creates a new `MoonrakerClient` with populated headers and timeouts.
    ///
    /// Timeouts stay well under the one second tick so a dead printer host
    /// cannot stall the render loop.
    pub fn new(base_url: &str) -> Self {
        const VERSION: &'static str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        let client = Client::builder()
            .http1_only()
            .connect_timeout(Duration::from_millis(500))
            .default_headers(headers)
            .timeout(Duration::from_millis(800))
            .build()
            .unwrap(); // Panics if client cannot be built, which is acceptable for client initialization

        MoonrakerClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, MoonrakerError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        response.error_for_status_ref()?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Query a power-switch device via `/machine/device_power/device`.
    pub async fn fetch_power(&self, device: &str) -> Result<PowerState, MoonrakerError> {
        let value = self
            .get_json(&format!("/machine/device_power/device?device={device}"))
            .await?;
        let state = value["result"][device]
            .as_str()
            .ok_or_else(|| MoonrakerError::MissingData(format!("result.{device}")))?;
        Ok(PowerState::from_api(state))
    }

    /// Heater temperatures via the Octoprint-compatible `/api/printer`.
    pub async fn fetch_printer(&self) -> Result<HeaterReadings, MoonrakerError> {
        let value = self.get_json("/api/printer").await?;
        let printer: PrinterResponse = serde_json::from_value(value)?;
        Ok(HeaterReadings {
            extruder_actual: printer.temperature.tool0.actual,
            extruder_target: printer.temperature.tool0.target,
            bed_actual: printer.temperature.bed.actual,
            bed_target: printer.temperature.bed.target,
        })
    }

    /// Current job state string via `/api/job` ("Printing", "Paused", ...).
    pub async fn fetch_job_state(&self) -> Result<String, MoonrakerError> {
        let value = self.get_json("/api/job").await?;
        let job: JobResponse = serde_json::from_value(value)?;
        Ok(job.state)
    }

    /// Virtual-sdcard progress in `[0, 1]` via the printer objects query.
    pub async fn fetch_progress(&self) -> Result<f64, MoonrakerError> {
        let value = self
            .get_json("/printer/objects/query?virtual_sdcard=progress")
            .await?;
        value["result"]["status"]["virtual_sdcard"]["progress"]
            .as_f64()
            .ok_or_else(|| {
                MoonrakerError::MissingData("result.status.virtual_sdcard.progress".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_power_state_from_api() {
        assert_eq!(PowerState::from_api("off"), PowerState::Off);
        assert_eq!(PowerState::from_api("on"), PowerState::On);
        // unknown device states keep the display running
        assert_eq!(PowerState::from_api("init"), PowerState::On);
    }

    #[test]
    fn test_printer_response_shape() {
        let payload = json!({
            "temperature": {
                "tool0": { "actual": 21.4, "target": 0.0, "offset": 0 },
                "bed": { "actual": 58.9, "target": 60.0, "offset": 0 }
            },
            "state": { "text": "Operational" }
        });
        let printer: PrinterResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(printer.temperature.tool0.actual, 21.4);
        assert_eq!(printer.temperature.bed.target, 60.0);
    }

    #[test]
    fn test_job_response_shape() {
        let payload = json!({ "job": { "file": {} }, "state": "Printing", "progress": {} });
        let job: JobResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(job.state, "Printing");
    }
}
