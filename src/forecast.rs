//! HTTP client for the level forecasting service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::RiskTier;
use crate::traits::{Forecast, ForecastProvider, LevelSample, ReservoirHistory};

/// Reported when the forecast never reaches capacity and the level is not
/// rising. Comfortably beyond any deadline clamp.
pub const NO_OVERFLOW_MINUTES: f64 = 100_000.0;

#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Number of forecast points requested per reservoir.
    pub periods: usize,
    /// Sampling frequency in the service's notation, e.g. `10min`.
    pub freq: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 10,
            periods: 144,
            freq: "10min".to_string(),
        }
    }
}

impl ForecastConfig {
    /// Minutes between consecutive forecast points.
    pub fn step_minutes(&self) -> f64 {
        let freq = self.freq.trim().to_ascii_lowercase();
        let (count, unit) = match freq.find(|c: char| !c.is_ascii_digit()) {
            Some(split) => freq.split_at(split),
            None => (freq.as_str(), "min"),
        };
        let count = count.parse::<f64>().unwrap_or(1.0);
        match unit {
            "h" | "hour" => count * 60.0,
            "d" | "day" => count * 1440.0,
            _ => count,
        }
    }
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("forecast request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no forecast returned for reservoir {0}")]
    MissingSeries(String),
    #[error("empty level series for reservoir {0}")]
    EmptySeries(String),
}

#[derive(Debug, Clone)]
pub struct ForecastClient {
    config: ForecastConfig,
    client: reqwest::blocking::Client,
}

impl ForecastClient {
    pub fn new(config: ForecastConfig) -> Result<Self, ForecastError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl ForecastProvider for ForecastClient {
    type Error = ForecastError;

    fn forecasts_for(&self, reservoirs: &[ReservoirHistory]) -> Result<Vec<Forecast>, ForecastError> {
        if reservoirs.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(empty) = reservoirs.iter().find(|r| r.samples.is_empty()) {
            return Err(ForecastError::EmptySeries(empty.id.clone()));
        }

        let body = BatchRequest {
            cauldrons: reservoirs
                .iter()
                .map(|r| (r.id.as_str(), r.samples.as_slice()))
                .collect(),
            periods: self.config.periods,
            freq: &self.config.freq,
        };

        let url = format!("{}/forecast/batch", self.config.base_url);
        let mut response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<BatchResponse>())?;

        let step = self.config.step_minutes();
        reservoirs
            .iter()
            .map(|history| {
                let points = response
                    .results
                    .remove(&history.id)
                    .ok_or_else(|| ForecastError::MissingSeries(history.id.clone()))?;
                forecast_from_points(history, &points, step)
            })
            .collect()
    }
}

/// Derive fill rate, time until overflow and risk from a forecast series.
///
/// The series starts one step after the last observed sample. Time until
/// overflow is the first point where the prediction reaches capacity, else a
/// linear extrapolation of the fill rate.
pub fn forecast_from_points(
    history: &ReservoirHistory,
    points: &[ForecastPoint],
    step_minutes: f64,
) -> Result<Forecast, ForecastError> {
    let current = history
        .samples
        .last()
        .map(|sample| sample.value.max(0.0))
        .ok_or_else(|| ForecastError::EmptySeries(history.id.clone()))?;
    let last = points
        .last()
        .ok_or_else(|| ForecastError::EmptySeries(history.id.clone()))?;

    let span = points.len() as f64 * step_minutes;
    let fill_rate = if span > 0.0 { (last.yhat - current) / span } else { 0.0 };

    let time_until_overflow = if current >= history.max_volume {
        0.0
    } else if let Some(i) = points.iter().position(|p| p.yhat >= history.max_volume) {
        (i + 1) as f64 * step_minutes
    } else if fill_rate > 0.0 {
        (history.max_volume - current) / fill_rate
    } else {
        NO_OVERFLOW_MINUTES
    };

    Ok(Forecast {
        id: history.id.clone(),
        max_volume: history.max_volume,
        current_level: current,
        fill_rate,
        time_until_overflow,
        risk: RiskTier::from_time_until_overflow(time_until_overflow),
    })
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    cauldrons: HashMap<&'a str, &'a [LevelSample]>,
    periods: usize,
    freq: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    results: HashMap<String, Vec<ForecastPoint>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastPoint {
    pub ds: String,
    pub yhat: f64,
    #[serde(default)]
    pub yhat_lower: Option<f64>,
    #[serde(default)]
    pub yhat_upper: Option<f64>,
}
