//! Time-series instrument data recorded against experiments
//!
//! A series is identified by experiment, parameter and unit; points within it
//! are ordered by `time_step`.

pub mod export;
pub mod stats;

pub use export::ExportFormat;
pub use stats::ParameterStatistics;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Charts show at most this many parameters at once.
pub const MAX_CHART_PARAMETERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub series_id: i64,
    pub experiment_id: i64,
    pub series_name: Option<String>,
    pub parameter_name: String,
    pub time_step: i64,
    pub timestamp: Option<String>,
    pub value: f64,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

impl TimeSeriesPoint {
    /// Unit as shown in labels; missing units are the empty string.
    pub fn unit_str(&self) -> &str {
        self.unit.as_deref().unwrap_or("")
    }
}

/// A point to record. The experiment comes from the request path.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTimeSeriesPoint {
    #[serde(default)]
    pub series_name: Option<String>,
    pub parameter_name: String,
    pub time_step: i64,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTimeSeriesPoint {
    pub fn validate(&self) -> Result<()> {
        if self.parameter_name.trim().is_empty() {
            return Err(Error::validation("parameter_name must not be empty"));
        }
        if self.time_step < 0 {
            return Err(Error::validation(format!("time_step must be >= 0, got {}", self.time_step)));
        }
        if !self.value.is_finite() {
            return Err(Error::validation("value must be a finite number"));
        }
        if let Some(ts) = self.timestamp.as_deref() {
            crate::lims::parse_datetime(ts)?;
        }
        Ok(())
    }
}

/// Experiment that has recorded time-series data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesExperiment {
    pub experiment_id: i64,
    pub experiment_name: String,
    pub description: Option<String>,
    /// Distinct parameters recorded
    pub series_count: i64,
    pub point_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub series_name: Option<String>,
    pub parameter_name: String,
    pub unit: Option<String>,
    pub data_points: i64,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Reject parameter selections a chart cannot show.
pub fn check_chart_selection(parameters: &[String]) -> Result<()> {
    if parameters.is_empty() {
        return Err(Error::validation("Please select an experiment and parameters"));
    }
    if parameters.len() > MAX_CHART_PARAMETERS {
        return Err(Error::validation(format!(
            "Please select up to {MAX_CHART_PARAMETERS} parameters maximum"
        )));
    }
    Ok(())
}
