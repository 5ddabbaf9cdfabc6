//! LIMS records: experiments, their samples and the measurements taken on a
//! sample.
//!
//! Dates travel as ISO strings. Experiment and sample dates are calendar days
//! (`2025-03-01`); measurement dates carry a time of day
//! (`2025-03-02 10:00:00`).

use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: i64,
    pub experiment_name: String,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExperiment {
    pub experiment_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl NewExperiment {
    pub fn validate(&self) -> Result<()> {
        if self.experiment_name.trim().is_empty() {
            return Err(Error::validation("experiment_name must not be empty"));
        }
        check_date_range(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperimentUpdate {
    #[serde(default)]
    pub experiment_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ExperimentUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.experiment_name.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
        {
            return Err(Error::validation("nothing to update"));
        }
        if matches!(self.experiment_name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(Error::validation("experiment_name must not be empty"));
        }
        check_date_range(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub sample_id: i64,
    pub experiment_id: Option<i64>,
    pub sample_code: String,
    pub sample_type: Option<String>,
    pub collection_date: Option<String>,
}

/// Sample listed with the name of its experiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    #[serde(flatten)]
    pub sample: Sample,
    pub experiment_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSample {
    pub experiment_id: i64,
    pub sample_code: String,
    #[serde(default)]
    pub sample_type: Option<String>,
    #[serde(default)]
    pub collection_date: Option<String>,
}

impl NewSample {
    pub fn validate(&self) -> Result<()> {
        if self.sample_code.trim().is_empty() {
            return Err(Error::validation("sample_code must not be empty"));
        }
        if let Some(date) = self.collection_date.as_deref() {
            parse_date(date)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SampleUpdate {
    #[serde(default)]
    pub experiment_id: Option<i64>,
    #[serde(default)]
    pub sample_code: Option<String>,
    #[serde(default)]
    pub sample_type: Option<String>,
    #[serde(default)]
    pub collection_date: Option<String>,
}

impl SampleUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.experiment_id.is_none()
            && self.sample_code.is_none()
            && self.sample_type.is_none()
            && self.collection_date.is_none()
        {
            return Err(Error::validation("nothing to update"));
        }
        if matches!(self.sample_code.as_deref(), Some(c) if c.trim().is_empty()) {
            return Err(Error::validation("sample_code must not be empty"));
        }
        if let Some(date) = self.collection_date.as_deref() {
            parse_date(date)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub measurement_id: i64,
    pub sample_id: Option<i64>,
    pub parameter: String,
    pub value: f64,
    pub unit: Option<String>,
    pub measurement_date: Option<String>,
}

/// Measurement listed with its sample code and experiment name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRow {
    #[serde(flatten)]
    pub measurement: Measurement,
    pub sample_code: Option<String>,
    pub experiment_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMeasurement {
    pub sample_id: i64,
    pub parameter: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub measurement_date: Option<String>,
}

impl NewMeasurement {
    pub fn validate(&self) -> Result<()> {
        if self.parameter.trim().is_empty() {
            return Err(Error::validation("parameter must not be empty"));
        }
        check_value(self.value)?;
        if let Some(date) = self.measurement_date.as_deref() {
            parse_datetime(date)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasurementUpdate {
    #[serde(default)]
    pub sample_id: Option<i64>,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub measurement_date: Option<String>,
}

impl MeasurementUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.sample_id.is_none()
            && self.parameter.is_none()
            && self.value.is_none()
            && self.unit.is_none()
            && self.measurement_date.is_none()
        {
            return Err(Error::validation("nothing to update"));
        }
        if matches!(self.parameter.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(Error::validation("parameter must not be empty"));
        }
        if let Some(value) = self.value {
            check_value(value)?;
        }
        if let Some(date) = self.measurement_date.as_deref() {
            parse_datetime(date)?;
        }
        Ok(())
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| Error::validation(format!("invalid date '{s}' (expected YYYY-MM-DD): {e}")))
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, the `T`-separated form, minutes-only times
/// and a bare date (midnight).
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for format in [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    parse_date(s)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            Error::validation(format!("invalid date/time '{s}' (expected YYYY-MM-DD HH:MM:SS)"))
        })
}

/// Stored form of an optional calendar date: `YYYY-MM-DD`.
pub fn normalize_date(s: Option<&str>) -> Result<Option<String>> {
    s.map(|s| parse_date(s).map(|d| d.format(DATE_FORMAT).to_string())).transpose()
}

/// Stored form of an optional date/time: `YYYY-MM-DD HH:MM:SS`, so text
/// ordering in SQL matches time ordering.
pub fn normalize_datetime(s: Option<&str>) -> Result<Option<String>> {
    s.map(|s| parse_datetime(s).map(|dt| dt.format(DATETIME_FORMAT).to_string())).transpose()
}

fn check_date_range(start: Option<&str>, end: Option<&str>) -> Result<()> {
    let start = start.map(parse_date).transpose()?;
    let end = end.map(parse_date).transpose()?;
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(Error::validation(format!("end_date {end} is before start_date {start}")));
        }
    }
    Ok(())
}

fn check_value(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation("value must be a finite number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap().and_hms_opt(10, 0, 0).unwrap();
        assert_eq!(parse_datetime("2025-03-02 10:00:00").unwrap(), expected);
        assert_eq!(parse_datetime("2025-03-02T10:00:00").unwrap(), expected);
        assert_eq!(parse_datetime("2025-03-02 10:00").unwrap(), expected);
        assert_eq!(parse_datetime("2025-03-02").unwrap().date(), expected.date());
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_normalize_datetime() {
        assert_eq!(normalize_datetime(Some("2025-03-01T09:00")).unwrap().as_deref(), Some("2025-03-01 09:00:00"));
        assert_eq!(normalize_datetime(Some(" 2025-03-01 ")).unwrap().as_deref(), Some("2025-03-01 00:00:00"));
        assert_eq!(normalize_datetime(None).unwrap(), None);
        assert!(normalize_datetime(Some("03/01/2025")).is_err());
        assert_eq!(normalize_date(Some(" 2025-03-01")).unwrap().as_deref(), Some("2025-03-01"));
    }

    #[test]
    fn test_experiment_date_range() {
        let exp = NewExperiment {
            experiment_name: "Exp-001".into(),
            description: None,
            start_date: Some("2025-03-05".into()),
            end_date: Some("2025-03-01".into()),
        };
        assert!(matches!(exp.validate(), Err(Error::Validation(_))));

        let ok = NewExperiment { end_date: Some("2025-03-09".into()), ..exp };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_invalid_collection_date() {
        let sample = NewSample {
            experiment_id: 1,
            sample_code: "S100".into(),
            sample_type: None,
            collection_date: Some("2025-13-01".into()),
        };
        assert!(sample.validate().is_err());
    }

    #[test]
    fn test_sample_row_flattens() {
        let row = SampleRow {
            sample: Sample {
                sample_id: 1,
                experiment_id: Some(1),
                sample_code: "S001".into(),
                sample_type: Some("Water".into()),
                collection_date: Some("2025-03-02".into()),
            },
            experiment_name: Some("Exp-001".into()),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["sample_code"], "S001");
        assert_eq!(json["experiment_name"], "Exp-001");
    }

    #[test]
    fn test_measurement_update_rejects_nan() {
        let update = MeasurementUpdate { value: Some(f64::NAN), ..Default::default() };
        assert!(update.validate().is_err());
        assert!(MeasurementUpdate::default().validate().is_err());
    }
}
