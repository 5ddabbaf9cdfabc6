//! Time-series operations

use super::SqliteStore;
use crate::lims::normalize_datetime;
use crate::timeseries::stats::{Distribution, ParameterStatistics};
use crate::timeseries::{NewTimeSeriesPoint, SeriesSummary, TimeSeriesExperiment, TimeSeriesPoint};
use crate::{Error, Result};
use rusqlite::{ToSql, params};
use tracing::debug;

impl SqliteStore {
    /// Record points for an experiment in one transaction, returning how many
    /// were written
    pub fn insert_points(&self, experiment_id: i64, points: &[NewTimeSeriesPoint]) -> Result<usize> {
        if points.is_empty() {
            return Err(Error::validation("no data points to insert"));
        }
        for point in points {
            point.validate()?;
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (experiment_id, series_name, parameter_name, time_step, timestamp, value, unit, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                self.table("time_series")
            ))?;
            for p in points {
                stmt.execute(params![
                    experiment_id,
                    p.series_name,
                    p.parameter_name.trim(),
                    p.time_step,
                    normalize_datetime(p.timestamp.as_deref())?,
                    p.value,
                    p.unit,
                    p.notes
                ])
                .map_err(|e| match Error::from(e) {
                    Error::Validation(msg) if msg.contains("FOREIGN KEY") => {
                        Error::Validation(format!("experiment {experiment_id} does not exist"))
                    }
                    other => other,
                })?;
            }
        }
        tx.commit()?;
        debug!(experiment_id, count = points.len(), "inserted time-series points");
        Ok(points.len())
    }

    /// Experiments that have time-series data
    pub fn list_timeseries_experiments(&self) -> Result<Vec<TimeSeriesExperiment>> {
        let sql = format!(
            "SELECT e.experiment_id, e.experiment_name, e.description,
                    COUNT(DISTINCT ts.parameter_name), COUNT(ts.series_id)
             FROM {} e JOIN {} ts ON ts.experiment_id = e.experiment_id
             GROUP BY e.experiment_id, e.experiment_name, e.description
             ORDER BY e.experiment_name",
            self.table("experiments"),
            self.table("time_series")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TimeSeriesExperiment {
                    experiment_id: row.get(0)?,
                    experiment_name: row.get(1)?,
                    description: row.get(2)?,
                    series_count: row.get(3)?,
                    point_count: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// One summary per (series, parameter, unit) of an experiment
    pub fn list_series(&self, experiment_id: i64) -> Result<Vec<SeriesSummary>> {
        let sql = format!(
            "SELECT series_name, parameter_name, unit, COUNT(*), MIN(timestamp), MAX(timestamp)
             FROM {} WHERE experiment_id = ?1
             GROUP BY series_name, parameter_name, unit
             ORDER BY parameter_name",
            self.table("time_series")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([experiment_id], |row| {
                Ok(SeriesSummary {
                    series_name: row.get(0)?,
                    parameter_name: row.get(1)?,
                    unit: row.get(2)?,
                    data_points: row.get(3)?,
                    start_time: row.get(4)?,
                    end_time: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Points ordered by parameter then time step. An empty `parameters`
    /// slice selects every parameter.
    pub fn get_points(&self, experiment_id: i64, parameters: &[String]) -> Result<Vec<TimeSeriesPoint>> {
        let (filter, args) = parameter_filter(&experiment_id, parameters);
        let sql = format!(
            "SELECT series_id, experiment_id, series_name, parameter_name, time_step, timestamp, value, unit, notes
             FROM {} WHERE experiment_id = ?1{filter}
             ORDER BY parameter_name, time_step",
            self.table("time_series")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(args.as_slice(), |row| {
                Ok(TimeSeriesPoint {
                    series_id: row.get(0)?,
                    experiment_id: row.get(1)?,
                    series_name: row.get(2)?,
                    parameter_name: row.get(3)?,
                    time_step: row.get(4)?,
                    timestamp: row.get(5)?,
                    value: row.get(6)?,
                    unit: row.get(7)?,
                    notes: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Per (parameter, unit) statistics. Aggregates come from SQL; median,
    /// quartiles and standard deviation from the sorted values.
    pub fn statistics(&self, experiment_id: i64, parameters: &[String]) -> Result<Vec<ParameterStatistics>> {
        let table = self.table("time_series");
        let (filter, args) = parameter_filter(&experiment_id, parameters);
        let sql = format!(
            "SELECT parameter_name, unit, COUNT(*), MIN(value), MAX(value), AVG(value), MIN(timestamp), MAX(timestamp)
             FROM {table} WHERE experiment_id = ?1{filter}
             GROUP BY parameter_name, unit
             ORDER BY parameter_name"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let aggregates = stmt
            .query_map(args.as_slice(), |row| {
                Ok(ParameterStatistics {
                    parameter_name: row.get(0)?,
                    unit: row.get(1)?,
                    data_points: row.get(2)?,
                    min_value: row.get(3)?,
                    max_value: row.get(4)?,
                    avg_value: row.get(5)?,
                    median: 0.0,
                    q1: 0.0,
                    q3: 0.0,
                    std_dev: 0.0,
                    start_time: row.get(6)?,
                    end_time: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut values_stmt = self.conn.prepare(&format!(
            "SELECT value FROM {table} WHERE experiment_id = ?1 AND parameter_name = ?2 AND unit IS ?3"
        ))?;
        let mut out = Vec::with_capacity(aggregates.len());
        for mut stats in aggregates {
            let mut values = values_stmt
                .query_map(params![experiment_id, stats.parameter_name, stats.unit], |row| row.get::<_, f64>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            if let Some(d) = Distribution::of(&mut values) {
                stats.median = d.median;
                stats.q1 = d.q1;
                stats.q3 = d.q3;
                stats.std_dev = d.std_dev;
            }
            out.push(stats);
        }
        Ok(out)
    }

    /// Remove every point of an experiment, returning how many were deleted
    pub fn delete_points(&self, experiment_id: i64) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE experiment_id = ?1", self.table("time_series"));
        Ok(self.conn.execute(&sql, [experiment_id])?)
    }
}

/// ` AND parameter_name IN (?2, ?3, ...)` plus the bound arguments, the
/// experiment id first.
fn parameter_filter<'a>(experiment_id: &'a i64, parameters: &'a [String]) -> (String, Vec<&'a dyn ToSql>) {
    let mut args: Vec<&dyn ToSql> = vec![experiment_id];
    if parameters.is_empty() {
        return (String::new(), args);
    }
    let placeholders: Vec<String> = (0..parameters.len()).map(|i| format!("?{}", i + 2)).collect();
    args.extend(parameters.iter().map(|p| p as &dyn ToSql));
    (format!(" AND parameter_name IN ({})", placeholders.join(", ")), args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lims::{NewExperiment, NewSample};

    fn point(param: &str, step: i64, value: f64, unit: &str) -> NewTimeSeriesPoint {
        NewTimeSeriesPoint {
            series_name: Some("Reactor A".into()),
            parameter_name: param.into(),
            time_step: step,
            timestamp: Some(format!("2025-03-01 08:{step:02}:00")),
            value,
            unit: Some(unit.into()),
            notes: None,
        }
    }

    fn setup() -> (SqliteStore, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let e = store
            .insert_experiment(&NewExperiment {
                experiment_name: "Exp-001".into(),
                description: None,
                start_date: None,
                end_date: None,
            })
            .unwrap();
        let points = vec![
            point("temperature", 1, 30.0, "°C"),
            point("temperature", 0, 25.0, "°C"),
            point("temperature", 2, 35.0, "°C"),
            point("temperature", 3, 40.0, "°C"),
            point("pressure", 0, 1.0, "bar"),
        ];
        assert_eq!(store.insert_points(e, &points).unwrap(), 5);
        (store, e)
    }

    #[test]
    fn test_points_ordered_and_filtered() {
        let (store, e) = setup();
        let all = store.get_points(e, &[]).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].parameter_name, "pressure");
        let temps: Vec<i64> = all[1..].iter().map(|p| p.time_step).collect();
        assert_eq!(temps, vec![0, 1, 2, 3]);

        let only = store.get_points(e, &["pressure".to_string()]).unwrap();
        assert_eq!(only.len(), 1);
        assert!(store.get_points(e, &["viscosity".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn test_series_and_experiments() {
        let (store, e) = setup();
        let series = store.list_series(e).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].parameter_name, "temperature");
        assert_eq!(series[1].data_points, 4);
        assert_eq!(series[1].start_time.as_deref(), Some("2025-03-01 08:00:00"));
        assert_eq!(series[1].end_time.as_deref(), Some("2025-03-01 08:03:00"));

        let experiments = store.list_timeseries_experiments().unwrap();
        assert_eq!(experiments.len(), 1);
        assert_eq!(experiments[0].series_count, 2);
        assert_eq!(experiments[0].point_count, 5);
    }

    #[test]
    fn test_mixed_timestamp_forms_order_by_time() {
        let (store, e) = setup();
        let late = NewTimeSeriesPoint { timestamp: Some("2025-03-01 10:00:00".into()), ..point("ph", 1, 7.1, "-") };
        let early = NewTimeSeriesPoint { timestamp: Some("2025-03-01T09:00".into()), ..point("ph", 0, 7.0, "-") };
        store.insert_points(e, &[late, early]).unwrap();

        let ph = store.list_series(e).unwrap().into_iter().find(|s| s.parameter_name == "ph").unwrap();
        assert_eq!(ph.start_time.as_deref(), Some("2025-03-01 09:00:00"));
        assert_eq!(ph.end_time.as_deref(), Some("2025-03-01 10:00:00"));
        let stored = store.get_points(e, &["ph".to_string()]).unwrap();
        assert_eq!(stored[0].timestamp.as_deref(), Some("2025-03-01 09:00:00"));
    }

    #[test]
    fn test_statistics() {
        let (store, e) = setup();
        let stats = store.statistics(e, &["temperature".to_string()]).unwrap();
        assert_eq!(stats.len(), 1);
        let t = &stats[0];
        assert_eq!(t.data_points, 4);
        assert_eq!(t.min_value, 25.0);
        assert_eq!(t.max_value, 40.0);
        assert!((t.avg_value - 32.5).abs() < 1e-9);
        assert!((t.median - 32.5).abs() < 1e-9);
        assert!((t.q1 - 28.75).abs() < 1e-9);
        assert!((t.q3 - 36.25).abs() < 1e-9);
        let expected_std = (125.0f64 / 3.0).sqrt();
        assert!((t.std_dev - expected_std).abs() < 1e-9);

        let pressure = &store.statistics(e, &[]).unwrap()[0];
        assert_eq!(pressure.parameter_name, "pressure");
        assert_eq!(pressure.std_dev, 0.0);
    }

    #[test]
    fn test_insert_points_is_atomic() {
        let (store, e) = setup();
        let bad = vec![point("ph", 0, 7.0, "-"), NewTimeSeriesPoint { time_step: -3, ..point("ph", 1, 7.1, "-") }];
        assert!(store.insert_points(e, &bad).is_err());
        assert_eq!(store.get_points(e, &[]).unwrap().len(), 5);

        let err = store.insert_points(999, &[point("ph", 0, 7.0, "-")]).unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("experiment 999")));
        assert!(store.list_series(999).unwrap().is_empty());

        let err = store.insert_points(e, &[]).unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("no data points")));
    }

    #[test]
    fn test_experiment_delete_cascades_to_points() {
        let (store, e) = setup();
        store
            .insert_sample(&NewSample {
                experiment_id: e,
                sample_code: "S001".into(),
                sample_type: None,
                collection_date: None,
            })
            .unwrap();
        store.delete_experiment(e).unwrap();
        assert!(store.get_points(e, &[]).unwrap().is_empty());
        assert!(store.list_samples().unwrap().is_empty());
    }

    #[test]
    fn test_delete_points() {
        let (store, e) = setup();
        assert_eq!(store.delete_points(e).unwrap(), 5);
        assert!(store.list_timeseries_experiments().unwrap().is_empty());
    }
}
