//! Experiment, sample and measurement operations

use super::SqliteStore;
use crate::lims::{
    normalize_date, normalize_datetime, Experiment, ExperimentUpdate, Measurement, MeasurementRow,
    MeasurementUpdate, NewExperiment, NewMeasurement, NewSample, Sample, SampleRow, SampleUpdate,
};
use crate::{Error, Result};
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    // ========== Experiment Operations ==========

    pub fn list_experiments(&self) -> Result<Vec<Experiment>> {
        let sql = format!(
            "SELECT experiment_id, experiment_name, description, start_date, end_date FROM {} ORDER BY experiment_id",
            self.table("experiments")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_experiment)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_experiment(&self, id: i64) -> Result<Experiment> {
        let sql = format!(
            "SELECT experiment_id, experiment_name, description, start_date, end_date FROM {} WHERE experiment_id = ?1",
            self.table("experiments")
        );
        self.conn
            .query_row(&sql, [id], row_to_experiment)
            .optional()?
            .ok_or_else(|| Error::not_found("experiment", id))
    }

    pub fn insert_experiment(&self, experiment: &NewExperiment) -> Result<i64> {
        experiment.validate()?;
        let sql = format!(
            "INSERT INTO {} (experiment_name, description, start_date, end_date) VALUES (?1, ?2, ?3, ?4)",
            self.table("experiments")
        );
        self.conn.execute(
            &sql,
            params![
                experiment.experiment_name.trim(),
                experiment.description,
                normalize_date(experiment.start_date.as_deref())?,
                normalize_date(experiment.end_date.as_deref())?
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_experiment(&self, id: i64, update: &ExperimentUpdate) -> Result<()> {
        update.validate()?;
        let sql = format!(
            "UPDATE {} SET experiment_name = COALESCE(?1, experiment_name), description = COALESCE(?2, description),
             start_date = COALESCE(?3, start_date), end_date = COALESCE(?4, end_date) WHERE experiment_id = ?5",
            self.table("experiments")
        );
        let changed = self.conn.execute(
            &sql,
            params![
                update.experiment_name.as_deref().map(str::trim),
                update.description,
                normalize_date(update.start_date.as_deref())?,
                normalize_date(update.end_date.as_deref())?,
                id
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("experiment", id));
        }
        Ok(())
    }

    /// Delete an experiment; samples, measurements and time series cascade
    pub fn delete_experiment(&self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE experiment_id = ?1", self.table("experiments"));
        if self.conn.execute(&sql, [id])? == 0 {
            return Err(Error::not_found("experiment", id));
        }
        Ok(())
    }

    // ========== Sample Operations ==========

    fn sample_select(&self) -> String {
        format!(
            "SELECT s.sample_id, s.experiment_id, s.sample_code, s.sample_type, s.collection_date, e.experiment_name
             FROM {} s LEFT JOIN {} e ON e.experiment_id = s.experiment_id",
            self.table("samples"),
            self.table("experiments")
        )
    }

    pub fn list_samples(&self) -> Result<Vec<SampleRow>> {
        let sql = format!("{} ORDER BY s.sample_id", self.sample_select());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_sample)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_samples_for_experiment(&self, experiment_id: i64) -> Result<Vec<SampleRow>> {
        let sql = format!("{} WHERE s.experiment_id = ?1 ORDER BY s.sample_code", self.sample_select());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([experiment_id], row_to_sample)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_sample(&self, id: i64) -> Result<SampleRow> {
        let sql = format!("{} WHERE s.sample_id = ?1", self.sample_select());
        self.conn
            .query_row(&sql, [id], row_to_sample)
            .optional()?
            .ok_or_else(|| Error::not_found("sample", id))
    }

    /// Insert a sample; the experiment must exist and the code is unique
    pub fn insert_sample(&self, sample: &NewSample) -> Result<i64> {
        sample.validate()?;
        let sql = format!(
            "INSERT INTO {} (experiment_id, sample_code, sample_type, collection_date) VALUES (?1, ?2, ?3, ?4)",
            self.table("samples")
        );
        let code = sample.sample_code.trim();
        let collected = normalize_date(sample.collection_date.as_deref())?;
        self.conn
            .execute(&sql, params![sample.experiment_id, code, sample.sample_type, collected])
            .map_err(|e| sample_error(e.into(), code, Some(sample.experiment_id)))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_sample(&self, id: i64, update: &SampleUpdate) -> Result<()> {
        update.validate()?;
        let sql = format!(
            "UPDATE {} SET experiment_id = COALESCE(?1, experiment_id), sample_code = COALESCE(?2, sample_code),
             sample_type = COALESCE(?3, sample_type), collection_date = COALESCE(?4, collection_date) WHERE sample_id = ?5",
            self.table("samples")
        );
        let code = update.sample_code.as_deref().map(str::trim);
        let collected = normalize_date(update.collection_date.as_deref())?;
        let changed = self
            .conn
            .execute(&sql, params![update.experiment_id, code, update.sample_type, collected, id])
            .map_err(|e| sample_error(e.into(), code.unwrap_or_default(), update.experiment_id))?;
        if changed == 0 {
            return Err(Error::not_found("sample", id));
        }
        Ok(())
    }

    pub fn delete_sample(&self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE sample_id = ?1", self.table("samples"));
        if self.conn.execute(&sql, [id])? == 0 {
            return Err(Error::not_found("sample", id));
        }
        Ok(())
    }

    // ========== Measurement Operations ==========

    fn measurement_select(&self) -> String {
        format!(
            "SELECT m.measurement_id, m.sample_id, m.parameter, m.value, m.unit, m.measurement_date,
                    s.sample_code, e.experiment_name
             FROM {} m
             LEFT JOIN {} s ON s.sample_id = m.sample_id
             LEFT JOIN {} e ON e.experiment_id = s.experiment_id",
            self.table("measurements"),
            self.table("samples"),
            self.table("experiments")
        )
    }

    pub fn list_measurements(&self) -> Result<Vec<MeasurementRow>> {
        let sql = format!("{} ORDER BY m.measurement_id", self.measurement_select());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_measurement)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_measurements_for_sample(&self, sample_id: i64) -> Result<Vec<MeasurementRow>> {
        let sql = format!(
            "{} WHERE m.sample_id = ?1 ORDER BY m.measurement_date, m.measurement_id",
            self.measurement_select()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([sample_id], row_to_measurement)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_measurement(&self, id: i64) -> Result<MeasurementRow> {
        let sql = format!("{} WHERE m.measurement_id = ?1", self.measurement_select());
        self.conn
            .query_row(&sql, [id], row_to_measurement)
            .optional()?
            .ok_or_else(|| Error::not_found("measurement", id))
    }

    pub fn insert_measurement(&self, measurement: &NewMeasurement) -> Result<i64> {
        measurement.validate()?;
        let sql = format!(
            "INSERT INTO {} (sample_id, parameter, value, unit, measurement_date) VALUES (?1, ?2, ?3, ?4, ?5)",
            self.table("measurements")
        );
        self.conn
            .execute(
                &sql,
                params![
                    measurement.sample_id,
                    measurement.parameter.trim(),
                    measurement.value,
                    measurement.unit,
                    normalize_datetime(measurement.measurement_date.as_deref())?
                ],
            )
            .map_err(|e| missing_sample(e.into(), measurement.sample_id))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_measurement(&self, id: i64, update: &MeasurementUpdate) -> Result<()> {
        update.validate()?;
        let sql = format!(
            "UPDATE {} SET sample_id = COALESCE(?1, sample_id), parameter = COALESCE(?2, parameter), value = COALESCE(?3, value),
             unit = COALESCE(?4, unit), measurement_date = COALESCE(?5, measurement_date) WHERE measurement_id = ?6",
            self.table("measurements")
        );
        let changed = self
            .conn
            .execute(
                &sql,
                params![
                    update.sample_id,
                    update.parameter.as_deref().map(str::trim),
                    update.value,
                    update.unit,
                    normalize_datetime(update.measurement_date.as_deref())?,
                    id
                ],
            )
            .map_err(|e| match update.sample_id {
                Some(sample_id) => missing_sample(e.into(), sample_id),
                None => e.into(),
            })?;
        if changed == 0 {
            return Err(Error::not_found("measurement", id));
        }
        Ok(())
    }

    pub fn delete_measurement(&self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE measurement_id = ?1", self.table("measurements"));
        if self.conn.execute(&sql, [id])? == 0 {
            return Err(Error::not_found("measurement", id));
        }
        Ok(())
    }
}

fn row_to_experiment(row: &rusqlite::Row) -> rusqlite::Result<Experiment> {
    Ok(Experiment {
        experiment_id: row.get(0)?,
        experiment_name: row.get(1)?,
        description: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
    })
}

fn row_to_sample(row: &rusqlite::Row) -> rusqlite::Result<SampleRow> {
    Ok(SampleRow {
        sample: Sample {
            sample_id: row.get(0)?,
            experiment_id: row.get(1)?,
            sample_code: row.get(2)?,
            sample_type: row.get(3)?,
            collection_date: row.get(4)?,
        },
        experiment_name: row.get(5)?,
    })
}

fn row_to_measurement(row: &rusqlite::Row) -> rusqlite::Result<MeasurementRow> {
    Ok(MeasurementRow {
        measurement: Measurement {
            measurement_id: row.get(0)?,
            sample_id: row.get(1)?,
            parameter: row.get(2)?,
            value: row.get(3)?,
            unit: row.get(4)?,
            measurement_date: row.get(5)?,
        },
        sample_code: row.get(6)?,
        experiment_name: row.get(7)?,
    })
}

fn sample_error(err: Error, code: &str, experiment_id: Option<i64>) -> Error {
    match err {
        Error::Conflict(_) => Error::Conflict(format!("sample code '{code}' already exists")),
        Error::Validation(msg) if msg.contains("FOREIGN KEY") => match experiment_id {
            Some(id) => Error::Validation(format!("experiment {id} does not exist")),
            None => Error::Validation(msg),
        },
        other => other,
    }
}

fn missing_sample(err: Error, sample_id: i64) -> Error {
    match err {
        Error::Validation(msg) if msg.contains("FOREIGN KEY") => {
            Error::Validation(format!("sample {sample_id} does not exist"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment(store: &SqliteStore, name: &str) -> i64 {
        store
            .insert_experiment(&NewExperiment {
                experiment_name: name.into(),
                description: Some("Water pH Analysis".into()),
                start_date: Some("2025-03-01".into()),
                end_date: Some("2025-03-05".into()),
            })
            .unwrap()
    }

    fn sample(experiment_id: i64, code: &str) -> NewSample {
        NewSample {
            experiment_id,
            sample_code: code.into(),
            sample_type: Some("Water".into()),
            collection_date: Some("2025-03-02".into()),
        }
    }

    fn measurement(sample_id: i64, value: f64) -> NewMeasurement {
        NewMeasurement {
            sample_id,
            parameter: "pH".into(),
            value,
            unit: Some("-".into()),
            measurement_date: Some("2025-03-02 10:00:00".into()),
        }
    }

    #[test]
    fn test_experiment_crud() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = experiment(&store, "Exp-001");
        let update = ExperimentUpdate { description: Some("Revised".into()), ..Default::default() };
        store.update_experiment(id, &update).unwrap();
        let e = store.get_experiment(id).unwrap();
        assert_eq!(e.description.as_deref(), Some("Revised"));
        assert_eq!(e.start_date.as_deref(), Some("2025-03-01"));
    }

    #[test]
    fn test_samples_join_experiment_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let e = experiment(&store, "Exp-001");
        store.insert_sample(&sample(e, "S002")).unwrap();
        store.insert_sample(&sample(e, "S001")).unwrap();

        let rows = store.list_samples_for_experiment(e).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sample.sample_code, "S001");
        assert_eq!(rows[0].experiment_name.as_deref(), Some("Exp-001"));
    }

    #[test]
    fn test_duplicate_sample_code_conflicts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let e = experiment(&store, "Exp-001");
        store.insert_sample(&sample(e, "S001")).unwrap();
        let err = store.insert_sample(&sample(e, "S001")).unwrap_err();
        assert!(matches!(err, Error::Conflict(ref m) if m.contains("S001")));
    }

    #[test]
    fn test_sample_requires_experiment() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.insert_sample(&sample(7, "S001")).unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("experiment 7")));
    }

    #[test]
    fn test_dates_stored_in_canonical_form() {
        let store = SqliteStore::open_in_memory().unwrap();
        let e = experiment(&store, "Exp-001");
        let s = store
            .insert_sample(&NewSample { collection_date: Some(" 2025-03-02 ".into()), ..sample(e, "S001") })
            .unwrap();
        assert_eq!(store.get_sample(s).unwrap().sample.collection_date.as_deref(), Some("2025-03-02"));

        let first = store
            .insert_measurement(&NewMeasurement {
                measurement_date: Some("2025-03-02T11:30".into()),
                ..measurement(s, 7.0)
            })
            .unwrap();
        store.insert_measurement(&measurement(s, 7.1)).unwrap();
        let rows = store.list_measurements_for_sample(s).unwrap();
        assert_eq!(rows[0].measurement.measurement_date.as_deref(), Some("2025-03-02 10:00:00"));
        assert_eq!(rows[1].measurement.measurement_id, first);
        assert_eq!(rows[1].measurement.measurement_date.as_deref(), Some("2025-03-02 11:30:00"));

        store
            .update_measurement(first, &MeasurementUpdate { measurement_date: Some("2025-03-01".into()), ..Default::default() })
            .unwrap();
        let row = store.get_measurement(first).unwrap();
        assert_eq!(row.measurement.measurement_date.as_deref(), Some("2025-03-01 00:00:00"));
    }

    #[test]
    fn test_measurement_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        let e = experiment(&store, "Exp-001");
        let s = store.insert_sample(&sample(e, "S001")).unwrap();
        let m = store.insert_measurement(&measurement(s, 7.2)).unwrap();

        let row = store.get_measurement(m).unwrap();
        assert_eq!(row.sample_code.as_deref(), Some("S001"));
        assert_eq!(row.experiment_name.as_deref(), Some("Exp-001"));

        store.update_measurement(m, &MeasurementUpdate { value: Some(7.4), ..Default::default() }).unwrap();
        let rows = store.list_measurements_for_sample(s).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].measurement.value, 7.4);
        assert_eq!(rows[0].measurement.parameter, "pH");
    }

    #[test]
    fn test_delete_experiment_cascades() {
        let store = SqliteStore::open_in_memory().unwrap();
        let e = experiment(&store, "Exp-001");
        let other = experiment(&store, "Exp-002");
        let s = store.insert_sample(&sample(e, "S001")).unwrap();
        store.insert_measurement(&measurement(s, 7.1)).unwrap();
        let kept = store.insert_sample(&sample(other, "S006")).unwrap();
        store.insert_measurement(&measurement(kept, 0.45)).unwrap();

        store.delete_experiment(e).unwrap();
        assert_eq!(store.list_samples().unwrap().len(), 1);
        let measurements = store.list_measurements().unwrap();
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].measurement.sample_id, Some(kept));
    }
}
