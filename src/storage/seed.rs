//! Sample data set loaded by `cheminf init-db`

use super::SqliteStore;
use crate::Result;
use chrono::{Duration, NaiveDate};
use rusqlite::params;
use tracing::info;

const MOLECULES: &[(&str, &str)] = &[
    ("Salicylic Acid", "Oc1ccccc1C(=O)O"),
    ("Acetic Anhydride", "CC(=O)OC(=O)C"),
    ("Acetylsalicylic Acid (Aspirin)", "CC(=O)Oc1ccccc1C(=O)O"),
    ("Acetic Acid", "CC(=O)O"),
    ("Sulfuric Acid", "OS(=O)(=O)O"),
    ("Glacial Acetic Acid", "CC(=O)O"),
    ("Ethanol", "CCO"),
    ("Methanol", "CO"),
    ("Water", "O"),
    ("Sodium Bicarbonate", "O=C(O)[O-].[Na+]"),
    ("Sodium Acetate", "CC(=O)[O-].[Na+]"),
    ("Dichloromethane", "ClCCl"),
    ("Ethyl Acetate", "CCOC(=O)C"),
    ("Diethyl Ether", "CCOCC"),
    ("Hexane", "CCCCCC"),
    ("Toluene", "Cc1ccccc1"),
    ("Acetone", "CC(=O)C"),
    ("Isopropanol", "CC(O)C"),
    ("Acetonitrile", "CC#N"),
    ("Dimethyl Sulfoxide (DMSO)", "CS(=O)C"),
    ("Propionic Acid", "CCC(=O)O"),
    ("Butyric Acid", "CCCC(=O)O"),
    ("Potassium Carbonate", "[K+].[K+].C(=O)([O-])[O-]"),
    ("Magnesium Sulfate", "[Mg+2].[O-]S(=O)(=O)[O-]"),
    ("Calcium Carbonate", "[Ca+2].C(=O)([O-])[O-]"),
    ("Sodium Hydroxide", "[Na+].[OH-]"),
    ("Potassium Hydroxide", "[K+].[OH-]"),
    ("Pyridine", "c1ccncc1"),
    ("p-Toluenesulfonic Acid", "Cc1ccc(cc1)S(=O)(=O)O"),
    ("Hydrochloric Acid", "[H]Cl"),
    ("Acetyl Chloride", "CC(=O)Cl"),
    ("Benzoic Acid", "c1ccc(cc1)C(=O)O"),
    ("Benzaldehyde", "c1ccccc1C=O"),
    ("Salicylaldehyde", "O=Cc1ccccc1O"),
    ("Methyl Salicylate", "COC(=O)c1ccccc1O"),
    ("4-Aminobenzoic Acid", "Nc1ccc(cc1)C(=O)O"),
    ("2,4-Dihydroxybenzoic Acid", "O=C(O)c1c(O)ccc(O)c1"),
    ("3-Acetylsalicylic Acid", "O=C(O)c1c(O)c(C(=O)C)cccc1"),
    ("Phenol", "Oc1ccccc1"),
    ("Aniline", "Nc1ccccc1"),
];

/// (index into MOLECULES, role, coefficient) of the aspirin synthesis
const ASPIRIN_PARTICIPANTS: &[(usize, &str, f64)] = &[
    (0, "reactant", 1.0),
    (1, "reactant", 1.0),
    (4, "catalyst", 0.1),
    (2, "product", 1.0),
    (3, "product", 1.0),
];

const INVENTORY: &[(&str, i64, &str)] = &[
    ("Methanol", 500, "ml"),
    ("Ethanol", 300, "ml"),
    ("Acetone", 200, "ml"),
    ("Toluene", 150, "ml"),
    ("Chloroform", 100, "ml"),
];

const TASKS: &[(&str, &str)] = &[
    ("Optimize step 1", r#"{"type": "optimization", "step": 1, "parameters": {"temperature": 100, "time": 10}}"#),
    ("Optimize step 2", r#"{"type": "optimization", "step": 2, "parameters": {"temperature": 120, "time": 20}}"#),
    ("Optimize step 3", r#"{"type": "optimization", "step": 3, "parameters": {"temperature": 140, "time": 30}}"#),
];

const EXPERIMENTS: &[(&str, &str, &str, &str)] = &[
    ("Exp-001", "Water pH Analysis", "2025-03-01", "2025-03-05"),
    ("Exp-002", "Metal Concentration", "2025-03-06", "2025-03-10"),
    ("Exp-003", "Organic Compound Analysis", "2025-03-11", "2025-03-15"),
    ("Exp-004", "Polymer Stability Study", "2025-03-16", "2025-03-20"),
];

/// (experiment index, code, type, collection date)
const SAMPLES: &[(usize, &str, &str, &str)] = &[
    (0, "S001", "Water", "2025-03-02"),
    (0, "S002", "Water", "2025-03-02"),
    (0, "S003", "Water", "2025-03-03"),
    (0, "S004", "Water", "2025-03-04"),
    (0, "S005", "Water", "2025-03-05"),
    (1, "S006", "Metal Solution", "2025-03-06"),
    (1, "S007", "Metal Solution", "2025-03-07"),
    (1, "S008", "Metal Solution", "2025-03-08"),
    (1, "S009", "Metal Solution", "2025-03-09"),
    (1, "S010", "Metal Solution", "2025-03-10"),
    (2, "S011", "Organic Extract", "2025-03-11"),
    (2, "S012", "Organic Extract", "2025-03-12"),
    (2, "S013", "Organic Extract", "2025-03-13"),
    (2, "S014", "Organic Extract", "2025-03-14"),
    (2, "S015", "Organic Extract", "2025-03-15"),
    (3, "S016", "Polymer Solution", "2025-03-16"),
    (3, "S017", "Polymer Solution", "2025-03-17"),
    (3, "S018", "Polymer Solution", "2025-03-18"),
    (3, "S019", "Polymer Solution", "2025-03-19"),
    (3, "S020", "Polymer Solution", "2025-03-20"),
];

/// One measurement per sample, in sample order: (parameter, value, unit, taken)
const MEASUREMENTS: &[(&str, f64, &str, &str)] = &[
    ("pH", 7.2, "-", "2025-03-02 10:00:00"),
    ("pH", 7.5, "-", "2025-03-02 11:00:00"),
    ("pH", 7.1, "-", "2025-03-03 10:00:00"),
    ("pH", 7.4, "-", "2025-03-04 12:00:00"),
    ("pH", 7.3, "-", "2025-03-05 09:30:00"),
    ("Fe Concentration", 0.45, "mg/L", "2025-03-06 14:00:00"),
    ("Fe Concentration", 0.48, "mg/L", "2025-03-07 15:00:00"),
    ("Fe Concentration", 0.43, "mg/L", "2025-03-08 16:00:00"),
    ("Fe Concentration", 0.50, "mg/L", "2025-03-09 17:00:00"),
    ("Fe Concentration", 0.46, "mg/L", "2025-03-10 18:00:00"),
    ("TOC", 12.5, "mg/L", "2025-03-11 09:00:00"),
    ("TOC", 13.0, "mg/L", "2025-03-12 10:00:00"),
    ("TOC", 11.8, "mg/L", "2025-03-13 11:00:00"),
    ("TOC", 12.2, "mg/L", "2025-03-14 12:00:00"),
    ("TOC", 12.7, "mg/L", "2025-03-15 13:00:00"),
    ("Viscosity", 3.5, "cP", "2025-03-16 14:00:00"),
    ("Viscosity", 3.7, "cP", "2025-03-17 15:00:00"),
    ("Viscosity", 3.6, "cP", "2025-03-18 16:00:00"),
    ("Viscosity", 3.4, "cP", "2025-03-19 17:00:00"),
    ("Viscosity", 3.8, "cP", "2025-03-20 18:00:00"),
];

pub const TIME_SERIES_STEPS: i64 = 50;

/// Rows written by [`SqliteStore::load_sample_data`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub molecules: usize,
    pub reactions: usize,
    pub participants: usize,
    pub inventory: usize,
    pub projects: usize,
    pub tasks: usize,
    pub experiments: usize,
    pub samples: usize,
    pub measurements: usize,
    pub time_series_points: usize,
}

impl std::fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} molecules, {} reactions ({} participants), {} inventory items, {} projects ({} tasks), \
             {} experiments, {} samples, {} measurements, {} time-series points",
            self.molecules,
            self.reactions,
            self.participants,
            self.inventory,
            self.projects,
            self.tasks,
            self.experiments,
            self.samples,
            self.measurements,
            self.time_series_points
        )
    }
}

impl SqliteStore {
    /// Load the sample data set in one transaction
    pub fn load_sample_data(&self) -> Result<SeedSummary> {
        let tx = self.conn.unchecked_transaction()?;
        let mut summary = SeedSummary::default();

        let mut molecule_ids = Vec::with_capacity(MOLECULES.len());
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (MoleculeUpacName, SMILES) VALUES (?1, ?2)",
                self.table("molecules")
            ))?;
            for (name, smiles) in MOLECULES {
                stmt.execute(params![name, smiles])?;
                molecule_ids.push(tx.last_insert_rowid());
                summary.molecules += 1;
            }
        }

        tx.execute(
            &format!("INSERT INTO {} (ReactionName, ReactionDescription) VALUES (?1, ?2)", self.table("reactions")),
            params![
                "Aspirin Synthesis",
                "Synthesis of acetylsalicylic acid (aspirin) from salicylic acid and acetic anhydride with an acid catalyst."
            ],
        )?;
        let reaction_id = tx.last_insert_rowid();
        summary.reactions = 1;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (ReactionID, MoleculeID, Role, StoichiometricCoefficient) VALUES (?1, ?2, ?3, ?4)",
                self.table("reactionparticipants")
            ))?;
            for (molecule, role, coefficient) in ASPIRIN_PARTICIPANTS {
                stmt.execute(params![reaction_id, molecule_ids.get(*molecule), role, coefficient])?;
                summary.participants += 1;
            }
        }

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (MoleculeUpacName, amount, unit) VALUES (?1, ?2, ?3)",
                self.table("inventory")
            ))?;
            for (name, amount, unit) in INVENTORY {
                stmt.execute(params![name, amount, unit])?;
                summary.inventory += 1;
            }
        }

        tx.execute(
            &format!("INSERT INTO {} (name) VALUES (?1)", self.table("project")),
            ["Aspirin synthesis optimization"],
        )?;
        let project_id = tx.last_insert_rowid();
        summary.projects = 1;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (project_id, description, content) VALUES (?1, ?2, ?3)",
                self.table("task")
            ))?;
            for (description, content) in TASKS {
                stmt.execute(params![project_id, description, content])?;
                summary.tasks += 1;
            }
        }

        let mut experiment_ids = Vec::with_capacity(EXPERIMENTS.len());
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (experiment_name, description, start_date, end_date) VALUES (?1, ?2, ?3, ?4)",
                self.table("experiments")
            ))?;
            for (name, description, start, end) in EXPERIMENTS {
                stmt.execute(params![name, description, start, end])?;
                experiment_ids.push(tx.last_insert_rowid());
                summary.experiments += 1;
            }
        }

        {
            let mut sample_stmt = tx.prepare(&format!(
                "INSERT INTO {} (experiment_id, sample_code, sample_type, collection_date) VALUES (?1, ?2, ?3, ?4)",
                self.table("samples")
            ))?;
            let mut measurement_stmt = tx.prepare(&format!(
                "INSERT INTO {} (sample_id, parameter, value, unit, measurement_date) VALUES (?1, ?2, ?3, ?4, ?5)",
                self.table("measurements")
            ))?;
            for ((experiment, code, sample_type, collected), (parameter, value, unit, taken)) in
                SAMPLES.iter().zip(MEASUREMENTS)
            {
                let experiment_id = experiment_ids.get(*experiment).copied();
                sample_stmt.execute(params![experiment_id, code, sample_type, collected])?;
                let sample_id = tx.last_insert_rowid();
                summary.samples += 1;

                measurement_stmt.execute(params![sample_id, parameter, value, unit, taken])?;
                summary.measurements += 1;
            }
        }

        if let Some(&experiment_id) = experiment_ids.first() {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (experiment_id, series_name, parameter_name, time_step, timestamp, value, unit, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)",
                self.table("time_series")
            ))?;
            for point in reactor_run() {
                stmt.execute(params![
                    experiment_id,
                    "Reactor Run 1",
                    point.parameter,
                    point.time_step,
                    point.timestamp,
                    point.value,
                    point.unit
                ])?;
                summary.time_series_points += 1;
            }
        }

        tx.commit()?;
        info!(
            molecules = summary.molecules,
            experiments = summary.experiments,
            samples = summary.samples,
            points = summary.time_series_points,
            "loaded sample data"
        );
        Ok(summary)
    }
}

struct SeedPoint {
    parameter: &'static str,
    unit: &'static str,
    time_step: i64,
    timestamp: String,
    value: f64,
}

/// Deterministic reactor trace: heating, a slow pressure rise, pH drift and
/// first-order conversion, one reading per minute.
fn reactor_run() -> Vec<SeedPoint> {
    let start = NaiveDate::from_ymd_opt(2025, 3, 1).and_then(|d| d.and_hms_opt(8, 0, 0));
    let Some(start) = start else {
        return Vec::new();
    };
    let round = |v: f64| (v * 1000.0).round() / 1000.0;

    let curves: [(&'static str, &'static str, fn(f64) -> f64); 4] = [
        ("temperature", "°C", |t| 25.0 + 55.0 * (1.0 - (-t / 8.0).exp()) + 0.4 * (t * 0.7).sin()),
        ("pressure", "bar", |t| 1.0 + 0.015 * t + 0.02 * (t * 0.5).cos()),
        ("pH", "-", |t| 7.0 - 1.2 * (1.0 - (-t / 20.0).exp()) + 0.03 * (t * 1.3).sin()),
        ("conversion", "%", |t| 100.0 * (1.0 - (-t / 15.0).exp())),
    ];

    let mut points = Vec::with_capacity(curves.len() * TIME_SERIES_STEPS as usize);
    for (parameter, unit, curve) in curves {
        for step in 0..TIME_SERIES_STEPS {
            let timestamp = (start + Duration::minutes(step)).format(crate::lims::DATETIME_FORMAT).to_string();
            points.push(SeedPoint { parameter, unit, time_step: step, timestamp, value: round(curve(step as f64)) });
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data_counts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let summary = store.load_sample_data().unwrap();
        assert_eq!(summary.molecules, 40);
        assert_eq!(summary.participants, 5);
        assert_eq!(summary.inventory, 5);
        assert_eq!(summary.tasks, 3);
        assert_eq!(summary.experiments, 4);
        assert_eq!(summary.samples, 20);
        assert_eq!(summary.measurements, 20);
        assert_eq!(summary.time_series_points, 200);

        let stats = store.stats().unwrap();
        assert_eq!(stats.rows("molecules"), Some(40));
        assert_eq!(stats.rows("time_series"), Some(200));
        assert!(!store.is_empty().unwrap());
    }

    #[test]
    fn test_sample_data_relations() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.load_sample_data().unwrap();

        let overview = store.reaction_overview(1).unwrap();
        assert_eq!(
            overview.equation,
            "Salicylic Acid + Acetic Anhydride -> Acetylsalicylic Acid (Aspirin) + Acetic Acid [Sulfuric Acid]"
        );

        let s020 = store.get_sample(20).unwrap();
        assert_eq!(s020.sample.sample_code, "S020");
        assert_eq!(s020.sample.collection_date.as_deref(), Some("2025-03-20"));
        assert_eq!(s020.experiment_name.as_deref(), Some("Exp-004"));

        let m6 = store.get_measurement(6).unwrap();
        assert_eq!(m6.measurement.parameter, "Fe Concentration");
        assert_eq!(m6.measurement.measurement_date.as_deref(), Some("2025-03-06 14:00:00"));

        assert_eq!(store.check_inventory("Chloroform").unwrap().unwrap().amount, 100);
        let series = store.list_series(1).unwrap();
        assert_eq!(series.len(), 4);
        assert!(series.iter().all(|s| s.data_points == TIME_SERIES_STEPS));
    }

    #[test]
    fn test_seed_smiles_all_parse() {
        for (name, smiles) in MOLECULES {
            assert!(crate::chem::smiles::parse(smiles).is_ok(), "{name}: {smiles}");
        }
    }

    #[test]
    fn test_reactor_run_is_deterministic() {
        let a = reactor_run();
        let b = reactor_run();
        assert_eq!(a.len(), 200);
        assert!(a.iter().zip(&b).all(|(x, y)| x.value == y.value && x.timestamp == y.timestamp));
        assert_eq!(a[0].timestamp, "2025-03-01 08:00:00");
        assert_eq!(a[49].timestamp, "2025-03-01 08:49:00");
    }
}
