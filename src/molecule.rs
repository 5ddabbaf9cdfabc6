//! Molecule records
//!
//! A molecule is an IUPAC name plus an optional SMILES string. JSON keys keep
//! the column names of the `molecules` table (`MoleculeUpacName`, `SMILES`).

use crate::chem::{self, Depiction, MolGraph};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A row of the molecules table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    pub id: i64,
    #[serde(rename = "MoleculeUpacName")]
    pub name: String,
    #[serde(rename = "SMILES")]
    pub smiles: Option<String>,
}

impl Molecule {
    /// Parse the stored SMILES string, if there is one.
    pub fn graph(&self) -> Result<MolGraph> {
        let smiles = self
            .smiles
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::validation(format!("molecule {} has no SMILES", self.id)))?;
        Ok(chem::smiles::parse(smiles)?)
    }

    /// Render the molecule for inline display.
    pub fn depict(&self) -> Result<MoleculeImage> {
        let graph = self.graph()?;
        Ok(MoleculeImage::from_graph(Some(self.id), self.smiles.clone().unwrap_or_default(), &graph))
    }
}

/// Insert payload for a molecule.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMolecule {
    #[serde(rename = "MoleculeUpacName")]
    pub name: String,
    #[serde(rename = "SMILES", default)]
    pub smiles: Option<String>,
}

impl NewMolecule {
    pub fn new(name: impl Into<String>, smiles: Option<&str>) -> Self {
        Self { name: name.into(), smiles: smiles.map(str::to_string) }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("MoleculeUpacName must not be empty"));
        }
        if let Some(smiles) = self.smiles.as_deref().filter(|s| !s.trim().is_empty()) {
            chem::smiles::parse(smiles)?;
        }
        Ok(())
    }
}

/// Update payload. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoleculeUpdate {
    #[serde(rename = "MoleculeUpacName", default)]
    pub name: Option<String>,
    #[serde(rename = "SMILES", default)]
    pub smiles: Option<String>,
}

impl MoleculeUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.smiles.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::validation("nothing to update"));
        }
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(Error::validation("MoleculeUpacName must not be empty"));
        }
        if let Some(smiles) = self.smiles.as_deref().filter(|s| !s.trim().is_empty()) {
            chem::smiles::parse(smiles)?;
        }
        Ok(())
    }
}

/// Rendered molecule: formula, weight and a base64 data URI of the drawing.
#[derive(Debug, Clone, Serialize)]
pub struct MoleculeImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub smiles: String,
    pub formula: String,
    pub molecular_weight: f64,
    pub image: String,
}

impl MoleculeImage {
    pub fn from_graph(id: Option<i64>, smiles: String, graph: &MolGraph) -> Self {
        let depiction = Depiction::new(graph);
        Self {
            id,
            smiles,
            formula: chem::formula::hill_formula(graph),
            molecular_weight: (chem::formula::molecular_weight(graph) * 100.0).round() / 100.0,
            image: depiction.data_uri(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_uses_column_names() {
        let m = Molecule { id: 3, name: "Ethanol".into(), smiles: Some("CCO".into()) };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["MoleculeUpacName"], "Ethanol");
        assert_eq!(json["SMILES"], "CCO");
    }

    #[test]
    fn test_new_molecule_rejects_bad_smiles() {
        let m = NewMolecule::new("Broken", Some("C1CC"));
        assert!(matches!(m.validate(), Err(Error::Smiles(_))));
        assert!(NewMolecule::new("Name only", None).validate().is_ok());
    }

    #[test]
    fn test_depict_aspirin() {
        let m = Molecule {
            id: 1,
            name: "Aspirin".into(),
            smiles: Some("CC(=O)Oc1ccccc1C(=O)O".into()),
        };
        let image = m.depict().unwrap();
        assert_eq!(image.formula, "C9H8O4");
        assert!((image.molecular_weight - 180.16).abs() < 0.01);
        assert!(image.image.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_depict_without_smiles_fails() {
        let m = Molecule { id: 9, name: "Unknown".into(), smiles: None };
        assert!(matches!(m.depict(), Err(Error::Validation(_))));
    }
}
