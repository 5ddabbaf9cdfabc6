//! Reactions and reaction participants
//!
//! A participant links a molecule to a reaction in a role with a
//! stoichiometric coefficient. (ReactionID, MoleculeID, Role) is the key.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    #[serde(rename = "ReactionID")]
    pub id: i64,
    #[serde(rename = "ReactionName")]
    pub name: Option<String>,
    #[serde(rename = "ReactionDescription")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReaction {
    #[serde(rename = "ReactionName")]
    pub name: String,
    #[serde(rename = "ReactionDescription", default)]
    pub description: Option<String>,
}

impl NewReaction {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("ReactionName must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReactionUpdate {
    #[serde(rename = "ReactionName", default)]
    pub name: Option<String>,
    #[serde(rename = "ReactionDescription", default)]
    pub description: Option<String>,
}

impl ReactionUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_none() && self.description.is_none() {
            return Err(Error::validation("nothing to update"));
        }
        Ok(())
    }
}

/// Role a molecule plays in a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Reactant,
    Product,
    Catalyst,
    Solvent,
    Reagent,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Reactant => "reactant",
            ParticipantRole::Product => "product",
            ParticipantRole::Catalyst => "catalyst",
            ParticipantRole::Solvent => "solvent",
            ParticipantRole::Reagent => "reagent",
        }
    }

    pub fn all() -> &'static [ParticipantRole] {
        &[
            ParticipantRole::Reactant,
            ParticipantRole::Product,
            ParticipantRole::Catalyst,
            ParticipantRole::Solvent,
            ParticipantRole::Reagent,
        ]
    }
}

impl FromStr for ParticipantRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reactant" | "reactants" | "educt" => Ok(ParticipantRole::Reactant),
            "product" | "products" => Ok(ParticipantRole::Product),
            "catalyst" | "cat" => Ok(ParticipantRole::Catalyst),
            "solvent" => Ok(ParticipantRole::Solvent),
            "reagent" => Ok(ParticipantRole::Reagent),
            _ => Err(Error::validation(format!("unknown participant role: {s}"))),
        }
    }
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionParticipant {
    #[serde(rename = "ReactionID")]
    pub reaction_id: i64,
    #[serde(rename = "MoleculeID")]
    pub molecule_id: i64,
    #[serde(rename = "Role")]
    pub role: ParticipantRole,
    #[serde(rename = "StoichiometricCoefficient")]
    pub coefficient: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewParticipant {
    pub molecule_id: i64,
    pub role: ParticipantRole,
    pub stoichiometric_coefficient: f64,
}

impl NewParticipant {
    pub fn validate(&self) -> Result<()> {
        check_coefficient(self.stoichiometric_coefficient)
    }
}

/// Coefficient change, optionally re-pointing the participant to another
/// molecule or role.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantUpdate {
    pub stoichiometric_coefficient: f64,
    #[serde(default)]
    pub molecule_id: Option<i64>,
    #[serde(default)]
    pub role: Option<ParticipantRole>,
}

impl ParticipantUpdate {
    pub fn validate(&self) -> Result<()> {
        check_coefficient(self.stoichiometric_coefficient)
    }
}

fn check_coefficient(c: f64) -> Result<()> {
    if !c.is_finite() || c <= 0.0 {
        return Err(Error::validation(format!("stoichiometric coefficient must be > 0, got {c}")));
    }
    Ok(())
}

/// Participant joined with its molecule.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewEntry {
    pub molecule_id: i64,
    pub name: String,
    pub smiles: Option<String>,
    pub role: ParticipantRole,
    pub coefficient: f64,
}

impl OverviewEntry {
    fn term(&self) -> String {
        if (self.coefficient - 1.0).abs() < 1e-9 {
            self.name.clone()
        } else {
            format!("{} {}", format_coefficient(self.coefficient), self.name)
        }
    }
}

/// A reaction with its participants grouped by role.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionOverview {
    pub reaction: Reaction,
    pub reactants: Vec<OverviewEntry>,
    pub products: Vec<OverviewEntry>,
    /// Catalysts, solvents and reagents
    pub conditions: Vec<OverviewEntry>,
    pub equation: String,
}

impl ReactionOverview {
    pub fn new(reaction: Reaction, entries: Vec<OverviewEntry>) -> Self {
        let mut reactants = Vec::new();
        let mut products = Vec::new();
        let mut conditions = Vec::new();
        for entry in entries {
            match entry.role {
                ParticipantRole::Reactant => reactants.push(entry),
                ParticipantRole::Product => products.push(entry),
                _ => conditions.push(entry),
            }
        }

        let side = |entries: &[OverviewEntry]| {
            entries.iter().map(OverviewEntry::term).collect::<Vec<_>>().join(" + ")
        };
        let mut equation = format!("{} -> {}", side(&reactants), side(&products));
        if !conditions.is_empty() {
            let names: Vec<&str> = conditions.iter().map(|e| e.name.as_str()).collect();
            equation.push_str(&format!(" [{}]", names.join(", ")));
        }

        Self { reaction, reactants, products, conditions, equation }
    }
}

fn format_coefficient(c: f64) -> String {
    if c.fract() == 0.0 {
        format!("{c:.0}")
    } else {
        let s = format!("{c:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, name: &str, role: ParticipantRole, coefficient: f64) -> OverviewEntry {
        OverviewEntry { molecule_id: id, name: name.into(), smiles: None, role, coefficient }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Reactant".parse::<ParticipantRole>().unwrap(), ParticipantRole::Reactant);
        assert_eq!(" catalyst ".parse::<ParticipantRole>().unwrap(), ParticipantRole::Catalyst);
        assert!("spectator".parse::<ParticipantRole>().is_err());
    }

    #[test]
    fn test_overview_equation() {
        let reaction = Reaction { id: 1, name: Some("Aspirin Synthesis".into()), description: None };
        let overview = ReactionOverview::new(
            reaction,
            vec![
                entry(1, "Salicylic Acid", ParticipantRole::Reactant, 1.0),
                entry(2, "Acetic Anhydride", ParticipantRole::Reactant, 1.0),
                entry(5, "Sulfuric Acid", ParticipantRole::Catalyst, 0.1),
                entry(3, "Acetylsalicylic Acid (Aspirin)", ParticipantRole::Product, 1.0),
                entry(4, "Acetic Acid", ParticipantRole::Product, 1.0),
            ],
        );
        assert_eq!(
            overview.equation,
            "Salicylic Acid + Acetic Anhydride -> Acetylsalicylic Acid (Aspirin) + Acetic Acid [Sulfuric Acid]"
        );
        assert_eq!(overview.conditions.len(), 1);
    }

    #[test]
    fn test_coefficients_in_equation() {
        let reaction = Reaction { id: 2, name: None, description: None };
        let overview = ReactionOverview::new(
            reaction,
            vec![
                entry(1, "H2", ParticipantRole::Reactant, 2.0),
                entry(2, "O2", ParticipantRole::Reactant, 1.0),
                entry(3, "H2O", ParticipantRole::Product, 2.0),
            ],
        );
        assert_eq!(overview.equation, "2 H2 + O2 -> 2 H2O");
        assert_eq!(format_coefficient(0.25), "0.25");
    }

    #[test]
    fn test_coefficient_must_be_positive() {
        let p = NewParticipant { molecule_id: 1, role: ParticipantRole::Product, stoichiometric_coefficient: 0.0 };
        assert!(p.validate().is_err());
    }
}
