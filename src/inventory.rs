//! Inventory records - stock of a chemical by name

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    #[serde(rename = "MoleculeUpacName")]
    pub name: String,
    pub amount: i64,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInventoryItem {
    #[serde(rename = "MoleculeUpacName")]
    pub name: String,
    pub amount: i64,
    #[serde(default)]
    pub unit: Option<String>,
}

impl NewInventoryItem {
    pub fn new(name: impl Into<String>, amount: i64, unit: Option<&str>) -> Self {
        Self { name: name.into(), amount, unit: unit.map(str::to_string) }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("MoleculeUpacName must not be empty"));
        }
        check_amount(self.amount)
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryUpdate {
    #[serde(rename = "MoleculeUpacName", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl InventoryUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_none() && self.amount.is_none() && self.unit.is_none() {
            return Err(Error::validation("nothing to update"));
        }
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(Error::validation("MoleculeUpacName must not be empty"));
        }
        match self.amount {
            Some(amount) => check_amount(amount),
            None => Ok(()),
        }
    }
}

/// Result of a stock check by exact name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockLevel {
    pub amount: i64,
    pub unit: Option<String>,
}

impl std::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.unit {
            Some(unit) if !unit.is_empty() => write!(f, "{} {}", self.amount, unit),
            _ => write!(f, "{}", self.amount),
        }
    }
}

fn check_amount(amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(Error::validation(format!("amount must be >= 0, got {amount}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_amount_rejected() {
        assert!(NewInventoryItem::new("Methanol", -1, Some("ml")).validate().is_err());
        assert!(NewInventoryItem::new("Methanol", 0, Some("ml")).validate().is_ok());
        let update = InventoryUpdate { amount: Some(-5), ..Default::default() };
        assert!(matches!(update.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_empty_update_rejected() {
        assert!(InventoryUpdate::default().validate().is_err());
    }

    #[test]
    fn test_stock_level_display() {
        let s = StockLevel { amount: 500, unit: Some("ml".into()) };
        assert_eq!(s.to_string(), "500 ml");
        assert_eq!(StockLevel { amount: 3, unit: None }.to_string(), "3");
    }
}
