//! Inventory operations

use super::SqliteStore;
use super::molecules::non_blank;
use crate::inventory::{InventoryItem, InventoryUpdate, NewInventoryItem, StockLevel};
use crate::{Error, Result};
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    pub fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        let sql = format!("SELECT id, MoleculeUpacName, amount, unit FROM {} ORDER BY id", self.table("inventory"));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_item)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_inventory(&self, id: i64) -> Result<InventoryItem> {
        let sql = format!("SELECT id, MoleculeUpacName, amount, unit FROM {} WHERE id = ?1", self.table("inventory"));
        self.conn
            .query_row(&sql, [id], row_to_item)
            .optional()?
            .ok_or_else(|| Error::not_found("inventory item", id))
    }

    /// Insert a stock record. Names are unique.
    pub fn insert_inventory(&self, item: &NewInventoryItem) -> Result<i64> {
        item.validate()?;
        let sql = format!("INSERT INTO {} (MoleculeUpacName, amount, unit) VALUES (?1, ?2, ?3)", self.table("inventory"));
        self.conn
            .execute(&sql, params![item.name.trim(), item.amount, non_blank(item.unit.as_deref())])
            .map_err(|e| duplicate_name(e.into(), &item.name))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_inventory(&self, id: i64, update: &InventoryUpdate) -> Result<()> {
        update.validate()?;
        let sql = format!(
            "UPDATE {} SET MoleculeUpacName = COALESCE(?1, MoleculeUpacName), amount = COALESCE(?2, amount), unit = COALESCE(?3, unit) WHERE id = ?4",
            self.table("inventory")
        );
        let name = update.name.as_deref().map(str::trim);
        let changed = self
            .conn
            .execute(&sql, params![name, update.amount, update.unit.as_deref().map(str::trim), id])
            .map_err(|e| duplicate_name(e.into(), name.unwrap_or_default()))?;
        if changed == 0 {
            return Err(Error::not_found("inventory item", id));
        }
        Ok(())
    }

    pub fn delete_inventory(&self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.table("inventory"));
        if self.conn.execute(&sql, [id])? == 0 {
            return Err(Error::not_found("inventory item", id));
        }
        Ok(())
    }

    pub fn search_inventory(&self, query: &str) -> Result<Vec<InventoryItem>> {
        let sql = format!(
            "SELECT id, MoleculeUpacName, amount, unit FROM {} WHERE MoleculeUpacName LIKE ?1 ORDER BY MoleculeUpacName",
            self.table("inventory")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([format!("%{}%", query.trim())], row_to_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Stock on hand for an exact name, `None` when the chemical is not stocked
    pub fn check_inventory(&self, name: &str) -> Result<Option<StockLevel>> {
        let sql = format!("SELECT amount, unit FROM {} WHERE MoleculeUpacName = ?1", self.table("inventory"));
        let level = self
            .conn
            .query_row(&sql, [name.trim()], |row| Ok(StockLevel { amount: row.get(0)?, unit: row.get(1)? }))
            .optional()?;
        Ok(level)
    }
}

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem { id: row.get(0)?, name: row.get(1)?, amount: row.get(2)?, unit: row.get(3)? })
}

fn duplicate_name(err: Error, name: &str) -> Error {
    match err {
        Error::Conflict(_) => Error::Conflict(format!("inventory item '{}' already exists", name.trim())),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_crud() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert_inventory(&NewInventoryItem::new("Methanol", 500, Some("ml"))).unwrap();
        assert_eq!(store.get_inventory(id).unwrap().amount, 500);

        store.update_inventory(id, &InventoryUpdate { amount: Some(450), ..Default::default() }).unwrap();
        let item = store.get_inventory(id).unwrap();
        assert_eq!(item.amount, 450);
        assert_eq!(item.unit.as_deref(), Some("ml"));
        assert_eq!(item.name, "Methanol");

        store.delete_inventory(id).unwrap();
        assert!(store.list_inventory().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_name_conflicts() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_inventory(&NewInventoryItem::new("Ethanol", 300, Some("ml"))).unwrap();
        let err = store.insert_inventory(&NewInventoryItem::new("Ethanol", 10, None)).unwrap_err();
        assert!(matches!(err, Error::Conflict(ref m) if m.contains("Ethanol")));
    }

    #[test]
    fn test_negative_amount_rejected_before_sql() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.insert_inventory(&NewInventoryItem::new("Acetone", -1, None)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_check_constraint_guards_direct_sql() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sql = format!("INSERT INTO {} (MoleculeUpacName, amount) VALUES ('X', -5)", store.table("inventory"));
        let err: Error = store.conn.execute(&sql, []).unwrap_err().into();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_check_and_search() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_inventory(&NewInventoryItem::new("Toluene", 150, Some("ml"))).unwrap();
        store.insert_inventory(&NewInventoryItem::new("Chloroform", 100, Some("ml"))).unwrap();

        let level = store.check_inventory("Toluene").unwrap().unwrap();
        assert_eq!(level.to_string(), "150 ml");
        assert!(store.check_inventory("toluen").unwrap().is_none());
        assert_eq!(store.search_inventory("LUE").unwrap().len(), 1);
    }
}
