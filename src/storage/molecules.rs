//! Molecule operations

use super::SqliteStore;
use crate::molecule::{Molecule, MoleculeUpdate, NewMolecule};
use crate::{Error, Result};
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    pub fn list_molecules(&self) -> Result<Vec<Molecule>> {
        let sql = format!("SELECT id, MoleculeUpacName, SMILES FROM {} ORDER BY id", self.table("molecules"));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_molecule)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_molecule(&self, id: i64) -> Result<Molecule> {
        let sql = format!("SELECT id, MoleculeUpacName, SMILES FROM {} WHERE id = ?1", self.table("molecules"));
        self.conn
            .query_row(&sql, [id], row_to_molecule)
            .optional()?
            .ok_or_else(|| Error::not_found("molecule", id))
    }

    /// Insert a molecule, returning its id
    pub fn insert_molecule(&self, molecule: &NewMolecule) -> Result<i64> {
        molecule.validate()?;
        let sql = format!("INSERT INTO {} (MoleculeUpacName, SMILES) VALUES (?1, ?2)", self.table("molecules"));
        self.conn.execute(&sql, params![molecule.name.trim(), non_blank(molecule.smiles.as_deref())])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Change name and/or SMILES; absent fields are kept, a blank SMILES
    /// clears the stored one
    pub fn update_molecule(&self, id: i64, update: &MoleculeUpdate) -> Result<()> {
        update.validate()?;
        let sql = format!(
            "UPDATE {} SET MoleculeUpacName = COALESCE(?1, MoleculeUpacName),
             SMILES = CASE WHEN ?2 THEN NULL ELSE COALESCE(?3, SMILES) END WHERE id = ?4",
            self.table("molecules")
        );
        let smiles = update.smiles.as_deref();
        let clear_smiles = smiles.is_some() && non_blank(smiles).is_none();
        let changed = self.conn.execute(
            &sql,
            params![update.name.as_deref().map(str::trim), clear_smiles, non_blank(smiles), id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("molecule", id));
        }
        Ok(())
    }

    pub fn delete_molecule(&self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.table("molecules"));
        if self.conn.execute(&sql, [id])? == 0 {
            return Err(Error::not_found("molecule", id));
        }
        Ok(())
    }

    /// Molecules whose name contains `query` (case-insensitive)
    pub fn search_molecules(&self, query: &str) -> Result<Vec<Molecule>> {
        let sql = format!(
            "SELECT id, MoleculeUpacName, SMILES FROM {} WHERE MoleculeUpacName LIKE ?1 ORDER BY MoleculeUpacName",
            self.table("molecules")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pattern = format!("%{}%", query.trim());
        let rows = stmt.query_map([pattern], row_to_molecule)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn row_to_molecule(row: &rusqlite::Row) -> rusqlite::Result<Molecule> {
    Ok(Molecule { id: row.get(0)?, name: row.get(1)?, smiles: row.get(2)? })
}

pub(crate) fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
