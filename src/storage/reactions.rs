//! Reaction and participant operations

use super::SqliteStore;
use crate::reaction::{
    NewParticipant, NewReaction, OverviewEntry, ParticipantRole, ParticipantUpdate, Reaction,
    ReactionOverview, ReactionParticipant, ReactionUpdate,
};
use crate::{Error, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{OptionalExtension, params};

impl ToSql for ParticipantRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ParticipantRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e: Error| FromSqlError::Other(Box::new(e)))
    }
}

impl SqliteStore {
    // ========== Reaction Operations ==========

    pub fn list_reactions(&self) -> Result<Vec<Reaction>> {
        let sql = format!(
            "SELECT ReactionID, ReactionName, ReactionDescription FROM {} ORDER BY ReactionID",
            self.table("reactions")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_reaction)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_reaction(&self, id: i64) -> Result<Reaction> {
        let sql = format!(
            "SELECT ReactionID, ReactionName, ReactionDescription FROM {} WHERE ReactionID = ?1",
            self.table("reactions")
        );
        self.conn
            .query_row(&sql, [id], row_to_reaction)
            .optional()?
            .ok_or_else(|| Error::not_found("reaction", id))
    }

    pub fn insert_reaction(&self, reaction: &NewReaction) -> Result<i64> {
        reaction.validate()?;
        let sql = format!(
            "INSERT INTO {} (ReactionName, ReactionDescription) VALUES (?1, ?2)",
            self.table("reactions")
        );
        self.conn.execute(&sql, params![reaction.name.trim(), reaction.description])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_reaction(&self, id: i64, update: &ReactionUpdate) -> Result<()> {
        update.validate()?;
        let sql = format!(
            "UPDATE {} SET ReactionName = COALESCE(?1, ReactionName), ReactionDescription = COALESCE(?2, ReactionDescription) WHERE ReactionID = ?3",
            self.table("reactions")
        );
        if self.conn.execute(&sql, params![update.name, update.description, id])? == 0 {
            return Err(Error::not_found("reaction", id));
        }
        Ok(())
    }

    /// Delete a reaction and its participants in one transaction
    pub fn delete_reaction(&self, id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!("DELETE FROM {} WHERE ReactionID = ?1", self.table("reactionparticipants")),
            [id],
        )?;
        let deleted = tx.execute(&format!("DELETE FROM {} WHERE ReactionID = ?1", self.table("reactions")), [id])?;
        if deleted == 0 {
            return Err(Error::not_found("reaction", id));
        }
        tx.commit()?;
        Ok(())
    }

    // ========== Participant Operations ==========

    pub fn list_participants(&self, reaction_id: i64) -> Result<Vec<ReactionParticipant>> {
        let sql = format!(
            "SELECT ReactionID, MoleculeID, Role, StoichiometricCoefficient FROM {} WHERE ReactionID = ?1 ORDER BY Role, MoleculeID",
            self.table("reactionparticipants")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([reaction_id], row_to_participant)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Add a molecule to a reaction. Both must exist; (molecule, role) is
    /// unique within a reaction.
    pub fn insert_participant(&self, reaction_id: i64, participant: &NewParticipant) -> Result<()> {
        participant.validate()?;
        let sql = format!(
            "INSERT INTO {} (ReactionID, MoleculeID, Role, StoichiometricCoefficient) VALUES (?1, ?2, ?3, ?4)",
            self.table("reactionparticipants")
        );
        self.conn
            .execute(
                &sql,
                params![reaction_id, participant.molecule_id, participant.role, participant.stoichiometric_coefficient],
            )
            .map_err(|e| match Error::from(e) {
                Error::Conflict(_) => Error::Conflict(format!(
                    "molecule {} is already a {} of reaction {reaction_id}",
                    participant.molecule_id, participant.role
                )),
                Error::Validation(msg) if msg.contains("FOREIGN KEY") => Error::Validation(format!(
                    "reaction {reaction_id} or molecule {} does not exist",
                    participant.molecule_id
                )),
                other => other,
            })?;
        Ok(())
    }

    pub fn update_participant(
        &self,
        reaction_id: i64,
        molecule_id: i64,
        role: ParticipantRole,
        update: &ParticipantUpdate,
    ) -> Result<()> {
        update.validate()?;
        let sql = format!(
            "UPDATE {} SET StoichiometricCoefficient = ?1, MoleculeID = COALESCE(?2, MoleculeID), Role = COALESCE(?3, Role) WHERE ReactionID = ?4 AND MoleculeID = ?5 AND Role = ?6",
            self.table("reactionparticipants")
        );
        let changed = self.conn.execute(
            &sql,
            params![update.stoichiometric_coefficient, update.molecule_id, update.role, reaction_id, molecule_id, role],
        )?;
        if changed == 0 {
            return Err(Error::not_found("participant", format!("{reaction_id}/{molecule_id}/{role}")));
        }
        Ok(())
    }

    pub fn delete_participant(&self, reaction_id: i64, molecule_id: i64, role: ParticipantRole) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE ReactionID = ?1 AND MoleculeID = ?2 AND Role = ?3",
            self.table("reactionparticipants")
        );
        if self.conn.execute(&sql, params![reaction_id, molecule_id, role])? == 0 {
            return Err(Error::not_found("participant", format!("{reaction_id}/{molecule_id}/{role}")));
        }
        Ok(())
    }

    /// Reaction with participants joined to molecule names, grouped by role
    pub fn reaction_overview(&self, reaction_id: i64) -> Result<ReactionOverview> {
        let reaction = self.get_reaction(reaction_id)?;
        let sql = format!(
            "SELECT p.MoleculeID, m.MoleculeUpacName, m.SMILES, p.Role, p.StoichiometricCoefficient
             FROM {} p LEFT JOIN {} m ON m.id = p.MoleculeID
             WHERE p.ReactionID = ?1
             ORDER BY p.MoleculeID",
            self.table("reactionparticipants"),
            self.table("molecules")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map([reaction_id], |row| {
                let molecule_id: i64 = row.get(0)?;
                let name: Option<String> = row.get(1)?;
                Ok(OverviewEntry {
                    molecule_id,
                    name: name.unwrap_or_else(|| format!("molecule {molecule_id}")),
                    smiles: row.get(2)?,
                    role: row.get(3)?,
                    coefficient: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ReactionOverview::new(reaction, entries))
    }
}

fn row_to_reaction(row: &rusqlite::Row) -> rusqlite::Result<Reaction> {
    Ok(Reaction { id: row.get(0)?, name: row.get(1)?, description: row.get(2)? })
}

fn row_to_participant(row: &rusqlite::Row) -> rusqlite::Result<ReactionParticipant> {
    Ok(ReactionParticipant {
        reaction_id: row.get(0)?,
        molecule_id: row.get(1)?,
        role: row.get(2)?,
        coefficient: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::NewMolecule;

    fn setup() -> (SqliteStore, i64, i64, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.insert_molecule(&NewMolecule::new("Salicylic Acid", Some("Oc1ccccc1C(=O)O"))).unwrap();
        let b = store.insert_molecule(&NewMolecule::new("Aspirin", Some("CC(=O)Oc1ccccc1C(=O)O"))).unwrap();
        let r = store
            .insert_reaction(&NewReaction { name: "Acetylation".into(), description: None })
            .unwrap();
        (store, r, a, b)
    }

    fn participant(molecule_id: i64, role: ParticipantRole) -> NewParticipant {
        NewParticipant { molecule_id, role, stoichiometric_coefficient: 1.0 }
    }

    #[test]
    fn test_participant_roundtrip() {
        let (store, r, a, b) = setup();
        store.insert_participant(r, &participant(a, ParticipantRole::Reactant)).unwrap();
        store.insert_participant(r, &participant(b, ParticipantRole::Product)).unwrap();

        let parts = store.list_participants(r).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().any(|p| p.molecule_id == a && p.role == ParticipantRole::Reactant));

        let update = ParticipantUpdate { stoichiometric_coefficient: 2.0, molecule_id: None, role: None };
        store.update_participant(r, a, ParticipantRole::Reactant, &update).unwrap();
        let overview = store.reaction_overview(r).unwrap();
        assert_eq!(overview.equation, "2 Salicylic Acid -> Aspirin");
    }

    #[test]
    fn test_duplicate_participant_conflicts() {
        let (store, r, a, _) = setup();
        store.insert_participant(r, &participant(a, ParticipantRole::Reactant)).unwrap();
        let err = store.insert_participant(r, &participant(a, ParticipantRole::Reactant)).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        // Same molecule in another role is fine
        store.insert_participant(r, &participant(a, ParticipantRole::Solvent)).unwrap();
    }

    #[test]
    fn test_participant_needs_existing_molecule() {
        let (store, r, _, _) = setup();
        let err = store.insert_participant(r, &participant(999, ParticipantRole::Catalyst)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_delete_reaction_removes_participants() {
        let (store, r, a, b) = setup();
        store.insert_participant(r, &participant(a, ParticipantRole::Reactant)).unwrap();
        store.insert_participant(r, &participant(b, ParticipantRole::Product)).unwrap();

        store.delete_reaction(r).unwrap();
        assert!(store.list_participants(r).unwrap().is_empty());
        assert!(matches!(store.get_reaction(r), Err(Error::NotFound { .. })));
        // Molecules survive
        assert_eq!(store.list_molecules().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_missing_participant() {
        let (store, r, a, _) = setup();
        let err = store.delete_participant(r, a, ParticipantRole::Reagent).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
