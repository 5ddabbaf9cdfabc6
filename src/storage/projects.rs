//! Project and task operations

use super::SqliteStore;
use crate::project::{NewProject, NewTask, Project, Task, TaskUpdate};
use crate::{Error, Result};
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    // ========== Project Operations ==========

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY id", self.table("project"));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| Ok(Project { id: row.get(0)?, name: row.get(1)? }))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_project(&self, id: i64) -> Result<Project> {
        let sql = format!("SELECT id, name FROM {} WHERE id = ?1", self.table("project"));
        self.conn
            .query_row(&sql, [id], |row| Ok(Project { id: row.get(0)?, name: row.get(1)? }))
            .optional()?
            .ok_or_else(|| Error::not_found("project", id))
    }

    pub fn insert_project(&self, project: &NewProject) -> Result<i64> {
        project.validate()?;
        let sql = format!("INSERT INTO {} (name) VALUES (?1)", self.table("project"));
        self.conn.execute(&sql, [project.name.trim()])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_project(&self, id: i64, project: &NewProject) -> Result<()> {
        project.validate()?;
        let sql = format!("UPDATE {} SET name = ?1 WHERE id = ?2", self.table("project"));
        if self.conn.execute(&sql, params![project.name.trim(), id])? == 0 {
            return Err(Error::not_found("project", id));
        }
        Ok(())
    }

    /// Delete a project and its tasks in one transaction
    pub fn delete_project(&self, id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(&format!("DELETE FROM {} WHERE project_id = ?1", self.table("task")), [id])?;
        let deleted = tx.execute(&format!("DELETE FROM {} WHERE id = ?1", self.table("project")), [id])?;
        if deleted == 0 {
            return Err(Error::not_found("project", id));
        }
        tx.commit()?;
        Ok(())
    }

    // ========== Task Operations ==========

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let sql = format!("SELECT id, project_id, description, content FROM {} ORDER BY id", self.table("task"));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_task)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_tasks_for_project(&self, project_id: i64) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT id, project_id, description, content FROM {} WHERE project_id = ?1 ORDER BY id",
            self.table("task")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([project_id], row_to_task)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_task(&self, id: i64) -> Result<Task> {
        let sql = format!("SELECT id, project_id, description, content FROM {} WHERE id = ?1", self.table("task"));
        self.conn
            .query_row(&sql, [id], row_to_task)
            .optional()?
            .ok_or_else(|| Error::not_found("task", id))
    }

    /// Insert a task; the project must exist
    pub fn insert_task(&self, task: &NewTask) -> Result<i64> {
        task.validate()?;
        let sql = format!("INSERT INTO {} (project_id, description, content) VALUES (?1, ?2, ?3)", self.table("task"));
        self.conn
            .execute(&sql, params![task.project_id, task.description.trim(), task.content])
            .map_err(|e| missing_project(e.into(), task.project_id))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_task(&self, id: i64, update: &TaskUpdate) -> Result<()> {
        update.validate()?;
        let sql = format!(
            "UPDATE {} SET project_id = COALESCE(?1, project_id), description = COALESCE(?2, description), content = COALESCE(?3, content) WHERE id = ?4",
            self.table("task")
        );
        let changed = self
            .conn
            .execute(&sql, params![update.project_id, update.description.as_deref().map(str::trim), update.content, id])
            .map_err(|e| match update.project_id {
                Some(project_id) => missing_project(e.into(), project_id),
                None => e.into(),
            })?;
        if changed == 0 {
            return Err(Error::not_found("task", id));
        }
        Ok(())
    }

    pub fn delete_task(&self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.table("task"));
        if self.conn.execute(&sql, [id])? == 0 {
            return Err(Error::not_found("task", id));
        }
        Ok(())
    }
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task { id: row.get(0)?, project_id: row.get(1)?, description: row.get(2)?, content: row.get(3)? })
}

fn missing_project(err: Error, project_id: i64) -> Error {
    match err {
        Error::Validation(msg) if msg.contains("FOREIGN KEY") => {
            Error::Validation(format!("project {project_id} does not exist"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(store: &SqliteStore, name: &str) -> i64 {
        store.insert_project(&NewProject { name: name.into() }).unwrap()
    }

    fn task(project_id: i64, description: &str) -> NewTask {
        NewTask { project_id, description: description.into(), content: Some(r#"{"step": 1}"#.into()) }
    }

    #[test]
    fn test_project_crud() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = project(&store, "Aspirin synthesis optimization");
        store.update_project(id, &NewProject { name: "Aspirin scale-up".into() }).unwrap();
        assert_eq!(store.get_project(id).unwrap().name, "Aspirin scale-up");
        assert_eq!(store.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_project_removes_tasks() {
        let store = SqliteStore::open_in_memory().unwrap();
        let keep = project(&store, "Keep");
        let drop = project(&store, "Drop");
        store.insert_task(&task(drop, "one")).unwrap();
        store.insert_task(&task(drop, "two")).unwrap();
        store.insert_task(&task(keep, "three")).unwrap();

        store.delete_project(drop).unwrap();
        let tasks = store.list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].project_id, keep);
        assert!(matches!(store.delete_project(drop), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_task_requires_project() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.insert_task(&task(99, "orphan")).unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("project 99")));
    }

    #[test]
    fn test_update_task_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        let p = project(&store, "P");
        let id = store.insert_task(&task(p, "Optimize step 1")).unwrap();

        let update = TaskUpdate { description: Some("Optimize step 1b".into()), ..Default::default() };
        store.update_task(id, &update).unwrap();
        let t = store.get_task(id).unwrap();
        assert_eq!(t.description, "Optimize step 1b");
        assert_eq!(t.content.as_deref(), Some(r#"{"step": 1}"#));
        assert_eq!(store.list_tasks_for_project(p).unwrap().len(), 1);

        store.delete_task(id).unwrap();
        assert!(matches!(store.get_task(id), Err(Error::NotFound { .. })));
    }
}
