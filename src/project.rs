//! Projects and their tasks

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
}

impl NewProject {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("project name must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub description: String,
    /// Free text, often a JSON document describing the task parameters
    pub content: Option<String>,
}

impl Task {
    /// Content pretty-printed when it holds JSON, otherwise as stored.
    pub fn content_display(&self) -> String {
        let Some(content) = self.content.as_deref() else {
            return String::new();
        };
        serde_json::from_str::<serde_json::Value>(content)
            .ok()
            .filter(|v| v.is_object() || v.is_array())
            .and_then(|v| serde_json::to_string_pretty(&v).ok())
            .unwrap_or_else(|| content.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub project_id: i64,
    pub description: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl NewTask {
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::validation("task description must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl TaskUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_none() && self.description.is_none() && self.content.is_none() {
            return Err(Error::validation("nothing to update"));
        }
        if matches!(self.description.as_deref(), Some(d) if d.trim().is_empty()) {
            return Err(Error::validation("task description must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_display_pretty_prints_json() {
        let task = Task {
            id: 1,
            project_id: 1,
            description: "Optimize step 1".into(),
            content: Some(r#"{"type":"optimization","step":1}"#.into()),
        };
        let shown = task.content_display();
        assert!(shown.contains("\n"));
        assert!(shown.contains("\"step\": 1"));
    }

    #[test]
    fn test_content_display_plain_text() {
        let task = Task { id: 2, project_id: 1, description: "Notes".into(), content: Some("buy ice".into()) };
        assert_eq!(task.content_display(), "buy ice");
        let empty = Task { content: None, ..task };
        assert_eq!(empty.content_display(), "");
    }
}
