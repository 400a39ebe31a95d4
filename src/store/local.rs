use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{Outcome, Readiness, TaskStore};
use crate::domain::task::{Task, TaskId};

/// File-backed store: the whole task list lives in one JSON blob that is
/// rewritten after every mutation. Absent or unparsable content reads as an
/// empty list. The in-memory list is only updated once the blob write
/// succeeded, so a failed write leaves the visible state at its pre-call
/// value.
pub struct LocalStore {
    path: PathBuf,
    items: Vec<Task>,
}

impl LocalStore {
    pub fn open_default() -> Result<Self> {
        Self::open(default_store_path()?)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create store dir {}", parent.display()))?;
        }
        let items = load_blob(&path);
        Ok(Self { path, items })
    }

    fn persist(&self, items: &[Task]) -> Result<()> {
        let blob = serde_json::to_string(items).context("failed to serialize tasks")?;
        std::fs::write(&self.path, blob)
            .with_context(|| format!("failed to write store {}", self.path.display()))
    }
}

impl TaskStore for LocalStore {
    fn readiness(&self) -> Readiness {
        Readiness::Ready
    }

    fn tasks(&self) -> Vec<Task> {
        self.items.clone()
    }

    fn add(&mut self, text: &str) -> Result<Outcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Outcome::Rejected);
        }
        let task = Task::new(text);
        let mut next = self.items.clone();
        next.push(task.clone());
        self.persist(&next)?;
        self.items = next;
        Ok(Outcome::Done(task))
    }

    fn toggle(&mut self, id: &TaskId) -> Result<Outcome> {
        let Some(pos) = self.items.iter().position(|t| t.id == *id) else {
            return Ok(Outcome::NotFound);
        };
        let mut next = self.items.clone();
        next[pos].completed = !next[pos].completed;
        self.persist(&next)?;
        self.items = next;
        Ok(Outcome::Done(self.items[pos].clone()))
    }

    fn delete(&mut self, id: &TaskId) -> Result<Outcome> {
        let Some(pos) = self.items.iter().position(|t| t.id == *id) else {
            return Ok(Outcome::NotFound);
        };
        let mut next = self.items.clone();
        let removed = next.remove(pos);
        self.persist(&next)?;
        self.items = next;
        Ok(Outcome::Done(removed))
    }

    fn refresh(&mut self) -> Result<()> {
        self.items = load_blob(&self.path);
        Ok(())
    }
}

fn load_blob(path: &Path) -> Vec<Task> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    serde_json::from_str(&raw).unwrap_or_default()
}

fn default_store_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("failed to resolve data dir")?;
    Ok(base.join("tana").join("tasks.json"))
}
