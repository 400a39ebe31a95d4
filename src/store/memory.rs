use std::collections::VecDeque;

use anyhow::Result;

use super::{Outcome, Readiness, TaskStore};
use crate::domain::task::{Task, TaskId};

#[derive(Default)]
pub struct MemoryStore {
    items: VecDeque<Task>,
}

impl MemoryStore {
    pub fn with_seed(seed: impl IntoIterator<Item = Task>) -> Self {
        let mut store = Self::default();
        store.items.extend(seed);
        store
    }
}

impl TaskStore for MemoryStore {
    fn readiness(&self) -> Readiness {
        Readiness::Ready
    }

    fn tasks(&self) -> Vec<Task> {
        self.items.iter().cloned().collect()
    }

    fn add(&mut self, text: &str) -> Result<Outcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Outcome::Rejected);
        }
        let task = Task::new(text);
        self.items.push_back(task.clone());
        Ok(Outcome::Done(task))
    }

    fn toggle(&mut self, id: &TaskId) -> Result<Outcome> {
        for task in &mut self.items {
            if task.id == *id {
                task.completed = !task.completed;
                return Ok(Outcome::Done(task.clone()));
            }
        }
        Ok(Outcome::NotFound)
    }

    fn delete(&mut self, id: &TaskId) -> Result<Outcome> {
        let Some(pos) = self.items.iter().position(|t| t.id == *id) else {
            return Ok(Outcome::NotFound);
        };
        match self.items.remove(pos) {
            Some(task) => Ok(Outcome::Done(task)),
            None => Ok(Outcome::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_creates_an_open_task() {
        let mut store = MemoryStore::default();
        let outcome = store.add("Buy milk").unwrap();

        let Outcome::Done(task) = outcome else {
            panic!("expected Done, got {outcome:?}");
        };
        assert!(!task.completed);
        assert_eq!(task.text, "Buy milk");
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn add_trims_and_rejects_empty_input() {
        let mut store = MemoryStore::default();
        assert_eq!(store.add("").unwrap(), Outcome::Rejected);
        assert_eq!(store.add("   ").unwrap(), Outcome::Rejected);
        assert!(store.tasks().is_empty());

        let Outcome::Done(task) = store.add("  padded  ").unwrap() else {
            panic!("expected Done");
        };
        assert_eq!(task.text, "padded");
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        let mut store = MemoryStore::default();
        let Outcome::Done(task) = store.add("flip me").unwrap() else {
            panic!("expected Done");
        };

        let Outcome::Done(once) = store.toggle(&task.id).unwrap() else {
            panic!("expected Done");
        };
        assert!(once.completed);

        let Outcome::Done(twice) = store.toggle(&task.id).unwrap() else {
            panic!("expected Done");
        };
        assert!(!twice.completed);
        assert_eq!(store.tasks(), vec![twice]);
    }

    #[test]
    fn absent_id_is_a_no_op() {
        let mut store = MemoryStore::default();
        store.add("keep me").unwrap();
        let ghost = TaskId::generate();

        assert_eq!(store.toggle(&ghost).unwrap(), Outcome::NotFound);
        assert_eq!(store.delete(&ghost).unwrap(), Outcome::NotFound);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn delete_removes_exactly_one_and_is_idempotent() {
        let mut store = MemoryStore::default();
        let Outcome::Done(first) = store.add("first").unwrap() else {
            panic!("expected Done");
        };
        store.add("second").unwrap();

        assert!(matches!(store.delete(&first.id).unwrap(), Outcome::Done(_)));
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.delete(&first.id).unwrap(), Outcome::NotFound);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn add_toggle_delete_scenario() {
        let mut store = MemoryStore::default();
        assert!(store.tasks().is_empty());

        let Outcome::Done(task) = store.add("Buy milk").unwrap() else {
            panic!("expected Done");
        };
        assert_eq!(store.tasks().len(), 1);
        assert!(!store.tasks()[0].completed);

        store.toggle(&task.id).unwrap();
        assert!(store.tasks()[0].completed);

        store.delete(&task.id).unwrap();
        assert!(store.tasks().is_empty());
    }
}
