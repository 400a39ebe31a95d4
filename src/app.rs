use crate::domain::task::{Task, TaskId};
use crate::store::{Outcome, Readiness, StoreEvent, TaskStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Stable partition of the snapshot: incomplete first, completed after,
/// insertion order kept within each section.
pub fn partition(tasks: &[Task]) -> (Vec<Task>, Vec<Task>) {
    tasks.iter().cloned().partition(|t| !t.completed)
}

pub struct App<S: TaskStore> {
    store: S,
    pub incomplete: Vec<Task>,
    pub completed: Vec<Task>,
    /// Cursor over the rendered order, incomplete section first.
    pub selected: usize,
    pub mode: InputMode,
    pub input: String,
    pub status: Option<String>,
}

impl<S: TaskStore> App<S> {
    pub fn new(store: S) -> Self {
        let mut app = Self {
            store,
            incomplete: Vec::new(),
            completed: Vec::new(),
            selected: 0,
            mode: InputMode::Normal,
            input: String::new(),
            status: None,
        };
        app.reload();
        app
    }

    pub fn readiness(&self) -> Readiness {
        self.store.readiness()
    }

    /// Re-read the store snapshot and clamp the cursor.
    pub fn reload(&mut self) {
        let (incomplete, completed) = partition(&self.store.tasks());
        self.incomplete = incomplete;
        self.completed = completed;
        if self.selected >= self.len() && !self.is_empty() {
            self.selected = self.len() - 1;
        }
    }

    /// Ask the backend for fresh state, then re-read.
    pub fn refresh(&mut self) {
        match self.store.refresh() {
            Ok(()) => {
                self.reload();
                self.set_status("Reloaded");
            }
            Err(e) => self.set_status(&format!("Reload failed: {e:#}")),
        }
    }

    pub fn len(&self) -> usize {
        self.incomplete.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incomplete.is_empty() && self.completed.is_empty()
    }

    pub fn task_at(&self, index: usize) -> Option<&Task> {
        if index < self.incomplete.len() {
            self.incomplete.get(index)
        } else {
            self.completed.get(index - self.incomplete.len())
        }
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.task_at(self.selected).map(|t| t.id.clone())
    }

    pub fn select_next(&mut self) {
        if !self.is_empty() {
            self.selected = (self.selected + 1).min(self.len() - 1);
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.store.toggle(&id) {
            Ok(Outcome::Done(_)) => {
                self.reload();
                self.set_status("Toggled completion");
            }
            Ok(Outcome::Pending) => self.set_status("Saving..."),
            Ok(Outcome::NotFound) => {
                self.reload();
                self.set_status("Task is gone");
            }
            Ok(Outcome::Rejected) => {}
            Err(e) => self.set_status(&format!("Toggle failed: {e:#}")),
        }
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.store.delete(&id) {
            Ok(Outcome::Done(_)) => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
                self.reload();
                self.set_status("Deleted");
            }
            Ok(Outcome::Pending) => self.set_status("Deleting..."),
            Ok(Outcome::NotFound) => {
                self.reload();
                self.set_status("Task is gone");
            }
            Ok(Outcome::Rejected) => {}
            Err(e) => self.set_status(&format!("Delete failed: {e:#}")),
        }
    }

    pub fn add_task(&mut self) {
        if self.input.trim().is_empty() {
            self.set_status("Cannot add an empty task");
            return;
        }
        let text = self.input.trim().to_owned();
        match self.store.add(&text) {
            Ok(Outcome::Done(_)) => {
                self.reload();
                // Land the cursor on the new task, at the end of the
                // incomplete section.
                if !self.incomplete.is_empty() {
                    self.selected = self.incomplete.len() - 1;
                }
                self.set_status("Added");
            }
            Ok(Outcome::Pending) => self.set_status("Adding..."),
            Ok(Outcome::Rejected) => self.set_status("Cannot add an empty task"),
            Ok(Outcome::NotFound) => {}
            Err(e) => self.set_status(&format!("Add failed: {e:#}")),
        }
        self.input.clear();
        self.mode = InputMode::Normal;
    }

    /// Drain async completions each tick; for the remote backend this is
    /// the only place confirmed changes enter the visible state.
    pub fn poll_store(&mut self) {
        let events = self.store.poll();
        if events.is_empty() {
            return;
        }
        for event in events {
            match event {
                StoreEvent::Loaded(count) => {
                    self.set_status(&format!("Loaded {count} tasks"));
                }
                StoreEvent::LoadFailed(err) => {
                    self.set_status(&format!("Load failed: {err}"));
                }
                StoreEvent::Added(task) => {
                    self.set_status(&format!("Added \"{}\"", task.text));
                }
                StoreEvent::Toggled(_) => self.set_status("Toggled completion"),
                StoreEvent::Deleted(_) => self.set_status("Deleted"),
                StoreEvent::Failed(err) => self.set_status(&err),
            }
        }
        self.reload();
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status = Some(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn seeded_app() -> App<MemoryStore> {
        let mut store = MemoryStore::default();
        store.add("one").unwrap();
        store.add("two").unwrap();
        store.add("three").unwrap();
        let two = store.tasks()[1].id.clone();
        store.toggle(&two).unwrap();
        App::new(store)
    }

    #[test]
    fn partition_is_stable_and_exhaustive() {
        let app = seeded_app();
        assert_eq!(
            app.incomplete
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>(),
            vec!["one", "three"]
        );
        assert_eq!(
            app.completed
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>(),
            vec!["two"]
        );

        // Every task lands in exactly one section.
        assert_eq!(app.len(), 3);
        assert!(app.incomplete.iter().all(|t| !t.completed));
        assert!(app.completed.iter().all(|t| t.completed));
    }

    #[test]
    fn cursor_runs_over_both_sections() {
        let mut app = seeded_app();
        assert_eq!(app.task_at(0).unwrap().text, "one");
        assert_eq!(app.task_at(2).unwrap().text, "two");
        assert!(app.task_at(3).is_none());

        app.select_next();
        app.select_next();
        app.select_next(); // clamped at the end
        assert_eq!(app.selected, 2);
        app.select_previous();
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn empty_input_is_not_added() {
        let mut app = App::new(MemoryStore::default());
        app.input = "   ".to_string();
        app.mode = InputMode::Editing;
        app.add_task();
        assert!(app.is_empty());
    }

    #[test]
    fn toggling_moves_a_task_between_sections() {
        let mut app = App::new(MemoryStore::default());
        app.input = "Buy milk".to_string();
        app.add_task();
        assert_eq!(app.incomplete.len(), 1);
        assert!(app.completed.is_empty());

        app.toggle_selected();
        assert!(app.incomplete.is_empty());
        assert_eq!(app.completed.len(), 1);

        app.delete_selected();
        assert!(app.is_empty());
    }

    #[test]
    fn cursor_clamps_after_delete() {
        let mut app = seeded_app();
        app.selected = 2;
        app.delete_selected();
        assert_eq!(app.len(), 2);
        assert!(app.selected < app.len());
    }
}
