//! Task store: rehydrates state from a [`KeyValueStore`], applies actions
//! through the reducer and persists every change.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::storage::{KeyValueStore, CORRUPT_TASKS_KEY, TASKS_KEY, THEME_KEY};
use crate::task::{self, Action, TaskList, Transition};
use crate::theme::Theme;

const CORRUPT_WARNING: &str =
    "Stored tasks could not be read; starting with an empty list (raw data kept in tasks.corrupt)";

pub struct TaskStore<S> {
    backend: S,
    tasks: TaskList,
    theme: Theme,
    load_warning: Option<String>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Read both entries once. Unreadable task data opens as an empty list.
    pub fn open(mut backend: S) -> Result<Self> {
        let (tasks, load_warning) = load_tasks(&mut backend)?;
        let theme = Theme::from_stored(backend.get(THEME_KEY)?.as_deref());
        tracing::debug!(tasks = tasks.len(), theme = %theme, "opened task store");
        Ok(Self {
            backend,
            tasks,
            theme,
            load_warning,
        })
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    pub fn take_load_warning(&mut self) -> Option<String> {
        self.load_warning.take()
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Transition> {
        self.dispatch_at(action, Utc::now())
    }

    /// Apply `action` as of `now` to the latest stored collection.
    ///
    /// The read, reduce and write happen under the backend's exclusive
    /// section, so tasks written by another process since this store opened
    /// are kept. The collection is written only when it changed.
    pub fn dispatch_at(&mut self, action: Action, now: DateTime<Utc>) -> Result<Transition> {
        let (latest, warning, outcome) = self.backend.exclusive(|backend| {
            let (latest, warning) = load_tasks(backend)?;
            let outcome = task::reduce(&latest, action, now);
            if let Ok(transition) = &outcome {
                if transition.changed {
                    persist(backend, &transition.tasks)?;
                }
            }
            Ok((latest, warning, outcome))
        })?;
        if warning.is_some() {
            self.load_warning = warning;
        }
        match outcome {
            Ok(transition) => {
                self.tasks = if transition.changed {
                    transition.tasks.clone()
                } else {
                    latest
                };
                Ok(transition)
            }
            Err(err) => {
                self.tasks = latest;
                Err(err)
            }
        }
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<Theme> {
        self.backend.set(THEME_KEY, theme.as_str())?;
        tracing::debug!(theme = %theme, "theme saved");
        self.theme = theme;
        Ok(theme)
    }

    /// Flip the stored theme, reading it fresh so another writer's choice is the base.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.backend.exclusive(|backend| {
            let current = Theme::from_stored(backend.get(THEME_KEY)?.as_deref());
            let next = current.toggle();
            backend.set(THEME_KEY, next.as_str())?;
            Ok(next)
        })?;
        tracing::debug!(theme = %theme, "theme saved");
        self.theme = theme;
        Ok(theme)
    }

    /// Re-read both entries, picking up writes from other processes.
    pub fn reload(&mut self) -> Result<()> {
        let (tasks, warning) = load_tasks(&mut self.backend)?;
        self.tasks = tasks;
        self.theme = Theme::from_stored(self.backend.get(THEME_KEY)?.as_deref());
        if warning.is_some() {
            self.load_warning = warning;
        }
        Ok(())
    }
}

fn persist<S: KeyValueStore>(backend: &mut S, tasks: &TaskList) -> Result<()> {
    let encoded = serde_json::to_string(tasks)?;
    backend.set(TASKS_KEY, &encoded)?;
    tracing::debug!(tasks = tasks.len(), "tasks saved");
    Ok(())
}

fn load_tasks<S: KeyValueStore>(backend: &mut S) -> Result<(TaskList, Option<String>)> {
    let Some(raw) = backend.get(TASKS_KEY)? else {
        return Ok((TaskList::default(), None));
    };
    if raw.trim().is_empty() {
        return Ok((TaskList::default(), None));
    }
    match serde_json::from_str::<TaskList>(&raw) {
        Ok(tasks) => Ok((tasks, None)),
        Err(err) => {
            tracing::warn!(error = %err, "stored tasks are unreadable; keeping a copy");
            backend.set(CORRUPT_TASKS_KEY, &raw)?;
            Ok((TaskList::default(), Some(CORRUPT_WARNING.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::MemoryStore;
    use crate::task::{Category, NewTask, Priority};
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("timestamp")
    }

    fn add(store: &mut TaskStore<MemoryStore>, text: &str, ms: i64) -> u64 {
        store
            .dispatch_at(Action::Create(NewTask::new(text)), at(ms))
            .expect("create")
            .task_id
            .expect("id")
    }

    #[test]
    fn opens_empty_with_light_theme() {
        let store = TaskStore::open(MemoryStore::new()).expect("open");
        assert!(store.tasks().is_empty());
        assert_eq!(store.theme(), Theme::Light);
        assert!(store.load_warning().is_none());
    }

    #[test]
    fn persisted_collection_reloads_identically() {
        let mut store = TaskStore::open(MemoryStore::new()).expect("open");
        let mut input = NewTask::new("Buy milk");
        input.category = Category::Shopping;
        input.priority = Priority::High;
        input.due_date = chrono::NaiveDate::from_ymd_opt(2026, 5, 1);
        store
            .dispatch_at(Action::Create(input), at(1_000))
            .expect("create");
        let second = add(&mut store, "Walk dog", 2_000);
        store
            .dispatch_at(Action::ToggleComplete(second), at(3_000))
            .expect("toggle");

        let before = store.tasks().clone();
        let reopened = TaskStore::open(store.backend().clone()).expect("reopen");
        assert_eq!(reopened.tasks(), &before);
    }

    #[test]
    fn rejected_action_leaves_storage_untouched() {
        let mut store = TaskStore::open(MemoryStore::new()).expect("open");
        let err = store
            .dispatch_at(Action::Create(NewTask::new("  ")), at(1))
            .expect_err("empty");
        assert!(matches!(err, Error::EmptyText));
        assert_eq!(store.backend().get(TASKS_KEY).expect("get"), None);
    }

    #[test]
    fn noop_action_does_not_write() {
        let mut store = TaskStore::open(MemoryStore::new()).expect("open");
        let transition = store
            .dispatch_at(Action::Delete(42), at(1))
            .expect("delete");
        assert!(!transition.changed);
        assert_eq!(store.backend().get(TASKS_KEY).expect("get"), None);
    }

    #[test]
    fn corrupt_tasks_open_empty_and_keep_raw_blob() {
        let backend = MemoryStore::new().with_entry(TASKS_KEY, "{not json");
        let store = TaskStore::open(backend).expect("open");

        assert!(store.tasks().is_empty());
        assert!(store.load_warning().is_some());
        assert_eq!(
            store.backend().get(CORRUPT_TASKS_KEY).expect("get").as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn theme_persists_across_reopen() {
        let mut store = TaskStore::open(MemoryStore::new()).expect("open");
        assert_eq!(store.toggle_theme().expect("toggle"), Theme::Dark);

        let reopened = TaskStore::open(store.backend().clone()).expect("reopen");
        assert_eq!(reopened.theme(), Theme::Dark);
    }

    #[test]
    fn unknown_stored_theme_reads_as_light() {
        let backend = MemoryStore::new().with_entry(THEME_KEY, "neon");
        let store = TaskStore::open(backend).expect("open");
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn reload_picks_up_external_changes() {
        let mut store = TaskStore::open(MemoryStore::new()).expect("open");
        add(&mut store, "One", 1);

        let mut other = TaskStore::open(store.backend().clone()).expect("open");
        add(&mut other, "Two", 2);
        store.backend = other.backend().clone();

        store.reload().expect("reload");
        assert_eq!(store.tasks().len(), 2);
    }
}
