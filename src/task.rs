//! Task records and the reducer that mutates the task collection.
//!
//! The collection is an ordered sequence: storage order is insertion order
//! (as adjusted by manual reordering), while display order is always derived
//! by [`crate::view`]. Every mutation goes through [`reduce`], which takes the
//! current snapshot and returns the next one without touching storage.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Task ids are creation timestamps in milliseconds.
pub type TaskId = u64;

pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

const NOTICE_ADDED: &str = "Task added successfully";
const NOTICE_UPDATED: &str = "Task updated";
const NOTICE_DELETED: &str = "Task deleted";
const NOTICE_CLEARED: &str = "Completed tasks cleared";
const NOTICE_NOTHING_TO_CLEAR: &str = "No completed tasks";
const NOTICE_MOVED: &str = "Task moved";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Shopping,
    Health,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Personal,
        Category::Work,
        Category::Shopping,
        Category::Health,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Personal => "personal",
            Category::Work => "work",
            Category::Shopping => "shopping",
            Category::Health => "health",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown category '{s}' (expected personal|work|shopping|health|other)"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Sort weight: higher values are shown first.
    pub fn weight(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == normalized)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown priority '{s}' (expected low|medium|high)"
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub category: Category,
    #[serde(
        default,
        deserialize_with = "deserialize_due_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Empty strings are what an untouched date input stores.
fn deserialize_due_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, DUE_DATE_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub fn parse_due_date(value: &str) -> Result<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DUE_DATE_FORMAT)
        .map(Some)
        .map_err(|err| {
            Error::InvalidArgument(format!(
                "invalid due date '{trimmed}' (expected YYYY-MM-DD): {err}"
            ))
        })
}

/// Ordered task collection as persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.position(id).is_some()
    }

    fn next_id(&self, now: DateTime<Utc>) -> TaskId {
        let mut candidate = now.timestamp_millis().max(0) as TaskId;
        while self.contains(candidate) {
            candidate += 1;
        }
        candidate
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

/// Input for a new task, as submitted from the form or the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub text: String,
    pub category: Category,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: Category::default(),
            due_date: None,
            priority: Priority::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create(NewTask),
    ToggleComplete(TaskId),
    Edit { id: TaskId, text: String },
    Delete(TaskId),
    ClearCompleted,
    /// Move `id` directly before `before`, or to the end when `before` is `None`.
    MoveBefore { id: TaskId, before: Option<TaskId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// Transient user-facing message produced by an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub tasks: TaskList,
    pub changed: bool,
    pub task_id: Option<TaskId>,
    pub notice: Option<Notice>,
}

impl Transition {
    fn unchanged(current: &TaskList, task_id: Option<TaskId>) -> Self {
        Self {
            tasks: current.clone(),
            changed: false,
            task_id,
            notice: None,
        }
    }

    fn changed(tasks: Vec<Task>, task_id: Option<TaskId>, notice: Notice) -> Self {
        Self {
            tasks: TaskList::new(tasks),
            changed: true,
            task_id,
            notice: Some(notice),
        }
    }
}

/// Apply `action` to `current`, returning the next snapshot.
///
/// Empty text on create or edit is rejected with [`Error::EmptyText`] and
/// leaves the collection untouched. Actions naming an absent id are no-ops.
pub fn reduce(current: &TaskList, action: Action, now: DateTime<Utc>) -> Result<Transition> {
    match action {
        Action::Create(input) => create(current, input, now),
        Action::ToggleComplete(id) => Ok(toggle_complete(current, id)),
        Action::Edit { id, text } => edit(current, id, &text),
        Action::Delete(id) => Ok(delete(current, id)),
        Action::ClearCompleted => Ok(clear_completed(current)),
        Action::MoveBefore { id, before } => Ok(move_before(current, id, before)),
    }
}

fn create(current: &TaskList, input: NewTask, now: DateTime<Utc>) -> Result<Transition> {
    let text = input.text.trim();
    if text.is_empty() {
        return Err(Error::EmptyText);
    }

    let id = current.next_id(now);
    let mut tasks = current.tasks.clone();
    tasks.push(Task {
        id,
        text: text.to_string(),
        completed: false,
        category: input.category,
        due_date: input.due_date,
        priority: input.priority,
        created_at: now,
    });
    Ok(Transition::changed(
        tasks,
        Some(id),
        Notice::success(NOTICE_ADDED),
    ))
}

fn toggle_complete(current: &TaskList, id: TaskId) -> Transition {
    let Some(pos) = current.position(id) else {
        return Transition::unchanged(current, None);
    };
    let mut tasks = current.tasks.clone();
    tasks[pos].completed = !tasks[pos].completed;
    let message = if tasks[pos].completed {
        "Task completed"
    } else {
        "Task reopened"
    };
    Transition::changed(tasks, Some(id), Notice::info(message))
}

fn edit(current: &TaskList, id: TaskId, text: &str) -> Result<Transition> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::EmptyText);
    }
    let Some(pos) = current.position(id) else {
        return Ok(Transition::unchanged(current, None));
    };
    if current.tasks[pos].text == text {
        return Ok(Transition::unchanged(current, Some(id)));
    }
    let mut tasks = current.tasks.clone();
    tasks[pos].text = text.to_string();
    Ok(Transition::changed(
        tasks,
        Some(id),
        Notice::success(NOTICE_UPDATED),
    ))
}

fn delete(current: &TaskList, id: TaskId) -> Transition {
    let Some(pos) = current.position(id) else {
        return Transition::unchanged(current, None);
    };
    let mut tasks = current.tasks.clone();
    tasks.remove(pos);
    Transition::changed(tasks, Some(id), Notice::info(NOTICE_DELETED))
}

fn clear_completed(current: &TaskList) -> Transition {
    let tasks: Vec<Task> = current
        .tasks
        .iter()
        .filter(|task| !task.completed)
        .cloned()
        .collect();
    if tasks.len() == current.len() {
        let mut transition = Transition::unchanged(current, None);
        transition.notice = Some(Notice::info(NOTICE_NOTHING_TO_CLEAR));
        return transition;
    }
    Transition::changed(tasks, None, Notice::info(NOTICE_CLEARED))
}

fn move_before(current: &TaskList, id: TaskId, before: Option<TaskId>) -> Transition {
    if before == Some(id) {
        return Transition::unchanged(current, Some(id));
    }
    let Some(from) = current.position(id) else {
        return Transition::unchanged(current, None);
    };
    if let Some(target) = before {
        if !current.contains(target) {
            return Transition::unchanged(current, Some(id));
        }
    }

    let mut tasks = current.tasks.clone();
    let task = tasks.remove(from);
    let to = match before {
        Some(target) => tasks
            .iter()
            .position(|candidate| candidate.id == target)
            .unwrap_or(tasks.len()),
        None => tasks.len(),
    };
    tasks.insert(to, task);

    if tasks == current.tasks {
        return Transition::unchanged(current, Some(id));
    }
    Transition::changed(tasks, Some(id), Notice::info(NOTICE_MOVED))
}
