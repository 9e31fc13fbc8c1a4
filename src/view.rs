//! Derived view of the task collection: search, filter, ordering and due badges.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Error;
use crate::task::{Task, TaskId};

pub const EMPTY_COLLECTION_MESSAGE: &str = "No tasks yet. Add one above!";
pub const NO_MATCHES_MESSAGE: &str = "No matching tasks";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Active,
            Filter::Active => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" | "done" => Ok(Filter::Completed),
            other => Err(Error::InvalidArgument(format!(
                "unknown filter '{other}' (expected all|active|completed)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub filter: Filter,
    pub search: String,
}

impl ViewQuery {
    pub fn new(filter: Filter, search: impl Into<String>) -> Self {
        Self {
            filter,
            search: search.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    Overdue,
    DueToday,
    None,
}

impl DueState {
    pub fn label(self) -> Option<&'static str> {
        match self {
            DueState::Overdue => Some("Overdue"),
            DueState::DueToday => Some("Due today"),
            DueState::None => None,
        }
    }
}

/// Overdue and due-today are reported regardless of completion.
pub fn due_state(task: &Task, today: NaiveDate) -> DueState {
    match task.due_date {
        Some(due) if due < today => DueState::Overdue,
        Some(due) if due == today => DueState::DueToday,
        _ => DueState::None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRow<'a> {
    pub task: &'a Task,
    pub due: DueState,
}

/// Positions into `tasks`, in display order.
pub fn derive_indices(tasks: &[Task], query: &ViewQuery) -> Vec<usize> {
    let needle = query.search.to_lowercase();
    let mut indices: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| needle.is_empty() || task.text.to_lowercase().contains(&needle))
        .filter(|(_, task)| query.filter.matches(task))
        .map(|(idx, _)| idx)
        .collect();

    // sort_by is stable, so ties keep their stored sequence
    indices.sort_by(|&a, &b| {
        let left = &tasks[a];
        let right = &tasks[b];
        right
            .priority
            .weight()
            .cmp(&left.priority.weight())
            .then_with(|| match (left.due_date, right.due_date) {
                (Some(l), Some(r)) => l.cmp(&r),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });
    indices
}

pub fn derive_view<'a>(tasks: &'a [Task], query: &ViewQuery, today: NaiveDate) -> Vec<TaskRow<'a>> {
    derive_indices(tasks, query)
        .into_iter()
        .map(|idx| {
            let task = &tasks[idx];
            TaskRow {
                task,
                due: due_state(task, today),
            }
        })
        .collect()
}

/// Message for an empty view, distinguishing "nothing stored" from "nothing matched".
pub fn empty_message(tasks: &[Task]) -> &'static str {
    if tasks.is_empty() {
        EMPTY_COLLECTION_MESSAGE
    } else {
        NO_MATCHES_MESSAGE
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl TaskCounts {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        Self {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
        }
    }

    pub fn for_filter(&self, filter: Filter) -> usize {
        match filter {
            Filter::All => self.total,
            Filter::Active => self.active,
            Filter::Completed => self.completed,
        }
    }
}

/// Display position of `id` within `indices`.
pub fn select_by_id(tasks: &[Task], indices: &[usize], id: TaskId) -> Option<usize> {
    indices
        .iter()
        .position(|&idx| tasks.get(idx).is_some_and(|task| task.id == id))
}
