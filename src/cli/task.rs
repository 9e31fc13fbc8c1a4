//! glowtasks task command implementations.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::{resolve_data_dir, FileStore};
use crate::store::TaskStore;
use crate::task::{parse_due_date, Action, NewTask, Task, TaskId, Transition};
use crate::view::{self, DueState, Filter, TaskCounts, ViewQuery};

pub struct AddOptions {
    pub text: Vec<String>,
    pub category: Option<String>,
    pub due: Option<String>,
    pub priority: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub filter: String,
    pub search: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: TaskId,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ToggleOptions {
    pub id: TaskId,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct EditOptions {
    pub id: TaskId,
    pub text: Vec<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct DeleteOptions {
    pub id: TaskId,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ClearCompletedOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct MoveOptions {
    pub id: TaskId,
    pub before: Option<TaskId>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct TuiOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

struct TaskContext {
    store: TaskStore<FileStore>,
    config: Config,
    warnings: Vec<String>,
}

fn load_context(data_dir: Option<PathBuf>) -> Result<TaskContext> {
    let dir = resolve_data_dir(data_dir.as_deref());
    let config = Config::load_from_dir(&dir)?;
    let mut store = TaskStore::open(FileStore::new(dir))?;
    let warnings = store.take_load_warning().into_iter().collect();
    Ok(TaskContext {
        store,
        config,
        warnings,
    })
}

fn require_task(store: &TaskStore<FileStore>, id: TaskId) -> Result<()> {
    if store.tasks().contains(id) {
        Ok(())
    } else {
        Err(Error::TaskNotFound(id))
    }
}

fn join_text(words: &[String]) -> String {
    words.join(" ")
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn notice_header(transition: &Transition, fallback: &str) -> String {
    transition
        .notice
        .as_ref()
        .map(|notice| notice.message.clone())
        .unwrap_or_else(|| fallback.to_string())
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = load_context(options.data_dir)?;

    let category = match options.category.as_deref() {
        Some(value) => value.parse()?,
        None => ctx.config.tasks.category(),
    };
    let priority = match options.priority.as_deref() {
        Some(value) => value.parse()?,
        None => ctx.config.tasks.priority(),
    };
    let due_date = match options.due.as_deref() {
        Some(value) => parse_due_date(value)?,
        None => None,
    };

    let transition = ctx.store.dispatch(Action::Create(NewTask {
        text: join_text(&options.text),
        category,
        due_date,
        priority,
    }))?;
    let task = transition
        .task_id
        .and_then(|id| ctx.store.tasks().get(id))
        .ok_or_else(|| Error::OperationFailed("created task missing from store".to_string()))?;

    let mut human = HumanOutput::new(notice_header(&transition, "Task added"));
    push_warnings(&mut human, &ctx.warnings);
    push_task_summary(&mut human, task, today());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "add",
        &TaskOutput::new(task, today()),
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;
    let filter: Filter = options.filter.parse()?;
    let query = ViewQuery::new(filter, options.search.unwrap_or_default());
    let today = today();

    let tasks = ctx.store.tasks().as_slice();
    let rows = view::derive_view(tasks, &query, today);
    let counts = TaskCounts::from_tasks(tasks);
    let empty_message = rows.is_empty().then(|| view::empty_message(tasks));

    let output = TaskListOutput {
        filter,
        search: query.search.clone(),
        counts,
        tasks: rows
            .iter()
            .map(|row| TaskOutput {
                task: row.task,
                due: row.due,
            })
            .collect(),
        empty_message,
    };

    let mut human = HumanOutput::new("Tasks");
    push_warnings(&mut human, &ctx.warnings);
    human.push_summary("Total", counts.total.to_string());
    human.push_summary("Active", counts.active.to_string());
    human.push_summary("Completed", counts.completed.to_string());
    if filter != Filter::All {
        human.push_summary("Filter", filter.as_str());
    }
    if !query.search.is_empty() {
        human.push_summary("Search", query.search.clone());
    }
    match empty_message {
        Some(message) => human.push_detail(message),
        None => {
            for row in &rows {
                human.push_detail(format_task_line(row.task, row.due));
            }
        }
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = load_context(options.data_dir)?;
    let task = ctx
        .store
        .tasks()
        .get(options.id)
        .ok_or(Error::TaskNotFound(options.id))?;

    let mut human = HumanOutput::new(format!("Task {}", task.id));
    push_warnings(&mut human, &ctx.warnings);
    push_task_summary(&mut human, task, today());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "show",
        &TaskOutput::new(task, today()),
        Some(&human),
    )
}

pub fn run_toggle(options: ToggleOptions) -> Result<()> {
    let mut ctx = load_context(options.data_dir)?;
    require_task(&ctx.store, options.id)?;
    let transition = ctx.store.dispatch(Action::ToggleComplete(options.id))?;
    emit_task_change(
        &ctx,
        options.id,
        &transition,
        "toggle",
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
    )
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut ctx = load_context(options.data_dir)?;
    require_task(&ctx.store, options.id)?;
    let transition = ctx.store.dispatch(Action::Edit {
        id: options.id,
        text: join_text(&options.text),
    })?;
    emit_task_change(
        &ctx,
        options.id,
        &transition,
        "edit",
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
    )
}

pub fn run_delete(options: DeleteOptions) -> Result<()> {
    let mut ctx = load_context(options.data_dir)?;
    require_task(&ctx.store, options.id)?;
    let transition = ctx.store.dispatch(Action::Delete(options.id))?;

    let mut human = HumanOutput::new(notice_header(&transition, "Task deleted"));
    push_warnings(&mut human, &ctx.warnings);
    human.push_summary("ID", options.id.to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "rm",
        &TaskDeleteOutput { id: options.id },
        Some(&human),
    )
}

pub fn run_clear_completed(options: ClearCompletedOptions) -> Result<()> {
    let mut ctx = load_context(options.data_dir)?;
    let before = ctx.store.tasks().len();
    let transition = ctx.store.dispatch(Action::ClearCompleted)?;
    let removed = before - ctx.store.tasks().len();

    let mut human = HumanOutput::new(notice_header(&transition, "Completed tasks cleared"));
    push_warnings(&mut human, &ctx.warnings);
    human.push_summary("Removed", removed.to_string());
    human.push_summary("Remaining", ctx.store.tasks().len().to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "clear-completed",
        &ClearCompletedOutput {
            removed,
            remaining: ctx.store.tasks().len(),
        },
        Some(&human),
    )
}

pub fn run_move(options: MoveOptions) -> Result<()> {
    let mut ctx = load_context(options.data_dir)?;
    require_task(&ctx.store, options.id)?;
    if let Some(before) = options.before {
        require_task(&ctx.store, before)?;
    }
    let transition = ctx.store.dispatch(Action::MoveBefore {
        id: options.id,
        before: options.before,
    })?;

    let position = ctx.store.tasks().position(options.id).unwrap_or_default();
    let mut human = HumanOutput::new(notice_header(&transition, "Task already in place"));
    push_warnings(&mut human, &ctx.warnings);
    human.push_summary("ID", options.id.to_string());
    human.push_summary("Position", (position + 1).to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "move",
        &TaskMoveOutput {
            id: options.id,
            position,
            changed: transition.changed,
        },
        Some(&human),
    )
}

pub fn run_tui(options: TuiOptions) -> Result<()> {
    if options.json {
        return Err(Error::InvalidArgument(
            "the TUI does not support --json".to_string(),
        ));
    }
    if options.quiet {
        return Err(Error::InvalidArgument(
            "the TUI does not support --quiet".to_string(),
        ));
    }
    let ctx = load_context(options.data_dir)?;
    crate::ui::task_viewer::run(ctx.store, ctx.config)
}

fn emit_task_change(
    ctx: &TaskContext,
    id: TaskId,
    transition: &Transition,
    command: &str,
    options: OutputOptions,
) -> Result<()> {
    let task = ctx.store.tasks().get(id).ok_or(Error::TaskNotFound(id))?;

    let mut human = HumanOutput::new(notice_header(transition, "No changes"));
    push_warnings(&mut human, &ctx.warnings);
    push_task_summary(&mut human, task, today());

    emit_success(options, command, &TaskOutput::new(task, today()), Some(&human))
}

fn push_warnings(human: &mut HumanOutput, warnings: &[String]) {
    for warning in warnings {
        human.push_warning(warning.clone());
    }
}

fn push_task_summary(human: &mut HumanOutput, task: &Task, today: NaiveDate) {
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Text", task.text.clone());
    human.push_summary("Status", if task.completed { "completed" } else { "active" });
    human.push_summary("Category", task.category.as_str());
    human.push_summary("Priority", task.priority.as_str());
    human.push_summary("Due", format_due(task, view::due_state(task, today)));
    human.push_summary("Created", task.created_at.to_rfc3339());
}

fn format_due(task: &Task, due: DueState) -> String {
    match (task.due_date, due.label()) {
        (Some(date), Some(label)) => format!("{date} ({label})"),
        (Some(date), None) => date.to_string(),
        (None, _) => "No due date".to_string(),
    }
}

fn format_task_line(task: &Task, due: DueState) -> String {
    let checkbox = if task.completed { "[x]" } else { "[ ]" };
    format!(
        "{checkbox} {} {} [{}|{}] {}",
        task.id,
        task.text,
        task.category,
        task.priority,
        format_due(task, due)
    )
}

#[derive(Serialize)]
struct TaskOutput<'a> {
    #[serde(flatten)]
    task: &'a Task,
    due: DueState,
}

impl<'a> TaskOutput<'a> {
    fn new(task: &'a Task, today: NaiveDate) -> Self {
        Self {
            task,
            due: view::due_state(task, today),
        }
    }
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    filter: Filter,
    search: String,
    counts: TaskCounts,
    tasks: Vec<TaskOutput<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty_message: Option<&'static str>,
}

#[derive(Serialize)]
struct TaskDeleteOutput {
    id: TaskId,
}

#[derive(Serialize)]
struct ClearCompletedOutput {
    removed: usize,
    remaining: usize,
}

#[derive(Serialize)]
struct TaskMoveOutput {
    id: TaskId,
    position: usize,
    changed: bool,
}
