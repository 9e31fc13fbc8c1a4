use std::io;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::Config;
use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::task::{Action, Notice, Task, TaskId, Transition};
use crate::theme::{Palette, Theme};
use crate::view::{self, DueState, Filter, TaskCounts, ViewQuery};

use super::editor::{EditorAction, EditorState, EditorSubmit};
use super::view as render;

const NARROW_WIDTH: u16 = 90;
const EVENT_POLL_MS: u64 = 120;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum HelpContext {
    None,
    List,
    Editor,
}

pub(crate) struct DeleteConfirmState {
    pub(crate) task_id: TaskId,
    pub(crate) text: String,
}

struct ActiveNotice {
    notice: Notice,
    shown_at: Instant,
}

#[derive(Default, Clone, Copy)]
struct Viewport {
    width: u16,
}

pub struct AppState<S: KeyValueStore> {
    /// Positions into the stored task list, in display order.
    pub(crate) filtered: Vec<usize>,
    pub(crate) selected: Option<usize>,
    pub(crate) filter: Filter,
    pub(crate) search: String,
    pub(crate) search_active: bool,
    pub(crate) editor: Option<EditorState>,
    pub(crate) delete_confirm: Option<DeleteConfirmState>,
    pub(crate) help_context: HelpContext,
    pub(crate) show_detail: bool,
    pub(crate) today: NaiveDate,
    notice: Option<ActiveNotice>,
    notice_ttl: Duration,
    viewport: Viewport,
    config: Config,
    store: TaskStore<S>,
}

impl<S: KeyValueStore> AppState<S> {
    pub(crate) fn new(mut store: TaskStore<S>, config: Config, today: NaiveDate) -> Self {
        let warning = store.take_load_warning();
        let mut app = Self {
            filtered: Vec::new(),
            selected: None,
            filter: Filter::All,
            search: String::new(),
            search_active: false,
            editor: None,
            delete_confirm: None,
            help_context: HelpContext::None,
            show_detail: false,
            today,
            notice: None,
            notice_ttl: Duration::from_millis(config.ui.notice_ttl_ms),
            viewport: Viewport::default(),
            config,
            store,
        };
        app.refresh_view(None);
        if let Some(warning) = warning {
            app.set_notice(Notice::error(warning));
        }
        app
    }

    fn update_viewport(&mut self, width: u16) {
        let changed = self.viewport.width != width;
        self.viewport = Viewport { width };
        if changed && width >= NARROW_WIDTH {
            self.show_detail = true;
        }
    }

    pub(crate) fn is_narrow(&self) -> bool {
        self.viewport.width > 0 && self.viewport.width < NARROW_WIDTH
    }

    pub(crate) fn tasks(&self) -> &[Task] {
        self.store.tasks().as_slice()
    }

    pub(crate) fn theme(&self) -> Theme {
        self.store.theme()
    }

    pub(crate) fn palette(&self) -> Palette {
        self.store.theme().palette()
    }

    pub(crate) fn counts(&self) -> TaskCounts {
        TaskCounts::from_tasks(self.tasks())
    }

    pub(crate) fn due_state(&self, task: &Task) -> DueState {
        view::due_state(task, self.today)
    }

    pub(crate) fn empty_message(&self) -> &'static str {
        view::empty_message(self.tasks())
    }

    pub(crate) fn selected_task(&self) -> Option<&Task> {
        self.selected.and_then(|idx| self.tasks().get(idx))
    }

    pub(crate) fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().map(|active| &active.notice)
    }

    pub(crate) fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    /// Drop the notice once its lifetime is over; true when something changed.
    pub(crate) fn expire_notice(&mut self, now: Instant) -> bool {
        let expired = self
            .notice
            .as_ref()
            .is_some_and(|active| now.duration_since(active.shown_at) >= self.notice_ttl);
        if expired {
            self.notice = None;
        }
        expired
    }

    pub(crate) fn toggle_help(&mut self, context: HelpContext) {
        self.help_context = if self.help_context == context {
            HelpContext::None
        } else {
            context
        };
    }

    pub(crate) fn footer_hint(&self) -> String {
        if self.delete_confirm.is_some() {
            return "y/enter confirm delete  esc cancel".to_string();
        }
        if self.editor.is_some() {
            return "tab next  left/right/space choose  enter save  ? help  esc cancel".to_string();
        }
        if self.search_active {
            return "type to search  backspace delete  enter keep  esc clear".to_string();
        }
        "n new  e edit  space toggle  d delete  / search  tab filter  t theme  ? help  q quit"
            .to_string()
    }

    fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(ActiveNotice {
            notice,
            shown_at: Instant::now(),
        });
    }

    fn set_error(&mut self, message: String) {
        self.set_notice(Notice::error(message));
    }

    fn set_info(&mut self, message: String) {
        self.set_notice(Notice::info(message));
    }

    fn refresh_view(&mut self, previous_id: Option<TaskId>) {
        let query = ViewQuery::new(self.filter, self.search.clone());
        self.filtered = view::derive_indices(self.tasks(), &query);
        let position = previous_id
            .and_then(|id| view::select_by_id(self.tasks(), &self.filtered, id))
            .or(if self.filtered.is_empty() { None } else { Some(0) });
        self.selected = position.map(|pos| self.filtered[pos]);
    }

    fn selected_position(&self) -> Option<usize> {
        self.selected
            .and_then(|idx| self.filtered.iter().position(|candidate| *candidate == idx))
    }

    fn move_selection(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            self.selected = None;
            return;
        }
        let current_pos = self.selected_position().unwrap_or(0);
        let max = self.filtered.len().saturating_sub(1);
        let next = (current_pos as isize + delta).clamp(0, max as isize) as usize;
        self.selected = Some(self.filtered[next]);
    }

    fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        let previous = self.selected_task().map(|task| task.id);
        self.refresh_view(previous);
    }

    fn dispatch(&mut self, action: Action) -> Option<Transition> {
        let previous = self.selected_task().map(|task| task.id);
        match self.store.dispatch(action) {
            Ok(transition) => {
                let focus = transition
                    .task_id
                    .filter(|id| self.store.tasks().contains(*id))
                    .or(previous);
                self.refresh_view(focus);
                if let Some(warning) = self.store.take_load_warning() {
                    self.set_error(warning);
                } else if let Some(notice) = transition.notice.clone() {
                    self.set_notice(notice);
                }
                Some(transition)
            }
            Err(err) => {
                self.refresh_view(previous);
                self.set_error(err.to_string());
                None
            }
        }
    }

    /// Neighbour-based reorder: `up` places the selection before the task
    /// shown above it, otherwise after the task shown below it.
    fn reorder_selected(&mut self, up: bool) {
        let Some(pos) = self.selected_position() else {
            return;
        };
        let tasks = self.tasks();
        let id = tasks[self.filtered[pos]].id;
        let before = if up {
            let Some(prev) = pos.checked_sub(1) else {
                return;
            };
            Some(tasks[self.filtered[prev]].id)
        } else {
            let Some(&next_idx) = self.filtered.get(pos + 1) else {
                return;
            };
            tasks
                .iter()
                .skip(next_idx + 1)
                .find(|task| task.id != id)
                .map(|task| task.id)
        };
        self.dispatch(Action::MoveBefore { id, before });
    }

    fn submit_editor(&mut self, mut editor: EditorState) {
        let submit = match editor.build_submit() {
            Ok(submit) => submit,
            Err(err) => {
                editor.set_error(err);
                self.editor = Some(editor);
                return;
            }
        };
        let action = match submit {
            EditorSubmit::Create(input) => Action::Create(input),
            EditorSubmit::Edit { id, text } => Action::Edit { id, text },
        };
        if self.dispatch(action).is_none() {
            if let Some(notice) = self.notice() {
                editor.set_error(notice.message.clone());
            }
            self.editor = Some(editor);
        }
    }

    /// Returns true when the app should exit.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if let Some(confirm) = self.delete_confirm.take() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.dispatch(Action::Delete(confirm.task_id));
                }
                KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                    self.set_info("Delete cancelled".to_string());
                }
                _ => self.delete_confirm = Some(confirm),
            }
            return false;
        }

        if let Some(mut editor) = self.editor.take() {
            if key.code == KeyCode::Char('?') && editor.fields()[editor.active_index()].is_choice()
            {
                self.toggle_help(HelpContext::Editor);
                self.editor = Some(editor);
                return false;
            }
            match editor.handle_key(key) {
                EditorAction::None => self.editor = Some(editor),
                EditorAction::Cancel => self.help_context = HelpContext::None,
                EditorAction::Submit => {
                    self.help_context = HelpContext::None;
                    self.submit_editor(editor);
                }
            }
            return false;
        }

        if self.search_active {
            match key.code {
                KeyCode::Esc => {
                    self.search.clear();
                    self.search_active = false;
                }
                KeyCode::Enter => self.search_active = false,
                KeyCode::Backspace => {
                    self.search.pop();
                }
                KeyCode::Char(ch) => {
                    if key.modifiers.contains(KeyModifiers::CONTROL) {
                        return false;
                    }
                    if !ch.is_control() {
                        self.search.push(ch);
                    }
                }
                _ => {}
            }
            let previous = self.selected_task().map(|task| task.id);
            self.refresh_view(previous);
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.help_context != HelpContext::None {
                    self.help_context = HelpContext::None;
                    return false;
                }
                true
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                false
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                false
            }
            KeyCode::Char('J') => {
                self.reorder_selected(false);
                false
            }
            KeyCode::Char('K') => {
                self.reorder_selected(true);
                false
            }
            KeyCode::Char('/') => {
                self.search_active = true;
                false
            }
            KeyCode::Char('1') => {
                self.set_filter(Filter::All);
                false
            }
            KeyCode::Char('2') => {
                self.set_filter(Filter::Active);
                false
            }
            KeyCode::Char('3') => {
                self.set_filter(Filter::Completed);
                false
            }
            KeyCode::Tab => {
                self.set_filter(self.filter.next());
                false
            }
            KeyCode::Char('n') => {
                self.editor = Some(EditorState::new_task(
                    self.config.tasks.category(),
                    self.config.tasks.priority(),
                ));
                if self.is_narrow() {
                    self.show_detail = true;
                }
                false
            }
            KeyCode::Char('e') => {
                let Some(task) = self.selected_task() else {
                    self.set_error("no task selected".to_string());
                    return false;
                };
                self.editor = Some(EditorState::edit_task(task));
                if self.is_narrow() {
                    self.show_detail = true;
                }
                false
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                let Some(id) = self.selected_task().map(|task| task.id) else {
                    self.set_error("no task selected".to_string());
                    return false;
                };
                self.dispatch(Action::ToggleComplete(id));
                false
            }
            KeyCode::Char('d') => {
                let Some(task) = self.selected_task() else {
                    self.set_error("no task selected".to_string());
                    return false;
                };
                self.delete_confirm = Some(DeleteConfirmState {
                    task_id: task.id,
                    text: task.text.clone(),
                });
                false
            }
            KeyCode::Char('C') => {
                self.dispatch(Action::ClearCompleted);
                false
            }
            KeyCode::Char('t') => {
                match self.store.toggle_theme() {
                    Ok(theme) => self.set_info(format!("Theme: {theme}")),
                    Err(err) => self.set_error(err.to_string()),
                }
                false
            }
            KeyCode::Char('r') => {
                let previous = self.selected_task().map(|task| task.id);
                match self.store.reload() {
                    Ok(()) => {
                        self.refresh_view(previous);
                        match self.store.take_load_warning() {
                            Some(warning) => self.set_error(warning),
                            None => self.set_info("Reloaded".to_string()),
                        }
                    }
                    Err(err) => self.set_error(err.to_string()),
                }
                false
            }
            KeyCode::Char('?') => {
                self.toggle_help(HelpContext::List);
                false
            }
            KeyCode::Enter => {
                if self.is_narrow() {
                    self.show_detail = !self.show_detail;
                }
                false
            }
            _ => false,
        }
    }
}

pub fn run<S: KeyValueStore>(store: TaskStore<S>, config: Config) -> Result<()> {
    let mut app = AppState::new(store, config, Local::now().date_naive());
    run_terminal(&mut app)
}

fn run_terminal<S: KeyValueStore>(app: &mut AppState<S>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let size = terminal.size()?;
    app.update_viewport(size.width);

    let result = run_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState<S>,
) -> Result<()> {
    let mut dirty = true;
    loop {
        if app.expire_notice(Instant::now()) {
            dirty = true;
        }

        if dirty {
            app.set_today(Local::now().date_naive());
            terminal.draw(|frame| {
                app.update_viewport(frame.size().width);
                render::render(frame, app);
            })?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    if app.handle_key(key) {
                        break;
                    }
                    dirty = true;
                }
                Event::Resize(width, _) => {
                    app.update_viewport(width);
                    dirty = true;
                }
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use crate::task::NoticeKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> AppState<MemoryStore> {
        let store = TaskStore::open(MemoryStore::new()).expect("open");
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).expect("date");
        AppState::new(store, Config::default(), today)
    }

    fn add<S: KeyValueStore>(app: &mut AppState<S>, text: &str) {
        app.handle_key(key(KeyCode::Char('n')));
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        for _ in 0..3 {
            app.handle_key(key(KeyCode::Tab));
        }
        app.handle_key(key(KeyCode::Enter));
    }

    fn visible_texts<S: KeyValueStore>(app: &AppState<S>) -> Vec<String> {
        app.filtered
            .iter()
            .map(|&idx| app.tasks()[idx].text.clone())
            .collect()
    }

    #[test]
    fn new_task_form_adds_and_selects() {
        let mut app = app();
        add(&mut app, "Buy milk");

        assert!(app.editor.is_none());
        assert_eq!(app.tasks().len(), 1);
        assert_eq!(app.selected_task().map(|t| t.text.as_str()), Some("Buy milk"));
        let notice = app.notice().expect("notice");
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.message, "Task added successfully");
    }

    #[test]
    fn empty_form_keeps_editor_open_with_error() {
        let mut app = app();
        add(&mut app, "   ");

        assert!(app.tasks().is_empty());
        let editor = app.editor.as_ref().expect("editor still open");
        assert_eq!(editor.error(), Some("Please enter a task"));
        assert_eq!(app.notice().map(|n| n.kind), Some(NoticeKind::Error));
    }

    #[test]
    fn toggle_then_filter_active_hides_task() {
        let mut app = app();
        add(&mut app, "One");
        add(&mut app, "Two");
        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Char('2')));

        assert_eq!(app.filter, Filter::Active);
        assert_eq!(visible_texts(&app).len(), 1);
        assert_eq!(app.counts().completed, 1);
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = app();
        add(&mut app, "One");
        app.handle_key(key(KeyCode::Char('d')));
        assert!(app.delete_confirm.is_some());
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.tasks().len(), 1);

        app.handle_key(key(KeyCode::Char('d')));
        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.tasks().is_empty());
        assert_eq!(app.notice().map(|n| n.message.as_str()), Some("Task deleted"));
    }

    #[test]
    fn search_filters_and_escape_clears() {
        let mut app = app();
        add(&mut app, "Buy milk");
        add(&mut app, "Walk dog");
        app.handle_key(key(KeyCode::Char('/')));
        for ch in "MILK".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        assert_eq!(visible_texts(&app), vec!["Buy milk".to_string()]);

        app.handle_key(key(KeyCode::Esc));
        assert!(app.search.is_empty());
        assert_eq!(visible_texts(&app).len(), 2);
    }

    #[test]
    fn reorder_moves_among_equal_priorities() {
        let mut app = app();
        add(&mut app, "First");
        add(&mut app, "Second");
        assert_eq!(visible_texts(&app), vec!["First", "Second"]);

        app.handle_key(key(KeyCode::Char('K')));
        assert_eq!(visible_texts(&app), vec!["Second", "First"]);
        assert_eq!(app.selected_task().map(|t| t.text.as_str()), Some("Second"));

        app.handle_key(key(KeyCode::Char('J')));
        assert_eq!(visible_texts(&app), vec!["First", "Second"]);
    }

    #[test]
    fn actions_keep_tasks_written_by_other_processes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TaskStore::open(FileStore::new(dir.path())).expect("open");
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).expect("date");
        let mut app = AppState::new(store, Config::default(), today);

        let mut other = TaskStore::open(FileStore::new(dir.path())).expect("open");
        other
            .dispatch(Action::Create(crate::task::NewTask::new("From CLI")))
            .expect("create");

        add(&mut app, "From TUI");
        let mut texts = visible_texts(&app);
        texts.sort();
        assert_eq!(texts, vec!["From CLI", "From TUI"]);
        assert_eq!(app.selected_task().map(|t| t.text.as_str()), Some("From TUI"));

        let reopened = TaskStore::open(FileStore::new(dir.path())).expect("reopen");
        assert_eq!(reopened.tasks().len(), 2);
    }

    #[test]
    fn theme_toggle_persists_in_store() {
        let mut app = app();
        assert_eq!(app.theme(), Theme::Light);
        app.handle_key(key(KeyCode::Char('t')));
        assert_eq!(app.theme(), Theme::Dark);
    }

    #[test]
    fn notice_expires_after_ttl() {
        let mut app = app();
        add(&mut app, "One");
        assert!(!app.expire_notice(Instant::now()));
        let later = Instant::now() + Duration::from_millis(3_001);
        assert!(app.expire_notice(later));
        assert!(app.notice().is_none());
    }

    #[test]
    fn narrow_layout_toggles_detail_on_enter() {
        let mut app = app();
        app.update_viewport(60);
        assert!(app.is_narrow());
        assert!(!app.show_detail);
        app.handle_key(key(KeyCode::Enter));
        assert!(app.show_detail);
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(app.handle_key(key(KeyCode::Char('q'))));
    }
}
