use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::task::{parse_due_date, Category, NewTask, Priority, Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    NewTask,
    EditTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFieldId {
    Text,
    Category,
    Due,
    Priority,
}

#[derive(Debug, Clone)]
pub struct EditorField {
    pub id: EditorFieldId,
    pub label: &'static str,
    pub value: String,
    /// Fixed options cycled with left/right/space; empty for free text.
    pub choices: Vec<&'static str>,
}

impl EditorField {
    fn text(id: EditorFieldId, label: &'static str, value: String) -> Self {
        Self {
            id,
            label,
            value,
            choices: Vec::new(),
        }
    }

    fn choice(
        id: EditorFieldId,
        label: &'static str,
        choices: Vec<&'static str>,
        current: &'static str,
    ) -> Self {
        Self {
            id,
            label,
            value: current.to_string(),
            choices,
        }
    }

    pub fn is_choice(&self) -> bool {
        !self.choices.is_empty()
    }

    fn cycle(&mut self, delta: isize) {
        let len = self.choices.len() as isize;
        if len == 0 {
            return;
        }
        let current = self
            .choices
            .iter()
            .position(|choice| *choice == self.value)
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.value = self.choices[next].to_string();
    }
}

#[derive(Debug, Clone)]
pub enum EditorSubmit {
    Create(NewTask),
    Edit { id: TaskId, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Cancel,
    Submit,
}

#[derive(Debug, Clone)]
pub struct EditorState {
    kind: EditorKind,
    fields: Vec<EditorField>,
    active: usize,
    error: Option<String>,
    task_id: Option<TaskId>,
}

impl EditorState {
    pub fn new_task(category: Category, priority: Priority) -> Self {
        Self {
            kind: EditorKind::NewTask,
            fields: vec![
                EditorField::text(EditorFieldId::Text, "Task", String::new()),
                EditorField::choice(
                    EditorFieldId::Category,
                    "Category",
                    Category::ALL.iter().map(|c| c.as_str()).collect(),
                    category.as_str(),
                ),
                EditorField::text(EditorFieldId::Due, "Due (YYYY-MM-DD)", String::new()),
                EditorField::choice(
                    EditorFieldId::Priority,
                    "Priority",
                    Priority::ALL.iter().map(|p| p.as_str()).collect(),
                    priority.as_str(),
                ),
            ],
            active: 0,
            error: None,
            task_id: None,
        }
    }

    pub fn edit_task(task: &Task) -> Self {
        Self {
            kind: EditorKind::EditTask,
            fields: vec![EditorField::text(
                EditorFieldId::Text,
                "Task",
                task.text.clone(),
            )],
            active: 0,
            error: None,
            task_id: Some(task.id),
        }
    }

    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    pub fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    pub fn fields(&self) -> &[EditorField] {
        &self.fields
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('u') {
            if let Some(field) = self.current_field_mut() {
                if !field.is_choice() {
                    field.value.clear();
                }
            }
            self.error = None;
            return EditorAction::None;
        }

        let on_choice = self
            .fields
            .get(self.active)
            .is_some_and(EditorField::is_choice);

        match key.code {
            KeyCode::Esc => return EditorAction::Cancel,
            KeyCode::Tab | KeyCode::Down => self.move_active(1),
            KeyCode::BackTab | KeyCode::Up => self.move_active(-1),
            KeyCode::Enter => {
                if self.active + 1 >= self.fields.len() {
                    return self.attempt_submit();
                }
                self.move_active(1);
            }
            KeyCode::Left if on_choice => self.cycle_active(-1),
            KeyCode::Right if on_choice => self.cycle_active(1),
            KeyCode::Char(' ') if on_choice => self.cycle_active(1),
            KeyCode::Backspace => {
                if let Some(field) = self.current_field_mut() {
                    if !field.is_choice() {
                        field.value.pop();
                    }
                }
            }
            KeyCode::Char(ch) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) || on_choice {
                    return EditorAction::None;
                }
                if !ch.is_control() {
                    if let Some(field) = self.current_field_mut() {
                        field.value.push(ch);
                    }
                }
            }
            _ => {}
        }

        self.error = None;
        EditorAction::None
    }

    /// Text emptiness is left to the reducer so the rejection surfaces as a notice.
    pub fn build_submit(&self) -> Result<EditorSubmit, String> {
        let text = self.field_value(EditorFieldId::Text).to_string();
        match self.kind {
            EditorKind::EditTask => {
                let id = self
                    .task_id
                    .ok_or_else(|| "no task selected".to_string())?;
                Ok(EditorSubmit::Edit { id, text })
            }
            EditorKind::NewTask => {
                let due_date = self.due_date()?;
                let category = self
                    .field_value(EditorFieldId::Category)
                    .parse()
                    .unwrap_or_default();
                let priority = self
                    .field_value(EditorFieldId::Priority)
                    .parse()
                    .unwrap_or_default();
                Ok(EditorSubmit::Create(NewTask {
                    text,
                    category,
                    due_date,
                    priority,
                }))
            }
        }
    }

    fn due_date(&self) -> Result<Option<NaiveDate>, String> {
        parse_due_date(self.field_value(EditorFieldId::Due))
            .map_err(|_| "due date must be YYYY-MM-DD".to_string())
    }

    fn attempt_submit(&mut self) -> EditorAction {
        match self.build_submit() {
            Ok(_) => EditorAction::Submit,
            Err(err) => {
                self.error = Some(err);
                EditorAction::None
            }
        }
    }

    fn move_active(&mut self, delta: isize) {
        let len = self.fields.len() as isize;
        if len == 0 {
            self.active = 0;
            return;
        }
        let next = (self.active as isize + delta).rem_euclid(len);
        self.active = next as usize;
    }

    fn cycle_active(&mut self, delta: isize) {
        if let Some(field) = self.current_field_mut() {
            field.cycle(delta);
        }
    }

    fn current_field_mut(&mut self) -> Option<&mut EditorField> {
        self.fields.get_mut(self.active)
    }

    fn field_value(&self, id: EditorFieldId) -> &str {
        self.fields
            .iter()
            .find(|field| field.id == id)
            .map(|field| field.value.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(editor: &mut EditorState, text: &str) {
        for ch in text.chars() {
            editor.handle_key(key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn new_task_form_builds_submission() {
        let mut editor = EditorState::new_task(Category::Personal, Priority::Medium);
        type_text(&mut editor, "Buy jk milk");
        editor.handle_key(key(KeyCode::Tab));
        editor.handle_key(key(KeyCode::Right));
        editor.handle_key(key(KeyCode::Right));
        editor.handle_key(key(KeyCode::Tab));
        type_text(&mut editor, "2026-05-01");
        editor.handle_key(key(KeyCode::Tab));
        editor.handle_key(key(KeyCode::Char(' ')));

        let action = editor.handle_key(key(KeyCode::Enter));
        assert_eq!(action, EditorAction::Submit);
        match editor.build_submit().expect("submit") {
            EditorSubmit::Create(input) => {
                assert_eq!(input.text, "Buy jk milk");
                assert_eq!(input.category, Category::Shopping);
                assert_eq!(input.due_date, NaiveDate::from_ymd_opt(2026, 5, 1));
                assert_eq!(input.priority, Priority::High);
            }
            other => panic!("unexpected submission: {other:?}"),
        }
    }

    #[test]
    fn choices_wrap_around() {
        let mut editor = EditorState::new_task(Category::Personal, Priority::Low);
        editor.handle_key(key(KeyCode::Tab));
        editor.handle_key(key(KeyCode::Left));
        assert_eq!(editor.fields()[1].value, "other");
    }

    #[test]
    fn invalid_due_date_blocks_submit() {
        let mut editor = EditorState::new_task(Category::Personal, Priority::Medium);
        type_text(&mut editor, "Pay rent");
        editor.handle_key(key(KeyCode::Tab));
        editor.handle_key(key(KeyCode::Tab));
        type_text(&mut editor, "tomorrow");
        editor.handle_key(key(KeyCode::Tab));

        let action = editor.handle_key(key(KeyCode::Enter));
        assert_eq!(action, EditorAction::None);
        assert_eq!(editor.error(), Some("due date must be YYYY-MM-DD"));
    }

    #[test]
    fn edit_form_submits_on_enter() {
        let task = Task {
            id: 9,
            text: "Old".to_string(),
            completed: false,
            category: Category::Work,
            due_date: None,
            priority: Priority::Low,
            created_at: chrono::Utc::now(),
        };
        let mut editor = EditorState::edit_task(&task);
        editor.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        type_text(&mut editor, "New");

        assert_eq!(editor.handle_key(key(KeyCode::Enter)), EditorAction::Submit);
        match editor.build_submit().expect("submit") {
            EditorSubmit::Edit { id, text } => {
                assert_eq!(id, 9);
                assert_eq!(text, "New");
            }
            other => panic!("unexpected submission: {other:?}"),
        }
    }

    #[test]
    fn escape_cancels() {
        let mut editor = EditorState::new_task(Category::Personal, Priority::Medium);
        assert_eq!(editor.handle_key(key(KeyCode::Esc)), EditorAction::Cancel);
    }
}
