use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::storage::KeyValueStore;
use crate::task::{NoticeKind, Task};
use crate::theme::Palette;
use crate::view::{DueState, Filter};

use super::app::{AppState, DeleteConfirmState, HelpContext};
use super::editor::{EditorKind, EditorState};

const TITLE: &str = "GlowTopia Tasks";
const CATEGORY_WIDTH: usize = 9;
const PRIORITY_WIDTH: usize = 6;
const DUE_WIDTH: usize = 11;
const HELP_KEY_WIDTH: usize = 14;

pub fn render<S: KeyValueStore>(frame: &mut Frame, app: &AppState<S>) {
    let palette = app.palette();
    let area = frame.size();
    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
        area,
    );

    let show_search = app.search_active || !app.search.is_empty();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(if show_search { 1 } else { 0 }),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    render_header(frame, app, chunks[0], &palette);
    render_tabs(frame, app, chunks[1], &palette);
    if show_search {
        render_search(frame, app, chunks[2], &palette);
    }

    let main = chunks[3];
    if app.is_narrow() && !app.show_detail {
        render_list(frame, app, main, &palette);
    } else if app.is_narrow() {
        render_detail(frame, app, main, &palette);
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
            .split(main);
        render_list(frame, app, columns[0], &palette);
        render_detail(frame, app, columns[1], &palette);
    }

    render_footer(frame, app, chunks[4], &palette);

    if let Some(state) = app.delete_confirm.as_ref() {
        render_delete_confirm_modal(frame, area, state, &palette);
    }
}

fn render_header<S: KeyValueStore>(frame: &mut Frame, app: &AppState<S>, area: Rect, palette: &Palette) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {TITLE}"),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("theme: {}", app.theme()),
            Style::default().fg(palette.muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_tabs<S: KeyValueStore>(frame: &mut Frame, app: &AppState<S>, area: Rect, palette: &Palette) {
    let counts = app.counts();
    let mut spans = vec![Span::raw(" ")];
    for (idx, filter) in Filter::ALL.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled("  ", Style::default().fg(palette.muted)));
        }
        let text = format!("{} {} ({})", idx + 1, filter.label(), counts.for_filter(filter));
        let style = if app.filter == filter {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(palette.muted)
        };
        spans.push(Span::styled(text, style));
    }

    let widget = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(palette.border)),
    );
    frame.render_widget(widget, area);
}

fn render_search<S: KeyValueStore>(frame: &mut Frame, app: &AppState<S>, area: Rect, palette: &Palette) {
    let caret = if app.search_active { "_" } else { "" };
    let line = Line::from(vec![
        Span::styled(" search: ", Style::default().fg(palette.muted)),
        Span::styled(
            format!("{}{caret}", app.search),
            Style::default().fg(palette.info),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_list<S: KeyValueStore>(frame: &mut Frame, app: &AppState<S>, area: Rect, palette: &Palette) {
    let mut lines = Vec::new();
    let content_width = area.width.saturating_sub(2) as usize;
    let help_lines = if app.help_context == HelpContext::List {
        build_list_help_lines(content_width, palette)
    } else {
        Vec::new()
    };
    let help_reserved = if help_lines.is_empty() {
        0
    } else {
        help_lines.len() + 1
    };

    if app.filtered.is_empty() {
        lines.push(Line::from(Span::styled(
            app.empty_message(),
            Style::default().fg(palette.muted),
        )));
    } else {
        let list_height = area
            .height
            .saturating_sub(2)
            .saturating_sub(help_reserved as u16) as usize;
        let selected_pos = app
            .selected
            .and_then(|idx| app.filtered.iter().position(|candidate| *candidate == idx));
        let (start, end) = list_window(app.filtered.len(), selected_pos, list_height);
        for &idx in &app.filtered[start..end] {
            if let Some(task) = app.tasks().get(idx) {
                let selected = app.selected == Some(idx);
                lines.push(render_list_row(
                    task,
                    app.due_state(task),
                    selected,
                    content_width,
                    palette,
                ));
            }
        }
    }

    if !help_lines.is_empty() {
        lines.push(Line::from(""));
        lines.extend(help_lines);
    }

    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Tasks")
                .border_style(Style::default().fg(palette.border)),
        )
        .style(Style::default().bg(palette.surface))
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

fn render_detail<S: KeyValueStore>(frame: &mut Frame, app: &AppState<S>, area: Rect, palette: &Palette) {
    let content_width = area.width.saturating_sub(2) as usize;
    let (title, content) = if let Some(editor) = app.editor.as_ref() {
        let title = match editor.kind() {
            EditorKind::NewTask => "New Task",
            EditorKind::EditTask => "Edit Task",
        };
        (
            title,
            build_editor_lines(
                editor,
                content_width,
                app.help_context == HelpContext::Editor,
                palette,
            ),
        )
    } else {
        ("Details", build_detail_lines(app, palette))
    };
    let widget = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(palette.border)),
        )
        .style(Style::default().bg(palette.surface))
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn render_footer<S: KeyValueStore>(frame: &mut Frame, app: &AppState<S>, area: Rect, palette: &Palette) {
    let hint_span = Span::styled(app.footer_hint(), Style::default().fg(palette.muted));
    let line = match app.notice() {
        Some(notice) => {
            let color = match notice.kind {
                NoticeKind::Success => palette.success,
                NoticeKind::Error => palette.error,
                NoticeKind::Info => palette.info,
            };
            Line::from(vec![
                Span::styled(
                    notice.message.clone(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw("  |  "),
                hint_span,
            ])
        }
        None => Line::from(hint_span),
    };
    let counts = app.counts();
    let counts_line = Line::from(Span::styled(
        format!(
            "{} total  {} active  {} completed",
            counts.total, counts.active, counts.completed
        ),
        Style::default().fg(palette.accent),
    ));
    let widget = Paragraph::new(vec![line, counts_line])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(palette.border)),
        );
    frame.render_widget(widget, area);
}

fn render_delete_confirm_modal(
    frame: &mut Frame,
    area: Rect,
    state: &DeleteConfirmState,
    palette: &Palette,
) {
    let content_width = area.width.saturating_sub(8).min(64);
    let height = 8u16.min(area.height.saturating_sub(6).max(7));
    let modal = centered_rect(content_width, height, area);
    frame.render_widget(Clear, modal);

    let text_width = (content_width as usize).saturating_sub(8);
    let lines = vec![
        Line::from(Span::styled(
            "Delete task?",
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            label_span("Task: ", palette),
            Span::styled(
                truncate_text(&state.text, text_width),
                Style::default().fg(palette.text),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "y/enter confirm  esc/n cancel",
            Style::default().fg(palette.muted),
        )),
    ];

    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Delete Task")
                .border_style(Style::default().fg(palette.error)),
        )
        .style(Style::default().bg(palette.surface))
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, modal);
}

fn build_editor_lines(
    editor: &EditorState,
    width: usize,
    show_help: bool,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (idx, field) in editor.fields().iter().enumerate() {
        let active = idx == editor.active_index();
        let marker = if active { "> " } else { "  " };
        let label_style = if active {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        lines.push(Line::from(vec![
            Span::styled(marker, label_style),
            Span::styled(field.label, label_style),
        ]));

        let value = if field.is_choice() {
            format!("< {} >", field.value)
        } else if active {
            format!("{}_", field.value)
        } else {
            field.value.clone()
        };
        lines.push(Line::from(Span::styled(
            format!("    {}", truncate_text(&value, width.saturating_sub(4))),
            Style::default().fg(palette.text),
        )));
    }

    if let Some(error) = editor.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(palette.error).add_modifier(Modifier::BOLD),
        )));
    }

    if show_help {
        lines.push(Line::from(""));
        lines.extend(build_editor_help_lines(width, palette));
    }
    lines
}

fn build_detail_lines<S: KeyValueStore>(app: &AppState<S>, palette: &Palette) -> Vec<Line<'static>> {
    let Some(task) = app.selected_task() else {
        return vec![Line::from(Span::styled(
            app.empty_message(),
            Style::default().fg(palette.muted),
        ))];
    };

    let status = if task.completed { "completed" } else { "active" };
    let due = app.due_state(task);
    let due_style = due_style(due, palette);
    let mut due_spans = vec![label_span("Due: ", palette), Span::styled(due_text(task), due_style)];
    if let Some(label) = due.label() {
        due_spans.push(Span::raw("  "));
        due_spans.push(Span::styled(label, due_style.add_modifier(Modifier::BOLD)));
    }

    vec![
        section_header(&task.text, palette),
        Line::from(""),
        Line::from(vec![
            label_span("Status: ", palette),
            Span::styled(status, Style::default().fg(palette.text)),
        ]),
        Line::from(vec![
            label_span("Category: ", palette),
            Span::styled(
                task.category.as_str(),
                Style::default().fg(palette.category(task.category)),
            ),
        ]),
        Line::from(vec![
            label_span("Priority: ", palette),
            Span::styled(
                task.priority.as_str(),
                Style::default()
                    .fg(palette.priority(task.priority))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(due_spans),
        Line::from(vec![
            label_span("Created: ", palette),
            Span::styled(
                task.created_at.format("%Y-%m-%d %H:%M").to_string(),
                Style::default().fg(palette.muted),
            ),
        ]),
        Line::from(vec![
            label_span("ID: ", palette),
            Span::styled(task.id.to_string(), Style::default().fg(palette.muted)),
        ]),
    ]
}

fn build_list_help_lines(width: usize, palette: &Palette) -> Vec<Line<'static>> {
    vec![
        help_header("More commands", palette),
        help_line("j/k or up/down", "move selection", width, palette),
        help_line("n", "new task", width, palette),
        help_line("e", "edit task text", width, palette),
        help_line("space/x", "toggle completed", width, palette),
        help_line("d", "delete task", width, palette),
        help_line("C", "clear completed", width, palette),
        help_line("1/2/3 or tab", "all / active / completed", width, palette),
        help_line("/", "search tasks", width, palette),
        help_line("K/J", "move task up / down", width, palette),
        help_line("t", "toggle theme", width, palette),
        help_line("r", "reload from disk", width, palette),
        help_line("enter", "toggle details in narrow view", width, palette),
        help_line("q/esc", "quit", width, palette),
        help_line("?", "hide help", width, palette),
    ]
}

fn build_editor_help_lines(width: usize, palette: &Palette) -> Vec<Line<'static>> {
    vec![
        help_header("Editor", palette),
        help_line("tab/shift+tab", "next or previous field", width, palette),
        help_line("left/right", "cycle category or priority", width, palette),
        help_line("space", "next choice", width, palette),
        help_line("ctrl+u", "clear text field", width, palette),
        help_line("enter", "next field / save on last", width, palette),
        help_line("esc", "cancel editor", width, palette),
    ]
}

fn help_header(title: &str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(palette.info).add_modifier(Modifier::BOLD),
    ))
}

fn help_line(keys: &str, desc: &str, width: usize, palette: &Palette) -> Line<'static> {
    let key_text = pad_text(keys, HELP_KEY_WIDTH.min(width));
    let desc_width = width.saturating_sub(HELP_KEY_WIDTH + 1);
    let desc_text = truncate_text(desc, desc_width);
    Line::from(vec![
        Span::styled(
            key_text,
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(desc_text, Style::default().fg(palette.muted)),
    ])
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_list_row(
    task: &Task,
    due: DueState,
    selected: bool,
    width: usize,
    palette: &Palette,
) -> Line<'static> {
    let checkbox = if task.completed { "[x]" } else { "[ ]" };
    let used = 4 + CATEGORY_WIDTH + PRIORITY_WIDTH + DUE_WIDTH + 4;
    let text_width = width.saturating_sub(used);

    let mut text_style = Style::default().fg(palette.text);
    if task.completed {
        text_style = text_style
            .fg(palette.muted)
            .add_modifier(Modifier::CROSSED_OUT);
    }

    let mut spans = vec![
        Span::styled(
            format!("{checkbox} "),
            Style::default().fg(if task.completed {
                palette.success
            } else {
                palette.muted
            }),
        ),
        Span::styled(pad_text(&task.text, text_width), text_style),
        Span::raw(" "),
        Span::styled(
            pad_text(task.category.as_str(), CATEGORY_WIDTH),
            Style::default().fg(palette.category(task.category)),
        ),
        Span::raw(" "),
        Span::styled(
            pad_text(task.priority.as_str(), PRIORITY_WIDTH),
            Style::default()
                .fg(palette.priority(task.priority))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(pad_text(&due_text(task), DUE_WIDTH), due_style(due, palette)),
    ];

    if selected {
        for span in &mut spans {
            span.style = span.style.bg(palette.highlight_bg);
        }
    }

    Line::from(spans)
}

fn due_text(task: &Task) -> String {
    task.due_date
        .map(|date| date.to_string())
        .unwrap_or_else(|| "No due date".to_string())
}

fn due_style(due: DueState, palette: &Palette) -> Style {
    match due {
        DueState::Overdue => Style::default()
            .fg(palette.overdue)
            .add_modifier(Modifier::BOLD),
        DueState::DueToday => Style::default().fg(palette.due_today),
        DueState::None => Style::default().fg(palette.muted),
    }
}

fn list_window(total: usize, selected: Option<usize>, height: usize) -> (usize, usize) {
    if total == 0 || height == 0 {
        return (0, 0);
    }
    if total <= height {
        return (0, total);
    }
    let selected = selected.unwrap_or(0);
    let mut start = selected.saturating_sub(height / 2);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn pad_text(value: &str, width: usize) -> String {
    let text = truncate_text(value, width);
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

fn truncate_text(value: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= max {
        return value.to_string();
    }
    if max <= 3 {
        return chars[..max].iter().collect();
    }
    let mut out: String = chars[..(max - 3)].iter().collect();
    out.push_str("...");
    out
}

fn label_span(label: &str, palette: &Palette) -> Span<'static> {
    Span::styled(label.to_string(), Style::default().fg(palette.muted))
}

fn section_header(title: &str, palette: &Palette) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::MemoryStore;
    use crate::store::TaskStore;
    use crate::task::{Action, NewTask, Priority};
    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(app: &AppState<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(110, 30)).expect("terminal");
        terminal.draw(|frame| render(frame, app)).expect("draw");
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).expect("date")
    }

    #[test]
    fn empty_collection_shows_placeholder() {
        let store = TaskStore::open(MemoryStore::new()).expect("open");
        let app = AppState::new(store, Config::default(), today());
        let text = screen_text(&app);
        assert!(text.contains("GlowTopia Tasks"));
        assert!(text.contains("No tasks yet. Add one above!"));
        assert!(text.contains("1 All (0)"));
    }

    #[test]
    fn rows_show_badges_and_due_state() {
        let mut store = TaskStore::open(MemoryStore::new()).expect("open");
        let mut input = NewTask::new("Pay rent");
        input.priority = Priority::High;
        input.due_date = NaiveDate::from_ymd_opt(2026, 3, 1);
        store.dispatch(Action::Create(input)).expect("create");
        store
            .dispatch(Action::Create(NewTask::new("Stretch")))
            .expect("create");

        let app = AppState::new(store, Config::default(), today());
        let text = screen_text(&app);
        assert!(text.contains("Pay rent"));
        assert!(text.contains("high"));
        assert!(text.contains("2026-03-01"));
        assert!(text.contains("Overdue"));
        assert!(text.contains("No due date"));
        assert!(text.contains("2 total"));
    }

    #[test]
    fn truncate_and_pad_respect_width() {
        assert_eq!(truncate_text("abcdefgh", 6), "abc...");
        assert_eq!(pad_text("ab", 4), "ab  ");
        assert_eq!(list_window(10, Some(9), 4), (6, 10));
    }
}
