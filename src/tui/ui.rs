//! UI layout and rendering logic for the playground.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::app::{AiPanel, App, Focus, RuntimePhase};
use crate::snippets::SNIPPETS;
use crate::transcript::EntryKind;

const SIDEBAR_WIDTH: u16 = 24;
const AI_PANEL_WIDTH: u16 = 44;

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    if matches!(app.phase, RuntimePhase::Initializing) {
        render_loading_screen(frame);
        return;
    }

    let show_ai = app.ai_panel != AiPanel::Hidden;
    let columns = if show_ai {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(SIDEBAR_WIDTH),
                Constraint::Min(20),
                Constraint::Length(AI_PANEL_WIDTH),
            ])
            .split(frame.area())
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
            .split(frame.area())
    };

    render_sidebar(frame, app, columns[0]);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(60), // Editor
            Constraint::Percentage(40), // Console
            Constraint::Length(1),      // Status bar
        ])
        .split(columns[1]);

    render_editor(frame, app, main[0]);
    render_console(frame, app, main[1]);
    render_status_bar(frame, app, main[2]);

    if show_ai {
        render_ai_panel(frame, app, columns[2]);
    }

    if let RuntimePhase::Failed(message) = &app.phase {
        render_fatal_banner(frame, message);
    }
}

fn render_loading_screen(frame: &mut Frame) {
    let area = centered_rect(60, 30, frame.area());
    let text = Text::from(vec![
        Line::from(Span::styled(
            "Initializing Python Engine",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Probing the local interpreter...",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("pyground"))
        .alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = SNIPPETS
        .iter()
        .map(|s| ListItem::new(Line::from(format!("  {}", s.name))))
        .collect();

    let border_style = if app.focus == Focus::Sidebar {
        Style::default().fg(Color::Blue)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title("Examples"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.sidebar_selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.focus == Focus::Editor {
        Style::default().fg(Color::Blue)
    } else {
        Style::default()
    };

    let lines: Vec<Line> = app
        .editor
        .lines()
        .iter()
        .map(|l| Line::from(l.clone()))
        .collect();

    let (row, col) = app.editor.cursor();
    let view_height = area.height.saturating_sub(2) as usize;
    let scroll_y = if view_height > 0 && row >= view_height {
        (row + 1 - view_height) as u16
    } else {
        0
    };

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title("Editor"),
        )
        .scroll((scroll_y, 0));
    frame.render_widget(paragraph, area);

    // Place the terminal cursor at the edit point.
    if app.focus == Focus::Editor && !matches!(app.phase, RuntimePhase::Failed(_)) {
        let line = &app.editor.lines()[row];
        let prefix: String = line.chars().take(col).collect();
        let x = area.x + 1 + prefix.width() as u16;
        let y = area.y + 1 + row as u16 - scroll_y;
        if x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1) {
            #[allow(deprecated)]
            frame.set_cursor(x, y);
        }
    }
}

fn render_console(frame: &mut Frame, app: &App, area: Rect) {
    let mut content_lines: Vec<Line> = Vec::new();

    if app.transcript.is_empty() {
        content_lines.push(Line::from(Span::styled(
            "Program output will appear here...",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    } else {
        for entry in app.transcript.iter() {
            let style = match entry.kind {
                EntryKind::Stderr => Style::default().fg(Color::Red),
                EntryKind::System => Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
                EntryKind::Stdout => Style::default(),
            };
            if entry.content.is_empty() {
                content_lines.push(Line::from(""));
            } else {
                for line in entry.content.lines() {
                    content_lines.push(Line::from(Span::styled(line.to_string(), style)));
                }
            }
        }
    }

    // Tail window: the log itself is unbounded, only the rendering scrolls.
    let available_height = area.height.saturating_sub(2) as usize;
    let total_lines = content_lines.len();

    let mut paragraph = Paragraph::new(Text::from(content_lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Console Output (PgUp/PgDn scroll)"),
    );

    if total_lines > available_height {
        let max_scroll = total_lines.saturating_sub(available_height);
        let scroll_y = if app.console_scroll == 0 {
            max_scroll as u16
        } else {
            let actual_offset = app.console_scroll.min(max_scroll);
            (max_scroll - actual_offset) as u16
        };
        paragraph = paragraph.scroll((scroll_y, 0));
    }

    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_text = format!("{} | Model: {}", app.status_message, app.model);
    let status_paragraph =
        Paragraph::new(status_text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_paragraph, area);
}

fn render_ai_panel(frame: &mut Frame, app: &App, area: Rect) {
    let (title, body) = match &app.ai_panel {
        AiPanel::Loading => (
            "AI Insight (thinking...)",
            Text::from(Span::styled(
                "AI is analyzing your code context...",
                Style::default().fg(Color::DarkGray),
            )),
        ),
        AiPanel::Ready(text) => {
            let lines: Vec<Line> = text.lines().map(|l| Line::from(l.to_string())).collect();
            ("AI Insight (Esc to close)", Text::from(lines))
        }
        AiPanel::Hidden => return,
    };

    let paragraph = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_fatal_banner(frame: &mut Frame, message: &str) {
    let popup_area = centered_rect(70, 40, frame.area());
    frame.render_widget(Clear, popup_area);

    let text = Text::from(vec![
        Line::from(Span::styled(
            "Failed to initialize Python engine",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+Q to exit",
            Style::default().fg(Color::Yellow),
        )),
    ]);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title("Fatal"),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
