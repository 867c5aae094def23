//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, RunState};
use crate::config::UiSettings;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("enter/s", "start");
    map.insert("c/esc", "cancel");
    map.insert("j/k", "up/down");
    map.insert("f", "summary");
    map.insert("q", "quit");
    map
});

/// Render the controls help text for the current run state.
fn controls_text(state: RunState) -> String {
    let order: &[&str] = match state {
        RunState::Idle => &["enter/s", "j/k", "q"],
        RunState::Running | RunState::CancelRequested => &["c/esc", "j/k", "q"],
        RunState::Completed => &["j/k", "f", "q"],
    };
    order
        .iter()
        .filter_map(|k| CONTROLS_MAP.get(k).map(|v| format!("[{}] {}", k, v)))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn status_text(app: &App, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(" STATE: {}", app.state.label()));
    parts.push(app.status_text.clone());
    if ui.show_backends && !app.backends.is_empty() {
        parts.push(format!("BACKENDS: {}", app.backends.join(", ")));
    }
    parts.push(format!("IN: {}", app.input.display()));
    parts.push(format!("OUT: {}", app.output.display()));

    let mut text = parts.join(" • ");
    if app.state == RunState::Idle {
        for w in &app.warnings {
            text.push_str("\n WARNING: ");
            text.push_str(w);
        }
        if !app.warnings.is_empty() && app.has_files() {
            text.push_str("\n press enter to continue anyway");
        }
    }
    text
}

/// Text for one row of the file list.
pub(crate) fn file_row(app: &App, index: usize) -> String {
    let file = &app.files[index];
    let status = &app.statuses[index];
    match status.detail() {
        Some(detail) => format!("{} {}  {}", status.marker(), file.file_name(), detail),
        None => format!("{} {}", status.marker(), file.file_name()),
    }
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings) {
    let status_height = 4 + app.warnings.len().min(3) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(status_height),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());
    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" oggshift ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let mut status_par = Paragraph::new(status_text(app, ui_settings))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    if app.state == RunState::CancelRequested {
        status_par = status_par.slow_blink();
    }
    frame.render_widget(status_par, chunks[1]);

    // File list
    {
        // Only build ListItems for the visible window, centered on the selection.
        let total = app.files.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = (start..end)
            .map(|i| ListItem::new(file_row(app, i)))
            .collect();

        let list = List::new(visible_items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" files ({}) ", total)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Progress
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" progress "))
        .gauge_style(Style::default().add_modifier(Modifier::BOLD))
        .ratio(app.progress.clamp(0.0, 1.0))
        .label(format!("{:.0}%", app.progress * 100.0));
    frame.render_widget(gauge, chunks[3]);

    // Overlay summary popup (keeps list visible under it)
    if app.summary_window {
        let list_area = chunks[2];
        let lines = app.summary_lines();
        let height = (lines.len() as u16).saturating_add(2);
        let popup_area = centered_rect_sized(90, height, list_area);
        frame.render_widget(Clear, popup_area);

        let summary = Paragraph::new(lines.join("\n"))
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" summary (f closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(summary, popup_area);
    }

    let footer = Paragraph::new(controls_text(app.state))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FileStatus;
    use crate::library::SourceFile;
    use ratatui::{Terminal, backend::TestBackend};
    use std::path::PathBuf;

    fn app() -> App {
        App::new(
            vec![
                SourceFile::new("/m/a.ogg", 1),
                SourceFile::new("/m/b.ogg", 1),
            ],
            PathBuf::from("/m"),
            PathBuf::from("/o"),
        )
    }

    #[test]
    fn controls_follow_run_state() {
        assert_eq!(controls_text(RunState::Idle), "[enter/s] start | [j/k] up/down | [q] quit");
        assert!(controls_text(RunState::Running).starts_with("[c/esc] cancel"));
        assert!(controls_text(RunState::Completed).contains("[f] summary"));
    }

    #[test]
    fn rows_show_marker_and_detail() {
        let mut app = app();
        app.statuses[1] = FileStatus::Failed("precondition: input file is empty".into());
        assert_eq!(file_row(&app, 0), "[ ] a.ogg");
        assert_eq!(file_row(&app, 1), "[!] b.ogg  precondition: input file is empty");
    }

    #[test]
    fn warnings_only_shown_before_start() {
        let mut app = app();
        app.warnings = vec!["ffmpeg: not found".into()];
        let ui = UiSettings::default();
        assert!(status_text(&app, &ui).contains("WARNING: ffmpeg: not found"));
        app.start();
        assert!(!status_text(&app, &ui).contains("WARNING"));
    }

    #[test]
    fn draws_into_a_small_terminal() {
        let mut app = app();
        app.summary_window = true;
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal
            .draw(|f| draw(f, &app, &UiSettings::default()))
            .unwrap();
    }
}
