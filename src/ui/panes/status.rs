//! Status bar rendering with keybindings and state indicators

use crate::interpreter::engine::RunResult;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Data needed to render the status bar
pub struct StatusRenderData<'a> {
    pub message: &'a str,
    pub scheduler: &'a str,
    /// Snapshot index on screen
    pub position: usize,
    pub total_snapshots: usize,
    /// How the run ended, once it has
    pub outcome: Option<&'a RunResult>,
    pub is_playing: bool,
}

fn badge(text: &str, bg: Color) -> Span<'_> {
    Span::styled(
        text,
        Style::default()
            .bg(bg)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
}

/// Render the status bar at the bottom
pub fn render_status_bar(frame: &mut Frame, area: Rect, data: StatusRenderData) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let step_bg = match data.outcome {
        Some(RunResult::Faulted(_)) => DEFAULT_THEME.error,
        Some(RunResult::DivergedOrBudgetExceeded { .. }) => DEFAULT_THEME.secondary,
        _ => DEFAULT_THEME.primary,
    };
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);
    let text_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);

    let step_text = format!(" Step {}/{} ", data.position, data.total_snapshots.saturating_sub(1));
    let left_spans = vec![
        badge(&step_text, step_bg),
        Span::styled(" | ", sep_style),
        Span::styled(format!("{} ", data.scheduler), Style::default().bg(DEFAULT_THEME.current_line_bg).fg(DEFAULT_THEME.comment)),
        Span::styled(" | ", sep_style),
        Span::styled(format!(" {} ", data.message), text_style),
    ];
    frame.render_widget(
        Paragraph::new(Line::from(left_spans))
            .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
            .alignment(Alignment::Left),
        layout[0],
    );

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let mut right_spans = vec![
        Span::styled(" ←/→ ", key_style),
        Span::styled(" step ", text_style),
        Span::styled("│", sep_style),
        Span::styled(" ⎵ ", key_style),
        Span::styled(" play ", text_style),
        Span::styled("│", sep_style),
        Span::styled(" ↵ / ⌫ ", key_style),
        Span::styled(" end/start ", text_style),
        Span::styled("│", sep_style),
        Span::styled(" ⇥ ", key_style),
        Span::styled(" focus ", text_style),
        Span::styled("│", sep_style),
        Span::styled("q", key_style),
        Span::styled(" quit ", text_style),
        Span::styled("│", sep_style),
    ];

    let is_at_end = data.position + 1 >= data.total_snapshots;
    let indicator = if data.is_playing {
        Some(badge(" ▶ PLAYING ", DEFAULT_THEME.secondary))
    } else if is_at_end {
        match data.outcome {
            Some(RunResult::Completed { .. }) => Some(badge(" DONE ", DEFAULT_THEME.success)),
            Some(RunResult::Faulted(_)) => Some(badge(" FAULT ", DEFAULT_THEME.error)),
            Some(RunResult::DivergedOrBudgetExceeded { .. }) => {
                Some(badge(" BUDGET ", DEFAULT_THEME.secondary))
            }
            None => None,
        }
    } else if data.position == 0 {
        Some(badge(" START ", DEFAULT_THEME.success))
    } else {
        None
    };
    right_spans.extend(indicator);

    frame.render_widget(
        Paragraph::new(Line::from(right_spans))
            .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
            .alignment(Alignment::Right),
        layout[1],
    );
}
