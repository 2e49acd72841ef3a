//! Trace pane: every recorded step event, with the one on screen marked

use super::pane_block;
use crate::snapshot::SnapshotManager;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

/// Render the trace pane, keeping `position` (a snapshot index) in view
pub fn render_trace_pane(
    frame: &mut Frame,
    area: Rect,
    history: Option<&SnapshotManager>,
    position: usize,
    is_focused: bool,
    scroll: &mut usize,
) {
    let block = pane_block(" Trace ", is_focused);
    let visible = area.height.saturating_sub(2) as usize;

    let Some(history) = history else {
        let items = vec![ListItem::new("(not recording)").style(Style::default().fg(DEFAULT_THEME.comment))];
        frame.render_widget(List::new(items).block(block), area);
        return;
    };

    // Snapshot 0 is the initial state; event i produced snapshot i + 1
    let events: Vec<_> = history.events().collect();
    if position > 0 {
        let current = position - 1;
        if current < *scroll {
            *scroll = current;
        } else if visible > 0 && current >= *scroll + visible {
            *scroll = current + 1 - visible;
        }
    }

    let items: Vec<ListItem> = events
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible)
        .map(|(i, event)| {
            let is_current = i + 1 == position;
            let marker = if is_current { "▶ " } else { "  " };
            let event_style = if event.action.is_local() {
                Style::default().fg(DEFAULT_THEME.local_step)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            let line = Line::from(vec![
                Span::styled(marker, Style::default().fg(DEFAULT_THEME.secondary)),
                Span::styled(format!("{:>5} ", i + 1), Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(event.to_string(), event_style),
            ]);
            let item = ListItem::new(line);
            if is_current {
                item.style(
                    Style::default()
                        .bg(DEFAULT_THEME.current_line_bg)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                item
            }
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
