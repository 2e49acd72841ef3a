//! Command pane: the program still to run, as an indented tree

use super::{clamp_scroll, pane_block};
use crate::command::Command;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

const KEYWORDS: [&str; 8] = ["let", "in", "if", "else", "repeat", "par", "||", "atomic"];

fn highlight_tree_line(line: &str) -> Line<'_> {
    let indent = line.len() - line.trim_start().len();
    let (pad, body) = line.split_at(indent);
    let mut spans = vec![Span::raw(pad)];

    for (i, word) in body.split(' ').enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        let style = if KEYWORDS.contains(&word) {
            Style::default()
                .fg(DEFAULT_THEME.keyword)
                .add_modifier(Modifier::BOLD)
        } else if word.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            Style::default().fg(DEFAULT_THEME.number)
        } else if word.starts_with('<') {
            Style::default().fg(DEFAULT_THEME.comment)
        } else {
            Style::default().fg(DEFAULT_THEME.fg)
        };
        spans.push(Span::styled(word, style));
    }

    Line::from(spans)
}

/// Render the command pane
pub fn render_command_pane(
    frame: &mut Frame,
    area: Rect,
    command: &Command,
    is_focused: bool,
    scroll: &mut usize,
) {
    let title = format!(" Command ({}, {} nodes) ", command.kind(), command.size());
    let block = pane_block(&title, is_focused);
    let lines = command.tree_lines();
    let visible = area.height.saturating_sub(2) as usize;
    clamp_scroll(scroll, lines.len(), visible);

    let text: Vec<Line> = lines
        .iter()
        .skip(*scroll)
        .take(visible)
        .map(|l| highlight_tree_line(l))
        .collect();

    frame.render_widget(Paragraph::new(text).block(block), area);
}
