//! Heap pane rendering
//!
//! One line per allocated cell in address order. The cell a fault points at
//! is highlighted, as is the cell touched by the step that produced the
//! state on screen.

use super::{clamp_scroll, pane_block};
use crate::memory::{Address, Heap};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

/// Data needed to render the heap pane
pub struct HeapRenderData<'a> {
    pub heap: &'a Heap,
    /// Address named by the fault that ended the run, if any
    pub error_address: Option<Address>,
    /// Address read or written by the last step, if any
    pub touched_address: Option<Address>,
}

/// Render the heap pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    data: HeapRenderData,
    is_focused: bool,
    scroll: &mut usize,
) {
    let title = format!(" Heap ({} cells) ", data.heap.len());
    let block = pane_block(&title, is_focused);

    let cells = data.heap.cells();
    let visible = area.height.saturating_sub(2) as usize;
    let mut items = Vec::new();

    if cells.is_empty() {
        items.push(ListItem::new("(empty heap)").style(Style::default().fg(DEFAULT_THEME.comment)));
    } else {
        clamp_scroll(scroll, cells.len(), visible);
        for (addr, value) in cells.into_iter().skip(*scroll).take(visible) {
            let addr_style = if Some(addr) == data.error_address {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else if Some(addr) == data.touched_address {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.address)
            };

            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!("{:>6}", addr), addr_style),
                Span::styled(" ↦ ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(value.to_string(), Style::default().fg(DEFAULT_THEME.number)),
            ])));
        }
    }

    frame.render_widget(List::new(items).block(block), area);
}
