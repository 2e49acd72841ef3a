//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`command`]: the remaining program as an indented tree
//! - [`heap`]: heap cells, with the faulting address highlighted
//! - [`trace`]: the step events recorded so far, current step marked
//! - [`status`]: status bar with keybindings and run state
//!
//! Each pane exports a `render_*` function and, where the pane scrolls, a
//! scroll state owned by the app.

pub mod command;
pub mod heap;
pub mod status;
pub mod trace;

pub use command::render_command_pane;
pub use heap::{render_heap_pane, HeapRenderData};
pub use status::{render_status_bar, StatusRenderData};
pub use trace::render_trace_pane;

use crate::ui::theme::DEFAULT_THEME;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders};

/// Bordered block with the focus highlight shared by every pane
fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Clamp a scroll offset so the last page stays filled
fn clamp_scroll(offset: &mut usize, items: usize, visible: usize) {
    let max = items.saturating_sub(visible);
    if *offset > max {
        *offset = max;
    }
}
