//! Main TUI application state and logic

use crate::interpreter::engine::Machine;
use crate::interpreter::errors::EngineError;
use crate::interpreter::scheduler::Scheduler;
use crate::interpreter::step::Action;
use crate::memory::Address;
use crate::ui::panes::{self, HeapRenderData, StatusRenderData};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame, Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout},
};
use std::io;
use std::time::{Duration, Instant};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Command,
    Trace,
    Heap,
}

impl FocusedPane {
    /// Move focus to the next pane (command -> trace -> heap)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Command => FocusedPane::Trace,
            FocusedPane::Trace => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Command,
        }
    }
}

/// The main application state
pub struct App<S: Scheduler> {
    /// The machine whose recorded schedule is being browsed
    pub machine: Machine<S>,

    /// Scenario title shown in the status bar
    pub title: String,

    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub command_scroll: usize,
    pub trace_scroll: usize,
    pub heap_scroll: usize,

    pub should_quit: bool,

    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl<S: Scheduler> App<S> {
    pub fn new(machine: Machine<S>, title: String) -> Self {
        App {
            machine,
            title,
            focused_pane: FocusedPane::Trace,
            command_scroll: 0,
            trace_scroll: 0,
            heap_scroll: 0,
            should_quit: false,
            status_message: String::from("Ready!"),
            is_playing: false,
            last_play_time: Instant::now(),
            last_space_press: Instant::now()
                .checked_sub(Duration::from_secs(1))
                .unwrap_or_else(Instant::now),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_millis(400) {
                if self.machine.step_forward().is_ok() {
                    self.status_message = "Playing...".to_string();
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Poll with a timeout so auto-play keeps ticking
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// The address the step on screen read, wrote or freed
    fn touched_address(&self) -> Option<Address> {
        let event = self.machine.current_snapshot()?.event.as_ref()?;
        match event.action {
            Action::Get { address, .. } | Action::Set { address, .. } | Action::Free { address } => {
                Some(address)
            }
            Action::Alloc { base, .. } => Some(base),
            _ => None,
        }
    }

    /// The faulting address, shown only once the view reaches the end
    fn error_address(&self) -> Option<Address> {
        let snapshot = self.machine.current_snapshot()?;
        snapshot.outcome.as_ref()?.fault().map(|f| f.address())
    }

    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        // Right column: Trace (top) | Heap (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(columns[1]);

        let touched_address = self.touched_address();
        let error_address = self.error_address();

        if let Some(snapshot) = self.machine.current_snapshot() {
            panes::render_command_pane(
                frame,
                columns[0],
                &snapshot.command,
                self.focused_pane == FocusedPane::Command,
                &mut self.command_scroll,
            );
            panes::render_heap_pane(
                frame,
                right_rows[1],
                HeapRenderData {
                    heap: &snapshot.heap,
                    error_address,
                    touched_address,
                },
                self.focused_pane == FocusedPane::Heap,
                &mut self.heap_scroll,
            );
        }

        panes::render_trace_pane(
            frame,
            right_rows[0],
            self.machine.snapshots(),
            self.machine.history_position(),
            self.focused_pane == FocusedPane::Trace,
            &mut self.trace_scroll,
        );

        let scheduler = self.machine.scheduler_name();
        let message = format!("{} | {}", self.title, self.status_message);
        panes::render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &message,
                scheduler: &scheduler,
                position: self.machine.history_position(),
                total_snapshots: self.machine.total_snapshots(),
                outcome: self.machine.current_snapshot().and_then(|s| s.outcome.as_ref()),
                is_playing: self.is_playing,
            },
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c.to_digit(10).unwrap_or(1) as usize;
                let stepped = (0..n)
                    .take_while(|_| self.machine.step_forward().is_ok())
                    .count();
                self.status_message = format!("Stepped forward {} step(s)", stepped);
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Left => {
                self.is_playing = false;
                let result = self.machine.step_backward();
                self.report(result, "Stepped backward");
            }
            KeyCode::Right => {
                self.is_playing = false;
                let result = self.machine.step_forward();
                self.report(result, "Stepped forward");
            }
            KeyCode::Up => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add(1);
            }
            KeyCode::Char(' ') => {
                // 200ms debounce against key repeat
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    self.status_message = if self.is_playing {
                        "Playing...".to_string()
                    } else {
                        "Paused".to_string()
                    };
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.machine.jump_to_end();
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.machine.rewind_to_start();
                self.status_message = "Jumped to start".to_string();
            }
            _ => {}
        }
    }

    fn focused_scroll(&mut self) -> &mut usize {
        match self.focused_pane {
            FocusedPane::Command => &mut self.command_scroll,
            FocusedPane::Trace => &mut self.trace_scroll,
            FocusedPane::Heap => &mut self.heap_scroll,
        }
    }

    fn report(&mut self, result: Result<(), EngineError>, done: &str) {
        self.status_message = match result {
            Ok(()) => done.to_string(),
            Err(e) => format!("Cannot step: {}", e),
        };
    }
}
