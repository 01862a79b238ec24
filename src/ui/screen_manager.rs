//! ScreenManager - Draws the tree view and runs the main event loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::info;
use ncurses::*;

use super::crt::ColorElement;
use super::function_bar::{FunctionBar, DETAIL_FUNCTIONS};
use super::keys::{Command, KeyReader};
use super::refresh::WindowState;
use super::tree::DisplayLine;
use super::view::ProcessView;
use super::Crt;
use crate::core::{DetailFlags, Mark, Settings, SignalSender};
use crate::platform::ProcFs;

/// Rows used by the header, status line and function bar
const CHROME_ROWS: i32 = 3;

/// Operator message shown above the key legend
#[derive(Debug, Clone, PartialEq, Eq)]
struct Status {
    text: String,
    error: bool,
}

impl Status {
    fn info(text: impl Into<String>) -> Self {
        Status {
            text: text.into(),
            error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Status {
            text: text.into(),
            error: true,
        }
    }
}

/// Screen manager state
pub struct ScreenManager<'a> {
    procfs: &'a ProcFs,
    sender: Box<dyn SignalSender>,
    view: ProcessView,
    /// The single window showing the tree
    windows: [WindowState; 1],
    keys: KeyReader,
    function_bar: FunctionBar,
    status: Option<Status>,
}

impl<'a> ScreenManager<'a> {
    pub fn new(
        procfs: &'a ProcFs,
        sender: Box<dyn SignalSender>,
        crt: &Crt,
        settings: &Settings,
    ) -> Self {
        ScreenManager {
            procfs,
            sender,
            view: ProcessView::new(
                crt.tree_str,
                settings.refresh_interval(),
                settings.auto_refresh,
            ),
            windows: [WindowState::showing()],
            keys: KeyReader::new(),
            function_bar: FunctionBar::new(),
            status: None,
        }
    }

    fn list_height(crt: &Crt) -> usize {
        (crt.height() - CHROME_ROWS).max(1) as usize
    }

    /// Run the main event loop
    pub fn run(&mut self, crt: &mut Crt, running: &AtomicBool) -> anyhow::Result<()> {
        // Nothing to fall back on yet, so the first snapshot must succeed
        let count = self
            .view
            .refresh(self.procfs, &mut self.windows, Instant::now())?;
        info!("initial snapshot: {} processes", count);

        while running.load(Ordering::SeqCst) {
            match self.view.on_timer(self.procfs, &mut self.windows, Instant::now()) {
                Some(Err(e)) => self.status = Some(Status::error(e.to_string())),
                Some(Ok(_)) => self.clamp_window(crt),
                None => {}
            }

            self.draw(crt);

            crt.set_timeout(self.input_timeout());
            let command = match crt.read_key().and_then(|key| self.keys.feed(key)) {
                Some(command) => command,
                None => continue,
            };

            if !self.handle_command(command, crt) {
                break;
            }
        }

        Ok(())
    }

    /// Wake up in time for the next scheduled refresh
    fn input_timeout(&self) -> i32 {
        self.view
            .scheduler()
            .remaining(Instant::now())
            .map(|d| d.as_millis().min(i32::MAX as u128) as i32)
            .unwrap_or(1000)
            .max(10)
    }

    fn clamp_window(&mut self, crt: &Crt) {
        self.windows[0].clamp(self.view.len(), Self::list_height(crt));
    }

    /// Returns false when the loop should stop
    fn handle_command(&mut self, command: Command, crt: &mut Crt) -> bool {
        let height = Self::list_height(crt);
        let now = Instant::now();

        match command {
            Command::Quit => return false,
            Command::Resize => crt.update_size(),
            Command::Refresh => {
                self.status = match self.view.refresh(self.procfs, &mut self.windows, now) {
                    Ok(count) => Some(Status::info(format!("Refreshed: {} processes", count))),
                    Err(e) => Some(Status::error(e.to_string())),
                };
            }
            Command::Mark(mark, count) => {
                let row = self.windows[0].cursor_line;
                let done = self.view.mark(row, count, mark);
                self.windows[0].cursor_line = row + done;
                self.status = Some(Status::info(match mark {
                    Mark::Unmarked => format!("Unmarked {} lines", done),
                    _ => format!(
                        "Marked {} lines with {}; auto-refresh paused",
                        done,
                        mark.name()
                    ),
                }));
            }
            Command::UnmarkAll => {
                self.view.unmark_all();
                self.status = Some(Status::info("All marks cleared"));
            }
            Command::Execute => {
                let report = self
                    .view
                    .execute(self.sender.as_mut(), &mut self.windows, now);
                let status = report.summary();
                self.status = Some(if report.failed.is_empty() {
                    Status::info(status)
                } else {
                    Status::error(status)
                });
            }
            Command::Details => self.show_details(crt),
            motion => {
                let width = self
                    .view
                    .line_text(self.windows[0].cursor_line)
                    .map(|t| t.chars().count())
                    .unwrap_or(0);
                move_window(&mut self.windows[0], motion, self.view.len(), height, width);
            }
        }

        self.clamp_window(crt);
        true
    }

    /// Draw the entire screen
    fn draw(&self, crt: &Crt) {
        crt.clear();
        self.draw_header(crt);
        self.draw_lines(crt);
        self.draw_status(crt, crt.height() - 2);
        self.function_bar.draw(crt, crt.height() - 1);
        crt.refresh();
    }

    fn draw_header(&self, crt: &Crt) {
        let refreshed = self
            .view
            .last_refresh()
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());

        crt.print_colored(0, 0, ColorElement::Header, "Processes: ");
        addstr_colored(crt, ColorElement::HeaderValue, &self.view.len().to_string());
        addstr_colored(crt, ColorElement::Header, "  Marked: ");
        addstr_colored(crt, ColorElement::HeaderValue, &self.view.marked_count().to_string());
        addstr_colored(crt, ColorElement::Header, "  Refreshed: ");
        addstr_colored(crt, ColorElement::HeaderValue, &refreshed);
        addstr_colored(crt, ColorElement::Header, "  ");
        if self.view.scheduler().is_running() {
            addstr_colored(crt, ColorElement::Header, "[auto]");
        } else {
            addstr_colored(crt, ColorElement::Paused, "[paused]");
        }
        if let Some(count) = self.keys.pending_count() {
            addstr_colored(crt, ColorElement::HeaderValue, &format!("  {}", count));
        }
    }

    fn draw_lines(&self, crt: &Crt) {
        let window = &self.windows[0];
        let height = Self::list_height(crt);
        let width = crt.width().max(0) as usize;

        let rows = self
            .view
            .lines()
            .iter()
            .enumerate()
            .skip(window.scroll_top)
            .take(height);

        for (y, (row, line)) in rows.enumerate() {
            let y = y as i32 + 1;
            if row == window.cursor_line {
                crt.fill_row(y, ColorElement::Selection);
            }
            mv(y, 0);
            let mut skip = window.cursor_col;
            let mut room = width;
            for (text, element) in self.segments(line) {
                if room == 0 {
                    break;
                }
                let visible: String = text.chars().skip(skip).take(room).collect();
                skip = skip.saturating_sub(text.chars().count());
                if visible.is_empty() {
                    continue;
                }
                room -= visible.chars().count();
                let element = if row == window.cursor_line {
                    ColorElement::Selection
                } else {
                    element
                };
                addstr_colored(crt, element, &visible);
            }
        }
    }

    /// Split a line into colored parts; the concatenation is `line.text()`
    fn segments(&self, line: &DisplayLine) -> [(String, ColorElement); 4] {
        let tree_str = self.view.tree_str();
        let glyphs: String = line.indent.iter().map(|c| c.glyph(tree_str)).collect();
        let mark_color = if line.mark.is_marked() {
            ColorElement::ProcessMarked
        } else {
            ColorElement::DefaultColor
        };
        let state_color = if line.state == ' ' {
            ColorElement::DefaultColor
        } else {
            ColorElement::ProcessRunState
        };
        [
            (format!("{} {:>7} ", line.mark.label(), line.pid), mark_color),
            (format!("{} ", line.state), state_color),
            (glyphs, ColorElement::ProcessTree),
            (line.command.clone(), mark_color),
        ]
    }

    fn draw_status(&self, crt: &Crt, y: i32) {
        if let Some(status) = &self.status {
            let element = if status.error {
                ColorElement::StatusError
            } else {
                ColorElement::StatusMessage
            };
            let text: String = status
                .text
                .chars()
                .take(crt.width().max(0) as usize)
                .collect();
            crt.print_colored(y, 0, element, &text);
        }
    }

    /// Show details for the process under the cursor until Esc or q
    ///
    /// The tree is hidden meanwhile, so a pending refresh tick cancels the
    /// scheduler.
    fn show_details(&mut self, crt: &mut Crt) {
        let pid = match self.view.lines().get(self.windows[0].cursor_line) {
            Some(line) => line.pid,
            None => return,
        };
        let lines = match self.procfs.read_details(pid, DetailFlags::all()) {
            Some(details) => details.to_lines(),
            None => vec![format!("Process {} is no longer available.", pid)],
        };
        let bar = FunctionBar::with_labels(&DETAIL_FUNCTIONS);

        self.windows[0].shows_view = false;
        let mut top = 0usize;

        loop {
            match self.view.on_timer(self.procfs, &mut self.windows, Instant::now()) {
                Some(Err(e)) => self.status = Some(Status::error(e.to_string())),
                Some(Ok(_)) => self.clamp_window(crt),
                None => {}
            }

            let height = Self::list_height(crt);
            crt.clear();
            crt.print_colored(0, 0, ColorElement::HelpBold, &format!("Details for PID {}", pid));
            for (y, text) in lines.iter().skip(top).take(height).enumerate() {
                let clipped: String = text.chars().take(crt.width().max(0) as usize).collect();
                crt.print_colored(y as i32 + 1, 0, ColorElement::DefaultColor, &clipped);
            }
            bar.draw(crt, crt.height() - 1);
            crt.refresh();

            crt.set_timeout(self.input_timeout());
            let key = match crt.read_key() {
                Some(key) => key,
                None => continue,
            };
            let max_top = lines.len().saturating_sub(height);
            match key {
                KEY_UP => top = top.saturating_sub(1),
                KEY_DOWN => top = (top + 1).min(max_top),
                KEY_PPAGE => top = top.saturating_sub(height),
                KEY_NPAGE => top = (top + height).min(max_top),
                KEY_HOME => top = 0,
                KEY_END => top = max_top,
                KEY_RESIZE => crt.update_size(),
                0x1B | 0x71 => break, // Esc or q
                _ => {}
            }
        }

        self.windows[0].shows_view = true;
        if self.view.marked_count() > 0 {
            self.status = Some(Status::info("Marks pending; refresh or execute to resume"));
            return;
        }
        if let Err(e) = self
            .view
            .refresh(self.procfs, &mut self.windows, Instant::now())
        {
            self.status = Some(Status::error(e.to_string()));
        }
    }
}

fn addstr_colored(crt: &Crt, element: ColorElement, text: &str) {
    attrset(crt.color(element));
    let _ = addstr(text);
    attrset(A_NORMAL);
}

/// Apply a cursor motion; `width` is the length of the current line
fn move_window(window: &mut WindowState, motion: Command, len: usize, height: usize, width: usize) {
    let last = len.saturating_sub(1);
    match motion {
        Command::Up(n) => window.cursor_line = window.cursor_line.saturating_sub(n),
        Command::Down(n) => window.cursor_line = window.cursor_line.saturating_add(n).min(last),
        Command::PageUp => {
            window.cursor_line = window.cursor_line.saturating_sub(height);
            window.scroll_top = window.scroll_top.saturating_sub(height);
        }
        Command::PageDown => {
            window.cursor_line = window.cursor_line.saturating_add(height).min(last);
            window.scroll_top = window.scroll_top.saturating_add(height);
        }
        Command::Home => window.cursor_line = 0,
        Command::End => window.cursor_line = last,
        Command::Left(n) => window.cursor_col = window.cursor_col.saturating_sub(n),
        Command::Right(n) => window.cursor_col = window.cursor_col.saturating_add(n).min(width),
        _ => {}
    }
    window.clamp(len, height);
}
