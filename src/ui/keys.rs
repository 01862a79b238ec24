//! Key bindings
//!
//! Turns raw key codes into view commands. Digits typed before a command
//! form a repeat count, so `3k` marks three lines with KILL.

use ncurses::{
    KEY_DOWN, KEY_END, KEY_ENTER, KEY_HOME, KEY_LEFT, KEY_NPAGE, KEY_PPAGE, KEY_RESIZE,
    KEY_RIGHT, KEY_UP,
};

use super::crt::{KEY_F10, KEY_F5};
use crate::core::Mark;

const KEY_ESC: i32 = 0x1B;
const MAX_COUNT: usize = 99_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up(usize),
    Down(usize),
    Left(usize),
    Right(usize),
    PageUp,
    PageDown,
    Home,
    End,
    /// Mark (or unmark) `count` lines from the cursor
    Mark(Mark, usize),
    UnmarkAll,
    Execute,
    Refresh,
    Details,
    Resize,
    Quit,
}

/// Accumulates a count prefix across key presses
#[derive(Debug, Default)]
pub struct KeyReader {
    count: Option<usize>,
}

impl KeyReader {
    pub fn new() -> Self {
        KeyReader::default()
    }

    /// Count typed so far, for the status line
    pub fn pending_count(&self) -> Option<usize> {
        self.count
    }

    pub fn feed(&mut self, key: i32) -> Option<Command> {
        if let Some(digit) = u8::try_from(key)
            .ok()
            .filter(u8::is_ascii_digit)
            .map(|b| (b - b'0') as usize)
        {
            let count = self.count.unwrap_or(0).saturating_mul(10) + digit;
            self.count = Some(count.min(MAX_COUNT));
            return None;
        }

        let count = self.count.take().unwrap_or(1).max(1);
        let command = match key {
            KEY_UP => Command::Up(count),
            KEY_DOWN => Command::Down(count),
            KEY_LEFT => Command::Left(count),
            KEY_RIGHT => Command::Right(count),
            KEY_PPAGE => Command::PageUp,
            KEY_NPAGE => Command::PageDown,
            KEY_HOME => Command::Home,
            KEY_END => Command::End,
            KEY_RESIZE => Command::Resize,
            KEY_F5 => Command::Refresh,
            KEY_F10 => Command::Quit,
            KEY_ENTER => Command::Details,
            KEY_ESC => return None,
            _ => match u8::try_from(key).map(char::from) {
                Ok('t') => Command::Mark(Mark::Term, count),
                Ok('h') => Command::Mark(Mark::Hup, count),
                Ok('k') => Command::Mark(Mark::Kill, count),
                Ok('Q') => Command::Mark(Mark::Quit, count),
                Ok('u') => Command::Mark(Mark::Unmarked, count),
                Ok('U') => Command::UnmarkAll,
                Ok('x') => Command::Execute,
                Ok('g') => Command::Refresh,
                Ok('d') | Ok('\n') | Ok('\r') => Command::Details,
                Ok('q') => Command::Quit,
                _ => return None,
            },
        };
        Some(command)
    }
}
