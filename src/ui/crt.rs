//! CRT - Terminal abstraction using ncurses
//!
//! This module provides the terminal interface using the ncurses library.

use ncurses::CURSOR_VISIBILITY::{CURSOR_INVISIBLE, CURSOR_VISIBLE};
use ncurses::*;

use super::tree::{TreeStrings, TREE_ASCII, TREE_UTF8};
use crate::core::{ColorScheme, Settings};

/// Color elements for the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ColorElement {
    ResetColor = 0,
    DefaultColor,
    FunctionBar,
    FunctionKey,
    Header,
    HeaderValue,
    Paused,
    Selection,
    ProcessTree,
    ProcessRunState,
    ProcessMarked,
    StatusMessage,
    StatusError,
    HelpBold,
    LastColorElement,
}

pub const KEY_F5: i32 = KEY_F0 + 5;
pub const KEY_F10: i32 = KEY_F0 + 10;

// ColorIndex(i,j) = (7-i)*8+j gives every fg/bg combination its own pair.
// Pair 0 (white on black) cannot be redefined, so it is moved to an unused slot.

#[inline]
const fn color_index(fg: i16, bg: i16) -> i16 {
    (7 - fg) * 8 + bg
}

const COLOR_INDEX_WHITE_BLACK: i16 = color_index(COLOR_YELLOW, COLOR_YELLOW);

#[inline]
fn color_pair(fg: i16, bg: i16) -> attr_t {
    if fg == COLOR_WHITE && bg == COLOR_BLACK {
        COLOR_PAIR(COLOR_INDEX_WHITE_BLACK)
    } else {
        COLOR_PAIR(color_index(fg, bg))
    }
}

/// CRT - Terminal handler
pub struct Crt {
    pub colors: Vec<attr_t>,
    pub tree_str: &'static TreeStrings,
    screen_width: i32,
    screen_height: i32,
}

impl Crt {
    /// Initialize the terminal
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        Self::init_locale();

        initscr();
        noecho();
        cbreak();
        curs_set(CURSOR_INVISIBLE);
        keypad(stdscr(), true);

        if has_colors() {
            start_color();
            use_default_colors();
        }

        let mut crt = Crt {
            colors: vec![A_NORMAL; ColorElement::LastColorElement as usize],
            tree_str: Self::tree_strings(settings.allow_unicode && Self::check_utf8_support()),
            screen_width: 0,
            screen_height: 0,
        };

        crt.set_colors(settings.color_scheme);
        crt.update_size();

        Ok(crt)
    }

    /// Set LC_CTYPE from the environment; must run before initscr for wide
    /// characters
    pub fn init_locale() {
        unsafe {
            let lc_ctype = std::env::var("LC_CTYPE")
                .ok()
                .or_else(|| std::env::var("LC_ALL").ok());

            if let Some(lc) = lc_ctype {
                let c_str = std::ffi::CString::new(lc).unwrap_or_default();
                libc::setlocale(libc::LC_CTYPE, c_str.as_ptr());
            } else {
                libc::setlocale(libc::LC_CTYPE, b"\0".as_ptr() as *const libc::c_char);
            }
        }
    }

    /// Glyph set for the terminal's character set
    pub fn tree_strings(utf8: bool) -> &'static TreeStrings {
        if utf8 {
            &TREE_UTF8
        } else {
            &TREE_ASCII
        }
    }

    /// Check if UTF-8 is supported
    pub fn check_utf8_support() -> bool {
        #[cfg(unix)]
        {
            use std::ffi::CStr;

            let codeset = unsafe {
                let ptr = libc::nl_langinfo(libc::CODESET);
                if !ptr.is_null() {
                    CStr::from_ptr(ptr).to_string_lossy().to_string()
                } else {
                    String::new()
                }
            };

            let codeset = codeset.to_uppercase();
            if codeset == "UTF-8" || codeset == "UTF8" {
                return true;
            }
        }

        ["LANG", "LC_ALL", "LC_CTYPE"].iter().any(|var| {
            std::env::var(var)
                .map(|v| v.to_lowercase().contains("utf"))
                .unwrap_or(false)
        })
    }

    /// Set up color pairs for a color scheme
    pub fn set_colors(&mut self, scheme: ColorScheme) {
        if !has_colors() || scheme == ColorScheme::Monochrome {
            self.setup_monochrome();
            return;
        }

        for i in 0i16..8 {
            for j in 0i16..8 {
                let idx = color_index(i, j);
                if idx != COLOR_INDEX_WHITE_BLACK && idx != 0 {
                    let bg = if j == 0 { -1 } else { j };
                    init_pair(idx, i, bg);
                }
            }
        }
        init_pair(COLOR_INDEX_WHITE_BLACK, COLOR_WHITE, -1);

        self.setup_default_colors();
    }

    fn setup_default_colors(&mut self) {
        use ColorElement::*;

        self.colors[ResetColor as usize] = color_pair(COLOR_WHITE, COLOR_BLACK);
        self.colors[DefaultColor as usize] = color_pair(COLOR_WHITE, COLOR_BLACK);
        self.colors[FunctionBar as usize] = color_pair(COLOR_BLACK, COLOR_CYAN);
        self.colors[FunctionKey as usize] = color_pair(COLOR_WHITE, COLOR_BLACK);
        self.colors[Header as usize] = color_pair(COLOR_CYAN, COLOR_BLACK);
        self.colors[HeaderValue as usize] = color_pair(COLOR_CYAN, COLOR_BLACK) | A_BOLD;
        self.colors[Paused as usize] = color_pair(COLOR_YELLOW, COLOR_CYAN) | A_BOLD;
        self.colors[Selection as usize] = color_pair(COLOR_BLACK, COLOR_CYAN);
        self.colors[ProcessTree as usize] = color_pair(COLOR_CYAN, COLOR_BLACK);
        self.colors[ProcessRunState as usize] = color_pair(COLOR_GREEN, COLOR_BLACK);
        self.colors[ProcessMarked as usize] = color_pair(COLOR_YELLOW, COLOR_BLACK) | A_BOLD;
        self.colors[StatusMessage as usize] = color_pair(COLOR_GREEN, COLOR_BLACK);
        self.colors[StatusError as usize] = color_pair(COLOR_RED, COLOR_BLACK) | A_BOLD;
        self.colors[HelpBold as usize] = color_pair(COLOR_CYAN, COLOR_BLACK) | A_BOLD;
    }

    /// Terminal attributes only
    fn setup_monochrome(&mut self) {
        use ColorElement::*;

        for color in &mut self.colors {
            *color = A_NORMAL;
        }
        self.colors[FunctionBar as usize] = A_REVERSE;
        self.colors[HeaderValue as usize] = A_BOLD;
        self.colors[Paused as usize] = A_BOLD | A_REVERSE;
        self.colors[Selection as usize] = A_REVERSE;
        self.colors[ProcessTree as usize] = A_DIM;
        self.colors[ProcessRunState as usize] = A_BOLD;
        self.colors[ProcessMarked as usize] = A_BOLD;
        self.colors[StatusError as usize] = A_BOLD;
        self.colors[HelpBold as usize] = A_BOLD;
    }

    /// Get color attribute for an element
    pub fn color(&self, element: ColorElement) -> attr_t {
        self.colors
            .get(element as usize)
            .copied()
            .unwrap_or(A_NORMAL)
    }

    /// Update screen dimensions
    pub fn update_size(&mut self) {
        getmaxyx(stdscr(), &mut self.screen_height, &mut self.screen_width);
    }

    pub fn width(&self) -> i32 {
        self.screen_width
    }

    pub fn height(&self) -> i32 {
        self.screen_height
    }

    /// Wait at most `timeout_ms` for the next key
    pub fn set_timeout(&self, timeout_ms: i32) {
        ncurses::timeout(timeout_ms.clamp(0, 25500));
    }

    /// Read a key from input
    pub fn read_key(&self) -> Option<i32> {
        let ch = getch();
        if ch == ERR {
            None
        } else {
            Some(ch)
        }
    }

    pub fn clear(&self) {
        clear();
    }

    pub fn refresh(&self) {
        refresh();
    }

    /// Print a string with attributes
    pub fn print_at(&self, y: i32, x: i32, attr: attr_t, text: &str) {
        attrset(attr);
        let _ = mvaddstr(y, x, text);
        attrset(A_NORMAL);
    }

    /// Print a string with a specific color element
    pub fn print_colored(&self, y: i32, x: i32, element: ColorElement, text: &str) {
        self.print_at(y, x, self.color(element), text);
    }

    /// Fill a whole row with blanks in the given color
    pub fn fill_row(&self, y: i32, element: ColorElement) {
        mv(y, 0);
        attrset(self.color(element));
        for _ in 0..self.screen_width {
            addch(' ' as u32);
        }
        attrset(A_NORMAL);
    }

    /// Clean up terminal
    pub fn done(&self) {
        curs_set(CURSOR_VISIBLE);
        endwin();
    }
}

impl Drop for Crt {
    fn drop(&mut self) {
        self.done();
    }
}
