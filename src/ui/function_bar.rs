//! FunctionBar - key legend at the bottom of the screen
//!
//! Keys use the FunctionKey color, labels the FunctionBar color, with no
//! padding between pairs.

use super::crt::ColorElement;
use super::Crt;
use ncurses::*;

/// Legend for the tree view
pub const TREE_FUNCTIONS: [(&str, &str); 8] = [
    ("t", "TERM "),
    ("h", "HUP  "),
    ("k", "KILL "),
    ("Q", "QUIT "),
    ("u", "Unmark"),
    ("x", "Exec "),
    ("g", "Refresh"),
    ("q", "Quit "),
];

/// Legend for the details screen
pub const DETAIL_FUNCTIONS: [(&str, &str); 2] = [("Esc", "Back  "), ("q", "Back  ")];

/// Function bar at the bottom of the screen
#[derive(Debug, Clone)]
pub struct FunctionBar {
    pub functions: Vec<(String, String)>,
}

impl FunctionBar {
    pub fn new() -> Self {
        Self::with_labels(&TREE_FUNCTIONS)
    }

    pub fn with_labels(labels: &[(&str, &str)]) -> Self {
        FunctionBar {
            functions: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Columns used by the legend
    pub fn width(&self) -> i32 {
        self.functions
            .iter()
            .map(|(k, l)| (k.chars().count() + l.chars().count()) as i32)
            .sum()
    }

    /// Draw the bar and return the ending x position, so callers can
    /// append a status after it
    pub fn draw(&self, crt: &Crt, y: i32) -> i32 {
        let width = crt.width();
        let bar_color = crt.color(ColorElement::FunctionBar);
        let key_color = crt.color(ColorElement::FunctionKey);

        crt.fill_row(y, ColorElement::FunctionBar);

        let mut x = 0i32;
        for (key, label) in &self.functions {
            if x >= width {
                break;
            }

            mv(y, x);
            attrset(key_color);
            let _ = addstr(key);
            x += key.len() as i32;

            attrset(bar_color);
            let _ = addstr(label);
            x += label.len() as i32;
        }
        attrset(A_NORMAL);
        x
    }
}

impl Default for FunctionBar {
    fn default() -> Self {
        FunctionBar::new()
    }
}
