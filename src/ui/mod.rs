//! UI module
//!
//! This module contains the tree view and everything around it:
//! - Tree: renders a snapshot into display lines
//! - Marks, Executor: pending signals and their delivery
//! - Refresh: the periodic rebuild scheduler
//! - View: rendered lines plus their marks and scheduler
//! - CRT, FunctionBar, ScreenManager: the ncurses surface and main loop

mod crt;
mod executor;
mod function_bar;
mod keys;
mod marks;
mod refresh;
mod screen_manager;
mod tree;
mod view;

pub use crt::*;
pub use screen_manager::*;
pub use tree::{render, render_text};
