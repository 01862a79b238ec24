//! proctree - An interactive process tree viewer
//!
//! Copyright (C) 2026 Trung Le
//! Released under the GNU GPLv2+

mod core;
mod logger;
mod platform;
mod ui;

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{info, warn};
use nix::sys::signal::{self, SigHandler, Signal};

use crate::core::{ColorScheme, Settings, SnapshotBuilder};
use crate::platform::{KillSender, ProcFs};
use crate::ui::{render, render_text, Crt, ScreenManager};

static RUNNING: AtomicBool = AtomicBool::new(true);

const VERSION: &str = env!("CARGO_PKG_VERSION");
const COPYRIGHT: &str = "(C) 2026 Trung Le.";

fn print_version() {
    println!("proctree {}", VERSION);
}

fn print_help() {
    print_version();
    println!("{}", COPYRIGHT);
    println!("Released under the GNU GPLv2+.");
    println!();
    println!("-C --no-color                   Use a monochrome color scheme");
    println!("-d --delay=DELAY                Set the delay between updates, in tenths of seconds");
    println!("   --no-auto-refresh            Only refresh on request (g or F5)");
    println!("   --proc-root=DIR              Read processes from DIR instead of /proc");
    println!("   --once                       Print the process tree and exit");
    println!("   --log-file=FILE              Append log messages to FILE");
    println!("-h --help                       Print this help screen");
    println!("-U --no-unicode                 Do not use unicode but plain ASCII");
    println!("-V --version                    Print version info");
    println!();
    println!("Keys: t/h/k/Q mark TERM/HUP/KILL/QUIT, u unmark, U unmark all,");
    println!("      x send marked signals, g refresh, d details, q quit.");
    println!("      A number typed before a mark key repeats it over that many lines.");
}

#[derive(Parser, Debug)]
#[command(name = "proctree")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
struct Args {
    #[arg(short = 'C', long = "no-color")]
    no_color: bool,

    #[arg(short = 'd', long = "delay", value_name = "DELAY")]
    delay: Option<u32>,

    #[arg(long = "no-auto-refresh")]
    no_auto_refresh: bool,

    #[arg(long = "proc-root", value_name = "DIR")]
    proc_root: Option<PathBuf>,

    #[arg(long = "once")]
    once: bool,

    #[arg(long = "log-file", value_name = "FILE", env = logger::LOG_FILE_ENV)]
    log_file: Option<PathBuf>,

    #[arg(short = 'U', long = "no-unicode")]
    no_unicode: bool,

    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue)]
    help: bool,

    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,
}

extern "C" fn handle_signal(_: libc::c_int) {
    RUNNING.store(false, Ordering::SeqCst);
}

fn setup_signal_handlers() -> Result<()> {
    let handler = SigHandler::Handler(handle_signal);
    // SAFETY: the handler only stores to an atomic
    unsafe {
        signal::signal(Signal::SIGINT, handler)?;
        signal::signal(Signal::SIGTERM, handler)?;
    }
    Ok(())
}

/// Apply command line overrides on top of the config file
fn apply_args(settings: &mut Settings, args: &Args) {
    if args.no_color {
        settings.color_scheme = ColorScheme::Monochrome;
    }
    if let Some(delay) = args.delay {
        settings.delay = delay.clamp(1, 100);
    }
    if args.no_auto_refresh {
        settings.auto_refresh = false;
    }
    if let Some(root) = &args.proc_root {
        settings.proc_root = root.clone();
    }
    if args.no_unicode {
        settings.allow_unicode = false;
    }
}

/// Print the tree once to stdout
fn print_once(procfs: &ProcFs, settings: &Settings) -> Result<()> {
    Crt::init_locale();
    let tree_str = Crt::tree_strings(settings.allow_unicode && Crt::check_utf8_support());

    let snapshot = SnapshotBuilder::new(procfs)
        .build()
        .context("Failed to list processes")?;
    let text = render_text(&render(&snapshot), tree_str);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.help {
        print_help();
        return Ok(());
    }
    if args.version {
        print_version();
        return Ok(());
    }

    logger::init(args.log_file.as_deref(), args.once)?;

    let mut settings = Settings::new();
    if let Err(e) = settings.load() {
        warn!("{}", e);
        eprintln!("Warning: Failed to load settings: {}", e);
    }
    apply_args(&mut settings, &args);
    info!(
        "proctree {} starting: root {}, delay {}",
        VERSION,
        settings.proc_root.display(),
        settings.delay
    );

    let procfs = ProcFs::new(settings.proc_root.clone());

    if args.once {
        return print_once(&procfs, &settings);
    }

    setup_signal_handlers()?;

    let mut crt = Crt::new(&settings)?;
    let mut screen_manager = ScreenManager::new(&procfs, Box::new(KillSender), &crt, &settings);
    let result = screen_manager.run(&mut crt, &RUNNING);

    crt.done();
    result
}
