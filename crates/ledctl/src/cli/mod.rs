//! CLI modes — apply LED commands, query LED state.

mod query;
mod set;

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

pub(super) use ledctl_lib::backend::{BackendError, ConsoleBackend, LedBackend};
pub(super) use ledctl_lib::command::Led;
pub(super) use ledctl_lib::engine::{Serializer, SessionReport, run_session};
pub(super) use ledctl_lib::error::{LedctlError, Result};
pub(super) use ledctl_lib::source::CommandSource;
pub(super) use ledctl_lib::state::LedMask;

const PADDING: usize = 2;

/// Compute alignment width for key-value output: the longest key plus
/// PADDING spaces.
pub(super) fn kv_width(keys: &[&str]) -> usize {
    keys.iter().map(|k| k.len()).max().map_or(0, |w| w + PADDING)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{json}");
    Ok(())
}

/// Lit indicator names, or "none".
pub(super) fn lit_names(mask: LedMask) -> String {
    let lit: Vec<&str> = mask.lit().into_iter().map(Led::name).collect();
    if lit.is_empty() {
        "none".into()
    } else {
        lit.join(", ")
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct QueryOutput {
    pub backend: &'static str,
    pub device: String,
    pub mask: LedMask,
    pub scroll: bool,
    pub num: bool,
    pub caps: bool,
}

// ── Backend selection ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Linux virtual console (KDGETLED/KDSETLED)
    Console,
    /// X11 keyboard control (requires the `x11` feature)
    X11,
}

#[derive(clap::Args, Debug)]
pub struct BackendArgs {
    /// LED backend
    #[arg(short = 'b', long, value_enum, default_value_t = BackendKind::Console)]
    pub backend: BackendKind,

    /// Console device for the console backend
    #[arg(
        short = 't',
        long,
        env = "LEDCTL_TTY",
        default_value = ledctl_lib::backend::DEFAULT_TTY
    )]
    pub tty: PathBuf,

    /// X display for the x11 backend (default: $DISPLAY)
    #[arg(short = 'd', long)]
    pub display: Option<String>,
}

impl BackendArgs {
    /// Human-readable target of the selected backend.
    pub(super) fn target(&self) -> String {
        match self.backend {
            BackendKind::Console => self.tty.display().to_string(),
            BackendKind::X11 => self
                .display
                .clone()
                .or_else(|| std::env::var("DISPLAY").ok())
                .unwrap_or_default(),
        }
    }
}

/// Open the selected backend. Failure here is fatal for the process.
pub(super) fn open_backend(args: &BackendArgs) -> Result<Box<dyn LedBackend>> {
    match args.backend {
        BackendKind::Console => Ok(Box::new(ConsoleBackend::open(&args.tty)?)),
        #[cfg(feature = "x11")]
        BackendKind::X11 => Ok(Box::new(ledctl_lib::backend::X11Backend::open(
            args.display.as_deref(),
        )?)),
        #[cfg(not(feature = "x11"))]
        BackendKind::X11 => Err(LedctlError::Setup(
            "ledctl was built without the `x11` feature".into(),
        )),
    }
}

/// What the invocation asked for.
pub enum Mode {
    Set(CommandSource),
    Query,
}

pub fn run(mode: Mode, backend: &BackendArgs, json: bool) -> Result<()> {
    match mode {
        Mode::Set(source) => set::cmd_set(backend, source, json),
        Mode::Query => query::cmd_query(backend, json),
    }
}


#[cfg(test)]
mod backend_tests {
    use super::*;

    fn args(backend: BackendKind) -> BackendArgs {
        BackendArgs {
            backend,
            tty: PathBuf::from("/nonexistent/ledctl-tty"),
            display: Some(":42".into()),
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn console_missing_tty_is_fatal() {
        let err = open_backend(&args(BackendKind::Console)).err().unwrap();
        assert!(err.to_string().contains("/nonexistent/ledctl-tty"));
    }

    #[test]
    fn target_names_selected_device() {
        assert_eq!(args(BackendKind::Console).target(), "/nonexistent/ledctl-tty");
        assert_eq!(args(BackendKind::X11).target(), ":42");
    }

    #[cfg(not(feature = "x11"))]
    #[test]
    fn x11_without_feature_is_unsupported() {
        let err = open_backend(&args(BackendKind::X11)).err().unwrap();
        assert!(matches!(err, LedctlError::Setup(_)));
        assert!(err.to_string().contains("x11"));
    }
}
