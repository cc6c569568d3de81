//! oxmodal entrypoint: drive the modal input engine from the command line.
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use core_actions::{InputController, Session};
use core_config::load_from;
use core_events::{InputUnit, KeyToken, parse};
use core_input::{INPUT_CHANNEL_CAP, TerminalInput, spawn_async_input};
use core_state::Mode;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

mod host;
use host::JsonHost;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "oxmodal", version, about = "Vim-style modal key resolution")]
struct Args {
    /// Key notation to feed, e.g. `2dw` or `"ayy<C-w>v`.
    pub keys: Option<String>,
    /// Configuration file path (overrides discovery of `oxmodal.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Starting mode (`normal`, `insert`, `visual`, ...).
    #[arg(long = "mode", default_value = "normal", value_parser = parse_mode)]
    pub mode: Mode,
    /// File type used to select scoped remaps.
    #[arg(long = "filetype")]
    pub filetype: Option<String>,
    /// Feed `keys` as one batch instead of key by key.
    #[arg(long = "batch")]
    pub batch: bool,
    /// Read live keys from the terminal. `<C-c>` twice exits.
    #[arg(long = "interactive")]
    pub interactive: bool,
    /// Directory for `oxmodal.log`; logging is off without it.
    #[arg(long = "log-dir")]
    pub log_dir: Option<PathBuf>,
}

fn parse_mode(name: &str) -> Result<Mode> {
    Mode::from_name(name).ok_or_else(|| anyhow!("unknown mode '{name}'"))
}

fn configure_logging(log_dir: &Path) -> Result<Option<WorkerGuard>> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(log_dir, "oxmodal.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // Global subscriber already installed; dropping the guard stops the writer.
        Err(_) => Ok(None),
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// Raw mode plus bracketed paste for the lifetime of the guard.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnableBracketedPaste)?;
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableBracketedPaste);
        let _ = disable_raw_mode();
    }
}

/// Feed a notation string either key by key or as one batch.
fn run_keys<W: Write>(
    controller: &mut InputController,
    session: &mut Session,
    host: &mut JsonHost<W>,
    keys: &str,
    batch: bool,
) -> Result<()> {
    if batch {
        let feedback = controller.feed_notation(session, host, keys)?;
        host.feedback(&feedback);
        return Ok(());
    }
    for key in parse(keys)? {
        let feedback = controller.feed(session, host, InputUnit::Key(key))?;
        host.feedback(&feedback);
    }
    Ok(())
}

async fn run_interactive(
    controller: &mut InputController,
    session: &mut Session,
    file_type: Option<String>,
) -> Result<()> {
    let _raw = RawModeGuard::enter()?;
    let mut host = JsonHost::new(stdout(), file_type).raw_mode();
    let (tx, mut rx) = mpsc::channel(INPUT_CHANNEL_CAP);
    let (input_task, input_shutdown) = spawn_async_input(tx);
    let interrupt = KeyToken::ctrl('c');
    let mut last_was_interrupt = false;

    while let Some(input) = rx.recv().await {
        let is_interrupt = input == TerminalInput::Key(interrupt.clone());
        if is_interrupt && last_was_interrupt {
            info!(target: "runtime", "interrupt_exit");
            break;
        }
        last_was_interrupt = is_interrupt;
        let units = input.units();
        let result = if units.len() == 1 {
            units
                .into_iter()
                .next()
                .map(|unit| controller.feed(session, &mut host, unit))
                .transpose()
        } else {
            controller.feed_batch(session, &mut host, units).map(Some)
        };
        match result {
            Ok(Some(feedback)) => host.feedback(&feedback),
            Ok(None) => {}
            Err(e) => error!(target: "runtime", error = %e, "feed_failed"),
        }
    }

    input_shutdown.signal();
    let _ = input_task.await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = match &args.log_dir {
        Some(dir) => configure_logging(dir)?,
        None => None,
    };
    install_panic_hook();

    let config = load_from(args.config.clone())?;
    let mut session = Session::from_config(&config);
    let mut controller = InputController::new(args.mode);
    info!(
        target: "runtime.startup",
        mode = %args.mode,
        filetype = args.filetype.as_deref(),
        config_override = args.config.is_some(),
        interactive = args.interactive,
        "bootstrap_complete"
    );

    if let Some(keys) = &args.keys {
        let mut host = JsonHost::new(stdout(), args.filetype.clone());
        run_keys(&mut controller, &mut session, &mut host, keys, args.batch)?;
    }
    if args.interactive {
        run_interactive(&mut controller, &mut session, args.filetype.clone()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_mode_and_flags() {
        let args = Args::try_parse_from(["oxmodal", "--mode", "insert", "--batch", "abc"]).unwrap();
        assert_eq!(args.mode, Mode::Insert);
        assert!(args.batch);
        assert_eq!(args.keys.as_deref(), Some("abc"));
        assert!(Args::try_parse_from(["oxmodal", "--mode", "bogus"]).is_err());
    }

    #[test]
    fn typed_keys_report_feedback_per_key() {
        let mut session = Session::default();
        let mut controller = InputController::new(Mode::Normal);
        let mut host = JsonHost::new(Vec::new(), None);
        run_keys(&mut controller, &mut session, &mut host, "2dw", false).unwrap();
        assert_eq!(controller.mode(), Mode::Normal);
        assert_eq!(session.repeat().last().map(|r| r.origin.as_str()), Some("delete"));
    }

    #[test]
    fn bad_notation_is_an_error() {
        let mut session = Session::default();
        let mut controller = InputController::new(Mode::Normal);
        let mut host = JsonHost::new(Vec::new(), None);
        assert!(run_keys(&mut controller, &mut session, &mut host, "<C-x", true).is_err());
        assert!(run_keys(&mut controller, &mut session, &mut host, "<C-x", false).is_err());
    }
}
