//! jsh line-mode entry point.
//!
//! Reads lines from the real stdin and feeds them to a session. Output items
//! are rendered to the real stdout and stderr. The configuration file comes
//! from the first argument or `JSH_CONFIG`; without one the defaults apply.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use jsh_terminal::Shell;
use jsh_types::config::ShellConfig;
use jsh_types::io::{Output, OutputSink, WidthQuery};

/// Clears the screen and homes the cursor.
const ANSI_CLEAR: &str = "\x1b[2J\x1b[H";

/// Renders output items to a host stream.
struct StreamSink<W: Write> {
    stream: W,
}

impl<W: Write> OutputSink for StreamSink<W> {
    fn write(&mut self, item: Output) {
        let result = match item {
            Output::Clear => self.stream.write_all(ANSI_CLEAR.as_bytes()),
            item => write!(self.stream, "{item}"),
        };
        if let Err(e) = result.and_then(|()| self.stream.flush()) {
            log::warn!("host write failed: {e}");
        }
    }
}

/// Display width from `COLUMNS`, re-read on every query.
struct ColumnsWidth {
    fallback: usize,
}

impl WidthQuery for ColumnsWidth {
    fn width(&self) -> usize {
        std::env::var("COLUMNS")
            .ok()
            .and_then(|cols| cols.trim().parse().ok())
            .filter(|&cols: &usize| cols > 0)
            .unwrap_or(self.fallback)
    }
}

/// Route panic reports to the log instead of printing them on the terminal.
/// Panics in native programs are contained by the interpreter and shown to
/// the user as a crash; the details belong in the log.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        log::warn!("{info}");
    }));
}

fn load_config() -> Result<ShellConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("JSH_CONFIG").ok())
        .map(PathBuf::from);
    match path {
        Some(path) => {
            log::info!("loading config from {}", path.display());
            ShellConfig::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))
        },
        None => Ok(ShellConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    install_panic_hook();

    let config = load_config()?;
    let fallback = config.default_width;
    let mut shell = Shell::new(
        config,
        Box::new(StreamSink {
            stream: io::stdout(),
        }),
        Box::new(StreamSink {
            stream: io::stderr(),
        }),
    )
    .context("failed to build session")?
    .with_width(Box::new(ColumnsWidth { fallback }));

    shell.startup();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", shell.prompt());
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("failed to read stdin")?;
        let code = shell.execute(&line);
        log::debug!("exit {code}");
    }

    Ok(())
}
