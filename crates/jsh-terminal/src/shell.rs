//! A shell session.
//!
//! [`Shell`] owns everything one user session needs: the context (filesystem,
//! working directory, globals), the interpreter, and the host's output sinks.
//! Hosts feed it one line at a time through [`Shell::execute`].

use jsh_types::config::ShellConfig;
use jsh_types::error::Result;
use jsh_types::io::{OutputSink, WidthQuery};
use jsh_vfs::VPath;

use crate::commands::register_utilities;
use crate::environment::{Environment, ShellContext};
use crate::interpreter::{CommandRegistry, Interpreter};
use crate::setup::populate_default_vfs;

/// Value of the `SHELL` variable.
pub const SHELL_NAME: &str = "jsh";

pub struct Shell {
    ctx: ShellContext,
    interp: Interpreter,
    config: ShellConfig,
    stdout: Box<dyn OutputSink>,
    stderr: Box<dyn OutputSink>,
    width: Option<Box<dyn WidthQuery>>,
}

impl Shell {
    /// Build a session with the default filesystem and the globals derived
    /// from `config`. The working directory starts at the home directory.
    pub fn new(
        config: ShellConfig,
        stdout: Box<dyn OutputSink>,
        stderr: Box<dyn OutputSink>,
    ) -> Result<Self> {
        let mut registry = CommandRegistry::new();
        register_utilities(&mut registry);
        let vfs = populate_default_vfs(&config, &registry)?;

        let home = VPath::new(config.home.as_str());
        let mut ctx = ShellContext::new(vfs, home);
        ctx.set_global("HOME", config.home.as_str());
        ctx.set_global("PATH", config.path.as_str());
        ctx.set_global("USER", config.user.as_str());
        ctx.set_global("HOST", config.host.as_str());
        ctx.set_global("SHELL", SHELL_NAME);
        ctx.set_global("PS1", config.prompt.as_str());
        for (name, value) in &config.env {
            ctx.set_global(name.as_str(), value.as_str());
        }

        log::info!(
            "session for {}@{} ready, {} native programs",
            config.user,
            config.host,
            registry.len()
        );

        Ok(Self {
            interp: Interpreter::new(registry, &config),
            ctx,
            config,
            stdout,
            stderr,
            width: None,
        })
    }

    /// Report the display width through `query` instead of the configured
    /// default.
    pub fn with_width(mut self, query: Box<dyn WidthQuery>) -> Self {
        self.width = Some(query);
        self
    }

    /// Source the startup file if it exists and is executable. Returns its
    /// exit code, or `None` when there was nothing to run.
    ///
    /// The startup file is not recorded in the history.
    pub fn startup(&mut self) -> Option<i32> {
        let path = VPath::new(self.config.home.as_str()).join(&self.config.rc_file);
        let text = match self.ctx.vfs.locate(&path) {
            Ok(node) if node.is_file() && node.is_executable() => {
                node.text().unwrap_or_default().to_string()
            },
            Ok(_) => {
                log::info!("{path} is not an executable file, skipping");
                return None;
            },
            Err(_) => return None,
        };

        log::info!("sourcing {path}");
        let width = self.width();
        let mut env = Environment::new(&mut self.ctx, &mut *self.stdout, &mut *self.stderr, width);
        Some(self.interp.run_lines(&text, &mut env))
    }

    /// Record `line` in the history, run it, and return its exit code.
    ///
    /// The history file is rewritten before and after the line runs.
    pub fn execute(&mut self, line: &str) -> i32 {
        let recorded = self.interp.history_mut().record(line);
        if recorded {
            self.mirror_history();
        }

        let width = self.width();
        let code = {
            let mut env =
                Environment::new(&mut self.ctx, &mut *self.stdout, &mut *self.stderr, width);
            self.interp.run_line(line, &mut env)
        };

        if recorded {
            self.mirror_history();
        }
        code
    }

    fn mirror_history(&mut self) {
        let path = VPath::new(self.config.home.as_str()).join(&self.config.history_file);
        let text = self.interp.history().mirror_text();
        if let Err(e) = self.ctx.vfs.write_file(&path, &text, false) {
            log::warn!("cannot write history to {path}: {e}");
        }
    }

    /// Render `PS1`.
    ///
    /// Escapes: `\u` user, `\h` host, `\s` shell, `\v` version, `\w` working
    /// directory with the home prefix shown as `~`, `\W` full working
    /// directory, `\n` newline, `\\` backslash. Anything else is kept as is.
    pub fn prompt(&self) -> String {
        let ps1 = self.ctx.global("PS1").unwrap_or_default();
        let mut out = String::new();
        let mut chars = ps1.chars();

        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('u') => out.push_str(self.ctx.global("USER").unwrap_or_default()),
                Some('h') => out.push_str(self.ctx.global("HOST").unwrap_or_default()),
                Some('s') => out.push_str(self.ctx.global("SHELL").unwrap_or_default()),
                Some('v') => out.push_str(env!("CARGO_PKG_VERSION")),
                Some('w') => {
                    let home = VPath::new(self.ctx.home());
                    out.push_str(self.ctx.cwd.skip_start(&home).as_str());
                },
                Some('W') => out.push_str(self.ctx.cwd.as_str()),
                Some('n') => out.push('\n'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                },
                None => out.push('\\'),
            }
        }
        out
    }

    /// Step back through the history. `draft` is the unsubmitted input.
    pub fn history_previous(&mut self, draft: &str) -> Option<String> {
        self.interp
            .history_mut()
            .recall_previous(draft)
            .map(str::to_string)
    }

    pub fn history_next(&mut self) -> Option<String> {
        self.interp.history_mut().recall_next().map(str::to_string)
    }

    pub fn width(&self) -> usize {
        self.width
            .as_ref()
            .map_or(self.config.default_width, |query| query.width())
    }

    pub fn context(&self) -> &ShellContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ShellContext {
        &mut self.ctx
    }

    pub fn cwd(&self) -> &VPath {
        &self.ctx.cwd
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }
}
