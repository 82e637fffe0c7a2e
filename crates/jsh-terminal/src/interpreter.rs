//! Command trait, registry, and the pipeline executor.
//!
//! A line is parsed into a pipeline and each stage runs to completion before
//! the next one starts. Stages are connected through [`PipeBuffer`]s. A stage
//! name is tried against the built-ins first, then resolved to an executable
//! node in the virtual file system: either a native program from the
//! [`CommandRegistry`] or a `#!jsh` script.

use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use jsh_types::config::ShellConfig;
use jsh_types::error::{CRASH_EXIT_CODE, JshError, Result};
use jsh_vfs::{Content, Node, VPath};

use crate::environment::Environment;
use crate::history::History;
use crate::parser::{self, Pipeline, Stage};
use crate::pipe::PipeBuffer;

/// First bytes of an executable text file that runs as a script.
pub const SCRIPT_MARKER: &str = "#!jsh";

/// Built-in commands: name, usage, description.
pub const BUILTINS: &[(&str, &str, &str)] = &[
    (".", ". <file>", "Run each line of a file in the current shell"),
    ("cd", "cd [dir]", "Change the working directory"),
    ("echo", "echo [text...]", "Print arguments"),
    (
        "export",
        "export [NAME[=VALUE]...]",
        "Set or list global variables",
    ),
    ("help", "help [command]", "List commands or describe one"),
    ("history", "history [-c]", "Show or clear the command history"),
    ("unset", "unset NAME...", "Remove global variables"),
];

/// A native program.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "ls \[path...\]").
    fn usage(&self) -> &str;

    /// Command category for grouping in `help` output.
    fn category(&self) -> &str {
        "general"
    }

    /// Run against `env`. Arguments are in [`Environment::args`]. Returns the
    /// exit code.
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32>;
}

/// Native programs by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|cmd| cmd.as_ref())
    }

    /// All commands sorted by name.
    pub fn commands(&self) -> Vec<&dyn Command> {
        let mut cmds: Vec<&dyn Command> = self.commands.values().map(|c| c.as_ref()).collect();
        cmds.sort_by(|a, b| a.name().cmp(b.name()));
        cmds
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Pipeline executor.
///
/// Holds the native registry plus the bookkeeping that outlives a single
/// line: the history log and the nesting depth of scripts and sourced files.
pub struct Interpreter {
    registry: CommandRegistry,
    history: RefCell<History>,
    depth: Cell<usize>,
    max_depth: usize,
    max_expansions: usize,
}

impl Interpreter {
    pub fn new(registry: CommandRegistry, config: &ShellConfig) -> Self {
        Self {
            registry,
            history: RefCell::new(History::new()),
            depth: Cell::new(0),
            max_depth: config.max_depth,
            max_expansions: config.max_expansions,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn history(&self) -> Ref<'_, History> {
        self.history.borrow()
    }

    pub fn history_mut(&self) -> RefMut<'_, History> {
        self.history.borrow_mut()
    }

    /// Parse and run one line. Returns the exit code of the last stage, or 0
    /// for a line with no commands.
    pub fn run_line(&self, line: &str, env: &mut Environment<'_>) -> i32 {
        self.try_line(line, env).unwrap_or(0)
    }

    /// Run every line of `text` in `env`. Returns the exit code of the last
    /// line that ran a command.
    pub fn run_lines(&self, text: &str, env: &mut Environment<'_>) -> i32 {
        text.lines()
            .filter_map(|line| self.try_line(line, env))
            .last()
            .unwrap_or(0)
    }

    fn try_line(&self, line: &str, env: &mut Environment<'_>) -> Option<i32> {
        let pipeline = parser::parse(line, &|name| env.lookup(name), self.max_expansions);
        if pipeline.is_empty() {
            return None;
        }
        Some(self.run_pipeline(pipeline, env))
    }

    /// Run each stage in order, feeding every stage's output to the next.
    pub fn run_pipeline(&self, pipeline: Pipeline, env: &mut Environment<'_>) -> i32 {
        let last = pipeline.len().saturating_sub(1);
        let mut input: Option<PipeBuffer> = None;
        let mut code = 0;

        for (i, stage) in pipeline.stages.into_iter().enumerate() {
            let mut previous = input.take();
            if i < last {
                let mut output = PipeBuffer::new();
                {
                    let mut stage_env = env.stage(stage.argv, Some(&mut output), previous.as_mut());
                    code = self.dispatch(&mut stage_env);
                }
                input = Some(output);
            } else {
                code = self.run_final(stage, env, previous.as_mut());
            }
        }

        code
    }

    /// Run the last stage, honouring its redirect.
    ///
    /// The target is truncated before the stage runs and receives the stage's
    /// text once it finishes. A target that cannot be opened is reported and
    /// the stage's output is dropped.
    fn run_final(
        &self,
        stage: Stage,
        env: &mut Environment<'_>,
        stdin: Option<&mut PipeBuffer>,
    ) -> i32 {
        let Some(target) = stage.redirect else {
            let mut stage_env = env.stage(stage.argv, None, stdin);
            return self.dispatch(&mut stage_env);
        };

        let path = env.resolve(&target);
        let opened = match env.vfs_mut().open(&path) {
            Ok(node) => {
                node.set_text("");
                true
            },
            Err(e) => {
                log::warn!("redirect to {path} failed: {e}");
                env.error(format!("{}: {e}", JshError::Redirect(target.clone())));
                false
            },
        };

        let mut capture = PipeBuffer::new();
        let code = {
            let mut stage_env = env.stage(stage.argv, Some(&mut capture), stdin);
            self.dispatch(&mut stage_env)
        };

        if opened {
            let text = capture.drain_text();
            match env.vfs_mut().open(&path) {
                Ok(node) => node.set_text(text),
                Err(e) => {
                    log::warn!("redirect target {path} vanished: {e}");
                    env.error(format!("{}: {e}", JshError::Redirect(target)));
                },
            }
        }
        code
    }

    // -- Dispatch --

    /// Run the command named by `env.argv()[0]` and report any failure on the
    /// environment's stderr.
    fn dispatch(&self, env: &mut Environment<'_>) -> i32 {
        let name = env.name().to_string();
        log::debug!("dispatch {name} {:?}", env.args());

        let result = match self.builtin(&name, env) {
            Some(result) => result,
            None => self.run_program(&name, env),
        };

        match result {
            Ok(code) => code,
            Err(e) => {
                let msg = match e {
                    JshError::CommandNotFound(_) | JshError::NotExecutable(_) => e.to_string(),
                    _ => format!("{name}: {e}"),
                };
                env.error(msg);
                e.exit_code()
            },
        }
    }

    fn builtin(&self, name: &str, env: &mut Environment<'_>) -> Option<Result<i32>> {
        let result = match name {
            "." => self.source(env),
            "cd" => cd(env),
            "echo" => echo(env),
            "export" => export(env),
            "help" => self.help(env),
            "history" => self.history_cmd(env),
            "unset" => unset(env),
            _ => return None,
        };
        Some(result)
    }

    fn run_program(&self, name: &str, env: &mut Environment<'_>) -> Result<i32> {
        let path = find_executable(name, env)?;
        let program = match env.vfs().locate(&path)?.content() {
            Content::Native(key) => Program::Native(key.clone()),
            Content::Text(text) if text.starts_with(SCRIPT_MARKER) => Program::Script(text.clone()),
            Content::Text(_) => return Err(JshError::NotExecutable(name.to_string())),
        };
        log::debug!("{name} resolved to {path}");

        match program {
            Program::Native(key) => self.run_native(&key, name, env),
            Program::Script(text) => self.run_script(&text, env),
        }
    }

    /// Invoke a native program. A panic inside it is contained here and
    /// reported as a crash.
    fn run_native(&self, key: &str, name: &str, env: &mut Environment<'_>) -> Result<i32> {
        let cmd = self
            .registry
            .get(key)
            .ok_or_else(|| JshError::CommandNotFound(name.to_string()))?;

        match catch_unwind(AssertUnwindSafe(|| cmd.execute(env))) {
            Ok(result) => result,
            Err(payload) => {
                log::warn!(
                    "native program {name} panicked: {}",
                    panic_message(payload.as_ref())
                );
                env.error(format!("{name}: crashed"));
                Ok(CRASH_EXIT_CODE)
            },
        }
    }

    /// Run a script in a scope whose locals are the positional parameters.
    /// The working directory is restored afterwards.
    fn run_script(&self, text: &str, env: &mut Environment<'_>) -> Result<i32> {
        let _guard = self.enter()?;
        let saved_cwd = env.cwd().clone();
        let argv = env.argv().to_vec();

        let code = {
            let mut scope = env.inherit(argv.clone());
            for (i, arg) in argv.iter().enumerate() {
                scope.set_var(i.to_string(), arg.as_str());
            }
            scope.set_var("argc", argv.len().saturating_sub(1).to_string());
            self.run_lines(text, &mut scope)
        };

        env.set_cwd(saved_cwd);
        Ok(code)
    }

    fn enter(&self) -> Result<DepthGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            return Err(JshError::DepthExceeded(self.max_depth));
        }
        self.depth.set(depth + 1);
        Ok(DepthGuard { depth: &self.depth })
    }

    // -- Built-ins that need the interpreter --

    /// `. <file>`: run a file's lines in the caller's scope.
    fn source(&self, env: &mut Environment<'_>) -> Result<i32> {
        let [file] = env.args() else {
            return Err(JshError::Argument("usage: . <file>".to_string()));
        };
        let file = file.clone();
        let node = env.vfs().locate(&env.resolve(&file))?;
        if node.is_dir() {
            return Err(JshError::IsADirectory(file));
        }
        if !node.is_file() {
            return Err(JshError::NotAFile(file));
        }
        let text = node.text().unwrap_or_default().to_string();

        let _guard = self.enter()?;
        let locals = env.outer_locals();
        let argv = env.argv().to_vec();
        let mut scope = env.inherit(argv);
        scope.set_locals(locals);
        Ok(self.run_lines(&text, &mut scope))
    }

    fn help(&self, env: &mut Environment<'_>) -> Result<i32> {
        if let Some(name) = env.args().first() {
            let builtin = BUILTINS.iter().find(|b| b.0 == name.as_str());
            let text = if let Some((name, usage, desc)) = builtin {
                format!("{name} (built-in)\n  {desc}\n  Usage: {usage}\n")
            } else if let Some(cmd) = self.registry.get(name) {
                format!(
                    "{} ({})\n  {}\n  Usage: {}\n",
                    cmd.name(),
                    cmd.category(),
                    cmd.description(),
                    cmd.usage()
                )
            } else {
                return Err(JshError::Argument(format!("no help for '{name}'")));
            };
            env.print(text);
            return Ok(0);
        }

        let mut out = String::from("Built-ins:\n");
        for (name, _, desc) in BUILTINS {
            out.push_str(&format!("  {name:10} {desc}\n"));
        }
        out.push_str("\nPrograms:\n");
        for cmd in self.registry.commands() {
            out.push_str(&format!("  {:10} {}\n", cmd.name(), cmd.description()));
        }
        out.push_str("\nType 'help <command>' for details.\n");
        env.print(out);
        Ok(0)
    }

    fn history_cmd(&self, env: &mut Environment<'_>) -> Result<i32> {
        match env.args() {
            [] => {
                let text: String = self
                    .history
                    .borrow()
                    .lines()
                    .iter()
                    .map(|line| format!("{line}\n"))
                    .collect();
                env.print(text);
            },
            [flag] if flag == "-c" => self.history.borrow_mut().clear(),
            _ => return Err(JshError::Argument("usage: history [-c]".to_string())),
        }
        Ok(0)
    }
}

enum Program {
    Native(String),
    Script(String),
}

/// The message carried by a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown cause"
    }
}

/// Decrements the nesting depth when dropped.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Resolve a command name to the path of an executable node.
///
/// A name containing `/` is taken as a path. Anything else is searched for in
/// each directory of `PATH`, first match wins.
fn find_executable(name: &str, env: &Environment<'_>) -> Result<VPath> {
    let vfs = env.vfs();
    if name.contains('/') {
        let path = env.resolve(name);
        return match vfs.locate(&path) {
            Ok(node) if node.is_executable() => Ok(path),
            Ok(_) => Err(JshError::NotExecutable(name.to_string())),
            Err(_) => Err(JshError::CommandNotFound(name.to_string())),
        };
    }

    env.ctx()
        .global("PATH")
        .unwrap_or_default()
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| env.resolve(dir).join(name))
        .find(|path| vfs.locate(path).is_ok_and(Node::is_executable))
        .ok_or_else(|| JshError::CommandNotFound(name.to_string()))
}

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

fn cd(env: &mut Environment<'_>) -> Result<i32> {
    let target = match env.args() {
        [] => "~".to_string(),
        [dir] => dir.clone(),
        _ => return Err(JshError::Argument("too many arguments".to_string())),
    };
    let path = env.resolve(&target);
    if !env.vfs().locate(&path)?.is_dir() {
        return Err(JshError::NotADirectory(target));
    }
    env.set_cwd(path);
    Ok(0)
}

fn echo(env: &mut Environment<'_>) -> Result<i32> {
    let line = env.args().join(" ");
    env.println(line);
    Ok(0)
}

/// `export NAME=VALUE` sets a global, bare `export NAME` promotes a local of
/// the invoking scope, and `export` alone lists the globals.
fn export(env: &mut Environment<'_>) -> Result<i32> {
    if env.args().is_empty() {
        let listing: String = env
            .ctx()
            .globals()
            .into_iter()
            .map(|(name, value)| format!("declare -x {name}=\"{value}\"\n"))
            .collect();
        env.print(listing);
        return Ok(0);
    }

    for arg in env.args().to_vec() {
        let (name, value) = match arg.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (arg.as_str(), None),
        };
        if !parser::is_var_name(name) {
            return Err(JshError::Argument(format!(
                "'{arg}': not a valid identifier"
            )));
        }
        let value = value.or_else(|| env.scope_var(name).map(str::to_string));
        if let Some(value) = value {
            env.set_global_var(name, value);
        }
    }
    Ok(0)
}

fn unset(env: &mut Environment<'_>) -> Result<i32> {
    if env.args().is_empty() {
        return Err(JshError::Argument("usage: unset NAME...".to_string()));
    }
    for name in env.args().to_vec() {
        env.ctx_mut().unset_global(&name);
    }
    Ok(0)
}
