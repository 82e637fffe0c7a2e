//! Execution context handed to every command.
//!
//! [`ShellContext`] is the session-wide state: the filesystem, the working
//! directory and the global variables. An [`Environment`] borrows it for one
//! invocation and adds what is private to that invocation: arguments, local
//! variables and the I/O wiring.

use std::collections::HashMap;

use jsh_types::io::{InputSource, Output, OutputSink};
use jsh_vfs::{MemoryVfs, ROOT, VPath};

use crate::pipe::PipeBuffer;

/// State shared by every environment of a session.
#[derive(Debug, Default)]
pub struct ShellContext {
    pub vfs: MemoryVfs,
    pub cwd: VPath,
    globals: HashMap<String, String>,
}

impl ShellContext {
    pub fn new(vfs: MemoryVfs, cwd: VPath) -> Self {
        Self {
            vfs,
            cwd,
            globals: HashMap::new(),
        }
    }

    pub fn global(&self, name: &str) -> Option<&str> {
        self.globals.get(name).map(String::as_str)
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.globals.insert(name.into(), value.into());
    }

    pub fn unset_global(&mut self, name: &str) -> Option<String> {
        self.globals.remove(name)
    }

    /// All globals sorted by name.
    pub fn globals(&self) -> Vec<(&str, &str)> {
        let mut vars: Vec<(&str, &str)> = self
            .globals
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        vars.sort_unstable();
        vars
    }

    /// The `HOME` variable, or `/` when unset.
    pub fn home(&self) -> &str {
        self.global("HOME").unwrap_or(ROOT)
    }

    /// Resolve `path` against the working directory and `HOME`.
    pub fn resolve(&self, path: &str) -> VPath {
        VPath::new(path).absolute(&self.cwd, self.home())
    }
}

/// Per-invocation execution context.
pub struct Environment<'a> {
    ctx: &'a mut ShellContext,
    argv: Vec<String>,
    locals: HashMap<String, String>,
    outer: Option<&'a HashMap<String, String>>,
    stdout: &'a mut dyn OutputSink,
    stderr: &'a mut dyn OutputSink,
    stdin: Option<&'a mut dyn InputSource>,
    width: usize,
}

impl<'a> Environment<'a> {
    /// Top-level environment for one line of input. There is no stdin.
    pub fn new(
        ctx: &'a mut ShellContext,
        stdout: &'a mut dyn OutputSink,
        stderr: &'a mut dyn OutputSink,
        width: usize,
    ) -> Self {
        Self {
            ctx,
            argv: Vec::new(),
            locals: HashMap::new(),
            outer: None,
            stdout,
            stderr,
            stdin: None,
            width,
        }
    }

    /// A child environment sharing the context and I/O, with fresh locals.
    pub fn inherit(&mut self, argv: Vec<String>) -> Environment<'_> {
        let mut env = self.stage(argv, None, None);
        env.outer = None;
        env
    }

    /// A child environment for one pipeline stage.
    ///
    /// `stdout` and `stdin` override the inherited streams when given. The
    /// child can see this environment's locals through [`Self::scope_var`] but
    /// never through [`Self::lookup`].
    pub(crate) fn stage<'b>(
        &'b mut self,
        argv: Vec<String>,
        stdout: Option<&'b mut PipeBuffer>,
        stdin: Option<&'b mut PipeBuffer>,
    ) -> Environment<'b> {
        let stdout: &mut dyn OutputSink = match stdout {
            Some(pipe) => pipe,
            None => &mut *self.stdout,
        };
        let stdin: Option<&mut dyn InputSource> = match stdin {
            Some(pipe) => Some(pipe),
            None => match &mut self.stdin {
                Some(source) => Some(&mut **source),
                None => None,
            },
        };
        Environment {
            ctx: &mut *self.ctx,
            argv,
            locals: HashMap::new(),
            outer: Some(&self.locals),
            stdout,
            stderr: &mut *self.stderr,
            stdin,
            width: self.width,
        }
    }

    // -- Context --

    pub fn ctx(&self) -> &ShellContext {
        &*self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut ShellContext {
        &mut *self.ctx
    }

    pub fn vfs(&self) -> &MemoryVfs {
        &self.ctx.vfs
    }

    pub fn vfs_mut(&mut self) -> &mut MemoryVfs {
        &mut self.ctx.vfs
    }

    pub fn cwd(&self) -> &VPath {
        &self.ctx.cwd
    }

    pub fn set_cwd(&mut self, cwd: VPath) {
        self.ctx.cwd = cwd;
    }

    pub fn resolve(&self, path: &str) -> VPath {
        self.ctx.resolve(path)
    }

    /// Display width in columns.
    pub fn width(&self) -> usize {
        self.width
    }

    // -- Arguments --

    /// The full argument vector; `argv()[0]` is the invoked name.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The invoked name, or an empty string for a top-level environment.
    pub fn name(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// Arguments after the invoked name.
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    // -- Variables --

    pub fn get_var(&self, name: &str) -> Option<&str> {
        self.locals.get(name).map(String::as_str)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.locals.insert(name.into(), value.into());
    }

    /// Locals first, then globals.
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.get_var(name)
            .or_else(|| self.ctx.global(name))
            .map(str::to_string)
    }

    pub fn set_global_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.ctx.set_global(name, value);
    }

    /// A local of this environment or of the scope that invoked it.
    pub fn scope_var(&self, name: &str) -> Option<&str> {
        self.get_var(name)
            .or_else(|| self.outer.and_then(|vars| vars.get(name).map(String::as_str)))
    }

    /// Locals of the invoking scope.
    pub(crate) fn outer_locals(&self) -> HashMap<String, String> {
        self.outer.cloned().unwrap_or_default()
    }

    pub(crate) fn set_locals(&mut self, locals: HashMap<String, String>) {
        self.locals = locals;
    }

    // -- Output --

    pub fn print(&mut self, text: impl Into<String>) {
        self.stdout.write(Output::Text(text.into()));
    }

    pub fn println(&mut self, text: impl AsRef<str>) {
        self.print(format!("{}\n", text.as_ref()));
    }

    pub fn eprint(&mut self, text: impl Into<String>) {
        self.stderr.write(Output::Text(text.into()));
    }

    pub fn eprintln(&mut self, text: impl AsRef<str>) {
        self.eprint(format!("{}\n", text.as_ref()));
    }

    /// Report an error on stderr.
    pub fn error(&mut self, msg: impl Into<String>) {
        self.stderr.write(Output::Error(msg.into()));
    }

    /// Ask the host to clear the display.
    pub fn clear(&mut self) {
        self.stdout.write(Output::Clear);
    }

    // -- Input --

    /// Next raw item from stdin. No stdin means end of input.
    pub fn read_raw(&mut self) -> Option<Output> {
        self.stdin.as_mut().and_then(|source| source.read())
    }

    /// Next text chunk from stdin, skipping control items.
    pub fn read(&mut self) -> Option<String> {
        loop {
            match self.read_raw()? {
                Output::Text(text) => return Some(text),
                item @ Output::Error(_) => return Some(item.to_string()),
                Output::Clear => {},
            }
        }
    }

    /// Everything left on stdin.
    pub fn read_all(&mut self) -> String {
        let mut text = String::new();
        while let Some(chunk) = self.read() {
            text.push_str(&chunk);
        }
        text
    }
}
