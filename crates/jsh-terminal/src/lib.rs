//! Command interpreter and shell session.
//!
//! A line is tokenized and expanded by the parser, split into pipeline stages,
//! and run stage by stage. Stage names resolve to built-ins, to native programs
//! registered through the `Command` trait, or to `#!jsh` scripts stored in the
//! virtual filesystem.

mod commands;
mod environment;
pub mod file_commands;
mod history;
mod interpreter;
pub mod parser;
mod pipe;
mod setup;
mod shell;
pub mod text_commands;

/// Register all native utilities into a registry.
pub use commands::register_utilities;
/// Per-invocation execution context and the session state it borrows.
pub use environment::{Environment, ShellContext};
/// Register the filesystem utilities (ls, cat, mkdir, touch, rm, ln).
pub use file_commands::register_file_commands;
/// Submitted-line log with recall.
pub use history::History;
/// A native program.
pub use interpreter::Command;
/// Registry of native programs.
pub use interpreter::CommandRegistry;
/// Pipeline executor.
pub use interpreter::{BUILTINS, Interpreter, SCRIPT_MARKER};
/// Parsed line.
pub use parser::{Pipeline, Stage};
/// In-memory buffer joining two pipeline stages.
pub use pipe::PipeBuffer;
/// Initial filesystem layout.
pub use setup::{BIN_DIR, populate_default_vfs};
/// A shell session.
pub use shell::{SHELL_NAME, Shell};
/// Register the text layout filters (wrap, center).
pub use text_commands::register_text_commands;
