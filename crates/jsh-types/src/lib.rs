//! Foundation types for jsh.
//!
//! This crate contains the types shared by every jsh crate: the error
//! taxonomy, the shell configuration, and the narrow I/O traits through which
//! the interpreter talks to its host (output sink, input source, width query).

pub mod config;
pub mod error;
pub mod io;
