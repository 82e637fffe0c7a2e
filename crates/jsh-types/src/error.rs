//! Error types for jsh.

use std::io;

/// Exit code reported when a native program panics.
pub const CRASH_EXIT_CODE: i32 = 2;

/// Exit code reported for every recoverable command failure.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Errors produced by the jsh framework.
#[derive(Debug, thiserror::Error)]
pub enum JshError {
    /// Wrong argument count or shape for a command.
    #[error("{0}")]
    Argument(String),

    #[error("'{0}': no such file or directory")]
    NotFound(String),

    #[error("'{0}' is not a directory")]
    NotADirectory(String),

    #[error("'{0}' is a directory")]
    IsADirectory(String),

    #[error("'{0}' is not a regular file")]
    NotAFile(String),

    #[error("'{0}' already exists")]
    AlreadyExists(String),

    #[error("'{0}': directory not empty")]
    NotEmpty(String),

    #[error("'{0}': invalid name")]
    InvalidName(String),

    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("{0}: cannot execute")]
    NotExecutable(String),

    #[error("cannot redirect output to '{0}'")]
    Redirect(String),

    #[error("maximum nesting depth ({0}) exceeded")]
    DepthExceeded(usize),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl JshError {
    /// Exit code a command reports when it fails with this error.
    pub fn exit_code(&self) -> i32 {
        FAILURE_EXIT_CODE
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, JshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_error_display_is_verbatim() {
        let e = JshError::Argument("cd: too many arguments".into());
        assert_eq!(format!("{e}"), "cd: too many arguments");
    }

    #[test]
    fn not_a_directory_display() {
        let e = JshError::NotADirectory("/etc/motd".into());
        assert_eq!(format!("{e}"), "'/etc/motd' is not a directory");
    }

    #[test]
    fn command_not_found_display() {
        let e = JshError::CommandNotFound("zzz".into());
        assert_eq!(format!("{e}"), "zzz: command not found");
    }

    #[test]
    fn depth_exceeded_display() {
        let e = JshError::DepthExceeded(64);
        assert_eq!(format!("{e}"), "maximum nesting depth (64) exceeded");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: JshError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: JshError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn every_error_exits_with_failure_code() {
        assert_eq!(JshError::NotFound("x".into()).exit_code(), FAILURE_EXIT_CODE);
        assert_eq!(JshError::DepthExceeded(1).exit_code(), FAILURE_EXIT_CODE);
        assert_ne!(FAILURE_EXIT_CODE, CRASH_EXIT_CODE);
    }

    #[test]
    fn result_alias_err() {
        let r: Result<i32> = Err(JshError::AlreadyExists("/x".into()));
        assert!(r.is_err());
    }
}
