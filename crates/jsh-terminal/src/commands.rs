//! Native utilities installed under `/usr/bin`.

use jsh_types::error::{JshError, Result};

use crate::environment::Environment;
use crate::interpreter::{Command, CommandRegistry};

/// Register every native utility into a registry.
///
/// Each registered command becomes an executable under `/usr/bin` when the
/// default filesystem is built.
pub fn register_utilities(reg: &mut CommandRegistry) {
    reg.register(Box::new(ClearCmd));
    reg.register(Box::new(PwdCmd));
    crate::register_file_commands(reg);
    crate::register_text_commands(reg);
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

const CLEAR_HELP: &str = "\
Welcome to clear help for clear
Version: 1.0.0

Usage:
  clear
    clears the screen

  clear <anything>
    shows this help
";

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the display"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn category(&self) -> &str {
        "display"
    }
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32> {
        if env.args().is_empty() {
            env.clear();
        } else {
            env.print(CLEAR_HELP);
        }
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// pwd
// ---------------------------------------------------------------------------

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32> {
        if !env.args().is_empty() {
            return Err(JshError::Argument("too many arguments".to_string()));
        }
        let cwd = env.cwd().to_string();
        env.println(cwd);
        Ok(0)
    }
}
