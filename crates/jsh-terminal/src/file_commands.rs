//! Filesystem utilities: ls, cat, mkdir, touch, rm, ln.
//!
//! Commands taking several operands keep going after a failing one. Each
//! failure is reported on stderr and the command exits with 1 at the end.

use jsh_types::error::{FAILURE_EXIT_CODE, JshError, Result};
use jsh_vfs::{Content, Node, NodeKind, VPath};

use crate::environment::Environment;
use crate::interpreter::{Command, CommandRegistry};

/// Register the filesystem utilities.
pub fn register_file_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(LsCmd));
    reg.register(Box::new(CatCmd));
    reg.register(Box::new(MkdirCmd));
    reg.register(Box::new(TouchCmd));
    reg.register(Box::new(RmCmd));
    reg.register(Box::new(LnCmd));
}

/// Run `op` on every operand, reporting failures as `name: error`.
fn for_each_operand(
    env: &mut Environment<'_>,
    operands: &[String],
    mut op: impl FnMut(&mut Environment<'_>, &str) -> Result<()>,
) -> i32 {
    let mut code = 0;
    for operand in operands {
        if let Err(e) = op(env, operand) {
            let msg = format!("{}: {e}", env.name());
            env.error(msg);
            code = FAILURE_EXIT_CODE;
        }
    }
    code
}

fn require_operands(env: &Environment<'_>, usage: &str) -> Result<()> {
    if env.args().is_empty() {
        return Err(JshError::Argument(format!("usage: {usage}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

/// Listing name with a type suffix.
fn entry_name(node: &Node) -> String {
    let suffix = match node.kind() {
        NodeKind::Dir => "/",
        NodeKind::Link => "@",
        _ if node.is_executable() => "*",
        _ => "",
    };
    format!("{}{suffix}", node.name())
}

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "ls [-l] [path...]"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32> {
        let mut long = false;
        let mut operands = Vec::new();
        for arg in env.args() {
            match arg.as_str() {
                "-l" => long = true,
                flag if flag.len() > 1 && flag.starts_with('-') => {
                    return Err(JshError::Argument(format!("invalid option '{flag}'")));
                },
                _ => operands.push(arg.clone()),
            }
        }
        if operands.is_empty() {
            operands.push(".".to_string());
        }
        let headers = operands.len() > 1;
        let mut first = true;

        let line = |node: &Node| {
            if long {
                format!("{} {}\n", node.kind().tag(), entry_name(node))
            } else {
                format!("{}\n", entry_name(node))
            }
        };

        Ok(for_each_operand(env, &operands, |env, operand| {
            let path = env.resolve(operand);
            let node = env.vfs().locate(&path)?;
            let text = if node.is_dir() {
                let mut text = String::new();
                if headers {
                    if !first {
                        text.push('\n');
                    }
                    text.push_str(&format!("{operand}:\n"));
                }
                for child in env.vfs().list(&path)? {
                    text.push_str(&line(child));
                }
                text
            } else {
                line(node)
            };
            first = false;
            env.print(text);
            Ok(())
        }))
    }
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

struct CatCmd;
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Concatenate files (or stdin) to stdout"
    }
    fn usage(&self) -> &str {
        "cat [file...]"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32> {
        let operands = match env.args() {
            [] => vec!["-".to_string()],
            args => args.to_vec(),
        };
        Ok(for_each_operand(env, &operands, |env, operand| {
            if operand == "-" {
                let text = env.read_all();
                env.print(text);
                return Ok(());
            }
            let node = env.vfs().locate(&env.resolve(operand))?;
            let text = match node.content() {
                _ if node.is_dir() => return Err(JshError::IsADirectory(operand.to_string())),
                Content::Native(_) => return Err(JshError::NotAFile(operand.to_string())),
                Content::Text(text) => text.clone(),
            };
            env.print(text);
            Ok(())
        }))
    }
}

// ---------------------------------------------------------------------------
// mkdir
// ---------------------------------------------------------------------------

struct MkdirCmd;
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create directories"
    }
    fn usage(&self) -> &str {
        "mkdir [-p] <dir...>"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32> {
        let (parents, operands) = match env.args() {
            [flag, rest @ ..] if flag == "-p" => (true, rest.to_vec()),
            args => (false, args.to_vec()),
        };
        if operands.is_empty() {
            return Err(JshError::Argument(format!("usage: {}", self.usage())));
        }
        Ok(for_each_operand(env, &operands, |env, operand| {
            let path = env.resolve(operand);
            if parents {
                return env.vfs_mut().create_dir_all(&path);
            }
            env.vfs_mut().create_dir(&path.parent(), path.name())?;
            Ok(())
        }))
    }
}

// ---------------------------------------------------------------------------
// touch
// ---------------------------------------------------------------------------

struct TouchCmd;
impl Command for TouchCmd {
    fn name(&self) -> &str {
        "touch"
    }
    fn description(&self) -> &str {
        "Create empty files"
    }
    fn usage(&self) -> &str {
        "touch <file...>"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32> {
        require_operands(env, self.usage())?;
        let operands = env.args().to_vec();
        Ok(for_each_operand(env, &operands, |env, operand| {
            let path = env.resolve(operand);
            env.vfs_mut().open(&path)?;
            Ok(())
        }))
    }
}

// ---------------------------------------------------------------------------
// rm
// ---------------------------------------------------------------------------

struct RmCmd;
impl Command for RmCmd {
    fn name(&self) -> &str {
        "rm"
    }
    fn description(&self) -> &str {
        "Remove files or directories"
    }
    fn usage(&self) -> &str {
        "rm [-r] <path...>"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32> {
        let mut recursive = false;
        let mut operands = Vec::new();
        for arg in env.args() {
            match arg.strip_prefix('-') {
                Some(flags) if !flags.is_empty() => {
                    for flag in flags.chars() {
                        match flag {
                            'r' | 'R' => recursive = true,
                            _ => {
                                return Err(JshError::Argument(format!(
                                    "invalid option -- '{flag}'"
                                )));
                            },
                        }
                    }
                },
                _ => operands.push(arg.clone()),
            }
        }
        if operands.is_empty() {
            return Err(JshError::Argument(format!("usage: {}", self.usage())));
        }
        Ok(for_each_operand(env, &operands, |env, operand| {
            let path = env.resolve(operand);
            env.vfs_mut().remove(&path, recursive)
        }))
    }
}

// ---------------------------------------------------------------------------
// ln
// ---------------------------------------------------------------------------

struct LnCmd;
impl Command for LnCmd {
    fn name(&self) -> &str {
        "ln"
    }
    fn description(&self) -> &str {
        "Create a link to a path"
    }
    fn usage(&self) -> &str {
        "ln <target> <link>"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32> {
        let [target, link] = env.args() else {
            return Err(JshError::Argument(format!("usage: {}", self.usage())));
        };
        let target = target.clone();
        let link: VPath = env.resolve(link);
        env.vfs_mut()
            .create_link(&link.parent(), link.name(), &target)?;
        Ok(0)
    }
}
