//! Text layout filters: wrap, center.
//!
//! Both read stdin line by line and lay each line out in a column of the given
//! width. Widths are counted in characters.

use jsh_types::error::{JshError, Result};

use crate::environment::Environment;
use crate::interpreter::{Command, CommandRegistry};

/// Register the text layout filters.
pub fn register_text_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(WrapCmd));
    reg.register(Box::new(CenterCmd));
}

/// The optional `[width]` argument, defaulting to the display width.
fn width_arg(env: &Environment<'_>) -> Result<usize> {
    match env.args() {
        [] => Ok(env.width().max(1)),
        [arg] => match arg.parse::<usize>() {
            Ok(width) if width > 0 => Ok(width),
            _ => Err(JshError::Argument(format!("invalid width '{arg}'"))),
        },
        _ => Err(JshError::Argument("too many arguments".to_string())),
    }
}

// ---------------------------------------------------------------------------
// wrap
// ---------------------------------------------------------------------------

/// Greedy word wrap. Runs of whitespace collapse to one space and words
/// longer than `width` are split. A zero width is treated as one column.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut len = 0;

    for word in line.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(width) {
            let piece_len = piece.len();
            if len > 0 && len + 1 + piece_len > width {
                lines.push(std::mem::take(&mut current));
                len = 0;
            }
            if len > 0 {
                current.push(' ');
                len += 1;
            }
            current.extend(piece);
            len += piece_len;
        }
    }

    if len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct WrapCmd;
impl Command for WrapCmd {
    fn name(&self) -> &str {
        "wrap"
    }
    fn description(&self) -> &str {
        "Word-wrap stdin to a width"
    }
    fn usage(&self) -> &str {
        "wrap [width]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32> {
        let width = width_arg(env)?;
        let input = env.read_all();
        let mut out = String::new();
        for line in input.lines() {
            for wrapped in wrap_line(line, width) {
                out.push_str(&wrapped);
                out.push('\n');
            }
        }
        env.print(out);
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// center
// ---------------------------------------------------------------------------

/// Trim `line` and pad it on the left so it sits in the middle of `width`
/// columns. Lines at least as wide as `width` are only trimmed.
pub fn center_line(line: &str, width: usize) -> String {
    let text = line.trim();
    let pad = width.saturating_sub(text.chars().count()) / 2;
    format!("{}{text}", " ".repeat(pad))
}

struct CenterCmd;
impl Command for CenterCmd {
    fn name(&self) -> &str {
        "center"
    }
    fn description(&self) -> &str {
        "Center each line of stdin"
    }
    fn usage(&self) -> &str {
        "center [width]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, env: &mut Environment<'_>) -> Result<i32> {
        let width = width_arg(env)?;
        let input = env.read_all();
        let out: String = input
            .lines()
            .map(|line| format!("{}\n", center_line(line, width)))
            .collect();
        env.print(out);
        Ok(0)
    }
}
