//! Command-line lexer and parser.
//!
//! One left-to-right scan turns a line into a [`Pipeline`]. Unquoted variable
//! references are expanded by pushing their value back onto the front of the
//! scan, so the value is lexed again: it can split into several words, or glue
//! onto neighbouring characters. The parser never fails; malformed input
//! degrades to whatever tokens can be recovered.

use std::collections::VecDeque;

/// One command of a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stage {
    /// `argv[0]` is the command name.
    pub argv: Vec<String>,
    /// Output redirect target, as written.
    pub redirect: Option<String>,
}

/// Commands connected by `|`, first to last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }
}

/// Parse `line`, resolving `$name` through `lookup`.
///
/// At most `max_expansions` unquoted references are re-scanned; any further
/// reference expands to nothing.
pub fn parse(
    line: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    max_expansions: usize,
) -> Pipeline {
    Lexer::new(line, lookup, max_expansions).pipeline()
}

/// Whether `name` may appear after `$`.
pub fn is_var_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

struct Lexer<'a> {
    chars: VecDeque<char>,
    lookup: &'a dyn Fn(&str) -> Option<String>,
    budget: usize,
}

impl<'a> Lexer<'a> {
    fn new(line: &str, lookup: &'a dyn Fn(&str) -> Option<String>, budget: usize) -> Self {
        Self {
            chars: line.chars().collect(),
            lookup,
            budget,
        }
    }

    fn pipeline(mut self) -> Pipeline {
        let mut stages = Vec::new();
        let mut argv = Vec::new();
        let mut redirect = None;

        loop {
            self.skip_whitespace();
            match self.chars.front().copied() {
                None | Some('#') => break,
                Some('|') => {
                    self.chars.pop_front();
                    if !argv.is_empty() {
                        stages.push(Stage {
                            argv: std::mem::take(&mut argv),
                            redirect: None,
                        });
                    }
                },
                Some('>') => {
                    self.chars.pop_front();
                    self.skip_whitespace();
                    if let Some(target) = self.word() {
                        redirect = Some(target);
                    }
                },
                Some(_) => {
                    if let Some(word) = self.word() {
                        argv.push(word);
                    }
                },
            }
        }

        if !argv.is_empty() {
            stages.push(Stage { argv, redirect });
        } else if let Some(last) = stages.last_mut() {
            last.redirect = redirect;
        }
        Pipeline { stages }
    }

    /// Read one word. `None` when nothing was produced, e.g. an unquoted
    /// reference to an empty variable.
    fn word(&mut self) -> Option<String> {
        let mut text = String::new();
        let mut started = false;

        while let Some(&ch) = self.chars.front() {
            match ch {
                c if c.is_whitespace() => break,
                '|' | '>' | '#' => break,
                '\'' => {
                    self.chars.pop_front();
                    started = true;
                    self.single_quoted(&mut text);
                },
                '"' => {
                    self.chars.pop_front();
                    started = true;
                    self.double_quoted(&mut text);
                },
                '\\' => {
                    self.chars.pop_front();
                    started = true;
                    text.push(self.chars.pop_front().unwrap_or('\\'));
                },
                '$' => {
                    self.chars.pop_front();
                    match self.var_name() {
                        Some(name) => {
                            let value = self.rescan_value(&name);
                            for c in value.chars().rev() {
                                self.chars.push_front(c);
                            }
                        },
                        None => {
                            started = true;
                            text.push('$');
                        },
                    }
                },
                c => {
                    self.chars.pop_front();
                    started = true;
                    text.push(c);
                },
            }
        }

        started.then_some(text)
    }

    fn single_quoted(&mut self, text: &mut String) {
        while let Some(ch) = self.chars.pop_front() {
            if ch == '\'' {
                return;
            }
            text.push(ch);
        }
    }

    fn double_quoted(&mut self, text: &mut String) {
        while let Some(ch) = self.chars.pop_front() {
            match ch {
                '"' => return,
                '\\' => match self.chars.pop_front() {
                    Some(c @ ('\\' | '"')) => text.push(c),
                    Some(c) => {
                        text.push('\\');
                        text.push(c);
                    },
                    None => text.push('\\'),
                },
                '$' => match self.var_name() {
                    Some(name) => text.push_str(&(self.lookup)(&name).unwrap_or_default()),
                    None => text.push('$'),
                },
                c => text.push(c),
            }
        }
    }

    /// Consume a variable name following `$`, bare or braced. Nothing is
    /// consumed when no valid name follows.
    fn var_name(&mut self) -> Option<String> {
        if self.chars.front() == Some(&'{') {
            let len = self
                .chars
                .iter()
                .skip(1)
                .take_while(|c| c.is_ascii_alphanumeric())
                .count();
            if len == 0 || self.chars.get(len + 1) != Some(&'}') {
                return None;
            }
            self.chars.pop_front();
            let name = self.chars.drain(..len).collect();
            self.chars.pop_front();
            return Some(name);
        }

        let len = self
            .chars
            .iter()
            .take_while(|c| c.is_ascii_alphanumeric())
            .count();
        (len > 0).then(|| self.chars.drain(..len).collect())
    }

    /// Value of an unquoted reference, counted against the expansion budget.
    fn rescan_value(&mut self, name: &str) -> String {
        if self.budget == 0 {
            log::debug!("expansion budget exhausted at ${name}");
            return String::new();
        }
        self.budget -= 1;
        (self.lookup)(name).unwrap_or_default()
    }

    fn skip_whitespace(&mut self) {
        while self.chars.front().is_some_and(|c| c.is_whitespace()) {
            self.chars.pop_front();
        }
    }
}
