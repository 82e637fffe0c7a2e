//! Interfaces between the interpreter and its host.
//!
//! The interpreter never renders anything itself. It pushes [`Output`] items
//! into an [`OutputSink`], pulls stdin chunks from an [`InputSource`], and asks
//! a [`WidthQuery`] for the display width.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Marker placed before every error line.
pub const ERROR_MARKER: &str = "error: ";

/// One item written to an output sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A text fragment, emitted verbatim.
    Text(String),
    /// An error message; rendered as [`ERROR_MARKER`] followed by the message
    /// and a newline.
    Error(String),
    /// Signal to clear the display.
    Clear,
}

impl Output {
    /// The text carried by this item, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Error(msg) => writeln!(f, "{ERROR_MARKER}{msg}"),
            Self::Clear => Ok(()),
        }
    }
}

/// Write-only destination for command output.
pub trait OutputSink {
    fn write(&mut self, item: Output);
}

/// Source of stdin chunks for a command.
pub trait InputSource {
    /// Pull the next item, or `None` at end of input.
    fn read(&mut self) -> Option<Output>;
}

/// Reports the current display width in character columns.
pub trait WidthQuery {
    fn width(&self) -> usize;
}

/// Sink that keeps every item it receives.
///
/// Clones share one buffer, so a host can hand one clone to a shell and read
/// what was written through another.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    items: Rc<RefCell<Vec<Output>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured items in emission order.
    pub fn items(&self) -> Vec<Output> {
        self.items.borrow().clone()
    }

    /// Captured output rendered as one string. Clear signals are dropped.
    pub fn text(&self) -> String {
        self.items.borrow().iter().map(ToString::to_string).collect()
    }

    /// Take every captured item, leaving the buffer empty.
    pub fn take(&self) -> Vec<Output> {
        std::mem::take(&mut *self.items.borrow_mut())
    }

    /// Render and drain the buffer.
    pub fn take_text(&self) -> String {
        self.take().iter().map(ToString::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl OutputSink for CaptureSink {
    fn write(&mut self, item: Output) {
        self.items.borrow_mut().push(item);
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write(&mut self, _item: Output) {}
}

/// Width query with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidth(pub usize);

impl WidthQuery for FixedWidth {
    fn width(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_renders_with_marker_and_newline() {
        let item = Output::Error("zzz: command not found".into());
        assert_eq!(item.to_string(), "error: zzz: command not found\n");
    }

    #[test]
    fn clear_renders_empty() {
        assert_eq!(Output::Clear.to_string(), "");
        assert_eq!(Output::Clear.as_text(), None);
    }

    #[test]
    fn capture_sink_keeps_order() {
        let mut sink = CaptureSink::new();
        sink.write(Output::Text("a".into()));
        sink.write(Output::Clear);
        sink.write(Output::Text("b\n".into()));
        assert_eq!(sink.items().len(), 3);
        assert_eq!(sink.text(), "ab\n");
        assert_eq!(sink.take().len(), 3);
        assert!(sink.is_empty());
        sink.write(Output::Text("c".into()));
        assert_eq!(sink.take_text(), "c");
        assert!(sink.is_empty());
    }

    #[test]
    fn capture_clones_share_buffer() {
        let reader = CaptureSink::new();
        let mut writer = reader.clone();
        writer.write(Output::Error("bad".into()));
        assert_eq!(reader.text(), "error: bad\n");
        assert_eq!(reader.items(), vec![Output::Error("bad".into())]);
    }

    #[test]
    fn fixed_width_reports_value() {
        assert_eq!(FixedWidth(42).width(), 42);
    }
}
