//! Stage-to-stage buffering.

use std::collections::VecDeque;

use jsh_types::io::{InputSource, Output, OutputSink};

/// FIFO between two pipeline stages.
///
/// The writing stage runs to completion first, then the reading stage drains
/// the items in emission order.
#[derive(Debug, Default)]
pub struct PipeBuffer {
    items: VecDeque<Output>,
}

impl PipeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Drain the buffered text. Control signals are dropped.
    pub fn drain_text(&mut self) -> String {
        let text = self.items.iter().filter_map(Output::as_text).collect();
        self.items.clear();
        text
    }
}

impl OutputSink for PipeBuffer {
    fn write(&mut self, item: Output) {
        self.items.push_back(item);
    }
}

impl InputSource for PipeBuffer {
    fn read(&mut self) -> Option<Output> {
        self.items.pop_front()
    }
}
