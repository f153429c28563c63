//! Indentation-aware line writer.

use std::io::{self, Write};

/// Buffers one pending line and writes it, indented, on [`Writer::newline`].
pub struct Writer<W: Write> {
    inner: W,
    indent: String,
    line_ending: String,
    level: usize,
    pending: String,
}

impl<W: Write> Writer<W> {
    /// Creates a writer indenting with four spaces and ending lines with `\n`.
    pub fn new(inner: W) -> Self {
        Self::with_format(inner, "    ", "\n")
    }

    /// Creates a writer with an explicit indent unit and line terminator.
    pub fn with_format(inner: W, indent: &str, line_ending: &str) -> Self {
        Self {
            inner,
            indent: indent.to_string(),
            line_ending: line_ending.to_string(),
            level: 0,
            pending: String::new(),
        }
    }

    /// Appends `text` to the pending line.
    pub fn write(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    /// Emits the pending line at the current indent. Does nothing if no text
    /// is pending.
    pub fn newline(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        for _ in 0..self.level {
            self.inner.write_all(self.indent.as_bytes())?;
        }
        self.inner.write_all(self.pending.as_bytes())?;
        self.inner.write_all(self.line_ending.as_bytes())?;
        self.pending.clear();
        Ok(())
    }

    /// Appends `text` and emits the line.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        self.write(text);
        self.newline()
    }

    /// Emits the pending line, if any, then one empty line.
    pub fn blank_line(&mut self) -> io::Result<()> {
        self.newline()?;
        self.inner.write_all(self.line_ending.as_bytes())
    }

    /// Increases the indent by one level.
    pub fn push_indent(&mut self) {
        self.level += 1;
    }

    /// Decreases the indent by one level.
    pub fn pop_indent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Returns the current indent level.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Emits pending text, flushes, and returns the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.newline()?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}
