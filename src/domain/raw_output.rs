//! Captured output of a single external tool run

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which stream of the subprocess a line was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamOrigin {
    Stdout,
    Stderr,
}

impl StreamOrigin {
    /// Returns the tag used when rendering a line
    pub fn tag(&self) -> &'static str {
        match self {
            StreamOrigin::Stdout => "STDOUT",
            StreamOrigin::Stderr => "STDERR",
        }
    }
}

impl fmt::Display for StreamOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamOrigin::Stdout => write!(f, "stdout"),
            StreamOrigin::Stderr => write!(f, "stderr"),
        }
    }
}

/// One line of subprocess output, tagged with its origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub origin: StreamOrigin,
    pub text: String,
}

impl OutputLine {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            origin: StreamOrigin::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            origin: StreamOrigin::Stderr,
            text: text.into(),
        }
    }
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.origin.tag(), self.text)
    }
}

/// The line-tagged output of one tool run, in the order lines were received
///
/// Order is preserved within each stream. Lines from stdout and stderr are
/// interleaved in arrival order with no further guarantee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOutput {
    lines: Vec<OutputLine>,
}

impl RawOutput {
    /// Creates an empty output buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a received line
    pub fn push(&mut self, line: OutputLine) {
        self.lines.push(line);
    }

    /// Returns all lines in arrival order
    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    /// Returns the lines read from one stream, in stream order
    pub fn stream(&self, origin: StreamOrigin) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(move |line| line.origin == origin)
            .map(|line| line.text.as_str())
    }

    /// Returns the number of captured lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if nothing was captured
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the untagged text of every line joined with newlines
    pub fn text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(&line.text);
            text.push('\n');
        }
        text
    }

    /// Returns the last `count` stderr lines, useful for failure diagnostics
    pub fn stderr_tail(&self, count: usize) -> Vec<&str> {
        let stderr: Vec<&str> = self.stream(StreamOrigin::Stderr).collect();
        let start = stderr.len().saturating_sub(count);
        stderr[start..].to_vec()
    }
}

impl FromIterator<OutputLine> for RawOutput {
    fn from_iter<I: IntoIterator<Item = OutputLine>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for RawOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
