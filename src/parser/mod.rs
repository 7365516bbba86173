//! Log parser for the external tool's structured output
//!
//! Turns captured output into a deduplicated, deterministically ordered list
//! of dependency updates. Parsing is best-effort: anything that is not a
//! recognized record is skipped, and the parser never fails.
//!
//! Records are merged by `(depName, packageFile, newVersion)`; a later line
//! replaces an earlier one with the same key. Output is sorted by `depName`,
//! then `newVersion`, both compared as plain strings.

mod schema;

pub use schema::{LogRecord, BRANCHES_INFO_MSG, PACKAGE_FILES_MSG};

use crate::domain::{RawOutput, UpdateInfo, UpdateKey};
use std::collections::BTreeMap;

/// Incremental parser that merges records line by line
#[derive(Debug, Default)]
pub struct LogParser {
    updates: BTreeMap<UpdateKey, UpdateInfo>,
    recognized_lines: usize,
}

impl LogParser {
    /// Creates an empty parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line, returning the number of update records it contributed
    pub fn feed_line(&mut self, line: &str) -> usize {
        let line = line.trim();
        if line.is_empty() {
            return 0;
        }

        let Some(record) = LogRecord::detect(line) else {
            return 0;
        };
        self.recognized_lines += 1;

        let updates = record.into_updates();
        let count = updates.len();
        for update in updates {
            self.updates.insert(update.key(), update);
        }
        count
    }

    /// Returns the number of lines that held a recognized record so far
    pub fn recognized_lines(&self) -> usize {
        self.recognized_lines
    }

    /// Consumes the parser, returning the merged updates in sorted order
    pub fn finish(self) -> Vec<UpdateInfo> {
        // BTreeMap iteration follows UpdateKey order: depName, newVersion, packageFile
        self.updates.into_values().collect()
    }
}

/// Parses raw bytes, one JSON record per line
pub fn parse_updates(output: &[u8]) -> Vec<UpdateInfo> {
    let mut parser = LogParser::new();
    for line in output.split(|b| *b == b'\n') {
        parser.feed_line(&String::from_utf8_lossy(line));
    }
    parser.finish()
}

/// Parses captured tool output in arrival order, stdout and stderr alike
pub fn parse_output(output: &RawOutput) -> Vec<UpdateInfo> {
    let mut parser = LogParser::new();
    for line in output.lines() {
        parser.feed_line(&line.text);
    }
    parser.finish()
}
