//! Parsed G-code program

use std::path::Path;

use crate::error::Result;
use crate::gcode::GcodeLine;

/// Ordered line records of one program
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Line records in program order
    pub lines: Vec<GcodeLine>,
    /// Whether the source text ended with a newline
    pub trailing_newline: bool,
}

impl Document {
    /// Create a document from line records
    pub fn new(lines: Vec<GcodeLine>, trailing_newline: bool) -> Self {
        Self {
            lines,
            trailing_newline,
        }
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the document has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate over the lines
    pub fn iter(&self) -> impl Iterator<Item = &GcodeLine> {
        self.lines.iter()
    }

    /// Whether any comment-only line contains `marker`
    pub fn contains_marker(&self, marker: &str) -> bool {
        self.lines.iter().any(|l| l.is_marker(marker))
    }

    /// Render the program text
    pub fn to_text(&self) -> String {
        let mut out = self
            .lines
            .iter()
            .map(GcodeLine::render)
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }

    /// Write the rendered program to disk
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_text())?;
        Ok(())
    }
}
