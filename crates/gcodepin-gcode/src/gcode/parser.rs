//! G-code parser
//!
//! Turns program text into [`GcodeLine`] records, keeping the verbatim text of
//! every line and tagging each with the layer reported by a [`LayerTracker`].

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use super::layer::{LayerTracker, ZHeightTracker};
use super::line::{GcodeLine, Param, ParamValue};
use crate::document::Document;
use crate::error::Result;

fn command_regex() -> &'static Regex {
    static COMMAND_REGEX: OnceLock<Regex> = OnceLock::new();
    COMMAND_REGEX.get_or_init(|| {
        Regex::new(r"^\s*([A-Z]\d+(?:\.\d+)?)(?:\s|$)").expect("invalid regex pattern")
    })
}

/// Split one line of text into command, parameters and comment
///
/// Lines without a leading command word (including host macros such as
/// `BLINK_LIGHT`) come back as comment-only: the comment is the text after
/// `;` when present, otherwise the whole trimmed line.
pub fn parse_fields(text: &str) -> (Option<String>, Vec<Param>, String) {
    let (code, comment) = match text.find(';') {
        Some(idx) => (&text[..idx], text[idx + 1..].trim().to_string()),
        None => (text, String::new()),
    };

    let Some(caps) = command_regex().captures(code) else {
        let comment = if text.contains(';') {
            comment
        } else {
            text.trim().to_string()
        };
        return (None, Vec::new(), comment);
    };

    let command = caps[1].to_string();
    let rest = &code[caps.get(0).map_or(0, |m| m.end())..];
    let params = rest
        .split_whitespace()
        .filter_map(|token| {
            let mut chars = token.chars();
            let letter = chars.next().filter(|c| c.is_ascii_alphabetic())?;
            let value = chars.as_str();
            Some(match value.parse::<f64>() {
                Ok(v) => Param::number(letter, v),
                Err(_) => Param {
                    letter,
                    value: ParamValue::Literal(value.to_string()),
                },
            })
        })
        .collect();

    (Some(command), params, comment)
}

/// G-code parser with pluggable layer tracking
pub struct GcodeParser<T: LayerTracker = ZHeightTracker> {
    tracker: T,
    lines_parsed: usize,
}

impl GcodeParser<ZHeightTracker> {
    /// Parser that derives layers from Z heights
    pub fn new(layer_height: f64) -> Self {
        Self::with_tracker(ZHeightTracker::new(layer_height))
    }
}

impl<T: LayerTracker> GcodeParser<T> {
    /// Parser using the given layer tracker
    pub fn with_tracker(tracker: T) -> Self {
        Self {
            tracker,
            lines_parsed: 0,
        }
    }

    /// Access the layer tracker
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Number of lines parsed so far
    pub fn lines_parsed(&self) -> usize {
        self.lines_parsed
    }

    /// Parse a single line, advancing the layer tracker
    pub fn parse_line(&mut self, text: &str) -> GcodeLine {
        let mut line = GcodeLine::verbatim(text);
        line.layer = self.tracker.observe(&line);
        self.lines_parsed += 1;
        line
    }

    /// Parse a whole program
    pub fn parse(&mut self, text: &str) -> Document {
        self.tracker.reset();
        let trailing_newline = text.ends_with('\n');
        let body = if trailing_newline {
            &text[..text.len() - 1]
        } else {
            text
        };

        let lines = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(|l| self.parse_line(l)).collect()
        };

        tracing::debug!(
            "Parsed {} lines, last layer {}",
            lines.len(),
            self.tracker.current_layer()
        );
        Document::new(lines, trailing_newline)
    }

    /// Read and parse a program from disk
    pub fn parse_file(&mut self, path: &Path) -> Result<Document> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > 500 * 1024 * 1024 {
            tracing::warn!(
                "Reading very large file ({}MB) into memory",
                metadata.len() / (1024 * 1024)
            );
        }
        let text = std::fs::read_to_string(path)?;
        Ok(self.parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_move() {
        let (cmd, params, comment) = parse_fields("G1 X10.5 Y-2 E0.03 ; perimeter");
        assert_eq!(cmd.as_deref(), Some("G1"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[0], Param::number('X', 10.5));
        assert_eq!(params[1], Param::number('Y', -2.0));
        assert_eq!(comment, "perimeter");
    }

    #[test]
    fn test_parse_fields_literal_param() {
        let (cmd, params, _) = parse_fields("M117 Pin1");
        assert_eq!(cmd.as_deref(), Some("M117"));
        assert_eq!(params, vec![Param::literal('P', "in1")]);
    }

    #[test]
    fn test_parse_fields_comment_only() {
        let (cmd, params, comment) = parse_fields(";LAYER_CHANGE");
        assert!(cmd.is_none());
        assert!(params.is_empty());
        assert_eq!(comment, "LAYER_CHANGE");

        let (cmd, _, comment) = parse_fields("BLINK_LIGHT");
        assert!(cmd.is_none());
        assert_eq!(comment, "BLINK_LIGHT");
    }

    #[test]
    fn test_dotted_command() {
        let (cmd, _, _) = parse_fields("G38.2 Z-5");
        assert_eq!(cmd.as_deref(), Some("G38.2"));
    }

    #[test]
    fn test_parse_tracks_trailing_newline() {
        let mut parser = GcodeParser::new(0.2);
        let doc = parser.parse("G28\nG1 Z0.2\n");
        assert!(doc.trailing_newline);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.lines[1].layer, 1);

        let doc = parser.parse("G28");
        assert!(!doc.trailing_newline);
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_carriage_return_is_kept() {
        let mut parser = GcodeParser::new(0.2);
        let doc = parser.parse("G1 X1\r\nG1 X2\r\n");
        assert_eq!(doc.lines[0].raw.as_deref(), Some("G1 X1\r"));
        assert_eq!(doc.lines[0].number('X'), Some(1.0));
    }
}
