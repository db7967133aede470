//! Structured G-code line records
//!
//! A [`GcodeLine`] is either parsed from a document (and then carries its
//! verbatim source text in `raw`) or synthesized by the toolpath generator.
//! Synthesized lines are rendered with a fixed precision per parameter.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::parser::parse_fields;

/// Value of a single command parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Numeric value
    Number(f64),
    /// Anything that does not parse as a number
    Literal(String),
}

/// Letter-addressed parameter, e.g. `X12.5`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter letter
    pub letter: char,
    /// Parameter value
    pub value: ParamValue,
}

impl Param {
    /// Numeric parameter
    pub fn number(letter: char, value: f64) -> Self {
        Self {
            letter,
            value: ParamValue::Number(value),
        }
    }

    /// Literal parameter
    pub fn literal(letter: char, value: impl Into<String>) -> Self {
        Self {
            letter,
            value: ParamValue::Literal(value.into()),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ParamValue::Number(v) => {
                write!(f, "{}{}", self.letter, format_number(*v, precision_for(self.letter)))
            }
            ParamValue::Literal(s) => write!(f, "{}{}", self.letter, s),
        }
    }
}

/// Decimal places used when rendering a synthesized parameter
pub fn precision_for(letter: char) -> usize {
    match letter.to_ascii_uppercase() {
        'E' => 5,
        'F' => 0,
        _ => 3,
    }
}

/// Format a number with at most `decimals` places, trailing zeros trimmed
pub fn format_number(value: f64, decimals: usize) -> String {
    let mut s = format!("{:.*}", decimals, value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// One line of a G-code program
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GcodeLine {
    /// Command word such as `G1` or `M117`; `None` for comment-only lines
    pub command: Option<String>,
    /// Parameters in order of appearance
    pub params: Vec<Param>,
    /// Comment text without the leading `;`
    pub comment: String,
    /// Layer the line belongs to
    pub layer: u32,
    /// Verbatim source text for parsed lines
    pub raw: Option<String>,
}

impl GcodeLine {
    /// Command line without parameters
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }

    /// Comment-only line
    pub fn comment_only(text: impl Into<String>) -> Self {
        Self {
            comment: text.into(),
            ..Self::default()
        }
    }

    /// Empty line
    pub fn blank() -> Self {
        Self::default()
    }

    /// Line whose text is kept exactly as given
    pub fn verbatim(text: impl Into<String>) -> Self {
        let text = text.into();
        let (command, params, comment) = parse_fields(&text);
        Self {
            command,
            params,
            comment,
            layer: 0,
            raw: Some(text),
        }
    }

    /// Append a numeric parameter
    pub fn with(mut self, letter: char, value: f64) -> Self {
        self.params.push(Param::number(letter, value));
        self
    }

    /// Append a literal parameter
    pub fn with_literal(mut self, letter: char, value: impl Into<String>) -> Self {
        self.params.push(Param::literal(letter, value));
        self
    }

    /// Attach a trailing comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Assign the line to a layer
    pub fn on_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    /// Whether the command word equals `command`
    pub fn has_command(&self, command: &str) -> bool {
        self.command.as_deref() == Some(command)
    }

    /// Whether the line carries no command
    pub fn is_comment_only(&self) -> bool {
        self.command.is_none()
    }

    /// Whether the line renders to nothing
    pub fn is_blank(&self) -> bool {
        match &self.raw {
            Some(raw) => raw.trim().is_empty(),
            None => self.command.is_none() && self.comment.is_empty(),
        }
    }

    /// Look up a parameter by letter
    pub fn param(&self, letter: char) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|p| p.letter == letter)
            .map(|p| &p.value)
    }

    /// Numeric value of a parameter
    pub fn number(&self, letter: char) -> Option<f64> {
        match self.param(letter) {
            Some(ParamValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// Overwrite (or append) a numeric parameter
    ///
    /// Clears `raw` so the edited line is rendered from its fields.
    pub fn set_number(&mut self, letter: char, value: f64) {
        match self.params.iter_mut().find(|p| p.letter == letter) {
            Some(p) => p.value = ParamValue::Number(value),
            None => self.params.push(Param::number(letter, value)),
        }
        self.raw = None;
    }

    /// Extrusion amount carried by the line, if any
    pub fn extrusion(&self) -> Option<f64> {
        if self.command.is_none() {
            return None;
        }
        self.number('E')
    }

    /// Whether a comment-only line's text contains `marker`
    pub fn is_marker(&self, marker: &str) -> bool {
        self.command.is_none() && self.comment.contains(marker)
    }

    /// Text of the line as written to the output document
    pub fn render(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        match &self.command {
            Some(cmd) => {
                let mut out = cmd.clone();
                for p in &self.params {
                    out.push(' ');
                    out.push_str(&p.to_string());
                }
                if !self.comment.is_empty() {
                    out.push_str(" ; ");
                    out.push_str(&self.comment);
                }
                out
            }
            None if self.comment.is_empty() => String::new(),
            None => format!("; {}", self.comment),
        }
    }
}

impl fmt::Display for GcodeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
