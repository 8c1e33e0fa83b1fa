//! Composite format strings applied to resolved translations.
//!
//! A format such as `"[{0}]"` wraps the resolved text. Formats are parsed
//! once, when a binding is configured, so a malformed format is reported at
//! construction time and applying a parsed format can never fail.
//!
//! Supported syntax:
//! - `{0}`: the resolved text
//! - `{0,N}` / `{0,-N}`: right / left alignment to width `N`
//! - `{0:spec}`: the spec is accepted and ignored (the argument is a string)
//! - `{{` and `}}`: literal braces

use crate::error::{LocalizationError, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Argument { alignment: i32 },
}

/// A parsed composite format string with a single argument slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringFormat {
    source: String,
    segments: Vec<Segment>,
}

impl StringFormat {
    /// Parse a composite format string.
    ///
    /// # Returns
    /// * `Ok(StringFormat)` when every placeholder refers to argument 0
    /// * `Err(InvalidStringFormat)` on unbalanced braces, a bad alignment, or
    ///   an argument index other than 0
    pub fn parse(format: &str) -> Result<StringFormat> {
        let invalid = |reason: String| LocalizationError::InvalidStringFormat {
            format: format.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("unexpected '}'".to_string())),
                '{' => {
                    let mut placeholder = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        placeholder.push(inner);
                    }
                    if !closed {
                        return Err(invalid("unclosed placeholder".to_string()));
                    }

                    let alignment = parse_placeholder(&placeholder).map_err(invalid)?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Argument { alignment });
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(StringFormat {
            source: format.to_string(),
            segments,
        })
    }

    /// Substitute `value` into every placeholder.
    pub fn apply(&self, value: &str) -> String {
        let mut output = String::with_capacity(self.source.len() + value.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Argument { alignment } => {
                    let width = alignment.unsigned_abs() as usize;
                    if *alignment < 0 {
                        output.push_str(&format!("{value:<width$}"));
                    } else {
                        output.push_str(&format!("{value:>width$}"));
                    }
                }
            }
        }
        output
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Widest padding `apply` can produce.
const MAX_ALIGNMENT: u32 = u16::MAX as u32;

/// Parse the inside of a `{...}` placeholder and return its alignment.
fn parse_placeholder(placeholder: &str) -> std::result::Result<i32, String> {
    let (head, _spec) = match placeholder.split_once(':') {
        Some((head, spec)) => (head, Some(spec)),
        None => (placeholder, None),
    };
    let (index, alignment) = match head.split_once(',') {
        Some((index, alignment)) => (index.trim(), Some(alignment.trim())),
        None => (head.trim(), None),
    };

    match index.parse::<usize>() {
        Ok(0) => {}
        Ok(other) => {
            return Err(format!(
                "argument index {other} is out of range, only {{0}} is available"
            ))
        }
        Err(_) => return Err(format!("'{index}' is not an argument index")),
    }

    let Some(alignment) = alignment else {
        return Ok(0);
    };
    let width = alignment
        .parse::<i32>()
        .map_err(|_| format!("'{alignment}' is not a valid alignment"))?;
    if width.unsigned_abs() > MAX_ALIGNMENT {
        return Err(format!(
            "alignment {width} exceeds the maximum width of {MAX_ALIGNMENT}"
        ));
    }
    Ok(width)
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
