//! Line parsing internals
// (c) 2024 Ross Younger

use std::borrow::Cow;

#[derive(Debug, PartialEq)]
/// A classified physical line from a configuration file
pub(super) enum Line<'a> {
    /// Blank line or comment
    Empty,
    /// `[name]`
    Section { name: &'a str },
    /// `name = value` or `name: value`. The value is trimmed but still quoted.
    Option { name: &'a str, value: &'a str },
    /// An indented line which continues the previous option's value
    Continuation { text: &'a str },
}

fn is_comment(s: &str) -> bool {
    s.starts_with('#') || s.starts_with(';')
}

/// Classifies a single line of input.
///
/// The error string describes the problem; the caller adds the source and line number.
pub(super) fn parse_line(line: &str) -> Result<Line<'_>, &'static str> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim();
    if trimmed.is_empty() || is_comment(trimmed) {
        return Ok(Line::Empty);
    }
    if line.starts_with(char::is_whitespace) {
        return Ok(Line::Continuation { text: trimmed });
    }

    if let Some(rest) = trimmed.strip_prefix('[') {
        let Some(name) = rest.strip_suffix(']') else {
            return Err("unterminated section header");
        };
        let name = name.trim();
        if name.is_empty() {
            return Err("empty section name");
        }
        return Ok(Line::Section { name });
    }

    // The first `=` or `:` separates the name from the value
    let Some((name, value)) = trimmed.split_once(['=', ':']) else {
        return Err("expected an option assignment or a section header");
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("missing option name");
    }
    Ok(Line::Option {
        name,
        value: value.trim(),
    })
}

/// Removes one pair of matching surrounding quotes, if present
pub(super) fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(q1 @ (b'"' | b'\'')), Some(q2)) if bytes.len() >= 2 && q1 == q2 => {
            &value[1..value.len() - 1]
        }
        _ => value,
    }
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}

/// Checks that a section name will survive being written out and read back in
pub(super) fn check_section_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        Err("section name is empty")
    } else if has_line_break(name) {
        Err("section name contains a line break")
    } else if name.trim() != name {
        Err("section name has surrounding whitespace")
    } else {
        Ok(())
    }
}

/// Checks that an option name will survive being written out and read back in
pub(super) fn check_option_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        Err("option name is empty")
    } else if has_line_break(name) {
        Err("option name contains a line break")
    } else if name.trim() != name {
        Err("option name has surrounding whitespace")
    } else if name.contains(['=', ':']) {
        Err("option name contains a separator character")
    } else if name.starts_with('[') || is_comment(name) {
        Err("option name starts with a reserved character")
    } else {
        Ok(())
    }
}

/// Renders a value so that [`parse_line`] followed by [`unquote`] gives it back unchanged
pub(super) fn quote_value(value: &str) -> Result<Cow<'_, str>, &'static str> {
    if has_line_break(value) {
        return Err("value contains a line break");
    }
    if value.trim() != value || unquote(value) != value {
        Ok(Cow::Owned(format!("\"{value}\"")))
    } else {
        Ok(Cow::Borrowed(value))
    }
}

///////////////////////////////////////////////////////////////////////////////////////
