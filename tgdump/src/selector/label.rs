//! Parser for optional `label:` prefixes of query commands.

use crate::errors::DumpError;

/// Separator between a query label and its SQL text.
pub const LABEL_DELIMITER: char = ':';

/// A query command split into its optional label and its statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledQuery {
    /// The explicit label, if the command carried one.
    pub label: Option<String>,
    /// The SQL text.
    pub statement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Normal,
    Space,
    Stop,
    Delimiter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Body { start: usize },
    Padding { start: usize, end: usize },
}

fn classify(c: char, delimiter: char) -> CharClass {
    if c == delimiter {
        CharClass::Delimiter
    } else if matches!(c, '\'' | '"' | '`') || c.is_control() {
        CharClass::Stop
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Normal
    }
}

/// Splits `label<delimiter>statement` commands.
///
/// A label is a single word, optionally surrounded by spaces. A quote or
/// control character before the delimiter, or a second word, means the
/// command has no label and the whole text is the statement. An empty label
/// or an empty statement is rejected.
pub fn parse_label(command: &str, delimiter: char) -> Result<LabeledQuery, DumpError> {
    let mut state = State::Initial;
    for (i, c) in command.char_indices() {
        let class = classify(c, delimiter);
        state = match (state, class) {
            (State::Initial, CharClass::Space) => State::Initial,
            (State::Initial, CharClass::Normal) => State::Body { start: i },
            (State::Initial, CharClass::Delimiter) => {
                return Err(DumpError::invalid_argument(format!(
                    "query label must not be empty: {command:?}"
                )));
            }
            (State::Body { start }, CharClass::Normal) => State::Body { start },
            (State::Body { start }, CharClass::Space) => State::Padding { start, end: i },
            (State::Body { start }, CharClass::Delimiter) => {
                return labeled(command, &command[start..i], &command[i + c.len_utf8()..]);
            }
            (State::Padding { start, end }, CharClass::Space) => State::Padding { start, end },
            (State::Padding { start, end }, CharClass::Delimiter) => {
                return labeled(command, &command[start..end], &command[i + c.len_utf8()..]);
            }
            (_, CharClass::Stop) | (State::Padding { .. }, CharClass::Normal) => break,
        };
    }
    unlabeled(command)
}

fn labeled(command: &str, label: &str, statement: &str) -> Result<LabeledQuery, DumpError> {
    let statement = statement.trim();
    if statement.is_empty() {
        return Err(DumpError::invalid_argument(format!(
            "query must not be empty: {command:?}"
        )));
    }
    Ok(LabeledQuery {
        label: Some(label.to_string()),
        statement: statement.to_string(),
    })
}

fn unlabeled(command: &str) -> Result<LabeledQuery, DumpError> {
    let statement = command.trim();
    if statement.is_empty() {
        return Err(DumpError::invalid_argument("query must not be empty"));
    }
    Ok(LabeledQuery {
        label: None,
        statement: statement.to_string(),
    })
}
