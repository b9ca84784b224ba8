// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! Directive payload parsing.
//!
//! `.data`, `.string` and `.mat` produce the words that land in the
//! data image (value range checking against the machine word is the
//! consumer's job); `.entry` and `.extern` produce a label name.

use thiserror::Error;

use crate::{is_name_valid, trim_bracket_spaces};

#[derive(Debug, Error, PartialEq)]
pub enum DirectiveError {
    #[error("data declaration error: no numeric value provided.")]
    MissingValues,

    #[error("data declaration error: no numeric value after the '+' or '-' sign.")]
    SignWithoutDigit,

    #[error("data declaration error: unexpected token while expecting a numeric value.")]
    ExpectedNumber,

    #[error("data declaration error: missing comma sign ',' after a number.")]
    MissingSeparator,

    #[error("data declaration error: unnecessary comma sign ',' at the end of the line.")]
    DanglingComma,

    #[error("data declaration error: floating point values are not supported.")]
    FloatValue,

    #[error("data declaration error: unexpected letter inside a numeric value.")]
    LetterInNumber,

    #[error("string declaration error: string not found.")]
    StringMissing,

    #[error("string declaration error: expected opening quotes '\"' at the beginning of the string.")]
    StringMissingOpenQuote,

    #[error("string declaration error: illegal character found in the string.")]
    StringIllegalChar,

    #[error("string declaration error: expected closing quotes '\"' at the end of the string.")]
    StringMissingCloseQuote,

    #[error("string declaration error: unexpected token found after the string.")]
    StringTrailingJunk,

    #[error("matrix declaration error: the size definition [rows][cols] is missing.")]
    MatrixMissingSize,

    #[error("matrix declaration error: invalid size definition, expected [rows][cols].")]
    MatrixBadSize,

    #[error("matrix declaration error: rows and columns cannot be zero.")]
    MatrixZeroDimension,

    #[error("matrix declaration error: too many values for the declared dimensions.")]
    MatrixTooManyValues,

    #[error("entry directive error: label name not found.")]
    EntryMissingLabel,

    #[error("entry directive error: illegal label name \"{0}\".")]
    EntryBadLabel(String),

    #[error("entry directive error: unexpected token after the label name.")]
    EntryTrailingJunk,

    #[error("extern directive error: external label name not found.")]
    ExternMissingLabel,

    #[error("extern directive error: invalid label name \"{0}\".")]
    ExternBadLabel(String),

    #[error("extern directive error: unexpected token after the label name.")]
    ExternTrailingJunk,
}

/// `.data` payload: one or more signed integers separated by single
/// commas.
pub fn parse_data(field: &str) -> Result<Vec<i64>, DirectiveError> {
    let values = extract_numbers(field)?;
    if values.is_empty() {
        return Err(DirectiveError::MissingValues);
    }
    Ok(values)
}

/// `.string` payload: a double-quoted run of alphanumeric characters
/// and blanks. Produces one word per character plus a terminating 0.
pub fn parse_string(field: &str) -> Result<Vec<i64>, DirectiveError> {
    let trimmed = field.trim_start();
    if trimmed.is_empty() {
        return Err(DirectiveError::StringMissing);
    }

    let body = trimmed
        .strip_prefix('"')
        .ok_or(DirectiveError::StringMissingOpenQuote)?;

    let mut words: Vec<i64> = vec![];
    let mut rest: Option<&str> = None;
    for (index, c) in body.char_indices() {
        if c == '"' {
            rest = Some(&body[index + 1..]);
            break;
        }
        if c.is_ascii_alphanumeric() || c.is_whitespace() {
            words.push(i64::from(c as u32));
        } else {
            return Err(DirectiveError::StringIllegalChar);
        }
    }

    let rest = rest.ok_or(DirectiveError::StringMissingCloseQuote)?;
    if !rest.trim().is_empty() {
        return Err(DirectiveError::StringTrailingJunk);
    }

    words.push(0);
    Ok(words)
}

/// `.mat` payload: a `[rows][cols]` size declaration, then up to
/// rows*cols integers; missing cells are filled with zeros.
pub fn parse_matrix(field: &str) -> Result<Vec<i64>, DirectiveError> {
    let cleaned = trim_bracket_spaces(field.trim_start());
    let mut tokens = cleaned.splitn(2, char::is_whitespace);
    let size_token = tokens.next().unwrap_or("");
    let values_field = tokens.next().unwrap_or("");

    if size_token.is_empty() || !size_token.starts_with('[') {
        return Err(DirectiveError::MatrixMissingSize);
    }
    let (rows, cols) = parse_matrix_size(size_token).ok_or(DirectiveError::MatrixBadSize)?;
    if rows == 0 || cols == 0 {
        return Err(DirectiveError::MatrixZeroDimension);
    }

    let cell_count = rows * cols;
    let mut values = extract_numbers(values_field)?;
    if values.len() > cell_count {
        return Err(DirectiveError::MatrixTooManyValues);
    }
    values.resize(cell_count, 0);
    Ok(values)
}

fn parse_matrix_size(token: &str) -> Option<(usize, usize)> {
    let rest = token.strip_prefix('[')?;
    let close = rest.find(']')?;
    let rows: usize = parse_dimension(&rest[..close])?;

    let rest = rest[close + 1..].strip_prefix('[')?;
    let close = rest.find(']')?;
    let cols: usize = parse_dimension(&rest[..close])?;

    if !rest[close + 1..].is_empty() {
        return None;
    }
    Some((rows, cols))
}

fn parse_dimension(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// `.entry` payload: exactly one well-formed label name.
pub fn parse_entry_label(field: &str) -> Result<String, DirectiveError> {
    let mut tokens = field.split_whitespace();
    let name = tokens.next().ok_or(DirectiveError::EntryMissingLabel)?;
    if !is_name_valid(name) {
        return Err(DirectiveError::EntryBadLabel(name.to_string()));
    }
    if tokens.next().is_some() {
        return Err(DirectiveError::EntryTrailingJunk);
    }
    Ok(name.to_string())
}

/// `.extern` payload: exactly one well-formed label name. Whether the
/// name is still free is checked against the symbol and macro tables
/// by the caller.
pub fn parse_extern_label(field: &str) -> Result<String, DirectiveError> {
    let mut tokens = field.split_whitespace();
    let name = tokens.next().ok_or(DirectiveError::ExternMissingLabel)?;
    if !is_name_valid(name) {
        return Err(DirectiveError::ExternBadLabel(name.to_string()));
    }
    if tokens.next().is_some() {
        return Err(DirectiveError::ExternTrailingJunk);
    }
    Ok(name.to_string())
}

/// Walks a comma separated list of signed integers. An empty field is
/// not an error here; each caller decides whether it may be empty.
fn extract_numbers(field: &str) -> Result<Vec<i64>, DirectiveError> {
    enum Expect {
        Number,
        Separator,
    }

    let mut values: Vec<i64> = vec![];
    let mut chars = field.chars().peekable();
    let mut expect = Expect::Number;

    while chars.peek().is_some() {
        match expect {
            Expect::Number => {
                while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                    chars.next();
                }
                if chars.peek().is_none() {
                    if values.is_empty() {
                        // nothing at all: an empty payload, not a format error
                        return Ok(values);
                    }
                    return Err(DirectiveError::DanglingComma);
                }

                let mut buffer = String::new();
                if matches!(chars.peek(), Some('+') | Some('-')) {
                    let sign = chars.next().unwrap();
                    if !matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
                        return Err(DirectiveError::SignWithoutDigit);
                    }
                    if sign == '-' {
                        buffer.push(sign);
                    }
                }
                if !matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
                    return Err(DirectiveError::ExpectedNumber);
                }
                while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
                    buffer.push(chars.next().unwrap());
                }
                match chars.peek() {
                    Some('.') => return Err(DirectiveError::FloatValue),
                    Some(c) if c.is_ascii_alphabetic() => {
                        return Err(DirectiveError::LetterInNumber)
                    }
                    _ => {}
                }

                // a long digit run saturates; the word range check
                // downstream rejects it either way
                let value = buffer.parse::<i64>().unwrap_or(if buffer.starts_with('-') {
                    i64::MIN
                } else {
                    i64::MAX
                });
                values.push(value);
                expect = Expect::Separator;
            }

            Expect::Separator => {
                while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                    chars.next();
                }
                match chars.peek() {
                    None => break,
                    Some(',') => {
                        chars.next();
                        expect = Expect::Number;
                    }
                    Some(_) => return Err(DirectiveError::MissingSeparator),
                }
            }
        }
    }

    if matches!(expect, Expect::Number) && !values.is_empty() {
        return Err(DirectiveError::DanglingComma);
    }
    Ok(values)
}
