// Copyright (c) 2023 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions,
// more details in file LICENSE, LICENSE.additional and CONTRIBUTING.

//! Line shape helpers shared by both passes: label peeling and
//! first-token splitting.

/// Splits a leading label definition (`ident:` as the first token)
/// from a line. Returns the label name without the colon, and the rest
/// of the line with leading blanks removed. The name is returned as
/// written; validity and uniqueness are the caller's checks.
pub fn peel_label(line: &str) -> (Option<&str>, &str) {
    let trimmed = line.trim_start();
    let token_end = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    let token = &trimmed[..token_end];

    match token.strip_suffix(':') {
        Some(name) => {
            let rest = trimmed[token_end..].trim_start();
            (Some(name), rest)
        }
        None => (None, trimmed),
    }
}

/// First whitespace token and the remainder after it.
pub fn split_first_token(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let token_end = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    Some((&trimmed[..token_end], trimmed[token_end..].trim_start()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_peel_label() {
        assert_eq!(peel_label("LOOP: mov r1, r2"), (Some("LOOP"), "mov r1, r2"));
        assert_eq!(peel_label("  DAT: .data 5"), (Some("DAT"), ".data 5"));
        assert_eq!(peel_label("mov r1, r2"), (None, "mov r1, r2"));
        assert_eq!(peel_label("END:"), (Some("END"), ""));
        assert_eq!(peel_label(":"), (Some(""), ""));
    }

    #[test]
    fn test_label_must_be_first_token() {
        // a colon further down the line is not a label definition
        assert_eq!(peel_label(".string \"a:\""), (None, ".string \"a:\""));
    }

    #[test]
    fn test_split_first_token() {
        assert_eq!(split_first_token("mov r1, r2"), Some(("mov", "r1, r2")));
        assert_eq!(split_first_token(".data 5"), Some((".data", "5")));
        assert_eq!(split_first_token("stop"), Some(("stop", "")));
        assert_eq!(split_first_token("   "), None);
    }
}
