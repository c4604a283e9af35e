//! Shell-style word splitting for verb-first commands.
//!
//! POSIX-like rules: whitespace separates words, single quotes are literal,
//! double quotes honour `\"` and `\\`, a bare backslash escapes the next
//! character, and adjacent quoted/unquoted pieces join into one word.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeError {
    UnterminatedQuote(char),
    TrailingEscape,
}

impl Display for TokenizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnterminatedQuote(quote) => write!(f, "no closing quotation `{quote}`"),
            Self::TrailingEscape => write!(f, "no escaped character"),
        }
    }
}

impl Error for TokenizeError {}

/// Splits `input` into words.
pub fn split_words(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut words = Vec::new();
    let mut current = String::new();
    // Distinguishes `""` (an empty word) from no word at all.
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(TokenizeError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(TokenizeError::UnterminatedQuote('"')),
                        },
                        Some(c) => current.push(c),
                        None => return Err(TokenizeError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(TokenizeError::TrailingEscape),
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}
