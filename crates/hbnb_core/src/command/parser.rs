//! Line -> `Input` normalization for both command grammars.

use super::literal::{parse_mapping, speculate_literal, LiteralError};
use super::tokenize::{split_words, TokenizeError};
use super::{Command, CommandError, Input, Syntax, UpdateArgs, Verb};
use crate::model::value::AttrPairs;
use once_cell::sync::Lazy;
use regex::Regex;

static CALL_STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\.(\w+)\((.*)\)$").expect("valid call-style regex"));

/// Parses one input line.
///
/// # Errors
/// - `UnknownSyntax` when the line is neither a known verb-first command
///   nor a well-formed `Type.verb(args)` call, or has unbalanced quoting.
pub fn parse_line(line: &str) -> Result<Input, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Input::Empty);
    }

    let (word, rest) = match trimmed.find(char::is_whitespace) {
        Some(index) => (&trimmed[..index], trimmed[index..].trim_start()),
        None => (trimmed, ""),
    };

    match word {
        "quit" => Ok(Input::Quit),
        "EOF" => Ok(Input::EndOfInput),
        "help" => Ok(Input::Help(rest.split_whitespace().next().map(str::to_string))),
        _ => match Verb::parse(word) {
            Some(verb) => parse_verb_first(verb, rest, trimmed).map(Input::Command),
            None => parse_call_style(trimmed).map(Input::Command),
        },
    }
}

fn parse_verb_first(verb: Verb, rest: &str, line: &str) -> Result<Command, CommandError> {
    let unknown = |_: TokenizeError| CommandError::UnknownSyntax(line.to_string());

    if verb == Verb::Update {
        if let Some(brace) = unquoted_brace(rest) {
            let words = split_words(&rest[..brace]).map_err(unknown)?;
            let mut words = words.into_iter();
            return Ok(Command {
                verb,
                syntax: Syntax::VerbFirst,
                type_name: words.next(),
                id: words.next().and_then(|id| clean_field(&id)),
                update: UpdateArgs::Dictionary(dictionary_literal(&rest[brace..])),
            });
        }
    }

    let mut words = split_words(rest).map_err(unknown)?.into_iter();
    let type_name = words.next();
    let id = words.next();
    let update = if verb == Verb::Update {
        UpdateArgs::Positional {
            name: words.next(),
            value: words.next().map(|value| speculate_literal(&value)),
        }
    } else {
        UpdateArgs::None
    };

    Ok(Command {
        verb,
        syntax: Syntax::VerbFirst,
        type_name,
        id,
        update,
    })
}

fn parse_call_style(line: &str) -> Result<Command, CommandError> {
    let unknown = || CommandError::UnknownSyntax(line.to_string());

    let captures = CALL_STYLE_RE.captures(line).ok_or_else(unknown)?;
    let verb = Verb::parse(&captures[2]).ok_or_else(unknown)?;
    let type_name = Some(captures[1].to_string());
    let args = &captures[3];

    let (id, update) = if verb == Verb::Update {
        parse_update_args(args)
    } else {
        let id = args.split(',').next().and_then(clean_field);
        (id, UpdateArgs::None)
    };

    Ok(Command {
        verb,
        syntax: Syntax::CallStyle,
        type_name,
        id,
        update,
    })
}

/// Byte offset of the first `{` outside shell quoting. Quote and escape
/// rules match `tokenize::split_words`.
fn unquoted_brace(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => {}
            (_, '\\') => escaped = true,
            (Some('"'), '"') => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '{') => return Some(index),
            (None, _) => {}
        }
    }
    None
}

/// Splits call-style update arguments into the id and payload.
///
/// With a `{...}` span, the text before it is the id and the span is a
/// mapping literal. Otherwise up to three comma-separated fields give id,
/// attribute name and value; the value keeps any further commas.
fn parse_update_args(args: &str) -> (Option<String>, UpdateArgs) {
    if let Some(brace) = args.find('{') {
        let id = clean_field(&args[..brace]);
        return (id, UpdateArgs::Dictionary(dictionary_literal(&args[brace..])));
    }

    let mut fields = args.splitn(3, ',');
    let id = fields.next().and_then(clean_field);
    let name = fields.next().and_then(clean_field);
    let value = fields
        .next()
        .and_then(clean_field)
        .map(|value| speculate_literal(&value));
    (id, UpdateArgs::Positional { name, value })
}

/// Parses the mapping literal starting at `text`'s opening brace and ending
/// at its last closing brace; anything after that is ignored.
fn dictionary_literal(text: &str) -> Result<AttrPairs, LiteralError> {
    let end = text.rfind('}').ok_or(LiteralError::UnexpectedEnd)?;
    parse_mapping(&text[..=end])
}

/// Strips surrounding whitespace, quotes and commas; empty becomes `None`.
fn clean_field(field: &str) -> Option<String> {
    let cleaned = field.trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | ','));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_field, unquoted_brace};

    #[test]
    fn clean_field_strips_quotes_commas_and_space() {
        assert_eq!(clean_field(r#" "abc-123", "#).as_deref(), Some("abc-123"));
        assert_eq!(clean_field(" 'x' ").as_deref(), Some("x"));
        assert_eq!(clean_field(r#""it's""#).as_deref(), Some("it's"));
        assert_eq!(clean_field(r#" "" "#), None);
        assert_eq!(clean_field(""), None);
    }

    #[test]
    fn braces_inside_quotes_do_not_start_a_mapping() {
        assert_eq!(unquoted_brace(r#"User 1 {"a": 1}"#), Some(7));
        assert_eq!(unquoted_brace(r#"User 1 bio "likes {curly} braces""#), None);
        assert_eq!(unquoted_brace("User 1 bio 'a {b}'"), None);
        assert_eq!(unquoted_brace(r#"User 1 bio "say \"{\"""#), None);
        assert_eq!(unquoted_brace(r"User 1 bio \{x"), None);
    }
}
