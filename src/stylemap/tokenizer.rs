//! Tokenizer for the style-mapping language.
//!
//! A priority-ordered table of anchored patterns; at each position the
//! first matching rule wins. Whitespace is a real token because the
//! grammar uses it to separate the matcher from the output path.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Dot,
    Colon,
    Gt,
    Whitespace,
    Arrow,
    Equals,
    StartsWith,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    String,
    /// A string literal missing its closing quote; kept as its own kind so
    /// the parser reports it instead of hanging on a rule that never ends.
    UnterminatedString,
    Integer,
    Choice,
    Bang,
    End,
}

/// A single token. `value` borrows from the source; `position` is the byte
/// offset of the token start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub value: &'a str,
    pub position: usize,
}

/// No tokenizer rule matched the remaining input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised character {character:?} at position {position}")]
pub struct LexError {
    pub character: char,
    /// 1-based character position of the offending character.
    pub position: usize,
}

static RULES: LazyLock<Vec<(TokenKind, Regex)>> = LazyLock::new(|| {
    // Order matters: at each position the first matching rule wins, so
    // `=>` must precede `=`, and terminated strings must precede the
    // unterminated fallback.
    [
        (
            TokenKind::Identifier,
            r"^(?:[a-zA-Z\-_]|\\.)(?:[a-zA-Z0-9\-_]|\\.)*",
        ),
        (TokenKind::Dot, r"^\."),
        (TokenKind::Colon, r"^:"),
        (TokenKind::Gt, r"^>"),
        (TokenKind::Whitespace, r"^\s+"),
        (TokenKind::Arrow, r"^=>"),
        (TokenKind::Equals, r"^="),
        (TokenKind::StartsWith, r"^\^="),
        (TokenKind::OpenParen, r"^\("),
        (TokenKind::CloseParen, r"^\)"),
        (TokenKind::OpenBracket, r"^\["),
        (TokenKind::CloseBracket, r"^\]"),
        (TokenKind::String, r"^'(?:\\.|[^'])*'"),
        (TokenKind::UnterminatedString, r"^'(?:\\.|[^'])*"),
        (TokenKind::Integer, r"^[0-9]+"),
        (TokenKind::Choice, r"^\|"),
        (TokenKind::Bang, r"^!"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("valid token pattern")))
    .collect()
});

/// Tokenize a style-mapping source string. The returned sequence always
/// ends with an [`TokenKind::End`] token.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut tokens = Vec::new();
    let mut position = 0;

    while position < input.len() {
        let rest = &input[position..];
        let matched = RULES
            .iter()
            .find_map(|(kind, pattern)| pattern.find(rest).map(|found| (*kind, found.end())));

        match matched {
            Some((kind, length)) => {
                tokens.push(Token {
                    kind,
                    value: &rest[..length],
                    position,
                });
                position += length;
            }
            None => {
                let character = rest.chars().next().unwrap_or('\u{fffd}');
                return Err(LexError {
                    character,
                    position: input[..position].chars().count() + 1,
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::End,
        value: "",
        position,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .expect("tokenizes")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_simple_rule() {
        assert_eq!(
            kinds("p => h1"),
            vec![
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::Arrow,
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_suffixed_matcher() {
        assert_eq!(
            kinds("p.Heading1:ordered-list(2)"),
            vec![
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::OpenParen,
                TokenKind::Integer,
                TokenKind::CloseParen,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_identifiers_allow_escapes_and_trailing_digits() {
        let tokens = tokenize(r"p.Heading\.1").expect("tokenizes");
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].value, r"Heading\.1");
    }

    #[test]
    fn test_arrow_wins_over_equals() {
        assert_eq!(kinds("=>"), vec![TokenKind::Arrow, TokenKind::End]);
        assert_eq!(kinds("="), vec![TokenKind::Equals, TokenKind::End]);
        assert_eq!(kinds("^="), vec![TokenKind::StartsWith, TokenKind::End]);
    }

    #[test]
    fn test_string_with_escapes() {
        let tokens = tokenize(r"'it\'s'").expect("tokenizes");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, r"'it\'s'");
    }

    #[test]
    fn test_unterminated_string_is_its_own_kind() {
        let tokens = tokenize("'oops").expect("tokenizes");
        assert_eq!(tokens[0].kind, TokenKind::UnterminatedString);
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let tokens = tokenize("p => h1").expect("tokenizes");
        let positions: Vec<usize> = tokens.iter().map(|token| token.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 4, 5, 7]);
    }

    #[test]
    fn test_unrecognised_character_reports_position() {
        let error = tokenize("p => @h1").expect_err("lex error");
        assert_eq!(error.character, '@');
        assert_eq!(error.position, 6);
    }
}
