//! Grammar for the style-mapping language.
//!
//! A rule is `<document-matcher> <ws> => (<ws> <html-path>)?`. The matcher
//! side names an element kind with optional suffixes; the path side is a
//! `>`-separated chain of element specs, `!` for ignore, or nothing for
//! the empty (pass-through) path.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::document::{BreakType, NumberingLevel};
use crate::html::{ElementSpec, HtmlPath};
use crate::stylemap::matcher::{BlockMatcher, DocumentMatcher, StringMatcher, StringOperator};
use crate::stylemap::tokenizer::{tokenize, LexError, Token, TokenKind};
use crate::stylemap::StyleRule;

/// A grammar expectation was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {position}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset of the first unmatched token.
    pub position: usize,
}

/// Why a style-mapping rule failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRuleError {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Parse(#[from] ParseError),
}

/// Parse a single style-mapping rule.
pub fn parse_style_rule(source: &str) -> Result<StyleRule, ParseRuleError> {
    let tokens = tokenize(source)?;
    let mut stream = TokenStream::new(&tokens);

    let matcher = parse_document_matcher(&mut stream)?;
    stream.expect(TokenKind::Whitespace)?;
    stream.expect(TokenKind::Arrow)?;
    let path = if stream.eat(TokenKind::Whitespace) {
        parse_html_path(&mut stream)?
    } else {
        HtmlPath::empty()
    };
    stream.expect(TokenKind::End)?;

    Ok(StyleRule { matcher, path })
}

struct TokenStream<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
}

impl<'a> TokenStream<'a> {
    fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// The tokenizer guarantees a trailing End token, so peeking clamps
    /// to the last token.
    fn peek(&self) -> Token<'a> {
        self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek();
        self.position += 1;
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, ParseError> {
        let token = self.peek();
        if token.kind == kind {
            self.position += 1;
            Ok(token)
        } else {
            Err(unexpected(&token, describe_kind(kind)))
        }
    }

    fn checkpoint(&self) -> usize {
        self.position
    }

    fn rewind(&mut self, checkpoint: usize) {
        self.position = checkpoint;
    }
}

fn unexpected(token: &Token<'_>, expected: &str) -> ParseError {
    ParseError {
        message: format!("expected {expected} but got {}", describe_token(token)),
        position: token.position,
    }
}

fn describe_kind(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Identifier => "identifier",
        TokenKind::Dot => "`.`",
        TokenKind::Colon => "`:`",
        TokenKind::Gt => "`>`",
        TokenKind::Whitespace => "whitespace",
        TokenKind::Arrow => "`=>`",
        TokenKind::Equals => "`=`",
        TokenKind::StartsWith => "`^=`",
        TokenKind::OpenParen => "`(`",
        TokenKind::CloseParen => "`)`",
        TokenKind::OpenBracket => "`[`",
        TokenKind::CloseBracket => "`]`",
        TokenKind::String => "string",
        TokenKind::UnterminatedString => "string",
        TokenKind::Integer => "integer",
        TokenKind::Choice => "`|`",
        TokenKind::Bang => "`!`",
        TokenKind::End => "end of input",
    }
}

fn describe_token(token: &Token<'_>) -> String {
    match token.kind {
        TokenKind::End => "end of input".to_string(),
        TokenKind::UnterminatedString => "unterminated string".to_string(),
        _ => format!("`{}`", token.value),
    }
}

fn parse_document_matcher(stream: &mut TokenStream<'_>) -> Result<DocumentMatcher, ParseError> {
    let token = stream.peek();
    if token.kind != TokenKind::Identifier {
        return Err(unexpected(&token, "document matcher"));
    }
    stream.advance();

    match token.value {
        "p" => Ok(DocumentMatcher::Paragraph(parse_block_options(
            stream, true,
        )?)),
        "r" => Ok(DocumentMatcher::Run(parse_block_options(stream, true)?)),
        "table" => Ok(DocumentMatcher::Table(parse_block_options(stream, false)?)),
        "b" => Ok(DocumentMatcher::Bold),
        "i" => Ok(DocumentMatcher::Italic),
        "u" => Ok(DocumentMatcher::Underline),
        "strike" => Ok(DocumentMatcher::Strikethrough),
        "small-caps" => Ok(DocumentMatcher::SmallCaps),
        "comment-reference" => Ok(DocumentMatcher::CommentReference),
        "br" => parse_break_matcher(stream),
        _ => Err(ParseError {
            message: format!("unrecognised document matcher `{}`", token.value),
            position: token.position,
        }),
    }
}

/// Suffixes may come in any order; a repeated suffix kind overwrites the
/// earlier one.
fn parse_block_options(
    stream: &mut TokenStream<'_>,
    allow_list: bool,
) -> Result<BlockMatcher, ParseError> {
    let mut options = BlockMatcher::default();
    loop {
        if stream.eat(TokenKind::Dot) {
            let token = stream.expect(TokenKind::Identifier)?;
            options.style_id = Some(unescape_identifier(token.value));
        } else if stream.peek().kind == TokenKind::OpenBracket {
            options.style_name = Some(parse_style_name_constraint(stream)?);
        } else if allow_list && stream.peek().kind == TokenKind::Colon {
            options.numbering = Some(parse_list_selector(stream)?);
        } else {
            return Ok(options);
        }
    }
}

fn parse_style_name_constraint(stream: &mut TokenStream<'_>) -> Result<StringMatcher, ParseError> {
    stream.expect(TokenKind::OpenBracket)?;
    let key = stream.expect(TokenKind::Identifier)?;
    if key.value != "style-name" {
        return Err(ParseError {
            message: format!("unrecognised matcher attribute `{}`", key.value),
            position: key.position,
        });
    }
    let operator_token = stream.advance();
    let operator = match operator_token.kind {
        TokenKind::Equals => StringOperator::EqualTo,
        TokenKind::StartsWith => StringOperator::StartsWith,
        _ => return Err(unexpected(&operator_token, "`=` or `^=`")),
    };
    let value = stream.expect(TokenKind::String)?;
    stream.expect(TokenKind::CloseBracket)?;
    Ok(StringMatcher {
        operator,
        value: unescape_string(value.value),
    })
}

fn parse_list_selector(stream: &mut TokenStream<'_>) -> Result<NumberingLevel, ParseError> {
    stream.expect(TokenKind::Colon)?;
    let kind = stream.expect(TokenKind::Identifier)?;
    let is_ordered = match kind.value {
        "ordered-list" => true,
        "unordered-list" => false,
        _ => {
            return Err(ParseError {
                message: format!("unrecognised list selector `{}`", kind.value),
                position: kind.position,
            });
        }
    };
    stream.expect(TokenKind::OpenParen)?;
    let level = stream.expect(TokenKind::Integer)?;
    let level_number: usize = level.value.parse().map_err(|_| ParseError {
        message: format!("invalid list level `{}`", level.value),
        position: level.position,
    })?;
    // Levels are written 1-based; the matcher stores the 0-based index.
    let level_index = level_number.checked_sub(1).ok_or_else(|| ParseError {
        message: "list level must be at least 1".to_string(),
        position: level.position,
    })?;
    stream.expect(TokenKind::CloseParen)?;
    Ok(NumberingLevel {
        level_index,
        is_ordered,
    })
}

fn parse_break_matcher(stream: &mut TokenStream<'_>) -> Result<DocumentMatcher, ParseError> {
    stream.expect(TokenKind::OpenBracket)?;
    let key = stream.expect(TokenKind::Identifier)?;
    if key.value != "type" {
        return Err(ParseError {
            message: format!("unrecognised matcher attribute `{}`", key.value),
            position: key.position,
        });
    }
    stream.expect(TokenKind::Equals)?;
    let value_token = stream.expect(TokenKind::String)?;
    stream.expect(TokenKind::CloseBracket)?;

    match unescape_string(value_token.value).as_str() {
        "line" => Ok(DocumentMatcher::Break(BreakType::Line)),
        "page" => Ok(DocumentMatcher::Break(BreakType::Page)),
        "column" => Ok(DocumentMatcher::Break(BreakType::Column)),
        other => Err(ParseError {
            message: format!("unrecognised break type `{other}`"),
            position: value_token.position,
        }),
    }
}

fn parse_html_path(stream: &mut TokenStream<'_>) -> Result<HtmlPath, ParseError> {
    if stream.eat(TokenKind::Bang) {
        return Ok(HtmlPath::Ignore);
    }

    let mut elements = Vec::new();
    if stream.peek().kind == TokenKind::Identifier {
        elements.push(parse_element_spec(stream)?);
        loop {
            let checkpoint = stream.checkpoint();
            if stream.eat(TokenKind::Whitespace)
                && stream.eat(TokenKind::Gt)
                && stream.eat(TokenKind::Whitespace)
            {
                elements.push(parse_element_spec(stream)?);
            } else {
                stream.rewind(checkpoint);
                break;
            }
        }
    }
    Ok(HtmlPath::Elements(elements))
}

fn parse_element_spec(stream: &mut TokenStream<'_>) -> Result<ElementSpec, ParseError> {
    let first = stream.expect(TokenKind::Identifier)?;
    let mut tag_names = vec![unescape_identifier(first.value)];
    while stream.eat(TokenKind::Choice) {
        let name = stream.expect(TokenKind::Identifier)?;
        tag_names.push(unescape_identifier(name.value));
    }

    let mut class_names: Vec<String> = Vec::new();
    let mut fresh = false;
    let mut separator = String::new();
    loop {
        if stream.eat(TokenKind::Dot) {
            let class_name = stream.expect(TokenKind::Identifier)?;
            class_names.push(unescape_identifier(class_name.value));
        } else if stream.peek().kind == TokenKind::Colon {
            stream.advance();
            let property = stream.expect(TokenKind::Identifier)?;
            match property.value {
                "fresh" => fresh = true,
                "separator" => {
                    stream.expect(TokenKind::OpenParen)?;
                    let value = stream.expect(TokenKind::String)?;
                    separator = unescape_string(value.value);
                    stream.expect(TokenKind::CloseParen)?;
                }
                _ => {
                    return Err(ParseError {
                        message: format!("unrecognised element property `{}`", property.value),
                        position: property.position,
                    });
                }
            }
        } else {
            break;
        }
    }

    let mut attributes = BTreeMap::new();
    if !class_names.is_empty() {
        attributes.insert("class".to_string(), class_names.join(" "));
    }

    Ok(ElementSpec {
        tag_names,
        attributes,
        fresh,
        separator,
    })
}

/// Strip the backslash from escaped characters in an identifier.
fn unescape_identifier(value: &str) -> String {
    unescape(value)
}

/// Strip the surrounding quotes and decode backslash escapes. `\n`, `\r`
/// and `\t` map to their control characters; any other escaped character
/// maps to itself.
fn unescape_string(value: &str) -> String {
    unescape(&value[1..value.len() - 1])
}

fn unescape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut characters = value.chars();
    while let Some(character) = characters.next() {
        if character == '\\' {
            match characters.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some(other) => result.push(other),
                None => result.push('\\'),
            }
        } else {
            result.push(character);
        }
    }
    result
}
