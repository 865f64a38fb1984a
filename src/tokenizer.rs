use std::collections::HashSet;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ParseError;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^\p{L}[\p{L}\p{N}_]*").unwrap();
    static ref NUMBER: Regex = Regex::new(r"^-?\d+(?:\.\d*)?").unwrap();
    static ref KEYWORDS: HashSet<&'static str> = [
        "USE", "CREATE", "DATABASE", "TABLE", "DROP", "ALTER", "ADD", "INSERT", "INTO",
        "VALUES", "SELECT", "FROM", "WHERE", "UPDATE", "SET", "DELETE", "JOIN", "AND", "ON",
        "OR", "LIKE", "TRUE", "FALSE", "NULL",
    ]
    .into_iter()
    .collect();
}

/// Returns true if `word` is a reserved keyword, ignoring case.
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word.to_ascii_uppercase().as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    StringLiteral,
    Number,
    Operator,
    Comma,
    Semicolon,
    LeftParen,
    RightParen,
    Star,
    Eof,
}

/// A lexical unit. Keywords carry their upper-cased text, string literals
/// carry the text between the quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value == keyword
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            _ => write!(f, "'{}'", self.value),
        }
    }
}

/// Splits a statement into tokens, always ending with an `Eof` token.
///
/// Characters that start no token are skipped rather than rejected; only an
/// unterminated string literal or a `!` not followed by `=` is an error.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(c) = input[pos..].chars().next() {
        let rest = &input[pos..];

        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        if let Some(m) = IDENTIFIER.find(rest) {
            let word = m.as_str();
            let upper = word.to_ascii_uppercase();
            if KEYWORDS.contains(upper.as_str()) {
                tokens.push(Token::new(TokenKind::Keyword, upper));
            } else {
                tokens.push(Token::new(TokenKind::Identifier, word));
            }
            pos += m.end();
            continue;
        }

        if let Some(m) = NUMBER.find(rest) {
            tokens.push(Token::new(TokenKind::Number, m.as_str()));
            pos += m.end();
            continue;
        }

        if c == '\'' {
            let body = &rest[1..];
            let end = body.find('\'').ok_or(ParseError::UnterminatedString(pos))?;
            tokens.push(Token::new(TokenKind::StringLiteral, &body[..end]));
            pos += end + 2;
            continue;
        }

        let next = rest[c.len_utf8()..].chars().next();
        let (token, width) = match (c, next) {
            (',', _) => (Some(Token::new(TokenKind::Comma, ",")), 1),
            (';', _) => (Some(Token::new(TokenKind::Semicolon, ";")), 1),
            ('(', _) => (Some(Token::new(TokenKind::LeftParen, "(")), 1),
            (')', _) => (Some(Token::new(TokenKind::RightParen, ")")), 1),
            ('*', _) => (Some(Token::new(TokenKind::Star, "*")), 1),
            ('=', Some('=')) => (Some(Token::new(TokenKind::Operator, "==")), 2),
            ('=', _) => (Some(Token::new(TokenKind::Operator, "=")), 1),
            ('!', Some('=')) => (Some(Token::new(TokenKind::Operator, "!=")), 2),
            ('!', _) => return Err(ParseError::InvalidCharacter('!', pos)),
            ('>', Some('=')) => (Some(Token::new(TokenKind::Operator, ">=")), 2),
            ('>', _) => (Some(Token::new(TokenKind::Operator, ">")), 1),
            ('<', Some('=')) => (Some(Token::new(TokenKind::Operator, "<=")), 2),
            ('<', _) => (Some(Token::new(TokenKind::Operator, "<")), 1),
            _ => (None, c.len_utf8()),
        };

        if let Some(token) = token {
            tokens.push(token);
        }
        pos += width;
    }

    tokens.push(Token::new(TokenKind::Eof, ""));
    Ok(tokens)
}
