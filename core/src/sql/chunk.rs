use std::borrow::Cow;
use std::fmt::Write;

use compact_str::CompactString;

use super::Token;
use crate::value::Value;

/// A SQL chunk represents a part of an SQL statement.
///
/// - `Token` - SQL keywords and operators (SELECT, FROM, =, etc.)
/// - `Ident` - Quoted identifiers ("table_name", "alias")
/// - `Raw` - Unquoted raw SQL text (function names, numeric literals)
/// - `Param` - Positional parameter with its bound value
/// - `Column` - Alias-qualified column reference
#[derive(Debug, Clone, PartialEq)]
pub enum SQLChunk {
    /// SQL keywords and operators: SELECT, FROM, WHERE, =, AND, etc.
    Token(Token),

    /// Quoted identifier for table names and aliases
    /// Renders as: "name"
    Ident(Cow<'static, str>),

    /// Raw SQL text (unquoted)
    /// Renders as: text, as-is
    Raw(Cow<'static, str>),

    /// Parameter with its value
    /// Renders as: ?
    Param(Value),

    /// Column qualified by the alias of the entity it belongs to
    /// Renders as: "alias"."column"
    Column {
        qualifier: CompactString,
        name: &'static str,
    },
}

impl SQLChunk {
    /// Creates a token chunk - const
    #[inline]
    pub const fn token(t: Token) -> Self {
        Self::Token(t)
    }

    /// Creates a quoted identifier from a static string - const
    #[inline]
    pub const fn ident_static(name: &'static str) -> Self {
        Self::Ident(Cow::Borrowed(name))
    }

    /// Creates raw SQL text from a static string - const
    #[inline]
    pub const fn raw_static(text: &'static str) -> Self {
        Self::Raw(Cow::Borrowed(text))
    }

    /// Creates a quoted identifier from a runtime string
    #[inline]
    pub fn ident(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Ident(name.into())
    }

    /// Creates raw SQL text from a runtime string
    #[inline]
    pub fn raw(text: impl Into<Cow<'static, str>>) -> Self {
        Self::Raw(text.into())
    }

    /// Write chunk content to buffer
    pub(crate) fn write(&self, buf: &mut impl Write) {
        match self {
            SQLChunk::Token(token) => {
                let _ = buf.write_str(token.as_str());
            }
            SQLChunk::Ident(name) => write_quoted(buf, name),
            SQLChunk::Raw(text) => {
                let _ = buf.write_str(text);
            }
            SQLChunk::Param(_) => {
                let _ = buf.write_char('?');
            }
            SQLChunk::Column { qualifier, name } => {
                write_quoted(buf, qualifier);
                let _ = buf.write_char('.');
                write_quoted(buf, name);
            }
        }
    }

    /// Check if this chunk is "word-like" (needs space separation from other word-like chunks)
    #[inline]
    pub(crate) const fn is_word_like(&self) -> bool {
        match self {
            SQLChunk::Token(t) => !matches!(
                t,
                Token::LPAREN
                    | Token::RPAREN
                    | Token::COMMA
                    | Token::SEMI
                    | Token::DOT
                    | Token::EQ
                    | Token::NE
                    | Token::LT
                    | Token::GT
                    | Token::LE
                    | Token::GE
            ),
            SQLChunk::Ident(_) | SQLChunk::Raw(_) | SQLChunk::Param(_) | SQLChunk::Column { .. } => {
                true
            }
        }
    }
}

/// Writes `name` as a double-quoted identifier, doubling embedded quotes.
fn write_quoted(buf: &mut impl Write, name: &str) {
    let _ = buf.write_char('"');
    for (i, part) in name.split('"').enumerate() {
        if i > 0 {
            let _ = buf.write_str("\"\"");
        }
        let _ = buf.write_str(part);
    }
    let _ = buf.write_char('"');
}

impl From<Token> for SQLChunk {
    #[inline]
    fn from(value: Token) -> Self {
        SQLChunk::Token(value)
    }
}

impl From<Value> for SQLChunk {
    #[inline]
    fn from(value: Value) -> Self {
        SQLChunk::Param(value)
    }
}
