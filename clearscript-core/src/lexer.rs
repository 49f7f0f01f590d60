//! Lexer for ClearScript source text.
//!
//! The lexer is a lazy iterator over tokens. It fails fast: the first
//! malformed input yields an `Err` and the iterator ends there.

use crate::builtins::{Command, find_command};
use crate::error::CoreError;
use crate::span::Span;

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Special
    Eof,

    // Identifiers and literals
    Ident,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    /// Contents of a `raw { ... }` block, captured verbatim.
    Raw,

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Semi,     // ;
    Colon,    // :
    Question, // ?
    Dot,      // .

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Assign,     // =
    EqEq,       // ==
    NotEq,      // !=
    Lt,         // <
    Gt,         // >
    Le,         // <=
    Ge,         // >=
    AndAnd,     // &&
    OrOr,       // ||
    Bang,       // !
    PlusPlus,   // ++
    MinusMinus, // --

    // Keywords
    Int,
    Float,
    Const,
    Function,
    Method,
    Class,
    Struct,
    If,
    Else,
    While,
    For,
    Switch,
    Case,
    Default,
    Break,
    Goto,
    Label,
    Return,

    /// A built-in command name such as `wait` or `spawnbot`.
    Command(Command),
}

/// A single token with its kind, text and position.
///
/// For string literals `text` holds the unescaped contents; for raw
/// blocks it holds the exact text between the outer braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

/// Lex a whole source string, stopping at the first error.
///
/// The returned vector always ends with a single `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CoreError> {
    Lexer::new(source).collect()
}

/// Lazy token stream over a source string.
///
/// Yields tokens up to and including `Eof`, or up to and including the
/// first error. Re-lexing means constructing a new `Lexer`.
pub struct Lexer<'src> {
    source: &'src str,
    chars: &'src [u8],
    index: usize,
    line: u32,
    column: u32,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source,
            chars: source.as_bytes(),
            index: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    fn next_token(&mut self) -> Result<Token, CoreError> {
        self.skip_trivia()?;

        let span = self.span();
        let start = self.index;
        let Some(ch) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span,
            });
        };

        let kind = match ch {
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b',' => self.single(TokenKind::Comma),
            b';' => self.single(TokenKind::Semi),
            b':' => self.single(TokenKind::Colon),
            b'?' => self.single(TokenKind::Question),
            b'.' => self.single(TokenKind::Dot),
            b'*' => self.single(TokenKind::Star),
            b'/' => self.single(TokenKind::Slash),
            b'+' => self.one_or_two(b'+', TokenKind::Plus, TokenKind::PlusPlus),
            b'-' => self.one_or_two(b'-', TokenKind::Minus, TokenKind::MinusMinus),
            b'=' => self.one_or_two(b'=', TokenKind::Assign, TokenKind::EqEq),
            b'!' => self.one_or_two(b'=', TokenKind::Bang, TokenKind::NotEq),
            b'<' => self.one_or_two(b'=', TokenKind::Lt, TokenKind::Le),
            b'>' => self.one_or_two(b'=', TokenKind::Gt, TokenKind::Ge),
            b'&' if self.peek_next() == Some(b'&') => {
                self.consume_char();
                self.single(TokenKind::AndAnd)
            }
            b'|' if self.peek_next() == Some(b'|') => {
                self.consume_char();
                self.single(TokenKind::OrOr)
            }
            b'"' | b'\'' => return self.lex_string(span),
            b'0'..=b'9' => self.lex_number(),
            b'_' => {
                return Err(CoreError::lex(
                    span,
                    "identifiers may not start with '_' (reserved for compiler-generated names)",
                ));
            }
            _ if is_ident_start(ch) => {
                let kind = self.lex_ident_or_keyword();
                if kind == TokenKind::Raw {
                    return self.lex_raw_block(span);
                }
                kind
            }
            _ => return Err(self.unexpected_char(span)),
        };

        Ok(Token {
            kind,
            text: self.source[start..self.index].to_string(),
            span,
        })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.consume_char();
        kind
    }

    fn one_or_two(&mut self, second: u8, one: TokenKind, two: TokenKind) -> TokenKind {
        self.consume_char();
        if self.peek_char() == Some(second) {
            self.consume_char();
            two
        } else {
            one
        }
    }

    fn unexpected_char(&self, span: Span) -> CoreError {
        let found = self.source[self.index..].chars().next().unwrap_or('\0');
        CoreError::lex(span, format!("unexpected character '{found}'"))
    }

    fn skip_trivia(&mut self) -> Result<(), CoreError> {
        loop {
            match (self.peek_char(), self.peek_next()) {
                (Some(ch), _) if is_whitespace(ch) => self.consume_char(),
                (Some(b'/'), Some(b'/')) => {
                    while let Some(ch) = self.peek_char() {
                        if ch == b'\n' {
                            break;
                        }
                        self.consume_char();
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    let span = self.span();
                    self.consume_char();
                    self.consume_char();
                    loop {
                        match (self.peek_char(), self.peek_next()) {
                            (Some(b'*'), Some(b'/')) => {
                                self.consume_char();
                                self.consume_char();
                                break;
                            }
                            (Some(_), _) => self.consume_char(),
                            (None, _) => {
                                return Err(CoreError::lex(span, "unterminated block comment"));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Strings end up inside a `[...]` operand on a single listing line,
    /// so line breaks and `]` are rejected.
    fn lex_string(&mut self, span: Span) -> Result<Token, CoreError> {
        let quote = self.peek_char();
        self.consume_char();

        let mut text = String::new();
        let mut run_start = self.index;
        loop {
            match self.peek_char() {
                None | Some(b'\n') => {
                    return Err(CoreError::lex(span, "unterminated string literal"));
                }
                Some(ch) if Some(ch) == quote => {
                    text.push_str(&self.source[run_start..self.index]);
                    self.consume_char();
                    return Ok(Token {
                        kind: TokenKind::StringLiteral,
                        text,
                        span,
                    });
                }
                Some(b'\r') => {
                    return Err(CoreError::lex(self.span(), "strings cannot contain line breaks"));
                }
                Some(b']') => {
                    return Err(CoreError::lex(self.span(), "strings cannot contain ']'"));
                }
                Some(b'\\') => {
                    text.push_str(&self.source[run_start..self.index]);
                    let escape_span = self.span();
                    self.consume_char();
                    let escaped = match self.peek_char() {
                        Some(b't') => '\t',
                        Some(b'\\') => '\\',
                        Some(b'"') => '"',
                        Some(b'\'') => '\'',
                        Some(b'n' | b'r') => {
                            return Err(CoreError::lex(
                                escape_span,
                                "strings cannot contain line breaks",
                            ));
                        }
                        None => return Err(CoreError::lex(span, "unterminated string literal")),
                        Some(_) => {
                            return Err(CoreError::lex(escape_span, "unknown escape sequence"));
                        }
                    };
                    text.push(escaped);
                    self.consume_char();
                    run_start = self.index;
                }
                Some(_) => self.consume_char(),
            }
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        self.consume_digits();
        // A '.' only continues the number when a digit follows it.
        if self.peek_char() == Some(b'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.consume_char();
            self.consume_digits();
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn consume_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.consume_char();
        }
    }

    fn lex_ident_or_keyword(&mut self) -> TokenKind {
        let start = self.index;
        while self.peek_char().is_some_and(is_ident_continue) {
            self.consume_char();
        }
        let text = &self.source[start..self.index];

        match text {
            "int" => TokenKind::Int,
            "float" => TokenKind::Float,
            "const" => TokenKind::Const,
            "function" => TokenKind::Function,
            "method" => TokenKind::Method,
            "class" => TokenKind::Class,
            "struct" => TokenKind::Struct,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "break" => TokenKind::Break,
            "goto" => TokenKind::Goto,
            "label" => TokenKind::Label,
            "raw" => TokenKind::Raw,
            "return" => TokenKind::Return,
            _ => match find_command(text) {
                Some(descriptor) => TokenKind::Command(descriptor.command),
                None => TokenKind::Ident,
            },
        }
    }

    /// Captures the body of `raw { ... }` by brace balance alone.
    fn lex_raw_block(&mut self, span: Span) -> Result<Token, CoreError> {
        while self.peek_char().is_some_and(is_whitespace) {
            self.consume_char();
        }
        if self.peek_char() != Some(b'{') {
            return Err(CoreError::lex(self.span(), "expected '{' after 'raw'"));
        }
        self.consume_char();

        let content_start = self.index;
        let mut depth = 1usize;
        while let Some(ch) = self.peek_char() {
            match ch {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let text = self.source[content_start..self.index].to_string();
                        self.consume_char();
                        return Ok(Token {
                            kind: TokenKind::Raw,
                            text,
                            span,
                        });
                    }
                }
                _ => {}
            }
            self.consume_char();
        }
        Err(CoreError::lex(span, "unterminated raw block"))
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn peek_char(&self) -> Option<u8> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.chars.get(self.index + 1).copied()
    }

    fn consume_char(&mut self) {
        let Some(ch) = self.peek_char() else {
            return;
        };
        self.index += 1;
        if ch == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if !is_utf8_continuation(ch) {
            self.column += 1;
        }
        // Never stop inside a multi-byte character.
        while self.peek_char().is_some_and(is_utf8_continuation) {
            self.index += 1;
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        self.finished = match &result {
            Ok(token) => token.kind == TokenKind::Eof,
            Err(_) => true,
        };
        Some(result)
    }
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic()
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

fn is_utf8_continuation(ch: u8) -> bool {
    ch & 0b1100_0000 == 0b1000_0000
}
