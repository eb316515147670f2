// ABOUTME: Two-mode lexer splitting template source into literal text and action tokens
// ABOUTME: Handles trim markers, comments, string escapes, numbers, fields, and variables

use super::ast::Span;
use super::error::{ParseError, ParseResult};

/// Opening delimiter of a template action.
pub const LEFT_DELIM: &str = "{{";
/// Closing delimiter of a template action.
pub const RIGHT_DELIM: &str = "}}";

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Literal text between actions.
    Text(String),
    LeftDelim,
    RightDelim,
    If,
    Else,
    End,
    Range,
    Nil,
    True,
    False,
    /// A function name.
    Ident(String),
    /// A single field segment, the name after the dot.
    Field(String),
    /// A variable name, including the leading `$`.
    Variable(String),
    Int(i64),
    Float(f64),
    Str(String),
    /// The bare cursor `.`.
    Dot,
    Pipe,
    Comma,
    LParen,
    RParen,
    /// `:=`
    Declare,
    /// `=`
    Assign,
    Eof,
}

impl TokenKind {
    /// Human-readable name used in parse error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Text(_) => "text",
            TokenKind::LeftDelim => "\"{{\"",
            TokenKind::RightDelim => "\"}}\"",
            TokenKind::If => "\"if\"",
            TokenKind::Else => "\"else\"",
            TokenKind::End => "\"end\"",
            TokenKind::Range => "\"range\"",
            TokenKind::Nil => "\"nil\"",
            TokenKind::True | TokenKind::False => "boolean",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Field(_) => "field",
            TokenKind::Variable(_) => "variable",
            TokenKind::Int(_) => "integer",
            TokenKind::Float(_) => "float",
            TokenKind::Str(_) => "string",
            TokenKind::Dot => "\".\"",
            TokenKind::Pipe => "\"|\"",
            TokenKind::Comma => "\",\"",
            TokenKind::LParen => "\"(\"",
            TokenKind::RParen => "\")\"",
            TokenKind::Declare => "\":=\"",
            TokenKind::Assign => "\"=\"",
            TokenKind::Eof => "end of template",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Position snapshot used to build token spans.
type Mark = (usize, usize, usize);

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    in_action: bool,
    /// Set by a right trim marker, the next text segment drops leading whitespace.
    trim_text_start: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            in_action: false,
            trim_text_start: false,
        }
    }

    /// Consume the whole input and return its token stream, ending with `Eof`.
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            if self.in_action {
                let token = self.next_action_token()?;
                if token.kind == TokenKind::RightDelim {
                    self.in_action = false;
                }
                tokens.push(token);
                continue;
            }

            let start = self.mark();
            let mut text = String::new();
            while !self.starts_with(LEFT_DELIM) {
                match self.next_char() {
                    Some(c) => text.push(c),
                    None => break,
                }
            }
            if self.trim_text_start {
                text = text.trim_start().to_string();
                self.trim_text_start = false;
            }
            if !text.is_empty() {
                tokens.push(Token::new(TokenKind::Text(text), self.span_from(start)));
            }
            if self.at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.here()));
                return Ok(tokens);
            }

            let delim_start = self.mark();
            self.eat(LEFT_DELIM);
            let trim_left = self.peek_char() == Some('-')
                && self.peek_at(1).map_or(false, |c| c.is_whitespace());
            if trim_left {
                self.next_char();
                if let Some(Token {
                    kind: TokenKind::Text(prev),
                    ..
                }) = tokens.last_mut()
                {
                    prev.truncate(prev.trim_end().len());
                }
                if matches!(tokens.last(), Some(Token { kind: TokenKind::Text(t), .. }) if t.is_empty())
                {
                    tokens.pop();
                }
            }
            self.skip_whitespace();
            if self.starts_with("/*") {
                self.scan_comment()?;
                continue;
            }
            tokens.push(Token::new(TokenKind::LeftDelim, self.span_from(delim_start)));
            self.in_action = true;
        }
    }

    fn next_action_token(&mut self) -> ParseResult<Token> {
        let skipped = self.skip_whitespace();
        let start = self.mark();
        if skipped && self.starts_with("-}}") {
            self.eat("-}}");
            self.trim_text_start = true;
            return Ok(Token::new(TokenKind::RightDelim, self.span_from(start)));
        }
        if self.starts_with(RIGHT_DELIM) {
            self.eat(RIGHT_DELIM);
            return Ok(Token::new(TokenKind::RightDelim, self.span_from(start)));
        }
        let c = match self.next_char() {
            Some(c) => c,
            None => return Err(ParseError::new("unclosed action", self.here())),
        };
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '|' => TokenKind::Pipe,
            ',' => TokenKind::Comma,
            '=' => TokenKind::Assign,
            ':' => {
                if self.peek_char() == Some('=') {
                    self.next_char();
                    TokenKind::Declare
                } else {
                    return Err(ParseError::new("expected := after :", self.span_from(start)));
                }
            }
            '"' => return self.scan_string(start),
            '`' => return self.scan_raw_string(start),
            '$' => {
                let mut name = String::from("$");
                name.push_str(&self.scan_ident_tail());
                TokenKind::Variable(name)
            }
            '.' => {
                if self
                    .peek_char()
                    .map_or(false, |c| c.is_alphabetic() || c == '_')
                {
                    TokenKind::Field(self.scan_ident_tail())
                } else {
                    TokenKind::Dot
                }
            }
            '+' | '-' => {
                if self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    return self.scan_number(start, c);
                }
                return Err(ParseError::new(
                    format!("unrecognized character in action: {c:?}"),
                    self.span_from(start),
                ));
            }
            c if c.is_ascii_digit() => return self.scan_number(start, c),
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                word.push(c);
                word.push_str(&self.scan_ident_tail());
                match word.as_str() {
                    "if" => TokenKind::If,
                    "else" => TokenKind::Else,
                    "end" => TokenKind::End,
                    "range" => TokenKind::Range,
                    "nil" => TokenKind::Nil,
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    _ => TokenKind::Ident(word),
                }
            }
            other => {
                return Err(ParseError::new(
                    format!("unrecognized character in action: {other:?}"),
                    self.span_from(start),
                ));
            }
        };
        Ok(Token::new(kind, self.span_from(start)))
    }

    /// Consume a `/* ... */` comment and its closing delimiter, emitting nothing.
    fn scan_comment(&mut self) -> ParseResult<()> {
        let start = self.mark();
        self.eat("/*");
        while !self.at_end() && !self.starts_with("*/") {
            self.next_char();
        }
        if self.at_end() {
            return Err(ParseError::new("unclosed comment", self.span_from(start)));
        }
        self.eat("*/");
        self.skip_whitespace();
        if self.starts_with("-}}") {
            self.eat("-}}");
            self.trim_text_start = true;
            return Ok(());
        }
        if self.starts_with(RIGHT_DELIM) {
            self.eat(RIGHT_DELIM);
            return Ok(());
        }
        Err(ParseError::new(
            "comment ends before closing delimiter",
            self.span_from(start),
        ))
    }

    fn scan_string(&mut self, start: Mark) -> ParseResult<Token> {
        let mut value = String::new();
        loop {
            let c = match self.next_char() {
                Some(c) => c,
                None => return Err(ParseError::new("unterminated string", self.span_from(start))),
            };
            match c {
                '"' => break,
                '\n' => return Err(ParseError::new("unterminated string", self.span_from(start))),
                '\\' => value.push(self.scan_escape(start)?),
                _ => value.push(c),
            }
        }
        Ok(Token::new(TokenKind::Str(value), self.span_from(start)))
    }

    fn scan_escape(&mut self, start: Mark) -> ParseResult<char> {
        let c = match self.next_char() {
            Some(c) => c,
            None => return Err(ParseError::new("unterminated string", self.span_from(start))),
        };
        let escaped = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'v' => '\x0b',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => self.scan_hex_escape(start, 2)?,
            'u' => self.scan_hex_escape(start, 4)?,
            'U' => self.scan_hex_escape(start, 8)?,
            other => {
                return Err(ParseError::new(
                    format!("unknown escape character {other:?}"),
                    self.span_from(start),
                ));
            }
        };
        Ok(escaped)
    }

    fn scan_hex_escape(&mut self, start: Mark, len: usize) -> ParseResult<char> {
        let mut code: u32 = 0;
        for _ in 0..len {
            let digit = match self.next_char().and_then(|c| c.to_digit(16)) {
                Some(digit) => digit,
                None => {
                    return Err(ParseError::new(
                        "invalid hex escape in string",
                        self.span_from(start),
                    ));
                }
            };
            code = code * 16 + digit;
        }
        match char::from_u32(code) {
            Some(c) => Ok(c),
            None => Err(ParseError::new(
                format!("invalid character code {code:#x} in string escape"),
                self.span_from(start),
            )),
        }
    }

    /// Raw strings run between backquotes, carriage returns are dropped.
    fn scan_raw_string(&mut self, start: Mark) -> ParseResult<Token> {
        let mut value = String::new();
        loop {
            match self.next_char() {
                Some('`') => break,
                Some('\r') => {}
                Some(c) => value.push(c),
                None => {
                    return Err(ParseError::new(
                        "unterminated raw string",
                        self.span_from(start),
                    ));
                }
            }
        }
        Ok(Token::new(TokenKind::Str(value), self.span_from(start)))
    }

    fn scan_number(&mut self, start: Mark, first: char) -> ParseResult<Token> {
        let mut text = String::new();
        text.push(first);
        let mut is_float = false;
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            if let Some(c) = self.next_char() {
                text.push(c);
            }
        }
        if self.peek_char() == Some('.') && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
            is_float = true;
            self.next_char();
            text.push('.');
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                if let Some(c) = self.next_char() {
                    text.push(c);
                }
            }
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let digit_at = match self.peek_at(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_at(digit_at).map_or(false, |c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    if let Some(c) = self.next_char() {
                        text.push(c);
                    }
                }
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    if let Some(c) = self.next_char() {
                        text.push(c);
                    }
                }
            }
        }
        let span = self.span_from(start);
        if is_float {
            return match text.parse::<f64>() {
                Ok(value) => Ok(Token::new(TokenKind::Float(value), span)),
                Err(_) => Err(ParseError::new(format!("bad number syntax: {text:?}"), span)),
            };
        }
        match text.parse::<i64>() {
            Ok(value) => Ok(Token::new(TokenKind::Int(value), span)),
            // Integer literals too wide for i64 degrade to floats.
            Err(_) => match text.parse::<f64>() {
                Ok(value) => Ok(Token::new(TokenKind::Float(value), span)),
                Err(_) => Err(ParseError::new(format!("bad number syntax: {text:?}"), span)),
            },
        }
    }

    fn scan_ident_tail(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.next_char();
                ident.push(c);
            } else {
                break;
            }
        }
        ident
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, literal: &str) {
        for _ in literal.chars() {
            self.next_char();
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.next_char();
            skipped = true;
        }
        skipped
    }

    fn mark(&self) -> Mark {
        (self.pos, self.line, self.column)
    }

    fn here(&self) -> Span {
        Span::new(self.pos, self.pos, self.line, self.column)
    }

    fn span_from(&self, start: Mark) -> Span {
        Span::new(start.0, self.pos, start.1, start.2)
    }
}
