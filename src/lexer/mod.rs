mod tokens;

pub use tokens::{Token, TokenKind};

use crate::error::{Error, Result};

/// Which sub-automaton the next character belongs to.
///
/// The grammar is lexed context-sensitively: at block level the input is a
/// pattern (`^`, `*`, literal segments, `.`, `(` filters), while inside
/// `{ ... }` and filter parentheses it is an expression. One nesting
/// counter tracks `( ) { } [ ]`; when it returns to zero the action ends
/// and lexing falls back to the enclosing context.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    /// Start of a block: `^`, `{`, or the first pattern segment
    BlockStart,
    /// After an optional `^`: either `{` or a pattern segment
    BlockBody,
    /// A single pattern segment
    Pattern,
    /// After a segment: `.` continues the pattern, `{` opens the action
    PatternEnd,
    /// Expression tokens until the nesting counter returns to zero
    Action { in_filter: bool },
    /// Inside a string literal, before its body has been emitted
    StringBody { in_filter: bool },
    /// Between a string literal body and its closing quote
    StringClose { in_filter: bool },
}

/// The tawk lexer
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    nesting: i32,
    mode: Mode,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            nesting: 0,
            mode: Mode::BlockStart,
        }
    }

    /// Tokenize the entire source, returning all tokens including `Eof`
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            // A mode may hand over to another without consuming input;
            // loop until one of them produces a token.
            let token = match self.mode {
                Mode::BlockStart => self.lex_block_start()?,
                Mode::BlockBody => self.lex_block_body(),
                Mode::Pattern => Some(self.lex_pattern()?),
                Mode::PatternEnd => self.lex_pattern_end()?,
                Mode::Action { in_filter } => Some(self.lex_action(in_filter)?),
                Mode::StringBody { in_filter } => Some(self.lex_string_body(in_filter)?),
                Mode::StringClose { in_filter } => Some(self.lex_string_close(in_filter)),
            };
            if let Some(token) = token {
                return Ok(token);
            }
        }
    }

    fn lex_block_start(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace(false);
        let (line, col) = (self.line, self.column);
        match self.peek() {
            None => Ok(Some(Token::new(TokenKind::Eof, line, col))),
            Some('^') => {
                self.advance();
                self.mode = Mode::BlockBody;
                Ok(Some(Token::new(TokenKind::Circum, line, col)))
            }
            Some(_) => {
                self.mode = Mode::BlockBody;
                Ok(None)
            }
        }
    }

    fn lex_block_body(&mut self) -> Option<Token> {
        let (line, col) = (self.line, self.column);
        if self.peek() == Some('{') {
            self.advance();
            self.nesting += 1;
            self.mode = Mode::Action { in_filter: false };
            Some(Token::new(TokenKind::LBrace, line, col))
        } else {
            self.mode = Mode::Pattern;
            None
        }
    }

    fn lex_pattern(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.column);
        match self.advance() {
            Some(ch) if is_identifier_char(ch) => {
                let mut segment = String::from(ch);
                while let Some(&next) = self.chars.peek() {
                    if !is_identifier_char(next) {
                        break;
                    }
                    segment.push(next);
                    self.advance();
                }
                self.mode = Mode::PatternEnd;
                Ok(Token::new(TokenKind::IndexPattern(segment), line, col))
            }
            Some('(') => {
                self.nesting += 1;
                self.mode = Mode::Action { in_filter: true };
                Ok(Token::new(TokenKind::LParen, line, col))
            }
            Some('*') => {
                self.mode = Mode::PatternEnd;
                Ok(Token::new(TokenKind::Ast, line, col))
            }
            _ => Err(Error::lexer("invalid pattern", line, col)),
        }
    }

    fn lex_pattern_end(&mut self) -> Result<Option<Token>> {
        let (line, col) = (self.line, self.column);
        if self.peek() == Some('.') {
            self.advance();
            self.mode = Mode::Pattern;
            return Ok(Some(Token::new(TokenKind::Dot, line, col)));
        }
        self.skip_whitespace(true);
        let (line, col) = (self.line, self.column);
        match self.peek() {
            None => Ok(Some(Token::new(TokenKind::Eof, line, col))),
            Some('{') => {
                self.advance();
                self.nesting += 1;
                self.mode = Mode::Action { in_filter: false };
                Ok(Some(Token::new(TokenKind::LBrace, line, col)))
            }
            Some(_) => Err(Error::lexer("missing action", line, col)),
        }
    }

    fn lex_action(&mut self, in_filter: bool) -> Result<Token> {
        self.skip_whitespace(true);
        let (line, col) = (self.line, self.column);

        let Some(ch) = self.advance() else {
            return Err(Error::lexer("unclosed action", line, col));
        };

        // Two-character operators take precedence over their one-character
        // fallbacks.
        if let Some((with_eq, alone)) = compound_operator(ch) {
            let kind = if self.peek() == Some('=') {
                self.advance();
                with_eq
            } else {
                alone
            };
            return Ok(Token::new(kind, line, col));
        }

        let kind = match ch {
            '(' => {
                self.nesting += 1;
                TokenKind::LParen
            }
            ')' => {
                self.nesting -= 1;
                self.leave_action_at_zero(in_filter);
                TokenKind::RParen
            }
            '{' => {
                self.nesting += 1;
                TokenKind::LBrace
            }
            '}' => {
                self.nesting -= 1;
                self.leave_action_at_zero(in_filter);
                TokenKind::RBrace
            }
            '[' => {
                self.nesting += 1;
                TokenKind::LBrack
            }
            ']' => {
                self.nesting -= 1;
                self.leave_action_at_zero(in_filter);
                TokenKind::RBrack
            }
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '"' => {
                self.mode = Mode::StringBody { in_filter };
                TokenKind::DoubleQuote
            }
            _ if ch.is_ascii_digit() => return self.lex_number(ch, line, col),
            _ if is_identifier_start(ch) => return Ok(self.lex_identifier(ch, line, col)),
            _ => {
                return Err(Error::lexer(
                    format!("invalid token '{}'", ch),
                    line,
                    col,
                ))
            }
        };
        Ok(Token::new(kind, line, col))
    }

    fn leave_action_at_zero(&mut self, in_filter: bool) {
        if self.nesting == 0 {
            self.mode = if in_filter {
                Mode::PatternEnd
            } else {
                Mode::BlockStart
            };
        }
    }

    // First digit already consumed
    fn lex_number(&mut self, first: char, line: usize, col: usize) -> Result<Token> {
        let mut literal = String::from(first);
        while let Some(&next) = self.chars.peek() {
            if !next.is_ascii_digit() {
                break;
            }
            literal.push(next);
            self.advance();
        }
        if self.peek() == Some('.') {
            literal.push('.');
            self.advance();
            while let Some(&next) = self.chars.peek() {
                if !next.is_ascii_digit() {
                    break;
                }
                literal.push(next);
                self.advance();
            }
        }
        if let Some(next) = self.peek() {
            if is_identifier_char(next) {
                literal.push(next);
                return Err(Error::lexer(
                    format!("bad number {:?}", literal),
                    line,
                    col,
                ));
            }
        }
        let value: f64 = literal
            .parse()
            .map_err(|_| Error::lexer(format!("bad number {:?}", literal), line, col))?;
        Ok(Token::new(TokenKind::Number(value), line, col))
    }

    // First character already consumed
    fn lex_identifier(&mut self, first: char, line: usize, col: usize) -> Token {
        let mut name = String::from(first);
        while let Some(&next) = self.chars.peek() {
            if !is_identifier_char(next) {
                break;
            }
            name.push(next);
            self.advance();
        }
        Token::new(TokenKind::Identifier(name), line, col)
    }

    fn lex_string_body(&mut self, in_filter: bool) -> Result<Token> {
        let (line, col) = (self.line, self.column);
        let mut body = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(Error::lexer(
                        "missing closing quote in string literal",
                        line,
                        col,
                    ))
                }
                Some('"') => break,
                Some(ch) => {
                    body.push(ch);
                    self.advance();
                }
            }
        }
        self.mode = Mode::StringClose { in_filter };
        Ok(Token::new(TokenKind::StringLiteral(body), line, col))
    }

    fn lex_string_close(&mut self, in_filter: bool) -> Token {
        let (line, col) = (self.line, self.column);
        self.advance(); // the closing quote, guaranteed by lex_string_body
        self.mode = Mode::Action { in_filter };
        Token::new(TokenKind::DoubleQuote, line, col)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next();
        match ch {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => {}
        }
        ch
    }

    fn skip_whitespace(&mut self, newlines: bool) {
        while let Some(ch) = self.peek() {
            let skip = match ch {
                ' ' | '\t' => true,
                '\r' | '\n' => newlines,
                _ => false,
            };
            if !skip {
                break;
            }
            self.advance();
        }
    }
}

fn compound_operator(ch: char) -> Option<(TokenKind, TokenKind)> {
    match ch {
        '+' => Some((TokenKind::AddAssign, TokenKind::Add)),
        '-' => Some((TokenKind::SubAssign, TokenKind::Sub)),
        '*' => Some((TokenKind::AstAssign, TokenKind::Ast)),
        '/' => Some((TokenKind::DivAssign, TokenKind::Div)),
        '=' => Some((TokenKind::Equal, TokenKind::Assign)),
        '!' => Some((TokenKind::NotEqual, TokenKind::Not)),
        _ => None,
    }
}

fn is_alpha(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

fn is_identifier_start(ch: char) -> bool {
    is_alpha(ch) || ch == '_' || ch == '$'
}

fn is_identifier_char(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit()
}
