/// Single-pass O(n) lexer for Botlang source code.
///
/// The lexer never fails. Characters that do not start a token become a
/// `TokenKind::Error` token so the parser can report them together with what
/// it expected at that position.
use diagnostics::{Position, SourceLocation};

use crate::token::{keyword, Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer {
            source,
            pos: 0,
            line: 1,
            col: 1,
        };
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.col, self.pos)
    }

    fn token(&self, kind: TokenKind, start: Position, lexeme: impl Into<String>) -> Token {
        Token {
            kind,
            location: SourceLocation::new(start, self.position()),
            lexeme: lexeme.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r' | '\n') = self.peek() {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position();
        let Some(ch) = self.peek() else {
            return self.token(TokenKind::Eof, start, "");
        };

        if ch.is_ascii_digit() {
            return self.lex_number(start);
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            return self.lex_ident(start);
        }

        if ch == '"' || ch == '\'' {
            return self.lex_string(start, ch);
        }

        if ch == '#' {
            return self.lex_comment(start);
        }

        // Two-character operators
        let two = match (ch, self.peek2()) {
            ('=', Some('=')) => Some((TokenKind::Eq, "==")),
            ('!', Some('=')) => Some((TokenKind::Neq, "!=")),
            ('<', Some('=')) => Some((TokenKind::Le, "<=")),
            ('>', Some('=')) => Some((TokenKind::Ge, ">=")),
            ('.', Some('.')) => Some((TokenKind::DotDot, "..")),
            _ => None,
        };
        if let Some((kind, lexeme)) = two {
            self.advance();
            self.advance();
            return self.token(kind, start, lexeme);
        }

        self.advance();
        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '.' => TokenKind::Dot,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '=' => TokenKind::Assign,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            _ => TokenKind::Error,
        };
        self.token(kind, start, ch.to_string())
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.advance();
        }
    }

    fn lex_number(&mut self, start: Position) -> Token {
        self.take_while(|c| c.is_ascii_digit());
        // A fraction needs a digit after the dot, otherwise `1..` would
        // swallow the concatenation operator.
        if self.peek() == Some('.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.take_while(|c| c.is_ascii_digit());
        }
        let lexeme = &self.source[start.offset..self.pos];
        self.token(TokenKind::Number, start, lexeme)
    }

    fn lex_ident(&mut self, start: Position) -> Token {
        self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let lexeme = &self.source[start.offset..self.pos];
        let kind = keyword(lexeme).unwrap_or(TokenKind::Ident);
        self.token(kind, start, lexeme)
    }

    fn lex_comment(&mut self, start: Position) -> Token {
        self.advance(); // consume `#`
        let body_start = self.pos;
        self.take_while(|c| c != '\n');
        let text = self.source[body_start..self.pos].trim_end_matches('\r');
        self.token(TokenKind::Comment, start, text)
    }

    fn lex_string(&mut self, start: Position, quote: char) -> Token {
        self.advance(); // consume opening quote
        let body_start = self.pos;
        loop {
            match self.peek() {
                None | Some('\n') => {
                    let raw = &self.source[start.offset..self.pos];
                    return self.token(TokenKind::Error, start, raw);
                }
                Some('\\') => {
                    self.advance();
                    if self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some(c) if c == quote => {
                    let body = &self.source[body_start..self.pos];
                    self.advance();
                    return self.token(TokenKind::StringLit, start, body);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }
}

/// Resolve escape sequences in a string literal body.
pub fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some(other) => result.push(other),
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}
