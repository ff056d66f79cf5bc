/// Token types for the Botlang lexer.
use diagnostics::SourceLocation;

/// A single token produced by the lexer.
#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
    /// Raw source text of the token. String literals keep their escapes but
    /// drop the quotes; comments drop the leading `#`.
    pub lexeme: String,
}

/// All token variants recognized by the lexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Number,
    StringLit,

    // Keywords
    Fun,
    Record,
    Var,
    Repeat,
    Times,
    While,
    Do,
    If,
    Then,
    Elseif,
    Else,
    End,
    Return,
    Break,
    Continue,
    And,
    Or,
    Xor,
    Not,
    True,
    False,

    // Identifier
    Ident,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    DotDot,
    Dot,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,

    /// `#` up to the end of the line.
    Comment,
    /// A character sequence that does not form any token, such as `@` or an
    /// unterminated string. The parser reports it as the offending token.
    Error,

    // End of file
    Eof,
}

/// Reserved words. An identifier may never spell one of these.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("fun", TokenKind::Fun),
    ("record", TokenKind::Record),
    ("var", TokenKind::Var),
    ("repeat", TokenKind::Repeat),
    ("times", TokenKind::Times),
    ("while", TokenKind::While),
    ("do", TokenKind::Do),
    ("if", TokenKind::If),
    ("then", TokenKind::Then),
    ("elseif", TokenKind::Elseif),
    ("else", TokenKind::Else),
    ("end", TokenKind::End),
    ("return", TokenKind::Return),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
    ("xor", TokenKind::Xor),
    ("not", TokenKind::Not),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
];

pub fn keyword(text: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(word, _)| *word == text)
        .map(|(_, kind)| *kind)
}

impl TokenKind {
    /// How this kind is named in "Expected ..." diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Number => "a number",
            TokenKind::StringLit => "a string",
            TokenKind::Ident => "an identifier",
            TokenKind::Comment => "a comment",
            TokenKind::Error => "an unknown character",
            TokenKind::Eof => "end of input",
            TokenKind::Fun => "\"fun\"",
            TokenKind::Record => "\"record\"",
            TokenKind::Var => "\"var\"",
            TokenKind::Repeat => "\"repeat\"",
            TokenKind::Times => "\"times\"",
            TokenKind::While => "\"while\"",
            TokenKind::Do => "\"do\"",
            TokenKind::If => "\"if\"",
            TokenKind::Then => "\"then\"",
            TokenKind::Elseif => "\"elseif\"",
            TokenKind::Else => "\"else\"",
            TokenKind::End => "\"end\"",
            TokenKind::Return => "\"return\"",
            TokenKind::Break => "\"break\"",
            TokenKind::Continue => "\"continue\"",
            TokenKind::And => "\"and\"",
            TokenKind::Or => "\"or\"",
            TokenKind::Xor => "\"xor\"",
            TokenKind::Not => "\"not\"",
            TokenKind::True => "\"true\"",
            TokenKind::False => "\"false\"",
            TokenKind::Plus => "\"+\"",
            TokenKind::Minus => "\"-\"",
            TokenKind::Star => "\"*\"",
            TokenKind::Slash => "\"/\"",
            TokenKind::DotDot => "\"..\"",
            TokenKind::Dot => "\".\"",
            TokenKind::Eq => "\"==\"",
            TokenKind::Neq => "\"!=\"",
            TokenKind::Lt => "\"<\"",
            TokenKind::Le => "\"<=\"",
            TokenKind::Gt => "\">\"",
            TokenKind::Ge => "\">=\"",
            TokenKind::Assign => "\"=\"",
            TokenKind::LParen => "\"(\"",
            TokenKind::RParen => "\")\"",
            TokenKind::LBracket => "\"[\"",
            TokenKind::RBracket => "\"]\"",
            TokenKind::Comma => "\",\"",
            TokenKind::Colon => "\":\"",
        }
    }
}

impl Token {
    /// How this token is named as the "found" part of a diagnostic.
    pub fn describe_found(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("\"{}\"", self.lexeme),
        }
    }
}
