//! Tokenizer for the modern source dialect.
//!
//! Template literals are lexed eagerly: each `${ ... }` substitution becomes its own
//! token vector that the parser later consumes with a nested parser.

use crate::span::Span;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Number(f64),
    String(String),
    Template(TemplateToken),

    // Keywords
    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Try,
    Catch,
    Finally,
    Throw,
    New,
    Typeof,
    Instanceof,
    In,
    Void,
    Delete,
    This,
    Null,
    True,
    False,
    Import,
    Export,
    Class,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    Dot,
    DotDotDot,
    Question,
    QuestionDot,
    Colon,
    Arrow,
    At,

    // Operators
    Equal,
    EqualEqual,
    EqualEqualEqual,
    BangEqual,
    BangEqualEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LessLess,
    GreaterGreater,
    GreaterGreaterGreater,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    Bang,
    AmpersandAmpersand,
    PipePipe,
    QuestionQuestion,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    StarStarEqual,
    AmpersandEqual,
    PipeEqual,
    CaretEqual,
    LessLessEqual,
    GreaterGreaterEqual,
    GreaterGreaterGreaterEqual,
    AmpersandAmpersandEqual,
    PipePipeEqual,
    QuestionQuestionEqual,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateToken {
    pub quasis: Vec<String>,
    pub substitutions: Vec<Vec<Token>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// A line break separates this token from the previous one
    pub newline_before: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, newline_before: bool) -> Self {
        Token {
            kind,
            span,
            newline_before,
        }
    }
}

impl TokenKind {
    /// Keywords that may still be used as property names (`obj.default`, `{ new: 1 }`)
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Var => "var",
            TokenKind::Let => "let",
            TokenKind::Const => "const",
            TokenKind::Function => "function",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Throw => "throw",
            TokenKind::New => "new",
            TokenKind::Typeof => "typeof",
            TokenKind::Instanceof => "instanceof",
            TokenKind::In => "in",
            TokenKind::Void => "void",
            TokenKind::Delete => "delete",
            TokenKind::This => "this",
            TokenKind::Null => "null",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Import => "import",
            TokenKind::Export => "export",
            TokenKind::Class => "class",
            _ => return None,
        };
        Some(text)
    }
}

fn keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "var" => TokenKind::Var,
        "let" => TokenKind::Let,
        "const" => TokenKind::Const,
        "function" => TokenKind::Function,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "finally" => TokenKind::Finally,
        "throw" => TokenKind::Throw,
        "new" => TokenKind::New,
        "typeof" => TokenKind::Typeof,
        "instanceof" => TokenKind::Instanceof,
        "in" => TokenKind::In,
        "void" => TokenKind::Void,
        "delete" => TokenKind::Delete,
        "this" => TokenKind::This,
        "null" => TokenKind::Null,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "import" => TokenKind::Import,
        "export" => TokenKind::Export,
        "class" => TokenKind::Class,
        _ => return None,
    };
    Some(kind)
}

#[derive(Debug, Clone)]
pub struct LexerError {
    pub message: String,
    pub span: Span,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

impl std::error::Error for LexerError {}

pub struct Lexer<'src> {
    source: &'src str,
    chars: Vec<(usize, char)>,
    position: usize,
    line: usize,
    column: usize,
    newline_before: bool,
    directives: Vec<String>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source,
            chars: source.char_indices().collect(),
            position: 0,
            line: 1,
            column: 1,
            newline_before: false,
            directives: Vec::new(),
        }
    }

    /// Names of `/// @name` comment directives seen so far
    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.position)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.source.len())
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).map(|(_, c)| *c)
    }

    fn peek(&self, distance: usize) -> Option<char> {
        self.chars.get(self.position + distance).map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>, start: usize, line: usize, column: usize) -> LexerError {
        LexerError {
            message: message.into(),
            span: Span::new(start, self.offset(), line, column),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), LexerError> {
        while let Some(c) = self.current() {
            match c {
                '\n' => {
                    self.newline_before = true;
                    self.advance();
                }
                c if c.is_whitespace() || c == '\u{FEFF}' => {
                    self.advance();
                }
                '/' if self.peek(1) == Some('/') => self.line_comment(),
                '/' if self.peek(1) == Some('*') => self.block_comment()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn line_comment(&mut self) {
        let start = self.offset();
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        let text = &self.source[start..self.offset()];
        if let Some(directive) = text.strip_prefix("///") {
            let directive = directive.trim();
            if let Some(name) = directive.strip_prefix('@') {
                let name = name.split_whitespace().next().unwrap_or_default();
                if !name.is_empty() {
                    self.directives.push(name.to_string());
                }
            }
        }
    }

    fn block_comment(&mut self) -> Result<(), LexerError> {
        let (start, line, column) = (self.offset(), self.line, self.column);
        self.advance();
        self.advance();
        loop {
            match self.advance() {
                Some('*') if self.current() == Some('/') => {
                    self.advance();
                    return Ok(());
                }
                Some('\n') => self.newline_before = true,
                Some(_) => {}
                None => return Err(self.error("Unterminated block comment", start, line, column)),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexerError> {
        self.newline_before = false;
        self.skip_trivia()?;

        let (start, line, column) = (self.offset(), self.line, self.column);
        let newline_before = self.newline_before;

        let Some(c) = self.current() else {
            return Ok(Token::new(
                TokenKind::Eof,
                Span::new(start, start, line, column),
                newline_before,
            ));
        };

        let kind = if is_identifier_start(c) {
            self.identifier_or_keyword()
        } else if c.is_ascii_digit() || (c == '.' && self.peek(1).is_some_and(|n| n.is_ascii_digit())) {
            self.number(start, line, column)?
        } else if c == '"' || c == '\'' {
            self.string(c, start, line, column)?
        } else if c == '`' {
            self.template(start, line, column)?
        } else {
            self.punctuation(start, line, column)?
        };

        Ok(Token::new(
            kind,
            Span::new(start, self.offset(), line, column),
            newline_before,
        ))
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.offset();
        while let Some(c) = self.current() {
            if is_identifier_part(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.offset()];
        keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()))
    }

    fn number(&mut self, start: usize, line: usize, column: usize) -> Result<TokenKind, LexerError> {
        if self.current() == Some('0') {
            let radix = match self.peek(1) {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.advance();
                let mut digits = String::new();
                while let Some(c) = self.current() {
                    if c == '_' {
                        self.advance();
                    } else if c.is_digit(radix) {
                        digits.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                let value = u64::from_str_radix(&digits, radix)
                    .map_err(|_| self.error("Invalid numeric literal", start, line, column))?;
                return Ok(TokenKind::Number(value as f64));
            }
        }

        let mut text = String::new();
        self.digits(&mut text);
        if self.current() == Some('.') {
            text.push('.');
            self.advance();
            self.digits(&mut text);
        }
        if matches!(self.current(), Some('e') | Some('E')) {
            text.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.current() {
                text.push(sign);
                self.advance();
            }
            self.digits(&mut text);
        }
        if self.current() == Some('n') {
            return Err(self.error("BigInt literals are not supported", start, line, column));
        }
        if self.current().is_some_and(is_identifier_start) {
            return Err(self.error("Identifier directly after number", start, line, column));
        }
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error("Invalid numeric literal", start, line, column))
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '_' && self.peek(1).is_some_and(|n| n.is_ascii_digit()) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn string(&mut self, quote: char, start: usize, line: usize, column: usize) -> Result<TokenKind, LexerError> {
        self.advance();
        let mut value = String::new();
        loop {
            match self.current() {
                None | Some('\n') => {
                    return Err(self.error("Unterminated string literal", start, line, column))
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(TokenKind::String(value));
                }
                Some('\\') => {
                    self.advance();
                    self.escape(&mut value, start, line, column)?;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn escape(&mut self, value: &mut String, start: usize, line: usize, column: usize) -> Result<(), LexerError> {
        let Some(c) = self.advance() else {
            return Err(self.error("Unterminated escape sequence", start, line, column));
        };
        match c {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' if !self.current().is_some_and(|n| n.is_ascii_digit()) => value.push('\0'),
            'x' => {
                let code = self.hex_digits(2, start, line, column)?;
                value.push(self.code_point(code, start, line, column)?);
            }
            'u' => {
                let code = if self.eat('{') {
                    let mut code = 0u32;
                    let mut count = 0;
                    while let Some(d) = self.current().and_then(|c| c.to_digit(16)) {
                        code = code.saturating_mul(16).saturating_add(d);
                        count += 1;
                        self.advance();
                    }
                    if count == 0 || !self.eat('}') {
                        return Err(self.error("Invalid unicode escape", start, line, column));
                    }
                    code
                } else {
                    let high = self.hex_digits(4, start, line, column)?;
                    // Surrogate pairs spelled as two escapes
                    if (0xD800..0xDC00).contains(&high)
                        && self.current() == Some('\\')
                        && self.peek(1) == Some('u')
                    {
                        self.advance();
                        self.advance();
                        let low = self.hex_digits(4, start, line, column)?;
                        0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF)
                    } else {
                        high
                    }
                };
                value.push(self.code_point(code, start, line, column)?);
            }
            '\r' => {
                self.eat('\n');
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => value.push(other),
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize, start: usize, line: usize, column: usize) -> Result<u32, LexerError> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self
                .current()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid hexadecimal escape", start, line, column))?;
            code = code * 16 + digit;
            self.advance();
        }
        Ok(code)
    }

    fn code_point(&self, code: u32, start: usize, line: usize, column: usize) -> Result<char, LexerError> {
        char::from_u32(code).ok_or_else(|| self.error("Invalid code point in escape", start, line, column))
    }

    fn template(&mut self, start: usize, line: usize, column: usize) -> Result<TokenKind, LexerError> {
        self.advance();
        let mut quasis = Vec::new();
        let mut substitutions = Vec::new();
        let mut chunk = String::new();
        loop {
            match self.current() {
                None => return Err(self.error("Unterminated template literal", start, line, column)),
                Some('`') => {
                    self.advance();
                    quasis.push(chunk);
                    return Ok(TokenKind::Template(TemplateToken {
                        quasis,
                        substitutions,
                    }));
                }
                Some('\\') => {
                    self.advance();
                    self.escape(&mut chunk, start, line, column)?;
                }
                Some('$') if self.peek(1) == Some('{') => {
                    self.advance();
                    self.advance();
                    quasis.push(std::mem::take(&mut chunk));
                    substitutions.push(self.substitution(start, line, column)?);
                }
                Some(c) => {
                    chunk.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Tokens of one `${ ... }`, up to the matching close brace
    fn substitution(&mut self, start: usize, line: usize, column: usize) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::Eof => {
                    return Err(self.error("Unterminated template substitution", start, line, column))
                }
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace if depth == 0 => {
                    let end = token.span;
                    tokens.push(Token::new(TokenKind::Eof, end, false));
                    return Ok(tokens);
                }
                TokenKind::RightBrace => depth -= 1,
                _ => {}
            }
            tokens.push(token);
        }
    }

    fn punctuation(&mut self, start: usize, line: usize, column: usize) -> Result<TokenKind, LexerError> {
        let Some(c) = self.advance() else {
            return Err(self.error("Unexpected end of input", start, line, column));
        };
        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '@' => TokenKind::At,
            '.' => {
                if self.current() == Some('.') && self.peek(1) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }
            '?' => {
                if self.eat('?') {
                    if self.eat('=') {
                        TokenKind::QuestionQuestionEqual
                    } else {
                        TokenKind::QuestionQuestion
                    }
                } else if self.current() == Some('.') && !self.peek(1).is_some_and(|n| n.is_ascii_digit()) {
                    self.advance();
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::EqualEqualEqual
                    } else {
                        TokenKind::EqualEqual
                    }
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::BangEqualEqual
                    } else {
                        TokenKind::BangEqual
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('<') {
                    if self.eat('=') {
                        TokenKind::LessLessEqual
                    } else {
                        TokenKind::LessLess
                    }
                } else if self.eat('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.eat('>') {
                    if self.eat('>') {
                        if self.eat('=') {
                            TokenKind::GreaterGreaterGreaterEqual
                        } else {
                            TokenKind::GreaterGreaterGreater
                        }
                    } else if self.eat('=') {
                        TokenKind::GreaterGreaterEqual
                    } else {
                        TokenKind::GreaterGreater
                    }
                } else if self.eat('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusEqual
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('*') {
                    if self.eat('=') {
                        TokenKind::StarStarEqual
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.eat('=') {
                    TokenKind::StarEqual
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashEqual
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEqual
                } else {
                    TokenKind::Percent
                }
            }
            '&' => {
                if self.eat('&') {
                    if self.eat('=') {
                        TokenKind::AmpersandAmpersandEqual
                    } else {
                        TokenKind::AmpersandAmpersand
                    }
                } else if self.eat('=') {
                    TokenKind::AmpersandEqual
                } else {
                    TokenKind::Ampersand
                }
            }
            '|' => {
                if self.eat('|') {
                    if self.eat('=') {
                        TokenKind::PipePipeEqual
                    } else {
                        TokenKind::PipePipe
                    }
                } else if self.eat('=') {
                    TokenKind::PipeEqual
                } else {
                    TokenKind::Pipe
                }
            }
            '^' => {
                if self.eat('=') {
                    TokenKind::CaretEqual
                } else {
                    TokenKind::Caret
                }
            }
            other => {
                return Err(self.error(format!("Unexpected character '{}'", other), start, line, column))
            }
        };
        Ok(kind)
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_alphanumeric() || c == '\u{200C}' || c == '\u{200D}'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .expect("Lexing failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("const $x = value"),
            vec![
                TokenKind::Const,
                TokenKind::Identifier("$x".to_string()),
                TokenKind::Equal,
                TokenKind::Identifier("value".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1_000")[0], TokenKind::Number(1000.0));
        assert_eq!(kinds("0xff")[0], TokenKind::Number(255.0));
        assert_eq!(kinds(".5")[0], TokenKind::Number(0.5));
        assert_eq!(kinds("2e3")[0], TokenKind::Number(2000.0));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\nA\x42\u{1F600}""#)[0],
            TokenKind::String("a\nAB\u{1F600}".to_string())
        );
    }

    #[test]
    fn test_template_with_substitution() {
        let tokens = kinds("`a${b + 1}c`");
        match &tokens[0] {
            TokenKind::Template(template) => {
                assert_eq!(template.quasis, vec!["a".to_string(), "c".to_string()]);
                assert_eq!(template.substitutions.len(), 1);
                assert_eq!(template.substitutions[0].len(), 4);
            }
            other => panic!("Expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_braces_in_substitution() {
        let tokens = kinds("`${ {a: 1}.a }`");
        assert!(matches!(tokens[0], TokenKind::Template(_)));
        assert_eq!(tokens[1], TokenKind::Eof);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a ??= b >>>= c ** d"),
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::QuestionQuestionEqual,
                TokenKind::Identifier("b".to_string()),
                TokenKind::GreaterGreaterGreaterEqual,
                TokenKind::Identifier("c".to_string()),
                TokenKind::StarStar,
                TokenKind::Identifier("d".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_directives_are_recorded() {
        let mut lexer = Lexer::new("/// @xml-init\n// plain\n/// @html extra\nx");
        lexer.tokenize().unwrap();
        assert_eq!(lexer.directives(), &["xml-init".to_string(), "html".to_string()]);
    }

    #[test]
    fn test_newline_tracking() {
        let tokens = Lexer::new("a\nb").tokenize().unwrap();
        assert!(!tokens[0].newline_before);
        assert!(tokens[1].newline_before);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Lexer::new("'abc").tokenize().is_err());
    }
}
