mod expression;
mod pattern;
mod statement;
mod types;

#[cfg(test)]
mod tests;

use crate::ast::expression::{Expression, ExpressionKind};
use crate::ast::{Directive, Ident, NodeId, Program, Spanned};
use crate::lexer::{Lexer, LexerError, Token, TokenKind};
use crate::span::Span;

pub use expression::ExpressionParser;
pub use pattern::PatternParser;
pub use statement::StatementParser;
pub use types::TypeParser;

#[derive(Debug, Clone)]
pub struct ParserError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at line {}", self.message, self.span.line)
    }
}

impl std::error::Error for ParserError {}

impl From<LexerError> for ParserError {
    fn from(error: LexerError) -> Self {
        ParserError {
            message: error.message,
            span: error.span,
        }
    }
}

/// Lexes and parses a whole source file
pub fn parse_source(source: &str) -> Result<Program, ParserError> {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(tokens);
    let mut program = parser.parse()?;
    program.directives = lexer
        .directives()
        .iter()
        .map(|name| Directive::from_name(name))
        .collect();
    Ok(program)
}

/// Deepest nesting of expressions, statements, patterns and types the parser accepts.
/// A parenthesized expression counts twice.
pub const MAX_NESTING_DEPTH: u32 = 256;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    next_id: u32,
    /// Cleared while parsing a `for` head so `in` is not taken as an operator
    allow_in: bool,
    /// Compound `>>` tokens split while closing type arguments, with the original token
    splits: Vec<(usize, Token)>,
    depth: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_first_id(tokens, 0)
    }

    fn with_first_id(mut tokens: Vec<Token>, next_id: u32) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, span, false));
        }
        Parser {
            tokens,
            position: 0,
            next_id,
            allow_in: true,
            splits: Vec::new(),
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Program, ParserError> {
        let start_span = self.current_span();
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        let end_span = statements.last().map(|s| s.span()).unwrap_or(start_span);
        let mut program = Program::new(statements, start_span.combine(&end_span));
        program.node_count = self.next_id;
        Ok(program)
    }

    /// Parses the tokens of a template substitution, continuing this parser's node ids
    fn parse_nested_expression(&mut self, tokens: Vec<Token>) -> Result<Expression, ParserError> {
        let mut nested = Parser::with_first_id(tokens, self.next_id);
        nested.depth = self.depth;
        let expression = nested.parse_expression()?;
        if !nested.is_at_end() {
            return Err(nested.unexpected("end of template substitution"));
        }
        self.next_id = nested.next_id;
        Ok(expression)
    }

    /// Runs `parse` and rewinds the token stream if it fails
    fn try_parse<T>(
        &mut self,
        parse: impl FnOnce(&mut Parser) -> Result<T, ParserError>,
    ) -> Option<T> {
        let position = self.position;
        let next_id = self.next_id;
        let allow_in = self.allow_in;
        let splits = self.splits.len();
        let depth = self.depth;

        match parse(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.position = position;
                self.next_id = next_id;
                self.allow_in = allow_in;
                self.depth = depth;
                while self.splits.len() > splits {
                    if let Some((index, token)) = self.splits.pop() {
                        self.tokens[index] = token;
                    }
                }
                None
            }
        }
    }

    /// Runs `parse` one nesting level deeper, failing past [`MAX_NESTING_DEPTH`]
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Parser) -> Result<T, ParserError>,
    ) -> Result<T, ParserError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParserError {
                message: format!("Nesting deeper than {} levels", MAX_NESTING_DEPTH),
                span: self.current_span(),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn node(&mut self, kind: ExpressionKind, span: Span) -> Expression {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        Expression::with_id(id, kind, span)
    }

    // Token stream management
    fn current(&self) -> &Token {
        // The stream always ends with Eof and `advance` never moves past it
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    fn peek_kind(&self, offset: usize) -> Option<&TokenKind> {
        self.peek(offset).map(|t| &t.kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn check_identifier(&self, name: &str) -> bool {
        matches!(&self.current().kind, TokenKind::Identifier(n) if n == name)
    }

    fn match_token(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParserError> {
        if self.check(&kind) {
            return Ok(self.advance());
        }

        Err(ParserError {
            message: format!("{}, found {}", message, describe(&self.current().kind)),
            span: self.current_span(),
        })
    }

    /// Statement terminator with automatic semicolon insertion
    fn consume_semicolon(&mut self) -> Result<(), ParserError> {
        if self.match_token(&[TokenKind::Semicolon]) {
            return Ok(());
        }
        let token = self.current();
        if matches!(token.kind, TokenKind::RightBrace | TokenKind::Eof) || token.newline_before {
            return Ok(());
        }
        Err(self.unexpected("';'"))
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.position == 0 {
            return self.current_span();
        }
        self.tokens[self.position - 1].span
    }

    fn unexpected(&self, expected: &str) -> ParserError {
        ParserError {
            message: format!("Expected {}, found {}", expected, describe(&self.current().kind)),
            span: self.current_span(),
        }
    }

    fn unsupported(&self, what: &str) -> ParserError {
        ParserError {
            message: format!("{} not supported by the target dialect", what),
            span: self.current_span(),
        }
    }

    fn parse_identifier(&mut self) -> Result<Ident, ParserError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Spanned::new(name, token.span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Identifier or keyword, as allowed after `.` and as an object key
    fn parse_property_name(&mut self) -> Result<Ident, ParserError> {
        let token = self.current().clone();
        if let TokenKind::Identifier(name) = &token.kind {
            self.advance();
            return Ok(Spanned::new(name.clone(), token.span));
        }
        if let Some(text) = token.kind.keyword_text() {
            self.advance();
            return Ok(Spanned::new(text.to_string(), token.span));
        }
        Err(self.unexpected("property name"))
    }

    fn parse_string_literal(&mut self) -> Result<String, ParserError> {
        match self.current().kind.clone() {
            TokenKind::String(value) => {
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    /// Index of the token after the bracket matching the one at `self.position`
    fn matching_close(&self, from: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut index = from;
        while let Some(token) = self.tokens.get(index) {
            match token.kind {
                TokenKind::LeftParen | TokenKind::LeftBrace | TokenKind::LeftBracket => depth += 1,
                TokenKind::RightParen | TokenKind::RightBrace | TokenKind::RightBracket => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(index + 1);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
            index += 1;
        }
        None
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Identifier(name) => format!("identifier '{}'", name),
        TokenKind::Number(value) => format!("number {}", value),
        TokenKind::String(_) => "string literal".to_string(),
        TokenKind::Template(_) => "template literal".to_string(),
        TokenKind::Eof => "end of input".to_string(),
        other => match other.keyword_text() {
            Some(text) => format!("'{}'", text),
            None => format!("{:?}", other),
        },
    }
}
