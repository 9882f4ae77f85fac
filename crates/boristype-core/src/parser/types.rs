use super::{Parser, ParserError};
use crate::ast::types::{TypeAnnotation, TypeKind};
use crate::lexer::{Token, TokenKind};

/// Parses type annotations into the coarse shape the type oracle understands.
/// Anything it cannot classify is skipped over and kept as `TypeKind::Other`.
pub trait TypeParser {
    fn parse_type(&mut self) -> Result<TypeAnnotation, ParserError>;
}

impl TypeParser for Parser {
    fn parse_type(&mut self) -> Result<TypeAnnotation, ParserError> {
        self.nested(|parser| parser.parse_union_type())
    }
}

impl Parser {
    fn parse_union_type(&mut self) -> Result<TypeAnnotation, ParserError> {
        let start = self.current_span();
        // Leading `|` / `&` are allowed in multi-line unions
        self.match_token(&[TokenKind::Pipe, TokenKind::Ampersand]);

        let first = self.parse_intersection_type()?;
        if !self.check(&TokenKind::Pipe) {
            return Ok(first);
        }

        let mut members = vec![first];
        while self.match_token(&[TokenKind::Pipe]) {
            members.push(self.parse_intersection_type()?);
        }
        let span = start.combine(&self.previous_span());
        Ok(TypeAnnotation::new(TypeKind::Union(members), span))
    }

    fn parse_intersection_type(&mut self) -> Result<TypeAnnotation, ParserError> {
        let first = self.parse_postfix_type()?;
        if !self.check(&TokenKind::Ampersand) {
            return Ok(first);
        }
        while self.match_token(&[TokenKind::Ampersand]) {
            self.parse_postfix_type()?;
        }
        let span = first.span.combine(&self.previous_span());
        Ok(TypeAnnotation::new(TypeKind::Other, span))
    }

    fn parse_postfix_type(&mut self) -> Result<TypeAnnotation, ParserError> {
        let mut ty = self.parse_primary_type()?;
        // `T[]`, but not an indexed access type `T["key"]`
        while self.check(&TokenKind::LeftBracket) && !self.current().newline_before {
            if self.peek_kind(1) == Some(&TokenKind::RightBracket) {
                self.advance();
                self.advance();
                let span = ty.span.combine(&self.previous_span());
                ty = TypeAnnotation::new(TypeKind::Array(Box::new(ty)), span);
            } else {
                self.advance();
                self.parse_type()?;
                self.consume(TokenKind::RightBracket, "Expected ']' in indexed access type")?;
                let span = ty.span.combine(&self.previous_span());
                ty = TypeAnnotation::new(TypeKind::Other, span);
            }
        }
        Ok(ty)
    }

    fn parse_primary_type(&mut self) -> Result<TypeAnnotation, ParserError> {
        let start = self.current_span();
        let token = self.current().clone();
        match token.kind {
            TokenKind::Identifier(name) => self.parse_named_type(name),
            TokenKind::Null | TokenKind::Void => {
                self.advance();
                let name = if matches!(token.kind, TokenKind::Null) { "null" } else { "void" };
                Ok(TypeAnnotation::new(TypeKind::Named(name.to_string(), Vec::new()), start))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(TypeAnnotation::new(TypeKind::Other, start))
            }
            TokenKind::String(_) | TokenKind::Number(_) | TokenKind::Template(_) => {
                self.advance();
                Ok(TypeAnnotation::new(TypeKind::Other, start))
            }
            TokenKind::Minus => {
                self.advance();
                self.consume(TokenKind::Number(0.0), "Expected number in literal type")?;
                Ok(TypeAnnotation::new(TypeKind::Other, start.combine(&self.previous_span())))
            }
            TokenKind::Typeof => {
                self.advance();
                self.parse_property_name()?;
                while self.match_token(&[TokenKind::Dot]) {
                    self.parse_property_name()?;
                }
                Ok(TypeAnnotation::new(TypeKind::Other, start.combine(&self.previous_span())))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(&TokenKind::RightBracket) && !self.is_at_end() {
                    // Labeled and optional tuple members: `[name?: T, ...rest: U[]]`
                    self.match_token(&[TokenKind::DotDotDot]);
                    if matches!(self.current().kind, TokenKind::Identifier(_))
                        && matches!(
                            self.peek_kind(1),
                            Some(TokenKind::Colon) | Some(TokenKind::Question)
                        )
                    {
                        self.advance();
                        self.match_token(&[TokenKind::Question]);
                        self.consume(TokenKind::Colon, "Expected ':' in labeled tuple element")?;
                    }
                    elements.push(self.parse_type()?);
                    self.match_token(&[TokenKind::Question]);
                    if !self.match_token(&[TokenKind::Comma]) {
                        break;
                    }
                }
                self.consume(TokenKind::RightBracket, "Expected ']' after tuple type")?;
                Ok(TypeAnnotation::new(
                    TypeKind::Tuple(elements),
                    start.combine(&self.previous_span()),
                ))
            }
            TokenKind::LeftBrace => {
                self.skip_balanced()?;
                Ok(TypeAnnotation::new(TypeKind::Other, start.combine(&self.previous_span())))
            }
            TokenKind::LeftParen => {
                if self.is_function_type() {
                    self.skip_balanced()?;
                    self.consume(TokenKind::Arrow, "Expected '=>' in function type")?;
                    let result = self.parse_type()?;
                    let span = start.combine(&result.span);
                    Ok(TypeAnnotation::new(TypeKind::Function(Box::new(result)), span))
                } else {
                    self.advance();
                    let inner = self.parse_type()?;
                    self.consume(TokenKind::RightParen, "Expected ')' after type")?;
                    Ok(inner)
                }
            }
            TokenKind::New => {
                self.advance();
                self.parse_primary_type()?;
                Ok(TypeAnnotation::new(TypeKind::Other, start.combine(&self.previous_span())))
            }
            _ => Err(self.unexpected("type")),
        }
    }

    fn parse_named_type(&mut self, name: String) -> Result<TypeAnnotation, ParserError> {
        let start = self.current_span();
        self.advance();

        match name.as_str() {
            "keyof" | "unique" | "infer" => {
                self.parse_postfix_type()?;
                return Ok(TypeAnnotation::new(TypeKind::Other, start.combine(&self.previous_span())));
            }
            // `readonly T[]` is still an array
            "readonly" => return self.parse_postfix_type(),
            _ => {}
        }

        let mut qualified = name;
        while self.check(&TokenKind::Dot) {
            self.advance();
            let part = self.parse_property_name()?;
            qualified.push('.');
            qualified.push_str(&part.node);
        }

        let mut arguments = Vec::new();
        if self.check(&TokenKind::Less) && !self.current().newline_before {
            self.advance();
            loop {
                arguments.push(self.parse_type()?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
            self.consume_type_argument_close()?;
        }

        let span = start.combine(&self.previous_span());
        let kind = match qualified.as_str() {
            "string" | "String" => TypeKind::String,
            "number" | "Number" => TypeKind::Number,
            "boolean" | "Boolean" => TypeKind::Boolean,
            _ => TypeKind::Named(qualified, arguments),
        };
        Ok(TypeAnnotation::new(kind, span))
    }

    /// `>` closing a type argument list; `>>` and `>>>` close several lists at once
    pub(super) fn consume_type_argument_close(&mut self) -> Result<(), ParserError> {
        let span = self.current_span();
        let newline_before = self.current().newline_before;
        let remainder = match self.current().kind {
            TokenKind::Greater => {
                self.advance();
                return Ok(());
            }
            TokenKind::GreaterGreater => TokenKind::Greater,
            TokenKind::GreaterGreaterGreater => TokenKind::GreaterGreater,
            TokenKind::GreaterEqual => TokenKind::Equal,
            _ => return Err(self.unexpected("'>' after type arguments")),
        };
        // Split the compound token and leave the remainder in place
        let mut rest_span = span;
        rest_span.start += 1;
        rest_span.column += 1;
        let original = std::mem::replace(
            &mut self.tokens[self.position],
            Token::new(remainder, rest_span, newline_before),
        );
        self.splits.push((self.position, original));
        Ok(())
    }

    /// Skips `<T, U extends V = W>` after a function or type name
    pub(super) fn skip_type_parameters(&mut self) -> Result<(), ParserError> {
        if !self.check(&TokenKind::Less) {
            return Ok(());
        }
        self.advance();
        loop {
            self.parse_identifier()?;
            if self.check_identifier("extends") {
                self.advance();
                self.parse_type()?;
            }
            if self.match_token(&[TokenKind::Equal]) {
                self.parse_type()?;
            }
            if !self.match_token(&[TokenKind::Comma]) || self.check(&TokenKind::Greater) {
                break;
            }
        }
        self.consume_type_argument_close()
    }

    /// Return type annotation, including `x is T` predicates
    pub(super) fn parse_return_type(&mut self) -> Result<Option<TypeAnnotation>, ParserError> {
        if !self.match_token(&[TokenKind::Colon]) {
            return Ok(None);
        }
        if self.check_identifier("asserts") {
            self.advance();
        }
        let ty = self.parse_type()?;
        if self.check_identifier("is") && !self.current().newline_before {
            self.advance();
            self.parse_type()?;
            return Ok(Some(TypeAnnotation::new(TypeKind::Other, ty.span)));
        }
        Ok(Some(ty))
    }

    fn is_function_type(&self) -> bool {
        match self.matching_close(self.position) {
            Some(after) => matches!(self.tokens.get(after).map(|t| &t.kind), Some(TokenKind::Arrow)),
            None => false,
        }
    }

    /// Skips a bracketed group starting at the current token
    pub(super) fn skip_balanced(&mut self) -> Result<(), ParserError> {
        match self.matching_close(self.position) {
            Some(after) => {
                self.position = after;
                Ok(())
            }
            None => Err(self.unexpected("closing bracket")),
        }
    }
}
