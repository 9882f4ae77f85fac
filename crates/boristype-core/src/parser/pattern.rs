use super::{ExpressionParser, Parser, ParserError, TypeParser};
use crate::ast::expression::{Parameter, PropertyKey};
use crate::ast::pattern::*;
use crate::ast::Spanned;
use crate::lexer::TokenKind;

pub trait PatternParser {
    fn parse_binding_pattern(&mut self) -> Result<Pattern, ParserError>;
    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, ParserError>;
}

impl PatternParser for Parser {
    fn parse_binding_pattern(&mut self) -> Result<Pattern, ParserError> {
        match &self.current().kind {
            TokenKind::Identifier(_) => Ok(Pattern::Identifier(self.parse_identifier()?)),
            TokenKind::LeftBrace => self.nested(|parser| parser.parse_object_pattern()),
            TokenKind::LeftBracket => self.nested(|parser| parser.parse_array_pattern()),
            _ => Err(self.unexpected("binding pattern")),
        }
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, ParserError> {
        self.consume(TokenKind::LeftParen, "Expected '(' before parameters")?;
        let mut parameters = Vec::new();

        while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
            // `this: Type` only annotates the receiver
            if self.check(&TokenKind::This) {
                self.advance();
                if self.match_token(&[TokenKind::Colon]) {
                    self.parse_type()?;
                }
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
                continue;
            }
            if self.check(&TokenKind::DotDotDot) {
                return Err(self.unsupported("Rest parameters"));
            }

            let start = self.current_span();
            let pattern = self.parse_binding_pattern()?;
            self.match_token(&[TokenKind::Question]);
            let type_annotation = if self.match_token(&[TokenKind::Colon]) {
                Some(self.parse_type()?)
            } else {
                None
            };
            let default = if self.match_token(&[TokenKind::Equal]) {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };

            parameters.push(Parameter {
                pattern,
                type_annotation,
                default,
                span: start.combine(&self.previous_span()),
            });

            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
        }

        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;
        Ok(parameters)
    }
}

impl Parser {
    fn parse_object_pattern(&mut self) -> Result<Pattern, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::LeftBrace, "Expected '{'")?;

        let mut properties = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if self.match_token(&[TokenKind::DotDotDot]) {
                rest = Some(self.parse_rest_target()?);
                if !self.check(&TokenKind::RightBrace) {
                    return Err(self.unexpected("'}' after rest element"));
                }
                break;
            }

            let property_start = self.current_span();
            let token = self.current().clone();
            let (key, shorthand) = match &token.kind {
                TokenKind::Identifier(name) => {
                    self.advance();
                    let ident = Spanned::new(name.clone(), token.span);
                    (PropertyKey::Identifier(ident.clone()), Some(ident))
                }
                TokenKind::String(value) => {
                    self.advance();
                    (PropertyKey::String(value.clone()), None)
                }
                TokenKind::Number(value) => {
                    self.advance();
                    (PropertyKey::Number(*value), None)
                }
                TokenKind::LeftBracket => return Err(self.unsupported("Computed property keys")),
                _ => (PropertyKey::Identifier(self.parse_property_name()?), None),
            };

            let value = if self.match_token(&[TokenKind::Colon]) {
                self.parse_binding_pattern()?
            } else {
                match shorthand {
                    Some(ident) => Pattern::Identifier(ident),
                    None => return Err(self.unexpected("':' after property key")),
                }
            };

            let default = if self.match_token(&[TokenKind::Equal]) {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };

            properties.push(ObjectPatternProperty {
                key,
                value,
                default,
                span: property_start.combine(&self.previous_span()),
            });

            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after object pattern")?;
        Ok(Pattern::Object(ObjectPattern {
            properties,
            rest,
            span: start.combine(&self.previous_span()),
        }))
    }

    fn parse_array_pattern(&mut self) -> Result<Pattern, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::LeftBracket, "Expected '['")?;

        let mut elements = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RightBracket) && !self.is_at_end() {
            if self.match_token(&[TokenKind::Comma]) {
                elements.push(None);
                continue;
            }
            if self.match_token(&[TokenKind::DotDotDot]) {
                rest = Some(self.parse_rest_target()?);
                if !self.check(&TokenKind::RightBracket) {
                    return Err(self.unexpected("']' after rest element"));
                }
                break;
            }

            let pattern = self.parse_binding_pattern()?;
            let default = if self.match_token(&[TokenKind::Equal]) {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            elements.push(Some(ArrayPatternElement { pattern, default }));

            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
        }

        self.consume(TokenKind::RightBracket, "Expected ']' after array pattern")?;
        Ok(Pattern::Array(ArrayPattern {
            elements,
            rest,
            span: start.combine(&self.previous_span()),
        }))
    }

    fn parse_rest_target(&mut self) -> Result<crate::ast::Ident, ParserError> {
        if matches!(
            self.current().kind,
            TokenKind::LeftBrace | TokenKind::LeftBracket
        ) {
            return Err(self.unsupported("Destructuring a rest element"));
        }
        self.parse_identifier()
    }
}
