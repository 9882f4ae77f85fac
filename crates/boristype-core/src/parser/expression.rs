use super::{Parser, ParserError, PatternParser, StatementParser, TypeParser};
use crate::ast::expression::*;
use crate::ast::Spanned;
use crate::lexer::TokenKind;
use crate::span::Span;

pub trait ExpressionParser {
    /// Full expression, including the comma operator
    fn parse_expression(&mut self) -> Result<Expression, ParserError>;
    /// A single assignment-level expression, as in an argument or initializer
    fn parse_assignment_expression(&mut self) -> Result<Expression, ParserError>;
}

impl ExpressionParser for Parser {
    fn parse_expression(&mut self) -> Result<Expression, ParserError> {
        let first = self.parse_assignment_expression()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let start = first.span;
        let mut expressions = vec![first];
        while self.match_token(&[TokenKind::Comma]) {
            expressions.push(self.parse_assignment_expression()?);
        }
        let span = start.combine(&self.previous_span());
        Ok(self.node(ExpressionKind::Sequence(expressions), span))
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, ParserError> {
        self.nested(|parser| parser.parse_assignment_level())
    }
}

impl Parser {
    fn parse_assignment_level(&mut self) -> Result<Expression, ParserError> {
        if let Some(arrow) = self.parse_arrow_if_present()? {
            return Ok(arrow);
        }
        if self.check_identifier("async")
            && matches!(
                self.peek_kind(1),
                Some(TokenKind::Function) | Some(TokenKind::LeftParen) | Some(TokenKind::Identifier(_))
            )
            && !self.peek(1).map(|t| t.newline_before).unwrap_or(false)
        {
            return Err(self.unsupported("Async functions"));
        }

        let target = self.parse_conditional()?;

        let op = match assignment_operator(&self.current().kind) {
            Some(op) => op,
            None => return Ok(target),
        };

        match &target.kind {
            ExpressionKind::Identifier(_)
            | ExpressionKind::Member(..)
            | ExpressionKind::Index(..)
            | ExpressionKind::Parenthesized(_) => {}
            ExpressionKind::Array(_) | ExpressionKind::Object(_) => {
                return Err(self.unsupported("Destructuring assignment"));
            }
            _ => return Err(self.unexpected("assignable expression before assignment operator")),
        }

        self.advance();
        let value = self.parse_assignment_expression()?;
        let span = target.span.combine(&value.span);
        Ok(self.node(
            ExpressionKind::Assignment(Box::new(target), op, Box::new(value)),
            span,
        ))
    }

    fn parse_conditional(&mut self) -> Result<Expression, ParserError> {
        let test = self.parse_binary(0)?;
        if !self.match_token(&[TokenKind::Question]) {
            return Ok(test);
        }

        let allow_in = std::mem::replace(&mut self.allow_in, true);
        let consequent = self.parse_assignment_expression();
        self.allow_in = allow_in;
        let consequent = consequent?;

        self.consume(TokenKind::Colon, "Expected ':' in conditional expression")?;
        let alternate = self.parse_assignment_expression()?;
        let span = test.span.combine(&alternate.span);
        Ok(self.node(
            ExpressionKind::Conditional(Box::new(test), Box::new(consequent), Box::new(alternate)),
            span,
        ))
    }

    /// Precedence climbing over the binary operators
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression, ParserError> {
        let mut left = self.parse_unary()?;

        loop {
            // Type assertions bind like relational operators and are erased
            if (self.check_identifier("as") || self.check_identifier("satisfies"))
                && !self.current().newline_before
                && min_precedence <= 8
            {
                self.advance();
                if !self.match_token(&[TokenKind::Const]) {
                    self.parse_type()?;
                }
                continue;
            }

            let op = match binary_operator(&self.current().kind) {
                Some(BinaryOp::In) if !self.allow_in => break,
                Some(op) => op,
                None => break,
            };
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }

            self.advance();
            let next_min = if op.is_right_associative() {
                precedence
            } else {
                precedence + 1
            };
            let right = self.nested(|parser| parser.parse_binary(next_min))?;
            let span = left.span.combine(&right.span);
            left = self.node(ExpressionKind::Binary(op, Box::new(left), Box::new(right)), span);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParserError> {
        self.nested(|parser| parser.parse_unary_level())
    }

    fn parse_unary_level(&mut self) -> Result<Expression, ParserError> {
        let start = self.current_span();
        let op = match &self.current().kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Tilde => Some(UnaryOp::BitwiseNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.combine(&operand.span);
            return Ok(self.node(ExpressionKind::Unary(op, Box::new(operand)), span));
        }

        let update = match &self.current().kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.combine(&operand.span);
            return Ok(self.node(
                ExpressionKind::Update(op, UpdatePosition::Prefix, Box::new(operand)),
                span,
            ));
        }

        // `<T>value` cast
        if self.check(&TokenKind::Less) {
            self.advance();
            self.parse_type()?;
            self.consume_type_argument_close()?;
            return self.parse_unary();
        }

        if self.check_identifier("await")
            && !self.peek(1).map(|t| t.newline_before).unwrap_or(true)
            && self.peek_kind(1).map(starts_operand).unwrap_or(false)
        {
            return Err(self.unsupported("'await'"));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParserError> {
        let operand = self.parse_call_member()?;
        if self.current().newline_before {
            return Ok(operand);
        }

        let op = match &self.current().kind {
            TokenKind::PlusPlus => UpdateOp::Increment,
            TokenKind::MinusMinus => UpdateOp::Decrement,
            _ => return Ok(operand),
        };
        self.advance();
        let span = operand.span.combine(&self.previous_span());
        Ok(self.node(
            ExpressionKind::Update(op, UpdatePosition::Postfix, Box::new(operand)),
            span,
        ))
    }

    fn parse_call_member(&mut self) -> Result<Expression, ParserError> {
        let mut expr = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            match &self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_property_name()?;
                    let span = expr.span.combine(&property.span);
                    expr = self.node(ExpressionKind::Member(Box::new(expr), property), span);
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let allow_in = std::mem::replace(&mut self.allow_in, true);
                    let index = self.parse_expression();
                    self.allow_in = allow_in;
                    let index = index?;
                    self.consume(TokenKind::RightBracket, "Expected ']' after index")?;
                    let span = expr.span.combine(&self.previous_span());
                    expr = self.node(ExpressionKind::Index(Box::new(expr), Box::new(index)), span);
                }
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    let span = expr.span.combine(&self.previous_span());
                    expr = self.node(ExpressionKind::Call(Box::new(expr), arguments), span);
                }
                TokenKind::Less => {
                    // `f<T>(x)`; anything else is a comparison
                    let has_type_arguments = self
                        .try_parse(|parser| {
                            parser.skip_type_arguments()?;
                            if parser.check(&TokenKind::LeftParen) {
                                Ok(())
                            } else {
                                Err(parser.unexpected("'(' after type arguments"))
                            }
                        })
                        .is_some();
                    if !has_type_arguments {
                        break;
                    }
                }
                TokenKind::Bang if !self.current().newline_before => {
                    // Non-null assertion
                    self.advance();
                }
                TokenKind::QuestionDot => return Err(self.unsupported("Optional chaining")),
                TokenKind::Template(_) => return Err(self.unsupported("Tagged templates")),
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_new(&mut self) -> Result<Expression, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::New, "Expected 'new'")?;

        let mut callee = if self.check(&TokenKind::New) {
            self.nested(|parser| parser.parse_new())?
        } else {
            self.parse_primary()?
        };
        loop {
            if self.match_token(&[TokenKind::Dot]) {
                let property = self.parse_property_name()?;
                let span = callee.span.combine(&property.span);
                callee = self.node(ExpressionKind::Member(Box::new(callee), property), span);
            } else if self.match_token(&[TokenKind::LeftBracket]) {
                let index = self.parse_expression()?;
                self.consume(TokenKind::RightBracket, "Expected ']' after index")?;
                let span = callee.span.combine(&self.previous_span());
                callee = self.node(ExpressionKind::Index(Box::new(callee), Box::new(index)), span);
            } else {
                break;
            }
        }
        if self.check(&TokenKind::Less) {
            self.skip_type_arguments()?;
        }

        let arguments = if self.check(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        let span = start.combine(&self.previous_span());
        Ok(self.node(ExpressionKind::New(Box::new(callee), arguments), span))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParserError> {
        self.consume(TokenKind::LeftParen, "Expected '('")?;
        let allow_in = std::mem::replace(&mut self.allow_in, true);
        let arguments = self.parse_argument_list();
        self.allow_in = allow_in;
        let arguments = arguments?;
        self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
        Ok(arguments)
    }

    fn parse_argument_list(&mut self) -> Result<Vec<Expression>, ParserError> {
        let mut arguments = Vec::new();
        while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
            if self.check(&TokenKind::DotDotDot) {
                return Err(self.unsupported("Spread arguments"));
            }
            arguments.push(self.parse_assignment_expression()?);
            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
        }
        Ok(arguments)
    }

    fn skip_type_arguments(&mut self) -> Result<(), ParserError> {
        self.consume(TokenKind::Less, "Expected '<'")?;
        loop {
            self.parse_type()?;
            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
        }
        self.consume_type_argument_close()
    }

    fn parse_primary(&mut self) -> Result<Expression, ParserError> {
        let token = self.current().clone();
        let span = token.span;

        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(self.node(ExpressionKind::Identifier(name), span))
            }
            TokenKind::Number(value) => {
                self.advance();
                Ok(self.node(ExpressionKind::Literal(Literal::Number(value)), span))
            }
            TokenKind::String(value) => {
                self.advance();
                Ok(self.node(ExpressionKind::Literal(Literal::String(value)), span))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                let value = matches!(token.kind, TokenKind::True);
                Ok(self.node(ExpressionKind::Literal(Literal::Boolean(value)), span))
            }
            TokenKind::Null => {
                self.advance();
                Ok(self.node(ExpressionKind::Literal(Literal::Null), span))
            }
            TokenKind::This => {
                self.advance();
                Ok(self.node(ExpressionKind::This, span))
            }
            TokenKind::Template(template) => {
                self.advance();
                let mut expressions = Vec::with_capacity(template.substitutions.len());
                for tokens in template.substitutions {
                    expressions.push(self.parse_nested_expression(tokens)?);
                }
                Ok(self.node(
                    ExpressionKind::Template(TemplateLiteral {
                        quasis: template.quasis,
                        expressions,
                        span,
                    }),
                    span,
                ))
            }
            TokenKind::LeftParen => {
                self.advance();
                let allow_in = std::mem::replace(&mut self.allow_in, true);
                let inner = self.parse_expression();
                self.allow_in = allow_in;
                let inner = inner?;
                self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
                let span = span.combine(&self.previous_span());
                Ok(self.node(ExpressionKind::Parenthesized(Box::new(inner)), span))
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            TokenKind::Function => {
                self.advance();
                if self.check(&TokenKind::Star) {
                    return Err(self.unsupported("Generator functions"));
                }
                let name = if matches!(self.current().kind, TokenKind::Identifier(_)) {
                    Some(self.parse_identifier()?)
                } else {
                    None
                };
                let function = self.parse_function_tail(name, span)?;
                let span = function.span;
                Ok(self.node(ExpressionKind::Function(function), span))
            }
            TokenKind::Class => Err(self.unsupported("Classes")),
            TokenKind::Slash | TokenKind::SlashEqual => {
                Err(self.unsupported("Regular expression literals"))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expression, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::LeftBracket, "Expected '['")?;
        let allow_in = std::mem::replace(&mut self.allow_in, true);

        let mut elements = Vec::new();
        let result = (|| {
            while !self.check(&TokenKind::RightBracket) && !self.is_at_end() {
                if self.match_token(&[TokenKind::Comma]) {
                    elements.push(ArrayElement::Hole);
                    continue;
                }
                if self.match_token(&[TokenKind::DotDotDot]) {
                    elements.push(ArrayElement::Spread(self.parse_assignment_expression()?));
                } else {
                    elements.push(ArrayElement::Expression(self.parse_assignment_expression()?));
                }
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
            Ok::<(), ParserError>(())
        })();
        self.allow_in = allow_in;
        result?;

        self.consume(TokenKind::RightBracket, "Expected ']' after array elements")?;
        let span = start.combine(&self.previous_span());
        Ok(self.node(ExpressionKind::Array(elements), span))
    }

    fn parse_object_literal(&mut self) -> Result<Expression, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::LeftBrace, "Expected '{'")?;
        let allow_in = std::mem::replace(&mut self.allow_in, true);

        let mut properties = Vec::new();
        let result = (|| {
            while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
                properties.push(self.parse_object_property()?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
            Ok::<(), ParserError>(())
        })();
        self.allow_in = allow_in;
        result?;

        self.consume(TokenKind::RightBrace, "Expected '}' after object literal")?;
        let span = start.combine(&self.previous_span());
        Ok(self.node(ExpressionKind::Object(properties), span))
    }

    fn parse_object_property(&mut self) -> Result<ObjectProperty, ParserError> {
        let start = self.current_span();

        if self.match_token(&[TokenKind::DotDotDot]) {
            let value = self.parse_assignment_expression()?;
            let span = start.combine(&value.span);
            return Ok(ObjectProperty::Spread { value, span });
        }
        if self.check(&TokenKind::LeftBracket) {
            return Err(self.unsupported("Computed property keys"));
        }
        if self.check(&TokenKind::Star) {
            return Err(self.unsupported("Generator methods"));
        }
        for modifier in ["get", "set", "async"] {
            if self.check_identifier(modifier) && self.peek_kind(1).map(starts_property_key).unwrap_or(false) {
                return Err(self.unsupported(&format!("'{}' properties", modifier)));
            }
        }

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
            _ => (PropertyKey::Identifier(self.parse_property_name()?), None),
        };

        if self.match_token(&[TokenKind::Colon]) {
            let value = self.parse_assignment_expression()?;
            let span = start.combine(&value.span);
            return Ok(ObjectProperty::Property { key, value, span });
        }

        if self.check(&TokenKind::LeftParen) || self.check(&TokenKind::Less) {
            let function = self.parse_function_tail(None, start)?;
            let span = function.span;
            return Ok(ObjectProperty::Method {
                key,
                function,
                span,
            });
        }

        match shorthand {
            Some(ident) => {
                if self.check(&TokenKind::Equal) {
                    return Err(self.unexpected("',' or '}' after shorthand property"));
                }
                Ok(ObjectProperty::Shorthand(ident))
            }
            None => Err(self.unexpected("':' after property key")),
        }
    }

    /// Parameters, return type and body of a function whose name is already consumed
    pub(super) fn parse_function_tail(
        &mut self,
        name: Option<crate::ast::Ident>,
        start: Span,
    ) -> Result<FunctionExpression, ParserError> {
        self.skip_type_parameters()?;
        let parameters = self.parse_parameters()?;
        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;
        Ok(FunctionExpression {
            name,
            parameters,
            return_type,
            span: start.combine(&body.span),
            body,
        })
    }

    /// Recognizes `x => ...`, `(a, b) => ...` and `<T>(a: T): R => ...`
    fn parse_arrow_if_present(&mut self) -> Result<Option<Expression>, ParserError> {
        match &self.current().kind {
            TokenKind::Identifier(_) if self.peek_kind(1) == Some(&TokenKind::Arrow) => {
                self.parse_arrow_function().map(Some)
            }
            TokenKind::LeftParen => match self.matching_close(self.position) {
                Some(after) => match self.tokens.get(after).map(|t| &t.kind) {
                    Some(TokenKind::Arrow) => self.parse_arrow_function().map(Some),
                    Some(TokenKind::Colon) => Ok(self.try_parse(|p| p.parse_arrow_function())),
                    _ => Ok(None),
                },
                None => Ok(None),
            },
            TokenKind::Less => Ok(self.try_parse(|p| p.parse_arrow_function())),
            _ => Ok(None),
        }
    }

    fn parse_arrow_function(&mut self) -> Result<Expression, ParserError> {
        let start = self.current_span();

        let parameters = if matches!(self.current().kind, TokenKind::Identifier(_)) {
            vec![Parameter::identifier(self.parse_identifier()?)]
        } else {
            self.skip_type_parameters()?;
            self.parse_parameters()?
        };
        let return_type = self.parse_return_type()?;

        if self.current().newline_before {
            return Err(self.unexpected("'=>' on the same line as the parameters"));
        }
        self.consume(TokenKind::Arrow, "Expected '=>'")?;

        let body = if self.check(&TokenKind::LeftBrace) {
            ArrowBody::Block(self.parse_block()?)
        } else {
            ArrowBody::Expression(Box::new(self.parse_assignment_expression()?))
        };
        let end = match &body {
            ArrowBody::Block(block) => block.span,
            ArrowBody::Expression(expr) => expr.span,
        };
        let span = start.combine(&end);

        Ok(self.node(
            ExpressionKind::Arrow(ArrowFunction {
                parameters,
                return_type,
                body,
                span,
            }),
            span,
        ))
    }
}

fn assignment_operator(kind: &TokenKind) -> Option<AssignmentOp> {
    let op = match kind {
        TokenKind::Equal => AssignmentOp::Assign,
        TokenKind::PlusEqual => AssignmentOp::AddAssign,
        TokenKind::MinusEqual => AssignmentOp::SubtractAssign,
        TokenKind::StarEqual => AssignmentOp::MultiplyAssign,
        TokenKind::SlashEqual => AssignmentOp::DivideAssign,
        TokenKind::PercentEqual => AssignmentOp::ModuloAssign,
        TokenKind::StarStarEqual => AssignmentOp::PowerAssign,
        TokenKind::AmpersandEqual => AssignmentOp::BitwiseAndAssign,
        TokenKind::PipeEqual => AssignmentOp::BitwiseOrAssign,
        TokenKind::CaretEqual => AssignmentOp::BitwiseXorAssign,
        TokenKind::LessLessEqual => AssignmentOp::LeftShiftAssign,
        TokenKind::GreaterGreaterEqual => AssignmentOp::RightShiftAssign,
        TokenKind::GreaterGreaterGreaterEqual => AssignmentOp::UnsignedShiftAssign,
        TokenKind::AmpersandAmpersandEqual => AssignmentOp::AndAssign,
        TokenKind::PipePipeEqual => AssignmentOp::OrAssign,
        TokenKind::QuestionQuestionEqual => AssignmentOp::NullishAssign,
        _ => return None,
    };
    Some(op)
}

fn binary_operator(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Percent => BinaryOp::Modulo,
        TokenKind::StarStar => BinaryOp::Power,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,
        TokenKind::EqualEqualEqual => BinaryOp::StrictEqual,
        TokenKind::BangEqualEqual => BinaryOp::StrictNotEqual,
        TokenKind::Less => BinaryOp::LessThan,
        TokenKind::LessEqual => BinaryOp::LessThanOrEqual,
        TokenKind::Greater => BinaryOp::GreaterThan,
        TokenKind::GreaterEqual => BinaryOp::GreaterThanOrEqual,
        TokenKind::AmpersandAmpersand => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        TokenKind::QuestionQuestion => BinaryOp::NullishCoalesce,
        TokenKind::Ampersand => BinaryOp::BitwiseAnd,
        TokenKind::Pipe => BinaryOp::BitwiseOr,
        TokenKind::Caret => BinaryOp::BitwiseXor,
        TokenKind::LessLess => BinaryOp::ShiftLeft,
        TokenKind::GreaterGreater => BinaryOp::ShiftRight,
        TokenKind::GreaterGreaterGreater => BinaryOp::UnsignedShiftRight,
        TokenKind::Instanceof => BinaryOp::Instanceof,
        TokenKind::In => BinaryOp::In,
        _ => return None,
    };
    Some(op)
}

fn starts_operand(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier(_)
            | TokenKind::Number(_)
            | TokenKind::String(_)
            | TokenKind::Template(_)
            | TokenKind::LeftParen
            | TokenKind::LeftBracket
            | TokenKind::LeftBrace
            | TokenKind::New
            | TokenKind::This
            | TokenKind::Function
    )
}

fn starts_property_key(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier(_) | TokenKind::String(_) | TokenKind::Number(_) | TokenKind::LeftBracket
    ) || kind.keyword_text().is_some()
}
