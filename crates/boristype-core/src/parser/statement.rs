use super::{ExpressionParser, Parser, ParserError, PatternParser, TypeParser};
use crate::ast::expression::Expression;
use crate::ast::statement::*;
use crate::ast::Ident;
use crate::lexer::TokenKind;
use crate::span::Span;

pub trait StatementParser {
    fn parse_statement(&mut self) -> Result<Statement, ParserError>;
    fn parse_block(&mut self) -> Result<Block, ParserError>;
}

impl StatementParser for Parser {
    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        self.nested(|parser| parser.parse_statement_level())
    }

    fn parse_block(&mut self) -> Result<Block, ParserError> {
        let start_span = self.current_span();
        self.consume(TokenKind::LeftBrace, "Expected '{'")?;

        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after block")?;
        Ok(Block {
            statements,
            span: start_span.combine(&self.previous_span()),
        })
    }
}

impl Parser {
    fn parse_statement_level(&mut self) -> Result<Statement, ParserError> {
        match &self.current().kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                if self.check(&TokenKind::Const) && self.peek_identifier_is(1, "enum") {
                    return Err(self.unsupported("Enums"));
                }
                let declaration = self.parse_variable_declaration()?;
                self.consume_semicolon()?;
                Ok(Statement::Variable(declaration))
            }
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break | TokenKind::Continue => self.parse_jump_statement(),
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                let span = self.current_span();
                self.advance();
                Ok(Statement::Empty(span))
            }
            TokenKind::Import => self.parse_import_declaration(),
            TokenKind::Export => self.parse_export_declaration(),
            TokenKind::Class => Err(self.unsupported("Classes")),
            TokenKind::At => Err(self.unsupported("Decorators")),
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.parse_contextual_statement(&name)
            }
            _ => self.parse_expression_statement(),
        }
    }
}

// Statement implementations
impl Parser {
    fn peek_identifier_is(&self, offset: usize, name: &str) -> bool {
        matches!(self.peek_kind(offset), Some(TokenKind::Identifier(n)) if n == name)
    }

    /// Statements introduced by a contextual keyword such as `type` or `declare`
    fn parse_contextual_statement(&mut self, name: &str) -> Result<Statement, ParserError> {
        let next = self.peek(1).cloned();
        let next_on_same_line = next.as_ref().map(|t| !t.newline_before).unwrap_or(false);
        let next_is_identifier = matches!(
            next.as_ref().map(|t| &t.kind),
            Some(TokenKind::Identifier(_))
        );

        match name {
            "type" if next_is_identifier && next_on_same_line => self.parse_type_alias(),
            "interface" if next_is_identifier && next_on_same_line => self.parse_interface(),
            "declare" if next_on_same_line && next.is_some() => {
                let start = self.current_span();
                self.advance();
                self.parse_statement()?;
                Ok(Statement::Empty(start.combine(&self.previous_span())))
            }
            "abstract" if matches!(next.as_ref().map(|t| &t.kind), Some(TokenKind::Class)) => {
                Err(self.unsupported("Classes"))
            }
            "enum" if next_is_identifier && next_on_same_line => Err(self.unsupported("Enums")),
            "namespace" | "module" if next_is_identifier && next_on_same_line => {
                Err(self.unsupported("Namespaces"))
            }
            "async" if matches!(next.as_ref().map(|t| &t.kind), Some(TokenKind::Function)) => {
                Err(self.unsupported("Async functions"))
            }
            _ if matches!(next.as_ref().map(|t| &t.kind), Some(TokenKind::Colon)) => {
                Err(self.unsupported("Labeled statements"))
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParserError> {
        let expr = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Expression(expr))
    }

    fn parse_variable_kind(&mut self) -> Result<VariableKind, ParserError> {
        let kind = match self.current().kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            _ => return Err(self.unexpected("'var', 'let' or 'const'")),
        };
        self.advance();
        Ok(kind)
    }

    /// Declaration without its terminator, shared with `for` heads
    fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration, ParserError> {
        let start = self.current_span();
        let kind = self.parse_variable_kind()?;
        let mut declarators = Vec::new();

        loop {
            let declarator_start = self.current_span();
            let pattern = self.parse_binding_pattern()?;
            declarators.push(self.parse_declarator_rest(pattern, declarator_start)?);
            if !self.match_token(&[TokenKind::Comma]) {
                break;
            }
        }

        Ok(VariableDeclaration {
            kind,
            declarators,
            span: start.combine(&self.previous_span()),
        })
    }

    /// Type annotation and initializer following a declarator's binding pattern
    fn parse_declarator_rest(
        &mut self,
        pattern: crate::ast::pattern::Pattern,
        start: Span,
    ) -> Result<VariableDeclarator, ParserError> {
        // Definite assignment assertion `let x!: T`
        self.match_token(&[TokenKind::Bang]);
        let type_annotation = if self.match_token(&[TokenKind::Colon]) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let initializer = if self.match_token(&[TokenKind::Equal]) {
            Some(self.parse_assignment_expression()?)
        } else {
            None
        };

        Ok(VariableDeclarator {
            pattern,
            type_annotation,
            initializer,
            span: start.combine(&self.previous_span()),
        })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::Function, "Expected 'function'")?;
        if self.check(&TokenKind::Star) {
            return Err(self.unsupported("Generator functions"));
        }
        let name = self.parse_identifier()?;
        self.parse_function_rest(name, start)
    }

    fn parse_function_rest(&mut self, name: Ident, start: Span) -> Result<Statement, ParserError> {
        self.skip_type_parameters()?;
        let parameters = self.parse_parameters()?;
        let return_type = self.parse_return_type()?;

        // Overload signature without a body
        if !self.check(&TokenKind::LeftBrace) {
            self.consume_semicolon()?;
            return Ok(Statement::Empty(start.combine(&self.previous_span())));
        }

        let body = self.parse_block()?;
        Ok(Statement::Function(FunctionDeclaration {
            name,
            parameters,
            return_type,
            span: start.combine(&body.span),
            body,
        }))
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::If, "Expected 'if'")?;
        let condition = self.parse_parenthesized_condition()?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.match_token(&[TokenKind::Else]) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            condition,
            consequent,
            alternate,
            span: start.combine(&self.previous_span()),
        }))
    }

    fn parse_parenthesized_condition(&mut self) -> Result<Expression, ParserError> {
        self.consume(TokenKind::LeftParen, "Expected '(' before condition")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;
        Ok(condition)
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::For, "Expected 'for'")?;
        if self.check_identifier("await") {
            return Err(self.unsupported("'for await'"));
        }
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'")?;

        let allow_in = std::mem::replace(&mut self.allow_in, false);
        let init = self.parse_for_init();
        self.allow_in = allow_in;

        let init = match init? {
            ForInitOrHead::Head(head) => return self.parse_for_in_of(head, start),
            ForInitOrHead::Init(init) => init,
        };

        self.consume(TokenKind::Semicolon, "Expected ';' after for initializer")?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after for condition")?;
        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::RightParen, "Expected ')' after for clauses")?;

        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
            span: start.combine(&self.previous_span()),
        }))
    }

    fn parse_for_init(&mut self) -> Result<ForInitOrHead, ParserError> {
        if self.check(&TokenKind::Semicolon) {
            return Ok(ForInitOrHead::Init(None));
        }

        if matches!(
            self.current().kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            let declaration_start = self.current_span();
            let kind = self.parse_variable_kind()?;
            let pattern_start = self.current_span();
            let pattern = self.parse_binding_pattern()?;

            if self.check(&TokenKind::In) || self.check_identifier("of") {
                return Ok(ForInitOrHead::Head(ForHead::Declaration {
                    kind,
                    pattern,
                    span: declaration_start.combine(&self.previous_span()),
                }));
            }

            let mut declarators = vec![self.parse_declarator_rest(pattern, pattern_start)?];
            while self.match_token(&[TokenKind::Comma]) {
                let declarator_start = self.current_span();
                let pattern = self.parse_binding_pattern()?;
                declarators.push(self.parse_declarator_rest(pattern, declarator_start)?);
            }
            return Ok(ForInitOrHead::Init(Some(ForInit::Variable(VariableDeclaration {
                kind,
                declarators,
                span: declaration_start.combine(&self.previous_span()),
            }))));
        }

        let expr = self.parse_expression()?;
        if self.check(&TokenKind::In) || self.check_identifier("of") {
            return Ok(ForInitOrHead::Head(ForHead::Target(expr)));
        }
        Ok(ForInitOrHead::Init(Some(ForInit::Expression(expr))))
    }

    fn parse_for_in_of(&mut self, head: ForHead, start: Span) -> Result<Statement, ParserError> {
        let is_of = self.check_identifier("of");
        self.advance();
        let subject = if is_of {
            self.parse_assignment_expression()?
        } else {
            self.parse_expression()?
        };
        self.consume(TokenKind::RightParen, "Expected ')' after loop head")?;
        let body = Box::new(self.parse_statement()?);
        let span = start.combine(&self.previous_span());

        if is_of {
            Ok(Statement::ForOf(ForOfStatement {
                head,
                iterable: subject,
                body,
                span,
            }))
        } else {
            Ok(Statement::ForIn(ForInStatement {
                head,
                object: subject,
                body,
                span,
            }))
        }
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::While, "Expected 'while'")?;
        let condition = self.parse_parenthesized_condition()?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::While(WhileStatement {
            condition,
            body,
            span: start.combine(&self.previous_span()),
        }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::Do, "Expected 'do'")?;
        let body = Box::new(self.parse_statement()?);
        self.consume(TokenKind::While, "Expected 'while' after do-while body")?;
        let condition = self.parse_parenthesized_condition()?;
        self.match_token(&[TokenKind::Semicolon]);

        Ok(Statement::DoWhile(DoWhileStatement {
            body,
            condition,
            span: start.combine(&self.previous_span()),
        }))
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::Switch, "Expected 'switch'")?;
        let discriminant = self.parse_parenthesized_condition()?;
        self.consume(TokenKind::LeftBrace, "Expected '{' after switch discriminant")?;

        let mut cases = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let case_start = self.current_span();
            let test = if self.match_token(&[TokenKind::Case]) {
                Some(self.parse_expression()?)
            } else {
                self.consume(TokenKind::Default, "Expected 'case' or 'default'")?;
                None
            };
            self.consume(TokenKind::Colon, "Expected ':' after case label")?;

            let mut consequent = Vec::new();
            while !matches!(
                self.current().kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
            ) {
                consequent.push(self.parse_statement()?);
            }

            cases.push(SwitchCase {
                test,
                consequent,
                span: case_start.combine(&self.previous_span()),
            });
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after switch cases")?;
        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
            span: start.combine(&self.previous_span()),
        }))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::Try, "Expected 'try'")?;
        let block = self.parse_block()?;

        let handler = if self.check(&TokenKind::Catch) {
            let catch_start = self.current_span();
            self.advance();
            let parameter = if self.match_token(&[TokenKind::LeftParen]) {
                if matches!(
                    self.current().kind,
                    TokenKind::LeftBrace | TokenKind::LeftBracket
                ) {
                    return Err(self.unsupported("Destructuring a catch parameter"));
                }
                let parameter = self.parse_identifier()?;
                if self.match_token(&[TokenKind::Colon]) {
                    self.parse_type()?;
                }
                self.consume(TokenKind::RightParen, "Expected ')' after catch parameter")?;
                Some(parameter)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause {
                parameter,
                span: catch_start.combine(&body.span),
                body,
            })
        } else {
            None
        };

        let finalizer = if self.match_token(&[TokenKind::Finally]) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.unexpected("'catch' or 'finally' after try block"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
            span: start.combine(&self.previous_span()),
        }))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::Throw, "Expected 'throw'")?;
        if self.current().newline_before {
            return Err(self.unexpected("expression on the same line as 'throw'"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;

        Ok(Statement::Throw(ThrowStatement {
            argument,
            span: start.combine(&self.previous_span()),
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::Return, "Expected 'return'")?;

        let ends_here = self.current().newline_before
            || matches!(
                self.current().kind,
                TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
            );
        let argument = if ends_here {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;

        Ok(Statement::Return(ReturnStatement {
            argument,
            span: start.combine(&self.previous_span()),
        }))
    }

    fn parse_jump_statement(&mut self) -> Result<Statement, ParserError> {
        let span = self.current_span();
        let is_break = self.check(&TokenKind::Break);
        self.advance();
        if matches!(self.current().kind, TokenKind::Identifier(_)) && !self.current().newline_before {
            return Err(self.unsupported("Labeled jumps"));
        }
        self.consume_semicolon()?;
        Ok(if is_break {
            Statement::Break(span)
        } else {
            Statement::Continue(span)
        })
    }

    fn parse_type_alias(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.advance();
        self.parse_identifier()?;
        self.skip_type_parameters()?;
        self.consume(TokenKind::Equal, "Expected '=' in type alias")?;
        self.parse_type()?;
        self.consume_semicolon()?;
        Ok(Statement::Empty(start.combine(&self.previous_span())))
    }

    fn parse_interface(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.advance();
        self.parse_identifier()?;
        self.skip_type_parameters()?;
        if self.check_identifier("extends") {
            self.advance();
            loop {
                self.parse_type()?;
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        if !self.check(&TokenKind::LeftBrace) {
            return Err(self.unexpected("'{' to open interface body"));
        }
        self.skip_balanced()?;
        Ok(Statement::Empty(start.combine(&self.previous_span())))
    }

    fn parse_import_declaration(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::Import, "Expected 'import'")?;

        // `import "./polyfill";`
        if let TokenKind::String(source) = self.current().kind.clone() {
            self.advance();
            self.consume_semicolon()?;
            return Ok(Statement::Import(ImportDeclaration {
                specifiers: Vec::new(),
                source,
                span: start.combine(&self.previous_span()),
            }));
        }

        // Type-only imports are erased
        if self.check_identifier("type") && !self.peek_identifier_is(1, "from") {
            self.skip_to_module_source()?;
            return Ok(Statement::Empty(start.combine(&self.previous_span())));
        }

        let mut specifiers = Vec::new();
        if matches!(self.current().kind, TokenKind::Identifier(_)) {
            let local = self.parse_identifier()?;
            if self.check(&TokenKind::Equal) {
                return Err(self.unsupported("'import = require'"));
            }
            specifiers.push(ImportSpecifier::Default(local));
            self.match_token(&[TokenKind::Comma]);
        }

        if self.match_token(&[TokenKind::Star]) {
            if !self.check_identifier("as") {
                return Err(self.unexpected("'as' after '*'"));
            }
            self.advance();
            specifiers.push(ImportSpecifier::Namespace(self.parse_identifier()?));
        } else if self.match_token(&[TokenKind::LeftBrace]) {
            while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
                let type_only = self.check_identifier("type")
                    && !matches!(
                        self.peek_kind(1),
                        Some(TokenKind::Comma) | Some(TokenKind::RightBrace)
                    )
                    && !self.peek_identifier_is(1, "as");
                if type_only {
                    self.advance();
                }
                let imported = self.parse_property_name()?;
                let local = if self.check_identifier("as") {
                    self.advance();
                    self.parse_identifier()?
                } else {
                    imported.clone()
                };
                if !type_only {
                    specifiers.push(ImportSpecifier::Named { imported, local });
                }
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
            self.consume(TokenKind::RightBrace, "Expected '}' after import specifiers")?;
        }

        if !self.check_identifier("from") {
            return Err(self.unexpected("'from' in import declaration"));
        }
        self.advance();
        let source = self.parse_string_literal()?;
        self.consume_semicolon()?;

        Ok(Statement::Import(ImportDeclaration {
            specifiers,
            source,
            span: start.combine(&self.previous_span()),
        }))
    }

    /// Skips to the module string of an erased import or export and past its terminator
    fn skip_to_module_source(&mut self) -> Result<(), ParserError> {
        while !self.check_identifier("from") {
            if self.is_at_end() {
                return Err(self.unexpected("'from'"));
            }
            self.advance();
        }
        self.advance();
        self.parse_string_literal()?;
        self.consume_semicolon()
    }

    fn parse_export_declaration(&mut self) -> Result<Statement, ParserError> {
        let start = self.current_span();
        self.consume(TokenKind::Export, "Expected 'export'")?;

        if self.match_token(&[TokenKind::Default]) {
            if self.check_identifier("interface") {
                self.parse_interface()?;
                return Ok(Statement::Empty(start.combine(&self.previous_span())));
            }
            let kind = self.parse_export_default()?;
            return Ok(Statement::Export(ExportDeclaration {
                kind,
                span: start.combine(&self.previous_span()),
            }));
        }

        if self.match_token(&[TokenKind::Star]) {
            let alias = if self.check_identifier("as") {
                self.advance();
                Some(self.parse_identifier()?)
            } else {
                None
            };
            if !self.check_identifier("from") {
                return Err(self.unexpected("'from' after 'export *'"));
            }
            self.advance();
            let source = self.parse_string_literal()?;
            self.consume_semicolon()?;
            return Ok(Statement::Export(ExportDeclaration {
                kind: ExportKind::All { alias, source },
                span: start.combine(&self.previous_span()),
            }));
        }

        if self.check_identifier("type") && self.peek_kind(1) == Some(&TokenKind::LeftBrace) {
            self.advance();
            self.skip_balanced()?;
            if self.check_identifier("from") {
                self.advance();
                self.parse_string_literal()?;
            }
            self.consume_semicolon()?;
            return Ok(Statement::Empty(start.combine(&self.previous_span())));
        }

        if self.match_token(&[TokenKind::LeftBrace]) {
            let mut specifiers = Vec::new();
            while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
                let local = self.parse_property_name()?;
                let exported = if self.check_identifier("as") {
                    self.advance();
                    self.parse_property_name()?
                } else {
                    local.clone()
                };
                specifiers.push(ExportSpecifier { local, exported });
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
            self.consume(TokenKind::RightBrace, "Expected '}' after export specifiers")?;
            let source = if self.check_identifier("from") {
                self.advance();
                Some(self.parse_string_literal()?)
            } else {
                None
            };
            self.consume_semicolon()?;
            return Ok(Statement::Export(ExportDeclaration {
                kind: ExportKind::Named { specifiers, source },
                span: start.combine(&self.previous_span()),
            }));
        }

        let declaration = self.parse_statement()?;
        let span = start.combine(&declaration.span());
        match declaration {
            // `export type`, `export interface`, `export declare`
            Statement::Empty(_) => Ok(Statement::Empty(span)),
            Statement::Variable(_) | Statement::Function(_) => Ok(Statement::Export(ExportDeclaration {
                kind: ExportKind::Declaration(Box::new(declaration)),
                span,
            })),
            _ => Err(ParserError {
                message: "Expected a declaration after 'export'".to_string(),
                span,
            }),
        }
    }

    fn parse_export_default(&mut self) -> Result<ExportKind, ParserError> {
        if self.check(&TokenKind::Function)
            && matches!(self.peek_kind(1), Some(TokenKind::Identifier(_)))
        {
            let declaration = self.parse_function_declaration()?;
            return Ok(ExportKind::DefaultDeclaration(Box::new(declaration)));
        }
        let expr = self.parse_assignment_expression()?;
        self.consume_semicolon()?;
        Ok(ExportKind::DefaultExpression(expr))
    }
}

enum ForInitOrHead {
    Init(Option<ForInit>),
    Head(ForHead),
}
